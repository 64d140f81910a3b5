use crossbeam::thread::Scope;
use rayon::prelude::*;
use std::panic::resume_unwind;
use std::sync::Arc;

/// Data-parallel primitives every build phase is expressed in.
///
/// Implementations decide where the work runs; callers only promise that the
/// closures are safe to call from several threads at once.
pub trait ExecutionPolicy: Sync {
    fn name(&self) -> &'static str;

    /// Calls `f(i)` once for every `i` in `0..n`, in no particular order.
    fn for_all<F>(&self, n: usize, f: F)
    where
        F: Fn(usize) + Sync + Send;

    /// Calls `f(i, &mut items[i])` once for every element.
    fn for_each_mut<T, F>(&self, items: &mut [T], f: F)
    where
        T: Send,
        F: Fn(usize, &mut T) + Sync + Send;

    /// Folds `map(i)` for `i` in `0..n` with `combine`, starting from `identity`.
    ///
    /// `combine` must be associative and `identity` neutral for it.
    fn reduce<T, M, R>(&self, n: usize, identity: T, map: M, combine: R) -> T
    where
        T: Copy + Send + Sync,
        M: Fn(usize) -> T + Sync + Send,
        R: Fn(T, T) -> T + Sync + Send;

    fn sort<T: Ord + Send>(&self, items: &mut [T]) {
        items.sort_unstable();
    }
}

/// Runs everything on the calling thread.
#[derive(Debug, Copy, Clone, Default)]
pub struct Sequential;

impl ExecutionPolicy for Sequential {
    fn name(&self) -> &'static str {
        "sequential"
    }

    fn for_all<F>(&self, n: usize, f: F)
    where
        F: Fn(usize) + Sync + Send,
    {
        (0..n).for_each(f);
    }

    fn for_each_mut<T, F>(&self, items: &mut [T], f: F)
    where
        T: Send,
        F: Fn(usize, &mut T) + Sync + Send,
    {
        items.iter_mut().enumerate().for_each(|(i, item)| f(i, item));
    }

    fn reduce<T, M, R>(&self, n: usize, identity: T, map: M, combine: R) -> T
    where
        T: Copy + Send + Sync,
        M: Fn(usize) -> T + Sync + Send,
        R: Fn(T, T) -> T + Sync + Send,
    {
        (0..n).fold(identity, |acc, i| combine(acc, map(i)))
    }
}

/// Work-stealing execution on a rayon pool.
///
/// Uses the global pool unless built with [`Rayon::with_threads`].
#[derive(Debug, Clone, Default)]
pub struct Rayon {
    pool: Option<Arc<rayon::ThreadPool>>,
}

impl Rayon {
    pub fn new() -> Self {
        Self { pool: None }
    }

    pub fn with_threads(threads: usize) -> Result<Self, rayon::ThreadPoolBuildError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()?;

        Ok(Self {
            pool: Some(Arc::new(pool)),
        })
    }

    fn install<R, OP>(&self, op: OP) -> R
    where
        R: Send,
        OP: FnOnce() -> R + Send,
    {
        match &self.pool {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }
}

impl ExecutionPolicy for Rayon {
    fn name(&self) -> &'static str {
        "rayon"
    }

    fn for_all<F>(&self, n: usize, f: F)
    where
        F: Fn(usize) + Sync + Send,
    {
        self.install(|| (0..n).into_par_iter().for_each(f));
    }

    fn for_each_mut<T, F>(&self, items: &mut [T], f: F)
    where
        T: Send,
        F: Fn(usize, &mut T) + Sync + Send,
    {
        self.install(|| {
            items
                .par_iter_mut()
                .enumerate()
                .for_each(|(i, item)| f(i, item))
        });
    }

    fn reduce<T, M, R>(&self, n: usize, identity: T, map: M, combine: R) -> T
    where
        T: Copy + Send + Sync,
        M: Fn(usize) -> T + Sync + Send,
        R: Fn(T, T) -> T + Sync + Send,
    {
        self.install(|| {
            (0..n)
                .into_par_iter()
                .map(|i| map(i))
                .reduce(|| identity, |a, b| combine(a, b))
        })
    }

    fn sort<T: Ord + Send>(&self, items: &mut [T]) {
        self.install(|| items.par_sort_unstable());
    }
}

struct WorkDivision {
    idx: usize,
    max: usize,
}

struct LoopRange {
    begin: usize,
    end: usize,
}

impl LoopRange {
    pub fn new(div: WorkDivision, array_size: usize) -> Self {
        let chunk_size = array_size / div.max;
        let begin = chunk_size * div.idx;
        let end = if (div.idx + 1) == div.max {
            array_size
        } else {
            begin + chunk_size
        };

        Self { begin, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.begin
    }
}

/// Fixed set of scoped worker threads, each owning one contiguous chunk.
///
/// Reductions combine chunk results in chunk order, so a fixed worker count
/// always produces the same result.
#[derive(Debug, Copy, Clone)]
pub struct Threads {
    workers: usize,
}

impl Default for Threads {
    fn default() -> Self {
        Self::new()
    }
}

impl Threads {
    /// One worker per logical cpu.
    pub fn new() -> Self {
        Self::with_workers(num_cpus::get())
    }

    pub fn with_workers(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    fn workers_for(&self, n: usize) -> usize {
        self.workers.min(n).max(1)
    }
}

fn scoped<'env, F, R>(f: F) -> R
where
    F: FnOnce(&Scope<'env>) -> R,
{
    match crossbeam::scope(f) {
        Ok(result) => result,
        Err(payload) => resume_unwind(payload),
    }
}

impl ExecutionPolicy for Threads {
    fn name(&self) -> &'static str {
        "threads"
    }

    fn for_all<F>(&self, n: usize, f: F)
    where
        F: Fn(usize) + Sync + Send,
    {
        let workers = self.workers_for(n);
        if workers == 1 {
            (0..n).for_each(f);
            return;
        }

        let f = &f;
        scoped(|s| {
            for idx in 0..workers {
                let range = LoopRange::new(WorkDivision { idx, max: workers }, n);
                s.spawn(move |_| (range.begin..range.end).for_each(f));
            }
        });
    }

    fn for_each_mut<T, F>(&self, items: &mut [T], f: F)
    where
        T: Send,
        F: Fn(usize, &mut T) + Sync + Send,
    {
        let n = items.len();
        let workers = self.workers_for(n);
        if workers == 1 {
            items.iter_mut().enumerate().for_each(|(i, item)| f(i, item));
            return;
        }

        let f = &f;
        scoped(|s| {
            let mut rest = items;
            for idx in 0..workers {
                let range = LoopRange::new(WorkDivision { idx, max: workers }, n);
                let (chunk, tail) = std::mem::take(&mut rest).split_at_mut(range.len());
                rest = tail;

                s.spawn(move |_| {
                    for (i, item) in chunk.iter_mut().enumerate() {
                        f(range.begin + i, item);
                    }
                });
            }
        });
    }

    fn reduce<T, M, R>(&self, n: usize, identity: T, map: M, combine: R) -> T
    where
        T: Copy + Send + Sync,
        M: Fn(usize) -> T + Sync + Send,
        R: Fn(T, T) -> T + Sync + Send,
    {
        let workers = self.workers_for(n);
        if workers == 1 {
            return (0..n).fold(identity, |acc, i| combine(acc, map(i)));
        }

        let (map, combine) = (&map, &combine);
        scoped(|s| {
            let handles: Vec<_> = (0..workers)
                .map(|idx| {
                    let range = LoopRange::new(WorkDivision { idx, max: workers }, n);
                    s.spawn(move |_| {
                        (range.begin..range.end).fold(identity, |acc, i| combine(acc, map(i)))
                    })
                })
                .collect();

            handles
                .into_iter()
                .map(|handle| match handle.join() {
                    Ok(partial) => partial,
                    Err(payload) => resume_unwind(payload),
                })
                .fold(identity, |acc, partial| combine(acc, partial))
        })
    }
}
