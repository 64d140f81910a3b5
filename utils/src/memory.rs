use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot allocate {bytes} bytes in {space} memory")]
pub struct AllocError {
    pub bytes: usize,
    pub space: &'static str,
}

/// Where the arrays of a tree live.
///
/// Every allocation goes through fallible reservation, so running out of
/// memory is reported instead of aborting the process.
pub trait MemorySpace: Sync {
    fn name(&self) -> &'static str;

    /// Upper bound on a single request in bytes, `None` when unbounded.
    fn capacity(&self) -> Option<usize>;

    /// Checks that `bytes` could be satisfied without allocating anything.
    fn reserve(&self, bytes: usize) -> Result<(), AllocError> {
        match self.capacity() {
            Some(capacity) if bytes > capacity => Err(AllocError {
                bytes,
                space: self.name(),
            }),
            _ => Ok(()),
        }
    }

    fn allocate_with<T, F>(&self, len: usize, mut init: F) -> Result<Vec<T>, AllocError>
    where
        F: FnMut(usize) -> T,
    {
        let bytes = len
            .checked_mul(std::mem::size_of::<T>())
            .ok_or(AllocError {
                bytes: usize::MAX,
                space: self.name(),
            })?;
        self.reserve(bytes)?;

        let mut array = Vec::new();
        array.try_reserve_exact(len).map_err(|_| AllocError {
            bytes,
            space: self.name(),
        })?;
        array.extend((0..len).map(&mut init));
        Ok(array)
    }

    fn allocate<T: Clone>(&self, len: usize, value: T) -> Result<Vec<T>, AllocError> {
        self.allocate_with(len, |_| value.clone())
    }
}

/// Ordinary process memory.
#[derive(Debug, Copy, Clone, Default)]
pub struct Host;

impl MemorySpace for Host {
    fn name(&self) -> &'static str {
        "host"
    }

    fn capacity(&self) -> Option<usize> {
        None
    }
}

/// Host memory with a hard byte limit, standing in for a device pool.
#[derive(Debug, Copy, Clone)]
pub struct Bounded {
    capacity_bytes: usize,
}

impl Bounded {
    pub fn new(capacity_bytes: usize) -> Self {
        Self { capacity_bytes }
    }
}

impl MemorySpace for Bounded {
    fn name(&self) -> &'static str {
        "bounded"
    }

    fn capacity(&self) -> Option<usize> {
        Some(self.capacity_bytes)
    }
}
