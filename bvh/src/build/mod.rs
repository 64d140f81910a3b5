pub mod lbvh_builder;
mod propagate;
mod sort;
mod topology;

pub use lbvh_builder::*;

use crate::{Aabb, BuildError, Bvh};

pub trait BvhBuilder<const D: usize> {
    /// Builds a hierarchy over `aabbs`; leaf `i` of the result refers to `aabbs[i]`.
    fn build(&self, aabbs: &[Aabb<D>]) -> Result<Bvh<D>, BuildError>;
}
