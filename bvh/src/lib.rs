pub mod aabb;
pub mod batch;
pub mod build;
pub mod bvh;
pub mod error;
pub mod morton;
pub mod radix_tree;
pub mod traversal;

pub use aabb::*;
pub use batch::*;
pub use build::*;
pub use bvh::*;
pub use error::*;
pub use radix_tree::*;
pub use traversal::*;

pub use lbvh_utils::{AllocError, Bounded, ExecutionPolicy, Host, MemorySpace, Rayon, Sequential, Threads};
