pub mod execution;
pub mod memory;

pub use execution::*;
pub use memory::*;
