//! Filesystem access for the pipeline.
//!
//! - **Backend**: the [`Storage`] trait and its value types
//! - **OS**: [`OsStorage`], `std::fs` + `walkdir`
//! - **Memory**: [`MemoryStorage`], an in-memory double with failure injection

pub mod backend;
pub mod memory;
pub mod os;

pub use backend::{Stat, Storage, Walk, WalkEntry, WalkError};
pub use memory::MemoryStorage;
pub use os::OsStorage;
