//! Cache store backends.

mod memory;

pub use memory::MemoryCacheStore;
