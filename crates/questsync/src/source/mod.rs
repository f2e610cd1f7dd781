//! Event source backends.

mod memory;

pub use memory::MemoryEventSource;
