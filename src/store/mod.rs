//! Record Store adapters.

mod hub;
mod local;
mod memory;

pub use local::JsonFileRecordStore;
pub use memory::MemoryRecordStore;
