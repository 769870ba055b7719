//! Storage backend implementations

pub mod file;
pub mod memory;

pub use file::{JsonlPaths, JsonlStore, RunSummaryRecord};
pub use memory::MemoryStore;
