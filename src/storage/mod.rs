//! Storage collaborators
//!
//! The aggregation core never touches a store directly. It reads both record
//! sets through a [`RecordSource`] and hands finished aggregates to an
//! [`AggregateSink`].

pub mod backends;
pub mod error;
pub mod traits;
pub mod types;

pub use backends::{JsonlPaths, JsonlStore, MemoryStore};
pub use error::{StorageError, StorageResult};
pub use traits::{AggregateSink, RecordSource};
pub use types::TranslationContributionRecord;
