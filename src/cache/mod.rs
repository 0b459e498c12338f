//! Cache Module
//!
//! Provides the admission-bounded local cache and its statistics.

mod local;
mod stats;


// Re-export public types
pub use local::LocalCache;
pub use stats::CacheStats;
