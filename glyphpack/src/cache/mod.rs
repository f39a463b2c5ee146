//! Incremental build cache.
//!
//! - [`CacheStore`] persists one [`CacheEntry`] per font name.
//! - [`evaluate`] decides whether a cached build can be reused as a whole.
//!
//! The store is read once at the start of a build and written at most once,
//! after a successful regeneration.

mod store;
mod validity;

pub use store::{CacheEntry, CacheStore};
pub use validity::{evaluate, CacheDecision, MissReason};
