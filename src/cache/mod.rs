//! Cache Module
//!
//! The cache contract consumed by the listing layer, its backends (no-op,
//! in-process TTL+LRU, Redis) and the error-absorbing handle the services
//! talk to.

mod backend;
mod entry;
mod handle;
mod lru;
mod redis_cache;
mod store;


pub use backend::{CacheBackend, MemoryCache, NoopCache};
pub use handle::CacheHandle;
pub use redis_cache::RedisCache;

pub(crate) use entry::CacheEntry;
pub(crate) use lru::LruTracker;
pub(crate) use store::CacheStore;

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// Maximum allowed value size in bytes. Listing pages are stored whole.
pub const MAX_VALUE_SIZE: usize = 4 * 1024 * 1024;
