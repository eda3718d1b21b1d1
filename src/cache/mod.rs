//! Bounded caches
//!
//! Fixed-capacity maps with least-recently-used eviction, owned by the
//! service that needs them rather than shared process-wide.

mod lru;

pub use lru::BoundedLru;
