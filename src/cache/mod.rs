//! Content-addressed artifact caching.

pub(crate) mod artifact;
pub(crate) mod key;
pub(crate) mod lru;
