use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use crate::cache::key::CacheKey;
use crate::cache::lru::BoundedLru;
use crate::foundation::core::Mode;
use crate::foundation::error::{BratError, BratResult};
use crate::foundation::scratch::remove_detached;

/// A generated file plus its cache metadata.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Artifact {
    /// Fingerprint of the text the artifact was generated from.
    pub key: CacheKey,
    /// Image or video.
    pub kind: Mode,
    /// Backing file on disk.
    pub path: PathBuf,
    /// Generation time.
    pub created_at: SystemTime,
}

impl Artifact {
    /// Describe a freshly generated file.
    pub fn new(key: CacheKey, kind: Mode, path: impl Into<PathBuf>) -> Self {
        Self {
            key,
            kind,
            path: path.into(),
            created_at: SystemTime::now(),
        }
    }

    fn is_expired(&self, ttl: Option<Duration>) -> bool {
        let Some(ttl) = ttl else {
            return false;
        };
        // A clock that moved backwards reads as "just created".
        self.created_at
            .elapsed()
            .map(|age| age > ttl)
            .unwrap_or(false)
    }
}

/// Bounded `CacheKey -> Artifact` map for one artifact kind.
///
/// Lookups validate lazily: an entry whose file is gone, or that outlived the TTL, is dropped and
/// reported as a miss. Entries leaving the cache take their backing file with them (best-effort).
pub struct ArtifactCache {
    kind: Mode,
    ttl: Option<Duration>,
    entries: BoundedLru<CacheKey, Artifact>,
}

impl ArtifactCache {
    /// Create an empty cache for `kind` holding at most `capacity` artifacts.
    pub fn new(kind: Mode, capacity: usize, ttl: Option<Duration>) -> BratResult<Self> {
        let capacity = NonZeroUsize::new(capacity).ok_or_else(|| {
            BratError::validation(format!("{kind} cache capacity must be non-zero"))
        })?;
        let entries =
            BoundedLru::new(capacity).with_eviction(move |key: CacheKey, artifact: Artifact| {
                tracing::debug!(
                    kind = %kind,
                    key = key.short(),
                    path = %artifact.path.display(),
                    "evicting artifact"
                );
                remove_detached(artifact.path);
            });
        Ok(Self { kind, ttl, entries })
    }

    /// Artifact kind held by this cache.
    pub fn kind(&self) -> Mode {
        self.kind
    }

    /// Maximum number of artifacts.
    pub fn capacity(&self) -> usize {
        self.entries.capacity()
    }

    /// Current number of artifacts (including ones not yet revalidated).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Return the artifact for `key` if its file still exists and it has not expired.
    ///
    /// Never fails; anything unusable is a miss.
    pub fn get(&self, key: &CacheKey) -> Option<Artifact> {
        let ttl = self.ttl;
        let hit = self
            .entries
            .get_if(key, |a| a.path.is_file() && !a.is_expired(ttl));
        tracing::debug!(kind = %self.kind, key = key.short(), hit = hit.is_some(), "cache lookup");
        hit
    }

    /// Store `artifact` as most-recently-used, evicting the least-recently-used entry when full.
    ///
    /// Overwriting a key whose previous artifact lives at a different path removes the old file.
    pub fn put(&self, artifact: Artifact) {
        debug_assert_eq!(artifact.kind, self.kind);
        let key = artifact.key.clone();
        let path = artifact.path.clone();
        if let Some(previous) = self.entries.put(key, artifact)
            && previous.path != path
        {
            remove_detached(previous.path);
        }
    }

    /// Keys from most- to least-recently-used.
    pub fn keys(&self) -> Vec<CacheKey> {
        self.entries.keys()
    }
}

impl std::fmt::Debug for ArtifactCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactCache")
            .field("kind", &self.kind)
            .field("ttl", &self.ttl)
            .field("entries", &self.entries)
            .finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/cache/artifact.rs"]
mod tests;
