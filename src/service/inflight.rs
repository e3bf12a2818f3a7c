use std::collections::HashMap;
use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;

use crate::cache::artifact::Artifact;
use crate::cache::key::CacheKey;
use crate::foundation::core::Mode;
use crate::foundation::error::BratError;

/// Identity of one generation: the same text in different modes is generated independently.
pub(crate) type FlightKey = (Mode, CacheKey);

/// Outcome awaited by every caller that joined a generation.
pub(crate) type SharedGeneration = Shared<BoxFuture<'static, Result<Artifact, GenerationFailure>>>;

/// A failed generation, shareable between every caller that waited on it.
#[derive(Clone, Debug)]
pub struct GenerationFailure(Arc<BratError>);

impl GenerationFailure {
    /// Wrap the error that ended a generation.
    pub fn new(err: BratError) -> Self {
        Self(Arc::new(err))
    }

    /// Human-readable message of the underlying error.
    pub fn message(&self) -> String {
        self.0.to_string()
    }
}

impl std::fmt::Display for GenerationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl From<GenerationFailure> for BratError {
    fn from(failure: GenerationFailure) -> Self {
        match failure.0.as_ref() {
            BratError::NoFrames => BratError::NoFrames,
            BratError::Validation(msg) => BratError::Validation(msg.clone()),
            BratError::Generation(msg) => BratError::Generation(msg.clone()),
            other => BratError::Generation(other.to_string()),
        }
    }
}

/// What [`InFlight::join_or_start`] found for a key.
pub(crate) enum Joined {
    /// The artifact was already cached; nothing runs.
    Cached(Artifact),
    /// A generation is running. `leader` is true for the caller that started it.
    Flight {
        shared: SharedGeneration,
        leader: bool,
    },
}

/// Table of generations currently running, at most one per key.
#[derive(Default)]
pub(crate) struct InFlight {
    table: Mutex<HashMap<FlightKey, SharedGeneration>>,
}

impl InFlight {
    /// Join the generation running for `key`, or start one.
    ///
    /// `lookup` re-checks the cache under the table lock: a generation finishing between the
    /// caller's own cache miss and this call has already stored its artifact and left the table,
    /// so without the re-check a second generation would start. `start` runs under the lock and
    /// must not block.
    pub(crate) fn join_or_start<L, S>(&self, key: FlightKey, lookup: L, start: S) -> Joined
    where
        L: FnOnce() -> Option<Artifact>,
        S: FnOnce() -> BoxFuture<'static, Result<Artifact, GenerationFailure>>,
    {
        let mut table = self.table.lock();
        if let Some(running) = table.get(&key) {
            return Joined::Flight {
                shared: running.clone(),
                leader: false,
            };
        }
        if let Some(hit) = lookup() {
            return Joined::Cached(hit);
        }
        let shared = start().shared();
        table.insert(key, shared.clone());
        Joined::Flight {
            shared,
            leader: true,
        }
    }

    /// Guard that removes `key` from the table when dropped.
    ///
    /// The generation body holds it for its whole run, so the entry goes away even if the body
    /// panics.
    pub(crate) fn guard(&self, key: FlightKey) -> FlightGuard<'_> {
        FlightGuard { table: self, key }
    }

    fn finish(&self, key: &FlightKey) {
        self.table.lock().remove(key);
    }

    pub(crate) fn len(&self) -> usize {
        self.table.lock().len()
    }
}

pub(crate) struct FlightGuard<'a> {
    table: &'a InFlight,
    key: FlightKey,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.table.finish(&self.key);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/service/inflight.rs"]
mod tests;
