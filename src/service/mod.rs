//! Request orchestration: cache lookup, single-flight generation and cleanup.

pub(crate) mod inflight;
pub(crate) mod orchestrator;
