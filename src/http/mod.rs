//! HTTP surface: one generation endpoint plus a liveness probe.

pub(crate) mod error;
pub(crate) mod routes;
