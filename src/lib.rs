//! bratgen renders short text into "brat"-style artwork and serves it over HTTP.
//!
//! Two artifacts are produced from the same text:
//!
//! - a still PNG of the whole text ([`Mode::Image`])
//! - an MP4 that types the text out word by word ([`Mode::Video`]), assembled by `ffmpeg`
//!
//! Artifacts are cached on disk under a content-addressed key (SHA-256 of the text) in bounded,
//! per-mode LRU caches. The [`Orchestrator`] ties caching, single-flight generation and cleanup
//! together; [`create_router`] exposes it as an axum router.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

pub(crate) mod cache;
pub(crate) mod encode;
pub(crate) mod frames;
pub(crate) mod http;
pub(crate) mod render;
pub(crate) mod service;
pub mod telemetry;

#[cfg(test)]
pub(crate) mod testing;

pub use crate::foundation::config::{
    DEFAULT_IMAGE_CACHE_CAPACITY, DEFAULT_VIDEO_CACHE_CAPACITY, ServiceConfig,
};
pub use crate::foundation::core::{Mode, Request};
pub use crate::foundation::error::{BratError, BratResult};
pub use crate::foundation::scratch::ScratchDir;

pub use crate::cache::artifact::{Artifact, ArtifactCache};
pub use crate::cache::key::CacheKey;
pub use crate::encode::assembler::VideoAssembler;
pub use crate::encode::ffmpeg::{EncodeSettings, FfmpegEncoder, VideoEncoder, is_ffmpeg_on_path};
pub use crate::encode::manifest::{Manifest, ManifestEntry};
pub use crate::frames::sequencer::{
    Frame, FrameSequencer, FrameSet, FrameTiming, frame_durations, word_prefixes,
};
pub use crate::http::error::{ApiError, ErrorCode};
pub use crate::http::routes::{AppState, GenerateQuery, create_router};
pub use crate::render::backend::{Renderer, render_with_deadline};
pub use crate::render::cpu::{TextRenderer, TextStyle, rasterize_text};
pub use crate::render::engine::{EngineHandle, TextEngine};
pub use crate::service::inflight::GenerationFailure;
pub use crate::service::orchestrator::{CacheStats, Orchestrator};
