use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::FutureExt;
use tracing::Instrument;

use crate::cache::artifact::{Artifact, ArtifactCache};
use crate::cache::key::CacheKey;
use crate::encode::assembler::VideoAssembler;
use crate::encode::ffmpeg::{FfmpegEncoder, VideoEncoder};
use crate::foundation::config::ServiceConfig;
use crate::foundation::core::{Mode, Request};
use crate::foundation::error::{BratError, BratResult};
use crate::foundation::scratch::ScratchDir;
use crate::frames::sequencer::FrameSequencer;
use crate::render::backend::{Renderer, render_with_deadline};
use crate::render::cpu::{TextRenderer, TextStyle};
use crate::render::engine::EngineHandle;
use crate::service::inflight::{FlightKey, GenerationFailure, InFlight, Joined};

/// Artifact and in-flight counts at one instant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Cached still images.
    pub images: usize,
    /// Cached videos.
    pub videos: usize,
    /// Generations currently running.
    pub in_flight: usize,
}

/// Turns requests into cached artifacts.
///
/// Cheap to clone; clones share caches, collaborators and the in-flight table.
#[derive(Clone)]
pub struct Orchestrator {
    inner: Arc<Inner>,
}

struct Inner {
    scratch: ScratchDir,
    images: ArtifactCache,
    videos: ArtifactCache,
    inflight: InFlight,
    renderer: Arc<dyn Renderer>,
    sequencer: FrameSequencer,
    assembler: VideoAssembler,
    render_timeout: Option<Duration>,
    text_engine: Option<EngineHandle>,
}

impl Orchestrator {
    /// Build an orchestrator around explicit collaborators.
    pub fn new(
        config: &ServiceConfig,
        renderer: Arc<dyn Renderer>,
        encoder: Arc<dyn VideoEncoder>,
    ) -> BratResult<Self> {
        Self::build(config, renderer, encoder, None)
    }

    fn build(
        config: &ServiceConfig,
        renderer: Arc<dyn Renderer>,
        encoder: Arc<dyn VideoEncoder>,
        text_engine: Option<EngineHandle>,
    ) -> BratResult<Self> {
        config.validate()?;
        let scratch = ScratchDir::create(&config.scratch_dir)?;
        let inner = Inner {
            images: ArtifactCache::new(Mode::Image, config.image_cache_capacity, config.cache_ttl)?,
            videos: ArtifactCache::new(Mode::Video, config.video_cache_capacity, config.cache_ttl)?,
            inflight: InFlight::default(),
            renderer,
            sequencer: FrameSequencer::new(config.frames, config.render_timeout)?,
            assembler: VideoAssembler::new(
                encoder,
                scratch.clone(),
                config.encode,
                config.encode_timeout,
            )?,
            render_timeout: config.render_timeout,
            text_engine,
            scratch,
        };
        tracing::debug!(scratch = %inner.scratch.root().display(), "orchestrator ready");
        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Build an orchestrator with the built-in text renderer and the ffmpeg encoder.
    ///
    /// The font is loaded lazily on the first render.
    pub fn with_defaults(config: &ServiceConfig) -> BratResult<Self> {
        let scratch = ScratchDir::create(&config.scratch_dir)?;
        let engine = EngineHandle::new(config.font_path.clone());
        let renderer = TextRenderer::new(engine.clone(), scratch, TextStyle::default())?;
        let encoder = FfmpegEncoder::new(config.ffmpeg_program.clone());
        Self::build(
            config,
            Arc::new(renderer),
            Arc::new(encoder),
            Some(engine),
        )
    }

    /// Return the artifact for `request`, generating it on a cache miss.
    ///
    /// Concurrent calls for the same text and mode share one generation and its outcome. The
    /// generation runs on its own task, so dropping this future does not interrupt it; its
    /// result is still cached and its temporary files are still removed.
    #[tracing::instrument(
        level = "info",
        skip_all,
        fields(mode = %request.mode(), key = tracing::field::Empty)
    )]
    pub async fn generate(&self, request: &Request) -> BratResult<Artifact> {
        let mode = request.mode();
        let key = CacheKey::from_text(request.text());
        tracing::Span::current().record("key", key.short());

        let cache = self.inner.cache(mode);
        if let Some(hit) = cache.get(&key) {
            tracing::debug!("cache hit");
            return Ok(hit);
        }
        tracing::debug!("cache miss");

        let flight_key: FlightKey = (mode, key.clone());
        let joined = self.inner.inflight.join_or_start(
            flight_key.clone(),
            || cache.get(&key),
            || {
                let inner = Arc::clone(&self.inner);
                let text = request.text().to_owned();
                let task = tokio::spawn(
                    async move { inner.run(flight_key, text).await }
                        .instrument(tracing::Span::current()),
                );
                async move {
                    task.await.unwrap_or_else(|e| {
                        Err(GenerationFailure::new(BratError::generation(format!(
                            "generation task failed: {e}"
                        ))))
                    })
                }
                .boxed()
            },
        );

        match joined {
            Joined::Cached(hit) => {
                tracing::debug!("cache hit after in-flight check");
                Ok(hit)
            }
            Joined::Flight { shared, leader } => {
                if !leader {
                    tracing::debug!("joined running generation");
                }
                shared.await.map_err(BratError::from)
            }
        }
    }

    /// Current cache and in-flight counts.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            images: self.inner.images.len(),
            videos: self.inner.videos.len(),
            in_flight: self.inner.inflight.len(),
        }
    }

    /// Font engine of the built-in renderer; `None` when a custom renderer was supplied.
    ///
    /// Shares its slot with the renderer, so loading through it also warms rendering.
    pub fn text_engine(&self) -> Option<&EngineHandle> {
        self.inner.text_engine.as_ref()
    }

    /// Directory holding every generated file.
    pub fn scratch_dir(&self) -> &Path {
        self.inner.scratch.root()
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("scratch", &self.inner.scratch)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

impl Inner {
    fn cache(&self, mode: Mode) -> &ArtifactCache {
        match mode {
            Mode::Image => &self.images,
            Mode::Video => &self.videos,
        }
    }

    async fn run(
        self: Arc<Self>,
        flight_key: FlightKey,
        text: String,
    ) -> Result<Artifact, GenerationFailure> {
        // Declared first so the entry leaves the table only after the artifact is cached.
        let _flight = self.inflight.guard(flight_key.clone());
        let (mode, key) = flight_key;
        let started = Instant::now();

        let produced = match mode {
            Mode::Image => self.generate_image(&text).await,
            Mode::Video => self.generate_video(&text).await,
        };

        match produced {
            Ok(path) => {
                let artifact = Artifact::new(key, mode, path);
                self.cache(mode).put(artifact.clone());
                tracing::info!(
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    path = %artifact.path.display(),
                    "generated"
                );
                Ok(artifact)
            }
            Err(e) => {
                tracing::warn!(error = %e, "generation failed");
                Err(GenerationFailure::new(e))
            }
        }
    }

    async fn generate_image(&self, text: &str) -> BratResult<PathBuf> {
        render_with_deadline(self.renderer.as_ref(), text, 0, self.render_timeout).await
    }

    async fn generate_video(&self, text: &str) -> BratResult<PathBuf> {
        let frames = self
            .sequencer
            .render_frames(self.renderer.as_ref(), text)
            .await?;
        let video = self.assembler.assemble(frames.frames()).await;
        frames.remove().await;
        video
    }
}
