#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

use bratgen::{
    BratError, BratResult, EncodeSettings, Orchestrator, Renderer, ScratchDir, ServiceConfig,
    VideoEncoder,
};

/// Records every render and writes the text itself as the image.
pub struct RecordingRenderer {
    scratch: ScratchDir,
    calls: Mutex<Vec<String>>,
    fail: bool,
    delay: Duration,
}

impl RecordingRenderer {
    pub fn new(scratch: ScratchDir) -> Self {
        Self {
            scratch,
            calls: Mutex::new(Vec::new()),
            fail: false,
            delay: Duration::ZERO,
        }
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait::async_trait]
impl Renderer for RecordingRenderer {
    async fn render(&self, text: &str, index: usize) -> BratResult<PathBuf> {
        self.calls.lock().push(text.to_owned());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail {
            return Err(BratError::render("renderer exploded"));
        }
        let path = self.scratch.image_path(index);
        tokio::fs::write(&path, text.as_bytes()).await?;
        Ok(path)
    }
}

/// Writes the manifest it was given as the "video", or fails.
pub struct RecordingEncoder {
    fail: bool,
    calls: AtomicUsize,
    manifests: Mutex<Vec<String>>,
}

impl RecordingEncoder {
    pub fn new() -> Self {
        Self {
            fail: false,
            calls: AtomicUsize::new(0),
            manifests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn manifests(&self) -> Vec<String> {
        self.manifests.lock().clone()
    }
}

#[async_trait::async_trait]
impl VideoEncoder for RecordingEncoder {
    async fn encode(
        &self,
        manifest: &Path,
        out_path: &Path,
        _settings: &EncodeSettings,
    ) -> BratResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let text = tokio::fs::read_to_string(manifest).await?;
        self.manifests.lock().push(text.clone());
        if self.fail {
            return Err(BratError::encode("ffmpeg exited with status 1"));
        }
        tokio::fs::write(out_path, text).await?;
        Ok(())
    }
}

pub struct Harness {
    pub dir: tempfile::TempDir,
    pub renderer: Arc<RecordingRenderer>,
    pub encoder: Arc<RecordingEncoder>,
    pub orchestrator: Orchestrator,
}

impl Harness {
    pub fn new() -> Self {
        Self::build(|r| r, RecordingEncoder::new())
    }

    pub fn build(
        renderer: impl FnOnce(RecordingRenderer) -> RecordingRenderer,
        encoder: RecordingEncoder,
    ) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = ServiceConfig {
            scratch_dir: dir.path().to_path_buf(),
            ..ServiceConfig::default()
        };
        let scratch = ScratchDir::create(&config.scratch_dir).unwrap();
        let renderer = Arc::new(renderer(RecordingRenderer::new(scratch)));
        let encoder = Arc::new(encoder);
        let orchestrator = Orchestrator::new(&config, renderer.clone(), encoder.clone()).unwrap();
        Self {
            dir,
            renderer,
            encoder,
            orchestrator,
        }
    }

    /// Regular files currently in the scratch directory.
    pub fn files(&self) -> Vec<PathBuf> {
        let mut out: Vec<PathBuf> = std::fs::read_dir(self.dir.path())
            .unwrap()
            .map(|e| e.unwrap().path())
            .filter(|p| p.is_file())
            .collect();
        out.sort();
        out
    }
}
