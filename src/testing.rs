//! In-crate fakes for the external collaborators.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

use crate::encode::ffmpeg::{EncodeSettings, VideoEncoder};
use crate::foundation::error::{BratError, BratResult};
use crate::foundation::scratch::ScratchDir;
use crate::render::backend::Renderer;

/// Writes the text itself as the "image" and records every call.
pub(crate) struct FakeRenderer {
    scratch: ScratchDir,
    calls: Mutex<Vec<(String, usize)>>,
    fail_on_call: Option<usize>,
    delay: Option<Duration>,
}

impl FakeRenderer {
    pub(crate) fn new(scratch: ScratchDir) -> Self {
        Self {
            scratch,
            calls: Mutex::new(Vec::new()),
            fail_on_call: None,
            delay: None,
        }
    }

    /// Fail the `n`th call (0-based) and every call after it.
    pub(crate) fn failing_from(mut self, n: usize) -> Self {
        self.fail_on_call = Some(n);
        self
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn calls(&self) -> Vec<(String, usize)> {
        self.calls.lock().clone()
    }
}

#[async_trait::async_trait]
impl Renderer for FakeRenderer {
    async fn render(&self, text: &str, index: usize) -> BratResult<PathBuf> {
        let call = {
            let mut calls = self.calls.lock();
            calls.push((text.to_owned(), index));
            calls.len() - 1
        };
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if matches!(self.fail_on_call, Some(n) if call >= n) {
            return Err(BratError::render("simulated renderer failure"));
        }
        let path = self.scratch.image_path(index);
        tokio::fs::write(&path, text.as_bytes()).await?;
        Ok(path)
    }
}

#[derive(Clone, Copy, Debug)]
pub(crate) enum EncodeBehavior {
    Succeed,
    Fail,
    NoOutput,
    Hang,
}

/// Copies the manifest into the output file and records what it saw.
pub(crate) struct FakeEncoder {
    behavior: EncodeBehavior,
    manifests: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl FakeEncoder {
    pub(crate) fn new(behavior: EncodeBehavior) -> Self {
        Self {
            behavior,
            manifests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn manifests(&self) -> Vec<String> {
        self.manifests.lock().clone()
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl VideoEncoder for FakeEncoder {
    async fn encode(
        &self,
        manifest: &Path,
        out_path: &Path,
        _settings: &EncodeSettings,
    ) -> BratResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let text = tokio::fs::read_to_string(manifest).await?;
        self.manifests.lock().push(text.clone());
        match self.behavior {
            EncodeBehavior::Succeed => {
                tokio::fs::write(out_path, text).await?;
                Ok(())
            }
            EncodeBehavior::Fail => {
                // Leave a partial file behind, as a crashing encoder would.
                tokio::fs::write(out_path, b"partial").await?;
                Err(BratError::encode("simulated encoder exit status 1"))
            }
            EncodeBehavior::NoOutput => Ok(()),
            EncodeBehavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(())
            }
        }
    }
}

/// Every regular file in `dir`.
pub(crate) fn files_in(dir: &Path) -> Vec<PathBuf> {
    let mut out: Vec<PathBuf> = std::fs::read_dir(dir)
        .map(|rd| rd.flatten().map(|e| e.path()).filter(|p| p.is_file()).collect())
        .unwrap_or_default();
    out.sort();
    out
}
