use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::encode::ffmpeg::{EncodeSettings, VideoEncoder};
use crate::encode::manifest::Manifest;
use crate::foundation::error::{BratError, BratResult};
use crate::foundation::scratch::{ScratchDir, remove_best_effort};
use crate::frames::sequencer::Frame;

/// Writes a manifest for a frame sequence and hands it to a [`VideoEncoder`].
#[derive(Clone)]
pub struct VideoAssembler {
    encoder: Arc<dyn VideoEncoder>,
    scratch: ScratchDir,
    settings: EncodeSettings,
    timeout: Option<Duration>,
}

impl VideoAssembler {
    /// Create an assembler writing into `scratch`. `timeout` bounds each encoder invocation.
    pub fn new(
        encoder: Arc<dyn VideoEncoder>,
        scratch: ScratchDir,
        settings: EncodeSettings,
        timeout: Option<Duration>,
    ) -> BratResult<Self> {
        settings.validate()?;
        Ok(Self {
            encoder,
            scratch,
            settings,
            timeout,
        })
    }

    /// Encode `frames` into a fresh video file and return its path.
    ///
    /// The manifest is removed whatever happens. On failure any partial output is removed too;
    /// the frames themselves stay with the caller.
    #[tracing::instrument(level = "debug", skip_all, fields(frames = frames.len()))]
    pub async fn assemble(&self, frames: &[Frame]) -> BratResult<PathBuf> {
        if frames.is_empty() {
            return Err(BratError::NoFrames);
        }

        let manifest_path = self.scratch.manifest_path();
        let out_path = self.scratch.video_path();
        let result = self
            .write_and_encode(frames, &manifest_path, &out_path)
            .await;
        remove_best_effort(&manifest_path).await;

        match result {
            Ok(()) => {
                tracing::debug!(path = %out_path.display(), "video assembled");
                Ok(out_path)
            }
            Err(e) => {
                remove_best_effort(&out_path).await;
                Err(e)
            }
        }
    }

    async fn write_and_encode(
        &self,
        frames: &[Frame],
        manifest_path: &Path,
        out_path: &Path,
    ) -> BratResult<()> {
        Manifest::from_frames(frames).write_to(manifest_path).await?;

        let encode = self.encoder.encode(manifest_path, out_path, &self.settings);
        match self.timeout {
            None => encode.await?,
            Some(limit) => tokio::time::timeout(limit, encode)
                .await
                .map_err(|_| BratError::encode(format!("encoder timed out after {limit:?}")))??,
        }

        match tokio::fs::metadata(out_path).await {
            Ok(meta) if meta.is_file() => Ok(()),
            _ => Err(BratError::encode(format!(
                "encoder produced no output file at '{}'",
                out_path.display()
            ))),
        }
    }
}

impl std::fmt::Debug for VideoAssembler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoAssembler")
            .field("scratch", &self.scratch)
            .field("settings", &self.settings)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/assembler.rs"]
mod tests;
