use std::path::{Path, PathBuf};
use std::process::Stdio;

use crate::foundation::error::{BratError, BratResult};

/// Output geometry and frame rate of generated videos.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncodeSettings {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Output frames per second.
    pub fps: u32,
}

impl Default for EncodeSettings {
    fn default() -> Self {
        Self {
            width: 512,
            height: 512,
            fps: 30,
        }
    }
}

impl EncodeSettings {
    /// Reject zero sizes/rates and odd sizes.
    pub fn validate(&self) -> BratResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(BratError::validation(
                "encode width/height must be non-zero",
            ));
        }
        if self.fps == 0 {
            return Err(BratError::validation("encode fps must be non-zero"));
        }
        if !self.width.is_multiple_of(2) || !self.height.is_multiple_of(2) {
            // yuv420p output needs even dimensions.
            return Err(BratError::validation(
                "encode width/height must be even (required for yuv420p mp4 output)",
            ));
        }
        Ok(())
    }

    fn video_filter(&self) -> String {
        format!("fps={},scale={}:{}", self.fps, self.width, self.height)
    }
}

/// Turns a frame manifest into a video file.
#[async_trait::async_trait]
pub trait VideoEncoder: Send + Sync {
    /// Encode the frames listed in `manifest` into `out_path`.
    ///
    /// An `Ok` return does not by itself prove the output exists; callers check.
    async fn encode(
        &self,
        manifest: &Path,
        out_path: &Path,
        settings: &EncodeSettings,
    ) -> BratResult<()>;
}

/// [`VideoEncoder`] backed by the system `ffmpeg` binary.
///
/// Arguments are passed as an array, never through a shell, so file names cannot inject
/// commands.
#[derive(Clone, Debug)]
pub struct FfmpegEncoder {
    program: PathBuf,
}

impl Default for FfmpegEncoder {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl FfmpegEncoder {
    /// Use `program` as the encoder executable.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Executable in use.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Whether `program -version` runs and exits successfully. Blocking.
    pub fn is_runnable(&self) -> bool {
        std::process::Command::new(&self.program)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok_and(|s| s.success())
    }

    fn command(
        &self,
        manifest: &Path,
        out_path: &Path,
        settings: &EncodeSettings,
    ) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new(&self.program);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        cmd.args([
            "-y",
            "-loglevel",
            "error",
            "-f",
            "concat",
            "-safe",
            "0",
            "-i",
        ])
        .arg(manifest)
        .args([
            "-vf",
            settings.video_filter().as_str(),
            "-an",
            "-c:v",
            "libx264",
            "-preset",
            "ultrafast",
            "-pix_fmt",
            "yuv420p",
            "-movflags",
            "+faststart",
        ])
        .arg(out_path);
        cmd
    }
}

#[async_trait::async_trait]
impl VideoEncoder for FfmpegEncoder {
    #[tracing::instrument(
        level = "debug",
        skip(self, settings),
        fields(program = %self.program.display())
    )]
    async fn encode(
        &self,
        manifest: &Path,
        out_path: &Path,
        settings: &EncodeSettings,
    ) -> BratResult<()> {
        settings.validate()?;

        let output = self
            .command(manifest, out_path, settings)
            .output()
            .await
            .map_err(|e| {
                BratError::encode(format!(
                    "failed to spawn {} (is it installed and on PATH?): {e}",
                    self.program.display()
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BratError::encode(format!(
                "{} exited with status {}: {}",
                self.program.display(),
                output.status,
                stderr.trim()
            )));
        }
        Ok(())
    }
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    FfmpegEncoder::default().is_runnable()
}
