use std::path::PathBuf;
use std::time::Duration;

use crate::encode::ffmpeg::EncodeSettings;
use crate::foundation::error::{BratError, BratResult};
use crate::frames::sequencer::FrameTiming;

/// Default capacity of the image artifact cache.
pub const DEFAULT_IMAGE_CACHE_CAPACITY: usize = 100;
/// Default capacity of the video artifact cache.
pub const DEFAULT_VIDEO_CACHE_CAPACITY: usize = 50;

/// Runtime configuration for the generation service.
///
/// The `bratgen` binary fills this from CLI flags and `BRATGEN_*` environment variables;
/// library users construct it directly, usually starting from [`ServiceConfig::default`].
#[derive(Clone, Debug)]
pub struct ServiceConfig {
    /// Directory for every generated file.
    pub scratch_dir: PathBuf,
    /// Maximum number of cached still images.
    pub image_cache_capacity: usize,
    /// Maximum number of cached videos.
    pub video_cache_capacity: usize,
    /// Cached artifacts older than this are treated as absent. `None` keeps them indefinitely.
    pub cache_ttl: Option<Duration>,
    /// Word cap and per-frame display durations for video mode.
    pub frames: FrameTiming,
    /// Output geometry and frame rate for videos.
    pub encode: EncodeSettings,
    /// Deadline for one render call.
    pub render_timeout: Option<Duration>,
    /// Deadline for one encoder invocation.
    pub encode_timeout: Option<Duration>,
    /// Font file for the built-in renderer. `None` queries the system font database.
    pub font_path: Option<PathBuf>,
    /// Encoder executable.
    pub ffmpeg_program: PathBuf,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            scratch_dir: PathBuf::from("temp"),
            image_cache_capacity: DEFAULT_IMAGE_CACHE_CAPACITY,
            video_cache_capacity: DEFAULT_VIDEO_CACHE_CAPACITY,
            cache_ttl: Some(Duration::from_secs(60 * 60)),
            frames: FrameTiming::default(),
            encode: EncodeSettings::default(),
            render_timeout: Some(Duration::from_secs(30)),
            encode_timeout: Some(Duration::from_secs(120)),
            font_path: None,
            ffmpeg_program: PathBuf::from("ffmpeg"),
        }
    }
}

impl ServiceConfig {
    /// Check every bound before the service starts.
    pub fn validate(&self) -> BratResult<()> {
        if self.image_cache_capacity == 0 || self.video_cache_capacity == 0 {
            return Err(BratError::validation("cache capacities must be non-zero"));
        }
        if matches!(self.cache_ttl, Some(ttl) if ttl.is_zero()) {
            return Err(BratError::validation(
                "cache ttl must be non-zero (use None to disable expiry)",
            ));
        }
        if matches!(self.render_timeout, Some(t) if t.is_zero())
            || matches!(self.encode_timeout, Some(t) if t.is_zero())
        {
            return Err(BratError::validation("timeouts must be non-zero when set"));
        }
        self.frames.validate()?;
        self.encode.validate()?;
        Ok(())
    }
}
