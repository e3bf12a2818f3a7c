use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::foundation::error::BratResult;
use crate::frames::sequencer::Frame;

/// One `file` + `duration` pair.
#[derive(Clone, Debug, PartialEq)]
pub struct ManifestEntry {
    /// Absolute path of the still.
    pub path: PathBuf,
    /// Seconds on screen.
    pub duration: f64,
}

/// Ordered frame list for ffmpeg's concat demuxer.
///
/// Exactly one entry per frame, in frame order; the longer hold of the final frame is that
/// entry's own duration, not an extra entry.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Manifest {
    entries: Vec<ManifestEntry>,
}

impl Manifest {
    /// Build a manifest from frames in display order.
    pub fn from_frames(frames: &[Frame]) -> Self {
        Self {
            entries: frames
                .iter()
                .map(|f| ManifestEntry {
                    path: f.path.clone(),
                    duration: f.duration,
                })
                .collect(),
        }
    }

    /// Entries in order.
    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    /// Concat-demuxer text.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            let _ = writeln!(out, "file '{}'", quote_path(&entry.path));
            let _ = writeln!(out, "duration {}", entry.duration);
        }
        out
    }

    /// Write the manifest to `path`. Failure is fatal for the generation.
    pub async fn write_to(&self, path: &Path) -> BratResult<()> {
        tokio::fs::write(path, self.render()).await?;
        Ok(())
    }
}

// Inside single quotes the concat demuxer only needs `'` escaped, as `'\''`.
fn quote_path(path: &Path) -> String {
    path.to_string_lossy().replace('\'', r"'\''")
}
