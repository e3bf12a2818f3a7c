use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Context as _;

use crate::foundation::error::BratResult;

// Process-wide, so two calls within the same millisecond still get distinct names.
static NEXT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Directory holding every generated file.
///
/// Naming convention:
///
/// - still images: `brat_<millis>_<seq>_<index>.png`
/// - videos: `brat_<millis>_<seq>.mp4`
/// - frame manifests: `filelist_<millis>_<seq>.txt` (one per video generation)
#[derive(Clone, Debug)]
pub struct ScratchDir {
    root: PathBuf,
}

impl ScratchDir {
    /// Create `root` if needed and resolve it to an absolute path.
    ///
    /// Manifests reference frames by absolute path, so a relative root would break the encoder's
    /// path resolution.
    pub fn create(root: impl Into<PathBuf>) -> BratResult<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)
            .with_context(|| format!("create scratch directory '{}'", root.display()))?;
        let root = root
            .canonicalize()
            .with_context(|| format!("resolve scratch directory '{}'", root.display()))?;
        Ok(Self { root })
    }

    /// Absolute scratch root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Fresh path for a still image tagged with `index`.
    pub fn image_path(&self, index: usize) -> PathBuf {
        self.root.join(format!("brat_{}_{index}.png", stamp()))
    }

    /// Fresh path for a video artifact.
    pub fn video_path(&self) -> PathBuf {
        self.root.join(format!("brat_{}.mp4", stamp()))
    }

    /// Fresh path for a frame manifest.
    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(format!("filelist_{}.txt", stamp()))
    }
}

fn stamp() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    let seq = NEXT_SEQ.fetch_add(1, Ordering::Relaxed);
    format!("{millis}_{seq}")
}

/// Delete `path`, logging instead of failing. A missing file is not an error.
pub async fn remove_best_effort(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => tracing::trace!(path = %path.display(), "removed scratch file"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to remove scratch file")
        }
    }
}

/// Blocking variant of [`remove_best_effort`] for drop guards and eviction callbacks.
pub fn remove_best_effort_blocking(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => tracing::trace!(path = %path.display(), "removed scratch file"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to remove scratch file")
        }
    }
}

/// Delete `path` without blocking the caller.
///
/// Inside a tokio runtime the delete runs on the blocking pool; elsewhere it runs inline. Used
/// from synchronous cache code that may hold locks or run on a runtime worker.
pub fn remove_detached(path: PathBuf) {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn_blocking(move || remove_best_effort_blocking(&path));
        }
        Err(_) => remove_best_effort_blocking(&path),
    }
}
