use std::path::PathBuf;
use std::time::Duration;

use crate::foundation::error::{BratError, BratResult};

/// Turns text into one still image on disk.
///
/// Implementations must isolate concurrent calls from each other and write each result to a
/// unique path; `index` is folded into the file name so frames of one video never collide.
#[async_trait::async_trait]
pub trait Renderer: Send + Sync {
    /// Render `text` and return the path of the written PNG.
    async fn render(&self, text: &str, index: usize) -> BratResult<PathBuf>;
}

/// Call `renderer`, failing with [`BratError::Render`] if `deadline` elapses first.
pub async fn render_with_deadline(
    renderer: &dyn Renderer,
    text: &str,
    index: usize,
    deadline: Option<Duration>,
) -> BratResult<PathBuf> {
    let call = renderer.render(text, index);
    match deadline {
        None => call.await,
        Some(limit) => tokio::time::timeout(limit, call)
            .await
            .map_err(|_| BratError::render(format!("render timed out after {limit:?}")))?,
    }
}
