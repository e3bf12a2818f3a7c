use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use tokio::sync::OnceCell;

use crate::foundation::error::{BratError, BratResult};

/// Resolved font shared by every render call.
///
/// Loading touches the filesystem (and possibly scans every system font), so it happens once per
/// process; per-call layout and raster state is built fresh from these handles.
pub struct TextEngine {
    font_blob: parley::fontique::Blob<u8>,
    font: vello_cpu::peniko::FontData,
    source: String,
}

impl TextEngine {
    /// Load the font at `font_path`, or the best sans-serif face from the system database.
    ///
    /// Blocking.
    pub fn load(font_path: Option<&Path>) -> BratResult<Self> {
        let (bytes, face_index, source) = match font_path {
            Some(path) => {
                let bytes = std::fs::read(path)
                    .with_context(|| format!("read font file '{}'", path.display()))
                    .map_err(|e| BratError::render(format!("{e:#}")))?;
                (bytes, 0, path.display().to_string())
            }
            None => load_system_sans()?,
        };
        if bytes.is_empty() {
            return Err(BratError::render(format!("font '{source}' is empty")));
        }

        tracing::info!(font = %source, face_index, bytes = bytes.len(), "text engine ready");
        Ok(Self {
            font_blob: parley::fontique::Blob::from(bytes.clone()),
            font: vello_cpu::peniko::FontData::new(
                vello_cpu::peniko::Blob::from(bytes),
                face_index,
            ),
            source,
        })
    }

    /// Font bytes for layout.
    pub fn font_blob(&self) -> parley::fontique::Blob<u8> {
        self.font_blob.clone()
    }

    /// Font handle for glyph rasterization.
    pub fn font(&self) -> &vello_cpu::peniko::FontData {
        &self.font
    }

    /// Where the font came from (file path or face name).
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Hex SHA-256 of the font bytes, for telling apart hosts that resolve different faces.
    pub fn font_sha256(&self) -> String {
        use sha2::Digest as _;
        hex::encode(sha2::Sha256::digest(self.font_blob.data()))
    }
}

impl std::fmt::Debug for TextEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextEngine")
            .field("source", &self.source)
            .finish()
    }
}

fn load_system_sans() -> BratResult<(Vec<u8>, u32, String)> {
    use usvg::fontdb;

    let mut db = fontdb::Database::new();
    db.load_system_fonts();

    // The brat look is Arial Narrow; any sans-serif face will do.
    let families = [
        fontdb::Family::Name("Arial Narrow"),
        fontdb::Family::Name("Arial"),
        fontdb::Family::SansSerif,
    ];
    let query = fontdb::Query {
        families: &families,
        weight: fontdb::Weight::NORMAL,
        stretch: fontdb::Stretch::Normal,
        style: fontdb::Style::Normal,
    };

    let id = db
        .query(&query)
        .or_else(|| db.faces().next().map(|f| f.id))
        .ok_or_else(|| BratError::render("no system fonts available"))?;

    let name = db
        .face(id)
        .and_then(|f| f.families.first().map(|(name, _)| name.clone()))
        .unwrap_or_else(|| "unknown".to_string());

    let (bytes, face_index) = db
        .with_face_data(id, |data, index| (data.to_vec(), index))
        .ok_or_else(|| BratError::render(format!("failed to read font data for '{name}'")))?;

    Ok((bytes, face_index, name))
}

/// Process-wide, lazily initialized [`TextEngine`].
///
/// Cloning shares the same slot. Concurrent first callers wait on a single initialization; a
/// failed initialization is not cached, so the next call tries again.
#[derive(Clone, Debug, Default)]
pub struct EngineHandle {
    cell: Arc<OnceCell<Arc<TextEngine>>>,
    font_path: Option<PathBuf>,
}

impl EngineHandle {
    /// Create an uninitialized handle that will load `font_path` (or a system font) on first use.
    pub fn new(font_path: Option<PathBuf>) -> Self {
        Self {
            cell: Arc::new(OnceCell::new()),
            font_path,
        }
    }

    /// Return the engine, loading it on first call.
    pub async fn get(&self) -> BratResult<Arc<TextEngine>> {
        self.cell
            .get_or_try_init(|| async {
                let font_path = self.font_path.clone();
                let engine =
                    tokio::task::spawn_blocking(move || TextEngine::load(font_path.as_deref()))
                        .await
                        .map_err(|e| {
                            BratError::render(format!("font loading task failed: {e}"))
                        })??;
                Ok::<_, BratError>(Arc::new(engine))
            })
            .await
            .cloned()
    }

    /// Whether the engine has been loaded.
    pub fn is_initialized(&self) -> bool {
        self.cell.initialized()
    }
}
