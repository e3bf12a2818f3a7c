use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::foundation::error::{BratError, BratResult};
use crate::foundation::scratch::{ScratchDir, remove_best_effort_blocking};
use crate::render::backend::Renderer;
use crate::render::engine::{EngineHandle, TextEngine};
use crate::render::layout::{FitBounds, TextLayoutEngine};

/// Look of the rendered text box.
#[derive(Clone, Debug, PartialEq)]
pub struct TextStyle {
    /// Side of the square capture region, in px.
    pub box_px: u32,
    /// Inset between the box edge and the text block.
    pub padding_px: f32,
    /// Starting font size; shrinks until the text fits.
    pub max_font_px: f32,
    /// Smallest font size tried.
    pub min_font_px: f32,
    /// Per-step font size multiplier.
    pub shrink: f32,
    /// Gaussian blur sigma applied to the capture. `0` disables blur.
    pub blur_sigma: f32,
    /// Text color (straight RGBA8).
    pub fg_rgba: [u8; 4],
    /// Opaque background color (straight RGBA8).
    pub bg_rgba: [u8; 4],
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            box_px: 500,
            padding_px: 24.0,
            max_font_px: 120.0,
            min_font_px: 24.0,
            shrink: 0.9,
            blur_sigma: 1.1,
            fg_rgba: [0, 0, 0, 255],
            bg_rgba: [255, 255, 255, 255],
        }
    }
}

impl TextStyle {
    /// Check geometry and colors.
    pub fn validate(&self) -> BratResult<()> {
        if self.box_px == 0 || self.box_px > u32::from(u16::MAX) {
            return Err(BratError::validation("text box size must be in 1..=65535"));
        }
        if !self.padding_px.is_finite()
            || self.padding_px < 0.0
            || self.padding_px * 2.0 >= self.box_px as f32
        {
            return Err(BratError::validation(
                "text padding must leave a non-empty inner box",
            ));
        }
        if !self.blur_sigma.is_finite() || self.blur_sigma < 0.0 {
            return Err(BratError::validation("blur sigma must be finite and >= 0"));
        }
        if self.bg_rgba[3] != 255 {
            // The pixmap is premultiplied; an opaque background makes it byte-identical to
            // straight RGBA, which is what PNG expects.
            return Err(BratError::validation("background color must be opaque"));
        }
        Ok(())
    }

    fn fit_bounds(&self) -> FitBounds {
        let inner = self.box_px as f32 - 2.0 * self.padding_px;
        FitBounds {
            max_width: inner,
            max_height: inner,
            start_px: self.max_font_px,
            min_px: self.min_font_px,
            shrink: self.shrink,
        }
    }
}

/// Built-in [`Renderer`]: parley shaping, `vello_cpu` rasterization, PNG output.
///
/// Every call builds its own layout and raster contexts on a blocking thread; only the loaded font
/// is shared, through [`EngineHandle`].
#[derive(Clone, Debug)]
pub struct TextRenderer {
    engine: EngineHandle,
    scratch: ScratchDir,
    style: TextStyle,
}

impl TextRenderer {
    /// Create a renderer writing into `scratch`.
    pub fn new(engine: EngineHandle, scratch: ScratchDir, style: TextStyle) -> BratResult<Self> {
        style.validate()?;
        Ok(Self {
            engine,
            scratch,
            style,
        })
    }

    /// Shared engine handle.
    pub fn engine(&self) -> &EngineHandle {
        &self.engine
    }
}

#[async_trait::async_trait]
impl Renderer for TextRenderer {
    #[tracing::instrument(
        level = "debug",
        skip(self, text),
        fields(words = text.split_whitespace().count())
    )]
    async fn render(&self, text: &str, index: usize) -> BratResult<PathBuf> {
        let engine = self.engine.get().await?;
        let path = self.scratch.image_path(index);

        let pending = PendingFile::new(path.clone());
        let cancelled = pending.flag();
        let text = text.to_owned();
        let style = self.style.clone();
        let out = path.clone();

        tokio::task::spawn_blocking(move || {
            let result = rasterize_text(&engine, &text, &style)
                .and_then(|img| write_png(&img, &out));
            // The awaiting side may have given up (deadline) while we were drawing.
            if cancelled.load(Ordering::SeqCst) {
                remove_best_effort_blocking(&out);
            }
            result
        })
        .await
        .map_err(|e| BratError::render(format!("render task failed: {e}")))??;

        pending.keep();
        tracing::debug!(path = %path.display(), "rendered still");
        Ok(path)
    }
}

/// Removes a file whose producing call was abandoned before it finished.
struct PendingFile {
    path: PathBuf,
    cancelled: Arc<AtomicBool>,
    armed: bool,
}

impl PendingFile {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            cancelled: Arc::new(AtomicBool::new(false)),
            armed: true,
        }
    }

    fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    fn keep(mut self) {
        self.armed = false;
    }
}

impl Drop for PendingFile {
    fn drop(&mut self) {
        if self.armed {
            self.cancelled.store(true, Ordering::SeqCst);
            remove_best_effort_blocking(&self.path);
        }
    }
}

/// Lay out and draw `text`, returning the captured box as straight RGBA8.
pub fn rasterize_text(
    engine: &TextEngine,
    text: &str,
    style: &TextStyle,
) -> BratResult<image::RgbaImage> {
    if text.trim().is_empty() {
        return Err(BratError::render("nothing to render: text is blank"));
    }
    let mut layouts = TextLayoutEngine::new(engine.font_blob())?;
    let (layout, size_px) = layouts.fit(text, style.fg_rgba.into(), style.fit_bounds())?;
    let region = measured_region(style.padding_px, layout.width(), layout.height())?;
    tracing::trace!(size_px, ?region, "text fitted");

    let side: u16 = style
        .box_px
        .try_into()
        .map_err(|_| BratError::render("text box exceeds u16"))?;
    let mut ctx = vello_cpu::RenderContext::new(side, side);

    let [br, bg, bb, ba] = style.bg_rgba;
    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(br, bg, bb, ba));
    ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
        0.0,
        0.0,
        f64::from(side),
        f64::from(side),
    ));

    ctx.set_transform(vello_cpu::kurbo::Affine::translate((region.x0, region.y0)));
    for line in layout.lines() {
        for item in line.items() {
            let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                continue;
            };
            let brush = run.style().brush;
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                brush.r, brush.g, brush.b, brush.a,
            ));
            let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                id: g.id,
                x: g.x,
                y: g.y,
            });
            ctx.glyph_run(engine.font())
                .font_size(run.run().font_size())
                .fill_glyphs(glyphs);
        }
    }
    ctx.flush();

    let mut pixmap = vello_cpu::Pixmap::new(side, side);
    ctx.render_to_pixmap(&mut pixmap);

    let captured = image::RgbaImage::from_raw(
        u32::from(side),
        u32::from(side),
        pixmap.data_as_u8_slice().to_vec(),
    )
    .ok_or_else(|| BratError::render("captured pixel buffer has unexpected size"))?;

    if style.blur_sigma > 0.0 {
        Ok(image::imageops::blur(&captured, style.blur_sigma))
    } else {
        Ok(captured)
    }
}

/// Region covered by a laid-out text block placed at `(padding, padding)`.
///
/// Fails when the block is empty or its size is not a finite positive number, which is how
/// whitespace-only text shows up.
pub fn measured_region(padding: f32, width: f32, height: f32) -> BratResult<kurbo::Rect> {
    if !(width.is_finite() && height.is_finite()) || width <= 0.0 || height <= 0.0 {
        return Err(BratError::render(format!(
            "text region is not measurable ({width}x{height})"
        )));
    }
    let origin = f64::from(padding);
    Ok(kurbo::Rect::new(
        origin,
        origin,
        origin + f64::from(width),
        origin + f64::from(height),
    ))
}

fn write_png(img: &image::RgbaImage, path: &Path) -> BratResult<()> {
    img.save_with_format(path, image::ImageFormat::Png)
        .map_err(|e| BratError::render(format!("write png '{}': {e}", path.display())))
}
