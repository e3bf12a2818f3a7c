use crate::foundation::error::{BratError, BratResult};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// RGBA8 brush color used by Parley text layout.
pub struct TextBrushRgba8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl From<[u8; 4]> for TextBrushRgba8 {
    fn from([r, g, b, a]: [u8; 4]) -> Self {
        Self { r, g, b, a }
    }
}

/// Font-size search bounds for [`TextLayoutEngine::fit`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FitBounds {
    /// Maximum line width in px.
    pub max_width: f32,
    /// Maximum block height in px.
    pub max_height: f32,
    /// First (largest) size tried.
    pub start_px: f32,
    /// Smallest size; used even if the text still overflows.
    pub min_px: f32,
    /// Multiplier applied after each overflowing attempt, in `(0, 1)`.
    pub shrink: f32,
}

/// Font context that knows only explicitly registered fonts.
///
/// The default context enumerates every installed font, which is wasted work per render call.
fn isolated_font_context() -> parley::FontContext {
    parley::FontContext {
        collection: parley::fontique::Collection::new(parley::fontique::CollectionOptions {
            shared: false,
            system_fonts: false,
        }),
        source_cache: parley::fontique::SourceCache::default(),
    }
}

/// Parley layout for one render call.
///
/// Owns its own font and layout contexts, so concurrent renders never share shaping state.
pub struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    family_name: String,
}

impl TextLayoutEngine {
    /// Register `font` in a fresh font context.
    pub fn new(font: parley::fontique::Blob<u8>) -> BratResult<Self> {
        let mut font_ctx = isolated_font_context();
        let families = font_ctx.collection.register_fonts(font, None);
        let family_id = families
            .first()
            .map(|(id, _)| *id)
            .ok_or_else(|| BratError::render("no font families registered from font bytes"))?;
        let family_name = font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| BratError::render("registered font family has no name"))?
            .to_string();

        Ok(Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            family_name,
        })
    }

    /// Family name of the registered font.
    #[cfg(test)]
    pub fn family_name(&self) -> &str {
        &self.family_name
    }

    /// Shape `text` at `size_px`, wrapping at `max_width_px` when given.
    pub fn layout(
        &mut self,
        text: &str,
        size_px: f32,
        brush: TextBrushRgba8,
        max_width_px: Option<f32>,
    ) -> BratResult<parley::Layout<TextBrushRgba8>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(BratError::validation(
                "text size_px must be finite and > 0",
            ));
        }

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(self.family_name.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(max_width_px);
        layout.align(
            max_width_px,
            parley::Alignment::Start,
            parley::AlignmentOptions::default(),
        );
        Ok(layout)
    }

    /// Largest size (stepping down from `bounds.start_px`) whose wrapped layout fits the box.
    pub fn fit(
        &mut self,
        text: &str,
        brush: TextBrushRgba8,
        bounds: FitBounds,
    ) -> BratResult<(parley::Layout<TextBrushRgba8>, f32)> {
        if !(bounds.shrink > 0.0 && bounds.shrink < 1.0) {
            return Err(BratError::validation("fit shrink factor must be in (0, 1)"));
        }
        if !(bounds.min_px > 0.0 && bounds.min_px <= bounds.start_px) {
            return Err(BratError::validation(
                "fit bounds need 0 < min_px <= start_px",
            ));
        }

        let mut size = bounds.start_px;
        loop {
            let layout = self.layout(text, size, brush, Some(bounds.max_width))?;
            let fits = layout.width() <= bounds.max_width && layout.height() <= bounds.max_height;
            if fits || size <= bounds.min_px {
                return Ok((layout, size));
            }
            size = (size * bounds.shrink).max(bounds.min_px);
        }
    }
}
