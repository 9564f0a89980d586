use std::path::Path;

use anyhow::Context as _;

use crate::foundation::core::{FrameRGBA, Point, Rgba8, Size};
use crate::foundation::error::{ReelError, ReelResult};
use crate::render::surface::Surface;

/// Brush color carried through Parley layouts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct TextBrush {
    r: u8,
    g: u8,
    b: u8,
    a: u8,
}

impl From<Rgba8> for TextBrush {
    fn from(c: Rgba8) -> Self {
        Self {
            r: c.r,
            g: c.g,
            b: c.b,
            a: c.a,
        }
    }
}

/// Builds single-line Parley layouts from one registered font.
pub(crate) struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrush>,
    family_name: String,
}

impl TextLayoutEngine {
    pub(crate) fn new(font_bytes: &[u8]) -> ReelResult<Self> {
        let mut font_ctx = parley::FontContext::default();
        let families = font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font_bytes.to_vec()), None);
        let family_id = families
            .first()
            .map(|(id, _)| *id)
            .ok_or_else(|| ReelError::render("no font families registered from font bytes"))?;
        let family_name = font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| ReelError::render("registered font family has no name"))?
            .to_string();

        Ok(Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            family_name,
        })
    }

    pub(crate) fn family_name(&self) -> &str {
        &self.family_name
    }

    pub(crate) fn layout_line(
        &mut self,
        text: &str,
        size_px: f32,
        brush: TextBrush,
    ) -> ReelResult<parley::Layout<TextBrush>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(ReelError::validation(
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

        let mut layout: parley::Layout<TextBrush> = builder.build(text);
        layout.break_all_lines(None);
        Ok(layout)
    }
}

/// Software surface: `vello_cpu` rasterisation with text shaped by `parley`.
pub struct CpuSurface {
    size: Size,
    ctx: vello_cpu::RenderContext,
    pixmap: vello_cpu::Pixmap,
    text: TextLayoutEngine,
    font: vello_cpu::peniko::FontData,
    font_bytes: std::sync::Arc<Vec<u8>>,
}

impl CpuSurface {
    /// Create a surface of `size` drawing text with the given TrueType/OpenType font bytes.
    pub fn new(size: Size, font_bytes: Vec<u8>) -> ReelResult<Self> {
        let (w, h) = dims_u16(size)?;
        let text = TextLayoutEngine::new(&font_bytes)?;
        let font_bytes = std::sync::Arc::new(font_bytes);
        let font = vello_cpu::peniko::FontData::new(
            vello_cpu::peniko::Blob::from(font_bytes.as_ref().clone()),
            0,
        );
        Ok(Self {
            size,
            ctx: vello_cpu::RenderContext::new(w, h),
            pixmap: vello_cpu::Pixmap::new(w, h),
            text,
            font,
            font_bytes,
        })
    }

    /// Create a surface using the font file at `font_path`.
    pub fn from_font_file(size: Size, font_path: &Path) -> ReelResult<Self> {
        let bytes = std::fs::read(font_path)
            .with_context(|| format!("read font '{}'", font_path.display()))?;
        Self::new(size, bytes)
    }

    /// Family name resolved from the font bytes.
    pub fn font_family(&self) -> &str {
        self.text.family_name()
    }

    /// Raw font bytes in use.
    pub fn font_bytes(&self) -> &[u8] {
        &self.font_bytes
    }
}

impl Surface for CpuSurface {
    fn size(&self) -> Size {
        self.size
    }

    fn resize(&mut self, size: Size) -> ReelResult<()> {
        if size == self.size {
            return Ok(());
        }
        let (w, h) = dims_u16(size)?;
        self.ctx = vello_cpu::RenderContext::new(w, h);
        self.pixmap = vello_cpu::Pixmap::new(w, h);
        self.size = size;
        Ok(())
    }

    fn clear(&mut self) {
        self.ctx.reset();
        clear_pixmap(&mut self.pixmap, [0, 0, 0, 0]);
    }

    fn fill(&mut self, color: Rgba8) {
        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
            color.r, color.g, color.b, color.a,
        ));
        self.ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(self.size.width),
            f64::from(self.size.height),
        ));
    }

    fn measure_text(&mut self, text: &str, font_size_px: f32) -> ReelResult<f32> {
        let layout = self
            .text
            .layout_line(text, font_size_px, TextBrush::default())?;
        Ok(layout.width())
    }

    fn draw_text(
        &mut self,
        text: &str,
        center: Point,
        font_size_px: f32,
        color: Rgba8,
        opacity: f32,
    ) -> ReelResult<()> {
        let opacity = opacity.clamp(0.0, 1.0);
        if opacity == 0.0 || text.is_empty() {
            return Ok(());
        }

        let layout = self.text.layout_line(text, font_size_px, color.into())?;
        let x = center.x - f64::from(layout.width()) / 2.0;
        let y = center.y - f64::from(layout.height()) / 2.0;
        self.ctx
            .set_transform(vello_cpu::kurbo::Affine::translate((x, y)));

        if opacity < 1.0 {
            self.ctx.push_opacity_layer(opacity);
        }
        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let brush = run.style().brush;
                self.ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                    brush.r, brush.g, brush.b, brush.a,
                ));
                let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                self.ctx
                    .glyph_run(&self.font)
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }
        if opacity < 1.0 {
            self.ctx.pop_layer();
        }
        Ok(())
    }

    fn snapshot(&mut self) -> ReelResult<FrameRGBA> {
        self.ctx.flush();
        self.ctx.render_to_pixmap(&mut self.pixmap);
        Ok(FrameRGBA {
            width: self.size.width,
            height: self.size.height,
            data: self.pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        })
    }
}

fn dims_u16(size: Size) -> ReelResult<(u16, u16)> {
    let w: u16 = size
        .width
        .try_into()
        .map_err(|_| ReelError::validation("surface width exceeds u16"))?;
    let h: u16 = size
        .height
        .try_into()
        .map_err(|_| ReelError::validation("surface height exceeds u16"))?;
    if w == 0 || h == 0 {
        return Err(ReelError::validation("surface width/height must be non-zero"));
    }
    Ok((w, h))
}

fn clear_pixmap(pixmap: &mut vello_cpu::Pixmap, rgba: [u8; 4]) {
    let data = pixmap.data_as_u8_slice_mut();
    for px in data.chunks_exact_mut(4) {
        px.copy_from_slice(&rgba);
    }
}
