//! PDF surface – the drawing capabilities the assembler needs from a PDF
//! backend, and the printpdf-backed implementation.
//!
//! The surface keeps a single current page and a current font. Coordinates
//! are millimetres from the top-left corner; text `y` is the baseline of the
//! first line, image `y` is the top edge.

use printpdf::{PdfWarnMsg, RawImage};

use crate::error::EmbedError;
use crate::fonts::{wrap_text, Font, FontStyle};
use crate::image_loader::EncodedImage;
use crate::layout_config::{ImageContent, LayoutBox, LayoutConfig, TextContent};

pub trait PdfSurface {
    fn page_width(&self) -> f32;

    fn page_height(&self) -> f32;

    /// Zero-based index of the page currently being drawn on.
    fn current_page(&self) -> usize;

    fn set_font(&mut self, size_pt: f32, style: FontStyle);

    /// Wrap `text` in the current font to lines no wider than `max_width`.
    fn split_text_to_size(&self, text: &str, max_width: f32) -> Vec<String>;

    /// Draw `lines` in the current font, one every `line_height` mm.
    fn text(&mut self, lines: &[String], x: f32, y: f32, line_height: f32);

    fn add_page(&mut self);

    /// Embed an encoded raster at the given box. Fails when the backend
    /// cannot decode the bytes.
    fn add_image(
        &mut self,
        image: &EncodedImage,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    ) -> Result<(), EmbedError>;

    /// Serialise the finished document.
    fn save(&self) -> Result<Vec<u8>, String>;
}

/// A [`PdfSurface`] that records into a [`LayoutConfig`] and renders it with
/// printpdf on save.
#[derive(Debug, Clone)]
pub struct DocumentSurface {
    layout: LayoutConfig,
    font: Font,
}

impl DocumentSurface {
    pub fn new(title: &str, page_width: f32, page_height: f32) -> Self {
        Self {
            layout: LayoutConfig::new(title, page_width, page_height),
            font: Font::default(),
        }
    }

    pub fn a4(title: &str) -> Self {
        Self {
            layout: LayoutConfig::a4(title),
            font: Font::default(),
        }
    }

    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    pub fn into_layout(self) -> LayoutConfig {
        self.layout
    }
}

impl PdfSurface for DocumentSurface {
    fn page_width(&self) -> f32 {
        self.layout.page_width_mm
    }

    fn page_height(&self) -> f32 {
        self.layout.page_height_mm
    }

    fn current_page(&self) -> usize {
        self.layout.pages.len().saturating_sub(1)
    }

    fn set_font(&mut self, size_pt: f32, style: FontStyle) {
        self.font = Font::new(size_pt, style);
    }

    fn split_text_to_size(&self, text: &str, max_width: f32) -> Vec<String> {
        wrap_text(text, &self.font, max_width)
    }

    fn text(&mut self, lines: &[String], x: f32, y: f32, line_height: f32) {
        let width = lines
            .iter()
            .map(|l| self.font.text_width_mm(l))
            .fold(0.0, f32::max);
        self.layout.push_box(LayoutBox {
            x,
            y,
            width,
            height: lines.len() as f32 * line_height,
            text: Some(TextContent {
                lines: lines.to_vec(),
                font_size: self.font.size_pt,
                bold: self.font.style.bold,
                italic: self.font.style.italic,
                line_height,
            }),
            image: None,
        });
    }

    fn add_page(&mut self) {
        self.layout.push_page();
    }

    fn add_image(
        &mut self,
        image: &EncodedImage,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    ) -> Result<(), EmbedError> {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(EmbedError(format!("invalid image size {width}x{height}")));
        }
        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        RawImage::decode_from_bytes(&image.bytes, &mut warnings)
            .map_err(|e| EmbedError(e.to_string()))?;

        self.layout.push_box(LayoutBox {
            x,
            y,
            width,
            height,
            text: None,
            image: Some(ImageContent {
                src: image.to_data_uri(),
                px_width: image.px_width,
                px_height: image.px_height,
            }),
        });
        Ok(())
    }

    fn save(&self) -> Result<Vec<u8>, String> {
        crate::render::render_pdf(&self.layout)
    }
}
