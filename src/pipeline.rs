//! Pipeline – configuration and the document assembler that drives layout
//! and image loading over a [`PdfSurface`].

use serde::{Deserialize, Serialize};

use crate::content::{parse_content, LayoutElement};
use crate::error::ExportError;
use crate::image_loader::{place_image, ImageFetcher};
use crate::layout_config::LayoutConfig;
use crate::pagination::{
    break_page_if_needed, place_text, place_title, PageCursor, PageGeometry,
};
use crate::surface::{DocumentSurface, PdfSurface};

/// Page orientation for the generated PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageOrientation {
    #[default]
    Portrait,
    Landscape,
}

/// Configuration for the export pipeline. Lengths are millimetres, font
/// sizes are points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Page width in portrait orientation (default: A4 = 210).
    pub page_width: f32,
    /// Page height in portrait orientation (default: A4 = 297).
    pub page_height: f32,
    pub page_margin: f32,
    pub orientation: PageOrientation,
    /// A new page starts before any element whose entry `y` is further than
    /// this from the top, measured up from the page bottom.
    pub break_threshold: f32,
    pub title_font_size: f32,
    pub title_line_height: f32,
    /// Extra space below the title.
    pub title_spacing: f32,
    pub text_font_size: f32,
    pub text_line_height: f32,
    pub fallback_font_size: f32,
    pub fallback_line_height: f32,
    /// Extra space below an embedded image.
    pub image_spacing: f32,
    /// Millimetres per source pixel before the width and height caps.
    /// Assumes images arrive at about ten times their display size.
    pub image_scale: f32,
    pub max_image_height: f32,
    /// JPEG quality (1–100) for re-encoded fetched images.
    pub jpeg_quality: u8,
    /// Base for relative image references. Without one they are local paths.
    pub base_url: Option<String>,
    pub fetch_timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            page_width: 210.0,
            page_height: 297.0,
            page_margin: 20.0,
            orientation: PageOrientation::Portrait,
            break_threshold: 30.0,
            title_font_size: 18.0,
            title_line_height: 10.0,
            title_spacing: 10.0,
            text_font_size: 12.0,
            text_line_height: 7.0,
            fallback_font_size: 10.0,
            fallback_line_height: 5.0,
            image_spacing: 10.0,
            image_scale: 0.1,
            max_image_height: 100.0,
            jpeg_quality: 80,
            base_url: None,
            fetch_timeout_secs: 30,
        }
    }
}

impl PipelineConfig {
    /// Effective page width after applying orientation.
    pub fn effective_width(&self) -> f32 {
        match self.orientation {
            PageOrientation::Portrait => self.page_width,
            PageOrientation::Landscape => self.page_height,
        }
    }

    /// Effective page height after applying orientation.
    pub fn effective_height(&self) -> f32 {
        match self.orientation {
            PageOrientation::Portrait => self.page_height,
            PageOrientation::Landscape => self.page_width,
        }
    }

    pub fn a4_landscape() -> Self {
        Self {
            orientation: PageOrientation::Landscape,
            ..Self::default()
        }
    }

    /// Parse a JSON config. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ExportError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ExportError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ExportError> {
        let fail = |msg: String| -> Result<(), ExportError> { Err(ExportError::Config(msg)) };
        if !(self.page_width > 0.0 && self.page_height > 0.0) {
            return fail(format!(
                "page size must be positive, got {}x{}",
                self.page_width, self.page_height
            ));
        }
        if self.page_margin < 0.0 || 2.0 * self.page_margin >= self.effective_width() {
            return fail(format!(
                "margin {} leaves no usable width",
                self.page_margin
            ));
        }
        if self.break_threshold < 0.0 || self.break_threshold >= self.effective_height() {
            return fail(format!("break threshold {} is out of range", self.break_threshold));
        }
        if !(self.image_scale > 0.0 && self.max_image_height > 0.0) {
            return fail("image scale and max image height must be positive".to_string());
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return fail(format!("JPEG quality {} is not in 1..=100", self.jpeg_quality));
        }
        Ok(())
    }
}

/// Lower-case `title` and replace every character outside `[a-zA-Z0-9]`
/// with `_`.
pub fn sanitize_title(title: &str) -> String {
    title
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// Output file name for a note titled `title`.
pub fn output_file_name(title: &str) -> String {
    format!("{}.pdf", sanitize_title(title))
}

/// Where one element ended up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub element_index: usize,
    pub page: usize,
    /// Cursor `y` the element was placed at.
    pub y: f32,
    pub height: f32,
    pub page_break_before: bool,
    pub image_size: Option<(f32, f32)>,
}

/// A laid-out document ready to serialise.
#[derive(Debug, Clone)]
pub struct AssembledDocument<S = DocumentSurface> {
    pub title: String,
    pub file_name: String,
    pub placements: Vec<Placement>,
    pub surface: S,
}

impl<S: PdfSurface> AssembledDocument<S> {
    pub fn page_count(&self) -> usize {
        self.surface.current_page() + 1
    }

    pub fn to_pdf_bytes(&self) -> Result<Vec<u8>, ExportError> {
        self.surface.save().map_err(ExportError::Render)
    }
}

impl AssembledDocument<DocumentSurface> {
    pub fn layout(&self) -> &LayoutConfig {
        self.surface.layout()
    }
}

/// Lay out `title` and `elements` on a fresh surface sized from `config`.
pub async fn assemble<F: ImageFetcher + ?Sized>(
    title: &str,
    elements: &[LayoutElement],
    fetcher: &F,
    config: &PipelineConfig,
) -> Result<AssembledDocument, ExportError> {
    config.validate()?;
    let surface = DocumentSurface::new(title, config.effective_width(), config.effective_height());
    Ok(assemble_on(surface, title, elements, fetcher, config).await)
}

/// Lay out `title` and `elements` on `surface`.
///
/// Elements are placed strictly in order; each image is loaded and placed
/// before the next element is looked at.
pub async fn assemble_on<S, F>(
    mut surface: S,
    title: &str,
    elements: &[LayoutElement],
    fetcher: &F,
    config: &PipelineConfig,
) -> AssembledDocument<S>
where
    S: PdfSurface,
    F: ImageFetcher + ?Sized,
{
    let geometry = PageGeometry::of(&surface, config.page_margin);
    let mut cursor = PageCursor::at_top(&geometry);

    let title_placement = place_title(&mut surface, title, &cursor, &geometry, config);
    cursor.advance(&title_placement);

    let mut placements = Vec::with_capacity(elements.len());
    for (element_index, element) in elements.iter().enumerate() {
        let page_break_before =
            break_page_if_needed(&mut surface, &mut cursor, &geometry, config.break_threshold);
        let entry = cursor;

        let result = match element {
            LayoutElement::Text { content } => {
                place_text(&mut surface, content, &cursor, &geometry, config)
            }
            LayoutElement::Image { source, alt_text } => {
                place_image(
                    &mut surface,
                    fetcher,
                    source,
                    alt_text,
                    geometry.margin,
                    cursor.y,
                    geometry.usable_width(),
                    config,
                )
                .await
            }
        };
        cursor.advance(&result);
        log::debug!(
            "Element {element_index} placed on page {} at y={:.1} (+{:.1})",
            entry.page + 1,
            entry.y,
            result.height
        );

        placements.push(Placement {
            element_index,
            page: entry.page,
            y: entry.y,
            height: result.height,
            page_break_before,
            image_size: result.image_size,
        });
    }

    AssembledDocument {
        title: title.to_string(),
        file_name: output_file_name(title),
        placements,
        surface,
    }
}

/// Full pipeline: title + note markup → PDF bytes and the layout record.
pub async fn generate_pdf<F: ImageFetcher + ?Sized>(
    title: &str,
    markup: &str,
    fetcher: &F,
    config: &PipelineConfig,
) -> Result<(Vec<u8>, LayoutConfig), ExportError> {
    let elements = parse_content(markup);
    let document = assemble(title, &elements, fetcher, config).await?;
    let bytes = document.to_pdf_bytes()?;
    Ok((bytes, document.surface.into_layout()))
}
