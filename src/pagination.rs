//! Pagination – places the title, text runs and images down the page and
//! starts a new page when the cursor gets close to the bottom.
//!
//! Page units are millimetres. Every placement reports how far it moved the
//! cursor; the caller adds that to `cursor.y`.

use crate::fonts::FontStyle;
use crate::pipeline::PipelineConfig;
use crate::surface::PdfSurface;

/// Page size and the uniform margin around the content area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
}

impl PageGeometry {
    /// Geometry of the pages `surface` produces.
    pub fn of<S: PdfSurface + ?Sized>(surface: &S, margin: f32) -> Self {
        Self {
            width: surface.page_width(),
            height: surface.page_height(),
            margin,
        }
    }

    pub fn usable_width(&self) -> f32 {
        self.width - 2.0 * self.margin
    }

    pub fn usable_height(&self) -> f32 {
        self.height - 2.0 * self.margin
    }
}

/// Current writing position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageCursor {
    pub y: f32,
    pub page: usize,
}

impl PageCursor {
    pub fn at_top(geometry: &PageGeometry) -> Self {
        Self {
            y: geometry.margin,
            page: 0,
        }
    }

    pub fn advance(&mut self, placement: &PlacementResult) {
        self.y += placement.height;
    }
}

/// Outcome of placing one element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementResult {
    /// Vertical space consumed.
    pub height: f32,
    /// Final `(width, height)` of an embedded image.
    pub image_size: Option<(f32, f32)>,
}

impl PlacementResult {
    pub fn text(height: f32) -> Self {
        Self {
            height,
            image_size: None,
        }
    }
}

/// `true` when the cursor has entered the bottom break zone.
pub fn needs_page_break(cursor: &PageCursor, geometry: &PageGeometry, threshold: f32) -> bool {
    cursor.y > geometry.height - threshold
}

/// Start a new page if the cursor is inside the bottom break zone. Returns
/// whether a break happened.
pub fn break_page_if_needed<S: PdfSurface + ?Sized>(
    surface: &mut S,
    cursor: &mut PageCursor,
    geometry: &PageGeometry,
    threshold: f32,
) -> bool {
    if !needs_page_break(cursor, geometry, threshold) {
        return false;
    }
    surface.add_page();
    cursor.y = geometry.margin;
    cursor.page += 1;
    log::debug!("Page break: now on page {}", cursor.page + 1);
    true
}

/// Place the document title at the top margin in the bold title font.
pub fn place_title<S: PdfSurface + ?Sized>(
    surface: &mut S,
    title: &str,
    cursor: &PageCursor,
    geometry: &PageGeometry,
    config: &PipelineConfig,
) -> PlacementResult {
    surface.set_font(config.title_font_size, FontStyle::BOLD);
    let lines = surface.split_text_to_size(title, geometry.usable_width());
    surface.text(&lines, geometry.margin, cursor.y, config.title_line_height);
    PlacementResult::text(lines.len() as f32 * config.title_line_height + config.title_spacing)
}

/// Place a run of body text wrapped to the usable width.
pub fn place_text<S: PdfSurface + ?Sized>(
    surface: &mut S,
    content: &str,
    cursor: &PageCursor,
    geometry: &PageGeometry,
    config: &PipelineConfig,
) -> PlacementResult {
    surface.set_font(config.text_font_size, FontStyle::NORMAL);
    let lines = surface.split_text_to_size(content, geometry.usable_width());
    surface.text(&lines, geometry.margin, cursor.y, config.text_line_height);
    PlacementResult::text(lines.len() as f32 * config.text_line_height)
}

/// Place the small italic line that stands in for an image.
pub fn place_fallback<S: PdfSurface + ?Sized>(
    surface: &mut S,
    message: &str,
    x: f32,
    y: f32,
    max_width: f32,
    config: &PipelineConfig,
) -> PlacementResult {
    surface.set_font(config.fallback_font_size, FontStyle::ITALIC);
    let lines = surface.split_text_to_size(message, max_width);
    surface.text(&lines, x, y, config.fallback_line_height);
    PlacementResult::text(lines.len() as f32 * config.fallback_line_height)
}

/// Scale an image of `natural_width × natural_height` pixels to page units.
///
/// The width starts at `natural_width * scale`, capped by `max_width`. If the
/// resulting height exceeds `max_height` the height is pinned there and the
/// width follows from the aspect ratio. Returns `None` for degenerate sizes.
pub fn fit_image(
    natural_width: u32,
    natural_height: u32,
    max_width: f32,
    scale: f32,
    max_height: f32,
) -> Option<(f32, f32)> {
    if natural_width == 0 || natural_height == 0 {
        return None;
    }
    let aspect = natural_width as f32 / natural_height as f32;
    let mut width = max_width.min(natural_width as f32 * scale);
    let mut height = width / aspect;
    if height > max_height {
        height = max_height;
        width = height * aspect;
    }
    (width > 0.0 && height > 0.0).then_some((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::DocumentSurface;

    fn a4() -> PageGeometry {
        PageGeometry {
            width: 210.0,
            height: 297.0,
            margin: 20.0,
        }
    }

    #[test]
    fn usable_area() {
        assert_eq!(a4().usable_width(), 170.0);
        assert_eq!(a4().usable_height(), 257.0);
    }

    #[test]
    fn break_only_strictly_past_threshold() {
        let geometry = a4();
        let mut surface = DocumentSurface::a4("t");

        let mut cursor = PageCursor { y: 267.0, page: 0 };
        assert!(!break_page_if_needed(&mut surface, &mut cursor, &geometry, 30.0));
        assert_eq!(cursor.y, 267.0);

        let mut cursor = PageCursor { y: 267.5, page: 0 };
        assert!(break_page_if_needed(&mut surface, &mut cursor, &geometry, 30.0));
        assert_eq!(cursor, PageCursor { y: 20.0, page: 1 });
        assert_eq!(surface.current_page(), 1);
    }

    #[test]
    fn title_height_counts_lines() {
        let geometry = a4();
        let config = PipelineConfig::default();
        let mut surface = DocumentSurface::a4("t");
        let cursor = PageCursor::at_top(&geometry);

        let short = place_title(&mut surface, "Short", &cursor, &geometry, &config);
        assert_eq!(short.height, 20.0);

        let long = "a very long title ".repeat(20);
        let placed = place_title(&mut surface, &long, &cursor, &geometry, &config);
        let lines = surface.layout().pages[0].boxes[1].text.as_ref().unwrap().lines.len();
        assert!(lines > 1);
        assert_eq!(placed.height, lines as f32 * 10.0 + 10.0);
    }

    #[test]
    fn text_height_is_seven_per_line() {
        let geometry = a4();
        let config = PipelineConfig::default();
        let mut surface = DocumentSurface::a4("t");
        let cursor = PageCursor::at_top(&geometry);
        assert_eq!(
            place_text(&mut surface, "Hello", &cursor, &geometry, &config).height,
            7.0
        );
        let text = surface.layout().pages[0].boxes[0].text.as_ref().unwrap();
        assert!(!text.bold);
        assert_eq!(text.font_size, 12.0);
    }

    #[test]
    fn fallback_is_small_italic() {
        let config = PipelineConfig::default();
        let mut surface = DocumentSurface::a4("t");
        let placed = place_fallback(&mut surface, "[Image: x]", 20.0, 40.0, 170.0, &config);
        assert_eq!(placed, PlacementResult::text(5.0));
        let text = surface.layout().pages[0].boxes[0].text.as_ref().unwrap();
        assert!(text.italic);
        assert_eq!(text.font_size, 10.0);
    }

    #[test]
    fn fit_small_image_uses_scale() {
        let (w, h) = fit_image(200, 100, 170.0, 0.1, 100.0).unwrap();
        assert!((w - 20.0).abs() < 1e-4);
        assert!((h - 10.0).abs() < 1e-4);
    }

    #[test]
    fn fit_wide_image_caps_at_max_width() {
        let (w, h) = fit_image(4000, 1000, 170.0, 0.1, 100.0).unwrap();
        assert_eq!(w, 170.0);
        assert!((h - 42.5).abs() < 1e-4);
    }

    #[test]
    fn fit_tall_image_caps_height_and_keeps_ratio() {
        let (w, h) = fit_image(3000, 2000, 170.0, 0.1, 100.0).unwrap();
        assert_eq!(h, 100.0);
        assert!((w - 150.0).abs() < 1e-3);

        let (w, h) = fit_image(500, 2000, 170.0, 0.1, 100.0).unwrap();
        assert_eq!(h, 100.0);
        assert!((w / h - 0.25).abs() < 1e-6);
    }

    #[test]
    fn fit_preserves_aspect_ratio_everywhere() {
        for (nw, nh) in [(1, 1), (7, 3), (640, 480), (100, 5000), (12000, 90), (333, 777)] {
            let (w, h) = fit_image(nw, nh, 170.0, 0.1, 100.0).unwrap();
            let natural = nw as f32 / nh as f32;
            assert!(
                ((w / h) - natural).abs() / natural < 1e-4,
                "{nw}x{nh} became {w}x{h}"
            );
            assert!(h <= 100.0 + 1e-4);
            assert!(w <= 170.0 + 1e-4);
        }
    }

    #[test]
    fn degenerate_image_does_not_fit() {
        assert_eq!(fit_image(0, 10, 170.0, 0.1, 100.0), None);
        assert_eq!(fit_image(10, 0, 170.0, 0.1, 100.0), None);
    }
}
