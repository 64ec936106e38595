//! Layout record – the frozen result of placing a note on pages. The PDF
//! surface appends to it while the assembler runs and the renderer turns it
//! into PDF bytes. It also serialises to JSON for inspection.

use serde::{Deserialize, Serialize};

/// A complete document layout ready for rendering. All coordinates are
/// millimetres from the top-left corner of the page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Document title embedded in the PDF metadata.
    pub title: String,
    pub page_width_mm: f32,
    pub page_height_mm: f32,
    pub pages: Vec<PageLayout>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageLayout {
    pub page_index: usize,
    pub boxes: Vec<LayoutBox>,
}

/// One placed item: either a block of text lines or an image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutBox {
    pub x: f32,
    /// For text, the baseline of the first line. For images, the top edge.
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub text: Option<TextContent>,
    pub image: Option<ImageContent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextContent {
    pub lines: Vec<String>,
    pub font_size: f32,
    pub bold: bool,
    pub italic: bool,
    /// Distance between consecutive baselines, in millimetres.
    pub line_height: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageContent {
    /// The encoded image as a base64 data URI.
    pub src: String,
    pub px_width: u32,
    pub px_height: u32,
}

impl LayoutConfig {
    /// An A4 portrait layout with a single empty page.
    pub fn a4(title: &str) -> Self {
        Self::new(title, 210.0, 297.0)
    }

    pub fn new(title: &str, page_width_mm: f32, page_height_mm: f32) -> Self {
        Self {
            title: title.to_string(),
            page_width_mm,
            page_height_mm,
            pages: vec![PageLayout::default()],
        }
    }

    pub fn push_page(&mut self) {
        let page_index = self.pages.len();
        self.pages.push(PageLayout {
            page_index,
            boxes: Vec::new(),
        });
    }

    /// Append a box to the last page.
    pub fn push_box(&mut self, lbox: LayoutBox) {
        if self.pages.is_empty() {
            self.push_page();
        }
        if let Some(page) = self.pages.last_mut() {
            page.boxes.push(lbox);
        }
    }

    /// All text lines in placement order, across pages.
    pub fn text_lines(&self) -> impl Iterator<Item = &str> {
        self.pages
            .iter()
            .flat_map(|p| p.boxes.iter())
            .filter_map(|b| b.text.as_ref())
            .flat_map(|t| t.lines.iter().map(String::as_str))
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    pub fn from_json(json: &str) -> Result<Self, String> {
        serde_json::from_str(json).map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_box_targets_last_page() {
        let mut config = LayoutConfig::a4("t");
        config.push_page();
        config.push_box(LayoutBox {
            x: 20.0,
            y: 20.0,
            width: 10.0,
            height: 7.0,
            text: Some(TextContent {
                lines: vec!["x".into()],
                font_size: 12.0,
                bold: false,
                italic: false,
                line_height: 7.0,
            }),
            image: None,
        });
        assert_eq!(config.pages.len(), 2);
        assert!(config.pages[0].boxes.is_empty());
        assert_eq!(config.pages[1].page_index, 1);
        assert_eq!(config.text_lines().collect::<Vec<_>>(), vec!["x"]);

        let back = LayoutConfig::from_json(&config.to_json()).unwrap();
        assert_eq!(back.pages.len(), 2);
    }
}
