//! Content parser – flattens note markup into the ordered sequence of
//! elements the layout engine places.
//!
//! Only the top level of the note is walked. A non-image element contributes
//! its whole text as one run, followed by every image found anywhere inside
//! it; its inner structure is not preserved.

use serde::{Deserialize, Serialize};

use crate::dom::{body_children, parse_html, DomNode, Tag};

/// Alt text used when an `<img>` has none.
pub const DEFAULT_ALT_TEXT: &str = "Image";

/// A unit of placeable content, in reading order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayoutElement {
    /// A trimmed, non-empty run of text.
    Text { content: String },
    /// An image reference: a URL, a local path, or a data URI.
    Image { source: String, alt_text: String },
}

impl LayoutElement {
    fn text(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        (!trimmed.is_empty()).then(|| LayoutElement::Text {
            content: trimmed.to_string(),
        })
    }

    fn image(src: Option<&str>, alt: Option<&str>) -> Self {
        let alt_text = alt
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .unwrap_or(DEFAULT_ALT_TEXT);
        LayoutElement::Image {
            source: src.map(str::trim).unwrap_or_default().to_string(),
            alt_text: alt_text.to_string(),
        }
    }
}

/// Parse note markup into layout elements.
pub fn parse_content(markup: &str) -> Vec<LayoutElement> {
    let dom = parse_html(markup);
    let nodes = body_children(&dom);

    let mut elements = Vec::new();
    for node in &nodes {
        match node {
            DomNode::Text(text) => elements.extend(LayoutElement::text(text)),
            DomNode::Element(elem) if elem.tag == Tag::Img => {
                elements.push(LayoutElement::image(elem.src(), elem.alt()));
            }
            DomNode::Element(elem) => {
                elements.extend(LayoutElement::text(&node.text_content()));
                elements.extend(
                    elem.descendant_images()
                        .into_iter()
                        .map(|img| LayoutElement::image(img.src(), img.alt())),
                );
            }
        }
    }
    log::debug!("Parsed {} layout elements from note markup", elements.len());
    elements
}
