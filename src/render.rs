//! PDF renderer – takes a [`LayoutConfig`] and produces PDF bytes using
//! `printpdf` (v0.8 ops-based API).

use std::collections::HashMap;

use printpdf::*;

use crate::fonts::MM_PER_PT;
use crate::image_loader::decode_data_uri;
use crate::layout_config::{LayoutBox, LayoutConfig, TextContent};

/// A printpdf XObject together with the pixel dimensions of the source image.
struct ImageResource {
    xobj_id: XObjectId,
    px_width: u32,
    px_height: u32,
}

fn mm_to_pt(mm: f32) -> Pt {
    Pt(mm / MM_PER_PT)
}

/// Render a LayoutConfig into PDF bytes.
///
/// Images were validated when they were placed, so one that fails to decode
/// here is skipped with a warning rather than failing the document.
pub fn render_pdf(config: &LayoutConfig) -> Result<Vec<u8>, String> {
    if config.page_width_mm <= 0.0 || config.page_height_mm <= 0.0 {
        return Err(format!(
            "Invalid page size {}x{} mm",
            config.page_width_mm, config.page_height_mm
        ));
    }
    let page_w = Mm(config.page_width_mm);
    let page_h = Mm(config.page_height_mm);

    let mut doc = PdfDocument::new(&config.title);

    // ── Register images ───────────────────────────────────────────────────
    let mut image_resources: HashMap<&str, ImageResource> = HashMap::new();
    let mut img_warnings: Vec<PdfWarnMsg> = Vec::new();

    for img in config
        .pages
        .iter()
        .flat_map(|p| p.boxes.iter())
        .filter_map(|b| b.image.as_ref())
    {
        if image_resources.contains_key(img.src.as_str()) {
            continue;
        }
        let data = match decode_data_uri(&img.src) {
            Ok(d) => d,
            Err(e) => {
                log::warn!("Skipping image: {e}");
                continue;
            }
        };
        let raw = match RawImage::decode_from_bytes(&data.bytes, &mut img_warnings) {
            Ok(r) => r,
            Err(e) => {
                log::warn!("Skipping image, PDF encode error: {e}");
                continue;
            }
        };
        let xobj_id = doc.add_image(&raw);
        image_resources.insert(
            img.src.as_str(),
            ImageResource {
                xobj_id,
                px_width: img.px_width,
                px_height: img.px_height,
            },
        );
    }

    // ── Render pages ──────────────────────────────────────────────────────
    let mut pages: Vec<PdfPage> = config
        .pages
        .iter()
        .map(|page_layout| {
            let mut ops = Vec::new();
            for lbox in &page_layout.boxes {
                render_box(&mut ops, lbox, config.page_height_mm, &image_resources);
            }
            PdfPage::new(page_w, page_h, ops)
        })
        .collect();

    if pages.is_empty() {
        pages.push(PdfPage::new(page_w, page_h, Vec::new()));
    }

    doc.with_pages(pages);
    let bytes = doc.save(&PdfSaveOptions::default(), &mut Vec::new());
    log::debug!(
        "Rendered '{}': {} page(s), {} bytes",
        config.title,
        config.pages.len().max(1),
        bytes.len()
    );
    Ok(bytes)
}

/// Convert a UTF-8 string to raw Windows-1252 bytes then wrap in a String so
/// printpdf writes the bytes unchanged into the PDF stream (builtin fonts use
/// WinAnsiEncoding, so each glyph is one byte 0x00–0xFF).
fn to_winlatin(s: &str) -> String {
    let bytes: Vec<u8> = s
        .chars()
        .map(|c| match c {
            '\u{20AC}' => 0x80,
            '\u{2026}' => 0x85,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            '\u{2022}' => 0x95,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            '\u{00A0}' => 0x20,
            c if (c as u32) < 256 => c as u8,
            _ => b'?',
        })
        .collect();
    // SAFETY: intentionally non-UTF-8 for 0x80-0xFF. The string is never
    // inspected as UTF-8 on our side; printpdf 0.8 hands it to lopdf, whose
    // `encode_text` for builtin fonts copies `as_bytes()` into the content
    // stream untouched, where WinAnsiEncoding decodes it. lopdf does no
    // WinAnsi mapping of its own (UTF-8 "é" would come out as `c3 a9`), so
    // if a printpdf/lopdf upgrade starts re-encoding text, this must move to
    // whatever byte-level text API the new version offers.
    #[allow(unsafe_code)]
    unsafe {
        String::from_utf8_unchecked(bytes)
    }
}

fn builtin_font(text: &TextContent) -> BuiltinFont {
    match (text.bold, text.italic) {
        (true, true) => BuiltinFont::HelveticaBoldOblique,
        (true, false) => BuiltinFont::HelveticaBold,
        (false, true) => BuiltinFont::HelveticaOblique,
        (false, false) => BuiltinFont::Helvetica,
    }
}

fn render_box(
    ops: &mut Vec<Op>,
    lbox: &LayoutBox,
    page_height_mm: f32,
    images: &HashMap<&str, ImageResource>,
) {
    // PDF origin is bottom-left; layout origin is top-left.
    if let Some(text) = &lbox.text {
        let font = builtin_font(text);
        for (i, line) in text.lines.iter().enumerate() {
            if line.is_empty() {
                continue;
            }
            let baseline_mm = lbox.y + i as f32 * text.line_height;
            ops.push(Op::StartTextSection);
            ops.push(Op::SetTextCursor {
                pos: Point {
                    x: mm_to_pt(lbox.x),
                    y: mm_to_pt(page_height_mm - baseline_mm),
                },
            });
            ops.push(Op::SetFontSizeBuiltinFont {
                size: Pt(text.font_size),
                font,
            });
            ops.push(Op::SetLineHeight {
                lh: mm_to_pt(text.line_height),
            });
            ops.push(Op::SetFillColor {
                col: Color::Rgb(Rgb {
                    r: 0.0,
                    g: 0.0,
                    b: 0.0,
                    icc_profile: None,
                }),
            });
            ops.push(Op::WriteTextBuiltinFont {
                items: vec![TextItem::Text(to_winlatin(line))],
                font,
            });
            ops.push(Op::EndTextSection);
        }
    }

    if let Some(img) = &lbox.image {
        let Some(res) = images.get(img.src.as_str()) else {
            return;
        };
        // At dpi=72 printpdf renders 1 px = 1 pt, so scale = desired_pt / px.
        let scale_x = if res.px_width > 0 {
            mm_to_pt(lbox.width).0 / res.px_width as f32
        } else {
            1.0
        };
        let scale_y = if res.px_height > 0 {
            mm_to_pt(lbox.height).0 / res.px_height as f32
        } else {
            1.0
        };
        ops.push(Op::UseXobject {
            id: res.xobj_id.clone(),
            transform: XObjectTransform {
                translate_x: Some(mm_to_pt(lbox.x)),
                translate_y: Some(mm_to_pt(page_height_mm - lbox.y - lbox.height)),
                dpi: Some(72.0),
                scale_x: Some(scale_x),
                scale_y: Some(scale_y),
                rotate: None,
            },
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_empty_page() {
        let config = LayoutConfig::a4("empty");
        let bytes = render_pdf(&config).unwrap();
        assert!(bytes.len() > 100, "PDF should have content");
        assert_eq!(&bytes[0..5], b"%PDF-");
    }

    #[test]
    fn render_rejects_zero_page() {
        let config = LayoutConfig::new("bad", 0.0, 297.0);
        assert!(render_pdf(&config).is_err());
    }

    #[test]
    fn winlatin_maps_latin1_and_punctuation_to_single_bytes() {
        assert_eq!(to_winlatin("Caf\u{e9}").as_bytes(), b"Caf\xE9");
        assert_eq!(
            to_winlatin("\u{2014}\u{2019}\u{20AC}").as_bytes(),
            &[0x97, 0x92, 0x80]
        );
    }

    #[test]
    fn winlatin_maps_out_of_range_chars() {
        assert_eq!(to_winlatin("abc").as_bytes(), b"abc");
        assert_eq!(to_winlatin("\u{4E2D}").as_bytes(), b"?");
    }
}
