//! Text measurement for the builtin Helvetica faces.
//!
//! The PDF uses the standard 14 fonts, so there are no font files to read
//! metrics from. Widths come from an average-advance heuristic, which is
//! close enough for line wrapping.

/// Millimetres per PDF point.
pub const MM_PER_PT: f32 = 0.352_778;

/// Weight and slant of a builtin face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FontStyle {
    pub bold: bool,
    pub italic: bool,
}

impl FontStyle {
    pub const NORMAL: FontStyle = FontStyle {
        bold: false,
        italic: false,
    };
    pub const BOLD: FontStyle = FontStyle {
        bold: true,
        italic: false,
    };
    pub const ITALIC: FontStyle = FontStyle {
        bold: false,
        italic: true,
    };
}

/// The active font: size in points plus style.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Font {
    pub size_pt: f32,
    pub style: FontStyle,
}

impl Default for Font {
    fn default() -> Self {
        Self {
            size_pt: 12.0,
            style: FontStyle::NORMAL,
        }
    }
}

impl Font {
    pub fn new(size_pt: f32, style: FontStyle) -> Self {
        Self { size_pt, style }
    }

    /// Width of `text` in millimetres.
    ///
    /// Average advance is 0.5 em for regular Helvetica; bold runs about 10 %
    /// wider.
    pub fn text_width_mm(&self, text: &str) -> f32 {
        let avg = if self.style.bold { 0.55 } else { 0.5 };
        text.chars().count() as f32 * self.size_pt * avg * MM_PER_PT
    }
}

/// Word-wrap `text` to lines no wider than `max_width` millimetres.
///
/// Explicit newlines start a new line. A single word wider than the line is
/// broken between characters. Always returns at least one line.
pub fn wrap_text(text: &str, font: &Font, max_width: f32) -> Vec<String> {
    if max_width <= 0.0 || text.is_empty() {
        return vec![text.to_string()];
    }

    let mut lines: Vec<String> = Vec::new();
    for paragraph in text.split('\n') {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };
            if font.text_width_mm(&candidate) <= max_width {
                current = candidate;
                continue;
            }
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if font.text_width_mm(word) <= max_width {
                current = word.to_string();
            } else {
                let mut pieces = break_word(word, font, max_width);
                current = pieces.pop().unwrap_or_default();
                lines.extend(pieces);
            }
        }
        if !current.is_empty() || lines.is_empty() {
            lines.push(current);
        }
    }
    lines
}

fn break_word(word: &str, font: &Font, max_width: f32) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut piece = String::new();
    for ch in word.chars() {
        piece.push(ch);
        if piece.chars().count() > 1 && font.text_width_mm(&piece) > max_width {
            piece.pop();
            pieces.push(std::mem::replace(&mut piece, ch.to_string()));
        }
    }
    pieces.push(piece);
    pieces
}
