//! Sample note markup for tests and demonstration.
//!
//! Each sample looks like what a rich-text note editor saves.

/// A 1×1 PNG as a data URI.
pub const PIXEL_PNG: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

/// One short paragraph.
pub fn simple_note() -> &'static str {
    "<p>Hello</p>"
}

/// Headings, formatted paragraphs, a list and embedded images.
pub fn rich_note() -> String {
    format!(
        r#"
<h1>Trip planning</h1>
<p>Flights are <b>booked</b> &amp; the hotel is <i>confirmed</i>.</p>
<ul>
    <li>Passport</li>
    <li>Charger <img src="{PIXEL_PNG}" alt="charger photo"></li>
</ul>
<img src="{PIXEL_PNG}" alt="map">
<div><section><p>Nested <span>details</span></p><img src="{PIXEL_PNG}"></section></div>
"#
    )
}

/// Images that cannot be shown, one for each fallback.
pub fn broken_images_note() -> &'static str {
    r#"
<p>Screenshots:</p>
<img src="/nonexistent/dir/screenshot.png" alt="screenshot">
<img alt="no source">
<img src="data:image/png;base64,bm90IGEgcG5n" alt="corrupt">
"#
}

/// Enough paragraphs to span several pages.
pub fn long_note(paragraphs: usize) -> String {
    (1..=paragraphs)
        .map(|i| format!("<p>Paragraph {i}: the quick brown fox jumps over the lazy dog.</p>\n"))
        .collect()
}
