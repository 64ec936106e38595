//! # note-to-pdf – export a note to a paginated PDF
//!
//! The export runs in these stages:
//!
//! 1. **Fetch** – ask the host for the current note and its markup ([`host`])
//! 2. **Parse** – flatten the markup into text runs and images ([`dom`], [`content`])
//! 3. **Layout** – place the title and each element down the page, breaking
//!    pages near the bottom ([`pagination`], [`pipeline`])
//! 4. **Images** – load, scale and embed images, or place a fallback line
//!    ([`image_loader`])
//! 5. **Render** – emit PDF bytes via printpdf ([`surface`], [`render`])
//!
//! [`export::Exporter`] runs the whole thing and reports to the user;
//! [`plugin`] exposes it to the host as an "Export to PDF" action.

pub mod content;
pub mod dom;
pub mod error;
pub mod export;
pub mod fonts;
pub mod host;
pub mod image_loader;
pub mod layout_config;
pub mod pagination;
pub mod pipeline;
pub mod plugin;
pub mod render;
pub mod surface;
pub mod templates;

// Re-exports for convenience
pub use content::{parse_content, LayoutElement};
pub use error::{EmbedError, ExportError, ImageError};
pub use export::{ExportOutcome, Exporter};
pub use host::{Note, NoteHost, NotifyKind};
pub use pipeline::{assemble, generate_pdf, output_file_name, PageOrientation, PipelineConfig};
