//! Export orchestrator – the entry point the host's "Export to PDF" action
//! calls.

use crate::content::parse_content;
use crate::error::ExportError;
use crate::host::{NoteHost, NotifyKind};
use crate::image_loader::ImageFetcher;
use crate::layout_config::LayoutConfig;
use crate::pipeline::{assemble, PipelineConfig};

/// How an export ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// No note was selected; nothing was generated.
    NoSelection,
    Exported {
        file_name: String,
        pages: usize,
        bytes: usize,
    },
    /// The export aborted with this message. The user has been told.
    Failed(String),
}

/// Exports the host's current note with an injected host and image fetcher.
pub struct Exporter<H, F> {
    host: H,
    fetcher: F,
    config: PipelineConfig,
}

impl<H: NoteHost, F: ImageFetcher> Exporter<H, F> {
    pub fn new(host: H, fetcher: F, config: PipelineConfig) -> Self {
        Self {
            host,
            fetcher,
            config,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Export the current note. Every failure is reported to the user and
    /// returned as [`ExportOutcome::Failed`]; nothing propagates to the host.
    pub async fn export(&self) -> ExportOutcome {
        self.export_with_layout().await.0
    }

    /// Like [`export`](Self::export), also returning the layout record of
    /// the document that was saved, when one was.
    pub async fn export_with_layout(&self) -> (ExportOutcome, Option<LayoutConfig>) {
        let Some(note) = self.host.current_note() else {
            self.host.notify("No note selected", NotifyKind::Info);
            return (ExportOutcome::NoSelection, None);
        };

        self.host.notify("Generating PDF...", NotifyKind::Info);
        match self.run(&note.id, note.display_title()).await {
            Ok((outcome, layout)) => {
                if let ExportOutcome::Exported { file_name, .. } = &outcome {
                    self.host
                        .notify(&format!("PDF exported: {file_name}"), NotifyKind::Success);
                }
                (outcome, Some(layout))
            }
            Err(e) => {
                log::error!("PDF export of note '{}' failed: {e}", note.id);
                let message = e.to_string();
                self.host.notify(
                    &format!("Failed to export PDF: {message}"),
                    NotifyKind::Error,
                );
                (ExportOutcome::Failed(message), None)
            }
        }
    }

    async fn run(
        &self,
        note_id: &str,
        title: &str,
    ) -> Result<(ExportOutcome, LayoutConfig), ExportError> {
        let markup = self.host.note_content(note_id).await?;
        let elements = parse_content(&markup);
        log::info!(
            "Exporting '{title}' ({} elements) to PDF",
            elements.len()
        );

        let document = assemble(title, &elements, &self.fetcher, &self.config).await?;
        let bytes = document.to_pdf_bytes()?;
        self.host.save_pdf(&document.file_name, &bytes).await?;

        let outcome = ExportOutcome::Exported {
            pages: document.page_count(),
            bytes: bytes.len(),
            file_name: document.file_name,
        };
        Ok((outcome, document.surface.into_layout()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::Note;
    use crate::image_loader::tests::MapFetcher;
    use std::sync::Mutex;

    #[derive(Default)]
    struct StubHost {
        note: Option<Note>,
        content: Option<String>,
        messages: Mutex<Vec<(String, NotifyKind)>>,
        saved: Mutex<Vec<String>>,
    }

    impl NoteHost for StubHost {
        fn current_note(&self) -> Option<Note> {
            self.note.clone()
        }

        async fn note_content(&self, note_id: &str) -> Result<String, ExportError> {
            self.content
                .clone()
                .ok_or_else(|| ExportError::Host(format!("note {note_id} is gone")))
        }

        fn notify(&self, message: &str, kind: NotifyKind) {
            self.messages.lock().unwrap().push((message.to_string(), kind));
        }

        async fn save_pdf(&self, file_name: &str, _bytes: &[u8]) -> Result<(), ExportError> {
            self.saved.lock().unwrap().push(file_name.to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn content_failure_is_reported_not_raised() {
        let host = StubHost {
            note: Some(Note {
                id: "n1".into(),
                title: None,
            }),
            ..StubHost::default()
        };
        let exporter = Exporter::new(host, MapFetcher::default(), PipelineConfig::default());
        let outcome = exporter.export().await;

        assert!(matches!(outcome, ExportOutcome::Failed(ref m) if m.contains("note n1 is gone")));
        let messages = exporter.host().messages.lock().unwrap();
        let (last, kind) = messages.last().unwrap();
        assert_eq!(*kind, NotifyKind::Error);
        assert!(last.starts_with("Failed to export PDF: "));
        assert!(exporter.host().saved.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn untitled_note_uses_default_file_name() {
        let host = StubHost {
            note: Some(Note {
                id: "n2".into(),
                title: None,
            }),
            content: Some("<p>x</p>".into()),
            ..StubHost::default()
        };
        let exporter = Exporter::new(host, MapFetcher::default(), PipelineConfig::default());
        let outcome = exporter.export().await;
        assert!(matches!(
            outcome,
            ExportOutcome::Exported { ref file_name, pages: 1, .. } if file_name == "untitled_note.pdf"
        ));
    }

    #[tokio::test]
    async fn invalid_config_fails_the_export() {
        let host = StubHost {
            note: Some(Note {
                id: "n3".into(),
                title: Some("t".into()),
            }),
            content: Some(String::new()),
            ..StubHost::default()
        };
        let config = PipelineConfig {
            jpeg_quality: 0,
            ..PipelineConfig::default()
        };
        let exporter = Exporter::new(host, MapFetcher::default(), config);
        assert!(matches!(exporter.export().await, ExportOutcome::Failed(_)));
    }

    #[tokio::test]
    async fn layout_record_matches_the_saved_document() {
        let host = StubHost {
            note: Some(Note {
                id: "n4".into(),
                title: Some("Trip".into()),
            }),
            content: Some(r#"<p>day one</p><img src="gone.png" alt="beach">"#.into()),
            ..StubHost::default()
        };
        let exporter = Exporter::new(host, MapFetcher::default(), PipelineConfig::default());
        let (outcome, layout) = exporter.export_with_layout().await;

        let ExportOutcome::Exported { pages, .. } = outcome else {
            panic!("Expected export, got {outcome:?}");
        };
        let layout = layout.expect("layout of the saved document");
        assert_eq!(layout.pages.len(), pages);
        assert_eq!(
            layout.text_lines().collect::<Vec<_>>(),
            vec!["Trip", "day one", "[Image not found: beach]"]
        );
        assert_eq!(exporter.host().saved.lock().unwrap().as_slice(), ["trip.pdf"]);
    }

    #[tokio::test]
    async fn failed_export_has_no_layout() {
        let exporter = Exporter::new(StubHost::default(), MapFetcher::default(), PipelineConfig::default());
        let (outcome, layout) = exporter.export_with_layout().await;
        assert_eq!(outcome, ExportOutcome::NoSelection);
        assert!(layout.is_none());
    }
}
