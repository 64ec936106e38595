//! Host application interface – where notes come from, how the user is told
//! what happened, and where the finished PDF goes.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ExportError;

/// Title used for notes without a display name.
pub const UNTITLED_NOTE: &str = "Untitled Note";

/// A note as the host describes it. The content is fetched separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    pub title: Option<String>,
}

impl Note {
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(UNTITLED_NOTE)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifyKind {
    Info,
    Success,
    Error,
}

/// Services the host application provides to the exporter.
#[allow(async_fn_in_trait)]
pub trait NoteHost {
    /// The note the user is looking at, if any.
    fn current_note(&self) -> Option<Note>;

    /// Markup of the note with id `note_id`.
    async fn note_content(&self, note_id: &str) -> Result<String, ExportError>;

    /// Show `message` to the user.
    fn notify(&self, message: &str, kind: NotifyKind);

    /// Hand the finished PDF to the host's file-save mechanism.
    async fn save_pdf(&self, file_name: &str, bytes: &[u8]) -> Result<(), ExportError>;
}

/// A host backed by the filesystem: the "current note" is an HTML file and
/// PDFs are written to an output directory. Used by the command-line tool.
#[derive(Debug, Clone)]
pub struct FileNoteHost {
    note_path: PathBuf,
    title: Option<String>,
    out_dir: PathBuf,
}

impl FileNoteHost {
    /// `title` defaults to the file stem of `note_path`.
    pub fn new(note_path: impl Into<PathBuf>, title: Option<String>, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            note_path: note_path.into(),
            title,
            out_dir: out_dir.into(),
        }
    }

    pub fn output_path(&self, file_name: &str) -> PathBuf {
        self.out_dir.join(file_name)
    }
}

impl NoteHost for FileNoteHost {
    fn current_note(&self) -> Option<Note> {
        if !self.note_path.is_file() {
            return None;
        }
        let title = self.title.clone().or_else(|| {
            self.note_path
                .file_stem()
                .and_then(|s| s.to_str())
                .map(str::to_string)
        });
        Some(Note {
            id: self.note_path.display().to_string(),
            title,
        })
    }

    async fn note_content(&self, note_id: &str) -> Result<String, ExportError> {
        tokio::fs::read_to_string(note_id)
            .await
            .map_err(|e| ExportError::Host(format!("reading '{note_id}': {e}")))
    }

    fn notify(&self, message: &str, kind: NotifyKind) {
        match kind {
            NotifyKind::Error => log::error!("{message}"),
            NotifyKind::Info | NotifyKind::Success => log::info!("{message}"),
        }
        eprintln!("{message}");
    }

    async fn save_pdf(&self, file_name: &str, bytes: &[u8]) -> Result<(), ExportError> {
        if !self.out_dir.as_os_str().is_empty() {
            tokio::fs::create_dir_all(&self.out_dir).await?;
        }
        let path = self.output_path(file_name);
        tokio::fs::write(&path, bytes).await?;
        log::info!("Wrote '{}' ({} bytes)", path.display(), bytes.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_title_defaults() {
        let untitled = Note {
            id: "1".into(),
            title: None,
        };
        assert_eq!(untitled.display_title(), "Untitled Note");
        let blank = Note {
            id: "1".into(),
            title: Some("  ".into()),
        };
        assert_eq!(blank.display_title(), "Untitled Note");
        let named = Note {
            id: "1".into(),
            title: Some("Groceries".into()),
        };
        assert_eq!(named.display_title(), "Groceries");
    }

    #[tokio::test]
    async fn file_host_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let note = dir.path().join("meeting.html");
        std::fs::write(&note, "<p>agenda</p>").unwrap();
        let host = FileNoteHost::new(&note, None, dir.path().join("out"));

        let current = host.current_note().unwrap();
        assert_eq!(current.display_title(), "meeting");
        assert_eq!(host.note_content(&current.id).await.unwrap(), "<p>agenda</p>");

        host.save_pdf("meeting.pdf", b"%PDF-").await.unwrap();
        assert_eq!(std::fs::read(host.output_path("meeting.pdf")).unwrap(), b"%PDF-");
    }

    #[test]
    fn missing_file_means_no_note() {
        let host = FileNoteHost::new("/definitely/not/here.html", None, ".");
        assert!(host.current_note().is_none());
    }
}
