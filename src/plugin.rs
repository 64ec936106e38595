//! Plugin registration – what the host sees: an identity and one note-level
//! action that runs the exporter.

use serde::{Deserialize, Serialize};

use crate::export::{ExportOutcome, Exporter};
use crate::host::NoteHost;
use crate::image_loader::ImageFetcher;

pub const PLUGIN_NAME: &str = "Note to PDF";
pub const EXPORT_ACTION_ID: &str = "export-pdf";
pub const EXPORT_ACTION_LABEL: &str = "Export to PDF";

/// An action the host shows on a note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteAction {
    pub id: String,
    pub label: String,
}

/// Plugin identity and the actions it contributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginManifest {
    pub name: String,
    /// Semantic version of the plugin.
    pub version: String,
    pub note_actions: Vec<NoteAction>,
}

impl PluginManifest {
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

pub struct PdfExportPlugin<H, F> {
    exporter: Exporter<H, F>,
}

impl<H: NoteHost, F: ImageFetcher> PdfExportPlugin<H, F> {
    pub fn new(exporter: Exporter<H, F>) -> Self {
        Self { exporter }
    }

    pub fn manifest(&self) -> PluginManifest {
        PluginManifest {
            name: PLUGIN_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            note_actions: vec![NoteAction {
                id: EXPORT_ACTION_ID.to_string(),
                label: EXPORT_ACTION_LABEL.to_string(),
            }],
        }
    }

    pub fn exporter(&self) -> &Exporter<H, F> {
        &self.exporter
    }

    /// Run the action with id `action_id`. Returns `None` for actions this
    /// plugin does not own.
    pub async fn invoke(&self, action_id: &str) -> Option<ExportOutcome> {
        if action_id != EXPORT_ACTION_ID {
            log::warn!("Unknown plugin action '{action_id}'");
            return None;
        }
        Some(self.exporter.export().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::FileNoteHost;
    use crate::image_loader::tests::MapFetcher;
    use crate::pipeline::PipelineConfig;

    fn plugin() -> PdfExportPlugin<FileNoteHost, MapFetcher> {
        let host = FileNoteHost::new("/no/such/note.html", None, ".");
        PdfExportPlugin::new(Exporter::new(
            host,
            MapFetcher::default(),
            PipelineConfig::default(),
        ))
    }

    #[test]
    fn manifest_declares_export_action() {
        let manifest = plugin().manifest();
        assert_eq!(manifest.note_actions.len(), 1);
        assert_eq!(manifest.note_actions[0].label, "Export to PDF");
        assert_eq!(manifest.version.split('.').count(), 3);
        let json = manifest.to_json();
        assert!(json.contains("\"note_actions\""));
    }

    #[tokio::test]
    async fn invoke_routes_by_action_id() {
        let plugin = plugin();
        assert_eq!(plugin.invoke("something-else").await, None);
        assert_eq!(
            plugin.invoke(EXPORT_ACTION_ID).await,
            Some(ExportOutcome::NoSelection)
        );
    }
}
