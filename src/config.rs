use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::notebook::{KernelSpec, LanguageInfo, NotebookMetadata};

/// Class markers of a JupyterLab HTML export.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct CellMarkers {
    /// Any one of these marks an element as a cell container.
    pub container: Vec<String>,
    pub markdown: String,
    pub code: String,
    /// Editor wrapper holding the highlighted `<pre>` of a code cell.
    pub code_editor: Vec<String>,
    pub rendered_markdown: String,
}

impl Default for CellMarkers {
    fn default() -> Self {
        Self {
            container: vec!["jp-Cell".to_string(), "jp-Notebook-cell".to_string()],
            markdown: "jp-MarkdownCell".to_string(),
            code: "jp-CodeCell".to_string(),
            code_editor: vec![
                "jp-CodeMirrorEditor".to_string(),
                "jp-InputArea-editor".to_string(),
            ],
            rendered_markdown: "jp-RenderedMarkdown".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ConverterConfig {
    pub markers: CellMarkers,
    pub kernelspec: KernelSpec,
    pub language_info: LanguageInfo,
    /// Record a diagnostic for every container that is neither markdown nor
    /// code. Such containers are counted either way.
    pub report_unrecognized: bool,
}

impl ConverterConfig {
    pub fn load_or_default(file_path: Option<&Path>) -> Self {
        match file_path {
            Some(path) => Self::load_from_file(path).unwrap_or_else(|e| {
                log::error!("Failed to load config from {}: {e}", path.display());
                Self::default()
            }),
            None => Self::default(),
        }
    }

    pub fn load_from_file(file_path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(file_path)?;

        match serde_json::from_str::<Self>(&content) {
            Ok(config) => Ok(config),
            Err(e) => {
                log::error!("Failed to parse config file: {e}");
                Err(anyhow::anyhow!("Failed to parse config: {}", e))
            }
        }
    }

    pub fn metadata(&self) -> NotebookMetadata {
        NotebookMetadata {
            kernelspec: self.kernelspec.clone(),
            language_info: self.language_info.clone(),
        }
    }
}
