use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;

use crate::error::Result;

pub const NBFORMAT: u32 = 4;
pub const NBFORMAT_MINOR: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellKind {
    Markdown,
    Code,
}

impl CellKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CellKind::Markdown => "markdown",
            CellKind::Code => "code",
        }
    }
}

impl std::fmt::Display for CellKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recovered cell. `source` holds lines without their terminators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedCell {
    kind: CellKind,
    source: Vec<String>,
}

impl ExtractedCell {
    pub fn new(kind: CellKind, source: Vec<String>) -> Self {
        Self { kind, source }
    }

    pub fn empty(kind: CellKind) -> Self {
        Self::new(kind, Vec::new())
    }

    /// Splits multi-line text into a cell. Empty text gives an empty cell.
    pub fn from_text(kind: CellKind, text: &str) -> Self {
        if text.is_empty() {
            return Self::empty(kind);
        }
        Self::new(kind, text.split('\n').map(str::to_string).collect())
    }

    pub fn kind(&self) -> CellKind {
        self.kind
    }

    pub fn source(&self) -> &[String] {
        &self.source
    }

    pub fn source_text(&self) -> String {
        self.source.join("\n")
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    /// nbformat's multi-line string form: every line but the last keeps its `\n`.
    fn source_json(&self) -> Vec<String> {
        let last = self.source.len().saturating_sub(1);
        self.source
            .iter()
            .enumerate()
            .map(|(i, line)| {
                if i < last {
                    format!("{line}\n")
                } else {
                    line.clone()
                }
            })
            .collect()
    }

    /// Stable 8-hex-digit cell id; the same cell at the same position always
    /// gets the same id.
    fn cell_id(&self, index: usize) -> String {
        let digest = md5::compute(format!("{index}:{}:{}", self.kind, self.source_text()));
        format!("{digest:x}")[..8].to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KernelSpec {
    pub display_name: String,
    pub language: String,
    pub name: String,
}

impl Default for KernelSpec {
    fn default() -> Self {
        Self {
            display_name: "Python 3".to_string(),
            language: "python".to_string(),
            name: "python3".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodemirrorMode {
    pub name: String,
    pub version: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageInfo {
    pub codemirror_mode: CodemirrorMode,
    pub file_extension: String,
    pub mimetype: String,
    pub name: String,
    pub nbconvert_exporter: String,
    pub pygments_lexer: String,
    pub version: String,
}

impl Default for LanguageInfo {
    fn default() -> Self {
        Self {
            codemirror_mode: CodemirrorMode {
                name: "ipython".to_string(),
                version: 3,
            },
            file_extension: ".py".to_string(),
            mimetype: "text/x-python".to_string(),
            name: "python".to_string(),
            nbconvert_exporter: "python".to_string(),
            pygments_lexer: "ipython3".to_string(),
            version: "3.8.0".to_string(),
        }
    }
}

/// Notebook-level metadata. Field order is alphabetical so the JSON comes
/// out with sorted keys, like nbformat writes it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NotebookMetadata {
    pub kernelspec: KernelSpec,
    pub language_info: LanguageInfo,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotebookDocument {
    pub cells: Vec<ExtractedCell>,
    pub metadata: NotebookMetadata,
}

impl NotebookDocument {
    /// Concatenates per-source cell sequences in the order given. Cells are
    /// never merged or de-duplicated.
    pub fn assemble<I>(sources: I, metadata: NotebookMetadata) -> Self
    where
        I: IntoIterator<Item = Vec<ExtractedCell>>,
    {
        let cells = sources.into_iter().flatten().collect();
        Self { cells, metadata }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn kinds(&self) -> Vec<CellKind> {
        self.cells.iter().map(ExtractedCell::kind).collect()
    }

    /// nbformat v4 JSON: sorted keys, one-space indent, trailing newline.
    pub fn to_json(&self) -> Result<String> {
        let notebook = NotebookJson {
            cells: self
                .cells
                .iter()
                .enumerate()
                .map(|(index, cell)| CellJson::from_cell(index, cell))
                .collect(),
            metadata: &self.metadata,
            nbformat: NBFORMAT,
            nbformat_minor: NBFORMAT_MINOR,
        };

        let mut buffer = Vec::new();
        let formatter = PrettyFormatter::with_indent(b" ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
        notebook.serialize(&mut serializer)?;

        // serde_json only ever emits UTF-8
        let mut json = String::from_utf8_lossy(&buffer).into_owned();
        json.push('\n');
        Ok(json)
    }
}

#[derive(Serialize)]
struct NotebookJson<'a> {
    cells: Vec<CellJson>,
    metadata: &'a NotebookMetadata,
    nbformat: u32,
    nbformat_minor: u32,
}

#[derive(Serialize)]
#[serde(tag = "cell_type", rename_all = "lowercase")]
enum CellJson {
    Code {
        execution_count: Option<u32>,
        id: String,
        metadata: serde_json::Map<String, serde_json::Value>,
        outputs: Vec<serde_json::Value>,
        source: Vec<String>,
    },
    Markdown {
        id: String,
        metadata: serde_json::Map<String, serde_json::Value>,
        source: Vec<String>,
    },
}

impl CellJson {
    fn from_cell(index: usize, cell: &ExtractedCell) -> Self {
        let id = cell.cell_id(index);
        let source = cell.source_json();
        match cell.kind {
            CellKind::Code => CellJson::Code {
                execution_count: None,
                id,
                metadata: serde_json::Map::new(),
                outputs: Vec::new(),
                source,
            },
            CellKind::Markdown => CellJson::Markdown {
                id,
                metadata: serde_json::Map::new(),
                source,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn sample() -> NotebookDocument {
        NotebookDocument::assemble(
            vec![
                vec![
                    ExtractedCell::from_text(CellKind::Markdown, "# Title\n\nIntro"),
                    ExtractedCell::from_text(CellKind::Code, "x = 1\nprint(x)"),
                ],
                vec![ExtractedCell::empty(CellKind::Code)],
            ],
            NotebookMetadata::default(),
        )
    }

    #[test]
    fn test_assemble_keeps_source_then_cell_order() {
        let doc = sample();
        assert_eq!(
            doc.kinds(),
            vec![CellKind::Markdown, CellKind::Code, CellKind::Code]
        );
        assert_eq!(doc.cells[1].source(), ["x = 1", "print(x)"]);
    }

    #[test]
    fn test_json_shape_matches_nbformat() {
        let json: Value = serde_json::from_str(&sample().to_json().unwrap()).unwrap();

        assert_eq!(json["nbformat"], 4);
        assert_eq!(json["nbformat_minor"], 5);
        assert_eq!(json["metadata"]["kernelspec"]["name"], "python3");
        assert_eq!(json["metadata"]["language_info"]["codemirror_mode"]["version"], 3);

        let cells = json["cells"].as_array().unwrap();
        assert_eq!(cells.len(), 3);

        assert_eq!(cells[0]["cell_type"], "markdown");
        assert_eq!(
            cells[0]["source"],
            serde_json::json!(["# Title\n", "\n", "Intro"])
        );
        assert!(cells[0].get("outputs").is_none());
        assert!(cells[0].get("execution_count").is_none());

        assert_eq!(cells[1]["cell_type"], "code");
        assert_eq!(cells[1]["execution_count"], Value::Null);
        assert_eq!(cells[1]["outputs"], serde_json::json!([]));
        assert_eq!(cells[1]["metadata"], serde_json::json!({}));
        assert_eq!(cells[1]["source"], serde_json::json!(["x = 1\n", "print(x)"]));

        assert_eq!(cells[2]["source"], serde_json::json!([]));
    }

    #[test]
    fn test_json_is_sorted_and_one_space_indented() {
        let json = sample().to_json().unwrap();
        assert!(json.starts_with("{\n \"cells\": [\n  {\n   \"cell_type\": \"markdown\",\n   \"id\": "));
        assert!(json.ends_with("\"nbformat_minor\": 5\n}\n"));

        let code_cell = json.find("\"cell_type\": \"code\"").unwrap();
        let tail = &json[code_cell..];
        let order: Vec<usize> = ["execution_count", "\"id\"", "metadata", "outputs", "source"]
            .iter()
            .map(|key| tail.find(key).unwrap())
            .collect();
        assert!(order.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn test_cell_ids_are_stable_and_distinct() {
        let first = sample().to_json().unwrap();
        let second = sample().to_json().unwrap();
        assert_eq!(first, second);

        let json: Value = serde_json::from_str(&first).unwrap();
        let ids: Vec<&str> = json["cells"]
            .as_array()
            .unwrap()
            .iter()
            .map(|cell| cell["id"].as_str().unwrap())
            .collect();
        assert!(ids.iter().all(|id| id.len() == 8));
        assert_ne!(ids[0], ids[1]);
        assert_ne!(ids[1], ids[2]);
    }

    #[test]
    fn test_non_ascii_is_written_verbatim() {
        let doc = NotebookDocument::assemble(
            vec![vec![ExtractedCell::from_text(CellKind::Markdown, "naïve café ✓")]],
            NotebookMetadata::default(),
        );
        assert!(doc.to_json().unwrap().contains("naïve café ✓"));
    }
}
