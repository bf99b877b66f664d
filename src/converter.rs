use std::fmt;
use std::fs;
use std::path::Path;

use log::{debug, error, info, warn};

use crate::config::ConverterConfig;
use crate::dom::{HtmlNode, RawDocument};
use crate::error::{ConvertError, Result};
use crate::notebook::{CellKind, ExtractedCell, NotebookDocument};
use crate::parsing::cells::{CellLocator, classify};
use crate::parsing::code_extractor::CodeExtractor;
use crate::parsing::html_to_markdown::HtmlToMarkdownConverter;
use crate::parsing::markdown_renderer::MarkdownRenderer;

/// Recoverable findings about one source. None of these stop the conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// The source holds no cell containers at all.
    EmptyResult,
    /// A container that is neither markdown nor code; it was skipped.
    UnrecognizedCell {
        position: usize,
        classes: Vec<String>,
    },
    /// A recognised cell without its content element; emitted empty.
    MalformedCellContent { position: usize, kind: CellKind },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::EmptyResult => write!(f, "no cell containers found"),
            Diagnostic::UnrecognizedCell { position, classes } => write!(
                f,
                "container #{position} is neither markdown nor code (classes: {})",
                classes.join(" ")
            ),
            Diagnostic::MalformedCellContent { position, kind } => write!(
                f,
                "{kind} cell #{position} has no content element, emitted empty"
            ),
        }
    }
}

/// Result of converting one HTML source.
#[derive(Debug, Clone)]
pub struct SourceReport {
    pub name: String,
    pub cells: Vec<ExtractedCell>,
    /// Cell containers found, recognised or not.
    pub containers: usize,
    /// Containers skipped as unrecognised. Always counted.
    pub unrecognized: usize,
    pub diagnostics: Vec<Diagnostic>,
}

impl SourceReport {
    pub fn is_empty_result(&self) -> bool {
        self.diagnostics.contains(&Diagnostic::EmptyResult)
    }
}

#[derive(Debug)]
pub enum SourceOutcome {
    Converted(SourceReport),
    Failed { name: String, error: ConvertError },
}

impl SourceOutcome {
    pub fn name(&self) -> &str {
        match self {
            SourceOutcome::Converted(report) => &report.name,
            SourceOutcome::Failed { name, .. } => name,
        }
    }
}

/// Everything a multi-source run produced: the assembled notebook plus one
/// outcome per source, in input order.
#[derive(Debug)]
pub struct RunReport {
    pub document: NotebookDocument,
    pub sources: Vec<SourceOutcome>,
}

impl RunReport {
    pub fn converted(&self) -> impl Iterator<Item = &SourceReport> {
        self.sources.iter().filter_map(|outcome| match outcome {
            SourceOutcome::Converted(report) => Some(report),
            SourceOutcome::Failed { .. } => None,
        })
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &ConvertError)> {
        self.sources.iter().filter_map(|outcome| match outcome {
            SourceOutcome::Failed { name, error } => Some((name.as_str(), error)),
            SourceOutcome::Converted(_) => None,
        })
    }

    /// The notebook, unless every source failed.
    pub fn into_document(self) -> Result<NotebookDocument> {
        let count = self.sources.len();
        if count > 0 && self.converted().next().is_none() {
            return Err(ConvertError::NoUsableSource { count });
        }
        Ok(self.document)
    }
}

/// Runs the HTML → cells pipeline over one or more exported notebooks.
pub struct NotebookConverter {
    config: ConverterConfig,
    markdown: HtmlToMarkdownConverter,
    renderer: MarkdownRenderer,
}

impl NotebookConverter {
    pub fn new(config: ConverterConfig) -> Self {
        Self {
            config,
            markdown: HtmlToMarkdownConverter::new(),
            renderer: MarkdownRenderer::new(),
        }
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    pub fn convert_html(&self, name: &str, html: &str) -> Result<SourceReport> {
        let document = RawDocument::parse(name, html)?;
        Ok(self.extract_cells(name, document.root()))
    }

    pub fn convert_bytes(&self, name: &str, bytes: &[u8]) -> Result<SourceReport> {
        let document = RawDocument::parse_bytes(name, bytes)?;
        Ok(self.extract_cells(name, document.root()))
    }

    pub fn convert_file(&self, path: &Path) -> Result<SourceReport> {
        let bytes = fs::read(path).map_err(|source| ConvertError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        self.convert_bytes(&path.display().to_string(), &bytes)
    }

    /// Converts each file in turn. A file that cannot be read or parsed is
    /// recorded as failed and the rest are still converted.
    pub fn convert_files<P: AsRef<Path>>(&self, paths: &[P]) -> RunReport {
        let outcomes = paths
            .iter()
            .map(|path| {
                let path = path.as_ref();
                let name = path.display().to_string();
                Self::outcome(name, self.convert_file(path))
            })
            .collect();
        self.finish(outcomes)
    }

    /// Same as [`convert_files`](Self::convert_files) for in-memory
    /// `(name, html)` sources.
    pub fn convert_sources<'s, I>(&self, sources: I) -> RunReport
    where
        I: IntoIterator<Item = (&'s str, &'s str)>,
    {
        let outcomes = sources
            .into_iter()
            .map(|(name, html)| Self::outcome(name.to_string(), self.convert_html(name, html)))
            .collect();
        self.finish(outcomes)
    }

    fn outcome(name: String, result: Result<SourceReport>) -> SourceOutcome {
        match result {
            Ok(report) => SourceOutcome::Converted(report),
            Err(error) => {
                error!("Skipping {name}: {error}");
                SourceOutcome::Failed { name, error }
            }
        }
    }

    fn finish(&self, sources: Vec<SourceOutcome>) -> RunReport {
        let document = NotebookDocument::assemble(
            sources.iter().map(|outcome| match outcome {
                SourceOutcome::Converted(report) => report.cells.clone(),
                SourceOutcome::Failed { .. } => Vec::new(),
            }),
            self.config.metadata(),
        );
        info!(
            "Assembled {} cells from {} source(s)",
            document.len(),
            sources.len()
        );
        RunReport { document, sources }
    }

    /// Locates, classifies and reconstructs every cell under `root`.
    pub fn extract_cells<N: HtmlNode>(&self, name: &str, root: N) -> SourceReport {
        let markers = &self.config.markers;
        let mut report = SourceReport {
            name: name.to_string(),
            cells: Vec::new(),
            containers: 0,
            unrecognized: 0,
            diagnostics: Vec::new(),
        };

        for (position, container) in CellLocator::new(root, markers).enumerate() {
            report.containers += 1;

            let Some(kind) = classify(&container, markers) else {
                report.unrecognized += 1;
                let classes = container.classes();
                debug!("{name}: skipping container #{position} ({})", classes.join(" "));
                if self.config.report_unrecognized {
                    let diagnostic = Diagnostic::UnrecognizedCell { position, classes };
                    warn!("{name}: {diagnostic}");
                    report.diagnostics.push(diagnostic);
                }
                continue;
            };

            let cell = match self.extract_cell(&container, kind) {
                Some(cell) => cell,
                None => {
                    let diagnostic = Diagnostic::MalformedCellContent { position, kind };
                    warn!("{name}: {diagnostic}");
                    report.diagnostics.push(diagnostic);
                    ExtractedCell::empty(kind)
                }
            };
            debug!(
                "{name}: extracted {kind} cell #{position} ({} lines)",
                cell.source().len()
            );
            report.cells.push(cell);
        }

        if report.containers == 0 {
            warn!("{name}: {}", Diagnostic::EmptyResult);
            report.diagnostics.push(Diagnostic::EmptyResult);
        }

        info!(
            "Extracted {} cells from {name} ({} containers, {} unrecognized)",
            report.cells.len(),
            report.containers,
            report.unrecognized
        );
        report
    }

    /// `None` when the cell lacks the element its kind keeps content in.
    pub fn extract_cell<N: HtmlNode>(&self, cell: &N, kind: CellKind) -> Option<ExtractedCell> {
        let markers = &self.config.markers;
        match kind {
            CellKind::Code => {
                let lines = CodeExtractor::new(markers).extract(cell)?;
                Some(ExtractedCell::new(CellKind::Code, lines))
            }
            CellKind::Markdown => {
                let rendered = cell.find_descendant(|node: &N| {
                    node.has_class(&markers.rendered_markdown)
                })?;
                let document = self.markdown.convert_node(&rendered);
                let source = self.renderer.render(&document);
                Some(ExtractedCell::from_text(CellKind::Markdown, &source))
            }
        }
    }
}

impl Default for NotebookConverter {
    fn default() -> Self {
        Self::new(ConverterConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fake_notebooks::FakeNotebook;

    #[test]
    fn test_mixed_cells_in_document_order() {
        let html = FakeNotebook::new()
            .markdown("<h1>Intro</h1>")
            .code(&["import os"])
            .raw("raw text")
            .markdown("<p>Done</p>")
            .build();

        let report = NotebookConverter::default()
            .convert_html("nb.html", &html)
            .unwrap();

        let kinds: Vec<CellKind> = report.cells.iter().map(ExtractedCell::kind).collect();
        assert_eq!(
            kinds,
            vec![CellKind::Markdown, CellKind::Code, CellKind::Markdown]
        );
        assert_eq!(report.containers, 4);
        assert_eq!(report.unrecognized, 1);
        assert!(report.diagnostics.is_empty());
        assert_eq!(report.cells[0].source(), ["# Intro"]);
        assert_eq!(report.cells[1].source(), ["import os"]);
    }

    #[test]
    fn test_markdown_cell_from_rendered_html() {
        let html = FakeNotebook::new()
            .markdown("<h2>Title</h2><p>Some <strong>bold</strong> text.</p>")
            .build();
        let report = NotebookConverter::default()
            .convert_html("nb.html", &html)
            .unwrap();
        assert_eq!(
            report.cells[0].source_text(),
            "## Title\n\nSome **bold** text."
        );
    }

    #[test]
    fn test_unrecognized_cells_reported_only_when_configured() {
        let html = FakeNotebook::new().raw("one").code(&["x"]).build();

        let quiet = NotebookConverter::default()
            .convert_html("nb.html", &html)
            .unwrap();
        assert_eq!(quiet.unrecognized, 1);
        assert!(quiet.diagnostics.is_empty());

        let config = ConverterConfig {
            report_unrecognized: true,
            ..ConverterConfig::default()
        };
        let loud = NotebookConverter::new(config)
            .convert_html("nb.html", &html)
            .unwrap();
        assert_eq!(loud.unrecognized, 1);
        assert!(matches!(
            loud.diagnostics.as_slice(),
            [Diagnostic::UnrecognizedCell { position: 0, .. }]
        ));
        assert_eq!(loud.cells.len(), 1);
    }

    #[test]
    fn test_missing_content_element_gives_empty_cell_of_classified_kind() {
        let html = r#"<body>
            <div class="jp-Cell jp-CodeCell jp-Notebook-cell"><div class="jp-Cell-inputWrapper"></div></div>
            <div class="jp-Cell jp-MarkdownCell jp-Notebook-cell"><div class="jp-InputArea"></div></div>
            <div class="jp-Cell jp-CodeCell jp-Notebook-cell">
              <div class="jp-CodeMirrorEditor"><div class="highlight"><pre>ok()</pre></div></div>
            </div>
        </body>"#;

        let report = NotebookConverter::default()
            .convert_html("broken.html", html)
            .unwrap();

        assert_eq!(report.cells.len(), 3);
        assert_eq!(report.cells[0], ExtractedCell::empty(CellKind::Code));
        assert_eq!(report.cells[1], ExtractedCell::empty(CellKind::Markdown));
        assert_eq!(report.cells[2].source(), ["ok()"]);
        assert_eq!(
            report.diagnostics,
            vec![
                Diagnostic::MalformedCellContent {
                    position: 0,
                    kind: CellKind::Code
                },
                Diagnostic::MalformedCellContent {
                    position: 1,
                    kind: CellKind::Markdown
                },
            ]
        );
    }

    #[test]
    fn test_no_containers_is_an_empty_result_not_an_error() {
        let report = NotebookConverter::default()
            .convert_html("plain.html", "<html><body><p>Not a notebook</p></body></html>")
            .unwrap();
        assert!(report.cells.is_empty());
        assert!(report.is_empty_result());
    }

    #[test]
    fn test_sources_concatenate_in_given_order() {
        let first = FakeNotebook::new().markdown("<p>a</p>").code(&["b"]).build();
        let second = FakeNotebook::new()
            .code(&["c"])
            .code(&["d"])
            .markdown("<p>e</p>")
            .build();

        let run = NotebookConverter::default()
            .convert_sources([("first.html", first.as_str()), ("second.html", second.as_str())]);

        let texts: Vec<String> = run
            .document
            .cells
            .iter()
            .map(ExtractedCell::source_text)
            .collect();
        assert_eq!(texts, vec!["a", "b", "c", "d", "e"]);
        assert_eq!(run.converted().count(), 2);
        assert_eq!(run.failures().count(), 0);
    }

    #[test]
    fn test_failed_source_does_not_stop_the_run() {
        let good = FakeNotebook::new().code(&["x = 1"]).build();
        let converter = NotebookConverter::default();

        let outcomes = vec![
            NotebookConverter::outcome(
                "bad.html".to_string(),
                converter.convert_bytes("bad.html", &[0xff, 0xfe, 0x00]),
            ),
            NotebookConverter::outcome(
                "good.html".to_string(),
                converter.convert_html("good.html", &good),
            ),
        ];
        let run = converter.finish(outcomes);

        assert_eq!(run.document.len(), 1);
        let failures: Vec<&str> = run.failures().map(|(name, _)| name).collect();
        assert_eq!(failures, vec!["bad.html"]);
        assert_eq!(run.sources[1].name(), "good.html");
        assert!(run.into_document().is_ok());
    }

    #[test]
    fn test_all_sources_failing_is_an_error() {
        let converter = NotebookConverter::default();
        let run = converter.finish(vec![NotebookConverter::outcome(
            "bad.html".to_string(),
            converter.convert_bytes("bad.html", &[0xc3, 0x28]),
        )]);
        assert!(matches!(
            run.into_document(),
            Err(ConvertError::NoUsableSource { count: 1 })
        ));
    }

    #[test]
    fn test_conversion_is_idempotent() {
        let html = FakeNotebook::new()
            .markdown("<h3>Notes</h3><ul><li>one</li><li>two</li></ul>")
            .code(&["def f(x):", "    return x * 2", "", "f(3)"])
            .build();
        let converter = NotebookConverter::default();

        let first = converter
            .convert_sources([("nb.html", html.as_str())])
            .document
            .to_json()
            .unwrap();
        let second = converter
            .convert_sources([("nb.html", html.as_str())])
            .document
            .to_json()
            .unwrap();
        assert_eq!(first, second);
    }
}
