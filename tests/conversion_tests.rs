use nbrecover::config::ConverterConfig;
use nbrecover::converter::{Diagnostic, NotebookConverter, SourceOutcome};
use nbrecover::error::ConvertError;
use nbrecover::notebook::CellKind;
use nbrecover::test_utils::fake_notebooks::FakeNotebook;
use nbrecover::test_utils::test_helpers::TempNotebookDir;
use serde_json::Value;
use std::fs;

fn analysis_notebook() -> FakeNotebook {
    FakeNotebook::new()
        .title("analysis")
        .markdown(
            r##"<h1 id="Analysis">Analysis<a class="anchor-link" href="#Analysis">¶</a></h1>
<p>Load the <em>raw</em> data, then <strong>clean</strong> it.</p>"##,
        )
        .code(&[
            "import pandas as pd",
            "",
            "def clean(df):",
            "    # keep rows where a < b & b > 0",
            "    return df[(df.a < df.b) & (df.b > 0)]",
        ])
        .raw("not a cell we recover")
        .markdown("<ol><li>first</li><li>second</li></ol>")
}

#[test]
fn test_highlighted_code_round_trips_exactly() {
    let dir = TempNotebookDir::new(&[("analysis.html", analysis_notebook())]).unwrap();
    let converter = NotebookConverter::default();

    let report = converter.convert_file(&dir.paths()[0]).unwrap();

    assert_eq!(
        report.cells[1].source(),
        [
            "import pandas as pd",
            "",
            "def clean(df):",
            "    # keep rows where a < b & b > 0",
            "    return df[(df.a < df.b) & (df.b > 0)]",
        ]
    );
    assert_eq!(report.cells[0].source_text(), "# Analysis\n\nLoad the *raw* data, then **clean** it.");
    assert_eq!(report.cells[2].source_text(), "1. first\n2. second");
    assert_eq!(report.unrecognized, 1);
}

#[test]
fn test_files_are_concatenated_in_argument_order() {
    let dir = TempNotebookDir::new(&[
        ("part2.html", FakeNotebook::new().code(&["second = 2"])),
        ("part1.html", FakeNotebook::new().code(&["first = 1"])),
    ])
    .unwrap();

    let run = NotebookConverter::default().convert_files(dir.paths());

    let sources: Vec<String> = run
        .document
        .cells
        .iter()
        .map(|cell| cell.source_text())
        .collect();
    assert_eq!(sources, vec!["second = 2", "first = 1"]);
}

#[test]
fn test_unreadable_and_invalid_sources_are_isolated() {
    let dir = TempNotebookDir::new(&[("good.html", analysis_notebook())]).unwrap();
    let missing = dir.path().join("missing.html");
    let binary = dir.path().join("binary.html");
    fs::write(&binary, b"<p>\xff\xfe").unwrap();

    let run = NotebookConverter::default().convert_files(&[
        missing.clone(),
        dir.paths()[0].clone(),
        binary,
    ]);

    assert_eq!(run.sources.len(), 3);
    assert!(matches!(
        &run.sources[0],
        SourceOutcome::Failed { error: ConvertError::Read { path, .. }, .. } if *path == missing
    ));
    assert!(matches!(&run.sources[1], SourceOutcome::Converted(_)));
    assert!(matches!(
        &run.sources[2],
        SourceOutcome::Failed { error: ConvertError::InvalidUtf8 { .. }, .. }
    ));
    assert!(run.failures().all(|(_, error)| error.is_source_fatal()));

    let document = run.into_document().unwrap();
    assert_eq!(
        document.kinds(),
        vec![CellKind::Markdown, CellKind::Code, CellKind::Markdown]
    );
}

#[test]
fn test_nothing_converted_is_reported() {
    let dir = tempfile::TempDir::new().unwrap();
    let run = NotebookConverter::default().convert_files(&[dir.path().join("nope.html")]);
    assert!(matches!(
        run.into_document(),
        Err(ConvertError::NoUsableSource { count: 1 })
    ));
}

#[test]
fn test_page_without_cells_contributes_nothing() {
    let dir = TempNotebookDir::new(&[
        ("empty.html", FakeNotebook::new()),
        ("one.html", FakeNotebook::new().markdown("<p>only</p>")),
    ])
    .unwrap();

    let run = NotebookConverter::default().convert_files(dir.paths());

    let empty = run.converted().next().unwrap();
    assert_eq!(empty.diagnostics, vec![Diagnostic::EmptyResult]);
    assert_eq!(run.document.len(), 1);
}

#[test]
fn test_notebook_json_from_files() {
    let dir = TempNotebookDir::new(&[("analysis.html", analysis_notebook())]).unwrap();
    let config = ConverterConfig {
        report_unrecognized: true,
        ..ConverterConfig::default()
    };

    let run = NotebookConverter::new(config).convert_files(dir.paths());
    let diagnostics = &run.converted().next().unwrap().diagnostics;
    assert!(matches!(
        diagnostics.as_slice(),
        [Diagnostic::UnrecognizedCell { position: 2, classes }] if classes.iter().any(|c| c == "jp-RawCell")
    ));

    let json = run.into_document().unwrap().to_json().unwrap();
    assert!(json.ends_with("}\n"));

    let value: Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["nbformat"], 4);
    assert_eq!(value["nbformat_minor"], 5);
    assert_eq!(value["metadata"]["kernelspec"]["name"], "python3");
    assert_eq!(value["metadata"]["language_info"]["pygments_lexer"], "ipython3");

    let cells = value["cells"].as_array().unwrap();
    assert_eq!(cells.len(), 3);
    assert_eq!(cells[0]["cell_type"], "markdown");
    assert_eq!(cells[1]["cell_type"], "code");
    assert_eq!(cells[1]["execution_count"], Value::Null);
    assert_eq!(cells[1]["outputs"], Value::Array(Vec::new()));
    assert_eq!(cells[1]["source"][0], "import pandas as pd\n");
    assert_eq!(cells[1]["source"][4], "    return df[(df.a < df.b) & (df.b > 0)]");
}

#[test]
fn test_config_file_changes_markers_and_metadata() {
    let dir = tempfile::TempDir::new().unwrap();
    let config_path = dir.path().join("nbrecover.json");
    fs::write(
        &config_path,
        r#"{
            "markers": {"code": "jp-RawCell"},
            "kernelspec": {"display_name": "Julia 1.9", "language": "julia", "name": "julia-1.9"}
        }"#,
    )
    .unwrap();

    let config = ConverterConfig::load_or_default(Some(config_path.as_path()));
    let html = FakeNotebook::new().code(&["x = 1"]).raw("raw").build();
    let run = NotebookConverter::new(config).convert_sources([("nb.html", html.as_str())]);

    // the highlighted cell is now unrecognized and the raw one reads as empty code
    let report = run.converted().next().unwrap();
    assert_eq!(report.unrecognized, 1);
    assert_eq!(report.cells.len(), 1);
    assert!(report.cells[0].is_empty());
    assert_eq!(run.document.metadata.kernelspec.name, "julia-1.9");
}
