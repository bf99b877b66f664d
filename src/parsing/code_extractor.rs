use crate::config::CellMarkers;
use crate::dom::HtmlNode;

/// Classes a highlighter uses for one-element-per-line wrappers.
const LINE_WRAPPER_CLASSES: [&str; 2] = ["cm-line", "line"];

/// Turns syntax-highlighted `<pre>` markup back into plain source lines.
pub struct CodeExtractor<'a> {
    markers: &'a CellMarkers,
}

impl<'a> CodeExtractor<'a> {
    pub fn new(markers: &'a CellMarkers) -> Self {
        CodeExtractor { markers }
    }

    /// The `<pre>` inside the cell's input editor. Output areas are never
    /// searched, so a `<pre>` holding printed output is not mistaken for code.
    pub fn locate<N: HtmlNode>(&self, cell: &N) -> Option<N> {
        let editor = cell.find_descendant(|node: &N| node.has_any_class(&self.markers.code_editor))?;
        if editor.is_tag("pre") {
            return Some(editor);
        }
        editor.find_descendant(|node: &N| node.is_tag("pre"))
    }

    /// Source lines of a code cell, or `None` when the cell has no code block.
    pub fn extract<N: HtmlNode>(&self, cell: &N) -> Option<Vec<String>> {
        let pre = self.locate(cell)?;
        Some(code_lines(&pre))
    }
}

/// Lines of a highlighted block with leading and trailing blank lines removed.
/// Interior blank lines and indentation are kept as they are.
pub fn code_lines<N: HtmlNode>(pre: &N) -> Vec<String> {
    let mut raw = String::new();
    collect_code_text(pre, &mut raw);
    let raw = raw.replace("\r\n", "\n");

    let lines: Vec<&str> = raw.split('\n').collect();
    let first = lines.iter().position(|line| !line.trim().is_empty());
    let last = lines.iter().rposition(|line| !line.trim().is_empty());

    match (first, last) {
        (Some(first), Some(last)) => lines[first..=last]
            .iter()
            .map(|line| line.to_string())
            .collect(),
        _ => Vec::new(),
    }
}

/// Concatenates text under `node`. `br` yields one newline; a per-line
/// wrapper ends its line unless its own text already did.
pub(crate) fn collect_code_text<N: HtmlNode>(node: &N, output: &mut String) {
    if let Some(text) = node.text() {
        output.push_str(&text);
        return;
    }

    match node.tag_name() {
        Some("br") => output.push('\n'),
        Some("script") | Some("style") => {}
        Some(tag) if is_line_wrapper(node, tag) => {
            let start = output.len();
            for child in node.children() {
                collect_code_text(&child, output);
            }
            if output.len() == start || !output.ends_with('\n') {
                output.push('\n');
            }
        }
        _ => {
            for child in node.children() {
                collect_code_text(&child, output);
            }
        }
    }
}

fn is_line_wrapper<N: HtmlNode>(node: &N, tag: &str) -> bool {
    matches!(tag, "div" | "p") || node.has_any_class(&LINE_WRAPPER_CLASSES)
}
