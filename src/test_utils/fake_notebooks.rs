/// Fake notebook creator that writes JupyterLab-shaped HTML exports to disk
use std::fs;
use std::path::{Path, PathBuf};

const KEYWORDS: [&str; 16] = [
    "def", "return", "import", "from", "as", "for", "in", "if", "else", "while", "class", "with",
    "lambda", "None", "True", "False",
];

#[derive(Debug, Clone)]
enum FakeCell {
    Markdown(String),
    Code(Vec<String>),
    Raw(String),
}

/// Builder for an exported notebook page.
///
/// Markdown cells take already rendered HTML. Code cells take plain source
/// lines and get pygments-style highlighting spans, the way the exporter
/// emits them.
#[derive(Debug, Clone, Default)]
pub struct FakeNotebook {
    title: String,
    cells: Vec<FakeCell>,
}

impl FakeNotebook {
    pub fn new() -> Self {
        Self {
            title: "Notebook".to_string(),
            cells: Vec::new(),
        }
    }

    pub fn title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    pub fn markdown(mut self, rendered_html: &str) -> Self {
        self.cells.push(FakeCell::Markdown(rendered_html.to_string()));
        self
    }

    pub fn code(mut self, lines: &[&str]) -> Self {
        self.cells
            .push(FakeCell::Code(lines.iter().map(|l| l.to_string()).collect()));
        self
    }

    pub fn raw(mut self, text: &str) -> Self {
        self.cells.push(FakeCell::Raw(text.to_string()));
        self
    }

    pub fn build(&self) -> String {
        let mut html = format!(
            r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8" />
<title>{}</title>
<style type="text/css">.jp-Cell {{ padding: 4px; }}</style>
</head>
<body class="jp-Notebook" data-jp-theme-light="true">
<main>
"#,
            html_escape::encode_text(&self.title)
        );

        for (index, cell) in self.cells.iter().enumerate() {
            let id = format!("cell-id={index}");
            match cell {
                FakeCell::Markdown(rendered) => html.push_str(&markdown_cell(&id, rendered)),
                FakeCell::Code(lines) => html.push_str(&code_cell(&id, index + 1, lines)),
                FakeCell::Raw(text) => html.push_str(&raw_cell(&id, text)),
            }
        }

        html.push_str("</main>\n</body>\n</html>\n");
        html
    }

    pub fn write_to<P: AsRef<Path>>(
        &self,
        dir: P,
        file_name: &str,
    ) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let path = dir.as_ref().join(file_name);
        fs::write(&path, self.build())?;
        Ok(path)
    }
}

fn markdown_cell(id: &str, rendered: &str) -> String {
    format!(
        r#"<div class="jp-Cell jp-MarkdownCell jp-Notebook-cell" id="{id}">
<div class="jp-Cell-inputWrapper" tabindex="0">
<div class="jp-Collapser jp-InputCollapser jp-Cell-inputCollapser"></div>
<div class="jp-InputArea jp-Cell-inputArea"><div class="jp-InputPrompt jp-InputArea-prompt">
</div><div class="jp-RenderedHTMLCommon jp-RenderedMarkdown jp-MarkdownOutput " data-mime-type="text/markdown">
{rendered}
</div>
</div>
</div>
</div>
"#
    )
}

fn code_cell(id: &str, prompt: usize, lines: &[String]) -> String {
    let highlighted: Vec<String> = lines.iter().map(|line| highlight_line(line)).collect();
    format!(
        r#"<div class="jp-Cell jp-CodeCell jp-Notebook-cell jp-mod-noOutputs" id="{id}">
<div class="jp-Cell-inputWrapper" tabindex="0">
<div class="jp-Collapser jp-InputCollapser jp-Cell-inputCollapser"></div>
<div class="jp-InputArea jp-Cell-inputArea">
<div class="jp-InputPrompt jp-InputArea-prompt">In&nbsp;[{prompt}]:</div>
<div class="jp-CodeMirrorEditor jp-Editor jp-InputArea-editor" data-type="inline">
<div class="cm-editor cm-s-jupyter">
<div class="highlight hl-ipython3"><pre><span></span>{}
</pre></div>
</div>
</div>
</div>
</div>
</div>
"#,
        highlighted.join("\n")
    )
}

fn raw_cell(id: &str, text: &str) -> String {
    format!(
        r#"<div class="jp-Cell jp-RawCell jp-Notebook-cell" id="{id}">
<div class="jp-Cell-inputWrapper"><div class="jp-InputArea jp-Cell-inputArea"><pre>{}</pre></div></div>
</div>
"#,
        html_escape::encode_text(text)
    )
}

/// Wraps words in token spans and escapes everything else. The text content
/// of the result is exactly `line`.
fn highlight_line(line: &str) -> String {
    let mut output = String::new();
    let mut word = String::new();

    for ch in line.chars() {
        if ch.is_alphanumeric() || ch == '_' {
            word.push(ch);
            continue;
        }
        flush_word(&mut word, &mut output);
        if ch.is_whitespace() {
            output.push(ch);
        } else {
            output.push_str(&format!(
                r#"<span class="o">{}</span>"#,
                html_escape::encode_text(&ch.to_string())
            ));
        }
    }
    flush_word(&mut word, &mut output);
    output
}

fn flush_word(word: &mut String, output: &mut String) {
    if word.is_empty() {
        return;
    }
    let class = if KEYWORDS.contains(&word.as_str()) {
        "k"
    } else if word.chars().all(|c| c.is_ascii_digit()) {
        "mi"
    } else {
        "n"
    };
    output.push_str(&format!(r#"<span class="{class}">{word}</span>"#));
    word.clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_highlighting_escapes_and_keeps_text() {
        let highlighted = highlight_line("if a < b & c: return 1");
        assert!(highlighted.contains(r#"<span class="k">if</span>"#));
        assert!(highlighted.contains("&lt;"));
        assert!(highlighted.contains("&amp;"));
        assert!(highlighted.contains(r#"<span class="mi">1</span>"#));
    }

    #[test]
    fn test_build_contains_every_cell() {
        let html = FakeNotebook::new()
            .title("Demo")
            .markdown("<p>hi</p>")
            .code(&["x = 1"])
            .raw("raw")
            .build();
        assert!(html.contains("<title>Demo</title>"));
        assert_eq!(html.matches("jp-Notebook-cell").count(), 3);
    }
}
