use crate::markdown::{
    Block, Document, HeadingLevel, Inline, ListItem, ListKind, Style, TableAlignment, TableRow,
    Text,
};

/// Markdown AST to source text.
///
/// Second phase of the HTML→Markdown→source pipeline. Block constructs are
/// separated by one blank line; inline tokens of a block stay on its lines.
/// The output carries no leading or trailing blank lines, so it can be
/// split straight into notebook source lines.
///
/// # Usage
///
/// ```rust,no_run
/// use nbrecover::parsing::markdown_renderer::MarkdownRenderer;
/// # use nbrecover::markdown::Document;
/// # fn main() {
/// let renderer = MarkdownRenderer::new();
/// # let markdown_document = Document::new();
/// let source = renderer.render(&markdown_document);
/// # }
/// ```
pub struct MarkdownRenderer {}

impl MarkdownRenderer {
    pub fn new() -> Self {
        MarkdownRenderer {}
    }

    pub fn render(&self, doc: &Document) -> String {
        self.render_blocks(&doc.blocks)
    }

    fn render_blocks(&self, blocks: &[Block]) -> String {
        blocks
            .iter()
            .map(|block| self.render_block(block))
            .filter(|rendered| !rendered.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn render_block(&self, block: &Block) -> String {
        match block {
            Block::Heading { level, content } => self.render_heading(*level, content),
            Block::Paragraph { content } => self.render_paragraph(content),
            Block::CodeBlock { language, content } => {
                let fence = "`".repeat((longest_backtick_run(content) + 1).max(3));
                format!(
                    "{fence}{}\n{content}\n{fence}",
                    language.as_deref().unwrap_or_default()
                )
            }
            Block::Quote { content } => self.render_quote(content),
            Block::List { kind, items } => self.render_list(kind, items),
            Block::Table {
                header,
                rows,
                alignment,
            } => self.render_table(header.as_ref(), rows, alignment),
            Block::ThematicBreak => "---".to_string(),
        }
    }

    fn render_heading(&self, level: HeadingLevel, content: &Text) -> String {
        let hashes = "#".repeat(level.as_u8() as usize);
        let title = self.render_text(content).replace("  \n", " ");
        format!("{hashes} {}", title.trim())
    }

    fn render_paragraph(&self, content: &Text) -> String {
        self.render_text(content)
            .trim()
            .split('\n')
            .enumerate()
            .map(|(i, line)| if i == 0 { line } else { line.trim_start() })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn render_quote(&self, content: &[Block]) -> String {
        self.render_blocks(content)
            .split('\n')
            .map(|line| {
                if line.is_empty() {
                    ">".to_string()
                } else {
                    format!("> {line}")
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn render_list(&self, kind: &ListKind, items: &[ListItem]) -> String {
        items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                let marker = match kind {
                    ListKind::Ordered { start } => format!("{}. ", *start as usize + index),
                    ListKind::Unordered => "- ".to_string(),
                };
                self.render_list_item(&marker, item)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// First line after the marker; continuation lines, including nested
    /// lists, indented to the marker's width. Blocks inside the item are
    /// separated by a blank line, except that a nested list follows directly.
    fn render_list_item(&self, marker: &str, item: &ListItem) -> String {
        let mut body = String::new();
        for block in &item.content {
            let rendered = self.render_block(block);
            if rendered.trim().is_empty() {
                continue;
            }
            if !body.is_empty() {
                body.push_str(if matches!(block, Block::List { .. }) {
                    "\n"
                } else {
                    "\n\n"
                });
            }
            body.push_str(&rendered);
        }

        if body.is_empty() {
            return marker.trim_end().to_string();
        }

        let indent = " ".repeat(marker.len());
        body.split('\n')
            .enumerate()
            .map(|(i, line)| {
                if i == 0 {
                    format!("{marker}{line}")
                } else if line.is_empty() {
                    String::new()
                } else {
                    format!("{indent}{line}")
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn render_table(
        &self,
        header: Option<&TableRow>,
        rows: &[TableRow],
        alignment: &[TableAlignment],
    ) -> String {
        let mut lines = Vec::new();

        if let Some(header_row) = header {
            lines.push(self.render_table_row(header_row));

            let separators: Vec<&str> = alignment
                .iter()
                .map(|align| match align {
                    TableAlignment::Left => ":---",
                    TableAlignment::Center => ":---:",
                    TableAlignment::Right => "---:",
                    TableAlignment::None => "---",
                })
                .collect();
            lines.push(format!("| {} |", separators.join(" | ")));
        }

        for row in rows {
            lines.push(self.render_table_row(row));
        }

        lines.join("\n")
    }

    fn render_table_row(&self, row: &TableRow) -> String {
        let cells: Vec<String> = row
            .cells
            .iter()
            .map(|cell| {
                self.render_text(cell)
                    .replace("  \n", " ")
                    .replace('\n', " ")
                    .replace('|', "\\|")
                    .trim()
                    .to_string()
            })
            .collect();
        format!("| {} |", cells.join(" | "))
    }

    pub fn render_text(&self, text: &Text) -> String {
        let mut output = String::new();
        for item in text {
            self.render_inline(item, &mut output);
        }
        output
    }

    fn render_inline(&self, inline: &Inline, output: &mut String) {
        match inline {
            Inline::Text(content) => output.push_str(content),
            Inline::Code(code) => {
                let fence = "`".repeat(longest_backtick_run(code) + 1);
                let pad = if code.starts_with('`') || code.ends_with('`') {
                    " "
                } else {
                    ""
                };
                output.push_str(&format!("{fence}{pad}{code}{pad}{fence}"));
            }
            Inline::Styled { style, content } => {
                // `_` keeps a run from fusing with a `*` run right before it
                let after_star = output.ends_with('*');
                let marker = match style {
                    Style::Emphasis if after_star => "_",
                    Style::Emphasis => "*",
                    Style::Strong if after_star => "__",
                    Style::Strong => "**",
                    Style::Strikethrough => "~~",
                };
                self.render_styled(marker, content, output);
            }
            Inline::Link {
                content,
                url,
                title,
            } => {
                let label = self.render_text(content);
                match title {
                    Some(title) => {
                        output.push_str(&format!("[{}]({url} \"{title}\")", label.trim()))
                    }
                    None => output.push_str(&format!("[{}]({url})", label.trim())),
                }
            }
            Inline::Image {
                alt_text,
                url,
                title,
            } => match title {
                Some(title) => output.push_str(&format!("![{alt_text}]({url} \"{title}\")")),
                None => output.push_str(&format!("![{alt_text}]({url})")),
            },
            Inline::LineBreak => output.push_str("  \n"),
        }
    }

    /// Markers hug the content; surrounding spaces move outside them.
    fn render_styled(&self, marker: &str, content: &Text, output: &mut String) {
        let inner = self.render_text(content);
        let trimmed = inner.trim();
        if trimmed.is_empty() {
            output.push_str(&inner);
            return;
        }

        if inner.starts_with(char::is_whitespace) {
            output.push(' ');
        }
        output.push_str(marker);
        output.push_str(trimmed);
        output.push_str(marker);
        if inner.ends_with(char::is_whitespace) {
            output.push(' ');
        }
    }
}

fn longest_backtick_run(text: &str) -> usize {
    text.split(|c| c != '`').map(str::len).max().unwrap_or(0)
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}
