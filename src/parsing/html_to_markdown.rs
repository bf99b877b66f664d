use once_cell::sync::Lazy;
use regex::Regex;

use crate::dom::{HtmlNode, RawDocument};
use crate::error::Result;
use crate::markdown::{
    Block, Document, HeadingLevel, Inline, ListItem, ListKind, Style, TableAlignment, TableRow,
    Text,
};
use crate::parsing::code_extractor::collect_code_text;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));
static TEXT_ALIGN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"text-align\s*:\s*(left|center|right)").expect("valid regex")
});

/// Permalink glyph JupyterLab appends to rendered headings.
const PILCROW: char = '¶';

/// Elements whose children flow into the surrounding paragraph.
const INLINE_TAGS: &[&str] = &[
    "a", "abbr", "b", "bdi", "br", "cite", "code", "del", "em", "font", "i", "img", "kbd",
    "label", "mark", "q", "s", "samp", "small", "span", "strike", "strong", "sub", "sup", "time",
    "u", "var",
];

/// Converts rendered markdown HTML back into a markdown AST.
///
/// This is the first phase of the HTML→Markdown→source pipeline; the
/// [`MarkdownRenderer`](crate::parsing::markdown_renderer::MarkdownRenderer)
/// turns the resulting [`Document`] into text.
///
/// # Responsibilities
///
/// - Block structure: headings, paragraphs, lists, fenced code, quotes,
///   tables and rules become [`Block`]s in document order
/// - Inline structure: emphasis, strong, strikethrough, code spans, links
///   and images nest exactly as the HTML elements did
/// - Cleanup: whitespace runs collapse, heading permalinks are dropped
/// - Anything unrecognised at block level degrades to its plain text
///
/// # Usage
///
/// ```rust,no_run
/// use nbrecover::parsing::html_to_markdown::HtmlToMarkdownConverter;
/// # fn main() -> nbrecover::error::Result<()> {
/// let converter = HtmlToMarkdownConverter::new();
/// let document = converter.convert("<h2>Title</h2><p>Some <strong>bold</strong> text.</p>")?;
/// # Ok(())
/// # }
/// ```
pub struct HtmlToMarkdownConverter {}

impl HtmlToMarkdownConverter {
    pub fn new() -> Self {
        HtmlToMarkdownConverter {}
    }

    /// Parses an HTML fragment and converts its body.
    pub fn convert(&self, html: &str) -> Result<Document> {
        let dom = RawDocument::parse("fragment", html)?;
        Ok(self.convert_node(&dom.body()))
    }

    /// Converts the children of an already-parsed container element.
    pub fn convert_node<N: HtmlNode>(&self, container: &N) -> Document {
        Document {
            blocks: self.convert_blocks(container),
        }
    }

    fn convert_blocks<N: HtmlNode>(&self, container: &N) -> Vec<Block> {
        let mut blocks = Vec::new();
        let mut pending = Text::default();

        for child in container.children() {
            self.visit_block_child(&child, &mut blocks, &mut pending);
        }
        self.flush_text_as_paragraph(&mut pending, &mut blocks);

        blocks
    }

    fn visit_block_child<N: HtmlNode>(
        &self,
        node: &N,
        blocks: &mut Vec<Block>,
        pending: &mut Text,
    ) {
        let Some(tag_name) = node.tag_name() else {
            if node.text().is_some() {
                self.collect_inline(node, pending, true);
            }
            return;
        };

        if INLINE_TAGS.contains(&tag_name) {
            self.collect_inline(node, pending, true);
            return;
        }

        match tag_name {
            "script" | "style" | "head" | "meta" | "link" | "template" | "noscript" => {}
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                self.flush_text_as_paragraph(pending, blocks);
                self.handle_heading(tag_name, node, blocks);
            }
            "p" => {
                self.flush_text_as_paragraph(pending, blocks);
                let mut content = Text::default();
                self.collect_children(node, &mut content, true);
                self.push_paragraph(content, blocks);
            }
            "ul" | "ol" => {
                self.flush_text_as_paragraph(pending, blocks);
                self.handle_list(tag_name, node, blocks);
            }
            "pre" => {
                self.flush_text_as_paragraph(pending, blocks);
                self.handle_pre(node, blocks);
            }
            "blockquote" => {
                self.flush_text_as_paragraph(pending, blocks);
                let content = self.convert_blocks(node);
                if !content.is_empty() {
                    blocks.push(Block::Quote { content });
                }
            }
            "hr" => {
                self.flush_text_as_paragraph(pending, blocks);
                blocks.push(Block::ThematicBreak);
            }
            "table" => {
                self.flush_text_as_paragraph(pending, blocks);
                self.handle_table(node, blocks);
            }
            "div" | "section" | "article" | "main" | "header" | "footer" | "aside" | "figure"
            | "body" | "html" => {
                self.flush_text_as_paragraph(pending, blocks);
                blocks.extend(self.convert_blocks(node));
            }
            _ => {
                // Unsupported block: keep its words, drop its structure.
                self.flush_text_as_paragraph(pending, blocks);
                let flattened = clean_text(&node.text_content());
                self.push_paragraph(Text::from(flattened.trim()), blocks);
            }
        }
    }

    fn flush_text_as_paragraph(&self, pending: &mut Text, blocks: &mut Vec<Block>) {
        let content = std::mem::take(pending);
        self.push_paragraph(content, blocks);
    }

    fn push_paragraph(&self, content: Text, blocks: &mut Vec<Block>) {
        if !content.is_blank() {
            blocks.push(Block::Paragraph { content });
        }
    }

    fn handle_heading<N: HtmlNode>(&self, tag_name: &str, node: &N, blocks: &mut Vec<Block>) {
        let level = HeadingLevel::from_tag(tag_name).unwrap_or(HeadingLevel::H1);
        let mut content = Text::default();
        self.collect_children(node, &mut content, true);
        if !content.is_blank() {
            blocks.push(Block::Heading { level, content });
        }
    }

    fn handle_list<N: HtmlNode>(&self, tag_name: &str, node: &N, blocks: &mut Vec<Block>) {
        let kind = self.get_list_kind(tag_name, node);
        let items: Vec<ListItem> = node
            .children()
            .iter()
            .filter(|child| child.is_tag("li"))
            .map(|li| ListItem::new(self.convert_blocks(li)))
            .collect();

        if !items.is_empty() {
            blocks.push(Block::List { kind, items });
        }
    }

    fn get_list_kind<N: HtmlNode>(&self, tag_name: &str, node: &N) -> ListKind {
        if tag_name == "ol" {
            let start = node
                .attribute("start")
                .and_then(|value| value.trim().parse::<u32>().ok())
                .unwrap_or(1);
            ListKind::Ordered { start }
        } else {
            ListKind::Unordered
        }
    }

    fn handle_pre<N: HtmlNode>(&self, node: &N, blocks: &mut Vec<Block>) {
        let mut content = String::new();
        collect_code_text(node, &mut content);
        let content = content.trim_end_matches(['\n', '\r']).to_string();
        if content.trim().is_empty() {
            return;
        }

        let language = std::iter::once(node.clone())
            .chain(node.find_descendant(|n: &N| n.is_tag("code")))
            .flat_map(|n| n.classes())
            .find_map(|class| class.strip_prefix("language-").map(str::to_string));

        blocks.push(Block::CodeBlock { language, content });
    }

    fn handle_table<N: HtmlNode>(&self, node: &N, blocks: &mut Vec<Block>) {
        let mut rows: Vec<N> = Vec::new();
        for child in node.children() {
            match child.tag_name() {
                Some("tr") => rows.push(child),
                Some("thead") | Some("tbody") | Some("tfoot") => {
                    rows.extend(child.children().into_iter().filter(|n| n.is_tag("tr")));
                }
                _ => {}
            }
        }

        let mut rows = rows.into_iter();
        let Some(header_node) = rows.next() else {
            return;
        };

        let header_cells = Self::row_cells(&header_node);
        let mut alignment: Vec<TableAlignment> =
            header_cells.iter().map(Self::cell_alignment).collect();
        let header = self.extract_table_row(&header_cells);
        let body: Vec<TableRow> = rows
            .map(|row| self.extract_table_row(&Self::row_cells(&row)))
            .collect();

        let columns = body
            .iter()
            .map(|row| row.cells.len())
            .chain(std::iter::once(header.cells.len()))
            .max()
            .unwrap_or(0);
        if columns == 0 {
            return;
        }

        let pad = |mut row: TableRow| {
            row.cells.resize(columns, Text::default());
            row
        };
        alignment.resize(columns, TableAlignment::None);

        blocks.push(Block::Table {
            header: Some(pad(header)),
            rows: body.into_iter().map(pad).collect(),
            alignment,
        });
    }

    fn row_cells<N: HtmlNode>(row: &N) -> Vec<N> {
        row.children()
            .into_iter()
            .filter(|cell| cell.is_tag("td") || cell.is_tag("th"))
            .collect()
    }

    fn extract_table_row<N: HtmlNode>(&self, cells: &[N]) -> TableRow {
        TableRow::new(
            cells
                .iter()
                .map(|cell| {
                    let mut content = Text::default();
                    self.collect_children(cell, &mut content, true);
                    content
                })
                .collect(),
        )
    }

    fn cell_alignment<N: HtmlNode>(cell: &N) -> TableAlignment {
        let declared = cell
            .attribute("style")
            .and_then(|style| {
                TEXT_ALIGN
                    .captures(&style)
                    .and_then(|caps| caps.get(1))
                    .map(|m| m.as_str().to_string())
            })
            .or_else(|| cell.attribute("align"));

        match declared.as_deref().map(str::trim) {
            Some("left") => TableAlignment::Left,
            Some("center") => TableAlignment::Center,
            Some("right") => TableAlignment::Right,
            _ => TableAlignment::None,
        }
    }

    fn collect_children<N: HtmlNode>(&self, node: &N, text: &mut Text, after_space: bool) {
        for child in node.children() {
            self.collect_inline(&child, text, after_space);
        }
    }

    /// Appends the inline content of `node` to `text`.
    ///
    /// `after_space` says whether whatever precedes `text` ends in
    /// whitespace; it only matters while `text` is still empty.
    fn collect_inline<N: HtmlNode>(&self, node: &N, text: &mut Text, after_space: bool) {
        let at_space = if text.is_empty() {
            after_space
        } else {
            text.ends_with_whitespace()
        };

        if let Some(raw) = node.text() {
            let cleaned = clean_text(&raw);
            let piece: &str = if at_space {
                cleaned.trim_start()
            } else {
                &cleaned
            };
            text.push_str(piece);
            return;
        }

        let Some(tag_name) = node.tag_name() else {
            self.collect_children(node, text, at_space);
            return;
        };

        if node.has_class("anchor-link") {
            return;
        }

        match tag_name {
            "script" | "style" | "template" => {}
            "strong" | "b" => self.push_styled(Style::Strong, node, text, at_space),
            "em" | "i" => self.push_styled(Style::Emphasis, node, text, at_space),
            "del" | "s" | "strike" => self.push_styled(Style::Strikethrough, node, text, at_space),
            "code" => {
                let code = node.text_content().replace(['\n', '\r'], " ");
                if !code.is_empty() {
                    text.push(Inline::Code(code));
                }
            }
            "a" => self.handle_link(node, text, at_space),
            "img" => {
                if let Some(url) = node.attribute("src") {
                    text.push(Inline::Image {
                        alt_text: node.attribute("alt").unwrap_or_default(),
                        url,
                        title: node.attribute("title"),
                    });
                }
            }
            "br" => text.push(Inline::LineBreak),
            _ => self.collect_children(node, text, at_space),
        }
    }

    fn push_styled<N: HtmlNode>(&self, style: Style, node: &N, text: &mut Text, at_space: bool) {
        let mut content = Text::default();
        self.collect_children(node, &mut content, at_space);
        if content.is_empty() {
            return;
        }
        if content.is_blank() {
            text.push_str(" ");
        } else {
            text.push(Inline::Styled { style, content });
        }
    }

    fn handle_link<N: HtmlNode>(&self, node: &N, text: &mut Text, at_space: bool) {
        match node.attribute("href").filter(|href| !href.is_empty()) {
            Some(url) => {
                let mut content = Text::default();
                self.collect_children(node, &mut content, true);
                text.push(Inline::Link {
                    content,
                    url,
                    title: node.attribute("title"),
                });
            }
            None => self.collect_children(node, text, at_space),
        }
    }
}

impl Default for HtmlToMarkdownConverter {
    fn default() -> Self {
        Self::new()
    }
}

/// Drops permalink glyphs and collapses whitespace runs to one space.
fn clean_text(raw: &str) -> String {
    let without_pilcrow: String = raw.chars().filter(|c| *c != PILCROW).collect();
    WHITESPACE.replace_all(&without_pilcrow, " ").into_owned()
}
