use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};

use crate::error::{ConvertError, Result};

/// Read-only view of a DOM node.
///
/// Cell location, classification and content reconstruction only ever talk
/// to this trait, so none of them depend on the parser's object model.
pub trait HtmlNode: Clone {
    /// Lowercase tag name, `None` for text, comment and document nodes.
    fn tag_name(&self) -> Option<&str>;

    /// Raw text for text nodes, `None` for everything else.
    fn text(&self) -> Option<String>;

    fn children(&self) -> Vec<Self>;

    fn attribute(&self, name: &str) -> Option<String>;

    fn is_element(&self) -> bool {
        self.tag_name().is_some()
    }

    fn is_tag(&self, tag: &str) -> bool {
        self.tag_name().is_some_and(|name| name.eq_ignore_ascii_case(tag))
    }

    fn classes(&self) -> Vec<String> {
        self.attribute("class")
            .map(|value| value.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }

    fn has_class(&self, class: &str) -> bool {
        self.attribute("class")
            .is_some_and(|value| value.split_whitespace().any(|token| token == class))
    }

    fn has_any_class<S: AsRef<str>>(&self, classes: &[S]) -> bool {
        classes.iter().any(|class| self.has_class(class.as_ref()))
    }

    /// Concatenated text of every descendant text node, in document order.
    fn text_content(&self) -> String {
        let mut output = String::new();
        collect_text(self, &mut output);
        output
    }

    /// First descendant (excluding `self`) matching `predicate`, depth-first.
    fn find_descendant<F>(&self, predicate: F) -> Option<Self>
    where
        F: Fn(&Self) -> bool,
    {
        find_first(self, &predicate)
    }
}

fn collect_text<N: HtmlNode>(node: &N, output: &mut String) {
    if let Some(text) = node.text() {
        output.push_str(&text);
        return;
    }
    for child in node.children() {
        collect_text(&child, output);
    }
}

fn find_first<N, F>(node: &N, predicate: &F) -> Option<N>
where
    N: HtmlNode,
    F: Fn(&N) -> bool,
{
    for child in node.children() {
        if predicate(&child) {
            return Some(child);
        }
        if let Some(found) = find_first(&child, predicate) {
            return Some(found);
        }
    }
    None
}

impl HtmlNode for Handle {
    fn tag_name(&self) -> Option<&str> {
        match &self.data {
            NodeData::Element { name, .. } => Some(name.local.as_ref()),
            _ => None,
        }
    }

    fn text(&self) -> Option<String> {
        match &self.data {
            NodeData::Text { contents } => Some(contents.borrow().to_string()),
            _ => None,
        }
    }

    fn children(&self) -> Vec<Self> {
        self.children.borrow().iter().cloned().collect()
    }

    fn attribute(&self, name: &str) -> Option<String> {
        match &self.data {
            NodeData::Element { attrs, .. } => attrs
                .borrow()
                .iter()
                .find(|attr| attr.name.local.as_ref() == name)
                .map(|attr| attr.value.to_string()),
            _ => None,
        }
    }
}

/// A parsed HTML source. Cell nodes handed out by the locator point into it.
pub struct RawDocument {
    dom: RcDom,
}

impl RawDocument {
    /// Parses `html`. `name` only labels errors.
    pub fn parse(name: &str, html: &str) -> Result<Self> {
        let dom = parse_document(RcDom::default(), Default::default())
            .from_utf8()
            .read_from(&mut html.as_bytes())
            .map_err(|e| ConvertError::Parse {
                name: name.to_string(),
                reason: e.to_string(),
            })?;

        let document = Self { dom };
        if !document.root().children().iter().any(|node| node.is_element()) {
            return Err(ConvertError::Parse {
                name: name.to_string(),
                reason: "no element tree was produced".to_string(),
            });
        }

        Ok(document)
    }

    /// Decodes `bytes` as UTF-8 before parsing.
    pub fn parse_bytes(name: &str, bytes: &[u8]) -> Result<Self> {
        let html = std::str::from_utf8(bytes).map_err(|source| ConvertError::InvalidUtf8 {
            name: name.to_string(),
            source,
        })?;
        Self::parse(name, html)
    }

    pub fn root(&self) -> Handle {
        self.dom.document.clone()
    }

    /// The `<body>` element, or the document root if the parser produced none.
    pub fn body(&self) -> Handle {
        let root = self.root();
        root.find_descendant(|node: &Handle| node.is_tag("body"))
            .unwrap_or(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_queries() {
        let doc = RawDocument::parse(
            "inline",
            r#"<div id="x" class="jp-Cell  jp-CodeCell jp-Notebook-cell">hi</div>"#,
        )
        .unwrap();
        let div = doc.root().find_descendant(|n: &Handle| n.is_tag("div")).unwrap();

        assert!(div.has_class("jp-Cell"));
        assert!(div.has_class("jp-Notebook-cell"));
        assert!(!div.has_class("jp-Cell-inputWrapper"));
        assert!(div.has_any_class(&["nope", "jp-CodeCell"]));
        assert_eq!(
            div.classes(),
            vec!["jp-Cell", "jp-CodeCell", "jp-Notebook-cell"]
        );
        assert_eq!(div.attribute("id").as_deref(), Some("x"));
        assert_eq!(div.attribute("missing"), None);
    }

    #[test]
    fn test_text_content_decodes_entities_in_document_order() {
        let doc = RawDocument::parse(
            "inline",
            "<p>a &lt; <b>b</b> &amp; <i>c<span>d</span></i></p>",
        )
        .unwrap();
        let p = doc.body().find_descendant(|n: &Handle| n.is_tag("p")).unwrap();
        assert_eq!(p.text_content(), "a < b & cd");
    }

    #[test]
    fn test_empty_input_still_yields_a_tree() {
        let doc = RawDocument::parse("empty", "").unwrap();
        assert!(doc.body().is_tag("body"));
        assert!(doc.body().children().is_empty());
    }

    #[test]
    fn test_invalid_utf8_is_a_parse_failure() {
        let err = RawDocument::parse_bytes("broken.html", &[0x3c, 0x70, 0xff, 0xfe])
            .err()
            .unwrap();
        assert!(matches!(err, ConvertError::InvalidUtf8 { ref name, .. } if name == "broken.html"));
        assert!(err.is_source_fatal());
    }
}
