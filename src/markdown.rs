#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Heading {
        level: HeadingLevel,
        content: Text,
    },
    Paragraph {
        content: Text,
    },
    CodeBlock {
        language: Option<String>,
        content: String,
    },
    Quote {
        content: Vec<Block>,
    },
    List {
        kind: ListKind,
        items: Vec<ListItem>,
    },
    Table {
        header: Option<TableRow>,
        rows: Vec<TableRow>,
        alignment: Vec<TableAlignment>,
    },
    ThematicBreak,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Style {
    Emphasis,
    Strong,
    Strikethrough,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    Text(String),
    Code(String),
    Styled {
        style: Style,
        content: Text,
    },
    Link {
        content: Text,
        url: String,
        title: Option<String>,
    },
    Image {
        alt_text: String,
        url: String,
        title: Option<String>,
    },
    LineBreak,
}

/// Inline run of a block. Styled spans and links own nested runs, so markup
/// nests the same way the HTML did.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Text(Vec<Inline>);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HeadingLevel {
    H1 = 1,
    H2 = 2,
    H3 = 3,
    H4 = 4,
    H5 = 5,
    H6 = 6,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ListKind {
    Ordered { start: u32 },
    Unordered,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListItem {
    pub content: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub cells: Vec<Text>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TableAlignment {
    None,
    Left,
    Center,
    Right,
}

impl HeadingLevel {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "h1" => Some(HeadingLevel::H1),
            "h2" => Some(HeadingLevel::H2),
            "h3" => Some(HeadingLevel::H3),
            "h4" => Some(HeadingLevel::H4),
            "h5" => Some(HeadingLevel::H5),
            "h6" => Some(HeadingLevel::H6),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl Document {
    pub fn new() -> Self {
        Document { blocks: Vec::new() }
    }
}

impl ListItem {
    pub fn new(content: Vec<Block>) -> Self {
        ListItem { content }
    }
}

impl TableRow {
    pub fn new(cells: Vec<Text>) -> Self {
        TableRow { cells }
    }
}

impl From<&str> for Text {
    fn from(value: &str) -> Self {
        Self(vec![Inline::Text(value.to_string())])
    }
}

impl From<Vec<Inline>> for Text {
    fn from(value: Vec<Inline>) -> Self {
        Self(value)
    }
}

impl Text {
    pub fn push(&mut self, item: Inline) {
        self.0.push(item);
    }

    /// Appends plain text, merging with a preceding plain run.
    pub fn push_str(&mut self, content: &str) {
        if content.is_empty() {
            return;
        }
        if let Some(Inline::Text(last)) = self.0.last_mut() {
            last.push_str(content);
        } else {
            self.0.push(Inline::Text(content.to_string()));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when nothing but whitespace would be rendered.
    pub fn is_blank(&self) -> bool {
        self.0.iter().all(|item| match item {
            Inline::Text(content) => content.trim().is_empty(),
            Inline::Styled { content, .. } => content.is_blank(),
            Inline::LineBreak => true,
            Inline::Code(_) | Inline::Link { .. } | Inline::Image { .. } => false,
        })
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Inline> {
        self.0.iter()
    }

    /// Whether the run currently ends in whitespace (or is empty).
    pub fn ends_with_whitespace(&self) -> bool {
        match self.0.last() {
            None | Some(Inline::LineBreak) => true,
            Some(Inline::Text(content)) => content.ends_with(char::is_whitespace),
            Some(Inline::Styled { content, .. }) => content.ends_with_whitespace(),
            Some(_) => false,
        }
    }
}

impl IntoIterator for Text {
    type Item = Inline;
    type IntoIter = std::vec::IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Text {
    type Item = &'a Inline;
    type IntoIter = std::slice::Iter<'a, Inline>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
