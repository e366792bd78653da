//! Block and inline span types
//!
//! A document is a flat, ordered sequence of paragraph-level blocks. List
//! nesting is not represented structurally: every list item carries its own
//! depth. Tables are the only recursive block, each cell holding its own
//! block sequence.

use serde::{Deserialize, Serialize};

/// An ordered sequence of blocks (a document, a tab, or a table cell)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockSequence {
    pub blocks: Vec<Block>,
}

/// A paragraph-level unit of content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Block {
    Heading(Heading),
    Paragraph(Paragraph),
    BulletedItem(ListItem),
    NumberedItem(ListItem),
    Table(Table),
    CodeBlock(CodeBlock),
    SectionBreak,
}

/// Heading (level 1 to 6)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Heading {
    pub level: u8,
    pub spans: Vec<Span>,
}

/// Paragraph of inline spans
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    pub spans: Vec<Span>,
}

/// Bulleted or numbered list item; depth 0 is the outermost level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListItem {
    pub depth: u8,
    pub spans: Vec<Span>,
}

/// Fenced code block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeBlock {
    pub lang: Option<String>,
    pub code: String,
}

/// Rectangular table: every row has the same number of cells.
///
/// Rows are private so the invariant is enforced on construction (short rows
/// are padded with empty cells), including when deserializing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawTable")]
pub struct Table {
    rows: Vec<TableRow>,
}

#[derive(Deserialize)]
struct RawTable {
    rows: Vec<TableRow>,
}

impl From<RawTable> for Table {
    fn from(raw: RawTable) -> Self {
        Table::new(raw.rows)
    }
}

/// Table row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    pub cells: Vec<TableCell>,
}

/// Table cell holding its own block sequence
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableCell {
    pub blocks: Vec<Block>,
}

/// A contiguous run of text sharing one set of attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub text: String,
    #[serde(default)]
    pub style: SpanStyle,
}

/// Inline attribute set
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct SpanStyle {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
    /// Monospace run (inline code)
    pub code: bool,
    /// Link target URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl SpanStyle {
    pub fn with_bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn with_italic(mut self) -> Self {
        self.italic = true;
        self
    }

    pub fn with_underline(mut self) -> Self {
        self.underline = true;
        self
    }

    pub fn with_strikethrough(mut self) -> Self {
        self.strikethrough = true;
        self
    }

    pub fn with_code(mut self) -> Self {
        self.code = true;
        self
    }

    pub fn with_link(mut self, url: impl Into<String>) -> Self {
        self.link = Some(url.into());
        self
    }

    /// Whether rendering this style needs any markup at all
    pub fn is_plain(&self) -> bool {
        *self == SpanStyle::default()
    }
}

// Convenience constructors
impl Block {
    /// Heading; the level is clamped into 1..=6
    pub fn heading(level: u8, spans: Vec<Span>) -> Self {
        Block::Heading(Heading {
            level: level.clamp(1, 6),
            spans,
        })
    }

    pub fn paragraph(spans: Vec<Span>) -> Self {
        Block::Paragraph(Paragraph { spans })
    }

    pub fn bulleted_item(depth: u8, spans: Vec<Span>) -> Self {
        Block::BulletedItem(ListItem { depth, spans })
    }

    pub fn numbered_item(depth: u8, spans: Vec<Span>) -> Self {
        Block::NumberedItem(ListItem { depth, spans })
    }

    pub fn table(rows: Vec<Vec<TableCell>>) -> Self {
        Block::Table(Table::new(
            rows.into_iter().map(|cells| TableRow { cells }).collect(),
        ))
    }

    pub fn code_block(lang: Option<String>, code: impl Into<String>) -> Self {
        Block::CodeBlock(CodeBlock {
            lang,
            code: code.into(),
        })
    }

    pub fn section_break() -> Self {
        Block::SectionBreak
    }

    /// Inline spans of a text-bearing block (empty for tables and breaks)
    pub fn spans(&self) -> &[Span] {
        match self {
            Block::Heading(h) => &h.spans,
            Block::Paragraph(p) => &p.spans,
            Block::BulletedItem(li) | Block::NumberedItem(li) => &li.spans,
            Block::Table(_) | Block::CodeBlock(_) | Block::SectionBreak => &[],
        }
    }

    /// Unstyled text content of the block
    pub fn plain_text(&self) -> String {
        match self {
            Block::CodeBlock(c) => c.code.clone(),
            Block::Table(t) => t
                .rows()
                .iter()
                .flat_map(|r| r.cells.iter())
                .flat_map(|c| c.blocks.iter())
                .map(Block::plain_text)
                .collect::<Vec<_>>()
                .join(" "),
            _ => self.spans().iter().map(|s| s.text.as_str()).collect(),
        }
    }

    pub fn is_list_item(&self) -> bool {
        matches!(self, Block::BulletedItem(_) | Block::NumberedItem(_))
    }
}

impl Span {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: SpanStyle::default(),
        }
    }

    pub fn styled(text: impl Into<String>, style: SpanStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }
}

impl Table {
    /// Build a table, padding short rows with empty cells so that every row
    /// has as many cells as the widest one
    pub fn new(mut rows: Vec<TableRow>) -> Self {
        let columns = rows.iter().map(|r| r.cells.len()).max().unwrap_or(0);
        for row in &mut rows {
            row.cells.resize_with(columns, TableCell::default);
        }
        Self { rows }
    }

    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.rows.first().map(|r| r.cells.len()).unwrap_or(0)
    }
}

impl TableCell {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }

    /// Cell holding a single plain paragraph
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            blocks: vec![Block::paragraph(vec![Span::plain(text)])],
        }
    }
}

impl BlockSequence {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// Merge adjacent spans with identical attributes and drop empty spans
pub fn merge_adjacent(spans: &[Span]) -> Vec<Span> {
    let mut merged: Vec<Span> = Vec::with_capacity(spans.len());
    for span in spans.iter().filter(|s| !s.text.is_empty()) {
        match merged.last_mut() {
            Some(last) if last.style == span.style => last.text.push_str(&span.text),
            _ => merged.push(span.clone()),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_level_clamped() {
        let h = Block::heading(9, vec![Span::plain("Deep")]);
        assert!(matches!(h, Block::Heading(Heading { level: 6, .. })));

        let h = Block::heading(0, vec![Span::plain("Shallow")]);
        assert!(matches!(h, Block::Heading(Heading { level: 1, .. })));
    }

    #[test]
    fn test_table_padded_to_rectangle() {
        let table = Table::new(vec![
            TableRow {
                cells: vec![TableCell::text("a"), TableCell::text("b"), TableCell::text("c")],
            },
            TableRow {
                cells: vec![TableCell::text("d")],
            },
        ]);
        assert_eq!(table.column_count(), 3);
        assert!(table.rows().iter().all(|r| r.cells.len() == 3));
        assert!(table.rows()[1].cells[2].blocks.is_empty());
    }

    #[test]
    fn test_deserialized_table_is_rectangular() {
        let json = r#"{"type":"table","rows":[{"cells":[{"blocks":[]},{"blocks":[]}]},{"cells":[]}]}"#;
        let block: Block = serde_json::from_str(json).unwrap();
        if let Block::Table(t) = block {
            assert_eq!(t.row_count(), 2);
            assert_eq!(t.rows()[1].cells.len(), 2);
        } else {
            panic!("Expected Table block");
        }
    }

    #[test]
    fn test_merge_adjacent() {
        let bold = SpanStyle::default().with_bold();
        let spans = vec![
            Span::styled("Hello ", bold.clone()),
            Span::styled("world", bold.clone()),
            Span::plain(""),
            Span::plain("!"),
        ];
        let merged = merge_adjacent(&spans);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].text, "Hello world");
        assert_eq!(merged[0].style, bold);
        assert_eq!(merged[1].text, "!");
    }

    #[test]
    fn test_plain_text() {
        let p = Block::paragraph(vec![
            Span::plain("Q1 "),
            Span::styled("Rocks", SpanStyle::default().with_bold()),
        ]);
        assert_eq!(p.plain_text(), "Q1 Rocks");
        assert_eq!(Block::section_break().plain_text(), "");
    }

    #[test]
    fn test_span_style_builders() {
        let style = SpanStyle::default()
            .with_italic()
            .with_link("https://example.com");
        assert!(style.italic);
        assert!(!style.bold);
        assert_eq!(style.link.as_deref(), Some("https://example.com"));
        assert!(!style.is_plain());
        assert!(SpanStyle::default().is_plain());
    }

    #[test]
    fn test_serde_roundtrip() {
        let doc = BlockSequence::new(vec![
            Block::heading(2, vec![Span::plain("Title")]),
            Block::numbered_item(1, vec![Span::plain("step")]),
            Block::table(vec![vec![TableCell::text("x")]]),
        ]);
        let json = serde_json::to_string(&doc).unwrap();
        let parsed: BlockSequence = serde_json::from_str(&json).unwrap();
        assert_eq!(doc, parsed);
    }
}
