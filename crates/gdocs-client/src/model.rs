//! Document wire model
//!
//! Mirrors the subset of the document JSON that gdocmd reads. Every field is
//! optional on the wire, so structs default missing fields instead of failing.
//! Unknown fields are ignored.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A remote document as returned by `documents.get`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RemoteDocument {
    pub document_id: String,
    pub title: String,
    /// Legacy single-tab body (absent when tab content is requested)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Body>,
    pub lists: HashMap<String, List>,
    pub tabs: Vec<Tab>,
}

/// A document tab, possibly nesting child tabs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Tab {
    pub tab_properties: TabProperties,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_tab: Option<DocumentTab>,
    pub child_tabs: Vec<Tab>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TabProperties {
    pub tab_id: String,
    pub title: String,
    pub index: u32,
    pub nesting_level: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DocumentTab {
    pub body: Body,
    pub lists: HashMap<String, List>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Body {
    pub content: Vec<StructuralElement>,
}

/// One top-level element of a body or table cell.
///
/// On the wire exactly one of the kind fields is set; use [`StructuralElement::kind`]
/// to match on it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StructuralElement {
    pub start_index: u32,
    pub end_index: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paragraph: Option<Paragraph>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<Table>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_break: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_of_contents: Option<serde_json::Value>,
}

/// Closed view over the element kinds
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ElementKind<'a> {
    Paragraph(&'a Paragraph),
    Table(&'a Table),
    SectionBreak,
    TableOfContents,
    /// An element kind this model does not know about
    Other,
}

impl StructuralElement {
    pub fn kind(&self) -> ElementKind<'_> {
        if let Some(p) = &self.paragraph {
            ElementKind::Paragraph(p)
        } else if let Some(t) = &self.table {
            ElementKind::Table(t)
        } else if self.section_break.is_some() {
            ElementKind::SectionBreak
        } else if self.table_of_contents.is_some() {
            ElementKind::TableOfContents
        } else {
            ElementKind::Other
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Paragraph {
    pub elements: Vec<ParagraphElement>,
    pub paragraph_style: ParagraphStyle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bullet: Option<Bullet>,
}

impl Paragraph {
    /// Concatenated text of all runs
    pub fn text(&self) -> String {
        self.elements
            .iter()
            .filter_map(|e| e.text_run.as_ref())
            .map(|r| r.content.as_str())
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParagraphStyle {
    pub named_style_type: String,
}

impl ParagraphStyle {
    /// Heading level for heading-like named styles.
    ///
    /// `HEADING_1`..`HEADING_6` map to their level and `TITLE` to level 1.
    pub fn heading_level(&self) -> Option<u8> {
        match self.named_style_type.as_str() {
            "TITLE" | "HEADING_1" => Some(1),
            "HEADING_2" => Some(2),
            "HEADING_3" => Some(3),
            "HEADING_4" => Some(4),
            "HEADING_5" => Some(5),
            "HEADING_6" => Some(6),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Bullet {
    pub list_id: String,
    pub nesting_level: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParagraphElement {
    pub start_index: u32,
    pub end_index: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_run: Option<TextRun>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextRun {
    pub content: String,
    pub text_style: TextStyle,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextStyle {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<Link>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weighted_font_family: Option<WeightedFontFamily>,
}

impl TextStyle {
    /// Whether the run uses a monospace font family
    pub fn is_monospace(&self) -> bool {
        self.weighted_font_family
            .as_ref()
            .is_some_and(|f| is_monospace_family(&f.font_family))
    }
}

const MONOSPACE_FAMILIES: &[&str] = &[
    "courier new",
    "courier",
    "consolas",
    "roboto mono",
    "source code pro",
    "inconsolata",
    "fira code",
    "jetbrains mono",
    "ibm plex mono",
    "ubuntu mono",
    "space mono",
    "monospace",
];

/// Whether a font family name is a known monospace family
pub fn is_monospace_family(family: &str) -> bool {
    let family = family.trim().to_lowercase();
    MONOSPACE_FAMILIES.contains(&family.as_str())
}

/// Link target: an external URL or an in-document heading/bookmark
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Link {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bookmark_id: Option<String>,
}

impl Link {
    /// Markdown link target: the URL, or a fragment for in-document targets
    pub fn target(&self) -> Option<String> {
        if let Some(url) = &self.url {
            Some(url.clone())
        } else if let Some(id) = &self.heading_id {
            Some(format!("#{}", id))
        } else {
            self.bookmark_id.as_ref().map(|id| format!("#{}", id))
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WeightedFontFamily {
    pub font_family: String,
    pub weight: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Table {
    pub rows: u32,
    pub columns: u32,
    pub table_rows: Vec<TableRow>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TableRow {
    pub start_index: u32,
    pub end_index: u32,
    pub table_cells: Vec<TableCell>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TableCell {
    pub start_index: u32,
    pub end_index: u32,
    pub content: Vec<StructuralElement>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct List {
    pub list_properties: ListProperties,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ListProperties {
    pub nesting_levels: Vec<NestingLevel>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NestingLevel {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub glyph_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub glyph_symbol: Option<String>,
}

const NUMBERED_GLYPHS: &[&str] = &[
    "DECIMAL",
    "ZERO_DECIMAL",
    "ALPHA",
    "UPPER_ALPHA",
    "ROMAN",
    "UPPER_ROMAN",
];

impl List {
    /// Whether items at the given nesting level are numbered
    pub fn is_numbered(&self, level: u8) -> bool {
        self.list_properties
            .nesting_levels
            .get(level as usize)
            .and_then(|l| l.glyph_type.as_deref())
            .is_some_and(|g| NUMBERED_GLYPHS.contains(&g))
    }
}
