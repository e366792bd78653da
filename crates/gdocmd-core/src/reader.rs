//! Structure reader
//!
//! Pulls a remote document and flattens its structural tree into block
//! sequences, one per tab. Remote errors are propagated untouched; retrying
//! is the caller's business.

use gdocmd_blocks::{Block, BlockSequence, Span, SpanStyle, TableCell, TableRow};
use gdocs_client::model::{Body, ElementKind, List, Paragraph, StructuralElement, Table, TextRun};
use gdocs_client::{DocumentId, DocumentService, RemoteDocument, Result};
use std::collections::HashMap;

/// Title used for the body of a document without tabs
pub const MAIN_TAB_TITLE: &str = "Main Document";

/// Borrowed view of one tab's content
#[derive(Debug, Clone, Copy)]
pub struct TabContent<'a> {
    /// `None` for the legacy single body
    pub tab_id: Option<&'a str>,
    pub title: &'a str,
    /// Nesting depth, 0 for top-level tabs
    pub depth: u32,
    pub body: &'a Body,
    pub lists: &'a HashMap<String, List>,
}

/// All tabs of a document, depth-first in display order.
///
/// Documents fetched without tab content expose their single body as one
/// untitled-tab entry.
pub fn document_tabs(doc: &RemoteDocument) -> Vec<TabContent<'_>> {
    let mut tabs = Vec::new();
    if doc.tabs.is_empty() {
        if let Some(body) = &doc.body {
            tabs.push(TabContent {
                tab_id: None,
                title: MAIN_TAB_TITLE,
                depth: 0,
                body,
                lists: &doc.lists,
            });
        }
        return tabs;
    }
    collect_tabs(&doc.tabs, 0, &mut tabs);
    tabs
}

fn collect_tabs<'a>(tabs: &'a [gdocs_client::model::Tab], depth: u32, out: &mut Vec<TabContent<'a>>) {
    for tab in tabs {
        if let Some(content) = &tab.document_tab {
            out.push(TabContent {
                tab_id: Some(tab.tab_properties.tab_id.as_str()),
                title: tab.tab_properties.title.as_str(),
                depth,
                body: &content.body,
                lists: &content.lists,
            });
        }
        collect_tabs(&tab.child_tabs, depth + 1, out);
    }
}

/// A document flattened into blocks
#[derive(Debug, Clone, PartialEq)]
pub struct ReadDocument {
    pub id: DocumentId,
    pub title: String,
    pub tabs: Vec<ReadTab>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReadTab {
    pub tab_id: Option<String>,
    pub title: String,
    pub depth: u32,
    pub blocks: BlockSequence,
}

impl ReadDocument {
    /// Flatten an already-fetched document
    pub fn from_remote(id: DocumentId, doc: &RemoteDocument) -> Self {
        let tabs = document_tabs(doc)
            .into_iter()
            .map(|tab| ReadTab {
                tab_id: tab.tab_id.map(str::to_string),
                title: tab.title.to_string(),
                depth: tab.depth,
                blocks: flatten_body(tab.body, tab.lists),
            })
            .collect();
        Self {
            id,
            title: doc.title.clone(),
            tabs,
        }
    }

    /// Find a tab by id or (case-insensitive) title
    pub fn tab(&self, key: &str) -> Option<&ReadTab> {
        self.tabs
            .iter()
            .find(|t| t.tab_id.as_deref() == Some(key))
            .or_else(|| self.tabs.iter().find(|t| t.title.eq_ignore_ascii_case(key)))
    }

    /// All content as one sequence.
    ///
    /// With more than one tab, each tab's blocks are preceded by a level-1
    /// heading carrying the tab title.
    pub fn blocks(&self) -> BlockSequence {
        match self.tabs.as_slice() {
            [] => BlockSequence::default(),
            [only] => only.blocks.clone(),
            tabs => {
                let mut blocks = Vec::new();
                for tab in tabs {
                    blocks.push(Block::heading(1, vec![Span::plain(tab.title.clone())]));
                    blocks.extend(tab.blocks.blocks.iter().cloned());
                }
                BlockSequence::new(blocks)
            }
        }
    }
}

/// Reads remote documents into block sequences
pub struct StructureReader<'a> {
    service: &'a dyn DocumentService,
}

impl<'a> StructureReader<'a> {
    pub fn new(service: &'a dyn DocumentService) -> Self {
        Self { service }
    }

    /// Fetch and flatten a document, all tabs included
    pub fn read(&self, id: &DocumentId) -> Result<ReadDocument> {
        let doc = self.service.get_document(id)?;
        log::debug!("Read document {:?} with {} tab(s)", doc.title, doc.tabs.len());
        Ok(ReadDocument::from_remote(id.clone(), &doc))
    }
}

/// Flatten one body into a block sequence
pub fn flatten_body(body: &Body, lists: &HashMap<String, List>) -> BlockSequence {
    let mut flattener = Flattener::new(lists);
    flattener.flatten(&body.content);
    flattener.finish()
}

/// Flattening state
struct Flattener<'a> {
    lists: &'a HashMap<String, List>,
    blocks: Vec<Block>,
    /// Lines of consecutive monospace paragraphs, emitted as one code block
    code_lines: Vec<String>,
}

impl<'a> Flattener<'a> {
    fn new(lists: &'a HashMap<String, List>) -> Self {
        Self {
            lists,
            blocks: Vec::new(),
            code_lines: Vec::new(),
        }
    }

    fn finish(mut self) -> BlockSequence {
        self.flush_code();
        BlockSequence::new(self.blocks)
    }

    fn flatten(&mut self, content: &[StructuralElement]) {
        for element in content {
            match element.kind() {
                ElementKind::Paragraph(p) => self.paragraph(p),
                ElementKind::Table(t) => {
                    self.flush_code();
                    self.table(t);
                }
                ElementKind::SectionBreak => {
                    self.flush_code();
                    // Every body opens with a section break
                    if !self.blocks.is_empty() {
                        self.blocks.push(Block::section_break());
                    }
                }
                ElementKind::TableOfContents | ElementKind::Other => {}
            }
        }
    }

    fn paragraph(&mut self, p: &Paragraph) {
        if is_code_paragraph(p) {
            let text = p.text().replace('\u{000B}', "\n");
            self.code_lines
                .push(text.trim_end_matches(['\n', '\r']).to_string());
            return;
        }
        self.flush_code();

        let spans = paragraph_spans(p);
        if spans.iter().all(|s| s.text.trim().is_empty()) {
            return;
        }

        let block = if let Some(level) = p.paragraph_style.heading_level() {
            Block::heading(level, spans)
        } else if let Some(bullet) = &p.bullet {
            let numbered = self
                .lists
                .get(&bullet.list_id)
                .is_some_and(|list| list.is_numbered(bullet.nesting_level));
            if numbered {
                Block::numbered_item(bullet.nesting_level, spans)
            } else {
                Block::bulleted_item(bullet.nesting_level, spans)
            }
        } else {
            Block::paragraph(spans)
        };
        self.blocks.push(block);
    }

    fn table(&mut self, t: &Table) {
        let rows: Vec<TableRow> = t
            .table_rows
            .iter()
            .map(|row| TableRow {
                cells: row
                    .table_cells
                    .iter()
                    .map(|cell| {
                        let mut inner = Flattener::new(self.lists);
                        inner.flatten(&cell.content);
                        TableCell::new(inner.finish().blocks)
                    })
                    .collect(),
            })
            .collect();
        self.blocks
            .push(Block::Table(gdocmd_blocks::Table::new(rows)));
    }

    fn flush_code(&mut self) {
        if self.code_lines.is_empty() {
            return;
        }
        let mut code = self.code_lines.join("\n");
        code.push('\n');
        self.code_lines.clear();
        self.blocks.push(Block::code_block(None, code));
    }
}

/// A plain paragraph whose every non-blank run is monospace
fn is_code_paragraph(p: &Paragraph) -> bool {
    if p.bullet.is_some() || p.paragraph_style.heading_level().is_some() {
        return false;
    }
    let mut runs = p
        .elements
        .iter()
        .filter_map(|e| e.text_run.as_ref())
        .filter(|r| !r.content.trim().is_empty())
        .peekable();
    runs.peek().is_some() && runs.all(|r| r.text_style.is_monospace())
}

fn span_from_run(run: &TextRun) -> Span {
    let ts = &run.text_style;
    let link = ts.link.as_ref().and_then(|l| l.target());
    let style = SpanStyle {
        bold: ts.bold,
        italic: ts.italic,
        // Links carry an underline by default
        underline: ts.underline && link.is_none(),
        strikethrough: ts.strikethrough,
        code: ts.is_monospace(),
        link,
    };
    Span::styled(run.content.replace('\u{000B}', "\n"), style)
}

/// Spans of a paragraph without its terminating newline
fn paragraph_spans(p: &Paragraph) -> Vec<Span> {
    let mut spans: Vec<Span> = p
        .elements
        .iter()
        .filter_map(|e| e.text_run.as_ref())
        .map(span_from_run)
        .collect();

    while let Some(last) = spans.last_mut() {
        let trimmed_len = last.text.trim_end_matches(['\n', '\r']).len();
        last.text.truncate(trimmed_len);
        if last.text.is_empty() {
            spans.pop();
        } else {
            break;
        }
    }
    spans
}
