//! Block sequence to Markdown writer
//!
//! Converts a flat block sequence into a Markdown string suitable for both
//! human editing and conversion by pandoc.

use crate::blocks::{Block, BlockSequence, CodeBlock, Heading, ListItem, Span, Table, merge_adjacent};

/// How underlined spans are rendered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnderlineStyle {
    /// `<u>text</u>`
    #[default]
    Html,
    /// Rendered as bold+italic, since Markdown has no underline
    Emphasis,
}

/// Options for the Markdown writer
#[derive(Debug, Clone)]
pub struct WriterOptions {
    /// Spaces of indentation per list depth level
    pub indent_width: usize,
    pub underline: UnderlineStyle,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            indent_width: 2,
            underline: UnderlineStyle::Html,
        }
    }
}

/// Convert a block sequence to Markdown
pub fn blocks_to_markdown(doc: &BlockSequence, options: &WriterOptions) -> String {
    let mut writer = Writer::new(options);
    writer.write_blocks(&doc.blocks)
}

/// How a newline inside span text is rendered in a given context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineBreak {
    /// Markdown hard break (`  \n`)
    Hard,
    /// Collapsed to a single space (headings, list items, table cells)
    Space,
}

/// Markdown writer state
struct Writer<'a> {
    options: &'a WriterOptions,
    output: String,
    /// Whether we're at the start of a line
    at_line_start: bool,
    /// Running number per list depth for numbered items
    counters: Vec<usize>,
}

impl<'a> Writer<'a> {
    fn new(options: &'a WriterOptions) -> Self {
        Self {
            options,
            output: String::new(),
            at_line_start: true,
            counters: Vec::new(),
        }
    }

    fn write_blocks(&mut self, blocks: &[Block]) -> String {
        let mut prev_was_list = false;
        for block in blocks {
            if matches!(block, Block::Table(t) if t.row_count() == 0) {
                continue;
            }
            let is_list = block.is_list_item();
            if is_list && prev_was_list {
                self.ensure_newline();
            } else {
                self.ensure_blank_line();
            }
            if !is_list {
                self.counters.clear();
            }
            self.write_block(block);
            prev_was_list = is_list;
        }

        self.output.clone()
    }

    fn write_block(&mut self, block: &Block) {
        match block {
            Block::Heading(h) => self.write_heading(h),
            Block::Paragraph(p) => {
                let text = self.render_inline(&p.spans, LineBreak::Hard);
                let lines: Vec<String> = text.split('\n').map(escape_line_start).collect();
                self.write_line(&lines.join("\n"));
            }
            Block::BulletedItem(li) => self.write_list_item(li, false),
            Block::NumberedItem(li) => self.write_list_item(li, true),
            Block::Table(t) => self.write_table(t),
            Block::CodeBlock(c) => self.write_code(c),
            Block::SectionBreak => self.write_line("---"),
        }
    }

    fn write_heading(&mut self, h: &Heading) {
        let text = self.render_inline(&h.spans, LineBreak::Space);
        let marker = "#".repeat(h.level.clamp(1, 6) as usize);
        self.write_line(&format!("{} {}", marker, text));
    }

    fn write_list_item(&mut self, li: &ListItem, numbered: bool) {
        let depth = li.depth as usize;
        let marker = if numbered {
            self.counters.truncate(depth + 1);
            self.counters.resize(depth + 1, 0);
            self.counters[depth] += 1;
            format!("{}. ", self.counters[depth])
        } else {
            self.counters.truncate(depth);
            "- ".to_string()
        };
        let indent = " ".repeat(depth * self.options.indent_width);
        let text = escape_line_start(&self.render_inline(&li.spans, LineBreak::Space));
        self.write_line(&format!("{}{}{}", indent, marker, text));
    }

    fn write_code(&mut self, c: &CodeBlock) {
        self.ensure_newline();

        let fence = "`".repeat(calculate_fence_length(&c.code));
        self.output.push_str(&fence);
        if let Some(lang) = &c.lang {
            self.output.push_str(lang);
        }
        self.output.push('\n');
        self.output.push_str(&c.code);
        if !c.code.is_empty() && !c.code.ends_with('\n') {
            self.output.push('\n');
        }
        self.output.push_str(&fence);
        self.output.push('\n');
        self.at_line_start = true;
    }

    fn write_table(&mut self, t: &Table) {
        self.ensure_newline();

        let columns = t.column_count();
        for (i, row) in t.rows().iter().enumerate() {
            let cells: Vec<String> = row
                .cells
                .iter()
                .map(|cell| escape_table_cell(&self.render_cell(&cell.blocks)))
                .collect();
            self.output.push_str("| ");
            self.output.push_str(&cells.join(" | "));
            self.output.push_str(" |\n");

            if i == 0 {
                self.output.push('|');
                for _ in 0..columns {
                    self.output.push_str(" --- |");
                }
                self.output.push('\n');
            }
        }
        self.at_line_start = true;
    }

    /// Render the blocks of a table cell on a single line
    fn render_cell(&self, blocks: &[Block]) -> String {
        let parts: Vec<String> = blocks
            .iter()
            .map(|block| match block {
                Block::CodeBlock(c) => inline_code(c.code.trim_end()),
                Block::Table(_) => block.plain_text(),
                Block::SectionBreak => String::new(),
                _ => self.render_inline(block.spans(), LineBreak::Space),
            })
            .filter(|s| !s.trim().is_empty())
            .collect();
        parts.join(" ").replace('\n', " ").trim().to_string()
    }

    /// Render a run of spans, merging adjacent spans with identical styles
    fn render_inline(&self, spans: &[Span], line_break: LineBreak) -> String {
        let mut out = String::new();
        for span in merge_adjacent(spans) {
            let piece = render_span(&span, self.options.underline);
            // `a``b` would parse as a single code span
            if out.ends_with('`') && piece.starts_with('`') {
                out.push(' ');
            }
            out.push_str(&piece);
        }
        let out = out.trim_end_matches('\n');
        match line_break {
            LineBreak::Hard => out.replace('\n', "  \n"),
            LineBreak::Space => out.replace('\n', " "),
        }
    }

    fn write_line(&mut self, line: &str) {
        self.ensure_newline();
        self.output.push_str(line);
        self.output.push('\n');
        self.at_line_start = true;
    }

    // Helper methods

    fn ensure_newline(&mut self) {
        if !self.at_line_start && !self.output.is_empty() {
            self.output.push('\n');
            self.at_line_start = true;
        }
    }

    fn ensure_blank_line(&mut self) {
        self.ensure_newline();
        if !self.output.ends_with("\n\n") && !self.output.is_empty() {
            self.output.push('\n');
        }
    }
}

/// Render one span with its markup.
///
/// Markers nest in a fixed order, innermost first: code, bold/italic,
/// underline, strikethrough, link. Surrounding whitespace is kept outside the
/// markers so emphasis delimiters stay flanking.
fn render_span(span: &Span, underline: UnderlineStyle) -> String {
    let style = &span.style;
    let text = span.text.as_str();
    if text.trim().is_empty() {
        return text.to_string();
    }
    if style.is_plain() {
        return escape_text(text);
    }

    let core = text.trim();
    let lead = &text[..text.len() - text.trim_start().len()];
    let trail = &text[text.trim_end().len()..];

    let mut inner = if style.code {
        inline_code(core)
    } else {
        escape_text(core)
    };

    let emphasis_underline = style.underline && underline == UnderlineStyle::Emphasis;
    let bold = style.bold || emphasis_underline;
    let italic = style.italic || emphasis_underline;
    inner = match (bold, italic) {
        (true, true) => format!("***{}***", inner),
        (true, false) => format!("**{}**", inner),
        (false, true) => format!("*{}*", inner),
        (false, false) => inner,
    };

    if style.underline && underline == UnderlineStyle::Html {
        inner = format!("<u>{}</u>", inner);
    }
    if style.strikethrough {
        inner = format!("~~{}~~", inner);
    }
    if let Some(url) = &style.link {
        inner = format!("[{}]({})", inner, link_destination(url));
    }

    format!("{}{}{}", lead, inner, trail)
}

/// Backslash-escape characters that would start inline markup
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '*' | '_' | '`' | '[' | ']' | '<') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Escape a line start that would otherwise open a heading, quote, list,
/// fence or setext underline
fn escape_line_start(line: &str) -> String {
    let indent = line.len() - line.trim_start_matches(' ').len();
    let (lead, rest) = line.split_at(indent);
    if rest.starts_with(['#', '>', '-', '+', '=', '~']) {
        return format!("{}\\{}", lead, rest);
    }
    let digits = rest.len() - rest.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits > 0 && rest[digits..].starts_with(['.', ')']) {
        return format!("{}{}\\{}", lead, &rest[..digits], &rest[digits..]);
    }
    line.to_string()
}

fn inline_code(value: &str) -> String {
    if value.contains('`') {
        format!("`` {} ``", value)
    } else {
        format!("`{}`", value)
    }
}

/// Wrap a URL in angle brackets when it would otherwise end the link early
fn link_destination(url: &str) -> String {
    if url.contains(' ') || url.contains(')') {
        format!("<{}>", url)
    } else {
        url.to_string()
    }
}

/// Escape a rendered cell so it cannot break the pipe-delimited row
pub fn escape_table_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

/// Calculate the minimum fence length needed for a code block.
///
/// The fence must be longer than any sequence of consecutive backticks in the content.
/// Returns at least 3 (the minimum for a valid fenced code block).
fn calculate_fence_length(content: &str) -> usize {
    let mut max_backticks = 0;
    let mut current_run = 0;

    for c in content.chars() {
        if c == '`' {
            current_run += 1;
            max_backticks = max_backticks.max(current_run);
        } else {
            current_run = 0;
        }
    }

    3.max(max_backticks + 1)
}
