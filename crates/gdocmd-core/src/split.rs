//! Section splitter
//!
//! Partitions emitted Markdown into named sub-documents, either at heading
//! boundaries or one per document tab.

use crate::error::SplitError;
use crate::marker::is_atx_heading;
use crate::slug::{SlugAllocator, slugify};

/// Slug of the content that precedes the first qualifying heading
pub const LEADING_SECTION_SLUG: &str = "introduction";

/// How to split a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitMode {
    /// Start a new section at every heading of this level or above (1 or 2)
    Heading(u8),
    /// One section per document tab
    Tabs,
}

/// One named sub-document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Heading or tab title; `None` for the leading section
    pub title: Option<String>,
    /// Unique filesystem-safe name
    pub slug: String,
    pub content: String,
}

/// Split Markdown at headings of level `1..=max_level`.
///
/// Sections are contiguous slices of the input, so concatenating their
/// contents in order gives back the input exactly. Content before the first
/// qualifying heading becomes an untitled leading section when it has any
/// non-whitespace text; otherwise it is folded into the first section.
/// Headings inside fenced code blocks are ignored.
pub fn split_by_heading(markdown: &str, max_level: u8) -> Result<Vec<Section>, SplitError> {
    if markdown.trim().is_empty() {
        return Err(SplitError::EmptyDocument);
    }
    let max_level = max_level.clamp(1, 6);

    // (byte offset, title) of each qualifying heading
    let mut starts: Vec<(usize, String)> = Vec::new();
    let mut fence = FenceTracker::default();
    let mut offset = 0;
    for line in markdown.split_inclusive('\n') {
        if !fence.feed(line)
            && let Some((level, title)) = parse_heading(line)
            && level <= max_level
        {
            starts.push((offset, title));
        }
        offset += line.len();
    }

    let mut slugs = SlugAllocator::new();
    let mut sections = Vec::with_capacity(starts.len() + 1);

    let first_start = starts.first().map(|(o, _)| *o).unwrap_or(markdown.len());
    let leading = &markdown[..first_start];
    let mut carry = "";
    if !leading.trim().is_empty() {
        sections.push(Section {
            title: None,
            slug: slugs.allocate_slug(LEADING_SECTION_SLUG.to_string()),
            content: leading.to_string(),
        });
    } else {
        carry = leading;
    }

    for (i, (start, title)) in starts.iter().enumerate() {
        let end = starts.get(i + 1).map(|(o, _)| *o).unwrap_or(markdown.len());
        let body = &markdown[*start..end];
        let content = if i == 0 {
            format!("{}{}", carry, body)
        } else {
            body.to_string()
        };
        sections.push(Section {
            title: Some(title.clone()),
            slug: slugs.allocate_slug(slugify(title)),
            content,
        });
    }

    Ok(sections)
}

/// Build one section per tab, skipping tabs without content
pub fn split_by_tabs<'a, I>(tabs: I) -> Result<Vec<Section>, SplitError>
where
    I: IntoIterator<Item = (&'a str, String)>,
{
    let mut slugs = SlugAllocator::new();
    let sections: Vec<Section> = tabs
        .into_iter()
        .filter(|(_, markdown)| !markdown.trim().is_empty())
        .map(|(title, markdown)| Section {
            title: Some(title.to_string()),
            slug: slugs.allocate(title),
            content: markdown,
        })
        .collect();

    if sections.is_empty() {
        Err(SplitError::EmptyDocument)
    } else {
        Ok(sections)
    }
}

/// Parse an ATX heading line into `(level, plain title)`
fn parse_heading(line: &str) -> Option<(u8, String)> {
    if !is_atx_heading(line) {
        return None;
    }
    let rest = line.trim();
    let level = rest.len() - rest.trim_start_matches('#').len();
    let text = rest[level..].trim();
    // Optional closing sequence: `## Title ##`
    let text = match text.trim_end_matches('#') {
        stripped if stripped.is_empty() || stripped.ends_with(' ') => stripped.trim_end(),
        _ => text,
    };
    Some((level as u8, plain_heading_text(text)))
}

/// Strip inline Markdown so a heading can be used as a name.
///
/// Backslash escapes yield their literal character; link destinations are
/// dropped.
fn plain_heading_text(text: &str) -> String {
    let text = text.replace("<u>", "").replace("</u>", "");
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.peek() {
                Some(&next) if next.is_ascii_punctuation() => {
                    out.push(next);
                    chars.next();
                }
                _ => out.push(c),
            },
            ']' if chars.peek() == Some(&'(') => skip_link_destination(&mut chars),
            '*' | '`' | '~' | '[' | ']' => {}
            _ => out.push(c),
        }
    }
    out.trim().to_string()
}

/// Consume `(url)` or `(<url with spaces>)` after a link text
fn skip_link_destination(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) {
    chars.next();
    if chars.peek() == Some(&'<') {
        for c in chars.by_ref() {
            if c == '>' {
                break;
            }
        }
    }
    for c in chars.by_ref() {
        if c == ')' {
            break;
        }
    }
}

/// Tracks whether lines are inside a fenced code block
#[derive(Debug, Default)]
pub(crate) struct FenceTracker {
    open: Option<(char, usize)>,
}

impl FenceTracker {
    /// Feed one line; returns true if the line belongs to a code block
    /// (fence lines included)
    pub(crate) fn feed(&mut self, line: &str) -> bool {
        let trimmed = line.trim_start_matches(' ');
        let fence_char = trimmed.chars().next().filter(|c| *c == '`' || *c == '~');
        let run = fence_char
            .map(|c| trimmed.len() - trimmed.trim_start_matches(c).len())
            .unwrap_or(0);

        match (self.open, fence_char) {
            (Some((open_char, open_len)), Some(c))
                if c == open_char && run >= open_len && trimmed[run..].trim().is_empty() =>
            {
                self.open = None;
                true
            }
            (Some(_), _) => true,
            (None, Some(c)) if run >= 3 => {
                self.open = Some((c, run));
                true
            }
            (None, _) => false,
        }
    }
}
