//! Document identity marker embedded in Markdown sources
//!
//! The link between a local file and its remote document is a single HTML
//! comment line, hidden by every Markdown renderer:
//!
//! ```text
//! <!-- google-doc-id: 1AbCdEf_gh-IJ -->
//! ```
//!
//! Grammar: `<!--`, optional whitespace, the key `google-doc-id`, optional
//! whitespace, `:`, optional whitespace, an id of `[A-Za-z0-9_-]+`, optional
//! whitespace, `-->`, all on one line. Only lines before the first ATX heading
//! and outside fenced code blocks are considered.

use crate::error::MarkerError;
use crate::split::FenceTracker;
use gdocs_client::DocumentId;
use gdocs_client::ids::is_valid_id;

pub const MARKER_KEY: &str = "google-doc-id";

/// Classification of a single source line
#[derive(Debug, Clone, PartialEq, Eq)]
enum MarkerLine {
    Marker(DocumentId),
    /// Looks like a marker but the value cannot be parsed
    Garbled,
    NotMarker,
}

fn classify(line: &str) -> MarkerLine {
    let trimmed = line.trim();
    let Some(rest) = trimmed.strip_prefix("<!--") else {
        return MarkerLine::NotMarker;
    };
    let Some(rest) = rest.trim_start().strip_prefix(MARKER_KEY) else {
        return MarkerLine::NotMarker;
    };

    let value = rest
        .trim_start()
        .strip_prefix(':')
        .and_then(|r| r.trim_end().strip_suffix("-->"))
        .map(str::trim);
    match value {
        Some(v) if is_valid_id(v) => match DocumentId::parse(v) {
            Ok(id) => MarkerLine::Marker(id),
            Err(_) => MarkerLine::Garbled,
        },
        _ => MarkerLine::Garbled,
    }
}

/// Whether a line is an ATX heading (`#` to `######` followed by space or end)
pub(crate) fn is_atx_heading(line: &str) -> bool {
    let indent = line.len() - line.trim_start_matches(' ').len();
    if indent > 3 {
        return false;
    }
    let rest = &line[indent..];
    let hashes = rest.len() - rest.trim_start_matches('#').len();
    if !(1..=6).contains(&hashes) {
        return false;
    }
    let after = &rest[hashes..];
    after.is_empty() || after.starts_with([' ', '\t', '\r', '\n'])
}

/// Lines up to (not including) the first heading, skipping fenced code
fn preamble_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    let mut fence = FenceTracker::default();
    text.split_inclusive('\n')
        .enumerate()
        .map(move |(index, line)| (index, line, fence.feed(line)))
        .take_while(|(_, line, fenced)| *fenced || !is_atx_heading(line))
        .filter(|(_, _, fenced)| !fenced)
        .map(|(index, line, _)| (index, line))
}

/// Read the document id recorded in `text`.
///
/// Returns `Ok(None)` when there is no marker. When several valid markers
/// are present the topmost one wins, since [`write`] always places the
/// current marker on the first line. A marker-looking line with a value that
/// cannot be parsed is an error rather than being silently ignored.
pub fn read(text: &str) -> Result<Option<DocumentId>, MarkerError> {
    let mut found: Option<DocumentId> = None;
    for (index, line) in preamble_lines(text) {
        match classify(line) {
            MarkerLine::Marker(id) => match &found {
                None => found = Some(id),
                Some(first) if *first != id => {
                    log::warn!(
                        "Ignoring duplicate marker for {} on line {}; using {}",
                        id,
                        index + 1,
                        first
                    );
                }
                Some(_) => {}
            },
            MarkerLine::Garbled => {
                return Err(MarkerError::Ambiguous {
                    line: index + 1,
                    text: line.trim_end().to_string(),
                });
            }
            MarkerLine::NotMarker => {}
        }
    }
    Ok(found)
}

/// Remove every marker line from the preamble, leaving the rest of the text
/// untouched.
///
/// The blank line after a marker is only dropped for a marker on the first
/// line, where [`write`] puts it together with that blank line.
pub fn strip(text: &str) -> String {
    let markers: Vec<usize> = preamble_lines(text)
        .filter(|(_, line)| classify(line) != MarkerLine::NotMarker)
        .map(|(index, _)| index)
        .collect();
    if markers.is_empty() {
        return text.to_string();
    }

    let leading_marker = markers.first() == Some(&0);
    let mut out = String::with_capacity(text.len());
    for (index, line) in text.split_inclusive('\n').enumerate() {
        if markers.contains(&index) {
            continue;
        }
        if index == 1 && leading_marker && line.trim().is_empty() {
            continue;
        }
        out.push_str(line);
    }
    out
}

/// The marker line for `id`, followed by a blank line
pub fn marker_line(id: &DocumentId) -> String {
    format!("<!-- {}: {} -->\n\n", MARKER_KEY, id)
}

/// Insert or replace the marker so it is the first line of the text.
///
/// Idempotent: writing the same id twice yields the same text.
pub fn write(text: &str, id: &DocumentId) -> String {
    let body = strip(text);
    let mut out = marker_line(id);
    out.push_str(&body);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn id(s: &str) -> DocumentId {
        DocumentId::parse(s).unwrap()
    }

    #[test]
    fn test_read_marker() {
        let text = "<!-- google-doc-id: 1AbC_d-9 -->\n\n# Title\n";
        assert_eq!(read(text).unwrap(), Some(id("1AbC_d-9")));
    }

    #[test]
    fn test_read_tolerates_whitespace_variants() {
        assert_eq!(
            read("<!--google-doc-id:abc-->\n").unwrap(),
            Some(id("abc"))
        );
        assert_eq!(
            read("  <!--   google-doc-id  :   abc   -->  \r\n").unwrap(),
            Some(id("abc"))
        );
    }

    #[test]
    fn test_read_without_marker() {
        assert_eq!(read("# Title\n\nBody\n").unwrap(), None);
        assert_eq!(read("").unwrap(), None);
        assert_eq!(read("<!-- a regular comment -->\n").unwrap(), None);
    }

    #[test]
    fn test_marker_after_first_heading_is_ignored() {
        let text = "# Title\n\n<!-- google-doc-id: abc -->\n";
        assert_eq!(read(text).unwrap(), None);
    }

    #[test]
    fn test_duplicate_markers_topmost_wins() {
        let text = "<!-- google-doc-id: newer -->\n\n<!-- google-doc-id: older -->\n# T\n";
        assert_eq!(read(text).unwrap(), Some(id("newer")));
    }

    #[test]
    fn test_garbled_marker_is_ambiguous() {
        let text = "intro\n<!-- google-doc-id: not valid! -->\n";
        match read(text) {
            Err(MarkerError::Ambiguous { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected ambiguous marker, got {:?}", other),
        }
        assert!(read("<!-- google-doc-id: abc\n").is_err());
    }

    #[test]
    fn test_write_inserts_first_line() {
        let text = "# Title\n\nBody\n";
        let written = write(text, &id("abc"));
        assert_eq!(written, "<!-- google-doc-id: abc -->\n\n# Title\n\nBody\n");
    }

    #[test]
    fn test_write_replaces_existing_marker() {
        let text = "<!-- google-doc-id: old -->\n\n# Title\n";
        let written = write(text, &id("new"));
        assert_eq!(written, "<!-- google-doc-id: new -->\n\n# Title\n");
    }

    #[test]
    fn test_write_moves_marker_to_top() {
        let text = "Intro paragraph\n<!-- google-doc-id: old -->\n\nSecond paragraph\n# H\n";
        let written = write(text, &id("new"));
        assert_eq!(
            written,
            "<!-- google-doc-id: new -->\n\nIntro paragraph\n\nSecond paragraph\n# H\n"
        );
    }

    #[test]
    fn test_write_keeps_blank_lines_around_inner_marker() {
        let text = "One\n\n<!-- google-doc-id: old -->\n\nTwo\n";
        let written = write(text, &id("new"));
        assert_eq!(written, "<!-- google-doc-id: new -->\n\nOne\n\n\nTwo\n");
        assert_eq!(write(&written, &id("new")), written);
    }

    #[test]
    fn test_marker_inside_code_fence_is_ignored() {
        let text = "```html\n<!-- google-doc-id: example -->\n```\n\n# Title\n";
        assert_eq!(read(text).unwrap(), None);
        assert_eq!(strip(text), text);

        let garbled = "~~~\n<!-- google-doc-id: <your id> -->\n~~~\n";
        assert_eq!(read(garbled).unwrap(), None);
    }

    #[test]
    fn test_heading_inside_fence_does_not_end_preamble() {
        let text = "```\n# comment\n```\n<!-- google-doc-id: abc -->\n# Title\n";
        assert_eq!(read(text).unwrap(), Some(id("abc")));
        let written = write(text, &id("xyz"));
        assert_eq!(
            written,
            "<!-- google-doc-id: xyz -->\n\n```\n# comment\n```\n# Title\n"
        );
    }

    #[test]
    fn test_write_leaves_markers_after_heading() {
        let text = "# H\n<!-- google-doc-id: quoted -->\n";
        let written = write(text, &id("abc"));
        assert!(written.ends_with("# H\n<!-- google-doc-id: quoted -->\n"));
    }

    #[test]
    fn test_strip() {
        let text = "<!-- google-doc-id: abc -->\n\n# Title\n";
        assert_eq!(strip(text), "# Title\n");
        assert_eq!(strip("# Title\n"), "# Title\n");
    }

    #[test]
    fn test_is_atx_heading() {
        assert!(is_atx_heading("# Title"));
        assert!(is_atx_heading("###### Six\n"));
        assert!(is_atx_heading("#\n"));
        assert!(is_atx_heading("   ## indented"));
        assert!(!is_atx_heading("####### seven"));
        assert!(!is_atx_heading("#hashtag"));
        assert!(!is_atx_heading("    # code"));
    }

    fn id_strategy() -> impl Strategy<Value = DocumentId> {
        "[A-Za-z0-9_-]{1,44}".prop_map(|s| DocumentId::parse(&s).unwrap())
    }

    fn text_strategy() -> impl Strategy<Value = String> {
        prop::collection::vec("[^\\n]{0,30}", 0..8).prop_map(|lines| lines.join("\n"))
    }

    proptest! {
        #[test]
        fn prop_read_after_write(text in text_strategy(), doc_id in id_strategy()) {
            prop_assume!(!text.contains("<!--"));
            let written = write(&text, &doc_id);
            prop_assert_eq!(read(&written).unwrap(), Some(doc_id));
        }

        #[test]
        fn prop_write_is_idempotent(text in text_strategy(), doc_id in id_strategy()) {
            let once = write(&text, &doc_id);
            let twice = write(&once, &doc_id);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_no_marker_reads_none(text in "[^<]{0,200}") {
            prop_assert_eq!(read(&text).unwrap(), None);
        }
    }
}
