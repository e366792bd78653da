//! Document and folder identifiers
//!
//! Both can be given as a bare id or as a full URL copied from the browser.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Not a valid {kind} id or URL: {input}")]
pub struct IdParseError {
    kind: &'static str,
    input: String,
}

/// Remote document identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(String);

/// Remote folder identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FolderId(String);

/// Whether a string is a syntactically valid bare id
pub fn is_valid_id(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Extract the path segment that follows `marker` in a URL path
fn segment_after(url: &Url, marker: &[&str]) -> Option<String> {
    let segments: Vec<&str> = url.path_segments()?.collect();
    segments
        .windows(marker.len() + 1)
        .find(|w| w[..marker.len()] == *marker)
        .map(|w| w[marker.len()].to_string())
}

fn parse_id(
    input: &str,
    kind: &'static str,
    url_markers: &[&[&str]],
) -> Result<String, IdParseError> {
    let input = input.trim();
    let err = || IdParseError {
        kind,
        input: input.to_string(),
    };

    if is_valid_id(input) {
        return Ok(input.to_string());
    }

    let url = Url::parse(input).map_err(|_| err())?;
    let from_path = url_markers
        .iter()
        .find_map(|marker| segment_after(&url, marker));
    let from_query = || {
        url.query_pairs()
            .find(|(k, _)| k == "id")
            .map(|(_, v)| v.into_owned())
    };
    from_path
        .or_else(from_query)
        .filter(|id| is_valid_id(id))
        .ok_or_else(err)
}

impl DocumentId {
    /// Parse a bare id or a `.../d/<id>/...` URL (documents and Drive files)
    pub fn parse(input: &str) -> Result<Self, IdParseError> {
        parse_id(input, "document", &[&["d"]]).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Browser URL for editing the document
    pub fn edit_url(&self) -> String {
        format!("https://docs.google.com/document/d/{}/edit", self.0)
    }
}

impl FolderId {
    /// Parse a bare id or a `.../folders/<id>` URL
    pub fn parse(input: &str) -> Result<Self, IdParseError> {
        parse_id(input, "folder", &[&["folders"]]).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for DocumentId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl FromStr for FolderId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for FolderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_document_id() {
        let id = DocumentId::parse("1AbC_d-9").unwrap();
        assert_eq!(id.as_str(), "1AbC_d-9");
        assert_eq!(id.to_string(), "1AbC_d-9");
    }

    #[test]
    fn test_document_id_from_url() {
        let id = DocumentId::parse("https://docs.google.com/document/d/1AbC_d-9/edit?tab=t.0")
            .unwrap();
        assert_eq!(id.as_str(), "1AbC_d-9");

        let id = DocumentId::parse("https://docs.google.com/document/u/1/d/XYZ/edit").unwrap();
        assert_eq!(id.as_str(), "XYZ");

        let id = DocumentId::parse("https://drive.google.com/open?id=QRS").unwrap();
        assert_eq!(id.as_str(), "QRS");
    }

    #[test]
    fn test_folder_id_from_url() {
        let id = FolderId::parse("https://drive.google.com/drive/folders/0Bxyz?usp=sharing")
            .unwrap();
        assert_eq!(id.as_str(), "0Bxyz");

        let id = FolderId::parse("https://drive.google.com/drive/u/0/folders/abc").unwrap();
        assert_eq!(id.as_str(), "abc");
    }

    #[test]
    fn test_invalid_ids() {
        assert!(DocumentId::parse("").is_err());
        assert!(DocumentId::parse("not an id").is_err());
        assert!(DocumentId::parse("https://example.com/nothing/here").is_err());
        assert!(FolderId::parse("https://docs.google.com/document/d/abc").is_err());
    }

    #[test]
    fn test_edit_url() {
        let id = DocumentId::parse("abc").unwrap();
        assert_eq!(id.edit_url(), "https://docs.google.com/document/d/abc/edit");
    }
}
