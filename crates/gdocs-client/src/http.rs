//! Blocking HTTP client for the Google Docs and Drive REST APIs

use crate::commands::PresentationCommand;
use crate::error::{RemoteError, Result};
use crate::ids::{DocumentId, FolderId};
use crate::model::RemoteDocument;
use crate::service::{CreatedDocument, DocumentEntry, DocumentService, FolderService};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;
use std::time::Duration;
use url::Url;

const DOCS_API: &str = "https://docs.googleapis.com/v1/documents";
const DRIVE_API: &str = "https://www.googleapis.com/drive/v3/files";
const DRIVE_UPLOAD_API: &str = "https://www.googleapis.com/upload/drive/v3/files";

/// MIME type of a native Google document
pub const DOCUMENT_MIME: &str = "application/vnd.google-apps.document";
/// MIME type of the `.docx` artifacts we upload
pub const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

const MULTIPART_BOUNDARY: &str = "gdocmd-part-boundary-5f0c2e1b";
const LIST_PAGE_SIZE: &str = "100";

/// Remote service client authenticated with an OAuth bearer token
pub struct GoogleClient {
    client: Client,
    token: String,
}

impl GoogleClient {
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| RemoteError::Transient(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            token: token.into(),
        })
    }

    fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request
            .bearer_auth(&self.token)
            .send()
            .map_err(|e| RemoteError::Transient(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().unwrap_or_default();
        let (reason, message) = parse_error_body(&body);
        log::debug!("HTTP {} ({:?}): {}", status.as_u16(), reason, message);
        Err(RemoteError::from_status(
            status.as_u16(),
            reason.as_deref(),
            message,
        ))
    }

    fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let text = self
            .send(request)?
            .text()
            .map_err(|e| RemoteError::Transient(e.to_string()))?;
        serde_json::from_str(&text).map_err(|e| RemoteError::Decode(e.to_string()))
    }

    /// `send_json` for a request that must not be repeated when its outcome
    /// is unknown. Only a failure to connect is still reported as transient.
    fn send_json_once<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request
            .bearer_auth(&self.token)
            .send()
            .map_err(|e| transport_error_once(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            let (reason, message) = parse_error_body(&body);
            log::debug!("HTTP {} ({:?}): {}", status.as_u16(), reason, message);
            return Err(
                RemoteError::from_status(status.as_u16(), reason.as_deref(), message)
                    .for_unsafe_request(),
            );
        }

        let text = response
            .text()
            .map_err(|e| RemoteError::Indeterminate(e.to_string()))?;
        serde_json::from_str(&text).map_err(|e| RemoteError::Decode(e.to_string()))
    }
}

/// A request that never reached the server can be repeated; anything later
/// may have been applied
fn transport_error_once(e: &reqwest::Error) -> RemoteError {
    if e.is_connect() {
        RemoteError::Transient(e.to_string())
    } else {
        RemoteError::Indeterminate(e.to_string())
    }
}

fn parse_url(base: &str, params: &[(&str, &str)]) -> Result<Url> {
    Url::parse_with_params(base, params)
        .map_err(|e| RemoteError::InvalidRequest(format!("{}: {}", base, e)))
}

fn read_artifact(artifact: &Path) -> Result<Vec<u8>> {
    fs::read(artifact).map_err(|source| RemoteError::Artifact {
        path: artifact.to_path_buf(),
        source,
    })
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ErrorBody {
    message: String,
    status: Option<String>,
    errors: Vec<ErrorItem>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ErrorItem {
    reason: Option<String>,
}

/// Extract `(reason, message)` from an API error body, falling back to the raw text
fn parse_error_body(body: &str) -> (Option<String>, String) {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) if !envelope.error.message.is_empty() => {
            let error = envelope.error;
            let reason = error
                .errors
                .into_iter()
                .find_map(|e| e.reason)
                .or(error.status);
            (reason, error.message)
        }
        _ => (None, body.trim().to_string()),
    }
}

/// Build a `multipart/related` body with JSON metadata and a docx payload
fn multipart_body(metadata: &serde_json::Value, payload: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(payload.len() + 512);
    body.extend_from_slice(format!("--{}\r\n", MULTIPART_BOUNDARY).as_bytes());
    body.extend_from_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
    body.extend_from_slice(metadata.to_string().as_bytes());
    body.extend_from_slice(format!("\r\n--{}\r\n", MULTIPART_BOUNDARY).as_bytes());
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", DOCX_MIME).as_bytes());
    body.extend_from_slice(payload);
    body.extend_from_slice(format!("\r\n--{}--\r\n", MULTIPART_BOUNDARY).as_bytes());
    body
}

/// Drive search query for the documents directly inside a folder
fn folder_query(folder: &FolderId) -> String {
    format!(
        "'{}' in parents and mimeType = '{}' and trashed = false",
        folder.as_str(),
        DOCUMENT_MIME
    )
}

fn create_metadata(title: &str, folder: Option<&FolderId>) -> serde_json::Value {
    let mut metadata = serde_json::json!({
        "name": title,
        "mimeType": DOCUMENT_MIME,
    });
    if let Some(folder) = folder {
        metadata["parents"] = serde_json::json!([folder.as_str()]);
    }
    metadata
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateResponse {
    id: String,
    #[serde(default)]
    web_view_link: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct FileList {
    files: Vec<FileEntry>,
    next_page_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileEntry {
    id: String,
    name: String,
}

impl DocumentService for GoogleClient {
    fn get_document(&self, id: &DocumentId) -> Result<RemoteDocument> {
        log::debug!("Fetching document {}", id);
        let url = parse_url(
            &format!("{}/{}", DOCS_API, id.as_str()),
            &[("includeTabsContent", "true")],
        )?;
        self.send_json(self.client.get(url))
    }

    fn create_document(
        &self,
        title: &str,
        artifact: &Path,
        folder: Option<&FolderId>,
    ) -> Result<CreatedDocument> {
        log::debug!("Creating document {:?}", title);
        let payload = read_artifact(artifact)?;
        let metadata = create_metadata(title, folder);
        let url = parse_url(
            DRIVE_UPLOAD_API,
            &[
                ("uploadType", "multipart"),
                ("supportsAllDrives", "true"),
                ("fields", "id,webViewLink"),
            ],
        )?;
        let request = self
            .client
            .post(url)
            .header(
                CONTENT_TYPE,
                format!("multipart/related; boundary={}", MULTIPART_BOUNDARY),
            )
            .body(multipart_body(&metadata, &payload));

        let created: CreateResponse = self.send_json_once(request)?;
        let id = DocumentId::parse(&created.id)
            .map_err(|e| RemoteError::Decode(e.to_string()))?;
        Ok(CreatedDocument {
            id,
            url: created.web_view_link,
        })
    }

    fn replace_content(&self, id: &DocumentId, artifact: &Path) -> Result<()> {
        log::debug!("Replacing content of document {}", id);
        let payload = read_artifact(artifact)?;
        let url = parse_url(
            &format!("{}/{}", DRIVE_UPLOAD_API, id.as_str()),
            &[("uploadType", "media"), ("supportsAllDrives", "true")],
        )?;
        let request = self
            .client
            .patch(url)
            .header(CONTENT_TYPE, DOCX_MIME)
            .body(payload);
        self.send(request)?;
        Ok(())
    }

    fn batch_update(&self, id: &DocumentId, commands: &[PresentationCommand]) -> Result<()> {
        if commands.is_empty() {
            return Ok(());
        }
        log::debug!("Sending {} command(s) to document {}", commands.len(), id);
        let body = serde_json::json!({ "requests": commands });
        let url = format!("{}/{}:batchUpdate", DOCS_API, id.as_str());
        let request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body.to_string());
        self.send(request)?;
        Ok(())
    }
}

impl FolderService for GoogleClient {
    fn list_documents(&self, folder: &FolderId) -> Result<Vec<DocumentEntry>> {
        let query = folder_query(folder);
        let mut entries = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut params = vec![
                ("q", query.as_str()),
                ("fields", "nextPageToken,files(id,name)"),
                ("orderBy", "name"),
                ("pageSize", LIST_PAGE_SIZE),
                ("supportsAllDrives", "true"),
                ("includeItemsFromAllDrives", "true"),
            ];
            if let Some(token) = &page_token {
                params.push(("pageToken", token.as_str()));
            }
            let url = parse_url(DRIVE_API, &params)?;
            let page: FileList = self.send_json(self.client.get(url))?;

            for file in page.files {
                let id = DocumentId::parse(&file.id)
                    .map_err(|e| RemoteError::Decode(e.to_string()))?;
                entries.push(DocumentEntry {
                    id,
                    name: file.name,
                });
            }

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        log::debug!("Folder {} lists {} document(s)", folder, entries.len());
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_body_with_reason() {
        let body = r#"{"error": {"code": 403, "message": "Rate Limit Exceeded",
            "errors": [{"reason": "userRateLimitExceeded"}], "status": "PERMISSION_DENIED"}}"#;
        let (reason, message) = parse_error_body(body);
        assert_eq!(reason.as_deref(), Some("userRateLimitExceeded"));
        assert_eq!(message, "Rate Limit Exceeded");
    }

    #[test]
    fn test_parse_error_body_status_fallback() {
        let body = r#"{"error": {"code": 429, "message": "Quota exceeded", "status": "RESOURCE_EXHAUSTED"}}"#;
        let (reason, _) = parse_error_body(body);
        assert_eq!(reason.as_deref(), Some("RESOURCE_EXHAUSTED"));
    }

    #[test]
    fn test_parse_error_body_not_json() {
        let (reason, message) = parse_error_body("  Bad Gateway \n");
        assert!(reason.is_none());
        assert_eq!(message, "Bad Gateway");
    }

    #[test]
    fn test_folder_query() {
        let folder = FolderId::parse("abc123").unwrap();
        assert_eq!(
            folder_query(&folder),
            "'abc123' in parents and mimeType = 'application/vnd.google-apps.document' and trashed = false"
        );
    }

    #[test]
    fn test_create_metadata() {
        let folder = FolderId::parse("f1").unwrap();
        let with_parent = create_metadata("Plan", Some(&folder));
        assert_eq!(with_parent["parents"][0], "f1");
        assert_eq!(with_parent["mimeType"], DOCUMENT_MIME);

        let without = create_metadata("Plan", None);
        assert!(without.get("parents").is_none());
    }

    #[test]
    fn test_multipart_body_layout() {
        let metadata = serde_json::json!({"name": "T"});
        let body = multipart_body(&metadata, b"DOCX");
        let text = String::from_utf8(body).unwrap();
        assert!(text.starts_with(&format!("--{}\r\n", MULTIPART_BOUNDARY)));
        assert!(text.contains(r#"{"name":"T"}"#));
        assert!(text.contains(&format!("Content-Type: {}\r\n\r\nDOCX\r\n", DOCX_MIME)));
        assert!(text.ends_with(&format!("--{}--\r\n", MULTIPART_BOUNDARY)));
    }

    #[test]
    fn test_parse_url_encodes_query() {
        let url = parse_url(DRIVE_API, &[("q", "'a' in parents")]).unwrap();
        assert!(url.as_str().starts_with(DRIVE_API));
        assert!(url.query().is_some_and(|q| q.contains("q=%27a%27+in+parents")));
    }
}
