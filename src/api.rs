// Archive client module: a small blocking HTTP client for the Internet
// Archive. It covers exactly two operations, opening an item through the
// metadata API and uploading files through the S3-compatible endpoint.
// The rest of the crate only talks to the `ArchiveService` trait.

use crate::config::{ClientConfig, Credentials};
use crate::files::FileMapping;
use crate::metadata::MetadataRecord;
use anyhow::{Context, Result};
use reqwest::blocking::{Body, Client, Response};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Failures reported by an archive service.
#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("No Internet Archive credentials are configured")]
    MissingCredentials,

    #[error("Authentication failed: {status} - {body}")]
    Authentication { status: StatusCode, body: String },

    #[error("{action} failed: {status} - {body}")]
    Status {
        action: String,
        status: StatusCode,
        body: String,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid URL {0}")]
    InvalidUrl(String),

    #[error("Invalid metadata header for '{0}'")]
    InvalidHeader(String),
}

impl ArchiveError {
    /// Whether the user can fix this by setting up credentials.
    pub fn is_authentication(&self) -> bool {
        matches!(
            self,
            ArchiveError::MissingCredentials | ArchiveError::Authentication { .. }
        )
    }
}

/// A file already stored in an item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteFileInfo {
    pub size: u64,
    /// Lowercase hex MD5, when the archive has computed one.
    pub md5: Option<String>,
}

/// State of an item as returned by "open item".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Item {
    pub identifier: String,
    pub exists: bool,
    /// Remote file name → stored file, for files already in the item.
    pub files: HashMap<String, RemoteFileInfo>,
}

/// What an upload call did, per remote path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadReport {
    pub uploaded: Vec<String>,
    pub skipped: Vec<String>,
}

/// Narrow boundary to the archival storage service.
pub trait ArchiveService {
    fn get_item(&self, identifier: &str) -> Result<Item, ArchiveError>;

    fn upload(
        &self,
        item: &Item,
        files: &FileMapping,
        metadata: &MetadataRecord,
    ) -> Result<UploadReport, ArchiveError>;
}

#[derive(Deserialize, Debug, Default)]
struct MetadataResponse {
    #[serde(default)]
    metadata: Option<serde_json::Value>,
    #[serde(default)]
    files: Vec<RemoteFile>,
}

/// The metadata API reports sizes as strings.
#[derive(Deserialize, Debug)]
struct RemoteFile {
    name: String,
    #[serde(default)]
    size: Option<String>,
    #[serde(default)]
    md5: Option<String>,
}

/// Blocking client for archive.org.
#[derive(Clone)]
pub struct ArchiveClient {
    client: Client,
    config: ClientConfig,
}

impl ArchiveClient {
    /// Create a client configured from the environment. See
    /// [`ClientConfig::from_env`].
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    pub fn new(config: ClientConfig) -> Result<Self> {
        // No overall timeout: a single large file may take hours.
        let client = Client::builder()
            .timeout(None::<Duration>)
            .user_agent(concat!("archivist/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(ArchiveClient { client, config })
    }

    fn item_file_url(&self, identifier: &str, remote: &str) -> Result<Url, ArchiveError> {
        endpoint_url(
            &self.config.s3_url,
            std::iter::once(identifier).chain(remote.split('/')),
        )
    }

    fn put_file(
        &self,
        credentials: &Credentials,
        identifier: &str,
        remote: &str,
        file: File,
        headers: HeaderMap,
    ) -> Result<(), ArchiveError> {
        let url = self.item_file_url(identifier, remote)?;
        tracing::debug!(%url, "PUT");
        let res = self
            .client
            .put(url)
            .header(AUTHORIZATION, credentials.authorization())
            .headers(headers)
            .body(Body::from(file))
            .send()?;
        check_status(res, &format!("Upload of {}", remote)).map(|_| ())
    }
}

impl ArchiveService for ArchiveClient {
    fn get_item(&self, identifier: &str) -> Result<Item, ArchiveError> {
        let url = endpoint_url(&self.config.metadata_url, [identifier])?;
        tracing::debug!(%url, "GET");
        let res = self.client.get(url).send()?;
        let res = check_status(res, "Item lookup")?;
        let body: MetadataResponse = res.json()?;

        let files = body
            .files
            .into_iter()
            .map(|f| {
                let info = RemoteFileInfo {
                    size: f.size.and_then(|s| s.parse().ok()).unwrap_or(0),
                    md5: f.md5.map(|m| m.to_ascii_lowercase()),
                };
                (f.name, info)
            })
            .collect();
        Ok(Item {
            identifier: identifier.to_string(),
            exists: body.metadata.is_some(),
            files,
        })
    }

    fn upload(
        &self,
        item: &Item,
        files: &FileMapping,
        metadata: &MetadataRecord,
    ) -> Result<UploadReport, ArchiveError> {
        let credentials = self
            .config
            .credentials
            .as_ref()
            .ok_or(ArchiveError::MissingCredentials)?;
        let meta_headers = metadata_headers(metadata)?;

        // Work out what actually needs sending first, so the derive task is
        // queued only once, on the last file.
        let mut report = UploadReport::default();
        let mut pending = Vec::new();
        for (remote, local) in files {
            let size = std::fs::metadata(local)?.len();
            if is_unchanged(item.files.get(remote), local, size)? {
                tracing::info!(file = %remote, "already present, skipping");
                report.skipped.push(remote.clone());
            } else {
                pending.push((remote, local, size));
            }
        }

        let bar = crate::ui::file_progress(pending.len());
        let last = pending.len().saturating_sub(1);
        for (idx, (remote, local, size)) in pending.into_iter().enumerate() {
            bar.set_message(remote.clone());
            let mut headers = meta_headers.clone();
            headers.insert("x-amz-auto-make-bucket", HeaderValue::from_static("1"));
            headers.insert("x-archive-size-hint", HeaderValue::from(size));
            headers.insert(
                "x-archive-queue-derive",
                HeaderValue::from_static(if idx == last { "1" } else { "0" }),
            );

            let file = File::open(local)?;
            if let Err(e) = self.put_file(credentials, &item.identifier, remote, file, headers) {
                bar.abandon();
                tracing::warn!(file = %remote, error = %e, "upload failed");
                return Err(e);
            }
            tracing::info!(file = %remote, bytes = size, "uploaded");
            report.uploaded.push(remote.clone());
            bar.inc(1);
        }
        bar.finish_and_clear();

        Ok(report)
    }
}

/// Base URL with each of `segments` appended as an escaped path segment.
fn endpoint_url<'a>(
    base: &str,
    segments: impl IntoIterator<Item = &'a str>,
) -> Result<Url, ArchiveError> {
    let mut url = Url::parse(base).map_err(|_| ArchiveError::InvalidUrl(base.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| ArchiveError::InvalidUrl(base.to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// A remote file is only trusted when its MD5 matches the local content.
/// Files without a remote checksum are always sent again.
fn is_unchanged(
    remote: Option<&RemoteFileInfo>,
    local: &Path,
    size: u64,
) -> Result<bool, ArchiveError> {
    let Some(RemoteFileInfo { size: remote_size, md5: Some(remote_md5) }) = remote else {
        return Ok(false);
    };
    if *remote_size != size {
        return Ok(false);
    }
    Ok(file_md5(local)? == *remote_md5)
}

/// Lowercase hex MD5 of a file, streamed from disk.
pub fn file_md5(path: &Path) -> Result<String, std::io::Error> {
    let mut file = File::open(path)?;
    let mut ctx = md5::Context::new();
    std::io::copy(&mut file, &mut ctx)?;
    Ok(format!("{:x}", ctx.compute()))
}

/// Turn a non-success response into an error, keeping the body for context.
fn check_status(res: Response, action: &str) -> Result<Response, ArchiveError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let body = res.text().unwrap_or_default();
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(ArchiveError::Authentication { status, body });
    }
    Err(ArchiveError::Status {
        action: action.to_string(),
        status,
        body,
    })
}

/// One `x-archive-meta-<field>` header per metadata entry.
pub fn metadata_headers(metadata: &MetadataRecord) -> Result<HeaderMap, ArchiveError> {
    let mut headers = HeaderMap::new();
    for (key, value) in metadata {
        let name = HeaderName::from_bytes(format!("x-archive-meta-{}", key).as_bytes())
            .map_err(|_| ArchiveError::InvalidHeader(key.clone()))?;
        let value = HeaderValue::from_str(&encode_header_value(value))
            .map_err(|_| ArchiveError::InvalidHeader(key.clone()))?;
        headers.insert(name, value);
    }
    Ok(headers)
}

/// Plain printable ASCII goes through unchanged; anything else is wrapped as
/// `uri(<percent-encoded UTF-8>)`, which the archive decodes on its side.
pub fn encode_header_value(value: &str) -> String {
    if value.bytes().all(|b| (0x20..0x7f).contains(&b)) {
        return value.to_string();
    }
    let mut out = String::from("uri(");
    for b in value.bytes() {
        if b.is_ascii_alphanumeric() || b"-_.~".contains(&b) {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{:02X}", b));
        }
    }
    out.push(')');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(s3_url: &str) -> ArchiveClient {
        ArchiveClient::new(ClientConfig {
            s3_url: s3_url.to_string(),
            metadata_url: "http://127.0.0.1:9/metadata".to_string(),
            credentials: None,
        })
        .unwrap()
    }

    #[test]
    fn ascii_values_are_sent_verbatim() {
        assert_eq!(encode_header_value("A Title, 1999"), "A Title, 1999");
    }

    #[test]
    fn non_ascii_values_are_uri_wrapped() {
        assert_eq!(encode_header_value("Café"), "uri(Caf%C3%A9)");
        assert_eq!(encode_header_value("line\nbreak"), "uri(line%0Abreak)");
    }

    #[test]
    fn metadata_becomes_archive_headers() {
        let mut metadata = MetadataRecord::new();
        metadata.insert("title".into(), "T".into());
        metadata.insert("subject".into(), "a,b".into());
        let headers = metadata_headers(&metadata).unwrap();
        assert_eq!(headers.len(), 2);
        assert_eq!(headers["x-archive-meta-title"], "T");
        assert_eq!(headers["x-archive-meta-subject"], "a,b");
    }

    #[test]
    fn bad_field_name_is_rejected() {
        let mut metadata = MetadataRecord::new();
        metadata.insert("bad key".into(), "v".into());
        assert!(matches!(
            metadata_headers(&metadata),
            Err(ArchiveError::InvalidHeader(k)) if k == "bad key"
        ));
    }

    #[test]
    fn file_url_escapes_each_segment() {
        let url = client("https://s3.example.org/")
            .item_file_url("my-item", "sub dir/b#1.txt")
            .unwrap();
        assert_eq!(url.as_str(), "https://s3.example.org/my-item/sub%20dir/b%231.txt");
    }

    #[test]
    fn upload_without_credentials_is_an_auth_failure() {
        let c = client("https://s3.example.org");
        let item = Item { identifier: "x".into(), ..Default::default() };
        let err = c.upload(&item, &FileMapping::new(), &MetadataRecord::new()).unwrap_err();
        assert!(err.is_authentication());
    }

    #[test]
    fn same_size_edit_is_not_treated_as_present() {
        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join("notes.txt");
        std::fs::write(&local, b"0123456789").unwrap();
        let remote = RemoteFileInfo {
            size: 10,
            md5: Some(format!("{:x}", md5::compute(b"abcdefghij"))),
        };
        assert!(!is_unchanged(Some(&remote), &local, 10).unwrap());
    }

    #[test]
    fn matching_checksum_is_treated_as_present() {
        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join("hello.txt");
        std::fs::write(&local, b"hello").unwrap();
        assert_eq!(file_md5(&local).unwrap(), "5d41402abc4b2a76b9719d911017c592");

        let remote = RemoteFileInfo {
            size: 5,
            md5: Some("5d41402abc4b2a76b9719d911017c592".into()),
        };
        assert!(is_unchanged(Some(&remote), &local, 5).unwrap());
    }

    #[test]
    fn missing_remote_checksum_means_upload() {
        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join("hello.txt");
        std::fs::write(&local, b"hello").unwrap();
        let remote = RemoteFileInfo { size: 5, md5: None };
        assert!(!is_unchanged(Some(&remote), &local, 5).unwrap());
        assert!(!is_unchanged(None, &local, 5).unwrap());
    }

    #[test]
    fn metadata_url_escapes_identifier() {
        let url = endpoint_url("https://archive.org/metadata", ["odd?id#x"]).unwrap();
        assert_eq!(url.as_str(), "https://archive.org/metadata/odd%3Fid%23x");
    }

    #[test]
    fn metadata_response_tolerates_missing_item() {
        let body: MetadataResponse = serde_json::from_str("{}").unwrap();
        assert!(body.metadata.is_none());
        assert!(body.files.is_empty());

        let body: MetadataResponse = serde_json::from_str(
            r#"{"metadata":{"identifier":"x"},"files":[{"name":"a.txt","size":"12"},{"name":"x_meta.xml"}]}"#,
        )
        .unwrap();
        assert!(body.metadata.is_some());
        assert_eq!(body.files.len(), 2);
        assert_eq!(body.files[0].size.as_deref(), Some("12"));
    }
}
