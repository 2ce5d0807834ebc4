// Client configuration: service endpoints and the S3-style keys written by
// `ia configure`. Everything comes from the environment or the user's home
// directory, mirroring how the HTTP client used to be configured from
// `API_GATEWAY_URL`.

use anyhow::{Context, Result};
use std::path::PathBuf;

pub const DEFAULT_S3_URL: &str = "https://s3.us.archive.org";
pub const DEFAULT_METADATA_URL: &str = "https://archive.org/metadata";
pub const DETAILS_URL: &str = "https://archive.org/details";

/// Access/secret key pair used for the `LOW` authorization scheme.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access: String,
    pub secret: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access", &self.access)
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Value of the `authorization` header sent with every upload.
    pub fn authorization(&self) -> String {
        format!("LOW {}:{}", self.access, self.secret)
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub s3_url: String,
    pub metadata_url: String,
    pub credentials: Option<Credentials>,
}

impl ClientConfig {
    /// Build the configuration from `IA_S3_URL`, `IA_METADATA_URL` and the
    /// credential sources described on [`load_credentials`].
    pub fn from_env() -> Result<Self> {
        let s3_url = std::env::var("IA_S3_URL").unwrap_or_else(|_| DEFAULT_S3_URL.into());
        let metadata_url =
            std::env::var("IA_METADATA_URL").unwrap_or_else(|_| DEFAULT_METADATA_URL.into());
        Ok(ClientConfig {
            s3_url: s3_url.trim_end_matches('/').to_string(),
            metadata_url: metadata_url.trim_end_matches('/').to_string(),
            credentials: load_credentials(),
        })
    }
}

/// Public page of an item.
pub fn item_url(identifier: &str) -> String {
    format!("{}/{}", DETAILS_URL, identifier)
}

/// Credentials from `IA_ACCESS_KEY_ID`/`IA_SECRET_ACCESS_KEY`, falling back
/// to the config files. `None` when nothing usable is set up, which later
/// surfaces as an authentication failure.
pub fn load_credentials() -> Option<Credentials> {
    if let (Ok(access), Ok(secret)) = (
        std::env::var("IA_ACCESS_KEY_ID"),
        std::env::var("IA_SECRET_ACCESS_KEY"),
    ) {
        if !access.is_empty() && !secret.is_empty() {
            return Some(Credentials { access, secret });
        }
    }
    credentials_from_files(&config_file_candidates())
}

/// First existing config file wins. Unreadable files are logged and skipped.
pub fn credentials_from_files(paths: &[PathBuf]) -> Option<Credentials> {
    for path in paths.iter().filter(|p| p.is_file()) {
        match std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))
        {
            Ok(data) => {
                tracing::debug!(path = %path.display(), "loaded archive config file");
                return parse_credentials(&data);
            }
            Err(e) => tracing::warn!(error = %format!("{:#}", e), "ignoring config file"),
        }
    }
    None
}

/// Locations searched for the config file, in priority order.
pub fn config_file_candidates() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Ok(p) = std::env::var("IA_CONFIG_FILE") {
        paths.push(PathBuf::from(p));
    }
    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".config").join("internetarchive").join("ia.ini"));
        paths.push(home.join(".config").join("ia.ini"));
        paths.push(home.join(".ia"));
    }
    paths
}

/// Pull `access` and `secret` out of the `[s3]` section of an ini file.
pub fn parse_credentials(ini: &str) -> Option<Credentials> {
    let mut in_s3 = false;
    let mut access = None;
    let mut secret = None;

    for line in ini.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if line.starts_with('[') && line.ends_with(']') {
            in_s3 = line[1..line.len() - 1].trim() == "s3";
            continue;
        }
        if !in_s3 {
            continue;
        }
        let Some((key, value)) = line.split_once('=').or_else(|| line.split_once(':')) else {
            continue;
        };
        let value = value.trim().to_string();
        match key.trim() {
            "access" => access = Some(value),
            "secret" => secret = Some(value),
            _ => {}
        }
    }

    match (access, secret) {
        (Some(access), Some(secret)) if !access.is_empty() && !secret.is_empty() => {
            Some(Credentials { access, secret })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_s3_section() {
        let ini = "[general]\nscreenname = someone\n\n[s3]\naccess = AK\nsecret = SK\n\n[cookies]\nlogged-in-user = x\n";
        let creds = parse_credentials(ini).unwrap();
        assert_eq!(creds.access, "AK");
        assert_eq!(creds.secret, "SK");
        assert_eq!(creds.authorization(), "LOW AK:SK");
    }

    #[test]
    fn ignores_keys_outside_s3() {
        let ini = "[general]\naccess = AK\nsecret = SK\n";
        assert!(parse_credentials(ini).is_none());
    }

    #[test]
    fn incomplete_keys_are_not_credentials() {
        assert!(parse_credentials("[s3]\naccess = AK\n").is_none());
        assert!(parse_credentials("[s3]\naccess = AK\nsecret =\n").is_none());
    }

    #[test]
    fn debug_hides_secret() {
        let creds = Credentials { access: "AK".into(), secret: "hunter2".into() };
        assert!(!format!("{:?}", creds).contains("hunter2"));
    }

    #[test]
    fn unreadable_config_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let broken = dir.path().join("broken.ini");
        std::fs::write(&broken, [0xffu8, 0xfe, 0x00]).unwrap();
        let good = dir.path().join("ia.ini");
        std::fs::write(&good, "[s3]\naccess = AK\nsecret = SK\n").unwrap();

        assert!(credentials_from_files(&[broken.clone()]).is_none());
        let creds = credentials_from_files(&[broken, dir.path().join("missing"), good]).unwrap();
        assert_eq!(creds.access, "AK");
    }

    #[test]
    fn item_url_uses_details_page() {
        assert_eq!(item_url("my-item"), "https://archive.org/details/my-item");
    }
}
