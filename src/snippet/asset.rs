use anyhow::{Context, Result};
use base64::prelude::*;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::info;

use super::{build, CompactPolicy};
use crate::models::Settings;

/// A built snippet ready to be served or persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnippetAsset {
    body: String,
    etag: String,
    compact: bool,
}

impl SnippetAsset {
    pub fn new(settings: &Settings, policy: CompactPolicy) -> Self {
        let compact = policy.compact();
        let body = build(&settings.account_id, &settings.snippet_version, compact);
        let digest = Sha256::digest(body.as_bytes());
        let etag = format!("\"{}\"", BASE64_URL_SAFE_NO_PAD.encode(digest));

        Self {
            body,
            etag,
            compact,
        }
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Strong entity tag, quoted
    pub fn etag(&self) -> &str {
        &self.etag
    }

    pub fn is_compact(&self) -> bool {
        self.compact
    }

    /// Check an `If-None-Match` header value against this asset
    pub fn matches_etag(&self, if_none_match: &str) -> bool {
        if_none_match.split(',').map(str::trim).any(|tag| {
            tag == "*" || tag.strip_prefix("W/").unwrap_or(tag) == self.etag
        })
    }

    /// Write the snippet to `path`, replacing any existing file.
    ///
    /// Contents go to a sibling temporary file which is then renamed over the
    /// target, so readers see either the previous or the new snippet.
    pub async fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir).await.with_context(|| {
                format!(
                    "Failed to create or make writable the directory {}",
                    dir.display()
                )
            })?;
        }

        let tmp = temp_path(path);
        tokio::fs::write(&tmp, self.body.as_bytes())
            .await
            .with_context(|| format!("Failed to write snippet to {}", tmp.display()))?;

        if let Err(err) = tokio::fs::rename(&tmp, path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(err)
                .with_context(|| format!("Failed to save snippet file {}", path.display()));
        }

        info!(path = %path.display(), compact = self.compact, "Created snippet file");
        Ok(())
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "snippet".to_string());
    path.with_file_name(format!(".{}.tmp-{}", name, std::process::id()))
}
