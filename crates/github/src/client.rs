//! Thin client over the GitHub REST API.
//!
//! Every call is a single request/response; non-2xx responses surface as
//! [`Error::RemoteApi`] with the upstream status and the request path.
//! There are no retries; that decision belongs to the caller.

use std::time::Duration;

use {
    base64::Engine as _,
    serde::{Deserialize, Serialize},
    tracing::{debug, error},
};

use crate::error::{Error, Result};

const DEFAULT_BASE_URL: &str = "https://api.github.com";
const USER_AGENT: &str = "skillery";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// ── Wire types ──────────────────────────────────────────────────────────────

/// One path/type/content-address record from a repository's full listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub sha: String,
    #[serde(default)]
    pub size: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Blob,
    Tree,
    Commit,
}

#[derive(Debug, Deserialize)]
struct TreeResponse {
    #[serde(default)]
    tree: Vec<TreeEntry>,
    #[serde(default)]
    truncated: bool,
}

/// Repository metadata used to refresh the catalog row.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RepoInfo {
    pub default_branch: Option<String>,
    pub html_url: Option<String>,
    #[serde(default)]
    pub stargazers_count: i64,
    #[serde(default)]
    pub forks_count: i64,
    pub license: Option<RepoLicense>,
    pub owner: Option<OwnerProfile>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RepoLicense {
    pub spdx_id: Option<String>,
    pub name: Option<String>,
}

impl RepoLicense {
    /// Prefer the SPDX identifier, fall back to the display name.
    pub fn label(&self) -> Option<&str> {
        self.spdx_id
            .as_deref()
            .filter(|s| !s.is_empty() && *s != "NOASSERTION")
            .or(self.name.as_deref())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OwnerProfile {
    pub login: Option<String>,
    pub html_url: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BlobResponse {
    content: String,
    #[serde(default)]
    encoding: String,
}

/// A single entry of a directory listing from the contents API.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentEntry {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// A file fetched directly by path, content included when small enough.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentFile {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub encoding: Option<String>,
}

impl ContentFile {
    /// Decode the base64 payload, if the response carried one.
    pub fn decoded(&self) -> Result<Option<Vec<u8>>> {
        match &self.content {
            Some(content) => decode_base64(content).map(Some),
            None => Ok(None),
        }
    }
}

/// Result of a contents fetch: a directory listing or a single file.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Contents {
    Directory(Vec<ContentEntry>),
    File(ContentFile),
}

// ── Client ──────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct GithubClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl GithubClient {
    pub fn new(token: Option<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
            token,
        })
    }

    /// Point the client at a different API root (tests).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Same client, different bearer token (per-request submission tokens).
    #[must_use]
    pub fn with_token(&self, token: Option<String>) -> Self {
        Self {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            token,
        }
    }

    /// Fetch repository metadata (stars, forks, license, owner profile).
    pub async fn repo_info(&self, owner: &str, repo: &str) -> Result<RepoInfo> {
        self.get_json(&format!("repos/{owner}/{repo}")).await
    }

    /// Fetch the complete recursive tree listing for the default branch.
    ///
    /// A `truncated` listing is fatal for ingestion and not retried.
    pub async fn fetch_tree(&self, owner: &str, repo: &str) -> Result<Vec<TreeEntry>> {
        let info = self.repo_info(owner, repo).await?;
        let branch = info.default_branch.unwrap_or_else(|| "main".to_string());
        let response: TreeResponse = self
            .get_json(&format!("repos/{owner}/{repo}/git/trees/{branch}?recursive=1"))
            .await?;
        if response.truncated {
            return Err(Error::TreeTruncated);
        }
        debug!(%owner, %repo, entries = response.tree.len(), "fetched repository tree");
        Ok(response.tree)
    }

    /// Fetch one object's raw content by content-address.
    pub async fn fetch_blob(&self, owner: &str, repo: &str, sha: &str) -> Result<Vec<u8>> {
        let blob: BlobResponse = self
            .get_json(&format!("repos/{owner}/{repo}/git/blobs/{sha}"))
            .await?;
        if !blob.encoding.is_empty() && blob.encoding != "base64" {
            return Err(Error::Decode(format!(
                "unexpected blob encoding '{}'",
                blob.encoding
            )));
        }
        decode_base64(&blob.content)
    }

    /// Fetch metadata and content for a single path, or a directory listing.
    /// Avoids a full tree fetch for on-demand reads.
    pub async fn fetch_contents(&self, owner: &str, repo: &str, path: &str) -> Result<Contents> {
        let path = path.trim_matches('/');
        let request_path = if path.is_empty() {
            format!("repos/{owner}/{repo}/contents")
        } else {
            format!("repos/{owner}/{repo}/contents/{path}")
        };
        self.get_json(&request_path).await
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}/{}", self.base_url, path);
        let mut request = self
            .http
            .get(&url)
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", USER_AGENT);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(%url, status = status.as_u16(), %body, "GitHub API request failed");
            return Err(Error::RemoteApi {
                status: status.as_u16(),
                path: path.to_string(),
            });
        }
        Ok(response.json().await?)
    }
}

/// GitHub base64 payloads are newline-wrapped; strip ASCII whitespace first.
fn decode_base64(content: &str) -> Result<Vec<u8>> {
    let compact: String = content.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    base64::engine::general_purpose::STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| Error::Decode(e.to_string()))
}
