//! Parse user-supplied repository references into a normalized triple.

use url::Url;

use crate::error::{Error, Result};

/// Default subdirectory that holds skill folders.
pub const DEFAULT_SKILLS_PATH: &str = "skills";

/// A normalized (owner, repository, skills subdirectory) triple.
/// Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoReference {
    pub owner: String,
    pub repo: String,
    /// Subdirectory containing skill folders. No leading or trailing
    /// slash; empty means the repository root.
    pub skills_path: String,
}

impl RepoReference {
    pub fn repo_id(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    /// Replace the skills subdirectory, normalizing slashes.
    #[must_use]
    pub fn with_skills_path(mut self, path: &str) -> Self {
        self.skills_path = normalize_skills_path(path);
        self
    }
}

/// Parse `owner/repo` (optionally with a `.git` suffix) or a github.com URL.
///
/// Anything else is rejected: other hosts, missing path segments, or owner
/// and repo names outside the `[\w.-]+` character set.
pub fn parse_repo_reference(input: &str) -> Result<RepoReference> {
    let trimmed = input.trim();
    let trimmed = trimmed.strip_suffix(".git").unwrap_or(trimmed);

    if let Some((owner, repo)) = trimmed.split_once('/')
        && is_identifier(owner)
        && is_identifier(repo)
    {
        return Ok(reference(owner, repo));
    }

    let url =
        Url::parse(trimmed).map_err(|_| Error::InvalidRepoReference(input.to_string()))?;
    let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
    if host != "github.com" && host != "www.github.com" {
        return Err(Error::InvalidRepoReference(input.to_string()));
    }

    let mut segments = url.path().split('/').filter(|s| !s.is_empty());
    match (segments.next(), segments.next()) {
        (Some(owner), Some(repo)) => Ok(reference(owner, repo)),
        _ => Err(Error::InvalidRepoReference(input.to_string())),
    }
}

fn reference(owner: &str, repo: &str) -> RepoReference {
    RepoReference {
        owner: owner.to_string(),
        repo: repo.to_string(),
        skills_path: DEFAULT_SKILLS_PATH.to_string(),
    }
}

fn is_identifier(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}

/// Trim slashes from a configured skills subdirectory.
pub fn normalize_skills_path(path: &str) -> String {
    path.trim_matches('/').to_string()
}

/// Join the skills subdirectory with a skill folder name.
pub fn join_skills_path(base: &str, dir: &str) -> String {
    let dir = dir.trim_matches('/');
    if base.is_empty() {
        dir.to_string()
    } else if dir.is_empty() {
        base.to_string()
    } else {
        format!("{base}/{dir}")
    }
}
