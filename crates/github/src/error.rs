use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid repository reference '{0}': expected 'owner/repo' or a github.com URL")]
    InvalidRepoReference(String),

    #[error("GitHub API returned HTTP {status} for {path}")]
    RemoteApi { status: u16, path: String },

    #[error("repository tree is too large to fetch in a single listing")]
    TreeTruncated,

    #[error("no files found under skill folder '{0}'")]
    SkillFolderNotFound(String),

    #[error("failed to decode blob content: {0}")]
    Decode(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
