//! Read-only GitHub access for the skills catalog.
//!
//! Covers the whole remote surface the pipeline needs: reference parsing,
//! the recursive tree listing, blob/content fetches, file-tree
//! reconstruction for browsing, and the streaming skill archive.

pub mod archive;
pub mod client;
pub mod error;
pub mod resolve;
pub mod tree;

pub use {
    archive::{select_archive_files, stream_skill_archive},
    client::{ContentEntry, ContentFile, Contents, EntryKind, GithubClient, RepoInfo, TreeEntry},
    error::{Error, Result},
    resolve::{DEFAULT_SKILLS_PATH, RepoReference, join_skills_path, parse_repo_reference},
    tree::{FileNode, NodeKind, build_file_tree},
};
