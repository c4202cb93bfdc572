//! Catalog row types and aggregates.

use serde::Serialize;

/// A catalog repository row. Created or refreshed on every submission,
/// never deleted by the pipeline.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Repo {
    /// `owner/name`.
    pub id: String,
    pub owner: String,
    pub name: String,
    pub url: String,
    pub license: Option<String>,
    pub stars: i64,
    pub forks: i64,
    pub owner_name: Option<String>,
    pub owner_url: Option<String>,
    pub owner_avatar_url: Option<String>,
    /// Configured/resolved skills subdirectory.
    pub skills_path: String,
    pub last_parsed_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Freshly computed repository attributes for one sync.
#[derive(Debug, Clone)]
pub struct RepoUpsert {
    pub id: String,
    pub owner: String,
    pub name: String,
    pub url: String,
    pub license: Option<String>,
    pub stars: i64,
    pub forks: i64,
    pub owner_name: Option<String>,
    pub owner_url: Option<String>,
    pub owner_avatar_url: Option<String>,
    pub skills_path: String,
}

/// A catalog skill row.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Skill {
    /// `owner/repo/name`, unique across the whole catalog.
    pub id: String,
    pub repo_id: String,
    pub name: String,
    pub description: String,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub author_name: Option<String>,
    pub author_url: Option<String>,
    pub author_avatar_url: Option<String>,
    pub author_slug: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// The slice of a skill row the backfill processor works on.
#[derive(Debug, Clone)]
pub struct SkillForBackfill {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: Option<String>,
    pub tags: Vec<String>,
}

/// Result of one sync transaction.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncOutcome {
    pub repo_id: String,
    pub skills_added: usize,
    pub already_exists: bool,
}

/// Bounded sample of the catalog's current categories and tags, used to
/// bias enrichment toward reuse. Recomputed per run, never persisted.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TaxonomySnapshot {
    pub categories: Vec<String>,
    pub tags: Vec<String>,
}
