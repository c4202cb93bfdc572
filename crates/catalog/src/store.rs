//! SQLite-backed catalog store.
//!
//! The sync transaction owns exclusive write access to a repository's skill
//! rows for its whole atomic unit; the backfill path only touches single
//! rows by primary key.

use std::time::{SystemTime, UNIX_EPOCH};

use {
    anyhow::Result,
    sqlx::SqlitePool,
    tracing::{debug, info},
};

use skillery_ingest::{NewSkill, PLACEHOLDER_CATEGORY};

use crate::model::{Repo, RepoUpsert, Skill, SkillForBackfill, SyncOutcome, TaxonomySnapshot};

/// Cap on the taxonomy sample handed to the enrichment prompt.
pub const TAXONOMY_SAMPLE_SIZE: usize = 10;

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

fn tags_to_json(tags: &[String]) -> String {
    serde_json::to_string(tags).unwrap_or_else(|_| "[]".to_string())
}

fn tags_from_json(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_default()
}

// ── Row mapping ─────────────────────────────────────────────────────────────

#[derive(sqlx::FromRow)]
struct SkillRow {
    id: String,
    repo_id: String,
    name: String,
    description: String,
    category: Option<String>,
    tags: String,
    author_name: Option<String>,
    author_url: Option<String>,
    author_avatar_url: Option<String>,
    author_slug: Option<String>,
    created_at: i64,
    updated_at: i64,
}

impl From<SkillRow> for Skill {
    fn from(r: SkillRow) -> Self {
        Self {
            id: r.id,
            repo_id: r.repo_id,
            name: r.name,
            description: r.description,
            category: r.category,
            tags: tags_from_json(&r.tags),
            author_name: r.author_name,
            author_url: r.author_url,
            author_avatar_url: r.author_avatar_url,
            author_slug: r.author_slug,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct RepoRow {
    id: String,
    owner: String,
    name: String,
    url: String,
    license: Option<String>,
    stars: i64,
    forks: i64,
    owner_name: Option<String>,
    owner_url: Option<String>,
    owner_avatar_url: Option<String>,
    skills_path: String,
    last_parsed_at: Option<i64>,
    created_at: i64,
    updated_at: i64,
}

impl From<RepoRow> for Repo {
    fn from(r: RepoRow) -> Self {
        Self {
            id: r.id,
            owner: r.owner,
            name: r.name,
            url: r.url,
            license: r.license,
            stars: r.stars,
            forks: r.forks,
            owner_name: r.owner_name,
            owner_url: r.owner_url,
            owner_avatar_url: r.owner_avatar_url,
            skills_path: r.skills_path,
            last_parsed_at: r.last_parsed_at,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

// ── Store ───────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct CatalogStore {
    pool: SqlitePool,
}

impl CatalogStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Upsert the repo row and atomically replace its skill set.
    ///
    /// The whole sequence commits or rolls back as one unit. An empty skill
    /// list still clears that repository's rows. The skills are expected to
    /// be pre-deduplicated by id.
    pub async fn sync_repo(&self, repo: &RepoUpsert, skills: &[NewSkill]) -> Result<SyncOutcome> {
        let now = now_ms();
        let mut tx = self.pool.begin().await?;

        let existing: Option<(String,)> =
            sqlx::query_as("SELECT id FROM repos WHERE owner = ? AND name = ?")
                .bind(&repo.owner)
                .bind(&repo.name)
                .fetch_optional(&mut *tx)
                .await?;
        let already_exists = existing.is_some();

        sqlx::query(
            r#"INSERT INTO repos (
                 id, owner, name, url, license, stars, forks,
                 owner_name, owner_url, owner_avatar_url,
                 skills_path, last_parsed_at, created_at, updated_at
               ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
               ON CONFLICT(id) DO UPDATE SET
                 url              = excluded.url,
                 license          = excluded.license,
                 stars            = excluded.stars,
                 forks            = excluded.forks,
                 owner_name       = excluded.owner_name,
                 owner_url        = excluded.owner_url,
                 owner_avatar_url = excluded.owner_avatar_url,
                 skills_path      = excluded.skills_path,
                 last_parsed_at   = excluded.last_parsed_at,
                 updated_at       = excluded.updated_at"#,
        )
        .bind(&repo.id)
        .bind(&repo.owner)
        .bind(&repo.name)
        .bind(&repo.url)
        .bind(&repo.license)
        .bind(repo.stars)
        .bind(repo.forks)
        .bind(&repo.owner_name)
        .bind(&repo.owner_url)
        .bind(&repo.owner_avatar_url)
        .bind(&repo.skills_path)
        .bind(now)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM skills WHERE repo_id = ?")
            .bind(&repo.id)
            .execute(&mut *tx)
            .await?;

        for skill in skills {
            let author = skill.author.as_ref();
            sqlx::query(
                r#"INSERT INTO skills (
                     id, repo_id, name, description, category, tags,
                     author_name, author_url, author_avatar_url, author_slug,
                     created_at, updated_at
                   ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            )
            .bind(&skill.id)
            .bind(&repo.id)
            .bind(&skill.name)
            .bind(&skill.description)
            .bind(&skill.category)
            .bind(tags_to_json(&skill.tags))
            .bind(author.map(|a| a.name.as_str()))
            .bind(author.map(|a| a.url.as_str()))
            .bind(author.map(|a| a.avatar_url.as_str()))
            .bind(author.and_then(|a| a.slug.as_deref()))
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        info!(repo_id = %repo.id, skills = skills.len(), already_exists, "synced repository");

        Ok(SyncOutcome {
            repo_id: repo.id.clone(),
            skills_added: skills.len(),
            already_exists,
        })
    }

    pub async fn get_repo(&self, repo_id: &str) -> Result<Option<Repo>> {
        let row = sqlx::query_as::<_, RepoRow>("SELECT * FROM repos WHERE id = ?")
            .bind(repo_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    pub async fn list_skills(&self) -> Result<Vec<Skill>> {
        let rows = sqlx::query_as::<_, SkillRow>("SELECT * FROM skills ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Distinct categories (placeholder excluded) and tags, each capped to
    /// [`TAXONOMY_SAMPLE_SIZE`]. Tags are flattened from the JSON column in
    /// Rust; SQLite has no unnest.
    pub async fn fetch_taxonomy(&self) -> Result<TaxonomySnapshot> {
        let categories: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT category FROM skills \
             WHERE category IS NOT NULL AND category != '' AND category != ? \
             LIMIT ?",
        )
        .bind(PLACEHOLDER_CATEGORY)
        .bind(TAXONOMY_SAMPLE_SIZE as i64)
        .fetch_all(&self.pool)
        .await?;

        let tag_columns: Vec<String> =
            sqlx::query_scalar("SELECT tags FROM skills WHERE tags != '[]'")
                .fetch_all(&self.pool)
                .await?;
        let mut tags = Vec::new();
        let mut seen = std::collections::HashSet::new();
        'outer: for column in tag_columns {
            for tag in tags_from_json(&column) {
                if tag.is_empty() || !seen.insert(tag.clone()) {
                    continue;
                }
                tags.push(tag);
                if tags.len() >= TAXONOMY_SAMPLE_SIZE {
                    break 'outer;
                }
            }
        }

        Ok(TaxonomySnapshot { categories, tags })
    }

    /// Rows with a missing/empty/placeholder category or an empty tag set,
    /// in stable insertion order.
    pub async fn skills_missing_metadata(&self) -> Result<Vec<SkillForBackfill>> {
        #[derive(sqlx::FromRow)]
        struct Row {
            id: String,
            name: String,
            description: String,
            category: Option<String>,
            tags: String,
        }

        let rows = sqlx::query_as::<_, Row>(
            "SELECT id, name, description, category, tags FROM skills \
             WHERE category IS NULL OR category = '' OR category = ? OR tags = '[]' \
             ORDER BY rowid",
        )
        .bind(PLACEHOLDER_CATEGORY)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| SkillForBackfill {
                id: r.id,
                name: r.name,
                description: r.description,
                category: r.category,
                tags: tags_from_json(&r.tags),
            })
            .collect())
    }

    /// Point update for one row's enrichment result. Category and tags are
    /// written together or not at all.
    pub async fn update_skill_metadata(
        &self,
        skill_id: &str,
        category: &str,
        tags: &[String],
    ) -> Result<()> {
        let result =
            sqlx::query("UPDATE skills SET category = ?, tags = ?, updated_at = ? WHERE id = ?")
                .bind(category)
                .bind(tags_to_json(tags))
                .bind(now_ms())
                .bind(skill_id)
                .execute(&self.pool)
                .await?;
        debug!(%skill_id, %category, rows = result.rows_affected(), "updated skill metadata");
        Ok(())
    }
}
