//! SQLite schema bootstrap for the catalog database.

use std::{path::Path, str::FromStr};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};

/// Open (creating if missing) the catalog database at `path`.
pub async fn connect(path: &Path) -> anyhow::Result<SqlitePool> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", path.display()))?
        .create_if_missing(true)
        .foreign_keys(true);
    Ok(SqlitePool::connect_with(options).await?)
}

/// Create the `repos` and `skills` tables and their indexes.
///
/// Tags live in a JSON TEXT column; SQLite has no array type. Skills cascade
/// on repo deletion, though the pipeline itself never deletes repos.
pub async fn run_migrations(pool: &SqlitePool) -> anyhow::Result<()> {
    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS repos (
            id               TEXT PRIMARY KEY,
            owner            TEXT NOT NULL,
            name             TEXT NOT NULL,
            url              TEXT NOT NULL,
            license          TEXT,
            stars            INTEGER NOT NULL DEFAULT 0,
            forks            INTEGER NOT NULL DEFAULT 0,
            owner_name       TEXT,
            owner_url        TEXT,
            owner_avatar_url TEXT,
            skills_path      TEXT NOT NULL DEFAULT 'skills',
            last_parsed_at   INTEGER,
            created_at       INTEGER NOT NULL,
            updated_at       INTEGER NOT NULL
        )"#,
    )
    .execute(pool)
    .await?;
    // id is derived from (owner, name), so the primary key is the only
    // uniqueness constraint; this index serves lookups.
    sqlx::query("CREATE INDEX IF NOT EXISTS repos_owner_name_idx ON repos(owner, name)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS repos_stars_idx ON repos(stars)")
        .execute(pool)
        .await?;

    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS skills (
            id                TEXT PRIMARY KEY,
            repo_id           TEXT NOT NULL REFERENCES repos(id) ON DELETE CASCADE,
            name              TEXT NOT NULL,
            description       TEXT NOT NULL,
            category          TEXT,
            tags              TEXT NOT NULL DEFAULT '[]',
            author_name       TEXT,
            author_url        TEXT,
            author_avatar_url TEXT,
            author_slug       TEXT,
            created_at        INTEGER NOT NULL,
            updated_at        INTEGER NOT NULL
        )"#,
    )
    .execute(pool)
    .await?;
    for statement in [
        "CREATE INDEX IF NOT EXISTS skills_repo_id_idx ON skills(repo_id)",
        "CREATE INDEX IF NOT EXISTS skills_category_idx ON skills(category)",
        "CREATE INDEX IF NOT EXISTS skills_updated_at_idx ON skills(updated_at)",
        "CREATE INDEX IF NOT EXISTS skills_author_slug_idx ON skills(author_slug)",
        "CREATE INDEX IF NOT EXISTS skills_name_idx ON skills(name)",
    ] {
        sqlx::query(statement).execute(pool).await?;
    }

    Ok(())
}
