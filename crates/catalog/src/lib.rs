//! Persistent skills catalog: row types, SQLite schema, the atomic sync
//! transaction, taxonomy snapshots, and backfill point updates.

pub mod model;
pub mod schema;
pub mod store;

pub use {
    model::{Repo, RepoUpsert, Skill, SkillForBackfill, SyncOutcome, TaxonomySnapshot},
    schema::{connect, run_migrations},
    store::{CatalogStore, TAXONOMY_SAMPLE_SIZE},
};
