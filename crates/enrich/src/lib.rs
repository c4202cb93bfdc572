//! Metadata enrichment for catalog skills.
//!
//! Skills whose authors left out a category or tags get them generated by a
//! language model, guided by a sample of the taxonomy already in the catalog
//! so new values converge on existing ones instead of inventing synonyms.

pub mod backfill;
pub mod generator;

pub use {
    backfill::{BackfillOutcome, BackfillReport, BackfillStats, OutcomeStatus, run_backfill},
    generator::{GeneratedMetadata, MetadataGenerator, OpenAiGenerator, SkillInput},
};
