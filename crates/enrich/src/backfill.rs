//! Bounded-concurrency backfill over skills with missing metadata.

use {
    anyhow::Result,
    futures::future::join_all,
    serde::Serialize,
    skillery_catalog::{CatalogStore, SkillForBackfill, TaxonomySnapshot},
    tracing::{info, warn},
};

use crate::generator::{GeneratedMetadata, MetadataGenerator, SkillInput};

/// Rows generated in flight at once. Each row is its own unit of work; one
/// failure never stalls the rest of its batch.
const CONCURRENCY: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Success,
    Error,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackfillOutcome {
    pub skill_id: String,
    pub skill_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated: Option<GeneratedMetadata>,
    pub status: OutcomeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BackfillStats {
    pub total: usize,
    pub success: usize,
    pub error: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackfillReport {
    pub taxonomy: TaxonomySnapshot,
    pub stats: BackfillStats,
    pub results: Vec<BackfillOutcome>,
}

async fn backfill_one(
    store: &CatalogStore,
    generator: &dyn MetadataGenerator,
    taxonomy: &TaxonomySnapshot,
    skill: SkillForBackfill,
) -> BackfillOutcome {
    let input = SkillInput {
        name: skill.name.clone(),
        description: skill.description.clone(),
    };

    let generated = match generator.generate(&input, taxonomy).await {
        Ok(g) => g,
        Err(err) => {
            warn!(skill_id = %skill.id, %err, "metadata generation failed");
            return BackfillOutcome {
                skill_id: skill.id,
                skill_name: skill.name,
                generated: None,
                status: OutcomeStatus::Error,
                error: Some(err.to_string()),
            };
        }
    };

    if let Err(err) = store
        .update_skill_metadata(&skill.id, &generated.category, &generated.tags)
        .await
    {
        warn!(skill_id = %skill.id, %err, "metadata write failed");
        return BackfillOutcome {
            skill_id: skill.id,
            skill_name: skill.name,
            generated: Some(generated),
            status: OutcomeStatus::Error,
            error: Some(err.to_string()),
        };
    }

    BackfillOutcome {
        skill_id: skill.id,
        skill_name: skill.name,
        generated: Some(generated),
        status: OutcomeStatus::Success,
        error: None,
    }
}

/// Generate and persist metadata for every skill that is missing it.
///
/// Work proceeds in batches of [`CONCURRENCY`]; the next batch starts only
/// after the previous one settles. Results keep catalog order regardless of
/// completion order inside a batch.
pub async fn run_backfill(
    store: &CatalogStore,
    generator: &dyn MetadataGenerator,
) -> Result<BackfillReport> {
    let taxonomy = store.fetch_taxonomy().await?;
    let pending = store.skills_missing_metadata().await?;
    info!(pending = pending.len(), "starting metadata backfill");

    let mut results = Vec::with_capacity(pending.len());
    for batch in pending.chunks(CONCURRENCY) {
        let outcomes = join_all(
            batch
                .iter()
                .cloned()
                .map(|skill| backfill_one(store, generator, &taxonomy, skill)),
        )
        .await;
        results.extend(outcomes);
    }

    let success = results
        .iter()
        .filter(|r| r.status == OutcomeStatus::Success)
        .count();
    let stats = BackfillStats {
        total: results.len(),
        success,
        error: results.len() - success,
    };
    info!(total = stats.total, success = stats.success, error = stats.error, "backfill finished");

    Ok(BackfillReport { taxonomy, stats, results })
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        async_trait::async_trait,
        skillery_catalog::{RepoUpsert, run_migrations},
        skillery_ingest::NewSkill,
        sqlx::SqlitePool,
    };

    use super::*;

    struct ScriptedGenerator {
        fail_for: Option<String>,
    }

    #[async_trait]
    impl MetadataGenerator for ScriptedGenerator {
        async fn generate(
            &self,
            skill: &SkillInput,
            _taxonomy: &TaxonomySnapshot,
        ) -> Result<GeneratedMetadata> {
            if self.fail_for.as_deref() == Some(skill.name.as_str()) {
                anyhow::bail!("scripted failure");
            }
            Ok(GeneratedMetadata {
                category: "Generated".into(),
                tags: vec![format!("{}-tag", skill.name.to_lowercase())],
            })
        }
    }

    async fn seeded_store(names: &[&str]) -> CatalogStore {
        let pool = SqlitePool::connect(":memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        let store = CatalogStore::new(pool);

        let repo = RepoUpsert {
            id: "acme/tools".into(),
            owner: "acme".into(),
            name: "tools".into(),
            url: "https://github.com/acme/tools".into(),
            license: None,
            stars: 0,
            forks: 0,
            owner_name: None,
            owner_url: None,
            owner_avatar_url: None,
            skills_path: "skills".into(),
        };
        let skills: Vec<NewSkill> = names
            .iter()
            .map(|name| NewSkill {
                id: format!("acme/tools/{name}"),
                name: name.to_string(),
                description: format!("{name} description"),
                category: "Uncategorized".into(),
                tags: Vec::new(),
                author: None,
            })
            .collect();
        store.sync_repo(&repo, &skills).await.unwrap();
        store
    }

    #[tokio::test]
    async fn backfill_persists_generated_metadata() {
        let store = seeded_store(&["Alpha", "Beta"]).await;
        let generator = ScriptedGenerator { fail_for: None };

        let report = run_backfill(&store, &generator).await.unwrap();
        assert_eq!(report.stats.total, 2);
        assert_eq!(report.stats.success, 2);
        assert_eq!(report.stats.error, 0);

        let skills = store.list_skills().await.unwrap();
        assert!(skills.iter().all(|s| s.category.as_deref() == Some("Generated")));
        assert!(store.skills_missing_metadata().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn one_failure_does_not_stop_the_rest() {
        let store = seeded_store(&["Alpha", "Beta", "Gamma"]).await;
        let generator = ScriptedGenerator { fail_for: Some("Beta".into()) };

        let report = run_backfill(&store, &generator).await.unwrap();
        assert_eq!(report.stats.success, 2);
        assert_eq!(report.stats.error, 1);

        let failed = report
            .results
            .iter()
            .find(|r| r.status == OutcomeStatus::Error)
            .unwrap();
        assert_eq!(failed.skill_name, "Beta");
        assert!(failed.error.as_deref().unwrap().contains("scripted failure"));

        let still_missing = store.skills_missing_metadata().await.unwrap();
        assert_eq!(still_missing.len(), 1);
        assert_eq!(still_missing[0].name, "Beta");
    }

    #[tokio::test]
    async fn results_keep_catalog_order() {
        let store = seeded_store(&["Alpha", "Beta", "Gamma"]).await;
        let generator = ScriptedGenerator { fail_for: None };

        let report = run_backfill(&store, &generator).await.unwrap();
        let names: Vec<&str> = report.results.iter().map(|r| r.skill_name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "Beta", "Gamma"]);
    }

    #[tokio::test]
    async fn empty_catalog_yields_empty_report() {
        let store = seeded_store(&[]).await;
        let generator = ScriptedGenerator { fail_for: None };

        let report = run_backfill(&store, &generator).await.unwrap();
        assert_eq!(report.stats.total, 0);
        assert!(report.results.is_empty());
    }
}
