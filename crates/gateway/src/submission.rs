//! Repository submission: resolve, ingest, and sync in one pass.

use {
    thiserror::Error,
    tracing::{info, warn},
};

use {
    skillery_catalog::{RepoUpsert, SyncOutcome},
    skillery_github::{RepoInfo, parse_repo_reference},
    skillery_ingest::fetch_repo_skills,
};

use crate::state::AppState;

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Github(#[from] skillery_github::Error),
    #[error("failed to persist repository: {0}")]
    Storage(anyhow::Error),
}

/// Ingest a repository reference and sync its skills into the catalog.
///
/// Repository metadata enrichment is best effort; a failed metadata lookup
/// still lets the submission proceed with bare fallbacks.
pub async fn submit_repository(
    state: &AppState,
    reference: &str,
    token: Option<String>,
) -> Result<SyncOutcome, SubmitError> {
    let parsed = parse_repo_reference(reference)?;
    let client = match token {
        Some(token) => state.github.with_token(Some(token)),
        None => state.github.clone(),
    };

    let info = match client.repo_info(&parsed.owner, &parsed.repo).await {
        Ok(info) => Some(info),
        Err(err) => {
            warn!(owner = %parsed.owner, repo = %parsed.repo, %err,
                "repository metadata lookup failed, using fallbacks");
            None
        },
    };

    let skills = fetch_repo_skills(&client, &parsed).await?;
    info!(repo_id = %parsed.repo_id(), skills = skills.len(), "ingested repository");

    let upsert = build_upsert(&parsed.owner, &parsed.repo, &parsed.skills_path, info.as_ref());
    state
        .store
        .sync_repo(&upsert, &skills)
        .await
        .map_err(SubmitError::Storage)
}

fn build_upsert(owner: &str, repo: &str, skills_path: &str, info: Option<&RepoInfo>) -> RepoUpsert {
    let fallback_url = format!("https://github.com/{owner}/{repo}");
    let fallback_owner_url = format!("https://github.com/{owner}");
    RepoUpsert {
        id: format!("{owner}/{repo}"),
        owner: owner.to_string(),
        name: repo.to_string(),
        url: info
            .and_then(|i| i.html_url.clone())
            .unwrap_or(fallback_url),
        license: info
            .and_then(|i| i.license.as_ref())
            .and_then(|l| l.label())
            .map(str::to_string),
        stars: info.map(|i| i.stargazers_count).unwrap_or_default(),
        forks: info.map(|i| i.forks_count).unwrap_or_default(),
        owner_name: Some(
            info.and_then(|i| i.owner.as_ref())
                .and_then(|o| o.login.clone())
                .unwrap_or_else(|| owner.to_string()),
        ),
        owner_url: Some(
            info.and_then(|i| i.owner.as_ref())
                .and_then(|o| o.html_url.clone())
                .unwrap_or(fallback_owner_url),
        ),
        owner_avatar_url: info
            .and_then(|i| i.owner.as_ref())
            .and_then(|o| o.avatar_url.clone()),
        skills_path: skills_path.to_string(),
    }
}
