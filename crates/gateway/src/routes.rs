//! HTTP handlers for the catalog API.

use {
    axum::{
        Json,
        body::Body,
        extract::{Path, Query, State},
        http::{StatusCode, header},
        response::{IntoResponse, Response},
    },
    serde::Deserialize,
    serde_json::json,
    tracing::info,
};

use {
    skillery_enrich::run_backfill,
    skillery_github::{
        DEFAULT_SKILLS_PATH, build_file_tree, join_skills_path, select_archive_files,
        stream_skill_archive,
    },
};

use crate::{error::ApiError, state::AppState, submission::submit_repository};

pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

// ── Submission ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub repo: String,
    #[serde(default)]
    pub token: Option<String>,
}

pub async fn submit_repo(
    State(state): State<AppState>,
    Json(request): Json<SubmitRequest>,
) -> Result<Response, ApiError> {
    let outcome = submit_repository(&state, &request.repo, request.token).await?;
    Ok((StatusCode::CREATED, Json(outcome)).into_response())
}

// ── Listing ─────────────────────────────────────────────────────────────────

pub async fn list_skills(State(state): State<AppState>) -> Result<Response, ApiError> {
    let skills = state.store.list_skills().await?;
    Ok(Json(skills).into_response())
}

// ── Tree browsing ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct TreeQuery {
    #[serde(default)]
    pub path: Option<String>,
}

pub async fn repo_tree(
    State(state): State<AppState>,
    Path((owner, repo)): Path<(String, String)>,
    Query(query): Query<TreeQuery>,
) -> Result<Response, ApiError> {
    let prefix = match query.path {
        Some(path) => path,
        None => stored_skills_path(&state, &owner, &repo).await?,
    };
    let entries = state.github.fetch_tree(&owner, &repo).await?;
    let tree = build_file_tree(&entries, &prefix);
    Ok(Json(tree).into_response())
}

// ── Archive download ────────────────────────────────────────────────────────

pub async fn download_skill(
    State(state): State<AppState>,
    Path((owner, repo, skill)): Path<(String, String, String)>,
) -> Result<Response, ApiError> {
    let skill = skill.trim_matches('/').to_string();
    if skill.is_empty() {
        return Err(ApiError::bad_request("missing skill folder name"));
    }

    let skills_path = stored_skills_path(&state, &owner, &repo).await?;
    let prefix = join_skills_path(&skills_path, &skill);

    let entries = state.github.fetch_tree(&owner, &repo).await?;
    let files = select_archive_files(&entries, &prefix)?;
    info!(%owner, %repo, %prefix, files = files.len(), "streaming skill archive");

    let filename = skill.rsplit('/').next().unwrap_or(&skill).to_string();
    let stream = stream_skill_archive(state.github.clone(), owner, repo, prefix, files);

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/gzip")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}.tar.gz\""),
        )
        .body(Body::from_stream(stream))
        .map_err(|e| ApiError::internal(e.to_string()))?;
    Ok(response)
}

/// The skills path recorded at submission time, or the conventional default
/// for repositories the catalog has not seen.
async fn stored_skills_path(state: &AppState, owner: &str, repo: &str) -> Result<String, ApiError> {
    let repo_id = format!("{owner}/{repo}");
    Ok(state
        .store
        .get_repo(&repo_id)
        .await?
        .map(|r| r.skills_path)
        .unwrap_or_else(|| DEFAULT_SKILLS_PATH.to_string()))
}

// ── Metadata backfill ───────────────────────────────────────────────────────

pub async fn backfill_metadata(State(state): State<AppState>) -> Result<Response, ApiError> {
    let report = run_backfill(&state.store, state.generator.as_ref()).await?;
    Ok(Json(json!({
        "message": format!(
            "backfilled {} of {} skills",
            report.stats.success, report.stats.total
        ),
        "taxonomy": {
            "categoriesCount": report.taxonomy.categories.len(),
            "tagsCount": report.taxonomy.tags.len(),
        },
        "stats": report.stats,
        "results": report.results,
    }))
    .into_response())
}
