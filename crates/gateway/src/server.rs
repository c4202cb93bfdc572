use std::net::SocketAddr;

use {
    axum::{
        Router,
        routing::{get, post},
    },
    tower_http::cors::{Any, CorsLayer},
    tracing::info,
};

use crate::{routes, state::AppState};

/// Build the gateway router (shared between production startup and tests).
pub fn build_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(routes::health))
        .route("/api/repos", post(routes::submit_repo))
        .route("/api/skills", get(routes::list_skills))
        .route("/api/repos/{owner}/{repo}/tree", get(routes::repo_tree))
        .route(
            "/api/skills/download/{owner}/{repo}/{*skill}",
            get(routes::download_skill),
        )
        .route("/api/backfill-metadata", post(routes::backfill_metadata))
        .layer(cors)
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn run(state: AppState, bind: &str, port: u16) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "gateway listening");
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
