//! Integration tests for the catalog API surface.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::{io::Read, net::SocketAddr, sync::Arc};

use {
    anyhow::Result,
    async_trait::async_trait,
    base64::{Engine, engine::general_purpose::STANDARD},
    tokio::net::TcpListener,
};

use {
    skillery_catalog::{CatalogStore, TaxonomySnapshot, run_migrations},
    skillery_enrich::{GeneratedMetadata, MetadataGenerator, SkillInput},
    skillery_gateway::{AppState, build_app},
    skillery_github::GithubClient,
};

struct FixedGenerator;

#[async_trait]
impl MetadataGenerator for FixedGenerator {
    async fn generate(
        &self,
        _skill: &SkillInput,
        _taxonomy: &TaxonomySnapshot,
    ) -> Result<GeneratedMetadata> {
        Ok(GeneratedMetadata {
            category: "Generated".into(),
            tags: vec!["generated".into()],
        })
    }
}

async fn start_server(github_base: &str) -> (SocketAddr, CatalogStore) {
    let pool = sqlx::SqlitePool::connect(":memory:").await.unwrap();
    run_migrations(&pool).await.unwrap();
    let store = CatalogStore::new(pool);

    let github = GithubClient::new(None).unwrap().with_base_url(github_base);
    let state = AppState::new(store.clone(), github, Arc::new(FixedGenerator));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, build_app(state).into_make_service())
            .await
            .unwrap();
    });
    (addr, store)
}

fn skill_md(name: &str, description: &str) -> String {
    STANDARD.encode(format!(
        "---\nname: {name}\ndescription: {description}\nmetadata:\n  category: Tools\n---\nBody\n"
    ))
}

/// Mock the GitHub endpoints a full submission of `acme/tools` walks.
async fn mock_submission(server: &mut mockito::Server) {
    server
        .mock("GET", "/repos/acme/tools")
        .with_status(200)
        .with_body(
            r#"{
              "default_branch": "main",
              "html_url": "https://github.com/acme/tools",
              "stargazers_count": 12,
              "forks_count": 3,
              "license": {"spdx_id": "MIT", "name": "MIT License"},
              "owner": {
                "login": "acme",
                "html_url": "https://github.com/acme",
                "avatar_url": "https://avatars.githubusercontent.com/acme"
              }
            }"#,
        )
        .create_async()
        .await;
    server
        .mock("GET", "/repos/acme/tools/git/trees/main?recursive=1")
        .with_status(200)
        .with_body(
            r#"{"tree": [
                {"path": "skills/my-skill/SKILL.md", "type": "blob", "sha": "sk1", "size": 64}
            ], "truncated": false}"#,
        )
        .create_async()
        .await;
    server
        .mock("GET", "/repos/acme/tools/git/blobs/sk1")
        .with_status(200)
        .with_body(format!(
            r#"{{"content": "{}", "encoding": "base64"}}"#,
            skill_md("My Skill", "Does useful things")
        ))
        .create_async()
        .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn health_endpoint_responds() {
    let (addr, _store) = start_server("http://unused.invalid").await;

    let resp = reqwest::get(format!("http://{addr}/health")).await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test(flavor = "multi_thread")]
async fn submission_ingests_and_lists_skills() {
    let mut github = mockito::Server::new_async().await;
    mock_submission(&mut github).await;
    let (addr, _store) = start_server(&github.url()).await;

    let client = reqwest::Client::new();
    let resp = client
        .post(format!("http://{addr}/api/repos"))
        .json(&serde_json::json!({ "repo": "acme/tools" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let outcome: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(outcome["repoId"], "acme/tools");
    assert_eq!(outcome["skillsAdded"], 1);
    assert_eq!(outcome["alreadyExists"], false);

    let skills: serde_json::Value = reqwest::get(format!("http://{addr}/api/skills"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let skills = skills.as_array().unwrap();
    assert_eq!(skills.len(), 1);
    assert_eq!(skills[0]["id"], "acme/tools/My Skill");
    assert_eq!(skills[0]["category"], "Tools");
    assert_eq!(skills[0]["authorName"], "acme");
}

#[tokio::test(flavor = "multi_thread")]
async fn resubmission_reports_already_exists() {
    let mut github = mockito::Server::new_async().await;
    mock_submission(&mut github).await;
    let (addr, _store) = start_server(&github.url()).await;

    let client = reqwest::Client::new();
    let submit = || {
        client
            .post(format!("http://{addr}/api/repos"))
            .json(&serde_json::json!({ "repo": "https://github.com/acme/tools" }))
            .send()
    };
    let first: serde_json::Value = submit().await.unwrap().json().await.unwrap();
    assert_eq!(first["alreadyExists"], false);
    let second: serde_json::Value = submit().await.unwrap().json().await.unwrap();
    assert_eq!(second["alreadyExists"], true);
}

#[tokio::test(flavor = "multi_thread")]
async fn invalid_reference_is_rejected() {
    let (addr, _store) = start_server("http://unused.invalid").await;

    let client = reqwest::Client::new();
    let resp = client
        .post(format!("http://{addr}/api/repos"))
        .json(&serde_json::json!({ "repo": "not a repository" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("not a repository"));
}

#[tokio::test(flavor = "multi_thread")]
async fn upstream_failure_maps_to_bad_gateway() {
    let mut github = mockito::Server::new_async().await;
    github
        .mock("GET", "/repos/acme/tools")
        .with_status(500)
        .create_async()
        .await;
    let (addr, _store) = start_server(&github.url()).await;

    let client = reqwest::Client::new();
    let resp = client
        .post(format!("http://{addr}/api/repos"))
        .json(&serde_json::json!({ "repo": "acme/tools" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 502);
}

#[tokio::test(flavor = "multi_thread")]
async fn truncated_listing_leaves_prior_rows_untouched() {
    let mut github = mockito::Server::new_async().await;
    mock_submission(&mut github).await;
    let (addr, store) = start_server(&github.url()).await;

    let client = reqwest::Client::new();
    let resp = client
        .post(format!("http://{addr}/api/repos"))
        .json(&serde_json::json!({ "repo": "acme/tools" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);

    // the next listing comes back truncated
    github.reset_async().await;
    github
        .mock("GET", "/repos/acme/tools")
        .with_status(200)
        .with_body(r#"{"default_branch": "main"}"#)
        .create_async()
        .await;
    github
        .mock("GET", "/repos/acme/tools/git/trees/main?recursive=1")
        .with_status(200)
        .with_body(r#"{"tree": [], "truncated": true}"#)
        .create_async()
        .await;

    let resp = client
        .post(format!("http://{addr}/api/repos"))
        .json(&serde_json::json!({ "repo": "acme/tools" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 502);

    let skills = store.list_skills().await.unwrap();
    assert_eq!(skills.len(), 1);
    assert_eq!(skills[0].id, "acme/tools/My Skill");
}

#[tokio::test(flavor = "multi_thread")]
async fn tree_endpoint_returns_nested_structure() {
    let mut github = mockito::Server::new_async().await;
    github
        .mock("GET", "/repos/acme/tools")
        .with_status(200)
        .with_body(r#"{"default_branch": "main"}"#)
        .create_async()
        .await;
    github
        .mock("GET", "/repos/acme/tools/git/trees/main?recursive=1")
        .with_status(200)
        .with_body(
            r#"{"tree": [
                {"path": "skills", "type": "tree", "sha": "s0"},
                {"path": "skills/my-skill", "type": "tree", "sha": "s1"},
                {"path": "skills/my-skill/SKILL.md", "type": "blob", "sha": "s2", "size": 10}
            ], "truncated": false}"#,
        )
        .create_async()
        .await;
    let (addr, _store) = start_server(&github.url()).await;

    let tree: serde_json::Value =
        reqwest::get(format!("http://{addr}/api/repos/acme/tools/tree?path=skills"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
    assert_eq!(tree["name"], "skills");
    assert_eq!(tree["type"], "dir");
    assert_eq!(tree["children"][0]["name"], "my-skill");
    assert_eq!(tree["children"][0]["children"][0]["name"], "SKILL.md");
}

#[tokio::test(flavor = "multi_thread")]
async fn download_streams_a_gzipped_tarball() {
    let mut github = mockito::Server::new_async().await;
    github
        .mock("GET", "/repos/acme/tools")
        .with_status(200)
        .with_body(r#"{"default_branch": "main"}"#)
        .create_async()
        .await;
    github
        .mock("GET", "/repos/acme/tools/git/trees/main?recursive=1")
        .with_status(200)
        .with_body(
            r#"{"tree": [
                {"path": "skills/my-skill/SKILL.md", "type": "blob", "sha": "b1", "size": 5}
            ], "truncated": false}"#,
        )
        .create_async()
        .await;
    github
        .mock("GET", "/repos/acme/tools/git/blobs/b1")
        .with_status(200)
        .with_body(format!(
            r#"{{"content": "{}", "encoding": "base64"}}"#,
            STANDARD.encode("hello")
        ))
        .create_async()
        .await;
    let (addr, _store) = start_server(&github.url()).await;

    let resp = reqwest::get(format!(
        "http://{addr}/api/skills/download/acme/tools/my-skill"
    ))
    .await
    .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.headers()
            .get("content-disposition")
            .unwrap()
            .to_str()
            .unwrap(),
        "attachment; filename=\"my-skill.tar.gz\""
    );
    assert_eq!(
        resp.headers().get("content-type").unwrap().to_str().unwrap(),
        "application/gzip"
    );

    let bytes = resp.bytes().await.unwrap();
    let decoder = flate2::read::GzDecoder::new(&bytes[..]);
    let mut archive = tar::Archive::new(decoder);
    let mut entries = archive.entries().unwrap();
    let mut first = entries.next().unwrap().unwrap();
    assert_eq!(first.path().unwrap().to_str(), Some("SKILL.md"));
    let mut contents = String::new();
    first.read_to_string(&mut contents).unwrap();
    assert_eq!(contents, "hello");
}

#[tokio::test(flavor = "multi_thread")]
async fn download_of_unknown_skill_is_not_found() {
    let mut github = mockito::Server::new_async().await;
    github
        .mock("GET", "/repos/acme/tools")
        .with_status(200)
        .with_body(r#"{"default_branch": "main"}"#)
        .create_async()
        .await;
    github
        .mock("GET", "/repos/acme/tools/git/trees/main?recursive=1")
        .with_status(200)
        .with_body(r#"{"tree": [], "truncated": false}"#)
        .create_async()
        .await;
    let (addr, _store) = start_server(&github.url()).await;

    let resp = reqwest::get(format!(
        "http://{addr}/api/skills/download/acme/tools/nope"
    ))
    .await
    .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test(flavor = "multi_thread")]
async fn backfill_fills_missing_metadata() {
    let mut github = mockito::Server::new_async().await;
    github
        .mock("GET", "/repos/acme/tools")
        .with_status(200)
        .with_body(r#"{"default_branch": "main"}"#)
        .create_async()
        .await;
    github
        .mock("GET", "/repos/acme/tools/git/trees/main?recursive=1")
        .with_status(200)
        .with_body(
            r#"{"tree": [
                {"path": "skills/bare/SKILL.md", "type": "blob", "sha": "bb1", "size": 32}
            ], "truncated": false}"#,
        )
        .create_async()
        .await;
    github
        .mock("GET", "/repos/acme/tools/git/blobs/bb1")
        .with_status(200)
        .with_body(format!(
            r#"{{"content": "{}", "encoding": "base64"}}"#,
            STANDARD.encode("---\nname: Bare\ndescription: No metadata\n---\n")
        ))
        .create_async()
        .await;
    let (addr, store) = start_server(&github.url()).await;

    let client = reqwest::Client::new();
    client
        .post(format!("http://{addr}/api/repos"))
        .json(&serde_json::json!({ "repo": "acme/tools" }))
        .send()
        .await
        .unwrap();

    let resp = client
        .post(format!("http://{addr}/api/backfill-metadata"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let report: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(report["stats"]["total"], 1);
    assert_eq!(report["stats"]["success"], 1);

    let skills = store.list_skills().await.unwrap();
    assert_eq!(skills[0].category.as_deref(), Some("Generated"));
    assert_eq!(skills[0].tags, vec!["generated"]);
}
