use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SkilleryConfig {
    pub server: ServerConfig,
    pub github: GithubConfig,
    pub openai: OpenAiConfig,
    pub database: DatabaseConfig,
}

/// Gateway server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to. Defaults to "127.0.0.1".
    pub bind: String,
    /// Port to listen on.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: "127.0.0.1".into(), port: 8098 }
    }
}

/// GitHub API access.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
    /// Personal access token. Unauthenticated requests work but hit a much
    /// lower rate limit.
    pub token: Option<String>,
}

/// OpenAI-compatible endpoint used by the metadata backfill.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gpt-4o-mini".into(),
            base_url: "https://api.openai.com/v1".into(),
        }
    }
}

/// Catalog database location.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite file path. Defaults to `skillery.db` under the user data dir.
    pub path: Option<PathBuf>,
}
