//! Configuration discovery and schema.
//!
//! Config file: `skillery.toml`, searched in `./` then `~/.config/skillery/`.
//! Environment variables override file values.

pub mod loader;
pub mod schema;

pub use {
    loader::{
        apply_env_overrides, config_dir, data_dir, database_path, discover_and_load, load_config,
    },
    schema::{DatabaseConfig, GithubConfig, OpenAiConfig, ServerConfig, SkilleryConfig},
};
