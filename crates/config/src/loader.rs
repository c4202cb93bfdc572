use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::schema::SkilleryConfig;

/// Standard config file name, checked project-local then user-global.
const CONFIG_FILENAME: &str = "skillery.toml";

/// Load config from the given path.
pub fn load_config(path: &Path) -> anyhow::Result<SkilleryConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    Ok(toml::from_str(&raw)?)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./skillery.toml` (project-local)
/// 2. `~/.config/skillery/skillery.toml` (user-global)
///
/// Returns `SkilleryConfig::default()` if no config file is found.
pub fn discover_and_load() -> SkilleryConfig {
    if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(cfg) => return cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            },
        }
    } else {
        debug!("no config file found, using defaults");
    }
    SkilleryConfig::default()
}

/// Overlay process environment on top of a loaded config.
///
/// Environment always wins over file values.
pub fn apply_env_overrides(cfg: &mut SkilleryConfig) {
    if let Ok(token) = std::env::var("GITHUB_TOKEN")
        && !token.is_empty()
    {
        cfg.github.token = Some(token);
    }
    if let Ok(key) = std::env::var("OPENAI_API_KEY")
        && !key.is_empty()
    {
        cfg.openai.api_key = Some(key);
    }
    if let Ok(model) = std::env::var("OPENAI_MODEL")
        && !model.is_empty()
    {
        cfg.openai.model = model;
    }
    if let Ok(bind) = std::env::var("SKILLERY_BIND")
        && !bind.is_empty()
    {
        cfg.server.bind = bind;
    }
    if let Ok(port) = std::env::var("SKILLERY_PORT")
        && let Ok(port) = port.parse()
    {
        cfg.server.port = port;
    }
    if let Ok(db) = std::env::var("SKILLERY_DB")
        && !db.is_empty()
    {
        cfg.database.path = Some(PathBuf::from(db));
    }
}

fn find_config_file() -> Option<PathBuf> {
    // Project-local
    let local = PathBuf::from(CONFIG_FILENAME);
    if local.exists() {
        return Some(local);
    }

    // User-global: ~/.config/skillery/
    if let Some(dirs) = directories::ProjectDirs::from("", "", "skillery") {
        let p = dirs.config_dir().join(CONFIG_FILENAME);
        if p.exists() {
            return Some(p);
        }
    }

    None
}

/// Returns the user-global config directory (`~/.config/skillery/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "skillery").map(|d| d.config_dir().to_path_buf())
}

/// Returns the user-global data directory, where the catalog database lives
/// by default.
pub fn data_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "skillery").map(|d| d.data_dir().to_path_buf())
}

/// Resolve the database path: explicit config value, else the default file
/// under the data dir, else a file in the working directory.
pub fn database_path(cfg: &SkilleryConfig) -> PathBuf {
    if let Some(path) = &cfg.database.path {
        return path.clone();
    }
    data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("skillery.db")
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_config_parses_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("skillery.toml");
        std::fs::write(&path, "[server]\nport = 7777\n").unwrap();

        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.server.port, 7777);
    }

    #[test]
    fn load_config_rejects_bad_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("skillery.toml");
        std::fs::write(&path, "[server\n").unwrap();

        assert!(load_config(&path).is_err());
    }

    #[test]
    fn explicit_database_path_wins() {
        let mut cfg = SkilleryConfig::default();
        cfg.database.path = Some(PathBuf::from("/tmp/custom.db"));
        assert_eq!(database_path(&cfg), PathBuf::from("/tmp/custom.db"));
    }

    #[test]
    fn default_database_path_is_in_data_dir() {
        let cfg = SkilleryConfig::default();
        let path = database_path(&cfg);
        assert_eq!(path.file_name().and_then(|n| n.to_str()), Some("skillery.db"));
    }
}
