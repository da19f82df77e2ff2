use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Settings from `config.toml`. Missing keys keep their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Commits loaded per refresh.
    pub max_commits: usize,
    /// How often the working tree is checked for changes.
    pub poll_interval_ms: u64,
    /// Compact lanes by reusing freed columns.
    pub reuse_lanes: bool,
    /// Tips to load; empty loads every local branch.
    pub branches: Vec<String>,
    pub dark: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_commits: 1000,
            poll_interval_ms: 2000,
            reuse_lanes: true,
            branches: Vec::new(),
            dark: true,
        }
    }
}

impl Config {
    /// `$CONFIG_DIR/gitlane/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("gitlane").join("config.toml"))
    }

    /// Load `path`, or the default location when `None`. An explicit path
    /// must exist; a missing default file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => match Self::default_path() {
                Some(path) => (path, false),
                None => return Ok(Self::default()),
            },
        };
        if !required && !path.exists() {
            log::debug!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let text = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let config = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.clone(),
            source,
        })?;
        log::info!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(100))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn partial_files_keep_defaults() {
        let config: Config = toml::from_str("max_commits = 250\nbranches = [\"main\"]\n")
            .expect("parse");
        assert_eq!(
            config,
            Config {
                max_commits: 250,
                branches: vec!["main".into()],
                ..Config::default()
            }
        );
    }

    #[test]
    fn explicit_path_must_exist() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("nope.toml");
        let err = Config::load(Some(&missing)).expect_err("missing file");
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn loads_and_rejects_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "dark = false\npoll_interval_ms = 500\n").expect("write");
        let config = Config::load(Some(&path)).expect("load");
        assert!(!config.dark);
        assert_eq!(config.poll_interval(), Duration::from_millis(500));

        fs::write(&path, "max_commits = \"lots\"\n").expect("write");
        let err = Config::load(Some(&path)).expect_err("bad type");
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
