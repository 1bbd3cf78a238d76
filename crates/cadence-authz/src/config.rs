// config.rs - Where the access-control core keeps its state.
//
// Defaults live under `<project>/.cadence/`. An optional
// `.cadence/authz.toml` overrides them:
//
//   backend = "sqlite"          # or "memory"
//   database_path = "authz.db"  # relative paths resolve against the project root

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::AuthzError;

/// Name of the per-project state directory.
pub const STATE_DIR: &str = ".cadence";

/// Name of the optional config file inside [`STATE_DIR`].
pub const CONFIG_FILE: &str = "authz.toml";

/// Which storage backend holds the relations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    #[default]
    Sqlite,
    Memory,
}

/// Configuration for the access-control core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthzConfig {
    pub backend: StoreBackend,
    pub database_path: PathBuf,
}

/// Overrides as they appear in the TOML file. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    backend: Option<StoreBackend>,
    database_path: Option<PathBuf>,
}

impl AuthzConfig {
    /// Standard `.cadence/` layout for a project.
    pub fn for_project(project_root: impl AsRef<Path>) -> Self {
        let state_dir = project_root.as_ref().join(STATE_DIR);
        Self {
            backend: StoreBackend::default(),
            database_path: state_dir.join("authz.db"),
        }
    }

    /// Path of the optional config file for a project.
    pub fn config_path(project_root: impl AsRef<Path>) -> PathBuf {
        project_root.as_ref().join(STATE_DIR).join(CONFIG_FILE)
    }

    /// Project defaults overlaid with `.cadence/authz.toml` if it exists.
    pub fn load(project_root: impl AsRef<Path>) -> Result<Self, AuthzError> {
        let root = project_root.as_ref();
        let mut config = Self::for_project(root);
        let path = Self::config_path(root);
        if !path.exists() {
            return Ok(config);
        }

        let content = fs::read_to_string(&path).map_err(|e| AuthzError::Config {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        let file: ConfigFile = toml::from_str(&content).map_err(|e| AuthzError::Config {
            path: path.clone(),
            reason: e.to_string(),
        })?;

        if let Some(backend) = file.backend {
            config.backend = backend;
        }
        if let Some(db) = file.database_path {
            config.database_path = if db.is_absolute() { db } else { root.join(db) };
        }
        tracing::debug!(
            path = %path.display(),
            backend = ?config.backend,
            "loaded authorization config"
        );
        Ok(config)
    }
}
