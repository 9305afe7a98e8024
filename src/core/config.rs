//! core::config
//!
//! Manifest configuration for module synchronization.
//!
//! # Design
//!
//! A `modsync.toml` manifest lists the module repositories to keep in sync.
//! Everything that can be rejected early is rejected at load time: unknown
//! strategies fail deserialization, and structural problems (missing URL for a
//! git-managed module, duplicate paths) fail validation before any sync runs.
//!
//! # Example manifest
//!
//! ```toml
//! [[module]]
//! name = "shop"
//! path = "/var/modules/shop"
//! url = "https://example.com/modules/shop.git"
//! constraint = "^1.2"
//! strategy = "default"
//!
//! [[module]]
//! name = "theme-assets"
//! path = "/var/modules/theme-assets"
//! strategy = "no-git"
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::types::{Constraint, Strategy};

/// Errors from manifest loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Manifest file could not be read.
    #[error("unable to read manifest {path}: {source}")]
    Io {
        /// The manifest path
        path: PathBuf,
        /// The underlying io error
        source: std::io::Error,
    },

    /// Manifest is not valid TOML or contains an unknown strategy.
    #[error("invalid manifest: {0}")]
    Parse(#[from] toml::de::Error),

    /// Manifest parsed but violates a structural rule.
    #[error("invalid manifest: {0}")]
    Invalid(String),
}

/// One module repository to synchronize.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleSpec {
    /// Module name, used in log output and reports.
    pub name: String,

    /// Local working-copy path. Existence implies "cloned".
    pub path: PathBuf,

    /// Remote origin URL. May be empty only for `no-git` modules.
    #[serde(default)]
    pub url: String,

    /// Version range or `dev-` branch selector. Empty keeps the current checkout.
    #[serde(default)]
    pub constraint: Constraint,

    /// Update policy for this module.
    #[serde(default)]
    pub strategy: Strategy,

    /// Refuse to sync when the working copy has uncommitted changes.
    #[serde(default = "default_true")]
    pub must_be_clean: bool,

    /// Permit pulls from the remote during update.
    #[serde(default = "default_true")]
    pub allow_remote_integration: bool,
}

fn default_true() -> bool {
    true
}

impl ModuleSpec {
    /// Create a spec with defaults for the optional policy fields.
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            url: url.into(),
            constraint: Constraint::default(),
            strategy: Strategy::default(),
            must_be_clean: true,
            allow_remote_integration: true,
        }
    }
}

/// The full synchronization manifest.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Configured modules, in sync order.
    #[serde(default, rename = "module")]
    pub modules: Vec<ModuleSpec>,
}

impl SyncConfig {
    /// Load and validate a manifest from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&raw)
    }

    /// Parse and validate a manifest from a TOML string.
    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        let config: SyncConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check structural rules that deserialization cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen_paths = HashSet::new();
        for module in &self.modules {
            if module.name.is_empty() {
                return Err(ConfigError::Invalid("module name cannot be empty".into()));
            }
            if module.path.as_os_str().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "module '{}' has an empty path",
                    module.name
                )));
            }
            if module.url.is_empty() && module.strategy != Strategy::NoGit {
                return Err(ConfigError::Invalid(format!(
                    "module '{}' has no url but strategy '{}' requires one",
                    module.name, module.strategy
                )));
            }
            if !seen_paths.insert(module.path.clone()) {
                return Err(ConfigError::Invalid(format!(
                    "path '{}' is configured more than once",
                    module.path.display()
                )));
            }
        }
        Ok(())
    }
}
