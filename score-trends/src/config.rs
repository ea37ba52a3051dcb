use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::TrendError;

/// Config file read when `--config-file` is not given. It may be absent.
pub const DEFAULT_CONFIG_PATH: &str = "./config/score-trends.toml";

/// Defaults for a report, overridden by the matching command line flags.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TrendsConfig {
    /// Snapshot to load when `--snapshot` is not given.
    #[serde(default)]
    pub snapshot: Option<PathBuf>,
    /// Run ids to select, in comparison order (target first, then base).
    #[serde(default)]
    pub runs: Vec<String>,
    /// Tags to restrict the report to. Empty means every tag.
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Loads the report config.
///
/// With `path` set, the file must exist. Otherwise [`DEFAULT_CONFIG_PATH`] is
/// read if present and an empty config is used if not.
#[instrument]
pub fn load_config(path: Option<&Path>) -> Result<TrendsConfig, TrendError> {
    let (path, explicit) = match path {
        Some(path) => (path, true),
        None => (Path::new(DEFAULT_CONFIG_PATH), false),
    };
    if !explicit && !path.exists() {
        debug!("No config file found; using defaults");
        return Ok(TrendsConfig::default());
    }
    let contents = std::fs::read_to_string(path).map_err(|source| TrendError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| TrendError::Toml {
        path: path.to_path_buf(),
        source,
    })
}
