// Configuration loading and parsing (squad.toml).

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use squadbuild_core::{Category, RawConstraints};
use tracing::info;

const CONFIG_FILE: &str = "squad.toml";
const STAGING_FILE: &str = ".squad.toml.partial";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// squad.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire squad.toml file.
#[derive(Debug, Clone, Deserialize)]
struct SquadFile {
    squad: SquadConfig,
    data: DataPaths,
    #[serde(default)]
    output: OutputConfig,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub squad: SquadConfig,
    pub data: DataPaths,
    pub output: OutputConfig,
}

/// Default selection rules, used for anything a request leaves out.
#[derive(Debug, Clone, Deserialize)]
pub struct SquadConfig {
    pub budget: f64,
    /// Category name -> required count, e.g. `{"DEF": 5, "MID": 5, ...}`.
    pub quotas: BTreeMap<String, i64>,
}

impl SquadConfig {
    pub fn constraints(&self) -> RawConstraints {
        RawConstraints {
            quotas: self.quotas.clone(),
            budget: self.budget,
            must_include: Vec::new(),
            must_exclude: Vec::new(),
        }
    }

    pub fn quota(&self, category: Category) -> Option<i64> {
        self.quotas
            .iter()
            .find(|(k, _)| Category::from_str_pos(k) == Some(category))
            .map(|(_, &v)| v)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataPaths {
    pub predictions: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub pretty: bool,
    /// How many top candidates to list per category. Defaults to the quota.
    #[serde(default)]
    pub top_per_category: Option<usize>,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate `config/squad.toml` relative to `base_dir`.
///
/// This is the lower-level loading primitive that does not auto-copy defaults.
/// Prefer `load_config()` which handles default initialization automatically.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join(CONFIG_FILE);
    let text = read_file(&path)?;
    let file: SquadFile = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        source: e,
    })?;

    let config = Config {
        squad: file.squad,
        data: file.data,
        output: file.output,
    };

    validate(&config)?;

    Ok(config)
}

/// Seed `config/squad.toml` from `defaults/squad.toml` on first run.
///
/// Returns the path written, or `None` when a config file already exists
/// (it is never overwritten). The copy is staged in a side file and renamed
/// into place, so a failed write never leaves a truncated `squad.toml`.
pub fn ensure_config_file(base_dir: &Path) -> Result<Option<PathBuf>, ConfigError> {
    let target = base_dir.join("config").join(CONFIG_FILE);
    if target.exists() {
        return Ok(None);
    }

    let source = base_dir.join("defaults").join(CONFIG_FILE);
    let content = std::fs::read(&source).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!(
            "no {} and cannot read {}: {e}",
            target.display(),
            source.display()
        ),
    })?;

    let config_dir = base_dir.join("config");
    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create {}: {e}", config_dir.display()),
    })?;

    let staging = config_dir.join(STAGING_FILE);
    if let Err(e) = std::fs::write(&staging, &content) {
        let _ = std::fs::remove_file(&staging);
        return Err(ConfigError::DefaultsCopyError {
            message: format!("failed to write {}: {e}", staging.display()),
        });
    }
    std::fs::rename(&staging, &target).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to move {} into place: {e}", staging.display()),
    })?;

    info!("seeded {} from {}", target.display(), source.display());
    Ok(Some(target))
}

/// Seed the config from defaults if needed, then load it relative to
/// `base_dir`.
pub fn load_config(base_dir: &Path) -> Result<Config, ConfigError> {
    ensure_config_file(base_dir)?;
    load_config_from(base_dir)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    let budget = config.squad.budget;
    if !budget.is_finite() || budget < 0.0 {
        return Err(ConfigError::ValidationError {
            field: "squad.budget".into(),
            message: format!("must be a non-negative number, got {budget}"),
        });
    }

    let mut seen = std::collections::BTreeSet::new();
    for (name, &count) in &config.squad.quotas {
        let Some(category) = Category::from_str_pos(name) else {
            return Err(ConfigError::ValidationError {
                field: format!("squad.quotas.{name}"),
                message: "unknown category".into(),
            });
        };
        if !seen.insert(category) {
            return Err(ConfigError::ValidationError {
                field: format!("squad.quotas.{name}"),
                message: format!("{category} quota given more than once"),
            });
        }
        if count < 0 {
            return Err(ConfigError::ValidationError {
                field: format!("squad.quotas.{name}"),
                message: format!("must be >= 0, got {count}"),
            });
        }
    }

    let total = config
        .squad
        .quotas
        .values()
        .fold(0i64, |acc, &n| acc.saturating_add(n));
    if total == 0 {
        return Err(ConfigError::ValidationError {
            field: "squad.quotas".into(),
            message: "total quota must be greater than 0".into(),
        });
    }

    if config.data.predictions.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "data.predictions".into(),
            message: "must not be empty".into(),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
