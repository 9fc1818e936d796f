use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pipeline::fields::CanonicalField;
use crate::pipeline::name_correction::NameRules;
use crate::pipeline::validation::RuleSet;
use crate::pipeline::workflow::WorkflowConfig;

/// Application-level constants
pub const APP_NAME: &str = "pnr-autofill";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

const SETTINGS_FILE: &str = "settings.json";
const FIELD_MAPPING_FILE: &str = "field_mapping.json";

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "pnr_autofill=info,warn"
}

/// Per-user data directory: platform data dir, else home, else the working directory.
pub fn app_data_dir() -> PathBuf {
    dirs::data_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

pub fn settings_path() -> PathBuf {
    settings_path_in(&app_data_dir())
}

/// Operator override for the bundled form mapping.
pub fn field_mapping_path() -> PathBuf {
    field_mapping_path_in(&app_data_dir())
}

pub fn settings_path_in(dir: &Path) -> PathBuf {
    dir.join(SETTINGS_FILE)
}

pub fn field_mapping_path_in(dir: &Path) -> PathBuf {
    dir.join(FIELD_MAPPING_FILE)
}

// ── Error Type ─────────────────────────────────────────────────

/// Unusable mapping or settings. Fatal at startup, before any run.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Field {0} is mapped more than once")]
    DuplicateField(CanonicalField),

    #[error("Field {0} has an empty target descriptor")]
    EmptyTarget(CanonicalField),

    #[error("Field {0} cannot be both read-only and a selection")]
    ConflictingFlags(CanonicalField),

    #[error("Field {0} has no mapping entry")]
    MissingField(CanonicalField),
}

/// Read a JSON config file, distinguishing a missing file from other I/O failures.
pub(crate) fn read_config_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ConfigError::NotFound(path.to_path_buf()),
        _ => ConfigError::Io(e),
    })
}

// ── Settings ───────────────────────────────────────────────────

/// Operator settings. Every section falls back to its defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub workflow: WorkflowConfig,
    pub rules: RuleSet,
    pub names: NameRules,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = read_config_file(path)?;
        let settings: Settings = serde_json::from_str(&raw)?;
        tracing::debug!(path = %path.display(), "Settings loaded");
        Ok(settings)
    }

    /// Like [`Settings::load`], but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::NotFound(_)) => {
                tracing::debug!(path = %path.display(), "No settings file, using defaults");
                Ok(Self::default())
            }
            other => other,
        }
    }
}
