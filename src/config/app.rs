// src/config/app.rs
use serde::Deserialize;
use std::{env, fs, path::PathBuf};

// --- env defaults & names ---
pub const DEFAULT_CONFIG_PATH: &str = "config/app.toml";
pub const DEFAULT_MODEL_PATH: &str = "artifacts/heart_model.json";
pub const DEFAULT_SCALER_PATH: &str = "artifacts/scaler.json";

pub const ENV_CONFIG_PATH: &str = "HEART_CONFIG_PATH";
pub const ENV_MODEL_PATH: &str = "HEART_MODEL_PATH";
pub const ENV_SCALER_PATH: &str = "HEART_SCALER_PATH";
pub const ENV_LOG_FORMAT: &str = "HEART_LOG_FORMAT";

/// Where the service finds its artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub model_path: PathBuf,
    pub scaler_path: PathBuf,
}

/* ----------------------------
Config schema (from TOML)
---------------------------- */

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    #[serde(default)]
    artifacts: ArtifactsSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ArtifactsSection {
    model_path: Option<PathBuf>,
    scaler_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            scaler_path: PathBuf::from(DEFAULT_SCALER_PATH),
        }
    }
}

impl AppConfig {
    /// Defaults → TOML file → environment overrides.
    ///
    /// The TOML path comes from `HEART_CONFIG_PATH` or falls back to
    /// `config/app.toml`. A missing fallback file is fine; a missing file that
    /// was asked for explicitly is an error.
    pub fn load() -> anyhow::Result<Self> {
        let explicit = env::var(ENV_CONFIG_PATH).ok().filter(|s| !s.trim().is_empty());
        let path = explicit
            .as_deref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

        let mut cfg = match fs::read_to_string(&path) {
            Ok(content) => Self::from_toml_str(&content).map_err(|e| {
                anyhow::anyhow!("Failed to parse config at {}: {}", path.display(), e)
            })?,
            Err(e) if explicit.is_none() && e.kind() == std::io::ErrorKind::NotFound => {
                Self::default()
            }
            Err(e) => anyhow::bail!("Failed to read config at {}: {}", path.display(), e),
        };

        if let Some(p) = env_path(ENV_MODEL_PATH) {
            cfg.model_path = p;
        }
        if let Some(p) = env_path(ENV_SCALER_PATH) {
            cfg.scaler_path = p;
        }

        Ok(cfg)
    }

    /// Parse a TOML document; absent keys keep their defaults.
    pub fn from_toml_str(toml_str: &str) -> anyhow::Result<Self> {
        let file: FileConfig = toml::from_str(toml_str)?;
        let mut cfg = Self::default();
        if let Some(p) = file.artifacts.model_path {
            cfg.model_path = p;
        }
        if let Some(p) = file.artifacts.scaler_path {
            cfg.scaler_path = p;
        }
        Ok(cfg)
    }
}

fn env_path(name: &str) -> Option<PathBuf> {
    env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
}

/// `HEART_LOG_FORMAT=json` switches the log layer to JSON lines.
pub fn json_logs_requested() -> bool {
    env::var(ENV_LOG_FORMAT)
        .map(|v| v.trim().eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}
