//! Configuration loading.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use proctor_core::session::SessionConfig;

/// Top-level proctor configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProctorConfig {
    /// Where sessions, drafts, submissions and results are stored.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Directory of TOML evaluation definitions.
    #[serde(default = "default_evaluations_dir")]
    pub evaluations_dir: PathBuf,
    /// Attachment directory; defaults to `<data_dir>/attachments`.
    #[serde(default)]
    pub attachments_dir: Option<PathBuf>,
    /// Expire sessions idle for longer than this.
    #[serde(default)]
    pub idle_timeout_minutes: Option<u32>,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./proctor-data")
}
fn default_evaluations_dir() -> PathBuf {
    PathBuf::from("./evaluations")
}

impl Default for ProctorConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            evaluations_dir: default_evaluations_dir(),
            attachments_dir: None,
            idle_timeout_minutes: None,
        }
    }
}

impl ProctorConfig {
    pub fn attachments_dir(&self) -> PathBuf {
        self.attachments_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("attachments"))
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            idle_timeout_minutes: self.idle_timeout_minutes,
        }
    }

    fn resolve_paths(&mut self) {
        self.data_dir = resolve_path(&self.data_dir);
        self.evaluations_dir = resolve_path(&self.evaluations_dir);
        self.attachments_dir = self.attachments_dir.as_deref().map(resolve_path);
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
///
/// Substituted values are not scanned again.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    let mut cursor = 0;
    while let Some(offset) = result[cursor..].find("${") {
        let start = cursor + offset;
        let Some(end) = result[start..].find('}') else {
            break;
        };
        let var_name = &result[start + 2..start + end];
        let value = std::env::var(var_name).unwrap_or_default();
        result = format!(
            "{}{}{}",
            &result[..start],
            value,
            &result[start + end + 1..]
        );
        cursor = start + value.len();
    }
    result
}

fn resolve_path(path: &Path) -> PathBuf {
    PathBuf::from(resolve_env_vars(&path.to_string_lossy()))
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `proctor.toml` in the current directory
/// 2. `~/.config/proctor/config.toml`
///
/// Environment variable override: `PROCTOR_DATA_DIR`.
pub fn load_config() -> Result<ProctorConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<ProctorConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("proctor.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<ProctorConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => ProctorConfig::default(),
    };

    if let Ok(dir) = std::env::var("PROCTOR_DATA_DIR") {
        config.data_dir = PathBuf::from(dir);
    }

    config.resolve_paths();
    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("proctor"))
}
