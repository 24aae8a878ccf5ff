//! Configuration loading from TOML files.
//!
//! Lookup order:
//! 1. `$CATALOG_CONFIG` environment variable
//! 2. `~/.config/catalog/config.toml`
//! 3. Built-in defaults (everything is optional)

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use catalog_core::ImportPolicy;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
    pub import: ImportConfig,
    pub tags: TagsConfig,
}

/// State file settings.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// State file path. Default: platform-specific data dir.
    pub path: Option<String>,
}

/// CSV import settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// `abort` or `skip`.
    pub on_error: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TagsConfig {
    /// Upper-case tags entered on the command line.
    pub uppercase: bool,
}

// --- Defaults ---

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            on_error: "abort".into(),
        }
    }
}

impl Default for TagsConfig {
    fn default() -> Self {
        Self { uppercase: true }
    }
}

impl ImportConfig {
    pub fn policy(&self) -> Result<ImportPolicy> {
        match self.on_error.to_lowercase().as_str() {
            "abort" => Ok(ImportPolicy::Abort),
            "skip" => Ok(ImportPolicy::Skip),
            other => bail!("invalid import.on_error: {other} (expected abort or skip)"),
        }
    }
}

/// Load the active config file, or defaults when there is none. An invalid
/// `import.on_error` is reported here rather than at import time.
pub fn load_config() -> Result<Config> {
    match config_path() {
        Some(path) => load_config_from(&path),
        None => Ok(Config::default()),
    }
}

fn load_config_from(path: &Path) -> Result<Config> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Config::default()),
        Err(e) => return Err(e).with_context(|| format!("reading {}", path.display())),
    };
    let config: Config =
        toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
    config.import.policy()?;
    Ok(config)
}

/// `$CATALOG_CONFIG`, else `~/.config/catalog/config.toml`.
fn config_path() -> Option<PathBuf> {
    match std::env::var_os("CATALOG_CONFIG") {
        Some(p) => Some(PathBuf::from(p)),
        None => directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(".config/catalog/config.toml")),
    }
}

/// One line describing where config comes from, for `catalog config`.
pub fn describe_config_source() -> String {
    let Some(path) = config_path() else {
        return "defaults (no home directory)".into();
    };
    let state = if path.is_file() { "loaded" } else { "missing, defaults" };
    format!("{} ({state})", path.display())
}
