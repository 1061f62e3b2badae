//! Configuration handling for marksync
//!
//! Configuration is stored in `.marksync.toml` (vault root) and
//! `~/.config/marksync/config.toml` (global).

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name of the per-vault configuration file, also the vault root marker
pub const VAULT_CONFIG_FILE: &str = ".marksync.toml";

/// Settings file read when `settings_path` is not configured
const DEFAULT_SETTINGS_PATH: &str = ".tasknotes/settings.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Configuration for the watch command
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Quiet window in milliseconds before changed notes are reconciled
    pub debounce_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self { debounce_ms: 500 }
    }
}

/// Vault-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct VaultConfig {
    /// Status settings file, relative to the vault root unless absolute
    pub settings_path: Option<PathBuf>,

    /// Watch settings
    pub watch: WatchConfig,
}

/// Global user configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GlobalConfig {
    /// Vault used when no root is given and none is found by walking up
    pub default_vault: Option<PathBuf>,
}

/// Combined configuration (global + vault) and the resolved vault root
#[derive(Debug, Clone)]
pub struct Config {
    pub vault: VaultConfig,
    pub global: GlobalConfig,
    pub root: PathBuf,
}

impl Config {
    /// Resolves the vault root and loads configuration for it
    ///
    /// Root resolution order: the explicit path if given, the nearest
    /// ancestor of the current directory holding `.marksync.toml`, the
    /// global `default_vault`, the current directory. Flag and configured
    /// roots are canonicalized; watch event paths arrive absolute and are
    /// mapped against this root.
    pub fn load(explicit_root: Option<&Path>) -> Result<Self> {
        let global = Self::load_global()?;

        let root = match explicit_root {
            Some(path) => {
                if !path.is_dir() {
                    return Err(ConfigError::Invalid(format!(
                        "Vault root is not a directory: {}",
                        path.display()
                    ))
                    .into());
                }
                path.canonicalize()
                    .with_context(|| format!("Failed to resolve vault root: {}", path.display()))?
            }
            None => match Self::find_vault_root() {
                Some(found) => found,
                None => match &global.default_vault {
                    Some(path) => path.canonicalize().with_context(|| {
                        format!("Failed to resolve default vault: {}", path.display())
                    })?,
                    None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
                },
            },
        };

        let vault = Self::load_vault_config(&root)?;
        Ok(Self {
            vault,
            global,
            root,
        })
    }

    /// Path of the status settings file for this vault
    pub fn settings_path(&self) -> PathBuf {
        match &self.vault.settings_path {
            Some(path) => self.root.join(path),
            None => self.root.join(DEFAULT_SETTINGS_PATH),
        }
    }

    /// Quiet window for the watch command
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.vault.watch.debounce_ms)
    }

    /// Returns the global config directory
    pub fn global_config_dir() -> Option<PathBuf> {
        ProjectDirs::from("dev", "marksync", "marksync").map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Loads global configuration
    fn load_global() -> Result<GlobalConfig> {
        let config_dir = match Self::global_config_dir() {
            Some(dir) => dir,
            None => return Ok(GlobalConfig::default()),
        };

        let config_path = config_dir.join("config.toml");
        if !config_path.exists() {
            return Ok(GlobalConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read global config: {}", config_path.display()))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .context("Failed to parse global config")
    }

    /// Loads vault configuration from a resolved root
    fn load_vault_config(root: &Path) -> Result<VaultConfig> {
        let config_path = root.join(VAULT_CONFIG_FILE);

        if !config_path.exists() {
            return Ok(VaultConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read vault config: {}", config_path.display()))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .context("Failed to parse vault config")
    }

    /// Finds the vault root by looking for `.marksync.toml` up the tree
    pub fn find_vault_root() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;

        loop {
            if current.join(VAULT_CONFIG_FILE).is_file() {
                return Some(current);
            }

            if !current.pop() {
                return None;
            }
        }
    }
}
