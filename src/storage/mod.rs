//! # Storage Layer
//!
//! Filesystem access for marksync: the note vault, the companion app's
//! settings file, and marksync's own configuration.
//!
//! ## Formats
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Notes | Markdown + YAML frontmatter | `<vault>/**/*.md` |
//! | Status settings | JSON (written by the companion app) | `<vault>/.tasknotes/settings.json` |
//! | Vault config | TOML | `<vault>/.marksync.toml` |
//! | Global config | TOML | `~/.config/marksync/config.toml` |
//!
//! ## Write Safety
//!
//! Note rewrites touch only the frontmatter block: field order and the
//! body are preserved. All writes are atomic (temp file + rename).
//!
//! ## Key Types
//!
//! - [`MarkdownVault`] - Read/write notes under a vault root
//! - [`JsonSettingsSource`] - Load the status vocabulary settings
//! - [`Config`] - Vault and global configuration

mod config;
mod settings_file;
mod vault;

pub use config::{Config, ConfigError, GlobalConfig, VaultConfig, WatchConfig, VAULT_CONFIG_FILE};
pub use settings_file::JsonSettingsSource;
pub use vault::{MarkdownVault, VaultError};
