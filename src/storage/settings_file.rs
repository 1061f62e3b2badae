//! Status settings loading
//!
//! Reads the task plugin's settings JSON from the vault. A missing,
//! unreadable, or malformed file is not an error: the reconciler then runs
//! on the built-in status set.

use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::SettingsSnapshot;
use crate::sync::SettingsSource;

pub struct JsonSettingsSource {
    path: PathBuf,
}

impl JsonSettingsSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }
}

impl SettingsSource for JsonSettingsSource {
    fn load(&self) -> Option<SettingsSnapshot> {
        let content = fs::read_to_string(&self.path).ok()?;
        serde_json::from_str(&content).ok()
    }
}
