//! Ports the coordinator drives its collaborators through
//!
//! Splitting settings access from note access keeps the coordinator testable
//! with in-memory fakes and keeps reconciliation ignorant of where notes
//! actually live.

use anyhow::Result;
use serde_yaml::Value;

use crate::domain::{Frontmatter, NoteKey, SettingsSnapshot};

/// Live view of the companion app's settings
///
/// Loading is total: an unreadable or malformed settings file means "no
/// settings", which resolves to the built-in vocabulary. The coordinator
/// calls this on every request, so implementations should stay cheap.
pub trait SettingsSource {
    fn load(&self) -> Option<SettingsSnapshot>;
}

/// Read access to note metadata
pub trait NoteSource {
    /// Returns the note's frontmatter, or `None` when the note is missing
    /// or carries no metadata block.
    fn frontmatter(&self, key: &NoteKey) -> Result<Option<Frontmatter>>;
}

/// Write access to note metadata
pub trait NoteSink {
    /// Rewrites exactly the named fields, leaving every other field, their
    /// order, and the note body untouched.
    fn apply_fields(&self, key: &NoteKey, writes: &[FieldWrite]) -> Result<()>;
}

/// One field update for a write-back
#[derive(Debug, Clone, PartialEq)]
pub struct FieldWrite {
    pub name: String,
    pub value: Value,
}

impl FieldWrite {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}
