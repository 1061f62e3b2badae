//! Note identity and metadata block types
//!
//! A note is addressed by its vault-relative path (`NoteKey`) and carries an
//! ordered set of frontmatter fields (`Frontmatter`). Field order matters:
//! rewriting a note must not shuffle keys the user laid out by hand.

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::fmt;

/// Vault-relative path of a note, with `/` separators on every platform
///
/// Keys are plain strings so they can index maps and appear in reports
/// without touching the filesystem.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NoteKey(String);

impl NoteKey {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NoteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NoteKey {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

/// The parsed frontmatter of a note: an insertion-ordered field map
///
/// Wraps a YAML mapping and exposes exact-match lookup by string key.
/// `set` updates a field in place when it exists, so unrelated keys keep
/// their positions across a rewrite.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frontmatter {
    fields: Mapping,
}

impl Frontmatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_mapping(fields: Mapping) -> Self {
        Self { fields }
    }

    /// Returns the value of the named field, if present
    ///
    /// Lookup is exact and case-sensitive: frontmatter keys are whatever the
    /// user typed, and `Status:` is a different field than `status:`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(k, _)| k.as_str() == Some(name))
            .map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Sets a field, replacing the value in place when the key exists and
    /// appending at the end when it does not
    pub fn set(&mut self, name: &str, value: Value) {
        for (k, v) in self.fields.iter_mut() {
            if k.as_str() == Some(name) {
                *v = value;
                return;
            }
        }
        self.fields.insert(Value::String(name.to_string()), value);
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn as_mapping(&self) -> &Mapping {
        &self.fields
    }
}
