//! Resolved status vocabulary
//!
//! A `StatusTable` is the settings snapshot cooked down to what
//! reconciliation needs: the two frontmatter field names, an ordered
//! token -> completed mapping, and the fallback tokens written when only
//! the boolean side of a note is trustworthy.

use super::settings::{SettingsSnapshot, UserField};

/// Built-in vocabulary used when the settings declare no statuses
const DEFAULT_STATUSES: &[(&str, bool)] = &[
    ("open", false),
    ("in-progress", false),
    ("blocked", false),
    ("todo", false),
    ("waiting", false),
    ("done", true),
    ("completed", true),
    ("complete", true),
];

/// Tokens that must resolve the same way in every vocabulary, so a sparse
/// custom list cannot flip the meaning of a common word
const CANONICAL_STATUSES: &[(&str, bool)] = &[
    ("done", true),
    ("completed", true),
    ("complete", true),
    ("open", false),
    ("in-progress", false),
    ("blocked", false),
    ("todo", false),
];

/// Status vocabulary resolved from a settings snapshot
///
/// Tokens are lowercase and trimmed; entry order is registration order,
/// which decides the fallback defaults below. Building is total: absent or
/// partial settings produce the built-in table.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusTable {
    status_field: String,
    completed_field: String,
    entries: Vec<(String, bool)>,
    default_open: String,
    default_done: String,
}

impl StatusTable {
    /// Resolves the table from a settings snapshot
    ///
    /// Custom statuses replace the built-in list entirely when any are
    /// configured. The canonical tokens are re-registered afterwards, so a
    /// custom redefinition keeps its position in the table but not its
    /// meaning.
    pub fn from_settings(settings: Option<&SettingsSnapshot>) -> Self {
        let status_field = settings
            .and_then(|s| s.field_mapping.as_ref())
            .and_then(|m| m.status.as_deref())
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .unwrap_or("status")
            .to_string();

        let mut entries: Vec<(String, bool)> = Vec::new();

        let custom = settings
            .and_then(|s| s.custom_statuses.as_deref())
            .filter(|defs| !defs.is_empty());
        match custom {
            Some(defs) => {
                for def in defs {
                    if let Some(value) = def.value.as_deref() {
                        register(&mut entries, value, def.is_completed.unwrap_or(false));
                    }
                }
            }
            None => {
                for (value, completed) in DEFAULT_STATUSES {
                    register(&mut entries, value, *completed);
                }
            }
        }

        for (value, completed) in CANONICAL_STATUSES {
            register(&mut entries, value, *completed);
        }

        // The configured default survives even when the table does not know
        // it; an unknown default can never be written back anyway.
        let default_open = settings
            .and_then(|s| s.default_task_status.as_deref())
            .map(str::to_lowercase)
            .filter(|s| !s.is_empty())
            .or_else(|| {
                entries
                    .iter()
                    .find(|(token, completed)| !completed && token != "blocked")
                    .map(|(token, _)| token.clone())
            })
            .unwrap_or_else(|| "open".to_string());

        let default_done = entries
            .iter()
            .find(|(token, completed)| *completed && token == "done")
            .or_else(|| entries.iter().find(|(_, completed)| *completed))
            .map(|(token, _)| token.clone())
            .unwrap_or_else(|| "done".to_string());

        let completed_field = resolve_completed_field(settings);

        Self {
            status_field,
            completed_field,
            entries,
            default_open,
            default_done,
        }
    }

    /// Frontmatter key holding the free-text status
    pub fn status_field(&self) -> &str {
        &self.status_field
    }

    /// Frontmatter key holding the boolean completion flag
    pub fn completed_field(&self) -> &str {
        &self.completed_field
    }

    /// Token written when only the boolean says the task is open
    pub fn default_open(&self) -> &str {
        &self.default_open
    }

    /// Token written when only the boolean says the task is done
    pub fn default_done(&self) -> &str {
        &self.default_done
    }

    pub fn contains(&self, token: &str) -> bool {
        self.entries.iter().any(|(t, _)| t == token)
    }

    /// Completion meaning of a token, or None when the token is unknown
    pub fn completion(&self, token: &str) -> Option<bool> {
        self.entries
            .iter()
            .find(|(t, _)| t == token)
            .map(|(_, completed)| *completed)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, bool)> {
        self.entries.iter().map(|(t, c)| (t.as_str(), *c))
    }

    pub fn incomplete_tokens(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|(_, completed)| !completed)
            .map(|(token, _)| token.as_str())
    }

    pub fn completed_tokens(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|(_, completed)| *completed)
            .map(|(token, _)| token.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for StatusTable {
    fn default() -> Self {
        Self::from_settings(None)
    }
}

/// Registers a token, trimmed and lowercased; blank tokens are dropped.
/// Re-registering overwrites the meaning but keeps the original position.
fn register(entries: &mut Vec<(String, bool)>, raw: &str, completed: bool) {
    let token = raw.trim().to_lowercase();
    if token.is_empty() {
        return;
    }
    match entries.iter_mut().find(|(t, _)| *t == token) {
        Some(entry) => entry.1 = completed,
        None => entries.push((token, completed)),
    }
}

fn resolve_completed_field(settings: Option<&SettingsSnapshot>) -> String {
    let fields: &[UserField] = settings
        .and_then(|s| s.user_fields.as_deref())
        .unwrap_or(&[]);

    let direct = fields.iter().find(|f| {
        f.field_type.as_deref() == Some("boolean")
            && f.key
                .as_deref()
                .is_some_and(|k| k.to_lowercase() == "completed")
    });
    if let Some(key) = direct.and_then(|f| f.key.as_deref()) {
        // Configured casing is preserved; frontmatter lookup is exact
        return key.to_string();
    }

    let first_boolean = fields.iter().find(|f| {
        f.field_type.as_deref() == Some("boolean")
            && f.key.as_deref().is_some_and(|k| !k.is_empty())
    });
    if let Some(key) = first_boolean.and_then(|f| f.key.as_deref()) {
        return key.to_string();
    }

    "completed".to_string()
}
