//! Domain models for marksync
//!
//! Contains the reconciliation logic without any I/O concerns.

mod normalize;
mod note;
mod reconcile;
mod settings;
mod table;

pub use normalize::{normalize_completed, normalize_status};
pub use note::{Frontmatter, NoteKey};
pub use reconcile::{reconcile, Observation, Resolution};
pub use settings::{
    settings_signature, FieldMapping, SettingsSnapshot, StatusDefinition, UserField,
};
pub use table::StatusTable;
