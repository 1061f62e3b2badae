//! marksync - Keeps task frontmatter in agreement
//!
//! Task notes carry two redundant metadata fields: a free-text `status` and
//! a boolean `completed`. marksync watches which one the user touched and
//! rewrites the other so both always tell the same story, using the status
//! vocabulary configured in the companion task app.

pub mod cli;
pub mod domain;
pub mod storage;
pub mod sync;

pub use domain::{NoteKey, Observation, SettingsSnapshot, StatusTable};
pub use sync::{Coordinator, SyncOutcome, SyncReport};
