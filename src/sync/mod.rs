//! Reconciliation orchestration
//!
//! The coordinator plus the ports it drives. Storage implements the ports;
//! the CLI owns one coordinator per run.

mod coordinator;
mod observed;
mod source;

pub use coordinator::{Coordinator, SyncError, SyncOutcome, SyncReport};
pub use observed::Observations;
pub use source::{FieldWrite, NoteSink, NoteSource, SettingsSource};
