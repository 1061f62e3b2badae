//! Last-seen observations per note
//!
//! Observations tell "the flag flipped" apart from "we never looked".
//! The store is purely in-memory and never persisted; a fresh process
//! treats every note as seen for the first time.

use std::collections::HashMap;

use crate::domain::{NoteKey, Observation};

/// Map of note key to the observation its last reconciliation recorded
#[derive(Debug, Default)]
pub struct Observations {
    seen: HashMap<NoteKey, Observation>,
}

impl Observations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &NoteKey) -> Option<&Observation> {
        self.seen.get(key)
    }

    /// Records the observation a reconciliation produced, replacing any
    /// previous one for the note
    pub fn record(&mut self, key: NoteKey, observation: Observation) {
        self.seen.insert(key, observation);
    }

    /// Drops the observation for a note that no longer carries either field
    pub fn forget(&mut self, key: &NoteKey) {
        self.seen.remove(key);
    }

    /// Drops everything; the configuration the observations were made under
    /// is gone
    pub fn clear(&mut self) {
        self.seen.clear();
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
