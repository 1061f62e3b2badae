//! Reconciliation of the status field against the completion flag
//!
//! The two fields say the same thing twice, so edits can pull them apart.
//! `reconcile` decides which side to trust: the boolean wins when it moved
//! while the status held still, or when the status cannot be interpreted at
//! all; otherwise the status wins. The decision is pure and writes nothing,
//! it only reports which fields a caller must rewrite.

use serde_yaml::Value;

use super::normalize::{normalize_completed, normalize_status};
use super::table::StatusTable;

/// What reconciliation last saw for a note: the canonical status token and
/// completion flag after the decision, not the raw file values
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Observation {
    pub status: Option<String>,
    pub completed: Option<bool>,
}

/// Outcome of one reconciliation decision
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// Canonical status token after the decision, if any side produced one
    pub status: Option<String>,

    /// Completion flag after the decision, if any side produced one
    pub completed: Option<bool>,

    /// Whether the status field must be rewritten. Only ever true for a
    /// token the table knows; an unknown token is never written back.
    pub write_status: bool,

    /// Whether the completed field must be rewritten
    pub write_completed: bool,

    /// Snapshot to remember for the next decision on this note
    pub observation: Observation,
}

impl Resolution {
    pub fn needs_write(&self) -> bool {
        self.write_status || self.write_completed
    }
}

/// Reconciles one note's raw field values against what was seen before
///
/// # Arguments
///
/// * `raw_status` - value of the configured status field, if present
/// * `raw_completed` - value of the configured completed field, if present
/// * `prior` - the observation recorded by the previous decision, if any
/// * `table` - the resolved status vocabulary
///
/// # Returns
///
/// `None` when the note carries neither field (it is not a task note and
/// any prior observation should be dropped). Otherwise the resolution,
/// including the observation to record. A present-but-uninterpretable
/// completed field still counts as carrying the field.
pub fn reconcile(
    raw_status: Option<&Value>,
    raw_completed: Option<&Value>,
    prior: Option<&Observation>,
    table: &StatusTable,
) -> Option<Resolution> {
    let normalized_status = raw_status.and_then(normalize_status);

    // Completion meaning of the status token. The literal true/false
    // fallback mirrors boolean-typed status values that were stringified.
    let status_completion = normalized_status.as_deref().and_then(|token| {
        table.completion(token).or(match token {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        })
    });

    if normalized_status.is_none() && raw_completed.is_none() {
        return None;
    }

    let normalized_completed = raw_completed.and_then(normalize_completed);

    let status_known = normalized_status
        .as_deref()
        .is_some_and(|token| table.contains(token));
    let boolean_known = normalized_completed.is_some();

    let previous_status = prior.and_then(|p| p.status.as_deref());
    let previous_completed = prior.and_then(|p| p.completed);

    let status_changed = normalized_status.as_deref() != previous_status;
    let completed_changed = normalized_completed != previous_completed;

    let mut final_status = normalized_status.clone();
    let mut final_completed = if status_known && status_completion.is_some() {
        status_completion
    } else {
        normalized_completed
    };

    let boolean_fallback = || {
        if normalized_completed == Some(true) {
            table.default_done().to_string()
        } else {
            table.default_open().to_string()
        }
    };

    if boolean_known && (!status_known || (!status_changed && completed_changed)) {
        // The flag flipped under a steady status, or the status means
        // nothing: trust the flag and move the status to its default token.
        final_status = Some(boolean_fallback());
        final_completed = normalized_completed;
    } else if status_known {
        // The status moved (or only the status is interpretable): trust it
        // and derive the flag from the table.
        final_status = normalized_status.clone();
        final_completed = status_completion;
    } else if boolean_known {
        final_status = Some(boolean_fallback());
        final_completed = normalized_completed;
    }

    let write_status = match final_status.as_deref() {
        Some(token) => normalized_status.as_deref() != Some(token) && table.contains(token),
        None => false,
    };
    let write_completed = final_completed.is_some() && final_completed != normalized_completed;

    let observation = Observation {
        status: final_status.clone().or_else(|| normalized_status.clone()),
        completed: final_completed.or(normalized_completed),
    };

    Some(Resolution {
        status: final_status,
        completed: final_completed,
        write_status,
        write_completed,
        observation,
    })
}
