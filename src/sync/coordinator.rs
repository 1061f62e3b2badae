//! Per-note reconciliation orchestration
//!
//! The coordinator owns everything reconciliation needs between requests:
//! the resolved status table with its settings signature, the last-seen
//! observations, and the set of notes currently being written. Requests are
//! processed one at a time; a request for a note whose write-back is still
//! in progress is dropped, not queued.

use std::collections::HashSet;

use anyhow::{Context, Result};
use parking_lot::Mutex;
use serde::Serialize;

use super::observed::Observations;
use super::source::{FieldWrite, NoteSink, NoteSource, SettingsSource};
use crate::domain::{reconcile, settings_signature, NoteKey, Observation, StatusTable};

/// Outcome of reconciling one note
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    /// A write for this note was already in progress; the request was dropped
    InFlight,

    /// The note is missing or carries no metadata block
    NoFrontmatter,

    /// Neither tracked field is present; the note is not a task note
    NotTracked,

    /// The fields already agree; nothing was written
    UpToDate,

    /// One or both fields were rewritten, with the values that went out
    Updated {
        status: Option<String>,
        completed: Option<bool>,
    },
}

/// Aggregate result of a batch run
#[derive(Debug, Default, Serialize)]
pub struct SyncReport {
    pub scanned: usize,
    pub updated: usize,
    pub up_to_date: usize,
    pub skipped: usize,
    pub errors: Vec<SyncError>,
}

impl SyncReport {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// A note that failed inside a batch, with the rendered error chain
#[derive(Debug, Serialize)]
pub struct SyncError {
    pub note: NoteKey,
    pub message: String,
}

#[derive(Default)]
struct State {
    /// Signature of the settings the table was built from; `None` until the
    /// first request builds it
    signature: Option<String>,
    table: StatusTable,
    observations: Observations,
    in_flight: HashSet<NoteKey>,
}

/// Drives reconciliation over a settings source and a note store
pub struct Coordinator<C, N> {
    settings: C,
    notes: N,
    state: Mutex<State>,
}

impl<C, N> Coordinator<C, N>
where
    C: SettingsSource,
    N: NoteSource + NoteSink,
{
    pub fn new(settings: C, notes: N) -> Self {
        Self {
            settings,
            notes,
            state: Mutex::new(State::default()),
        }
    }

    /// Reconciles a single note
    ///
    /// Reloads the settings first: a changed configuration signature rebuilds
    /// the status table and drops every recorded observation before this
    /// note is looked at.
    pub fn reconcile_note(&self, key: &NoteKey) -> Result<SyncOutcome> {
        if self.state.lock().in_flight.contains(key) {
            return Ok(SyncOutcome::InFlight);
        }

        let table = self.refresh_table();

        let Some(frontmatter) = self
            .notes
            .frontmatter(key)
            .with_context(|| format!("Failed to read note '{}'", key))?
        else {
            return Ok(SyncOutcome::NoFrontmatter);
        };

        let raw_status = frontmatter.get(table.status_field());
        let raw_completed = frontmatter.get(table.completed_field());
        let prior = self.state.lock().observations.get(key).cloned();

        let Some(resolution) = reconcile(raw_status, raw_completed, prior.as_ref(), &table)
        else {
            self.state.lock().observations.forget(key);
            return Ok(SyncOutcome::NotTracked);
        };

        if !resolution.needs_write() {
            self.state
                .lock()
                .observations
                .record(key.clone(), resolution.observation);
            return Ok(SyncOutcome::UpToDate);
        }

        let mut writes = Vec::new();
        if resolution.write_status {
            if let Some(token) = &resolution.status {
                writes.push(FieldWrite::new(table.status_field(), token.clone()));
            }
        }
        if resolution.write_completed {
            if let Some(flag) = resolution.completed {
                writes.push(FieldWrite::new(table.completed_field(), flag));
            }
        }

        // The note is in flight for exactly the duration of the write-back.
        // The guard releases the marker and records the observation whether
        // the write succeeds or fails: the observation holds what was
        // intended, and the next change is judged against that.
        self.state.lock().in_flight.insert(key.clone());
        let guard = InFlightGuard {
            state: &self.state,
            key,
            observation: Some(resolution.observation.clone()),
        };
        let written = self.notes.apply_fields(key, &writes);
        drop(guard);
        written.with_context(|| format!("Failed to write back '{}'", key))?;

        let status = resolution.write_status.then(|| resolution.status).flatten();
        let completed = resolution
            .write_completed
            .then_some(resolution.completed)
            .flatten();
        Ok(SyncOutcome::Updated { status, completed })
    }

    /// Reconciles every given note in order
    ///
    /// Notes are isolated from each other: a failure lands in the report and
    /// the batch moves on.
    pub fn reconcile_all(&self, keys: &[NoteKey]) -> SyncReport {
        let mut report = SyncReport::default();
        for key in keys {
            report.scanned += 1;
            match self.reconcile_note(key) {
                Ok(SyncOutcome::Updated { .. }) => report.updated += 1,
                Ok(SyncOutcome::UpToDate) => report.up_to_date += 1,
                Ok(_) => report.skipped += 1,
                Err(err) => report.errors.push(SyncError {
                    note: key.clone(),
                    message: format!("{:#}", err),
                }),
            }
        }
        report
    }

    /// Reloads settings and returns the table for this request, rebuilding
    /// it when the configuration signature moved
    fn refresh_table(&self) -> StatusTable {
        let snapshot = self.settings.load();
        let signature = settings_signature(snapshot.as_ref());

        let mut state = self.state.lock();
        let changed = state
            .signature
            .as_ref()
            .is_some_and(|current| *current != signature);
        if changed {
            // Observations made under the old vocabulary are meaningless now
            state.observations.clear();
        }
        if changed || state.signature.is_none() {
            state.table = StatusTable::from_settings(snapshot.as_ref());
            state.signature = Some(signature);
        }
        state.table.clone()
    }
}

struct InFlightGuard<'a> {
    state: &'a Mutex<State>,
    key: &'a NoteKey,
    observation: Option<Observation>,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        state.in_flight.remove(self.key);
        if let Some(observation) = self.observation.take() {
            state.observations.record(self.key.clone(), observation);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use serde_yaml::Value;

    use super::*;
    use crate::domain::{Frontmatter, SettingsSnapshot, StatusDefinition};

    type WriteHook = Box<dyn Fn(&NoteKey)>;

    #[derive(Default)]
    struct FakeSettings {
        snapshot: Mutex<Option<SettingsSnapshot>>,
    }

    impl FakeSettings {
        fn set(&self, snapshot: Option<SettingsSnapshot>) {
            *self.snapshot.lock() = snapshot;
        }
    }

    impl SettingsSource for Arc<FakeSettings> {
        fn load(&self) -> Option<SettingsSnapshot> {
            self.snapshot.lock().clone()
        }
    }

    #[derive(Default)]
    struct FakeVault {
        notes: Mutex<HashMap<NoteKey, Frontmatter>>,
        failing: Mutex<HashSet<NoteKey>>,
        writes: Mutex<Vec<(NoteKey, Vec<FieldWrite>)>>,
        on_write: Mutex<Option<WriteHook>>,
    }

    impl FakeVault {
        fn put(&self, key: &NoteKey, fields: &[(&str, Value)]) {
            let mut fm = Frontmatter::new();
            for (name, value) in fields {
                fm.set(name, value.clone());
            }
            self.notes.lock().insert(key.clone(), fm);
        }

        fn fail_writes_for(&self, key: &NoteKey) {
            self.failing.lock().insert(key.clone());
        }

        fn allow_writes_for(&self, key: &NoteKey) {
            self.failing.lock().remove(key);
        }

        fn write_count(&self) -> usize {
            self.writes.lock().len()
        }
    }

    impl NoteSource for Arc<FakeVault> {
        fn frontmatter(&self, key: &NoteKey) -> Result<Option<Frontmatter>> {
            Ok(self.notes.lock().get(key).cloned())
        }
    }

    impl NoteSink for Arc<FakeVault> {
        fn apply_fields(&self, key: &NoteKey, writes: &[FieldWrite]) -> Result<()> {
            if self.failing.lock().contains(key) {
                anyhow::bail!("disk full");
            }
            {
                let mut notes = self.notes.lock();
                let fm = notes
                    .get_mut(key)
                    .ok_or_else(|| anyhow::anyhow!("no such note"))?;
                for write in writes {
                    fm.set(&write.name, write.value.clone());
                }
            }
            self.writes.lock().push((key.clone(), writes.to_vec()));
            if let Some(hook) = self.on_write.lock().as_ref() {
                hook(key);
            }
            Ok(())
        }
    }

    fn setup() -> (Arc<FakeSettings>, Arc<FakeVault>, Coordinator<Arc<FakeSettings>, Arc<FakeVault>>)
    {
        let settings = Arc::new(FakeSettings::default());
        let vault = Arc::new(FakeVault::default());
        let coordinator = Coordinator::new(settings.clone(), vault.clone());
        (settings, vault, coordinator)
    }

    fn key(path: &str) -> NoteKey {
        NoteKey::new(path)
    }

    #[test]
    fn agreeing_note_is_up_to_date() {
        let (_, vault, coordinator) = setup();
        let note = key("a.md");
        vault.put(
            &note,
            &[
                ("status", Value::String("open".to_string())),
                ("completed", Value::Bool(false)),
            ],
        );

        let outcome = coordinator.reconcile_note(&note).unwrap();

        assert_eq!(outcome, SyncOutcome::UpToDate);
        assert_eq!(vault.write_count(), 0);
    }

    #[test]
    fn boolean_flip_after_observation_rewrites_the_status() {
        let (_, vault, coordinator) = setup();
        let note = key("a.md");
        vault.put(
            &note,
            &[
                ("status", Value::String("open".to_string())),
                ("completed", Value::Bool(false)),
            ],
        );
        coordinator.reconcile_note(&note).unwrap();

        vault.put(
            &note,
            &[
                ("status", Value::String("open".to_string())),
                ("completed", Value::Bool(true)),
            ],
        );
        let outcome = coordinator.reconcile_note(&note).unwrap();

        assert_eq!(
            outcome,
            SyncOutcome::Updated {
                status: Some("done".to_string()),
                completed: None,
            }
        );
        let writes = vault.writes.lock();
        assert_eq!(writes.len(), 1);
        assert_eq!(
            writes[0].1,
            vec![FieldWrite::new("status", "done".to_string())]
        );
    }

    #[test]
    fn missing_note_reports_no_frontmatter() {
        let (_, _, coordinator) = setup();
        let outcome = coordinator.reconcile_note(&key("gone.md")).unwrap();
        assert_eq!(outcome, SyncOutcome::NoFrontmatter);
    }

    #[test]
    fn untracked_note_drops_its_observation() {
        let (_, vault, coordinator) = setup();
        let note = key("a.md");
        vault.put(
            &note,
            &[
                ("status", Value::String("open".to_string())),
                ("completed", Value::Bool(false)),
            ],
        );
        coordinator.reconcile_note(&note).unwrap();

        // both fields removed: the note stops being a task note
        vault.put(&note, &[("title", Value::String("plain".to_string()))]);
        assert_eq!(
            coordinator.reconcile_note(&note).unwrap(),
            SyncOutcome::NotTracked
        );

        // with the observation gone this is a first sighting again, so the
        // status rules the disagreement instead of the flipped boolean
        vault.put(
            &note,
            &[
                ("status", Value::String("open".to_string())),
                ("completed", Value::Bool(true)),
            ],
        );
        let outcome = coordinator.reconcile_note(&note).unwrap();
        assert_eq!(
            outcome,
            SyncOutcome::Updated {
                status: None,
                completed: Some(false),
            }
        );
    }

    #[test]
    fn reentrant_request_during_write_back_is_dropped() {
        let settings = Arc::new(FakeSettings::default());
        let vault = Arc::new(FakeVault::default());
        let coordinator = Arc::new(Coordinator::new(settings, vault.clone()));

        let note = key("a.md");
        vault.put(
            &note,
            &[
                ("status", Value::String("done".to_string())),
                ("completed", Value::Bool(false)),
            ],
        );

        let seen = Arc::new(Mutex::new(Vec::new()));
        let inner = Arc::downgrade(&coordinator);
        let inner_seen = seen.clone();
        *vault.on_write.lock() = Some(Box::new(move |key: &NoteKey| {
            if let Some(coordinator) = inner.upgrade() {
                let outcome = coordinator.reconcile_note(key).unwrap();
                inner_seen.lock().push(outcome);
            }
        }));

        let outcome = coordinator.reconcile_note(&note).unwrap();

        assert!(matches!(outcome, SyncOutcome::Updated { .. }));
        assert_eq!(*seen.lock(), vec![SyncOutcome::InFlight]);
        // the re-entrant request must not have written anything
        assert_eq!(vault.write_count(), 1);
    }

    #[test]
    fn failed_write_back_still_records_the_observation() {
        let (_, vault, coordinator) = setup();
        let note = key("a.md");
        vault.put(
            &note,
            &[
                ("status", Value::String("open".to_string())),
                ("completed", Value::Bool(false)),
            ],
        );
        coordinator.reconcile_note(&note).unwrap();

        vault.put(
            &note,
            &[
                ("status", Value::String("open".to_string())),
                ("completed", Value::Bool(true)),
            ],
        );
        vault.fail_writes_for(&note);
        assert!(coordinator.reconcile_note(&note).is_err());

        // The intended outcome (done, true) was recorded even though the
        // file still reads (open, true): against that observation the next
        // pass sees the status as the moved side.
        vault.allow_writes_for(&note);
        let outcome = coordinator.reconcile_note(&note).unwrap();
        assert_eq!(
            outcome,
            SyncOutcome::Updated {
                status: None,
                completed: Some(false),
            }
        );
    }

    #[test]
    fn settings_change_invalidates_observations() {
        let (settings, vault, coordinator) = setup();
        let note = key("a.md");
        vault.put(
            &note,
            &[
                ("status", Value::String("open".to_string())),
                ("completed", Value::Bool(false)),
            ],
        );
        coordinator.reconcile_note(&note).unwrap();

        vault.put(
            &note,
            &[
                ("status", Value::String("open".to_string())),
                ("completed", Value::Bool(true)),
            ],
        );
        settings.set(Some(SettingsSnapshot {
            custom_statuses: Some(vec![StatusDefinition {
                value: Some("review".to_string()),
                is_completed: Some(false),
            }]),
            ..Default::default()
        }));

        // without the prior observation this is a first sighting: the
        // status wins instead of the boolean
        let outcome = coordinator.reconcile_note(&note).unwrap();
        assert_eq!(
            outcome,
            SyncOutcome::Updated {
                status: None,
                completed: Some(false),
            }
        );
    }

    #[test]
    fn reloading_equal_settings_keeps_observations() {
        let (settings, vault, coordinator) = setup();
        let note = key("a.md");
        settings.set(Some(SettingsSnapshot::default()));
        vault.put(
            &note,
            &[
                ("status", Value::String("open".to_string())),
                ("completed", Value::Bool(false)),
            ],
        );
        coordinator.reconcile_note(&note).unwrap();

        // a fresh but identical snapshot must not reset anything
        settings.set(Some(SettingsSnapshot::default()));
        vault.put(
            &note,
            &[
                ("status", Value::String("open".to_string())),
                ("completed", Value::Bool(true)),
            ],
        );
        let outcome = coordinator.reconcile_note(&note).unwrap();
        assert_eq!(
            outcome,
            SyncOutcome::Updated {
                status: Some("done".to_string()),
                completed: None,
            }
        );
    }

    #[test]
    fn renamed_status_field_is_honored() {
        let (settings, vault, coordinator) = setup();
        settings.set(Some(SettingsSnapshot {
            field_mapping: Some(crate::domain::FieldMapping {
                status: Some("state".to_string()),
            }),
            ..Default::default()
        }));

        let note = key("a.md");
        vault.put(
            &note,
            &[
                ("state", Value::String("done".to_string())),
                ("completed", Value::Bool(false)),
            ],
        );

        let outcome = coordinator.reconcile_note(&note).unwrap();
        assert_eq!(
            outcome,
            SyncOutcome::Updated {
                status: None,
                completed: Some(true),
            }
        );
        let writes = vault.writes.lock();
        assert_eq!(writes[0].1, vec![FieldWrite::new("completed", true)]);
    }

    #[test]
    fn batch_isolates_a_failing_note() {
        let (_, vault, coordinator) = setup();
        let good = key("good.md");
        let bad = key("bad.md");
        let plain = key("plain.md");
        vault.put(
            &good,
            &[
                ("status", Value::String("done".to_string())),
                ("completed", Value::Bool(false)),
            ],
        );
        vault.put(
            &bad,
            &[
                ("status", Value::String("done".to_string())),
                ("completed", Value::Bool(false)),
            ],
        );
        vault.put(&plain, &[("title", Value::String("notes".to_string()))]);
        vault.fail_writes_for(&bad);

        let report =
            coordinator.reconcile_all(&[bad.clone(), good.clone(), plain.clone()]);

        assert_eq!(report.scanned, 3);
        assert_eq!(report.updated, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].note, bad);
        assert!(report.has_errors());
    }
}
