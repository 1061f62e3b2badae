//! Watch command
//!
//! Runs in the foreground: one full pass over the vault to catch up on
//! edits made while marksync was not running, then a debounced filesystem
//! watch that reconciles notes as they change. Progress goes to stderr
//! with timestamps; failures are logged and the loop keeps going.

use std::path::Path;
use std::sync::mpsc;

use anyhow::{Context, Result};
use notify::RecursiveMode;
use notify_debouncer_mini::new_debouncer;

use super::output::Output;
use super::sync_cmd;
use crate::domain::NoteKey;
use crate::storage::Config;
use crate::sync::SyncOutcome;

pub fn run(output: &Output, config: &Config, settings_path: &Path) -> Result<()> {
    let (vault, coordinator) = sync_cmd::open(config, settings_path);

    let keys = vault.list_notes()?;
    let report = coordinator.reconcile_all(&keys);
    log(&format!(
        "Initial pass: {} notes scanned, {} updated, {} errors",
        report.scanned,
        report.updated,
        report.errors.len()
    ));
    for error in &report.errors {
        log(&format!("{}: {}", error.note, error.message));
    }

    let (tx, rx) = mpsc::channel();
    let mut debouncer =
        new_debouncer(config.debounce(), tx).context("Failed to start file watcher")?;

    debouncer
        .watcher()
        .watch(&config.root, RecursiveMode::Recursive)
        .with_context(|| format!("Failed to watch {}", config.root.display()))?;

    log(&format!(
        "Watching {} (debounce: {}ms)",
        config.root.display(),
        config.vault.watch.debounce_ms
    ));

    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                let mut changed: Vec<NoteKey> = events
                    .iter()
                    .filter(|event| vault.is_note_path(&event.path))
                    .filter_map(|event| vault.key_for(&event.path).ok())
                    .collect();
                changed.sort_by(|a, b| a.as_str().cmp(b.as_str()));
                changed.dedup();

                for key in changed {
                    match coordinator.reconcile_note(&key) {
                        Ok(outcome @ SyncOutcome::Updated { .. }) => {
                            log(&format!("{}: {}", key, sync_cmd::describe(&outcome)));
                        }
                        Ok(outcome) => {
                            output.verbose_ctx(
                                "watch",
                                &format!("{}: {}", key, sync_cmd::describe(&outcome)),
                            );
                        }
                        Err(err) => {
                            log(&format!("{}: {:#}", key, err));
                        }
                    }
                }
            }
            Ok(Err(error)) => {
                log(&format!("Watch error: {:?}", error));
            }
            Err(err) => {
                log(&format!("Channel error: {}", err));
                break;
            }
        }
    }

    Ok(())
}

/// Timestamped progress line on stderr
fn log(message: &str) {
    let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
    eprintln!("[{}] {}", timestamp, message);
}
