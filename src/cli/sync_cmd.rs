//! Sync and status commands

use std::path::{Path, PathBuf};

use anyhow::Result;

use super::output::Output;
use crate::domain::{settings_signature, NoteKey, StatusTable};
use crate::storage::{Config, JsonSettingsSource, MarkdownVault};
use crate::sync::{Coordinator, SettingsSource, SyncError, SyncOutcome, SyncReport};

/// Wires a coordinator to the resolved vault and settings file
pub fn open(
    config: &Config,
    settings_path: &Path,
) -> (MarkdownVault, Coordinator<JsonSettingsSource, MarkdownVault>) {
    let vault = MarkdownVault::open(&config.root);
    let settings = JsonSettingsSource::new(settings_path);
    let coordinator = Coordinator::new(settings, vault.clone());
    (vault, coordinator)
}

/// Reconcile the named notes, or the whole vault with `--all`
pub fn run(
    output: &Output,
    config: &Config,
    settings_path: &Path,
    notes: &[PathBuf],
    all: bool,
) -> Result<()> {
    if all && !notes.is_empty() {
        anyhow::bail!("Pass note paths or --all, not both");
    }
    if !all && notes.is_empty() {
        anyhow::bail!("Nothing to sync. Pass note paths or --all");
    }

    let (vault, coordinator) = open(config, settings_path);

    let report = if all {
        sync_all(output, &vault, &coordinator)?
    } else {
        sync_named(output, &vault, &coordinator, notes)?
    };

    if output.is_json() {
        output.data(&report);
    } else {
        println!(
            "{} scanned: {} updated, {} already in sync, {} skipped",
            report.scanned, report.updated, report.up_to_date, report.skipped
        );
    }

    if report.has_errors() {
        anyhow::bail!("{} of {} notes failed", report.errors.len(), report.scanned);
    }
    Ok(())
}

fn sync_all(
    output: &Output,
    vault: &MarkdownVault,
    coordinator: &Coordinator<JsonSettingsSource, MarkdownVault>,
) -> Result<SyncReport> {
    let keys = vault.list_notes()?;
    output.verbose_ctx("sync", &format!("Found {} notes", keys.len()));

    let report = coordinator.reconcile_all(&keys);

    if !output.is_json() {
        for error in &report.errors {
            output.error(&format!("{}: {}", error.note, error.message));
        }
    }
    Ok(report)
}

fn sync_named(
    output: &Output,
    vault: &MarkdownVault,
    coordinator: &Coordinator<JsonSettingsSource, MarkdownVault>,
    notes: &[PathBuf],
) -> Result<SyncReport> {
    let mut report = SyncReport::default();

    for path in notes {
        report.scanned += 1;

        // A path that does not map into the vault fails that note only.
        let key = match vault.key_for(path) {
            Ok(key) => key,
            Err(err) => {
                let message = err.to_string();
                if !output.is_json() {
                    output.error(&message);
                }
                report.errors.push(SyncError {
                    note: NoteKey::new(path.display().to_string()),
                    message,
                });
                continue;
            }
        };

        if !vault.note_path(&key).is_file() {
            if !output.is_json() {
                output.error(&format!("{}: note not found", key));
            }
            report.errors.push(SyncError {
                note: key,
                message: "Note not found".to_string(),
            });
            continue;
        }

        match coordinator.reconcile_note(&key) {
            Ok(outcome) => {
                if !output.is_json() {
                    println!("{}: {}", key, describe(&outcome));
                }
                match outcome {
                    SyncOutcome::Updated { .. } => report.updated += 1,
                    SyncOutcome::UpToDate => report.up_to_date += 1,
                    _ => report.skipped += 1,
                }
            }
            Err(err) => {
                let message = format!("{:#}", err);
                if !output.is_json() {
                    output.error(&format!("{}: {}", key, message));
                }
                report.errors.push(SyncError { note: key, message });
            }
        }
    }

    Ok(report)
}

/// One-line description of a reconciliation outcome
pub fn describe(outcome: &SyncOutcome) -> String {
    match outcome {
        SyncOutcome::InFlight => "write in progress, request dropped".to_string(),
        SyncOutcome::NoFrontmatter => "no frontmatter".to_string(),
        SyncOutcome::NotTracked => "not a task note".to_string(),
        SyncOutcome::UpToDate => "up to date".to_string(),
        SyncOutcome::Updated { status, completed } => {
            let mut parts = Vec::new();
            if let Some(token) = status {
                parts.push(format!("status -> {}", token));
            }
            if let Some(flag) = completed {
                parts.push(format!("completed -> {}", flag));
            }
            format!("updated ({})", parts.join(", "))
        }
    }
}

/// Show the resolved vault, settings file, and status vocabulary
pub fn status(output: &Output, config: &Config, settings_path: &Path) -> Result<()> {
    let settings = JsonSettingsSource::new(settings_path);
    let snapshot = settings.load();

    let settings_state = if snapshot.is_some() {
        "loaded"
    } else if settings.exists() {
        "unreadable, using defaults"
    } else {
        "not found, using defaults"
    };

    let table = StatusTable::from_settings(snapshot.as_ref());
    let signature = settings_signature(snapshot.as_ref());

    if output.is_json() {
        let statuses: Vec<_> = table
            .entries()
            .map(|(token, completed)| {
                serde_json::json!({
                    "token": token,
                    "completed": completed,
                })
            })
            .collect();

        output.data(&serde_json::json!({
            "vault": config.root.display().to_string(),
            "settings": {
                "path": settings_path.display().to_string(),
                "state": settings_state,
                "signature": signature,
            },
            "fields": {
                "status": table.status_field(),
                "completed": table.completed_field(),
            },
            "defaults": {
                "open": table.default_open(),
                "done": table.default_done(),
            },
            "statuses": statuses,
        }));
    } else {
        println!("Vault: {}", config.root.display());
        println!(
            "Settings: {} ({})",
            settings_path.display(),
            settings_state
        );
        println!("Signature: {}", &signature[..12]);
        println!();
        println!(
            "Fields: {} / {}",
            table.status_field(),
            table.completed_field()
        );
        println!(
            "Defaults: {} when reopened, {} when completed",
            table.default_open(),
            table.default_done()
        );
        println!();
        println!("Statuses ({}):", table.len());
        for (token, completed) in table.entries() {
            let marker = if completed { "[x]" } else { "[ ]" };
            println!("  {} {}", marker, token);
        }
    }

    Ok(())
}
