//! # Command-Line Interface
//!
//! User-facing commands and output formatting.
//!
//! ## Commands
//!
//! | Command | Purpose |
//! |---------|---------|
//! | `sync NOTE...` | Reconcile the named notes |
//! | `sync --all` | Reconcile every note in the vault |
//! | `status` | Show the resolved vault, settings, and status vocabulary |
//! | `watch` | Reconcile notes as they change on disk |
//!
//! ## Output Formats
//!
//! All commands support the `--format` flag:
//! - `text` (default) - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! ## Verbose Mode
//!
//! Use `--verbose` (or `-v`) for debug output:
//! ```bash
//! marksync --verbose sync --all
//! ```
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod output;
mod sync_cmd;
mod watch;

pub use app::{run, Cli, Commands};
pub use output::{Output, OutputFormat};
