//! marksync - Keeps status and completed frontmatter fields in agreement

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = marksync::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
