//! # Zenus CLI Architecture
//!
//! The binary is intentionally thin: the CLI lives in `src/cli/`, while this
//! file only invokes `cli::run()` and handles process termination.
//!
//! ## Workspace Structure
//!
//! - `crates/zenus/`: core library, UI agnostic
//! - `crates/zenus-cli/`: this headless client, one process per command
//!
//! ## Layering
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (crates/zenus-cli/src/cli/)                      │
//! │  - clap argument parsing (setup.rs)                         │
//! │  - Notebook wiring + dispatch (commands.rs)                 │
//! │  - Terminal rendering with console styles (render.rs)       │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Notebook (crates/zenus/src/notebook.rs)                    │
//! │  - Document model, reorder, references                      │
//! │  - Background sync to the repository                        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each invocation loads one space, applies one intent, then waits for the
//! background writes to finish before exiting. A failed write turns into a
//! non-zero exit code.
//!
//! ## Testing Approach
//!
//! - **Library**: unit tests per module plus flow tests against the
//!   in-memory repository.
//! - **CLI**: rendering is tested on plain strings; `tests/cli_e2e.rs` runs
//!   the binary against a temp data directory.

mod cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
