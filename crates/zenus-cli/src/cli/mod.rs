//! # CLI Behavior
//!
//! This is **one possible UI client** for zenus, not the application itself.
//! The CLI is the only place that knows about terminal I/O, exit codes, and
//! output formatting.
//!
//! ## Addressing Blocks
//!
//! Commands taking a `<block>` accept either its 1-based position in the
//! listing (`zenus show 2`) or its full id.
//!
//! ## Spaces
//!
//! Commands work on the active space. `--archived` switches to the archive;
//! `unarchive` always reads from the archive.
//!
//! ## Module Structure
//!
//! - `commands`: Notebook wiring and per-command handlers
//! - `render`: Output formatting
//! - `setup`: Argument parsing via clap
//! - `styles`: Terminal styling constants

mod commands;
mod render;
pub mod setup;
mod styles;

pub use commands::run;
