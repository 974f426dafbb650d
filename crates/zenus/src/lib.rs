//! # Zenus Architecture
//!
//! Zenus is a **UI-agnostic block notebook**. A notebook is a freely ordered
//! list of independent blocks (title, markdown body, tags, collapse state),
//! each persisted on its own. The core never waits for storage: every change
//! lands in memory first and is written out in the background.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  View (CLI in crates/zenus-cli, or any other host)          │
//! │  - Renders blocks, forwards user intents                    │
//! │  - Receives ViewEvents (preview, navigation, save status)   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Notebook (notebook.rs)                                     │
//! │  - Document model: ordered blocks of one space              │
//! │  - Reorder, reference scanning, navigation                  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │  Mutation
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Sync (sync.rs)                                             │
//! │  - Per-block lanes, fenced order batches                    │
//! │  - Global save status                                       │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Storage (store/)                                           │
//! │  - BlockRepository trait                                    │
//! │  - FsRepository (production), MemRepository (testing)       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Spaces
//!
//! Blocks live either in the active space or in the archive. Only one space
//! is loaded at a time; archive and unarchive move a block between them
//! without touching its id, content or tags.
//!
//! ## Failure Model
//!
//! Nothing in the core is fatal. A failed load yields an empty document, a
//! failed write flips the save status to `error` and keeps the local edit,
//! and unknown ids or titles are silent no-ops.
//!
//! ## Module Overview
//!
//! - [`notebook`]: The facade, entry point for all operations
//! - [`document`]: Ordered blocks of one space and their invariants
//! - [`reorder`]: Drag-and-drop reindexing over filtered views
//! - [`sync`]: Background persistence and save status
//! - [`refs`]: `[[Title]]` reference scanning and resolution
//! - [`store`]: Storage abstraction and implementations
//! - [`id`]: Time-ordered block ids
//! - [`model`]: Core data types (`Block`, `BlockId`, `Space`)
//! - [`tags`]: Tag rules and colors
//! - [`events`]: Notifications for the view
//! - [`config`]: Configuration management
//! - [`error`]: Error types

pub mod config;
pub mod document;
pub mod error;
pub mod events;
pub mod id;
pub mod model;
pub mod notebook;
pub mod refs;
pub mod reorder;
pub mod store;
pub mod sync;
pub mod tags;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;
