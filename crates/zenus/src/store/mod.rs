//! # Storage Layer
//!
//! The core talks to durable storage only through the [`BlockRepository`]
//! command surface. A repository owns no in-memory document state: the
//! [`crate::document::Document`] is the truth while the app runs, and the
//! repository just follows along.
//!
//! ## Commands
//!
//! | Command | Input | Notes |
//! |---------|-------|-------|
//! | `load_notes` | space | blocks of that space |
//! | `save_block` | space, full block | idempotent upsert by id |
//! | `delete_block` | space, id | permanent; missing id is fine |
//! | `update_orders` | space, `(id, order)` pairs | batched reindex; unknown ids ignored |
//! | `archive_block` | id | active → archived, appended at the end |
//! | `unarchive_block` | id | archived → active, appended at the end |
//!
//! Implementations must be safe to call concurrently for different blocks;
//! calls for one block arrive one at a time (see [`crate::sync`]).
//!
//! ## Implementations
//!
//! - [`fs::FsRepository`]: one markdown file per block under a data directory.
//! - [`memory::MemRepository`]: for tests, with failure and latency injection.

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{Block, BlockId, OrderUpdate, Space};

pub mod fs;
pub mod memory;

#[async_trait]
pub trait BlockRepository: Send + Sync {
    async fn load_notes(&self, space: Space) -> Result<Vec<Block>>;

    async fn save_block(&self, space: Space, block: &Block) -> Result<()>;

    async fn delete_block(&self, space: Space, id: &BlockId) -> Result<()>;

    async fn update_orders(&self, space: Space, orders: &[OrderUpdate]) -> Result<()>;

    async fn archive_block(&self, id: &BlockId) -> Result<()>;

    async fn unarchive_block(&self, id: &BlockId) -> Result<()>;
}
