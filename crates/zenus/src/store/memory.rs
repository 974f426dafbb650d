use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use super::BlockRepository;
use crate::error::{Result, ZenusError};
use crate::model::{Block, BlockId, OrderUpdate, Space};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A repository call as observed by [`MemRepository`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    Load(Space),
    Save(Space, BlockId),
    Delete(Space, BlockId),
    UpdateOrders(Space, Vec<OrderUpdate>),
    Archive(BlockId),
    Unarchive(BlockId),
}

/// In-memory repository for testing.
///
/// Uses `std::sync::Mutex` since locks are never held across an await. A
/// poisoned lock is recovered rather than propagated: the maps stay valid.
#[derive(Default)]
pub struct MemRepository {
    spaces: Mutex<HashMap<Space, HashMap<BlockId, Block>>>,
    calls: Mutex<Vec<RecordedCall>>,
    write_delays: Mutex<VecDeque<Duration>>,
    simulate_write_error: AtomicBool,
    simulate_load_error: AtomicBool,
}

impl MemRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a space directly, bypassing the call log.
    pub fn with_blocks(self, space: Space, blocks: Vec<Block>) -> Self {
        {
            let mut spaces = lock(&self.spaces);
            let target = spaces.entry(space).or_default();
            for block in blocks {
                target.insert(block.id.clone(), block);
            }
        }
        self
    }

    /// Enable write error simulation for testing error handling.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        self.simulate_write_error.store(simulate, Ordering::SeqCst);
    }

    pub fn set_simulate_load_error(&self, simulate: bool) {
        self.simulate_load_error.store(simulate, Ordering::SeqCst);
    }

    /// Queues a delay for the next write call; queued delays are consumed in
    /// call order.
    pub fn push_write_delay(&self, delay: Duration) {
        lock(&self.write_delays)
            .push_back(delay);
    }

    /// Every call received so far, in arrival order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.calls).clone()
    }

    /// The stored blocks of a space, sorted by order.
    pub fn stored(&self, space: Space) -> Vec<Block> {
        let spaces = lock(&self.spaces);
        let mut blocks: Vec<Block> = spaces
            .get(&space)
            .map(|s| s.values().cloned().collect())
            .unwrap_or_default();
        blocks.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.id.cmp(&b.id)));
        blocks
    }

    pub fn stored_block(&self, space: Space, id: &BlockId) -> Option<Block> {
        let spaces = lock(&self.spaces);
        spaces.get(&space).and_then(|s| s.get(id)).cloned()
    }

    fn record(&self, call: RecordedCall) {
        lock(&self.calls)
            .push(call);
    }

    async fn begin_write(&self, call: RecordedCall) -> Result<()> {
        self.record(call);
        let delay = lock(&self.write_delays)
            .pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.simulate_write_error.load(Ordering::SeqCst) {
            return Err(ZenusError::Store("Simulated write error".to_string()));
        }
        Ok(())
    }

    fn move_block(&self, id: &BlockId, from: Space) -> Result<()> {
        let mut spaces = lock(&self.spaces);
        let mut block = spaces
            .get_mut(&from)
            .and_then(|s| s.remove(id))
            .ok_or_else(|| ZenusError::BlockNotFound(id.clone()))?;
        let target = spaces.entry(from.other()).or_default();
        block.order = target
            .values()
            .filter_map(|b| b.order.checked_add(1))
            .max()
            .unwrap_or(0);
        target.insert(block.id.clone(), block);
        Ok(())
    }
}

#[async_trait]
impl BlockRepository for MemRepository {
    async fn load_notes(&self, space: Space) -> Result<Vec<Block>> {
        self.record(RecordedCall::Load(space));
        if self.simulate_load_error.load(Ordering::SeqCst) {
            return Err(ZenusError::Store("Simulated load error".to_string()));
        }
        Ok(self.stored(space))
    }

    async fn save_block(&self, space: Space, block: &Block) -> Result<()> {
        self.begin_write(RecordedCall::Save(space, block.id.clone()))
            .await?;
        let mut spaces = lock(&self.spaces);
        spaces
            .entry(space)
            .or_default()
            .insert(block.id.clone(), block.clone());
        Ok(())
    }

    async fn delete_block(&self, space: Space, id: &BlockId) -> Result<()> {
        self.begin_write(RecordedCall::Delete(space, id.clone()))
            .await?;
        let mut spaces = lock(&self.spaces);
        if let Some(blocks) = spaces.get_mut(&space) {
            blocks.remove(id);
        }
        Ok(())
    }

    async fn update_orders(&self, space: Space, orders: &[OrderUpdate]) -> Result<()> {
        self.begin_write(RecordedCall::UpdateOrders(space, orders.to_vec()))
            .await?;
        let mut spaces = lock(&self.spaces);
        if let Some(blocks) = spaces.get_mut(&space) {
            for update in orders {
                if let Some(block) = blocks.get_mut(&update.id) {
                    block.order = update.order;
                }
            }
        }
        Ok(())
    }

    async fn archive_block(&self, id: &BlockId) -> Result<()> {
        self.begin_write(RecordedCall::Archive(id.clone())).await?;
        self.move_block(id, Space::Active)
    }

    async fn unarchive_block(&self, id: &BlockId) -> Result<()> {
        self.begin_write(RecordedCall::Unarchive(id.clone())).await?;
        self.move_block(id, Space::Archived)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(id: &str, order: u32) -> Block {
        Block::new(BlockId::new(id), order)
    }

    #[tokio::test]
    async fn save_then_load() {
        let repo = MemRepository::new();
        repo.save_block(Space::Active, &block("a", 0)).await.unwrap();
        let loaded = repo.load_notes(Space::Active).await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert!(repo.load_notes(Space::Archived).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn archive_appends_to_end_of_archive() {
        let repo = MemRepository::new()
            .with_blocks(Space::Active, vec![block("a", 0)])
            .with_blocks(Space::Archived, vec![block("x", 0), block("y", 1)]);
        repo.archive_block(&BlockId::new("a")).await.unwrap();
        let archived = repo.stored(Space::Archived);
        assert_eq!(archived.last().unwrap().id.as_str(), "a");
        assert_eq!(archived.last().unwrap().order, 2);
        assert!(repo.stored(Space::Active).is_empty());
    }

    #[tokio::test]
    async fn archive_skips_unordered_blocks_when_appending() {
        let repo = MemRepository::new()
            .with_blocks(Space::Active, vec![block("a", 0)])
            .with_blocks(Space::Archived, vec![block("x", 4), block("y", u32::MAX)]);
        repo.archive_block(&BlockId::new("a")).await.unwrap();
        let moved = repo.stored_block(Space::Archived, &BlockId::new("a")).unwrap();
        assert_eq!(moved.order, 5);
    }

    #[tokio::test]
    async fn archive_missing_block_fails() {
        let repo = MemRepository::new();
        let err = repo.archive_block(&BlockId::new("nope")).await;
        assert!(matches!(err, Err(ZenusError::BlockNotFound(_))));
    }

    #[tokio::test]
    async fn simulated_write_error() {
        let repo = MemRepository::new();
        repo.set_simulate_write_error(true);
        assert!(repo.save_block(Space::Active, &block("a", 0)).await.is_err());
        assert!(repo.stored(Space::Active).is_empty());
        assert_eq!(repo.calls().len(), 1);
    }

    #[tokio::test]
    async fn update_orders_ignores_unknown_ids() {
        let repo = MemRepository::new().with_blocks(Space::Active, vec![block("a", 0)]);
        repo.update_orders(
            Space::Active,
            &[
                OrderUpdate { id: BlockId::new("a"), order: 4 },
                OrderUpdate { id: BlockId::new("ghost"), order: 0 },
            ],
        )
        .await
        .unwrap();
        assert_eq!(repo.stored(Space::Active)[0].order, 4);
        assert_eq!(repo.stored(Space::Active).len(), 1);
    }
}
