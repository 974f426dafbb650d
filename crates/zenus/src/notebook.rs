//! # Notebook
//!
//! The [`Notebook`] is the single entry point a view talks to. It owns the
//! loaded [`Document`], generates ids, keeps a [`ReferenceIndex`] per block and
//! hands every change to the [`SyncController`].
//!
//! Every mutating call follows the same shape:
//!
//! 1. Find the block; an unknown id is a silent no-op returning `false`.
//! 2. Change local state.
//! 3. Submit exactly one [`Mutation`].
//!
//! Nothing here waits on the repository except [`Notebook::load`],
//! [`Notebook::navigate`] (which may look into the other space) and
//! [`Notebook::flush`]. Both reads flush first, so they always see every
//! change submitted before them.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::config::ZenusConfig;
use crate::document::Document;
use crate::error::Result;
use crate::events::{EventSink, ViewEvent};
use crate::id::IdGenerator;
use crate::model::{Block, BlockId, FieldUpdate, OrderUpdate, SaveStatus, Space};
use crate::refs::resolve::resolve;
use crate::refs::{ReferenceIndex, ReferenceSpan};
use crate::reorder::{self, DragEnd};
use crate::store::BlockRepository;
use crate::sync::{Mutation, SyncController};

pub struct Notebook {
    repo: Arc<dyn BlockRepository>,
    document: Document,
    ids: IdGenerator,
    sync: SyncController,
    references: HashMap<BlockId, ReferenceIndex>,
    events: EventSink,
    preview: Option<BlockId>,
}

impl Notebook {
    /// Creates an empty notebook on the active space.
    ///
    /// Must be called inside a tokio runtime. The returned receiver carries
    /// every [`ViewEvent`] for the host view.
    pub fn new(
        repo: Arc<dyn BlockRepository>,
        config: &ZenusConfig,
    ) -> Result<(Self, mpsc::UnboundedReceiver<ViewEvent>)> {
        let (events, rx) = EventSink::channel();
        let sync = SyncController::new(repo.clone(), events.clone())?;
        let notebook = Self {
            repo,
            document: Document::new(Space::Active),
            ids: IdGenerator::new(config.machine_id),
            sync,
            references: HashMap::new(),
            events,
            preview: None,
        };
        Ok((notebook, rx))
    }

    /// Replaces the id generator, e.g. with one on a fixed clock.
    pub fn with_id_generator(mut self, ids: IdGenerator) -> Self {
        self.ids = ids;
        self
    }

    pub fn space(&self) -> Space {
        self.document.space()
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn block(&self, id: &BlockId) -> Option<&Block> {
        self.document.get(id)
    }

    /// Replaces the document with the blocks stored for `space`.
    ///
    /// Pending writes are flushed before reading. A failed load still
    /// switches to `space`, with an empty document, and returns the error so
    /// the caller can offer a retry.
    pub async fn load(&mut self, space: Space) -> Result<usize> {
        self.close_preview();
        match self.fetch(space).await {
            Ok((document, repaired)) => {
                self.install(document, repaired);
                info!(%space, blocks = self.document.len(), "space loaded");
                Ok(self.document.len())
            }
            Err(e) => {
                warn!(%space, error = %e, "load failed");
                self.install(Document::new(space), false);
                Err(e)
            }
        }
    }

    async fn fetch(&mut self, space: Space) -> Result<(Document, bool)> {
        self.sync.flush().await;
        let blocks = self.repo.load_notes(space).await?;
        Ok(Document::from_stored(space, blocks))
    }

    /// Makes `document` current. Orders renumbered while loading are
    /// persisted as one batch.
    fn install(&mut self, document: Document, repaired: bool) {
        self.references = document
            .blocks()
            .iter()
            .map(|b| (b.id.clone(), ReferenceIndex::new(&b.content)))
            .collect();
        self.document = document;
        if repaired {
            warn!(space = %self.space(), "stored orders collided, renumbering");
            self.submit_orders(reorder::order_updates(&self.document.ids()));
        }
    }

    fn submit_orders(&mut self, orders: Vec<OrderUpdate>) {
        self.sync.submit(Mutation::UpdateOrders {
            space: self.space(),
            orders,
        });
    }

    /// Appends a new empty block and returns it before it is persisted.
    pub fn create(&mut self) -> Block {
        if self.document.next_order().is_none() {
            if let Some(orders) = self.document.compact() {
                self.submit_orders(orders);
            }
        }
        let id = self.ids.generate();
        let order = self.document.next_order().unwrap_or_default();
        let block = Block::new(id.clone(), order);
        self.document.push(block.clone());
        self.references.insert(id.clone(), ReferenceIndex::default());
        debug!(%id, "block created");
        self.save(&id);
        block
    }

    pub fn update_field(&mut self, id: &BlockId, update: FieldUpdate) -> bool {
        let Some(block) = self.document.get_mut(id) else {
            return false;
        };
        let changed = block.apply(update);

        if changed {
            let content = &block.content;
            let index = self.references.entry(id.clone()).or_default();
            let diff = index.update(content);
            if !diff.is_empty() {
                debug!(%id, added = diff.added.len(), removed = diff.removed.len(), "references changed");
            }
        }
        self.save(id);
        true
    }

    pub fn toggle_collapse(&mut self, id: &BlockId) -> bool {
        let Some(collapsed) = self.document.get(id).map(|b| b.is_collapsed) else {
            return false;
        };
        self.update_field(id, FieldUpdate::Collapsed(!collapsed))
    }

    pub fn delete(&mut self, id: &BlockId) -> bool {
        if !self.detach(id) {
            return false;
        }
        self.sync.submit(Mutation::Delete {
            space: self.space(),
            id: id.clone(),
        });
        true
    }

    /// Moves a block from the active space to the archive.
    pub fn archive(&mut self, id: &BlockId) -> bool {
        if self.space() != Space::Active || !self.detach(id) {
            return false;
        }
        self.sync.submit(Mutation::Archive { id: id.clone() });
        true
    }

    /// Moves a block from the archive back to the active space.
    pub fn unarchive(&mut self, id: &BlockId) -> bool {
        if self.space() != Space::Archived || !self.detach(id) {
            return false;
        }
        self.sync.submit(Mutation::Unarchive { id: id.clone() });
        true
    }

    /// Applies a drag over the blocks visible for `filter`.
    ///
    /// A cancelled drag or a drop in place changes nothing and persists
    /// nothing.
    pub fn reorder(&mut self, drag: DragEnd, filter: Option<&str>) -> bool {
        let Some(orders) = self.document.reorder(drag, filter) else {
            return false;
        };
        debug!(blocks = orders.len(), "reordered");
        self.submit_orders(orders);
        true
    }

    /// Applies an externally computed `(id, order)` mapping.
    ///
    /// The resulting full mapping is persisted only if something moved.
    pub fn apply_orders(&mut self, orders: &[OrderUpdate]) -> bool {
        if !self.document.apply_orders(orders) {
            return false;
        }
        self.submit_orders(reorder::order_updates(&self.document.ids()));
        true
    }

    /// Blocks matching `filter` (all blocks when `None`), in display order.
    pub fn visible(&self, filter: Option<&str>) -> Vec<&Block> {
        self.document.filtered(filter.unwrap_or("")).collect()
    }

    pub fn references(&self, id: &BlockId) -> &[ReferenceSpan] {
        self.references
            .get(id)
            .map(ReferenceIndex::spans)
            .unwrap_or(&[])
    }

    /// Follows the reference under byte `offset` of a block's content.
    pub async fn activate_reference(&mut self, id: &BlockId, offset: usize) -> Option<BlockId> {
        let title = self
            .references
            .get(id)?
            .span_at(offset)?
            .title
            .clone();
        self.navigate(&title).await
    }

    /// Resolves `title` and asks the view to go there.
    ///
    /// Looks in the loaded space first. From the archive, an unmatched title
    /// is looked up in the active space, which is then loaded. Unresolved
    /// titles do nothing.
    pub async fn navigate(&mut self, title: &str) -> Option<BlockId> {
        if let Some(target) = resolve(self.document.blocks(), title) {
            let target = target.id.clone();
            self.request_navigation(title, &target);
            return Some(target);
        }
        if self.space() != Space::Archived {
            debug!(title, "reference unresolved");
            return None;
        }

        let (active, repaired) = match self.fetch(Space::Active).await {
            Ok(loaded) => loaded,
            Err(e) => {
                warn!(error = %e, "active space lookup failed");
                return None;
            }
        };
        let Some(target) = resolve(active.blocks(), title).map(|b| b.id.clone()) else {
            debug!(title, "reference unresolved");
            return None;
        };

        self.close_preview();
        self.install(active, repaired);
        info!(title, "switched to active space to follow reference");
        self.request_navigation(title, &target);
        Some(target)
    }

    fn request_navigation(&self, title: &str, target: &BlockId) {
        self.events.emit(ViewEvent::NavigationRequest {
            title: title.to_string(),
            target: target.clone(),
        });
    }

    pub fn open_preview(&mut self, id: &BlockId) -> bool {
        let Some(block) = self.document.get(id) else {
            return false;
        };
        self.events.emit(ViewEvent::PreviewOpen {
            title: block.title.clone(),
            content: block.content.clone(),
        });
        self.preview = Some(id.clone());
        true
    }

    pub fn close_preview(&mut self) -> bool {
        if self.preview.take().is_none() {
            return false;
        }
        self.events.emit(ViewEvent::PreviewClose);
        true
    }

    pub fn save_status(&self) -> SaveStatus {
        self.sync.status()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<SaveStatus> {
        self.sync.subscribe()
    }

    /// Waits until every submitted change has been attempted.
    pub async fn flush(&mut self) {
        self.sync.flush().await
    }

    fn save(&mut self, id: &BlockId) {
        if let Some(block) = self.document.get(id) {
            self.sync.submit(Mutation::Save {
                space: self.document.space(),
                block: block.clone(),
            });
        }
    }

    /// Drops a block from local state ahead of a delete or space move.
    fn detach(&mut self, id: &BlockId) -> bool {
        if self.document.remove(id).is_none() {
            return false;
        }
        self.references.remove(id);
        if self.preview.as_ref() == Some(id) {
            self.close_preview();
        }
        true
    }
}
