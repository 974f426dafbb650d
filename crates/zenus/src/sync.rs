//! # Synchronization
//!
//! The [`SyncController`] turns local mutations into repository calls without
//! ever blocking the caller. The view stays responsive: [`SyncController::submit`]
//! only enqueues, and the write happens on a tokio task.
//!
//! ## Lanes
//!
//! Every block id gets its own sequential worker (a "lane"). Calls for one
//! block therefore reach the repository in submission order, while different
//! blocks persist concurrently. Order batches run on a separate lane and first
//! wait on a fence posted to every open block lane: a save submitted before a
//! reorder can never land after it.
//!
//! A save still queued when a newer save of the same block is submitted is
//! skipped; the newer one carries the complete block anyway.
//!
//! Delete, archive and unarchive close the block's lane. Should the same id be
//! used again later, the new lane waits for the old one to drain first.
//!
//! Lanes only live while they have work. A lane whose queue is empty is
//! released on the next submit or flush, and [`SyncController::flush`] also
//! reaps closed lanes, so the controller holds nothing for settled blocks.
//!
//! ## Save Status
//!
//! One global [`SaveStatus`], held in a `watch` channel and mirrored to the view
//! as [`ViewEvent::SaveStatusChanged`]:
//!
//! - `Saving` when an attempt starts,
//! - `Idle` when an attempt succeeds and nothing else is in flight,
//! - `Error` when an attempt fails.
//!
//! Failed writes are logged and dropped. Local state is never rolled back and
//! nothing is retried; the next successful write clears the error.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::{Result, ZenusError};
use crate::events::{EventSink, ViewEvent};
use crate::model::{Block, BlockId, OrderUpdate, SaveStatus, Space};
use crate::store::BlockRepository;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A change to persist, as submitted by the notebook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Save { space: Space, block: Block },
    Delete { space: Space, id: BlockId },
    UpdateOrders { space: Space, orders: Vec<OrderUpdate> },
    Archive { id: BlockId },
    Unarchive { id: BlockId },
}

impl Mutation {
    fn block_id(&self) -> Option<&BlockId> {
        match self {
            Mutation::Save { block, .. } => Some(&block.id),
            Mutation::Delete { id, .. } | Mutation::Archive { id } | Mutation::Unarchive { id } => {
                Some(id)
            }
            Mutation::UpdateOrders { .. } => None,
        }
    }

    /// Whether the block leaves its space, ending its lane.
    fn closes_lane(&self) -> bool {
        matches!(
            self,
            Mutation::Delete { .. } | Mutation::Archive { .. } | Mutation::Unarchive { .. }
        )
    }

    fn label(&self) -> &'static str {
        match self {
            Mutation::Save { .. } => "save_block",
            Mutation::Delete { .. } => "delete_block",
            Mutation::UpdateOrders { .. } => "update_orders",
            Mutation::Archive { .. } => "archive_block",
            Mutation::Unarchive { .. } => "unarchive_block",
        }
    }

    async fn apply(&self, repo: &dyn BlockRepository) -> Result<()> {
        match self {
            Mutation::Save { space, block } => repo.save_block(*space, block).await,
            Mutation::Delete { space, id } => repo.delete_block(*space, id).await,
            Mutation::UpdateOrders { space, orders } => repo.update_orders(*space, orders).await,
            Mutation::Archive { id } => repo.archive_block(id).await,
            Mutation::Unarchive { id } => repo.unarchive_block(id).await,
        }
    }
}

enum LaneJob {
    Run { seq: u64, mutation: Mutation },
    Fence(oneshot::Sender<()>),
}

struct OrdersJob {
    fences: Vec<oneshot::Receiver<()>>,
    mutation: Mutation,
}

struct Lane {
    tx: mpsc::UnboundedSender<LaneJob>,
    handle: JoinHandle<()>,
    /// Jobs sent and not yet finished by the worker.
    queued: Arc<AtomicUsize>,
}

impl Lane {
    fn send(&self, job: LaneJob) -> bool {
        self.queued.fetch_add(1, Ordering::SeqCst);
        if self.tx.send(job).is_err() {
            self.queued.fetch_sub(1, Ordering::SeqCst);
            return false;
        }
        true
    }

    fn is_idle(&self) -> bool {
        self.queued.load(Ordering::SeqCst) == 0
    }
}

/// State shared between the controller and its workers.
struct Shared {
    repo: Arc<dyn BlockRepository>,
    events: EventSink,
    status: watch::Sender<SaveStatus>,
    pending: watch::Sender<usize>,
    in_flight: Mutex<usize>,
    latest_save: Mutex<HashMap<BlockId, u64>>,
}

impl Shared {
    fn set_status(&self, status: SaveStatus) {
        let changed = self.status.send_if_modified(|current| {
            if *current == status {
                return false;
            }
            *current = status;
            true
        });
        if changed {
            self.events.emit(ViewEvent::SaveStatusChanged { status });
        }
    }

    fn is_superseded(&self, seq: u64, mutation: &Mutation) -> bool {
        let Mutation::Save { block, .. } = mutation else {
            return false;
        };
        lock(&self.latest_save)
            .get(&block.id)
            .is_some_and(|latest| *latest > seq)
    }

    async fn attempt(&self, mutation: &Mutation) {
        {
            let mut in_flight = lock(&self.in_flight);
            *in_flight += 1;
            self.set_status(SaveStatus::Saving);
        }

        let result = mutation.apply(self.repo.as_ref()).await;

        let mut in_flight = lock(&self.in_flight);
        *in_flight -= 1;
        match result {
            Ok(()) => {
                debug!(call = mutation.label(), "persisted");
                if *in_flight == 0 {
                    self.set_status(SaveStatus::Idle);
                }
            }
            Err(e) => {
                warn!(call = mutation.label(), error = %e, "persist failed");
                self.set_status(SaveStatus::Error);
            }
        }
    }

    fn settle(&self) {
        self.pending.send_modify(|n| *n = n.saturating_sub(1));
    }
}

// `queued` drops before the job is signalled as done, so once `pending`
// reaches zero every lane reads as idle.
async fn run_lane(
    mut rx: mpsc::UnboundedReceiver<LaneJob>,
    shared: Arc<Shared>,
    queued: Arc<AtomicUsize>,
    previous: Option<JoinHandle<()>>,
) {
    if let Some(previous) = previous {
        let _ = previous.await;
    }
    while let Some(job) = rx.recv().await {
        match job {
            LaneJob::Fence(done) => {
                queued.fetch_sub(1, Ordering::SeqCst);
                let _ = done.send(());
            }
            LaneJob::Run { seq, mutation } => {
                if shared.is_superseded(seq, &mutation) {
                    debug!(seq, "save superseded, skipped");
                } else {
                    shared.attempt(&mutation).await;
                }
                queued.fetch_sub(1, Ordering::SeqCst);
                shared.settle();
            }
        }
    }
}

async fn run_orders(mut rx: mpsc::UnboundedReceiver<OrdersJob>, shared: Arc<Shared>) {
    while let Some(job) = rx.recv().await {
        for fence in job.fences {
            let _ = fence.await;
        }
        shared.attempt(&job.mutation).await;
        shared.settle();
    }
}

pub struct SyncController {
    runtime: Handle,
    shared: Arc<Shared>,
    lanes: HashMap<BlockId, Lane>,
    retired: HashMap<BlockId, JoinHandle<()>>,
    orders: mpsc::UnboundedSender<OrdersJob>,
    next_seq: u64,
}

impl SyncController {
    /// Creates a controller bound to the current tokio runtime.
    pub fn new(repo: Arc<dyn BlockRepository>, events: EventSink) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|e| ZenusError::Runtime(e.to_string()))?;

        let (status, _) = watch::channel(SaveStatus::Idle);
        let (pending, _) = watch::channel(0usize);
        let shared = Arc::new(Shared {
            repo,
            events,
            status,
            pending,
            in_flight: Mutex::new(0),
            latest_save: Mutex::new(HashMap::new()),
        });

        let (orders, rx) = mpsc::unbounded_channel();
        runtime.spawn(run_orders(rx, shared.clone()));

        Ok(Self {
            runtime,
            shared,
            lanes: HashMap::new(),
            retired: HashMap::new(),
            orders,
            next_seq: 0,
        })
    }

    /// Enqueues a mutation. Never blocks and never fails: outcomes surface
    /// through the save status.
    pub fn submit(&mut self, mutation: Mutation) {
        self.next_seq += 1;
        let seq = self.next_seq;
        self.shared.pending.send_modify(|n| *n += 1);
        debug!(seq, call = mutation.label(), "submitted");
        self.release_idle();

        let Some(id) = mutation.block_id().cloned() else {
            let fences = self
                .lanes
                .values()
                .map(|lane| {
                    let (tx, rx) = oneshot::channel();
                    lane.send(LaneJob::Fence(tx));
                    rx
                })
                .collect();
            if self.orders.send(OrdersJob { fences, mutation }).is_err() {
                self.shared.settle();
            }
            return;
        };

        if matches!(mutation, Mutation::Save { .. }) {
            lock(&self.shared.latest_save).insert(id.clone(), seq);
        }
        let closes = mutation.closes_lane();

        if !self.lane(&id).send(LaneJob::Run { seq, mutation }) {
            self.shared.settle();
        }
        if closes {
            if let Some(lane) = self.lanes.remove(&id) {
                lock(&self.shared.latest_save).remove(&id);
                self.retired.insert(id, lane.handle);
            }
        }
    }

    fn lane(&mut self, id: &BlockId) -> &Lane {
        if !self.lanes.contains_key(id) {
            let (tx, rx) = mpsc::unbounded_channel();
            let queued = Arc::new(AtomicUsize::new(0));
            let previous = self.retired.remove(id);
            let handle = self.runtime.spawn(run_lane(
                rx,
                self.shared.clone(),
                queued.clone(),
                previous,
            ));
            self.lanes.insert(id.clone(), Lane { tx, handle, queued });
        }
        &self.lanes[id]
    }

    /// Drops lanes with nothing queued and closed lanes that have finished.
    ///
    /// Dropping a lane drops its sender, which ends the worker.
    fn release_idle(&mut self) {
        let mut latest_save = lock(&self.shared.latest_save);
        self.lanes.retain(|id, lane| {
            let keep = !lane.is_idle();
            if !keep {
                latest_save.remove(id);
            }
            keep
        });
        self.retired.retain(|_, handle| !handle.is_finished());
    }

    pub fn status(&self) -> SaveStatus {
        *self.shared.status.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<SaveStatus> {
        self.shared.status.subscribe()
    }

    /// Number of submitted mutations not yet attempted to completion.
    pub fn pending(&self) -> usize {
        *self.shared.pending.borrow()
    }

    /// Waits until every submitted mutation has been attempted, then releases
    /// every lane.
    pub async fn flush(&mut self) {
        let mut rx = self.shared.pending.subscribe();
        let _ = rx.wait_for(|n| *n == 0).await;
        for (_, handle) in self.retired.drain() {
            let _ = handle.await;
        }
        self.release_idle();
    }
}
