//! # Drag-and-Drop Reordering
//!
//! A drag ends with `(source, destination)` positions over the list the user
//! is *looking at*, which may be a search-filtered subset of the space. The
//! algorithm therefore works on identities, never on raw positions:
//!
//! 1. `visible[source]` is the block being moved.
//! 2. `visible[destination]` is the block whose slot it takes.
//! 3. Inside the full sequence, the moved block is taken out and reinserted at
//!    the anchor's position: before the anchor when moving up, after it when
//!    moving down.
//!
//! Without a filter `visible == full` and this is exactly "remove at source,
//! insert at destination". With a filter, blocks hidden by the search keep
//! their relative order and never get overwritten.
//!
//! The caller recomputes `order` as the new positional index of every block
//! (see [`order_updates`]) and persists the whole mapping in one batch.

use crate::model::{BlockId, OrderUpdate};

/// Drag-end event from the host view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragEnd {
    pub source: usize,
    /// `None` when the drag was cancelled.
    pub destination: Option<usize>,
}

impl DragEnd {
    pub fn new(source: usize, destination: usize) -> Self {
        Self {
            source,
            destination: Some(destination),
        }
    }

    pub fn cancelled(source: usize) -> Self {
        Self {
            source,
            destination: None,
        }
    }
}

/// Computes the new full sequence for a drag over `visible`.
///
/// Returns `None` when nothing moves: cancelled drag, empty list, source out
/// of range, or a drop back onto the same block. A destination past the end
/// of `visible` clamps to its last element.
pub fn reorder(full: &[BlockId], visible: &[BlockId], drag: DragEnd) -> Option<Vec<BlockId>> {
    let destination = drag.destination?;
    let moved = visible.get(drag.source)?;
    let anchor = visible.get(destination.min(visible.len().checked_sub(1)?))?;
    if moved == anchor {
        return None;
    }

    let from = full.iter().position(|id| id == moved)?;
    let to = full.iter().position(|id| id == anchor)?;

    let mut sequence = full.to_vec();
    let item = sequence.remove(from);
    sequence.insert(to, item);
    Some(sequence)
}

/// Assigns contiguous orders `0..N-1` following the sequence.
pub fn order_updates(sequence: &[BlockId]) -> Vec<OrderUpdate> {
    sequence
        .iter()
        .enumerate()
        .map(|(index, id)| OrderUpdate {
            id: id.clone(),
            order: index as u32,
        })
        .collect()
}
