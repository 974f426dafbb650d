//! # The Document
//!
//! A [`Document`] is the ordered sequence of blocks of one [`Space`]. It is the
//! in-memory truth the view renders; the repository is only ever told about
//! changes after they happened here.
//!
//! ## Invariants
//!
//! - Block ids are unique.
//! - `order` values are unique and strictly increase along the visual order.
//! - All blocks belong to the document's space.
//!
//! ## Gaps
//!
//! Removing a block (delete, archive, unarchive) leaves its `order` unused.
//! Nothing is renumbered, so every stored order stays exactly what the
//! repository holds. New blocks append after the last order. Orders become
//! contiguous again (`0..N-1`) on the next reorder, whose batch carries every
//! block.
//!
//! Stored orders that collide (hand-written files, an older writer) are
//! renumbered by [`Document::from_stored`], which reports it so the caller can
//! persist the repaired mapping.

use crate::model::{Block, BlockId, OrderUpdate, Space};
use crate::reorder::{self, DragEnd};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Default)]
pub struct Document {
    space: Space,
    blocks: Vec<Block>,
}

impl Document {
    pub fn new(space: Space) -> Self {
        Self {
            space,
            blocks: Vec::new(),
        }
    }

    /// Builds a document from stored blocks. See [`Document::from_stored`].
    pub fn from_blocks(space: Space, blocks: Vec<Block>) -> Self {
        Self::from_stored(space, blocks).0
    }

    /// Builds a document from stored blocks.
    ///
    /// Duplicate ids are dropped (first wins) and blocks are sorted by their
    /// stored `(order, id)`. Stored orders are kept as they are unless two
    /// blocks share one or the last leaves no room to append; then all blocks
    /// are renumbered to `0..N-1` and the flag is `true`.
    pub fn from_stored(space: Space, blocks: Vec<Block>) -> (Self, bool) {
        let mut seen = HashSet::new();
        let mut blocks: Vec<Block> = blocks
            .into_iter()
            .filter(|b| seen.insert(b.id.clone()))
            .collect();
        blocks.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.id.cmp(&b.id)));

        let mut document = Self { space, blocks };
        let repair = !document.is_well_ordered() || document.next_order().is_none();
        if repair {
            document.renumber();
        }
        (document, repair)
    }

    pub fn space(&self) -> Space {
        self.space
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn ids(&self) -> Vec<BlockId> {
        self.blocks.iter().map(|b| b.id.clone()).collect()
    }

    pub fn get(&self, id: &BlockId) -> Option<&Block> {
        self.blocks.iter().find(|b| &b.id == id)
    }

    pub(crate) fn get_mut(&mut self, id: &BlockId) -> Option<&mut Block> {
        self.blocks.iter_mut().find(|b| &b.id == id)
    }

    pub fn position(&self, id: &BlockId) -> Option<usize> {
        self.blocks.iter().position(|b| &b.id == id)
    }

    /// The order a block appended now would get, `None` once `u32::MAX` is
    /// taken.
    pub fn next_order(&self) -> Option<u32> {
        match self.blocks.last() {
            Some(last) => last.order.checked_add(1),
            None => Some(0),
        }
    }

    /// Appends a block at the end, assigning it [`Document::next_order`].
    ///
    /// Returns `false` (and leaves the document untouched) if the id is
    /// already present or no order is left.
    pub(crate) fn push(&mut self, mut block: Block) -> bool {
        if self.get(&block.id).is_some() {
            return false;
        }
        let Some(order) = self.next_order() else {
            return false;
        };
        block.order = order;
        self.blocks.push(block);
        true
    }

    /// Removes a block. The remaining orders are left alone.
    pub(crate) fn remove(&mut self, id: &BlockId) -> Option<Block> {
        let index = self.position(id)?;
        Some(self.blocks.remove(index))
    }

    /// Renumbers to `0..N-1` and returns the full mapping, or `None` if the
    /// orders already were contiguous.
    pub(crate) fn compact(&mut self) -> Option<Vec<OrderUpdate>> {
        if self.is_compact() {
            return None;
        }
        self.renumber();
        Some(reorder::order_updates(&self.ids()))
    }

    /// Applies a drag over the blocks currently shown for `filter`.
    ///
    /// On success the document is reordered and the full `(id, order)`
    /// mapping is returned for persistence.
    pub(crate) fn reorder(&mut self, drag: DragEnd, filter: Option<&str>) -> Option<Vec<OrderUpdate>> {
        let full = self.ids();
        let visible: Vec<BlockId> = self.filtered(filter.unwrap_or("")).map(|b| b.id.clone()).collect();
        let sequence = reorder::reorder(&full, &visible, drag)?;
        let updates = reorder::order_updates(&sequence);
        self.apply_orders(&updates);
        Some(updates)
    }

    /// Sorts blocks by the given orders (blocks not in `updates` keep their
    /// own) and renumbers to `0..N-1` if the sequence changed.
    ///
    /// Unknown ids are ignored. When the sequence stays the same nothing is
    /// touched, so applying a mapping twice changes nothing the second time.
    /// Returns whether anything moved.
    pub fn apply_orders(&mut self, updates: &[OrderUpdate]) -> bool {
        let wanted: HashMap<&BlockId, u32> = updates.iter().map(|u| (&u.id, u.order)).collect();
        let before = self.ids();

        let mut keyed: Vec<(u32, Block)> = std::mem::take(&mut self.blocks)
            .into_iter()
            .map(|b| (wanted.get(&b.id).copied().unwrap_or(b.order), b))
            .collect();
        keyed.sort_by(|(x, a), (y, b)| x.cmp(y).then_with(|| a.id.cmp(&b.id)));
        let moved = !keyed.iter().map(|(_, b)| &b.id).eq(before.iter());

        self.blocks = keyed.into_iter().map(|(_, b)| b).collect();
        if moved {
            self.renumber();
        }
        moved
    }

    /// Blocks whose title or content contains `query`, case-insensitively,
    /// in display order.
    pub fn filtered<'a>(&'a self, query: &str) -> impl Iterator<Item = &'a Block> + 'a {
        let query = query.to_lowercase();
        self.blocks.iter().filter(move |b| b.matches(&query))
    }

    /// Orders are unique and follow the display order.
    pub fn is_well_ordered(&self) -> bool {
        self.blocks.windows(2).all(|pair| pair[0].order < pair[1].order)
    }

    /// Orders are exactly `0..N-1`.
    pub fn is_compact(&self) -> bool {
        self.blocks
            .iter()
            .enumerate()
            .all(|(i, b)| b.order as usize == i)
    }

    fn renumber(&mut self) {
        for (index, block) in self.blocks.iter_mut().enumerate() {
            block.order = index as u32;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(id: &str, order: u32) -> Block {
        let mut b = Block::new(BlockId::new(id), order);
        b.title = id.to_string();
        b
    }

    fn titles(doc: &Document) -> Vec<&str> {
        doc.blocks().iter().map(|b| b.title.as_str()).collect()
    }

    #[test]
    fn from_blocks_sorts_and_keeps_stored_orders() {
        let (doc, repaired) = Document::from_stored(
            Space::Active,
            vec![block("c", 7), block("a", 0), block("b", 3)],
        );
        assert!(!repaired);
        assert_eq!(titles(&doc), vec!["a", "b", "c"]);
        let orders: Vec<u32> = doc.blocks().iter().map(|b| b.order).collect();
        assert_eq!(orders, vec![0, 3, 7]);
        assert!(doc.is_well_ordered());
        assert!(!doc.is_compact());
    }

    #[test]
    fn from_stored_renumbers_colliding_orders() {
        let (doc, repaired) = Document::from_stored(
            Space::Active,
            vec![block("b", 4), block("a", 4), block("c", 9)],
        );
        assert!(repaired);
        assert_eq!(titles(&doc), vec!["a", "b", "c"]);
        assert!(doc.is_compact());
    }

    #[test]
    fn from_stored_renumbers_when_no_order_is_left() {
        let (doc, repaired) =
            Document::from_stored(Space::Active, vec![block("a", 2), block("b", u32::MAX)]);
        assert!(repaired);
        assert_eq!(doc.next_order(), Some(2));
    }

    #[test]
    fn from_blocks_breaks_order_ties_by_id() {
        let doc = Document::from_blocks(Space::Active, vec![block("2", 0), block("1", 0)]);
        assert_eq!(titles(&doc), vec!["1", "2"]);
    }

    #[test]
    fn from_blocks_drops_duplicate_ids() {
        let mut dup = block("a", 5);
        dup.title = "second".into();
        let doc = Document::from_blocks(Space::Active, vec![block("a", 0), dup]);
        assert_eq!(doc.len(), 1);
        assert_eq!(doc.blocks()[0].title, "a");
    }

    #[test]
    fn push_assigns_next_order() {
        let mut doc = Document::new(Space::Active);
        assert!(doc.push(block("a", 99)));
        assert!(doc.push(block("b", 99)));
        assert!(!doc.push(block("a", 0)));
        assert_eq!(doc.blocks()[1].order, 1);
        assert!(doc.is_compact());
    }

    #[test]
    fn remove_leaves_gap_and_push_appends_after_it() {
        let mut doc = Document::from_blocks(
            Space::Active,
            vec![block("a", 0), block("b", 1), block("c", 2)],
        );
        assert!(doc.remove(&BlockId::new("a")).is_some());
        assert!(doc.remove(&BlockId::new("b")).is_some());
        assert_eq!(doc.blocks()[0].order, 2);
        assert!(doc.push(block("d", 0)));
        assert_eq!(doc.blocks()[1].order, 3);
        assert!(doc.is_well_ordered());
        assert!(doc.remove(&BlockId::new("missing")).is_none());
    }

    #[test]
    fn compact_renumbers_once() {
        let mut doc = Document::from_blocks(Space::Active, vec![block("a", 3), block("b", 8)]);
        let updates = doc.compact().unwrap();
        assert_eq!(updates.len(), 2);
        assert!(doc.is_compact());
        assert!(doc.compact().is_none());
    }

    #[test]
    fn apply_orders_is_idempotent() {
        let mut doc = Document::from_blocks(
            Space::Active,
            vec![block("a", 0), block("b", 1), block("c", 2)],
        );
        let mapping = vec![
            OrderUpdate { id: BlockId::new("c"), order: 0 },
            OrderUpdate { id: BlockId::new("a"), order: 1 },
            OrderUpdate { id: BlockId::new("b"), order: 2 },
        ];
        assert!(doc.apply_orders(&mapping));
        let after_first = doc.blocks().to_vec();
        assert!(!doc.apply_orders(&mapping));
        assert_eq!(doc.blocks(), after_first.as_slice());
        assert_eq!(titles(&doc), vec!["c", "a", "b"]);
    }

    #[test]
    fn partial_mapping_moves_once() {
        let mut doc = Document::from_blocks(
            Space::Active,
            vec![block("a", 0), block("b", 1), block("c", 2)],
        );
        let mapping = vec![OrderUpdate { id: BlockId::new("a"), order: 5 }];
        assert!(doc.apply_orders(&mapping));
        assert_eq!(titles(&doc), vec!["b", "c", "a"]);
        assert!(doc.is_compact());
        assert!(!doc.apply_orders(&mapping));
        assert!(!doc.apply_orders(&[OrderUpdate { id: BlockId::new("zz"), order: 0 }]));
    }

    #[test]
    fn unchanged_sequence_keeps_stored_orders() {
        let mut doc = Document::from_blocks(Space::Active, vec![block("a", 0), block("c", 2)]);
        let mapping = vec![
            OrderUpdate { id: BlockId::new("a"), order: 0 },
            OrderUpdate { id: BlockId::new("c"), order: 1 },
        ];
        assert!(!doc.apply_orders(&mapping));
        assert_eq!(doc.blocks()[1].order, 2);
    }

    #[test]
    fn reorder_with_filter_keeps_hidden_blocks() {
        let mut doc = Document::from_blocks(
            Space::Active,
            vec![block("apple", 0), block("kiwi", 1), block("apricot", 2)],
        );
        let updates = doc.reorder(DragEnd::new(1, 0), Some("ap")).unwrap();
        assert_eq!(updates.len(), 3);
        assert_eq!(titles(&doc), vec!["apricot", "apple", "kiwi"]);
        assert!(doc.is_compact());
    }

    #[test]
    fn filtered_matches_title_or_content() {
        let mut note = block("n", 0);
        note.content = "see the Roadmap".into();
        let doc = Document::from_blocks(Space::Active, vec![note, block("other", 1)]);
        assert_eq!(doc.filtered("roadmap").count(), 1);
        assert_eq!(doc.filtered("").count(), 2);
    }

    #[test]
    fn filtered_outlives_the_query() {
        let doc = Document::from_blocks(Space::Active, vec![block("Milk", 0)]);
        let hits: Vec<&Block> = {
            let query = String::from("MILK");
            doc.filtered(&query).collect()
        };
        assert_eq!(hits.len(), 1);
    }
}
