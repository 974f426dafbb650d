//! # Domain Model: Blocks and Spaces
//!
//! A notebook is a freely ordered list of independent [`Block`]s. Each block
//! carries a title, a markdown body, a set of tags and a collapse flag, and
//! lives in exactly one [`Space`]: the active list or the archive.
//!
//! ## Persisted Record Shape
//!
//! Blocks serialize to the record every repository speaks:
//!
//! ```text
//! { "id": "...", "title": "...", "content": "...",
//!   "tags": ["..."], "isCollapsed": false, "order": 0 }
//! ```
//!
//! Archived blocks use the same shape. Which space a record belongs to is a
//! property of where it was fetched from, never of the record itself.
//!
//! ## Ordering
//!
//! `order` sorts blocks inside their space. Orders are unique and follow the
//! display order; a reorder makes them the zero-based positions `0..N-1`
//! again, while deletes may leave gaps (see [`crate::document::Document`]).

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use crate::tags;

/// Stable identifier of a block.
///
/// Generated ids are fixed-width decimal strings (see [`crate::id`]), but ids
/// written by other generators may be shorter. Comparison is numeric when both
/// sides are all digits so that generation order survives either way.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(String);

impl BlockId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn numeric(&self) -> Option<&str> {
        if !self.0.is_empty() && self.0.bytes().all(|b| b.is_ascii_digit()) {
            Some(self.0.trim_start_matches('0'))
        } else {
            None
        }
    }
}

impl Ord for BlockId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.numeric(), other.numeric()) {
            (Some(a), Some(b)) => a
                .len()
                .cmp(&b.len())
                .then_with(|| a.cmp(b))
                .then_with(|| self.0.cmp(&other.0)),
            _ => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for BlockId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BlockId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for BlockId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// The two disjoint membership partitions of a notebook.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Space {
    #[default]
    Active,
    Archived,
}

impl Space {
    pub fn other(self) -> Self {
        match self {
            Space::Active => Space::Archived,
            Space::Archived => Space::Active,
        }
    }
}

impl fmt::Display for Space {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Space::Active => f.write_str("active"),
            Space::Archived => f.write_str("archived"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub id: BlockId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    /// Display order is insertion order; duplicates are never stored.
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_collapsed: bool,
    #[serde(default)]
    pub order: u32,
}

impl Block {
    pub fn new(id: BlockId, order: u32) -> Self {
        Self {
            id,
            title: String::new(),
            content: String::new(),
            tags: Vec::new(),
            is_collapsed: false,
            order,
        }
    }

    /// Applies a field update in place.
    ///
    /// Returns `true` when the block actually changed. Adding a tag the block
    /// already has, or removing one it lacks, leaves it untouched.
    pub fn apply(&mut self, update: FieldUpdate) -> bool {
        match update {
            FieldUpdate::Title(title) => replace(&mut self.title, title),
            FieldUpdate::Content(content) => replace(&mut self.content, content),
            FieldUpdate::AddTag(tag) => tags::add_tag(&mut self.tags, &tag),
            FieldUpdate::RemoveTag(tag) => tags::remove_tag(&mut self.tags, &tag),
            FieldUpdate::Collapsed(flag) => replace(&mut self.is_collapsed, flag),
        }
    }

    /// Case-insensitive substring match over title and content.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        query.is_empty()
            || self.title.to_lowercase().contains(&query)
            || self.content.to_lowercase().contains(&query)
    }
}

fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}

/// A single-field edit of a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldUpdate {
    Title(String),
    Content(String),
    AddTag(String),
    RemoveTag(String),
    Collapsed(bool),
}

/// Outcome of the most recent persistence attempt, global to the session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveStatus {
    #[default]
    Idle,
    Saving,
    Error,
}

/// One `(id, order)` pair of a batched reindex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderUpdate {
    pub id: BlockId,
    pub order: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_serializes_to_record_shape() {
        let mut block = Block::new(BlockId::new("42"), 3);
        block.title = "Plan".into();
        block.tags = vec!["work".into()];
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["id"], "42");
        assert_eq!(json["isCollapsed"], false);
        assert_eq!(json["order"], 3);
        assert_eq!(json["tags"][0], "work");
    }

    #[test]
    fn block_deserializes_with_missing_optional_fields() {
        let block: Block = serde_json::from_str(r#"{"id":"7","title":"x"}"#).unwrap();
        assert_eq!(block.content, "");
        assert!(block.tags.is_empty());
        assert!(!block.is_collapsed);
        assert_eq!(block.order, 0);
    }

    #[test]
    fn numeric_ids_compare_numerically() {
        assert!(BlockId::new("9") < BlockId::new("10"));
        assert!(BlockId::new("00000000000000000010") > BlockId::new("9"));
        assert!(BlockId::new("abc") < BlockId::new("abd"));
    }

    #[test]
    fn apply_reports_changes() {
        let mut block = Block::new(BlockId::new("1"), 0);
        assert!(block.apply(FieldUpdate::Title("A".into())));
        assert!(!block.apply(FieldUpdate::Title("A".into())));
        assert!(block.apply(FieldUpdate::Collapsed(true)));
        assert!(block.is_collapsed);
    }

    #[test]
    fn add_tag_twice_keeps_single_entry() {
        let mut block = Block::new(BlockId::new("x"), 0);
        assert!(block.apply(FieldUpdate::AddTag("work".into())));
        assert!(!block.apply(FieldUpdate::AddTag("work".into())));
        assert_eq!(block.tags, vec!["work".to_string()]);
    }

    #[test]
    fn matches_is_case_insensitive() {
        let mut block = Block::new(BlockId::new("1"), 0);
        block.title = "Groceries".into();
        block.content = "Milk and EGGS".into();
        assert!(block.matches("grocer"));
        assert!(block.matches("eggs"));
        assert!(block.matches(""));
        assert!(!block.matches("bread"));
    }

    #[test]
    fn space_other_flips() {
        assert_eq!(Space::Active.other(), Space::Archived);
        assert_eq!(Space::Archived.other(), Space::Active);
    }
}
