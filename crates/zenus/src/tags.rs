//! Block tags.
//!
//! Tags are free-form labels attached to a block. A block's tag list keeps
//! insertion order for display and never holds the same tag twice. Tags are
//! mutated only through explicit add/remove.
//!
//! ## Tag Naming Rules
//!
//! - Surrounding whitespace is trimmed
//! - Empty names are rejected
//! - Control characters (newlines, tabs) are rejected
//! - Comparison is case-sensitive: `Work` and `work` are distinct tags
//!
//! ## Colors
//!
//! Views color tags through [`tag_color`], a stable hash into a fixed palette:
//! the same tag always gets the same color.

use serde::Serialize;

/// Normalizes a raw tag name, returning `None` when it is not a usable tag.
///
/// # Examples
/// ```
/// use zenus::tags::normalize_tag;
///
/// assert_eq!(normalize_tag("  work "), Some("work".to_string()));
/// assert_eq!(normalize_tag("deep work"), Some("deep work".to_string()));
/// assert_eq!(normalize_tag("   "), None);
/// assert_eq!(normalize_tag("a\nb"), None);
/// ```
pub fn normalize_tag(raw: &str) -> Option<String> {
    let name = raw.trim();
    if name.is_empty() || name.chars().any(char::is_control) {
        return None;
    }
    Some(name.to_string())
}

/// Appends a tag unless it is invalid or already present.
pub fn add_tag(tags: &mut Vec<String>, raw: &str) -> bool {
    let Some(name) = normalize_tag(raw) else {
        return false;
    };
    if tags.contains(&name) {
        return false;
    }
    tags.push(name);
    true
}

/// Removes a tag if present.
pub fn remove_tag(tags: &mut Vec<String>, raw: &str) -> bool {
    let Some(name) = normalize_tag(raw) else {
        return false;
    };
    let before = tags.len();
    tags.retain(|t| t != &name);
    tags.len() != before
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TagColor {
    Red,
    Orange,
    Yellow,
    Green,
    Teal,
    Blue,
    Purple,
    Pink,
}

const PALETTE: [TagColor; 8] = [
    TagColor::Red,
    TagColor::Orange,
    TagColor::Yellow,
    TagColor::Green,
    TagColor::Teal,
    TagColor::Blue,
    TagColor::Purple,
    TagColor::Pink,
];

/// Picks the palette color for a tag (FNV-1a over its bytes).
pub fn tag_color(tag: &str) -> TagColor {
    let mut hash: u32 = 0x811c_9dc5;
    for byte in tag.bytes() {
        hash ^= u32::from(byte);
        hash = hash.wrapping_mul(0x0100_0193);
    }
    PALETTE[(hash as usize) % PALETTE.len()]
}
