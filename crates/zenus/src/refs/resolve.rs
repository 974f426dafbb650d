//! Maps a reference title to the block it names.
//!
//! Matching is case-sensitive on whitespace-trimmed titles; the first block in
//! display order wins. Untitled blocks can never be targets. An unresolved
//! title is not an error, the caller just does not navigate.

use crate::model::Block;

pub fn resolve<'a, I>(blocks: I, title: &str) -> Option<&'a Block>
where
    I: IntoIterator<Item = &'a Block>,
{
    let wanted = title.trim();
    if wanted.is_empty() {
        return None;
    }
    blocks.into_iter().find(|b| b.title.trim() == wanted)
}
