//! # Rendering
//!
//! Every function here turns library values into a ready-to-print string.
//! Layout (width, truncation, padding) is computed on plain text with
//! Unicode-aware widths; styles are applied last, so ANSI codes never skew
//! alignment.

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};
use zenus::model::{Block, Space};
use zenus::refs::{scan, ReferenceSpan};

use super::styles;

pub const TITLE_WIDTH: usize = 40;
pub const COLLAPSED_MARKER: &str = "▸";
pub const EXPANDED_MARKER: &str = " ";
const ELLIPSIS: char = '…';

/// A block with its 1-based position in the current listing.
pub struct Listed<'a> {
    pub position: usize,
    pub block: &'a Block,
}

fn display_title(block: &Block) -> String {
    let title = block.title.lines().next().unwrap_or("").trim();
    if title.is_empty() {
        "Untitled".to_string()
    } else {
        title.to_string()
    }
}

fn styled_title(block: &Block, text: &str) -> String {
    if block.title.trim().is_empty() {
        styles::UNTITLED.apply_to(text).to_string()
    } else {
        styles::TITLE.apply_to(text).to_string()
    }
}

/// Truncates `text` to `width` columns (ending in `…` when cut) and pads it
/// with spaces to exactly `width`.
pub fn fit(text: &str, width: usize) -> String {
    let mut out = String::new();
    if text.width() <= width {
        out.push_str(text);
    } else {
        let mut used = 0;
        for ch in text.chars() {
            let w = ch.width().unwrap_or(0);
            if used + w + 1 > width {
                break;
            }
            out.push(ch);
            used += w;
        }
        out.push(ELLIPSIS);
    }
    let pad = width.saturating_sub(out.width());
    out.extend(std::iter::repeat(' ').take(pad));
    out
}

fn tags(block: &Block) -> String {
    block
        .tags
        .iter()
        .map(|t| styles::tag(t).apply_to(format!("#{}", t)).to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn list(space: Space, blocks: &[Listed<'_>]) -> String {
    if blocks.is_empty() {
        let empty = match space {
            Space::Active => "No blocks yet. Create one with `zenus new`.",
            Space::Archived => "The archive is empty.",
        };
        return format!("{}\n", styles::MUTED.apply_to(empty));
    }

    let mut out = String::new();
    for listed in blocks {
        let block = listed.block;
        let marker = if block.is_collapsed {
            COLLAPSED_MARKER
        } else {
            EXPANDED_MARKER
        };
        let title = fit(&display_title(block), TITLE_WIDTH);
        let line = format!(
            "{} {} {} {}",
            styles::INDEX.apply_to(format!("{:>3}.", listed.position)),
            marker,
            styled_title(block, &title),
            tags(block)
        );
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

/// Content with every `[[reference]]` highlighted.
fn highlight_references(content: &str) -> String {
    let mut out = String::new();
    let mut cursor = 0;
    for span in scan(content) {
        out.push_str(&content[cursor..span.range.start]);
        out.push_str(
            &styles::REFERENCE
                .apply_to(&content[span.range.clone()])
                .to_string(),
        );
        cursor = span.range.end;
    }
    out.push_str(&content[cursor..]);
    out
}

pub fn block(listed: &Listed<'_>) -> String {
    let block = listed.block;
    let mut out = format!(
        "{} {}\n",
        styles::INDEX.apply_to(format!("{}.", listed.position)),
        styled_title(block, &display_title(block))
    );
    out.push_str(&format!("{}\n", styles::MUTED.apply_to(block.id.as_str())));
    if !block.tags.is_empty() {
        out.push_str(&tags(block));
        out.push('\n');
    }
    if !block.content.is_empty() {
        out.push('\n');
        out.push_str(&highlight_references(&block.content));
        if !block.content.ends_with('\n') {
            out.push('\n');
        }
    }
    out
}

/// One reference and the block it resolves to, if any.
pub struct ReferenceRow<'a> {
    pub span: &'a ReferenceSpan,
    pub target: Option<Listed<'a>>,
}

pub fn references(rows: &[ReferenceRow<'_>]) -> String {
    if rows.is_empty() {
        return format!("{}\n", styles::MUTED.apply_to("No references."));
    }
    let mut out = String::new();
    for row in rows {
        let target = match &row.target {
            Some(listed) => format!(
                "{} {}",
                styles::INDEX.apply_to(format!("{}.", listed.position)),
                display_title(listed.block)
            ),
            None => styles::MUTED.apply_to("(unresolved)").to_string(),
        };
        out.push_str(&format!(
            "{} -> {}\n",
            styles::REFERENCE.apply_to(format!("[[{}]]", row.span.title)),
            target
        ));
    }
    out
}

pub fn success(message: &str) -> String {
    format!("{}\n", styles::SUCCESS.apply_to(message))
}

pub fn not_found(what: &str) -> String {
    format!("{}\n", styles::WARNING.apply_to(format!("Nothing matches {}", what)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use console::strip_ansi_codes;
    use zenus::model::BlockId;

    fn titled(title: &str) -> Block {
        let mut b = Block::new(BlockId::new("00000000000000000001"), 0);
        b.title = title.to_string();
        b
    }

    #[test]
    fn fit_pads_short_text() {
        assert_eq!(fit("abc", 5), "abc  ");
    }

    #[test]
    fn fit_truncates_with_ellipsis() {
        let out = fit("abcdefgh", 5);
        assert_eq!(out, "abcd…");
        assert_eq!(out.width(), 5);
    }

    #[test]
    fn fit_counts_wide_characters() {
        let out = fit("日本語のタイトル", 7);
        assert_eq!(out.width(), 7);
        assert!(out.contains('…'));
    }

    #[test]
    fn list_shows_positions_titles_and_tags() {
        let mut a = titled("Groceries");
        a.tags = vec!["home".into()];
        let mut b = titled("");
        b.is_collapsed = true;
        let rows = [
            Listed { position: 1, block: &a },
            Listed { position: 2, block: &b },
        ];
        let out = strip_ansi_codes(&list(Space::Active, &rows)).to_string();
        let lines: Vec<_> = out.lines().collect();
        assert!(lines[0].starts_with("  1."));
        assert!(lines[0].contains("Groceries"));
        assert!(lines[0].ends_with("#home"));
        assert!(lines[1].contains(COLLAPSED_MARKER));
        assert!(lines[1].contains("Untitled"));
    }

    #[test]
    fn empty_archive_message() {
        let out = strip_ansi_codes(&list(Space::Archived, &[])).to_string();
        assert_eq!(out, "The archive is empty.\n");
    }

    #[test]
    fn block_shows_content_verbatim() {
        let mut b = titled("Plan");
        b.content = "see [[Other]] soon".into();
        let out = strip_ansi_codes(&block(&Listed { position: 3, block: &b })).to_string();
        assert!(out.starts_with("3. Plan\n"));
        assert!(out.ends_with("\nsee [[Other]] soon\n"));
    }

    #[test]
    fn references_mark_unresolved() {
        let spans = scan("[[A]] [[B]]");
        let target = titled("A");
        let rows = [
            ReferenceRow {
                span: &spans[0],
                target: Some(Listed { position: 1, block: &target }),
            },
            ReferenceRow { span: &spans[1], target: None },
        ];
        let out = strip_ansi_codes(&references(&rows)).to_string();
        assert_eq!(out, "[[A]] -> 1. A\n[[B]] -> (unresolved)\n");
    }
}
