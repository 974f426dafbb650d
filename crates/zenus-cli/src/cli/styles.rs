//! Terminal styles for the zenus CLI.
//!
//! Code refers to styles by meaning (`TITLE`, `MUTED`), never by color.
//! Tag colors come from the library's stable palette so a tag looks the same
//! everywhere.

use console::{Color, Style};
use once_cell::sync::Lazy;
use zenus::tags::{tag_color, TagColor};

pub static INDEX: Lazy<Style> = Lazy::new(|| Style::new().yellow());
pub static TITLE: Lazy<Style> = Lazy::new(|| Style::new().bold());
pub static UNTITLED: Lazy<Style> = Lazy::new(|| Style::new().dim().italic());
pub static MUTED: Lazy<Style> = Lazy::new(|| Style::new().color256(244));
pub static REFERENCE: Lazy<Style> = Lazy::new(|| Style::new().cyan().underlined());
pub static SUCCESS: Lazy<Style> = Lazy::new(|| Style::new().green());
pub static WARNING: Lazy<Style> = Lazy::new(|| Style::new().yellow().bold());

pub fn tag(name: &str) -> Style {
    let color = match tag_color(name) {
        TagColor::Red => Color::Red,
        TagColor::Orange => Color::Color256(208),
        TagColor::Yellow => Color::Yellow,
        TagColor::Green => Color::Green,
        TagColor::Teal => Color::Cyan,
        TagColor::Blue => Color::Blue,
        TagColor::Purple => Color::Magenta,
        TagColor::Pink => Color::Color256(205),
    };
    Style::new().fg(color)
}
