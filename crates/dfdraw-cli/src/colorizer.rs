//! Terminal colorization for validation reports
//!
//! Applies ANSI escape codes to report lines using crossterm.

use crossterm::style::{Color, Stylize};

const OK_MARK: &str = "✓";
const ISSUE_MARK: &str = "✗";

/// Whether report lines carry ANSI colors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    enabled: bool,
}

impl Palette {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    fn paint(&self, text: &str, color: Color) -> String {
        if self.enabled {
            format!("{}", text.with(color))
        } else {
            text.to_string()
        }
    }
}

/// A passing check: green check mark, plain message
pub fn paint_ok(palette: &Palette, message: &str) -> String {
    format!("{} {}", palette.paint(OK_MARK, Color::Green), message)
}

/// A problem with the document: red cross, element ids highlighted
pub fn paint_issue(palette: &Palette, message: &str) -> String {
    format!(
        "{} {}",
        palette.paint(ISSUE_MARK, Color::Red),
        highlight_quoted(palette, message)
    )
}

/// Color the single-quoted spans of `message` (ids in issue text) yellow
fn highlight_quoted(palette: &Palette, message: &str) -> String {
    if !palette.enabled {
        return message.to_string();
    }

    let mut result = String::with_capacity(message.len() * 2);
    let mut parts = message.split('\'');
    if let Some(first) = parts.next() {
        result.push_str(first);
    }
    for (i, part) in parts.enumerate() {
        result.push('\'');
        if i % 2 == 0 {
            result.push_str(&palette.paint(part, Color::Yellow));
        } else {
            result.push_str(part);
        }
    }
    result
}
