//! Inline run with a style bitmask

use serde::{Deserialize, Serialize};
use std::ops::{BitOr, BitOrAssign};

/// Style bitmask for a [`Run`].
///
/// Styles combine with `|`: `RunStyle::BOLD | RunStyle::ITALIC`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStyle(u8);

impl RunStyle {
    pub const NORMAL: RunStyle = RunStyle(0);
    pub const ITALIC: RunStyle = RunStyle(1 << 0);
    pub const BOLD: RunStyle = RunStyle(1 << 1);
    /// Text is LaTeX source rendered through the formula transform.
    pub const FORMULA: RunStyle = RunStyle(1 << 2);
    pub const SUPERSCRIPT: RunStyle = RunStyle(1 << 3);
    pub const SUBSCRIPT: RunStyle = RunStyle(1 << 4);
    /// Text is an unresolved reference alias; cleared by the resolution pass.
    pub const REFERENCE: RunStyle = RunStyle(1 << 5);

    pub fn contains(self, other: RunStyle) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for RunStyle {
    type Output = RunStyle;

    fn bitor(self, rhs: RunStyle) -> RunStyle {
        RunStyle(self.0 | rhs.0)
    }
}

impl BitOrAssign for RunStyle {
    fn bitor_assign(&mut self, rhs: RunStyle) {
        self.0 |= rhs.0;
    }
}

/// A styled span of literal text within a [`crate::types::Text`] paragraph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub text: String,
    pub style: RunStyle,

    /// A tab-stop run renders as a right-aligned tab to the page margin
    /// instead of text (page-number style lines).
    pub tab_stop: bool,
}

impl Run {
    pub fn new(text: impl Into<String>, style: RunStyle) -> Self {
        Self {
            text: text.into(),
            style,
            tab_stop: false,
        }
    }

    /// Create the special right-aligned tab-stop run
    pub fn tab_stop() -> Self {
        Self {
            text: String::new(),
            style: RunStyle::NORMAL,
            tab_stop: true,
        }
    }

    pub fn is_reference(&self) -> bool {
        self.style.contains(RunStyle::REFERENCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_combination() {
        let style = RunStyle::BOLD | RunStyle::ITALIC;
        assert!(style.contains(RunStyle::BOLD));
        assert!(style.contains(RunStyle::ITALIC));
        assert!(!style.contains(RunStyle::SUPERSCRIPT));
    }

    #[test]
    fn test_reference_flag() {
        let run = Run::new("fig-a", RunStyle::REFERENCE);
        assert!(run.is_reference());
        assert!(!Run::new("plain", RunStyle::NORMAL).is_reference());
    }
}
