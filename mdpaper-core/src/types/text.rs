//! Paragraph of styled runs

use super::{Run, RunStyle};
use serde::{Deserialize, Serialize};

/// A paragraph of inline [`Run`]s
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Text {
    pub runs: Vec<Run>,

    /// Exact template style name to apply instead of the body default
    /// (e.g. the keyword line of an abstract)
    pub forced_style: Option<String>,

    /// Whether the paragraph gets the standard two-character first-line
    /// indent. Bibliography entries and caption-like lines turn this off.
    pub first_line_indent: bool,
}

impl Default for Text {
    fn default() -> Self {
        Self::new()
    }
}

impl Text {
    pub fn new() -> Self {
        Self {
            runs: Vec::new(),
            forced_style: None,
            first_line_indent: true,
        }
    }

    /// Create a single-run paragraph
    pub fn from_str(text: impl Into<String>, style: RunStyle) -> Self {
        let mut t = Self::new();
        t.runs.push(Run::new(text, style));
        t
    }

    pub fn add_run(&mut self, run: Run) -> &mut Self {
        self.runs.push(run);
        self
    }

    /// Append a right-aligned tab stop (fills the rest of the line)
    pub fn add_hfill(&mut self) -> &mut Self {
        self.runs.push(Run::tab_stop());
        self
    }

    pub fn with_style(mut self, style_name: impl Into<String>) -> Self {
        self.forced_style = Some(style_name.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Concatenated literal text of all runs
    pub fn plain_text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text() {
        let mut text = Text::new();
        text.add_run(Run::new("see ", RunStyle::NORMAL));
        text.add_run(Run::new("fig-a", RunStyle::REFERENCE));
        assert_eq!(text.plain_text(), "see fig-a");
    }

    #[test]
    fn test_default_matches_new() {
        assert_eq!(Text::default(), Text::new());
        assert!(Text::default().first_line_indent);
    }

    #[test]
    fn test_empty() {
        assert!(Text::new().is_empty());
        assert!(!Text::from_str("x", RunStyle::NORMAL).is_empty());
    }
}
