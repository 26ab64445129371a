//! Table content with merge and border semantics

use super::Text;
use crate::error::ContentError;
use serde::{Deserialize, Serialize};

/// One table row.
///
/// A `None` cell merges vertically with the cell above it; row 0 must not
/// contain `None` (there is nothing above to merge with).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub cells: Vec<Option<Text>>,

    /// Render a solid rule above this row (three-line table convention)
    pub top_border: bool,
}

impl Row {
    pub fn new(cells: Vec<Option<Text>>) -> Self {
        Self {
            cells,
            top_border: false,
        }
    }

    pub fn with_top_border(mut self) -> Self {
        self.top_border = true;
        self
    }
}

/// A table: caption line plus a grid of rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub alias: Option<String>,

    /// Display caption; the resolution pass prepends the `表c.n` label
    pub caption: String,

    rows: Vec<Row>,

    /// Per-column fractions of the printable page width; `None` auto-fits
    column_widths: Option<Vec<f64>>,

    /// Resolved display label (`表1.2`), assigned by the resolution pass
    pub refname: Option<String>,
}

impl Table {
    /// Build a table, validating the grid.
    ///
    /// Fails if the grid is empty or row 0 contains a merge cell.
    pub fn new(caption: impl Into<String>, rows: Vec<Row>) -> Result<Self, ContentError> {
        let caption = caption.into();
        if rows.is_empty() || rows[0].cells.is_empty() {
            return Err(ContentError::MalformedCaption(caption));
        }
        if rows[0].cells.iter().any(|c| c.is_none()) {
            return Err(ContentError::MergeInFirstRow(caption));
        }
        Ok(Self {
            alias: None,
            caption,
            rows,
            column_widths: None,
            refname: None,
        })
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn column_count(&self) -> usize {
        self.rows[0].cells.len()
    }

    pub fn column_widths(&self) -> Option<&[f64]> {
        self.column_widths.as_deref()
    }

    /// Fix column widths as fractions of the printable page width.
    ///
    /// The fractions should sum to at most 1.0; a deviation is logged but
    /// tolerated since it only affects looks, not cross-references.
    pub fn set_column_widths(&mut self, widths: Vec<f64>) -> Result<(), ContentError> {
        if widths.len() != self.column_count() {
            return Err(ContentError::ColumnWidthMismatch(self.caption.clone()));
        }
        let total: f64 = widths.iter().sum();
        if total > 1.0 + 1e-9 {
            tracing::warn!(caption = %self.caption, total, "column widths exceed page width");
        }
        self.column_widths = Some(widths);
        Ok(())
    }
}
