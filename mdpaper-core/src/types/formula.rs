//! Display formula content

use serde::{Deserialize, Serialize};

/// A display formula: LaTeX source plus the flush-right numbering label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Formula {
    pub alias: Option<String>,

    /// LaTeX source, converted to Office Math markup at render time
    pub latex: String,

    /// Resolved numbering label (`（1.2）`), assigned by the resolution pass
    pub refname: Option<String>,
}

impl Formula {
    pub fn new(latex: impl Into<String>) -> Self {
        Self {
            alias: None,
            latex: latex.into(),
            refname: None,
        }
    }
}
