//! Ordered list content

use super::Content;
use serde::{Deserialize, Serialize};

/// One list item; may hold several paragraphs or nested content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListItem {
    pub content: Vec<Content>,
}

impl ListItem {
    pub fn new(content: Vec<Content>) -> Self {
        Self { content }
    }
}

/// An ordered list.
///
/// Items are numbered by the renderer: `（1）` at depth one, circled digits
/// (`①`) at depth two. Nesting deeper than two levels is rejected by the
/// decoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderedList {
    pub items: Vec<ListItem>,

    /// Nesting depth, 1-based
    pub depth: u8,
}

impl OrderedList {
    pub fn new(items: Vec<ListItem>, depth: u8) -> Self {
        Self { items, depth }
    }

    /// The rendered index prefix for a 0-based item position
    pub fn index_prefix(&self, position: usize) -> String {
        if self.depth <= 1 {
            format!("（{}） ", position + 1)
        } else {
            // ①..⑳ are contiguous codepoints starting at U+2460
            let n = position.min(19) as u32;
            let c = char::from_u32(0x2460 + n).unwrap_or('?');
            format!("{} ", c)
        }
    }
}
