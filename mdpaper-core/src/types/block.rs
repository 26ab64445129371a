//! Block: a titled section or untitled content container

use super::Content;
use crate::error::ContentError;
use serde::{Deserialize, Serialize};

/// A node of the content tree.
///
/// A block with a title is a chapter/section/subsection depending on its
/// level; a block with no title and no sub-blocks is a plain content
/// container. Ownership is strictly hierarchical: a block exclusively owns
/// its content and sub-blocks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub title: Option<String>,

    /// Heading depth 1-4; 0 for untitled containers
    pub level: u8,

    pub content: Vec<Content>,

    pub sub_blocks: Vec<Block>,
}

impl Block {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the title and heading level (1-4)
    pub fn set_title(
        &mut self,
        title: impl Into<String>,
        level: u8,
    ) -> Result<&mut Self, ContentError> {
        if !(1..=4).contains(&level) {
            return Err(ContentError::InvalidHeadingLevel(level));
        }
        self.title = Some(title.into());
        self.level = level;
        Ok(self)
    }

    pub fn add_content(&mut self, content: Content) -> &mut Self {
        self.content.push(content);
        self
    }

    pub fn add_sub_block(&mut self, block: Block) -> &mut Self {
        self.sub_blocks.push(block);
        self
    }

    pub fn last_sub_block_mut(&mut self) -> Option<&mut Block> {
        self.sub_blocks.last_mut()
    }

    /// Find the direct sub-block with the given title
    pub fn sub_block_mut(&mut self, title: &str) -> Option<&mut Block> {
        self.sub_blocks
            .iter_mut()
            .find(|b| b.title.as_deref() == Some(title))
    }

    /// Depth-first walk over every content item in this subtree, in
    /// document order
    pub fn for_each_content<'a>(&'a self, f: &mut impl FnMut(&'a Content)) {
        for c in &self.content {
            f(c);
        }
        for b in &self.sub_blocks {
            b.for_each_content(f);
        }
    }

    /// Mutable depth-first walk in document order
    pub fn for_each_content_mut(&mut self, f: &mut impl FnMut(&mut Content)) {
        for c in &mut self.content {
            f(c);
        }
        for b in &mut self.sub_blocks {
            b.for_each_content_mut(f);
        }
    }
}
