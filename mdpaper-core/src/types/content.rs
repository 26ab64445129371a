//! The closed content union

use super::{Formula, Image, OrderedList, Table, Text};
use serde::{Deserialize, Serialize};

/// A single content item inside a [`crate::types::Block`].
///
/// Rendering and resolution match exhaustively on this enum, so adding a
/// content kind is a compile-time concern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Content {
    Text(Text),
    Image(Image),
    Table(Table),
    Formula(Formula),
    List(OrderedList),
}

impl Content {
    /// Whether this is a media item (figure/table/formula).
    ///
    /// The renderer puts exactly one blank line between adjacent media
    /// items and none around text.
    pub fn is_media(&self) -> bool {
        matches!(
            self,
            Content::Image(_) | Content::Table(_) | Content::Formula(_)
        )
    }

    /// User-chosen cross-reference alias, if any
    pub fn alias(&self) -> Option<&str> {
        match self {
            Content::Image(i) => i.alias.as_deref(),
            Content::Table(t) => t.alias.as_deref(),
            Content::Formula(f) => f.alias.as_deref(),
            Content::Text(_) | Content::List(_) => None,
        }
    }

    /// Resolved display label, if assigned
    pub fn refname(&self) -> Option<&str> {
        match self {
            Content::Image(i) => i.refname.as_deref(),
            Content::Table(t) => t.refname.as_deref(),
            Content::Formula(f) => f.refname.as_deref(),
            Content::Text(_) | Content::List(_) => None,
        }
    }
}
