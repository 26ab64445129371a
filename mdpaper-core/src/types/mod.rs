//! Core types for the mdpaper content model
//!
//! A document is a tree of [`Block`]s (titled sections) holding ordered
//! [`Content`] items. The tree is produced by the decoder, mutated in place
//! by the resolution pass, and consumed exactly once by the renderer.

mod block;
mod caption;
mod content;
mod formula;
mod image;
mod list;
mod run;
mod table;
mod text;

pub use block::Block;
pub use caption::Caption;
pub use content::Content;
pub use formula::Formula;
pub use image::{Image, AUTO_SIZE_DPI, MAX_WIDTH_INCHES};
pub use list::{ListItem, OrderedList};
pub use run::{Run, RunStyle};
pub use table::{Row, Table};
pub use text::Text;
