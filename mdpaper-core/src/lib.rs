//! mdpaper Core Library
//!
//! This crate converts constrained Markdown into a Chinese thesis .docx by
//! rewriting an institutional template in place. The pipeline: the decoder
//! parses the Markdown dialect into a [`types::Block`] tree, the resolution
//! pass assigns `图1.1`-style labels and rewrites cross-references, and the
//! renderer splices OOXML fragments into the opened template at anchored
//! positions. [`paper::Paper`] ties the stages together for the DUT
//! template profile.

pub mod cover;
pub mod decoder;
pub mod docx;
pub mod error;
pub mod paper;
pub mod render;
pub mod resolve;
pub mod types;

pub use cover::CoverMetadata;
pub use docx::TemplateDocument;
pub use error::{ContentError, PaperError, ResourceError, Result, TemplateError};
pub use paper::Paper;
pub use resolve::ResolveContext;
pub use types::{
    Block, Caption, Content, Formula, Image, ListItem, OrderedList, Row, Run, RunStyle, Table,
    Text,
};
