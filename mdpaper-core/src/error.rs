//! Error types for mdpaper-core

use thiserror::Error;

/// Result type alias using PaperError
pub type Result<T> = std::result::Result<T, PaperError>;

/// Top-level error type for all mdpaper operations
#[derive(Debug, Error)]
pub enum PaperError {
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    #[error("Content error: {0}")]
    Content(#[from] ContentError),

    #[error("Resource error: {0}")]
    Resource(#[from] ResourceError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors caused by a broken or mismatched template document.
///
/// The template is assumed fixed and validated at development time, so any
/// of these aborts the run immediately.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("anchor `{0}` not found in template")]
    AnchorNotFound(String),

    #[error("style `{0}` not found in template")]
    StyleNotFound(String),

    #[error("paragraph {0} has no runs to overwrite")]
    EmptyParagraph(usize),

    #[error("malformed template part {part}: {detail}")]
    MalformedPart { part: String, detail: String },
}

/// Structural errors in the input content tree.
///
/// These would silently corrupt cross-references if ignored, so they are
/// fatal rather than warnings.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("duplicate alias `{0}` refers to different content")]
    DuplicateAlias(String),

    #[error("unresolved reference alias `{0}`")]
    UnresolvedReference(String),

    #[error("invalid heading level {0}, expected 1-4")]
    InvalidHeadingLevel(u8),

    #[error("table `{0}`: merge cell in row 0 has no row above to merge with")]
    MergeInFirstRow(String),

    #[error("table `{0}`: column widths do not match column count")]
    ColumnWidthMismatch(String),

    #[error("only citations may be referenced as a group: {0}")]
    MixedReferenceGroup(String),

    #[error("bibliography entry missing for cited alias `{alias}` (citation [{number}])")]
    MissingBibliographyEntry { alias: String, number: usize },

    #[error("malformed bibliography entry on line {0}, expected `[alias] text`")]
    MalformedBibliographyEntry(usize),

    #[error("cover field `{field}` value is too wide: {value}")]
    CoverValueTooWide { field: String, value: String },

    #[error("malformed caption `{0}`, expected `alias:caption` or `alias:caption;NN%`")]
    MalformedCaption(String),

    #[error("image width ratio {0} out of range [0, 1]")]
    InvalidWidthRatio(f64),
}

/// Errors while loading external resources a figure or formula depends on.
///
/// A broken figure cannot be skipped without corrupting the numbering of
/// everything after it, so these propagate as fatal.
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("cannot read image `{path}`: {detail}")]
    ImageUnreadable { path: String, detail: String },

    #[error("cannot determine dimensions of image `{0}`")]
    ImageDimensions(String),

    #[error("LaTeX formula failed to convert: {detail} in `{source_text}`")]
    LatexConversion { source_text: String, detail: String },
}
