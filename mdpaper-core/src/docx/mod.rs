//! Anchor-addressed .docx document backend
//!
//! A .docx file is a ZIP archive of OOXML parts. This module opens a
//! pre-formatted template archive, exposes its `word/document.xml` body as
//! a mutable sequence of paragraph-like items addressed by anchor text and
//! style name, and writes the edited archive back out with embedded media
//! and relationship updates. Everything the template already carries
//! (styles, cover layout, headers, numbering) is preserved byte for byte.

mod document;
mod omml;
pub mod ooxml;
#[doc(hidden)]
pub mod test_support;

pub use document::{BodyItem, ItemKind, TemplateDocument};
pub use omml::{latex_to_omml, mathml_to_omml};

/// English Metric Units per inch; Word's drawing unit
pub const EMUS_PER_INCH: i64 = 914_400;

/// Twentieths of a point per inch; Word's layout unit
pub const TWIPS_PER_INCH: i64 = 1440;

/// Standard first-line indent of body text: 0.82 cm in twips
pub const FIRST_LINE_INDENT_TWIPS: i64 = 465;

/// Printable width assumed when the template has no usable section
/// properties (6 inches, matching the figure width cap)
pub const DEFAULT_PRINTABLE_WIDTH_TWIPS: i64 = 6 * TWIPS_PER_INCH;
