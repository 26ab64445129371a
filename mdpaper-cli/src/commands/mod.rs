//! CLI command implementations

mod check;
mod convert;
mod info;

pub use check::check;
pub use convert::convert;
pub use info::info;
