//! Figure content with auto-sizing rules

use serde::{Deserialize, Serialize};

/// Fixed DPI assumed when a figure has no explicit width ratio
pub const AUTO_SIZE_DPI: f64 = 360.0;

/// Maximum figure width in inches (the template's printable width)
pub const MAX_WIDTH_INCHES: f64 = 6.0;

/// A figure: an embedded picture plus its caption line.
///
/// An image without a source path renders caption-only; the original
/// documents use that for textual placeholder figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub alias: Option<String>,

    /// Display caption; the resolution pass prepends the `图c.n` label
    pub caption: String,

    /// Source path relative to the markdown file, empty caption-only figure
    pub src: Option<String>,

    /// Page-relative width in [0, 1]; overrides DPI-based auto-sizing
    pub width_ratio: Option<f64>,

    /// Resolved display label (`图1.2`), assigned by the resolution pass
    pub refname: Option<String>,
}

impl Image {
    pub fn new(caption: impl Into<String>, src: Option<String>) -> Self {
        Self {
            alias: None,
            caption: caption.into(),
            src,
            width_ratio: None,
            refname: None,
        }
    }

    /// Physical display size in inches for a picture of the given pixel
    /// dimensions.
    ///
    /// With an explicit width ratio the picture spans that fraction of the
    /// printable width; otherwise pixels are divided by the fixed DPI and
    /// capped at the maximum width, keeping the aspect ratio.
    pub fn display_size(&self, px_width: u64, px_height: u64) -> (f64, f64) {
        let aspect = px_width as f64 / px_height as f64;
        match self.width_ratio {
            Some(ratio) if ratio > 0.0 => {
                let w = MAX_WIDTH_INCHES * ratio;
                (w, w / aspect)
            }
            _ => {
                let w = px_width as f64 / AUTO_SIZE_DPI;
                if w > MAX_WIDTH_INCHES {
                    (MAX_WIDTH_INCHES, MAX_WIDTH_INCHES / aspect)
                } else {
                    (w, px_height as f64 / AUTO_SIZE_DPI)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_size_small_image() {
        let img = Image::new("图题", Some("a.png".into()));
        let (w, h) = img.display_size(720, 360);
        assert!((w - 2.0).abs() < 1e-9);
        assert!((h - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_auto_size_caps_width() {
        let img = Image::new("图题", Some("a.png".into()));
        let (w, h) = img.display_size(7200, 3600);
        assert!((w - MAX_WIDTH_INCHES).abs() < 1e-9);
        assert!((h - MAX_WIDTH_INCHES / 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_explicit_ratio_overrides_dpi() {
        let mut img = Image::new("图题", Some("a.png".into()));
        img.width_ratio = Some(0.5);
        let (w, h) = img.display_size(100, 200);
        assert!((w - 3.0).abs() < 1e-9);
        assert!((h - 6.0).abs() < 1e-9);
    }
}
