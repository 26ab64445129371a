//! The `alias:caption;width%` caption convention
//!
//! Figure and table captions arrive from the source document as a single
//! raw string in this three-field encoding; a missing width field means
//! auto-size.

use crate::error::ContentError;
use serde::{Deserialize, Serialize};

/// A parsed `alias:caption;width%` string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Caption {
    /// User-chosen stable name used in cross-references
    pub alias: Option<String>,

    /// Display caption without the numbering prefix
    pub text: String,

    /// Page-relative width in [0, 1]; `None` means auto-size from pixels
    pub width_ratio: Option<f64>,
}

impl Caption {
    /// Parse the raw caption string.
    ///
    /// Accepted forms: `caption`, `alias:caption`, `alias:caption;40%`.
    pub fn parse(raw: &str) -> Result<Self, ContentError> {
        let Some((alias, rest)) = raw.split_once(':') else {
            return Ok(Self {
                alias: None,
                text: raw.trim().to_string(),
                width_ratio: None,
            });
        };
        let alias = alias.trim();
        if alias.is_empty() {
            return Err(ContentError::MalformedCaption(raw.to_string()));
        }

        let (text, width_ratio) = match rest.split_once(';') {
            Some((text, width)) => {
                let width = width.trim();
                if width.is_empty() {
                    (text, None)
                } else {
                    let percent: f64 = width
                        .strip_suffix('%')
                        .and_then(|n| n.trim().parse().ok())
                        .ok_or_else(|| ContentError::MalformedCaption(raw.to_string()))?;
                    let ratio = percent / 100.0;
                    if !(0.0..=1.0).contains(&ratio) {
                        return Err(ContentError::InvalidWidthRatio(ratio));
                    }
                    (text, Some(ratio))
                }
            }
            None => (rest, None),
        };

        Ok(Self {
            alias: Some(alias.to_string()),
            text: text.trim().to_string(),
            width_ratio,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full() {
        let c = Caption::parse("fig-a:实验结果;40%").unwrap();
        assert_eq!(c.alias.as_deref(), Some("fig-a"));
        assert_eq!(c.text, "实验结果");
        assert_eq!(c.width_ratio, Some(0.4));
    }

    #[test]
    fn test_parse_no_width() {
        let c = Caption::parse("tbl-1:参数表").unwrap();
        assert_eq!(c.alias.as_deref(), Some("tbl-1"));
        assert_eq!(c.text, "参数表");
        assert_eq!(c.width_ratio, None);
    }

    #[test]
    fn test_parse_bare_caption() {
        let c = Caption::parse("就一个图题").unwrap();
        assert_eq!(c.alias, None);
        assert_eq!(c.text, "就一个图题");
    }

    #[test]
    fn test_parse_empty_width_is_auto() {
        let c = Caption::parse("fig:标题;").unwrap();
        assert_eq!(c.width_ratio, None);
    }

    #[test]
    fn test_ratio_out_of_range() {
        assert!(matches!(
            Caption::parse("fig:标题;150%"),
            Err(ContentError::InvalidWidthRatio(_))
        ));
    }

    #[test]
    fn test_malformed_width() {
        assert!(matches!(
            Caption::parse("fig:标题;abc"),
            Err(ContentError::MalformedCaption(_))
        ));
    }
}
