//! Constrained-dialect Markdown decoder
//!
//! Parses the thesis Markdown dialect into a [`Block`] tree plus the
//! bibliography map. The dialect is deliberately narrow: ATX headings,
//! paragraphs with bold/italic/math/reference spans, GFM tables with a
//! caption line above them, `$$` display math with an alias line above,
//! ordered lists two levels deep, images with `alias:caption;NN%` alt
//! text, and `literature` code blocks for bibliography entries.

mod bibliography;
mod markdown;

pub use bibliography::parse_literature;
pub use markdown::parse;

use crate::types::Block;
use std::collections::HashMap;

/// Result of decoding one Markdown source file
#[derive(Debug, Default)]
pub struct ParsedDocument {
    pub root: Block,

    /// Bibliography alias -> formatted entry, from `literature` blocks
    pub bibliography: HashMap<String, String>,
}

/// Normalize inline text: newlines collapse to spaces and spaces touching
/// a CJK character (or CJK punctuation) are dropped, since they are
/// artifacts of Markdown source wrapping, not content.
pub fn normalize(text: &str) -> String {
    fn is_cjk(c: char) -> bool {
        ('\u{4e00}'..='\u{9fa5}').contains(&c) || "。，：《》、（）“”‘’".contains(c)
    }

    let flattened: String = text
        .chars()
        .map(|c| if c == '\n' { ' ' } else { c })
        .filter(|&c| c != '\r')
        .collect();
    let flattened = flattened.trim();

    let chars: Vec<char> = flattened.chars().collect();
    let mut out = String::with_capacity(flattened.len());
    for (i, &c) in chars.iter().enumerate() {
        if c == ' ' {
            let prev_cjk = out.chars().last().map(is_cjk).unwrap_or(false);
            let next_cjk = chars[i + 1..]
                .iter()
                .find(|&&n| n != ' ')
                .map(|&n| is_cjk(n))
                .unwrap_or(false);
            if prev_cjk || next_cjk {
                continue;
            }
            // collapse runs of spaces
            if out.ends_with(' ') {
                continue;
            }
        }
        out.push(c);
    }
    out
}
