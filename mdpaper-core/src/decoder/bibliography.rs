//! Bibliography entries from `literature` code blocks
//!
//! ````text
//! ```literature
//! [zhang2019] 张某. 某研究[J]. 某学报, 2019.
//! [smith2020] Smith J. Some Study[J]. Some Journal, 2020.
//! ```
//! ````

use crate::error::{ContentError, Result};
use std::collections::HashMap;

/// Parse the body of a `literature` block into the bibliography map.
///
/// One entry per non-empty line, `[alias]` followed by the formatted
/// text. A duplicate alias or a line without the bracket prefix aborts;
/// silently skipping either would shift citation numbers.
pub fn parse_literature(body: &str, map: &mut HashMap<String, String>) -> Result<()> {
    for (line_no, line) in body.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let entry = line
            .strip_prefix('[')
            .and_then(|rest| rest.split_once(']'))
            .filter(|(alias, _)| !alias.trim().is_empty());
        let Some((alias, text)) = entry else {
            return Err(ContentError::MalformedBibliographyEntry(line_no + 1).into());
        };

        let alias = alias.trim().to_string();
        let text = text.trim().to_string();
        tracing::debug!(alias, "bibliography entry loaded");
        if map.insert(alias.clone(), text).is_some() {
            return Err(ContentError::DuplicateAlias(alias).into());
        }
    }
    Ok(())
}
