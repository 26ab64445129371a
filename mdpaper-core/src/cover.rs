//! Cover-page filling: personal-information blanks and title lines

use crate::docx::TemplateDocument;
use crate::error::{ContentError, Result};
use serde::{Deserialize, Serialize};

/// Width of the underlined blank on each cover information line, in
/// half-width character units
pub const BLANK_LENGTH: usize = 23;

/// Cover fields of the thesis template.
///
/// Empty fields leave the template's blank line untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoverMetadata {
    #[serde(default)]
    pub school: Option<String>,
    #[serde(default)]
    pub major: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub teacher: Option<String>,
    #[serde(default)]
    pub auditor: Option<String>,
    /// Defaults to today, formatted `2026年08月29日`
    #[serde(default)]
    pub finish_date: Option<String>,
    #[serde(default)]
    pub title_zh: Option<String>,
    #[serde(default)]
    pub title_en: Option<String>,
}

impl CoverMetadata {
    pub fn finish_date_or_today(&self) -> String {
        match &self.finish_date {
            Some(date) => date.clone(),
            None => chrono::Local::now().format("%Y年%m月%d日").to_string(),
        }
    }

    fn line_fields(&self) -> [(&'static str, Option<String>); 7] {
        [
            ("学 院（系）：", self.school.clone()),
            ("专       业：", self.major.clone()),
            ("学 生 姓 名：", self.name.clone()),
            ("学       号：", self.number.clone()),
            ("指 导 教 师：", self.teacher.clone()),
            ("评 阅 教 师：", self.auditor.clone()),
            ("完 成 日 期：", Some(self.finish_date_or_today())),
        ]
    }

    fn title_fields(&self) -> [(&'static str, Option<&String>, usize); 2] {
        [
            ("大连理工大学本科毕业设计（论文）题目", self.title_zh.as_ref(), 38),
            (
                "The Subject of Undergraduate Graduation Project (Thesis) of DUT",
                self.title_en.as_ref(),
                66,
            ),
        ]
    }
}

/// Display width in half-width units: a CJK character counts two, every
/// other character one, and each CJK/non-CJK boundary adds a half unit
/// (the template font inserts a sliver of space there). Fractions floor.
pub fn display_width(value: &str) -> usize {
    fn is_cjk(c: char) -> bool {
        ('\u{4e00}'..='\u{9fa5}').contains(&c)
    }

    let mut width = 0.0f64;
    let mut prev: Option<bool> = None;
    for c in value.chars() {
        let cjk = is_cjk(c);
        width += if cjk { 2.0 } else { 1.0 };
        if let Some(p) = prev {
            if p != cjk {
                width += 0.5;
            }
        }
        prev = Some(cjk);
    }
    width as usize
}

/// Center `value` inside a blank of `blank_length` units by padding with
/// spaces, the extra unit going to the right when the split is uneven
pub fn fill_blank(field: &str, blank_length: usize, value: &str) -> Result<String> {
    let width = display_width(value);
    if width > blank_length {
        return Err(ContentError::CoverValueTooWide {
            field: field.to_string(),
            value: value.to_string(),
        }
        .into());
    }
    let head = (blank_length - width) / 2;
    let tail = blank_length - width - head;
    Ok(format!(
        "{}{}{}",
        " ".repeat(head),
        value,
        " ".repeat(tail)
    ))
}

/// Fill the cover page and the running header.
///
/// Information lines keep their label run and get the value centered in
/// the trailing blank run. Title lines overwrite the placeholder run;
/// when a title is wide enough to wrap, the spare line five paragraphs
/// below is deleted so the cover still fits one page.
pub fn fill_cover(doc: &mut TemplateDocument, meta: &CoverMetadata) -> Result<()> {
    if let Some(title) = &meta.title_zh {
        doc.set_header_text(title);
    }

    for (anchor, value, max_len) in meta.title_fields() {
        let Some(value) = value else {
            continue;
        };
        let offset = doc.anchor_after(anchor, None)? - 1;
        doc.set_first_run_text(offset, value)?;
        let width = display_width(value);
        tracing::debug!(anchor, width, max_len, "filled cover title");
        if width >= max_len {
            // a wrapping title eats the spare line five paragraphs below
            let spare = offset + 5;
            if spare < doc.len() {
                doc.delete(spare);
            } else {
                tracing::warn!(anchor, "no spare line below the title to remove");
            }
        }
    }

    for (label, value) in meta.line_fields() {
        let Some(value) = value else {
            continue;
        };
        let offset = doc.anchor_after(label, None)? - 1;
        let padded = fill_blank(label, BLANK_LENGTH, &value)?;
        doc.set_last_run_text(offset, &padded)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::test_support::minimal_template;
    use proptest::prelude::*;
    use std::io::Cursor;

    #[test]
    fn test_display_width_ascii() {
        assert_eq!(display_width("abc"), 3);
        assert_eq!(display_width(""), 0);
    }

    #[test]
    fn test_display_width_cjk() {
        assert_eq!(display_width("张三"), 4);
    }

    #[test]
    fn test_display_width_boundary_floors() {
        // 2 + 0.5 + 1 = 3.5, floored
        assert_eq!(display_width("张1"), 3);
        // 1 + 0.5 + 2 + 0.5 + 1 = 5
        assert_eq!(display_width("a张b"), 5);
    }

    #[test]
    fn test_fill_blank_centers() {
        let filled = fill_blank("学 生 姓 名：", 23, "张三").unwrap();
        assert_eq!(filled, format!("{}张三{}", " ".repeat(9), " ".repeat(10)));
    }

    #[test]
    fn test_fill_blank_too_wide() {
        let long = "很".repeat(12);
        let err = fill_blank("学 生 姓 名：", 23, &long).unwrap_err();
        assert!(err.to_string().contains("too wide"));
    }

    #[test]
    fn test_metadata_from_partial_json() {
        let meta: CoverMetadata =
            serde_json::from_str(r#"{"name": "张三", "title_zh": "某系统设计"}"#).unwrap();
        assert_eq!(meta.name.as_deref(), Some("张三"));
        assert!(meta.school.is_none());
        assert!(meta.finish_date_or_today().ends_with("日"));
    }

    #[test]
    fn test_fill_cover_lines() {
        let mut doc =
            crate::docx::TemplateDocument::from_reader(Cursor::new(minimal_template())).unwrap();
        let meta = CoverMetadata {
            name: Some("张三".into()),
            title_zh: Some("基于某方法的某系统设计".into()),
            finish_date: Some("2026年06月01日".into()),
            ..Default::default()
        };
        fill_cover(&mut doc, &meta).unwrap();

        let idx = doc.anchor_after("学 生 姓 名：", None).unwrap() - 1;
        assert!(doc.text_at(idx).contains("张三"));
        let title_idx = doc.anchor_after("基于某方法的某系统设计", None).unwrap() - 1;
        assert_eq!(title_idx, 0);
    }

    #[test]
    fn test_long_title_deletes_spare_line() {
        let mut doc =
            crate::docx::TemplateDocument::from_reader(Cursor::new(minimal_template())).unwrap();
        let before = doc.len();
        let meta = CoverMetadata {
            // width 40 >= 38 triggers the spare-line deletion
            title_zh: Some("某".repeat(20)),
            ..Default::default()
        };
        fill_cover(&mut doc, &meta).unwrap();
        // one paragraph gone, nothing else inserted
        assert_eq!(doc.len(), before - 1);
    }

    #[test]
    fn test_long_title_near_body_end_does_not_panic() {
        let mut doc =
            crate::docx::TemplateDocument::from_reader(Cursor::new(minimal_template())).unwrap();
        // shrink the body to title line, date line, section properties
        while doc.len() > 1 && !doc.text_at(1).contains("完 成 日 期：") {
            doc.delete(1);
        }
        while doc.len() > 3 {
            doc.delete(2);
        }

        let meta = CoverMetadata {
            title_zh: Some("某".repeat(20)),
            finish_date: Some("2026年06月01日".into()),
            ..Default::default()
        };
        fill_cover(&mut doc, &meta).unwrap();
        assert_eq!(doc.len(), 3);
    }

    proptest! {
        #[test]
        fn prop_filled_blank_always_spans_exactly(value in "[a-z0-9]{0,23}") {
            let filled = fill_blank("field", BLANK_LENGTH, &value).unwrap();
            prop_assert_eq!(display_width(&filled), BLANK_LENGTH);
        }

        #[test]
        fn prop_padding_is_balanced(value in "[a-z0-9]{0,23}") {
            let filled = fill_blank("field", BLANK_LENGTH, &value).unwrap();
            let head = filled.len() - filled.trim_start().len();
            let tail = filled.len() - filled.trim_end().len();
            prop_assert!(tail >= head);
            prop_assert!(tail - head <= 1);
        }
    }
}
