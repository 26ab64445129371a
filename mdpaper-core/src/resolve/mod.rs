//! Cross-reference and label resolution
//!
//! Two passes over the content tree. The first numbers every figure,
//! table and formula with chapter-scoped counters and registers their
//! aliases. The second rewrites reference runs in text: media aliases
//! become their labels, everything else becomes a numbered citation,
//! assigned in order of first appearance.

use crate::error::{ContentError, Result};
use crate::types::{Block, Content, RunStyle, Text};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MediaKind {
    Figure,
    Table,
    Formula,
}

impl MediaKind {
    /// Prefix used when the item is referenced from running text
    fn reference_prefix(self) -> &'static str {
        match self {
            MediaKind::Figure => "图",
            MediaKind::Table => "表",
            MediaKind::Formula => "式",
        }
    }
}

/// Mutable state of the resolution passes.
///
/// All registries live here; nothing is global, so independent documents
/// resolve independently.
#[derive(Debug, Default)]
pub struct ResolveContext {
    media: HashMap<String, (MediaKind, String)>,
    citations: HashMap<String, usize>,
    citation_order: Vec<String>,

    chapter: usize,
    figure_count: usize,
    table_count: usize,
    formula_count: usize,
}

impl ResolveContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pass 1: assign `图c.n` / `表c.n` / `（c.n）` labels in document
    /// order and register media aliases.
    ///
    /// Each media kind counts independently within a chapter, so a figure
    /// between two tables does not disturb the table numbering.
    pub fn assign_labels(&mut self, root: &mut Block) -> Result<()> {
        if root.title.is_some() && root.level == 1 {
            self.chapter += 1;
            self.figure_count = 0;
            self.table_count = 0;
            self.formula_count = 0;
        }
        for content in &mut root.content {
            self.label_content(content)?;
        }
        for sub in &mut root.sub_blocks {
            self.assign_labels(sub)?;
        }
        Ok(())
    }

    fn label_content(&mut self, content: &mut Content) -> Result<()> {
        match content {
            Content::Image(image) => {
                self.figure_count += 1;
                let index = format!("{}.{}", self.chapter, self.figure_count);
                image.refname = Some(format!("图{}", index));
                if let Some(alias) = image.alias.clone() {
                    self.register_media(alias, MediaKind::Figure, index)?;
                }
            }
            Content::Table(table) => {
                self.table_count += 1;
                let index = format!("{}.{}", self.chapter, self.table_count);
                table.refname = Some(format!("表{}", index));
                if let Some(alias) = table.alias.clone() {
                    self.register_media(alias, MediaKind::Table, index)?;
                }
            }
            Content::Formula(formula) => {
                self.formula_count += 1;
                let index = format!("{}.{}", self.chapter, self.formula_count);
                formula.refname = Some(format!("（{}）", index));
                if let Some(alias) = formula.alias.clone() {
                    self.register_media(alias, MediaKind::Formula, index)?;
                }
            }
            Content::List(list) => {
                for item in &mut list.items {
                    for c in &mut item.content {
                        self.label_content(c)?;
                    }
                }
            }
            Content::Text(_) => {}
        }
        Ok(())
    }

    fn register_media(&mut self, alias: String, kind: MediaKind, index: String) -> Result<()> {
        tracing::debug!(alias, index, ?kind, "registered media alias");
        if self.media.insert(alias.clone(), (kind, index)).is_some() {
            return Err(ContentError::DuplicateAlias(alias).into());
        }
        Ok(())
    }

    /// Pass 2: rewrite every reference run in the tree.
    ///
    /// Must run after [`assign_labels`](Self::assign_labels) so media
    /// aliases take precedence over citation registration.
    pub fn link_references(&mut self, root: &mut Block) -> Result<()> {
        for content in &mut root.content {
            self.link_content(content)?;
        }
        for sub in &mut root.sub_blocks {
            self.link_references(sub)?;
        }
        Ok(())
    }

    fn link_content(&mut self, content: &mut Content) -> Result<()> {
        match content {
            Content::Text(text) => self.link_text(text),
            Content::List(list) => {
                for item in &mut list.items {
                    for c in &mut item.content {
                        self.link_content(c)?;
                    }
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn link_text(&mut self, text: &mut Text) -> Result<()> {
        // citations following "……文献" read as part of the sentence and
        // stay inline; everywhere else they superscript
        let mut inline_context = false;
        for run in &mut text.runs {
            if !run.is_reference() {
                inline_context = !run.tab_stop && run.text.ends_with("文献");
                continue;
            }

            let alias = run.text.trim().to_string();
            if alias.is_empty() {
                return Err(ContentError::UnresolvedReference(alias).into());
            }

            if alias.contains(',') {
                let numbers = self.group_numbers(&alias)?;
                run.text = format!("[{}]", compress_ranges(&numbers));
                run.style = citation_style(inline_context);
            } else if let Some((kind, index)) = self.media.get(&alias) {
                run.text = format!("{}{}", kind.reference_prefix(), index);
                run.style = RunStyle::NORMAL;
            } else {
                let number = self.citation_number(&alias);
                run.text = format!("[{}]", number);
                run.style = citation_style(inline_context);
            }
            inline_context = false;
        }
        Ok(())
    }

    fn group_numbers(&mut self, group: &str) -> Result<Vec<usize>> {
        let mut numbers = Vec::new();
        for part in group.split(',') {
            let alias = part.trim();
            if alias.is_empty() {
                return Err(ContentError::UnresolvedReference(group.to_string()).into());
            }
            if self.media.contains_key(alias) {
                return Err(ContentError::MixedReferenceGroup(group.to_string()).into());
            }
            numbers.push(self.citation_number(alias));
        }
        Ok(numbers)
    }

    fn citation_number(&mut self, alias: &str) -> usize {
        if let Some(&n) = self.citations.get(alias) {
            return n;
        }
        self.citation_order.push(alias.to_string());
        let n = self.citation_order.len();
        self.citations.insert(alias.to_string(), n);
        tracing::debug!(alias, number = n, "registered citation");
        n
    }

    /// Cited aliases in citation-number order
    pub fn cited_aliases(&self) -> &[String] {
        &self.citation_order
    }

    pub fn citation_count(&self) -> usize {
        self.citation_order.len()
    }

    pub fn media_count(&self) -> usize {
        self.media.len()
    }

    /// Build the bibliography paragraphs: `[n] entry`, sorted by citation
    /// number.
    ///
    /// Every cited alias must have an entry; the numbering is contiguous
    /// by construction, so a missing entry would leave a hole.
    pub fn bibliography_lines(
        &self,
        entries: &HashMap<String, String>,
    ) -> Result<Vec<Text>> {
        let mut lines = Vec::with_capacity(self.citation_order.len());
        for (i, alias) in self.citation_order.iter().enumerate() {
            let number = i + 1;
            let entry = entries.get(alias).ok_or_else(|| {
                ContentError::MissingBibliographyEntry {
                    alias: alias.clone(),
                    number,
                }
            })?;
            let mut text = Text::from_str(format!("[{}] {}", number, entry), RunStyle::NORMAL);
            text.first_line_indent = false;
            lines.push(text);
        }
        Ok(lines)
    }
}

fn citation_style(inline_context: bool) -> RunStyle {
    if inline_context {
        RunStyle::NORMAL
    } else {
        RunStyle::SUPERSCRIPT
    }
}

/// Compress sorted citation numbers into the compact range form:
/// `{1,2,3,7,9,10}` becomes `1-3,7,9-10`
fn compress_ranges(numbers: &[usize]) -> String {
    let mut sorted = numbers.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let mut parts: Vec<String> = Vec::new();
    let mut i = 0;
    while i < sorted.len() {
        let start = sorted[i];
        let mut end = start;
        while i + 1 < sorted.len() && sorted[i + 1] == end + 1 {
            end = sorted[i + 1];
            i += 1;
        }
        if start == end {
            parts.push(start.to_string());
        } else {
            parts.push(format!("{}-{}", start, end));
        }
        i += 1;
    }
    parts.join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Formula, Image, Run, Table};

    fn image(alias: &str) -> Content {
        let mut img = Image::new("题", None);
        img.alias = Some(alias.to_string());
        Content::Image(img)
    }

    fn table(alias: &str) -> Content {
        use crate::types::Row;
        let rows = vec![Row::new(vec![Some(Text::from_str("x", RunStyle::NORMAL))])];
        let mut t = Table::new("题", rows).unwrap();
        t.alias = Some(alias.to_string());
        Content::Table(t)
    }

    fn formula(alias: &str) -> Content {
        let mut f = Formula::new("x");
        f.alias = Some(alias.to_string());
        Content::Formula(f)
    }

    fn chapter(title: &str) -> Block {
        let mut b = Block::new();
        b.set_title(title, 1).unwrap();
        b
    }

    #[test]
    fn test_labels_scoped_by_chapter() {
        let mut root = Block::new();
        let mut ch2 = chapter("方法");
        ch2.add_content(image("fig-a"));
        ch2.add_content(image("fig-b"));
        let mut ch3 = chapter("实验");
        ch3.add_content(image("fig-c"));
        // two leading chapters push the counters to 2 and 3
        root.add_sub_block(chapter("绪论"));
        root.sub_blocks[0].add_content(image("fig-0"));
        root.add_sub_block(ch2);
        root.add_sub_block(ch3);

        let mut ctx = ResolveContext::new();
        ctx.assign_labels(&mut root).unwrap();

        let labels: Vec<_> = collect_refnames(&root);
        assert_eq!(labels, vec!["图1.1", "图2.1", "图2.2", "图3.1"]);
    }

    #[test]
    fn test_counters_independent_per_kind() {
        let mut root = Block::new();
        let mut ch = chapter("方法");
        ch.add_content(image("fig-a"));
        ch.add_content(table("tab-a"));
        ch.add_content(formula("eq-a"));
        ch.add_content(table("tab-b"));
        root.add_sub_block(ch);

        let mut ctx = ResolveContext::new();
        ctx.assign_labels(&mut root).unwrap();

        let labels = collect_refnames(&root);
        assert_eq!(labels, vec!["图1.1", "表1.1", "（1.1）", "表1.2"]);
    }

    #[test]
    fn test_duplicate_alias_fatal() {
        let mut root = Block::new();
        let mut ch = chapter("方法");
        ch.add_content(image("dup"));
        ch.add_content(table("dup"));
        root.add_sub_block(ch);

        let mut ctx = ResolveContext::new();
        let err = ctx.assign_labels(&mut root).unwrap_err();
        assert!(err.to_string().contains("dup"));
    }

    #[test]
    fn test_media_reference_rewritten_to_label() {
        let mut root = Block::new();
        let mut ch = chapter("方法");
        ch.add_content(image("fig-a"));
        let mut text = Text::new();
        text.add_run(Run::new("如", RunStyle::NORMAL));
        text.add_run(Run::new("fig-a", RunStyle::REFERENCE));
        text.add_run(Run::new("所示", RunStyle::NORMAL));
        ch.add_content(Content::Text(text));
        root.add_sub_block(ch);

        let mut ctx = ResolveContext::new();
        ctx.assign_labels(&mut root).unwrap();
        ctx.link_references(&mut root).unwrap();

        let text = find_text(&root, 0);
        assert_eq!(text.runs[1].text, "图1.1");
        assert_eq!(text.runs[1].style, RunStyle::NORMAL);
    }

    #[test]
    fn test_formula_reference_uses_shi_prefix() {
        let mut root = Block::new();
        let mut ch = chapter("方法");
        ch.add_content(formula("eq-a"));
        let mut text = Text::new();
        text.add_run(Run::new("eq-a", RunStyle::REFERENCE));
        ch.add_content(Content::Text(text));
        root.add_sub_block(ch);

        let mut ctx = ResolveContext::new();
        ctx.assign_labels(&mut root).unwrap();
        ctx.link_references(&mut root).unwrap();

        // in-text form is 式1.1 even though the label next to the
        // formula is （1.1）
        assert_eq!(find_text(&root, 0).runs[0].text, "式1.1");
    }

    #[test]
    fn test_citations_numbered_first_seen() {
        let mut root = Block::new();
        let mut ch = chapter("绪论");
        let mut text = Text::new();
        text.add_run(Run::new("b", RunStyle::REFERENCE));
        text.add_run(Run::new("a", RunStyle::REFERENCE));
        text.add_run(Run::new("c", RunStyle::REFERENCE));
        text.add_run(Run::new("a", RunStyle::REFERENCE));
        ch.add_content(Content::Text(text));
        root.add_sub_block(ch);

        let mut ctx = ResolveContext::new();
        ctx.assign_labels(&mut root).unwrap();
        ctx.link_references(&mut root).unwrap();

        let text = find_text(&root, 0);
        assert_eq!(text.runs[0].text, "[1]");
        assert_eq!(text.runs[1].text, "[2]");
        assert_eq!(text.runs[2].text, "[3]");
        assert_eq!(text.runs[3].text, "[2]");
        assert_eq!(ctx.cited_aliases(), ["b", "a", "c"]);
    }

    #[test]
    fn test_citation_superscript_unless_after_wenxian() {
        let mut root = Block::new();
        let mut ch = chapter("绪论");
        let mut text = Text::new();
        text.add_run(Run::new("有研究", RunStyle::NORMAL));
        text.add_run(Run::new("a", RunStyle::REFERENCE));
        text.add_run(Run::new("表明，见文献", RunStyle::NORMAL));
        text.add_run(Run::new("b", RunStyle::REFERENCE));
        ch.add_content(Content::Text(text));
        root.add_sub_block(ch);

        let mut ctx = ResolveContext::new();
        ctx.link_references(&mut root).unwrap();

        let text = find_text(&root, 0);
        assert_eq!(text.runs[1].style, RunStyle::SUPERSCRIPT);
        assert_eq!(text.runs[3].style, RunStyle::NORMAL);
    }

    #[test]
    fn test_group_citation_range_compression() {
        let mut root = Block::new();
        let mut ch = chapter("绪论");
        let mut seed = Text::new();
        for alias in ["r1", "r2", "r3", "r4", "r5", "r6", "r7", "r8", "r9", "r10"] {
            seed.add_run(Run::new(alias, RunStyle::REFERENCE));
        }
        ch.add_content(Content::Text(seed));
        let mut text = Text::new();
        text.add_run(Run::new("r1,r2,r3,r7,r9,r10", RunStyle::REFERENCE));
        ch.add_content(Content::Text(text));
        root.add_sub_block(ch);

        let mut ctx = ResolveContext::new();
        ctx.link_references(&mut root).unwrap();

        assert_eq!(find_text(&root, 1).runs[0].text, "[1-3,7,9-10]");
    }

    #[test]
    fn test_media_alias_in_group_fatal() {
        let mut root = Block::new();
        let mut ch = chapter("方法");
        ch.add_content(image("fig-a"));
        let mut text = Text::new();
        text.add_run(Run::new("fig-a,b", RunStyle::REFERENCE));
        ch.add_content(Content::Text(text));
        root.add_sub_block(ch);

        let mut ctx = ResolveContext::new();
        ctx.assign_labels(&mut root).unwrap();
        let err = ctx.link_references(&mut root).unwrap_err();
        assert!(matches!(
            err,
            crate::error::PaperError::Content(ContentError::MixedReferenceGroup(_))
        ));
    }

    #[test]
    fn test_bibliography_lines_sorted_and_complete() {
        let mut ctx = ResolveContext::new();
        ctx.citation_number("b");
        ctx.citation_number("a");

        let mut entries = HashMap::new();
        entries.insert("a".to_string(), "甲文献".to_string());
        entries.insert("b".to_string(), "乙文献".to_string());

        let lines = ctx.bibliography_lines(&entries).unwrap();
        assert_eq!(lines[0].plain_text(), "[1] 乙文献");
        assert_eq!(lines[1].plain_text(), "[2] 甲文献");
        assert!(!lines[0].first_line_indent);
    }

    #[test]
    fn test_missing_bibliography_entry_fatal() {
        let mut ctx = ResolveContext::new();
        ctx.citation_number("ghost");
        let err = ctx.bibliography_lines(&HashMap::new()).unwrap_err();
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn test_compress_ranges() {
        assert_eq!(compress_ranges(&[1, 2, 3, 7, 9, 10]), "1-3,7,9-10");
        assert_eq!(compress_ranges(&[5]), "5");
        assert_eq!(compress_ranges(&[2, 1]), "1-2");
        assert_eq!(compress_ranges(&[4, 4, 5]), "4-5");
    }

    fn collect_refnames(root: &Block) -> Vec<String> {
        let mut out = Vec::new();
        root.for_each_content(&mut |c| {
            if let Some(r) = c.refname() {
                out.push(r.to_string());
            }
        });
        out
    }

    fn find_text(root: &Block, index: usize) -> Text {
        let mut found = Vec::new();
        root.for_each_content(&mut |c| {
            if let Content::Text(t) = c {
                found.push(t.clone());
            }
        });
        found[index].clone()
    }
}
