//! Whole-paper orchestration for the DUT thesis template
//!
//! Ties the pipeline together: decode Markdown, format the front matter,
//! run both resolution passes, fill the cover, clear the template body and
//! render the content tree in its place.

use crate::cover::{fill_cover, CoverMetadata};
use crate::decoder;
use crate::docx::TemplateDocument;
use crate::error::Result;
use crate::render::Renderer;
use crate::resolve::ResolveContext;
use crate::types::{Block, Content};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Heading the template body is cleared from; everything before it is the
/// fixed front matter (cover, assignment pages, table of contents)
const BODY_CLEAR_ANCHOR: &str = "摘    要";

/// Chapter whose content is replaced by the generated bibliography
const BIBLIOGRAPHY_CHAPTER: &str = "参考文献";

const KEYWORD_STYLE: &str = "关键词";
const BIBLIOGRAPHY_STYLE: &str = "参考文献正文";

/// Fixed front- and back-matter chapters; they carry no chapter number,
/// so figures inside the first real chapter are `图1.1`
const UNNUMBERED_CHAPTERS: &[&str] = &[
    "摘要",
    "Abstract",
    "目录",
    "引言",
    "结论",
    "参考文献",
    "修改记录",
    "致谢",
];

/// A paper ready to be resolved and rendered into the template.
///
/// ```no_run
/// # use mdpaper_core::paper::Paper;
/// # fn main() -> mdpaper_core::error::Result<()> {
/// let mut paper = Paper::from_markdown_file("thesis.md")?;
/// paper.render_to("template.docx", "out.docx")?;
/// # Ok(())
/// # }
/// ```
pub struct Paper {
    root: Block,
    bibliography: HashMap<String, String>,
    meta: CoverMetadata,
    /// Relative image paths resolve against this directory
    base_dir: PathBuf,
    resolved: bool,
}

impl Paper {
    /// Decode a Markdown file; images resolve relative to its directory
    pub fn from_markdown_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = fs::read_to_string(path)?;
        let base_dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        Self::from_markdown(&source, base_dir)
    }

    pub fn from_markdown(source: &str, base_dir: impl Into<PathBuf>) -> Result<Self> {
        let parsed = decoder::parse(source)?;
        Ok(Self {
            root: parsed.root,
            bibliography: parsed.bibliography,
            meta: CoverMetadata::default(),
            base_dir: base_dir.into(),
            resolved: false,
        })
    }

    pub fn with_metadata(mut self, meta: CoverMetadata) -> Self {
        self.meta = meta;
        self
    }

    pub fn root(&self) -> &Block {
        &self.root
    }

    pub fn bibliography(&self) -> &HashMap<String, String> {
        &self.bibliography
    }

    /// Run both resolution passes over the tree: assign `图c.n`-style
    /// labels, rewrite every reference run, and replace the `参考文献`
    /// chapter's content with the numbered bibliography.
    pub fn resolve(&mut self) -> Result<ResolveContext> {
        self.format_abstracts();

        let mut ctx = ResolveContext::new();
        // labels count only the numbered body chapters; references are
        // rewritten everywhere, front matter included
        for chapter in &mut self.root.sub_blocks {
            let numbered = chapter
                .title
                .as_deref()
                .is_some_and(|t| !UNNUMBERED_CHAPTERS.contains(&t));
            if numbered {
                ctx.assign_labels(chapter)?;
            }
        }
        ctx.link_references(&mut self.root)?;

        if ctx.citation_count() > 0 {
            let lines = ctx.bibliography_lines(&self.bibliography)?;
            match self.root.sub_block_mut(BIBLIOGRAPHY_CHAPTER) {
                Some(chapter) => {
                    chapter.content = lines
                        .into_iter()
                        .map(|mut text| {
                            text.forced_style = Some(BIBLIOGRAPHY_STYLE.to_string());
                            Content::Text(text)
                        })
                        .collect();
                }
                None => {
                    tracing::warn!("citations present but the 参考文献 chapter is missing");
                }
            }
        }

        self.resolved = true;
        Ok(ctx)
    }

    /// Fill the cover and header, clear the template body from the
    /// abstract heading onward and render the tree in its place.
    ///
    /// The table of contents is flagged for a field update so Word
    /// regenerates it on first open.
    pub fn render_into(&self, doc: &mut TemplateDocument) -> Result<()> {
        fill_cover(doc, &self.meta)?;

        let start = doc.anchor_after(BODY_CLEAR_ANCHOR, Some("Heading 1"))? - 1;
        doc.clear_from(start);

        // section properties stay behind the cursor, content lands before them
        let mut renderer = Renderer::new(doc, &self.base_dir);
        renderer.render(&self.root, start)?;

        doc.flag_toc_update();
        Ok(())
    }

    /// One-shot convenience: resolve, open the template, render, save
    pub fn render_to(
        &mut self,
        template: impl AsRef<Path>,
        output: impl AsRef<Path>,
    ) -> Result<ResolveContext> {
        let ctx = if self.resolved {
            ResolveContext::new()
        } else {
            self.resolve()?
        };
        let mut doc = TemplateDocument::open(template)?;
        self.render_into(&mut doc)?;
        doc.save(output)?;
        Ok(ctx)
    }

    /// Mark the keyword line of the 摘要 / Abstract chapters: the last
    /// paragraph gets the template's keyword style and must carry the
    /// conventional prefix.
    fn format_abstracts(&mut self) {
        for (title, prefix) in [("摘要", "关键词："), ("Abstract", "Key Words:")] {
            let Some(chapter) = self.root.sub_block_mut(title) else {
                tracing::warn!(title, "front-matter chapter missing");
                continue;
            };
            let Some(Content::Text(keywords)) = chapter.content.last_mut() else {
                tracing::warn!(title, "abstract has no keyword line");
                continue;
            };
            keywords.forced_style = Some(KEYWORD_STYLE.to_string());
            keywords.first_line_indent = false;
            if !keywords.plain_text().starts_with(prefix) {
                tracing::warn!(title, prefix, "keyword line does not start with the prefix");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::test_support::minimal_template;
    use std::io::Cursor;

    const SOURCE: &str = "\
# 摘要

这是摘要。

关键词：甲；乙

# Abstract

This is the abstract.

Key Words:alpha; beta

# 绪论

正文引用[zhang2019]文献。

# 结论

结论在此。

# 参考文献

```literature
[zhang2019] 张某. 某研究[J]. 某学报, 2019.
```
";

    fn fixture_doc() -> TemplateDocument {
        TemplateDocument::from_reader(Cursor::new(minimal_template())).unwrap()
    }

    #[test]
    fn test_resolve_formats_abstract_and_bibliography() {
        let mut paper = Paper::from_markdown("# 摘要\n\n摘要。\n\n关键词：甲\n", ".").unwrap();
        let ctx = paper.resolve().unwrap();
        assert_eq!(ctx.citation_count(), 0);

        let chapter = paper.root().sub_blocks.iter().find(|b| b.title.as_deref() == Some("摘要"));
        let Some(Content::Text(keywords)) = chapter.and_then(|c| c.content.last()) else {
            panic!("expected keyword line");
        };
        assert_eq!(keywords.forced_style.as_deref(), Some(KEYWORD_STYLE));
    }

    #[test]
    fn test_resolve_builds_bibliography_chapter() {
        let mut paper = Paper::from_markdown(SOURCE, ".").unwrap();
        let ctx = paper.resolve().unwrap();
        assert_eq!(ctx.citation_count(), 1);

        let mut root = paper.root.clone();
        let chapter = root.sub_block_mut(BIBLIOGRAPHY_CHAPTER).expect("chapter");
        assert_eq!(chapter.content.len(), 1);
        let Content::Text(line) = &chapter.content[0] else {
            panic!("expected text line");
        };
        assert!(line.plain_text().starts_with("[1] 张某"));
        assert_eq!(line.forced_style.as_deref(), Some(BIBLIOGRAPHY_STYLE));
    }

    #[test]
    fn test_render_into_clears_and_renders() {
        let mut paper = Paper::from_markdown(SOURCE, ".").unwrap();
        paper.resolve().unwrap();

        let mut doc = fixture_doc();
        paper.render_into(&mut doc).unwrap();

        // template placeholders are gone, rendered chapters are present
        let texts: Vec<&str> = (0..doc.len()).map(|i| doc.text_at(i)).collect();
        assert!(texts.iter().any(|t| t.contains("绪论")));
        assert!(texts.iter().any(|t| t.contains("[1] 张某")));
        assert!(!texts.iter().any(|t| t.contains("摘要正文占位")));
    }

    #[test]
    fn test_front_matter_chapters_not_numbered() {
        let src = "# 摘要\n\n摘要。\n\n关键词：甲\n\n# 绪论\n\n结构如图。\n\n![fig-a:结构]()\n";
        let mut paper = Paper::from_markdown(src, ".").unwrap();
        paper.resolve().unwrap();

        let mut refname = None;
        paper.root().for_each_content(&mut |c| {
            if let Content::Image(image) = c {
                refname = image.refname.clone();
            }
        });
        // 摘要 does not count, 绪论 is chapter one
        assert_eq!(refname.as_deref(), Some("图1.1"));
    }

    #[test]
    fn test_missing_bibliography_entry_fatal() {
        let mut paper =
            Paper::from_markdown("# 甲\n\n引用[nope]。\n\n# 参考文献\n", ".").unwrap();
        assert!(paper.resolve().is_err());
    }
}
