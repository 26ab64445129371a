//! Check command implementation

use anyhow::{bail, Context, Result};
use mdpaper_core::{Paper, TemplateDocument};

/// Styles every rendered paper needs the template to define
const REQUIRED_STYLES: &[&str] = &[
    "Heading 1",
    "Heading 2",
    "图名中文",
    "参考文献正文",
    "关键词",
    "Table Grid",
];

/// Check a Markdown paper, and optionally a template, for problems
pub fn check(input: &str, template: Option<&str>) -> Result<()> {
    let outcome = Paper::from_markdown_file(input).and_then(|mut paper| {
        let ctx = paper.resolve()?;
        Ok((paper, ctx))
    });

    let (paper, ctx) = match outcome {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Invalid paper source: {}", e);
            bail!("Check failed for {}", input);
        }
    };

    println!("Valid paper source");
    println!("  Chapters:  {}", paper.root().sub_blocks.len());
    println!("  Media:     {}", ctx.media_count());
    println!("  Citations: {}", ctx.citation_count());

    if let Some(path) = template {
        let doc = TemplateDocument::open(path)
            .with_context(|| format!("Failed to open template: {}", path))?;
        doc.anchor_after("摘    要", Some("Heading 1"))
            .context("Template is missing the 摘    要 body anchor")?;
        for style in REQUIRED_STYLES {
            doc.style_id(style)
                .with_context(|| format!("Template is missing style: {}", style))?;
        }
        println!("  Template:  {} OK", path);
    }

    Ok(())
}
