//! Convert command implementation

use anyhow::{Context, Result};
use mdpaper_core::{CoverMetadata, Paper};
use std::fs::File;
use std::io::BufReader;

/// Convert a Markdown paper into the thesis template
pub fn convert(input: &str, template: &str, output: &str, metadata: Option<&str>) -> Result<()> {
    let mut paper = Paper::from_markdown_file(input)
        .with_context(|| format!("Failed to parse {}", input))?;

    if let Some(path) = metadata {
        let file = File::open(path)
            .with_context(|| format!("Failed to open metadata file: {}", path))?;
        let meta: CoverMetadata = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse metadata JSON: {}", path))?;
        paper = paper.with_metadata(meta);
    }

    let ctx = paper
        .render_to(template, output)
        .with_context(|| format!("Failed to render {} into {}", input, template))?;

    tracing::info!(
        media = ctx.media_count(),
        citations = ctx.citation_count(),
        "rendered paper"
    );

    println!(
        "Converted {} -> {} ({} media items, {} citations)",
        input,
        output,
        ctx.media_count(),
        ctx.citation_count()
    );

    Ok(())
}
