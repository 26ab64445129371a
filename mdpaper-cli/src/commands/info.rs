//! Info command implementation

use anyhow::{Context, Result};
use mdpaper_core::{Content, Paper};
use serde::Serialize;

/// Paper info output
#[derive(Serialize)]
struct PaperInfo {
    chapters: Vec<String>,
    figures: usize,
    tables: usize,
    formulas: usize,
    citations: usize,
    bibliography_entries: usize,
}

/// Display information about a Markdown paper
pub fn info(input: &str, json: bool) -> Result<()> {
    let mut paper = Paper::from_markdown_file(input)
        .with_context(|| format!("Failed to parse {}", input))?;
    let entries = paper.bibliography().len();
    let ctx = paper
        .resolve()
        .with_context(|| format!("Failed to resolve references in {}", input))?;

    let mut figures = 0;
    let mut tables = 0;
    let mut formulas = 0;
    paper.root().for_each_content(&mut |content| match content {
        Content::Image(_) => figures += 1,
        Content::Table(_) => tables += 1,
        Content::Formula(_) => formulas += 1,
        _ => {}
    });

    let info = PaperInfo {
        chapters: paper
            .root()
            .sub_blocks
            .iter()
            .filter_map(|b| b.title.clone())
            .collect(),
        figures,
        tables,
        formulas,
        citations: ctx.citation_count(),
        bibliography_entries: entries,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        println!("Chapters:     {}", info.chapters.join(", "));
        println!("Figures:      {}", info.figures);
        println!("Tables:       {}", info.tables);
        println!("Formulas:     {}", info.formulas);
        println!("Citations:    {}", info.citations);
        println!("Bibliography: {}", info.bibliography_entries);
    }

    Ok(())
}
