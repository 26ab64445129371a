//! mdpaper CLI - converts constrained Markdown into a thesis-template .docx

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "mdpaper")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a Markdown paper into the thesis template
    Convert {
        /// Input Markdown file
        input: String,

        /// Template .docx file
        #[arg(short, long)]
        template: String,

        /// Output .docx file
        #[arg(short, long)]
        output: String,

        /// Cover metadata JSON file
        #[arg(short, long)]
        metadata: Option<String>,
    },

    /// Display information about a Markdown paper
    Info {
        /// Input Markdown file
        input: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check a Markdown paper, and optionally a template, for problems
    Check {
        /// Input Markdown file
        input: String,

        /// Template .docx file to check anchors and styles in
        #[arg(long)]
        template: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        "mdpaper_cli=debug,mdpaper_core=debug"
    } else {
        "mdpaper_cli=info"
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(filter))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Convert {
            input,
            template,
            output,
            metadata,
        } => commands::convert(&input, &template, &output, metadata.as_deref()),

        Commands::Info { input, json } => commands::info(&input, json),

        Commands::Check { input, template } => commands::check(&input, template.as_deref()),
    }
}
