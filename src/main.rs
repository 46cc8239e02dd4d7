//! epitome - Split books into chapters and summarize them

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use serde::Serialize;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use epitome::summary::{ChatSummarizer, Summarizer, SummaryConfig};
use epitome::{Chapter, Extraction, extract_file};

type CliResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "epitome")]
#[command(version, about = "Split EPUB and PDF books into chapters", long_about = None)]
#[command(after_help = "EXAMPLES:
    epitome book.epub                List chapters with their sizes
    epitome book.pdf --json          Dump chapters as JSON
    epitome book.epub --summarize 3  Summarize the third chapter")]
struct Cli {
    /// Input file (EPUB or PDF)
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Print chapters as JSON
    #[arg(long, conflicts_with = "summarize")]
    json: bool,

    /// Summarize chapter N (1-based)
    #[arg(long, value_name = "N")]
    summarize: Option<usize>,

    /// API key for the summarization service
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Chat model used for summaries
    #[arg(long, env = "EPITOME_MODEL")]
    model: Option<String>,

    /// Show debug logging
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    chapters: &'a [Chapter],
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(cli: &Cli) {
    let default_level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_filter(env_filter))
        .init();
}

fn run(cli: &Cli) -> CliResult {
    let extraction = extract_file(&cli.input)?;

    if extraction.is_empty() {
        println!("No content found");
        return Ok(());
    }

    if cli.json {
        let output = JsonOutput {
            chapters: &extraction.chapters,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    match cli.summarize {
        Some(n) => summarize(cli, &extraction, n),
        None => {
            list(&extraction);
            Ok(())
        }
    }
}

fn list(extraction: &Extraction) {
    for (i, chapter) in extraction.chapters.iter().enumerate() {
        println!(
            "{}. {} ({} chars)",
            i + 1,
            chapter.title,
            chapter.content.chars().count()
        );
    }
    if !extraction.warnings.is_empty() {
        println!("{} warning(s):", extraction.warnings.len());
        for warning in &extraction.warnings {
            println!("  {warning}");
        }
    }
}

fn summarize(cli: &Cli, extraction: &Extraction, n: usize) -> CliResult {
    let chapter = n
        .checked_sub(1)
        .and_then(|i| extraction.chapters.get(i))
        .ok_or_else(|| format!("no chapter {n} (book has {} chapters)", extraction.len()))?;

    let mut config = SummaryConfig::from_env();
    if let Some(key) = &cli.api_key {
        config.api_key = Some(key.clone());
    }
    if let Some(model) = &cli.model {
        config.model = model.clone();
    }

    let summary = ChatSummarizer::new(config)?.summarize(&chapter.content)?;
    println!("{}\n\n{summary}", chapter.title);
    Ok(())
}
