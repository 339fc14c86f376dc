use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use biopulse_briefing::{BriefingPipeline, BriefingWriter};
use biopulse_common::{Briefing, BriefingConfig, Candidate, Preset, VerificationMode};
use biopulse_scout::fetch::HttpFetcher;
use biopulse_scout::search::TavilySearcher;

#[derive(Parser)]
#[command(
    name = "biopulse-briefing",
    about = "Daily genomic medicine briefing generator"
)]
struct Cli {
    /// Briefing date as YYYY-MM-DD, defaults to today (UTC)
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Run preset: standard, snippet or summarize
    #[arg(long)]
    preset: Option<Preset>,

    /// Directory for latest.json and the dated archive
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// JSON file of candidates to brief (summarize preset only)
    #[arg(long)]
    input: Option<PathBuf>,

    /// Print the briefing JSON schema and exit
    #[arg(long)]
    print_schema: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    if cli.print_schema {
        let schema = schemars::schema_for!(Briefing);
        println!("{}", serde_json::to_string_pretty(&schema)?);
        return Ok(());
    }

    info!("BioPulse briefing starting...");

    let mut config = BriefingConfig::from_env_with(cli.preset)?;
    if let Some(out_dir) = cli.out_dir {
        config.out_dir = out_dir;
    }

    let reference = cli.date.unwrap_or_else(|| Utc::now().date_naive());
    info!(date = %reference, preset = %config.preset, "Run configured");

    let mut pipeline = BriefingPipeline::new(config.clone());
    if config.preset != Preset::Summarize {
        match config.tavily_api_key.clone() {
            Some(key) => {
                pipeline = pipeline.with_searcher(Arc::new(TavilySearcher::new(key)));
            }
            None => warn!("TAVILY_API_KEY not set, search channel disabled"),
        }
        if config.verification == VerificationMode::FullFetch {
            pipeline = pipeline.with_fetcher(Arc::new(HttpFetcher::default()));
        }
    }

    let (briefing, stats) = if config.preset == Preset::Summarize {
        let input = cli
            .input
            .context("--input <candidates.json> is required for the summarize preset")?;
        let raw = std::fs::read_to_string(&input)
            .with_context(|| format!("Failed to read {}", input.display()))?;
        let candidates: Vec<Candidate> = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse candidates from {}", input.display()))?;
        info!(
            count = candidates.len(),
            input = %input.display(),
            "Briefing supplied candidates"
        );
        pipeline.run_with_candidates(reference, candidates).await?
    } else {
        pipeline.run(reference).await?
    };

    let writer = BriefingWriter::new(config.out_dir);
    let (latest, dated) = writer.write(&briefing)?;

    println!("\n=== BioPulse Briefing: {} ===", briefing.date);
    println!(
        "Items: {}  |  Sources verified: {}",
        briefing.items.len(),
        stats.verified
    );
    for item in &briefing.items {
        println!("  [{}] {}", item.id, item.headline);
    }
    println!("\nSaved: {}  (archive: {})", latest.display(), dated.display());

    Ok(())
}
