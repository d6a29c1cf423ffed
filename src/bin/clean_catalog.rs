use std::{
    fs::File,
    io::{BufReader, BufWriter},
    path::PathBuf,
};

use anime_matcher::services::cleaning::{clean_catalog, CleaningRules};
use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "clean-catalog")]
#[command(about = "Filters a raw anime dataset into the catalog served by anime-matcher", long_about = None)]
#[command(version)]
struct Cli {
    #[arg(help = "Raw dataset CSV (MAL_ID, Name, Score, Genres, sypnopsis, ...)")]
    input: PathBuf,

    #[arg(
        short,
        long,
        default_value = "anime_romance.csv",
        help = "Where to write the cleaned catalog"
    )]
    output: PathBuf,

    #[arg(long, help = "Keep every genre instead of requiring Romance")]
    any_genre: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "anime_matcher=info,clean_catalog=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let input = File::open(&cli.input)
        .with_context(|| format!("Failed to open {}", cli.input.display()))?;
    let output = File::create(&cli.output)
        .with_context(|| format!("Failed to create {}", cli.output.display()))?;

    let mut rules = CleaningRules::default();
    if cli.any_genre {
        rules.required_genre = None;
    }

    let report = clean_catalog(BufReader::new(input), BufWriter::new(output), &rules)?;

    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("Failed to render cleaning report")?
    );
    tracing::info!(output = %cli.output.display(), "Cleaned catalog written");

    Ok(())
}
