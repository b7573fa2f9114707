use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};
use rand::rngs::StdRng;
use rand::SeedableRng;

use exam_scraper::config::{self, ClientConfig};
use exam_scraper::logging::init_logging;
use exam_scraper::{Catalog, CatalogWalker, HttpClient, RunSummary};

/// Download exam listings into <root>/<Year>/<Subject>/Quarter <N>/<difficulty>/
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Output root (defaults to ~/Exams)
    #[arg(long)]
    root: Option<PathBuf>,

    /// TOML catalog to use instead of the built-in listing table
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Write a JSON run summary to this file
    #[arg(long)]
    summary: Option<PathBuf>,

    /// Seed for difficulty labels, for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Log debug output
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(&cli) {
        error!("An error occurred: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let catalog = match &cli.catalog {
        Some(path) => Catalog::from_file(path)?,
        None => Catalog::builtin(),
    };

    let root = match &cli.root {
        Some(root) => root.clone(),
        None => config::default_root()?,
    };
    info!("Saving exams under {}", root.display());

    let client = HttpClient::new(&ClientConfig::default()).context("Failed to set up HTTP session")?;
    let rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    // The walker owns the client; it is released when the walker goes out
    // of scope, whether or not the walk succeeded.
    let summary: RunSummary = {
        let mut walker = CatalogWalker::new(client, rng, root);
        walker.run(&catalog)?
    };

    if let Some(path) = &cli.summary {
        summary.save_json(path)?;
        info!("Run summary saved to {}", path.display());
    }

    Ok(())
}
