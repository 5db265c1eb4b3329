mod config;
mod csv;
mod db;
mod error;
mod fields;
mod records;
mod salary;
mod skills;
mod stats;
mod transform;

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use itertools::Itertools;
use tracing::info;

use crate::config::{CleanRules, Settings};
use crate::skills::SkillTaxonomy;

#[derive(Parser)]
#[command(name = "jobs_processor", about = "Normalize scraped job listings and load them into SQLite")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge raw batches, clean every record, write one processed CSV
    Transform {
        /// Raw batch directory (default: JOBS_RAW_DIR or data/raw)
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Staging directory for the processed CSV
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Load staged processed CSVs into the jobs table
    Load {
        /// Staging directory (default: JOBS_PROCESSED_DIR or data/processed)
        #[arg(short, long)]
        dir: Option<PathBuf>,
        /// Delete staged files after a successful load
        #[arg(long)]
        clear: bool,
    },
    /// Transform + load in one pipeline
    Run {
        /// Raw batch directory
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Staging directory
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Delete staged files after a successful load
        #[arg(long)]
        clear: bool,
    },
    /// Dataset statistics from the jobs table
    Stats,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load();

    let result = match cli.command {
        Commands::Transform { input, output } => {
            cmd_transform(&settings, input, output).map(|_| ())
        }
        Commands::Load { dir, clear } => cmd_load(&settings, dir, clear),
        Commands::Run { input, output, clear } => {
            let staging = output.clone().unwrap_or_else(|| settings.processed_dir.clone());
            cmd_transform(&settings, input, output)?;
            cmd_load(&settings, Some(staging), clear)?;
            println!("\nData pipeline executed successfully.");
            Ok(())
        }
        Commands::Stats => {
            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            stats::print_stats(&conn)
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }
    result
}

fn cmd_transform(
    settings: &Settings,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<PathBuf> {
    let raw_dir = input.unwrap_or_else(|| settings.raw_dir.clone());
    let staging = output.unwrap_or_else(|| settings.processed_dir.clone());

    let taxonomy = load_taxonomy(settings)?;
    let rules = CleanRules::default();
    info!(raw_dir = %raw_dir.display(), skills = taxonomy.len(), "starting transform");

    let batches = transform::read_raw_dir(&raw_dir)?;
    println!("Read {} raw batches from {}", batches.len(), raw_dir.display());

    let raws = transform::merge(batches)?;
    let unique = raws.iter().map(|r| r.job_id.as_str()).unique().count();
    println!("Merged {} records ({} unique job ids)", raws.len(), unique);

    let cleaned = transform::normalize(&raws, &rules, &taxonomy);

    fs::create_dir_all(&staging)
        .with_context(|| format!("failed to create {}", staging.display()))?;
    let stamp = Local::now().format("%Y-%m-%d_%H-%M-%S");
    let out_path = staging.join(format!("jobs_processed_{stamp}.csv"));
    transform::write_processed(&out_path, &cleaned)?;
    println!("Processed data saved to {}", out_path.display());
    Ok(out_path)
}

fn cmd_load(settings: &Settings, dir: Option<PathBuf>, clear: bool) -> Result<()> {
    let staging = dir.unwrap_or_else(|| settings.processed_dir.clone());

    let conn = db::connect(&settings.db_path)?;
    db::init_schema(&conn)?;
    println!("Database: {}", settings.db_path.display());

    let (read, inserted, files) = db::load_dir(&conn, &staging)?;
    println!(
        "Loaded {} rows from {} staged files ({} new, {} already present)",
        read,
        files.len(),
        inserted,
        read - inserted
    );

    if clear {
        db::clear_staged(&files)?;
        println!("Staging directory cleared.");
    }
    Ok(())
}

fn load_taxonomy(settings: &Settings) -> Result<SkillTaxonomy> {
    let taxonomy = match &settings.skills_file {
        Some(path) => SkillTaxonomy::from_path(path)?,
        None => SkillTaxonomy::builtin()?,
    };
    Ok(taxonomy)
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else {
        format!("{}m {}s", secs / 60, secs % 60)
    }
}
