//! foundry-migrate: Migrate a legacy snapshot into the destination schema
//!
//! Usage:
//!   # Migrate a full export, writing one .jsonl per entity kind into ./migrated
//!   foundry-migrate exports/2024-06-01
//!
//!   # Re-run into an existing output directory; records merge instead of duplicating
//!   foundry-migrate exports/2024-06-02 --output-dir ./migrated
//!
//!   # Load only some tables and keep nothing
//!   foundry-migrate exports/2024-06-01 --tables developer,project,property --dry-run

// Use MiMalloc allocator for better performance (recommended by simd-json)
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{Context, Result};
use clap::Parser;
use foundry::{
    logging, migrate_snapshot, CancellationToken, JsonlDestination, MemoryDestination,
    MigrateConfig, MigrationReport,
};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "foundry-migrate")]
#[command(
    about = "Migrate a legacy real-estate snapshot into the destination schema",
    long_about = None
)]
struct Args {
    /// Directory holding one <table>.json export per legacy table
    #[arg(value_name = "EXPORT_DIR")]
    export_dir: String,

    /// Comma-separated tables to load (default: all)
    #[arg(long)]
    tables: Option<String>,

    /// Directory for the migrated <kind>.jsonl files
    #[arg(long, short = 'o', default_value = "migrated")]
    output_dir: String,

    /// Run the migration against an in-memory destination and write nothing
    #[arg(long)]
    dry_run: bool,

    /// Unit type used when no BHK token is found (default: 4BHK)
    #[arg(long)]
    default_unit_type: Option<String>,

    /// Category for amenities without one (default: Other)
    #[arg(long)]
    default_amenity_category: Option<String>,

    /// Keep undecodable video blobs as text instead of dropping them
    #[arg(long)]
    keep_undecodable_videos: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::init("info");

    // Build config
    let mut config = MigrateConfig::default();
    if let Some(tables) = &args.tables {
        config.tables = tables
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }
    if let Some(unit_type) = &args.default_unit_type {
        config.default_unit_type = unit_type.clone();
    }
    if let Some(category) = &args.default_amenity_category {
        config.default_amenity_category = category.clone();
    }
    config.drop_undecodable_videos = !args.keep_undecodable_videos;

    // Ctrl-C stops the run between projects; a re-run picks up from there
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("received shutdown signal, stopping after the current project");
            on_signal.cancel();
        }
    });

    let dry_run = args.dry_run;
    let report = tokio::task::spawn_blocking(move || run(&args, &config, &cancel))
        .await
        .context("Migration task panicked")??;

    print_summary(&report, dry_run);
    Ok(())
}

fn run(args: &Args, config: &MigrateConfig, cancel: &CancellationToken) -> Result<MigrationReport> {
    if args.dry_run {
        let destination = MemoryDestination::new();
        return migrate_snapshot(&args.export_dir, &destination, config, cancel)
            .with_context(|| format!("Failed to migrate {}", args.export_dir));
    }

    let destination = JsonlDestination::open(&args.output_dir)
        .with_context(|| format!("Failed to open output directory {}", args.output_dir))?;
    let report = migrate_snapshot(&args.export_dir, &destination, config, cancel)
        .with_context(|| format!("Failed to migrate {}", args.export_dir))?;
    // Flush even when cancelled so finished projects are kept
    destination.flush().context("Failed to write migrated records")?;
    Ok(report)
}

fn print_summary(report: &MigrationReport, dry_run: bool) {
    for (kind, counts) in &report.kinds {
        info!(
            kind = %kind,
            created = counts.created,
            merged = counts.merged,
            unchanged = counts.unchanged,
            skipped = counts.skipped,
            failed = counts.failed,
            "kind summary"
        );
    }
    if report.cancelled {
        warn!("run cancelled before all projects were migrated");
    }
    if dry_run {
        info!("dry run, nothing written");
    }
}
