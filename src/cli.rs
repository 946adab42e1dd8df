use crate::server;
use clap::{Args, Parser, Subcommand};
use kolective::catalog::MatchResult;
use kolective::config::{AppConfig, ConfigError};
use kolective::convert::{convert_directory, ConvertOptions};
use kolective::enrich::KolCatalog;
use kolective::error::AppError;
use kolective::telemetry;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "kolective",
    about = "Serve the KOL catalog and maintain its photo library",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Print the photo assigned to each roster entry
    Match(MatchArgs),
    /// Convert JPEG photos to PNG in place
    Convert(ConvertArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

#[derive(Args, Debug)]
struct MatchArgs {
    /// Roster spreadsheet or CSV (defaults to KOL_ROSTER_PATH)
    #[arg(long)]
    roster: Option<PathBuf>,
    /// Photo directory (defaults to KOL_STATIC_DIR/KOL_PHOTO_SUBDIR)
    #[arg(long)]
    photos: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ConvertArgs {
    /// Directory holding the photos (defaults to the configured photo directory)
    #[arg(long)]
    dir: Option<PathBuf>,
    /// Composite transparent pixels onto a white background
    #[arg(long)]
    flatten_alpha: bool,
    /// Leave the JPEG originals in place after conversion
    #[arg(long)]
    keep_originals: bool,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Match(args) => run_match(args),
        Command::Convert(args) => run_convert(args),
    }
}

fn run_match(args: MatchArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let mut catalog_config = config.catalog;
    if let Some(roster) = args.roster {
        catalog_config.roster_path = roster;
    }
    if let Some(photos) = args.photos {
        // the scanner reads static_dir/photo_subdir, so point both at the override
        catalog_config.static_dir = photos;
        catalog_config.photo_subdir = String::new();
    }

    let catalog = KolCatalog::new(catalog_config).map_err(ConfigError::Matching)?;
    let records = catalog.read_roster()?;
    let mut pool = catalog.snapshot_pool();
    let available = pool.len();
    let results = catalog
        .matcher()
        .assign(records.iter().map(|record| record.nickname.as_str()), &mut pool);

    println!(
        "Matching {} roster entries against {} photos",
        records.len(),
        available
    );
    for (record, result) in records.iter().zip(&results) {
        match result {
            MatchResult::Matched(filename) => println!("- {} -> {}", record.nickname, filename),
            MatchResult::NoMatch => println!("- {} -> (no photo)", record.nickname),
        }
    }

    let matched = results.iter().filter(|result| result.is_match()).count();
    println!(
        "\n{} matched, {} without photo, {} photos unused",
        matched,
        results.len() - matched,
        pool.len()
    );
    Ok(())
}

fn run_convert(args: ConvertArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let dir = args.dir.unwrap_or_else(|| config.catalog.photo_dir());
    let options = ConvertOptions {
        flatten_alpha: args.flatten_alpha,
        keep_originals: args.keep_originals,
    };

    println!("Converting JPEG files to PNG in {}", dir.display());
    let summary = convert_directory(&dir, options)?;

    println!("Successfully converted: {} files", summary.converted);
    println!("Failed conversions: {} files", summary.failed);
    if summary.removal_failures > 0 {
        println!(
            "Originals left behind after conversion: {}",
            summary.removal_failures
        );
    }
    println!("Total PNG files: {}", summary.png_total);
    Ok(())
}
