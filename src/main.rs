mod config;
mod predict;
mod render;
mod report;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::config::{Config, API_KEY_ENV};
use crate::predict::N2yoClient;

/// Exit code when the page was written but some satellites could not be fetched.
const PARTIAL_FAILURE: u8 = 2;

#[derive(Parser)]
#[command(name = "satpasses")]
#[command(about = "Render upcoming satellite passes as a static HTML page")]
struct Cli {
    /// Configuration file
    #[arg(short, long, default_value = "satpasses.yaml")]
    config: PathBuf,
    /// Output file, overrides `output_path`
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Generation time (RFC3339) shown on the page, defaults to the current time
    #[arg(long, value_parser = parse_datetime)]
    now: Option<DateTime<Utc>>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch passes and write the page (default)
    Generate,
    /// Validate the configuration without contacting the provider
    Check,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::from_file(&cli.config, std::env::var(API_KEY_ENV).ok()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logger(config.log_file.as_deref()) {
        eprintln!("Error opening log file: {}", e);
        return ExitCode::FAILURE;
    }

    match cli.command.unwrap_or(Commands::Generate) {
        Commands::Check => check(&config),
        Commands::Generate => {
            let output = cli.output.unwrap_or_else(|| config.output_path.clone());
            run(&config, &output, cli.now.unwrap_or_else(Utc::now)).await
        }
    }
}

fn init_logger(log_file: Option<&Path>) -> std::io::Result<()> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(path) = log_file {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}

fn check(config: &Config) -> ExitCode {
    println!("Configuration is valid ({} satellites)", config.satellites.len());
    if let Ok(station) = config.station() {
        println!("  station: {}", station);
    }
    for (i, target) in config.satellites.iter().enumerate() {
        println!("  {}: {} (NORAD {})", i + 1, target.label(), target.id);
    }
    println!("  output: {}", config.output_path.display());
    ExitCode::SUCCESS
}

async fn run(config: &Config, output: &Path, now: DateTime<Utc>) -> ExitCode {
    log::info!("Satellite pass report started");

    let api_key = match config.api_key() {
        Ok(key) => key,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let client = match N2yoClient::new(&config.provider_url, api_key, config.request_timeout) {
        Ok(c) => c,
        Err(e) => {
            log::error!("Failed to create HTTP client: {}", e);
            eprintln!("Error creating HTTP client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match report::generate(config, &client, output, now).await {
        Ok(summary) if summary.is_complete() => {
            log::info!("Satellite pass report completed ({} passes)", summary.rows);
            ExitCode::SUCCESS
        }
        Ok(summary) => {
            log::warn!(
                "Satellite pass report completed with {} failed satellites ({} passes)",
                summary.failures.len(),
                summary.rows
            );
            for failure in &summary.failures {
                eprintln!("{} (NORAD {}): {}", failure.satellite, failure.norad_id, failure.reason);
            }
            ExitCode::from(PARTIAL_FAILURE)
        }
        Err(e) => {
            log::error!("Failed to write {}: {}", output.display(), e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| e.to_string())
}
