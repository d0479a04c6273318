use chrono::{DateTime, Utc};
use clap::Parser;
use colored::*;
use eyre::{Context, Result, eyre};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

mod cli;
mod config;

use cli::Cli;
use cli::commands::Commands;
use config::Config;
use phasegate::catalog::StaticCatalogue;
use phasegate::saga::{JsonlSagaStore, SagaRecord, SagaStatus, SagaStore, StepStatus};
use phasegate::verifier::{OutputVerifier, Verifier};

fn setup_logging(filter: &str) -> Result<()> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("phasegate")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("phasegate.log");

    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::new()
        .parse_filters(filter)
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized at {}, writing to: {}", filter, log_file.display());
    Ok(())
}

fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    match &cli.command {
        Commands::Config => handle_config_command(config),
        Commands::Catalog { file } => handle_catalog_command(file.as_deref(), config),
        Commands::Sagas { status } => handle_sagas_command(status.as_deref(), config),
        Commands::Saga { id } => handle_saga_command(id, config),
        Commands::Compare { baseline, candidate } => handle_compare_command(baseline, candidate, config),
    }
}

fn handle_config_command(config: &Config) -> Result<()> {
    let yaml = serde_yaml::to_string(config).context("Failed to serialize config")?;
    print!("{}", yaml);
    Ok(())
}

fn handle_catalog_command(file: Option<&Path>, config: &Config) -> Result<()> {
    let path = file
        .map(Path::to_path_buf)
        .or_else(|| config.catalogue.path.clone())
        .ok_or_else(|| eyre!("No catalogue file given and catalogue.path is not configured"))?;
    info!("Listing catalogue {}", path.display());

    let catalogue = StaticCatalogue::from_file(&path)?;
    if catalogue.is_empty() {
        println!("{}", "No approved capabilities".yellow());
        return Ok(());
    }

    for capability in catalogue.all() {
        let marker = if config.catalogue.policy.is_allowed(&capability.id) {
            "allowed".green()
        } else {
            "denied".red()
        };
        println!(
            "{:<24} {:<12} ${:<8.4} {}",
            capability.id.bold(),
            capability.category,
            capability.cost_estimate,
            marker
        );
    }
    Ok(())
}

fn open_store(config: &Config) -> Result<JsonlSagaStore> {
    JsonlSagaStore::new(&config.storage.data_dir)
        .with_context(|| format!("Failed to open saga store in {}", config.storage.data_dir.display()))
}

fn colored_status(status: SagaStatus) -> ColoredString {
    match status {
        SagaStatus::Completed | SagaStatus::Compensated => status.as_str().green(),
        SagaStatus::CompensationFailed => status.as_str().red().bold(),
        SagaStatus::Compensating => status.as_str().yellow(),
        SagaStatus::Pending | SagaStatus::Running => status.as_str().cyan(),
    }
}

fn format_ms(ms: u64) -> String {
    i64::try_from(ms)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| ms.to_string())
}

fn handle_sagas_command(status: Option<&str>, config: &Config) -> Result<()> {
    let status = status
        .map(|s| s.parse::<SagaStatus>().map_err(|e| eyre!(e)))
        .transpose()?;
    let store = open_store(config)?;
    let records = store.list(status)?;
    info!("Listing {} sagas (status filter: {:?})", records.len(), status);

    if records.is_empty() {
        println!("{}", "No sagas".yellow());
        return Ok(());
    }

    for record in &records {
        println!(
            "{}  {:<20} {:<32} {}",
            format_ms(record.updated_at),
            colored_status(record.status),
            record.id,
            record.name
        );
    }
    Ok(())
}

fn print_saga(record: &SagaRecord) {
    println!("{} {}", "Saga:".green(), record.id.bold());
    println!("  Name:    {}", record.name);
    println!("  Status:  {}", colored_status(record.status));
    println!("  Created: {}", format_ms(record.created_at));
    println!("  Updated: {}", format_ms(record.updated_at));
    if let Some(error) = &record.error {
        println!("  Error:   {}", error.red());
    }
    println!("  Steps:   {}", record.step_ids.join(", "));

    for result in &record.step_results {
        let status = match result.status {
            StepStatus::Success | StepStatus::Compensated => result.status.as_str().green(),
            StepStatus::Failed => result.status.as_str().yellow(),
            StepStatus::CompensationFailed => result.status.as_str().red().bold(),
        };
        print!(
            "    {:<20} {:<20} attempts={} {}ms",
            result.step_id, status, result.attempts, result.duration_ms
        );
        match &result.error {
            Some(error) => println!(" {}", error),
            None => println!(),
        }
    }
}

fn handle_saga_command(id: &str, config: &Config) -> Result<()> {
    let store = open_store(config)?;
    let record = store.get(id)?.ok_or_else(|| eyre!("Saga not found: {}", id))?;
    print_saga(&record);
    if record.status == SagaStatus::CompensationFailed {
        println!("{}", "Compensation failed: manual intervention required".red().bold());
    }
    Ok(())
}

fn handle_compare_command(baseline: &Path, candidate: &Path, config: &Config) -> Result<()> {
    let baseline_text =
        fs::read_to_string(baseline).with_context(|| format!("Failed to read {}", baseline.display()))?;
    let candidate_text =
        fs::read_to_string(candidate).with_context(|| format!("Failed to read {}", candidate.display()))?;

    let verifier = Verifier::heuristic(config.verifier.clone());
    let runtime = tokio::runtime::Runtime::new().context("Failed to start runtime")?;
    let result = runtime.block_on(verifier.compare(&baseline_text, &candidate_text))?;

    for dimension in &result.dimensions {
        println!(
            "  {:<14} {:>6.1} -> {:>6.1}  (weight {:.1})",
            dimension.name, dimension.baseline_score, dimension.new_score, dimension.weight
        );
    }
    let verdict = if result.improved {
        "improved".green().bold()
    } else {
        "not improved".yellow()
    };
    println!("{} delta {:+.2} ({})", verdict, result.delta, result.scorer);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    let filter = config.log_filter(std::env::var("RUST_LOG").ok());
    setup_logging(&filter).context("Failed to setup logging")?;

    info!("Starting with config from: {:?}", cli.config);

    run_application(&cli, &config).context("Application failed")?;

    Ok(())
}
