use anyhow::Context;
use clap::Parser;
use client_registry::core::import_job::import_into_database;
use client_registry::utils::logger;
use client_registry::{
    list_clients, CliConfig, Command, DuplicateDetector, RegistryConfig, RegistryError,
    SqliteStore,
};
use serde::Serialize;
use std::io::Write;

fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    let config = match cli.resolve() {
        Ok(config) => config,
        Err(e) => {
            logger::init_logger(cli.verbose, false);
            tracing::error!("❌ Configuration validation failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(e.severity().exit_code().max(1));
        }
    };

    logger::init_logger(cli.verbose, config.json_logs());

    tracing::info!("Starting client-registry");
    if cli.verbose {
        tracing::debug!("Resolved config: {:?}", config);
    }
    if config.monitoring_enabled() {
        tracing::info!("🔍 System monitoring enabled");
    }

    match execute(&cli.command, &config) {
        Ok(Some(report)) => print_report(&report)?,
        Ok(None) => {}
        Err(e) => {
            tracing::error!(
                "❌ {} failed: {} (Category: {:?}, Severity: {:?})",
                command_name(&cli.command),
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            let exit_code = e.severity().exit_code();
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

/// Runs one subcommand. Reports come back as JSON values for stdout.
fn execute(
    command: &Command,
    config: &RegistryConfig,
) -> Result<Option<serde_json::Value>, RegistryError> {
    let report = match command {
        Command::Import { .. } => {
            let summary = import_into_database(config)?;
            println!("✅ {} clients imported successfully!", summary.imported);
            return Ok(None);
        }
        Command::List { page, .. } => {
            let store = open_store(config)?;
            to_report(&list_clients(&store, *page, config.listing.per_page)?)?
        }
        Command::Duplicates => {
            to_report(&DuplicateDetector::new(&open_store(config)?).email_and_phone_report()?)?
        }
        Command::DuplicatesComplets => {
            to_report(&DuplicateDetector::new(&open_store(config)?).full_tuple_report()?)?
        }
        Command::DuplicatesCombined => {
            to_report(&DuplicateDetector::new(&open_store(config)?).combined_report()?)?
        }
        Command::DuplicatesFields => {
            to_report(&DuplicateDetector::new(&open_store(config)?).field_membership_report()?)?
        }
    };

    Ok(Some(report))
}

fn open_store(config: &RegistryConfig) -> Result<SqliteStore, RegistryError> {
    SqliteStore::open(&config.database.path)
}

fn to_report<T: Serialize>(report: &T) -> Result<serde_json::Value, RegistryError> {
    Ok(serde_json::to_value(report)?)
}

fn print_report(report: &serde_json::Value) -> anyhow::Result<()> {
    let rendered = serde_json::to_string_pretty(report).context("rendering report")?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", rendered).context("writing report to stdout")?;
    Ok(())
}

fn command_name(command: &Command) -> &'static str {
    match command {
        Command::Import { .. } => "Import",
        Command::List { .. } => "Listing",
        Command::Duplicates => "Duplicate report",
        Command::DuplicatesComplets => "Full-tuple duplicate report",
        Command::DuplicatesCombined => "Combined duplicate report",
        Command::DuplicatesFields => "Per-field duplicate report",
    }
}
