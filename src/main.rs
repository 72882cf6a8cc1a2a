mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use fieldkit::config::FieldkitConfig;

#[derive(Parser)]
#[command(name = "fieldkit", version, about = "Bot settings and reference-data maintenance")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run pending settings migrations and report the schema version
    Migrate,
    /// Show the stored schema version without migrating
    Status,
    /// Manage guild place/project abbreviations
    Abbrev {
        /// "places" or "projects"
        table: String,
        #[command(subcommand)]
        action: cli::abbrev::AbbrevAction,
    },
    /// Show or change inheritable guild/channel settings
    Setting {
        #[command(subcommand)]
        action: cli::setting::SettingAction,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = FieldkitConfig::load()?;

    // Log to stderr so stdout carries only command output.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Migrate => cli::migrate(&config).await?,
        Command::Status => cli::status(&config)?,
        Command::Abbrev { table, action } => cli::abbrev::run(&config, &table, action).await?,
        Command::Setting { action } => cli::setting::run(&config, action).await?,
    }

    Ok(())
}
