//! CLI `abbrev` command: add, remove, and list guild abbreviations.

use anyhow::{anyhow, Result};
use clap::Subcommand;

use fieldkit::chunk::{self, LINES_PER_PAGE};
use fieldkit::config::FieldkitConfig;
use fieldkit::registry::AbbrevTable;

#[derive(Subcommand)]
pub enum AbbrevAction {
    /// Define an abbreviation for an external id
    Add {
        #[arg(long)]
        guild: u64,
        abbrev: String,
        id: u64,
    },
    /// Remove an abbreviation
    Remove {
        #[arg(long)]
        guild: u64,
        abbrev: String,
    },
    /// List abbreviations, optionally keeping only those matching every term
    List {
        #[arg(long)]
        guild: u64,
        terms: Vec<String>,
    },
}

pub async fn run(config: &FieldkitConfig, table: &str, action: AbbrevAction) -> Result<()> {
    let table: AbbrevTable = table.parse().map_err(|e: String| anyhow!(e))?;
    let service = super::open_service(config)?;
    let registry = service.abbreviations(table).await?;

    match action {
        AbbrevAction::Add { guild, abbrev, id } => {
            registry.add(guild, &abbrev, id)?;
            println!("Abbreviation added.");
        }
        AbbrevAction::Remove { guild, abbrev } => {
            registry.remove(guild, &abbrev)?;
            println!("Abbreviation removed.");
        }
        AbbrevAction::List { guild, terms } => {
            let lines = registry.list(guild, terms.as_slice()).await?;
            if lines.is_empty() {
                println!("Nothing found.");
                return Ok(());
            }
            let pages = chunk::pages(lines, LINES_PER_PAGE);
            let total = pages.len();
            for (index, page) in pages.iter().enumerate() {
                println!("-- page {} of {total} --", index + 1);
                println!("{page}");
            }
        }
    }
    Ok(())
}
