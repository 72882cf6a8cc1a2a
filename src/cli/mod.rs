//! Operator commands over the core. Output goes to stdout, logs to stderr.

pub mod abbrev;
pub mod setting;

use anyhow::{Context, Result};
use std::sync::Arc;

use fieldkit::config::FieldkitConfig;
use fieldkit::reference::http::HttpFetcher;
use fieldkit::service::Fieldkit;
use fieldkit::settings::migrations::{self, MigrationContext, MigrationEngine};
use fieldkit::settings::sqlite::SqliteStore;
use fieldkit::settings::Settings;

/// Open the configured database and start the service (migrations included).
pub fn open_service(config: &FieldkitConfig) -> Result<Fieldkit> {
    let db_path = config.resolved_db_path();
    let conn = fieldkit::db::open_database(&db_path)?;
    let fetcher = HttpFetcher::new(&config.api).context("failed to set up API client")?;

    Ok(Fieldkit::start(
        Arc::new(SqliteStore::new(conn)),
        Arc::new(fetcher),
        MigrationEngine::standard(),
        MigrationContext {
            installation_id: config.bot.installation_id,
        },
    ))
}

/// Run pending migrations and print the resulting version.
pub async fn migrate(config: &FieldkitConfig) -> Result<()> {
    let service = open_service(config)?;
    let settings = service.settings().await.context("settings migration failed")?;
    println!(
        "Settings schema is at version {}.",
        migrations::get_schema_version(&settings)?
    );
    Ok(())
}

/// Print the stored schema version without running migrations.
pub fn status(config: &FieldkitConfig) -> Result<()> {
    let db_path = config.resolved_db_path();
    let conn = fieldkit::db::open_database(&db_path)?;
    let settings = Settings::new(Arc::new(SqliteStore::new(conn)));
    let stored = migrations::get_schema_version(&settings)?;

    println!("Database:        {}", db_path.display());
    println!("Schema version:  {stored}");
    println!("Binary expects:  {}", migrations::CURRENT_SCHEMA_VERSION);
    if stored < migrations::CURRENT_SCHEMA_VERSION {
        println!("Run `fieldkit migrate` to upgrade.");
    }
    Ok(())
}
