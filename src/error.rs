//! Error type shared by the settings, migration, cache, and registry layers.
//!
//! Registry rejections ([`Error::AlreadyDefined`], [`Error::AlreadyReserved`],
//! [`Error::NotDefined`]) and [`Error::NotFound`] are meant to be shown to the
//! operator verbatim. [`Error::Migration`] and [`Error::NotReady`] keep the
//! process from serving settings-dependent requests.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    NotFound(String),

    #[error("abbreviation '{abbrev}' is already defined as {target}")]
    AlreadyDefined { abbrev: String, target: u64 },

    #[error("abbreviation '{0}' cannot be added as it is reserved")]
    AlreadyReserved(String),

    #[error("abbreviation '{0}' is not defined")]
    NotDefined(String),

    #[error("user is registered under another external id ({existing}); remove that registration first")]
    RegisteredElsewhere { existing: u64 },

    #[error("migration to schema version {target} failed: {source}")]
    Migration {
        target: u32,
        #[source]
        source: Box<Error>,
    },

    #[error("no migration path from schema version {from} to {target}")]
    MigrationGap { from: u32, target: u32 },

    #[error("reference fetch failed: {0}")]
    Fetch(String),

    #[error("settings are not available: {0}")]
    NotReady(String),

    #[error("invalid search term: {0}")]
    InvalidTerm(#[from] regex::Error),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
