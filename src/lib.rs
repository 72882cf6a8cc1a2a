//! Settings, schema migration, and reference-data core for a naturalist
//! community bot.
//!
//! The bot keeps settings at four scopes (global, guild, channel, user),
//! migrates their stored shape across releases, and caches records fetched
//! from the iNaturalist API so operator-defined abbreviations can be listed
//! and resolved cheaply.
//!
//! # Modules
//!
//! - [`settings`]: Scoped store, typed keys, tri-state resolution, user
//!   identity, migrations, and the readiness gate
//! - [`reference`]: Reference records, the fetch seam, and the batching cache
//! - [`registry`]: Per-guild place/project abbreviations and event projects
//! - [`consensus`]: Community identification agreement scoring
//! - [`chunk`]: Order-preserving fixed-size chunking for batches and pages
//! - [`service`]: The [`service::Fieldkit`] object that owns all of the above
//! - [`config`]: Configuration loading from TOML files and environment variables
//! - [`db`]: SQLite database initialization and schema

pub mod chunk;
pub mod config;
pub mod consensus;
pub mod db;
pub mod error;
pub mod reference;
pub mod registry;
pub mod service;
pub mod settings;
