//! Per-guild abbreviation tables.
//!
//! Operators map short, case-insensitive names to external place or project
//! ids. Entries are only ever changed through [`AbbreviationRegistry::add`] and
//! [`AbbreviationRegistry::remove`]; listings resolve ids through the
//! [`ReferenceCache`].

pub mod events;

use regex::{Regex, RegexBuilder};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::reference::cache::ReferenceCache;
use crate::reference::{ExternalRecord, RecordKind};
use crate::settings::keys::{self, AbbrevMap};
use crate::settings::{GuildId, Key, Scope, Settings};

/// Words that can never be used as abbreviations.
pub const RESERVED_ABBREVIATIONS: [&str; 4] = ["none", "clear", "all", "any"];

/// Case-fold an abbreviation into its stored form.
pub fn normalize(abbrev: &str) -> String {
    abbrev.trim().to_lowercase()
}

fn check_reserved(abbrev: &str) -> Result<()> {
    if RESERVED_ABBREVIATIONS.contains(&abbrev) {
        return Err(Error::AlreadyReserved(abbrev.to_string()));
    }
    Ok(())
}

/// Which guild table a registry operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbbrevTable {
    Places,
    Projects,
}

impl AbbrevTable {
    fn key(&self) -> Key<AbbrevMap> {
        match self {
            Self::Places => keys::GUILD_PLACES,
            Self::Projects => keys::GUILD_PROJECTS,
        }
    }

    pub fn kind(&self) -> RecordKind {
        match self {
            Self::Places => RecordKind::Place,
            Self::Projects => RecordKind::Project,
        }
    }
}

impl std::str::FromStr for AbbrevTable {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "place" | "places" => Ok(Self::Places),
            "project" | "projects" => Ok(Self::Projects),
            _ => Err(format!("unknown abbreviation table: {s}")),
        }
    }
}

/// Keeps lines whose text contains every term at the start of a word,
/// ignoring case. Term order does not matter.
pub struct TermFilter {
    patterns: Vec<Regex>,
}

impl TermFilter {
    pub fn new<S: AsRef<str>>(terms: &[S]) -> Result<Self> {
        let patterns = terms
            .iter()
            .map(|term| term.as_ref().trim())
            .filter(|term| !term.is_empty())
            .map(|term| {
                RegexBuilder::new(&format!(r"\b{}", regex::escape(term)))
                    .case_insensitive(true)
                    .build()
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn matches(&self, text: &str) -> bool {
        self.patterns.iter().all(|pattern| pattern.is_match(text))
    }
}

/// Abbreviations for one kind of record, across all guilds.
#[derive(Clone)]
pub struct AbbreviationRegistry {
    settings: Settings,
    cache: Arc<ReferenceCache>,
    table: AbbrevTable,
}

impl AbbreviationRegistry {
    pub fn new(settings: Settings, cache: Arc<ReferenceCache>, table: AbbrevTable) -> Self {
        Self {
            settings,
            cache,
            table,
        }
    }

    pub fn table(&self) -> AbbrevTable {
        self.table
    }

    pub fn entries(&self, guild: GuildId) -> Result<AbbrevMap> {
        self.settings.get(Scope::Guild(guild), &self.table.key())
    }

    /// Define `abbrev` for `guild`. Reserved and existing names are rejected
    /// without touching the table.
    pub fn add(&self, guild: GuildId, abbrev: &str, target: u64) -> Result<()> {
        let abbrev = normalize(abbrev);
        check_reserved(&abbrev)?;

        let mut entries = self.entries(guild)?;
        if let Some(&existing) = entries.get(&abbrev) {
            return Err(Error::AlreadyDefined {
                abbrev,
                target: existing,
            });
        }

        entries.insert(abbrev.clone(), target);
        self.settings
            .set(Scope::Guild(guild), &self.table.key(), &entries)?;
        tracing::info!(guild, table = ?self.table, %abbrev, target, "abbreviation added");
        Ok(())
    }

    /// Remove `abbrev` from `guild`, returning the id it pointed to.
    pub fn remove(&self, guild: GuildId, abbrev: &str) -> Result<u64> {
        let abbrev = normalize(abbrev);
        let mut entries = self.entries(guild)?;
        let Some(target) = entries.remove(&abbrev) else {
            return Err(Error::NotDefined(abbrev));
        };

        self.settings
            .set(Scope::Guild(guild), &self.table.key(), &entries)?;
        tracing::info!(guild, table = ?self.table, %abbrev, "abbreviation removed");
        Ok(target)
    }

    pub fn resolve(&self, guild: GuildId, abbrev: &str) -> Result<Option<u64>> {
        Ok(self.entries(guild)?.get(&normalize(abbrev)).copied())
    }

    /// The record an abbreviation points to. Fetch failures propagate.
    pub async fn lookup(&self, guild: GuildId, abbrev: &str) -> Result<ExternalRecord> {
        let Some(id) = self.resolve(guild, abbrev)? else {
            return Err(Error::NotFound(format!(
                "{} abbreviation '{}' not known",
                self.table.kind(),
                normalize(abbrev)
            )));
        };
        self.cache.get_or_fetch(self.table.kind(), id).await
    }

    /// Display lines for the guild's abbreviations in lexicographic order,
    /// keeping only those that match every term (all of them when `terms` is empty).
    ///
    /// Uncached records are prefetched in batches first. A record that still
    /// can't be resolved is listed as not found rather than failing the listing.
    pub async fn list<S: AsRef<str>>(&self, guild: GuildId, terms: &[S]) -> Result<Vec<String>> {
        let filter = TermFilter::new(terms)?;
        let entries = self.entries(guild)?;
        let kind = self.table.kind();

        self.cache.ensure(kind, entries.values().copied()).await;

        let lines = entries
            .iter()
            .filter_map(|(abbrev, &id)| {
                let (line, searchable) = match self.cache.get(kind, id) {
                    Some(record) => (
                        format!("{abbrev}: {}", record.link()),
                        format!("{abbrev} {}", record.display_name),
                    ),
                    None => (format!("{abbrev}: {id} not found"), abbrev.clone()),
                };
                filter.matches(&searchable).then_some(line)
            })
            .collect();
        Ok(lines)
    }
}
