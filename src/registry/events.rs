//! Event projects: guild abbreviations for projects that run server events,
//! each with optional credentials and a member role.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::{check_reserved, normalize};
use crate::error::{Error, Result};
use crate::reference::cache::ReferenceCache;
use crate::reference::RecordKind;
use crate::settings::keys;
use crate::settings::{GuildId, Scope, Settings};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventProjectEntry {
    pub project_id: u64,
    /// Opaque credentials for managing the project, if the guild provided any.
    #[serde(default)]
    pub credentials: Option<Value>,
    /// Name of the guild role granted to event members.
    #[serde(default)]
    pub role: Option<String>,
}

impl EventProjectEntry {
    pub fn new(project_id: u64) -> Self {
        Self {
            project_id,
            credentials: None,
            role: None,
        }
    }
}

#[derive(Clone)]
pub struct EventProjectRegistry {
    settings: Settings,
    cache: Arc<ReferenceCache>,
}

impl EventProjectRegistry {
    pub fn new(settings: Settings, cache: Arc<ReferenceCache>) -> Self {
        Self { settings, cache }
    }

    pub fn entries(&self, guild: GuildId) -> Result<BTreeMap<String, EventProjectEntry>> {
        self.settings
            .get(Scope::Guild(guild), &keys::GUILD_EVENT_PROJECTS)
    }

    pub fn get(&self, guild: GuildId, abbrev: &str) -> Result<EventProjectEntry> {
        let abbrev = normalize(abbrev);
        self.entries(guild)?
            .remove(&abbrev)
            .ok_or(Error::NotDefined(abbrev))
    }

    pub fn add(&self, guild: GuildId, abbrev: &str, entry: EventProjectEntry) -> Result<()> {
        let abbrev = normalize(abbrev);
        check_reserved(&abbrev)?;

        let mut entries = self.entries(guild)?;
        if let Some(existing) = entries.get(&abbrev) {
            return Err(Error::AlreadyDefined {
                abbrev,
                target: existing.project_id,
            });
        }

        tracing::info!(guild, %abbrev, project_id = entry.project_id, "event project added");
        entries.insert(abbrev, entry);
        self.save(guild, &entries)
    }

    pub fn remove(&self, guild: GuildId, abbrev: &str) -> Result<EventProjectEntry> {
        let abbrev = normalize(abbrev);
        let mut entries = self.entries(guild)?;
        let Some(entry) = entries.remove(&abbrev) else {
            return Err(Error::NotDefined(abbrev));
        };
        self.save(guild, &entries)?;
        tracing::info!(guild, %abbrev, "event project removed");
        Ok(entry)
    }

    pub fn set_role(&self, guild: GuildId, abbrev: &str, role: Option<String>) -> Result<()> {
        let abbrev = normalize(abbrev);
        let mut entries = self.entries(guild)?;
        let Some(entry) = entries.get_mut(&abbrev) else {
            return Err(Error::NotDefined(abbrev));
        };
        entry.role = role;
        self.save(guild, &entries)
    }

    /// One line per event project, resolving titles through the cache.
    pub async fn list(&self, guild: GuildId) -> Result<Vec<String>> {
        let entries = self.entries(guild)?;
        self.cache
            .ensure(
                RecordKind::Project,
                entries.values().map(|entry| entry.project_id),
            )
            .await;

        Ok(entries
            .iter()
            .map(|(abbrev, entry)| {
                let project = match self.cache.get(RecordKind::Project, entry.project_id) {
                    Some(record) => record.link(),
                    None => format!("{} not found", entry.project_id),
                };
                match &entry.role {
                    Some(role) => format!("{abbrev}: {project} (role: {role})"),
                    None => format!("{abbrev}: {project}"),
                }
            })
            .collect())
    }

    fn save(&self, guild: GuildId, entries: &BTreeMap<String, EventProjectEntry>) -> Result<()> {
        self.settings
            .set(Scope::Guild(guild), &keys::GUILD_EVENT_PROJECTS, entries)
    }
}
