//! Declared settings, grouped by scope, with their defaults.

use std::collections::BTreeMap;

use super::resolver::TriState;
use super::{Key, ScopeKind};
use crate::registry::events::EventProjectEntry;

/// North America.
pub const DEFAULT_HOME_PLACE: u64 = 97394;

/// Abbreviation table: case-folded abbreviation -> external id.
pub type AbbrevMap = BTreeMap<String, u64>;

fn schema_v1() -> u32 {
    1
}

fn default_home() -> u64 {
    DEFAULT_HOME_PLACE
}

fn off() -> bool {
    false
}

fn inherit() -> TriState {
    TriState::Inherit
}

fn none_u64() -> Option<u64> {
    None
}

// Global

/// Absent on first run, which reads as version 1.
pub const SCHEMA_VERSION: Key<u32> = Key::new(ScopeKind::Global, "schema_version", schema_v1);

// Guild

pub const GUILD_AUTOOBS: Key<bool> = Key::new(ScopeKind::Guild, "autoobs", off);
pub const GUILD_DOT_TAXON: Key<bool> = Key::new(ScopeKind::Guild, "dot_taxon", off);
pub const GUILD_HOME: Key<u64> = Key::new(ScopeKind::Guild, "home", default_home);
pub const GUILD_PLACES: Key<AbbrevMap> = Key::new(ScopeKind::Guild, "places", BTreeMap::new);
pub const GUILD_PROJECTS: Key<AbbrevMap> = Key::new(ScopeKind::Guild, "projects", BTreeMap::new);
pub const GUILD_EVENT_PROJECTS: Key<BTreeMap<String, EventProjectEntry>> =
    Key::new(ScopeKind::Guild, "event_projects", BTreeMap::new);

/// Pre-v3 shape: project id (as a string) -> display label. Superseded by
/// [`GUILD_EVENT_PROJECTS`]; only the migration reads it.
pub const LEGACY_USER_PROJECTS: Key<BTreeMap<String, String>> =
    Key::new(ScopeKind::Guild, "user_projects", BTreeMap::new);

// Channel

pub const CHANNEL_AUTOOBS: Key<TriState> = Key::new(ScopeKind::Channel, "autoobs", inherit);
pub const CHANNEL_DOT_TAXON: Key<TriState> = Key::new(ScopeKind::Channel, "dot_taxon", inherit);

// User

pub const USER_HOME: Key<Option<u64>> = Key::new(ScopeKind::User, "home", none_u64);
pub const USER_EXTERNAL_ID: Key<Option<u64>> =
    Key::new(ScopeKind::User, "external_user_id", none_u64);
pub const USER_KNOWN_IN: Key<Vec<u64>> = Key::new(ScopeKind::User, "known_in", Vec::new);
pub const USER_KNOWN_ALL: Key<bool> = Key::new(ScopeKind::User, "known_all", off);

/// A tri-state setting that channels may inherit from their guild.
pub struct Inheritable {
    pub guild: Key<bool>,
    pub channel: Key<TriState>,
}

pub static AUTOOBS: Inheritable = Inheritable {
    guild: GUILD_AUTOOBS,
    channel: CHANNEL_AUTOOBS,
};

pub static DOT_TAXON: Inheritable = Inheritable {
    guild: GUILD_DOT_TAXON,
    channel: CHANNEL_DOT_TAXON,
};

impl Inheritable {
    /// Look up an inheritable setting by its operator-facing name.
    pub fn by_name(name: &str) -> Option<&'static Inheritable> {
        match name {
            "autoobs" => Some(&AUTOOBS),
            "dot_taxon" => Some(&DOT_TAXON),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.channel.name()
    }
}
