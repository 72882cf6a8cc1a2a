//! Scoped key/value settings.
//!
//! [`SettingsStore`] is the storage seam: an object-safe interface over JSON
//! values addressed by [`Scope`] and key name. [`Settings`] wraps a store with
//! typed access through [`Key`] descriptors, each carrying its declared default,
//! so reads never fail on missing data.

pub mod keys;
pub mod migrations;
pub mod ready;
pub mod resolver;
pub mod sqlite;
pub mod users;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::Result;

pub type GuildId = u64;
pub type ChannelId = u64;
pub type UserId = u64;

/// The kind of a scope, without its identifying ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    Global,
    Guild,
    Channel,
    User,
}

impl ScopeKind {
    /// SQL-compatible string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Guild => "guild",
            Self::Channel => "channel",
            Self::User => "user",
        }
    }
}

impl std::fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A concrete scope instance. Channel scopes are additionally keyed by their guild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Global,
    Guild(GuildId),
    Channel { guild: GuildId, channel: ChannelId },
    User(UserId),
}

impl Scope {
    pub fn kind(&self) -> ScopeKind {
        match self {
            Self::Global => ScopeKind::Global,
            Self::Guild(_) => ScopeKind::Guild,
            Self::Channel { .. } => ScopeKind::Channel,
            Self::User(_) => ScopeKind::User,
        }
    }

    /// The `(primary, secondary)` id pair used as the storage address.
    pub fn ids(&self) -> (u64, u64) {
        match *self {
            Self::Global => (0, 0),
            Self::Guild(guild) => (guild, 0),
            Self::Channel { guild, channel } => (guild, channel),
            Self::User(user) => (user, 0),
        }
    }

    /// Rebuild a scope from its storage address.
    pub fn from_parts(kind: ScopeKind, primary: u64, secondary: u64) -> Self {
        match kind {
            ScopeKind::Global => Self::Global,
            ScopeKind::Guild => Self::Guild(primary),
            ScopeKind::Channel => Self::Channel {
                guild: primary,
                channel: secondary,
            },
            ScopeKind::User => Self::User(primary),
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Global => f.write_str("global"),
            Self::Guild(guild) => write!(f, "guild:{guild}"),
            Self::Channel { guild, channel } => write!(f, "channel:{guild}/{channel}"),
            Self::User(user) => write!(f, "user:{user}"),
        }
    }
}

/// Storage interface for scoped settings.
///
/// A `set_raw` either fully replaces the prior value for that key or fails
/// without effect. Writes to one `(scope, key)` are serialized by the
/// implementation; no cross-key transactions are offered.
pub trait SettingsStore: Send + Sync {
    /// The stored value, or `None` if the key was never set (or was cleared).
    fn get_raw(&self, scope: Scope, key: &str) -> Result<Option<Value>>;

    fn set_raw(&self, scope: Scope, key: &str, value: &Value) -> Result<()>;

    /// Remove the stored value so reads fall back to the declared default.
    fn clear(&self, scope: Scope, key: &str) -> Result<()>;

    /// Every scope instance of `kind` that holds at least one stored key.
    fn scopes(&self, kind: ScopeKind) -> Result<Vec<Scope>>;
}

/// A typed setting name bound to one scope kind, with its declared default.
pub struct Key<T> {
    kind: ScopeKind,
    name: &'static str,
    default: fn() -> T,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Key<T> {
    pub const fn new(kind: ScopeKind, name: &'static str, default: fn() -> T) -> Self {
        Self {
            kind,
            name,
            default,
            _marker: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> ScopeKind {
        self.kind
    }

    pub fn default_value(&self) -> T {
        (self.default)()
    }
}

/// Typed access to a [`SettingsStore`].
#[derive(Clone)]
pub struct Settings {
    store: Arc<dyn SettingsStore>,
}

impl Settings {
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn SettingsStore> {
        &self.store
    }

    /// Read a setting, returning the key's default when nothing is stored.
    pub fn get<T: DeserializeOwned>(&self, scope: Scope, key: &Key<T>) -> Result<T> {
        debug_assert_eq!(scope.kind(), key.kind(), "key {} read at {scope}", key.name());
        match self.store.get_raw(scope, key.name())? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(key.default_value()),
        }
    }

    pub fn set<T: Serialize>(&self, scope: Scope, key: &Key<T>, value: &T) -> Result<()> {
        debug_assert_eq!(scope.kind(), key.kind(), "key {} written at {scope}", key.name());
        let value = serde_json::to_value(value)?;
        self.store.set_raw(scope, key.name(), &value)
    }

    /// Reset a setting to its default.
    pub fn clear<T>(&self, scope: Scope, key: &Key<T>) -> Result<()> {
        self.store.clear(scope, key.name())
    }

    /// Whether a value is explicitly stored (as opposed to read from the default).
    pub fn is_set<T>(&self, scope: Scope, key: &Key<T>) -> Result<bool> {
        Ok(self.store.get_raw(scope, key.name())?.is_some())
    }

    pub fn scopes(&self, kind: ScopeKind) -> Result<Vec<Scope>> {
        self.store.scopes(kind)
    }
}
