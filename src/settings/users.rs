//! Per-user external identity and home place.
//!
//! A user's external id is only visible in a guild where the user is known:
//! registered there (`known_in`) or opted in everywhere (`known_all`).

use super::keys;
use super::{GuildId, Scope, Settings, UserId};
use crate::error::{Error, Result};

/// Outcome of removing a user from a guild.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unregistered {
    /// Removed here; still registered in other guilds.
    FromGuild,
    /// Removed from the last guild; every identity field was cleared.
    Everywhere,
}

#[derive(Clone)]
pub struct UserIdentity {
    settings: Settings,
}

impl UserIdentity {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    /// The user's external id, if the user is known in `guild`.
    pub fn known_user(&self, user: UserId, guild: GuildId) -> Result<u64> {
        let scope = Scope::User(user);
        let external = self.settings.get(scope, &keys::USER_EXTERNAL_ID)?;
        let known_all = self.settings.get(scope, &keys::USER_KNOWN_ALL)?;
        let known_in = self.settings.get(scope, &keys::USER_KNOWN_IN)?;

        match external {
            Some(id) if known_all || known_in.contains(&guild) => Ok(id),
            _ => Err(Error::NotFound("user not known".into())),
        }
    }

    /// Register `user` as `external_id` in `guild`.
    ///
    /// A user already registered elsewhere under a different external id must
    /// be removed there first.
    pub fn register(&self, user: UserId, guild: GuildId, external_id: u64) -> Result<()> {
        let scope = Scope::User(user);
        match self.settings.get(scope, &keys::USER_EXTERNAL_ID)? {
            Some(existing) if existing != external_id => {
                return Err(Error::RegisteredElsewhere { existing });
            }
            Some(_) => {}
            None => self
                .settings
                .set(scope, &keys::USER_EXTERNAL_ID, &Some(external_id))?,
        }

        let mut known_in = self.settings.get(scope, &keys::USER_KNOWN_IN)?;
        if !known_in.contains(&guild) {
            known_in.push(guild);
            self.settings.set(scope, &keys::USER_KNOWN_IN, &known_in)?;
        }
        tracing::info!(user, guild, external_id, "user registered");
        Ok(())
    }

    /// Remove `user` from `guild`. Users can only be removed where they were added.
    pub fn unregister(&self, user: UserId, guild: GuildId) -> Result<Unregistered> {
        let scope = Scope::User(user);
        let mut known_in = self.settings.get(scope, &keys::USER_KNOWN_IN)?;
        if self.settings.get(scope, &keys::USER_EXTERNAL_ID)?.is_none()
            || !known_in.contains(&guild)
        {
            return Err(Error::NotFound("user not registered in this guild".into()));
        }

        known_in.retain(|g| *g != guild);
        if !known_in.is_empty() {
            self.settings.set(scope, &keys::USER_KNOWN_IN, &known_in)?;
            return Ok(Unregistered::FromGuild);
        }

        self.settings.clear(scope, &keys::USER_EXTERNAL_ID)?;
        self.settings.clear(scope, &keys::USER_KNOWN_ALL)?;
        self.settings.clear(scope, &keys::USER_KNOWN_IN)?;
        tracing::info!(user, "user removed from last guild");
        Ok(Unregistered::Everywhere)
    }

    pub fn set_known_all(&self, user: UserId, value: bool) -> Result<()> {
        self.settings
            .set(Scope::User(user), &keys::USER_KNOWN_ALL, &value)
    }

    pub fn home(&self, user: UserId) -> Result<Option<u64>> {
        self.settings.get(Scope::User(user), &keys::USER_HOME)
    }

    pub fn set_home(&self, user: UserId, place: u64) -> Result<()> {
        self.settings
            .set(Scope::User(user), &keys::USER_HOME, &Some(place))
    }

    pub fn clear_home(&self, user: UserId) -> Result<()> {
        self.settings.clear(Scope::User(user), &keys::USER_HOME)
    }

    pub fn guild_home(&self, guild: GuildId) -> Result<u64> {
        self.settings.get(Scope::Guild(guild), &keys::GUILD_HOME)
    }

    pub fn set_guild_home(&self, guild: GuildId, place: u64) -> Result<()> {
        self.settings
            .set(Scope::Guild(guild), &keys::GUILD_HOME, &place)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::sqlite::SqliteStore;
    use std::sync::Arc;

    fn identity() -> UserIdentity {
        let conn = crate::db::open_memory_database().unwrap();
        UserIdentity::new(Settings::new(Arc::new(SqliteStore::new(conn))))
    }

    #[test]
    fn unknown_user_is_not_found() {
        let users = identity();
        assert!(matches!(users.known_user(1, 10), Err(Error::NotFound(_))));
    }

    #[test]
    fn registration_is_per_guild() {
        let users = identity();
        users.register(1, 10, 545640).unwrap();
        assert_eq!(users.known_user(1, 10).unwrap(), 545640);
        assert!(users.known_user(1, 20).is_err());

        users.set_known_all(1, true).unwrap();
        assert_eq!(users.known_user(1, 20).unwrap(), 545640);
    }

    #[test]
    fn different_external_id_is_rejected() {
        let users = identity();
        users.register(1, 10, 5).unwrap();
        let err = users.register(1, 20, 6).unwrap_err();
        assert!(matches!(err, Error::RegisteredElsewhere { existing: 5 }));
    }

    #[test]
    fn removal_from_last_guild_clears_identity() {
        let users = identity();
        users.register(1, 10, 5).unwrap();
        users.register(1, 20, 5).unwrap();

        assert_eq!(users.unregister(1, 10).unwrap(), Unregistered::FromGuild);
        assert_eq!(users.unregister(1, 20).unwrap(), Unregistered::Everywhere);
        assert!(users.known_user(1, 20).is_err());
        assert!(users.unregister(1, 20).is_err());
    }

    #[test]
    fn home_place_defaults() {
        let users = identity();
        assert_eq!(users.home(1).unwrap(), None);
        assert_eq!(users.guild_home(10).unwrap(), keys::DEFAULT_HOME_PLACE);

        users.set_home(1, 6853).unwrap();
        assert_eq!(users.home(1).unwrap(), Some(6853));
        users.clear_home(1).unwrap();
        assert_eq!(users.home(1).unwrap(), None);
    }
}
