//! Effective values of inheritable channel settings.
//!
//! Resolution is two levels deep: a channel value of [`TriState::Inherit`] (or
//! an absent one) yields the guild value, which itself falls back to the
//! guild key's default. There is no further inheritance to the global scope.

use serde::{Deserialize, Serialize};

use super::keys::Inheritable;
use super::{ChannelId, GuildId, Scope, Settings};
use crate::error::Result;

/// A boolean setting with an explicit "inherit from parent scope" state.
///
/// Persisted as JSON `true`, `false`, or `null` (inherit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Option<bool>", into = "Option<bool>")]
pub enum TriState {
    True,
    False,
    #[default]
    Inherit,
}

impl From<Option<bool>> for TriState {
    fn from(value: Option<bool>) -> Self {
        match value {
            Some(true) => Self::True,
            Some(false) => Self::False,
            None => Self::Inherit,
        }
    }
}

impl From<TriState> for Option<bool> {
    fn from(value: TriState) -> Self {
        match value {
            TriState::True => Some(true),
            TriState::False => Some(false),
            TriState::Inherit => None,
        }
    }
}

impl std::fmt::Display for TriState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::True => "on",
            Self::False => "off",
            Self::Inherit => "inherit",
        })
    }
}

impl std::str::FromStr for TriState {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "yes" | "y" | "true" | "t" | "1" | "enable" | "on" => Ok(Self::True),
            "no" | "n" | "false" | "f" | "0" | "disable" | "off" => Ok(Self::False),
            "i" | "inherit" | "inherits" | "inherited" => Ok(Self::Inherit),
            _ => Err(format!("{s} is not a recognized boolean option or \"inherit\"")),
        }
    }
}

/// Combine a channel value with its guild value.
pub fn resolve(channel: TriState, guild: bool) -> bool {
    match channel {
        TriState::True => true,
        TriState::False => false,
        TriState::Inherit => guild,
    }
}

/// A channel's stored state alongside the value it resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelSetting {
    pub state: TriState,
    pub effective: bool,
}

impl ChannelSetting {
    pub fn is_inherited(&self) -> bool {
        self.state == TriState::Inherit
    }
}

/// Reads and writes inheritable settings at guild and channel scope.
#[derive(Clone)]
pub struct SettingsResolver {
    settings: Settings,
}

impl SettingsResolver {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    /// The concrete value of `setting` in a channel.
    pub fn effective(
        &self,
        guild: GuildId,
        channel: ChannelId,
        setting: &Inheritable,
    ) -> Result<bool> {
        Ok(self.channel_setting(guild, channel, setting)?.effective)
    }

    pub fn channel_setting(
        &self,
        guild: GuildId,
        channel: ChannelId,
        setting: &Inheritable,
    ) -> Result<ChannelSetting> {
        let state = self
            .settings
            .get(Scope::Channel { guild, channel }, &setting.channel)?;
        let effective = match state {
            TriState::Inherit => self.guild_value(guild, setting)?,
            other => resolve(other, false),
        };
        Ok(ChannelSetting { state, effective })
    }

    pub fn guild_value(&self, guild: GuildId, setting: &Inheritable) -> Result<bool> {
        self.settings.get(Scope::Guild(guild), &setting.guild)
    }

    pub fn set_channel(
        &self,
        guild: GuildId,
        channel: ChannelId,
        setting: &Inheritable,
        state: TriState,
    ) -> Result<()> {
        tracing::info!(guild, channel, setting = setting.name(), %state, "channel setting changed");
        self.settings
            .set(Scope::Channel { guild, channel }, &setting.channel, &state)
    }

    pub fn clear_channel(
        &self,
        guild: GuildId,
        channel: ChannelId,
        setting: &Inheritable,
    ) -> Result<()> {
        self.settings
            .clear(Scope::Channel { guild, channel }, &setting.channel)
    }

    pub fn set_guild(&self, guild: GuildId, setting: &Inheritable, value: bool) -> Result<()> {
        tracing::info!(guild, setting = setting.name(), value, "guild setting changed");
        self.settings.set(Scope::Guild(guild), &setting.guild, &value)
    }

    pub fn clear_guild(&self, guild: GuildId, setting: &Inheritable) -> Result<()> {
        self.settings.clear(Scope::Guild(guild), &setting.guild)
    }
}
