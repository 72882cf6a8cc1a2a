//! CLI `setting` command for inheritable guild/channel settings.

use anyhow::{anyhow, Result};
use clap::Subcommand;

use fieldkit::config::FieldkitConfig;
use fieldkit::settings::keys::Inheritable;
use fieldkit::settings::resolver::TriState;

#[derive(Subcommand)]
pub enum SettingAction {
    /// Show a setting for a guild, or for one channel in it
    Show {
        name: String,
        #[arg(long)]
        guild: u64,
        #[arg(long)]
        channel: Option<u64>,
    },
    /// Set a guild value (on/off) or a channel value (on/off/inherit)
    Set {
        name: String,
        value: String,
        #[arg(long)]
        guild: u64,
        #[arg(long)]
        channel: Option<u64>,
    },
    /// Reset a guild or channel value to its default
    Clear {
        name: String,
        #[arg(long)]
        guild: u64,
        #[arg(long)]
        channel: Option<u64>,
    },
}

fn lookup(name: &str) -> Result<&'static Inheritable> {
    Inheritable::by_name(name).ok_or_else(|| anyhow!("unknown setting: {name}"))
}

fn on_off(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}

pub async fn run(config: &FieldkitConfig, action: SettingAction) -> Result<()> {
    let service = super::open_service(config)?;
    let resolver = service.resolver().await?;

    match action {
        SettingAction::Show {
            name,
            guild,
            channel: None,
        } => {
            let setting = lookup(&name)?;
            let value = resolver.guild_value(guild, setting)?;
            println!("Server {name} is {}.", on_off(value));
        }
        SettingAction::Show {
            name,
            guild,
            channel: Some(channel),
        } => {
            let setting = lookup(&name)?;
            let state = resolver.channel_setting(guild, channel, setting)?;
            if state.is_inherited() {
                println!(
                    "Channel {name} is inherited from server ({}).",
                    on_off(state.effective)
                );
            } else {
                println!("Channel {name} is {}.", on_off(state.effective));
            }
        }
        SettingAction::Set {
            name,
            value,
            guild,
            channel,
        } => {
            let setting = lookup(&name)?;
            let state: TriState = value.parse().map_err(|e: String| anyhow!(e))?;
            match (channel, state) {
                (Some(channel), state) => resolver.set_channel(guild, channel, setting, state)?,
                (None, TriState::Inherit) => {
                    return Err(anyhow!("a server setting cannot inherit; use on or off"));
                }
                (None, state) => resolver.set_guild(guild, setting, state == TriState::True)?,
            }
            println!("{name} updated.");
        }
        SettingAction::Clear {
            name,
            guild,
            channel,
        } => {
            let setting = lookup(&name)?;
            match channel {
                Some(channel) => resolver.clear_channel(guild, channel, setting)?,
                None => resolver.clear_guild(guild, setting)?,
            }
            println!("{name} cleared.");
        }
    }
    Ok(())
}
