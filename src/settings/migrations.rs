//! Forward-only migrations over stored settings.
//!
//! The schema version lives in the global scope under
//! [`keys::SCHEMA_VERSION`]. Each [`Migration`] transforms every relevant
//! scoped record and only then advances the version, so an interrupted run
//! leaves the version behind and the next start re-runs the whole step.
//! Transforms therefore skip records they have already migrated.

use std::collections::BTreeMap;

use super::keys;
use super::{Scope, ScopeKind, Settings};
use crate::error::{Error, Result};
use crate::registry::events::EventProjectEntry;
use crate::registry::normalize;

/// The schema version that the current binary expects.
pub const CURRENT_SCHEMA_VERSION: u32 = 3;

/// Installations whose early registrations were meant for the home guild only.
pub const DEVELOPER_INSTALLATION_IDS: [u64; 2] = [614037008217800707, 620938327293558794];

/// The guild that pre-v2 registrations on developer installations belong to.
pub const HOME_GUILD_ID: u64 = 525711945270296587;

/// Facts about the running process that transforms may consult.
#[derive(Debug, Clone, Default)]
pub struct MigrationContext {
    /// Identity of the running bot installation, if known.
    pub installation_id: Option<u64>,
}

type Transform = fn(&Settings, &MigrationContext) -> Result<()>;

/// One version-gated transformation.
#[derive(Clone)]
pub struct Migration {
    /// Lowest stored version the transform can start from. A store below it
    /// has no path through this step.
    pub from: u32,
    /// Version recorded once the transform completes.
    pub target: u32,
    pub description: &'static str,
    pub transform: Transform,
}

impl std::fmt::Debug for Migration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Migration")
            .field("from", &self.from)
            .field("target", &self.target)
            .field("description", &self.description)
            .finish()
    }
}

/// The migrations shipped with this binary.
pub fn standard_migrations() -> Vec<Migration> {
    vec![
        Migration {
            from: 1,
            target: 2,
            description: "restrict legacy user registrations to the home guild",
            transform: restrict_legacy_known_users,
        },
        Migration {
            from: 2,
            target: 3,
            description: "convert user projects to event projects",
            transform: convert_user_projects,
        },
    ]
}

/// Applies an ordered list of migrations to a settings store.
#[derive(Debug, Clone)]
pub struct MigrationEngine {
    steps: Vec<Migration>,
}

impl MigrationEngine {
    pub fn new(mut steps: Vec<Migration>) -> Self {
        steps.sort_by_key(|step| step.target);
        Self { steps }
    }

    pub fn standard() -> Self {
        Self::new(standard_migrations())
    }

    /// The highest version any step targets (1 when there are no steps).
    pub fn desired_version(&self) -> u32 {
        self.steps.last().map_or(1, |step| step.target)
    }

    /// Run every pending step. Returns the version reached.
    ///
    /// A failing transform leaves the stored version at the last completed
    /// step and is reported as [`Error::Migration`]; nothing is retried here.
    pub fn run(&self, settings: &Settings, ctx: &MigrationContext) -> Result<u32> {
        let mut version = get_schema_version(settings)?;
        let desired = self.desired_version();
        tracing::debug!(schema_version = version, target = desired, "checking migrations");

        if version >= desired {
            if version > desired {
                tracing::warn!(
                    schema_version = version,
                    target = desired,
                    "stored settings are newer than this binary"
                );
            }
            return Ok(version);
        }

        for step in &self.steps {
            if version >= step.target {
                continue;
            }
            if version < step.from {
                tracing::error!(
                    schema_version = version,
                    step_from = step.from,
                    to = step.target,
                    "no migration path"
                );
                return Err(Error::MigrationGap {
                    from: version,
                    target: step.target,
                });
            }

            tracing::info!(
                from = version,
                to = step.target,
                description = step.description,
                "running migration"
            );

            (step.transform)(settings, ctx).map_err(|e| {
                tracing::error!(target_version = step.target, error = %e, "migration failed");
                Error::Migration {
                    target: step.target,
                    source: Box::new(e),
                }
            })?;

            settings.set(Scope::Global, &keys::SCHEMA_VERSION, &step.target)?;
            version = step.target;
        }

        Ok(version)
    }
}

/// Get the stored schema version (1 when never written).
pub fn get_schema_version(settings: &Settings) -> Result<u32> {
    settings.get(Scope::Global, &keys::SCHEMA_VERSION)
}

/// v1 -> v2: registrations made through the developer installations were meant
/// for the home guild only. Pin them there so they don't leak to other guilds.
fn restrict_legacy_known_users(settings: &Settings, ctx: &MigrationContext) -> Result<()> {
    let Some(installation) = ctx.installation_id else {
        return Ok(());
    };
    if !DEVELOPER_INSTALLATION_IDS.contains(&installation) {
        return Ok(());
    }

    let mut pinned = 0usize;
    for scope in settings.scopes(ScopeKind::User)? {
        let external = settings.get(scope, &keys::USER_EXTERNAL_ID)?;
        if external.is_some_and(|id| id != 0) {
            settings.set(scope, &keys::USER_KNOWN_IN, &vec![HOME_GUILD_ID])?;
            pinned += 1;
        }
    }
    tracing::info!(users = pinned, "pinned legacy registrations to home guild");
    Ok(())
}

/// v2 -> v3: user projects (project id string -> label) become event
/// projects keyed by the case-folded label. Guilds without legacy entries are
/// left untouched.
///
/// Entries that cannot be converted stay in the legacy map: ids that are not
/// numeric, and labels that fold onto an event project for a different id.
/// The legacy key is only cleared once nothing is left in it.
fn convert_user_projects(settings: &Settings, _ctx: &MigrationContext) -> Result<()> {
    for scope in settings.scopes(ScopeKind::Guild)? {
        let legacy = settings.get(scope, &keys::LEGACY_USER_PROJECTS)?;
        if legacy.is_empty() {
            continue;
        }

        let mut events: BTreeMap<String, EventProjectEntry> =
            settings.get(scope, &keys::GUILD_EVENT_PROJECTS)?;
        let mut kept = BTreeMap::new();
        for (raw_id, label) in legacy {
            let Ok(project_id) = raw_id.trim().parse::<u64>() else {
                tracing::warn!(%scope, project_id = %raw_id, "keeping non-numeric legacy project id");
                kept.insert(raw_id, label);
                continue;
            };

            let abbrev = normalize(&label);
            match events.get(&abbrev) {
                Some(existing) if existing.project_id != project_id => {
                    tracing::warn!(
                        %scope,
                        %abbrev,
                        project_id,
                        existing = existing.project_id,
                        "keeping legacy project whose label is taken"
                    );
                    kept.insert(raw_id, label);
                }
                Some(_) => {}
                None => {
                    events.insert(abbrev, EventProjectEntry::new(project_id));
                }
            }
        }

        settings.set(scope, &keys::GUILD_EVENT_PROJECTS, &events)?;
        if kept.is_empty() {
            settings.clear(scope, &keys::LEGACY_USER_PROJECTS)?;
        } else {
            settings.set(scope, &keys::LEGACY_USER_PROJECTS, &kept)?;
        }
        tracing::info!(%scope, events = events.len(), kept = kept.len(), "converted user projects");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::sqlite::SqliteStore;
    use std::sync::Arc;

    fn settings() -> Settings {
        let conn = crate::db::open_memory_database().unwrap();
        Settings::new(Arc::new(SqliteStore::new(conn)))
    }

    fn failing(_: &Settings, _: &MigrationContext) -> Result<()> {
        Err(Error::NotFound("boom".into()))
    }

    #[test]
    fn get_schema_version_returns_1_on_fresh_store() {
        assert_eq!(get_schema_version(&settings()).unwrap(), 1);
    }

    #[test]
    fn run_upgrades_to_current() {
        let settings = settings();
        let reached = MigrationEngine::standard()
            .run(&settings, &MigrationContext::default())
            .unwrap();
        assert_eq!(reached, CURRENT_SCHEMA_VERSION);
        assert_eq!(get_schema_version(&settings).unwrap(), CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn steps_run_in_target_order() {
        let engine = MigrationEngine::new(standard_migrations().into_iter().rev().collect());
        assert_eq!(engine.desired_version(), 3);
        assert_eq!(engine.steps[0].target, 2);
    }

    #[test]
    fn failed_step_leaves_version_unadvanced() {
        let settings = settings();
        let mut steps = standard_migrations();
        steps[1].transform = failing;
        let err = MigrationEngine::new(steps)
            .run(&settings, &MigrationContext::default())
            .unwrap_err();

        assert!(matches!(err, Error::Migration { target: 3, .. }));
        assert_eq!(get_schema_version(&settings).unwrap(), 2);
    }

    #[test]
    fn step_above_stored_version_is_a_gap() {
        let settings = settings();
        let engine = MigrationEngine::new(standard_migrations().split_off(1));
        let err = engine
            .run(&settings, &MigrationContext::default())
            .unwrap_err();

        assert!(matches!(err, Error::MigrationGap { from: 1, target: 3 }));
        assert_eq!(get_schema_version(&settings).unwrap(), 1);
    }

    #[test]
    fn newer_store_is_left_alone() {
        let settings = settings();
        settings
            .set(Scope::Global, &keys::SCHEMA_VERSION, &7)
            .unwrap();
        let reached = MigrationEngine::standard()
            .run(&settings, &MigrationContext::default())
            .unwrap();
        assert_eq!(reached, 7);
    }
}
