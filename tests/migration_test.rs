mod helpers;

use std::collections::BTreeMap;
use std::sync::Arc;

use fieldkit::error::{Error, Result};
use fieldkit::reference::cache::ReferenceCache;
use fieldkit::registry::events::{EventProjectEntry, EventProjectRegistry};
use fieldkit::settings::keys;
use fieldkit::settings::migrations::{
    get_schema_version, standard_migrations, MigrationContext, MigrationEngine,
    CURRENT_SCHEMA_VERSION, DEVELOPER_INSTALLATION_IDS, HOME_GUILD_ID,
};
use fieldkit::settings::{Scope, Settings};

fn developer() -> MigrationContext {
    MigrationContext {
        installation_id: Some(DEVELOPER_INSTALLATION_IDS[0]),
    }
}

fn seed_v1(settings: &Settings) {
    let legacy: BTreeMap<String, String> =
        BTreeMap::from([("123".to_string(), "abbrev-alpha".to_string())]);
    settings
        .set(Scope::Guild(1), &keys::LEGACY_USER_PROJECTS, &legacy)
        .unwrap();
    settings
        .set(Scope::Guild(2), &keys::GUILD_HOME, &6853)
        .unwrap();
    settings
        .set(Scope::User(10), &keys::USER_EXTERNAL_ID, &Some(545640))
        .unwrap();
    settings
        .set(Scope::User(10), &keys::USER_KNOWN_IN, &vec![1, 2])
        .unwrap();
    settings
        .set(Scope::User(11), &keys::USER_HOME, &Some(1))
        .unwrap();
}

#[test]
fn fresh_store_migrates_to_current_version() {
    let settings = helpers::test_settings();
    MigrationEngine::standard()
        .run(&settings, &MigrationContext::default())
        .unwrap();
    assert_eq!(get_schema_version(&settings).unwrap(), CURRENT_SCHEMA_VERSION);
}

#[test]
fn user_projects_become_event_projects() {
    let settings = helpers::test_settings();
    seed_v1(&settings);

    MigrationEngine::standard()
        .run(&settings, &MigrationContext::default())
        .unwrap();

    let events = settings
        .get(Scope::Guild(1), &keys::GUILD_EVENT_PROJECTS)
        .unwrap();
    assert_eq!(
        events,
        BTreeMap::from([("abbrev-alpha".to_string(), EventProjectEntry::new(123))])
    );
    assert!(!settings
        .is_set(Scope::Guild(1), &keys::LEGACY_USER_PROJECTS)
        .unwrap());
}

#[test]
fn guild_without_legacy_projects_is_untouched() {
    let settings = helpers::test_settings();
    seed_v1(&settings);

    MigrationEngine::standard()
        .run(&settings, &MigrationContext::default())
        .unwrap();

    assert!(!settings
        .is_set(Scope::Guild(2), &keys::GUILD_EVENT_PROJECTS)
        .unwrap());
}

#[test]
fn developer_installation_pins_registered_users_to_home_guild() {
    let settings = helpers::test_settings();
    seed_v1(&settings);

    MigrationEngine::standard().run(&settings, &developer()).unwrap();

    assert_eq!(
        settings.get(Scope::User(10), &keys::USER_KNOWN_IN).unwrap(),
        vec![HOME_GUILD_ID]
    );
    // No external id, so nothing to pin
    assert!(!settings
        .is_set(Scope::User(11), &keys::USER_KNOWN_IN)
        .unwrap());
}

#[test]
fn other_installations_keep_known_guilds() {
    let settings = helpers::test_settings();
    seed_v1(&settings);

    let ctx = MigrationContext {
        installation_id: Some(1),
    };
    MigrationEngine::standard().run(&settings, &ctx).unwrap();

    assert_eq!(
        settings.get(Scope::User(10), &keys::USER_KNOWN_IN).unwrap(),
        vec![1, 2]
    );
}

#[test]
fn second_run_leaves_state_identical() {
    let dir = tempfile::tempdir().unwrap();
    let (path, settings) = helpers::disk_settings(dir.path());
    seed_v1(&settings);

    let engine = MigrationEngine::standard();
    engine.run(&settings, &developer()).unwrap();
    let after_first = helpers::snapshot(&path);

    engine.run(&settings, &developer()).unwrap();
    assert_eq!(helpers::snapshot(&path), after_first);
}

fn interrupted(_: &Settings, _: &MigrationContext) -> Result<()> {
    Err(Error::Fetch("interrupted".into()))
}

#[test]
fn failed_run_is_retried_from_scratch_on_next_start() {
    let settings = helpers::test_settings();
    seed_v1(&settings);

    let mut steps = standard_migrations();
    steps[1].transform = interrupted;
    let err = MigrationEngine::new(steps)
        .run(&settings, &MigrationContext::default())
        .unwrap_err();
    assert!(matches!(err, Error::Migration { target: 3, .. }));
    assert_eq!(get_schema_version(&settings).unwrap(), 2);

    // Next process start with a working binary
    MigrationEngine::standard()
        .run(&settings, &MigrationContext::default())
        .unwrap();
    assert_eq!(get_schema_version(&settings).unwrap(), 3);
    assert_eq!(
        settings
            .get(Scope::Guild(1), &keys::GUILD_EVENT_PROJECTS)
            .unwrap()
            .len(),
        1
    );
}

#[test]
fn rerun_after_partial_conversion_does_not_duplicate() {
    let settings = helpers::test_settings();
    seed_v1(&settings);

    // Simulate a crash after event projects were written but before the
    // legacy map was cleared and the version advanced.
    let partial = BTreeMap::from([("abbrev-alpha".to_string(), EventProjectEntry::new(123))]);
    settings
        .set(Scope::Guild(1), &keys::GUILD_EVENT_PROJECTS, &partial)
        .unwrap();
    settings.set(Scope::Global, &keys::SCHEMA_VERSION, &2).unwrap();

    MigrationEngine::standard()
        .run(&settings, &MigrationContext::default())
        .unwrap();

    assert_eq!(
        settings
            .get(Scope::Guild(1), &keys::GUILD_EVENT_PROJECTS)
            .unwrap(),
        partial
    );
}

fn convert_legacy(legacy: &[(&str, &str)]) -> Settings {
    let settings = helpers::test_settings();
    let legacy: BTreeMap<String, String> = legacy
        .iter()
        .map(|(id, label)| (id.to_string(), label.to_string()))
        .collect();
    settings
        .set(Scope::Guild(1), &keys::LEGACY_USER_PROJECTS, &legacy)
        .unwrap();
    MigrationEngine::standard()
        .run(&settings, &MigrationContext::default())
        .unwrap();
    settings
}

#[test]
fn non_numeric_project_ids_stay_in_legacy_map() {
    let settings = convert_legacy(&[("123", "alpha"), ("abc", "beta")]);

    let events = settings
        .get(Scope::Guild(1), &keys::GUILD_EVENT_PROJECTS)
        .unwrap();
    assert_eq!(events.keys().collect::<Vec<_>>(), ["alpha"]);
    assert_eq!(
        settings
            .get(Scope::Guild(1), &keys::LEGACY_USER_PROJECTS)
            .unwrap(),
        BTreeMap::from([("abc".to_string(), "beta".to_string())])
    );
    assert_eq!(get_schema_version(&settings).unwrap(), CURRENT_SCHEMA_VERSION);
}

#[test]
fn mixed_case_labels_are_reachable_through_registry() {
    let settings = convert_legacy(&[("123", "CNC")]);
    let cache = Arc::new(ReferenceCache::new(Arc::new(helpers::FakeFetcher::new())));
    let events = EventProjectRegistry::new(settings, cache);

    assert_eq!(events.get(1, "CNC").unwrap().project_id, 123);
    assert!(matches!(
        events.add(1, "cnc", EventProjectEntry::new(5)),
        Err(Error::AlreadyDefined { target: 123, .. })
    ));
    assert_eq!(events.remove(1, "Cnc").unwrap().project_id, 123);
    assert!(events.entries(1).unwrap().is_empty());
}

#[test]
fn labels_colliding_after_case_folding_keep_the_loser() {
    let settings = convert_legacy(&[("123", "CNC"), ("456", "cnc")]);

    assert_eq!(
        settings
            .get(Scope::Guild(1), &keys::GUILD_EVENT_PROJECTS)
            .unwrap(),
        BTreeMap::from([("cnc".to_string(), EventProjectEntry::new(123))])
    );
    assert_eq!(
        settings
            .get(Scope::Guild(1), &keys::LEGACY_USER_PROJECTS)
            .unwrap(),
        BTreeMap::from([("456".to_string(), "cnc".to_string())])
    );
}

#[test]
fn legacy_label_taken_by_existing_event_project_is_kept() {
    let settings = helpers::test_settings();
    settings
        .set(
            Scope::Guild(1),
            &keys::GUILD_EVENT_PROJECTS,
            &BTreeMap::from([("bioblitz".to_string(), EventProjectEntry::new(9))]),
        )
        .unwrap();
    settings
        .set(
            Scope::Guild(1),
            &keys::LEGACY_USER_PROJECTS,
            &BTreeMap::from([("77".to_string(), "BioBlitz".to_string())]),
        )
        .unwrap();

    MigrationEngine::standard()
        .run(&settings, &MigrationContext::default())
        .unwrap();

    let events = settings
        .get(Scope::Guild(1), &keys::GUILD_EVENT_PROJECTS)
        .unwrap();
    assert_eq!(events["bioblitz"].project_id, 9);
    assert_eq!(
        settings
            .get(Scope::Guild(1), &keys::LEGACY_USER_PROJECTS)
            .unwrap()
            .len(),
        1
    );
}
