#![allow(dead_code)]

use async_trait::async_trait;
use fieldkit::error::{Error, Result};
use fieldkit::reference::{ExternalRecord, RecordKind, ReferenceFetcher};
use fieldkit::settings::sqlite::SqliteStore;
use fieldkit::settings::Settings;
use rusqlite::Connection;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Settings over a fresh in-memory database.
pub fn test_settings() -> Settings {
    let conn = fieldkit::db::open_memory_database().unwrap();
    Settings::new(Arc::new(SqliteStore::new(conn)))
}

/// Settings over an on-disk database, so tests can inspect the raw table.
pub fn disk_settings(dir: &Path) -> (PathBuf, Settings) {
    let path = dir.join("settings.db");
    let conn = fieldkit::db::open_database(&path).unwrap();
    (path, Settings::new(Arc::new(SqliteStore::new(conn))))
}

/// Every stored row except timestamps, in a stable order.
pub fn snapshot(path: &Path) -> Vec<(String, i64, i64, String, String)> {
    let conn = Connection::open(path).unwrap();
    let mut stmt = conn
        .prepare(
            "SELECT scope, primary_id, secondary_id, key, value FROM settings \
             ORDER BY scope, primary_id, secondary_id, key",
        )
        .unwrap();
    stmt.query_map([], |row| {
        Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
    })
    .unwrap()
    .collect::<std::result::Result<Vec<_>, _>>()
    .unwrap()
}

pub fn record(kind: RecordKind, id: u64, name: &str) -> ExternalRecord {
    ExternalRecord {
        kind,
        id,
        display_name: name.to_string(),
        url: format!("https://www.inaturalist.org/{}/{id}", kind.web_path()),
    }
}

/// In-process stand-in for the remote API. Records every batch it is asked for.
#[derive(Default)]
pub struct FakeFetcher {
    names: HashMap<(RecordKind, u64), String>,
    deleted: Mutex<HashSet<u64>>,
    fail_on: Option<u64>,
    batches: Mutex<Vec<(RecordKind, Vec<u64>)>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, kind: RecordKind, id: u64, name: &str) -> Self {
        self.names.insert((kind, id), name.to_string());
        self
    }

    /// Fail any batch that contains `id`.
    pub fn failing_on(mut self, id: u64) -> Self {
        self.fail_on = Some(id);
        self
    }

    /// Make the remote forget `id` from now on.
    pub fn delete(&self, id: u64) {
        self.deleted.lock().unwrap().insert(id);
    }

    pub fn batches(&self) -> Vec<(RecordKind, Vec<u64>)> {
        self.batches.lock().unwrap().clone()
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        let mut sizes: Vec<usize> = self.batches().iter().map(|(_, ids)| ids.len()).collect();
        sizes.sort_unstable_by(|a, b| b.cmp(a));
        sizes
    }
}

#[async_trait]
impl ReferenceFetcher for FakeFetcher {
    async fn fetch(&self, kind: RecordKind, ids: &[u64]) -> Result<Vec<ExternalRecord>> {
        assert!(
            ids.len() <= kind.batch_ceiling(),
            "{} ids exceeds the {kind} ceiling",
            ids.len()
        );
        self.batches.lock().unwrap().push((kind, ids.to_vec()));

        if let Some(bad) = self.fail_on {
            if ids.contains(&bad) {
                return Err(Error::Fetch(format!("HTTP 500 for batch containing {bad}")));
            }
        }

        let deleted = self.deleted.lock().unwrap();
        Ok(ids
            .iter()
            .filter(|id| !deleted.contains(id))
            .map(|&id| {
                let name = self
                    .names
                    .get(&(kind, id))
                    .cloned()
                    .unwrap_or_else(|| format!("{kind} {id}"));
                record(kind, id, &name)
            })
            .collect())
    }
}
