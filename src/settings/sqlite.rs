//! SQLite-backed [`SettingsStore`].

use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{Scope, ScopeKind, SettingsStore};
use crate::error::Result;

/// Settings persisted in the `settings` table of a single connection.
///
/// The connection mutex serializes writes; each `set_raw` is one UPSERT
/// statement, so a write either lands whole or not at all.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        // A panic mid-statement leaves sqlite consistent; keep serving.
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SettingsStore for SqliteStore {
    fn get_raw(&self, scope: Scope, key: &str) -> Result<Option<Value>> {
        let (primary, secondary) = scope.ids();
        let raw: Option<String> = self
            .conn()
            .query_row(
                "SELECT value FROM settings \
                 WHERE scope = ?1 AND primary_id = ?2 AND secondary_id = ?3 AND key = ?4",
                params![scope.kind().as_str(), primary as i64, secondary as i64, key],
                |row| row.get(0),
            )
            .optional()?;

        raw.map(|text| serde_json::from_str(&text))
            .transpose()
            .map_err(Into::into)
    }

    fn set_raw(&self, scope: Scope, key: &str, value: &Value) -> Result<()> {
        let (primary, secondary) = scope.ids();
        let text = serde_json::to_string(value)?;
        let now = chrono::Utc::now().to_rfc3339();
        self.conn().execute(
            "INSERT INTO settings (scope, primary_id, secondary_id, key, value, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6) \
             ON CONFLICT(scope, primary_id, secondary_id, key) \
             DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![
                scope.kind().as_str(),
                primary as i64,
                secondary as i64,
                key,
                text,
                now
            ],
        )?;
        tracing::debug!(%scope, key, "setting stored");
        Ok(())
    }

    fn clear(&self, scope: Scope, key: &str) -> Result<()> {
        let (primary, secondary) = scope.ids();
        self.conn().execute(
            "DELETE FROM settings \
             WHERE scope = ?1 AND primary_id = ?2 AND secondary_id = ?3 AND key = ?4",
            params![scope.kind().as_str(), primary as i64, secondary as i64, key],
        )?;
        tracing::debug!(%scope, key, "setting cleared");
        Ok(())
    }

    fn scopes(&self, kind: ScopeKind) -> Result<Vec<Scope>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT DISTINCT primary_id, secondary_id FROM settings \
             WHERE scope = ?1 ORDER BY primary_id, secondary_id",
        )?;
        let scopes = stmt
            .query_map(params![kind.as_str()], |row| {
                let primary: i64 = row.get(0)?;
                let secondary: i64 = row.get(1)?;
                Ok(Scope::from_parts(kind, primary as u64, secondary as u64))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(scopes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> SqliteStore {
        SqliteStore::new(crate::db::open_memory_database().unwrap())
    }

    #[test]
    fn missing_key_reads_as_none() {
        let store = store();
        assert!(store.get_raw(Scope::Guild(1), "home").unwrap().is_none());
    }

    #[test]
    fn set_replaces_prior_value() {
        let store = store();
        store.set_raw(Scope::Guild(1), "home", &json!(1)).unwrap();
        store.set_raw(Scope::Guild(1), "home", &json!(2)).unwrap();
        assert_eq!(store.get_raw(Scope::Guild(1), "home").unwrap(), Some(json!(2)));
    }

    #[test]
    fn scopes_are_isolated() {
        let store = store();
        store.set_raw(Scope::Guild(1), "autoobs", &json!(true)).unwrap();
        let channel = Scope::Channel {
            guild: 1,
            channel: 1,
        };
        assert!(store.get_raw(channel, "autoobs").unwrap().is_none());
        assert!(store.get_raw(Scope::User(1), "autoobs").unwrap().is_none());
    }

    #[test]
    fn clear_removes_value() {
        let store = store();
        store.set_raw(Scope::User(3), "home", &json!(10)).unwrap();
        store.clear(Scope::User(3), "home").unwrap();
        assert!(store.get_raw(Scope::User(3), "home").unwrap().is_none());
    }

    #[test]
    fn scopes_lists_each_instance_once() {
        let store = store();
        store.set_raw(Scope::Guild(2), "home", &json!(1)).unwrap();
        store.set_raw(Scope::Guild(2), "autoobs", &json!(true)).unwrap();
        store.set_raw(Scope::Guild(1), "home", &json!(1)).unwrap();
        store.set_raw(Scope::User(1), "home", &json!(1)).unwrap();

        let guilds = store.scopes(ScopeKind::Guild).unwrap();
        assert_eq!(guilds, vec![Scope::Guild(1), Scope::Guild(2)]);
    }
}
