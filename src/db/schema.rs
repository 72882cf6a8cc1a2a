//! SQL DDL for the settings table.
//!
//! Every scoped setting lives in one `settings` table keyed by
//! `(scope, primary_id, secondary_id, key)`. Values are JSON text so any
//! serde-representable setting fits. All DDL uses `IF NOT EXISTS`.

use rusqlite::Connection;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS settings (
    scope TEXT NOT NULL CHECK(scope IN ('global','guild','channel','user')),
    primary_id INTEGER NOT NULL DEFAULT 0,
    secondary_id INTEGER NOT NULL DEFAULT 0,
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (scope, primary_id, secondary_id, key)
);

CREATE INDEX IF NOT EXISTS idx_settings_scope ON settings(scope);
"#;

/// Initialize all schema tables. Idempotent.
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)
}
