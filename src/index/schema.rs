//! Query index schema.
//!
//! The index is derived state: on any schema-version mismatch the tables
//! are dropped and recreated, and the next refresh repopulates them from
//! the entity files.

use rusqlite::Connection;

pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// The complete SQL schema for the query index.
pub const SCHEMA_SQL: &str = r"
    -- Denormalized projection of entity files for fast filtering.
    CREATE TABLE IF NOT EXISTS entities (
        kind TEXT NOT NULL,
        id TEXT NOT NULL,
        path TEXT NOT NULL UNIQUE,
        title TEXT NOT NULL,
        status TEXT NOT NULL,
        priority TEXT,
        assignee TEXT,
        milestone TEXT,
        summary TEXT,
        labels TEXT NOT NULL DEFAULT '[]',
        estimated_minutes INTEGER,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        fingerprint TEXT NOT NULL,
        PRIMARY KEY (kind, id)
    );

    CREATE INDEX IF NOT EXISTS idx_entities_status ON entities(status);
    CREATE INDEX IF NOT EXISTS idx_entities_assignee ON entities(assignee);
    CREATE INDEX IF NOT EXISTS idx_entities_milestone ON entities(milestone);
    CREATE INDEX IF NOT EXISTS idx_entities_updated_at ON entities(updated_at);

    CREATE TABLE IF NOT EXISTS index_meta (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );
";

/// Apply the schema, recreating everything on a version mismatch.
///
/// # Errors
///
/// Returns an error if any statement fails.
pub fn apply_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;

    let stored: Option<String> = conn
        .query_row(
            "SELECT value FROM index_meta WHERE key = 'schema_version'",
            [],
            |row| row.get(0),
        )
        .map(Some)
        .or_else(|err| match err {
            rusqlite::Error::QueryReturnedNoRows => Ok(None),
            other => Err(other),
        })?;

    let stored_version = stored.and_then(|v| v.parse::<i32>().ok());
    if stored_version != Some(CURRENT_SCHEMA_VERSION) {
        if stored_version.is_some() {
            tracing::info!("index schema changed, rebuilding from scratch");
            conn.execute_batch(
                "DROP TABLE IF EXISTS entities; DROP TABLE IF EXISTS index_meta;",
            )?;
            conn.execute_batch(SCHEMA_SQL)?;
        }
        conn.execute(
            "INSERT OR REPLACE INTO index_meta (key, value) VALUES ('schema_version', ?)",
            [CURRENT_SCHEMA_VERSION.to_string()],
        )?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        apply_schema(&conn).unwrap();
        apply_schema(&conn).unwrap();

        let version: String = conn
            .query_row(
                "SELECT value FROM index_meta WHERE key = 'schema_version'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(version, CURRENT_SCHEMA_VERSION.to_string());
    }

    #[test]
    fn version_mismatch_drops_rows() {
        let conn = Connection::open_in_memory().unwrap();
        apply_schema(&conn).unwrap();

        conn.execute(
            "INSERT INTO entities (kind, id, path, title, status, created_at, updated_at, fingerprint)
             VALUES ('issue', 'a1b2c3d4', 'p', 't', 'todo', 'c', 'u', 'f')",
            [],
        )
        .unwrap();
        conn.execute(
            "UPDATE index_meta SET value = '0' WHERE key = 'schema_version'",
            [],
        )
        .unwrap();

        apply_schema(&conn).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM entities", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}
