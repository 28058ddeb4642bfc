//! Schema initialization and connection pragmas.

use rusqlite::Connection;
use std::time::Duration;

/// How long a connection waits on a locked database before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Apply the pragmas every connection runs with.
///
/// WAL lets HTTP reads proceed while the drain loop writes.
pub fn apply_pragmas(conn: &Connection) -> rusqlite::Result<()> {
    conn.busy_timeout(BUSY_TIMEOUT)?;
    conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
        row.get::<_, String>(0)
    })?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    Ok(())
}

/// Create the sales table if it does not exist yet. Idempotent.
pub fn initialize_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS ventas_nacionales (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            modelo TEXT,
            precio INTEGER,
            comprador TEXT,
            fecha TEXT
        );
        "#,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_initialize_schema_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let conn = Connection::open(temp_dir.path().join("test.db")).unwrap();
        apply_pragmas(&conn).unwrap();

        initialize_schema(&conn).unwrap();
        conn.execute(
            "INSERT INTO ventas_nacionales (modelo, precio, comprador, fecha) VALUES ('a', 1, 'b', 'c')",
            [],
        )
        .unwrap();
        initialize_schema(&conn).unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM ventas_nacionales", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_wal_mode_enabled() {
        let temp_dir = TempDir::new().unwrap();
        let conn = Connection::open(temp_dir.path().join("test.db")).unwrap();
        apply_pragmas(&conn).unwrap();

        let mode: String = conn
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
    }
}
