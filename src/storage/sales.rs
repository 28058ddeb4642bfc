//! Storage gateway for the `ventas_nacionales` table.
//!
//! Uses r2d2 with r2d2_sqlite for pooled access. The same [`SalesStore`]
//! is cloned into the HTTP state and the drain loop; SQLite serializes
//! concurrent writes itself.

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension, Row};
use std::path::Path;
use thiserror::Error;

use super::schema::{apply_pragmas, initialize_schema};
use crate::model::{NewSale, SaleChanges, SaleRecord};

/// Error type for storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to create connection pool: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Sale {0} not found")]
    NotFound(i64),
}

/// Pooled access to the sales table.
#[derive(Clone)]
pub struct SalesStore {
    pool: Pool<SqliteConnectionManager>,
}

impl SalesStore {
    /// Open (or create) the database at `db_path` and ensure the schema.
    ///
    /// # Arguments
    ///
    /// * `db_path` - Path to the SQLite database file
    /// * `max_size` - Maximum number of connections in the pool
    pub fn open<P: AsRef<Path>>(db_path: P, max_size: u32) -> Result<Self, StorageError> {
        let manager = SqliteConnectionManager::file(db_path);

        let pool = Pool::builder()
            .max_size(max_size)
            .connection_customizer(Box::new(PragmaCustomizer))
            .build(manager)?;

        let store = Self { pool };
        initialize_schema(&*store.get()?)?;
        Ok(store)
    }

    /// Get a connection from the pool.
    pub fn get(&self) -> Result<PooledConnection<SqliteConnectionManager>, StorageError> {
        Ok(self.pool.get()?)
    }

    /// Insert a sale and return its generated id.
    pub fn insert(&self, sale: &NewSale) -> Result<i64, StorageError> {
        let conn = self.get()?;
        conn.execute(
            "INSERT INTO ventas_nacionales (modelo, precio, comprador, fecha) VALUES (?1, ?2, ?3, ?4)",
            params![sale.modelo, sale.precio, sale.comprador, sale.fecha],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Every sale, in insertion order.
    pub fn list_all(&self) -> Result<Vec<SaleRecord>, StorageError> {
        let conn = self.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, modelo, precio, comprador, fecha FROM ventas_nacionales ORDER BY id ASC",
        )?;
        let rows = stmt
            .query_map([], sale_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Point lookup. `Ok(None)` means the id does not exist.
    pub fn get_by_id(&self, id: i64) -> Result<Option<SaleRecord>, StorageError> {
        let conn = self.get()?;
        let sale = conn
            .query_row(
                "SELECT id, modelo, precio, comprador, fecha FROM ventas_nacionales WHERE id = ?1",
                [id],
                sale_from_row,
            )
            .optional()?;
        Ok(sale)
    }

    /// Coalescing update: falsy or absent fields keep the stored value.
    pub fn update(&self, id: i64, changes: SaleChanges) -> Result<(), StorageError> {
        let changes = changes.normalized();
        let conn = self.get()?;
        let updated = conn.execute(
            r#"
            UPDATE ventas_nacionales
            SET modelo = COALESCE(?1, modelo),
                precio = COALESCE(?2, precio),
                comprador = COALESCE(?3, comprador),
                fecha = COALESCE(?4, fecha)
            WHERE id = ?5
            "#,
            params![changes.modelo, changes.precio, changes.comprador, changes.fecha, id],
        )?;

        if updated == 0 {
            return Err(StorageError::NotFound(id));
        }
        Ok(())
    }

    /// Remove a sale.
    pub fn delete(&self, id: i64) -> Result<(), StorageError> {
        let conn = self.get()?;
        let deleted = conn.execute("DELETE FROM ventas_nacionales WHERE id = ?1", [id])?;

        if deleted == 0 {
            return Err(StorageError::NotFound(id));
        }
        Ok(())
    }

    /// Number of rows currently stored.
    pub fn count(&self) -> Result<i64, StorageError> {
        let conn = self.get()?;
        Ok(conn.query_row("SELECT COUNT(*) FROM ventas_nacionales", [], |row| row.get(0))?)
    }
}

// Rows written by older producers may carry NULLs.
fn sale_from_row(row: &Row<'_>) -> rusqlite::Result<SaleRecord> {
    Ok(SaleRecord {
        id: row.get(0)?,
        modelo: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        precio: row.get::<_, Option<i64>>(2)?.unwrap_or_default(),
        comprador: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        fecha: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
    })
}

/// Connection customizer that applies pragmas on every new connection.
#[derive(Debug)]
struct PragmaCustomizer;

impl r2d2::CustomizeConnection<rusqlite::Connection, rusqlite::Error> for PragmaCustomizer {
    fn on_acquire(&self, conn: &mut rusqlite::Connection) -> Result<(), rusqlite::Error> {
        apply_pragmas(conn)
    }
}
