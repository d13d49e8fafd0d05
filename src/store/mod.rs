use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection};
use serde::Serialize;
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use crate::catalog::{CategoryRecord, PositionRecord};
use crate::import::{CatalogSink, FileReport};


/// SQLite-backed store for imported catalog records
pub struct CatalogStore {
    conn: Connection,
}

/// Row counts reported after an import
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogStats {
    pub category_count: u32,
    pub position_count: u32,
    /// Positions per source file, largest first
    pub positions_by_file: Vec<FileCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileCount {
    pub source_file: String,
    pub positions: u32,
}

impl CatalogStore {
    /// Create a new in-memory store
    pub fn open_in_memory() -> Result<Self> {
        let conn =
            Connection::open_in_memory().context("Failed to create in-memory database")?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// Open (or create) a store file
    pub fn open(path: &str) -> Result<Self> {
        let conn =
            Connection::open(path).context(format!("Failed to open database at {}", path))?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn
            .execute_batch(
                r#"
            CREATE TABLE IF NOT EXISTS mfdach_categories (
                id TEXT PRIMARY KEY,
                source_guid TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                parent_guid TEXT,
                source_file TEXT NOT NULL,
                sort_order INTEGER NOT NULL,
                imported_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS mfdach_positions (
                id TEXT PRIMARY KEY,
                source_id TEXT,
                name TEXT NOT NULL,
                short_text TEXT,
                long_text TEXT,
                unit TEXT,
                unit_code TEXT,
                category_guid TEXT,
                price_value1 REAL,
                price_value2 REAL,
                source_file TEXT NOT NULL,
                raw_data TEXT NOT NULL,
                imported_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS mfdach_import_files (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                source_file TEXT NOT NULL,
                kind TEXT NOT NULL,
                sha256 TEXT,
                record_count INTEGER NOT NULL,
                status TEXT NOT NULL,
                error TEXT,
                imported_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_positions_file ON mfdach_positions(source_file);
            CREATE INDEX IF NOT EXISTS idx_positions_category ON mfdach_positions(category_guid);
            CREATE INDEX IF NOT EXISTS idx_categories_parent ON mfdach_categories(parent_guid);
            "#,
            )
            .context("Failed to initialize database schema")?;
        Ok(())
    }

    /// Insert categories, keeping the existing row when a GUID is already present.
    ///
    /// Records without a GUID cannot be keyed and are skipped. Returns the
    /// number of rows actually inserted.
    pub fn upsert_categories(&mut self, records: &[CategoryRecord]) -> Result<usize> {
        let imported_at = Utc::now().to_rfc3339();
        let tx = self
            .conn
            .transaction()
            .context("Failed to begin category transaction")?;
        let mut inserted = 0;
        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO mfdach_categories (id, source_guid, name, parent_guid, source_file, sort_order, imported_at) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) ON CONFLICT(source_guid) DO NOTHING",
                )
                .context("Failed to prepare statement")?;

            for record in records {
                let Some(guid) = record.source_guid.as_deref() else {
                    debug!(name = %record.name, file = %record.source_file, "category without GUID skipped");
                    continue;
                };
                inserted += stmt
                    .execute(params![
                        Uuid::new_v4().to_string(),
                        guid,
                        record.name,
                        record.parent_guid,
                        record.source_file,
                        record.sort_order,
                        imported_at,
                    ])
                    .context(format!("Failed to insert category: {}", record.name))?;
            }
        }
        tx.commit().context("Failed to commit categories")?;
        Ok(inserted)
    }

    /// Append positions in a single transaction. Returns the number of rows written.
    pub fn insert_positions(&mut self, records: &[PositionRecord]) -> Result<usize> {
        let imported_at = Utc::now().to_rfc3339();
        let tx = self
            .conn
            .transaction()
            .context("Failed to begin position transaction")?;
        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO mfdach_positions (id, source_id, name, short_text, long_text, unit, unit_code, category_guid, price_value1, price_value2, source_file, raw_data, imported_at) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                )
                .context("Failed to prepare statement")?;

            for record in records {
                let raw_data = json!({ "description": record.description }).to_string();
                stmt.execute(params![
                    Uuid::new_v4().to_string(),
                    record.source_id,
                    record.name,
                    record.short_text,
                    record.long_text,
                    record.unit,
                    record.unit_code,
                    record.category_guid,
                    record.price_value1,
                    record.price_value2,
                    record.source_file,
                    raw_data,
                    imported_at,
                ])
                .context(format!("Failed to insert position: {}", record.name))?;
            }
        }
        tx.commit().context("Failed to commit positions")?;
        Ok(records.len())
    }

    /// Keep a provenance row for one imported file
    pub fn record_file(&self, report: &FileReport) -> Result<()> {
        let error = if report.errors.is_empty() {
            None
        } else {
            Some(report.errors.join("; "))
        };
        self.conn
            .execute(
                "INSERT INTO mfdach_import_files (source_file, kind, sha256, record_count, status, error, imported_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    report.source_file,
                    report.kind.as_str(),
                    report.sha256,
                    report.written as u32,
                    report.status.as_str(),
                    error,
                    Utc::now().to_rfc3339(),
                ],
            )
            .context(format!("Failed to record import of {}", report.source_file))?;
        Ok(())
    }

    /// Delete all imported rows
    pub fn clear(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "DELETE FROM mfdach_positions; DELETE FROM mfdach_categories; DELETE FROM mfdach_import_files;",
            )
            .context("Failed to clear catalog tables")?;
        Ok(())
    }

    /// Get all categories in source order
    pub fn get_all_categories(&self) -> Result<Vec<CategoryRecord>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT sort_order, source_guid, name, parent_guid, source_file FROM mfdach_categories \
                 ORDER BY source_file, sort_order",
            )
            .context("Failed to prepare statement")?;

        let categories = stmt
            .query_map([], |row| {
                Ok(CategoryRecord {
                    sort_order: row.get(0)?,
                    source_guid: row.get(1)?,
                    name: row.get(2)?,
                    parent_guid: row.get(3)?,
                    source_file: row.get(4)?,
                })
            })
            .context("Failed to query categories")?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to collect categories")?;

        Ok(categories)
    }

    /// Get all positions decoded from one source file, in insertion order
    pub fn get_positions_for_file(&self, source_file: &str) -> Result<Vec<PositionRecord>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT name, short_text, long_text, raw_data, unit, unit_code, category_guid, source_id, price_value1, price_value2, source_file \
                 FROM mfdach_positions WHERE source_file = ?1 ORDER BY rowid",
            )
            .context("Failed to prepare statement")?;

        let rows = stmt
            .query_map(params![source_file], |row| {
                let raw_data: String = row.get(3)?;
                let mut record = PositionRecord::new(row.get::<_, String>(0)?, row.get::<_, String>(10)?);
                record.short_text = row.get(1)?;
                record.long_text = row.get(2)?;
                record.unit = row.get(4)?;
                record.unit_code = row.get(5)?;
                record.category_guid = row.get(6)?;
                record.source_id = row.get(7)?;
                record.price_value1 = row.get(8)?;
                record.price_value2 = row.get(9)?;
                Ok((record, raw_data))
            })
            .context("Failed to query positions")?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to collect positions")?;

        rows.into_iter()
            .map(|(mut record, raw_data)| -> Result<PositionRecord> {
                let raw: serde_json::Value = serde_json::from_str(&raw_data)
                    .context(format!("Invalid raw_data for position {}", record.name))?;
                record.description = raw
                    .get("description")
                    .and_then(|d| d.as_str())
                    .map(str::to_string);
                Ok(record)
            })
            .collect()
    }

    /// Get statistics
    pub fn stats(&self) -> Result<CatalogStats> {
        let category_count: u32 = self
            .conn
            .query_row("SELECT COUNT(*) FROM mfdach_categories", [], |row| row.get(0))
            .context("Failed to count categories")?;

        let position_count: u32 = self
            .conn
            .query_row("SELECT COUNT(*) FROM mfdach_positions", [], |row| row.get(0))
            .context("Failed to count positions")?;

        let mut stmt = self
            .conn
            .prepare(
                "SELECT source_file, COUNT(*) AS n FROM mfdach_positions \
                 GROUP BY source_file ORDER BY n DESC, source_file ASC",
            )
            .context("Failed to prepare statement")?;

        let positions_by_file = stmt
            .query_map([], |row| {
                Ok(FileCount {
                    source_file: row.get(0)?,
                    positions: row.get(1)?,
                })
            })
            .context("Failed to query per-file counts")?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to collect per-file counts")?;

        Ok(CatalogStats {
            category_count,
            position_count,
            positions_by_file,
        })
    }

    /// Number of provenance rows recorded
    pub fn import_file_count(&self) -> Result<u32> {
        self.conn
            .query_row("SELECT COUNT(*) FROM mfdach_import_files", [], |row| row.get(0))
            .context("Failed to count import files")
    }
}

impl CatalogSink for CatalogStore {
    fn clear(&mut self) -> Result<()> {
        CatalogStore::clear(self)
    }

    fn upsert_categories(&mut self, records: &[CategoryRecord]) -> Result<usize> {
        CatalogStore::upsert_categories(self, records)
    }

    fn insert_positions(&mut self, records: &[PositionRecord]) -> Result<usize> {
        CatalogStore::insert_positions(self, records)
    }

    fn record_file(&mut self, report: &FileReport) -> Result<()> {
        CatalogStore::record_file(self, report)
    }
}
