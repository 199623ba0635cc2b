use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{ApplicationRecord, EditableApplicationFields, NewApplicationFields};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no application with id {0}")]
    NotFound(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// The persistence contract the form and list components depend on.
/// Every call is synchronous and runs to completion; callers own the
/// busy-flag bookkeeping around it.
pub trait RecordStore {
    fn create(&self, fields: &NewApplicationFields) -> StoreResult<ApplicationRecord>;

    /// All records, ordered by applied_date descending. The store is the only
    /// place ordering is applied; callers never re-sort.
    fn list_all(&self) -> StoreResult<Vec<ApplicationRecord>>;

    /// Rewrites every editable field of the record with the given id.
    /// id and applied_date are untouched.
    fn update(&self, id: &str, fields: &EditableApplicationFields) -> StoreResult<()>;

    /// Hard delete, irreversible.
    fn delete(&self, id: &str) -> StoreResult<()>;
}

pub struct SqliteStore {
    conn: Connection,
    path: PathBuf,
}

impl SqliteStore {
    /// Opens the store at the default data-directory location, creating the
    /// schema if needed.
    pub fn open_default() -> StoreResult<Self> {
        Self::open(&Self::default_path())
    }

    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let conn = Connection::open(path)?;
        let store = Self {
            conn,
            path: path.to_path_buf(),
        };
        store.init()?;
        Ok(store)
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    #[cfg(test)]
    pub(crate) fn open_in_memory() -> Self {
        let store = Self {
            conn: Connection::open_in_memory().expect("in-memory sqlite"),
            path: PathBuf::from(":memory:"),
        };
        store.init().expect("schema init");
        store
    }

    fn default_path() -> PathBuf {
        // Use XDG data directory or fallback
        if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "apptrack") {
            proj_dirs.data_dir().join("apptrack.db")
        } else {
            PathBuf::from("apptrack.db")
        }
    }

    fn init(&self) -> StoreResult<()> {
        // status is deliberately unconstrained free text
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS applications (
                id TEXT PRIMARY KEY,
                company TEXT NOT NULL,
                position TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT '',
                applied_date TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now')),
                url TEXT,
                location TEXT,
                salary_range TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_applications_status ON applications(status);
            "#,
        )?;
        Ok(())
    }

    pub fn get(&self, id: &str) -> StoreResult<Option<ApplicationRecord>> {
        let record = self
            .conn
            .query_row(
                "SELECT id, company, position, status, applied_date, url, location, salary_range
                 FROM applications WHERE id = ?1",
                [id],
                Self::row_to_record,
            )
            .optional()?;
        Ok(record)
    }

    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<ApplicationRecord> {
        Ok(ApplicationRecord {
            id: row.get(0)?,
            company: row.get(1)?,
            position: row.get(2)?,
            status: row.get(3)?,
            applied_date: row.get(4)?,
            url: row.get(5)?,
            location: row.get(6)?,
            salary_range: row.get(7)?,
        })
    }
}

impl RecordStore for SqliteStore {
    fn create(&self, fields: &NewApplicationFields) -> StoreResult<ApplicationRecord> {
        let id = Uuid::new_v4().to_string();
        self.conn.execute(
            "INSERT INTO applications (id, company, position, status, url, location)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                id,
                fields.company,
                fields.position,
                fields.status,
                fields.url,
                fields.location
            ],
        )?;

        // Read back the row so the caller sees the assigned applied_date
        self.get(&id)?.ok_or_else(|| StoreError::NotFound(id))
    }

    fn list_all(&self) -> StoreResult<Vec<ApplicationRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, company, position, status, applied_date, url, location, salary_range
             FROM applications ORDER BY applied_date DESC",
        )?;
        let rows = stmt.query_map([], Self::row_to_record)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn update(&self, id: &str, fields: &EditableApplicationFields) -> StoreResult<()> {
        let changed = self.conn.execute(
            "UPDATE applications
             SET company = ?1, position = ?2, status = ?3, url = ?4, location = ?5, salary_range = ?6
             WHERE id = ?7",
            params![
                fields.company,
                fields.position,
                fields.status,
                fields.url,
                fields.location,
                fields.salary_range,
                id
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    fn delete(&self, id: &str) -> StoreResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM applications WHERE id = ?1", [id])?;
        if changed == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }
}
