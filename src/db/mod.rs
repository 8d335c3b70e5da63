use anyhow::Result;
use rusqlite::Connection;
use std::path::PathBuf;
use thiserror::Error;

mod catalog;
mod centers;
mod chat;
mod profile;
mod schema;
mod screening;

pub use centers::{maps_link, NearbyQuery};
pub use schema::SCHEMA_VERSION;
pub use screening::{ScreeningRule, RULES};

/// Precondition failures named by the storage layer. Raised before any write
/// happens, so a failed operation leaves no partial state behind.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("user {0} does not exist")]
    UserNotFound(i64),
    #[error("conversation {0} does not exist")]
    ConversationNotFound(i64),
}

pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at the default location, creating it and running
    /// migrations as needed.
    pub fn open() -> Result<Self> {
        let path = Self::default_path()?;
        Self::open_at(path)
    }

    pub fn open_at(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(&path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open in-memory database for testing
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Idempotent first-launch setup: baseline catalogs, the one-time
    /// duplicate cleanup, and the center dataset bootstrap. Safe to run on
    /// every startup.
    pub fn bootstrap(&self) -> Result<()> {
        self.seed_allergies()?;
        self.seed_conditions()?;
        self.dedupe_allergies()?;
        self.dedupe_conditions()?;
        self.seed_health_centers_once()?;
        Ok(())
    }

    fn default_path() -> Result<PathBuf> {
        let config_dir =
            dirs::config_dir().ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join("healthcmd").join("health.db"))
    }

    /// Apply pending migrations in order. Each migration runs inside its own
    /// transaction, so an interrupted upgrade resumes cleanly on next open.
    fn migrate(&self) -> Result<()> {
        const MIGRATIONS: &[&str] = &[schema::SCHEMA_V1, schema::MIGRATION_V2];

        let version = self.get_schema_version()?;

        for (i, sql) in MIGRATIONS.iter().enumerate() {
            let target = (i + 1) as i32;
            if target <= version {
                continue;
            }
            self.conn
                .execute_batch(&format!("BEGIN TRANSACTION; {} COMMIT;", sql))?;
            self.set_schema_version(target)?;
        }

        Ok(())
    }

    fn get_schema_version(&self) -> Result<i32> {
        let result: Result<i32, _> =
            self.conn
                .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                    row.get(0)
                });

        match result {
            Ok(v) => Ok(v),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(0),
            Err(rusqlite::Error::SqliteFailure(err, msg)) => {
                // "no such table" is error code 1 (SQLITE_ERROR)
                if err.code == rusqlite::ErrorCode::Unknown
                    && msg.as_ref().map_or(false, |m| m.contains("no such table"))
                {
                    Ok(0)
                } else {
                    Err(rusqlite::Error::SqliteFailure(err, msg).into())
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    fn set_schema_version(&self, version: i32) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO schema_version (id, version) VALUES (1, ?)",
            [version],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_memory() {
        let db = Database::open_memory().unwrap();
        assert_eq!(db.get_schema_version().unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn test_tables_exist() {
        let db = Database::open_memory().unwrap();

        let tables: Vec<String> = db
            .conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect();

        for table in [
            "users",
            "allergies",
            "conditions",
            "user_allergies",
            "user_conditions",
            "demographics",
            "conversations",
            "messages",
            "recommendations",
            "health_units",
            "clinic_locations",
        ] {
            assert!(tables.contains(&table.to_string()), "missing {table}");
        }
    }

    #[test]
    fn test_migration_added_height_column() {
        let db = Database::open_memory().unwrap();

        let columns: Vec<String> = db
            .conn
            .prepare("SELECT name FROM pragma_table_info('demographics')")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect();

        assert!(columns.contains(&"height_cm".to_string()));
    }

    #[test]
    fn test_reopen_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("health.db");

        {
            let db = Database::open_at(path.clone()).unwrap();
            db.bootstrap().unwrap();
        }

        // Second open must not fail, re-run migrations, or duplicate objects.
        let db = Database::open_at(path).unwrap();
        assert_eq!(db.get_schema_version().unwrap(), SCHEMA_VERSION);
        db.bootstrap().unwrap();

        let count: i64 = db
            .conn
            .query_row("SELECT COUNT(*) FROM allergies", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 5);
    }
}
