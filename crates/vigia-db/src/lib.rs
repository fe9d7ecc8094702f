//! Vigia Database Layer
//!
//! Provides `SQLite` persistence for encrypted site sessions through `SQLx`,
//! with embedded migrations.
//!
//! # Architecture
//!
//! - **Ciphertext only**: session payloads are sealed by `vigia-vault` before they reach this crate
//! - **Migrations**: SQL migrations are embedded and versioned using `SQLx`
//! - **Repository seam**: [`SessionRepository`] is the only interface the session store consumes
//!
//! # Example
//!
//! ```ignore
//! use vigia_db::Database;
//!
//! let db = Database::new("vigia.db", 5).await?;
//! db.run_migrations().await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod connection;
pub mod error;
pub mod migrations;
pub mod sessions;

// Re-export commonly used types
pub use connection::SqlitePool;
pub use error::{DatabaseError, Result};
pub use sessions::{NewSession, SessionKey, SessionMetadata, SessionRecord, SessionRepository};

use std::path::Path;

/// High-level database interface with migrations.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open the database at `path` (or `:memory:`).
    ///
    /// # Errors
    /// Returns `DatabaseError` if the database cannot be opened.
    pub async fn new(path: impl AsRef<Path>, max_connections: u32) -> Result<Self> {
        let pool = SqlitePool::new(path, max_connections).await?;
        Ok(Self { pool })
    }

    /// Open the database and apply pending migrations.
    ///
    /// # Errors
    /// Returns `DatabaseError` if opening or migrating fails.
    pub async fn open_and_migrate(path: impl AsRef<Path>, max_connections: u32) -> Result<Self> {
        let db = Self::new(path, max_connections).await?;
        db.run_migrations().await?;
        Ok(db)
    }

    /// Run all pending database migrations.
    ///
    /// # Errors
    /// Returns `DatabaseError::Migration` if any migration fails.
    pub async fn run_migrations(&self) -> Result<()> {
        migrations::run_migrations(self.pool.pool()).await
    }

    /// Get the current schema version.
    ///
    /// # Errors
    /// Returns `DatabaseError` if the version cannot be queried.
    pub async fn get_schema_version(&self) -> Result<i64> {
        migrations::get_schema_version(self.pool.pool()).await
    }

    /// Get a reference to the underlying connection pool.
    #[must_use]
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Sqlite> {
        self.pool.pool()
    }

    /// Close the database connection gracefully.
    pub async fn close(self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_database_migrations() {
        let db = Database::new(":memory:", 1)
            .await
            .expect("create database");

        let version_before = db.get_schema_version().await.expect("get version");
        assert_eq!(version_before, 0);

        db.run_migrations().await.expect("run migrations");

        let version_after = db.get_schema_version().await.expect("get version");
        assert_eq!(version_after, 1);
    }

    #[tokio::test]
    async fn test_database_schema() {
        let db = Database::open_and_migrate(":memory:", 1)
            .await
            .expect("create database");

        let columns: Vec<String> =
            sqlx::query_scalar("SELECT name FROM pragma_table_info('site_sessions') ORDER BY cid")
                .fetch_all(db.pool())
                .await
                .expect("query columns");

        assert_eq!(
            columns,
            vec![
                "id",
                "user_id",
                "site",
                "domain",
                "status",
                "encrypted_blob",
                "key_version",
                "account_label",
                "metadata",
                "expires_at",
                "last_used_at",
                "last_error_at",
                "created_at",
                "updated_at"
            ]
        );
    }

    #[tokio::test]
    async fn test_natural_key_is_unique() {
        let db = Database::open_and_migrate(":memory:", 1)
            .await
            .expect("create database");

        let insert = "INSERT INTO site_sessions (id, user_id, site, domain, encrypted_blob, expires_at, created_at, updated_at) \
                      VALUES (?, 'u1', 'OLX', 'olx.com.br', 'aa:bb:cc', '2030-01-01T00:00:00Z', '2026-01-01T00:00:00Z', '2026-01-01T00:00:00Z')";

        sqlx::query(insert)
            .bind("id-1")
            .execute(db.pool())
            .await
            .expect("first insert");
        let duplicate = sqlx::query(insert).bind("id-2").execute(db.pool()).await;
        assert!(duplicate.is_err());
    }

    #[tokio::test]
    async fn test_database_close() {
        let db = Database::new(":memory:", 1)
            .await
            .expect("create database");

        db.close().await;
    }
}
