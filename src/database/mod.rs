// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Database Management
//!
//! SQLite persistence for the sleep tracker. One module per entity extends
//! the `Database` handle; the store is the sole point of coordination
//! between concurrent task runs.

mod calendar_credentials;
mod goals;
mod reminders;
mod sessions;
mod statistics;
mod users;

pub use statistics::StatisticsUpsert;

use anyhow::Result;
use sqlx::{Pool, Sqlite, SqlitePool};

/// Database manager for all persisted sleep-tracking records
#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Create a new database connection and run migrations
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or a
    /// migration fails.
    pub async fn new(database_url: &str) -> Result<Self> {
        // Ensure SQLite creates the database file if it doesn't exist
        let connection_options = if database_url.starts_with("sqlite:") && !database_url.contains('?')
        {
            format!("{database_url}?mode=rwc")
        } else {
            database_url.to_string()
        };

        let pool = SqlitePool::connect(&connection_options).await?;

        let db = Self { pool };
        db.migrate().await?;

        Ok(db)
    }

    /// Get a reference to the database pool for advanced operations
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Run database migrations
    ///
    /// # Errors
    ///
    /// Returns an error if any table or index creation fails.
    pub async fn migrate(&self) -> Result<()> {
        self.migrate_users().await?;
        self.migrate_sessions().await?;
        self.migrate_goals().await?;
        self.migrate_reminders().await?;
        self.migrate_statistics().await?;
        self.migrate_calendar_credentials().await?;

        Ok(())
    }
}
