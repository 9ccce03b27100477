// ABOUTME: Calendar credential database operations for per-user remote calendar access
// ABOUTME: Stores structured token records; refresh replaces the record, never mutates it

use super::Database;
use crate::models::CalendarCredential;
use anyhow::Result;
use chrono::Utc;
use sqlx::Row;
use uuid::Uuid;

impl Database {
    /// Create the calendar_credentials table
    ///
    /// # Errors
    ///
    /// Returns an error if table creation fails.
    pub(super) async fn migrate_calendar_credentials(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS calendar_credentials (
                user_id TEXT PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
                access_token TEXT NOT NULL,
                refresh_token TEXT NOT NULL,
                expires_at DATETIME,
                scope TEXT,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Insert or replace a user's calendar credential
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn upsert_calendar_credential(&self, credential: &CalendarCredential) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO calendar_credentials (
                user_id, access_token, refresh_token, expires_at, scope,
                created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (user_id)
            DO UPDATE SET
                access_token = EXCLUDED.access_token,
                refresh_token = EXCLUDED.refresh_token,
                expires_at = EXCLUDED.expires_at,
                scope = EXCLUDED.scope,
                updated_at = EXCLUDED.updated_at
            ",
        )
        .bind(credential.user_id.to_string())
        .bind(&credential.access_token)
        .bind(&credential.refresh_token)
        .bind(credential.expires_at)
        .bind(&credential.scope)
        .bind(Utc::now())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get a user's calendar credential
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_calendar_credential(
        &self,
        user_id: Uuid,
    ) -> Result<Option<CalendarCredential>> {
        let row = sqlx::query(
            r"
            SELECT user_id, access_token, refresh_token, expires_at, scope, updated_at
            FROM calendar_credentials
            WHERE user_id = $1
            ",
        )
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map_or_else(|| Ok(None), |row| Ok(Some(Self::row_to_credential(&row)?)))
    }

    /// Delete a user's calendar credential (disconnect)
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub async fn delete_calendar_credential(&self, user_id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM calendar_credentials WHERE user_id = $1")
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    fn row_to_credential(row: &sqlx::sqlite::SqliteRow) -> Result<CalendarCredential> {
        let user_id_str: String = row.get("user_id");

        Ok(CalendarCredential {
            user_id: Uuid::parse_str(&user_id_str)?,
            access_token: row.get("access_token"),
            refresh_token: row.get("refresh_token"),
            expires_at: row.get("expires_at"),
            scope: row.get("scope"),
            updated_at: row.get("updated_at"),
        })
    }
}
