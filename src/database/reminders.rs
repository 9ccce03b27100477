// ABOUTME: Sleep reminder database operations
// ABOUTME: Handles reminder CRUD, due-minute matching, and last-sent bookkeeping

use super::Database;
use crate::models::{ReminderKind, SleepReminder};
use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

impl Database {
    /// Create the sleep_reminders table
    ///
    /// # Errors
    ///
    /// Returns an error if table or index creation fails.
    pub(super) async fn migrate_reminders(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS sleep_reminders (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                reminder_type TEXT NOT NULL CHECK (reminder_type IN ('bedtime', 'wake', 'log')),
                reminder_time TEXT NOT NULL,
                is_active BOOLEAN NOT NULL DEFAULT 1,
                message TEXT,
                last_sent DATETIME,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_sleep_reminders_type_active ON sleep_reminders(reminder_type, is_active)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Insert a new reminder
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn create_reminder(&self, reminder: &SleepReminder) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO sleep_reminders (
                id, user_id, reminder_type, reminder_time, is_active,
                message, last_sent, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ",
        )
        .bind(reminder.id.to_string())
        .bind(reminder.user_id.to_string())
        .bind(reminder.kind.as_str())
        .bind(reminder.reminder_time)
        .bind(reminder.is_active)
        .bind(&reminder.message)
        .bind(reminder.last_sent)
        .bind(reminder.created_at)
        .bind(reminder.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Update a reminder's user-editable fields, scoped to its owner
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn update_reminder(&self, reminder: &SleepReminder) -> Result<bool> {
        let result = sqlx::query(
            r"
            UPDATE sleep_reminders
            SET reminder_type = $3,
                reminder_time = $4,
                is_active = $5,
                message = $6,
                updated_at = $7
            WHERE id = $1 AND user_id = $2
            ",
        )
        .bind(reminder.id.to_string())
        .bind(reminder.user_id.to_string())
        .bind(reminder.kind.as_str())
        .bind(reminder.reminder_time)
        .bind(reminder.is_active)
        .bind(&reminder.message)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Active reminders of one kind whose time-of-day matches the tick's
    /// hour and minute
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn due_reminders(
        &self,
        kind: ReminderKind,
        hour: u32,
        minute: u32,
    ) -> Result<Vec<SleepReminder>> {
        let hhmm = format!("{hour:02}:{minute:02}");

        let rows = sqlx::query(
            r"
            SELECT id, user_id, reminder_type, reminder_time, is_active,
                   message, last_sent, created_at, updated_at
            FROM sleep_reminders
            WHERE reminder_type = $1
              AND is_active = 1
              AND strftime('%H:%M', reminder_time) = $2
            ",
        )
        .bind(kind.as_str())
        .bind(hhmm)
        .fetch_all(&self.pool)
        .await?;

        let mut reminders = Vec::with_capacity(rows.len());
        for row in rows {
            reminders.push(Self::row_to_reminder(&row)?);
        }
        Ok(reminders)
    }

    /// List a user's reminders, optionally only the active ones
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn reminders_for_user(
        &self,
        user_id: Uuid,
        only_active: bool,
    ) -> Result<Vec<SleepReminder>> {
        let rows = sqlx::query(
            r"
            SELECT id, user_id, reminder_type, reminder_time, is_active,
                   message, last_sent, created_at, updated_at
            FROM sleep_reminders
            WHERE user_id = $1 AND ($2 = 0 OR is_active = 1)
            ORDER BY reminder_time
            ",
        )
        .bind(user_id.to_string())
        .bind(only_active)
        .fetch_all(&self.pool)
        .await?;

        let mut reminders = Vec::with_capacity(rows.len());
        for row in rows {
            reminders.push(Self::row_to_reminder(&row)?);
        }
        Ok(reminders)
    }

    /// Get one reminder by id (test and task bookkeeping lookups)
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_reminder(&self, reminder_id: Uuid) -> Result<Option<SleepReminder>> {
        let row = sqlx::query(
            r"
            SELECT id, user_id, reminder_type, reminder_time, is_active,
                   message, last_sent, created_at, updated_at
            FROM sleep_reminders
            WHERE id = $1
            ",
        )
        .bind(reminder_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map_or_else(|| Ok(None), |row| Ok(Some(Self::row_to_reminder(&row)?)))
    }

    /// Record a confirmed successful dispatch. Only the scheduler calls
    /// this, and only after the dispatcher reported success.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn mark_reminder_sent(&self, reminder_id: Uuid, at: DateTime<Utc>) -> Result<()> {
        sqlx::query(
            "UPDATE sleep_reminders SET last_sent = $2, updated_at = $3 WHERE id = $1",
        )
        .bind(reminder_id.to_string())
        .bind(at)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Delete a reminder scoped to its owner
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub async fn delete_reminder(&self, user_id: Uuid, reminder_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM sleep_reminders WHERE id = $1 AND user_id = $2")
            .bind(reminder_id.to_string())
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    fn row_to_reminder(row: &sqlx::sqlite::SqliteRow) -> Result<SleepReminder> {
        let id_str: String = row.get("id");
        let user_id_str: String = row.get("user_id");
        let kind_str: String = row.get("reminder_type");

        Ok(SleepReminder {
            id: Uuid::parse_str(&id_str)?,
            user_id: Uuid::parse_str(&user_id_str)?,
            kind: kind_str
                .parse()
                .map_err(|e: String| anyhow::anyhow!(e))?,
            reminder_time: row.get("reminder_time"),
            is_active: row.get("is_active"),
            message: row.get("message"),
            last_sent: row.get("last_sent"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }
}
