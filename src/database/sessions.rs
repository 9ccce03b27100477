// ABOUTME: Sleep session database operations
// ABOUTME: Handles session CRUD, aggregation windows, and calendar sync bookkeeping

use super::Database;
use crate::models::{QualityRating, SleepSession};
use anyhow::Result;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use sqlx::Row;
use uuid::Uuid;

impl Database {
    /// Create the sleep_sessions table
    ///
    /// # Errors
    ///
    /// Returns an error if table or index creation fails.
    pub(super) async fn migrate_sessions(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS sleep_sessions (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                sleep_time DATETIME NOT NULL,
                wake_time DATETIME NOT NULL,
                quality_rating INTEGER CHECK (quality_rating BETWEEN 1 AND 5),
                notes TEXT NOT NULL DEFAULT '',
                duration_hours REAL,
                synced_to_calendar BOOLEAN NOT NULL DEFAULT 0,
                calendar_event_id TEXT,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_sleep_sessions_user_time ON sleep_sessions(user_id, sleep_time)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_sleep_sessions_time ON sleep_sessions(sleep_time)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Insert a new sleep session
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn create_session(&self, session: &SleepSession) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO sleep_sessions (
                id, user_id, sleep_time, wake_time, quality_rating, notes,
                duration_hours, synced_to_calendar, calendar_event_id,
                created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ",
        )
        .bind(session.id.to_string())
        .bind(session.user_id.to_string())
        .bind(session.sleep_time)
        .bind(session.wake_time)
        .bind(session.quality_rating.map(QualityRating::value))
        .bind(&session.notes)
        .bind(session.duration_hours)
        .bind(session.synced_to_calendar)
        .bind(&session.calendar_event_id)
        .bind(session.created_at)
        .bind(session.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Update an existing session's user-editable fields and derived duration
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn update_session(&self, session: &SleepSession) -> Result<bool> {
        let result = sqlx::query(
            r"
            UPDATE sleep_sessions
            SET sleep_time = $3,
                wake_time = $4,
                quality_rating = $5,
                notes = $6,
                duration_hours = $7,
                updated_at = $8
            WHERE id = $1 AND user_id = $2
            ",
        )
        .bind(session.id.to_string())
        .bind(session.user_id.to_string())
        .bind(session.sleep_time)
        .bind(session.wake_time)
        .bind(session.quality_rating.map(QualityRating::value))
        .bind(&session.notes)
        .bind(session.duration_hours)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Get a session by id, regardless of owner (task-layer lookup)
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_session(&self, session_id: Uuid) -> Result<Option<SleepSession>> {
        let row = sqlx::query(
            r"
            SELECT id, user_id, sleep_time, wake_time, quality_rating, notes,
                   duration_hours, synced_to_calendar, calendar_event_id,
                   created_at, updated_at
            FROM sleep_sessions
            WHERE id = $1
            ",
        )
        .bind(session_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map_or_else(|| Ok(None), |row| Ok(Some(Self::row_to_session(&row)?)))
    }

    /// Get a session by id scoped to its owner (request-layer lookup)
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_user_session(
        &self,
        user_id: Uuid,
        session_id: Uuid,
    ) -> Result<Option<SleepSession>> {
        let row = sqlx::query(
            r"
            SELECT id, user_id, sleep_time, wake_time, quality_rating, notes,
                   duration_hours, synced_to_calendar, calendar_event_id,
                   created_at, updated_at
            FROM sleep_sessions
            WHERE id = $1 AND user_id = $2
            ",
        )
        .bind(session_id.to_string())
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map_or_else(|| Ok(None), |row| Ok(Some(Self::row_to_session(&row)?)))
    }

    /// List a user's sessions, newest first, optionally bounded to a
    /// half-open `[start, end)` range on the sleep-start instant
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn sessions_for_user(
        &self,
        user_id: Uuid,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<SleepSession>> {
        let rows = sqlx::query(
            r"
            SELECT id, user_id, sleep_time, wake_time, quality_rating, notes,
                   duration_hours, synced_to_calendar, calendar_event_id,
                   created_at, updated_at
            FROM sleep_sessions
            WHERE user_id = $1
              AND ($2 IS NULL OR sleep_time >= $2)
              AND ($3 IS NULL OR sleep_time < $3)
            ORDER BY sleep_time DESC
            ",
        )
        .bind(user_id.to_string())
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        let mut sessions = Vec::with_capacity(rows.len());
        for row in rows {
            sessions.push(Self::row_to_session(&row)?);
        }
        Ok(sessions)
    }

    /// Sessions whose sleep-start falls in the half-open `[start, end)`
    /// aggregation window for one owner
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn sessions_in_window(
        &self,
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<SleepSession>> {
        self.sessions_for_user(user_id, Some(start), Some(end)).await
    }

    /// Distinct owners with at least one session in `[start, end)`
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn users_with_sessions_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Uuid>> {
        let rows = sqlx::query(
            r"
            SELECT DISTINCT user_id
            FROM sleep_sessions
            WHERE sleep_time >= $1 AND sleep_time < $2
            ",
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        let mut user_ids = Vec::with_capacity(rows.len());
        for row in rows {
            let id_str: String = row.get("user_id");
            user_ids.push(Uuid::parse_str(&id_str)?);
        }
        Ok(user_ids)
    }

    /// Whether the owner has any session whose sleep-start falls on `date`
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn has_session_on(&self, user_id: Uuid, date: NaiveDate) -> Result<bool> {
        let start = date.and_time(NaiveTime::MIN).and_utc();
        let end = start + Duration::days(1);

        let row = sqlx::query(
            r"
            SELECT 1 AS present
            FROM sleep_sessions
            WHERE user_id = $1 AND sleep_time >= $2 AND sleep_time < $3
            LIMIT 1
            ",
        )
        .bind(user_id.to_string())
        .bind(start)
        .bind(end)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.is_some())
    }

    /// Record the remote calendar mapping after a successful event create
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn mark_session_synced(&self, session_id: Uuid, event_id: &str) -> Result<()> {
        sqlx::query(
            r"
            UPDATE sleep_sessions
            SET synced_to_calendar = 1, calendar_event_id = $2, updated_at = $3
            WHERE id = $1
            ",
        )
        .bind(session_id.to_string())
        .bind(event_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Delete a session scoped to its owner
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub async fn delete_session(&self, user_id: Uuid, session_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM sleep_sessions WHERE id = $1 AND user_id = $2")
            .bind(session_id.to_string())
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    fn row_to_session(row: &sqlx::sqlite::SqliteRow) -> Result<SleepSession> {
        let id_str: String = row.get("id");
        let user_id_str: String = row.get("user_id");
        let quality: Option<i64> = row.get("quality_rating");

        Ok(SleepSession {
            id: Uuid::parse_str(&id_str)?,
            user_id: Uuid::parse_str(&user_id_str)?,
            sleep_time: row.get("sleep_time"),
            wake_time: row.get("wake_time"),
            quality_rating: quality.and_then(QualityRating::from_value),
            notes: row.get("notes"),
            duration_hours: row.get("duration_hours"),
            synced_to_calendar: row.get("synced_to_calendar"),
            calendar_event_id: row.get("calendar_event_id"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }
}
