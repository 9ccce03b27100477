// ABOUTME: Sleep statistics database operations
// ABOUTME: Enforces the (owner, date, period) uniqueness key with upsert semantics

use super::Database;
use crate::models::{PeriodKind, SleepStatistics};
use anyhow::Result;
use chrono::{NaiveDate, Utc};
use sqlx::Row;
use uuid::Uuid;

/// Computed metrics for one statistics upsert
///
/// The row identity is `(user_id, date, period)`; an existing row keeps its
/// id and has its metrics overwritten.
#[derive(Debug, Clone)]
pub struct StatisticsUpsert {
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub period: PeriodKind,
    pub total_sleep_hours: f64,
    pub average_sleep_hours: f64,
    pub average_quality: Option<f64>,
    pub sessions_count: i64,
    pub goal_achievement_rate: Option<f64>,
}

impl Database {
    /// Create the sleep_statistics table
    ///
    /// The uniqueness key is a real constraint: concurrent upserts for the
    /// same `(owner, date, period)` serialize through it instead of
    /// producing duplicate rows.
    ///
    /// # Errors
    ///
    /// Returns an error if table or index creation fails.
    pub(super) async fn migrate_statistics(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS sleep_statistics (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                date TEXT NOT NULL,
                period_type TEXT NOT NULL CHECK (period_type IN ('daily', 'weekly', 'monthly')),
                total_sleep_hours REAL NOT NULL DEFAULT 0,
                average_sleep_hours REAL NOT NULL DEFAULT 0,
                average_quality REAL,
                sessions_count INTEGER NOT NULL DEFAULT 0,
                goal_achievement_rate REAL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                UNIQUE (user_id, date, period_type)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_sleep_statistics_user_date ON sleep_statistics(user_id, date)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Insert or overwrite the statistics row for `(owner, date, period)`
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn upsert_statistics(&self, stats: &StatisticsUpsert) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO sleep_statistics (
                id, user_id, date, period_type, total_sleep_hours,
                average_sleep_hours, average_quality, sessions_count,
                goal_achievement_rate, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (user_id, date, period_type)
            DO UPDATE SET
                total_sleep_hours = EXCLUDED.total_sleep_hours,
                average_sleep_hours = EXCLUDED.average_sleep_hours,
                average_quality = EXCLUDED.average_quality,
                sessions_count = EXCLUDED.sessions_count,
                goal_achievement_rate = EXCLUDED.goal_achievement_rate,
                updated_at = EXCLUDED.updated_at
            ",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(stats.user_id.to_string())
        .bind(stats.date)
        .bind(stats.period.as_str())
        .bind(stats.total_sleep_hours)
        .bind(stats.average_sleep_hours)
        .bind(stats.average_quality)
        .bind(stats.sessions_count)
        .bind(stats.goal_achievement_rate)
        .bind(Utc::now())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get the statistics row for one `(owner, date, period)` key
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_statistics(
        &self,
        user_id: Uuid,
        date: NaiveDate,
        period: PeriodKind,
    ) -> Result<Option<SleepStatistics>> {
        let row = sqlx::query(
            r"
            SELECT id, user_id, date, period_type, total_sleep_hours,
                   average_sleep_hours, average_quality, sessions_count,
                   goal_achievement_rate, created_at, updated_at
            FROM sleep_statistics
            WHERE user_id = $1 AND date = $2 AND period_type = $3
            ",
        )
        .bind(user_id.to_string())
        .bind(date)
        .bind(period.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map_or_else(|| Ok(None), |row| Ok(Some(Self::row_to_statistics(&row)?)))
    }

    /// All owners' statistics rows anchored at one date and period (used by
    /// the weekly report task)
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn statistics_for_date(
        &self,
        date: NaiveDate,
        period: PeriodKind,
    ) -> Result<Vec<SleepStatistics>> {
        let rows = sqlx::query(
            r"
            SELECT id, user_id, date, period_type, total_sleep_hours,
                   average_sleep_hours, average_quality, sessions_count,
                   goal_achievement_rate, created_at, updated_at
            FROM sleep_statistics
            WHERE date = $1 AND period_type = $2
            ",
        )
        .bind(date)
        .bind(period.as_str())
        .fetch_all(&self.pool)
        .await?;

        let mut stats = Vec::with_capacity(rows.len());
        for row in rows {
            stats.push(Self::row_to_statistics(&row)?);
        }
        Ok(stats)
    }

    /// List a user's statistics rows, newest anchor first, optionally
    /// filtered to one period kind
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn statistics_for_user(
        &self,
        user_id: Uuid,
        period: Option<PeriodKind>,
    ) -> Result<Vec<SleepStatistics>> {
        let rows = sqlx::query(
            r"
            SELECT id, user_id, date, period_type, total_sleep_hours,
                   average_sleep_hours, average_quality, sessions_count,
                   goal_achievement_rate, created_at, updated_at
            FROM sleep_statistics
            WHERE user_id = $1 AND ($2 IS NULL OR period_type = $2)
            ORDER BY date DESC
            ",
        )
        .bind(user_id.to_string())
        .bind(period.map(PeriodKind::as_str))
        .fetch_all(&self.pool)
        .await?;

        let mut stats = Vec::with_capacity(rows.len());
        for row in rows {
            stats.push(Self::row_to_statistics(&row)?);
        }
        Ok(stats)
    }

    /// Count statistics rows for one `(owner, date, period)` key (used by
    /// idempotency tests)
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn count_statistics_rows(
        &self,
        user_id: Uuid,
        date: NaiveDate,
        period: PeriodKind,
    ) -> Result<i64> {
        let row = sqlx::query(
            r"
            SELECT COUNT(*) AS n
            FROM sleep_statistics
            WHERE user_id = $1 AND date = $2 AND period_type = $3
            ",
        )
        .bind(user_id.to_string())
        .bind(date)
        .bind(period.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get("n"))
    }

    fn row_to_statistics(row: &sqlx::sqlite::SqliteRow) -> Result<SleepStatistics> {
        let id_str: String = row.get("id");
        let user_id_str: String = row.get("user_id");
        let period_str: String = row.get("period_type");

        Ok(SleepStatistics {
            id: Uuid::parse_str(&id_str)?,
            user_id: Uuid::parse_str(&user_id_str)?,
            date: row.get("date"),
            period: period_str
                .parse()
                .map_err(|e: String| anyhow::anyhow!(e))?,
            total_sleep_hours: row.get("total_sleep_hours"),
            average_sleep_hours: row.get("average_sleep_hours"),
            average_quality: row.get("average_quality"),
            sessions_count: row.get("sessions_count"),
            goal_achievement_rate: row.get("goal_achievement_rate"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }
}
