// ABOUTME: Sleep goal database operations
// ABOUTME: Handles goal CRUD; multiple active goals per user may coexist

use super::Database;
use crate::models::SleepGoal;
use anyhow::Result;
use chrono::{Utc, Weekday};
use sqlx::Row;
use uuid::Uuid;

impl Database {
    /// Create the sleep_goals table
    ///
    /// # Errors
    ///
    /// Returns an error if table creation fails.
    pub(super) async fn migrate_goals(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS sleep_goals (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                target_bedtime TEXT NOT NULL,
                target_wake_time TEXT NOT NULL,
                target_duration_hours REAL NOT NULL DEFAULT 8.0,
                days_of_week TEXT NOT NULL DEFAULT '[]',
                is_active BOOLEAN NOT NULL DEFAULT 1,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_sleep_goals_user ON sleep_goals(user_id)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Insert a new goal
    ///
    /// # Errors
    ///
    /// Returns an error if the insert or weekday-set serialization fails.
    pub async fn create_goal(&self, goal: &SleepGoal) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO sleep_goals (
                id, user_id, target_bedtime, target_wake_time,
                target_duration_hours, days_of_week, is_active,
                created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ",
        )
        .bind(goal.id.to_string())
        .bind(goal.user_id.to_string())
        .bind(goal.target_bedtime)
        .bind(goal.target_wake_time)
        .bind(goal.target_duration_hours)
        .bind(serde_json::to_string(&goal.days_of_week)?)
        .bind(goal.is_active)
        .bind(goal.created_at)
        .bind(goal.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Update a goal scoped to its owner
    ///
    /// # Errors
    ///
    /// Returns an error if the update or weekday-set serialization fails.
    pub async fn update_goal(&self, goal: &SleepGoal) -> Result<bool> {
        let result = sqlx::query(
            r"
            UPDATE sleep_goals
            SET target_bedtime = $3,
                target_wake_time = $4,
                target_duration_hours = $5,
                days_of_week = $6,
                is_active = $7,
                updated_at = $8
            WHERE id = $1 AND user_id = $2
            ",
        )
        .bind(goal.id.to_string())
        .bind(goal.user_id.to_string())
        .bind(goal.target_bedtime)
        .bind(goal.target_wake_time)
        .bind(goal.target_duration_hours)
        .bind(serde_json::to_string(&goal.days_of_week)?)
        .bind(goal.is_active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// List a user's goals, optionally only the active ones
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn goals_for_user(&self, user_id: Uuid, only_active: bool) -> Result<Vec<SleepGoal>> {
        let rows = sqlx::query(
            r"
            SELECT id, user_id, target_bedtime, target_wake_time,
                   target_duration_hours, days_of_week, is_active,
                   created_at, updated_at
            FROM sleep_goals
            WHERE user_id = $1 AND ($2 = 0 OR is_active = 1)
            ORDER BY created_at DESC
            ",
        )
        .bind(user_id.to_string())
        .bind(only_active)
        .fetch_all(&self.pool)
        .await?;

        let mut goals = Vec::with_capacity(rows.len());
        for row in rows {
            goals.push(Self::row_to_goal(&row)?);
        }
        Ok(goals)
    }

    /// Delete a goal scoped to its owner
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub async fn delete_goal(&self, user_id: Uuid, goal_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM sleep_goals WHERE id = $1 AND user_id = $2")
            .bind(goal_id.to_string())
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    fn row_to_goal(row: &sqlx::sqlite::SqliteRow) -> Result<SleepGoal> {
        let id_str: String = row.get("id");
        let user_id_str: String = row.get("user_id");
        let days_json: String = row.get("days_of_week");
        let days_of_week: Vec<Weekday> = serde_json::from_str(&days_json)?;

        Ok(SleepGoal {
            id: Uuid::parse_str(&id_str)?,
            user_id: Uuid::parse_str(&user_id_str)?,
            target_bedtime: row.get("target_bedtime"),
            target_wake_time: row.get("target_wake_time"),
            target_duration_hours: row.get("target_duration_hours"),
            days_of_week,
            is_active: row.get("is_active"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }
}
