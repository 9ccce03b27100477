// ABOUTME: User and user profile database operations
// ABOUTME: Handles user records and per-user sleep preference profiles

use super::Database;
use crate::models::{User, UserProfile};
use anyhow::{anyhow, Result};
use chrono::Utc;
use sqlx::Row;
use uuid::Uuid;

impl Database {
    /// Create users and user_profiles tables
    ///
    /// # Errors
    ///
    /// Returns an error if table or index creation fails.
    pub(super) async fn migrate_users(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT UNIQUE NOT NULL,
                display_name TEXT,
                is_active BOOLEAN NOT NULL DEFAULT 1,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS user_profiles (
                user_id TEXT PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
                target_sleep_hours REAL NOT NULL DEFAULT 8.0,
                timezone TEXT NOT NULL DEFAULT 'UTC',
                notification_enabled BOOLEAN NOT NULL DEFAULT 1,
                notification_time TEXT,
                calendar_enabled BOOLEAN NOT NULL DEFAULT 0,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_users_email ON users(email)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Create a user
    ///
    /// # Errors
    ///
    /// Returns an error if the email is already in use or the insert fails.
    pub async fn create_user(&self, user: &User) -> Result<Uuid> {
        if let Some(existing) = self.get_user_by_email(&user.email).await? {
            if existing.id != user.id {
                return Err(anyhow!("Email already in use by another user"));
            }
        }

        sqlx::query(
            r"
            INSERT OR REPLACE INTO users (id, email, display_name, is_active, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(user.id.to_string())
        .bind(&user.email)
        .bind(&user.display_name)
        .bind(user.is_active)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;

        Ok(user.id)
    }

    /// Get a user by id
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_user(&self, user_id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query(
            "SELECT id, email, display_name, is_active, created_at FROM users WHERE id = $1",
        )
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map_or_else(|| Ok(None), |row| Ok(Some(Self::row_to_user(&row)?)))
    }

    /// Get a user by email
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query(
            "SELECT id, email, display_name, is_active, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map_or_else(|| Ok(None), |row| Ok(Some(Self::row_to_user(&row)?)))
    }

    /// Get a user's profile, creating the default profile on first access
    ///
    /// # Errors
    ///
    /// Returns an error if the query or the default insert fails.
    pub async fn get_or_create_profile(&self, user_id: Uuid) -> Result<UserProfile> {
        if let Some(profile) = self.get_profile(user_id).await? {
            return Ok(profile);
        }

        let profile = UserProfile::default_for(user_id);
        self.upsert_profile(&profile).await?;
        Ok(profile)
    }

    /// Get a user's profile
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_profile(&self, user_id: Uuid) -> Result<Option<UserProfile>> {
        let row = sqlx::query(
            r"
            SELECT user_id, target_sleep_hours, timezone, notification_enabled,
                   notification_time, calendar_enabled, created_at, updated_at
            FROM user_profiles
            WHERE user_id = $1
            ",
        )
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map_or_else(|| Ok(None), |row| Ok(Some(Self::row_to_profile(&row)?)))
    }

    /// Insert or update a user's profile
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn upsert_profile(&self, profile: &UserProfile) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO user_profiles (
                user_id, target_sleep_hours, timezone, notification_enabled,
                notification_time, calendar_enabled, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (user_id)
            DO UPDATE SET
                target_sleep_hours = EXCLUDED.target_sleep_hours,
                timezone = EXCLUDED.timezone,
                notification_enabled = EXCLUDED.notification_enabled,
                notification_time = EXCLUDED.notification_time,
                calendar_enabled = EXCLUDED.calendar_enabled,
                updated_at = EXCLUDED.updated_at
            ",
        )
        .bind(profile.user_id.to_string())
        .bind(profile.target_sleep_hours)
        .bind(&profile.timezone)
        .bind(profile.notification_enabled)
        .bind(profile.notification_time)
        .bind(profile.calendar_enabled)
        .bind(profile.created_at)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Flip the calendar-enabled flag on a user's profile
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn set_calendar_enabled(&self, user_id: Uuid, enabled: bool) -> Result<()> {
        sqlx::query(
            "UPDATE user_profiles SET calendar_enabled = $2, updated_at = $3 WHERE user_id = $1",
        )
        .bind(user_id.to_string())
        .bind(enabled)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> Result<User> {
        let id_str: String = row.get("id");

        Ok(User {
            id: Uuid::parse_str(&id_str)?,
            email: row.get("email"),
            display_name: row.get("display_name"),
            is_active: row.get("is_active"),
            created_at: row.get("created_at"),
        })
    }

    fn row_to_profile(row: &sqlx::sqlite::SqliteRow) -> Result<UserProfile> {
        let user_id_str: String = row.get("user_id");

        Ok(UserProfile {
            user_id: Uuid::parse_str(&user_id_str)?,
            target_sleep_hours: row.get("target_sleep_hours"),
            timezone: row.get("timezone"),
            notification_enabled: row.get("notification_enabled"),
            notification_time: row.get("notification_time"),
            calendar_enabled: row.get("calendar_enabled"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }
}
