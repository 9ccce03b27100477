// ABOUTME: Environment configuration management for deployment-specific settings
// ABOUTME: Composes database, calendar, mailer, and scheduler settings from env vars
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Environment-based configuration management

use crate::calendar::google::GoogleCalendarConfig;
use crate::notifications::mailer::MailerConfig;
use crate::tasks::scheduler::ScheduleConfig;
use anyhow::{Context, Result};
use std::env;
use std::fmt::Display;
use std::str::FromStr;
use tracing::warn;

/// Read an environment variable, falling back to the default when unset or
/// unparsable. A malformed value is logged rather than fatal so one bad
/// variable cannot keep the background jobs from starting.
pub fn env_var_or<T>(key: &str, default: T) -> T
where
    T: FromStr + Display,
{
    match env::var(key) {
        Ok(raw) => match raw.parse() {
            Ok(value) => value,
            Err(_) => {
                warn!("Ignoring unparsable {key}={raw}; using default {default}");
                default
            }
        },
        Err(_) => default,
    }
}

/// Top-level server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port for the HTTP REST surface
    pub http_port: u16,
    /// SQLite database URL
    pub database_url: String,
    /// Remote calendar client settings
    pub google: GoogleCalendarConfig,
    /// Mail relay settings
    pub mailer: MailerConfig,
    /// Periodic driver schedule
    pub schedule: ScheduleConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Reserved for required settings; every current setting has a default,
    /// so this only fails if a future required variable is missing.
    pub fn from_env() -> Result<Self> {
        let google = GoogleCalendarConfig::from_env();
        let mailer = MailerConfig::from_env();

        // Remote endpoints must at least parse; catching a typo here beats
        // a background task discovering it at dispatch time.
        url::Url::parse(&google.token_url)
            .with_context(|| format!("invalid GOOGLE_TOKEN_URL: {}", google.token_url))?;
        url::Url::parse(&google.api_base)
            .with_context(|| format!("invalid GOOGLE_CALENDAR_API_BASE: {}", google.api_base))?;
        url::Url::parse(&mailer.endpoint)
            .with_context(|| format!("invalid MAIL_RELAY_URL: {}", mailer.endpoint))?;

        Ok(Self {
            http_port: env_var_or("HTTP_PORT", 8081),
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:./data/somnus.db".into()),
            google,
            mailer,
            schedule: ScheduleConfig::from_env(),
        })
    }

    /// One-line startup summary for the log
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "http_port={} database={} calendar_configured={} mail_relay={}",
            self.http_port,
            self.database_url,
            !self.google.client_id.is_empty(),
            self.mailer.endpoint,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_var_or_falls_back_to_default() {
        // Key chosen to not exist in any environment running the tests
        assert_eq!(env_var_or("SOMNUS_TEST_UNSET_VARIABLE", 42_u32), 42);
    }

    #[test]
    fn summary_redacts_nothing_it_should_not() {
        let config = ServerConfig {
            http_port: 8081,
            database_url: "sqlite::memory:".into(),
            google: GoogleCalendarConfig {
                client_secret: "super-secret".into(),
                ..GoogleCalendarConfig::default()
            },
            mailer: MailerConfig::default(),
            schedule: ScheduleConfig::default(),
        };
        let summary = config.summary();
        assert!(summary.contains("http_port=8081"));
        assert!(!summary.contains("super-secret"));
    }
}
