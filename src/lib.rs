// ABOUTME: Main library entry point for the Somnus sleep tracking backend
// ABOUTME: Exposes the store, task layer, calendar sync, and REST surface
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright ©2025 Async-IO.org

#![deny(unsafe_code)]

//! # Somnus Server
//!
//! A personal sleep-tracking backend. Users log sleep sessions, set goals,
//! receive reminders, and get periodic statistics and calendar sync.
//!
//! ## Architecture
//!
//! - **Models**: Core data structures (sessions, goals, reminders, statistics)
//! - **Database**: SQLite persistence with one module per entity
//! - **Tasks**: Periodic background jobs (reminders, statistics, reports)
//! - **Calendar**: Remote calendar client and the session sync adapter
//! - **Notifications**: Message building and outbound dispatch
//! - **Routes**: Thin REST CRUD surface over the store

/// Remote calendar contract, Google client, and the session sync adapter
pub mod calendar;

/// Environment-based server configuration
pub mod config;

/// SQLite-backed persistence, one module per entity
pub mod database;

/// Unified error handling with HTTP response formatting
pub mod errors;

/// Shared HTTP client construction for remote service calls
pub mod http_client;

/// Structured logging configuration
pub mod logging;

/// Core data models and the duration calculator
pub mod models;

/// Notification message building and outbound dispatch
pub mod notifications;

/// HTTP REST route handlers
pub mod routes;

/// Server resource wiring and the HTTP listener
pub mod server;

/// Background task layer: reminders, statistics, reports, sync, driver
pub mod tasks;
