// ABOUTME: Server binary wiring configuration, store, collaborators, and the driver
// ABOUTME: Starts the REST surface and the periodic background scheduler
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Somnus Server Binary
//!
//! Starts the sleep-tracking backend: SQLite store, Google Calendar client,
//! mail relay transport, the REST surface, and the periodic task driver.

use anyhow::Result;
use clap::Parser;
use somnus_server::{
    calendar::google::GoogleCalendar,
    config::ServerConfig,
    database::Database,
    logging,
    notifications::mailer::HttpMailer,
    server::{self, ServerResources},
    tasks::scheduler,
};
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "somnus-server")]
#[command(about = "Somnus - personal sleep tracking backend")]
pub struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,

    /// Override database URL
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }
    if let Some(database_url) = args.database_url {
        config.database_url = database_url;
    }

    logging::init_from_env()?;

    info!("Starting Somnus sleep tracking backend");
    info!("{}", config.summary());

    let database = Arc::new(Database::new(&config.database_url).await?);
    info!("Database initialized: {}", config.database_url);

    let calendar = Arc::new(GoogleCalendar::new(config.google.clone()));
    let notifier = Arc::new(HttpMailer::new(config.mailer.clone()));

    let resources = Arc::new(ServerResources::new(
        database,
        calendar,
        notifier,
        config,
    ));

    let driver = scheduler::start(Arc::clone(&resources));
    info!("Background task driver started");

    server::serve(resources).await?;

    // The listener has shut down; the driver has no cancellation semantics
    // of its own, so the process exit tears it down.
    driver.abort();

    Ok(())
}
