// ABOUTME: Shared HTTP client construction with timeout configuration
// ABOUTME: Keeps remote calendar and mail relay calls on bounded, pooled clients

use reqwest::{Client, ClientBuilder};
use std::time::Duration;

/// Build an HTTP client for remote service calls with bounded timeouts.
///
/// Every outbound call in the background task layer goes through a client
/// built here so no task can hang on network I/O past the request timeout.
/// Falls back to the library default client if construction fails.
#[must_use]
pub fn api_client(timeout_secs: u64, connect_timeout_secs: u64) -> Client {
    ClientBuilder::new()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(connect_timeout_secs))
        .build()
        .unwrap_or_else(|_| Client::new())
}
