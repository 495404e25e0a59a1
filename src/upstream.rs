//! Shared HTTP client for every outbound call (gateway, identity provider, bucket admin).

use anyhow::{Context, Result};
use std::time::Duration;

pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Build the upstream client with bounded connect and request timeouts.
///
/// A request that times out surfaces as a transport error, the same as a
/// refused connection.
///
/// # Errors
/// Returns an error if the TLS backend cannot be initialized.
pub fn http_client(request_timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(crate::APP_USER_AGENT)
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(request_timeout)
        .build()
        .context("Failed to build upstream HTTP client")
}
