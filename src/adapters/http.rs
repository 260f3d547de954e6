use crate::error::AdapterError;
use anyhow::{Context, Result};
use reqwest::{Client, Response};
use std::time::Duration;

const USER_AGENT: &str = concat!("estate-hub/", env!("CARGO_PKG_VERSION"));

/// Shared HTTP client for the adapters
pub fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .context("Failed to create HTTP client")
}

/// Turn a non-success status into an [`AdapterError`]
pub fn ensure_success(service: &'static str, response: Response) -> Result<Response, AdapterError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(AdapterError::Status {
            service,
            status: status.as_u16(),
        })
    }
}
