//! Shared HTTP plumbing for the REST adapters.
//!
//! Every client is built with a per-call timeout; a timed-out call is
//! reported as a transport failure of the system it targeted.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use crate::domain::errors::{DomainError, DomainResult, ExternalSystem};

/// Build a client whose requests fail after `timeout_secs`.
pub fn build_client(system: ExternalSystem, timeout_secs: u64) -> DomainResult<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| DomainError::transport(system, format!("failed to build HTTP client: {e}")))
}

/// Join a base URL and a path without doubling slashes.
pub fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Send `request` and return the response if its status is a success.
pub async fn send(system: ExternalSystem, request: RequestBuilder) -> DomainResult<Response> {
    let response = request.send().await.map_err(|e| {
        let message = if e.is_timeout() {
            format!("request timed out: {e}")
        } else {
            e.to_string()
        };
        DomainError::transport(system, message)
    })?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "unable to read response body".to_string());
        return Err(DomainError::UnexpectedStatus {
            system,
            status: status.as_u16(),
            body,
        });
    }
    Ok(response)
}

/// Send `request` and decode a JSON body.
pub async fn send_json<T: DeserializeOwned>(system: ExternalSystem, request: RequestBuilder) -> DomainResult<T> {
    let response = send(system, request).await?;
    response.json::<T>().await.map_err(|e| {
        DomainError::SerializationError(format!("failed to parse {system} response: {e}"))
    })
}
