// SPDX-FileCopyrightText: 2026 Unito Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared HTTP plumbing for talking to the portal backend.

use std::time::Duration;

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use unito_config::model::ClientConfig;
use unito_core::{UnitoError, server_message};

/// Build the HTTP client used for every backend call.
///
/// The configured request timeout bounds each request end to end.
pub fn build_http_client(config: &ClientConfig) -> Result<reqwest::Client, UnitoError> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    reqwest::Client::builder()
        .default_headers(headers)
        .timeout(config.request_timeout())
        .user_agent(concat!("unito/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| UnitoError::Config(format!("failed to build HTTP client: {e}")))
}

/// Map a transport failure onto the error taxonomy.
pub fn map_transport_error(err: reqwest::Error, timeout: Duration) -> UnitoError {
    if err.is_timeout() {
        return UnitoError::Timeout { duration: timeout };
    }
    UnitoError::Network {
        message: err.to_string(),
        source: Some(Box::new(err)),
    }
}

/// Turn a non-success response into [`UnitoError::Api`].
pub async fn api_error(response: reqwest::Response) -> UnitoError {
    let status = response.status().as_u16();
    let body = response.bytes().await.unwrap_or_default();
    UnitoError::Api {
        status,
        message: server_message(&body),
    }
}

/// Decode a success body. An empty body decodes as JSON `null`.
pub async fn decode_body<T: DeserializeOwned>(
    response: reqwest::Response,
    timeout: Duration,
) -> Result<T, UnitoError> {
    let body = response
        .bytes()
        .await
        .map_err(|e| map_transport_error(e, timeout))?;
    let bytes: &[u8] = if body.iter().all(u8::is_ascii_whitespace) {
        b"null"
    } else {
        &body
    };
    serde_json::from_slice(bytes).map_err(|e| UnitoError::Decode(e.to_string()))
}
