// SPDX-FileCopyrightText: 2026 Unito Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `unito request`: an arbitrary call through the request gateway.

use serde_json::Value;
use unito_billing::PortalContext;
use unito_core::{Method, UnitoError, is_read_only};

fn parse_method(raw: &str) -> Result<Method, UnitoError> {
    let upper = raw.to_ascii_uppercase();
    match Method::from_bytes(upper.as_bytes()) {
        Ok(method) if method.as_str().chars().all(|c| c.is_ascii_uppercase()) => Ok(method),
        _ => Err(UnitoError::Config(format!("invalid HTTP method `{raw}`"))),
    }
}

fn parse_body(data: Option<&str>) -> Result<Option<Value>, UnitoError> {
    data.map(|raw| {
        serde_json::from_str(raw)
            .map_err(|e| UnitoError::Config(format!("--data is not valid JSON: {e}")))
    })
    .transpose()
}

pub async fn run_request(
    portal: &PortalContext,
    method: &str,
    endpoint: &str,
    data: Option<&str>,
) -> Result<(), UnitoError> {
    let method = parse_method(method)?;
    let body = parse_body(data)?;
    let endpoint = if endpoint.starts_with('/') {
        endpoint.to_string()
    } else {
        format!("/{endpoint}")
    };

    // The lock is only known once billing state has been fetched.
    if !is_read_only(&method) {
        portal.refresh_all().await;
    }

    let response: Value = portal
        .gateway()
        .request(method, &endpoint, body.as_ref())
        .await?;
    if !response.is_null() {
        println!(
            "{}",
            serde_json::to_string_pretty(&response).unwrap_or_else(|_| response.to_string())
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn methods_are_case_insensitive() {
        assert_eq!(parse_method("get").unwrap(), Method::GET);
        assert_eq!(parse_method("Patch").unwrap(), Method::PATCH);
        assert!(parse_method("g e t").is_err());
        assert!(parse_method("").is_err());
    }

    #[test]
    fn body_must_be_json() {
        assert_eq!(parse_body(None).unwrap(), None);
        assert_eq!(
            parse_body(Some(r#"{"a":1}"#)).unwrap(),
            Some(serde_json::json!({"a": 1}))
        );
        assert!(parse_body(Some("{nope")).is_err());
    }
}
