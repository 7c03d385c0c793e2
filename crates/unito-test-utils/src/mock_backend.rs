// SPDX-FileCopyrightText: 2026 Unito Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A wiremock-backed stand-in for the portal backend.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mock portal backend with helpers for the endpoints the client talks to.
pub struct MockBackend {
    server: MockServer,
}

impl MockBackend {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Base URL to put in `client.base_url`.
    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// The underlying server, for endpoint-specific mocks.
    pub fn server(&self) -> &MockServer {
        &self.server
    }

    /// Accept any login and hand out the given pair.
    pub async fn mount_login(&self, access: &str, refresh: &str) {
        Mock::given(method("POST"))
            .and(path("/auth/login/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access": access,
                "refresh": refresh,
                "user": {
                    "id": 1,
                    "email": "host@example.com",
                    "full_name": "Test Host",
                    "is_host": true
                },
                "host_profile": null
            })))
            .mount(&self.server)
            .await;
    }

    /// Renewals succeed with `access`, after `delay`.
    pub async fn mount_refresh(&self, access: &str, delay: Duration) {
        Mock::given(method("POST"))
            .and(path("/auth/token/refresh/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "access": access }))
                    .set_delay(delay),
            )
            .mount(&self.server)
            .await;
    }

    /// Renewals are refused.
    pub async fn mount_refresh_rejected(&self) {
        Mock::given(method("POST"))
            .and(path("/auth/token/refresh/"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(json!({ "detail": "Token is invalid or expired" })),
            )
            .mount(&self.server)
            .await;
    }

    pub async fn mount_subscription(&self, body: Value) {
        Mock::given(method("GET"))
            .and(path("/auth/subscription-status/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    pub async fn mount_contract(&self, body: Value) {
        Mock::given(method("GET"))
            .and(path("/auth/contract/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    pub async fn mount_template(&self) {
        Mock::given(method("GET"))
            .and(path("/auth/contract-template/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 1,
                "version": "1.0",
                "title": "UnitoPMS Service Agreement",
                "body": "The host agrees to the terms of service.",
                "created_at": "2025-01-01T00:00:00Z"
            })))
            .mount(&self.server)
            .await;
    }

    /// `POST path` answers `status` with `body`.
    pub async fn mount_post(&self, endpoint: &str, status: u16, body: Value) {
        Mock::given(method("POST"))
            .and(path(endpoint))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// `GET path` answers 401 to `stale` and 200 with `body` to anything else.
    pub async fn mount_protected(&self, endpoint: &str, stale: &str, body: Value) {
        Mock::given(method("GET"))
            .and(path(endpoint))
            .and(header("Authorization", format!("Bearer {stale}").as_str()))
            .respond_with(ResponseTemplate::new(401))
            .with_priority(1)
            .mount(&self.server)
            .await;
        Mock::given(method("GET"))
            .and(path(endpoint))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// Number of requests received for `endpoint`.
    pub async fn hits(&self, endpoint: &str) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r| r.url.path() == endpoint)
            .count()
    }

    /// Total number of requests received.
    pub async fn total_hits(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map(|r| r.len())
            .unwrap_or(0)
    }
}

/// Subscription status body as the backend sends it.
pub fn subscription_body(status: &str, trial_ends_at: Option<DateTime<Utc>>) -> Value {
    let plan = if status == "trialing" {
        "free_trial"
    } else {
        "starter"
    };
    json!({
        "subscription_plan": plan,
        "subscription_status": status,
        "trial_ends_at": trial_ends_at,
        "max_ota_connections": 2
    })
}

/// Contract body for a contract in `status`, with dates filled in as the
/// backend would for that status.
pub fn contract_body(status: &str) -> Value {
    let mut body = json!({
        "id": 1,
        "version": "1.0",
        "status": status,
        "signed_at": "2025-06-01T09:00:00Z",
        "service_start_date": "2025-06-01",
        "cancellation_requested_at": null,
        "cancellation_notice_months": 2,
        "service_end_date": null,
        "read_only_access_until": null,
        "created_at": "2025-06-01T09:00:00Z",
        "updated_at": "2025-06-01T09:00:00Z"
    });
    if matches!(status, "cancellation_requested" | "cancelled") {
        body["cancellation_requested_at"] = json!("2026-01-01T10:00:00Z");
        body["service_end_date"] = json!("2026-03-01");
    }
    if status == "cancelled" {
        body["read_only_access_until"] = json!("2027-03-01");
    }
    body
}
