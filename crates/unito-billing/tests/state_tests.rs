// SPDX-FileCopyrightText: 2026 Unito Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Subscription and contract state against a mock backend.

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use secrecy::SecretString;
use serde_json::json;
use unito_billing::{ContractStatus, PortalContext};
use unito_config::UnitoConfig;
use unito_core::{CredentialStore, FixedClock, UnitoError};
use unito_session::MemoryCredentialStore;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 10, 0, 0).unwrap()
}

async fn portal(server: &MockServer) -> PortalContext {
    let mut config = UnitoConfig::default();
    config.client.base_url = server.uri();
    config.client.request_timeout_secs = 5;

    let store = Arc::new(MemoryCredentialStore::new());
    store
        .set(
            SecretString::from("a1".to_string()),
            Some(SecretString::from("r1".to_string())),
        )
        .await;
    PortalContext::with_parts(config, store, Arc::new(FixedClock::new(now()))).unwrap()
}

fn active_contract() -> serde_json::Value {
    json!({
        "id": 4,
        "version": "1.0",
        "status": "active",
        "signed_at": "2025-06-01T09:00:00Z",
        "service_start_date": "2025-06-01",
        "cancellation_notice_months": 2
    })
}

async fn mount_get(server: &MockServer, endpoint: &str, status: u16, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(endpoint))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn subscription_fetch_failure_keeps_cached_state() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/subscription-status/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "subscription_plan": "free_trial",
            "subscription_status": "trialing",
            "trial_ends_at": now() + Duration::days(3),
            "max_ota_connections": 2
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_get(&server, "/auth/subscription-status/", 500, json!({"detail": "down"})).await;

    let portal = portal(&server).await;
    portal.subscription().fetch(portal.gateway()).await.unwrap();
    let err = portal.subscription().fetch(portal.gateway()).await.unwrap_err();
    assert_eq!(err.to_string(), "down");

    let summary = portal.subscription().summary(3).unwrap();
    assert_eq!(summary.trial_days_remaining, 3);
    assert!(summary.is_trial_ending_soon);
    assert!(!portal.is_locked());
}

#[tokio::test]
async fn no_contract_then_sign() {
    let server = MockServer::start().await;
    mount_get(&server, "/auth/contract/", 200, json!({"status": "no_contract"})).await;
    Mock::given(method("POST"))
        .and(path("/auth/contract/sign/"))
        .and(body_json(json!({"agreement": true})))
        .respond_with(ResponseTemplate::new(200).set_body_json(active_contract()))
        .expect(1)
        .mount(&server)
        .await;
    mount_get(
        &server,
        "/auth/subscription-status/",
        200,
        json!({"subscription_plan": "starter", "subscription_status": "active"}),
    )
    .await;

    let portal = portal(&server).await;
    portal.contract().fetch(portal.gateway()).await.unwrap();
    assert!(portal.contract().status().needs_signing());

    portal.sign_contract().await.unwrap();
    assert_eq!(portal.contract().status(), ContractStatus::Active);
    // Signing re-fetches the subscription.
    assert!(portal.subscription().is_loaded());
}

#[tokio::test]
async fn failed_sign_leaves_state_unchanged() {
    let server = MockServer::start().await;
    mount_get(&server, "/auth/contract/", 200, json!({"status": "pending"})).await;
    Mock::given(method("POST"))
        .and(path("/auth/contract/sign/"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"message": "Contract already signed."})),
        )
        .mount(&server)
        .await;

    let portal = portal(&server).await;
    portal.contract().fetch(portal.gateway()).await.unwrap();

    let err = portal.sign_contract().await.unwrap_err();
    assert_eq!(err.status(), Some(400));
    assert_eq!(err.to_string(), "Contract already signed.");
    assert_eq!(portal.contract().status(), ContractStatus::Pending);
}

#[tokio::test]
async fn cancellation_request_records_backend_dates() {
    let server = MockServer::start().await;
    mount_get(&server, "/auth/contract/", 200, active_contract()).await;
    Mock::given(method("POST"))
        .and(path("/auth/contract/cancel/"))
        .and(body_json(json!({"cancellation_reason": "selling the property"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 4,
            "version": "1.0",
            "status": "cancellation_requested",
            "signed_at": "2025-06-01T09:00:00Z",
            "service_start_date": "2025-06-01",
            "cancellation_requested_at": "2026-01-01T10:00:00Z",
            "cancellation_notice_months": 2,
            "service_end_date": "2026-03-01",
            "read_only_access_until": "2027-03-01"
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_get(
        &server,
        "/auth/subscription-status/",
        200,
        json!({"subscription_plan": "starter", "subscription_status": "active"}),
    )
    .await;

    let portal = portal(&server).await;
    portal.contract().fetch(portal.gateway()).await.unwrap();

    let preview = portal.preview_cancellation().unwrap();
    assert_eq!(preview.service_end_date, NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
    assert_eq!(
        preview.read_only_access_until,
        NaiveDate::from_ymd_opt(2027, 3, 1).unwrap()
    );

    portal
        .request_cancellation(Some("selling the property"))
        .await
        .unwrap();
    let summary = portal.contract().summary();
    assert_eq!(summary.status, ContractStatus::CancellationRequested);
    assert_eq!(summary.days_until_service_end, Some(59));
    assert_eq!(summary.days_until_access_expires, None);
    assert_eq!(
        summary.contract.unwrap().cancellation_reason.as_deref(),
        Some("selling the property")
    );
    // Cancellation requested alone keeps the portal open.
    assert!(!portal.is_locked());
}

#[tokio::test]
async fn failed_cancellation_leaves_state_unchanged() {
    let server = MockServer::start().await;
    mount_get(&server, "/auth/contract/", 200, active_contract()).await;
    Mock::given(method("POST"))
        .and(path("/auth/contract/cancel/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let portal = portal(&server).await;
    portal.contract().fetch(portal.gateway()).await.unwrap();

    let err = portal.request_cancellation(None).await.unwrap_err();
    assert_eq!(err.to_string(), "API request failed");
    assert_eq!(portal.contract().status(), ContractStatus::Active);
}

#[tokio::test]
async fn cancelled_contract_locks_writes_but_not_reads() {
    let server = MockServer::start().await;
    mount_get(
        &server,
        "/auth/contract/",
        200,
        json!({
            "id": 4,
            "status": "cancelled",
            "service_end_date": "2025-12-01",
            "read_only_access_until": "2026-12-01"
        }),
    )
    .await;
    mount_get(&server, "/auth/bookings/", 200, json!([])).await;

    let portal = portal(&server).await;
    portal.contract().fetch(portal.gateway()).await.unwrap();
    assert!(portal.is_locked());

    let summary = portal.contract().summary();
    assert_eq!(summary.days_until_service_end, Some(0));
    assert_eq!(summary.days_until_access_expires, Some(334));

    let _: serde_json::Value = portal.gateway().get("/auth/bookings/").await.unwrap();
    let err = portal
        .gateway()
        .post::<serde_json::Value>("/auth/bookings/", Some(&json!({})))
        .await
        .unwrap_err();
    assert!(matches!(err, UnitoError::Entitlement { .. }));
}

#[tokio::test]
async fn malformed_cancelled_record_still_locks() {
    let server = MockServer::start().await;
    mount_get(&server, "/auth/contract/", 200, json!({"id": 1, "status": "cancelled"})).await;

    let portal = portal(&server).await;
    assert!(!portal.is_locked());

    let err = portal.contract().fetch(portal.gateway()).await.unwrap_err();
    assert!(matches!(err, UnitoError::Decode(_)));
    assert_eq!(portal.contract().status(), ContractStatus::Cancelled);
    assert!(portal.contract().view().contract().is_none());
    assert!(portal.is_locked());
    assert_eq!(
        portal.lock_reason(),
        Some(unito_billing::LockReason::ContractCancelled)
    );
}

#[tokio::test]
async fn unreadable_contract_status_keeps_cached_view() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/contract/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(active_contract()))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_get(&server, "/auth/contract/", 200, json!({"id": 4, "status": "archived"})).await;

    let portal = portal(&server).await;
    portal.contract().fetch(portal.gateway()).await.unwrap();
    assert!(portal.contract().fetch(portal.gateway()).await.is_err());
    assert_eq!(portal.contract().status(), ContractStatus::Active);
    assert!(portal.contract().view().contract().is_some());
}

#[tokio::test]
async fn export_works_while_contract_cancelled() {
    let server = MockServer::start().await;
    mount_get(
        &server,
        "/auth/contract/",
        200,
        json!({
            "id": 4,
            "status": "cancelled",
            "service_end_date": "2025-12-01",
            "read_only_access_until": "2026-12-01"
        }),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/auth/contract/export/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": {"email": "host@example.com", "full_name": "Test Host"},
            "profile": {"company_name": "Sea View Ltd"},
            "notifications": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let portal = portal(&server).await;
    portal.contract().fetch(portal.gateway()).await.unwrap();
    assert!(portal.is_locked());

    let data = portal.contract().export_data(portal.gateway()).await.unwrap();
    assert_eq!(data["user"]["email"], "host@example.com");
    assert_eq!(data["profile"]["company_name"], "Sea View Ltd");
}

#[tokio::test]
async fn template_is_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/contract-template/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 2,
            "version": "2.0",
            "title": "Service Agreement",
            "body": "Terms.",
            "created_at": "2025-01-01T00:00:00Z"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let portal = portal(&server).await;
    assert!(portal.contract().template().is_none());
    let template = portal.contract().fetch_template(portal.gateway()).await.unwrap();
    assert_eq!(template.version, "2.0");
    assert_eq!(portal.contract().template().unwrap().title, "Service Agreement");
}

#[tokio::test]
async fn refresh_all_loads_both_machines() {
    let server = MockServer::start().await;
    mount_get(
        &server,
        "/auth/subscription-status/",
        200,
        json!({
            "subscription_plan": "free_trial",
            "subscription_status": "trialing",
            "trial_ends_at": now() - Duration::days(1)
        }),
    )
    .await;
    mount_get(&server, "/auth/contract/", 200, active_contract()).await;

    let portal = portal(&server).await;
    portal.refresh_all().await;

    assert_eq!(portal.contract().status(), ContractStatus::Active);
    assert!(portal.is_locked());
    assert_eq!(
        portal.lock_reason(),
        Some(unito_billing::LockReason::TrialExpired)
    );
}
