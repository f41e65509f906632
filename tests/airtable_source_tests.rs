// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Airtable pagination and the email-signups job end to end.

mod common;

use agency_admin::config::Config;
use agency_admin::models::AuthProvider;
use agency_admin::services::AirtableClient;
use axum::{
    body::Body,
    extract::{Path, Query},
    http::{header, HeaderMap, Method, Request, StatusCode},
    routing::get,
    Json, Router,
};
use common::{create_test_app_with, read_json, session_cookie, spawn_server};
use std::collections::HashMap;
use tower::ServiceExt;

/// Two pages of "Email Signups"; any other table is empty.
async fn list_records(
    Path((base, table)): Path<(String, String)>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> (StatusCode, Json<serde_json::Value>) {
    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        == Some("Bearer test_airtable_key");
    if !authorized || base != "appTestBase" {
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({"error": "AUTHENTICATION_REQUIRED"})),
        );
    }
    if table != "Email Signups" {
        return (StatusCode::OK, Json(serde_json::json!({"records": []})));
    }

    let page = match query.get("offset").map(String::as_str) {
        None => serde_json::json!({
            "records": [
                {"id": "rec1", "fields": {"Email": "Fan@Example.com", "Source": "DevSA"}},
                {"id": "rec2", "fields": {"Email": "other@example.com", "Source": "TXMX"}},
            ],
            "offset": "page2",
        }),
        Some("page2") => serde_json::json!({
            "records": [
                {"id": "rec3", "fields": {"Email": " fan@example.com ", "Source": ["devsa"]}},
                {"id": "rec4", "fields": {}},
            ],
        }),
        Some(_) => serde_json::json!({"records": []}),
    };
    (StatusCode::OK, Json(page))
}

async fn spawn_fake_airtable() -> String {
    let router = Router::new().route("/v0/{base}/{table}", get(list_records));
    format!("{}/v0", spawn_server(router).await)
}

fn config_for(api_url: String) -> Config {
    let mut config = Config::test_default();
    config.airtable_api_url = api_url;
    config
}

#[tokio::test]
async fn test_list_all_follows_offsets() {
    let config = config_for(spawn_fake_airtable().await);
    let client = AirtableClient::from_config(&config).unwrap();

    let records = client.list_all("Email Signups").await.unwrap();

    let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["rec1", "rec2", "rec3", "rec4"]);
    assert_eq!(records[0].fields["Source"], "DevSA");
}

#[tokio::test]
async fn test_bad_key_is_upstream_error() {
    let mut config = config_for(spawn_fake_airtable().await);
    config.airtable_api_key = Some("wrong".to_string());
    let client = AirtableClient::from_config(&config).unwrap();

    let err = client.list_all("Email Signups").await.unwrap_err();
    assert!(err.to_string().contains("401"), "{err}");
}

#[tokio::test]
async fn test_migration_route_runs_email_signups_job() {
    let app = create_test_app_with(config_for(spawn_fake_airtable().await), None);
    let cookie = session_cookie("jesse@434media.com", AuthProvider::Google);

    let run = |body: &'static str| {
        Request::builder()
            .method(Method::POST)
            .uri("/api/admin/migrations/email-signups")
            .header(header::COOKIE, cookie.clone())
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    };

    // Dry run first: nothing is written.
    let response = app
        .router
        .clone()
        .oneshot(run(r#"{"dryRun": true}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["dry_run"], true);
    assert_eq!(body["report"]["migrated"], 2);
    assert!(app.store.snapshot("email_signups").is_empty());

    let response = app.router.clone().oneshot(run("")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["job"], "email-signups");
    assert_eq!(body["report"]["migrated"], 2);
    assert_eq!(body["report"]["skipped"], 1);
    assert_eq!(body["report"]["errored"], 1);

    let docs = app.store.snapshot("email_signups");
    assert_eq!(docs.len(), 2);
    assert!(docs
        .iter()
        .all(|doc| doc.data["_migrated_from"] == "airtable:appTestBase/Email Signups"));
    let mut sources: Vec<_> = docs
        .iter()
        .map(|doc| doc.data["source"].as_str().unwrap().to_string())
        .collect();
    sources.sort();
    assert_eq!(sources, vec!["DevSA", "TXMX"]);

    // rec4 errored, so the cursor survives and covers every keyed record.
    let response = app
        .router
        .oneshot(run(r#"{"resume": true}"#))
        .await
        .unwrap();
    let body = read_json(response).await;
    assert_eq!(body["report"]["migrated"], 0);
    assert_eq!(body["report"]["skipped"], 0);
    assert_eq!(body["report"]["checkpoint_skipped"], 3);
    assert_eq!(body["report"]["errored"], 1);
}

async fn public_signup(app: &common::TestApp, email: &str, source: &str) -> serde_json::Value {
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/public/email-signup")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    serde_json::json!({"email": email, "source": source}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    read_json(response).await
}

#[tokio::test]
async fn test_signup_identity_shared_with_public_endpoint() {
    let app = create_test_app_with(config_for(spawn_fake_airtable().await), None);
    let cookie = session_cookie("jesse@434media.com", AuthProvider::Google);

    // Public first: a different brand must not hide the Airtable DevSA row,
    // the same brand must.
    public_signup(&app, "fan@example.com", "AIM").await;
    public_signup(&app, "Other@Example.com", "TXMX").await;

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/admin/migrations/email-signups")
                .header(header::COOKIE, cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = read_json(response).await;
    assert_eq!(body["report"]["migrated"], 1);
    assert_eq!(body["report"]["skipped"], 2);
    assert_eq!(body["report"]["errored"], 1);

    // Migrated first: the public endpoint sees the imported DevSA row.
    let body = public_signup(&app, " FAN@example.com", "DevSA").await;
    assert_eq!(body["message"], "Already subscribed");

    let docs = app.store.snapshot("email_signups");
    assert_eq!(docs.len(), 3);
    let devsa: Vec<_> = docs
        .iter()
        .filter(|doc| doc.data["source"] == "DevSA")
        .collect();
    assert_eq!(devsa.len(), 1);
    assert_eq!(devsa[0].data["email"], "fan@example.com");
    assert!(devsa[0].data.contains_key("_migrated_from"));
}
