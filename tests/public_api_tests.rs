// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Public signup/contact endpoints: validation, API key and CORS.

mod common;

use agency_admin::config::Config;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use common::{create_test_app, create_test_app_with, read_json};
use tower::ServiceExt;

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn signup(router: Router, email: &str, source: &str) -> axum::response::Response {
    router
        .oneshot(post_json(
            "/api/public/email-signup",
            serde_json::json!({"email": email, "source": source}),
        ))
        .await
        .unwrap()
}

#[tokio::test]
async fn test_unknown_source_lists_valid_sources() {
    let app = create_test_app();

    let response = signup(app.router, "fan@example.com", "MySpace").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error = read_json(response).await["error"]
        .as_str()
        .unwrap()
        .to_string();
    for source in [
        "434Media",
        "AIM",
        "DevSA",
        "DigitalCanvas",
        "SATechDay",
        "TXMX",
        "VemosVamos",
    ] {
        assert!(error.contains(source), "{error}");
    }
    assert!(app.store.snapshot("email_signups").is_empty());
}

#[tokio::test]
async fn test_invalid_email_rejected() {
    let app = create_test_app();

    let response = signup(app.router, "not-an-email", "DevSA").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_signup_deduplicates_by_email_and_source() {
    let app = create_test_app();

    let response = signup(app.router.clone(), "Fan@Example.com", "DevSA").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await["message"], "Subscribed");

    let response = signup(app.router.clone(), " fan@example.com ", "DevSA").await;
    assert_eq!(read_json(response).await["message"], "Already subscribed");

    // Same person, different brand list.
    let response = signup(app.router, "fan@example.com", "TXMX").await;
    assert_eq!(read_json(response).await["message"], "Subscribed");

    let signups = app.store.snapshot("email_signups");
    assert_eq!(signups.len(), 2);
    assert!(signups.iter().all(|s| s.data["email"] == "fan@example.com"));
}

#[tokio::test]
async fn test_api_key_enforced_when_configured() {
    let mut config = Config::test_default();
    config.public_api_key = Some("brand-site-key".to_string());
    let app = create_test_app_with(config, None);

    let response = signup(app.router.clone(), "fan@example.com", "DevSA").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let mut request = post_json(
        "/api/public/email-signup",
        serde_json::json!({"email": "fan@example.com", "source": "DevSA"}),
    );
    request
        .headers_mut()
        .insert("x-api-key", "wrong-key".parse().unwrap());
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let mut request = post_json(
        "/api/public/email-signup",
        serde_json::json!({"email": "fan@example.com", "source": "DevSA"}),
    );
    request
        .headers_mut()
        .insert("x-api-key", "brand-site-key".parse().unwrap());
    let response = app.router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_cors_preflight_for_allowed_origin() {
    let mut config = Config::test_default();
    config.public_api_key = Some("brand-site-key".to_string());
    let app = create_test_app_with(config, None);

    let response = app
        .router
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/api/public/email-signup")
                .header(header::ORIGIN, "https://www.434media.com")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type,x-api-key")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        "https://www.434media.com"
    );
}

#[tokio::test]
async fn test_cors_unknown_origin_not_echoed() {
    let app = create_test_app();

    let mut request = post_json(
        "/api/public/email-signup",
        serde_json::json!({"email": "fan@example.com", "source": "DevSA"}),
    );
    request
        .headers_mut()
        .insert(header::ORIGIN, "https://evil.example".parse().unwrap());
    let response = app.router.oneshot(request).await.unwrap();

    assert!(response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}

#[tokio::test]
async fn test_contact_form() {
    let app = create_test_app();

    let response = app
        .router
        .clone()
        .oneshot(post_json(
            "/api/public/contact-form",
            serde_json::json!({
                "firstName": "Ada",
                "lastName": "Lovelace",
                "email": "Ada@Example.com",
                "message": "We'd like a quote.",
                "company": "  ",
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await["success"], true);

    let forms = app.store.snapshot("contact_forms");
    assert_eq!(forms.len(), 1);
    assert_eq!(forms[0].data["first_name"], "Ada");
    assert_eq!(forms[0].data["email"], "ada@example.com");
    assert_eq!(forms[0].data["source"], "website");
    assert!(forms[0].data["company"].is_null());

    let response = app
        .router
        .oneshot(post_json(
            "/api/public/contact-form",
            serde_json::json!({
                "firstName": "",
                "lastName": "Lovelace",
                "email": "ada@example.com",
                "message": "Hi",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
