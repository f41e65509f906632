// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use agency_admin::config::Config;
use agency_admin::db::{DocumentStore, FirestoreDb, MemoryStore};
use agency_admin::models::{AuthProvider, Session, SessionUser};
use agency_admin::routes::create_router;
use agency_admin::services::session::{encode_session, new_session, SESSION_COOKIE};
use agency_admin::services::{FirebaseTokenVerifier, GoogleOAuthClient};
use agency_admin::AppState;
use axum::response::Response;
use jsonwebtoken::{DecodingKey, EncodingKey, Header};
use std::sync::Arc;

pub const TEST_KID: &str = "test-kid";
const TEST_PRIVATE_PEM: &[u8] = include_bytes!("../fixtures/firebase_test_private.pem");
const TEST_PUBLIC_PEM: &[u8] = include_bytes!("../fixtures/firebase_test_public.pem");

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Test app handles: router, shared state and the backing store.
#[allow(dead_code)]
pub struct TestApp {
    pub router: axum::Router,
    pub state: Arc<AppState>,
    pub store: Arc<MemoryStore>,
}

/// Create a test app over an empty in-memory store.
#[allow(dead_code)]
pub fn create_test_app() -> TestApp {
    create_test_app_with(Config::test_default(), None)
}

#[allow(dead_code)]
pub fn create_test_app_with(config: Config, legacy: Option<Arc<MemoryStore>>) -> TestApp {
    let store = Arc::new(MemoryStore::new());

    let firebase_verifier = FirebaseTokenVerifier::new_with_static_key(
        &config,
        TEST_KID,
        DecodingKey::from_rsa_pem(TEST_PUBLIC_PEM).expect("test public key"),
    )
    .expect("static verifier");

    let state = Arc::new(AppState {
        google_oauth: GoogleOAuthClient::new(&config).expect("oauth client"),
        firebase_verifier,
        db: store.clone() as Arc<dyn DocumentStore>,
        legacy_db: legacy.map(|legacy| legacy as Arc<dyn DocumentStore>),
        config,
    });

    TestApp {
        router: create_router(state.clone()),
        state,
        store,
    }
}

/// Sign Firebase-shaped claims with the test key.
#[allow(dead_code)]
pub fn sign_firebase_token(claims: &serde_json::Value) -> String {
    let mut header = Header::new(jsonwebtoken::Algorithm::RS256);
    header.kid = Some(TEST_KID.to_string());
    jsonwebtoken::encode(
        &header,
        claims,
        &EncodingKey::from_rsa_pem(TEST_PRIVATE_PEM).expect("test private key"),
    )
    .expect("sign token")
}

#[allow(dead_code)]
pub fn now_secs() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Claims of a valid token for the test Firebase project.
#[allow(dead_code)]
pub fn firebase_claims(email: &str) -> serde_json::Value {
    let now = now_secs();
    serde_json::json!({
        "iss": "https://securetoken.google.com/test-firebase",
        "aud": "test-firebase",
        "sub": "firebase-uid-1",
        "iat": now - 10,
        "exp": now + 3600,
        "email": email,
        "name": "Partner Person",
    })
}

/// `Cookie` header value carrying a fresh session for `provider`.
#[allow(dead_code)]
pub fn session_cookie(email: &str, provider: AuthProvider) -> String {
    let session = new_session(
        SessionUser::new(email, None, None, provider),
        chrono::Utc::now(),
    );
    raw_session_cookie(&session)
}

#[allow(dead_code)]
pub fn raw_session_cookie(session: &Session) -> String {
    format!("{}={}", SESSION_COOKIE, encode_session(session))
}

/// Serve `router` on an ephemeral local port and return its base URL.
#[allow(dead_code)]
pub async fn spawn_server(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test server");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("test server");
    });
    format!("http://{}", addr)
}

#[allow(dead_code)]
pub async fn read_json(response: Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("JSON body")
}

/// All `Set-Cookie` header values of a response.
#[allow(dead_code)]
pub fn set_cookies(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(axum::http::header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok().map(str::to_string))
        .collect()
}
