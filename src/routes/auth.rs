// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin login routes: Google OAuth (full admin) and Firebase (CRM only).

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use subtle::ConstantTimeEq;

use crate::error::{AppError, Result};
use crate::models::{AuthProvider, SessionUser};
use crate::services::session::{clear_session, get_session, is_workspace_email, set_session};
use crate::services::team::provision_team_member;
use crate::services::{FirebaseAuthError, GoogleUserInfo};
use crate::AppState;

pub const OAUTH_STATE_COOKIE: &str = "oauth_state";
const OAUTH_STATE_TTL_SECS: i64 = 600;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/google", get(google_start))
        .route("/api/auth/google/callback", get(google_callback))
        .route("/api/auth/firebase", post(firebase_login))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/session", get(current_session))
}

/// Start the Google OAuth flow.
async fn google_start(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, Redirect) {
    let oauth_state = uuid::Uuid::new_v4().simple().to_string();

    let cookie = Cookie::build((OAUTH_STATE_COOKIE, oauth_state.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.is_production())
        .max_age(time::Duration::seconds(OAUTH_STATE_TTL_SECS));

    tracing::info!("Starting Google OAuth flow");

    let url = state.google_oauth.authorization_url(&oauth_state);
    (jar.add(cookie), Redirect::temporary(&url))
}

#[derive(Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Google OAuth callback. Every outcome is a redirect back to `/admin`.
async fn google_callback(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> (CookieJar, Redirect) {
    let secure = state.config.is_production();
    let expected_state = jar
        .get(OAUTH_STATE_COOKIE)
        .map(|cookie| cookie.value().to_string());

    // The state cookie is single use.
    let jar = jar.remove(Cookie::build(OAUTH_STATE_COOKIE).path("/"));

    let state_ok = match (&expected_state, &params.state) {
        (Some(expected), Some(received)) => {
            bool::from(expected.as_bytes().ct_eq(received.as_bytes()))
        }
        _ => false,
    };
    if !state_ok {
        tracing::warn!(
            has_cookie = expected_state.is_some(),
            "OAuth state mismatch"
        );
        return (jar, admin_redirect(&state, Some("invalid_state")));
    }

    if let Some(error) = params.error {
        tracing::warn!(error = %error, "OAuth error from Google");
        return (jar, admin_redirect(&state, Some(&error)));
    }

    let Some(code) = params.code.filter(|code| !code.is_empty()) else {
        return (jar, admin_redirect(&state, Some("missing_code")));
    };

    let userinfo = match exchange_and_fetch(&state, &code).await {
        Ok(userinfo) => userinfo,
        Err(e) => {
            tracing::error!(error = %e, "Google sign-in failed");
            return (jar, admin_redirect(&state, Some("auth_failed")));
        }
    };

    if !is_workspace_email(&userinfo.email, &state.config.workspace_domain) {
        tracing::warn!(email = %userinfo.email, "Google account outside workspace domain");
        return (jar, admin_redirect(&state, Some("unauthorized_domain")));
    }

    let user = SessionUser::new(
        userinfo.email.trim().to_lowercase(),
        userinfo.name,
        userinfo.picture,
        AuthProvider::Google,
    );
    tracing::info!(email = %user.email, "Full admin signed in");

    let jar = set_session(jar, user, secure);
    (jar, admin_redirect(&state, None))
}

async fn exchange_and_fetch(state: &AppState, code: &str) -> Result<GoogleUserInfo> {
    let access_token = state.google_oauth.exchange_code(code).await?;
    state.google_oauth.fetch_userinfo(&access_token).await
}

fn admin_redirect(state: &AppState, error: Option<&str>) -> Redirect {
    let url = match error {
        Some(error) => format!(
            "{}/admin?error={}",
            state.config.site_url,
            urlencoding::encode(error)
        ),
        None => format!("{}/admin", state.config.site_url),
    };
    Redirect::temporary(&url)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirebaseLoginRequest {
    #[serde(default)]
    id_token: String,
}

#[derive(Serialize)]
struct LoginResponse {
    success: bool,
    user: SessionUser,
}

#[derive(Serialize)]
struct FirebaseErrorResponse {
    error: String,
    code: &'static str,
}

/// Exchange a Firebase ID token for a CRM-only session.
async fn firebase_login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(body): Json<FirebaseLoginRequest>,
) -> Result<Response> {
    if body.id_token.trim().is_empty() {
        return Err(AppError::BadRequest("idToken is required".to_string()));
    }

    let verified = match state.firebase_verifier.verify_id_token(&body.id_token).await {
        Ok(verified) => verified,
        Err(e) => return Ok(firebase_error_response(e)),
    };

    // A login must not fail because the CRM roster could not be updated.
    if let Err(e) = provision_team_member(state.db.as_ref(), &verified).await {
        tracing::warn!(email = %verified.email, error = %e, "Failed to provision team member");
    }

    let user = SessionUser::new(
        verified.email.trim().to_lowercase(),
        verified.name,
        verified.picture,
        AuthProvider::Firebase,
    );
    tracing::info!(email = %user.email, "CRM user signed in");

    let jar = set_session(jar, user.clone(), state.config.is_production());
    Ok((jar, Json(LoginResponse { success: true, user })).into_response())
}

fn firebase_error_response(e: FirebaseAuthError) -> Response {
    let status = match e {
        FirebaseAuthError::Config(_) => {
            tracing::error!(error = %e, "Firebase verification unavailable");
            StatusCode::INTERNAL_SERVER_ERROR
        }
        FirebaseAuthError::TokenExpired | FirebaseAuthError::Invalid(_) => {
            tracing::warn!(error = %e, "Rejected Firebase ID token");
            StatusCode::UNAUTHORIZED
        }
    };

    let body = FirebaseErrorResponse {
        error: e.to_string(),
        code: e.code(),
    };
    (status, Json(body)).into_response()
}

#[derive(Serialize)]
struct SuccessResponse {
    success: bool,
}

async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, Json<SuccessResponse>) {
    let jar = clear_session(jar, state.config.is_production());
    (jar, Json(SuccessResponse { success: true }))
}

#[derive(Serialize)]
struct SessionResponse {
    authenticated: bool,
    user: SessionUser,
}

async fn current_session(jar: CookieJar) -> Result<Json<SessionResponse>> {
    let session = get_session(&jar).ok_or(AppError::Unauthorized)?;
    Ok(Json(SessionResponse {
        authenticated: true,
        user: session.user,
    }))
}
