// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin session cookie codec.
//!
//! The session is stored client-side as base64(JSON `{user, expiresAt}`) in
//! an HTTP-only cookie. It is not signed; access control happens when the
//! session is issued. Anything that fails to decode is treated as no session.

use crate::models::{Session, SessionUser};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::{DateTime, Utc};

pub const SESSION_COOKIE: &str = "admin-auth-session";
pub const SESSION_TTL_SECS: i64 = 24 * 60 * 60;

/// Serialize and base64-encode a session.
pub fn encode_session(session: &Session) -> String {
    // Plain strings and integers always serialize.
    let json = serde_json::to_vec(session).unwrap_or_default();
    BASE64.encode(json)
}

/// Decode a cookie value, returning `None` for anything unusable.
pub fn decode_session(value: &str, now: DateTime<Utc>) -> Option<Session> {
    let bytes = match BASE64.decode(value.trim()) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::debug!(error = %e, "Session cookie is not base64");
            return None;
        }
    };

    let session: Session = match serde_json::from_slice(&bytes) {
        Ok(session) => session,
        Err(e) => {
            tracing::debug!(error = %e, "Session cookie is not a session payload");
            return None;
        }
    };

    if session.is_expired_at(now.timestamp_millis()) {
        tracing::debug!(email = %session.user.email, "Session expired");
        return None;
    }

    if !session.user.is_consistent() {
        tracing::warn!(
            email = %session.user.email,
            "Session role does not match its auth provider"
        );
        return None;
    }

    Some(session)
}

/// Build the session that `set_session` would store at `now`.
pub fn new_session(user: SessionUser, now: DateTime<Utc>) -> Session {
    Session {
        user,
        expires_at: now.timestamp_millis() + SESSION_TTL_SECS * 1000,
    }
}

/// Store a fresh 24h session for `user`.
pub fn set_session(jar: CookieJar, user: SessionUser, secure: bool) -> CookieJar {
    set_session_at(jar, user, secure, Utc::now())
}

pub fn set_session_at(
    jar: CookieJar,
    user: SessionUser,
    secure: bool,
    now: DateTime<Utc>,
) -> CookieJar {
    let session = new_session(user, now);
    let cookie = Cookie::build((SESSION_COOKIE, encode_session(&session)))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(time::Duration::seconds(SESSION_TTL_SECS));

    jar.add(cookie)
}

pub fn get_session(jar: &CookieJar) -> Option<Session> {
    get_session_at(jar, Utc::now())
}

pub fn get_session_at(jar: &CookieJar, now: DateTime<Utc>) -> Option<Session> {
    jar.get(SESSION_COOKIE)
        .and_then(|cookie| decode_session(cookie.value(), now))
}

/// Remove the session cookie. A no-op when there is none.
pub fn clear_session(jar: CookieJar, secure: bool) -> CookieJar {
    jar.remove(
        Cookie::build(SESSION_COOKIE)
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(secure),
    )
}

/// True iff `email` belongs to the Google Workspace domain.
///
/// Only used when a Google account asks for a session, never per route.
pub fn is_workspace_email(email: &str, workspace_domain: &str) -> bool {
    let email = email.trim().to_ascii_lowercase();
    let suffix = format!("@{}", workspace_domain.trim().to_ascii_lowercase());
    email.len() > suffix.len() && email.ends_with(&suffix)
}

/// Route-level admin check: any session with an email passes.
pub fn is_authorized_admin(email: &str) -> bool {
    !email.trim().is_empty()
}
