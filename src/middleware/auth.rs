// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin session middleware.

use crate::error::AppError;
use crate::models::{can_access_section, AdminSection, Session};
use crate::services::session::{get_session, is_authorized_admin};
use axum::{extract::Request, middleware::Next, response::Response};
use axum_extra::extract::cookie::CookieJar;

/// Middleware that requires a valid admin session cookie.
///
/// On success the decoded [`Session`] is available to handlers as an
/// `Extension<Session>`.
pub async fn require_admin(
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(session) = get_session(&jar) else {
        tracing::debug!(path = %request.uri().path(), "No valid admin session");
        return Err(AppError::Unauthorized);
    };

    if !is_authorized_admin(&session.user.email) {
        tracing::warn!(path = %request.uri().path(), "Session without email rejected");
        return Err(AppError::Unauthorized);
    }

    request.extensions_mut().insert(session);

    Ok(next.run(request).await)
}

/// Section-level check for routes restricted to some roles.
pub fn require_section(session: &Session, section: AdminSection) -> Result<(), AppError> {
    if can_access_section(&session.user, section) {
        return Ok(());
    }

    tracing::warn!(
        email = %session.user.email,
        role = session.user.effective_role().as_str(),
        section = ?section,
        "Role lacks access to admin section"
    );
    Err(AppError::Forbidden)
}
