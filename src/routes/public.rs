// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Public endpoints called by the brand sites (newsletter, contact form).

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::db::{collections, to_document};
use crate::error::{AppError, Result};
use crate::models::{ContactForm, EmailSignup, EmailSource};
use crate::services::migration::stored_signup_key;
use crate::time_utils::now_rfc3339;
use crate::AppState;

const DEFAULT_CONTACT_SOURCE: &str = "website";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/public/email-signup", post(email_signup))
        .route("/api/public/contact-form", post(contact_form))
}

#[derive(Debug, Deserialize, Validate)]
pub struct EmailSignupRequest {
    #[validate(email)]
    email: String,
    source: String,
    #[serde(default)]
    tags: Vec<String>,
}

#[derive(Serialize)]
struct SignupResponse {
    success: bool,
    message: &'static str,
}

/// Subscribe an email to one brand's list. Repeat signups are a no-op.
async fn email_signup(
    State(state): State<Arc<AppState>>,
    Json(body): Json<EmailSignupRequest>,
) -> Result<Json<SignupResponse>> {
    let source: EmailSource = body.source.parse().map_err(AppError::BadRequest)?;

    let request = EmailSignupRequest {
        email: body.email.trim().to_lowercase(),
        ..body
    };
    request.validate()?;

    // Migrated rows carry the same key, so either writer dedups the other.
    let key = EmailSignup::identity_key(&request.email, source);
    let already = state
        .db
        .find_by_field(collections::EMAIL_SIGNUPS, "email", &request.email)
        .await?
        .iter()
        .any(|doc| stored_signup_key(&doc.data).as_deref() == Some(key.as_str()));

    if already {
        tracing::debug!(source = %source, "Duplicate email signup");
        return Ok(Json(SignupResponse {
            success: true,
            message: "Already subscribed",
        }));
    }

    let signup = EmailSignup {
        email: request.email,
        source,
        tags: request
            .tags
            .into_iter()
            .map(|tag| tag.trim().to_string())
            .filter(|tag| !tag.is_empty())
            .collect(),
        created_at: now_rfc3339(),
    };
    state
        .db
        .insert(collections::EMAIL_SIGNUPS, &to_document(&signup)?)
        .await?;

    tracing::info!(source = %source, "New email signup");
    Ok(Json(SignupResponse {
        success: true,
        message: "Subscribed",
    }))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ContactFormRequest {
    #[validate(length(min = 1, max = 100))]
    first_name: String,
    #[validate(length(min = 1, max = 100))]
    last_name: String,
    #[validate(email)]
    email: String,
    #[validate(length(min = 1, max = 5000))]
    message: String,
    #[serde(default)]
    company: Option<String>,
    #[serde(default)]
    phone: Option<String>,
    #[serde(default)]
    source: Option<String>,
}

#[derive(Serialize)]
struct ContactResponse {
    success: bool,
    id: String,
}

async fn contact_form(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ContactFormRequest>,
) -> Result<Json<ContactResponse>> {
    let trimmed = |value: Option<String>| {
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };
    let request = ContactFormRequest {
        first_name: body.first_name.trim().to_string(),
        last_name: body.last_name.trim().to_string(),
        email: body.email.trim().to_lowercase(),
        message: body.message.trim().to_string(),
        company: trimmed(body.company),
        phone: trimmed(body.phone),
        source: trimmed(body.source),
    };
    request.validate()?;

    let form = ContactForm {
        first_name: request.first_name,
        last_name: request.last_name,
        email: request.email,
        company: request.company,
        phone: request.phone,
        message: request.message,
        source: request
            .source
            .unwrap_or_else(|| DEFAULT_CONTACT_SOURCE.to_string()),
        created_at: now_rfc3339(),
    };
    let id = state
        .db
        .insert(collections::CONTACT_FORMS, &to_document(&form)?)
        .await?;

    tracing::info!(id = %id, source = %form.source, "Contact form submitted");
    Ok(Json(ContactResponse { success: true, id }))
}
