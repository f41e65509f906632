// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Team member provisioning for Firebase logins.

use crate::db::{collections, to_document, DocumentStore};
use crate::error::Result;
use crate::models::{Role, TeamMember};
use crate::services::firebase_auth::VerifiedFirebaseUser;
use crate::services::migration::normalize_email;
use crate::time_utils::now_rfc3339;

pub const SOURCE_FIREBASE_AUTH: &str = "firebase_auth";

/// Insert a `team_members` record for `user` unless one exists.
///
/// Returns `true` if a record was created.
pub async fn provision_team_member(
    db: &dyn DocumentStore,
    user: &VerifiedFirebaseUser,
) -> Result<bool> {
    let email = normalize_email(&user.email).unwrap_or_else(|| user.email.trim().to_lowercase());

    let existing = db
        .find_by_field(collections::TEAM_MEMBERS, "email", &email)
        .await?;
    if !existing.is_empty() {
        return Ok(false);
    }

    let member = TeamMember {
        email: email.clone(),
        name: user.name.clone(),
        picture: user.picture.clone(),
        role: Role::CrmOnly.as_str().to_string(),
        source: SOURCE_FIREBASE_AUTH.to_string(),
        created_at: now_rfc3339(),
    };
    let id = db
        .insert(collections::TEAM_MEMBERS, &to_document(&member)?)
        .await?;

    tracing::info!(email = %email, uid = %user.uid, id = %id, "Provisioned team member");
    Ok(true)
}
