// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session-protected admin API: CRM, dashboard, analytics and migrations.
//!
//! Every route here sits behind [`require_admin`](crate::middleware::require_admin).
//! CRM routes accept any session; the rest also check the role's section.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use validator::Validate;

use crate::db::{collections, to_document, Document, StoredDocument};
use crate::error::{AppError, Result};
use crate::middleware::require_section;
use crate::models::migration::MIGRATED_AT_FIELD;
use crate::models::{
    can_access_path, can_access_section, AdminSection, Client, MigrationReport, Session,
    SessionUser, ADMIN_SECTIONS,
};
use crate::services::{run_migration, MigrationJob, MigrationOptions};
use crate::time_utils::now_rfc3339;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/admin/navigation", get(navigation))
        .route("/api/admin/crm/clients", get(list_clients).post(create_client))
        .route(
            "/api/admin/crm/clients/{id}",
            get(get_client).put(update_client).delete(delete_client),
        )
        .route("/api/admin/crm/team-members", get(list_team_members))
        .route("/api/admin/crm/dashboard", get(dashboard))
        .route("/api/admin/analytics/summary", get(analytics_summary))
        .route("/api/admin/migrations/{job}", post(trigger_migration))
}

/// Document body with its id folded in as `"id"`.
fn with_id(doc: StoredDocument) -> Value {
    let mut data = doc.data;
    data.insert("id".to_string(), Value::String(doc.id));
    Value::Object(data)
}

#[derive(Deserialize)]
pub struct NavigationQuery {
    #[serde(default)]
    path: Option<String>,
}

#[derive(Serialize)]
struct NavigationResponse {
    user: SessionUser,
    sections: Vec<AdminSection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    path_allowed: Option<bool>,
}

/// Sections the current role may open, plus an optional path check.
async fn navigation(
    Extension(session): Extension<Session>,
    Query(query): Query<NavigationQuery>,
) -> Json<NavigationResponse> {
    let sections = ADMIN_SECTIONS
        .into_iter()
        .filter(|section| can_access_section(&session.user, *section))
        .collect();
    let path_allowed = query
        .path
        .as_deref()
        .map(|path| can_access_path(&session.user, path));

    Json(NavigationResponse {
        user: session.user,
        sections,
        path_allowed,
    })
}

#[derive(Serialize)]
struct ClientsResponse {
    success: bool,
    clients: Vec<Value>,
}

async fn list_clients(State(state): State<Arc<AppState>>) -> Result<Json<ClientsResponse>> {
    let clients = state
        .db
        .list(collections::CLIENTS)
        .await?
        .into_iter()
        .map(with_id)
        .collect();

    Ok(Json(ClientsResponse {
        success: true,
        clients,
    }))
}

/// Create/update payload for a client.
#[derive(Debug, Deserialize, Validate)]
pub struct ClientRequest {
    #[validate(length(min = 1, max = 200))]
    name: String,
    #[serde(default)]
    #[validate(email)]
    email: Option<String>,
    #[serde(default)]
    company: Option<String>,
    #[serde(default)]
    phone: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    notes: Option<String>,
}

impl ClientRequest {
    /// Trim text and drop empty optionals, then validate.
    fn normalized(self) -> Result<Self> {
        let trimmed = |value: Option<String>| {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let request = Self {
            name: self.name.trim().to_string(),
            email: trimmed(self.email).map(|email| email.to_lowercase()),
            company: trimmed(self.company),
            phone: trimmed(self.phone),
            status: trimmed(self.status),
            notes: trimmed(self.notes),
        };
        request.validate()?;
        Ok(request)
    }

    /// Optional fields sent blank, which an update clears.
    fn blank_fields(&self) -> Vec<&'static str> {
        [
            ("email", &self.email),
            ("company", &self.company),
            ("phone", &self.phone),
            ("status", &self.status),
            ("notes", &self.notes),
        ]
        .into_iter()
        .filter(|(_, value)| value.as_deref().is_some_and(|v| v.trim().is_empty()))
        .map(|(field, _)| field)
        .collect()
    }

    /// Overlay onto a stored client. Fields this form does not manage
    /// (legacy columns, migration provenance) are left alone, as are
    /// optional fields the request omits.
    fn merge_into(self, doc: &mut Document, cleared: &[&str]) {
        doc.insert("name".to_string(), Value::String(self.name));
        for (field, value) in [
            ("email", self.email),
            ("company", self.company),
            ("phone", self.phone),
            ("status", self.status),
            ("notes", self.notes),
        ] {
            if let Some(value) = value {
                doc.insert(field.to_string(), Value::String(value));
            }
        }
        for field in cleared {
            doc.remove(*field);
        }
    }

    fn into_client(self, created_at: String, updated_at: String) -> Client {
        Client {
            name: self.name,
            email: self.email,
            company: self.company,
            phone: self.phone,
            status: self.status,
            notes: self.notes,
            created_at,
            updated_at,
        }
    }
}

#[derive(Serialize)]
struct CreatedResponse {
    success: bool,
    id: String,
}

async fn create_client(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Json(body): Json<ClientRequest>,
) -> Result<Json<CreatedResponse>> {
    let request = body.normalized()?;
    let now = now_rfc3339();
    let client = request.into_client(now.clone(), now);

    let id = state
        .db
        .insert(collections::CLIENTS, &to_document(&client)?)
        .await?;

    tracing::info!(id = %id, by = %session.user.email, "Created client");
    Ok(Json(CreatedResponse { success: true, id }))
}

async fn get_client(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let doc = state
        .db
        .get(collections::CLIENTS, &id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("client {}", id)))?;

    Ok(Json(serde_json::json!({
        "success": true,
        "client": with_id(StoredDocument { id, data: doc }),
    })))
}

#[derive(Serialize)]
struct SuccessResponse {
    success: bool,
}

async fn update_client(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
    Json(body): Json<ClientRequest>,
) -> Result<Json<SuccessResponse>> {
    let cleared = body.blank_fields();
    let request = body.normalized()?;

    let mut doc = state
        .db
        .get(collections::CLIENTS, &id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("client {}", id)))?;

    let now = now_rfc3339();
    // Migrated contacts may predate created_at; their import time stands in.
    let has_created_at = doc.get("created_at").is_some_and(|v| !v.is_null());
    if !has_created_at {
        let created_at = doc
            .get(MIGRATED_AT_FIELD)
            .cloned()
            .unwrap_or_else(|| Value::String(now.clone()));
        doc.insert("created_at".to_string(), created_at);
    }
    request.merge_into(&mut doc, &cleared);
    doc.insert("updated_at".to_string(), Value::String(now));

    state.db.set(collections::CLIENTS, &id, &doc).await?;

    tracing::info!(id = %id, by = %session.user.email, "Updated client");
    Ok(Json(SuccessResponse { success: true }))
}

async fn delete_client(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>> {
    if !state.db.delete(collections::CLIENTS, &id).await? {
        return Err(AppError::NotFound(format!("client {}", id)));
    }

    tracing::info!(id = %id, by = %session.user.email, "Deleted client");
    Ok(Json(SuccessResponse { success: true }))
}

#[derive(Serialize)]
struct TeamMembersResponse {
    success: bool,
    team_members: Vec<Value>,
}

async fn list_team_members(
    State(state): State<Arc<AppState>>,
) -> Result<Json<TeamMembersResponse>> {
    let team_members = state
        .db
        .list(collections::TEAM_MEMBERS)
        .await?
        .into_iter()
        .map(with_id)
        .collect();

    Ok(Json(TeamMembersResponse {
        success: true,
        team_members,
    }))
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DashboardCounts {
    pub clients: usize,
    pub team_members: usize,
    pub email_signups: usize,
    pub contact_forms: usize,
}

#[derive(Serialize)]
struct DashboardResponse {
    success: bool,
    counts: DashboardCounts,
}

async fn dashboard(State(state): State<Arc<AppState>>) -> Result<Json<DashboardResponse>> {
    let db = state.db.as_ref();
    let (clients, team_members, email_signups, contact_forms) = tokio::try_join!(
        db.count(collections::CLIENTS),
        db.count(collections::TEAM_MEMBERS),
        db.count(collections::EMAIL_SIGNUPS),
        db.count(collections::CONTACT_FORMS),
    )?;

    Ok(Json(DashboardResponse {
        success: true,
        counts: DashboardCounts {
            clients,
            team_members,
            email_signups,
            contact_forms,
        },
    }))
}

#[derive(Serialize)]
struct Integration {
    name: &'static str,
    configured: bool,
}

#[derive(Serialize)]
struct AnalyticsSummaryResponse {
    success: bool,
    integrations: Vec<Integration>,
}

/// Which analytics backends are wired up. The numbers live upstream.
async fn analytics_summary(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> Result<Json<AnalyticsSummaryResponse>> {
    require_section(&session, AdminSection::Analytics)?;

    let config = &state.config;
    let integrations = vec![
        Integration {
            name: "ga4",
            configured: config.ga4_property_id.is_some(),
        },
        Integration {
            name: "mailchimp",
            configured: config.mailchimp_api_key.is_some(),
        },
        Integration {
            name: "linkedin",
            configured: config.linkedin_access_token.is_some(),
        },
        Integration {
            name: "instagram",
            configured: config.instagram_access_token.is_some(),
        },
    ];

    Ok(Json(AnalyticsSummaryResponse {
        success: true,
        integrations,
    }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationRequest {
    #[serde(default)]
    resume: bool,
    #[serde(default)]
    dry_run: bool,
}

#[derive(Serialize)]
struct MigrationResponse {
    success: bool,
    job: &'static str,
    dry_run: bool,
    report: MigrationReport,
}

/// Run a migration job to completion and return its report.
///
/// The body is optional; an empty body means a fresh, writing run.
async fn trigger_migration(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(job): Path<String>,
    body: Bytes,
) -> Result<Json<MigrationResponse>> {
    require_section(&session, AdminSection::Data)?;

    let job: MigrationJob = job.parse()?;
    let request: MigrationRequest = if body.is_empty() {
        MigrationRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AppError::BadRequest(format!("Invalid request body: {}", e)))?
    };

    tracing::info!(
        job = %job,
        by = %session.user.email,
        resume = request.resume,
        dry_run = request.dry_run,
        "Migration triggered"
    );

    let source = job.build_source(&state.config, state.legacy_db.clone())?;
    let options = MigrationOptions {
        resume: request.resume,
        dry_run: request.dry_run,
    };
    let report = run_migration(source.as_ref(), state.db.as_ref(), &job.plan(), options).await?;

    Ok(Json(MigrationResponse {
        success: true,
        job: job.name(),
        dry_run: request.dry_run,
        report,
    }))
}
