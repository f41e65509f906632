// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Agency admin backend.
//!
//! Session-gated admin API for the agency's CRM, the public signup and
//! contact endpoints used by the brand sites, and the idempotent migration
//! jobs that move legacy Airtable/Firestore data into the primary store.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::DocumentStore;
use services::{FirebaseTokenVerifier, GoogleOAuthClient};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Arc<dyn DocumentStore>,
    /// Source for the Firestore-to-Firestore migration jobs
    pub legacy_db: Option<Arc<dyn DocumentStore>>,
    pub google_oauth: GoogleOAuthClient,
    pub firebase_verifier: FirebaseTokenVerifier,
}
