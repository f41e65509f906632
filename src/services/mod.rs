// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod airtable;
pub mod firebase_auth;
pub mod google_oauth;
pub mod jobs;
pub mod migration;
pub mod session;
pub mod team;

pub use airtable::{AirtableClient, AirtableSource};
pub use firebase_auth::{FirebaseAuthError, FirebaseTokenVerifier, VerifiedFirebaseUser};
pub use google_oauth::{GoogleOAuthClient, GoogleUserInfo};
pub use jobs::MigrationJob;
pub use migration::{
    run_migration, CollectionSource, DedupStrategy, IdentityKey, MigrationOptions, MigrationPlan,
    RecordSource,
};
