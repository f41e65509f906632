// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer.
//!
//! Handlers and migrations talk to a [`DocumentStore`]; production uses
//! Firestore, tests and dry runs use the in-memory store.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryStore;

use crate::error::AppError;
use futures_util::future::BoxFuture;
use serde::{de::DeserializeOwned, Serialize};

/// Collection names as constants.
pub mod collections {
    pub const CLIENTS: &str = "clients";
    pub const TEAM_MEMBERS: &str = "team_members";
    pub const EMAIL_SIGNUPS: &str = "email_signups";
    pub const CONTACT_FORMS: &str = "contact_forms";
    pub const EVENT_REGISTRATIONS: &str = "event_registrations";
    /// Resume points for migration jobs (keyed by job name)
    pub const MIGRATION_CHECKPOINTS: &str = "migration_checkpoints";
}

/// Schemaless document body.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// A document together with its id.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub data: Document,
}

/// Minimal document-store surface used by the application.
pub trait DocumentStore: Send + Sync {
    /// Read a whole collection.
    fn list<'a>(&'a self, collection: &'a str)
        -> BoxFuture<'a, Result<Vec<StoredDocument>, AppError>>;

    fn get<'a>(
        &'a self,
        collection: &'a str,
        id: &'a str,
    ) -> BoxFuture<'a, Result<Option<Document>, AppError>>;

    /// Equality query on a single string field.
    fn find_by_field<'a>(
        &'a self,
        collection: &'a str,
        field: &'a str,
        value: &'a str,
    ) -> BoxFuture<'a, Result<Vec<StoredDocument>, AppError>>;

    /// Create a document with a generated id and return the id.
    fn insert<'a>(
        &'a self,
        collection: &'a str,
        data: &'a Document,
    ) -> BoxFuture<'a, Result<String, AppError>>;

    /// Create or replace a document.
    fn set<'a>(
        &'a self,
        collection: &'a str,
        id: &'a str,
        data: &'a Document,
    ) -> BoxFuture<'a, Result<(), AppError>>;

    /// Returns `false` if the document did not exist.
    fn delete<'a>(
        &'a self,
        collection: &'a str,
        id: &'a str,
    ) -> BoxFuture<'a, Result<bool, AppError>>;

    fn count<'a>(&'a self, collection: &'a str) -> BoxFuture<'a, Result<usize, AppError>> {
        Box::pin(async move { Ok(self.list(collection).await?.len()) })
    }
}

/// Serialize a typed model into a document body.
pub fn to_document<T: Serialize>(value: &T) -> Result<Document, AppError> {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::Object(map)) => Ok(map),
        Ok(_) => Err(AppError::Internal(anyhow::anyhow!(
            "model did not serialize to an object"
        ))),
        Err(e) => Err(AppError::Internal(e.into())),
    }
}

/// Deserialize a document body into a typed model.
pub fn from_document<T: DeserializeOwned>(doc: Document) -> Result<T, AppError> {
    serde_json::from_value(serde_json::Value::Object(doc))
        .map_err(|e| AppError::Database(format!("malformed document: {}", e)))
}

/// Generate a document id in the same alphabet Firestore uses.
pub fn new_document_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
