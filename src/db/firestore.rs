// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper implementing [`DocumentStore`].
//!
//! Documents are read and written as schemaless JSON maps. Firestore's
//! metadata fields (`_firestore_id`, ...) are stripped on read, the id is
//! returned alongside the body.

use crate::db::{new_document_id, Document, DocumentStore, StoredDocument};
use crate::error::AppError;
use futures_util::future::BoxFuture;
use futures_util::TryStreamExt;

const FIRESTORE_ID_FIELD: &str = "_firestore_id";
const FIRESTORE_META_PREFIX: &str = "_firestore_";

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create an offline client. Every operation returns a database error.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    async fn list_documents(&self, collection: &str) -> Result<Vec<StoredDocument>, AppError> {
        let docs: Vec<Document> = self
            .get_client()?
            .fluent()
            .select()
            .from(collection)
            .obj::<Document>()
            .stream_query_with_errors()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .try_collect()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(docs.into_iter().filter_map(split_metadata).collect())
    }

    async fn get_document(&self, collection: &str, id: &str) -> Result<Option<Document>, AppError> {
        let doc: Option<Document> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collection)
            .obj()
            .one(id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(doc.and_then(split_metadata).map(|stored| stored.data))
    }

    async fn query_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Vec<StoredDocument>, AppError> {
        let docs: Vec<Document> = self
            .get_client()?
            .fluent()
            .select()
            .from(collection)
            .filter(|q| q.for_all([q.field(field).eq(value)]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(docs.into_iter().filter_map(split_metadata).collect())
    }

    async fn insert_document(&self, collection: &str, data: &Document) -> Result<String, AppError> {
        let id = new_document_id();
        let _: () = self
            .get_client()?
            .fluent()
            .insert()
            .into(collection)
            .document_id(&id)
            .object(data)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(id)
    }

    async fn set_document(&self, collection: &str, id: &str, data: &Document) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collection)
            .document_id(id)
            .object(data)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn delete_document(&self, collection: &str, id: &str) -> Result<bool, AppError> {
        if self.get_document(collection, id).await?.is_none() {
            return Ok(false);
        }

        self.get_client()?
            .fluent()
            .delete()
            .from(collection)
            .document_id(id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(true)
    }
}

impl DocumentStore for FirestoreDb {
    fn list<'a>(
        &'a self,
        collection: &'a str,
    ) -> BoxFuture<'a, Result<Vec<StoredDocument>, AppError>> {
        Box::pin(self.list_documents(collection))
    }

    fn get<'a>(
        &'a self,
        collection: &'a str,
        id: &'a str,
    ) -> BoxFuture<'a, Result<Option<Document>, AppError>> {
        Box::pin(self.get_document(collection, id))
    }

    fn find_by_field<'a>(
        &'a self,
        collection: &'a str,
        field: &'a str,
        value: &'a str,
    ) -> BoxFuture<'a, Result<Vec<StoredDocument>, AppError>> {
        Box::pin(self.query_by_field(collection, field, value))
    }

    fn insert<'a>(
        &'a self,
        collection: &'a str,
        data: &'a Document,
    ) -> BoxFuture<'a, Result<String, AppError>> {
        Box::pin(self.insert_document(collection, data))
    }

    fn set<'a>(
        &'a self,
        collection: &'a str,
        id: &'a str,
        data: &'a Document,
    ) -> BoxFuture<'a, Result<(), AppError>> {
        Box::pin(self.set_document(collection, id, data))
    }

    fn delete<'a>(
        &'a self,
        collection: &'a str,
        id: &'a str,
    ) -> BoxFuture<'a, Result<bool, AppError>> {
        Box::pin(self.delete_document(collection, id))
    }
}

/// Pull the document id out of the metadata Firestore injects and drop the
/// rest of the metadata fields.
fn split_metadata(mut doc: Document) -> Option<StoredDocument> {
    let id = match doc.remove(FIRESTORE_ID_FIELD) {
        Some(serde_json::Value::String(id)) => id,
        _ => {
            tracing::warn!("Firestore document without id metadata, skipping");
            return None;
        }
    };
    doc.retain(|key, _| !key.starts_with(FIRESTORE_META_PREFIX));
    Some(StoredDocument { id, data: doc })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_split_metadata() {
        let doc = json!({
            "_firestore_id": "abc",
            "_firestore_created": "2026-01-01T00:00:00Z",
            "email": "a@b.com",
            "_migrated_from": "airtable:app/table"
        });
        let serde_json::Value::Object(doc) = doc else {
            unreachable!()
        };

        let stored = split_metadata(doc).unwrap();
        assert_eq!(stored.id, "abc");
        assert_eq!(stored.data.len(), 2);
        assert_eq!(stored.data["_migrated_from"], "airtable:app/table");
    }

    #[test]
    fn test_split_metadata_requires_id() {
        let mut doc = Document::new();
        doc.insert("email".to_string(), json!("a@b.com"));
        assert!(split_metadata(doc).is_none());
    }

    #[tokio::test]
    async fn test_offline_client_errors() {
        let db = FirestoreDb::new_mock();
        let err = db.list("clients").await.unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
    }
}
