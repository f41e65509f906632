// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory document store used by tests.

use crate::db::{new_document_id, Document, DocumentStore, StoredDocument};
use crate::error::AppError;
use dashmap::{DashMap, DashSet};
use futures_util::future::BoxFuture;
use std::collections::BTreeMap;

/// Collections held in memory, each ordered by document id.
#[derive(Default)]
pub struct MemoryStore {
    collections: DashMap<String, BTreeMap<String, Document>>,
    /// Writes of documents whose `field == value` fail (test fault injection).
    failing_writes: DashSet<(String, String)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every write of a document with `field == value` fail.
    pub fn fail_writes_where(&self, field: &str, value: &str) {
        self.failing_writes
            .insert((field.to_string(), value.to_string()));
    }

    pub fn clear_write_failures(&self) {
        self.failing_writes.clear();
    }

    /// Copy of a collection's documents, ordered by id.
    pub fn snapshot(&self, collection: &str) -> Vec<StoredDocument> {
        self.collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, data)| StoredDocument {
                        id: id.clone(),
                        data: data.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn check_write(&self, collection: &str, data: &Document) -> Result<(), AppError> {
        let rejected = self.failing_writes.iter().any(|entry| {
            let (field, value) = entry.key();
            data.get(field).and_then(|v| v.as_str()) == Some(value.as_str())
        });

        if rejected {
            return Err(AppError::Database(format!(
                "simulated write failure in {}",
                collection
            )));
        }
        Ok(())
    }

    fn put(&self, collection: &str, id: String, data: &Document) -> Result<(), AppError> {
        self.check_write(collection, data)?;
        self.collections
            .entry(collection.to_string())
            .or_default()
            .insert(id, data.clone());
        Ok(())
    }
}

impl DocumentStore for MemoryStore {
    fn list<'a>(
        &'a self,
        collection: &'a str,
    ) -> BoxFuture<'a, Result<Vec<StoredDocument>, AppError>> {
        Box::pin(async move { Ok(self.snapshot(collection)) })
    }

    fn get<'a>(
        &'a self,
        collection: &'a str,
        id: &'a str,
    ) -> BoxFuture<'a, Result<Option<Document>, AppError>> {
        Box::pin(async move {
            Ok(self
                .collections
                .get(collection)
                .and_then(|docs| docs.get(id).cloned()))
        })
    }

    fn find_by_field<'a>(
        &'a self,
        collection: &'a str,
        field: &'a str,
        value: &'a str,
    ) -> BoxFuture<'a, Result<Vec<StoredDocument>, AppError>> {
        Box::pin(async move {
            Ok(self
                .snapshot(collection)
                .into_iter()
                .filter(|doc| doc.data.get(field).and_then(|v| v.as_str()) == Some(value))
                .collect())
        })
    }

    fn insert<'a>(
        &'a self,
        collection: &'a str,
        data: &'a Document,
    ) -> BoxFuture<'a, Result<String, AppError>> {
        Box::pin(async move {
            let id = new_document_id();
            self.put(collection, id.clone(), data)?;
            Ok(id)
        })
    }

    fn set<'a>(
        &'a self,
        collection: &'a str,
        id: &'a str,
        data: &'a Document,
    ) -> BoxFuture<'a, Result<(), AppError>> {
        Box::pin(async move { self.put(collection, id.to_string(), data) })
    }

    fn delete<'a>(
        &'a self,
        collection: &'a str,
        id: &'a str,
    ) -> BoxFuture<'a, Result<bool, AppError>> {
        Box::pin(async move {
            Ok(self
                .collections
                .get_mut(collection)
                .is_some_and(|mut docs| docs.remove(id).is_some()))
        })
    }
}
