// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Idempotent insert-if-absent migration between stores.
//!
//! The routine:
//! 1. Reads every source record into memory
//! 2. Derives a normalized identity key per record
//! 3. Skips keys already present in the destination (or earlier in the run)
//! 4. Inserts the rest with provenance fields
//! 5. Persists a resume cursor over the ascending key order
//!
//! The cursor only outlives a run that left errors behind; a clean run
//! deletes it, so `resume` never hides records added to the source later.
//!
//! A failing record is counted and reported, never retried, and never
//! stops the batch. Concurrent runs against one collection can race between
//! the existence check and the insert; runs are expected to be serial.

use crate::db::{collections, from_document, to_document, Document, DocumentStore};
use crate::error::Result;
use crate::models::migration::{MIGRATED_AT_FIELD, MIGRATED_FROM_FIELD, SOURCE_ID_FIELD};
use crate::models::{EmailSignup, EmailSource, MigrationCheckpoint, MigrationReport, SourceRecord};
use crate::time_utils::now_rfc3339;
use futures_util::future::BoxFuture;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;

/// Persist the cursor after this many processed records.
const CHECKPOINT_INTERVAL: usize = 50;

/// Destination field holding a normalized email.
pub const EMAIL_FIELD: &str = "email";
/// Destination field holding the `email|event_slug` composite key.
pub const REGISTRATION_KEY_FIELD: &str = "registration_key";
/// Destination field holding the canonical brand of a signup.
pub const SOURCE_FIELD: &str = "source";

/// Anything migration records can be read from.
pub trait RecordSource: Send + Sync {
    /// Provenance label stored in `_migrated_from`.
    fn describe(&self) -> String;

    fn fetch_all(&self) -> BoxFuture<'_, Result<Vec<SourceRecord>>>;
}

/// A collection in another Firestore project (or any document store).
pub struct CollectionSource {
    store: Arc<dyn DocumentStore>,
    project: String,
    collection: String,
}

impl CollectionSource {
    pub fn new(store: Arc<dyn DocumentStore>, project: &str, collection: &str) -> Self {
        Self {
            store,
            project: project.to_string(),
            collection: collection.to_string(),
        }
    }
}

impl RecordSource for CollectionSource {
    fn describe(&self) -> String {
        format!("firestore:{}/{}", self.project, self.collection)
    }

    fn fetch_all(&self) -> BoxFuture<'_, Result<Vec<SourceRecord>>> {
        Box::pin(async move {
            let docs = self.store.list(&self.collection).await?;
            Ok(docs
                .into_iter()
                .map(|doc| SourceRecord {
                    id: doc.id,
                    fields: doc.data,
                })
                .collect())
        })
    }
}

/// How a record's identity key is derived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityKey {
    /// Lowercased, trimmed email.
    Email { source_field: String },
    /// `email|event_slug`, for event registrations.
    EmailEvent {
        email_field: String,
        event_field: String,
    },
    /// `email|Brand`, for newsletter signups (one row per brand list).
    EmailBrand {
        email_field: String,
        source_field: String,
    },
}

impl IdentityKey {
    pub fn email(source_field: &str) -> Self {
        IdentityKey::Email {
            source_field: source_field.to_string(),
        }
    }

    pub fn email_event(email_field: &str, event_field: &str) -> Self {
        IdentityKey::EmailEvent {
            email_field: email_field.to_string(),
            event_field: event_field.to_string(),
        }
    }

    pub fn email_brand(email_field: &str, source_field: &str) -> Self {
        IdentityKey::EmailBrand {
            email_field: email_field.to_string(),
            source_field: source_field.to_string(),
        }
    }

    /// Equality query (field, value) that finds destination candidates for `key`.
    pub fn lookup<'k>(&self, key: &'k str) -> (&'static str, &'k str) {
        match self {
            IdentityKey::Email { .. } => (EMAIL_FIELD, key),
            IdentityKey::EmailEvent { .. } => (REGISTRATION_KEY_FIELD, key),
            IdentityKey::EmailBrand { .. } => (
                EMAIL_FIELD,
                key.rsplit_once('|').map_or(key, |(email, _)| email),
            ),
        }
    }

    /// Key of a document already in the destination, normalized the same
    /// way as [`compute`](Self::compute).
    pub fn stored_key(&self, doc: &Document) -> Option<String> {
        match self {
            IdentityKey::Email { .. } => doc
                .get(EMAIL_FIELD)
                .and_then(Value::as_str)
                .and_then(normalize_email),
            IdentityKey::EmailEvent { .. } => doc
                .get(REGISTRATION_KEY_FIELD)
                .and_then(Value::as_str)
                .map(str::to_string),
            IdentityKey::EmailBrand { .. } => stored_signup_key(doc),
        }
    }

    fn email_source_field(&self) -> &str {
        match self {
            IdentityKey::Email { source_field } => source_field,
            IdentityKey::EmailEvent { email_field, .. } => email_field,
            IdentityKey::EmailBrand { email_field, .. } => email_field,
        }
    }

    fn brand(&self, fields: &Document) -> Option<EmailSource> {
        match self {
            IdentityKey::EmailBrand { source_field, .. } => {
                field_str(fields, source_field).and_then(EmailSource::parse_case_insensitive)
            }
            _ => None,
        }
    }

    /// Compute the key, or `None` if the record lacks the needed fields.
    pub fn compute(&self, fields: &Document) -> Option<String> {
        let email = field_str(fields, self.email_source_field()).and_then(normalize_email)?;
        match self {
            IdentityKey::Email { .. } => Some(email),
            IdentityKey::EmailEvent { event_field, .. } => {
                let slug = field_str(fields, event_field).and_then(event_slug)?;
                Some(format!("{}|{}", email, slug))
            }
            IdentityKey::EmailBrand { .. } => {
                let source = self.brand(fields)?;
                Some(EmailSignup::identity_key(&email, source))
            }
        }
    }

    fn describe_fields(&self) -> String {
        match self {
            IdentityKey::Email { source_field } => source_field.clone(),
            IdentityKey::EmailEvent {
                email_field,
                event_field,
            } => format!("{} + {}", email_field, event_field),
            IdentityKey::EmailBrand {
                email_field,
                source_field,
            } => format!("{} + {}", email_field, source_field),
        }
    }
}

/// How existing destination keys are looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupStrategy {
    /// One full collection read up front.
    FullScan,
    /// One equality query per record; for large destinations.
    PerRecordQuery,
}

/// What to migrate, where, and keyed how.
#[derive(Debug, Clone)]
pub struct MigrationPlan {
    /// Job name; also the checkpoint document id.
    pub job: String,
    pub collection: String,
    pub key: IdentityKey,
    pub dedup: DedupStrategy,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrationOptions {
    /// Skip records at or below the saved cursor.
    pub resume: bool,
    /// Compute the report without writing anything.
    pub dry_run: bool,
}

enum RecordOutcome {
    Migrated,
    Skipped,
}

/// Run a migration and report what happened.
///
/// Fails only if the source or the initial destination scan cannot be read.
pub async fn run_migration(
    source: &dyn RecordSource,
    dest: &dyn DocumentStore,
    plan: &MigrationPlan,
    options: MigrationOptions,
) -> Result<MigrationReport> {
    let provenance = source.describe();
    tracing::info!(
        job = %plan.job,
        source = %provenance,
        collection = %plan.collection,
        resume = options.resume,
        dry_run = options.dry_run,
        "Starting migration"
    );

    let records = source.fetch_all().await?;

    let mut existing: HashSet<String> = HashSet::new();
    if plan.dedup == DedupStrategy::FullScan {
        existing = dest
            .list(&plan.collection)
            .await?
            .iter()
            .filter_map(|doc| plan.key.stored_key(&doc.data))
            .collect();
        tracing::debug!(job = %plan.job, existing = existing.len(), "Loaded destination keys");
    }

    let checkpoint = if options.resume {
        load_checkpoint(dest, &plan.job).await?
    } else {
        None
    };

    let mut report = MigrationReport::default();
    let mut keyed = Vec::with_capacity(records.len());
    for record in records {
        match plan.key.compute(&record.fields) {
            Some(key) => keyed.push((key, record)),
            None => {
                tracing::warn!(job = %plan.job, record_id = %record.id, "Record has no identity key");
                report.record_error(format!(
                    "record {}: missing or invalid {}",
                    record.id,
                    plan.key.describe_fields()
                ));
            }
        }
    }
    // Stable: duplicates keep source order, the first one wins.
    keyed.sort_by(|a, b| a.0.cmp(&b.0));

    let mut cursor: Option<String> = None;
    let mut prefix_clean = true;
    let mut since_checkpoint = 0usize;

    for (key, record) in keyed {
        if checkpoint.as_ref().is_some_and(|cp| key <= cp.cursor) {
            report.checkpoint_skipped += 1;
            existing.insert(key);
            continue;
        }

        match migrate_record(dest, plan, &provenance, &key, &record, &mut existing, options).await {
            Ok(RecordOutcome::Migrated) => report.migrated += 1,
            Ok(RecordOutcome::Skipped) => report.skipped += 1,
            Err(e) => {
                tracing::warn!(
                    job = %plan.job,
                    record_id = %record.id,
                    key = %key,
                    error = %e,
                    "Failed to migrate record"
                );
                report.record_error(format!("record {} ({}): {}", record.id, key, e));
                prefix_clean = false;
            }
        }

        if prefix_clean {
            cursor = Some(key);
            since_checkpoint += 1;
            if since_checkpoint >= CHECKPOINT_INTERVAL && !options.dry_run {
                if let Some(cursor) = &cursor {
                    save_checkpoint(dest, &plan.job, cursor).await;
                }
                since_checkpoint = 0;
            }
        }
    }

    if !options.dry_run {
        if report.errored == 0 {
            match reset_checkpoint(dest, &plan.job).await {
                Ok(removed) => tracing::debug!(job = %plan.job, removed, "Cleared migration checkpoint"),
                Err(e) => tracing::warn!(job = %plan.job, error = %e, "Failed to clear migration checkpoint"),
            }
        } else if since_checkpoint > 0 {
            if let Some(cursor) = &cursor {
                save_checkpoint(dest, &plan.job, cursor).await;
            }
        }
    }

    tracing::info!(
        job = %plan.job,
        migrated = report.migrated,
        skipped = report.skipped,
        checkpoint_skipped = report.checkpoint_skipped,
        errored = report.errored,
        "Migration finished"
    );

    Ok(report)
}

async fn migrate_record(
    dest: &dyn DocumentStore,
    plan: &MigrationPlan,
    provenance: &str,
    key: &str,
    record: &SourceRecord,
    existing: &mut HashSet<String>,
    options: MigrationOptions,
) -> Result<RecordOutcome> {
    if existing.contains(key) {
        return Ok(RecordOutcome::Skipped);
    }

    if plan.dedup == DedupStrategy::PerRecordQuery {
        let (field, value) = plan.key.lookup(key);
        let found = dest
            .find_by_field(&plan.collection, field, value)
            .await?
            .iter()
            .any(|doc| plan.key.stored_key(&doc.data).as_deref() == Some(key));
        if found {
            existing.insert(key.to_string());
            return Ok(RecordOutcome::Skipped);
        }
    }

    let doc = build_destination_document(&plan.key, key, record, provenance);
    if !options.dry_run {
        dest.insert(&plan.collection, &doc).await?;
    }

    existing.insert(key.to_string());
    Ok(RecordOutcome::Migrated)
}

/// Source fields plus normalized identity and provenance.
fn build_destination_document(
    identity: &IdentityKey,
    key: &str,
    record: &SourceRecord,
    provenance: &str,
) -> Document {
    let mut doc = record.fields.clone();

    if let Some(email) = field_str(&record.fields, identity.email_source_field()).and_then(normalize_email) {
        doc.insert(EMAIL_FIELD.to_string(), Value::String(email));
    }
    match identity {
        IdentityKey::Email { .. } => {}
        IdentityKey::EmailEvent { .. } => {
            doc.insert(
                REGISTRATION_KEY_FIELD.to_string(),
                Value::String(key.to_string()),
            );
        }
        IdentityKey::EmailBrand { .. } => {
            if let Some(source) = identity.brand(&record.fields) {
                doc.insert(
                    SOURCE_FIELD.to_string(),
                    Value::String(source.as_str().to_string()),
                );
            }
        }
    }
    doc.insert(
        MIGRATED_FROM_FIELD.to_string(),
        Value::String(provenance.to_string()),
    );
    doc.insert(MIGRATED_AT_FIELD.to_string(), Value::String(now_rfc3339()));
    doc.insert(SOURCE_ID_FIELD.to_string(), Value::String(record.id.clone()));
    doc
}

/// Read the saved cursor for `job`, if any.
pub async fn load_checkpoint(
    store: &dyn DocumentStore,
    job: &str,
) -> Result<Option<MigrationCheckpoint>> {
    store
        .get(collections::MIGRATION_CHECKPOINTS, job)
        .await?
        .map(from_document)
        .transpose()
}

/// Checkpoint writes are best-effort: a lost cursor only costs a rescan.
async fn save_checkpoint(store: &dyn DocumentStore, job: &str, cursor: &str) {
    let checkpoint = MigrationCheckpoint {
        job: job.to_string(),
        cursor: cursor.to_string(),
        updated_at: now_rfc3339(),
    };

    let result = match to_document(&checkpoint) {
        Ok(doc) => store.set(collections::MIGRATION_CHECKPOINTS, job, &doc).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => tracing::debug!(job, cursor, "Saved migration checkpoint"),
        Err(e) => tracing::warn!(job, error = %e, "Failed to save migration checkpoint"),
    }
}

/// Forget the cursor so the next resumed run starts from the beginning.
pub async fn reset_checkpoint(store: &dyn DocumentStore, job: &str) -> Result<bool> {
    store.delete(collections::MIGRATION_CHECKPOINTS, job).await
}

/// `email|Brand` key of a stored signup, whichever path wrote it.
pub fn stored_signup_key(doc: &Document) -> Option<String> {
    let email = doc
        .get(EMAIL_FIELD)
        .and_then(Value::as_str)
        .and_then(normalize_email)?;
    let source = doc
        .get(SOURCE_FIELD)
        .and_then(Value::as_str)
        .and_then(EmailSource::parse_case_insensitive)?;
    Some(EmailSignup::identity_key(&email, source))
}

/// Lowercased, trimmed email; `None` if it cannot be an address.
pub fn normalize_email(raw: &str) -> Option<String> {
    let email = raw.trim().to_lowercase();
    let (local, domain) = email.split_once('@')?;
    if local.is_empty() || domain.is_empty() || email.chars().any(char::is_whitespace) {
        return None;
    }
    Some(email)
}

/// `"SA Tech Day 2025!"` -> `"sa-tech-day-2025"`.
pub fn event_slug(raw: &str) -> Option<String> {
    let mut slug = String::with_capacity(raw.len());
    for c in raw.trim().chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            slug.push(c);
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-').to_string();
    (!slug.is_empty()).then_some(slug)
}

/// String value of a field; Airtable lookups arrive as one-element arrays.
fn field_str<'a>(fields: &'a Document, name: &str) -> Option<&'a str> {
    match fields.get(name)? {
        Value::String(s) => Some(s.as_str()),
        Value::Array(items) => items.first().and_then(Value::as_str),
        _ => None,
    }
}
