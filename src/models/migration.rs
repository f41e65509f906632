// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Migration records, reports and checkpoints.

use crate::db::Document;
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Field naming the store a record was migrated from.
pub const MIGRATED_FROM_FIELD: &str = "_migrated_from";
/// Field holding the RFC3339 migration timestamp.
pub const MIGRATED_AT_FIELD: &str = "_migrated_at";
/// Field holding the record's id in the source store.
pub const SOURCE_ID_FIELD: &str = "_source_id";

/// A record read from a source store.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRecord {
    pub id: String,
    pub fields: Document,
}

/// Outcome of one migration run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MigrationReport {
    pub migrated: u32,
    /// Already present in the destination (or earlier in the run).
    pub skipped: u32,
    /// At or below the resume cursor; not checked against the destination.
    #[serde(default)]
    pub checkpoint_skipped: u32,
    pub errored: u32,
    pub errors: Vec<String>,
}

impl MigrationReport {
    /// Number of source records accounted for.
    pub fn total(&self) -> u32 {
        self.migrated + self.skipped + self.checkpoint_skipped + self.errored
    }

    pub fn record_error(&mut self, message: String) {
        self.errored += 1;
        self.errors.push(message);
    }
}

/// Persisted resume point for a migration job.
///
/// `cursor` is the identity key of the last record in the contiguous
/// successfully-processed prefix (records run in ascending key order).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationCheckpoint {
    pub job: String,
    pub cursor: String,
    pub updated_at: String,
}
