// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Named migration jobs and their source/destination wiring.

use crate::config::Config;
use crate::db::{collections, DocumentStore};
use crate::error::{AppError, Result};
use crate::services::airtable::{AirtableClient, AirtableSource};
use crate::services::migration::{
    CollectionSource, DedupStrategy, IdentityKey, MigrationPlan, RecordSource,
};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

const EMAIL_SIGNUPS_TABLE: &str = "Email Signups";
const EVENT_REGISTRATIONS_TABLE: &str = "Event Registrations";
const LEGACY_CONTACTS: &str = "contacts";
const LEGACY_TEAM_MEMBERS: &str = "team_members";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationJob {
    EmailSignups,
    EventRegistrations,
    CrmContacts,
    TeamMembers,
}

impl MigrationJob {
    pub const ALL: [MigrationJob; 4] = [
        MigrationJob::EmailSignups,
        MigrationJob::EventRegistrations,
        MigrationJob::CrmContacts,
        MigrationJob::TeamMembers,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MigrationJob::EmailSignups => "email-signups",
            MigrationJob::EventRegistrations => "event-registrations",
            MigrationJob::CrmContacts => "crm-contacts",
            MigrationJob::TeamMembers => "team-members",
        }
    }

    pub fn plan(self) -> MigrationPlan {
        let (collection, key, dedup) = match self {
            // Same email|brand identity as the public signup endpoint.
            MigrationJob::EmailSignups => (
                collections::EMAIL_SIGNUPS,
                IdentityKey::email_brand("Email", "Source"),
                DedupStrategy::FullScan,
            ),
            // Large table; query per record instead of loading it all.
            MigrationJob::EventRegistrations => (
                collections::EVENT_REGISTRATIONS,
                IdentityKey::email_event("Email", "Event"),
                DedupStrategy::PerRecordQuery,
            ),
            MigrationJob::CrmContacts => (
                collections::CLIENTS,
                IdentityKey::email("email"),
                DedupStrategy::FullScan,
            ),
            MigrationJob::TeamMembers => (
                collections::TEAM_MEMBERS,
                IdentityKey::email("email"),
                DedupStrategy::FullScan,
            ),
        };

        MigrationPlan {
            job: self.name().to_string(),
            collection: collection.to_string(),
            key,
            dedup,
        }
    }

    /// Build the record source for this job.
    ///
    /// Fails with a 400 when the needed upstream is not configured.
    pub fn build_source(
        self,
        config: &Config,
        legacy_db: Option<Arc<dyn DocumentStore>>,
    ) -> Result<Box<dyn RecordSource>> {
        match self {
            MigrationJob::EmailSignups | MigrationJob::EventRegistrations => {
                let table = if self == MigrationJob::EmailSignups {
                    EMAIL_SIGNUPS_TABLE
                } else {
                    EVENT_REGISTRATIONS_TABLE
                };
                let client = AirtableClient::from_config(config)?;
                Ok(Box::new(AirtableSource::new(client, table)))
            }
            MigrationJob::CrmContacts | MigrationJob::TeamMembers => {
                let project = config.legacy_firestore_project_id.as_deref().ok_or_else(|| {
                    AppError::BadRequest("LEGACY_FIRESTORE_PROJECT_ID is not configured".into())
                })?;
                let store = legacy_db.ok_or_else(|| {
                    AppError::BadRequest("Legacy Firestore is not connected".into())
                })?;
                let collection = if self == MigrationJob::CrmContacts {
                    LEGACY_CONTACTS
                } else {
                    LEGACY_TEAM_MEMBERS
                };
                Ok(Box::new(CollectionSource::new(store, project, collection)))
            }
        }
    }
}

impl fmt::Display for MigrationJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MigrationJob {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|job| job.name() == s)
            .ok_or_else(|| AppError::NotFound(format!("migration job '{}'", s)))
    }
}
