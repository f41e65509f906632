// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Read-only Airtable client used as a migration source.

use crate::config::Config;
use crate::db::Document;
use crate::error::{AppError, Result};
use crate::models::SourceRecord;
use crate::services::migration::RecordSource;
use anyhow::Context;
use futures_util::future::BoxFuture;
use serde::Deserialize;
use std::time::Duration;

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);
/// Airtable's maximum page size.
const PAGE_SIZE: &str = "100";

#[derive(Debug, Deserialize)]
struct ListRecordsResponse {
    records: Vec<AirtableRecord>,
    #[serde(default)]
    offset: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AirtableRecord {
    id: String,
    #[serde(default)]
    fields: Document,
}

/// Airtable REST client for one base.
#[derive(Clone)]
pub struct AirtableClient {
    http: reqwest::Client,
    api_url: String,
    base_id: String,
    api_key: String,
}

impl AirtableClient {
    pub fn new(api_url: &str, base_id: &str, api_key: &str) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .context("failed building Airtable HTTP client")?;

        Ok(Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            base_id: base_id.to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Build from config; fails if the base or key is not configured.
    pub fn from_config(config: &Config) -> Result<Self> {
        let base_id = config
            .airtable_base_id
            .as_deref()
            .ok_or_else(|| AppError::BadRequest("AIRTABLE_BASE_ID is not configured".into()))?;
        let api_key = config
            .airtable_api_key
            .as_deref()
            .ok_or_else(|| AppError::BadRequest("AIRTABLE_API_KEY is not configured".into()))?;

        Ok(Self::new(&config.airtable_api_url, base_id, api_key)?)
    }

    pub fn base_id(&self) -> &str {
        &self.base_id
    }

    /// Fetch every record of `table`, following pagination offsets.
    pub async fn list_all(&self, table: &str) -> Result<Vec<SourceRecord>> {
        let url = format!(
            "{}/{}/{}",
            self.api_url,
            self.base_id,
            urlencoding::encode(table)
        );

        let mut records = Vec::new();
        let mut offset: Option<String> = None;

        loop {
            let mut query = vec![("pageSize", PAGE_SIZE.to_string())];
            if let Some(offset) = &offset {
                query.push(("offset", offset.clone()));
            }

            let response = self
                .http
                .get(&url)
                .bearer_auth(&self.api_key)
                .query(&query)
                .send()
                .await
                .map_err(|e| AppError::Upstream(format!("Airtable request failed: {}", e)))?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                return Err(AppError::Upstream(format!(
                    "Airtable list of '{}' failed: HTTP {}: {}",
                    table, status, body
                )));
            }

            let page: ListRecordsResponse = response.json().await.map_err(|e| {
                AppError::Upstream(format!("Airtable returned invalid JSON: {}", e))
            })?;

            tracing::debug!(table, count = page.records.len(), "Fetched Airtable page");
            records.extend(page.records.into_iter().map(|r| SourceRecord {
                id: r.id,
                fields: r.fields,
            }));

            match page.offset {
                Some(next) => offset = Some(next),
                None => break,
            }
        }

        Ok(records)
    }
}

/// One Airtable table as a migration source.
pub struct AirtableSource {
    client: AirtableClient,
    table: String,
}

impl AirtableSource {
    pub fn new(client: AirtableClient, table: &str) -> Self {
        Self {
            client,
            table: table.to_string(),
        }
    }
}

impl RecordSource for AirtableSource {
    fn describe(&self) -> String {
        format!("airtable:{}/{}", self.client.base_id(), self.table)
    }

    fn fetch_all(&self) -> BoxFuture<'_, Result<Vec<SourceRecord>>> {
        Box::pin(self.client.list_all(&self.table))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_requires_key() {
        let mut config = Config::test_default();
        config.airtable_api_key = None;
        assert!(matches!(
            AirtableClient::from_config(&config),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_source_describe() {
        let client = AirtableClient::from_config(&Config::test_default()).unwrap();
        let source = AirtableSource::new(client, "Email Signups");
        assert_eq!(source.describe(), "airtable:appTestBase/Email Signups");
    }

    #[tokio::test]
    async fn test_unreachable_is_upstream_error() {
        let client = AirtableClient::from_config(&Config::test_default()).unwrap();
        let err = client.list_all("Email Signups").await.unwrap_err();
        assert!(matches!(err, AppError::Upstream(_)));
    }
}
