// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! CRM documents stored in Firestore.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A client/prospect tracked in the CRM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    /// Pipeline status ("lead", "active", ...)
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Someone allowed into the CRM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamMember {
    /// Lowercased email (identity key)
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
    pub role: String,
    /// "firebase_auth" when auto-provisioned at login
    pub source: String,
    pub created_at: String,
}

/// Newsletter signup coming from one of the brand sites.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailSignup {
    pub email: String,
    pub source: EmailSource,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: String,
}

impl EmailSignup {
    /// Dedup key of a signup: one row per email per brand list.
    pub fn identity_key(email: &str, source: EmailSource) -> String {
        format!("{}|{}", email, source.as_str())
    }
}

/// Contact form submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    pub message: String,
    pub source: String,
    pub created_at: String,
}

/// Brand site an email signup originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EmailSource {
    #[serde(rename = "434Media")]
    Media434,
    #[serde(rename = "AIM")]
    Aim,
    #[serde(rename = "DevSA")]
    DevSa,
    #[serde(rename = "DigitalCanvas")]
    DigitalCanvas,
    #[serde(rename = "SATechDay")]
    SaTechDay,
    #[serde(rename = "TXMX")]
    Txmx,
    #[serde(rename = "VemosVamos")]
    VemosVamos,
}

impl EmailSource {
    pub const ALL: [EmailSource; 7] = [
        EmailSource::Media434,
        EmailSource::Aim,
        EmailSource::DevSa,
        EmailSource::DigitalCanvas,
        EmailSource::SaTechDay,
        EmailSource::Txmx,
        EmailSource::VemosVamos,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EmailSource::Media434 => "434Media",
            EmailSource::Aim => "AIM",
            EmailSource::DevSa => "DevSA",
            EmailSource::DigitalCanvas => "DigitalCanvas",
            EmailSource::SaTechDay => "SATechDay",
            EmailSource::Txmx => "TXMX",
            EmailSource::VemosVamos => "VemosVamos",
        }
    }

    /// Lenient match for imported data ("devsa", " AIM ").
    pub fn parse_case_insensitive(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|source| source.as_str().eq_ignore_ascii_case(s))
    }

    /// Comma-separated list for error messages.
    pub fn valid_list() -> String {
        Self::ALL
            .iter()
            .map(|source| source.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for EmailSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmailSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|source| source.as_str() == s.trim())
            .ok_or_else(|| {
                format!(
                    "Invalid source '{}'. Valid sources: {}",
                    s,
                    Self::valid_list()
                )
            })
    }
}
