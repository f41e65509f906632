// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin session model.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Which identity path issued a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum AuthProvider {
    Google,
    Firebase,
}

/// Admin role. Ordered from most to least restrictive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    CrmOnly,
    FullAdmin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::CrmOnly => "crm_only",
            Role::FullAdmin => "full_admin",
        }
    }
}

/// The only place a role is ever chosen.
pub fn get_role_for_provider(provider: AuthProvider) -> Role {
    match provider {
        AuthProvider::Google => Role::FullAdmin,
        AuthProvider::Firebase => Role::CrmOnly,
    }
}

/// Identity carried inside the session cookie.
///
/// `role` and `auth_provider` are optional on the wire so cookies written by
/// older deployments still decode; see [`SessionUser::effective_role`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_provider: Option<AuthProvider>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl SessionUser {
    /// Build a session identity, deriving the role from the provider.
    pub fn new(
        email: impl Into<String>,
        name: Option<String>,
        picture: Option<String>,
        provider: AuthProvider,
    ) -> Self {
        Self {
            email: email.into(),
            name,
            picture,
            auth_provider: Some(provider),
            role: Some(get_role_for_provider(provider)),
        }
    }

    /// Role used for authorization. Missing means `crm_only`.
    pub fn effective_role(&self) -> Role {
        self.role.unwrap_or_default()
    }

    /// False when both fields are present and disagree.
    pub fn is_consistent(&self) -> bool {
        match (self.auth_provider, self.role) {
            (Some(provider), Some(role)) => get_role_for_provider(provider) == role,
            _ => true,
        }
    }
}

/// Cookie payload: `{"user": {...}, "expiresAt": <epoch ms>}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user: SessionUser,
    pub expires_at: i64,
}

impl Session {
    pub fn is_expired_at(&self, now_millis: i64) -> bool {
        self.expires_at <= now_millis
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_for_provider() {
        assert_eq!(get_role_for_provider(AuthProvider::Google), Role::FullAdmin);
        assert_eq!(get_role_for_provider(AuthProvider::Firebase), Role::CrmOnly);
    }

    #[test]
    fn test_new_derives_role() {
        let user = SessionUser::new("a@434media.com", None, None, AuthProvider::Google);
        assert_eq!(user.role, Some(Role::FullAdmin));
        assert!(user.is_consistent());

        let user = SessionUser::new("b@gmail.com", None, None, AuthProvider::Firebase);
        assert_eq!(user.effective_role(), Role::CrmOnly);
    }

    #[test]
    fn test_missing_role_defaults_to_crm_only() {
        let user: SessionUser =
            serde_json::from_str(r#"{"email":"a@434media.com","authProvider":"google"}"#).unwrap();
        assert_eq!(user.role, None);
        assert_eq!(user.effective_role(), Role::CrmOnly);
        assert!(user.is_consistent());
    }

    #[test]
    fn test_inconsistent_role_detected() {
        let user: SessionUser = serde_json::from_str(
            r#"{"email":"a@gmail.com","authProvider":"firebase","role":"full_admin"}"#,
        )
        .unwrap();
        assert!(!user.is_consistent());
    }

    #[test]
    fn test_wire_format() {
        let session = Session {
            user: SessionUser::new(
                "a@434media.com",
                Some("A".to_string()),
                None,
                AuthProvider::Google,
            ),
            expires_at: 1_700_000_000_000,
        };
        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json["expiresAt"], 1_700_000_000_000i64);
        assert_eq!(json["user"]["authProvider"], "google");
        assert_eq!(json["user"]["role"], "full_admin");
        assert!(json["user"].get("picture").is_none());
    }
}
