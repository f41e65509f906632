// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin panel sections and the role table that guards them.

use crate::models::session::{Role, SessionUser};
use serde::{Deserialize, Serialize};

/// Landing page; any valid session may see it.
pub const ADMIN_ROOT: &str = "/admin";

/// A top-level area of the admin panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AdminSection {
    Dashboard,
    Crm,
    Analytics,
    Blog,
    Events,
    EmailLists,
    /// Data migrations and imports.
    Data,
}

/// Every section, in navigation order.
pub const ADMIN_SECTIONS: [AdminSection; 7] = [
    AdminSection::Dashboard,
    AdminSection::Crm,
    AdminSection::Analytics,
    AdminSection::Blog,
    AdminSection::Events,
    AdminSection::EmailLists,
    AdminSection::Data,
];

impl AdminSection {
    /// Roles permitted to use this section.
    pub fn roles(self) -> &'static [Role] {
        match self {
            AdminSection::Dashboard | AdminSection::Crm => &[Role::FullAdmin, Role::CrmOnly],
            AdminSection::Analytics
            | AdminSection::Blog
            | AdminSection::Events
            | AdminSection::EmailLists
            | AdminSection::Data => &[Role::FullAdmin],
        }
    }

    /// Path prefix of the section's pages.
    pub fn path(self) -> &'static str {
        match self {
            AdminSection::Dashboard => "/admin/dashboard",
            AdminSection::Crm => "/admin/crm",
            AdminSection::Analytics => "/admin/analytics",
            AdminSection::Blog => "/admin/blog",
            AdminSection::Events => "/admin/events",
            AdminSection::EmailLists => "/admin/email-lists",
            AdminSection::Data => "/admin/data",
        }
    }

    /// Section owning `path`, matched on whole path segments.
    pub fn for_path(path: &str) -> Option<Self> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let path = path.trim_end_matches('/');

        ADMIN_SECTIONS.into_iter().find(|section| {
            let prefix = section.path();
            path == prefix
                || path
                    .strip_prefix(prefix)
                    .is_some_and(|rest| rest.starts_with('/'))
        })
    }
}

pub fn can_access_section(user: &SessionUser, section: AdminSection) -> bool {
    section.roles().contains(&user.effective_role())
}

/// Path-level check used by the admin UI.
///
/// The bare `/admin` landing page is open to every session; other paths
/// outside the section table are denied.
pub fn can_access_path(user: &SessionUser, path: &str) -> bool {
    if let Some(section) = AdminSection::for_path(path) {
        return can_access_section(user, section);
    }

    let bare = path.split(['?', '#']).next().unwrap_or_default();
    bare.trim_end_matches('/') == ADMIN_ROOT
}
