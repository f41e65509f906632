// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod crm;
pub mod migration;
pub mod section;
pub mod session;

pub use crm::{Client, ContactForm, EmailSignup, EmailSource, TeamMember};
pub use migration::{MigrationCheckpoint, MigrationReport, SourceRecord};
pub use section::{can_access_path, can_access_section, AdminSection, ADMIN_SECTIONS};
pub use session::{get_role_for_provider, AuthProvider, Role, Session, SessionUser};
