// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Module
//!
//! Persistent state of the service:
//!
//! - [`Database`]: embedded redb file holding user records, their uniqueness
//!   indexes and the audit log
//! - [`KeyVault`]: AES-256-GCM encryption of private keys before they reach
//!   the database
//!
//! ## Storage Layout
//!
//! ```text
//! $DATABASE_URL (redb)
//!   users            user_id -> UserRecord (JSON)
//!   username_index   username -> user_id
//!   email_index      lowercase email -> user_id
//!   audit_log        {millis}-{event_id} -> AuditEvent (JSON)
//! ```
//!
//! Private keys only ever appear in the database as vault blobs.

pub mod audit;
pub mod database;
pub mod users;
pub mod vault;

pub use audit::{AuditEvent, AuditEventType};
pub use database::{Database, DbError, DbResult};
pub use users::{NewUser, UserRecord};
pub use vault::{KeyVault, VaultError};
