// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Audit logging for security-sensitive operations.
//!
//! Registration, login attempts, key exports and signing are appended to the
//! `audit_log` table. Entries never contain passwords, tokens, ciphertext or
//! key material.

use chrono::{DateTime, Utc};
#[cfg(test)]
use redb::{ReadableDatabase, ReadableTable};
use serde::{Deserialize, Serialize};

use super::database::{Database, DbResult, AUDIT_LOG};

/// Types of auditable events.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    UserRegistered,
    AuthSuccess,
    AuthFailure,

    KeyExported,
    KeyExportDenied,
    KeyDecryptionFailed,

    TransactionSigned,
    TransactionBroadcast,
    BroadcastFailed,
}

/// An audit log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub event_type: AuditEventType,
    /// User who triggered the event (if known).
    pub user_id: Option<String>,
    /// Additional non-secret details.
    pub details: Option<serde_json::Value>,
    pub success: bool,
    pub error: Option<String>,
}

impl AuditEvent {
    pub fn new(event_type: AuditEventType) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event_type,
            user_id: None,
            details: None,
            success: true,
            error: None,
        }
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Mark as failed with error message.
    pub fn failed(mut self, error: impl Into<String>) -> Self {
        self.success = false;
        self.error = Some(error.into());
        self
    }

    fn key(&self) -> String {
        format!("{:020}-{}", self.timestamp.timestamp_millis().max(0), self.event_id)
    }
}

impl Database {
    pub fn append_audit(&self, event: &AuditEvent) -> DbResult<()> {
        let json = serde_json::to_vec(event)?;
        let key = event.key();

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(AUDIT_LOG)?;
            table.insert(key.as_str(), json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Append an event, logging instead of failing if the write does not go
    /// through. Audit writes never change the outcome of a request.
    pub fn record_audit(&self, event: AuditEvent) {
        if let Err(e) = self.append_audit(&event) {
            tracing::warn!(
                event_type = ?event.event_type,
                error = %e,
                "Failed to write audit event"
            );
        }
    }

    /// Events for one user, ordered by millisecond timestamp.
    #[cfg(test)]
    pub(crate) fn audit_events_for_user(&self, user_id: &str) -> DbResult<Vec<AuditEvent>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(AUDIT_LOG)?;

        let mut events = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            let event: AuditEvent = serde_json::from_slice(value.value())?;
            if event.user_id.as_deref() == Some(user_id) {
                events.push(event);
            }
        }
        Ok(events)
    }
}
