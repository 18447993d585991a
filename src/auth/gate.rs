// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Credential gate: registration, login and session verification.
//!
//! Registration and login hash passwords with Argon2 and are CPU-bound;
//! async callers run them on the blocking pool.

use std::sync::Arc;

use serde_json::json;

use super::{
    password::{hash_password, verify_absent_user, verify_password},
    session::{IssuedToken, SessionManager},
    AuthError, AuthenticatedUser,
};
use crate::error::WalletError;
use crate::storage::{AuditEvent, AuditEventType, Database, DbError, KeyVault, NewUser};
use crate::wallet::generate_wallet;

pub const MISSING_REGISTRATION_FIELDS: &str = "Username, email and password are required";
pub const MISSING_LOGIN_FIELDS: &str = "Username and password are required";
pub const DUPLICATE_USER: &str = "User with that username or email already exists";
pub const INVALID_CREDENTIALS: &str = "Invalid username or password";

/// Outcome of a successful registration.
#[derive(Debug, Clone)]
pub struct Registration {
    pub user_id: String,
    pub address: String,
}

pub struct CredentialGate {
    db: Arc<Database>,
    vault: Arc<KeyVault>,
    sessions: SessionManager,
}

fn required(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

impl CredentialGate {
    pub fn new(db: Arc<Database>, vault: Arc<KeyVault>, sessions: SessionManager) -> Self {
        Self {
            db,
            vault,
            sessions,
        }
    }

    #[cfg(test)]
    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// Create a user with a fresh custodial wallet.
    ///
    /// The wallet is generated and sealed before the single directory write;
    /// if that write fails the wallet is simply discarded.
    pub fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<Registration, WalletError> {
        let (Some(username), Some(email)) = (required(username), required(email)) else {
            return Err(WalletError::Validation(MISSING_REGISTRATION_FIELDS.to_string()));
        };
        if password.is_empty() {
            return Err(WalletError::Validation(MISSING_REGISTRATION_FIELDS.to_string()));
        }

        let password_hash =
            hash_password(password).map_err(|e| WalletError::Internal(e.to_string()))?;
        let wallet = generate_wallet(&self.vault)
            .map_err(|e| WalletError::Internal(format!("wallet generation failed: {e}")))?;

        let record = self
            .db
            .create_user(NewUser {
                username: username.to_string(),
                email: email.to_string(),
                password_hash,
                address: wallet.address,
                encrypted_private_key: wallet.encrypted_private_key,
            })
            .map_err(|e| match e {
                DbError::Conflict(_) => WalletError::Conflict(DUPLICATE_USER.to_string()),
                other => WalletError::Internal(format!("user insert failed: {other}")),
            })?;

        tracing::info!(user_id = %record.id, address = %record.address, "User registered");
        self.db.record_audit(
            AuditEvent::new(AuditEventType::UserRegistered)
                .with_user(&record.id)
                .with_details(json!({ "address": record.address })),
        );

        Ok(Registration {
            user_id: record.id,
            address: record.address,
        })
    }

    /// Check credentials and issue a session token.
    ///
    /// Unknown users and wrong passwords fail identically.
    pub fn login(&self, username: &str, password: &str) -> Result<IssuedToken, WalletError> {
        let Some(username) = required(username) else {
            return Err(WalletError::Validation(MISSING_LOGIN_FIELDS.to_string()));
        };
        if password.is_empty() {
            return Err(WalletError::Validation(MISSING_LOGIN_FIELDS.to_string()));
        }

        let user = self
            .db
            .find_by_username(username)
            .map_err(|e| WalletError::Internal(format!("user lookup failed: {e}")))?;

        let verified = match &user {
            Some(user) => verify_password(password, &user.password_hash),
            None => verify_absent_user(password),
        };

        let user = match user {
            Some(user) if verified => user,
            other => {
                let mut event =
                    AuditEvent::new(AuditEventType::AuthFailure).failed("invalid credentials");
                if let Some(user) = other {
                    event = event.with_user(user.id);
                }
                self.db.record_audit(event);
                tracing::info!("Login rejected");
                return Err(WalletError::Unauthorized(INVALID_CREDENTIALS.to_string()));
            }
        };

        let issued = self.sessions.issue(&user.id)?;
        self.db
            .record_audit(AuditEvent::new(AuditEventType::AuthSuccess).with_user(&user.id));
        tracing::info!(user_id = %user.id, "Session issued");
        Ok(issued)
    }

    /// Stateless token check.
    pub fn verify(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        self.sessions.verify(token)
    }
}
