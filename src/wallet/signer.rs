// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signing engine and custodial key access.
//!
//! ## Signing Pipeline
//!
//! 1. Resolve the user record (`NotFound`)
//! 2. Validate and normalize the request (`Validation`)
//! 3. Decrypt the private key (`KeyUnavailable`)
//! 4. Resolve a missing nonce from the node (`UpstreamUnavailable`)
//! 5. Build and sign the legacy EIP-155 envelope
//! 6. Optionally broadcast (`BroadcastFailed`)
//!
//! The decrypted key lives in a `Zeroizing` buffer that is dropped as soon as
//! step 5 returns, on success and on every error path.

use std::{str::FromStr, sync::Arc};

use alloy::primitives::{Address, B256};
use serde_json::json;
use zeroize::Zeroizing;

use super::request::TransactionRequest;
use crate::blockchain::{
    signing::{key_to_hex, sign_legacy},
    ChainError, ChainGateway, Explorer, SignedTransaction, SigningError,
};
use crate::error::WalletError;
use crate::storage::{AuditEvent, AuditEventType, Database, KeyVault, UserRecord};

/// Deployment settings the wallet operations depend on.
#[derive(Debug, Clone)]
pub struct WalletSettings {
    pub default_chain_id: u64,
    pub history_page_size: u32,
    pub key_export_enabled: bool,
}

/// Result of a signing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignOutcome {
    /// Signed but not submitted.
    Signed(SignedTransaction),
    /// Submitted to the node, which accepted it into its pool.
    Broadcast { tx_hash: B256 },
}

/// Wallet operations on behalf of authenticated users.
///
/// All collaborators are injected at construction; nothing here holds
/// per-request state.
pub struct WalletService {
    pub(super) db: Arc<Database>,
    pub(super) vault: Arc<KeyVault>,
    pub(super) chain: Arc<dyn ChainGateway>,
    pub(super) explorer: Arc<dyn Explorer>,
    pub(super) settings: WalletSettings,
}

impl WalletService {
    pub fn new(
        db: Arc<Database>,
        vault: Arc<KeyVault>,
        chain: Arc<dyn ChainGateway>,
        explorer: Arc<dyn Explorer>,
        settings: WalletSettings,
    ) -> Self {
        Self {
            db,
            vault,
            chain,
            explorer,
            settings,
        }
    }

    pub(super) fn resolve_user(&self, user_id: &str) -> Result<UserRecord, WalletError> {
        self.db
            .get_user(user_id)
            .map_err(|e| WalletError::Internal(format!("user lookup failed: {e}")))?
            .ok_or(WalletError::NotFound)
    }

    pub(super) fn user_address(user: &UserRecord) -> Result<Address, WalletError> {
        Address::from_str(&user.address).map_err(|_| {
            WalletError::Internal(format!("stored address of user {} is malformed", user.id))
        })
    }

    /// Decrypt a user's key. Failures are integrity incidents: logged and
    /// audited with the user id only, reported with a fixed message.
    fn unseal_key(&self, user: &UserRecord) -> Result<Zeroizing<Vec<u8>>, WalletError> {
        self.vault
            .decrypt(&user.encrypted_private_key)
            .map_err(|_| self.key_unavailable(user))
    }

    fn key_unavailable(&self, user: &UserRecord) -> WalletError {
        tracing::error!(
            target: "integrity",
            user_id = %user.id,
            "Stored private key could not be recovered"
        );
        self.db.record_audit(
            AuditEvent::new(AuditEventType::KeyDecryptionFailed)
                .with_user(&user.id)
                .failed("private key unavailable"),
        );
        WalletError::KeyUnavailable
    }

    /// Build, sign and optionally broadcast a transaction from the user's wallet.
    pub async fn build_and_sign(
        &self,
        user_id: &str,
        request: &TransactionRequest,
    ) -> Result<SignOutcome, WalletError> {
        let user = self.resolve_user(user_id)?;
        let normalized = request.normalize(self.settings.default_chain_id)?;

        let key = self.unseal_key(&user)?;

        let nonce = match normalized.nonce {
            Some(nonce) => nonce,
            None => {
                let address = Self::user_address(&user)?;
                self.chain
                    .transaction_count(address)
                    .await
                    .map_err(|e| WalletError::UpstreamUnavailable(e.to_string()))?
            }
        };

        let envelope = normalized.with_nonce(nonce);
        let signed = match sign_legacy(&key, &envelope) {
            Ok(signed) => signed,
            Err(SigningError::InvalidKey) => return Err(self.key_unavailable(&user)),
            Err(SigningError::Signature(reason)) => {
                return Err(WalletError::Internal(format!("signing failed: {reason}")))
            }
        };
        drop(key);

        let details = json!({
            "to": format!("{:#x}", envelope.to),
            "chain_id": envelope.chain_id,
            "nonce": envelope.nonce,
            "tx_hash": signed.hash_hex(),
        });
        self.db.record_audit(
            AuditEvent::new(AuditEventType::TransactionSigned)
                .with_user(&user.id)
                .with_details(details.clone()),
        );

        if !normalized.broadcast {
            tracing::info!(user_id = %user.id, tx_hash = %signed.hash_hex(), "Transaction signed");
            return Ok(SignOutcome::Signed(signed));
        }

        match self.chain.send_raw_transaction(&signed.raw).await {
            Ok(tx_hash) => {
                tracing::info!(user_id = %user.id, tx_hash = %tx_hash, "Transaction broadcast");
                self.db.record_audit(
                    AuditEvent::new(AuditEventType::TransactionBroadcast)
                        .with_user(&user.id)
                        .with_details(details),
                );
                Ok(SignOutcome::Broadcast { tx_hash })
            }
            Err(e) => {
                let reason = match e {
                    ChainError::Rejected(message) | ChainError::Transport(message) => message,
                };
                tracing::warn!(user_id = %user.id, reason = %reason, "Broadcast failed");
                self.db.record_audit(
                    AuditEvent::new(AuditEventType::BroadcastFailed)
                        .with_user(&user.id)
                        .with_details(details)
                        .failed(reason.clone()),
                );
                Err(WalletError::BroadcastFailed(reason))
            }
        }
    }

    /// Return the user's private key as `0x`-prefixed hex.
    pub fn export_key(&self, user_id: &str) -> Result<Zeroizing<String>, WalletError> {
        if !self.settings.key_export_enabled {
            self.db.record_audit(
                AuditEvent::new(AuditEventType::KeyExportDenied)
                    .with_user(user_id)
                    .failed("key export disabled"),
            );
            return Err(WalletError::Forbidden(
                "Private key export is disabled".to_string(),
            ));
        }

        let user = self.resolve_user(user_id)?;
        let key = self.unseal_key(&user)?;
        let hex = key_to_hex(&key);

        tracing::warn!(user_id = %user.id, "Private key exported");
        self.db
            .record_audit(AuditEvent::new(AuditEventType::KeyExported).with_user(&user.id));
        Ok(hex)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{corrupt_key, register_user, wallet_fixture, ChainBehavior};
    use alloy::consensus::{transaction::SignerRecoverable, Transaction, TxEnvelope};
    use alloy::eips::eip2718::Decodable2718;
    use alloy::primitives::U256;
    use serde_json::json;

    fn request(body: serde_json::Value) -> TransactionRequest {
        serde_json::from_value(body).unwrap()
    }

    const TO: &str = "0x000000000000000000000000000000000000abcd";

    #[tokio::test]
    async fn signs_without_broadcasting() {
        let fx = wallet_fixture(ChainBehavior::default());
        let user = register_user(&fx, "alice");

        let outcome = fx
            .service
            .build_and_sign(
                &user.id,
                &request(json!({
                    "to": TO,
                    "value": 1_000_000_000_000_000_000u64,
                    "gasPrice": 1_000_000_000u64,
                    "nonce": 5,
                    "chainId": 11_155_111,
                    "broadcast": false
                })),
            )
            .await
            .unwrap();

        let SignOutcome::Signed(signed) = outcome else {
            panic!("expected a signed transaction");
        };
        assert!(signed.raw[0] >= 0xc0);
        assert_eq!(fx.chain.broadcasts(), 0);
        assert_eq!(fx.chain.nonce_queries(), 0);

        let decoded = TxEnvelope::decode_2718(&mut signed.raw.as_ref()).unwrap();
        assert_eq!(decoded.nonce(), 5);
        assert_eq!(decoded.value(), U256::from(1_000_000_000_000_000_000u64));
        assert_eq!(
            decoded.recover_signer().unwrap().to_checksum(None),
            user.address
        );
    }

    #[tokio::test]
    async fn same_request_signs_identically() {
        let fx = wallet_fixture(ChainBehavior::default());
        let user = register_user(&fx, "alice");
        let req = request(json!({"to": TO, "value": 1, "gasPrice": 1, "nonce": 0}));

        let a = fx.service.build_and_sign(&user.id, &req).await.unwrap();
        let b = fx.service.build_and_sign(&user.id, &req).await.unwrap();
        assert_eq!(a, b);

        let other = request(json!({"to": TO, "value": 1, "gasPrice": 1, "nonce": 1}));
        let c = fx.service.build_and_sign(&user.id, &other).await.unwrap();
        assert_ne!(a, c);
    }

    #[tokio::test]
    async fn missing_nonce_is_fetched_from_the_node() {
        let fx = wallet_fixture(ChainBehavior {
            nonce: 17,
            ..ChainBehavior::default()
        });
        let user = register_user(&fx, "alice");

        let outcome = fx
            .service
            .build_and_sign(&user.id, &request(json!({"to": TO, "value": 1, "gasPrice": 1})))
            .await
            .unwrap();

        let SignOutcome::Signed(signed) = outcome else {
            panic!("expected a signed transaction");
        };
        let decoded = TxEnvelope::decode_2718(&mut signed.raw.as_ref()).unwrap();
        assert_eq!(decoded.nonce(), 17);
        assert_eq!(decoded.gas_limit(), 21_000);
        assert_eq!(decoded.chain_id(), Some(11_155_111));
        assert_eq!(fx.chain.nonce_queries(), 1);
    }

    #[tokio::test]
    async fn nonce_lookup_failure_is_upstream_unavailable() {
        let fx = wallet_fixture(ChainBehavior {
            fail_rpc: true,
            ..ChainBehavior::default()
        });
        let user = register_user(&fx, "alice");

        let err = fx
            .service
            .build_and_sign(&user.id, &request(json!({"to": TO, "value": 1, "gasPrice": 1})))
            .await
            .unwrap_err();
        assert!(matches!(err, WalletError::UpstreamUnavailable(_)));
    }

    #[tokio::test]
    async fn broadcast_returns_node_hash() {
        let fx = wallet_fixture(ChainBehavior::default());
        let user = register_user(&fx, "alice");

        let outcome = fx
            .service
            .build_and_sign(
                &user.id,
                &request(json!({"to": TO, "value": "1", "gasPrice": "1", "nonce": "0", "broadcast": true})),
            )
            .await
            .unwrap();

        let SignOutcome::Broadcast { tx_hash } = outcome else {
            panic!("expected a broadcast");
        };
        assert_eq!(fx.chain.broadcasts(), 1);
        assert_eq!(Some(tx_hash), fx.chain.last_broadcast_hash());

        let events = fx.db.audit_events_for_user(&user.id).unwrap();
        assert!(events
            .iter()
            .any(|e| e.event_type == AuditEventType::TransactionBroadcast));
    }

    #[tokio::test]
    async fn node_rejection_is_broadcast_failed_with_reason() {
        let fx = wallet_fixture(ChainBehavior {
            reject_broadcast: Some("nonce too low".to_string()),
            ..ChainBehavior::default()
        });
        let user = register_user(&fx, "alice");

        let err = fx
            .service
            .build_and_sign(
                &user.id,
                &request(json!({"to": TO, "value": 1, "gasPrice": 1, "nonce": 0, "broadcast": true})),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, WalletError::BroadcastFailed(ref m) if m == "nonce too low"));
        assert_eq!(fx.chain.broadcasts(), 1);
    }

    #[tokio::test]
    async fn broadcast_network_error_is_broadcast_failed_not_upstream() {
        let fx = wallet_fixture(ChainBehavior {
            drop_broadcast: Some("connection reset by peer".to_string()),
            ..ChainBehavior::default()
        });
        let user = register_user(&fx, "alice");

        let err = fx
            .service
            .build_and_sign(
                &user.id,
                &request(json!({"to": TO, "value": 1, "gasPrice": 1, "nonce": 0, "broadcast": true})),
            )
            .await
            .unwrap_err();
        assert!(
            matches!(err, WalletError::BroadcastFailed(ref m) if m == "connection reset by peer"),
            "{err:?}"
        );
        assert_eq!(err.status_code(), axum::http::StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(fx.chain.broadcasts(), 1);

        let events = fx.db.audit_events_for_user(&user.id).unwrap();
        let failed = events
            .iter()
            .find(|e| e.event_type == AuditEventType::BroadcastFailed)
            .expect("broadcast failure audited");
        assert!(!failed.success);
        assert_eq!(failed.error.as_deref(), Some("connection reset by peer"));
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let fx = wallet_fixture(ChainBehavior::default());
        let err = fx
            .service
            .build_and_sign("ghost", &request(json!({"to": TO, "value": 1, "gasPrice": 1})))
            .await
            .unwrap_err();
        assert!(matches!(err, WalletError::NotFound));
    }

    #[tokio::test]
    async fn missing_fields_fail_before_touching_the_key() {
        let fx = wallet_fixture(ChainBehavior::default());
        let user = register_user(&fx, "alice");
        corrupt_key(&fx, &user);

        let err = fx
            .service
            .build_and_sign(&user.id, &request(json!({"to": TO})))
            .await
            .unwrap_err();
        assert!(matches!(err, WalletError::Validation(_)));
    }

    #[tokio::test]
    async fn corrupted_key_is_key_unavailable() {
        let fx = wallet_fixture(ChainBehavior::default());
        let user = register_user(&fx, "alice");
        corrupt_key(&fx, &user);

        let err = fx
            .service
            .build_and_sign(
                &user.id,
                &request(json!({"to": TO, "value": 1, "gasPrice": 1, "nonce": 0, "broadcast": true})),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, WalletError::KeyUnavailable));
        assert_eq!(fx.chain.broadcasts(), 0);

        let events = fx.db.audit_events_for_user(&user.id).unwrap();
        assert!(events
            .iter()
            .any(|e| e.event_type == AuditEventType::KeyDecryptionFailed));
    }

    #[test]
    fn export_returns_key_matching_address() {
        let fx = wallet_fixture(ChainBehavior::default());
        let user = register_user(&fx, "alice");

        let hex = fx.service.export_key(&user.id).unwrap();
        let bytes = alloy::hex::decode(hex.as_str()).unwrap();
        let signer = crate::blockchain::signing::signer_from_key_bytes(&bytes).unwrap();
        assert_eq!(signer.address().to_checksum(None), user.address);

        let events = fx.db.audit_events_for_user(&user.id).unwrap();
        assert!(events.iter().any(|e| e.event_type == AuditEventType::KeyExported));
    }

    #[test]
    fn export_of_corrupted_key_is_key_unavailable() {
        let fx = wallet_fixture(ChainBehavior::default());
        let user = register_user(&fx, "alice");
        corrupt_key(&fx, &user);

        assert!(matches!(
            fx.service.export_key(&user.id),
            Err(WalletError::KeyUnavailable)
        ));
    }

    #[test]
    fn export_can_be_disabled() {
        let mut fx = wallet_fixture(ChainBehavior::default());
        fx.rebuild_service(|settings| settings.key_export_enabled = false);
        let user = register_user(&fx, "alice");

        assert!(matches!(
            fx.service.export_key(&user.id),
            Err(WalletError::Forbidden(_))
        ));
    }
}
