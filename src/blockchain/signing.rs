// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Transaction signing for EVM chains.
//!
//! Stored keys are raw 32-byte secp256k1 scalars. Transactions are legacy
//! EIP-155 envelopes: the RLP list `[nonce, gasPrice, gas, to, value, data,
//! v, r, s]` with the chain id folded into `v`. k256 signs deterministically
//! (RFC 6979), so the same envelope and key always produce the same bytes.

use alloy::{
    consensus::{SignableTransaction, TxEnvelope, TxLegacy},
    eips::eip2718::Encodable2718,
    hex,
    network::TxSignerSync,
    primitives::{keccak256, Address, Bytes, TxKind, B256, U256},
    signers::local::PrivateKeySigner,
};
use k256::ecdsa::SigningKey;
use zeroize::Zeroizing;

#[derive(Debug, thiserror::Error)]
pub enum SigningError {
    /// The key bytes are not a valid secp256k1 scalar. No key material is included.
    #[error("invalid private key")]
    InvalidKey,

    #[error("signing failed: {0}")]
    Signature(String),
}

/// Fully resolved transaction fields, in signing order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedEnvelope {
    pub to: Address,
    pub value: U256,
    pub gas_limit: u64,
    pub gas_price: u128,
    pub nonce: u64,
    pub chain_id: u64,
}

/// A signed, network-encoded transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    /// EIP-2718 encoding; for legacy transactions this is the bare RLP list.
    pub raw: Bytes,
    pub tx_hash: B256,
}

impl SignedTransaction {
    pub fn raw_hex(&self) -> String {
        hex::encode_prefixed(&self.raw)
    }

    pub fn hash_hex(&self) -> String {
        format!("{:#x}", self.tx_hash)
    }
}

/// Derive the EVM address of a secp256k1 key: the last 20 bytes of the
/// Keccak-256 hash of the uncompressed public key without its `0x04` tag.
pub fn address_of(signing_key: &SigningKey) -> Address {
    let public_key = signing_key.verifying_key().to_encoded_point(false);
    let hash = keccak256(&public_key.as_bytes()[1..]);
    Address::from_slice(&hash[12..])
}

pub fn signer_from_key_bytes(key_bytes: &[u8]) -> Result<PrivateKeySigner, SigningError> {
    PrivateKeySigner::from_slice(key_bytes).map_err(|_| SigningError::InvalidKey)
}

/// `0x`-prefixed hex of a raw private key, wiped on drop.
pub fn key_to_hex(key_bytes: &[u8]) -> Zeroizing<String> {
    Zeroizing::new(hex::encode_prefixed(key_bytes))
}

/// Sign a legacy EIP-155 transaction with a raw private key.
pub fn sign_legacy(
    key_bytes: &[u8],
    envelope: &UnsignedEnvelope,
) -> Result<SignedTransaction, SigningError> {
    let signer = signer_from_key_bytes(key_bytes)?;

    let mut tx = TxLegacy {
        chain_id: Some(envelope.chain_id),
        nonce: envelope.nonce,
        gas_price: envelope.gas_price,
        gas_limit: envelope.gas_limit,
        to: TxKind::Call(envelope.to),
        value: envelope.value,
        input: Bytes::new(),
    };

    let signature = signer
        .sign_transaction_sync(&mut tx)
        .map_err(|e| SigningError::Signature(e.to_string()))?;

    let signed = TxEnvelope::from(tx.into_signed(signature));
    Ok(SignedTransaction {
        raw: Bytes::from(signed.encoded_2718()),
        tx_hash: *signed.tx_hash(),
    })
}
