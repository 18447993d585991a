// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Custodial wallet generation.

use k256::{ecdsa::SigningKey, elliptic_curve::rand_core::OsRng};
use zeroize::Zeroizing;

use crate::blockchain::signing::address_of;
use crate::storage::{KeyVault, VaultError};

/// A freshly generated wallet. The private key only exists as a vault blob.
#[derive(Debug, Clone)]
pub struct Wallet {
    /// EIP-55 checksummed address.
    pub address: String,
    pub encrypted_private_key: String,
}

/// Generate a secp256k1 keypair from the OS CSPRNG and seal the private key.
///
/// The plaintext scalar never leaves this function.
pub fn generate_wallet(vault: &KeyVault) -> Result<Wallet, VaultError> {
    let signing_key = SigningKey::random(&mut OsRng);
    let address = address_of(&signing_key).to_checksum(None);

    let key_bytes: Zeroizing<[u8; 32]> = Zeroizing::new(signing_key.to_bytes().into());
    let encrypted_private_key = vault.encrypt(key_bytes.as_slice())?;

    Ok(Wallet {
        address,
        encrypted_private_key,
    })
}
