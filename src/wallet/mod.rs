// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Custodial Wallet
//!
//! One secp256k1 key per user, generated at registration and stored only as a
//! vault blob. Keys are decrypted for the duration of a single operation
//! (signing or export) and never cached.

pub mod generator;
pub mod readers;
pub mod request;
pub mod signer;

pub use generator::{generate_wallet, Wallet};
pub use readers::{BalanceView, Direction, HistoryEntry, HistoryView, NO_TRANSACTIONS_MESSAGE};
pub use request::{NormalizedRequest, Quantity, TransactionRequest};
pub use signer::{SignOutcome, WalletService, WalletSettings};
