// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Custodial Wallet Server - Custodial EVM Wallet Service
//!
//! Registers users, generates one secp256k1 key per user, keeps it sealed
//! under a server-wide AES-256-GCM key, and signs (optionally broadcasts)
//! legacy transactions on the user's behalf.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Password login and HS256 session tokens
//! - `blockchain` - Signing, JSON-RPC node and explorer clients
//! - `storage` - User directory (redb), audit log and key vault
//! - `wallet` - Key generation, signing engine and account readers

pub mod api;
pub mod auth;
pub mod blockchain;
pub mod config;
pub mod error;
pub mod state;
pub mod storage;
pub mod wallet;

#[cfg(test)]
pub(crate) mod testing;
