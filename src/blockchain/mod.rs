// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Blockchain integration module for EVM chains (Ethereum Sepolia by default).
//!
//! This module provides functionality for:
//! - Querying native balances and account nonces over JSON-RPC
//! - Legacy EIP-155 transaction signing and broadcasting
//! - Reading account history from an Etherscan-compatible explorer

pub mod amount;
pub mod client;
pub mod explorer;
pub mod signing;
pub mod types;

pub use amount::{format_ether, parse_uint, AmountError};
pub use client::{ChainError, ChainGateway, RpcChainClient};
pub use explorer::{EtherscanClient, Explorer, ExplorerError, ExplorerResponse, ExplorerTransaction};
pub use signing::{SignedTransaction, SigningError, UnsignedEnvelope};
pub use types::*;
