// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Blockchain types and constants.

/// EVM network configuration.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Chain ID
    pub chain_id: u64,
    /// RPC endpoint prefix; the Infura project id is appended
    pub rpc_url_base: &'static str,
    /// Etherscan-compatible API endpoint
    pub explorer_api_url: &'static str,
}

/// Ethereum Sepolia testnet configuration.
pub const SEPOLIA: NetworkConfig = NetworkConfig {
    chain_id: 11_155_111,
    rpc_url_base: "https://sepolia.infura.io/v3/",
    explorer_api_url: "https://api.etherscan.io/v2/api",
};

/// Gas limit of a plain value transfer.
pub const DEFAULT_GAS_LIMIT: u64 = 21_000;

/// Decimals of the native currency (1 ETH = 10^18 wei).
pub const NATIVE_DECIMALS: u8 = 18;
