// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JSON-RPC client for the configured EVM chain.

use alloy::{
    network::Ethereum,
    primitives::{Address, B256, U256},
    providers::{
        fillers::{BlobGasFiller, ChainIdFiller, FillProvider, GasFiller, JoinFill, NonceFiller},
        Identity, Provider, ProviderBuilder, RootProvider,
    },
};
use async_trait::async_trait;
use url::Url;

/// HTTP provider type (with the recommended fillers).
type HttpProvider = FillProvider<
    JoinFill<
        Identity,
        JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>,
    >,
    RootProvider<Ethereum>,
>;

/// Errors that can occur during blockchain operations.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    /// The node could not be reached or answered with something unusable.
    #[error("RPC error: {0}")]
    Transport(String),

    /// The node answered with a JSON-RPC error (e.g. nonce too low).
    #[error("{0}")]
    Rejected(String),
}

/// Node-side operations the wallet needs.
#[async_trait]
pub trait ChainGateway: Send + Sync {
    /// Latest block number, used as a reachability probe.
    async fn block_number(&self) -> Result<u64, ChainError>;

    /// Native balance in wei.
    async fn balance(&self, address: Address) -> Result<U256, ChainError>;

    /// Next nonce for the account, counting pending transactions.
    async fn transaction_count(&self, address: Address) -> Result<u64, ChainError>;

    /// Submit a signed, EIP-2718 encoded transaction.
    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<B256, ChainError>;
}

/// Replaces the endpoint in transport messages; the Infura project id is
/// part of the URL path.
const REDACTED_ENDPOINT: &str = "<rpc endpoint>";

/// Chain client backed by an alloy HTTP provider.
pub struct RpcChainClient {
    provider: HttpProvider,
    rpc_url: Url,
}

impl RpcChainClient {
    pub fn new(rpc_url: Url) -> Self {
        let provider = ProviderBuilder::new().connect_http(rpc_url.clone());
        Self { provider, rpc_url }
    }

    /// Transport error text with the configured endpoint removed.
    fn transport_error(&self, error: impl std::fmt::Display) -> ChainError {
        let mut message = error.to_string().replace(self.rpc_url.as_str(), REDACTED_ENDPOINT);
        let path = self.rpc_url.path();
        if path.len() > 1 {
            message = message.replace(path, REDACTED_ENDPOINT);
        }
        if let Some(query) = self.rpc_url.query() {
            message = message.replace(query, REDACTED_ENDPOINT);
        }
        ChainError::Transport(message)
    }
}

#[async_trait]
impl ChainGateway for RpcChainClient {
    async fn block_number(&self) -> Result<u64, ChainError> {
        self.provider
            .get_block_number()
            .await
            .map_err(|e| self.transport_error(e))
    }

    async fn balance(&self, address: Address) -> Result<U256, ChainError> {
        self.provider
            .get_balance(address)
            .await
            .map_err(|e| self.transport_error(e))
    }

    async fn transaction_count(&self, address: Address) -> Result<u64, ChainError> {
        self.provider
            .get_transaction_count(address)
            .pending()
            .await
            .map_err(|e| self.transport_error(e))
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<B256, ChainError> {
        let pending = self
            .provider
            .send_raw_transaction(raw)
            .await
            .map_err(|e| match e.as_error_resp() {
                Some(payload) => ChainError::Rejected(payload.message.to_string()),
                None => self.transport_error(&e),
            })?;
        Ok(*pending.tx_hash())
    }
}
