// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Etherscan-compatible block explorer client (API v2, `account/txlist`).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

const HTTP_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, thiserror::Error)]
pub enum ExplorerError {
    #[error("explorer request failed: {0}")]
    Request(String),

    #[error("explorer returned HTTP {0}")]
    Status(u16),

    #[error("invalid explorer response: {0}")]
    InvalidResponse(String),
}

/// Envelope of every Etherscan response.
///
/// `status` is `"1"` on success. On `"0"` the `result` is either an empty list
/// or a human-readable reason (no data, rate limit, bad key).
#[derive(Debug, Clone, Deserialize)]
pub struct ExplorerResponse {
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub result: Value,
}

/// One entry of `account/txlist`. Etherscan encodes every number as a decimal string.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplorerTransaction {
    pub hash: String,
    pub from: String,
    #[serde(default)]
    pub to: String,
    pub value: String,
    #[serde(rename = "timeStamp")]
    pub timestamp: String,
    pub block_number: String,
    #[serde(default)]
    pub gas_used: String,
    #[serde(default)]
    pub gas_price: String,
    #[serde(default)]
    pub is_error: String,
}

impl ExplorerResponse {
    pub fn is_ok(&self) -> bool {
        self.status == "1"
    }

    /// Decode `result` as a transaction list.
    pub fn transactions(&self) -> Result<Vec<ExplorerTransaction>, ExplorerError> {
        serde_json::from_value(self.result.clone())
            .map_err(|e| ExplorerError::InvalidResponse(e.to_string()))
    }
}

/// Read access to an account's transaction history.
#[async_trait]
pub trait Explorer: Send + Sync {
    /// Up to `limit` normal transactions of `address`, ascending by block.
    async fn account_transactions(
        &self,
        address: &str,
        limit: u32,
    ) -> Result<ExplorerResponse, ExplorerError>;
}

pub struct EtherscanClient {
    http: Client,
    api_url: Url,
    api_key: SecretString,
    chain_id: u64,
}

impl EtherscanClient {
    pub fn new(api_url: Url, api_key: SecretString, chain_id: u64) -> Result<Self, ExplorerError> {
        let http = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| ExplorerError::Request(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            api_url,
            api_key,
            chain_id,
        })
    }
}

#[async_trait]
impl Explorer for EtherscanClient {
    async fn account_transactions(
        &self,
        address: &str,
        limit: u32,
    ) -> Result<ExplorerResponse, ExplorerError> {
        let chain_id = self.chain_id.to_string();
        let offset = limit.to_string();
        let response = self
            .http
            .get(self.api_url.clone())
            .query(&[
                ("chainid", chain_id.as_str()),
                ("module", "account"),
                ("action", "txlist"),
                ("address", address),
                ("startblock", "0"),
                ("endblock", "99999999"),
                ("page", "1"),
                ("offset", offset.as_str()),
                ("sort", "asc"),
                ("apikey", self.api_key.expose_secret()),
            ])
            .send()
            .await
            // The URL carries the API key; keep it out of the error.
            .map_err(|e| ExplorerError::Request(e.without_url().to_string()))?;

        if !response.status().is_success() {
            return Err(ExplorerError::Status(response.status().as_u16()));
        }

        response
            .json::<ExplorerResponse>()
            .await
            .map_err(|e| ExplorerError::InvalidResponse(e.without_url().to_string()))
    }
}
