// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Balance and history readers. Always live; nothing is cached.

use serde::Serialize;
use utoipa::ToSchema;

use super::signer::WalletService;
use crate::blockchain::{format_ether, parse_uint, ExplorerTransaction};
use crate::error::WalletError;

pub const NO_TRANSACTIONS_MESSAGE: &str = "No transactions found for this address";

/// Native balance of the user's wallet.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BalanceView {
    pub address: String,
    /// Balance in ETH, exact, with at least one fractional digit
    #[schema(example = "0.0")]
    pub balance: String,
    /// Balance in wei
    #[schema(example = "0")]
    pub balance_wei: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Incoming,
    Outgoing,
}

impl Direction {
    /// Outgoing when the sender is the wallet itself (case-insensitive).
    pub fn classify(from: &str, wallet_address: &str) -> Self {
        if from.eq_ignore_ascii_case(wallet_address) {
            Direction::Outgoing
        } else {
            Direction::Incoming
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HistoryEntry {
    pub hash: String,
    pub from: String,
    pub to: String,
    pub value_wei: String,
    pub value_eth: String,
    /// Unix seconds
    pub timestamp: u64,
    pub block_number: u64,
    pub gas_used: String,
    pub gas_price: String,
    pub is_error: bool,
    pub direction: Direction,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HistoryView {
    pub transactions: Vec<HistoryEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl HistoryEntry {
    fn from_explorer(tx: ExplorerTransaction, wallet_address: &str) -> Result<Self, WalletError> {
        let malformed =
            |field: &str| WalletError::HistoryUnavailable(format!("explorer returned a malformed {field}"));

        let value = parse_uint(&tx.value).map_err(|_| malformed("value"))?;
        let timestamp = tx.timestamp.trim().parse::<u64>().map_err(|_| malformed("timeStamp"))?;
        let block_number = tx
            .block_number
            .trim()
            .parse::<u64>()
            .map_err(|_| malformed("blockNumber"))?;

        Ok(Self {
            direction: Direction::classify(&tx.from, wallet_address),
            value_eth: format_ether(value),
            value_wei: value.to_string(),
            timestamp,
            block_number,
            is_error: tx.is_error == "1",
            hash: tx.hash,
            from: tx.from,
            to: tx.to,
            gas_used: tx.gas_used,
            gas_price: tx.gas_price,
        })
    }
}

impl WalletService {
    pub fn wallet_address(&self, user_id: &str) -> Result<String, WalletError> {
        Ok(self.resolve_user(user_id)?.address)
    }

    pub async fn balance(&self, user_id: &str) -> Result<BalanceView, WalletError> {
        let user = self.resolve_user(user_id)?;
        let address = Self::user_address(&user)?;

        let wei = self
            .chain
            .balance(address)
            .await
            .map_err(|e| WalletError::UpstreamUnavailable(e.to_string()))?;

        Ok(BalanceView {
            address: user.address,
            balance: format_ether(wei),
            balance_wei: wei.to_string(),
        })
    }

    /// Transactions of the user's wallet in the explorer's (ascending block) order.
    pub async fn history(&self, user_id: &str) -> Result<HistoryView, WalletError> {
        let user = self.resolve_user(user_id)?;

        let response = self
            .explorer
            .account_transactions(&user.address, self.settings.history_page_size)
            .await
            .map_err(|e| WalletError::HistoryUnavailable(e.to_string()))?;

        if !response.is_ok() {
            // Etherscan reports both "no data" and rate limiting this way.
            tracing::debug!(
                user_id = %user.id,
                explorer_message = %response.message,
                "Explorer returned no transactions"
            );
            return Ok(HistoryView {
                transactions: Vec::new(),
                message: Some(NO_TRANSACTIONS_MESSAGE.to_string()),
            });
        }

        let transactions = response
            .transactions()
            .map_err(|e| WalletError::HistoryUnavailable(e.to_string()))?
            .into_iter()
            .map(|tx| HistoryEntry::from_explorer(tx, &user.address))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(HistoryView {
            transactions,
            message: None,
        })
    }
}
