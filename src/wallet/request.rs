// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Transaction request schema and its normalization.

use std::str::FromStr;

use alloy::primitives::{Address, U256};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::blockchain::{parse_uint, AmountError, UnsignedEnvelope, DEFAULT_GAS_LIMIT};
use crate::error::WalletError;

/// A numeric field as sent by clients: a JSON integer, or a decimal or
/// `0x`-hex string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Quantity {
    Number(serde_json::Number),
    Text(String),
}

impl Quantity {
    fn to_u256(&self, field: &str) -> Result<U256, WalletError> {
        match self {
            Quantity::Number(n) => match n.as_u64() {
                Some(v) => Ok(U256::from(v)),
                None if n.as_i64().is_some() || n.as_f64().is_some_and(|f| f < 0.0) => {
                    Err(invalid(field, "must not be negative"))
                }
                None if n.as_f64().is_some_and(|f| f.fract() != 0.0) => {
                    Err(invalid(field, "must be an integer"))
                }
                None => Err(invalid(
                    field,
                    "exceeds 64 bits; send it as a decimal string",
                )),
            },
            Quantity::Text(s) => parse_uint(s).map_err(|e| match e {
                AmountError::Empty => invalid(field, "is empty"),
                AmountError::NotAnInteger => invalid(field, "must be a non-negative integer"),
                AmountError::Overflow => invalid(field, "is too large"),
            }),
        }
    }

    fn to_u64(&self, field: &str) -> Result<u64, WalletError> {
        let value = self.to_u256(field)?;
        u64::try_from(value).map_err(|_| invalid(field, "is too large"))
    }

    fn to_u128(&self, field: &str) -> Result<u128, WalletError> {
        let value = self.to_u256(field)?;
        u128::try_from(value).map_err(|_| invalid(field, "is too large"))
    }
}

fn invalid(field: &str, reason: &str) -> WalletError {
    WalletError::Validation(format!("Invalid {field}: {reason}"))
}

/// Body of `POST /sign_transaction`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct TransactionRequest {
    /// Destination address (0x + 40 hex digits)
    #[serde(default)]
    pub to: Option<String>,
    /// Amount in wei
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "1000000000000000000")]
    pub value: Option<Quantity>,
    /// Gas limit (default 21000)
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "21000")]
    pub gas: Option<Quantity>,
    /// Gas price in wei
    #[serde(default, rename = "gasPrice")]
    #[schema(value_type = Option<String>, example = "1000000000")]
    pub gas_price: Option<Quantity>,
    /// Account nonce; fetched from the node when absent
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub nonce: Option<Quantity>,
    /// Chain id (default: the configured network)
    #[serde(default, rename = "chainId")]
    #[schema(value_type = Option<String>, example = "11155111")]
    pub chain_id: Option<Quantity>,
    /// Submit to the network instead of returning the signed bytes
    #[serde(default)]
    pub broadcast: bool,
}

/// A validated request. Only the nonce may still be unresolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRequest {
    pub to: Address,
    pub value: U256,
    pub gas_limit: u64,
    pub gas_price: u128,
    pub nonce: Option<u64>,
    pub chain_id: u64,
    pub broadcast: bool,
}

impl NormalizedRequest {
    pub fn with_nonce(&self, nonce: u64) -> UnsignedEnvelope {
        UnsignedEnvelope {
            to: self.to,
            value: self.value,
            gas_limit: self.gas_limit,
            gas_price: self.gas_price,
            nonce,
            chain_id: self.chain_id,
        }
    }
}

impl TransactionRequest {
    /// Check required fields and coerce every number into its chain domain.
    pub fn normalize(&self, default_chain_id: u64) -> Result<NormalizedRequest, WalletError> {
        let to = self.to.as_deref().map(str::trim).filter(|s| !s.is_empty());

        let mut missing = Vec::new();
        if to.is_none() {
            missing.push("to");
        }
        if self.value.is_none() {
            missing.push("value");
        }
        if self.gas_price.is_none() {
            missing.push("gasPrice");
        }
        let (Some(to), Some(value), Some(gas_price)) = (to, &self.value, &self.gas_price) else {
            return Err(WalletError::Validation(format!(
                "Missing transaction parameters: {}",
                missing.join(", ")
            )));
        };

        let to = parse_address(to)?;
        let value = value.to_u256("value")?;
        let gas_price = gas_price.to_u128("gasPrice")?;
        let gas_limit = match &self.gas {
            Some(gas) => gas.to_u64("gas")?,
            None => DEFAULT_GAS_LIMIT,
        };
        if gas_limit == 0 {
            return Err(invalid("gas", "must be greater than zero"));
        }
        let nonce = self.nonce.as_ref().map(|n| n.to_u64("nonce")).transpose()?;
        let chain_id = match &self.chain_id {
            Some(id) => id.to_u64("chainId")?,
            None => default_chain_id,
        };
        if chain_id == 0 {
            return Err(invalid("chainId", "must be greater than zero"));
        }

        Ok(NormalizedRequest {
            to,
            value,
            gas_limit,
            gas_price,
            nonce,
            chain_id,
            broadcast: self.broadcast,
        })
    }
}

fn parse_address(raw: &str) -> Result<Address, WalletError> {
    let hex = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .ok_or_else(|| invalid("to", "must be a 0x-prefixed address"))?;
    if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid("to", "must be 20 bytes of hex"));
    }
    Address::from_str(hex).map_err(|_| invalid("to", "must be 20 bytes of hex"))
}
