// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Integer quantities and their decimal rendering.

use alloy::primitives::U256;

use super::types::NATIVE_DECIMALS;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("value is empty")]
    Empty,

    #[error("value must be a non-negative integer")]
    NotAnInteger,

    #[error("value is too large")]
    Overflow,
}

/// Parse an unsigned integer written in decimal or as `0x`-prefixed hex.
///
/// Signs, fractions, exponents and whitespace inside the number are rejected.
pub fn parse_uint(raw: &str) -> Result<U256, AmountError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(AmountError::Empty);
    }

    let (digits, radix) = match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => (hex, 16u64),
        None => (raw, 10u64),
    };
    let valid = !digits.is_empty()
        && digits.chars().all(|c| match radix {
            16 => c.is_ascii_hexdigit(),
            _ => c.is_ascii_digit(),
        });
    if !valid {
        return Err(AmountError::NotAnInteger);
    }

    U256::from_str_radix(digits, radix).map_err(|_| AmountError::Overflow)
}

/// Render an integer amount with `decimals` implied decimal places.
///
/// The result is exact and always carries at least one fractional digit:
/// `0` → `"0.0"`, `1500000000000000000` (18 decimals) → `"1.5"`.
pub fn format_units(amount: U256, decimals: u8) -> String {
    let divisor = U256::from(10u64).pow(U256::from(decimals));
    let whole = amount / divisor;
    let remainder = amount % divisor;

    if remainder.is_zero() {
        return format!("{whole}.0");
    }
    let padded = format!("{:0>width$}", remainder.to_string(), width = decimals as usize);
    format!("{whole}.{}", padded.trim_end_matches('0'))
}

/// Render wei as ETH.
pub fn format_ether(wei: U256) -> String {
    format_units(wei, NATIVE_DECIMALS)
}
