// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Custodial wallet endpoints: address, balance and key export.

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::Auth;
use crate::error::ApiError;
use crate::state::AppState;
use crate::wallet::BalanceView;

#[derive(Debug, Serialize, ToSchema)]
pub struct WalletAddressResponse {
    pub address: String,
}

#[derive(Serialize, ToSchema)]
pub struct PrivateKeyResponse {
    /// 0x-prefixed hex private key
    pub private_key: String,
}

/// Address of the caller's wallet.
#[utoipa::path(
    get,
    path = "/wallet_address",
    tag = "Wallet",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Wallet address", body = WalletAddressResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User not found")
    )
)]
pub async fn wallet_address(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<WalletAddressResponse>, ApiError> {
    let address = state.wallet.wallet_address(&user.user_id)?;
    Ok(Json(WalletAddressResponse { address }))
}

/// Live native balance of the caller's wallet.
#[utoipa::path(
    get,
    path = "/balance",
    tag = "Wallet",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Balance in ETH and wei", body = BalanceView),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User not found"),
        (status = 502, description = "Chain node unavailable")
    )
)]
pub async fn balance(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<BalanceView>, ApiError> {
    Ok(Json(state.wallet.balance(&user.user_id).await?))
}

/// Export the caller's private key.
///
/// Custodial export: the plaintext key is returned to its authenticated owner.
/// Every call is audited; deployments can disable it with `KEY_EXPORT_ENABLED=false`.
#[utoipa::path(
    get,
    path = "/private_key",
    tag = "Wallet",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Plaintext private key", body = PrivateKeyResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Key export disabled"),
        (status = 404, description = "User not found"),
        (status = 500, description = "Could not decrypt private key")
    )
)]
pub async fn private_key(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<PrivateKeyResponse>, ApiError> {
    let key = state.wallet.export_key(&user.user_id)?;
    Ok(Json(PrivateKeyResponse {
        private_key: key.as_str().to_owned(),
    }))
}
