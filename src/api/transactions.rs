// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Transaction signing and history endpoints.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use super::json_body;
use crate::auth::Auth;
use crate::error::ApiError;
use crate::state::AppState;
use crate::wallet::{HistoryView, SignOutcome, TransactionRequest};

/// Response for POST /sign_transaction.
///
/// Without broadcast: `signed_tx` and `tx_hash`. With broadcast: `tx_hash`
/// and `broadcast: true`.
#[derive(Debug, Serialize, ToSchema)]
pub struct SignTransactionResponse {
    /// 0x-prefixed raw signed transaction (RLP)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signed_tx: Option<String>,
    pub tx_hash: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub broadcast: bool,
}

impl From<SignOutcome> for SignTransactionResponse {
    fn from(outcome: SignOutcome) -> Self {
        match outcome {
            SignOutcome::Signed(signed) => Self {
                signed_tx: Some(signed.raw_hex()),
                tx_hash: signed.hash_hex(),
                broadcast: false,
            },
            SignOutcome::Broadcast { tx_hash } => Self {
                signed_tx: None,
                tx_hash: format!("{tx_hash:#x}"),
                broadcast: true,
            },
        }
    }
}

/// Sign a transaction with the caller's custodial key, optionally broadcasting it.
#[utoipa::path(
    post,
    path = "/sign_transaction",
    tag = "Transactions",
    security(("bearer_auth" = [])),
    request_body = TransactionRequest,
    responses(
        (status = 200, description = "Signed or broadcast transaction", body = SignTransactionResponse),
        (status = 400, description = "Invalid transaction parameters"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User not found"),
        (status = 500, description = "Key unavailable or broadcast failed"),
        (status = 502, description = "Chain node unavailable")
    )
)]
pub async fn sign_transaction(
    Auth(user): Auth,
    State(state): State<AppState>,
    payload: Result<Json<TransactionRequest>, JsonRejection>,
) -> Result<Json<SignTransactionResponse>, ApiError> {
    let request = json_body(payload)?;
    let outcome = state.wallet.build_and_sign(&user.user_id, &request).await?;
    Ok(Json(outcome.into()))
}

/// Transaction history of the caller's wallet, ascending by block.
#[utoipa::path(
    get,
    path = "/transaction_history",
    tag = "Transactions",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Transactions (possibly empty, with a message)", body = HistoryView),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User not found"),
        (status = 502, description = "Explorer unavailable")
    )
)]
pub async fn transaction_history(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<HistoryView>, ApiError> {
    Ok(Json(state.wallet.history(&user.user_id).await?))
}
