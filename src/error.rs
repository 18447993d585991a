// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Message returned for every vault decryption failure.
///
/// Fixed so callers cannot distinguish corrupt ciphertext from a wrong key.
pub const KEY_UNAVAILABLE_MESSAGE: &str = "Could not decrypt private key";

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

/// Operation-level failure taxonomy shared by the gate, the signing engine
/// and the readers.
#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    /// Malformed or missing input.
    #[error("{0}")]
    Validation(String),

    /// Username or email already registered.
    #[error("{0}")]
    Conflict(String),

    /// Bad credentials or session token.
    #[error("{0}")]
    Unauthorized(String),

    /// Operation disabled by deployment policy.
    #[error("{0}")]
    Forbidden(String),

    /// The user referenced by the session no longer exists.
    #[error("User not found")]
    NotFound,

    /// The stored private key could not be recovered.
    #[error("{}", KEY_UNAVAILABLE_MESSAGE)]
    KeyUnavailable,

    /// Chain node unreachable or returned an unusable answer.
    #[error("Blockchain node unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Explorer transport failure.
    #[error("Transaction history unavailable: {0}")]
    HistoryUnavailable(String),

    /// The node rejected the signed transaction.
    #[error("Broadcast failed: {0}")]
    BroadcastFailed(String),

    /// Storage or other internal failure; details are logged, never returned.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl WalletError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            WalletError::Validation(_) => StatusCode::BAD_REQUEST,
            WalletError::Conflict(_) => StatusCode::CONFLICT,
            WalletError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            WalletError::Forbidden(_) => StatusCode::FORBIDDEN,
            WalletError::NotFound => StatusCode::NOT_FOUND,
            WalletError::UpstreamUnavailable(_) | WalletError::HistoryUnavailable(_) => {
                StatusCode::BAD_GATEWAY
            }
            WalletError::KeyUnavailable
            | WalletError::BroadcastFailed(_)
            | WalletError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<WalletError> for ApiError {
    fn from(err: WalletError) -> Self {
        let status = err.status_code();
        let message = match &err {
            WalletError::Internal(detail) => {
                tracing::error!(error = %detail, "Internal error while handling request");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        ApiError::new(status, message)
    }
}

impl IntoResponse for WalletError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}
