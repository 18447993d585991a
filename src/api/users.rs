// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User endpoints.

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::Auth;
use crate::error::{ApiError, WalletError};
use crate::state::AppState;
use crate::storage::UserRecord;

/// Response for GET /profile
#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileResponse {
    pub username: String,
    pub email: String,
}

impl From<UserRecord> for ProfileResponse {
    fn from(user: UserRecord) -> Self {
        Self {
            username: user.username,
            email: user.email,
        }
    }
}

/// Get the current user's profile.
#[utoipa::path(
    get,
    path = "/profile",
    tag = "Users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "User profile", body = ProfileResponse),
        (status = 401, description = "Unauthorized - invalid or missing token"),
        (status = 404, description = "User not found")
    )
)]
pub async fn profile(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let record = state
        .db
        .get_user(&user.user_id)
        .map_err(|e| WalletError::Internal(format!("user lookup failed: {e}")))?
        .ok_or(WalletError::NotFound)?;
    Ok(Json(record.into()))
}
