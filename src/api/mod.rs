// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::time::Duration;

use axum::{
    extract::rejection::JsonRejection,
    routing::{get, post},
    Json, Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    error::{ApiError, WalletError},
    state::AppState,
    wallet::{BalanceView, Direction, HistoryEntry, HistoryView, TransactionRequest},
};

pub mod auth;
pub mod health;
pub mod transactions;
pub mod users;
pub mod wallet;

pub fn router(state: AppState, request_timeout: Duration) -> Router {
    let routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/profile", get(users::profile))
        .route("/wallet_address", get(wallet::wallet_address))
        .route("/balance", get(wallet::balance))
        .route("/private_key", get(wallet::private_key))
        .route("/sign_transaction", post(transactions::sign_transaction))
        .route("/transaction_history", get(transactions::transaction_history))
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(state);

    #[allow(deprecated)]
    let timeout = TimeoutLayer::new(request_timeout);

    Router::new()
        .merge(routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(timeout),
        )
        .layer(CorsLayer::permissive())
}

/// Unwrap a JSON body, answering malformed input with 400 `{"error": ...}`.
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError::bad_request(rejection.body_text()))
}

/// Run CPU-bound work (password hashing) off the async workers.
pub(crate) async fn run_blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, WalletError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| WalletError::Internal(format!("blocking task failed: {e}")))?
        .map_err(ApiError::from)
}

/// Registers the bearer token scheme referenced by protected paths.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .description(Some("Session token issued by POST /login"))
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Custodial Wallet API",
        description = "User registration, custodial key management and transaction signing."
    ),
    paths(
        auth::register,
        auth::login,
        users::profile,
        wallet::wallet_address,
        wallet::balance,
        wallet::private_key,
        transactions::sign_transaction,
        transactions::transaction_history,
        health::health,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            auth::RegisterRequest,
            auth::RegisterResponse,
            auth::LoginRequest,
            auth::LoginResponse,
            users::ProfileResponse,
            wallet::WalletAddressResponse,
            wallet::PrivateKeyResponse,
            transactions::SignTransactionResponse,
            TransactionRequest,
            BalanceView,
            HistoryView,
            HistoryEntry,
            Direction,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    tags(
        (name = "Auth", description = "Registration and login"),
        (name = "Users", description = "User profile"),
        (name = "Wallet", description = "Custodial wallet access"),
        (name = "Transactions", description = "Signing, broadcasting and history"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{corrupt_key, test_state, ExplorerBehavior, Fixture};
    use axum::{
        body::{to_bytes, Body},
        http::{Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    const TO: &str = "0x000000000000000000000000000000000000abcd";

    fn app() -> (Router, Fixture) {
        let (state, fx) = test_state();
        (router(state, Duration::from_secs(30)), fx)
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    /// Register and log in, returning (user_id, address, token).
    async fn signed_up(app: &Router, username: &str) -> (String, String, String) {
        let (status, body) = send(
            app,
            Method::POST,
            "/register",
            None,
            Some(json!({
                "username": username,
                "email": format!("{username}@example.com"),
                "password": "pw"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        let user_id = body["user_id"].as_str().unwrap().to_string();
        let address = body["wallet_address"].as_str().unwrap().to_string();

        let (status, body) = send(
            app,
            Method::POST,
            "/login",
            None,
            Some(json!({"username": username, "password": "pw"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["token_type"], "Bearer");
        assert_eq!(body["expires_in"], 3600);
        let token = body["access_token"].as_str().unwrap().to_string();
        (user_id, address, token)
    }

    #[tokio::test]
    async fn register_login_profile_flow() {
        let (app, _fx) = app();
        let (_, address, token) = signed_up(&app, "alice").await;
        assert!(address.starts_with("0x"));

        let (status, body) = send(&app, Method::GET, "/profile", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"username": "alice", "email": "alice@example.com"}));

        let (status, body) = send(&app, Method::GET, "/wallet_address", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["address"], address);
    }

    #[tokio::test]
    async fn duplicate_registration_is_409() {
        let (app, _fx) = app();
        signed_up(&app, "alice").await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/register",
            None,
            Some(json!({"username": "alice", "email": "x@example.com", "password": "pw"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "User with that username or email already exists");
    }

    #[tokio::test]
    async fn missing_or_malformed_bodies_are_400() {
        let (app, _fx) = app();

        let (status, body) = send(
            &app,
            Method::POST,
            "/register",
            None,
            Some(json!({"username": "alice"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Username, email and password are required");

        let (status, _) = send(&app, Method::POST, "/login", None, Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(&app, Method::POST, "/login", None, Some(json!([1, 2]))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn wrong_password_is_401() {
        let (app, _fx) = app();
        signed_up(&app, "alice").await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/login",
            None,
            Some(json!({"username": "alice", "password": "nope"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid username or password");
    }

    #[tokio::test]
    async fn protected_routes_require_a_valid_token() {
        let (app, _fx) = app();
        for uri in [
            "/profile",
            "/wallet_address",
            "/balance",
            "/private_key",
            "/transaction_history",
        ] {
            let (status, body) = send(&app, Method::GET, uri, None, None).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
            assert_eq!(body["error_code"], "missing_auth_header");

            let (status, _) = send(&app, Method::GET, uri, Some("garbage"), None).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        }

        let (status, _) = send(
            &app,
            Method::POST,
            "/sign_transaction",
            None,
            Some(json!({"to": TO, "value": 1, "gasPrice": 1})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn token_for_vanished_user_is_404() {
        let (state, _fx) = test_state();
        let token = state.gate.sessions().issue("ghost").unwrap().token;
        let app = router(state, Duration::from_secs(30));

        let (status, body) = send(&app, Method::GET, "/profile", Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "User not found");
    }

    #[tokio::test]
    async fn sign_without_broadcast_returns_signed_hex() {
        let (app, fx) = app();
        let (_, _, token) = signed_up(&app, "alice").await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/sign_transaction",
            Some(&token),
            Some(json!({
                "to": TO,
                "value": 1_000_000_000_000_000_000u64,
                "gasPrice": 1_000_000_000u64,
                "nonce": 5,
                "chainId": 11_155_111,
                "broadcast": false
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");

        let signed = body["signed_tx"].as_str().unwrap();
        let first_byte = u8::from_str_radix(&signed[2..4], 16).unwrap();
        assert!(first_byte >= 0xc0);
        assert!(body.get("broadcast").is_none());
        assert_eq!(fx.chain.broadcasts(), 0);
    }

    #[tokio::test]
    async fn sign_with_broadcast_returns_hash() {
        let (app, fx) = app();
        let (_, _, token) = signed_up(&app, "alice").await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/sign_transaction",
            Some(&token),
            Some(json!({
                "to": TO,
                "value": "1000",
                "gasPrice": "1000000000",
                "broadcast": true
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["broadcast"], true);
        assert!(body.get("signed_tx").is_none());
        assert_eq!(fx.chain.broadcasts(), 1);
        assert_eq!(fx.chain.nonce_queries(), 1);
    }

    #[tokio::test]
    async fn invalid_transaction_is_400() {
        let (app, _fx) = app();
        let (_, _, token) = signed_up(&app, "alice").await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/sign_transaction",
            Some(&token),
            Some(json!({"to": TO, "value": -5, "gasPrice": 1})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("value"));
    }

    #[tokio::test]
    async fn corrupted_key_export_is_500_with_generic_message() {
        let (app, fx) = app();
        let (user_id, _, token) = signed_up(&app, "alice").await;

        let (status, body) = send(&app, Method::GET, "/private_key", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["private_key"].as_str().unwrap().starts_with("0x"));

        let record = fx.db.get_user(&user_id).unwrap().unwrap();
        corrupt_key(&fx, &record);

        let (status, body) = send(&app, Method::GET, "/private_key", Some(&token), None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": "Could not decrypt private key"}));
    }

    #[tokio::test]
    async fn balance_of_empty_wallet_is_zero() {
        let (app, _fx) = app();
        let (_, address, token) = signed_up(&app, "alice").await;

        let (status, body) = send(&app, Method::GET, "/balance", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["balance"], "0.0");
        assert_eq!(body["address"], address);
    }

    #[tokio::test]
    async fn empty_history_is_200_with_message() {
        let (app, fx) = app();
        let (_, _, token) = signed_up(&app, "alice").await;
        fx.explorer.set(ExplorerBehavior::Respond(json!({
            "status": "0",
            "message": "No transactions found",
            "result": []
        })));

        let (status, body) =
            send(&app, Method::GET, "/transaction_history", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "No transactions found for this address");
        assert_eq!(body["transactions"], json!([]));
    }

    #[tokio::test]
    async fn explorer_outage_is_502() {
        let (app, fx) = app();
        let (_, _, token) = signed_up(&app, "alice").await;
        fx.explorer.set(ExplorerBehavior::Fail);

        let (status, _) =
            send(&app, Method::GET, "/transaction_history", Some(&token), None).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn health_and_docs_are_public() {
        let (app, _fx) = app();

        let (status, body) = send(&app, Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["checks"]["database"], "ok");

        let (status, body) = send(&app, Method::GET, "/health/live", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");

        let (status, body) = send(&app, Method::GET, "/api-doc/openapi.json", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["paths"]["/sign_transaction"].is_object());
    }

    #[tokio::test]
    async fn responses_carry_request_id() {
        let (app, _fx) = app();
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health/live")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(response.headers().contains_key("x-request-id"));
    }
}
