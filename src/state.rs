// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::{CredentialGate, SessionManager};
use crate::blockchain::{ChainGateway, EtherscanClient, Explorer, RpcChainClient};
use crate::config::AppConfig;
use crate::storage::{Database, DbError, KeyVault, VaultError};
use crate::wallet::{WalletService, WalletSettings};

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("vault: {0}")]
    Vault(#[from] VaultError),

    #[error("database: {0}")]
    Database(#[from] DbError),

    #[error("explorer client: {0}")]
    Explorer(#[from] crate::blockchain::ExplorerError),
}

/// Shared, immutable application state.
///
/// Every component is built once from [`AppConfig`] and handed out by `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub chain: Arc<dyn ChainGateway>,
    pub gate: Arc<CredentialGate>,
    pub wallet: Arc<WalletService>,
}

impl AppState {
    /// Build production components. Fails fast on a malformed vault secret or
    /// an unusable database file.
    pub fn from_config(config: &AppConfig) -> Result<Self, StateError> {
        let vault = Arc::new(KeyVault::from_secret(&config.encryption_secret)?);
        let db = Arc::new(Database::open(&config.database_path)?);
        let chain: Arc<dyn ChainGateway> =
            Arc::new(RpcChainClient::new(config.chain.rpc_url.clone()));
        let explorer: Arc<dyn Explorer> = Arc::new(EtherscanClient::new(
            config.explorer.api_url.clone(),
            config.explorer.api_key.clone(),
            config.chain.chain_id,
        )?);
        let sessions = SessionManager::new(&config.jwt_secret, config.session_ttl_secs);
        let settings = WalletSettings {
            default_chain_id: config.chain.chain_id,
            history_page_size: config.explorer.page_size,
            key_export_enabled: config.key_export_enabled,
        };

        Ok(Self::new(db, vault, sessions, chain, explorer, settings))
    }

    pub fn new(
        db: Arc<Database>,
        vault: Arc<KeyVault>,
        sessions: SessionManager,
        chain: Arc<dyn ChainGateway>,
        explorer: Arc<dyn Explorer>,
        settings: WalletSettings,
    ) -> Self {
        let gate = Arc::new(CredentialGate::new(
            Arc::clone(&db),
            Arc::clone(&vault),
            sessions,
        ));
        let wallet = Arc::new(WalletService::new(
            Arc::clone(&db),
            vault,
            Arc::clone(&chain),
            explorer,
            settings,
        ));
        Self {
            db,
            chain,
            gate,
            wallet,
        }
    }
}
