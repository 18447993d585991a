// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Test doubles for the chain and explorer plus fixtures wiring them up.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use alloy::primitives::{keccak256, Address, B256, U256};
use async_trait::async_trait;
use secrecy::SecretString;
use serde_json::{json, Value};
use tempfile::TempDir;

use crate::auth::SessionManager;
use crate::blockchain::{ChainError, ChainGateway, Explorer, ExplorerError, ExplorerResponse};
use crate::state::AppState;
use crate::storage::{database::temp_db, Database, KeyVault, NewUser, UserRecord};
use crate::wallet::{generate_wallet, WalletService, WalletSettings};

pub(crate) const TEST_SESSION_SECRET: &str = "test-session-secret";
pub(crate) const TEST_SESSION_TTL: u64 = 3600;

// =============================================================================
// Chain
// =============================================================================

#[derive(Debug, Clone, Default)]
pub(crate) struct ChainBehavior {
    pub balance: U256,
    pub nonce: u64,
    /// Balance and nonce queries fail with a transport error.
    pub fail_rpc: bool,
    /// Broadcasts are rejected with this node message.
    pub reject_broadcast: Option<String>,
    /// Broadcasts fail at the transport level with this message.
    pub drop_broadcast: Option<String>,
}

pub(crate) struct MockChain {
    behavior: ChainBehavior,
    nonce_queries: AtomicUsize,
    broadcasts: AtomicUsize,
    last_hash: Mutex<Option<B256>>,
}

impl MockChain {
    pub fn new(behavior: ChainBehavior) -> Self {
        Self {
            behavior,
            nonce_queries: AtomicUsize::new(0),
            broadcasts: AtomicUsize::new(0),
            last_hash: Mutex::new(None),
        }
    }

    pub fn nonce_queries(&self) -> usize {
        self.nonce_queries.load(Ordering::SeqCst)
    }

    pub fn broadcasts(&self) -> usize {
        self.broadcasts.load(Ordering::SeqCst)
    }

    pub fn last_broadcast_hash(&self) -> Option<B256> {
        *self.last_hash.lock().unwrap()
    }
}

#[async_trait]
impl ChainGateway for MockChain {
    async fn block_number(&self) -> Result<u64, ChainError> {
        if self.behavior.fail_rpc {
            return Err(ChainError::Transport("connection refused".to_string()));
        }
        Ok(1)
    }

    async fn balance(&self, _address: Address) -> Result<U256, ChainError> {
        if self.behavior.fail_rpc {
            return Err(ChainError::Transport("connection refused".to_string()));
        }
        Ok(self.behavior.balance)
    }

    async fn transaction_count(&self, _address: Address) -> Result<u64, ChainError> {
        self.nonce_queries.fetch_add(1, Ordering::SeqCst);
        if self.behavior.fail_rpc {
            return Err(ChainError::Transport("connection refused".to_string()));
        }
        Ok(self.behavior.nonce)
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<B256, ChainError> {
        self.broadcasts.fetch_add(1, Ordering::SeqCst);
        if let Some(reason) = &self.behavior.reject_broadcast {
            return Err(ChainError::Rejected(reason.clone()));
        }
        if let Some(reason) = &self.behavior.drop_broadcast {
            return Err(ChainError::Transport(reason.clone()));
        }
        // Legacy transaction hash = keccak256 of the RLP encoding.
        let hash = keccak256(raw);
        *self.last_hash.lock().unwrap() = Some(hash);
        Ok(hash)
    }
}

// =============================================================================
// Explorer
// =============================================================================

#[derive(Debug, Clone)]
pub(crate) enum ExplorerBehavior {
    Respond(Value),
    Fail,
}

pub(crate) struct MockExplorer {
    behavior: Mutex<ExplorerBehavior>,
    calls: AtomicUsize,
}

impl MockExplorer {
    pub fn new() -> Self {
        Self {
            behavior: Mutex::new(ExplorerBehavior::Respond(json!({
                "status": "0",
                "message": "No transactions found",
                "result": []
            }))),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set(&self, behavior: ExplorerBehavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Explorer for MockExplorer {
    async fn account_transactions(
        &self,
        _address: &str,
        _limit: u32,
    ) -> Result<ExplorerResponse, ExplorerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let behavior = self.behavior.lock().unwrap().clone();
        match behavior {
            ExplorerBehavior::Respond(body) => serde_json::from_value(body)
                .map_err(|e| ExplorerError::InvalidResponse(e.to_string())),
            ExplorerBehavior::Fail => Err(ExplorerError::Status(503)),
        }
    }
}

// =============================================================================
// Fixtures
// =============================================================================

pub(crate) struct Fixture {
    pub db: Arc<Database>,
    pub vault: Arc<KeyVault>,
    pub chain: Arc<MockChain>,
    pub explorer: Arc<MockExplorer>,
    pub settings: WalletSettings,
    pub service: WalletService,
    _dir: TempDir,
}

impl Fixture {
    fn build_service(&self) -> WalletService {
        WalletService::new(
            Arc::clone(&self.db),
            Arc::clone(&self.vault),
            self.chain.clone(),
            self.explorer.clone(),
            self.settings.clone(),
        )
    }

    pub fn rebuild_service(&mut self, tweak: impl FnOnce(&mut WalletSettings)) {
        tweak(&mut self.settings);
        self.service = self.build_service();
    }

    pub fn app_state(&self) -> AppState {
        AppState::new(
            Arc::clone(&self.db),
            Arc::clone(&self.vault),
            SessionManager::new(&SecretString::from(TEST_SESSION_SECRET), TEST_SESSION_TTL),
            self.chain.clone(),
            self.explorer.clone(),
            self.settings.clone(),
        )
    }
}

pub(crate) fn wallet_fixture(chain: ChainBehavior) -> Fixture {
    let (db, dir) = temp_db();
    let db = Arc::new(db);
    let vault = Arc::new(KeyVault::from_key_bytes(&[42u8; 32]).unwrap());
    let chain = Arc::new(MockChain::new(chain));
    let explorer = Arc::new(MockExplorer::new());
    let settings = WalletSettings {
        default_chain_id: 11_155_111,
        history_page_size: 100,
        key_export_enabled: true,
    };
    let service = WalletService::new(
        Arc::clone(&db),
        Arc::clone(&vault),
        chain.clone(),
        explorer.clone(),
        settings.clone(),
    );
    Fixture {
        db,
        vault,
        chain,
        explorer,
        settings,
        service,
        _dir: dir,
    }
}

/// Insert a user with a real sealed wallet, skipping password hashing.
pub(crate) fn register_user(fx: &Fixture, username: &str) -> UserRecord {
    let wallet = generate_wallet(&fx.vault).unwrap();
    fx.db
        .create_user(NewUser {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password_hash: "unused".to_string(),
            address: wallet.address,
            encrypted_private_key: wallet.encrypted_private_key,
        })
        .unwrap()
}

/// Flip one character of the stored key blob.
pub(crate) fn corrupt_key(fx: &Fixture, user: &UserRecord) {
    let mut record = fx.db.get_user(&user.id).unwrap().unwrap();
    let mut blob = record.encrypted_private_key.into_bytes();
    let last = blob.len() - 1;
    blob[last] = if blob[last] == b'A' { b'B' } else { b'A' };
    record.encrypted_private_key = String::from_utf8(blob).unwrap();
    fx.db.replace_user_for_test(&record).unwrap();
}

/// Application state over mocks with default behavior.
pub(crate) fn test_state() -> (AppState, Fixture) {
    let fx = wallet_fixture(ChainBehavior::default());
    (fx.app_state(), fx)
}
