// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User records and their uniqueness indexes.

use chrono::{DateTime, Utc};
use redb::{ReadableDatabase, ReadableTable, ReadableTableMetadata};
use serde::{Deserialize, Serialize};

use super::database::{Database, DbError, DbResult, EMAIL_INDEX, USERNAME_INDEX, USERS};

/// A registered user as persisted in the directory.
///
/// `address` and `encrypted_private_key` are written once at registration and
/// never updated.
#[derive(Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub username: String,
    pub email: String,
    /// PHC-formatted password hash.
    pub password_hash: String,
    /// EIP-55 checksummed address.
    pub address: String,
    /// Vault blob, opaque to storage.
    pub encrypted_private_key: String,
    pub created_at: DateTime<Utc>,
}

impl std::fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserRecord")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("address", &self.address)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

/// Fields supplied at registration time.
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub address: String,
    pub encrypted_private_key: String,
}

fn email_key(email: &str) -> String {
    email.trim().to_lowercase()
}

impl Database {
    /// Insert a user if neither the username nor the email is taken.
    ///
    /// Both checks and the insert run inside one write transaction; on
    /// conflict the transaction is aborted and nothing is written.
    pub fn create_user(&self, new: NewUser) -> DbResult<UserRecord> {
        let record = UserRecord {
            id: uuid::Uuid::new_v4().to_string(),
            username: new.username,
            email: new.email,
            password_hash: new.password_hash,
            address: new.address,
            encrypted_private_key: new.encrypted_private_key,
            created_at: Utc::now(),
        };
        let json = serde_json::to_vec(&record)?;
        let email_key = email_key(&record.email);

        let write_txn = self.db.begin_write()?;
        let conflict = {
            let mut usernames = write_txn.open_table(USERNAME_INDEX)?;
            let mut emails = write_txn.open_table(EMAIL_INDEX)?;

            if usernames.get(record.username.as_str())?.is_some()
                || emails.get(email_key.as_str())?.is_some()
            {
                true
            } else {
                let mut users = write_txn.open_table(USERS)?;
                users.insert(record.id.as_str(), json.as_slice())?;
                usernames.insert(record.username.as_str(), record.id.as_str())?;
                emails.insert(email_key.as_str(), record.id.as_str())?;
                false
            }
        };

        if conflict {
            write_txn.abort()?;
            return Err(DbError::Conflict(
                "username or email already registered".to_string(),
            ));
        }
        write_txn.commit()?;

        tracing::debug!(user_id = %record.id, "User record created");
        Ok(record)
    }

    pub fn get_user(&self, user_id: &str) -> DbResult<Option<UserRecord>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(USERS)?;
        match table.get(user_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    pub fn find_by_username(&self, username: &str) -> DbResult<Option<UserRecord>> {
        let user_id = {
            let read_txn = self.db.begin_read()?;
            let index = read_txn.open_table(USERNAME_INDEX)?;
            match index.get(username)? {
                Some(id) => id.value().to_string(),
                None => return Ok(None),
            }
        };
        self.get_user(&user_id)
    }

    /// Number of registered users.
    pub fn count_users(&self) -> DbResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(USERS)?;
        Ok(table.len()?)
    }

    /// Overwrite a stored record in place.
    ///
    /// Only used by tests to simulate on-disk corruption.
    #[cfg(test)]
    pub(crate) fn replace_user_for_test(&self, record: &UserRecord) -> DbResult<()> {
        let json = serde_json::to_vec(record)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut users = write_txn.open_table(USERS)?;
            users.insert(record.id.as_str(), json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }
}
