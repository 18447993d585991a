// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Username/password credentials and stateless bearer sessions.
//!
//! ## Auth Flow
//!
//! 1. `POST /register` stores an Argon2 hash and a fresh custodial wallet
//! 2. `POST /login` verifies the password and returns an HS256 session token
//!    (`sub` = user id, `exp` = issuance + `JWT_ACCESS_TOKEN_EXPIRES`)
//! 3. Protected handlers take the [`Auth`] extractor, which verifies
//!    `Authorization: Bearer <token>` before any user lookup
//!
//! ## Security
//!
//! - Sessions are not stored server-side and end only by expiry
//! - Unknown users and wrong passwords produce the same response
//! - Passwords, hashes and tokens are never logged

pub mod claims;
pub mod error;
pub mod extractor;
pub mod gate;
pub mod password;
pub mod session;

pub use claims::{AuthenticatedUser, SessionClaims};
pub use error::AuthError;
pub use extractor::Auth;
pub use gate::{CredentialGate, Registration};
pub use session::{IssuedToken, SessionManager};
