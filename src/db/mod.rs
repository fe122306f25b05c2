// SPDX-License-Identifier: MIT

//! Database layer (Firestore) and the credential-store seam.

pub mod firestore;

pub use firestore::FirestoreDb;

use crate::error::AppError;
use crate::models::DesignCredential;
use async_trait::async_trait;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const TEMPLATES: &str = "templates";
    /// Canva OAuth credentials (keyed by user ID)
    pub const CANVA_CREDENTIALS: &str = "canva_credentials";
}

/// Access to the per-user Canva credential record.
///
/// The record is read and written as a whole document, so every state
/// transition (verifier stored, tokens stored + verifier cleared, tokens
/// refreshed) is a single write. Callers always receive an explicit store
/// handle; there is no process-wide credential state.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Fetch the credential record for a user.
    ///
    /// `Ok(None)` means the user exists but never started a Canva
    /// authorization. An unknown user is `Err(NotFound)`.
    async fn credential(&self, user_id: &str) -> Result<Option<DesignCredential>, AppError>;

    /// Overwrite the credential record for a user. Callers read first, so
    /// implementations may assume the user exists.
    async fn store_credential(
        &self,
        user_id: &str,
        credential: &DesignCredential,
    ) -> Result<(), AppError>;
}
