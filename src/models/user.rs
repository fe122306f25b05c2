// SPDX-License-Identifier: MIT

//! User model for storage and API.

use serde::{Deserialize, Serialize};

/// User profile stored in Firestore.
///
/// Account creation and password handling live in the auth service; this
/// backend only reads profiles and attaches design-provider credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// User ID (also used as document ID)
    pub id: String,
    /// Display name
    pub name: String,
    /// Email address (may be None if not shared)
    pub email: Option<String>,
    /// Role for admin-only surfaces
    pub role: UserRole,
    /// When the account was created (ISO 8601)
    pub created_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Admin,
}

/// Per-user Canva OAuth credential, stored as one document and always
/// read/written as a whole record.
///
/// `temp_code_verifier` only exists between the authorize redirect and the
/// code exchange; the write that stores the tokens clears it. The refresh
/// token survives every refresh, even when Canva's response omits a new one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DesignCredential {
    /// Short-lived bearer token
    pub access_token: Option<String>,
    /// Long-lived token used to mint new access tokens
    pub refresh_token: Option<String>,
    /// When the access token goes stale (ISO 8601); always written together
    /// with `access_token`
    pub expires_at: Option<String>,
    /// PKCE verifier for the in-flight authorization, if any
    pub temp_code_verifier: Option<String>,
}

impl DesignCredential {
    /// A credential is connected once a completed exchange stored tokens.
    pub fn is_connected(&self) -> bool {
        self.access_token.is_some() && self.refresh_token.is_some()
    }
}
