// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use overlay_studio::db::{CredentialStore, FirestoreDb};
use overlay_studio::error::AppError;
use overlay_studio::models::DesignCredential;
use overlay_studio::services::CanvaService;
use std::sync::Arc;
use std::time::Duration;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

/// In-memory credential store for deterministic service tests.
///
/// A record of `None` is a user who exists but never connected Canva;
/// an absent key is an unknown user.
#[allow(dead_code)]
pub struct MemoryCredentialStore {
    records: DashMap<String, Option<DesignCredential>>,
}

#[allow(dead_code)]
impl MemoryCredentialStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            records: DashMap::new(),
        })
    }

    /// Register a user with no Canva credential.
    pub fn add_user(&self, user_id: &str) {
        self.records.insert(user_id.to_string(), None);
    }

    /// Register a user with an existing credential record.
    pub fn seed(&self, user_id: &str, credential: DesignCredential) {
        self.records
            .insert(user_id.to_string(), Some(credential));
    }

    /// Current credential record for assertions.
    pub fn snapshot(&self, user_id: &str) -> Option<DesignCredential> {
        self.records.get(user_id).and_then(|record| record.clone())
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn credential(&self, user_id: &str) -> Result<Option<DesignCredential>, AppError> {
        match self.records.get(user_id) {
            Some(record) => Ok(record.clone()),
            None => Err(AppError::NotFound(format!("User {}", user_id))),
        }
    }

    async fn store_credential(
        &self,
        user_id: &str,
        credential: &DesignCredential,
    ) -> Result<(), AppError> {
        match self.records.get_mut(user_id) {
            Some(mut record) => {
                *record = Some(credential.clone());
                Ok(())
            }
            None => Err(AppError::NotFound(format!("User {}", user_id))),
        }
    }
}

/// Canva service wired to a mock provider URL and the in-memory store.
/// Polling runs with a zero interval so export tests are instant.
#[allow(dead_code)]
pub fn canva_service(store: Arc<MemoryCredentialStore>, provider_url: &str) -> CanvaService {
    CanvaService::new(
        "test_client_id".to_string(),
        "test_secret".to_string(),
        provider_url.to_string(),
        format!("{}/oauth/authorize", provider_url),
        "http://localhost:8080/connect/canva/callback".to_string(),
        store,
    )
    .with_poll_settings(Duration::ZERO, 20)
}

/// A fully connected credential expiring at the given instant.
#[allow(dead_code)]
pub fn connected_credential(
    access_token: &str,
    refresh_token: &str,
    expires_at: DateTime<Utc>,
) -> DesignCredential {
    DesignCredential {
        access_token: Some(access_token.to_string()),
        refresh_token: Some(refresh_token.to_string()),
        expires_at: Some(expires_at.to_rfc3339()),
        temp_code_verifier: None,
    }
}

/// Expected HTTP Basic authorization header for the test client credentials.
#[allow(dead_code)]
pub fn basic_auth_header() -> String {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    format!("Basic {}", STANDARD.encode("test_client_id:test_secret"))
}
