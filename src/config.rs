// SPDX-License-Identifier: MIT

//! Application configuration loaded from environment variables.
//!
//! Everything is read once at startup; secrets arrive through env bindings
//! (e.g. Cloud Run secret mounts), so no secret-manager calls are made here.

use std::env;

/// Default Canva Connect REST base.
const DEFAULT_CANVA_API_BASE_URL: &str = "https://api.canva.com/rest/v1";
/// Default Canva authorization page (browser redirect target).
const DEFAULT_CANVA_AUTHORIZE_URL: &str = "https://www.canva.com/api/oauth/authorize";

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Canva OAuth client ID (public)
    pub canva_client_id: String,
    /// Canva Connect API base URL (overridable for tests/staging)
    pub canva_api_base_url: String,
    /// Canva authorization page URL
    pub canva_authorize_url: String,
    /// Public base URL of this service (used to build the OAuth callback URL)
    pub public_url: String,
    /// Frontend URL for post-OAuth redirects
    pub frontend_url: String,
    /// Cloudinary cloud name (asset delivery and overlay fallback)
    pub cloudinary_cloud_name: String,
    /// GCP project ID
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,

    // --- Secrets ---
    /// Canva OAuth client secret
    pub canva_client_secret: String,
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            canva_client_id: "test_client_id".to_string(),
            canva_api_base_url: DEFAULT_CANVA_API_BASE_URL.to_string(),
            canva_authorize_url: DEFAULT_CANVA_AUTHORIZE_URL.to_string(),
            public_url: "http://localhost:8080".to_string(),
            frontend_url: "http://localhost:3000".to_string(),
            cloudinary_cloud_name: "test-cloud".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            canva_client_secret: "test_secret".to_string(),
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            canva_client_id: env::var("CANVA_CLIENT_ID")
                .map_err(|_| ConfigError::Missing("CANVA_CLIENT_ID"))?,
            canva_api_base_url: env::var("CANVA_API_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_CANVA_API_BASE_URL.to_string()),
            canva_authorize_url: env::var("CANVA_AUTHORIZE_URL")
                .unwrap_or_else(|_| DEFAULT_CANVA_AUTHORIZE_URL.to_string()),
            public_url: env::var("PUBLIC_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            cloudinary_cloud_name: env::var("CLOUDINARY_CLOUD_NAME")
                .map_err(|_| ConfigError::Missing("CLOUDINARY_CLOUD_NAME"))?,
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),

            canva_client_secret: env::var("CANVA_CLIENT_SECRET")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("CANVA_CLIENT_SECRET"))?,
            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
        })
    }

    /// OAuth callback URL registered with Canva. Must match the redirect_uri
    /// sent in both the authorize request and the code exchange.
    pub fn canva_redirect_uri(&self) -> String {
        format!("{}/connect/canva/callback", self.public_url)
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}
