// SPDX-License-Identifier: MIT

//! Canva Connect API client for design autofill and export.
//!
//! Handles:
//! - OAuth authorization-code flow with PKCE
//! - Token refresh when expired
//! - Autofill submission against brand templates
//! - Asynchronous export jobs (poll until terminal)

use crate::error::AppError;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Request timeout for all Canva calls. The export poll loop has its own
/// attempt budget on top of this.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Canva Connect API client.
#[derive(Clone)]
pub struct CanvaClient {
    http: reqwest::Client,
    api_base_url: String,
    authorize_url: String,
    client_id: String,
    client_secret: String,
}

impl CanvaClient {
    /// Create a new Canva client with OAuth credentials.
    pub fn new(
        client_id: String,
        client_secret: String,
        api_base_url: String,
        authorize_url: String,
    ) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to construct HTTP client");

        Self {
            http,
            api_base_url,
            authorize_url,
            client_id,
            client_secret,
        }
    }

    /// Exchange an authorization code (plus the PKCE verifier that produced
    /// its challenge) for tokens.
    pub async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
        redirect_uri: &str,
    ) -> Result<TokenResponse, AppError> {
        let response = self
            .http
            .post(format!("{}/oauth/token", self.api_base_url))
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", redirect_uri),
                ("code_verifier", code_verifier),
            ])
            .send()
            .await
            .map_err(|e| AppError::TokenExchange(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Canva token exchange failed");
            return Err(AppError::TokenExchange(format!("HTTP {}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::TokenExchange(format!("JSON parse error: {}", e)))
    }

    /// Refresh an expired access token.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<TokenResponse, AppError> {
        let response = self
            .http
            .post(format!("{}/oauth/token", self.api_base_url))
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .send()
            .await
            .map_err(|e| AppError::TokenRefresh(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, body = %body, "Canva token refresh failed");
            return Err(AppError::TokenRefresh(format!("HTTP {}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::TokenRefresh(format!("JSON parse error: {}", e)))
    }

    /// Submit an autofill job against a brand template.
    pub async fn autofill(
        &self,
        access_token: &str,
        brand_template_id: &str,
        data: &HashMap<String, AutofillField>,
        title: &str,
    ) -> Result<AutofillResult, AppError> {
        let body = serde_json::json!({
            "brand_template_id": brand_template_id,
            "data": data,
            "title": title,
        });

        let response = self
            .http
            .post(format!("{}/autofills", self.api_base_url))
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Autofill(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Autofill(format!("HTTP {}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Autofill(format!("JSON parse error: {}", e)))
    }

    /// Kick off a PNG export of a design.
    pub async fn create_export(
        &self,
        access_token: &str,
        design_id: &str,
    ) -> Result<ExportJob, AppError> {
        let body = serde_json::json!({
            "design_id": design_id,
            "format": "png",
        });

        let response = self
            .http
            .post(format!("{}/exports", self.api_base_url))
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::ExportInitiation(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExportInitiation(format!("HTTP {}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::ExportInitiation(format!("JSON parse error: {}", e)))
    }

    /// Fetch the current state of an export job.
    pub async fn export_state(
        &self,
        access_token: &str,
        export_id: &str,
    ) -> Result<ExportState, AppError> {
        let response = self
            .http
            .get(format!("{}/exports/{}", self.api_base_url, export_id))
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::ExportFailed(format!("Status request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExportFailed(format!("HTTP {}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::ExportFailed(format!("JSON parse error: {}", e)))
    }
}

/// Token response from the Canva OAuth endpoint.
///
/// `refresh_token` is optional: refresh responses may omit it, in which case
/// the previously stored value stays in effect.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub expires_in: i64,
}

/// A field value for autofill: either text or a publicly fetchable image.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AutofillField {
    Text { text: String },
    Image { image_url: String },
}

/// Autofill submission response.
#[derive(Debug, Clone, Deserialize)]
pub struct AutofillResult {
    pub design: DesignRef,
}

/// The design created by an autofill job.
#[derive(Debug, Clone, Deserialize)]
pub struct DesignRef {
    pub id: String,
}

/// Export initiation response.
#[derive(Debug, Clone, Deserialize)]
pub struct ExportJob {
    pub id: String,
}

/// Export job state as reported by the poll endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ExportState {
    pub status: ExportStatus,
    #[serde(default)]
    pub export_url: Option<String>,
}

/// Export job status. Two terminal states; everything else keeps polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportStatus {
    Success,
    Failed,
    #[serde(other)]
    Pending,
}

// ─────────────────────────────────────────────────────────────────────────────
// CanvaService - High-level service with token lifecycle management
// ─────────────────────────────────────────────────────────────────────────────

use crate::db::CredentialStore;
use crate::models::DesignCredential;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Margin before token expiration when we proactively refresh (5 minutes).
const TOKEN_REFRESH_MARGIN_SECS: i64 = 5 * 60;

/// Fixed delay between export status polls.
const EXPORT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Maximum export status polls before giving up (~40 s with the default
/// interval).
const EXPORT_POLL_MAX_ATTEMPTS: u32 = 20;

/// Scopes requested during authorization.
const OAUTH_SCOPES: &[&str] = &[
    "app:read",
    "app:write",
    "asset:read",
    "asset:write",
    "brandtemplate:content:read",
    "brandtemplate:meta:read",
    "comment:read",
    "comment:write",
    "design:content:read",
    "design:content:write",
    "design:meta:read",
    "design:permission:read",
    "design:permission:write",
    "folder:read",
    "folder:write",
    "folder:permission:read",
    "folder:permission:write",
    "profile:read",
];

/// Per-user mutexes that serialize token refresh operations.
pub type RefreshLocks = Arc<DashMap<String, Arc<Mutex<()>>>>;

/// High-level Canva service that manages the OAuth lifecycle and drives
/// autofill/export jobs.
///
/// The credential record is the only shared mutable state and is always
/// read and written as a whole document through the [`CredentialStore`].
/// Within one process, refreshes for a user are serialized with a per-user
/// mutex because Canva rotates refresh tokens; across instances the refresh
/// race remains and the last write wins.
#[derive(Clone)]
pub struct CanvaService {
    client: CanvaClient,
    store: Arc<dyn CredentialStore>,
    redirect_uri: String,
    refresh_locks: RefreshLocks,
    poll_interval: Duration,
    max_poll_attempts: u32,
}

impl CanvaService {
    /// Create a new Canva service.
    pub fn new(
        client_id: String,
        client_secret: String,
        api_base_url: String,
        authorize_url: String,
        redirect_uri: String,
        store: Arc<dyn CredentialStore>,
    ) -> Self {
        Self {
            client: CanvaClient::new(client_id, client_secret, api_base_url, authorize_url),
            store,
            redirect_uri,
            refresh_locks: Arc::new(DashMap::new()),
            poll_interval: EXPORT_POLL_INTERVAL,
            max_poll_attempts: EXPORT_POLL_MAX_ATTEMPTS,
        }
    }

    /// Override the export polling cadence. Tests run with a zero interval;
    /// the default preserves the ~40-second worst-case bound.
    pub fn with_poll_settings(mut self, interval: Duration, max_attempts: u32) -> Self {
        self.poll_interval = interval;
        self.max_poll_attempts = max_attempts;
        self
    }

    // ─── Authorization (PKCE) ────────────────────────────────────────────────

    /// Start the authorization flow for a user and return the URL to send
    /// their browser to.
    ///
    /// The PKCE verifier is persisted on the credential record because the
    /// flow spans two stateless requests (redirect out, callback in). The
    /// `state` parameter carries the user ID; the callback has no session of
    /// its own and uses `state` as the sole account linkage.
    pub async fn begin_authorization(&self, user_id: &str) -> Result<String, AppError> {
        let mut credential = self.store.credential(user_id).await?.unwrap_or_default();

        let (verifier, challenge) = generate_pkce()?;
        credential.temp_code_verifier = Some(verifier);
        self.store.store_credential(user_id, &credential).await?;

        let url = format!(
            "{}?client_id={}&response_type=code&redirect_uri={}&scope={}&state={}&code_challenge_method=S256&code_challenge={}",
            self.client.authorize_url,
            urlencoding::encode(&self.client.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(&OAUTH_SCOPES.join(" ")),
            urlencoding::encode(user_id),
            challenge,
        );

        tracing::info!(user_id, "Starting Canva OAuth flow");
        Ok(url)
    }

    /// Complete the authorization flow: exchange the callback code for tokens
    /// and store them, consuming the verifier.
    pub async fn complete_authorization(&self, code: &str, user_id: &str) -> Result<(), AppError> {
        let credential = self
            .store
            .credential(user_id)
            .await?
            .ok_or(AppError::InvalidFlowState)?;
        let Some(verifier) = credential.temp_code_verifier else {
            return Err(AppError::InvalidFlowState);
        };

        let tokens = self
            .client
            .exchange_code(code, &verifier, &self.redirect_uri)
            .await?;
        let refresh_token = tokens.refresh_token.ok_or_else(|| {
            AppError::TokenExchange("Token response missing refresh_token".to_string())
        })?;

        // One write stores the tokens and clears the verifier, so the record
        // never holds both a usable token pair and a live verifier.
        let updated = DesignCredential {
            access_token: Some(tokens.access_token),
            refresh_token: Some(refresh_token),
            expires_at: Some(expiry_from_now(tokens.expires_in)),
            temp_code_verifier: None,
        };
        self.store.store_credential(user_id, &updated).await?;

        tracing::info!(user_id, "Canva account connected");
        Ok(())
    }

    // ─── Token Management ────────────────────────────────────────────────────

    /// Get a valid (non-expired) access token for the given user, refreshing
    /// it first when less than the safety margin remains.
    pub async fn ensure_fresh_token(&self, user_id: &str) -> Result<String, AppError> {
        // Fast path: stored token still comfortably valid, no network call.
        if let Some(token) = self.stored_token_if_fresh(user_id).await? {
            return Ok(token);
        }

        // Canva invalidates the old refresh token when it rotates, so only
        // one refresh per user may run at a time in this instance.
        let lock = self
            .refresh_locks
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        // Re-check after acquiring the lock: another task may have refreshed
        // while we waited.
        if let Some(token) = self.stored_token_if_fresh(user_id).await? {
            return Ok(token);
        }

        let Some(credential) = self.store.credential(user_id).await? else {
            return Err(AppError::NotConnected);
        };
        let Some(refresh_token) = credential.refresh_token.clone() else {
            return Err(AppError::NotConnected);
        };

        tracing::info!(user_id, "Canva access token expired, refreshing");
        let tokens = self.client.refresh_token(&refresh_token).await?;

        let updated = DesignCredential {
            access_token: Some(tokens.access_token.clone()),
            // Canva may omit a rotated refresh token; keep the old one then.
            refresh_token: Some(tokens.refresh_token.unwrap_or(refresh_token)),
            expires_at: Some(expiry_from_now(tokens.expires_in)),
            temp_code_verifier: credential.temp_code_verifier,
        };
        self.store.store_credential(user_id, &updated).await?;

        tracing::info!(user_id, "Canva token refreshed");
        Ok(tokens.access_token)
    }

    /// Return the stored access token if more than the refresh margin remains
    /// before expiry. `None` means a refresh is needed.
    async fn stored_token_if_fresh(&self, user_id: &str) -> Result<Option<String>, AppError> {
        let Some(credential) = self.store.credential(user_id).await? else {
            return Err(AppError::NotConnected);
        };
        let Some(access_token) = credential.access_token else {
            return Err(AppError::NotConnected);
        };
        // Unknown expiry counts as stale.
        let Some(expires_at) = credential.expires_at else {
            return Ok(None);
        };

        let expires_at = chrono::DateTime::parse_from_rfc3339(&expires_at)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to parse expiry: {}", e)))?
            .with_timezone(&Utc);

        let margin = chrono::Duration::seconds(TOKEN_REFRESH_MARGIN_SECS);
        if Utc::now() + margin < expires_at {
            Ok(Some(access_token))
        } else {
            Ok(None)
        }
    }

    // ─── Autofill / Export ───────────────────────────────────────────────────

    /// Submit an autofill job and return the created design's ID.
    pub async fn submit_autofill(
        &self,
        user_id: &str,
        brand_template_id: &str,
        fields: HashMap<String, AutofillField>,
    ) -> Result<String, AppError> {
        let token = self.ensure_fresh_token(user_id).await?;

        // Timestamped title so generated designs are traceable in Canva's UI.
        let title = format!("Autofilled design {}", Utc::now().timestamp_millis());

        let result = self
            .client
            .autofill(&token, brand_template_id, &fields, &title)
            .await?;

        tracing::info!(user_id, design_id = %result.design.id, "Canva autofill submitted");
        Ok(result.design.id)
    }

    /// Export a design as PNG and wait for the job to finish, returning the
    /// download URL.
    pub async fn export_and_wait(&self, user_id: &str, design_id: &str) -> Result<String, AppError> {
        let token = self.ensure_fresh_token(user_id).await?;
        let job = self.client.create_export(&token, design_id).await?;

        for _ in 0..self.max_poll_attempts {
            let state = self.client.export_state(&token, &job.id).await?;
            match state.status {
                ExportStatus::Success => {
                    return state.export_url.ok_or_else(|| {
                        AppError::ExportFailed("Export succeeded without a URL".to_string())
                    });
                }
                ExportStatus::Failed => {
                    return Err(AppError::ExportFailed(format!("Export {} failed", job.id)));
                }
                ExportStatus::Pending => tokio::time::sleep(self.poll_interval).await,
            }
        }

        tracing::warn!(user_id, design_id, "Canva export exhausted its poll budget");
        Err(AppError::ExportTimeout)
    }
}

/// Generate a PKCE verifier and its S256 challenge.
fn generate_pkce() -> Result<(String, String), AppError> {
    use ring::rand::{SecureRandom, SystemRandom};

    let mut bytes = [0u8; 32];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("System RNG failure")))?;

    let verifier = URL_SAFE_NO_PAD.encode(bytes);
    let challenge = pkce_challenge(&verifier);
    Ok((verifier, challenge))
}

/// S256 challenge: base64url(SHA-256(verifier)), no padding.
pub fn pkce_challenge(verifier: &str) -> String {
    use sha2::{Digest, Sha256};
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

/// RFC 3339 expiry timestamp `expires_in` seconds from now.
fn expiry_from_now(expires_in: i64) -> String {
    (Utc::now() + chrono::Duration::seconds(expires_in)).to_rfc3339()
}
