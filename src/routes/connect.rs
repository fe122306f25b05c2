// SPDX-License-Identifier: MIT

//! Canva account connection routes (OAuth authorization-code flow).

use axum::{
    extract::{Query, State},
    response::Redirect,
    routing::get,
    Extension, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::AppState;

/// Public routes. The callback cannot require a session: the browser arrives
/// from Canva and the `state` parameter is the only user linkage.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/connect/canva/callback", get(connect_callback))
}

/// Routes requiring authentication (applied in routes/mod.rs).
pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new().route("/connect/canva", get(connect_start))
}

/// Start the flow - redirect the user's browser to Canva's authorize page.
async fn connect_start(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Redirect> {
    let auth_url = state.canva.begin_authorization(&user.user_id).await?;
    Ok(Redirect::temporary(&auth_url))
}

/// Query parameters Canva sends to the callback.
#[derive(Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    /// Carries the user ID set at flow start.
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// OAuth callback - exchange the code for tokens and bounce to the frontend.
async fn connect_callback(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CallbackParams>,
) -> Result<Redirect> {
    if let Some(error) = params.error {
        tracing::warn!(error = %error, "Canva authorization denied");
        let redirect = format!(
            "{}/dashboard?service=canva&status=error&reason={}",
            state.config.frontend_url,
            urlencoding::encode(&error)
        );
        return Ok(Redirect::temporary(&redirect));
    }

    let (Some(code), Some(user_id)) = (params.code, params.state) else {
        return Err(AppError::BadRequest("Missing code or state".to_string()));
    };

    state.canva.complete_authorization(&code, &user_id).await?;

    let redirect = format!(
        "{}/dashboard?service=canva&status=connected",
        state.config.frontend_url
    );
    Ok(Redirect::temporary(&redirect))
}
