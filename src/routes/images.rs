// SPDX-License-Identifier: MIT

//! Image generation routes (authenticated).
//!
//! One endpoint produces the finished asset for a template + user photo. A
//! template backed by a Canva brand template goes through autofill + export;
//! everything else (including Canva failures, per the fallback policy below)
//! is served by the overlay transform.

use axum::{extract::State, routing::post, Extension, Json, Router};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::Template;
use crate::services::compose;
use crate::services::AutofillField;
use crate::AppState;

/// Placeholder name brand templates use for the user photo.
const USER_IMAGE_FIELD: &str = "User_Image";

/// Image routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/images/autofill", post(autofill_image))
}

#[derive(Deserialize)]
pub struct AutofillRequest {
    pub template_id: String,
    /// Cloudinary public ID or full URL of the user's uploaded photo.
    pub user_public_id: String,
}

#[derive(Serialize)]
pub struct AutofillResponse {
    pub result_url: String,
    /// Which path produced the asset.
    pub info: &'static str,
    /// True when the Canva path failed because the user must re-connect
    /// their account; the asset still comes from the overlay transform.
    pub reconnect_required: bool,
}

/// Generate the composited image for a template and user photo.
async fn autofill_image(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<AutofillRequest>,
) -> Result<Json<AutofillResponse>> {
    if req.template_id.is_empty() || req.user_public_id.is_empty() {
        return Err(AppError::BadRequest(
            "Missing template_id or user_public_id".to_string(),
        ));
    }

    let template = state
        .db
        .get_template(&req.template_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Template {}", req.template_id)))?;

    if let Some(brand_template_id) = template.brand_template_id.clone() {
        match generate_via_canva(&state, &user.user_id, &brand_template_id, &req.user_public_id)
            .await
        {
            Ok(result_url) => {
                return Ok(Json(AutofillResponse {
                    result_url,
                    info: "Generated via Canva autofill",
                    reconnect_required: false,
                }));
            }
            // Fallback policy: any Canva-side failure still yields an image
            // via the overlay transform. Reconnect-class failures are
            // reported so the UI can prompt for re-authorization. Everything
            // else (unknown template, storage errors) propagates above.
            Err(e) if e.is_canva_error() => {
                let reconnect_required = e.needs_reconnect();
                tracing::warn!(
                    error = %e,
                    template_id = %req.template_id,
                    "Canva generation failed, using overlay transform"
                );
                return Ok(Json(overlay_response(
                    &state,
                    &template,
                    &req.user_public_id,
                    reconnect_required,
                )));
            }
            Err(e) => return Err(e),
        }
    }

    Ok(Json(overlay_response(
        &state,
        &template,
        &req.user_public_id,
        false,
    )))
}

/// Drive the Canva path: autofill the brand template, export, return the URL.
async fn generate_via_canva(
    state: &AppState,
    user_id: &str,
    brand_template_id: &str,
    user_public_id: &str,
) -> Result<String> {
    let image_url = compose::delivery_url(&state.config.cloudinary_cloud_name, user_public_id);

    let mut fields = HashMap::new();
    fields.insert(
        USER_IMAGE_FIELD.to_string(),
        AutofillField::Image { image_url },
    );

    let design_id = state
        .canva
        .submit_autofill(user_id, brand_template_id, fields)
        .await?;
    state.canva.export_and_wait(user_id, &design_id).await
}

/// Build the overlay-transform response.
fn overlay_response(
    state: &AppState,
    template: &Template,
    user_public_id: &str,
    reconnect_required: bool,
) -> AutofillResponse {
    let placeholder = template.placeholder.unwrap_or_default();
    let result_url = compose::overlay_url(
        &state.config.cloudinary_cloud_name,
        &template.public_id,
        user_public_id,
        &placeholder,
    );
    AutofillResponse {
        result_url,
        info: "Generated via overlay transform",
        reconnect_required,
    }
}
