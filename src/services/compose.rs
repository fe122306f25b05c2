// SPDX-License-Identifier: MIT

//! Overlay-transform fallback: composites the user photo onto a template via
//! a Cloudinary delivery URL, with no token exchange or provider round trip.

use crate::models::Placeholder;

/// Delivery URL for an uploaded asset. Accepts either a full URL (returned
/// unchanged) or a Cloudinary public ID.
pub fn delivery_url(cloud_name: &str, public_id_or_url: &str) -> String {
    if public_id_or_url.starts_with("http") {
        return public_id_or_url.to_string();
    }
    format!(
        "https://res.cloudinary.com/{}/image/upload/{}",
        cloud_name, public_id_or_url
    )
}

/// Build the transformation URL that overlays `user_public_id` onto the
/// template at the placeholder rectangle.
///
/// Layer public IDs use `:` instead of `/` in the `l_` component. The overlay
/// is fitted to the placeholder box and anchored at its top-left corner.
pub fn overlay_url(
    cloud_name: &str,
    template_public_id: &str,
    user_public_id: &str,
    placeholder: &Placeholder,
) -> String {
    let layer_id = user_public_id.replace('/', ":");
    format!(
        "https://res.cloudinary.com/{}/image/upload/l_{},w_{},h_{},c_fill/fl_layer_apply,g_north_west,x_{},y_{}/{}",
        cloud_name,
        layer_id,
        placeholder.width,
        placeholder.height,
        placeholder.x,
        placeholder.y,
        template_public_id,
    )
}
