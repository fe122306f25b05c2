// SPDX-License-Identifier: MIT

//! Image template model.

use serde::{Deserialize, Serialize};

/// An image template users overlay their photo onto.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    /// Template ID (also used as document ID)
    pub id: String,
    /// Display title
    pub title: String,
    /// Delivery URL of the template image
    pub image_url: String,
    /// Cloudinary public ID of the template image
    pub public_id: String,
    /// Canva brand template backing this template, if it was imported from
    /// Canva. Present ⇒ the autofill endpoint tries the Canva path first.
    pub brand_template_id: Option<String>,
    /// Where the user photo lands on the template
    pub placeholder: Option<Placeholder>,
    /// User ID of the template owner
    pub created_by: String,
    /// When the template was created (ISO 8601)
    pub created_at: String,
}

/// Placeholder rectangle in template pixel coordinates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Placeholder {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Default for Placeholder {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            width: 500,
            height: 500,
        }
    }
}
