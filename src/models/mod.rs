// SPDX-License-Identifier: MIT

//! Data models for the application.

pub mod template;
pub mod user;

pub use template::{Placeholder, Template};
pub use user::{DesignCredential, User, UserRole};
