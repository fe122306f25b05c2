// SPDX-License-Identifier: MIT

//! Overlay Studio: photo-overlay backend
//!
//! This crate provides the backend API for compositing user photos onto
//! image templates, either through the Canva Connect autofill/export flow
//! or a direct overlay transform.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use db::FirestoreDb;
use services::CanvaService;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub canva: CanvaService,
}
