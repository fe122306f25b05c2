// SPDX-License-Identifier: MIT

//! Services module - business logic layer.

pub mod canva;
pub mod compose;

pub use canva::{AutofillField, CanvaClient, CanvaService, ExportStatus};
