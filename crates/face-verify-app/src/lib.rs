#![warn(missing_docs)]
//! # face-verify-app
//!
//! ## Purpose
//! Orchestrates the form gate, camera, capture, upload, and result rendering
//! for `face-verify`.
//!
//! ## Responsibilities
//! - Load and validate runtime configuration.
//! - Initialise structured logging for the binary.
//! - Wire page elements into a [`PageController`] that handles capture and
//!   submit clicks.
//!
//! ## Data flow
//! Page ready -> webcam bound -> capture click -> frame stored in the slot ->
//! submit click -> multipart upload -> response parsing -> result area.
//!
//! ## Ownership and lifetimes
//! The controller owns every page element. Operations take `&self` so a
//! capture can run while a submission is suspended on the network.
//!
//! ## Error model
//! Subsystem failures are wrapped in [`AppError`]. User-facing failures are
//! rendered into the result area; diagnostic detail goes to the log only.
//!
//! ## Security and privacy notes
//! Documents are logged by fingerprint and frames by size; form values and
//! image bytes never reach the log.

mod config;
mod controller;
mod logging;

use std::time::{SystemTime, UNIX_EPOCH};

use face_verify_capture::CaptureError;
use face_verify_contract::ContractError;
use face_verify_core::CoreError;
use face_verify_upload::UploadError;
use thiserror::Error;

pub use config::{
    AppConfig, ConfigOverrides, ENDPOINT_ENV, LOG_FORMAT_ENV, LogFormat, NEXT_PAGE_ENV,
};
pub use controller::{ClickOutcome, PageController, PageElements};
pub use logging::init_logging;

/// Build-time application version loaded from root `VERSION` file.
pub const APP_VERSION: &str = env!("FACE_VERIFY_VERSION");

/// Returns the app version sourced from root `VERSION`.
pub fn app_version() -> &'static str {
    APP_VERSION
}

/// Current wall-clock time in Unix epoch milliseconds.
pub fn unix_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}

/// App integration error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Camera or capture error.
    #[error("capture error: {0}")]
    Capture(#[from] CaptureError),
    /// Core model error.
    #[error("core error: {0}")]
    Core(#[from] CoreError),
    /// Upload or transport error.
    #[error("upload error: {0}")]
    Upload(#[from] UploadError),
    /// Response contract error.
    #[error("contract error: {0}")]
    Contract(#[from] ContractError),
    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),
    /// Logging could not be initialised.
    #[error("logging error: {0}")]
    Logging(String),
    /// Page markup lacks required elements.
    #[error("page is missing elements: {0}")]
    IncompletePage(String),
}
