#![warn(missing_docs)]
//! # face-verify-contract
//!
//! ## Purpose
//! Defines the verification endpoint response schema and client-side
//! interpretation helpers.
//!
//! ## Responsibilities
//! - Parse verification and cleanup responses.
//! - Split every verification response into exactly one of a report or a
//!   server-reported error.
//! - Map the categorical match result and cross-check the identifier hash.
//!
//! ## Data flow
//! Raw JSON body -> [`parse_verification_response`] ->
//! [`VerificationOutcome`] -> result rendering.
//!
//! ## Ownership and lifetimes
//! Parsed values are owned so they outlive the transient response buffer.
//!
//! ## Error model
//! Bodies that are not a JSON object return [`ContractError`].
//!
//! ## Compatibility notes
//! Field names and the `"Match"` sentinel mirror the only known server. Every
//! field is optional and unknown fields are ignored, so additions on the
//! server side do not break the client.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// `verification_result` value that denotes a face match.
pub const MATCH_SENTINEL: &str = "Match";

/// Raw response body of the verification endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VerificationResponse {
    /// Server-reported failure.
    #[serde(default)]
    pub error: Option<String>,
    /// Categorical match result.
    #[serde(default)]
    pub verification_result: Option<String>,
    /// Identifier extracted from the document.
    #[serde(default)]
    pub passport_number: Option<String>,
    /// Content hash of the extracted identifier.
    #[serde(default)]
    pub hash: Option<String>,
    /// Image URI of the identifier QR code.
    #[serde(default)]
    pub qr_code: Option<String>,
    /// Image URI of the face extracted from the document.
    #[serde(default)]
    pub face_image: Option<String>,
    /// Image URI of the face found in the live capture.
    #[serde(default)]
    pub real_time_face: Option<String>,
    /// Embedding distance between the two faces.
    #[serde(default)]
    pub distance_score: Option<f64>,
    /// Human-readable confidence, for example `87.5%`.
    #[serde(default)]
    pub confidence: Option<String>,
}

/// Categorical verification judgement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchOutcome {
    /// Faces match.
    Match,
    /// Faces do not match, or the server reported anything else.
    NoMatch,
}

impl MatchOutcome {
    /// Maps a raw `verification_result` value.
    pub fn from_result(raw: Option<&str>) -> Self {
        if raw == Some(MATCH_SENTINEL) {
            Self::Match
        } else {
            Self::NoMatch
        }
    }
}

/// Successful verification result.
#[derive(Debug, Clone, PartialEq)]
pub struct VerificationReport {
    /// Mapped match outcome.
    pub outcome: MatchOutcome,
    /// Raw result string as sent by the server.
    pub raw_result: Option<String>,
    /// Extracted identifier; `None` when absent or empty.
    pub passport_number: Option<String>,
    /// Content hash.
    pub hash: Option<String>,
    /// QR code image URI.
    pub qr_code: Option<String>,
    /// Extracted face image URI.
    pub face_image: Option<String>,
    /// Captured face image URI.
    pub real_time_face: Option<String>,
    /// Embedding distance.
    pub distance_score: Option<f64>,
    /// Confidence text.
    pub confidence: Option<String>,
}

impl VerificationReport {
    /// Cross-checks `hash` against BLAKE3 of the extracted identifier.
    pub fn hash_check(&self) -> HashCheck {
        match (&self.passport_number, &self.hash) {
            (Some(identifier), Some(hash)) => {
                if identifier_hash(identifier).eq_ignore_ascii_case(hash.trim()) {
                    HashCheck::Consistent
                } else {
                    HashCheck::Mismatch
                }
            }
            _ => HashCheck::NotChecked,
        }
    }
}

/// Outcome of the identifier hash cross-check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashCheck {
    /// Server hash equals the locally computed hash.
    Consistent,
    /// Server hash differs from the locally computed hash.
    Mismatch,
    /// Identifier or hash missing.
    NotChecked,
}

/// Exactly one of a report or a server-reported error.
#[derive(Debug, Clone, PartialEq)]
pub enum VerificationOutcome {
    /// Verification completed.
    Report(VerificationReport),
    /// Server reported an error message.
    ServerError(String),
}

/// Parses a verification response body.
///
/// A non-empty `error` field wins over every other field.
///
/// # Errors
/// Returns [`ContractError::Decode`] when `raw` is not a JSON object of the
/// expected shape.
pub fn parse_verification_response(raw: &str) -> Result<VerificationOutcome, ContractError> {
    let response: VerificationResponse = serde_json::from_str(raw)?;
    Ok(interpret_response(response))
}

/// Splits a decoded response into report or server error.
pub fn interpret_response(response: VerificationResponse) -> VerificationOutcome {
    if let Some(error) = response.error.filter(|error| !error.is_empty()) {
        return VerificationOutcome::ServerError(error);
    }

    VerificationOutcome::Report(VerificationReport {
        outcome: MatchOutcome::from_result(response.verification_result.as_deref()),
        raw_result: response.verification_result,
        passport_number: response.passport_number.filter(|number| !number.is_empty()),
        hash: response.hash,
        qr_code: response.qr_code,
        face_image: response.face_image,
        real_time_face: response.real_time_face,
        distance_score: response.distance_score,
        confidence: response.confidence,
    })
}

/// Lowercase hex BLAKE3 digest of an extracted identifier.
pub fn identifier_hash(identifier: &str) -> String {
    blake3::hash(identifier.as_bytes()).to_hex().to_string()
}

/// Raw response body of the cleanup endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupResponse {
    /// Success message.
    #[serde(default)]
    pub message: Option<String>,
    /// Server-reported failure.
    #[serde(default)]
    pub error: Option<String>,
}

/// Interpreted cleanup result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupOutcome {
    /// Server removed its uploads and results.
    Cleaned(String),
    /// Server reported an error message.
    ServerError(String),
}

/// Parses a cleanup response body.
///
/// # Errors
/// Returns [`ContractError::Decode`] for invalid JSON and
/// [`ContractError::InvalidContract`] when neither field is present.
pub fn parse_cleanup_response(raw: &str) -> Result<CleanupOutcome, ContractError> {
    let response: CleanupResponse = serde_json::from_str(raw)?;

    match (response.error, response.message) {
        (Some(error), _) if !error.is_empty() => Ok(CleanupOutcome::ServerError(error)),
        (_, Some(message)) => Ok(CleanupOutcome::Cleaned(message)),
        _ => Err(ContractError::InvalidContract(
            "cleanup response has neither message nor error".to_string(),
        )),
    }
}

/// Response contract errors.
#[derive(Debug, Error)]
pub enum ContractError {
    /// JSON decode failure.
    #[error("response decode failure: {0}")]
    Decode(#[from] serde_json::Error),
    /// Parsed payload violates contract expectations.
    #[error("response contract violation: {0}")]
    InvalidContract(String),
}
