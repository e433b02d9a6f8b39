#![warn(missing_docs)]
//! # face-verify-core
//!
//! ## Purpose
//! Defines the pure data model shared across the `face-verify` workspace.
//!
//! ## Responsibilities
//! - Decode and encode base64 `data:` URIs into typed binary objects.
//! - Represent captured frames and the single-slot store that holds them.
//! - Represent the identity document selected for upload.
//!
//! ## Data flow
//! Capture code encodes a canvas into a [`CapturedFrame`] and stores it in a
//! [`CaptureSlot`]. Submission reads the slot, turns the frame into a [`Blob`]
//! with [`decode_data_uri`], and packages it next to a [`DocumentUpload`].
//!
//! ## Ownership and lifetimes
//! Frames, blobs and documents own their buffers so a submission can snapshot
//! them before suspending on the network without borrowing page state.
//!
//! ## Error model
//! Malformed data URIs and invalid frame shapes return [`CoreError`] variants.
//!
//! ## Security and privacy notes
//! Document bytes are identified in logs by [`DocumentUpload::fingerprint`]
//! only. Data URI payloads are never formatted into error messages.
//!
//! ## Example
//! ```rust
//! use face_verify_core::decode_data_uri;
//!
//! let blob = decode_data_uri("data:image/png;base64,QUJD").unwrap();
//! assert_eq!(blob.media_type, "image/png");
//! assert_eq!(blob.bytes, b"ABC".to_vec());
//! ```

use std::path::Path;
use std::sync::{Mutex, PoisonError};

use base64::Engine as _;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Media type used for captured frames.
pub const PNG_MEDIA_TYPE: &str = "image/png";

/// Fallback media type for documents with unknown extensions.
pub const OCTET_STREAM_MEDIA_TYPE: &str = "application/octet-stream";

const DATA_URI_SCHEME: &str = "data:";
const BASE64_MARKER: &str = ";base64";

// Browsers accept unpadded input in `atob`, so decoding must too.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Binary object tagged with its declared media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    /// Declared media type, for example `image/png`.
    pub media_type: String,
    /// Decoded payload bytes.
    pub bytes: Vec<u8>,
}

impl Blob {
    /// Returns payload size in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` when the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Decodes a `data:<mime>;base64,<payload>` URI into a [`Blob`].
///
/// The payload boundary is the first comma. The media type is the header text
/// between the scheme colon and the first `;`.
///
/// # Errors
/// Returns [`CoreError::MalformedDataUri`] when the scheme, comma, base64
/// marker or media type is missing, and [`CoreError::InvalidBase64`] when the
/// payload is outside the base64 alphabet.
pub fn decode_data_uri(uri: &str) -> Result<Blob, CoreError> {
    let (header, payload) = uri
        .split_once(',')
        .ok_or(CoreError::MalformedDataUri("missing payload separator"))?;

    let params = header
        .strip_prefix(DATA_URI_SCHEME)
        .ok_or(CoreError::MalformedDataUri("missing data scheme"))?;

    if !params.ends_with(BASE64_MARKER) {
        return Err(CoreError::MalformedDataUri("missing base64 marker"));
    }

    let media_type = params.split(';').next().unwrap_or_default().trim();
    if media_type.is_empty() {
        return Err(CoreError::MalformedDataUri("missing media type"));
    }

    let compact: String = payload
        .chars()
        .filter(|character| !character.is_ascii_whitespace())
        .collect();
    let bytes = LENIENT_BASE64
        .decode(compact.as_bytes())
        .map_err(|error| CoreError::InvalidBase64(error.to_string()))?;

    Ok(Blob {
        media_type: media_type.to_string(),
        bytes,
    })
}

/// Encodes bytes as a `data:<mime>;base64,<payload>` URI.
pub fn encode_data_uri(media_type: &str, bytes: &[u8]) -> String {
    let payload = base64::engine::general_purpose::STANDARD.encode(bytes);
    format!("{DATA_URI_SCHEME}{media_type}{BASE64_MARKER},{payload}")
}

/// One still frame taken from the live camera feed, encoded as a data URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedFrame {
    /// Canvas width in pixels at capture time.
    pub width: u32,
    /// Canvas height in pixels at capture time.
    pub height: u32,
    /// Capture time in Unix epoch milliseconds.
    pub captured_at_ms: u64,
    /// Encoded canvas contents.
    pub data_uri: String,
}

impl CapturedFrame {
    /// Constructs a validated captured frame.
    ///
    /// # Errors
    /// Returns [`CoreError::EmptyFrame`] when either dimension is zero and
    /// [`CoreError::MalformedDataUri`] when `data_uri` lacks the data scheme.
    pub fn new(
        width: u32,
        height: u32,
        captured_at_ms: u64,
        data_uri: impl Into<String>,
    ) -> Result<Self, CoreError> {
        if width == 0 || height == 0 {
            return Err(CoreError::EmptyFrame { width, height });
        }

        let data_uri = data_uri.into();
        if !data_uri.starts_with(DATA_URI_SCHEME) {
            return Err(CoreError::MalformedDataUri("missing data scheme"));
        }

        Ok(Self {
            width,
            height,
            captured_at_ms,
            data_uri,
        })
    }

    /// Decodes the frame into a binary object for upload.
    ///
    /// # Errors
    /// Propagates [`decode_data_uri`] failures.
    pub fn to_blob(&self) -> Result<Blob, CoreError> {
        decode_data_uri(&self.data_uri)
    }

    /// Returns a log-safe description of the encoded payload.
    pub fn log_summary(&self) -> String {
        let media_type = self
            .data_uri
            .strip_prefix(DATA_URI_SCHEME)
            .and_then(|rest| rest.split([';', ',']).next())
            .unwrap_or("unknown");
        format!(
            "{}x{} {media_type} uri_len={}",
            self.width,
            self.height,
            self.data_uri.len()
        )
    }
}

/// Single-slot store for the most recent capture.
///
/// Last write wins. Readers receive a snapshot, so a later capture never
/// changes a frame that was already handed out.
#[derive(Debug, Default)]
pub struct CaptureSlot {
    frame: Mutex<Option<CapturedFrame>>,
}

impl CaptureSlot {
    /// Creates an empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the stored frame.
    pub fn set_captured_frame(&self, frame: CapturedFrame) {
        let mut slot = self.frame.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(frame);
    }

    /// Returns a snapshot of the stored frame, if any.
    pub fn captured_frame(&self) -> Option<CapturedFrame> {
        self.frame
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Identity document chosen by the user for verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentUpload {
    /// File name sent in the multipart part.
    pub file_name: String,
    /// Media type sent in the multipart part.
    pub media_type: String,
    /// Raw file bytes.
    pub bytes: Vec<u8>,
}

impl DocumentUpload {
    /// Creates a document from in-memory bytes, inferring the media type from
    /// the file name extension.
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let media_type = media_type_for_file_name(&file_name).to_string();
        Self {
            file_name,
            media_type,
            bytes,
        }
    }

    /// Reads a document from disk.
    ///
    /// # Errors
    /// Returns [`CoreError::Document`] when the path has no file name or
    /// cannot be read.
    pub fn from_path(path: &Path) -> Result<Self, CoreError> {
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                CoreError::Document(format!("path '{}' has no file name", path.display()))
            })?
            .to_string();

        let bytes = std::fs::read(path).map_err(|error| {
            CoreError::Document(format!("unable to read '{}': {error}", path.display()))
        })?;

        Ok(Self::new(file_name, bytes))
    }

    /// Returns the lowercase hex SHA-256 digest of the document bytes.
    pub fn fingerprint(&self) -> String {
        hex::encode(Sha256::digest(&self.bytes))
    }
}

/// Maps a file name extension to the media type a browser would report.
pub fn media_type_for_file_name(file_name: &str) -> &'static str {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|extension| extension.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("pdf") => "application/pdf",
        Some("png") => PNG_MEDIA_TYPE,
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => OCTET_STREAM_MEDIA_TYPE,
    }
}

/// Error type for core model validation and data URI decoding.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Data URI does not follow `data:<mime>;base64,<payload>`.
    #[error("malformed data uri: {0}")]
    MalformedDataUri(&'static str),
    /// Data URI payload is not valid base64.
    #[error("invalid base64 payload: {0}")]
    InvalidBase64(String),
    /// Captured frame has no usable area.
    #[error("captured frame has zero area ({width}x{height})")]
    EmptyFrame {
        /// Frame width.
        width: u32,
        /// Frame height.
        height: u32,
    },
    /// Document could not be loaded.
    #[error("document error: {0}")]
    Document(String),
}
