#![warn(missing_docs)]
//! # face-verify-upload
//!
//! ## Purpose
//! Packages the verification request and sends it to the verification
//! endpoint.
//!
//! ## Responsibilities
//! - Validate the endpoint URL and derive sibling routes (`/cleanup`).
//! - Assemble the two-part multipart payload (`file`, `captured_image`).
//! - Execute requests through an injectable async transport.
//!
//! ## Data flow
//! [`DocumentUpload`] + captured [`Blob`] -> [`build_verification_form`] ->
//! [`VerifyClient::submit`] -> [`VerificationTransport`] ->
//! [`TransportResponse`].
//!
//! ## Ownership and lifetimes
//! The form owns copies of both payloads, so later captures cannot alter a
//! request that is already in flight.
//!
//! ## Error model
//! Endpoint policy violations and transport failures are [`UploadError`]
//! values. HTTP error statuses are not errors here: the server reports
//! failures as JSON bodies, which the caller interprets.
//!
//! ## Retry policy
//! Requests are sent exactly once, with no timeout and no retry.

use std::sync::Arc;

use async_trait::async_trait;
use face_verify_core::{Blob, DocumentUpload};
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

/// Endpoint used when no override is configured.
pub const DEFAULT_VERIFY_ENDPOINT: &str = "http://127.0.0.1:5000/upload";

/// Multipart field carrying the identity document.
pub const DOCUMENT_FIELD: &str = "file";

/// Multipart field carrying the captured frame.
pub const CAPTURE_FIELD: &str = "captured_image";

/// File name attached to the captured frame part.
pub const CAPTURE_FILE_NAME: &str = "captured_image.png";

const CLEANUP_ROUTE: &str = "cleanup";

/// One named binary part of a multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartPart {
    /// Form field name.
    pub name: String,
    /// File name advertised in `Content-Disposition`.
    pub file_name: String,
    /// Part `Content-Type`.
    pub media_type: String,
    /// Part body.
    pub bytes: Vec<u8>,
}

/// Ordered multipart body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartForm {
    parts: Vec<MultipartPart>,
}

impl MultipartForm {
    /// Creates an empty form.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a part.
    pub fn append(&mut self, part: MultipartPart) {
        self.parts.push(part);
    }

    /// Returns parts in insertion order.
    pub fn parts(&self) -> &[MultipartPart] {
        &self.parts
    }

    /// Returns the first part named `name`.
    pub fn part(&self, name: &str) -> Option<&MultipartPart> {
        self.parts.iter().find(|part| part.name == name)
    }

    /// Total body bytes across all parts.
    pub fn payload_len(&self) -> usize {
        self.parts.iter().map(|part| part.bytes.len()).sum()
    }
}

/// Builds the verification body: document first, captured frame second.
pub fn build_verification_form(document: &DocumentUpload, capture: &Blob) -> MultipartForm {
    let mut form = MultipartForm::new();
    form.append(MultipartPart {
        name: DOCUMENT_FIELD.to_string(),
        file_name: document.file_name.clone(),
        media_type: document.media_type.clone(),
        bytes: document.bytes.clone(),
    });
    form.append(MultipartPart {
        name: CAPTURE_FIELD.to_string(),
        file_name: CAPTURE_FILE_NAME.to_string(),
        media_type: capture.media_type.clone(),
        bytes: capture.bytes.clone(),
    });
    form
}

/// Status and body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body text.
    pub body: String,
}

/// Abstract HTTP transport used by [`VerifyClient`].
#[async_trait]
pub trait VerificationTransport: Send + Sync {
    /// Sends `form` as a multipart POST to `endpoint`.
    async fn post_multipart(
        &self,
        endpoint: &Url,
        form: MultipartForm,
    ) -> Result<TransportResponse, UploadError>;

    /// Sends a GET to `endpoint`.
    async fn get(&self, endpoint: &Url) -> Result<TransportResponse, UploadError>;
}

/// `reqwest`-backed transport.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Creates a transport with a default client.
    pub fn new() -> Self {
        Self::default()
    }

    async fn into_transport_response(
        response: reqwest::Response,
    ) -> Result<TransportResponse, UploadError> {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|error| UploadError::Network(error.to_string()))?;
        Ok(TransportResponse { status, body })
    }
}

#[async_trait]
impl VerificationTransport for ReqwestTransport {
    async fn post_multipart(
        &self,
        endpoint: &Url,
        form: MultipartForm,
    ) -> Result<TransportResponse, UploadError> {
        let mut body = reqwest::multipart::Form::new();
        for part in form.parts {
            let encoded = reqwest::multipart::Part::bytes(part.bytes)
                .file_name(part.file_name)
                .mime_str(&part.media_type)
                .map_err(|error| UploadError::Encoding(error.to_string()))?;
            body = body.part(part.name, encoded);
        }

        let response = self
            .client
            .post(endpoint.clone())
            .multipart(body)
            .send()
            .await
            .map_err(|error| UploadError::Network(error.to_string()))?;

        Self::into_transport_response(response).await
    }

    async fn get(&self, endpoint: &Url) -> Result<TransportResponse, UploadError> {
        let response = self
            .client
            .get(endpoint.clone())
            .send()
            .await
            .map_err(|error| UploadError::Network(error.to_string()))?;

        Self::into_transport_response(response).await
    }
}

/// Client bound to one validated verification endpoint.
#[derive(Clone)]
pub struct VerifyClient {
    endpoint: Url,
    transport: Arc<dyn VerificationTransport>,
}

impl VerifyClient {
    /// Creates a validated client.
    ///
    /// # Errors
    /// Returns [`UploadError::InvalidEndpoint`] when the endpoint is not an
    /// absolute http(s) URL with a host.
    pub fn new(
        endpoint: &str,
        transport: Arc<dyn VerificationTransport>,
    ) -> Result<Self, UploadError> {
        let endpoint = validate_verify_endpoint(endpoint)?;
        Ok(Self {
            endpoint,
            transport,
        })
    }

    /// Returns the verification endpoint.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Returns the cleanup route next to the verification endpoint.
    ///
    /// # Errors
    /// Returns [`UploadError::InvalidEndpoint`] when the route cannot be
    /// joined onto the endpoint.
    pub fn cleanup_endpoint(&self) -> Result<Url, UploadError> {
        self.endpoint
            .join(CLEANUP_ROUTE)
            .map_err(|error| UploadError::InvalidEndpoint(format!("invalid cleanup url: {error}")))
    }

    /// Sends one verification request.
    ///
    /// # Errors
    /// Propagates transport failures; nothing is retried.
    pub async fn submit(&self, form: MultipartForm) -> Result<TransportResponse, UploadError> {
        info!(
            endpoint = %self.endpoint,
            parts = form.parts().len(),
            payload_bytes = form.payload_len(),
            "sending verification request"
        );
        let response = self.transport.post_multipart(&self.endpoint, form).await?;
        debug!(
            status = response.status,
            body_len = response.body.len(),
            "verification response received"
        );
        Ok(response)
    }

    /// Asks the server to remove stored uploads and results.
    ///
    /// # Errors
    /// Propagates endpoint derivation and transport failures.
    pub async fn cleanup(&self) -> Result<TransportResponse, UploadError> {
        let endpoint = self.cleanup_endpoint()?;
        info!(endpoint = %endpoint, "sending cleanup request");
        self.transport.get(&endpoint).await
    }
}

impl std::fmt::Debug for VerifyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerifyClient")
            .field("endpoint", &self.endpoint.as_str())
            .finish_non_exhaustive()
    }
}

/// Validates a verification endpoint.
///
/// # Errors
/// Returns [`UploadError::InvalidEndpoint`] for unparsable URLs, schemes other
/// than http/https, or URLs without a host.
pub fn validate_verify_endpoint(endpoint: &str) -> Result<Url, UploadError> {
    let parsed = Url::parse(endpoint)
        .map_err(|error| UploadError::InvalidEndpoint(format!("invalid verify url: {error}")))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(UploadError::InvalidEndpoint(format!(
            "unsupported scheme '{}'",
            parsed.scheme()
        )));
    }

    if parsed.host_str().is_none() {
        return Err(UploadError::InvalidEndpoint(
            "verify endpoint must include a host".to_string(),
        ));
    }

    Ok(parsed)
}

/// Upload layer errors.
#[derive(Debug, Error)]
pub enum UploadError {
    /// Endpoint violates URL policy.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
    /// Request could not be encoded.
    #[error("request encoding failure: {0}")]
    Encoding(String),
    /// Connection, transfer or body read failure.
    #[error("network failure: {0}")]
    Network(String),
}

#[cfg(test)]
mod tests {
    //! Unit tests for form assembly and endpoint policy.

    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct RecordingTransport {
        requests: Mutex<Vec<(String, Option<MultipartForm>)>>,
    }

    #[async_trait]
    impl VerificationTransport for RecordingTransport {
        async fn post_multipart(
            &self,
            endpoint: &Url,
            form: MultipartForm,
        ) -> Result<TransportResponse, UploadError> {
            self.requests
                .lock()
                .expect("request lock")
                .push((endpoint.to_string(), Some(form)));
            Ok(TransportResponse {
                status: 200,
                body: "{}".to_string(),
            })
        }

        async fn get(&self, endpoint: &Url) -> Result<TransportResponse, UploadError> {
            self.requests
                .lock()
                .expect("request lock")
                .push((endpoint.to_string(), None));
            Ok(TransportResponse {
                status: 200,
                body: r#"{"message":"ok"}"#.to_string(),
            })
        }
    }

    #[test]
    fn form_orders_document_before_capture() {
        let document = DocumentUpload::new("passport.pdf", b"%PDF".to_vec());
        let capture = Blob {
            media_type: "image/png".to_string(),
            bytes: vec![137, 80, 78, 71],
        };
        let form = build_verification_form(&document, &capture);

        let names: Vec<&str> = form.parts().iter().map(|part| part.name.as_str()).collect();
        assert_eq!(names, vec![DOCUMENT_FIELD, CAPTURE_FIELD]);
        let document_part = form.part(DOCUMENT_FIELD).expect("document part");
        assert_eq!(document_part.media_type, "application/pdf");
        assert_eq!(document_part.file_name, "passport.pdf");
        let capture_part = form.part(CAPTURE_FIELD).expect("capture part");
        assert_eq!(capture_part.bytes, vec![137, 80, 78, 71]);
        assert_eq!(form.payload_len(), 8);
    }

    #[test]
    fn validates_endpoint_policy() {
        assert!(validate_verify_endpoint(DEFAULT_VERIFY_ENDPOINT).is_ok());
        assert!(validate_verify_endpoint("https://verify.example.test/upload").is_ok());
        assert!(validate_verify_endpoint("ftp://127.0.0.1/upload").is_err());
        assert!(validate_verify_endpoint("not a url").is_err());
    }

    #[tokio::test]
    async fn cleanup_targets_sibling_route() {
        let transport = Arc::new(RecordingTransport::default());
        let client = VerifyClient::new(DEFAULT_VERIFY_ENDPOINT, transport.clone())
            .expect("client builds");

        client.cleanup().await.expect("cleanup succeeds");
        client.submit(MultipartForm::new()).await.expect("submit succeeds");

        let requests = transport.requests.lock().expect("request lock");
        assert_eq!(requests[0].0, "http://127.0.0.1:5000/cleanup");
        assert!(requests[0].1.is_none());
        assert_eq!(requests[1].0, DEFAULT_VERIFY_ENDPOINT);
    }
}
