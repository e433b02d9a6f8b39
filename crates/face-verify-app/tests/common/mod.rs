//! Shared fixtures for app integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use face_verify_app::{PageController, PageElements};
use face_verify_capture::SyntheticCamera;
use face_verify_core::DocumentUpload;
use face_verify_upload::{
    MultipartForm, TransportResponse, UploadError, VerificationTransport, VerifyClient,
};
use tokio::sync::Notify;
use url::Url;

/// Successful response matching the documented shape.
#[allow(dead_code)]
pub const MATCH_BODY: &str = r#"{
    "verification_result":"Match",
    "passport_number":"P123",
    "hash":"abc",
    "qr_code":"data:image/png;base64,UVI=",
    "face_image":"data:image/png;base64,RkFDRQ==",
    "real_time_face":"data:image/png;base64,TElWRQ=="
}"#;

/// Scripted behaviour of [`MockTransport`].
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub enum Scripted {
    /// Respond with status and body.
    Body(u16, String),
    /// Fail at the network layer.
    Fail(String),
}

/// Transport that records requests and replays one scripted response.
#[derive(Debug)]
pub struct MockTransport {
    script: Scripted,
    gate: Option<Arc<Notify>>,
    calls: AtomicUsize,
    forms: Mutex<Vec<MultipartForm>>,
    urls: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl MockTransport {
    pub fn new(script: Scripted) -> Self {
        Self {
            script,
            gate: None,
            calls: AtomicUsize::new(0),
            forms: Mutex::new(Vec::new()),
            urls: Mutex::new(Vec::new()),
        }
    }

    pub fn responding(body: &str) -> Self {
        Self::new(Scripted::Body(200, body.to_string()))
    }

    /// Holds every response until `gate` is notified.
    pub fn gated(body: &str, gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::responding(body)
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn forms(&self) -> Vec<MultipartForm> {
        self.forms.lock().expect("forms lock").clone()
    }

    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().expect("urls lock").clone()
    }

    async fn respond(&self, endpoint: &Url) -> Result<TransportResponse, UploadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.urls
            .lock()
            .expect("urls lock")
            .push(endpoint.to_string());

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        match &self.script {
            Scripted::Body(status, body) => Ok(TransportResponse {
                status: *status,
                body: body.clone(),
            }),
            Scripted::Fail(reason) => Err(UploadError::Network(reason.clone())),
        }
    }
}

#[async_trait]
impl VerificationTransport for MockTransport {
    async fn post_multipart(
        &self,
        endpoint: &Url,
        form: MultipartForm,
    ) -> Result<TransportResponse, UploadError> {
        self.forms.lock().expect("forms lock").push(form);
        self.respond(endpoint).await
    }

    async fn get(&self, endpoint: &Url) -> Result<TransportResponse, UploadError> {
        self.respond(endpoint).await
    }
}

/// Creates a small document fixture.
#[allow(dead_code)]
pub fn fixture_document() -> DocumentUpload {
    DocumentUpload::new("passport.pdf", b"%PDF-1.4 fixture".to_vec())
}

/// Mounts a complete page on a synthetic 8x6 camera.
#[allow(dead_code)]
pub fn mounted_page(transport: Arc<MockTransport>) -> PageController {
    mounted_page_with_camera(transport, &SyntheticCamera::new(8, 6))
}

/// Mounts a complete page on the given camera.
#[allow(dead_code)]
pub fn mounted_page_with_camera(
    transport: Arc<MockTransport>,
    camera: &SyntheticCamera,
) -> PageController {
    let client = VerifyClient::new("http://127.0.0.1:5000/upload", transport)
        .expect("client should build");
    PageController::mount(PageElements::complete(), client, camera)
        .expect("complete page should wire")
}
