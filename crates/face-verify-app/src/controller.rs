//! Verification page controller.

use std::sync::{Mutex, MutexGuard, PoisonError};

use face_verify_capture::{
    CameraBackend, CaptureCanvas, CaptureError, PreviewSurface, capture_frame, init_webcam,
};
use face_verify_contract::{
    CleanupOutcome, VerificationOutcome, parse_cleanup_response, parse_verification_response,
};
use face_verify_core::{CaptureSlot, CapturedFrame};
use face_verify_ui::{
    Button, CAPTURE_BUTTON_ID, CAPTURE_FAILED_MESSAGE, CAPTURED_IMAGE_ID, DocumentInput,
    GENERIC_FAILURE_MESSAGE, MISSING_CAPTURE_MESSAGE, MISSING_DOCUMENT_MESSAGE,
    PASSPORT_UPLOAD_ID, PageStatus, RESULT_ID, ResultArea, ResultView, SUBMIT_BUTTON_ID,
    StageStatus, WEBCAM_ID,
};
use face_verify_upload::{VerifyClient, build_verification_form};
use tracing::{error, info, warn};

use crate::{AppError, unix_timestamp_ms};

/// Elements found on the verification page; `None` marks a missing element.
#[derive(Debug, Default)]
pub struct PageElements {
    /// Document file input.
    pub passport_upload: Option<DocumentInput>,
    /// Capture button.
    pub capture_button: Option<Button>,
    /// Submit button.
    pub submit_button: Option<Button>,
    /// Live preview.
    pub webcam: Option<PreviewSurface>,
    /// Offscreen capture canvas.
    pub captured_image: Option<CaptureCanvas>,
    /// Result container.
    pub result: Option<ResultArea>,
}

impl PageElements {
    /// A fully rendered page with the standard element ids.
    pub fn complete() -> Self {
        Self {
            passport_upload: Some(DocumentInput::new()),
            capture_button: Some(Button::new(CAPTURE_BUTTON_ID)),
            submit_button: Some(Button::new(SUBMIT_BUTTON_ID)),
            webcam: Some(PreviewSurface::new()),
            captured_image: Some(CaptureCanvas::new()),
            result: Some(ResultArea::new()),
        }
    }

    /// Ids of the elements that are absent.
    pub fn missing_ids(&self) -> Vec<&'static str> {
        [
            (self.passport_upload.is_none(), PASSPORT_UPLOAD_ID),
            (self.capture_button.is_none(), CAPTURE_BUTTON_ID),
            (self.submit_button.is_none(), SUBMIT_BUTTON_ID),
            (self.webcam.is_none(), WEBCAM_ID),
            (self.captured_image.is_none(), CAPTURED_IMAGE_ID),
            (self.result.is_none(), RESULT_ID),
        ]
        .into_iter()
        .filter_map(|(missing, id)| missing.then_some(id))
        .collect()
    }
}

/// Effect of a click dispatched to the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    /// Capture button stored a new frame.
    Captured(CapturedFrame),
    /// Capture button was rejected; the notice is in the result area.
    CaptureRejected,
    /// Submit button finished with this view.
    Submitted(ResultView),
    /// Click target is not wired.
    Ignored,
}

/// Controller for the capture-and-submit page.
#[derive(Debug)]
pub struct PageController {
    document_input: DocumentInput,
    capture_button: Button,
    submit_button: Button,
    preview: Mutex<PreviewSurface>,
    canvas: Mutex<CaptureCanvas>,
    result: ResultArea,
    slot: CaptureSlot,
    status: Mutex<PageStatus>,
    client: VerifyClient,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl PageController {
    /// Wires the page when every required element is present.
    ///
    /// Returns `None` and wires nothing when any element is missing.
    pub fn wire(elements: PageElements, client: VerifyClient) -> Option<Self> {
        let missing = elements.missing_ids();
        if !missing.is_empty() {
            warn!(?missing, "verification page incomplete; flow not wired");
            return None;
        }

        let PageElements {
            passport_upload: Some(document_input),
            capture_button: Some(capture_button),
            submit_button: Some(submit_button),
            webcam: Some(preview),
            captured_image: Some(canvas),
            result: Some(result),
        } = elements
        else {
            return None;
        };

        info!(endpoint = %client.endpoint(), "verification page wired");
        Some(Self {
            document_input,
            capture_button,
            submit_button,
            preview: Mutex::new(preview),
            canvas: Mutex::new(canvas),
            result,
            slot: CaptureSlot::new(),
            status: Mutex::new(PageStatus::default()),
            client,
        })
    }

    /// Wires the page and starts the webcam, as on page ready.
    ///
    /// Camera failures are logged and recorded in [`PageController::status`];
    /// the page stays usable.
    pub fn mount(
        elements: PageElements,
        client: VerifyClient,
        camera: &dyn CameraBackend,
    ) -> Option<Self> {
        let controller = Self::wire(elements, client)?;
        // Failure is already logged and recorded in the page status.
        let _ = controller.init_webcam(camera);
        Some(controller)
    }

    /// Requests a camera stream and binds it to the preview.
    ///
    /// # Errors
    /// Returns the capture layer error; the preview stays unbound and the
    /// result area is left untouched.
    pub fn init_webcam(&self, camera: &dyn CameraBackend) -> Result<(), CaptureError> {
        lock(&self.status).camera = StageStatus::Running;
        let bound = init_webcam(camera, &mut lock(&self.preview));

        let mut status = lock(&self.status);
        match &bound {
            Ok(()) => {
                status.camera = StageStatus::Healthy;
                status.camera_notice = None;
            }
            Err(failure) => {
                status.camera = StageStatus::Degraded;
                status.camera_notice = Some(failure.to_string());
            }
        }
        bound
    }

    /// Stops the camera stream.
    pub fn release_camera(&self) {
        lock(&self.preview).release();
        lock(&self.status).camera = StageStatus::Idle;
    }

    /// Snapshots the live preview into the capture slot.
    ///
    /// # Errors
    /// Returns [`AppError::Capture`] when no usable stream is bound; the slot
    /// keeps its previous frame and the result area shows a notice.
    pub fn capture(&self) -> Result<CapturedFrame, AppError> {
        let captured = {
            let mut preview = lock(&self.preview);
            let mut canvas = lock(&self.canvas);
            capture_frame(&mut preview, &mut canvas, unix_timestamp_ms())
        };

        match captured {
            Ok(frame) => {
                info!(frame = %frame.log_summary(), "frame captured");
                self.slot.set_captured_frame(frame.clone());
                lock(&self.status).capture = StageStatus::Healthy;
                Ok(frame)
            }
            Err(failure) => {
                warn!(error = %failure, "capture rejected");
                lock(&self.status).capture = StageStatus::Degraded;
                self.result
                    .show(ResultView::Notice(CAPTURE_FAILED_MESSAGE.to_string()));
                Err(failure.into())
            }
        }
    }

    /// Replaces the stored capture.
    pub fn set_captured_frame(&self, frame: CapturedFrame) {
        self.slot.set_captured_frame(frame);
    }

    /// Returns the stored capture.
    pub fn captured_frame(&self) -> Option<CapturedFrame> {
        self.slot.captured_frame()
    }

    /// Validates inputs, uploads them, and renders the outcome.
    ///
    /// Exactly one request is made when both the document and a capture are
    /// present; none otherwise.
    pub async fn submit(&self) -> ResultView {
        let view = self.run_submission().await;
        self.result.show(view.clone());
        view
    }

    async fn run_submission(&self) -> ResultView {
        let Some(document) = self.document_input.selected() else {
            info!("submission blocked: no document selected");
            return ResultView::Notice(MISSING_DOCUMENT_MESSAGE.to_string());
        };
        let Some(frame) = self.slot.captured_frame() else {
            info!("submission blocked: no frame captured");
            return ResultView::Notice(MISSING_CAPTURE_MESSAGE.to_string());
        };

        let capture = match frame.to_blob() {
            Ok(blob) => blob,
            Err(failure) => {
                error!(error = %failure, "captured frame could not be decoded");
                return self.fail_submission();
            }
        };

        let form = build_verification_form(&document, &capture);
        self.result.show(ResultView::Pending);
        lock(&self.status).submission = StageStatus::Running;
        info!(
            document = %document.fingerprint(),
            document_bytes = document.bytes.len(),
            frame = %frame.log_summary(),
            "verification submitted"
        );

        let response = match self.client.submit(form).await {
            Ok(response) => response,
            Err(failure) => {
                error!(error = %failure, "verification transport failed");
                return self.fail_submission();
            }
        };

        match parse_verification_response(&response.body) {
            Ok(VerificationOutcome::Report(report)) => {
                info!(
                    status = response.status,
                    outcome = ?report.outcome,
                    result = report.raw_result.as_deref().unwrap_or_default(),
                    hash_check = ?report.hash_check(),
                    "verification completed"
                );
                lock(&self.status).submission = StageStatus::Healthy;
                ResultView::Report(report)
            }
            Ok(VerificationOutcome::ServerError(message)) => {
                warn!(status = response.status, error = %message, "server rejected verification");
                lock(&self.status).submission = StageStatus::Degraded;
                ResultView::ServerError(message)
            }
            Err(failure) => {
                error!(
                    status = response.status,
                    error = %failure,
                    "verification response unreadable"
                );
                self.fail_submission()
            }
        }
    }

    fn fail_submission(&self) -> ResultView {
        lock(&self.status).submission = StageStatus::Degraded;
        ResultView::Notice(GENERIC_FAILURE_MESSAGE.to_string())
    }

    /// Dispatches a click on the element with `element_id`.
    pub async fn click(&self, element_id: &str) -> ClickOutcome {
        if element_id == self.capture_button.id {
            match self.capture() {
                Ok(frame) => ClickOutcome::Captured(frame),
                Err(_) => ClickOutcome::CaptureRejected,
            }
        } else if element_id == self.submit_button.id {
            ClickOutcome::Submitted(self.submit().await)
        } else {
            ClickOutcome::Ignored
        }
    }

    /// Asks the server to remove its stored uploads and results.
    ///
    /// # Errors
    /// Returns [`AppError::Upload`] for transport failures and
    /// [`AppError::Contract`] for unreadable responses.
    pub async fn cleanup(&self) -> Result<CleanupOutcome, AppError> {
        let response = self.client.cleanup().await?;
        let outcome = parse_cleanup_response(&response.body)?;
        info!(status = response.status, outcome = ?outcome, "cleanup finished");
        Ok(outcome)
    }

    /// Document file input.
    pub fn document_input(&self) -> &DocumentInput {
        &self.document_input
    }

    /// Result container.
    pub fn result(&self) -> &ResultArea {
        &self.result
    }

    /// Snapshot of the page status.
    pub fn status(&self) -> PageStatus {
        lock(&self.status).clone()
    }

    /// Returns `true` when a camera stream is bound to the preview.
    pub fn camera_bound(&self) -> bool {
        lock(&self.preview).is_bound()
    }

    /// Verification client.
    pub fn client(&self) -> &VerifyClient {
        &self.client
    }
}
