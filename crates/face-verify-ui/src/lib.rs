#![warn(missing_docs)]
//! # face-verify-ui
//!
//! ## Purpose
//! Defines the page-facing state model for the verification page.
//!
//! ## Responsibilities
//! - Name the page elements the controller binds to.
//! - Hold the user's document selection and the result area contents.
//! - Render verification results as markup or terminal text.
//! - Track per-stage status for the camera, capture, and submission.
//!
//! ## Data flow
//! Controller events write a [`ResultView`] into the [`ResultArea`]; the host
//! renders it with [`ResultView::render_html`] or [`ResultView::render_text`].
//!
//! ## Ownership and lifetimes
//! Element state lives behind short-lived mutex guards so controller methods
//! can take `&self` while a submission is suspended.
//!
//! ## Error model
//! This crate favors explicit state over recoverable errors.
//!
//! ## Security and privacy notes
//! Server-provided strings are HTML-escaped before they reach markup.

use std::sync::{Mutex, PoisonError};

use face_verify_contract::{HashCheck, MatchOutcome, VerificationReport};
use face_verify_core::DocumentUpload;

/// Id of the document file input.
pub const PASSPORT_UPLOAD_ID: &str = "passportUpload";
/// Id of the capture button.
pub const CAPTURE_BUTTON_ID: &str = "captureBtn";
/// Id of the submit button.
pub const SUBMIT_BUTTON_ID: &str = "submitBtn";
/// Id of the live preview element.
pub const WEBCAM_ID: &str = "webcam";
/// Id of the offscreen capture canvas.
pub const CAPTURED_IMAGE_ID: &str = "capturedImage";
/// Id of the result container.
pub const RESULT_ID: &str = "result";

/// Shown when submit is triggered without a document.
pub const MISSING_DOCUMENT_MESSAGE: &str = "❌ Please upload a passport document.";
/// Shown when submit is triggered without a capture.
pub const MISSING_CAPTURE_MESSAGE: &str = "❌ Please capture a real-time face.";
/// Shown while the verification request is in flight.
pub const PENDING_MESSAGE: &str = "⏳ Verifying...";
/// Shown for any transport or decoding failure.
pub const GENERIC_FAILURE_MESSAGE: &str = "❌ Error during verification.";
/// Shown when a capture attempt is rejected.
pub const CAPTURE_FAILED_MESSAGE: &str = "❌ Unable to capture a frame from the camera.";
/// Placeholder for a missing extracted identifier.
pub const NOT_FOUND_PLACEHOLDER: &str = "Not Found";
/// Placeholder for other missing report fields.
pub const NOT_AVAILABLE_PLACEHOLDER: &str = "N/A";

/// Contents of the result area.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ResultView {
    /// Nothing rendered yet.
    #[default]
    Empty,
    /// Validation or failure notice.
    Notice(String),
    /// Request in flight.
    Pending,
    /// Server-reported error.
    ServerError(String),
    /// Completed verification.
    Report(VerificationReport),
}

impl ResultView {
    /// Renders the view as markup for the result container.
    pub fn render_html(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Notice(message) => escape_html(message),
            Self::Pending => PENDING_MESSAGE.to_string(),
            Self::ServerError(error) => format!("❌ Error: {}", escape_html(error)),
            Self::Report(report) => render_report_html(report),
        }
    }

    /// Renders the view as plain text for terminals.
    pub fn render_text(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Notice(message) => message.clone(),
            Self::Pending => PENDING_MESSAGE.to_string(),
            Self::ServerError(error) => format!("❌ Error: {error}"),
            Self::Report(report) => render_report_text(report),
        }
    }

    /// Returns `true` for views that end a submission.
    pub fn is_final(&self) -> bool {
        !matches!(self, Self::Empty | Self::Pending)
    }
}

fn outcome_label(outcome: MatchOutcome) -> &'static str {
    match outcome {
        MatchOutcome::Match => "✅ Face Matched",
        MatchOutcome::NoMatch => "❌ No Match",
    }
}

fn hash_check_label(check: HashCheck) -> &'static str {
    match check {
        HashCheck::Consistent => "consistent",
        HashCheck::Mismatch => "mismatch",
        HashCheck::NotChecked => "not checked",
    }
}

fn or_placeholder<'a>(value: &'a Option<String>, placeholder: &'a str) -> &'a str {
    value.as_deref().unwrap_or(placeholder)
}

fn render_report_html(report: &VerificationReport) -> String {
    let mut html = format!(
        "<strong>Verification Result:</strong> {}<br>\n\
         <strong>Passport Number:</strong> {}<br>\n\
         <strong>Document Hash:</strong> {}<br>\n\
         <strong>Hash Check:</strong> {}<br>\n",
        outcome_label(report.outcome),
        escape_html(or_placeholder(&report.passport_number, NOT_FOUND_PLACEHOLDER)),
        escape_html(or_placeholder(&report.hash, NOT_AVAILABLE_PLACEHOLDER)),
        hash_check_label(report.hash_check()),
    );

    if let Some(score) = report.distance_score {
        html.push_str(&format!("<strong>Distance Score:</strong> {score:.4}<br>\n"));
    }
    if let Some(confidence) = &report.confidence {
        html.push_str(&format!(
            "<strong>Confidence:</strong> {}<br>\n",
            escape_html(confidence)
        ));
    }

    for (title, source, alt) in [
        ("QR Code", &report.qr_code, "QR Code"),
        ("Extracted Face", &report.face_image, "Extracted Face"),
        ("Real-time Captured Face", &report.real_time_face, "Captured Face"),
    ] {
        html.push_str(&format!(
            "<p><strong>{title}:</strong><br><img src=\"{}\" alt=\"{alt}\"></p>\n",
            escape_html(source.as_deref().unwrap_or_default())
        ));
    }

    html
}

fn render_report_text(report: &VerificationReport) -> String {
    let mut lines = vec![
        format!("Verification Result: {}", outcome_label(report.outcome)),
        format!(
            "Passport Number: {}",
            or_placeholder(&report.passport_number, NOT_FOUND_PLACEHOLDER)
        ),
        format!(
            "Document Hash: {}",
            or_placeholder(&report.hash, NOT_AVAILABLE_PLACEHOLDER)
        ),
        format!("Hash Check: {}", hash_check_label(report.hash_check())),
    ];
    if let Some(score) = report.distance_score {
        lines.push(format!("Distance Score: {score:.4}"));
    }
    if let Some(confidence) = &report.confidence {
        lines.push(format!("Confidence: {confidence}"));
    }
    lines.push(format!(
        "QR Code: {}",
        or_placeholder(&report.qr_code, NOT_AVAILABLE_PLACEHOLDER)
    ));
    lines.push(format!(
        "Extracted Face: {}",
        or_placeholder(&report.face_image, NOT_AVAILABLE_PLACEHOLDER)
    ));
    lines.push(format!(
        "Real-time Captured Face: {}",
        or_placeholder(&report.real_time_face, NOT_AVAILABLE_PLACEHOLDER)
    ));
    lines.join("\n")
}

/// Escapes text for use in element content and quoted attributes.
pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for character in raw.chars() {
        match character {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Result container element.
#[derive(Debug, Default)]
pub struct ResultArea {
    view: Mutex<ResultView>,
}

impl ResultArea {
    /// Creates an empty result area.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the rendered view.
    pub fn show(&self, view: ResultView) {
        *self.view.lock().unwrap_or_else(PoisonError::into_inner) = view;
    }

    /// Returns a snapshot of the current view.
    pub fn current(&self) -> ResultView {
        self.view
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the current view rendered as markup.
    pub fn inner_html(&self) -> String {
        self.current().render_html()
    }
}

/// Document file input element.
#[derive(Debug, Default)]
pub struct DocumentInput {
    selected: Mutex<Option<DocumentUpload>>,
}

impl DocumentInput {
    /// Creates an input with no selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the user's file selection.
    pub fn select(&self, document: DocumentUpload) {
        *self.selected.lock().unwrap_or_else(PoisonError::into_inner) = Some(document);
    }

    /// Clears the selection.
    pub fn clear(&self) {
        *self.selected.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Returns a snapshot of the selected document.
    pub fn selected(&self) -> Option<DocumentUpload> {
        self.selected
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Clickable button element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    /// Element id.
    pub id: String,
}

impl Button {
    /// Creates a button with `id`.
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Generic stage status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StageStatus {
    /// Stage has not started.
    #[default]
    Idle,
    /// Stage is running.
    Running,
    /// Stage completed successfully.
    Healthy,
    /// Stage failed without stopping the page.
    Degraded,
}

/// Aggregate page status.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageStatus {
    /// Camera acquisition.
    pub camera: StageStatus,
    /// Most recent capture.
    pub capture: StageStatus,
    /// Most recent submission.
    pub submission: StageStatus,
    /// Diagnostic text for a degraded camera.
    pub camera_notice: Option<String>,
}

impl PageStatus {
    /// Returns `true` when a stream is bound and usable.
    pub fn camera_ready(&self) -> bool {
        self.camera == StageStatus::Healthy
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for result rendering.

    use super::*;

    fn report() -> VerificationReport {
        VerificationReport {
            outcome: MatchOutcome::Match,
            raw_result: Some("Match".to_string()),
            passport_number: Some("P123".to_string()),
            hash: Some("abc".to_string()),
            qr_code: Some("data:image/png;base64,QUJD".to_string()),
            face_image: Some("data:image/png;base64,QUJD".to_string()),
            real_time_face: Some("data:image/png;base64,QUJD".to_string()),
            distance_score: None,
            confidence: None,
        }
    }

    #[test]
    fn report_markup_contains_marker_identifier_and_images() {
        let html = ResultView::Report(report()).render_html();
        assert!(html.contains("✅ Face Matched"));
        assert!(html.contains("P123"));
        assert!(html.contains("abc"));
        assert_eq!(html.matches("<img src=\"data:image/png;base64,QUJD\"").count(), 3);
        assert!(!html.contains("Distance Score"));
    }

    #[test]
    fn missing_identifier_uses_placeholder() {
        let mut no_number = report();
        no_number.passport_number = None;
        no_number.outcome = MatchOutcome::NoMatch;
        let text = ResultView::Report(no_number).render_text();
        assert!(text.contains("Passport Number: Not Found"));
        assert!(text.contains("❌ No Match"));
    }

    #[test]
    fn server_strings_are_escaped() {
        let html = ResultView::ServerError("<script>x</script>".to_string()).render_html();
        assert_eq!(html, "❌ Error: &lt;script&gt;x&lt;/script&gt;");
    }

    #[test]
    fn result_area_replaces_view() {
        let area = ResultArea::new();
        assert_eq!(area.inner_html(), "");
        area.show(ResultView::Pending);
        assert_eq!(area.inner_html(), PENDING_MESSAGE);
        area.show(ResultView::Notice(MISSING_CAPTURE_MESSAGE.to_string()));
        assert!(area.current().is_final());
    }
}
