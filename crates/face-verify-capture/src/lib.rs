#![warn(missing_docs)]
//! # face-verify-capture
//!
//! ## Purpose
//! Provides camera acquisition, live preview binding, and still-frame capture.
//!
//! ## Responsibilities
//! - Define backend-agnostic camera and video stream traits.
//! - Bind an acquired stream to a [`PreviewSurface`] that releases it on drop.
//! - Draw the current frame onto an offscreen [`CaptureCanvas`] and encode it
//!   as a PNG data URI.
//! - Expose deterministic synthetic and still-image backends for CI and the
//!   CLI, plus a V4L2 webcam backend behind the `v4l2` feature.
//!
//! ## Data flow
//! Page ready -> [`init_webcam`] binds a [`VideoStream`] to the preview ->
//! capture action -> [`capture_frame`] -> [`face_verify_core::CapturedFrame`].
//!
//! ## Ownership and lifetimes
//! The preview surface exclusively owns the bound stream. Frames are copied
//! into owned RGBA buffers before drawing.
//!
//! ## Error model
//! Unavailable capability, denied access, missing stream, zero-sized video and
//! encoding failures are reported as [`CaptureError`] values.
//!
//! ## Security and privacy notes
//! Captured pixels stay in memory; nothing is persisted to disk.

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use face_verify_core::{CapturedFrame, PNG_MEDIA_TYPE, encode_data_uri};
use image::imageops::{self, FilterType};
use image::{ImageFormat, Rgba, RgbaImage};
use thiserror::Error;
use tracing::{debug, error, info};

#[cfg(feature = "v4l2")]
mod v4l2;

#[cfg(feature = "v4l2")]
pub use v4l2::V4l2Camera;

/// Live video stream produced by a camera backend.
pub trait VideoStream: Send {
    /// Intrinsic video width in pixels; zero until frames are produced.
    fn video_width(&self) -> u32;

    /// Intrinsic video height in pixels; zero until frames are produced.
    fn video_height(&self) -> u32;

    /// Returns the frame currently shown by the stream.
    ///
    /// # Errors
    /// Returns [`CaptureError::Backend`] when the device fails to deliver.
    fn current_frame(&mut self) -> Result<RgbaImage, CaptureError>;

    /// Stops the stream and releases the device.
    fn stop(&mut self);
}

/// Camera capability provider.
pub trait CameraBackend: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &str;

    /// Returns `true` when the platform exposes camera access at all.
    fn is_available(&self) -> bool;

    /// Requests a video-only stream.
    ///
    /// # Errors
    /// Returns [`CaptureError::PermissionDenied`] or
    /// [`CaptureError::Backend`] when the stream cannot be opened.
    fn request_video_stream(&self) -> Result<Box<dyn VideoStream>, CaptureError>;
}

/// Preview element that displays the live stream.
///
/// Dropping the surface or calling [`PreviewSurface::release`] stops the bound
/// stream, so the device lock never outlives the page.
#[derive(Default)]
pub struct PreviewSurface {
    stream: Option<Box<dyn VideoStream>>,
}

impl PreviewSurface {
    /// Creates an unbound preview surface.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a stream, stopping any previously bound one.
    pub fn bind(&mut self, stream: Box<dyn VideoStream>) {
        self.release();
        self.stream = Some(stream);
    }

    /// Returns `true` when a stream is bound.
    pub fn is_bound(&self) -> bool {
        self.stream.is_some()
    }

    /// Returns intrinsic `(width, height)` of the bound stream.
    pub fn video_dimensions(&self) -> Option<(u32, u32)> {
        self.stream
            .as_ref()
            .map(|stream| (stream.video_width(), stream.video_height()))
    }

    /// Stops and unbinds the current stream.
    pub fn release(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop();
            debug!("preview stream released");
        }
    }

    fn stream_mut(&mut self) -> Option<&mut Box<dyn VideoStream>> {
        self.stream.as_mut()
    }
}

impl Drop for PreviewSurface {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for PreviewSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewSurface")
            .field("bound", &self.is_bound())
            .field("dimensions", &self.video_dimensions())
            .finish()
    }
}

/// Offscreen drawing surface used to snapshot the preview.
#[derive(Debug, Clone)]
pub struct CaptureCanvas {
    pixels: RgbaImage,
}

impl CaptureCanvas {
    /// Creates an empty zero-sized canvas.
    pub fn new() -> Self {
        Self {
            pixels: RgbaImage::new(0, 0),
        }
    }

    /// Current canvas width.
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    /// Current canvas height.
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Resizes the canvas, clearing its contents.
    pub fn set_size(&mut self, width: u32, height: u32) {
        self.pixels = RgbaImage::new(width, height);
    }

    /// Draws `frame` scaled to fill the whole canvas.
    pub fn draw_image(&mut self, frame: &RgbaImage) {
        let (width, height) = (self.width(), self.height());
        if frame.dimensions() == (width, height) {
            self.pixels.clone_from(frame);
        } else {
            self.pixels = imageops::resize(frame, width, height, FilterType::Triangle);
        }
    }

    /// Encodes canvas contents as a PNG data URI.
    ///
    /// # Errors
    /// Returns [`CaptureError::Encode`] when the canvas is empty or PNG
    /// encoding fails.
    pub fn to_png_data_uri(&self) -> Result<String, CaptureError> {
        if self.width() == 0 || self.height() == 0 {
            return Err(CaptureError::Encode("canvas has zero area".to_string()));
        }

        let mut encoded = Vec::new();
        self.pixels
            .write_to(&mut Cursor::new(&mut encoded), ImageFormat::Png)
            .map_err(|error| CaptureError::Encode(error.to_string()))?;

        Ok(encode_data_uri(PNG_MEDIA_TYPE, &encoded))
    }
}

impl Default for CaptureCanvas {
    fn default() -> Self {
        Self::new()
    }
}

/// Requests a camera stream and binds it to `preview`.
///
/// Failures are logged and returned; the preview stays unbound.
///
/// # Errors
/// Returns [`CaptureError::Unsupported`] when the backend has no camera
/// capability, or the backend's request error.
pub fn init_webcam(
    backend: &dyn CameraBackend,
    preview: &mut PreviewSurface,
) -> Result<(), CaptureError> {
    if !backend.is_available() {
        let failure = CaptureError::Unsupported(backend.name().to_string());
        error!(backend = backend.name(), error = %failure, "camera capability unavailable");
        return Err(failure);
    }

    match backend.request_video_stream() {
        Ok(stream) => {
            info!(
                backend = backend.name(),
                width = stream.video_width(),
                height = stream.video_height(),
                "camera stream bound to preview"
            );
            preview.bind(stream);
            Ok(())
        }
        Err(failure) => {
            error!(backend = backend.name(), error = %failure, "camera not accessible");
            Err(failure)
        }
    }
}

/// Snapshots the live preview into `canvas` and encodes it.
///
/// # Errors
/// Returns [`CaptureError::NoStream`] when the preview is unbound,
/// [`CaptureError::ZeroDimensions`] when the video has no usable size, and
/// propagates frame read and encoding failures.
pub fn capture_frame(
    preview: &mut PreviewSurface,
    canvas: &mut CaptureCanvas,
    captured_at_ms: u64,
) -> Result<CapturedFrame, CaptureError> {
    let stream = preview.stream_mut().ok_or(CaptureError::NoStream)?;

    let (width, height) = (stream.video_width(), stream.video_height());
    if width == 0 || height == 0 {
        return Err(CaptureError::ZeroDimensions { width, height });
    }

    let frame = stream.current_frame()?;
    canvas.set_size(width, height);
    canvas.draw_image(&frame);
    let data_uri = canvas.to_png_data_uri()?;

    CapturedFrame::new(width, height, captured_at_ms, data_uri)
        .map_err(|error| CaptureError::Encode(error.to_string()))
}

/// Deterministic camera for tests and CI.
#[derive(Debug, Clone)]
pub struct SyntheticCamera {
    width: u32,
    height: u32,
    available: bool,
    deny_access: bool,
    stopped: Arc<AtomicBool>,
}

impl SyntheticCamera {
    /// Creates an available camera producing `width x height` gradients.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            available: true,
            deny_access: false,
            stopped: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Camera whose platform lacks the capability entirely.
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new(4, 4)
        }
    }

    /// Camera whose access request is denied.
    pub fn denied() -> Self {
        Self {
            deny_access: true,
            ..Self::new(4, 4)
        }
    }

    /// Returns `true` once a stream opened by this camera has been stopped.
    pub fn was_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

impl Default for SyntheticCamera {
    fn default() -> Self {
        Self::new(4, 4)
    }
}

impl CameraBackend for SyntheticCamera {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn request_video_stream(&self) -> Result<Box<dyn VideoStream>, CaptureError> {
        if self.deny_access {
            return Err(CaptureError::PermissionDenied(
                "synthetic camera configured to deny access".to_string(),
            ));
        }

        Ok(Box::new(SyntheticStream {
            width: self.width,
            height: self.height,
            sequence: 0,
            stopped: Arc::clone(&self.stopped),
        }))
    }
}

#[derive(Debug)]
struct SyntheticStream {
    width: u32,
    height: u32,
    sequence: u8,
    stopped: Arc<AtomicBool>,
}

impl VideoStream for SyntheticStream {
    fn video_width(&self) -> u32 {
        self.width
    }

    fn video_height(&self) -> u32 {
        self.height
    }

    fn current_frame(&mut self) -> Result<RgbaImage, CaptureError> {
        self.sequence = self.sequence.wrapping_add(1);
        let shade = self.sequence;

        Ok(RgbaImage::from_fn(self.width, self.height, |x, y| {
            Rgba([x as u8, y as u8, shade, 255])
        }))
    }

    fn stop(&mut self) {
        self.stopped.store(true, Ordering::SeqCst);
    }
}

/// Camera that serves a still image file as its live feed.
#[derive(Debug, Clone)]
pub struct StillImageCamera {
    path: PathBuf,
}

impl StillImageCamera {
    /// Creates a camera backed by the image at `path`.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl CameraBackend for StillImageCamera {
    fn name(&self) -> &str {
        "still-image"
    }

    fn is_available(&self) -> bool {
        self.path.is_file()
    }

    fn request_video_stream(&self) -> Result<Box<dyn VideoStream>, CaptureError> {
        let image = image::open(&self.path)
            .map_err(|error| {
                CaptureError::Backend(format!(
                    "unable to open '{}': {error}",
                    self.path.display()
                ))
            })?
            .to_rgba8();

        Ok(Box::new(StillImageStream { image: Some(image) }))
    }
}

#[derive(Debug)]
struct StillImageStream {
    image: Option<RgbaImage>,
}

impl VideoStream for StillImageStream {
    fn video_width(&self) -> u32 {
        self.image.as_ref().map_or(0, RgbaImage::width)
    }

    fn video_height(&self) -> u32 {
        self.image.as_ref().map_or(0, RgbaImage::height)
    }

    fn current_frame(&mut self) -> Result<RgbaImage, CaptureError> {
        self.image
            .clone()
            .ok_or_else(|| CaptureError::Backend("still image stream stopped".to_string()))
    }

    fn stop(&mut self) {
        self.image = None;
    }
}

/// Capture layer error type.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// Platform exposes no camera capability.
    #[error("camera capability not supported by backend '{0}'")]
    Unsupported(String),
    /// Access to the camera was refused.
    #[error("camera access denied: {0}")]
    PermissionDenied(String),
    /// Capture attempted before a stream was bound.
    #[error("no camera stream is bound to the preview")]
    NoStream,
    /// Bound stream reports no usable dimensions.
    #[error("video has no usable dimensions ({width}x{height})")]
    ZeroDimensions {
        /// Reported width.
        width: u32,
        /// Reported height.
        height: u32,
    },
    /// Canvas encoding failure.
    #[error("frame encoding failed: {0}")]
    Encode(String),
    /// Backend runtime failure.
    #[error("camera backend failure: {0}")]
    Backend(String),
}

#[cfg(test)]
mod tests {
    //! Unit tests for preview binding and capture behavior.

    use face_verify_core::decode_data_uri;

    use super::*;

    #[test]
    fn captures_png_frame_sized_to_video() {
        let camera = SyntheticCamera::new(8, 6);
        let mut preview = PreviewSurface::new();
        let mut canvas = CaptureCanvas::new();
        init_webcam(&camera, &mut preview).expect("synthetic camera binds");

        let frame = capture_frame(&mut preview, &mut canvas, 42).expect("capture works");
        assert_eq!((frame.width, frame.height), (8, 6));
        assert_eq!((canvas.width(), canvas.height()), (8, 6));
        assert_eq!(frame.captured_at_ms, 42);

        let blob = decode_data_uri(&frame.data_uri).expect("frame is a data uri");
        assert_eq!(blob.media_type, PNG_MEDIA_TYPE);
        let decoded = image::load_from_memory(&blob.bytes).expect("png decodes");
        assert_eq!((decoded.width(), decoded.height()), (8, 6));
    }

    #[test]
    fn rejects_capture_without_stream() {
        let mut preview = PreviewSurface::new();
        let mut canvas = CaptureCanvas::new();
        assert!(matches!(
            capture_frame(&mut preview, &mut canvas, 1),
            Err(CaptureError::NoStream)
        ));
    }

    #[test]
    fn rejects_zero_dimension_video() {
        let mut preview = PreviewSurface::new();
        init_webcam(&SyntheticCamera::new(0, 480), &mut preview).expect("stream binds");
        let mut canvas = CaptureCanvas::new();

        assert!(matches!(
            capture_frame(&mut preview, &mut canvas, 1),
            Err(CaptureError::ZeroDimensions { width: 0, height: 480 })
        ));
    }

    #[test]
    fn unavailable_and_denied_cameras_leave_preview_unbound() {
        let mut preview = PreviewSurface::new();
        assert!(matches!(
            init_webcam(&SyntheticCamera::unavailable(), &mut preview),
            Err(CaptureError::Unsupported(_))
        ));
        assert!(matches!(
            init_webcam(&SyntheticCamera::denied(), &mut preview),
            Err(CaptureError::PermissionDenied(_))
        ));
        assert!(!preview.is_bound());
    }

    #[test]
    fn dropping_preview_stops_stream() {
        let camera = SyntheticCamera::default();
        {
            let mut preview = PreviewSurface::new();
            init_webcam(&camera, &mut preview).expect("stream binds");
            assert!(!camera.was_stopped());
        }
        assert!(camera.was_stopped());
    }

    #[test]
    fn canvas_scales_mismatched_frames() {
        let mut canvas = CaptureCanvas::new();
        canvas.set_size(2, 2);
        canvas.draw_image(&RgbaImage::from_pixel(4, 4, Rgba([9, 9, 9, 255])));
        assert_eq!((canvas.width(), canvas.height()), (2, 2));
        assert!(canvas.to_png_data_uri().is_ok());
    }
}
