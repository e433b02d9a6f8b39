//! V4L2 webcam backend.
//!
//! One mmap stream stays open for the lifetime of the bound preview. A worker
//! thread dequeues every buffer and keeps the newest MJPEG frame, so a capture
//! always sees the live picture rather than a queued stale buffer.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use image::{ImageFormat, RgbaImage};
use tracing::{debug, error};
use v4l::buffer::Type;
use v4l::io::mmap::Stream as MmapStream;
use v4l::io::traits::CaptureStream;
use v4l::video::Capture;
use v4l::{Device, Format, FourCC};

use crate::{CameraBackend, CaptureError, VideoStream};

const MJPEG: &[u8; 4] = b"MJPG";
const STREAM_BUFFERS: u32 = 4;
const FIRST_FRAME_TIMEOUT: Duration = Duration::from_secs(2);

/// Webcam exposed through a V4L2 device node such as `/dev/video0`.
#[derive(Debug, Clone)]
pub struct V4l2Camera {
    device_path: PathBuf,
    width: u32,
    height: u32,
}

impl V4l2Camera {
    /// Creates a backend for `device_path` requesting `width x height` MJPEG.
    pub fn new(device_path: impl AsRef<Path>, width: u32, height: u32) -> Self {
        Self {
            device_path: device_path.as_ref().to_path_buf(),
            width,
            height,
        }
    }
}

impl CameraBackend for V4l2Camera {
    fn name(&self) -> &str {
        "v4l2"
    }

    fn is_available(&self) -> bool {
        self.device_path.exists()
    }

    fn request_video_stream(&self) -> Result<Box<dyn VideoStream>, CaptureError> {
        let device = Device::with_path(&self.device_path).map_err(|error| {
            CaptureError::PermissionDenied(format!(
                "unable to open '{}': {error}",
                self.device_path.display()
            ))
        })?;

        let requested = Format::new(self.width, self.height, FourCC::new(MJPEG));
        let format = Capture::set_format(&device, &requested)
            .map_err(|error| CaptureError::Backend(format!("set format failed: {error}")))?;

        // Drivers may silently switch formats; only MJPEG is decoded here.
        if format.fourcc != FourCC::new(MJPEG) {
            return Err(CaptureError::Backend(
                "MJPEG format not supported by device".to_string(),
            ));
        }

        let latest = Arc::new(LatestFrame::default());
        let running = Arc::new(AtomicBool::new(true));
        let worker = {
            let latest = Arc::clone(&latest);
            let running = Arc::clone(&running);
            thread::Builder::new()
                .name("v4l2-capture".to_string())
                .spawn(move || capture_loop(device, &latest, &running))
                .map_err(|error| CaptureError::Backend(format!("capture thread failed: {error}")))?
        };

        Ok(Box::new(V4l2Stream {
            width: format.width,
            height: format.height,
            latest,
            running,
            worker: Some(worker),
        }))
    }
}

/// Newest encoded frame published by the capture thread.
#[derive(Default)]
struct LatestFrame {
    frame: Mutex<Option<Result<Vec<u8>, String>>>,
    ready: Condvar,
}

impl LatestFrame {
    fn publish(&self, frame: Result<Vec<u8>, String>) {
        *self.frame.lock().unwrap_or_else(PoisonError::into_inner) = Some(frame);
        self.ready.notify_all();
    }
}

fn capture_loop(device: Device, latest: &LatestFrame, running: &AtomicBool) {
    let mut stream = match MmapStream::with_buffers(&device, Type::VideoCapture, STREAM_BUFFERS) {
        Ok(stream) => stream,
        Err(failure) => {
            error!(error = %failure, "v4l2 mmap stream failed");
            latest.publish(Err(format!("mmap stream failed: {failure}")));
            return;
        }
    };

    while running.load(Ordering::SeqCst) {
        match CaptureStream::next(&mut stream) {
            // The mmap buffer is only valid until the next dequeue.
            Ok((data, _metadata)) => latest.publish(Ok(data.to_vec())),
            Err(failure) => {
                error!(error = %failure, "v4l2 frame read failed");
                latest.publish(Err(format!("frame read failed: {failure}")));
                break;
            }
        }
    }
    debug!("v4l2 capture thread finished");
}

struct V4l2Stream {
    width: u32,
    height: u32,
    latest: Arc<LatestFrame>,
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl V4l2Stream {
    fn is_live(&self) -> bool {
        self.worker.is_some()
    }
}

impl VideoStream for V4l2Stream {
    fn video_width(&self) -> u32 {
        if self.is_live() { self.width } else { 0 }
    }

    fn video_height(&self) -> u32 {
        if self.is_live() { self.height } else { 0 }
    }

    fn current_frame(&mut self) -> Result<RgbaImage, CaptureError> {
        if !self.is_live() {
            return Err(CaptureError::Backend("v4l2 stream stopped".to_string()));
        }

        let guard = self
            .latest
            .frame
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let (guard, _timeout) = self
            .latest
            .ready
            .wait_timeout_while(guard, FIRST_FRAME_TIMEOUT, |frame| frame.is_none())
            .unwrap_or_else(PoisonError::into_inner);
        let jpeg = match guard.as_ref() {
            Some(Ok(jpeg)) => jpeg.clone(),
            Some(Err(failure)) => return Err(CaptureError::Backend(failure.clone())),
            None => {
                return Err(CaptureError::Backend(
                    "no frame received from device".to_string(),
                ));
            }
        };
        drop(guard);

        let decoded = image::load_from_memory_with_format(&jpeg, ImageFormat::Jpeg)
            .map_err(|error| CaptureError::Backend(format!("mjpeg decode failed: {error}")))?;
        Ok(decoded.to_rgba8())
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(worker) = self.worker.take() {
            // The worker exits after its current dequeue and drops the device.
            let _ = worker.join();
        }
    }
}
