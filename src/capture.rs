//! Frame acquisition from a webcam or a video file.

use crate::error::{Error, Result};
use log::{debug, info, warn};
use opencv::{
    core::Mat,
    prelude::*,
    videoio::{self, VideoCapture, CAP_PROP_BUFFERSIZE},
};

/// Video source type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoSource {
    /// Webcam index
    Camera(i32),
    /// Video file path
    File(String),
}

impl Default for VideoSource {
    fn default() -> Self {
        Self::Camera(crate::constants::DEFAULT_CAMERA_INDEX)
    }
}

impl std::fmt::Display for VideoSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Camera(index) => write!(f, "camera {index}"),
            Self::File(path) => write!(f, "video file {path}"),
        }
    }
}

/// A device that yields one frame per call
pub trait FrameSource {
    /// Read the next frame; `Ok(None)` means the device delivered nothing
    fn read(&mut self) -> Result<Option<Mat>>;

    /// Release the underlying device
    fn release(&mut self) -> Result<()>;
}

/// `OpenCV` backed capture device
pub struct CameraCapture {
    capture: VideoCapture,
    source: VideoSource,
    released: bool,
}

impl CameraCapture {
    /// Open a camera or video file
    ///
    /// # Errors
    ///
    /// Returns `Error::DeviceOpen` if the device cannot be opened
    pub fn open(source: &VideoSource) -> Result<Self> {
        let mut capture = match source {
            VideoSource::Camera(index) => {
                info!("Opening camera {}", index);
                let mut cap = VideoCapture::new(*index, videoio::CAP_ANY)
                    .map_err(|e| Error::DeviceOpen(format!("{source}: {e}")))?;

                if cap.is_opened()? {
                    // Reduce buffer size for lower latency (webcam only)
                    if let Err(e) = cap.set(CAP_PROP_BUFFERSIZE, 1.0) {
                        warn!("Could not set camera buffer size: {}", e);
                    }
                }
                cap
            }
            VideoSource::File(path) => {
                info!("Opening video file: {}", path);
                VideoCapture::from_file(path, videoio::CAP_ANY)
                    .map_err(|e| Error::DeviceOpen(format!("{source}: {e}")))?
            }
        };

        if !capture.is_opened()? {
            // Leave nothing half-open behind
            let _ = capture.release();
            return Err(Error::DeviceOpen(source.to_string()));
        }

        Ok(Self {
            capture,
            source: source.clone(),
            released: false,
        })
    }

    /// The source this device was opened from
    #[must_use]
    pub fn source(&self) -> &VideoSource {
        &self.source
    }
}

impl FrameSource for CameraCapture {
    fn read(&mut self) -> Result<Option<Mat>> {
        if self.released {
            return Err(Error::Capture(format!("{} already released", self.source)));
        }

        let mut frame = Mat::default();
        if !self.capture.read(&mut frame)? || frame.empty() {
            return Ok(None);
        }
        Ok(Some(frame))
    }

    fn release(&mut self) -> Result<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        debug!("Releasing {}", self.source);
        self.capture.release()?;
        Ok(())
    }
}

impl Drop for CameraCapture {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            warn!("Error releasing {}: {}", self.source, e);
        }
    }
}
