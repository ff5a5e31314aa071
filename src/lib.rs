//! Live emotion detection with emoji overlays.
//!
//! Each frame from a webcam (or a video file) goes through:
//! 1. A Haar cascade face detector that produces the boxes drawn on screen
//! 2. An `ONNX` emotion classifier that reports the dominant emotion in the frame
//! 3. An overlay with face boxes, emoji labels, an intensity bar and the frame rate
//!
//! The loop is generic over its four collaborators ([`capture::FrameSource`],
//! [`face_detection::FaceLocator`], [`emotion::EmotionClassifier`],
//! [`display::DisplaySurface`]), so it can be driven by scripted providers
//! as well as by `OpenCV`.
//!
//! # Examples
//!
//! ## Composing an overlay
//!
//! ```
//! use live_emoji_detection::{emotion::EmotionResult, overlay::Overlay};
//! use opencv::core::Rect;
//!
//! let emotion = EmotionResult { label: "happy".to_string(), confidence: 0.82 };
//! let overlay = Overlay::compose(&[Rect::new(10, 10, 50, 50)], &emotion, 30.0);
//!
//! assert_eq!(overlay.texts().next(), Some("😊 happy"));
//! assert_eq!(overlay.bar_end(), Some(92));
//! ```
//!
//! ## Running the webcam loop
//!
//! ```no_run
//! use live_emoji_detection::{app::LiveEmojiApp, capture::VideoSource, config::Config};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::default();
//! let mut app = LiveEmojiApp::from_config(&config, &VideoSource::Camera(0))?;
//! let summary = app.run()?;
//! println!("Rendered {} frames", summary.frames_rendered);
//! # Ok(())
//! # }
//! ```

/// Frame acquisition from cameras and video files
pub mod capture;

/// Haar cascade face detection
pub mod face_detection;

/// Emotion classification
pub mod emotion;

/// Overlay composition and rendering
pub mod overlay;

/// Frame rate measurement
pub mod fps;

/// Window output and key polling
pub mod display;

/// Utility functions for face crops and numeric conversions
pub mod utils;

/// Error types and result handling
pub mod error;

/// Main application module
pub mod app;

/// Constants used throughout the application
pub mod constants;

/// Configuration management
pub mod config;

pub use error::{Error, Result};
