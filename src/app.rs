//! Main application module: the frame processing loop.

use crate::{
    capture::{CameraCapture, FrameSource, VideoSource},
    config::Config,
    display::{is_exit_key, DisplaySurface, HighguiDisplay},
    emotion::{EmotionClassifier, EmotionReading, EmotionResult, OnnxEmotionClassifier},
    error::Result,
    face_detection::{to_grayscale, FaceLocator, HaarFaceDetector},
    fps::FrameClock,
    overlay::Overlay,
};
use log::{debug, error, info, warn};

/// Why the loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The capture device delivered no frame
    CaptureFailed,
    /// The exit key was pressed
    ExitRequested,
}

/// Loop state machine; `Terminated` is absorbing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Terminated(Termination),
}

/// Loop tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopSettings {
    /// Key that ends the session
    pub exit_key: u8,
    /// Key poll timeout after each frame
    pub poll_timeout_ms: i32,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self {
            exit_key: crate::constants::EXIT_KEY,
            poll_timeout_ms: crate::constants::POLL_TIMEOUT_MS,
        }
    }
}

/// Outcome of a completed run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Frames annotated and displayed
    pub frames_rendered: u64,
    /// Reason the loop stopped
    pub termination: Termination,
}

/// Live emotion overlay loop over a frame source, a face locator, an
/// emotion classifier and a display
pub struct EmojiApp<S, F, C, D>
where
    S: FrameSource,
    F: FaceLocator,
    C: EmotionClassifier,
    D: DisplaySurface,
{
    source: S,
    face_locator: F,
    classifier: C,
    display: D,
    settings: LoopSettings,
    clock: FrameClock,
    state: LoopState,
    frames_rendered: u64,
    shut_down: bool,
}

/// The `OpenCV` and `ONNX` backed application
pub type LiveEmojiApp = EmojiApp<CameraCapture, HaarFaceDetector, OnnxEmotionClassifier, HighguiDisplay>;

impl LiveEmojiApp {
    /// Load models, open the video source and prepare the window
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, a model cannot be
    /// loaded, or the video source cannot be opened (`Error::DeviceOpen`)
    pub fn from_config(config: &Config, source: &VideoSource) -> Result<Self> {
        info!("Initializing Live Emoji Detection");
        config.validate_parameters()?;

        let classifier = OnnxEmotionClassifier::new(
            &config.models.emotion_model,
            &config.models.emotion_cascade,
            config.emotion.params(),
        )?;
        let face_locator = HaarFaceDetector::new(&config.models.face_cascade, config.face_detection.params())?;

        let capture = CameraCapture::open(source)?;
        info!("Opened {}", capture.source());

        let settings = LoopSettings {
            exit_key: config.display.exit_key_byte()?,
            poll_timeout_ms: config.display.poll_timeout_ms,
        };

        Ok(Self::new(
            capture,
            face_locator,
            classifier,
            HighguiDisplay::new(config.display.window_name.clone()),
            settings,
        ))
    }
}

impl<S, F, C, D> EmojiApp<S, F, C, D>
where
    S: FrameSource,
    F: FaceLocator,
    C: EmotionClassifier,
    D: DisplaySurface,
{
    /// Assemble the loop around an already opened source; starts `Running`
    pub fn new(source: S, face_locator: F, classifier: C, display: D, settings: LoopSettings) -> Self {
        Self {
            source,
            face_locator,
            classifier,
            display,
            settings,
            clock: FrameClock::new(),
            state: LoopState::Running,
            frames_rendered: 0,
            shut_down: false,
        }
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Frames rendered so far
    #[must_use]
    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    /// The frame source
    pub fn source(&self) -> &S {
        &self.source
    }

    /// The display surface
    pub fn display(&self) -> &D {
        &self.display
    }

    /// Run one iteration: capture, detect, classify, annotate, show, poll
    ///
    /// Does nothing once terminated.
    ///
    /// # Errors
    ///
    /// Returns an error if grayscale conversion, face detection, drawing or
    /// display fails. Capture failure and classification failure are not errors.
    pub fn step(&mut self) -> Result<LoopState> {
        if self.state != LoopState::Running {
            return Ok(self.state);
        }

        let mut frame = match self.source.read() {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                error!("Failed to capture image");
                self.state = LoopState::Terminated(Termination::CaptureFailed);
                return Ok(self.state);
            }
            Err(e) => {
                error!("Failed to capture image: {}", e);
                self.state = LoopState::Terminated(Termination::CaptureFailed);
                return Ok(self.state);
            }
        };

        let gray = to_grayscale(&frame)?;
        let faces = self.face_locator.detect(&gray)?;

        // Classification sees the color frame, not the boxes found above
        let reading = self.classifier.top_emotion(&frame).unwrap_or_else(|e| {
            warn!("Emotion classification failed: {}", e);
            EmotionReading::none()
        });
        let emotion = EmotionResult::from_reading(reading);

        let fps = self.clock.tick();
        debug!(
            "Frame {}: {} face(s), {}, {:.1} fps",
            self.frames_rendered,
            faces.len(),
            emotion,
            fps
        );

        Overlay::compose(&faces, &emotion, fps).render(&mut frame)?;
        self.display.show(&frame)?;
        self.frames_rendered += 1;

        if let Some(key) = self.display.poll_key(self.settings.poll_timeout_ms)? {
            if is_exit_key(key, self.settings.exit_key) {
                info!("Exit requested by user");
                self.state = LoopState::Terminated(Termination::ExitRequested);
            }
        }

        Ok(self.state)
    }

    /// Step until terminated, then release the source and close the display
    ///
    /// Cleanup also runs when a step fails; the step error is returned
    /// after cleanup.
    ///
    /// # Errors
    ///
    /// Returns the first step error, or a cleanup error
    pub fn run(&mut self) -> Result<RunSummary> {
        info!("Starting main application loop");

        let outcome = loop {
            match self.step() {
                Ok(LoopState::Running) => {}
                Ok(LoopState::Terminated(termination)) => break Ok(termination),
                Err(e) => break Err(e),
            }
        };

        let cleanup = self.shutdown();
        let termination = outcome?;
        cleanup?;

        info!(
            "Application shutting down after {} frames ({:?})",
            self.frames_rendered, termination
        );
        Ok(RunSummary {
            frames_rendered: self.frames_rendered,
            termination,
        })
    }

    /// Release the source and close all windows, once
    ///
    /// # Errors
    ///
    /// Returns the release error, or the display error if release succeeded
    pub fn shutdown(&mut self) -> Result<()> {
        if self.shut_down {
            return Ok(());
        }
        self.shut_down = true;

        let released = self.source.release();
        let destroyed = self.display.destroy_all();
        released.and(destroyed)
    }
}

impl<S, F, C, D> Drop for EmojiApp<S, F, C, D>
where
    S: FrameSource,
    F: FaceLocator,
    C: EmotionClassifier,
    D: DisplaySurface,
{
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            warn!("Error during shutdown: {}", e);
        }
    }
}
