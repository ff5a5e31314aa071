//! Constants used throughout the application

/// Default camera index (system default camera)
pub const DEFAULT_CAMERA_INDEX: i32 = 0;

/// Window title for the annotated video
pub const WINDOW_NAME: &str = "Live Emoji Detection";

/// Key that ends the session
pub const EXIT_KEY: u8 = b'q';

/// Key poll timeout after each displayed frame, in milliseconds
pub const POLL_TIMEOUT_MS: i32 = 1;

/// Haar cascade parameters for the overlay face boxes
pub const FACE_SCALE_FACTOR: f64 = 1.3;
pub const FACE_MIN_NEIGHBORS: i32 = 5;

/// Haar cascade parameters for the classifier's own face finder
pub const EMOTION_SCALE_FACTOR: f64 = 1.1;
pub const EMOTION_MIN_NEIGHBORS: i32 = 5;
pub const EMOTION_MIN_FACE_SIZE: i32 = 50;

/// Margin added around each face before cropping for classification
pub const EMOTION_FACE_OFFSET: i32 = 10;

/// Side length of the square grayscale emotion model input
pub const EMOTION_INPUT_SIZE: i32 = 64;

/// Label used when no emotion could be classified
pub const UNKNOWN_LABEL: &str = "unknown";

/// Intensity bar geometry: left edge, top, bottom
pub const BAR_LEFT: i32 = 10;
pub const BAR_TOP: i32 = 50;
pub const BAR_BOTTOM: i32 = 70;

/// Vertical gap between a face box and its label
pub const LABEL_OFFSET_Y: i32 = 10;

/// Tolerance when deciding whether model output is already a distribution
pub const PROBABILITY_SUM_TOLERANCE: f32 = 1e-3;

