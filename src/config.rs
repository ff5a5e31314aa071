//! Configuration management for the live emoji detection application

use crate::{
    constants,
    emotion::EmotionParams,
    face_detection::DetectionParams,
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Model configuration
    pub models: ModelConfig,

    /// Overlay face detection configuration
    pub face_detection: FaceDetectionConfig,

    /// Emotion classifier configuration
    pub emotion: EmotionConfig,

    /// Capture configuration
    pub capture: CaptureConfig,

    /// Display configuration
    pub display: DisplayConfig,
}

/// Model file paths configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Haar cascade for the overlay face boxes
    pub face_cascade: PathBuf,

    /// Haar cascade for the classifier's face finder
    pub emotion_cascade: PathBuf,

    /// Path to the emotion ONNX model
    pub emotion_model: PathBuf,
}

/// Overlay face detection parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaceDetectionConfig {
    /// Pyramid scale factor (> 1.0)
    pub scale_factor: f64,

    /// Minimum neighboring detections
    pub min_neighbors: i32,

    /// Minimum face side in pixels (0 = no limit)
    pub min_face_size: i32,
}

/// Emotion classifier parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmotionConfig {
    /// Pyramid scale factor for the classifier's face finder
    pub scale_factor: f64,

    /// Minimum neighboring detections for the classifier's face finder
    pub min_neighbors: i32,

    /// Minimum face side in pixels
    pub min_face_size: i32,

    /// Crop margin around each face
    pub face_offset: i32,

    /// Square model input side
    pub input_size: i32,
}

/// Capture configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Camera index
    pub camera_index: i32,
}

/// Display configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Window title
    pub window_name: String,

    /// Key that ends the session
    pub exit_key: char,

    /// Key poll timeout in milliseconds
    pub poll_timeout_ms: i32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            face_cascade: PathBuf::from("assets/haarcascade_frontalface_default.xml"),
            emotion_cascade: PathBuf::from("assets/haarcascade_frontalface_default.xml"),
            emotion_model: PathBuf::from("assets/emotion_model.onnx"),
        }
    }
}

impl Default for FaceDetectionConfig {
    fn default() -> Self {
        Self {
            scale_factor: constants::FACE_SCALE_FACTOR,
            min_neighbors: constants::FACE_MIN_NEIGHBORS,
            min_face_size: 0,
        }
    }
}

impl Default for EmotionConfig {
    fn default() -> Self {
        Self {
            scale_factor: constants::EMOTION_SCALE_FACTOR,
            min_neighbors: constants::EMOTION_MIN_NEIGHBORS,
            min_face_size: constants::EMOTION_MIN_FACE_SIZE,
            face_offset: constants::EMOTION_FACE_OFFSET,
            input_size: constants::EMOTION_INPUT_SIZE,
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            camera_index: constants::DEFAULT_CAMERA_INDEX,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            window_name: constants::WINDOW_NAME.to_string(),
            exit_key: char::from(constants::EXIT_KEY),
            poll_timeout_ms: constants::POLL_TIMEOUT_MS,
        }
    }
}

impl FaceDetectionConfig {
    /// Parameters for the overlay face detector
    #[must_use]
    pub fn params(&self) -> DetectionParams {
        DetectionParams {
            scale_factor: self.scale_factor,
            min_neighbors: self.min_neighbors,
            min_size: self.min_face_size,
        }
    }
}

impl EmotionConfig {
    /// Parameters for the emotion classifier
    #[must_use]
    pub fn params(&self) -> EmotionParams {
        EmotionParams {
            detection: DetectionParams {
                scale_factor: self.scale_factor,
                min_neighbors: self.min_neighbors,
                min_size: self.min_face_size,
            },
            face_offset: self.face_offset,
            input_size: self.input_size,
        }
    }
}

impl DisplayConfig {
    /// Exit key as the byte `poll_key` reports
    ///
    /// # Errors
    ///
    /// Returns an error if the key is not ASCII
    pub fn exit_key_byte(&self) -> Result<u8> {
        u8::try_from(self.exit_key)
            .ok()
            .filter(u8::is_ascii)
            .ok_or_else(|| Error::ConfigError(format!("Exit key must be ASCII, got {:?}", self.exit_key)))
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        serde_yaml::from_str(&content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {}", e)))
    }

    /// Save configuration to a YAML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)?;

        Ok(())
    }

    /// Validate parameter ranges
    pub fn validate_parameters(&self) -> Result<()> {
        for (name, scale) in [
            ("face_detection", self.face_detection.scale_factor),
            ("emotion", self.emotion.scale_factor),
        ] {
            if !(scale.is_finite() && scale > 1.0) {
                return Err(Error::ConfigError(format!(
                    "{name}.scale_factor must be greater than 1.0"
                )));
            }
        }
        if self.face_detection.min_neighbors < 0 || self.emotion.min_neighbors < 0 {
            return Err(Error::ConfigError("min_neighbors must not be negative".to_string()));
        }
        if self.face_detection.min_face_size < 0 || self.emotion.min_face_size < 0 {
            return Err(Error::ConfigError("min_face_size must not be negative".to_string()));
        }
        if self.emotion.face_offset < 0 {
            return Err(Error::ConfigError("emotion.face_offset must not be negative".to_string()));
        }
        if self.emotion.input_size <= 0 {
            return Err(Error::ConfigError("emotion.input_size must be greater than 0".to_string()));
        }

        if self.display.poll_timeout_ms < 1 {
            // wait_key(0) would block forever
            return Err(Error::ConfigError("display.poll_timeout_ms must be at least 1".to_string()));
        }
        self.display.exit_key_byte()?;

        Ok(())
    }

    /// Validate parameter ranges and that model files exist
    pub fn validate(&self) -> Result<()> {
        self.validate_parameters()?;

        for (name, path) in [
            ("Face cascade", &self.models.face_cascade),
            ("Emotion cascade", &self.models.emotion_cascade),
            ("Emotion model", &self.models.emotion_model),
        ] {
            if !path.exists() {
                return Err(Error::ConfigError(format!("{name} not found: {}", path.display())));
            }
        }

        Ok(())
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Live Emoji Detection Configuration

# Model paths
models:
  face_cascade: "assets/haarcascade_frontalface_default.xml"
  emotion_cascade: "assets/haarcascade_frontalface_default.xml"
  emotion_model: "assets/emotion_model.onnx"

# Face boxes drawn on the video
face_detection:
  scale_factor: 1.3
  min_neighbors: 5
  min_face_size: 0

# Emotion classifier
emotion:
  scale_factor: 1.1
  min_neighbors: 5
  min_face_size: 50
  face_offset: 10
  input_size: 64

# Capture device
capture:
  camera_index: 0

# Display settings
display:
  window_name: "Live Emoji Detection"
  exit_key: "q"
  poll_timeout_ms: 1
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_example_config_matches_defaults() {
        let parsed: Config = serde_yaml::from_str(EXAMPLE_CONFIG).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let parsed: Config = serde_yaml::from_str("capture:\n  camera_index: 2\n").unwrap();
        assert_eq!(parsed.capture.camera_index, 2);
        assert_eq!(parsed.face_detection, FaceDetectionConfig::default());
        assert_eq!(parsed.display.exit_key, 'q');
    }

    #[test]
    fn test_default_parameters_are_valid() {
        assert!(Config::default().validate_parameters().is_ok());
    }

    #[test]
    fn test_invalid_parameters() {
        let mut config = Config::default();
        config.face_detection.scale_factor = 1.0;
        assert!(config.validate_parameters().is_err());

        let mut config = Config::default();
        config.display.poll_timeout_ms = 0;
        assert!(config.validate_parameters().is_err());

        let mut config = Config::default();
        config.display.exit_key = 'é';
        assert!(matches!(config.validate_parameters(), Err(Error::ConfigError(_))));

        let mut config = Config::default();
        config.emotion.input_size = 0;
        assert!(config.validate_parameters().is_err());
    }

    #[test]
    fn test_missing_models_fail_validation() {
        let mut config = Config::default();
        config.models.emotion_model = PathBuf::from("/nonexistent/emotion.onnx");
        match config.validate() {
            Err(Error::ConfigError(msg)) => assert!(msg.contains("not found")),
            other => panic!("Expected ConfigError, got {other:?}"),
        }
    }

    #[test]
    fn test_params_conversion() {
        let config = Config::default();
        assert_eq!(config.face_detection.params(), DetectionParams::default());
        assert_eq!(config.emotion.params(), EmotionParams::default());
        assert_eq!(config.display.exit_key_byte().unwrap(), b'q');
    }
}
