//! Emotion classification for whole frames.
//!
//! The classifier finds faces on its own, independently of the overlay face
//! detector, and reports the single most confident emotion across them.

use crate::{
    constants,
    face_detection::{to_grayscale, DetectionParams, FaceLocator, HaarFaceDetector},
    utils::{
        image_conversion::{gray_face_to_tensor, round_score, to_probabilities},
        pad_box,
    },
    Error, Result,
};
use ndarray::CowArray;
use opencv::core::Mat;
use opencv::prelude::*;
use ort::{Environment, Session, Value};
use std::path::Path;
use std::sync::Arc;

/// Emotion classes in model output order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Emotion {
    Angry,
    Disgust,
    Fear,
    Happy,
    Sad,
    Surprise,
    Neutral,
}

impl Emotion {
    /// All classes, indexed like the model output
    pub const ALL: [Emotion; 7] = [
        Emotion::Angry,
        Emotion::Disgust,
        Emotion::Fear,
        Emotion::Happy,
        Emotion::Sad,
        Emotion::Surprise,
        Emotion::Neutral,
    ];

    /// Map a model output index to its class
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Lowercase label as reported to the overlay
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Emotion::Angry => "angry",
            Emotion::Disgust => "disgust",
            Emotion::Fear => "fear",
            Emotion::Happy => "happy",
            Emotion::Sad => "sad",
            Emotion::Surprise => "surprise",
            Emotion::Neutral => "neutral",
        }
    }
}

impl std::fmt::Display for Emotion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw classifier answer; both fields are absent when no face was found
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmotionReading {
    pub label: Option<String>,
    pub confidence: Option<f32>,
}

impl EmotionReading {
    /// A reading with a label and a score
    pub fn new(label: impl Into<String>, confidence: f32) -> Self {
        Self {
            label: Some(label.into()),
            confidence: Some(confidence),
        }
    }

    /// The empty reading
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }
}

/// Per-frame emotion with defaults applied
#[derive(Debug, Clone, PartialEq)]
pub struct EmotionResult {
    /// Emotion label, `unknown` when nothing was classified
    pub label: String,
    /// Confidence in [0, 1]
    pub confidence: f32,
}

impl EmotionResult {
    /// Result used when classification produced nothing
    #[must_use]
    pub fn unknown() -> Self {
        Self {
            label: constants::UNKNOWN_LABEL.to_string(),
            confidence: 0.0,
        }
    }

    /// Fill in defaults for missing fields and clamp the confidence to [0, 1]
    #[must_use]
    pub fn from_reading(reading: EmotionReading) -> Self {
        let label = reading
            .label
            .unwrap_or_else(|| constants::UNKNOWN_LABEL.to_string());
        let confidence = match reading.confidence {
            Some(c) if c.is_finite() => c.clamp(0.0, 1.0),
            _ => 0.0,
        };
        Self { label, confidence }
    }

    /// Whether a real label was produced
    #[must_use]
    pub fn is_known(&self) -> bool {
        self.label != constants::UNKNOWN_LABEL
    }
}

impl std::fmt::Display for EmotionResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({:.2})", self.label, self.confidence)
    }
}

/// Anything that reports the dominant emotion in a color frame
pub trait EmotionClassifier {
    /// Most confident (label, score) over all faces found in `frame`
    fn top_emotion(&mut self, frame: &Mat) -> Result<EmotionReading>;
}

/// Pick the most confident class across per-face probability vectors
///
/// Ties keep the earlier face. Indices past the known classes are ignored.
#[must_use]
pub fn pick_top(per_face: &[Vec<f32>]) -> Option<(Emotion, f32)> {
    let mut best: Option<(Emotion, f32)> = None;

    for probabilities in per_face {
        for (index, &score) in probabilities.iter().enumerate() {
            let Some(emotion) = Emotion::from_index(index) else {
                continue;
            };
            if !score.is_finite() {
                continue;
            }
            if best.map_or(true, |(_, top)| score > top) {
                best = Some((emotion, score));
            }
        }
    }

    best
}

/// Parameters for the classifier's own face finder and crops
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmotionParams {
    pub detection: DetectionParams,
    /// Margin in pixels added around each face before cropping
    pub face_offset: i32,
    /// Square model input side
    pub input_size: i32,
}

impl Default for EmotionParams {
    fn default() -> Self {
        Self {
            detection: DetectionParams {
                scale_factor: constants::EMOTION_SCALE_FACTOR,
                min_neighbors: constants::EMOTION_MIN_NEIGHBORS,
                min_size: constants::EMOTION_MIN_FACE_SIZE,
            },
            face_offset: constants::EMOTION_FACE_OFFSET,
            input_size: constants::EMOTION_INPUT_SIZE,
        }
    }
}

/// Memory layout the model expects for its single-channel input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputLayout {
    /// `[1, H, W, 1]`
    Nhwc,
    /// `[1, 1, H, W]`
    Nchw,
}

/// Emotion classifier backed by an `ONNX` model and a Haar face finder
pub struct OnnxEmotionClassifier {
    session: Session,
    face_finder: HaarFaceDetector,
    params: EmotionParams,
    layout: InputLayout,
}

impl OnnxEmotionClassifier {
    /// Load the emotion model and the face cascade
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The ONNX model file cannot be loaded
    /// - The model has no inputs
    /// - The face cascade cannot be loaded
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(
        model_path: P,
        cascade_path: Q,
        params: EmotionParams,
    ) -> Result<Self> {
        log::info!(
            "Initializing emotion classifier with model: {}",
            model_path.as_ref().display()
        );
        let environment = Arc::new(
            Environment::builder()
                .with_name("emotion_classifier")
                .with_log_level(ort::LoggingLevel::Warning)
                .build()?,
        );

        let session = ort::SessionBuilder::new(&environment)?
            .with_optimization_level(ort::GraphOptimizationLevel::Level3)?
            .with_model_from_file(model_path)?;

        let input_meta = session
            .inputs
            .first()
            .ok_or_else(|| Error::ModelInputError("Model has no inputs".to_string()))?;

        // A leading channel axis of 1 means NCHW, otherwise assume Keras-style NHWC
        let layout = match input_meta.dimensions.get(1) {
            Some(Some(1)) if input_meta.dimensions.len() == 4 => InputLayout::Nchw,
            _ => InputLayout::Nhwc,
        };

        let mut params = params;
        let spatial_index = if layout == InputLayout::Nchw { 2 } else { 1 };
        if let Some(Some(side)) = input_meta.dimensions.get(spatial_index) {
            if let Ok(side) = i32::try_from(*side) {
                if side > 0 && side != params.input_size {
                    log::info!("Using model input size {} instead of {}", side, params.input_size);
                    params.input_size = side;
                }
            }
        }

        let face_finder = HaarFaceDetector::new(cascade_path, params.detection)?;

        Ok(Self {
            session,
            face_finder,
            params,
            layout,
        })
    }

    /// Class probabilities for one grayscale face crop
    fn classify_face(&self, face: &Mat) -> Result<Vec<f32>> {
        let tensor = gray_face_to_tensor(face, self.params.input_size)?;
        let side = tensor.shape()[1];
        let tensor = match self.layout {
            InputLayout::Nhwc => tensor.into_dyn(),
            // Single channel: same buffer, different axis order
            InputLayout::Nchw => tensor
                .into_shape((1, 1, side, side))
                .map_err(|e| Error::ModelInputError(format!("Failed to reshape input: {e}")))?
                .into_dyn(),
        };

        let cow_array = CowArray::from(tensor);
        let input_tensor = Value::from_array(self.session.allocator(), &cow_array)?;
        let outputs = self.session.run(vec![input_tensor])?;

        let output = outputs
            .first()
            .ok_or_else(|| Error::ModelOutputError("No output from model".to_string()))?;
        let extracted = output.try_extract::<f32>()?;
        let scores: Vec<f32> = extracted.view().iter().copied().collect();

        if scores.is_empty() {
            return Err(Error::ModelOutputError("Empty model output".to_string()));
        }

        Ok(to_probabilities(&scores).into_iter().map(round_score).collect())
    }
}

impl EmotionClassifier for OnnxEmotionClassifier {
    fn top_emotion(&mut self, frame: &Mat) -> Result<EmotionReading> {
        let gray = to_grayscale(frame)?;
        let faces = self.face_finder.detect(&gray)?;

        let mut per_face = Vec::with_capacity(faces.len());
        for face in faces {
            let Some(region) = pad_box(face, self.params.face_offset, gray.cols(), gray.rows())
            else {
                continue;
            };
            let crop = Mat::roi(&gray, region)?.try_clone()?;
            per_face.push(self.classify_face(&crop)?);
        }

        Ok(match pick_top(&per_face) {
            Some((emotion, score)) => EmotionReading::new(emotion.as_str(), score),
            None => EmotionReading::none(),
        })
    }
}
