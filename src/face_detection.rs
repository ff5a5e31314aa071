use crate::{constants, Error, Result};
use opencv::core::{Mat, Rect, Size, Vector};
use opencv::imgproc;
use opencv::objdetect::CascadeClassifier;
use opencv::prelude::*;
use std::path::Path;

/// Parameters forwarded to `detect_multi_scale`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionParams {
    /// How much the image shrinks between pyramid levels
    pub scale_factor: f64,
    /// Neighboring candidates needed to keep a detection
    pub min_neighbors: i32,
    /// Smallest face side in pixels (0 = no limit)
    pub min_size: i32,
}

impl Default for DetectionParams {
    fn default() -> Self {
        Self {
            scale_factor: constants::FACE_SCALE_FACTOR,
            min_neighbors: constants::FACE_MIN_NEIGHBORS,
            min_size: 0,
        }
    }
}

/// Anything that can find face boxes in an intensity image
pub trait FaceLocator {
    /// Return zero or more face boxes, in no particular order
    fn detect(&mut self, gray: &Mat) -> Result<Vec<Rect>>;
}

/// Haar cascade face detector
pub struct HaarFaceDetector {
    classifier: CascadeClassifier,
    params: DetectionParams,
}

impl HaarFaceDetector {
    /// Load a cascade from an `OpenCV` XML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be parsed or yields an empty classifier
    pub fn new<P: AsRef<Path>>(cascade_path: P, params: DetectionParams) -> Result<Self> {
        let path = cascade_path.as_ref();
        log::info!("Loading Haar cascade: {}", path.display());

        let path_str = path
            .to_str()
            .ok_or_else(|| Error::InvalidInput(format!("Non UTF-8 cascade path: {}", path.display())))?;

        let classifier = CascadeClassifier::new(path_str)
            .map_err(|e| Error::ModelError(format!("Haar cascade load failed: {e}")))?;

        if classifier.empty()? {
            return Err(Error::ModelError(format!(
                "Haar cascade is empty: {}",
                path.display()
            )));
        }

        Ok(Self { classifier, params })
    }

    /// Detection parameters in use
    #[must_use]
    pub fn params(&self) -> DetectionParams {
        self.params
    }
}

impl FaceLocator for HaarFaceDetector {
    fn detect(&mut self, gray: &Mat) -> Result<Vec<Rect>> {
        let mut faces = Vector::<Rect>::new();
        self.classifier.detect_multi_scale(
            gray,
            &mut faces,
            self.params.scale_factor,
            self.params.min_neighbors,
            0,
            Size::new(self.params.min_size, self.params.min_size),
            Size::new(0, 0),
        )?;

        Ok(faces.to_vec())
    }
}

/// Convert a BGR frame to a single-channel intensity image
///
/// Single-channel input is copied through unchanged.
///
/// # Errors
///
/// Returns an error for channel counts other than 1, 3 or 4
pub fn to_grayscale(frame: &Mat) -> Result<Mat> {
    let code = match frame.channels() {
        1 => return Ok(frame.try_clone()?),
        3 => imgproc::COLOR_BGR2GRAY,
        4 => imgproc::COLOR_BGRA2GRAY,
        n => {
            return Err(Error::InvalidInput(format!(
                "Cannot convert {n}-channel frame to grayscale"
            )))
        }
    };

    let mut gray = Mat::default();
    imgproc::cvt_color(frame, &mut gray, code, 0)?;
    Ok(gray)
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencv::core::{Scalar, CV_8UC1, CV_8UC3};

    #[test]
    fn test_default_params() {
        let params = DetectionParams::default();
        assert_eq!(params.scale_factor, 1.3);
        assert_eq!(params.min_neighbors, 5);
        assert_eq!(params.min_size, 0);
    }

    #[test]
    fn test_to_grayscale_from_bgr() {
        let frame =
            Mat::new_rows_cols_with_default(48, 64, CV_8UC3, Scalar::new(255.0, 255.0, 255.0, 0.0))
                .unwrap();

        let gray = to_grayscale(&frame).unwrap();
        assert_eq!(gray.channels(), 1);
        assert_eq!(gray.rows(), 48);
        assert_eq!(gray.cols(), 64);
        assert_eq!(*gray.at_2d::<u8>(0, 0).unwrap(), 255);
    }

    #[test]
    fn test_to_grayscale_passthrough() {
        let frame = Mat::new_rows_cols_with_default(10, 10, CV_8UC1, Scalar::all(42.0)).unwrap();

        let gray = to_grayscale(&frame).unwrap();
        assert_eq!(*gray.at_2d::<u8>(5, 5).unwrap(), 42);
    }

    #[test]
    fn test_missing_cascade_is_model_error() {
        let result = HaarFaceDetector::new("/nonexistent/cascade.xml", DetectionParams::default());
        assert!(result.is_err());
    }
}
