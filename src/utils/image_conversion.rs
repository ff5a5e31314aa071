//! Conversions between OpenCV face crops and emotion model tensors.

use crate::utils::safe_cast::i32_to_usize;
use crate::Result;
use ndarray::Array4;
use opencv::core::{Mat, Size};
use opencv::imgproc::{self, InterpolationFlags};
use opencv::prelude::*;

/// Resize a grayscale face crop and pack it as a `[1, size, size, 1]` tensor
///
/// Pixels are scaled to [-1, 1] as `(p / 255 - 0.5) * 2`.
///
/// # Errors
/// * Returns error if the crop is not single-channel 8-bit
/// * Returns error if resizing or pixel access fails
pub fn gray_face_to_tensor(face: &Mat, size: i32) -> Result<Array4<f32>> {
    if face.channels() != 1 {
        return Err(crate::error::Error::ModelInputError(format!(
            "Expected single-channel face crop, got {} channels",
            face.channels()
        )));
    }
    if face.rows() <= 0 || face.cols() <= 0 || size <= 0 {
        return Err(crate::error::Error::InvalidInput(format!(
            "Invalid face crop {}x{} for input size {}",
            face.cols(),
            face.rows(),
            size
        )));
    }

    let mut resized = Mat::default();
    imgproc::resize(
        face,
        &mut resized,
        Size::new(size, size),
        0.0,
        0.0,
        InterpolationFlags::INTER_LINEAR as i32,
    )?;

    let side = i32_to_usize(size)?;
    let mut data = Vec::with_capacity(side * side);
    for row in 0..size {
        for col in 0..size {
            let pixel = f32::from(*resized.at_2d::<u8>(row, col)?);
            data.push((pixel / 255.0 - 0.5) * 2.0);
        }
    }

    Array4::from_shape_vec((1, side, side, 1), data).map_err(|e| {
        crate::error::Error::ModelInputError(format!("Failed to create input array: {e}"))
    })
}

/// Turn raw model scores into a probability distribution
///
/// Scores that already form a distribution pass through unchanged,
/// anything else goes through a numerically stable softmax.
#[must_use]
pub fn to_probabilities(scores: &[f32]) -> Vec<f32> {
    let sum: f32 = scores.iter().sum();
    let is_distribution = scores.iter().all(|s| (0.0..=1.0).contains(s))
        && (sum - 1.0).abs() <= crate::constants::PROBABILITY_SUM_TOLERANCE;
    if is_distribution {
        return scores.to_vec();
    }

    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = scores.iter().map(|&s| (s - max).exp()).collect();
    let total: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}

/// Round a score to two decimal places
#[must_use]
pub fn round_score(score: f32) -> f32 {
    (score * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencv::core::{Scalar, CV_8UC1, CV_8UC3};

    #[test]
    fn test_gray_face_to_tensor_shape_and_range() {
        let face = Mat::new_rows_cols_with_default(30, 20, CV_8UC1, Scalar::all(255.0)).unwrap();

        let tensor = gray_face_to_tensor(&face, 64).unwrap();
        assert_eq!(tensor.shape(), &[1, 64, 64, 1]);
        assert!(tensor.iter().all(|&v| (v - 1.0).abs() < 1e-6));
    }

    #[test]
    fn test_gray_face_to_tensor_black_is_minus_one() {
        let face = Mat::new_rows_cols_with_default(64, 64, CV_8UC1, Scalar::all(0.0)).unwrap();

        let tensor = gray_face_to_tensor(&face, 64).unwrap();
        assert!(tensor.iter().all(|&v| (v + 1.0).abs() < 1e-6));
    }

    #[test]
    fn test_gray_face_to_tensor_rejects_color() {
        let face = Mat::new_rows_cols_with_default(64, 64, CV_8UC3, Scalar::all(0.0)).unwrap();
        assert!(gray_face_to_tensor(&face, 64).is_err());
    }

    #[test]
    fn test_to_probabilities_passthrough() {
        let probs = vec![0.1, 0.7, 0.2];
        assert_eq!(to_probabilities(&probs), probs);
    }

    #[test]
    fn test_to_probabilities_softmax_logits() {
        let probs = to_probabilities(&[2.0, 1.0, -3.0]);
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        assert!(probs[0] > probs[1]);
        assert!(probs[1] > probs[2]);
    }

    #[test]
    fn test_round_score() {
        assert!((round_score(0.8234) - 0.82).abs() < 1e-6);
        assert!((round_score(0.826) - 0.83).abs() < 1e-6);
        assert_eq!(round_score(0.0), 0.0);
    }
}
