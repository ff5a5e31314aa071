//! Overlay composition and rendering.
//!
//! A frame's annotations are first composed into a list of [`DrawOp`]s and
//! then rendered onto the frame in that order. Composition is pure, so the
//! exact overlay for a given detection result can be inspected without a
//! frame or a window.

use crate::{
    constants::{BAR_BOTTOM, BAR_LEFT, BAR_TOP, LABEL_OFFSET_Y},
    emotion::EmotionResult,
    utils::safe_cast::{f32_to_i32_clamp, f64_to_i32_saturating},
    Result,
};
use opencv::{
    core::{Mat, Point, Rect, Scalar},
    imgproc::{self, FILLED, FONT_HERSHEY_SIMPLEX, LINE_8},
};

/// BGR color
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub b: f64,
    pub g: f64,
    pub r: f64,
}

impl Color {
    pub const BLUE: Color = Color { b: 255.0, g: 0.0, r: 0.0 };
    pub const GREEN: Color = Color { b: 0.0, g: 255.0, r: 0.0 };

    fn to_scalar(self) -> Scalar {
        Scalar::new(self.b, self.g, self.r, 0.0)
    }
}

/// One drawing primitive
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    /// Axis-aligned rectangle between two corners; `thickness` of `FILLED` fills it
    Rectangle {
        top_left: Point,
        bottom_right: Point,
        color: Color,
        thickness: i32,
    },
    /// Hershey simplex text with its bottom-left corner at `origin`
    Text {
        text: String,
        origin: Point,
        scale: f64,
        color: Color,
        thickness: i32,
    },
}

/// Emoji glyph for an emotion label, empty for anything unmapped
#[must_use]
pub fn emoji_for(label: &str) -> &'static str {
    match label {
        "happy" => "😊",
        "sad" => "😞",
        "angry" => "😡",
        "surprise" => "😲",
        "fear" => "😨",
        "disgust" => "🤢",
        "neutral" => "😐",
        _ => "",
    }
}

/// Text drawn above each face box
#[must_use]
pub fn label_text(label: &str) -> String {
    match emoji_for(label) {
        "" => label.to_string(),
        glyph => format!("{glyph} {label}"),
    }
}

/// Confidence as a whole percentage in [0, 100]
#[must_use]
pub fn intensity_percent(confidence: f32) -> i32 {
    f32_to_i32_clamp((confidence * 100.0).round(), 0, 100)
}

/// Right edge of the intensity bar, in [10, 110]
#[must_use]
pub fn intensity_bar_end(intensity: i32) -> i32 {
    BAR_LEFT + intensity.clamp(0, 100)
}

/// Frame rate readout
#[must_use]
pub fn fps_text(fps: f64) -> String {
    format!("FPS: {}", f64_to_i32_saturating(fps))
}

/// Ordered draw operations for one frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overlay {
    ops: Vec<DrawOp>,
}

impl Overlay {
    /// Build the overlay for one frame
    ///
    /// Every face box gets an outline and the emotion label; the intensity
    /// bar, its readout and the frame rate are always drawn.
    #[must_use]
    pub fn compose(faces: &[Rect], emotion: &EmotionResult, fps: f64) -> Self {
        let mut ops = Vec::with_capacity(faces.len() * 2 + 3);

        for face in faces {
            ops.push(DrawOp::Rectangle {
                top_left: Point::new(face.x, face.y),
                bottom_right: Point::new(face.x + face.width, face.y + face.height),
                color: Color::BLUE,
                thickness: 2,
            });
            ops.push(DrawOp::Text {
                text: label_text(&emotion.label),
                origin: Point::new(face.x, face.y - LABEL_OFFSET_Y),
                scale: 0.9,
                color: Color::GREEN,
                thickness: 2,
            });
        }

        let intensity = intensity_percent(emotion.confidence);
        ops.push(DrawOp::Rectangle {
            top_left: Point::new(BAR_LEFT, BAR_TOP),
            bottom_right: Point::new(intensity_bar_end(intensity), BAR_BOTTOM),
            color: Color::GREEN,
            thickness: FILLED,
        });
        ops.push(DrawOp::Text {
            text: format!("Emotion Intensity: {intensity}%"),
            origin: Point::new(10, 90),
            scale: 0.6,
            color: Color::GREEN,
            thickness: 1,
        });

        ops.push(DrawOp::Text {
            text: fps_text(fps),
            origin: Point::new(10, 30),
            scale: 1.0,
            color: Color::GREEN,
            thickness: 2,
        });

        Self { ops }
    }

    /// All operations in draw order
    #[must_use]
    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    /// Text strings in draw order
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            DrawOp::Rectangle { .. } => None,
        })
    }

    /// Outlined (non-filled) rectangles, i.e. face boxes
    #[must_use]
    pub fn face_box_count(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, DrawOp::Rectangle { thickness, .. } if *thickness != FILLED))
            .count()
    }

    /// Right edge of the filled intensity bar, if composed
    #[must_use]
    pub fn bar_end(&self) -> Option<i32> {
        self.ops.iter().find_map(|op| match op {
            DrawOp::Rectangle {
                bottom_right,
                thickness,
                ..
            } if *thickness == FILLED => Some(bottom_right.x),
            _ => None,
        })
    }

    /// Draw every operation onto `frame`
    ///
    /// # Errors
    ///
    /// Returns an error if an `OpenCV` drawing call fails
    pub fn render(&self, frame: &mut Mat) -> Result<()> {
        for op in &self.ops {
            match op {
                DrawOp::Rectangle {
                    top_left,
                    bottom_right,
                    color,
                    thickness,
                } => {
                    imgproc::rectangle_points(
                        frame,
                        *top_left,
                        *bottom_right,
                        color.to_scalar(),
                        *thickness,
                        LINE_8,
                        0,
                    )?;
                }
                DrawOp::Text {
                    text,
                    origin,
                    scale,
                    color,
                    thickness,
                } => {
                    imgproc::put_text(
                        frame,
                        text,
                        *origin,
                        FONT_HERSHEY_SIMPLEX,
                        *scale,
                        color.to_scalar(),
                        *thickness,
                        LINE_8,
                        false,
                    )?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencv::core::{Vec3b, CV_8UC3};
    use opencv::prelude::*;
    use proptest::prelude::*;

    #[test]
    fn test_emoji_mapping() {
        assert_eq!(emoji_for("happy"), "😊");
        assert_eq!(emoji_for("sad"), "😞");
        assert_eq!(emoji_for("angry"), "😡");
        assert_eq!(emoji_for("surprise"), "😲");
        assert_eq!(emoji_for("fear"), "😨");
        assert_eq!(emoji_for("disgust"), "🤢");
        assert_eq!(emoji_for("neutral"), "😐");
    }

    #[test]
    fn test_emoji_fallback() {
        assert_eq!(emoji_for("contempt"), "");
        assert_eq!(emoji_for("unknown"), "");
        assert_eq!(emoji_for(""), "");
        assert_eq!(emoji_for("Happy"), "");
        assert_eq!(label_text("contempt"), "contempt");
    }

    #[test]
    fn test_label_text() {
        assert_eq!(label_text("happy"), "😊 happy");
        assert_eq!(label_text("neutral"), "😐 neutral");
    }

    #[test]
    fn test_intensity_bounds() {
        assert_eq!(intensity_percent(0.0), 0);
        assert_eq!(intensity_percent(1.0), 100);
        assert_eq!(intensity_percent(0.82), 82);
        assert_eq!(intensity_bar_end(0), 10);
        assert_eq!(intensity_bar_end(100), 110);
    }

    #[test]
    fn test_fps_text_truncates() {
        assert_eq!(fps_text(29.9), "FPS: 29");
        assert_eq!(fps_text(0.0), "FPS: 0");
    }

    #[test]
    fn test_compose_draw_order() {
        let emotion = EmotionResult {
            label: "sad".to_string(),
            confidence: 0.4,
        };
        let overlay = Overlay::compose(&[Rect::new(5, 40, 30, 30)], &emotion, 12.5);

        let texts: Vec<&str> = overlay.texts().collect();
        assert_eq!(texts, vec!["😞 sad", "Emotion Intensity: 40%", "FPS: 12"]);
        assert_eq!(overlay.ops().len(), 5);
        assert_eq!(overlay.face_box_count(), 1);
        assert_eq!(overlay.bar_end(), Some(50));

        match &overlay.ops()[1] {
            DrawOp::Text { origin, .. } => assert_eq!(*origin, Point::new(5, 30)),
            other => panic!("Expected label text, got {other:?}"),
        }
    }

    #[test]
    fn test_render_draws_bar_pixels() {
        let mut frame = Mat::zeros(120, 160, CV_8UC3).unwrap().to_mat().unwrap();
        let emotion = EmotionResult {
            label: "happy".to_string(),
            confidence: 1.0,
        };

        Overlay::compose(&[], &emotion, 0.0).render(&mut frame).unwrap();

        // Inside the filled bar
        let pixel = *frame.at_2d::<Vec3b>(60, 100).unwrap();
        assert_eq!((pixel[0], pixel[1], pixel[2]), (0, 255, 0));
        // Right of the bar stays black
        let pixel = *frame.at_2d::<Vec3b>(60, 140).unwrap();
        assert_eq!((pixel[0], pixel[1], pixel[2]), (0, 0, 0));
    }

    proptest! {
        #[test]
        fn prop_intensity_in_range(confidence in 0.0f32..=1.0) {
            let intensity = intensity_percent(confidence);
            prop_assert!((0..=100).contains(&intensity));
            prop_assert_eq!(intensity, (confidence * 100.0).round() as i32);

            let end = intensity_bar_end(intensity);
            prop_assert!((10..=110).contains(&end));
            prop_assert_eq!(end, intensity + 10);
        }

        #[test]
        fn prop_unmapped_labels_have_empty_prefix(label in "[a-z]{1,12}") {
            prop_assume!(!["happy", "sad", "angry", "surprise", "fear", "disgust", "neutral"]
                .contains(&label.as_str()));
            prop_assert_eq!(emoji_for(&label), "");
            prop_assert_eq!(label_text(&label), label.clone());
        }
    }
}
