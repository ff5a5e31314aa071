//! Utility functions for face crops and numeric conversions.

pub mod image_conversion;
pub mod safe_cast;

use opencv::core::Rect;

/// Grow a face box by `offset` pixels on every side, clipped to the image
///
/// Returns `None` when the clipped box is empty.
#[must_use]
pub fn pad_box(bbox: Rect, offset: i32, max_width: i32, max_height: i32) -> Option<Rect> {
    let x1 = (bbox.x - offset).max(0);
    let y1 = (bbox.y - offset).max(0);
    let x2 = (bbox.x + bbox.width + offset).min(max_width);
    let y2 = (bbox.y + bbox.height + offset).min(max_height);

    if x2 <= x1 || y2 <= y1 {
        return None;
    }

    Some(Rect::new(x1, y1, x2 - x1, y2 - y1))
}
