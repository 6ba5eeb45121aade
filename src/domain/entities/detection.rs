//! Detection Entity
//!
//! A single candidate face surviving the Detection Worker's size and
//! landmark filter, before it is handed to the Recognition Worker.

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{BoundingBox, Landmarks};

/// Minimum crop width/height in pixels a candidate must clear (§4.2).
pub const MIN_FACE_WIDTH: i32 = 60;
pub const MIN_FACE_HEIGHT: i32 = 60;

/// A face detection candidate from a single frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detection {
    bounding_box: BoundingBox,
    confidence: f32,
    landmarks: Landmarks,
}

impl Detection {
    pub fn new(bounding_box: BoundingBox, confidence: f32, landmarks: Landmarks) -> Self {
        Self {
            bounding_box,
            confidence,
            landmarks,
        }
    }

    pub fn bounding_box(&self) -> &BoundingBox {
        &self.bounding_box
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    pub fn landmarks(&self) -> &Landmarks {
        &self.landmarks
    }

    /// Whether this candidate passes the Detection Worker's filter:
    /// both dimensions at or above the minimum, and both eyes located.
    pub fn passes_filter(&self) -> bool {
        self.bounding_box.width() >= MIN_FACE_WIDTH
            && self.bounding_box.height() >= MIN_FACE_HEIGHT
            && self.landmarks.has_both_eyes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::Point;

    fn both_eyes() -> Landmarks {
        Landmarks::new(Some(Point::new(1, 1)), Some(Point::new(2, 2)))
    }

    #[test]
    fn undersized_detection_fails_filter() {
        let bbox = BoundingBox::new(0, 0, 59, 100);
        let d = Detection::new(bbox, 0.9, both_eyes());
        assert!(!d.passes_filter());
    }

    #[test]
    fn missing_landmarks_fails_filter() {
        let bbox = BoundingBox::new(0, 0, 100, 100);
        let d = Detection::new(bbox, 0.9, Landmarks::none());
        assert!(!d.passes_filter());
    }

    #[test]
    fn qualifying_detection_passes_filter() {
        let bbox = BoundingBox::new(0, 0, 60, 60);
        let d = Detection::new(bbox, 0.9, both_eyes());
        assert!(d.passes_filter());
    }
}
