//! Facial Landmarks Value Object
//!
//! The minimal landmark set the detection filter checks for: both eyes
//! present. Anything without both is discarded before it reaches the
//! recognition stage.

use serde::{Deserialize, Serialize};

/// A single 2D point in image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Eye landmarks for a single detected face.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Landmarks {
    left_eye: Option<Point>,
    right_eye: Option<Point>,
}

impl Landmarks {
    pub fn new(left_eye: Option<Point>, right_eye: Option<Point>) -> Self {
        Self {
            left_eye,
            right_eye,
        }
    }

    /// No landmarks detected at all.
    pub fn none() -> Self {
        Self {
            left_eye: None,
            right_eye: None,
        }
    }

    pub fn left_eye(&self) -> Option<Point> {
        self.left_eye
    }

    pub fn right_eye(&self) -> Option<Point> {
        self.right_eye
    }

    /// Whether both eyes were located. The detection filter rejects any
    /// candidate for which this is false.
    pub fn has_both_eyes(&self) -> bool {
        self.left_eye.is_some() && self.right_eye.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_either_eye_fails_both_eyes_check() {
        let only_left = Landmarks::new(Some(Point::new(1, 1)), None);
        assert!(!only_left.has_both_eyes());
    }

    #[test]
    fn both_eyes_present_passes() {
        let both = Landmarks::new(Some(Point::new(1, 1)), Some(Point::new(2, 2)));
        assert!(both.has_both_eyes());
    }

    #[test]
    fn none_has_no_eyes() {
        assert!(!Landmarks::none().has_both_eyes());
    }
}
