//! Bounding Box Value Object
//!
//! Represents a rectangular region in an image.

use serde::{Deserialize, Serialize};

/// A bounding box defining a rectangular region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    x: i32,
    y: i32,
    width: i32,
    height: i32,
}

impl BoundingBox {
    /// Creates a new bounding box.
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn y(&self) -> i32 {
        self.y
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// Returns the center point of the bounding box.
    pub fn center(&self) -> (i32, i32) {
        (self.x + self.width / 2, self.y + self.height / 2)
    }

    /// Returns the right edge x coordinate.
    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    /// Returns the bottom edge y coordinate.
    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    /// Scales the bounding box by a factor.
    pub fn scale(&self, factor: f32) -> Self {
        let center = self.center();
        let new_width = (self.width as f32 * factor) as i32;
        let new_height = (self.height as f32 * factor) as i32;

        Self {
            x: center.0 - new_width / 2,
            y: center.1 - new_height / 2,
            width: new_width,
            height: new_height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_is_calculated_correctly() {
        let bbox = BoundingBox::new(10, 20, 100, 100);
        assert_eq!(bbox.center(), (60, 70));
    }

    #[test]
    fn right_and_bottom_are_calculated_correctly() {
        let bbox = BoundingBox::new(10, 20, 100, 50);
        assert_eq!(bbox.right(), 110);
        assert_eq!(bbox.bottom(), 70);
    }

    #[test]
    fn scale_grows_around_the_same_center() {
        let bbox = BoundingBox::new(10, 10, 100, 100);
        let scaled = bbox.scale(1.2);
        assert_eq!(scaled.center(), bbox.center());
        assert_eq!(scaled.width(), 120);
        assert_eq!(scaled.height(), 120);
    }
}
