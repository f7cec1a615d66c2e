//! Raw detector output.

/// A point in normalized `[0,1]` coordinates, top-left origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedPoint {
    /// Horizontal position.
    pub x: f32,
    /// Vertical position, growing downwards.
    pub y: f32,
}

impl NormalizedPoint {
    /// Creates a point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle in normalized image coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedRect {
    /// Left edge.
    pub min_x: f32,
    /// Top edge.
    pub min_y: f32,
    /// Right edge.
    pub max_x: f32,
    /// Bottom edge.
    pub max_y: f32,
}

impl NormalizedRect {
    /// Creates a rectangle from its edges.
    #[must_use]
    pub const fn new(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Rectangle width.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    /// Rectangle height.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    /// Grows the rectangle by `fraction` of its size, half on each side,
    /// clamped to the unit square.
    #[must_use]
    pub fn expand(&self, fraction: f32) -> Self {
        let dx = self.width() * fraction / 2.0;
        let dy = self.height() * fraction / 2.0;
        Self {
            min_x: (self.min_x - dx).max(0.0),
            min_y: (self.min_y - dy).max(0.0),
            max_x: (self.max_x + dx).min(1.0),
            max_y: (self.max_y + dy).min(1.0),
        }
    }

    /// Intersection over union with another rectangle.
    #[must_use]
    pub fn iou(&self, other: &Self) -> f32 {
        let x1 = self.min_x.max(other.min_x);
        let y1 = self.min_y.max(other.min_y);
        let x2 = self.max_x.min(other.max_x);
        let y2 = self.max_y.min(other.max_y);

        let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
        let union = self.width() * self.height() + other.width() * other.height() - intersection;

        if union > 0.0 {
            intersection / union
        } else {
            0.0
        }
    }
}

/// A single face reported by a detector.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceObservation {
    /// Face bounding box relative to the image.
    pub bounding_box: NormalizedRect,
    /// Detection confidence (0.0 to 1.0).
    pub confidence: f32,
    /// Landmark points relative to `bounding_box`: `(0, 0)` is its top-left
    /// corner and `(1, 1)` its bottom-right.
    pub landmarks: Vec<NormalizedPoint>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iou_no_overlap() {
        let a = NormalizedRect::new(0.0, 0.0, 0.5, 0.5);
        let b = NormalizedRect::new(0.6, 0.6, 1.0, 1.0);
        assert!(a.iou(&b).abs() < 1e-6);
    }

    #[test]
    fn test_iou_full_overlap() {
        let a = NormalizedRect::new(0.0, 0.0, 1.0, 1.0);
        assert!((a.iou(&a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_iou_partial_overlap() {
        let a = NormalizedRect::new(0.0, 0.0, 0.5, 0.5);
        let b = NormalizedRect::new(0.25, 0.25, 0.75, 0.75);
        // 0.0625 / (0.25 + 0.25 - 0.0625)
        let expected = 0.0625 / 0.4375;
        assert!((a.iou(&b) - expected).abs() < 1e-6);
    }

    #[test]
    fn test_iou_degenerate_boxes() {
        let a = NormalizedRect::new(0.5, 0.5, 0.5, 0.5);
        assert!(a.iou(&a).abs() < f32::EPSILON);
    }

    #[test]
    fn test_expand_clamps_to_unit_square() {
        let rect = NormalizedRect::new(0.05, 0.4, 0.45, 0.8).expand(0.5);
        assert!(rect.min_x.abs() < f32::EPSILON);
        assert!((rect.min_y - 0.3).abs() < 1e-6);
        assert!((rect.max_x - 0.55).abs() < 1e-6);
        assert!((rect.max_y - 0.9).abs() < 1e-6);
    }
}
