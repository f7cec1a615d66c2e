//! Serializable per-face result records.

use serde::{Deserialize, Serialize};

use super::FaceObservation;

/// Face bounding box as emitted in the JSON output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left edge (normalized).
    pub left: f32,
    /// Top edge (normalized, detector convention).
    pub top: f32,
    /// Right edge (normalized).
    pub right: f32,
    /// Bottom edge (normalized, detector convention).
    pub bottom: f32,
}

/// Output record for one detected face.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceRecord {
    /// Face bounding box.
    pub bbox: BoundingBox,
    /// Landmark points as `[x, y]` pairs relative to the bounding box, with
    /// `y` measured from the bottom edge.
    pub landmarks: Vec<[f32; 2]>,
}

impl FaceRecord {
    /// Builds the output record for a detector observation.
    ///
    /// The bounding box is copied as reported. Landmark `y` values are
    /// flipped to `1 - y`; the box edges are not.
    #[must_use]
    pub fn from_observation(observation: &FaceObservation) -> Self {
        let rect = observation.bounding_box;
        Self {
            bbox: BoundingBox {
                left: rect.min_x,
                top: rect.min_y,
                right: rect.max_x,
                bottom: rect.max_y,
            },
            landmarks: observation
                .landmarks
                .iter()
                .map(|p| [p.x, 1.0 - p.y])
                .collect(),
        }
    }

    /// Converts the record to integer pixel coordinates for an image of the
    /// given size.
    ///
    /// Box edges are scaled by the image size and truncated. Landmarks are
    /// scaled by the pixel box size and offset by its left/top edge.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn to_pixels(&self, width: u32, height: u32) -> PixelAnnotation {
        let w = width as f32;
        let h = height as f32;

        let left = (self.bbox.left * w) as i64;
        let top = (self.bbox.top * h) as i64;
        let right = (self.bbox.right * w) as i64;
        let bottom = (self.bbox.bottom * h) as i64;

        let box_w = (right - left) as f32;
        let box_h = (bottom - top) as f32;

        let landmarks = self
            .landmarks
            .iter()
            .map(|[x, y]| {
                [
                    (x * box_w + left as f32) as i64,
                    (y * box_h + top as f32) as i64,
                ]
            })
            .collect();

        PixelAnnotation {
            bbox: PixelBox {
                left,
                top,
                right,
                bottom,
            },
            landmarks,
        }
    }
}

/// Bounding box in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelBox {
    /// Left edge.
    pub left: i64,
    /// Top edge.
    pub top: i64,
    /// Right edge.
    pub right: i64,
    /// Bottom edge.
    pub bottom: i64,
}

/// A face record expressed in image pixels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelAnnotation {
    /// Face bounding box.
    pub bbox: PixelBox,
    /// Landmark points as `[x, y]` pixel pairs.
    pub landmarks: Vec<[i64; 2]>,
}

/// Maps detector observations to output records, preserving order.
#[must_use]
pub fn records_from_observations(observations: &[FaceObservation]) -> Vec<FaceRecord> {
    observations.iter().map(FaceRecord::from_observation).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::domain::{NormalizedPoint, NormalizedRect};

    fn observation() -> FaceObservation {
        FaceObservation {
            bounding_box: NormalizedRect::new(0.25, 0.125, 0.75, 0.625),
            confidence: 0.9,
            landmarks: vec![
                NormalizedPoint::new(0.25, 0.25),
                NormalizedPoint::new(0.5, 0.75),
                NormalizedPoint::new(1.0, 0.0),
            ],
        }
    }

    #[test]
    fn test_landmark_y_is_flipped() {
        let record = FaceRecord::from_observation(&observation());
        assert_eq!(record.landmarks, vec![[0.25, 0.75], [0.5, 0.25], [1.0, 1.0]]);
    }

    #[test]
    fn test_bbox_is_not_flipped() {
        let record = FaceRecord::from_observation(&observation());
        assert_eq!(record.bbox.left, 0.25);
        assert_eq!(record.bbox.top, 0.125);
        assert_eq!(record.bbox.right, 0.75);
        assert_eq!(record.bbox.bottom, 0.625);
    }

    #[test]
    fn test_record_json_shape() {
        let record = FaceRecord::from_observation(&observation());
        let json = serde_json::to_value(&record).unwrap();

        let bbox = json["bbox"].as_object().unwrap();
        assert_eq!(bbox.len(), 4);
        for key in ["left", "top", "right", "bottom"] {
            assert!(bbox[key].is_number(), "{key} should be a number");
        }

        let landmarks = json["landmarks"].as_array().unwrap();
        assert_eq!(landmarks.len(), 3);
        assert!(landmarks
            .iter()
            .all(|p| p.as_array().is_some_and(|pair| pair.len() == 2)));
    }

    #[test]
    fn test_empty_records_serialize_as_empty_array() {
        let records = records_from_observations(&[]);
        assert_eq!(serde_json::to_string(&records).unwrap(), "[]");
    }

    #[test]
    fn test_records_preserve_detector_order() {
        let mut second = observation();
        second.bounding_box = NormalizedRect::new(0.0, 0.0, 0.1, 0.1);
        let records = records_from_observations(&[observation(), second]);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].bbox.left, 0.25);
        assert_eq!(records[1].bbox.left, 0.0);
    }

    #[test]
    fn test_to_pixels() {
        let record = FaceRecord::from_observation(&observation());
        let pixels = record.to_pixels(200, 400);

        assert_eq!(
            pixels.bbox,
            PixelBox {
                left: 50,
                top: 50,
                right: 150,
                bottom: 250
            }
        );
        // Box is 100 x 200 pixels starting at (50, 50).
        assert_eq!(pixels.landmarks[0], [75, 200]);
        assert_eq!(pixels.landmarks[1], [100, 100]);
        assert_eq!(pixels.landmarks[2], [150, 250]);
    }
}
