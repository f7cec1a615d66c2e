//! `BlazeFace` face detection model.
//!
//! Front-camera `BlazeFace` ("`BlazeFace`: Sub-millisecond Neural Face Detection
//! on Mobile GPUs") with weights converted from hollance/BlazeFace-PyTorch,
//! `BatchNorm` folded into the convolution biases.

#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]

use anyhow::{Context, Result};
use candle_core::{DType, Device, Module, Tensor};
use candle_nn::{conv2d, Conv2d, Conv2dConfig, VarBuilder};
use image::DynamicImage;

use super::{clamp_unit, sigmoid};
use crate::domain::NormalizedRect;

/// Input image size for `BlazeFace`.
pub const INPUT_SIZE: usize = 128;

/// Number of anchor boxes (detections).
const NUM_ANCHORS: usize = 896;

/// Anchors on the 16x16 grid (2 per cell).
const ANCHORS_16: usize = 512;

/// Anchors on the 8x8 grid (6 per cell).
const ANCHORS_8: usize = 384;

/// Values regressed per anchor: box (4) + six keypoints (12, unused).
const VALUES_PER_ANCHOR: usize = 16;

/// `(in, out, stride)` for each 3x3 block of the first backbone.
const BACKBONE1: [(usize, usize, usize); 11] = [
    (24, 24, 1),
    (24, 28, 1),
    (28, 32, 2),
    (32, 36, 1),
    (36, 42, 1),
    (42, 48, 2),
    (48, 56, 1),
    (56, 64, 1),
    (64, 72, 1),
    (72, 80, 1),
    (80, 88, 1),
];

/// `(in, out, stride)` for each 3x3 block of the second backbone.
const BACKBONE2: [(usize, usize, usize); 5] = [
    (88, 96, 2),
    (96, 96, 1),
    (96, 96, 1),
    (96, 96, 1),
    (96, 96, 1),
];

/// A face found by `BlazeFace`.
#[derive(Debug, Clone)]
pub struct FaceDetection {
    /// Face bounding box in normalized image coordinates.
    pub bbox: NormalizedRect,
    /// Detection confidence score.
    pub score: f32,
}

/// Depthwise-separable residual block.
struct BlazeBlock {
    depthwise: Conv2d,
    pointwise: Conv2d,
    channel_pad: usize,
    stride: usize,
}

impl BlazeBlock {
    fn new(
        in_channels: usize,
        out_channels: usize,
        stride: usize,
        vb: &VarBuilder,
    ) -> Result<Self> {
        let depthwise = conv2d(
            in_channels,
            in_channels,
            3,
            Conv2dConfig {
                stride,
                padding: if stride == 2 { 0 } else { 1 },
                groups: in_channels,
                ..Conv2dConfig::default()
            },
            vb.pp("depthwise"),
        )?;
        let pointwise = conv2d(
            in_channels,
            out_channels,
            1,
            Conv2dConfig::default(),
            vb.pp("pointwise"),
        )?;

        Ok(Self {
            depthwise,
            pointwise,
            channel_pad: out_channels.saturating_sub(in_channels),
            stride,
        })
    }
}

impl Module for BlazeBlock {
    fn forward(&self, x: &Tensor) -> candle_core::Result<Tensor> {
        // Stride-2 blocks pad bottom/right only, as TensorFlow "same" padding does.
        let (input, shortcut) = if self.stride == 2 {
            (
                x.pad_with_zeros(2, 0, 2)?.pad_with_zeros(3, 0, 2)?,
                x.max_pool2d(2)?,
            )
        } else {
            (x.clone(), x.clone())
        };

        let h = self.depthwise.forward(&input)?.relu()?;
        let h = self.pointwise.forward(&h)?;

        let shortcut = if self.channel_pad > 0 {
            shortcut.pad_with_zeros(1, 0, self.channel_pad)?
        } else {
            shortcut
        };

        (h + shortcut)?.relu()
    }
}

/// `BlazeFace` face detector.
pub struct BlazeFace {
    conv0: Conv2d,
    backbone1: Vec<BlazeBlock>,
    backbone2: Vec<BlazeBlock>,
    classifier_16: Conv2d,
    regressor_16: Conv2d,
    classifier_8: Conv2d,
    regressor_8: Conv2d,
    /// Anchor centers `[cx, cy]`, one row per anchor.
    anchors: Vec<[f32; 2]>,
    device: Device,
}

impl BlazeFace {
    /// Creates the model from weights.
    ///
    /// # Errors
    ///
    /// Returns an error if a weight tensor is missing or has the wrong shape.
    #[allow(clippy::needless_pass_by_value)]
    pub fn new(vb: VarBuilder) -> Result<Self> {
        let device = vb.device().clone();

        let conv0 = conv2d(
            3,
            24,
            5,
            Conv2dConfig {
                stride: 2,
                ..Conv2dConfig::default()
            },
            vb.pp("conv0"),
        )?;

        let backbone1 = BACKBONE1
            .iter()
            .enumerate()
            .map(|(i, &(c_in, c_out, s))| {
                BlazeBlock::new(c_in, c_out, s, &vb.pp(format!("backbone1.{i}")))
            })
            .collect::<Result<Vec<_>>>()?;

        let backbone2 = BACKBONE2
            .iter()
            .enumerate()
            .map(|(i, &(c_in, c_out, s))| {
                BlazeBlock::new(c_in, c_out, s, &vb.pp(format!("backbone2.{i}")))
            })
            .collect::<Result<Vec<_>>>()?;

        let head = Conv2dConfig::default();
        let classifier_16 = conv2d(88, 2, 1, head, vb.pp("classifier_16"))?;
        let regressor_16 = conv2d(88, 32, 1, head, vb.pp("regressor_16"))?;
        let classifier_8 = conv2d(96, 6, 1, head, vb.pp("classifier_8"))?;
        let regressor_8 = conv2d(96, 96, 1, head, vb.pp("regressor_8"))?;

        Ok(Self {
            conv0,
            backbone1,
            backbone2,
            classifier_16,
            regressor_16,
            classifier_8,
            regressor_8,
            anchors: anchor_centers(),
            device,
        })
    }

    /// Resizes the image to 128x128 RGB and scales pixels to `[-1, 1]`.
    ///
    /// Returns a `(1, 3, 128, 128)` tensor.
    ///
    /// # Errors
    ///
    /// Returns an error if tensor creation fails.
    pub fn preprocess(&self, image: &DynamicImage) -> Result<Tensor> {
        let rgb = image
            .resize_exact(
                INPUT_SIZE as u32,
                INPUT_SIZE as u32,
                image::imageops::FilterType::Triangle,
            )
            .to_rgb8();

        let data: Vec<f32> = rgb
            .pixels()
            .flat_map(|p| p.0.map(|c| f32::from(c) / 127.5 - 1.0))
            .collect();

        Tensor::from_vec(data, (1, INPUT_SIZE, INPUT_SIZE, 3), &self.device)?
            .permute((0, 3, 1, 2))?
            .to_dtype(DType::F32)
            .context("Failed to preprocess image for BlazeFace")
    }

    /// Runs the network, returning raw `(scores, regressions)` of shapes
    /// `(1, 896, 1)` and `(1, 896, 16)`.
    fn forward(&self, x: &Tensor) -> Result<(Tensor, Tensor)> {
        let x = x.pad_with_zeros(2, 1, 2)?.pad_with_zeros(3, 1, 2)?;
        let mut h = self.conv0.forward(&x)?.relu()?;

        for block in &self.backbone1 {
            h = block.forward(&h)?;
        }
        let features_16 = h.clone();

        for block in &self.backbone2 {
            h = block.forward(&h)?;
        }
        let features_8 = h;

        let head = |conv: &Conv2d, features: &Tensor, anchors: usize, width: usize| {
            conv.forward(features)?
                .permute((0, 2, 3, 1))?
                .reshape((1, anchors, width))
        };

        let scores = Tensor::cat(
            &[
                head(&self.classifier_16, &features_16, ANCHORS_16, 1)?,
                head(&self.classifier_8, &features_8, ANCHORS_8, 1)?,
            ],
            1,
        )?;
        let regressions = Tensor::cat(
            &[
                head(&self.regressor_16, &features_16, ANCHORS_16, VALUES_PER_ANCHOR)?,
                head(&self.regressor_8, &features_8, ANCHORS_8, VALUES_PER_ANCHOR)?,
            ],
            1,
        )?;

        Ok((scores, regressions))
    }

    /// Detects faces, best score first.
    ///
    /// Anchors scoring below `score_threshold` are discarded, then overlapping
    /// boxes with IoU at or above `nms_threshold` are suppressed.
    ///
    /// # Errors
    ///
    /// Returns an error if inference fails.
    pub fn detect(
        &self,
        image: &DynamicImage,
        score_threshold: f32,
        nms_threshold: f32,
    ) -> Result<Vec<FaceDetection>> {
        let input = self.preprocess(image)?;
        let (scores, regressions) = self.forward(&input).context("BlazeFace inference failed")?;

        let scores = scores.squeeze(0)?.to_vec2::<f32>()?;
        let regressions = regressions.squeeze(0)?.to_vec2::<f32>()?;

        let candidates = self
            .anchors
            .iter()
            .zip(scores.iter().zip(regressions.iter()))
            .filter_map(|(anchor, (score, raw))| {
                let score = sigmoid(score[0]);
                (score >= score_threshold).then(|| decode_anchor(*anchor, raw, score))
            })
            .collect();

        Ok(non_max_suppression(candidates, nms_threshold))
    }
}

/// Anchor centers for the 16x16 (2 per cell) and 8x8 (6 per cell) grids.
fn anchor_centers() -> Vec<[f32; 2]> {
    let mut anchors = Vec::with_capacity(NUM_ANCHORS);
    for (grid, per_cell) in [(16_u8, 2), (8_u8, 6)] {
        let size = f32::from(grid);
        for y in 0..grid {
            for x in 0..grid {
                let center = [(f32::from(x) + 0.5) / size, (f32::from(y) + 0.5) / size];
                anchors.extend(std::iter::repeat(center).take(per_cell));
            }
        }
    }
    anchors
}

/// Decodes one anchor's regression into a detection.
fn decode_anchor(anchor: [f32; 2], raw: &[f32], score: f32) -> FaceDetection {
    let scale = INPUT_SIZE as f32;
    let cx = anchor[0] + raw[0] / scale;
    let cy = anchor[1] + raw[1] / scale;
    let w = raw[2] / scale;
    let h = raw[3] / scale;

    let bbox = NormalizedRect::new(
        clamp_unit(cx - w / 2.0),
        clamp_unit(cy - h / 2.0),
        clamp_unit(cx + w / 2.0),
        clamp_unit(cy + h / 2.0),
    );

    FaceDetection { bbox, score }
}

/// Greedy non-maximum suppression. Output is sorted by score, descending.
fn non_max_suppression(
    mut candidates: Vec<FaceDetection>,
    iou_threshold: f32,
) -> Vec<FaceDetection> {
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut kept: Vec<FaceDetection> = Vec::new();
    for candidate in candidates {
        if kept
            .iter()
            .all(|k| k.bbox.iou(&candidate.bbox) < iou_threshold)
        {
            kept.push(candidate);
        }
    }
    kept
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    fn detection(score: f32, bbox: NormalizedRect) -> FaceDetection {
        FaceDetection { bbox, score }
    }

    #[test]
    fn test_anchor_count_and_layout() {
        let anchors = anchor_centers();
        assert_eq!(anchors.len(), NUM_ANCHORS);
        assert_eq!(anchors[0], [0.5 / 16.0, 0.5 / 16.0]);
        assert_eq!(anchors[1], anchors[0]);
        assert_eq!(anchors[ANCHORS_16], [0.5 / 8.0, 0.5 / 8.0]);
        assert_eq!(anchors[NUM_ANCHORS - 1], [7.5 / 8.0, 7.5 / 8.0]);
    }

    #[test]
    fn test_decode_anchor_centered_box() {
        let mut raw = [0.0_f32; VALUES_PER_ANCHOR];
        raw[2] = 64.0;
        raw[3] = 32.0;
        let det = decode_anchor([0.5, 0.5], &raw, 0.9);

        assert!((det.bbox.min_x - 0.25).abs() < 1e-6);
        assert!((det.bbox.max_x - 0.75).abs() < 1e-6);
        assert!((det.bbox.min_y - 0.375).abs() < 1e-6);
        assert!((det.bbox.max_y - 0.625).abs() < 1e-6);
        assert!((det.score - 0.9).abs() < f32::EPSILON);
    }

    #[test]
    fn test_decode_anchor_clamps() {
        let mut raw = [0.0_f32; VALUES_PER_ANCHOR];
        raw[2] = 512.0;
        raw[3] = 512.0;
        let det = decode_anchor([0.1, 0.9], &raw, 0.9);

        assert!(det.bbox.min_x.abs() < f32::EPSILON);
        assert!((det.bbox.max_y - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_nms_keeps_best_of_overlapping() {
        let boxes = vec![
            detection(0.8, NormalizedRect::new(0.1, 0.1, 0.5, 0.5)),
            detection(0.95, NormalizedRect::new(0.12, 0.1, 0.52, 0.5)),
            detection(0.9, NormalizedRect::new(0.6, 0.6, 0.9, 0.9)),
        ];
        let kept = non_max_suppression(boxes, 0.3);

        assert_eq!(kept.len(), 2);
        assert!((kept[0].score - 0.95).abs() < f32::EPSILON);
        assert!((kept[1].score - 0.9).abs() < f32::EPSILON);
    }

    #[test]
    fn test_nms_empty() {
        assert!(non_max_suppression(Vec::new(), 0.3).is_empty());
    }

    fn zero_model() -> BlazeFace {
        let vb = VarBuilder::zeros(DType::F32, &Device::Cpu);
        BlazeFace::new(vb).unwrap()
    }

    #[test]
    fn test_forward_shapes_with_zero_weights() {
        let model = zero_model();
        let input = model.preprocess(&DynamicImage::new_rgb8(200, 150)).unwrap();
        assert_eq!(input.dims(), &[1, 3, INPUT_SIZE, INPUT_SIZE]);

        let (scores, regressions) = model.forward(&input).unwrap();
        assert_eq!(scores.dims(), &[1, NUM_ANCHORS, 1]);
        assert_eq!(regressions.dims(), &[1, NUM_ANCHORS, VALUES_PER_ANCHOR]);
    }

    #[test]
    fn test_zero_weights_score_below_default_threshold() {
        // Every raw score is 0, so every anchor scores sigmoid(0) = 0.5.
        let model = zero_model();
        let image = DynamicImage::new_rgb8(64, 64);

        assert!(model.detect(&image, 0.75, 0.3).unwrap().is_empty());

        let all = model.detect(&image, 0.4, 0.3).unwrap();
        assert_eq!(all.len(), NUM_ANCHORS);
        assert!(all.iter().all(|d| (d.score - 0.5).abs() < 1e-6));
        assert!(all.iter().all(|d| d.bbox.width() == 0.0));
    }
}
