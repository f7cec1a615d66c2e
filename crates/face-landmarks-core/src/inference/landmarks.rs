//! 68-point facial landmark regressor.
//!
//! A small CNN trained on 300W/WFLW-style face crops (face box padded by 20%,
//! resized to 112x112). It regresses the 68 iBUG landmark positions in crop
//! coordinates.

#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]

use anyhow::{Context, Result};
use candle_core::{Device, Module, Tensor};
use candle_nn::{conv2d, linear, Conv2d, Conv2dConfig, Linear, VarBuilder};
use image::DynamicImage;

use super::{clamp_unit, sigmoid};
use crate::domain::{NormalizedPoint, NormalizedRect};

/// Side length of the square face crop fed to the network.
pub const CROP_SIZE: usize = 112;

/// Landmarks regressed per face.
pub const NUM_LANDMARKS: usize = 68;

/// Channel widths of the four conv stages.
const STAGES: [(usize, usize); 4] = [(3, 32), (32, 64), (64, 128), (128, 256)];

/// Spatial size after the four 2x2 max pools: 112 -> 56 -> 28 -> 14 -> 7.
const FEATURE_SIZE: usize = CROP_SIZE / 16;

/// Landmark regression network.
///
/// Four conv3x3 + ReLU + maxpool stages, then two dense layers. The sigmoid
/// of each of the 136 outputs is an `x` or `y` in `[0, 1]` crop coordinates.
pub struct LandmarkRegressor {
    stages: Vec<Conv2d>,
    fc1: Linear,
    fc2: Linear,
    device: Device,
}

impl LandmarkRegressor {
    /// Creates the regressor from weights.
    ///
    /// # Errors
    ///
    /// Returns an error if a weight tensor is missing or has the wrong shape.
    #[allow(clippy::needless_pass_by_value)]
    pub fn new(vb: VarBuilder) -> Result<Self> {
        let device = vb.device().clone();

        let stages = STAGES
            .iter()
            .enumerate()
            .map(|(i, &(c_in, c_out))| {
                conv2d(
                    c_in,
                    c_out,
                    3,
                    Conv2dConfig {
                        padding: 1,
                        ..Conv2dConfig::default()
                    },
                    vb.pp(format!("conv{}", i + 1)),
                )
            })
            .collect::<candle_core::Result<Vec<_>>>()?;

        let flat = STAGES[STAGES.len() - 1].1 * FEATURE_SIZE * FEATURE_SIZE;
        let fc1 = linear(flat, 512, vb.pp("fc1"))?;
        let fc2 = linear(512, NUM_LANDMARKS * 2, vb.pp("fc2"))?;

        Ok(Self {
            stages,
            fc1,
            fc2,
            device,
        })
    }

    /// Crops `region` out of the image and builds a `(1, 3, 112, 112)` tensor
    /// with pixels scaled to `[0, 1]`.
    ///
    /// # Errors
    ///
    /// Returns an error if tensor creation fails.
    pub fn preprocess(&self, image: &DynamicImage, region: &NormalizedRect) -> Result<Tensor> {
        let rgb = crop_region(image, region)
            .resize_exact(
                CROP_SIZE as u32,
                CROP_SIZE as u32,
                image::imageops::FilterType::Triangle,
            )
            .to_rgb8();

        let data: Vec<f32> = rgb
            .pixels()
            .flat_map(|p| p.0.map(|c| f32::from(c) / 255.0))
            .collect();

        Tensor::from_vec(data, (1, CROP_SIZE, CROP_SIZE, 3), &self.device)?
            .permute((0, 3, 1, 2))?
            .contiguous()
            .context("Failed to create face crop tensor")
    }

    /// Predicts landmarks for the face in `face_box`.
    ///
    /// The network sees the box grown by `padding`. Returned points are
    /// relative to `face_box` itself and clamped to `[0, 1]`.
    ///
    /// # Errors
    ///
    /// Returns an error if the box is empty or inference fails.
    pub fn predict(
        &self,
        image: &DynamicImage,
        face_box: &NormalizedRect,
        padding: f32,
    ) -> Result<Vec<NormalizedPoint>> {
        if face_box.width() <= 0.0 || face_box.height() <= 0.0 {
            anyhow::bail!("Cannot regress landmarks for an empty face box: {face_box:?}");
        }

        let crop = face_box.expand(padding);
        let input = self.preprocess(image, &crop)?;
        let raw = self
            .forward(&input)
            .context("Landmark inference failed")?
            .squeeze(0)?
            .to_vec1::<f32>()?;

        let points: Vec<NormalizedPoint> = raw
            .chunks_exact(2)
            .map(|xy| NormalizedPoint::new(sigmoid(xy[0]), sigmoid(xy[1])))
            .collect();

        Ok(crop_to_box(&points, &crop, face_box))
    }
}

impl Module for LandmarkRegressor {
    fn forward(&self, x: &Tensor) -> candle_core::Result<Tensor> {
        let mut h = x.clone();
        for conv in &self.stages {
            h = conv.forward(&h)?.relu()?.max_pool2d(2)?;
        }
        let h = self.fc1.forward(&h.flatten_from(1)?)?.relu()?;
        self.fc2.forward(&h)
    }
}

/// Crops a normalized region out of the image, keeping at least one pixel.
fn crop_region(image: &DynamicImage, region: &NormalizedRect) -> DynamicImage {
    let img_w = image.width();
    let img_h = image.height();

    let x = ((region.min_x * img_w as f32) as u32).min(img_w.saturating_sub(1));
    let y = ((region.min_y * img_h as f32) as u32).min(img_h.saturating_sub(1));
    let w = ((region.width() * img_w as f32) as u32)
        .min(img_w.saturating_sub(x))
        .max(1);
    let h = ((region.height() * img_h as f32) as u32)
        .min(img_h.saturating_sub(y))
        .max(1);

    image.crop_imm(x, y, w, h)
}

/// Re-expresses crop-relative points relative to `face_box`.
fn crop_to_box(
    points: &[NormalizedPoint],
    crop: &NormalizedRect,
    face_box: &NormalizedRect,
) -> Vec<NormalizedPoint> {
    points
        .iter()
        .map(|p| {
            let x = crop.min_x + p.x * crop.width();
            let y = crop.min_y + p.y * crop.height();
            NormalizedPoint::new(
                clamp_unit((x - face_box.min_x) / face_box.width()),
                clamp_unit((y - face_box.min_y) / face_box.height()),
            )
        })
        .collect()
}
