//! Image preprocessing into the model input layout.
//!
//! Models take a single NHWC batch: `[1, height, width, 3]`, RGB, with pixel
//! values rescaled linearly from `0..=255` to `0.0..=1.0`.

use image::DynamicImage;
use image::imageops::{self, FilterType};

use crate::ImageSize;

/// Dense `f32` input batch with its shape.
#[derive(Debug, Clone, PartialEq)]
pub struct InputTensor {
    /// `[batch, height, width, channels]`
    pub shape: [usize; 4],
    pub data: Vec<f32>,
}

impl InputTensor {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Shape as signed dimensions, the form ONNX Runtime expects.
    pub fn shape_i64(&self) -> [i64; 4] {
        self.shape.map(|d| d as i64)
    }
}

/// Convert to RGB, resize, rescale to `[0, 1]`, and add the batch dimension.
///
/// Alpha is discarded before resampling, so it never bleeds into the colour
/// channels.
pub fn preprocess(image: &DynamicImage, size: ImageSize) -> InputTensor {
    let rgb = image.to_rgb8();
    let resized = imageops::resize(&rgb, size.width, size.height, FilterType::CatmullRom);

    let data: Vec<f32> = resized
        .pixels()
        .flat_map(|p| p.0)
        .map(|v| v as f32 / 255.0)
        .collect();

    InputTensor {
        shape: [1, size.height as usize, size.width as usize, 3],
        data,
    }
}
