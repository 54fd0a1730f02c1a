//! Upload bytes to classifier input.
//!
//! Images are decoded, reduced to one intensity channel and scaled to
//! `[0, 1]`. They are deliberately not resized: callers crop faces to the
//! model's 48x48 input themselves, and a wrongly sized image is rejected by
//! the classifier rather than silently stretched.

use candle_core::{Device, Tensor};
use image::DynamicImage;

use crate::error::{Result, VisionError};

/// Decodes `bytes` and returns a `(1, height, width, 1)` f32 tensor on the CPU.
pub fn preprocess_image(bytes: &[u8]) -> Result<Tensor> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| VisionError::ImageProcessing(e.to_string()))?;
    let (width, height) = (img.width() as usize, img.height() as usize);

    let data: Vec<f32> = grayscale(&img)
        .into_iter()
        .map(|v| f32::from(v) / 255.0)
        .collect();

    Tensor::from_vec(data, (1, height, width, 1), &Device::Cpu)
        .map_err(|e| VisionError::ImageProcessing(e.to_string()))
}

/// Row-major 8-bit intensities. Alpha is dropped.
fn grayscale(img: &DynamicImage) -> Vec<u8> {
    match img {
        DynamicImage::ImageLuma8(gray) => gray.as_raw().clone(),
        other => other.to_rgb8().pixels().map(|p| luma(p.0)).collect(),
    }
}

/// ITU-R 601-2 luma in 16-bit fixed point.
fn luma([r, g, b]: [u8; 3]) -> u8 {
    let l = u32::from(r) * 19595 + u32::from(g) * 38470 + u32::from(b) * 7471 + 0x8000;
    (l >> 16) as u8
}
