//! Preprocessing: grayscale raster → binary candidate mask.
//!
//! Inverted adaptive Gaussian threshold (dark blobs on a lighter
//! background become foreground), then a small opening to drop isolated
//! specks and a larger closing to bridge gaps in blob boundaries.

use std::path::Path;

use image::{GrayImage, ImageReader, Luma};
use imageproc::distance_transform::Norm;
use imageproc::morphology;
use rayon::prelude::*;

use crate::config::ThresholdParams;
use crate::error::DetectError;

/// Foreground value in binary masks. Background is 0.
pub const FOREGROUND: u8 = 255;

/// Load an image from disk as 8-bit grayscale.
pub fn load_gray(path: &Path) -> Result<GrayImage, DetectError> {
    let img = ImageReader::open(path)
        .map_err(|e| DetectError::ImageLoad(e.to_string()))?
        .decode()
        .map_err(|e| DetectError::ImageLoad(e.to_string()))?
        .into_luma8();
    Ok(img)
}

/// Convert a grayscale image into a binary mask (foreground = 255).
///
/// A pixel is foreground when its intensity is below the Gaussian-weighted
/// mean of its `block_size` neighborhood minus `c`. The input is never
/// modified.
pub fn binarize(gray: &GrayImage, params: &ThresholdParams) -> Result<GrayImage, DetectError> {
    let (w, h) = gray.dimensions();
    if w == 0 || h == 0 {
        return Err(DetectError::InvalidInput(format!("empty image ({w}x{h})")));
    }
    if params.block_size < 3 || params.block_size % 2 == 0 {
        return Err(DetectError::InvalidConfig(format!(
            "block_size must be odd and >= 3, got {}",
            params.block_size
        )));
    }

    let mean = local_gaussian_mean(gray, params.block_size as usize);
    let c = params.c as f32;
    let mut mask = GrayImage::from_fn(w, h, |x, y| {
        let i = (y * w + x) as usize;
        let src = gray.get_pixel(x, y).0[0] as f32;
        // The local mean is rounded to 8 bits, like the mean image of a
        // u8 blur would be.
        if src < mean[i].round() - c {
            Luma([FOREGROUND])
        } else {
            Luma([0])
        }
    });

    if params.open_size > 1 {
        mask = morphology::open(&mask, Norm::LInf, half_size(params.open_size));
    }
    if params.close_size > 1 {
        mask = morphology::close(&mask, Norm::LInf, half_size(params.close_size));
    }
    Ok(mask)
}

/// Number of foreground pixels in a mask.
pub fn foreground_count(mask: &GrayImage) -> usize {
    mask.as_raw().iter().filter(|&&v| v > 0).count()
}

/// A square `size x size` element is the L∞ ball of radius `size / 2`.
fn half_size(size: u32) -> u8 {
    (size / 2).min(u8::MAX as u32) as u8
}

/// Normalized Gaussian kernel of odd length `size`.
///
/// With no explicit sigma, sigma is derived from the size:
/// `0.3 * ((size - 1) / 2 - 1) + 0.8`.
fn gaussian_kernel(size: usize) -> Vec<f32> {
    let sigma = 0.3 * ((size as f64 - 1.0) * 0.5 - 1.0) + 0.8;
    let radius = (size / 2) as isize;
    let two_sigma2 = 2.0 * sigma * sigma;
    let raw: Vec<f64> = (-radius..=radius)
        .map(|i| (-((i * i) as f64) / two_sigma2).exp())
        .collect();
    let sum: f64 = raw.iter().sum();
    raw.iter().map(|v| (v / sum) as f32).collect()
}

/// Separable Gaussian blur with replicated borders, in f32.
fn local_gaussian_mean(gray: &GrayImage, block_size: usize) -> Vec<f32> {
    let (w, h) = (gray.width() as usize, gray.height() as usize);
    let kernel = gaussian_kernel(block_size);
    let radius = block_size / 2;
    let src: Vec<f32> = gray.as_raw().iter().map(|&v| v as f32).collect();

    // Horizontal pass.
    let mut tmp = vec![0.0f32; w * h];
    tmp.par_chunks_mut(w).enumerate().for_each(|(y, row)| {
        let line = &src[y * w..(y + 1) * w];
        for (x, out) in row.iter_mut().enumerate() {
            let mut acc = 0.0f32;
            for (k, &kv) in kernel.iter().enumerate() {
                acc += line[clamp_index(x + k, radius, w)] * kv;
            }
            *out = acc;
        }
    });

    // Vertical pass.
    let mut out = vec![0.0f32; w * h];
    out.par_chunks_mut(w).enumerate().for_each(|(y, row)| {
        for (x, o) in row.iter_mut().enumerate() {
            let mut acc = 0.0f32;
            for (k, &kv) in kernel.iter().enumerate() {
                acc += tmp[clamp_index(y + k, radius, h) * w + x] * kv;
            }
            *o = acc;
        }
    });
    out
}

/// Index `i - radius`, clamped into `0..n`.
fn clamp_index(i: usize, radius: usize, n: usize) -> usize {
    i.saturating_sub(radius).min(n - 1)
}
