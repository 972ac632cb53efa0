// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Image and mask file I/O.
//!
//! Images decode to RGBA8 for display and for the segmentor payload.
//! Stored masks are grayscale files thresholded at 127 into {0,1};
//! saving writes the composite back as 0/255 grayscale PNG.

use crate::models::mask::MaskLayer;
use anyhow::{anyhow, Context, Result};
use std::path::Path;

/// A decoded image ready for texture upload.
pub struct LoadedImage {
    pub width: u32,
    pub height: u32,
    /// RGBA8, row-major.
    pub pixels: Vec<u8>,
}

/// Load and decode an image file.
pub fn load_image(path: &Path) -> Result<LoadedImage> {
    let img = image::open(path)
        .with_context(|| format!("loading image {}", path.display()))?
        .into_rgba8();
    let (width, height) = img.dimensions();
    Ok(LoadedImage {
        width,
        height,
        pixels: img.into_raw(),
    })
}

/// Load a stored mask, binarize it (>127 = occupied) and resample to the
/// active image size when the stored shape differs.
pub fn load_mask(path: &Path, width: u32, height: u32) -> Result<MaskLayer> {
    let gray = image::open(path)
        .with_context(|| format!("loading mask {}", path.display()))?
        .into_luma8();
    let (w, h) = gray.dimensions();
    let raw: Vec<u8> = gray.into_raw().iter().map(|&v| u8::from(v > 127)).collect();
    let mask =
        MaskLayer::from_raw(w, h, &raw).ok_or_else(|| anyhow!("mask buffer size mismatch"))?;
    if (w, h) != (width, height) {
        log::warn!(
            "mask {} is {w}x{h}, resampling to {width}x{height}",
            path.display()
        );
        return Ok(mask.resample(width, height));
    }
    Ok(mask)
}

/// Save a mask as 0/255 grayscale PNG.
pub fn save_mask(path: &Path, mask: &MaskLayer) -> Result<()> {
    let (w, h) = mask.size();
    let pixels: Vec<u8> = mask.data().iter().map(|&v| v * 255).collect();
    let img = image::GrayImage::from_raw(w, h, pixels)
        .ok_or_else(|| anyhow!("mask buffer size mismatch"))?;
    img.save(path)
        .with_context(|| format!("saving mask {}", path.display()))?;
    log::info!("mask saved to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_save_load_round_trip() {
        let dir = std::env::temp_dir().join("segmark_media_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("roundtrip_mask.png");

        let mut mask = MaskLayer::new(16, 16);
        mask.paint_circle(8, 8, 4, 1);
        save_mask(&path, &mask).unwrap();

        let loaded = load_mask(&path, 16, 16).unwrap();
        assert_eq!(loaded, mask);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_mask_load_resamples_mismatched_shape() {
        let dir = std::env::temp_dir().join("segmark_media_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("small_mask.png");

        let mask = MaskLayer::from_raw(8, 8, &vec![1u8; 64]).unwrap();
        save_mask(&path, &mask).unwrap();

        let loaded = load_mask(&path, 16, 16).unwrap();
        assert_eq!(loaded.size(), (16, 16));
        assert_eq!(loaded.get(15, 15), 1);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_load_missing_image_fails() {
        assert!(load_image(Path::new("/nonexistent/image.png")).is_err());
    }
}
