// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Promptable segmentation: the predictor contract and the worker that
//! keeps inference off the UI thread.

pub mod remote;
pub mod worker;

use crate::models::mask::MaskLayer;
use crate::models::prompt::PromptPoint;
use anyhow::Result;

/// A point-prompt segmentation predictor.
///
/// `set_image` fixes the source image for subsequent predictions; it is
/// expensive (embedding computation) and called at most once per image
/// load. `predict` is then called repeatedly with the growing point
/// sequence against that fixed image, returning `Ok(None)` when the model
/// produced no usable mask.
pub trait Segmentor: Send {
    fn set_image(&mut self, rgba: &[u8], width: u32, height: u32) -> Result<()>;

    fn predict(&mut self, points: &[PromptPoint]) -> Result<Option<MaskLayer>>;
}
