// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Two-layer mask compositor.
//!
//! The committed annotation lives in the `base` layer (rendered red); the
//! tentative segmentor output lives in the `preview` layer (rendered
//! green). The externally visible mask is always `base OR preview`.

use super::mask::MaskLayer;

/// Owns the committed `base` mask and the tentative `preview` mask for the
/// active image.
///
/// An absent base means "no annotation exists yet"; an all-zero base is the
/// explicit "annotated as empty" state once an edit has touched it. The two
/// are distinguished by [`current`](Self::current) returning `None` only in
/// the former case.
#[derive(Debug, Clone)]
pub struct CompositeMaskModel {
    width: u32,
    height: u32,
    base: Option<MaskLayer>,
    preview: Option<MaskLayer>,
}

impl CompositeMaskModel {
    /// New model for an image of the given dimensions, with no layers.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            base: None,
            preview: None,
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn base(&self) -> Option<&MaskLayer> {
        self.base.as_ref()
    }

    pub fn base_mut(&mut self) -> Option<&mut MaskLayer> {
        self.base.as_mut()
    }

    pub fn preview(&self) -> Option<&MaskLayer> {
        self.preview.as_ref()
    }

    pub fn preview_mut(&mut self) -> Option<&mut MaskLayer> {
        self.preview.as_mut()
    }

    pub fn has_preview(&self) -> bool {
        self.preview.is_some()
    }

    /// Replace the base layer wholesale, resampling to the image size if
    /// the incoming mask was stored at a different shape.
    pub fn set_base(&mut self, mask: Option<MaskLayer>) {
        self.base = mask.map(|m| self.conform(m));
    }

    /// Replace the preview layer wholesale; `None` clears it.
    pub fn set_preview(&mut self, mask: Option<MaskLayer>) {
        self.preview = mask.map(|m| self.conform(m));
    }

    /// Clear the preview without touching the base. Used on tool switch
    /// and explicit reset.
    pub fn clear_preview(&mut self) {
        self.preview = None;
    }

    /// Ensure a base layer exists (zero-filled if it did not) and return
    /// a mutable reference to it.
    pub fn base_or_insert(&mut self) -> &mut MaskLayer {
        let (w, h) = (self.width, self.height);
        self.base.get_or_insert_with(|| MaskLayer::new(w, h))
    }

    /// The composite `base OR preview`, or `None` while no base exists.
    pub fn current(&self) -> Option<MaskLayer> {
        let base = self.base.as_ref()?;
        let mut out = base.clone();
        if let Some(preview) = &self.preview {
            out.union_with(preview);
        }
        Some(out)
    }

    /// Confirm-add: fold the preview into the base (`base |= preview`),
    /// creating a zero base first if absent, then drop the preview.
    /// Returns whether anything was committed.
    pub fn commit_merge(&mut self) -> bool {
        let Some(preview) = self.preview.take() else {
            return false;
        };
        self.base_or_insert().union_with(&preview);
        true
    }

    /// Confirm-remove: `base &= !preview`. Requires both layers, else a
    /// no-op; the preview is dropped only when the subtract applies.
    pub fn commit_subtract(&mut self) -> bool {
        if self.base.is_none() || self.preview.is_none() {
            return false;
        }
        let preview = self.preview.take().expect("checked above");
        if let Some(base) = self.base.as_mut() {
            base.subtract(&preview);
        }
        true
    }

    fn conform(&self, mask: MaskLayer) -> MaskLayer {
        if mask.size() == (self.width, self.height) {
            mask
        } else {
            mask.resample(self.width, self.height)
        }
    }
}
