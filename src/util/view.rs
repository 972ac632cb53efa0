// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! View transform between screen and image coordinates.
//!
//! The canvas displays the image under `screen = image * scale + offset`.
//! Pan and zoom gestures mutate the transform; everything that needs a
//! pixel coordinate maps back through [`ViewTransform::to_image`].

/// Zoom is clamped to this range so the view can never degenerate.
pub const MIN_SCALE: f32 = 0.05;
pub const MAX_SCALE: f32 = 50.0;

/// Multiplier applied per wheel notch.
pub const ZOOM_IN_FACTOR: f32 = 1.1;
pub const ZOOM_OUT_FACTOR: f32 = 0.9;

/// Fit-to-window leaves a small margin around the image.
const FIT_MARGIN: f32 = 0.9;

/// Maps between widget-local screen coordinates and image pixel coordinates.
///
/// All operations are pure arithmetic; callers are responsible for
/// bounds-checking the result of [`to_image`](Self::to_image) against the
/// image extent before treating it as a valid pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub scale: f32,
    pub offset: egui::Vec2,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset: egui::Vec2::ZERO,
        }
    }
}

impl ViewTransform {
    /// Scale and center the image so it is fully visible in the viewport.
    pub fn fit_to_window(&mut self, viewport: egui::Vec2, image_w: u32, image_h: u32) {
        if image_w == 0 || image_h == 0 || viewport.x <= 0.0 || viewport.y <= 0.0 {
            return;
        }
        let scale_w = viewport.x / image_w as f32;
        let scale_h = viewport.y / image_h as f32;
        self.scale = (scale_w.min(scale_h) * FIT_MARGIN).clamp(MIN_SCALE, MAX_SCALE);

        let shown = egui::vec2(image_w as f32 * self.scale, image_h as f32 * self.scale);
        self.offset = (viewport - shown) / 2.0;
    }

    /// Zoom in or out keeping the image point under `screen_pos` fixed.
    pub fn zoom_at(&mut self, screen_pos: egui::Pos2, zoom_in: bool) {
        let factor = if zoom_in { ZOOM_IN_FACTOR } else { ZOOM_OUT_FACTOR };

        // Image-space position under the cursor before the zoom.
        let old_x = (screen_pos.x - self.offset.x) / self.scale;
        let old_y = (screen_pos.y - self.offset.y) / self.scale;

        self.scale = (self.scale * factor).clamp(MIN_SCALE, MAX_SCALE);

        // Keep that image point under the cursor after the zoom.
        self.offset.x = screen_pos.x - old_x * self.scale;
        self.offset.y = screen_pos.y - old_y * self.scale;
    }

    /// Translate the view by a screen-space delta.
    pub fn pan_by(&mut self, delta: egui::Vec2) {
        self.offset += delta;
    }

    /// Map a screen position to an integer image coordinate (truncated).
    ///
    /// The result may lie outside the image; callers must bounds-check.
    pub fn to_image(&self, screen_pos: egui::Pos2) -> (i32, i32) {
        let x = (screen_pos.x - self.offset.x) / self.scale;
        let y = (screen_pos.y - self.offset.y) / self.scale;
        (x as i32, y as i32)
    }

    /// Map an image pixel coordinate to its screen position.
    pub fn to_screen(&self, image_x: f32, image_y: f32) -> egui::Pos2 {
        egui::pos2(
            image_x * self.scale + self.offset.x,
            image_y * self.scale + self.offset.y,
        )
    }
}
