// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Single-channel occupancy mask and its edit primitives.
//!
//! A [`MaskLayer`] is a W x H grid of 0/1 values. All operations here are
//! pure data transforms: invalid ranges are clamped or ignored, never
//! reported as errors, because they arise routinely from pointer jitter.

/// A W x H grid of {0, 1} pixels backed by a flat byte vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskLayer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl MaskLayer {
    /// Create a zero-filled mask.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; (width as usize) * (height as usize)],
        }
    }

    /// Build a mask from raw bytes; any non-zero byte counts as occupied.
    /// Returns `None` if the buffer length does not match the dimensions.
    pub fn from_raw(width: u32, height: u32, raw: &[u8]) -> Option<Self> {
        if raw.len() != (width as usize) * (height as usize) {
            return None;
        }
        let data = raw.iter().map(|&v| u8::from(v != 0)).collect();
        Some(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Value at (x, y); out-of-bounds reads as 0.
    pub fn get(&self, x: i32, y: i32) -> u8 {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return 0;
        }
        self.data[y as usize * self.width as usize + x as usize]
    }

    /// Set (x, y) to `value`; out-of-bounds writes are ignored.
    pub fn set(&mut self, x: i32, y: i32, value: u8) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        self.data[y as usize * self.width as usize + x as usize] = u8::from(value != 0);
    }

    /// Number of occupied pixels.
    pub fn count_ones(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0).count()
    }

    pub fn is_empty(&self) -> bool {
        self.data.iter().all(|&v| v == 0)
    }

    /// Pixelwise OR with another mask of the same shape; shape mismatch is
    /// a no-op (callers resample first).
    pub fn union_with(&mut self, other: &MaskLayer) {
        if self.size() != other.size() {
            return;
        }
        for (dst, &src) in self.data.iter_mut().zip(other.data.iter()) {
            *dst |= src;
        }
    }

    /// Pixelwise AND NOT: removes `other`'s occupied pixels from this mask.
    pub fn subtract(&mut self, other: &MaskLayer) {
        if self.size() != other.size() {
            return;
        }
        for (dst, &src) in self.data.iter_mut().zip(other.data.iter()) {
            if src != 0 {
                *dst = 0;
            }
        }
    }

    /// Set all pixels within `radius` of (cx, cy) to `value`, clipped to
    /// the grid. Partial circles at the edge are allowed.
    pub fn paint_circle(&mut self, cx: i32, cy: i32, radius: i32, value: u8) {
        if radius < 0 {
            return;
        }
        let r2 = i64::from(radius) * i64::from(radius);
        let y0 = (cy - radius).max(0);
        let y1 = (cy + radius).min(self.height as i32 - 1);
        let x0 = (cx - radius).max(0);
        let x1 = (cx + radius).min(self.width as i32 - 1);
        for y in y0..=y1 {
            let dy = i64::from(y - cy);
            for x in x0..=x1 {
                let dx = i64::from(x - cx);
                if dx * dx + dy * dy <= r2 {
                    self.set(x, y, value);
                }
            }
        }
    }

    /// Zero out the rectangle at (x, y) with size (w, h), clamped to the
    /// grid. Empty or fully-outside rectangles are no-ops.
    pub fn erase_rect(&mut self, x: i32, y: i32, w: i32, h: i32) {
        if w <= 0 || h <= 0 {
            return;
        }
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = (x + w).min(self.width as i32);
        let y1 = (y + h).min(self.height as i32);
        for row in y0..y1 {
            for col in x0..x1 {
                self.set(col, row, 0);
            }
        }
    }

    /// Rasterize a closed polygon (implicitly closing last -> first) and
    /// set its interior plus boundary to `value`. Fewer than 3 vertices is
    /// a no-op.
    pub fn fill_polygon(&mut self, points: &[(i32, i32)], value: u8) {
        if points.len() < 3 {
            return;
        }

        let min_y = points.iter().map(|p| p.1).min().unwrap_or(0).max(0);
        let max_y = points
            .iter()
            .map(|p| p.1)
            .max()
            .unwrap_or(0)
            .min(self.height as i32 - 1);

        // Scan-line fill: collect edge crossings per row, fill between pairs.
        for y in min_y..=max_y {
            let mut crossings: Vec<f64> = Vec::new();
            for i in 0..points.len() {
                let (x1, y1) = points[i];
                let (x2, y2) = points[(i + 1) % points.len()];
                if y1 == y2 {
                    continue;
                }
                let (lo, hi) = if y1 < y2 { (y1, y2) } else { (y2, y1) };
                // Half-open rule on y so shared vertices count once.
                if y >= lo && y < hi {
                    let t = f64::from(y - y1) / f64::from(y2 - y1);
                    crossings.push(f64::from(x1) + t * f64::from(x2 - x1));
                }
            }
            crossings.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            for pair in crossings.chunks(2) {
                if let [xa, xb] = pair {
                    let start = xa.ceil() as i32;
                    let end = xb.floor() as i32;
                    for x in start..=end {
                        self.set(x, y, value);
                    }
                }
            }
        }

        // Include the boundary itself so thin or axis-aligned edges are
        // not lost to the half-open scan rule.
        for i in 0..points.len() {
            let (x1, y1) = points[i];
            let (x2, y2) = points[(i + 1) % points.len()];
            self.draw_line(x1, y1, x2, y2, value);
        }
    }

    /// Bresenham line between two points, clipped by `set`.
    fn draw_line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, value: u8) {
        let dx = (x2 - x1).abs();
        let dy = -(y2 - y1).abs();
        let sx = if x1 < x2 { 1 } else { -1 };
        let sy = if y1 < y2 { 1 } else { -1 };
        let mut err = dx + dy;
        let (mut x, mut y) = (x1, y1);
        loop {
            self.set(x, y, value);
            if x == x2 && y == y2 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    /// Nearest-neighbor resize. Used to reconcile a stored mask whose
    /// shape differs from the active image. Identity when already at the
    /// target shape.
    pub fn resample(&self, new_width: u32, new_height: u32) -> MaskLayer {
        if new_width == self.width && new_height == self.height {
            return self.clone();
        }
        let mut out = MaskLayer::new(new_width, new_height);
        if new_width == 0 || new_height == 0 || self.width == 0 || self.height == 0 {
            return out;
        }
        for y in 0..new_height {
            let src_y = (y as u64 * self.height as u64 / new_height as u64) as i32;
            for x in 0..new_width {
                let src_x = (x as u64 * self.width as u64 / new_width as u64) as i32;
                out.set(x as i32, y as i32, self.get(src_x, src_y));
            }
        }
        out
    }
}
