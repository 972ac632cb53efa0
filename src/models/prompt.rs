// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Accumulated point prompts for the segmentation predictor.
//!
//! Segmentation quality depends on cumulative prompt context, so every
//! append snapshots the *entire* point sequence into a request. Requests
//! carry a monotonic token; a response whose token no longer matches the
//! session is stale (the operator added another point, reset, or switched
//! items in the meantime) and must be dropped, never applied.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Whether a prompt point marks foreground (include) or background
/// (exclude) for the predictor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointLabel {
    Foreground,
    Background,
}

impl PointLabel {
    /// Wire encoding used by SAM-style predictors: 1 = positive, 0 = negative.
    pub fn as_i32(self) -> i32 {
        match self {
            PointLabel::Foreground => 1,
            PointLabel::Background => 0,
        }
    }
}

/// A single (x, y, label) instruction in image space.
///
/// Coordinates are already validated against the image extent by the tool
/// dispatcher; this type does not re-check bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptPoint {
    pub x: u32,
    pub y: u32,
    pub label: PointLabel,
}

/// A snapshot of the full point sequence, tagged for staleness checks.
#[derive(Debug, Clone)]
pub struct PredictRequest {
    pub token: u64,
    pub points: Vec<PromptPoint>,
}

/// Tokens are drawn from one process-wide counter. Item switches replace
/// the whole session while the predictor worker lives on, so a token local
/// to the session could collide with one issued before the switch.
static TOKEN_COUNTER: AtomicU64 = AtomicU64::new(1);

fn next_token() -> u64 {
    TOKEN_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// Ordered point-prompt sequence for the current interaction.
#[derive(Debug)]
pub struct PromptSession {
    points: Vec<PromptPoint>,
    token: u64,
}

impl PromptSession {
    pub fn new() -> Self {
        Self {
            points: Vec::new(),
            token: next_token(),
        }
    }

    pub fn points(&self) -> &[PromptPoint] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Append a point and produce the predict request for the grown
    /// sequence. Issuing a new request supersedes any outstanding one.
    pub fn add_point(&mut self, x: u32, y: u32, label: PointLabel) -> PredictRequest {
        self.points.push(PromptPoint { x, y, label });
        self.token = next_token();
        PredictRequest {
            token: self.token,
            points: self.points.clone(),
        }
    }

    /// Whether a response for `token` is still current.
    pub fn accepts(&self, token: u64) -> bool {
        token == self.token
    }

    /// Empty the sequence and invalidate outstanding requests. The caller
    /// clears the preview layer through the owning composite model.
    pub fn reset(&mut self) {
        self.points.clear();
        self.token = next_token();
    }
}
