// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! HTTP client for a SAM-style segmentation service.
//!
//! The service accepts a base64 PNG image plus the accumulated point
//! prompts and answers with a base64 PNG mask (white = foreground). The
//! image payload is encoded once per `set_image` and resent with every
//! request; the service is expected to cache embeddings by content.

use super::Segmentor;
use crate::models::mask::MaskLayer;
use crate::models::prompt::PromptPoint;
use anyhow::{anyhow, Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::time::Duration;

#[derive(Serialize)]
struct WirePoint {
    x: u32,
    y: u32,
    label: i32,
}

#[derive(Serialize)]
struct SegmentRequest<'a> {
    image_b64: &'a str,
    points: Vec<WirePoint>,
}

#[derive(Deserialize)]
struct SegmentResponse {
    mask_b64: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Blocking client for the segmentation endpoint. Only ever called from
/// the worker thread, never the UI thread.
pub struct RemoteSegmentor {
    client: reqwest::blocking::Client,
    endpoint: String,
    image_b64: Option<String>,
    image_size: (u32, u32),
}

impl RemoteSegmentor {
    pub fn new(endpoint: String, timeout_secs: u64) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("building HTTP client")?;
        Ok(Self {
            client,
            endpoint,
            image_b64: None,
            image_size: (0, 0),
        })
    }

    fn decode_mask(&self, mask_b64: &str) -> Result<MaskLayer> {
        let bytes = BASE64
            .decode(mask_b64)
            .context("decoding mask payload")?;
        let gray = image::load_from_memory(&bytes)
            .context("decoding mask image")?
            .into_luma8();
        let (w, h) = gray.dimensions();
        let raw: Vec<u8> = gray.into_raw().iter().map(|&v| u8::from(v > 127)).collect();
        MaskLayer::from_raw(w, h, &raw).ok_or_else(|| anyhow!("mask buffer size mismatch"))
    }
}

impl Segmentor for RemoteSegmentor {
    fn set_image(&mut self, rgba: &[u8], width: u32, height: u32) -> Result<()> {
        let img = image::RgbaImage::from_raw(width, height, rgba.to_vec())
            .ok_or_else(|| anyhow!("image buffer size mismatch"))?;
        let mut png = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut png, image::ImageFormat::Png)
            .context("encoding image payload")?;
        self.image_b64 = Some(BASE64.encode(png.into_inner()));
        self.image_size = (width, height);
        log::info!("segmentor image set ({width}x{height})");
        Ok(())
    }

    fn predict(&mut self, points: &[PromptPoint]) -> Result<Option<MaskLayer>> {
        let image_b64 = self
            .image_b64
            .as_deref()
            .ok_or_else(|| anyhow!("predict called before set_image"))?;

        let request = SegmentRequest {
            image_b64,
            points: points
                .iter()
                .map(|p| WirePoint {
                    x: p.x,
                    y: p.y,
                    label: p.label.as_i32(),
                })
                .collect(),
        };

        let response: SegmentResponse = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .context("segmentation request failed")?
            .error_for_status()
            .context("segmentation service error")?
            .json()
            .context("malformed segmentation response")?;

        if let Some(error) = response.error {
            return Err(anyhow!("segmentation service: {error}"));
        }

        match response.mask_b64 {
            Some(mask_b64) => {
                let mask = self.decode_mask(&mask_b64)?;
                // The service may answer at model resolution; reconcile
                // to the source image before it reaches the compositor.
                let (w, h) = self.image_size;
                Ok(Some(mask.resample(w, h)))
            }
            None => Ok(None),
        }
    }
}
