// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Application configuration.
//!
//! Loaded from `segmark.json` in the working directory (override with the
//! `SEGMARK_CONFIG` environment variable). A missing file yields
//! defaults; a malformed file is an error so typos are not silently
//! ignored.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const CONFIG_ENV: &str = "SEGMARK_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "segmark.json";

fn default_segment_endpoint() -> String {
    "http://127.0.0.1:8321/segment".to_string()
}

fn default_segment_timeout() -> u64 {
    60
}

fn default_brush_radius() -> i32 {
    10
}

fn default_from_lang() -> String {
    "en".to_string()
}

fn default_to_lang() -> String {
    "zh".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// URL of the SAM segmentation service.
    #[serde(default = "default_segment_endpoint")]
    pub segment_endpoint: String,
    /// Request timeout for predictions, in seconds.
    #[serde(default = "default_segment_timeout")]
    pub segment_timeout_secs: u64,
    /// Baidu AI translation credentials; translation is disabled while
    /// either is empty.
    #[serde(default)]
    pub translator_appid: String,
    #[serde(default)]
    pub translator_api_key: String,
    #[serde(default = "default_from_lang")]
    pub translate_from: String,
    #[serde(default = "default_to_lang")]
    pub translate_to: String,
    /// Brush radius in image pixels.
    #[serde(default = "default_brush_radius")]
    pub brush_radius: i32,
}

impl Default for Config {
    fn default() -> Self {
        serde_json::from_str("{}").expect("default config")
    }
}

impl Config {
    /// Load from the default path or `SEGMARK_CONFIG`.
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(Path::new(&path))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::info!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        log::info!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn translation_enabled(&self) -> bool {
        !self.translator_appid.is_empty() && !self.translator_api_key.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.brush_radius, 10);
        assert_eq!(config.translate_from, "en");
        assert!(!config.translation_enabled());
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"brush_radius": 4, "translator_appid": "a"}"#).unwrap();
        assert_eq!(config.brush_radius, 4);
        assert_eq!(config.segment_timeout_secs, 60);
        // Only one credential set: still disabled.
        assert!(!config.translation_enabled());
    }

    #[test]
    fn test_missing_file_is_defaults() {
        let config = Config::load_from(Path::new("/nonexistent/segmark.json")).unwrap();
        assert_eq!(config.segment_endpoint, default_segment_endpoint());
    }
}
