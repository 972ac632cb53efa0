// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Baidu AI text-translation client.
//!
//! Translation is best-effort: failures turn into a readable message in
//! the translation panel and never interfere with mask editing. Requests
//! run on a worker thread; results are tagged with a sequence number so a
//! slow response for a superseded request is dropped.

use anyhow::{anyhow, Context, Result};
use serde_json::json;
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::time::Duration;

const ENDPOINT: &str = "https://fanyi-api.baidu.com/ait/api/aiTextTranslate";
const TIMEOUT_SECS: u64 = 30;

/// Blocking client for the translation endpoint.
pub struct Translator {
    client: reqwest::blocking::Client,
    appid: String,
    api_key: String,
}

impl Translator {
    pub fn new(appid: &str, api_key: &str) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .build()
            .context("building HTTP client")?;
        Ok(Self {
            client,
            appid: appid.trim().to_string(),
            api_key: api_key.trim().to_string(),
        })
    }

    /// Translate `query`. Empty input short-circuits to an empty string.
    pub fn translate(&self, query: &str, from_lang: &str, to_lang: &str) -> Result<String> {
        if query.trim().is_empty() {
            return Ok(String::new());
        }

        let payload = json!({
            "appid": self.appid,
            "from": from_lang,
            "to": to_lang,
            "q": query,
        });

        let result: serde_json::Value = self
            .client
            .post(ENDPOINT)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .context("translation request failed")?
            .json()
            .context("malformed translation response")?;

        if let Some(code) = result.get("error_code") {
            let msg = result
                .get("error_msg")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown error");
            return Err(anyhow!("translation error {code}: {msg}"));
        }

        let lines: Vec<&str> = result
            .get("trans_result")
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.get("dst").and_then(|d| d.as_str()))
                    .collect()
            })
            .unwrap_or_default();

        if lines.is_empty() {
            return Err(anyhow!("no translation result"));
        }
        Ok(lines.join("\n"))
    }
}

/// Markers the dataset text carries that should not reach the translator.
pub fn clean_for_translation(text: &str) -> String {
    text.replace("<image>\n", "").replace("[SEG]", "[mask]")
}

/// Handle to the translation thread. Results are either the translated
/// text or a display-ready failure message.
pub struct TranslateWorker {
    jobs: Sender<(u64, String)>,
    results: Receiver<(u64, String)>,
}

impl TranslateWorker {
    pub fn spawn(translator: Translator, from_lang: String, to_lang: String) -> Self {
        let (job_tx, job_rx) = channel::<(u64, String)>();
        let (result_tx, result_rx) = channel::<(u64, String)>();

        std::thread::spawn(move || {
            while let Ok((seq, text)) = job_rx.recv() {
                let cleaned = clean_for_translation(&text);
                let display = match translator.translate(&cleaned, &from_lang, &to_lang) {
                    Ok(translated) => translated,
                    Err(e) => {
                        log::warn!("translation failed: {e:#}");
                        format!("Translation failed: {e:#}")
                    }
                };
                if result_tx.send((seq, display)).is_err() {
                    break;
                }
            }
        });

        Self {
            jobs: job_tx,
            results: result_rx,
        }
    }

    pub fn submit(&self, seq: u64, text: String) {
        if self.jobs.send((seq, text)).is_err() {
            log::error!("translation worker is gone");
        }
    }

    pub fn poll(&self) -> Option<(u64, String)> {
        match self.results.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_strips_markers() {
        let text = "<image>\nSegment the dog [SEG] please";
        assert_eq!(clean_for_translation(text), "Segment the dog [mask] please");
    }

    #[test]
    fn test_empty_query_short_circuits() {
        let translator = Translator::new("id", "key").unwrap();
        assert_eq!(translator.translate("  ", "en", "zh").unwrap(), "");
    }
}
