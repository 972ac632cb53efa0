// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Dataset record shapes for the JSON data source.
//!
//! A record ties an image to its stored mask, bounding box and the
//! human/gpt conversation that the text editor round-trips.

use serde::{Deserialize, Serialize};

/// One conversation turn; `from` is "human" or "gpt".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub from: String,
    pub value: String,
}

/// One annotation item in a JSON dataset. Unknown fields are preserved
/// verbatim so a rewrite never loses metadata this tool does not model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub category: String,
    #[serde(default)]
    pub image_path_rgb: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub mask_path: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub training_mask_path: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub visual_prompt_path: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bbox: Vec<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conversations: Vec<Conversation>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl DatasetRecord {
    /// The mask path to load and save for this record, preferring
    /// `mask_path` over `training_mask_path`.
    pub fn effective_mask_path(&self) -> Option<&str> {
        if !self.mask_path.is_empty() {
            Some(&self.mask_path)
        } else if !self.training_mask_path.is_empty() {
            Some(&self.training_mask_path)
        } else {
            None
        }
    }

    /// Label shown in the item list: `[category] id` when a category exists.
    pub fn display_label(&self) -> String {
        if self.category.is_empty() {
            self.id.clone()
        } else {
            format!("[{}] {}", self.category, self.id)
        }
    }
}

const HUMAN_HEADER: &str = "Human:";
const GPT_HEADER: &str = "GPT:";

/// Render conversations into the editable block format:
/// `Human:` / `GPT:` headers, blank line between turns. `<image>` markers
/// are stripped for editing.
pub fn conversations_to_text(conversations: &[Conversation]) -> String {
    let mut out = String::new();
    for conv in conversations {
        let header = if conv.from == "human" {
            HUMAN_HEADER
        } else {
            GPT_HEADER
        };
        let value = conv.value.replace("<image>\n", "");
        out.push_str(header);
        out.push('\n');
        out.push_str(value.trim());
        out.push_str("\n\n");
    }
    out
}

/// Parse edited text back into conversation turns. Text before the first
/// header is ignored; empty turns are dropped. Returns an empty vec for
/// blank input.
pub fn text_to_conversations(text: &str) -> Vec<Conversation> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let mut conversations = Vec::new();
    let mut role: Option<&str> = None;
    let mut value = String::new();

    let mut flush = |role: Option<&str>, value: &mut String, out: &mut Vec<Conversation>| {
        if let Some(from) = role {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                out.push(Conversation {
                    from: from.to_string(),
                    value: trimmed.to_string(),
                });
            }
        }
        value.clear();
    };

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed == HUMAN_HEADER {
            flush(role, &mut value, &mut conversations);
            role = Some("human");
        } else if trimmed == GPT_HEADER {
            flush(role, &mut value, &mut conversations);
            role = Some("gpt");
        } else if role.is_some() {
            value.push_str(line);
            value.push('\n');
        }
    }
    flush(role, &mut value, &mut conversations);

    conversations
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conv(from: &str, value: &str) -> Conversation {
        Conversation {
            from: from.into(),
            value: value.into(),
        }
    }

    #[test]
    fn test_conversations_roundtrip() {
        let original = vec![
            conv("human", "Segment the red car."),
            conv("gpt", "Sure, it is [SEG]."),
        ];
        let text = conversations_to_text(&original);
        assert_eq!(text_to_conversations(&text), original);
    }

    #[test]
    fn test_image_marker_stripped_for_editing() {
        let convs = vec![conv("human", "<image>\nWhat is shown?")];
        let text = conversations_to_text(&convs);
        assert!(!text.contains("<image>"));
        assert_eq!(text_to_conversations(&text)[0].value, "What is shown?");
    }

    #[test]
    fn test_blank_text_parses_to_empty() {
        assert!(text_to_conversations("  \n ").is_empty());
    }

    #[test]
    fn test_multiline_turn_preserved() {
        let text = "Human:\nline one\nline two\n\nGPT:\nanswer\n";
        let convs = text_to_conversations(text);
        assert_eq!(convs.len(), 2);
        assert_eq!(convs[0].value, "line one\nline two");
        assert_eq!(convs[1].from, "gpt");
    }

    #[test]
    fn test_record_mask_path_preference() {
        let mut record: DatasetRecord = serde_json::from_str("{}").unwrap();
        assert!(record.effective_mask_path().is_none());
        record.training_mask_path = "train.png".into();
        assert_eq!(record.effective_mask_path(), Some("train.png"));
        record.mask_path = "mask.png".into();
        assert_eq!(record.effective_mask_path(), Some("mask.png"));
    }

    #[test]
    fn test_record_preserves_unknown_fields() {
        let json = r#"{"id": "a1", "image_path_rgb": "a.png", "depth_path": "d.png"}"#;
        let record: DatasetRecord = serde_json::from_str(json).unwrap();
        let out = serde_json::to_value(&record).unwrap();
        assert_eq!(out["depth_path"], "d.png");
    }

    #[test]
    fn test_display_label() {
        let mut record: DatasetRecord = serde_json::from_str(r#"{"id": "x"}"#).unwrap();
        assert_eq!(record.display_label(), "x");
        record.category = "vehicle".into();
        assert_eq!(record.display_label(), "[vehicle] x");
    }
}
