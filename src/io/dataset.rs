// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Dataset enumeration: ordered annotation items from a folder of images
//! or from a JSON record file.
//!
//! Folder mode derives sibling paths per image (`<stem>_mask.png` for the
//! mask, `<stem>.json` for the free text); JSON mode works off
//! [`DatasetRecord`]s with embedded paths and conversations. Deleting an
//! item is destructive for its files but the JSON rewrite preserves every
//! field this tool does not model.

use crate::models::record::{
    conversations_to_text, text_to_conversations, DatasetRecord,
};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "tif", "tiff"];

/// What the annotation surface needs to present one item.
pub struct ItemPaths {
    pub image_path: PathBuf,
    /// Where the mask is stored / will be saved; `None` when the record
    /// carries no mask path.
    pub mask_path: Option<PathBuf>,
    /// Editable free text (sidecar text or rendered conversations).
    pub text: String,
    /// Read-only metadata summary shown beside the canvas.
    pub meta: String,
}

/// A folder of images with sidecar mask/text files.
pub struct FolderDataset {
    root: PathBuf,
    files: Vec<String>,
}

impl FolderDataset {
    /// Enumerate annotatable images under `root`, sorted by file name.
    pub fn load(root: &Path) -> Result<Self> {
        let mut files: Vec<String> = std::fs::read_dir(root)
            .with_context(|| format!("reading directory {}", root.display()))?
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let name = entry.file_name().to_string_lossy().to_string();
                let ext = Path::new(&name)
                    .extension()
                    .and_then(|e| e.to_str())
                    .map(|e| e.to_ascii_lowercase())?;
                IMAGE_EXTENSIONS.contains(&ext.as_str()).then_some(name)
            })
            .collect();
        files.sort();
        log::info!("folder dataset: {} images in {}", files.len(), root.display());
        Ok(Self {
            root: root.to_path_buf(),
            files,
        })
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn labels(&self) -> Vec<String> {
        self.files.clone()
    }

    fn sibling(&self, index: usize, suffix: &str) -> Option<PathBuf> {
        let name = self.files.get(index)?;
        let stem = Path::new(name).file_stem()?.to_string_lossy();
        Some(self.root.join(format!("{stem}{suffix}")))
    }

    pub fn item(&self, index: usize) -> Option<ItemPaths> {
        let name = self.files.get(index)?;
        let image_path = self.root.join(name);
        let text_path = self.sibling(index, ".json")?;
        let text = read_sidecar_text(&text_path).unwrap_or_default();
        Some(ItemPaths {
            meta: format!("File: {}", image_path.display()),
            image_path,
            mask_path: self.sibling(index, "_mask.png"),
            text,
        })
    }

    /// Persist the free text beside the image.
    pub fn save_text(&self, index: usize, text: &str) -> Result<()> {
        let Some(path) = self.sibling(index, ".json") else {
            return Ok(());
        };
        let json = serde_json::json!({ "text": text });
        std::fs::write(&path, serde_json::to_string_pretty(&json)?)
            .with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }

    /// Move the image into a `.trash` subfolder and drop it from the list.
    pub fn delete(&mut self, index: usize) -> Result<()> {
        if index >= self.files.len() {
            return Ok(());
        }
        let name = self.files.remove(index);
        let trash = self.root.join(".trash");
        std::fs::create_dir_all(&trash)
            .with_context(|| format!("creating {}", trash.display()))?;
        let from = self.root.join(&name);
        let to = trash.join(&name);
        std::fs::rename(&from, &to)
            .with_context(|| format!("moving {} to trash", from.display()))?;
        log::info!("moved {} to {}", from.display(), to.display());
        Ok(())
    }
}

fn read_sidecar_text(path: &Path) -> Option<String> {
    let raw = std::fs::read_to_string(path).ok()?;
    let value: serde_json::Value = serde_json::from_str(&raw).ok()?;
    value.get("text")?.as_str().map(|s| s.to_string())
}

/// A JSON file holding an array of [`DatasetRecord`]s.
pub struct JsonDataset {
    path: PathBuf,
    records: Vec<DatasetRecord>,
}

impl JsonDataset {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let records: Vec<DatasetRecord> =
            serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
        log::info!("json dataset: {} records from {}", records.len(), path.display());
        Ok(Self {
            path: path.to_path_buf(),
            records,
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn labels(&self) -> Vec<String> {
        self.records.iter().map(|r| r.display_label()).collect()
    }

    pub fn item(&self, index: usize) -> Option<ItemPaths> {
        let record = self.records.get(index)?;
        let text = if record.conversations.is_empty() {
            String::new()
        } else {
            conversations_to_text(&record.conversations)
        };
        let meta = format!(
            "ID: {}\nBBox: {:?}\nImage: {}\nMask: {}",
            record.id,
            record.bbox,
            record.image_path_rgb,
            record.effective_mask_path().unwrap_or("-"),
        );
        Some(ItemPaths {
            image_path: PathBuf::from(&record.image_path_rgb),
            mask_path: record.effective_mask_path().map(PathBuf::from),
            text,
            meta,
        })
    }

    /// Update a record's conversations from edited text. Blank text keeps
    /// the existing conversations untouched.
    pub fn set_text(&mut self, index: usize, text: &str) {
        let conversations = text_to_conversations(text);
        if conversations.is_empty() {
            return;
        }
        if let Some(record) = self.records.get_mut(index) {
            record.conversations = conversations;
        }
    }

    /// Rewrite the whole JSON file in place.
    pub fn save(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.records)?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("writing {}", self.path.display()))?;
        log::info!("dataset written to {}", self.path.display());
        Ok(())
    }

    /// Remove the record and its referenced mask/prompt files, then
    /// rewrite the JSON. Missing files are ignored.
    pub fn delete(&mut self, index: usize) -> Result<()> {
        if index >= self.records.len() {
            return Ok(());
        }
        let record = self.records.remove(index);
        for path in [
            &record.visual_prompt_path,
            &record.training_mask_path,
            &record.mask_path,
        ] {
            if !path.is_empty() && Path::new(path).exists() {
                if let Err(e) = std::fs::remove_file(path) {
                    log::warn!("could not remove {path}: {e}");
                }
            }
        }
        self.save()
    }
}

/// The active data source.
pub enum Dataset {
    Folder(FolderDataset),
    Json(JsonDataset),
}

impl Dataset {
    pub fn len(&self) -> usize {
        match self {
            Dataset::Folder(d) => d.len(),
            Dataset::Json(d) => d.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn labels(&self) -> Vec<String> {
        match self {
            Dataset::Folder(d) => d.labels(),
            Dataset::Json(d) => d.labels(),
        }
    }

    pub fn item(&self, index: usize) -> Option<ItemPaths> {
        match self {
            Dataset::Folder(d) => d.item(index),
            Dataset::Json(d) => d.item(index),
        }
    }

    /// Persist the edited text for an item (sidecar file or record
    /// rewrite). Used both by explicit save and by navigation autosave.
    pub fn save_text(&mut self, index: usize, text: &str) -> Result<()> {
        match self {
            Dataset::Folder(d) => d.save_text(index, text),
            Dataset::Json(d) => {
                d.set_text(index, text);
                d.save()
            }
        }
    }

    pub fn delete(&mut self, index: usize) -> Result<()> {
        match self {
            Dataset::Folder(d) => d.delete(index),
            Dataset::Json(d) => d.delete(index),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("segmark_dataset_{name}"));
        std::fs::remove_dir_all(&dir).ok();
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_png(path: &Path) {
        image::GrayImage::from_raw(2, 2, vec![0, 255, 255, 0])
            .unwrap()
            .save(path)
            .unwrap();
    }

    #[test]
    fn test_folder_enumeration_sorted_and_filtered() {
        let dir = temp_dir("enum");
        write_png(&dir.join("b.png"));
        write_png(&dir.join("a.png"));
        std::fs::write(dir.join("notes.txt"), "x").unwrap();

        let dataset = FolderDataset::load(&dir).unwrap();
        assert_eq!(dataset.labels(), vec!["a.png", "b.png"]);

        let item = dataset.item(0).unwrap();
        assert_eq!(item.image_path, dir.join("a.png"));
        assert_eq!(item.mask_path, Some(dir.join("a_mask.png")));
    }

    #[test]
    fn test_folder_text_sidecar_round_trip() {
        let dir = temp_dir("sidecar");
        write_png(&dir.join("a.png"));

        let dataset = FolderDataset::load(&dir).unwrap();
        dataset.save_text(0, "the left mug").unwrap();
        assert_eq!(dataset.item(0).unwrap().text, "the left mug");
    }

    #[test]
    fn test_folder_delete_moves_to_trash() {
        let dir = temp_dir("trash");
        write_png(&dir.join("a.png"));

        let mut dataset = FolderDataset::load(&dir).unwrap();
        dataset.delete(0).unwrap();
        assert!(dataset.is_empty());
        assert!(!dir.join("a.png").exists());
        assert!(dir.join(".trash/a.png").exists());
    }

    #[test]
    fn test_json_dataset_round_trip() {
        let dir = temp_dir("json");
        let path = dir.join("data.json");
        std::fs::write(
            &path,
            r#"[{"id": "r1", "category": "cup", "image_path_rgb": "img.png",
                "mask_path": "mask.png",
                "conversations": [{"from": "human", "value": "find the cup"}]}]"#,
        )
        .unwrap();

        let mut dataset = JsonDataset::load(&path).unwrap();
        assert_eq!(dataset.labels(), vec!["[cup] r1"]);
        let item = dataset.item(0).unwrap();
        assert!(item.text.contains("find the cup"));
        assert_eq!(item.mask_path, Some(PathBuf::from("mask.png")));

        dataset.set_text(0, "Human:\nfind the red cup\n");
        dataset.save().unwrap();

        let reloaded = JsonDataset::load(&path).unwrap();
        assert!(reloaded.item(0).unwrap().text.contains("find the red cup"));
    }

    #[test]
    fn test_json_delete_removes_record_and_files() {
        let dir = temp_dir("jsondel");
        let mask = dir.join("m.png");
        write_png(&mask);
        let path = dir.join("data.json");
        std::fs::write(
            &path,
            format!(
                r#"[{{"id": "r1", "image_path_rgb": "img.png", "mask_path": "{}"}},
                    {{"id": "r2", "image_path_rgb": "img2.png"}}]"#,
                mask.display()
            ),
        )
        .unwrap();

        let mut dataset = JsonDataset::load(&path).unwrap();
        dataset.delete(0).unwrap();
        assert_eq!(dataset.len(), 1);
        assert!(!mask.exists());

        let reloaded = JsonDataset::load(&path).unwrap();
        assert_eq!(reloaded.labels(), vec!["r2"]);
    }

    #[test]
    fn test_blank_text_keeps_conversations() {
        let dir = temp_dir("blank");
        let path = dir.join("data.json");
        std::fs::write(
            &path,
            r#"[{"id": "r1", "image_path_rgb": "i.png",
                "conversations": [{"from": "human", "value": "keep me"}]}]"#,
        )
        .unwrap();

        let mut dataset = JsonDataset::load(&path).unwrap();
        dataset.set_text(0, "   ");
        assert!(dataset.item(0).unwrap().text.contains("keep me"));
    }
}
