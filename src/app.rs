// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Main application state and egui App implementation.
//!
//! This module wires the annotation core to the windowing layer: it owns
//! the dataset, the per-item [`AnnotationSession`], the view transform and
//! the worker threads, polls their channels every frame, and routes UI
//! actions into the core.

use crate::config::Config;
use crate::io::dataset::{Dataset, FolderDataset, ItemPaths, JsonDataset};
use crate::io::media;
use crate::models::mask::MaskLayer;
use crate::segment::remote::RemoteSegmentor;
use crate::segment::worker::{SegmentJob, SegmentWorker};
use crate::session::AnnotationSession;
use crate::tools::{Tool, ToolAction, ToolState};
use crate::translate::{TranslateWorker, Translator};
use crate::ui::{canvas, panel, toolbar};
use crate::util::view::ViewTransform;
use std::sync::mpsc::{channel, Receiver};

/// Result of background item loading.
struct LoadedItemData {
    index: usize,
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    mask: Option<MaskLayer>,
    text: String,
    meta: String,
    mask_path: Option<std::path::PathBuf>,
}

/// Main application state.
pub struct SegmarkApp {
    config: Config,

    /// Active data source and its list labels.
    dataset: Option<Dataset>,
    labels: Vec<String>,
    current_index: Option<usize>,
    /// Mask save path and metadata for the loaded item.
    current_mask_path: Option<std::path::PathBuf>,
    current_meta: String,

    /// Annotation state for the loaded item.
    session: Option<AnnotationSession>,
    tools: ToolState,
    view: ViewTransform,
    needs_fit: bool,

    /// Textures for the image and the two mask overlays.
    image_texture: Option<egui::TextureHandle>,
    base_texture: Option<egui::TextureHandle>,
    preview_texture: Option<egui::TextureHandle>,
    overlays_dirty: bool,

    /// Receiver for background item loading.
    item_loader: Option<Receiver<Result<LoadedItemData, String>>>,
    loading_message: Option<String>,
    /// Last recoverable error / info line shown in the status bar.
    status_message: Option<String>,

    segment_worker: Option<SegmentWorker>,
    translate_worker: Option<TranslateWorker>,
    translate_seq: u64,
}

impl SegmarkApp {
    /// Create the application, spawning the segmentation and translation
    /// workers from the configuration.
    pub fn new(config: Config) -> Self {
        let segment_worker = match RemoteSegmentor::new(
            config.segment_endpoint.clone(),
            config.segment_timeout_secs,
        ) {
            Ok(segmentor) => Some(SegmentWorker::spawn(Box::new(segmentor))),
            Err(e) => {
                log::error!("segmentation client unavailable: {e:#}");
                None
            }
        };

        let translate_worker = if config.translation_enabled() {
            match Translator::new(&config.translator_appid, &config.translator_api_key) {
                Ok(translator) => Some(TranslateWorker::spawn(
                    translator,
                    config.translate_from.clone(),
                    config.translate_to.clone(),
                )),
                Err(e) => {
                    log::error!("translator unavailable: {e:#}");
                    None
                }
            }
        } else {
            None
        };

        Self {
            config,
            dataset: None,
            labels: Vec::new(),
            current_index: None,
            current_mask_path: None,
            current_meta: String::new(),
            session: None,
            tools: ToolState::new(Tool::PointPrompt),
            view: ViewTransform::default(),
            needs_fit: false,
            image_texture: None,
            base_texture: None,
            preview_texture: None,
            overlays_dirty: false,
            item_loader: None,
            loading_message: None,
            status_message: None,
            segment_worker,
            translate_worker,
            translate_seq: 0,
        }
    }

    fn open_folder(&mut self, path: std::path::PathBuf) {
        match FolderDataset::load(&path) {
            Ok(dataset) => self.install_dataset(Dataset::Folder(dataset)),
            Err(e) => self.report_error(format!("Failed to open folder: {e:#}")),
        }
    }

    fn open_json(&mut self, path: std::path::PathBuf) {
        match JsonDataset::load(&path) {
            Ok(dataset) => self.install_dataset(Dataset::Json(dataset)),
            Err(e) => self.report_error(format!("Failed to open JSON: {e:#}")),
        }
    }

    fn install_dataset(&mut self, dataset: Dataset) {
        self.labels = dataset.labels();
        self.dataset = Some(dataset);
        self.current_index = None;
        self.session = None;
        self.image_texture = None;
        self.base_texture = None;
        self.preview_texture = None;
        self.status_message = None;
        if !self.labels.is_empty() {
            self.select_item(0);
        }
    }

    /// Load item `index` on a background thread so large photos do not
    /// stall the interface.
    fn select_item(&mut self, index: usize) {
        let Some(dataset) = &self.dataset else {
            return;
        };
        let Some(item) = dataset.item(index) else {
            return;
        };

        let (sender, receiver) = channel();
        self.item_loader = Some(receiver);
        self.loading_message = Some(format!("Loading {}...", item.image_path.display()));

        std::thread::spawn(move || {
            let result = (|| -> Result<LoadedItemData, String> {
                let ItemPaths {
                    image_path,
                    mask_path,
                    text,
                    meta,
                } = item;

                let loaded = media::load_image(&image_path)
                    .map_err(|e| format!("Failed to load image: {e:#}"))?;

                // A stored mask is optional; a broken one is a warning,
                // not a hard failure.
                let mask = mask_path.as_ref().filter(|p| p.exists()).and_then(|p| {
                    match media::load_mask(p, loaded.width, loaded.height) {
                        Ok(mask) => Some(mask),
                        Err(e) => {
                            log::warn!("ignoring unreadable mask: {e:#}");
                            None
                        }
                    }
                });

                log::info!(
                    "loaded item {index}: {} ({}x{})",
                    image_path.display(),
                    loaded.width,
                    loaded.height
                );

                Ok(LoadedItemData {
                    index,
                    width: loaded.width,
                    height: loaded.height,
                    pixels: loaded.pixels,
                    mask,
                    text,
                    meta,
                    mask_path,
                })
            })();

            let _ = sender.send(result);
        });
    }

    /// Install a finished background load: texture, fresh session, fresh
    /// view transform. Everything per-item is replaced wholesale so no
    /// state can bleed between items.
    fn finish_item_load(&mut self, ctx: &egui::Context, data: LoadedItemData) {
        let size = [data.width as usize, data.height as usize];
        let color_image = egui::ColorImage::from_rgba_unmultiplied(size, &data.pixels);
        self.image_texture =
            Some(ctx.load_texture("item_image", color_image, egui::TextureOptions::LINEAR));

        let mut session = AnnotationSession::new(data.width, data.height, self.config.brush_radius);
        session.load_base_mask(data.mask);
        session.text = data.text;
        let has_text = !session.text.trim().is_empty();

        self.current_index = Some(data.index);
        self.current_mask_path = data.mask_path;
        self.current_meta = data.meta;
        self.session = Some(session);
        self.tools = ToolState::new(self.tools.tool());
        self.view = ViewTransform::default();
        self.needs_fit = true;
        self.overlays_dirty = true;
        self.status_message = None;

        // The predictor embeds the image once per load.
        if let Some(worker) = &self.segment_worker {
            worker.submit(SegmentJob::SetImage {
                rgba: data.pixels,
                width: data.width,
                height: data.height,
            });
        }

        // Any translation still in flight answers the previous item; move
        // the sequence on even when this item requests nothing.
        self.translate_seq += 1;
        if has_text {
            self.request_translation();
        }
    }

    fn report_error(&mut self, message: String) {
        log::error!("{message}");
        self.status_message = Some(message);
    }

    fn request_translation(&mut self) {
        let (Some(worker), Some(session)) = (&self.translate_worker, &self.session) else {
            return;
        };
        if session.text.trim().is_empty() {
            return;
        }
        self.translate_seq += 1;
        worker.submit(self.translate_seq, session.text.clone());
    }

    /// Persist the composite mask and the free text for the current item.
    /// Save failures are surfaced, never swallowed; in-memory state is
    /// unchanged so the operator can retry.
    fn save_current(&mut self) {
        let (Some(index), Some(session)) = (self.current_index, &self.session) else {
            return;
        };

        if let Some(mask) = session.current_mask() {
            match &self.current_mask_path {
                Some(path) => {
                    if let Err(e) = media::save_mask(path, &mask) {
                        self.report_error(format!("Failed to save mask: {e:#}"));
                        return;
                    }
                }
                None => {
                    self.report_error("This record has no mask path to save to".to_string());
                    return;
                }
            }
        }

        let text = session.text.clone();
        if let Some(dataset) = &mut self.dataset {
            if let Err(e) = dataset.save_text(index, &text) {
                self.report_error(format!("Failed to save text: {e:#}"));
                return;
            }
        }
        self.status_message = Some("Saved".to_string());
    }

    /// Silently persist the edited text before navigating away. Masks are
    /// never autosaved; only an explicit save touches mask files.
    fn autosave_text(&mut self) {
        let (Some(index), Some(session)) = (self.current_index, &self.session) else {
            return;
        };
        let text = session.text.clone();
        if let Some(dataset) = &mut self.dataset {
            if let Err(e) = dataset.save_text(index, &text) {
                log::warn!("text autosave failed: {e:#}");
            }
        }
    }

    fn navigate(&mut self, delta: isize) {
        let Some(index) = self.current_index else {
            return;
        };
        let count = self.labels.len() as isize;
        let next = index as isize + delta;
        if next < 0 || next >= count {
            return;
        }
        self.autosave_text();
        self.select_item(next as usize);
    }

    fn delete_current(&mut self) {
        let Some(index) = self.current_index else {
            return;
        };
        if let Some(dataset) = &mut self.dataset {
            if let Err(e) = dataset.delete(index) {
                self.report_error(format!("Failed to delete item: {e:#}"));
                return;
            }
            self.labels = dataset.labels();
        }
        self.current_index = None;
        self.session = None;
        self.image_texture = None;
        self.base_texture = None;
        self.preview_texture = None;
        if !self.labels.is_empty() {
            self.select_item(index.min(self.labels.len() - 1));
        }
    }

    fn set_tool(&mut self, tool: Tool) {
        let leaving_prompt = self.tools.set_tool(tool);
        if leaving_prompt {
            if let Some(session) = &mut self.session {
                session.reset_interaction();
                self.overlays_dirty = true;
            }
        }
    }

    fn confirm_add(&mut self) {
        if let Some(session) = &mut self.session {
            if session.confirm_add() {
                self.overlays_dirty = true;
            }
        }
    }

    fn confirm_remove(&mut self) {
        if let Some(session) = &mut self.session {
            if session.confirm_remove() {
                self.overlays_dirty = true;
            }
        }
    }

    fn reset_preview(&mut self) {
        if let Some(session) = &mut self.session {
            session.reset_interaction();
            self.overlays_dirty = true;
        }
    }

    /// Execute the canvas's tool actions against the session, forwarding
    /// predict requests to the segmentation worker.
    fn apply_tool_actions(&mut self, actions: Vec<ToolAction>) {
        if actions.is_empty() {
            return;
        }
        let Some(session) = &mut self.session else {
            return;
        };
        for action in actions {
            let mutates_mask = !matches!(action, ToolAction::AddPrompt { .. });
            if let Some(request) = session.apply(action) {
                match &self.segment_worker {
                    Some(worker) => worker.submit(SegmentJob::Predict {
                        token: request.token,
                        points: request.points,
                    }),
                    None => {
                        self.status_message =
                            Some("Segmentation service is not available".to_string());
                    }
                }
            }
            if mutates_mask {
                self.overlays_dirty = true;
            }
        }
    }

    /// Drain worker channels; called once per frame before drawing.
    fn poll_workers(&mut self, ctx: &egui::Context) {
        if let Some(receiver) = &self.item_loader {
            if let Ok(result) = receiver.try_recv() {
                self.item_loader = None;
                self.loading_message = None;
                match result {
                    Ok(data) => self.finish_item_load(ctx, data),
                    Err(e) => self.report_error(e),
                }
            }
        }

        if let Some(worker) = &self.segment_worker {
            while let Some(result) = worker.poll() {
                let Some(session) = &mut self.session else {
                    continue;
                };
                match result.outcome {
                    Ok(mask) => {
                        if mask.is_none() {
                            self.status_message =
                                Some("Segmentor returned no mask; add more points".to_string());
                        }
                        if session.apply_prediction(result.token, mask) {
                            self.overlays_dirty = true;
                        }
                    }
                    Err(e) => {
                        // Recoverable: the preview keeps its prior value
                        // and the point sequence is retained.
                        self.status_message = Some(format!("Segmentation failed: {e}"));
                    }
                }
            }
        }

        if let Some(worker) = &self.translate_worker {
            while let Some((seq, text)) = worker.poll() {
                if seq != self.translate_seq {
                    continue; // superseded request
                }
                if let Some(session) = &mut self.session {
                    session.translated = text;
                }
            }
        }
    }

    /// Rebuild the red/green overlay textures after any mask mutation.
    fn refresh_overlays(&mut self, ctx: &egui::Context) {
        if !self.overlays_dirty {
            return;
        }
        self.overlays_dirty = false;

        let Some(session) = &self.session else {
            self.base_texture = None;
            self.preview_texture = None;
            return;
        };

        self.base_texture = session.composite.base().map(|mask| {
            ctx.load_texture(
                "base_overlay",
                canvas::mask_overlay(mask, canvas::BASE_COLOR),
                egui::TextureOptions::NEAREST,
            )
        });
        self.preview_texture = session.composite.preview().map(|mask| {
            ctx.load_texture(
                "preview_overlay",
                canvas::mask_overlay(mask, canvas::PREVIEW_COLOR),
                egui::TextureOptions::NEAREST,
            )
        });
    }

    fn handle_shortcuts(&mut self, ctx: &egui::Context) {
        if ctx.wants_keyboard_input() {
            return;
        }
        let (space, enter, del, escape, left, right) = ctx.input(|i| {
            (
                i.key_pressed(egui::Key::Space),
                i.key_pressed(egui::Key::Enter),
                i.key_pressed(egui::Key::Delete) || i.key_pressed(egui::Key::Backspace),
                i.key_pressed(egui::Key::Escape),
                i.key_pressed(egui::Key::ArrowLeft),
                i.key_pressed(egui::Key::ArrowRight),
            )
        });

        if space || enter {
            self.confirm_add();
        }
        if del {
            self.confirm_remove();
        }
        if escape {
            self.reset_preview();
        }
        if left {
            self.navigate(-1);
        }
        if right {
            self.navigate(1);
        }
    }
}

impl eframe::App for SegmarkApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_workers(ctx);

        // Keep polling while background work is in flight.
        if self.item_loader.is_some() {
            ctx.request_repaint();
        }

        // Top menu bar
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Open Image Folder...").clicked() {
                        if let Some(path) = rfd::FileDialog::new().pick_folder() {
                            self.open_folder(path);
                        }
                        ui.close_menu();
                    }
                    if ui.button("Open JSON Dataset...").clicked() {
                        if let Some(path) = rfd::FileDialog::new()
                            .add_filter("JSON", &["json"])
                            .pick_file()
                        {
                            self.open_json(path);
                        }
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("Save").clicked() {
                        self.save_current();
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("Quit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });
            });
        });

        // Toolbar
        let mut brush_radius = self
            .session
            .as_ref()
            .map(|s| s.brush_radius)
            .unwrap_or(self.config.brush_radius);
        let selected_tool = egui::TopBottomPanel::top("toolbar")
            .show(ctx, |ui| toolbar::show(ui, self.tools.tool(), &mut brush_radius))
            .inner;
        self.config.brush_radius = brush_radius;
        if let Some(session) = &mut self.session {
            session.brush_radius = brush_radius;
        }
        if let Some(tool) = selected_tool {
            self.set_tool(tool);
        }

        // Item list (left side)
        let mut clicked_item = None;
        egui::SidePanel::left("items")
            .default_width(220.0)
            .show(ctx, |ui| {
                ui.heading("Dataset");
                ui.label(format!("{} items", self.labels.len()));
                ui.separator();
                egui::ScrollArea::vertical().show(ui, |ui| {
                    for (i, label) in self.labels.iter().enumerate() {
                        let selected = self.current_index == Some(i);
                        if ui.selectable_label(selected, label).clicked() && !selected {
                            clicked_item = Some(i);
                        }
                    }
                });
            });
        if let Some(i) = clicked_item {
            self.autosave_text();
            self.select_item(i);
        }

        // Control panel (right side)
        let has_preview = self
            .session
            .as_ref()
            .map(|s| s.composite.has_preview())
            .unwrap_or(false);
        let has_item = self.current_index.is_some();
        let translation_enabled = self.translate_worker.is_some();
        let meta = std::mem::take(&mut self.current_meta);
        let mut text = self
            .session
            .as_mut()
            .map(|s| std::mem::take(&mut s.text))
            .unwrap_or_default();
        let translated = self
            .session
            .as_ref()
            .map(|s| s.translated.clone())
            .unwrap_or_default();

        let panel_action = egui::SidePanel::right("controls")
            .default_width(320.0)
            .show(ctx, |ui| {
                panel::show(
                    ui,
                    &meta,
                    &mut text,
                    &translated,
                    has_preview,
                    has_item,
                    translation_enabled,
                )
            })
            .inner;

        self.current_meta = meta;
        if let Some(session) = &mut self.session {
            session.text = text;
        }

        match panel_action {
            panel::PanelAction::ConfirmAdd => self.confirm_add(),
            panel::PanelAction::ConfirmRemove => self.confirm_remove(),
            panel::PanelAction::ResetPreview => self.reset_preview(),
            panel::PanelAction::Translate => self.request_translation(),
            panel::PanelAction::Save => self.save_current(),
            panel::PanelAction::Delete => self.delete_current(),
            panel::PanelAction::PrevItem => self.navigate(-1),
            panel::PanelAction::NextItem => self.navigate(1),
            panel::PanelAction::None => {}
        }

        self.handle_shortcuts(ctx);

        // Status line
        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if let Some(message) = &self.loading_message {
                    ui.spinner();
                    ui.label(message);
                } else if let Some(message) = &self.status_message {
                    ui.label(message);
                } else {
                    ui.label("Ready");
                }
            });
        });

        // Main canvas (center)
        let image_size = self.session.as_ref().map(|s| s.size());
        let prompt_points: Vec<_> = self
            .session
            .as_ref()
            .map(|s| s.prompts.points().to_vec())
            .unwrap_or_default();

        let actions = egui::CentralPanel::default()
            .show(ctx, |ui| {
                if let (true, Some((w, h))) = (self.needs_fit, image_size) {
                    self.view.fit_to_window(ui.available_size(), w, h);
                    self.needs_fit = false;
                }
                canvas::show(
                    ui,
                    &self.image_texture,
                    &self.base_texture,
                    &self.preview_texture,
                    image_size,
                    &mut self.view,
                    &mut self.tools,
                    &prompt_points,
                )
            })
            .inner;

        self.apply_tool_actions(actions);
        self.refresh_overlays(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded(index: usize, text: &str) -> LoadedItemData {
        LoadedItemData {
            index,
            width: 2,
            height: 2,
            pixels: vec![0; 16],
            mask: None,
            text: text.to_string(),
            meta: String::new(),
            mask_path: None,
        }
    }

    #[test]
    fn test_item_switch_supersedes_pending_translation() {
        let ctx = egui::Context::default();
        let mut app = SegmarkApp::new(Config::default());

        app.finish_item_load(&ctx, loaded(0, "translate me"));
        let seq_for_first = app.translate_seq;

        // The next item carries no text and requests no translation; a
        // late result tagged with the old sequence must still read as
        // stale so it cannot land in this item's panel.
        app.finish_item_load(&ctx, loaded(1, ""));
        assert_ne!(app.translate_seq, seq_for_first);
    }
}
