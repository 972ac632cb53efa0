// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Right-side control panel: metadata, commit actions, free text,
//! translation and item navigation.
//!
//! The panel mutates only the edited text in place; every other effect is
//! reported back to the app as a [`PanelAction`].

/// Result of control panel interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelAction {
    None,
    /// Merge the preview into the base mask (confirm add).
    ConfirmAdd,
    /// Subtract the preview from the base mask (confirm remove).
    ConfirmRemove,
    /// Cancel the current prompt interaction and preview.
    ResetPreview,
    /// Translate the edited text.
    Translate,
    /// Save the current item (mask + text).
    Save,
    /// Delete the current item from the dataset.
    Delete,
    PrevItem,
    NextItem,
}

/// Display the control panel. `has_preview` gates the commit buttons;
/// `translation_enabled` hides the translate button when no credentials
/// are configured.
pub fn show(
    ui: &mut egui::Ui,
    meta: &str,
    text: &mut String,
    translated: &str,
    has_preview: bool,
    has_item: bool,
    translation_enabled: bool,
) -> PanelAction {
    let mut action = PanelAction::None;

    ui.heading("Item");
    egui::ScrollArea::vertical()
        .max_height(100.0)
        .id_source("meta_scroll")
        .show(ui, |ui| {
            ui.label(egui::RichText::new(meta).weak().monospace());
        });
    ui.separator();

    ui.label(
        egui::RichText::new(
            "Left click: foreground point\n\
             Right click: background point\n\
             Space: confirm add   Del: confirm remove\n\
             Esc: cancel preview",
        )
        .weak(),
    );
    ui.separator();

    if ui
        .add_enabled(has_preview, egui::Button::new("↺ Cancel preview (Esc)"))
        .clicked()
    {
        action = PanelAction::ResetPreview;
    }

    ui.horizontal(|ui| {
        if ui
            .add_enabled(has_preview, egui::Button::new("➕ Confirm add (Space)"))
            .clicked()
        {
            action = PanelAction::ConfirmAdd;
        }
        if ui
            .add_enabled(has_preview, egui::Button::new("➖ Confirm remove (Del)"))
            .clicked()
        {
            action = PanelAction::ConfirmRemove;
        }
    });

    ui.separator();
    ui.label("Conversation / reasoning text:");
    egui::ScrollArea::vertical()
        .max_height(180.0)
        .id_source("text_scroll")
        .show(ui, |ui| {
            ui.add(
                egui::TextEdit::multiline(text)
                    .desired_width(f32::INFINITY)
                    .desired_rows(8),
            );
        });

    if translation_enabled {
        if ui.button("🌐 Translate").clicked() {
            action = PanelAction::Translate;
        }
        ui.label("Translation:");
        egui::ScrollArea::vertical()
            .max_height(120.0)
            .id_source("translated_scroll")
            .show(ui, |ui| {
                ui.label(egui::RichText::new(translated).weak());
            });
    }

    ui.separator();
    ui.horizontal(|ui| {
        if ui.add_enabled(has_item, egui::Button::new("<< Prev")).clicked() {
            action = PanelAction::PrevItem;
        }
        if ui.add_enabled(has_item, egui::Button::new("Next >>")).clicked() {
            action = PanelAction::NextItem;
        }
    });

    if ui
        .add_enabled(has_item, egui::Button::new("🗑 Delete item"))
        .clicked()
    {
        action = PanelAction::Delete;
    }
    if ui
        .add_enabled(has_item, egui::Button::new("💾 Save"))
        .clicked()
    {
        action = PanelAction::Save;
    }

    action
}
