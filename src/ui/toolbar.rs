// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Toolbar and tool selection UI.

use crate::tools::Tool;

/// Display the toolbar; returns the newly selected tool when it changed.
pub fn show(ui: &mut egui::Ui, current_tool: Tool, brush_radius: &mut i32) -> Option<Tool> {
    let mut selected = None;
    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 8.0;

        ui.label("Tools:");
        ui.separator();

        let mut tool_button = |ui: &mut egui::Ui, tool: Tool, label: &str| {
            if ui.selectable_label(current_tool == tool, label).clicked() && current_tool != tool {
                selected = Some(tool);
            }
        };

        tool_button(ui, Tool::PointPrompt, "🎯 SAM points");
        tool_button(ui, Tool::RectErase, "🔲 Rect erase");
        tool_button(ui, Tool::Brush, "🖌 Brush");
        tool_button(ui, Tool::PolygonLasso, "✏ Lasso");

        ui.separator();
        ui.label("Brush:");
        ui.add(egui::Slider::new(brush_radius, 1..=50).suffix(" px"));

        ui.separator();
        let tool_text = match selected.unwrap_or(current_tool) {
            Tool::PointPrompt => "Left click = foreground point, right click = background point",
            Tool::RectErase => "Drag a rectangle; its contents are erased from both layers",
            Tool::Brush => "Left drag paints the base mask, right drag erases both layers",
            Tool::PolygonLasso => "Drag a free-hand outline; release fills it into the base mask",
        };
        ui.label(egui::RichText::new(tool_text).italics().weak());
    });
    selected
}
