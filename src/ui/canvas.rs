// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Interactive canvas: image display with mask overlays under pan/zoom.
//!
//! The canvas owns no annotation state. It renders the image texture and
//! the red/green mask overlays through the [`ViewTransform`], applies
//! pan/zoom gestures to the transform, converts the remaining pointer
//! activity into image-space [`PointerEvent`]s and feeds them through the
//! tool dispatcher, returning the resulting actions to the app.

use crate::models::mask::MaskLayer;
use crate::models::prompt::{PointLabel, PromptPoint};
use crate::tools::{Button, PointerEvent, ToolAction, ToolState};
use crate::util::view::ViewTransform;

/// Overlay tint for the committed base mask.
pub const BASE_COLOR: egui::Color32 = egui::Color32::from_rgba_premultiplied(100, 0, 0, 100);
/// Overlay tint for the tentative segmentor preview.
pub const PREVIEW_COLOR: egui::Color32 = egui::Color32::from_rgba_premultiplied(0, 100, 0, 100);

/// Render a mask as a translucent single-color overlay image. Empty
/// pixels are fully transparent.
pub fn mask_overlay(mask: &MaskLayer, color: egui::Color32) -> egui::ColorImage {
    let (w, h) = mask.size();
    let mut image = egui::ColorImage::new(
        [w as usize, h as usize],
        egui::Color32::TRANSPARENT,
    );
    for (dst, &src) in image.pixels.iter_mut().zip(mask.data().iter()) {
        if src != 0 {
            *dst = color;
        }
    }
    image
}

/// Display the canvas and collect the frame's tool actions.
#[allow(clippy::too_many_arguments)]
pub fn show(
    ui: &mut egui::Ui,
    image_texture: &Option<egui::TextureHandle>,
    base_texture: &Option<egui::TextureHandle>,
    preview_texture: &Option<egui::TextureHandle>,
    image_size: Option<(u32, u32)>,
    view: &mut ViewTransform,
    tools: &mut ToolState,
    prompt_points: &[PromptPoint],
) -> Vec<ToolAction> {
    let mut actions = Vec::new();
    ui.style_mut().visuals.extreme_bg_color = egui::Color32::from_gray(40);

    let available_size = ui.available_size();

    egui::Frame::canvas(ui.style()).show(ui, |ui| {
        ui.set_min_size(available_size);

        let (Some(texture), Some((img_w, img_h))) = (image_texture, image_size) else {
            ui.centered_and_justified(|ui| {
                ui.label(
                    egui::RichText::new("Load a folder or JSON dataset to begin annotating")
                        .color(egui::Color32::from_gray(180)),
                );
            });
            return;
        };

        let canvas_rect = ui.min_rect();
        let response = ui.allocate_rect(canvas_rect, egui::Sense::click_and_drag());

        // Pan and zoom come first: the middle button and the wheel are
        // global gestures, independent of the active tool.
        let hover = response.hover_pos().map(|p| p - canvas_rect.min);
        if let Some(local) = hover {
            let scroll = ui.input(|i| i.raw_scroll_delta.y);
            if scroll != 0.0 {
                view.zoom_at(local.to_pos2(), scroll > 0.0);
            }
        }

        let (middle_down, pointer_delta) =
            ui.input(|i| (i.pointer.middle_down(), i.pointer.delta()));
        if middle_down && response.hovered() {
            view.pan_by(pointer_delta);
        } else if let Some(local) = hover {
            let image_pos = view.to_image(local.to_pos2());
            actions = dispatch_pointer(ui, tools, image_pos, img_w, img_h);
        }

        // Image, then base overlay, then preview overlay.
        let image_rect = egui::Rect::from_min_size(
            canvas_rect.min + view.offset,
            egui::vec2(img_w as f32, img_h as f32) * view.scale,
        );
        let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
        let painter = ui.painter_at(canvas_rect);
        painter.image(texture.id(), image_rect, uv, egui::Color32::WHITE);
        if let Some(base) = base_texture {
            painter.image(base.id(), image_rect, uv, egui::Color32::WHITE);
        }
        if let Some(preview) = preview_texture {
            painter.image(preview.id(), image_rect, uv, egui::Color32::WHITE);
        }

        draw_prompt_points(&painter, canvas_rect, view, prompt_points);
        draw_rubber_band(&painter, canvas_rect, view, tools);
        draw_lasso(&painter, canvas_rect, view, tools);
    });

    actions
}

/// Translate this frame's raw pointer activity into tool events.
fn dispatch_pointer(
    ui: &egui::Ui,
    tools: &mut ToolState,
    pos: (i32, i32),
    img_w: u32,
    img_h: u32,
) -> Vec<ToolAction> {
    use egui::PointerButton as Pb;

    let (pressed_primary, pressed_secondary, down_primary, down_secondary, released) = ui.input(|i| {
        (
            i.pointer.button_pressed(Pb::Primary),
            i.pointer.button_pressed(Pb::Secondary),
            i.pointer.button_down(Pb::Primary),
            i.pointer.button_down(Pb::Secondary),
            i.pointer.any_released(),
        )
    });

    let mut events = Vec::new();
    if pressed_primary {
        events.push(PointerEvent::Press {
            pos,
            button: Button::Primary,
        });
    } else if pressed_secondary {
        events.push(PointerEvent::Press {
            pos,
            button: Button::Secondary,
        });
    } else if down_primary || down_secondary {
        events.push(PointerEvent::Drag { pos });
    }
    if released {
        events.push(PointerEvent::Release { pos });
    }

    let mut actions = Vec::new();
    for event in events {
        actions.extend(tools.handle_event(event, img_w, img_h));
    }
    actions
}

fn draw_prompt_points(
    painter: &egui::Painter,
    canvas_rect: egui::Rect,
    view: &ViewTransform,
    points: &[PromptPoint],
) {
    for point in points {
        let center = canvas_rect.min.to_vec2()
            + view
                .to_screen(point.x as f32 + 0.5, point.y as f32 + 0.5)
                .to_vec2();
        let color = match point.label {
            PointLabel::Foreground => egui::Color32::GREEN,
            PointLabel::Background => egui::Color32::RED,
        };
        painter.circle_filled(center.to_pos2(), 4.0, color);
        painter.circle_stroke(
            center.to_pos2(),
            4.0,
            egui::Stroke::new(1.0, egui::Color32::BLACK),
        );
    }
}

fn draw_rubber_band(
    painter: &egui::Painter,
    canvas_rect: egui::Rect,
    view: &ViewTransform,
    tools: &ToolState,
) {
    let Some((min, max)) = tools.rubber_band() else {
        return;
    };
    let top_left = canvas_rect.min.to_vec2() + view.to_screen(min.0 as f32, min.1 as f32).to_vec2();
    let bottom_right =
        canvas_rect.min.to_vec2() + view.to_screen(max.0 as f32, max.1 as f32).to_vec2();
    painter.rect_stroke(
        egui::Rect::from_min_max(top_left.to_pos2(), bottom_right.to_pos2()),
        0.0,
        egui::Stroke::new(1.5, egui::Color32::YELLOW),
    );
}

fn draw_lasso(
    painter: &egui::Painter,
    canvas_rect: egui::Rect,
    view: &ViewTransform,
    tools: &ToolState,
) {
    let trace = tools.lasso_trace();
    if trace.len() < 2 {
        return;
    }
    let screen_points: Vec<egui::Pos2> = trace
        .iter()
        .map(|&(x, y)| {
            (canvas_rect.min.to_vec2() + view.to_screen(x as f32, y as f32).to_vec2()).to_pos2()
        })
        .collect();
    painter.add(egui::Shape::line(
        screen_points,
        egui::Stroke::new(1.5, egui::Color32::LIGHT_BLUE),
    ));
}
