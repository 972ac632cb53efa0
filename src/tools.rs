// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Edit-tool state machine.
//!
//! Raw pointer events arrive already converted to image coordinates; the
//! active tool interprets them and emits [`ToolAction`]s for the session
//! to execute. The dispatcher is a pure state machine with no knowledge of
//! the windowing layer, so the full press/drag/release contract is
//! testable without a UI. Middle-button panning is handled upstream and
//! never reaches this module.

use crate::models::prompt::PointLabel;

/// Currently selected interaction mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    /// Click foreground/background points to prompt the segmentor.
    PointPrompt,
    /// Rubber-band a rectangle; its contents are erased from both layers.
    RectErase,
    /// Free-hand paint (primary adds to base, secondary erases both layers).
    Brush,
    /// Trace a free-hand polygon that is filled into the base layer.
    PolygonLasso,
}

/// Pointer buttons the tools distinguish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Primary,
    Secondary,
}

/// A pointer event in image coordinates (possibly out of bounds).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEvent {
    Press { pos: (i32, i32), button: Button },
    Drag { pos: (i32, i32) },
    Release { pos: (i32, i32) },
}

/// Mask/prompt mutation requested by the active tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolAction {
    /// Append a prompt point and re-run the predictor.
    AddPrompt { x: u32, y: u32, label: PointLabel },
    /// Stamp the brush at a point. `value` 1 paints the base only;
    /// `value` 0 erases from both base and preview.
    BrushStamp { x: i32, y: i32, value: u8 },
    /// Erase a normalized rectangle from both layers.
    EraseRect { x: i32, y: i32, w: i32, h: i32 },
    /// Fill the traced polygon into the base layer with value 1.
    FillLasso { points: Vec<(i32, i32)> },
}

fn in_bounds(pos: (i32, i32), width: u32, height: u32) -> bool {
    pos.0 >= 0 && pos.1 >= 0 && pos.0 < width as i32 && pos.1 < height as i32
}

/// Dispatcher state: the active tool plus the transient per-gesture state
/// (rubber-band corners, brush stroke value, lasso trace).
#[derive(Debug)]
pub struct ToolState {
    tool: Tool,
    rect_anchor: Option<(i32, i32)>,
    rect_cursor: Option<(i32, i32)>,
    stroke_value: Option<u8>,
    lasso: Vec<(i32, i32)>,
}

impl ToolState {
    pub fn new(tool: Tool) -> Self {
        Self {
            tool,
            rect_anchor: None,
            rect_cursor: None,
            stroke_value: None,
            lasso: Vec::new(),
        }
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    /// Switch tools, discarding any in-progress rectangle, stroke or
    /// trace. Returns true when this leaves `PointPrompt` (the caller
    /// must then clear the prompt session and preview).
    pub fn set_tool(&mut self, tool: Tool) -> bool {
        let leaving_prompt = self.tool == Tool::PointPrompt && tool != Tool::PointPrompt;
        if self.tool != tool {
            self.clear_transient();
        }
        self.tool = tool;
        leaving_prompt
    }

    fn clear_transient(&mut self) {
        self.rect_anchor = None;
        self.rect_cursor = None;
        self.stroke_value = None;
        self.lasso.clear();
    }

    /// The live rubber-band rectangle as (min, max) corners, for rendering.
    pub fn rubber_band(&self) -> Option<((i32, i32), (i32, i32))> {
        let (a, c) = (self.rect_anchor?, self.rect_cursor?);
        Some((
            (a.0.min(c.0), a.1.min(c.1)),
            (a.0.max(c.0), a.1.max(c.1)),
        ))
    }

    /// The accumulating lasso trace, for rendering.
    pub fn lasso_trace(&self) -> &[(i32, i32)] {
        &self.lasso
    }

    /// Feed one pointer event through the active tool's contract and
    /// collect the resulting actions.
    pub fn handle_event(
        &mut self,
        event: PointerEvent,
        width: u32,
        height: u32,
    ) -> Vec<ToolAction> {
        match self.tool() {
            Tool::PointPrompt => self.handle_point_prompt(event, width, height),
            Tool::RectErase => self.handle_rect_erase(event),
            Tool::Brush => self.handle_brush(event, width, height),
            Tool::PolygonLasso => self.handle_lasso(event, width, height),
        }
    }

    fn handle_point_prompt(
        &mut self,
        event: PointerEvent,
        width: u32,
        height: u32,
    ) -> Vec<ToolAction> {
        let PointerEvent::Press { pos, button } = event else {
            return Vec::new();
        };
        // Out-of-bounds presses are normal pointer jitter; drop them.
        if !in_bounds(pos, width, height) {
            return Vec::new();
        }
        let label = match button {
            Button::Primary => PointLabel::Foreground,
            Button::Secondary => PointLabel::Background,
        };
        vec![ToolAction::AddPrompt {
            x: pos.0 as u32,
            y: pos.1 as u32,
            label,
        }]
    }

    fn handle_rect_erase(&mut self, event: PointerEvent) -> Vec<ToolAction> {
        match event {
            PointerEvent::Press {
                pos,
                button: Button::Primary,
            } => {
                self.rect_anchor = Some(pos);
                self.rect_cursor = Some(pos);
                Vec::new()
            }
            PointerEvent::Press { .. } => Vec::new(),
            PointerEvent::Drag { pos } => {
                if self.rect_anchor.is_some() {
                    self.rect_cursor = Some(pos);
                }
                Vec::new()
            }
            PointerEvent::Release { pos } => {
                let Some(anchor) = self.rect_anchor.take() else {
                    return Vec::new();
                };
                self.rect_cursor = None;
                let (x0, x1) = (anchor.0.min(pos.0), anchor.0.max(pos.0));
                let (y0, y1) = (anchor.1.min(pos.1), anchor.1.max(pos.1));
                let (w, h) = (x1 - x0, y1 - y0);
                if w > 0 && h > 0 {
                    vec![ToolAction::EraseRect { x: x0, y: y0, w, h }]
                } else {
                    Vec::new()
                }
            }
        }
    }

    fn handle_brush(&mut self, event: PointerEvent, width: u32, height: u32) -> Vec<ToolAction> {
        match event {
            PointerEvent::Press { pos, button } => {
                if !in_bounds(pos, width, height) {
                    return Vec::new();
                }
                let value = match button {
                    Button::Primary => 1,
                    Button::Secondary => 0,
                };
                self.stroke_value = Some(value);
                vec![ToolAction::BrushStamp {
                    x: pos.0,
                    y: pos.1,
                    value,
                }]
            }
            PointerEvent::Drag { pos } => {
                let Some(value) = self.stroke_value else {
                    return Vec::new();
                };
                // Out-of-bounds samples are skipped; the stroke resumes
                // once the pointer returns.
                if !in_bounds(pos, width, height) {
                    return Vec::new();
                }
                vec![ToolAction::BrushStamp {
                    x: pos.0,
                    y: pos.1,
                    value,
                }]
            }
            PointerEvent::Release { .. } => {
                self.stroke_value = None;
                Vec::new()
            }
        }
    }

    fn handle_lasso(&mut self, event: PointerEvent, width: u32, height: u32) -> Vec<ToolAction> {
        match event {
            PointerEvent::Press {
                pos,
                button: Button::Primary,
            } => {
                if in_bounds(pos, width, height) {
                    self.lasso.clear();
                    self.lasso.push(pos);
                }
                Vec::new()
            }
            PointerEvent::Press { .. } => Vec::new(),
            PointerEvent::Drag { pos } => {
                if self.lasso.is_empty() || !in_bounds(pos, width, height) {
                    return Vec::new();
                }
                if self.lasso.last() != Some(&pos) {
                    self.lasso.push(pos);
                }
                Vec::new()
            }
            PointerEvent::Release { .. } => {
                let trace = std::mem::take(&mut self.lasso);
                if trace.len() > 2 {
                    vec![ToolAction::FillLasso { points: trace }]
                } else {
                    Vec::new()
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(x: i32, y: i32, button: Button) -> PointerEvent {
        PointerEvent::Press {
            pos: (x, y),
            button,
        }
    }

    fn drag(x: i32, y: i32) -> PointerEvent {
        PointerEvent::Drag { pos: (x, y) }
    }

    fn release(x: i32, y: i32) -> PointerEvent {
        PointerEvent::Release { pos: (x, y) }
    }

    #[test]
    fn test_point_prompt_buttons_map_to_labels() {
        let mut state = ToolState::new(Tool::PointPrompt);
        let fg = state.handle_event(press(3, 4, Button::Primary), 10, 10);
        let bg = state.handle_event(press(5, 6, Button::Secondary), 10, 10);

        assert_eq!(
            fg,
            vec![ToolAction::AddPrompt {
                x: 3,
                y: 4,
                label: PointLabel::Foreground
            }]
        );
        assert_eq!(
            bg,
            vec![ToolAction::AddPrompt {
                x: 5,
                y: 6,
                label: PointLabel::Background
            }]
        );
    }

    #[test]
    fn test_point_prompt_drops_out_of_bounds_press() {
        let mut state = ToolState::new(Tool::PointPrompt);
        assert!(state
            .handle_event(press(-1, 4, Button::Primary), 10, 10)
            .is_empty());
        assert!(state
            .handle_event(press(10, 0, Button::Primary), 10, 10)
            .is_empty());
    }

    #[test]
    fn test_rect_erase_normalizes_corners() {
        let mut state = ToolState::new(Tool::RectErase);
        state.handle_event(press(8, 9, Button::Primary), 20, 20);
        state.handle_event(drag(2, 3), 20, 20);
        assert_eq!(state.rubber_band(), Some(((2, 3), (8, 9))));

        let actions = state.handle_event(release(2, 3), 20, 20);
        assert_eq!(
            actions,
            vec![ToolAction::EraseRect {
                x: 2,
                y: 3,
                w: 6,
                h: 6
            }]
        );
        assert!(state.rubber_band().is_none());
    }

    #[test]
    fn test_rect_erase_zero_area_is_dropped() {
        let mut state = ToolState::new(Tool::RectErase);
        state.handle_event(press(5, 5, Button::Primary), 20, 20);
        let actions = state.handle_event(release(5, 9), 20, 20);
        assert!(actions.is_empty());
    }

    #[test]
    fn test_brush_stroke_keeps_press_value() {
        let mut state = ToolState::new(Tool::Brush);
        let start = state.handle_event(press(1, 1, Button::Secondary), 10, 10);
        assert_eq!(
            start,
            vec![ToolAction::BrushStamp {
                x: 1,
                y: 1,
                value: 0
            }]
        );

        let moved = state.handle_event(drag(2, 2), 10, 10);
        assert_eq!(
            moved,
            vec![ToolAction::BrushStamp {
                x: 2,
                y: 2,
                value: 0
            }]
        );

        state.handle_event(release(2, 2), 10, 10);
        assert!(state.handle_event(drag(3, 3), 10, 10).is_empty());
    }

    #[test]
    fn test_brush_stroke_survives_out_of_bounds_excursion() {
        let mut state = ToolState::new(Tool::Brush);
        state.handle_event(press(1, 1, Button::Primary), 10, 10);
        assert!(state.handle_event(drag(-5, 1), 10, 10).is_empty());
        // Back in bounds: the stroke continues with the same value.
        let resumed = state.handle_event(drag(4, 4), 10, 10);
        assert_eq!(
            resumed,
            vec![ToolAction::BrushStamp {
                x: 4,
                y: 4,
                value: 1
            }]
        );
    }

    #[test]
    fn test_lasso_commits_only_with_enough_points() {
        let mut state = ToolState::new(Tool::PolygonLasso);
        state.handle_event(press(0, 0, Button::Primary), 20, 20);
        state.handle_event(drag(10, 0), 20, 20);
        let short = state.handle_event(release(10, 0), 20, 20);
        assert!(short.is_empty());

        state.handle_event(press(0, 0, Button::Primary), 20, 20);
        state.handle_event(drag(10, 0), 20, 20);
        state.handle_event(drag(0, 10), 20, 20);
        let actions = state.handle_event(release(0, 10), 20, 20);
        assert_eq!(
            actions,
            vec![ToolAction::FillLasso {
                points: vec![(0, 0), (10, 0), (0, 10)]
            }]
        );
        assert!(state.lasso_trace().is_empty());
    }

    #[test]
    fn test_lasso_skips_out_of_bounds_samples() {
        let mut state = ToolState::new(Tool::PolygonLasso);
        state.handle_event(press(0, 0, Button::Primary), 20, 20);
        state.handle_event(drag(25, 0), 20, 20);
        state.handle_event(drag(10, 10), 20, 20);
        assert_eq!(state.lasso_trace(), &[(0, 0), (10, 10)]);
    }

    #[test]
    fn test_tool_switch_discards_transient_state() {
        let mut state = ToolState::new(Tool::RectErase);
        state.handle_event(press(1, 1, Button::Primary), 20, 20);
        state.handle_event(drag(5, 5), 20, 20);
        assert!(state.rubber_band().is_some());

        let leaving_prompt = state.set_tool(Tool::Brush);
        assert!(!leaving_prompt);
        assert!(state.rubber_band().is_none());
        // A release with no press in the new tool does nothing.
        assert!(state.handle_event(release(5, 5), 20, 20).is_empty());
    }

    #[test]
    fn test_leaving_point_prompt_is_reported() {
        let mut state = ToolState::new(Tool::PointPrompt);
        assert!(state.set_tool(Tool::RectErase));
        assert!(!state.set_tool(Tool::RectErase));
        assert!(!state.set_tool(Tool::PointPrompt));
    }
}
