// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Per-item annotation session.
//!
//! One session binds the active image's dimensions, its two-layer mask
//! model, the prompt sequence and the associated free text. Switching the
//! active item replaces the whole session rather than mutating it, so no
//! state can bleed between items.

use crate::models::composite::CompositeMaskModel;
use crate::models::mask::MaskLayer;
use crate::models::prompt::{PredictRequest, PromptSession};
use crate::tools::ToolAction;

/// Annotation state for one dataset item.
#[derive(Debug)]
pub struct AnnotationSession {
    width: u32,
    height: u32,
    pub composite: CompositeMaskModel,
    pub prompts: PromptSession,
    /// Free text (conversation/reasoning) edited alongside the mask.
    pub text: String,
    /// Latest translation result or failure message.
    pub translated: String,
    pub brush_radius: i32,
}

impl AnnotationSession {
    pub fn new(width: u32, height: u32, brush_radius: i32) -> Self {
        // Image load creates the zero-filled base immediately; stored
        // masks replace it via `load_base_mask`.
        let mut composite = CompositeMaskModel::new(width, height);
        composite.set_base(Some(MaskLayer::new(width, height)));
        Self {
            width,
            height,
            composite,
            prompts: PromptSession::new(),
            text: String::new(),
            translated: String::new(),
            brush_radius,
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Install the stored base mask for this item (resampled on shape
    /// mismatch by the composite model). `None` keeps the zero-filled
    /// base created at construction.
    pub fn load_base_mask(&mut self, mask: Option<MaskLayer>) {
        if let Some(mask) = mask {
            self.composite.set_base(Some(mask));
        }
    }

    /// Execute one tool action. Returns a predict request when the action
    /// appended a prompt point; the caller dispatches it to the segmentor
    /// worker and routes the response back through
    /// [`apply_prediction`](Self::apply_prediction).
    pub fn apply(&mut self, action: ToolAction) -> Option<PredictRequest> {
        match action {
            ToolAction::AddPrompt { x, y, label } => {
                let request = self.prompts.add_point(x, y, label);
                log::debug!(
                    "prompt point ({x}, {y}) {:?}, {} total",
                    label,
                    request.points.len()
                );
                Some(request)
            }
            ToolAction::BrushStamp { x, y, value } => {
                let radius = self.brush_radius;
                self.composite.base_or_insert().paint_circle(x, y, radius, value);
                // An erase stroke also trims the preview so the operator
                // can tidy a segmentor result before committing it.
                if value == 0 {
                    if let Some(preview) = self.composite.preview_mut() {
                        preview.paint_circle(x, y, radius, 0);
                    }
                }
                None
            }
            ToolAction::EraseRect { x, y, w, h } => {
                self.composite.base_or_insert().erase_rect(x, y, w, h);
                if let Some(preview) = self.composite.preview_mut() {
                    preview.erase_rect(x, y, w, h);
                }
                log::debug!("rect erase at ({x}, {y}) size {w}x{h}");
                None
            }
            ToolAction::FillLasso { points } => {
                self.composite.base_or_insert().fill_polygon(&points, 1);
                log::debug!("lasso fill with {} vertices", points.len());
                None
            }
        }
    }

    /// Apply a predictor response if it is still current. A stale token
    /// (the sequence changed since the request was issued) is discarded; a
    /// failed prediction (`None`) leaves the preview unchanged. Returns
    /// whether the preview was updated.
    pub fn apply_prediction(&mut self, token: u64, mask: Option<MaskLayer>) -> bool {
        if !self.prompts.accepts(token) {
            log::debug!("dropping stale prediction (token {token})");
            return false;
        }
        match mask {
            Some(mask) => {
                self.composite.set_preview(Some(mask));
                true
            }
            None => false,
        }
    }

    /// Confirm-add: merge the preview into the base and end the prompt
    /// interaction.
    pub fn confirm_add(&mut self) -> bool {
        let applied = self.composite.commit_merge();
        if applied {
            self.prompts.reset();
            log::info!("preview merged into base mask");
        }
        applied
    }

    /// Confirm-remove: subtract the preview from the base and end the
    /// prompt interaction.
    pub fn confirm_remove(&mut self) -> bool {
        let applied = self.composite.commit_subtract();
        if applied {
            self.prompts.reset();
            log::info!("preview subtracted from base mask");
        }
        applied
    }

    /// Cancel the in-progress prompt interaction: clear points, invalidate
    /// outstanding predictor requests, drop the preview. The base mask is
    /// untouched.
    pub fn reset_interaction(&mut self) {
        self.prompts.reset();
        self.composite.clear_preview();
    }

    /// The composite mask as saved: `base OR preview`, or `None` when
    /// nothing has been annotated.
    pub fn current_mask(&self) -> Option<MaskLayer> {
        self.composite.current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::prompt::PointLabel;
    use crate::tools::{Button, PointerEvent, Tool, ToolState};

    fn centered_square(w: u32, h: u32, cx: i32, cy: i32, half: i32) -> MaskLayer {
        let mut mask = MaskLayer::new(w, h);
        for y in (cy - half)..(cy + half) {
            for x in (cx - half)..(cx + half) {
                mask.set(x, y, 1);
            }
        }
        mask
    }

    #[test]
    fn test_stale_prediction_is_discarded() {
        let mut session = AnnotationSession::new(100, 100, 10);

        let first = session
            .apply(ToolAction::AddPrompt {
                x: 10,
                y: 10,
                label: PointLabel::Foreground,
            })
            .unwrap();
        let second = session
            .apply(ToolAction::AddPrompt {
                x: 20,
                y: 20,
                label: PointLabel::Foreground,
            })
            .unwrap();

        // The first response arrives late, after the second request was
        // issued: it must not touch the preview.
        assert!(!session.apply_prediction(first.token, Some(centered_square(100, 100, 10, 10, 5))));
        assert!(!session.composite.has_preview());

        assert!(session.apply_prediction(second.token, Some(centered_square(100, 100, 20, 20, 5))));
        assert!(session.composite.has_preview());
    }

    #[test]
    fn test_prediction_for_replaced_session_is_discarded() {
        // Item switch: the old session's request is still in flight when
        // the new session starts its own interaction.
        let mut first = AnnotationSession::new(50, 50, 10);
        let late = first
            .apply(ToolAction::AddPrompt {
                x: 10,
                y: 10,
                label: PointLabel::Foreground,
            })
            .unwrap();

        let mut second = AnnotationSession::new(50, 50, 10);
        second.apply(ToolAction::AddPrompt {
            x: 20,
            y: 20,
            label: PointLabel::Foreground,
        });

        // The late answer for the first item must not become the second
        // item's preview.
        assert!(!second.apply_prediction(late.token, Some(centered_square(50, 50, 10, 10, 3))));
        assert!(!second.composite.has_preview());
    }

    #[test]
    fn test_failed_prediction_keeps_prior_preview_and_points() {
        let mut session = AnnotationSession::new(50, 50, 5);
        let req = session
            .apply(ToolAction::AddPrompt {
                x: 5,
                y: 5,
                label: PointLabel::Foreground,
            })
            .unwrap();
        session.apply_prediction(req.token, Some(centered_square(50, 50, 5, 5, 2)));

        let req2 = session
            .apply(ToolAction::AddPrompt {
                x: 6,
                y: 6,
                label: PointLabel::Background,
            })
            .unwrap();
        assert!(!session.apply_prediction(req2.token, None));

        // Prior preview and both points survive so the user can recover.
        assert!(session.composite.has_preview());
        assert_eq!(session.prompts.len(), 2);
    }

    #[test]
    fn test_erase_rect_hits_both_layers() {
        let mut session = AnnotationSession::new(20, 20, 5);
        session.load_base_mask(Some(MaskLayer::from_raw(20, 20, &vec![1u8; 400]).unwrap()));
        session
            .composite
            .set_preview(Some(MaskLayer::from_raw(20, 20, &vec![1u8; 400]).unwrap()));

        session.apply(ToolAction::EraseRect {
            x: 5,
            y: 5,
            w: 10,
            h: 10,
        });

        assert_eq!(session.composite.base().unwrap().get(7, 7), 0);
        assert_eq!(session.composite.preview().unwrap().get(7, 7), 0);
        assert_eq!(session.composite.base().unwrap().get(0, 0), 1);
    }

    #[test]
    fn test_brush_asymmetry() {
        let mut session = AnnotationSession::new(20, 20, 2);
        session
            .composite
            .set_preview(Some(MaskLayer::from_raw(20, 20, &vec![1u8; 400]).unwrap()));

        // Add stroke: base only.
        session.apply(ToolAction::BrushStamp {
            x: 5,
            y: 5,
            value: 1,
        });
        assert_eq!(session.composite.base().unwrap().get(5, 5), 1);
        assert_eq!(session.composite.preview().unwrap().get(5, 5), 1);

        // Erase stroke: both layers.
        session.apply(ToolAction::BrushStamp {
            x: 5,
            y: 5,
            value: 0,
        });
        assert_eq!(session.composite.base().unwrap().get(5, 5), 0);
        assert_eq!(session.composite.preview().unwrap().get(5, 5), 0);
    }

    #[test]
    fn test_lasso_fills_base() {
        let mut session = AnnotationSession::new(20, 20, 2);
        session.apply(ToolAction::FillLasso {
            points: vec![(0, 0), (10, 0), (0, 10)],
        });
        let base = session.composite.base().unwrap();
        assert_eq!(base.get(2, 2), 1);
        assert_eq!(base.get(15, 15), 0);
    }

    #[test]
    fn test_tool_switch_clears_prompt_state() {
        let mut session = AnnotationSession::new(50, 50, 5);
        let mut tools = ToolState::new(Tool::PointPrompt);

        let actions = tools.handle_event(
            PointerEvent::Press {
                pos: (10, 10),
                button: Button::Primary,
            },
            50,
            50,
        );
        let req = session.apply(actions.into_iter().next().unwrap()).unwrap();
        session.apply_prediction(req.token, Some(centered_square(50, 50, 10, 10, 3)));
        assert!(session.composite.has_preview());

        if tools.set_tool(Tool::RectErase) {
            session.reset_interaction();
        }
        assert!(!session.composite.has_preview());
        assert!(session.prompts.is_empty());
    }

    #[test]
    fn test_end_to_end_prompt_merge_save() {
        let mut session = AnnotationSession::new(100, 100, 10);

        // Foreground click at (50, 50); segmentor answers with a 10x10
        // square centered there.
        let req = session
            .apply(ToolAction::AddPrompt {
                x: 50,
                y: 50,
                label: PointLabel::Foreground,
            })
            .unwrap();
        let square = centered_square(100, 100, 50, 50, 5);
        assert!(session.apply_prediction(req.token, Some(square.clone())));

        // The composite shows the square before any commit.
        let shown = session.current_mask().unwrap();
        assert_eq!(shown, square);

        session.confirm_add();
        let committed = session.current_mask().unwrap();
        assert_eq!(committed, square);

        // Reset clears the interaction but the committed mask persists.
        session.reset_interaction();
        assert_eq!(session.current_mask().unwrap(), square);
        assert_eq!(committed.get(50, 50), 1);
        assert_eq!(committed.get(10, 10), 0);
    }
}
