//! Width negotiation for the two side panels sharing the canvas viewport.
//!
//! The left panel is anchored at x = 0 and the right panel at the viewport's
//! right edge. When both are open, `gap` units must remain between their inner
//! edges. Each panel remembers its last width across close/open cycles.

use flowcanvas_core::PanelSide;
use serde::{Deserialize, Serialize};

use crate::GRAPH_TARGET;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelLayoutConfig {
    pub min_width: f32,
    pub gap: f32,
    /// Upper bound for a single panel, as a fraction of the viewport width.
    pub max_width_ratio: f32,
}

impl Default for PanelLayoutConfig {
    fn default() -> Self {
        Self {
            min_width: 400.0,
            gap: 100.0,
            max_width_ratio: 0.8,
        }
    }
}

impl PanelLayoutConfig {
    pub fn is_valid(&self) -> bool {
        self.min_width.is_finite()
            && self.gap.is_finite()
            && self.max_width_ratio.is_finite()
            && self.min_width >= 0.0
            && self.gap >= 0.0
            && self.max_width_ratio > 0.0
            && self.max_width_ratio <= 1.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PanelState {
    pub is_open: bool,
    pub width: f32,
}

/// Remembered widths, in the shape hosts persist them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PanelWidths {
    pub left: f32,
    pub right: f32,
}

#[derive(Debug, Clone, Copy)]
struct DragSession {
    side: PanelSide,
    start_pointer_x: f32,
    start_width: f32,
    other_start_width: f32,
}

#[derive(Debug, Clone)]
pub struct PanelLayoutNegotiator {
    config: PanelLayoutConfig,
    viewport_width: f32,
    left: PanelState,
    right: PanelState,
    drag: Option<DragSession>,
}

impl PanelLayoutNegotiator {
    pub fn new(config: PanelLayoutConfig, viewport_width: f32) -> Self {
        let config = if config.is_valid() {
            config
        } else {
            tracing::warn!(target: GRAPH_TARGET, ?config, "invalid panel limits, using defaults");
            PanelLayoutConfig::default()
        };
        let closed = PanelState {
            is_open: false,
            width: config.min_width,
        };
        Self {
            config,
            viewport_width,
            left: closed,
            right: closed,
            drag: None,
        }
    }

    pub fn config(&self) -> &PanelLayoutConfig {
        &self.config
    }

    pub fn viewport_width(&self) -> f32 {
        self.viewport_width
    }

    pub fn state(&self, side: PanelSide) -> PanelState {
        match side {
            PanelSide::Left => self.left,
            PanelSide::Right => self.right,
        }
    }

    fn state_mut(&mut self, side: PanelSide) -> &mut PanelState {
        match side {
            PanelSide::Left => &mut self.left,
            PanelSide::Right => &mut self.right,
        }
    }

    pub fn width(&self, side: PanelSide) -> f32 {
        self.state(side).width
    }

    pub fn is_open(&self, side: PanelSide) -> bool {
        self.state(side).is_open
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn dragging_side(&self) -> Option<PanelSide> {
        self.drag.map(|d| d.side)
    }

    pub fn widths(&self) -> PanelWidths {
        PanelWidths {
            left: self.left.width,
            right: self.right.width,
        }
    }

    /// Restore remembered widths, raising anything below the floor.
    pub fn restore_widths(&mut self, widths: PanelWidths) {
        if !(widths.left.is_finite() && widths.right.is_finite()) {
            tracing::warn!(target: GRAPH_TARGET, ?widths, "ignoring non-finite panel widths");
            return;
        }
        self.left.width = widths.left.max(self.config.min_width);
        self.right.width = widths.right.max(self.config.min_width);
        self.reconcile(PanelSide::Right);
    }

    fn max_width(&self) -> f32 {
        (self.viewport_width * self.config.max_width_ratio).max(self.config.min_width)
    }

    /// Space both open panels may share while keeping the gap.
    fn shared_width(&self) -> f32 {
        self.viewport_width - self.config.gap
    }

    /// Open a panel at its remembered width. Returns whether it was closed.
    pub fn open(&mut self, side: PanelSide) -> bool {
        if self.is_open(side) {
            return false;
        }
        self.state_mut(side).is_open = true;
        self.reconcile(side);
        true
    }

    pub fn close(&mut self, side: PanelSide) -> bool {
        if !self.is_open(side) {
            return false;
        }
        if self.dragging_side() == Some(side) {
            self.drag = None;
        }
        self.state_mut(side).is_open = false;
        true
    }

    pub fn set_viewport_width(&mut self, width: f32) {
        if !width.is_finite() || width <= 0.0 {
            return;
        }
        self.viewport_width = width;
        self.reconcile(PanelSide::Right);
    }

    /// Re-establish the width bounds and the gap, shrinking `first` before
    /// the other panel. Neither panel drops below the minimum width.
    fn reconcile(&mut self, first: PanelSide) {
        let max = self.max_width();
        let min = self.config.min_width;
        for side in [PanelSide::Left, PanelSide::Right] {
            let state = self.state_mut(side);
            state.width = state.width.clamp(min, max);
        }
        if !(self.left.is_open && self.right.is_open) {
            return;
        }
        let mut excess = self.left.width + self.right.width - self.shared_width();
        for side in [first, first.other()] {
            if excess <= 0.0 {
                break;
            }
            let state = self.state_mut(side);
            let shrink = (state.width - min).min(excess);
            state.width -= shrink;
            excess -= shrink;
        }
        if excess > 0.0 {
            tracing::warn!(
                target: GRAPH_TARGET,
                viewport = self.viewport_width,
                "viewport too narrow for both panels at minimum width"
            );
        }
    }

    /// Start resizing an open panel. Returns `false` for a closed panel.
    pub fn begin_drag(&mut self, side: PanelSide, pointer_x: f32) -> bool {
        if !self.is_open(side) {
            tracing::debug!(target: GRAPH_TARGET, ?side, "refusing drag on closed panel");
            return false;
        }
        if !pointer_x.is_finite() {
            tracing::debug!(target: GRAPH_TARGET, pointer_x, "ignoring non-finite drag start");
            return false;
        }
        self.drag = Some(DragSession {
            side,
            start_pointer_x: pointer_x,
            start_width: self.width(side),
            other_start_width: self.width(side.other()),
        });
        true
    }

    /// Apply pointer movement. Returns the widths in effect afterwards, or
    /// `None` when no drag is active.
    pub fn update_drag(&mut self, pointer_x: f32) -> Option<PanelWidths> {
        let drag = self.drag?;
        if !pointer_x.is_finite() {
            tracing::debug!(target: GRAPH_TARGET, pointer_x, "ignoring non-finite drag move");
            return Some(self.widths());
        }
        let delta = pointer_x - drag.start_pointer_x;
        let grown = match drag.side {
            PanelSide::Left => drag.start_width + delta,
            PanelSide::Right => drag.start_width - delta,
        };
        let min = self.config.min_width;
        let mut width = grown.clamp(min, self.max_width());

        let other_side = drag.side.other();
        if self.is_open(other_side) {
            let available = self.shared_width();
            // The other panel gives way first, but never below its floor and
            // never past the width it had when the drag began.
            let other = (available - width).clamp(min, drag.other_start_width.max(min));
            if width + other > available {
                width = (available - other).max(min);
            }
            self.state_mut(other_side).width = other;
        }
        self.state_mut(drag.side).width = width;
        Some(self.widths())
    }

    /// Finish the drag; both widths are remembered as they stand.
    pub fn end_drag(&mut self) -> Option<PanelWidths> {
        let drag = self.drag.take()?;
        tracing::debug!(
            target: GRAPH_TARGET,
            side = ?drag.side,
            left = self.left.width,
            right = self.right.width,
            "panel drag finished"
        );
        Some(self.widths())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn negotiator(viewport: f32) -> PanelLayoutNegotiator {
        PanelLayoutNegotiator::new(PanelLayoutConfig::default(), viewport)
    }

    #[test]
    fn test_left_growth_capped_by_right_floor() {
        let mut layout = negotiator(1200.0);
        layout.open(PanelSide::Left);
        layout.open(PanelSide::Right);
        assert_eq!(layout.width(PanelSide::Right), 400.0);

        assert!(layout.begin_drag(PanelSide::Left, 400.0));
        // pointer asks for a 900 wide left panel
        layout.update_drag(900.0);
        layout.end_drag();

        let left = layout.width(PanelSide::Left);
        assert!(left <= 1200.0 - 400.0 - 100.0);
        assert_eq!(left, 700.0);
        assert_eq!(layout.width(PanelSide::Right), 400.0);
    }

    #[test]
    fn test_other_panel_shrinks_before_dragged_is_capped() {
        let mut layout = negotiator(1600.0);
        layout.open(PanelSide::Right);
        layout.begin_drag(PanelSide::Right, 1000.0);
        layout.update_drag(600.0); // right grows to 800
        layout.end_drag();
        assert_eq!(layout.width(PanelSide::Right), 800.0);

        layout.open(PanelSide::Left);
        assert_eq!(layout.width(PanelSide::Left), 400.0);

        layout.begin_drag(PanelSide::Left, 400.0);
        layout.update_drag(800.0); // left wants 800: right gives 100 back
        assert_eq!(layout.width(PanelSide::Left), 800.0);
        assert_eq!(layout.width(PanelSide::Right), 700.0);

        layout.update_drag(1400.0); // right is at its floor
        assert_eq!(layout.width(PanelSide::Right), 400.0);
        assert_eq!(layout.width(PanelSide::Left), 1100.0);

        layout.update_drag(500.0); // dragging back lets right recover
        assert_eq!(layout.width(PanelSide::Left), 500.0);
        assert_eq!(layout.width(PanelSide::Right), 800.0);
        layout.end_drag();
    }

    #[test]
    fn test_right_panel_grows_leftward_and_respects_max_ratio() {
        let mut layout = negotiator(1000.0);
        layout.open(PanelSide::Right);
        layout.begin_drag(PanelSide::Right, 600.0);
        layout.update_drag(0.0);
        assert_eq!(layout.width(PanelSide::Right), 800.0);
        layout.update_drag(900.0);
        assert_eq!(layout.width(PanelSide::Right), 400.0);
        assert!(!layout.is_open(PanelSide::Left));
    }

    #[test]
    fn test_closed_panel_cannot_be_dragged_and_width_is_remembered() {
        let mut layout = negotiator(2000.0);
        assert!(!layout.begin_drag(PanelSide::Left, 0.0));
        assert_eq!(layout.update_drag(10.0), None);

        layout.open(PanelSide::Left);
        layout.begin_drag(PanelSide::Left, 400.0);
        layout.update_drag(520.0);
        layout.end_drag();
        assert!(layout.close(PanelSide::Left));
        assert!(!layout.close(PanelSide::Left));
        assert!(layout.open(PanelSide::Right));
        assert!(layout.open(PanelSide::Left));
        assert_eq!(layout.width(PanelSide::Left), 520.0);
        assert!(layout.is_open(PanelSide::Right));
    }

    #[test]
    fn test_opening_second_panel_restores_gap() {
        let mut layout = negotiator(1400.0);
        layout.restore_widths(PanelWidths {
            left: 700.0,
            right: 700.0,
        });
        layout.open(PanelSide::Left);
        layout.open(PanelSide::Right);
        assert_eq!(layout.width(PanelSide::Left), 700.0);
        assert_eq!(layout.width(PanelSide::Right), 600.0);

        layout.set_viewport_width(1000.0);
        assert_eq!(layout.width(PanelSide::Right), 400.0);
        assert_eq!(layout.width(PanelSide::Left), 500.0);
    }

    #[test]
    fn test_non_finite_pointer_leaves_widths_alone() {
        let mut layout = negotiator(1600.0);
        layout.open(PanelSide::Left);
        layout.open(PanelSide::Right);
        assert!(!layout.begin_drag(PanelSide::Left, f32::NAN));
        assert!(!layout.is_dragging());

        assert!(layout.begin_drag(PanelSide::Left, 400.0));
        layout.update_drag(500.0);
        let before = layout.widths();
        for x in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
            assert_eq!(layout.update_drag(x), Some(before));
        }
        assert_eq!(layout.end_drag(), Some(before));
        assert_eq!(before.left, 500.0);
    }

    #[test]
    fn test_invalid_config_and_widths_are_rejected() {
        let layout = PanelLayoutNegotiator::new(
            PanelLayoutConfig {
                min_width: f32::NAN,
                gap: -5.0,
                max_width_ratio: 0.8,
            },
            1200.0,
        );
        assert_eq!(*layout.config(), PanelLayoutConfig::default());

        let mut layout = negotiator(1200.0);
        layout.restore_widths(PanelWidths {
            left: f32::NAN,
            right: 500.0,
        });
        assert_eq!(layout.widths(), PanelWidths { left: 400.0, right: 400.0 });
    }

    proptest! {
        #[test]
        fn prop_gap_is_never_violated(
            viewport in 900.0f32..3000.0,
            side_left in proptest::bool::ANY,
            moves in proptest::collection::vec(
                prop_oneof![
                    9 => -2000.0f32..2000.0,
                    1 => Just(f32::NAN),
                ],
                1..20,
            ),
        ) {
            let mut layout = negotiator(viewport);
            layout.open(PanelSide::Left);
            layout.open(PanelSide::Right);
            let side = if side_left { PanelSide::Left } else { PanelSide::Right };
            layout.begin_drag(side, 0.0);
            for x in moves {
                let widths = layout.update_drag(x).unwrap();
                prop_assert!(widths.left >= 400.0 && widths.right >= 400.0);
                prop_assert!(widths.left + widths.right + 100.0 <= viewport + 0.01);
            }
        }
    }
}
