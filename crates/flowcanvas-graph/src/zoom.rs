use flowcanvas_core::Size;
use serde::{Deserialize, Serialize};

use crate::GRAPH_TARGET;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomConfig {
    pub min: f32,
    pub max: f32,
    /// Multiplier applied per zoom-in step (divisor for zoom-out).
    pub step: f32,
    /// Total margin subtracted from each viewport axis before fitting.
    pub fit_padding: f32,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            min: 0.25,
            max: 3.0,
            step: 1.05,
            fit_padding: 96.0,
        }
    }
}

impl ZoomConfig {
    /// Limits the controller can clamp against: finite, positive, ordered,
    /// with a step that actually zooms.
    pub fn is_valid(&self) -> bool {
        [self.min, self.max, self.step, self.fit_padding]
            .iter()
            .all(|v| v.is_finite())
            && self.min > 0.0
            && self.min <= self.max
            && self.step > 1.0
            && self.fit_padding >= 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FitOutcome {
    /// The level had been chosen by hand: back to 100%.
    Reset,
    Fitted(f32),
    /// Degenerate content or viewport, nothing to fit.
    Unchanged,
}

#[derive(Debug, Clone)]
pub struct ZoomController {
    config: ZoomConfig,
    level: f32,
    manually_changed: bool,
}

impl Default for ZoomController {
    fn default() -> Self {
        Self::new(ZoomConfig::default())
    }
}

impl ZoomController {
    pub fn new(config: ZoomConfig) -> Self {
        let config = if config.is_valid() {
            config
        } else {
            tracing::warn!(target: GRAPH_TARGET, ?config, "invalid zoom limits, using defaults");
            ZoomConfig::default()
        };
        let mut zoom = Self {
            config,
            level: 1.0,
            manually_changed: false,
        };
        zoom.reset();
        zoom
    }

    pub fn config(&self) -> &ZoomConfig {
        &self.config
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn percent(&self) -> u32 {
        (self.level * 100.0).round() as u32
    }

    pub fn manually_changed(&self) -> bool {
        self.manually_changed
    }

    fn clamp(&self, level: f32) -> f32 {
        level.clamp(self.config.min, self.config.max)
    }

    pub fn zoom_in(&mut self) {
        self.level = self.clamp(self.level * self.config.step);
        self.manually_changed = true;
    }

    pub fn zoom_out(&mut self) {
        self.level = self.clamp(self.level / self.config.step);
        self.manually_changed = true;
    }

    pub fn set_level(&mut self, level: f32) {
        if !level.is_finite() {
            tracing::debug!(target: GRAPH_TARGET, level, "ignoring non-finite zoom level");
            return;
        }
        self.level = self.clamp(level);
        self.manually_changed = true;
    }

    /// Back to native size, or the nearest limit when 100% is out of range.
    pub fn reset(&mut self) {
        self.level = self.clamp(1.0);
        self.manually_changed = false;
    }

    /// Toggle between "fit" and "reset".
    ///
    /// After a manual zoom this resets to 100%; otherwise it scales the
    /// content into the padded viewport, never above native size.
    pub fn zoom_to_fit(&mut self, viewport: Size, content: Size) -> FitOutcome {
        if self.manually_changed {
            self.reset();
            return FitOutcome::Reset;
        }
        if content.width <= 0.0 || content.height <= 0.0 {
            return FitOutcome::Unchanged;
        }
        let padding = self.config.fit_padding;
        let fit = ((viewport.width - padding) / content.width)
            .min((viewport.height - padding) / content.height)
            .min(1.0)
            .max(self.config.min);
        if !fit.is_finite() {
            return FitOutcome::Unchanged;
        }
        self.level = fit;
        tracing::debug!(target: GRAPH_TARGET, level = fit, "zoom to fit");
        FitOutcome::Fitted(fit)
    }

    /// Advisory: zooming in past native size from the default state is
    /// discouraged, so the affordance is off at or above 100%.
    pub fn can_zoom_in(&self) -> bool {
        self.level < 1.0
    }

    pub fn can_zoom_out(&self) -> bool {
        self.level > self.config.min
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_zoom_in_saturates_at_max() {
        let mut zoom = ZoomController::default();
        for _ in 0..20 {
            zoom.zoom_in();
            assert!(zoom.level() <= 3.0);
        }
        for _ in 0..20 {
            zoom.zoom_in();
        }
        assert_eq!(zoom.level(), 3.0);
        assert!(zoom.manually_changed());
    }

    #[test]
    fn test_zoom_out_saturates_at_min() {
        let mut zoom = ZoomController::default();
        for _ in 0..100 {
            zoom.zoom_out();
        }
        assert_eq!(zoom.level(), 0.25);
        assert!(!zoom.can_zoom_out());
    }

    #[test]
    fn test_fit_toggles_with_reset() {
        let mut zoom = ZoomController::default();
        zoom.zoom_in();
        let viewport = Size::new(1096.0, 596.0);
        let content = Size::new(2000.0, 400.0);

        assert_eq!(zoom.zoom_to_fit(viewport, content), FitOutcome::Reset);
        assert_eq!(zoom.level(), 1.0);
        assert!(!zoom.manually_changed());

        assert_eq!(zoom.zoom_to_fit(viewport, content), FitOutcome::Fitted(0.5));
        assert_eq!(zoom.level(), 0.5);
        assert!(!zoom.manually_changed());
        // still in fit mode
        assert_eq!(zoom.zoom_to_fit(viewport, content), FitOutcome::Fitted(0.5));
    }

    #[test]
    fn test_fit_never_exceeds_native_size_or_min() {
        let mut zoom = ZoomController::default();
        assert_eq!(
            zoom.zoom_to_fit(Size::new(4000.0, 4000.0), Size::new(100.0, 100.0)),
            FitOutcome::Fitted(1.0)
        );
        assert_eq!(
            zoom.zoom_to_fit(Size::new(200.0, 200.0), Size::new(10_000.0, 10_000.0)),
            FitOutcome::Fitted(0.25)
        );
        assert_eq!(
            zoom.zoom_to_fit(Size::new(200.0, 200.0), Size::new(0.0, 10.0)),
            FitOutcome::Unchanged
        );
    }

    #[test]
    fn test_zoom_in_affordance() {
        let mut zoom = ZoomController::default();
        assert!(!zoom.can_zoom_in());
        zoom.zoom_out();
        assert!(zoom.can_zoom_in());
        zoom.set_level(7.0);
        assert_eq!(zoom.level(), 3.0);
        zoom.set_level(f32::NAN);
        assert_eq!(zoom.level(), 3.0);
    }

    #[test]
    fn test_inverted_limits_fall_back_to_defaults() {
        let mut zoom = ZoomController::new(ZoomConfig {
            min: 4.0,
            ..ZoomConfig::default()
        });
        assert_eq!(*zoom.config(), ZoomConfig::default());
        zoom.zoom_in();
        assert_eq!(zoom.level(), 1.05);

        let stalled = ZoomConfig {
            step: 1.0,
            ..ZoomConfig::default()
        };
        assert!(!stalled.is_valid());
        assert!(!ZoomConfig { max: f32::NAN, ..ZoomConfig::default() }.is_valid());
    }

    #[test]
    fn test_reset_respects_raised_floor() {
        let mut zoom = ZoomController::new(ZoomConfig {
            min: 1.5,
            ..ZoomConfig::default()
        });
        assert_eq!(zoom.level(), 1.5);
        zoom.zoom_in();
        zoom.reset();
        assert_eq!(zoom.level(), 1.5);
        assert!(!zoom.manually_changed());
    }

    proptest! {
        #[test]
        fn prop_level_stays_in_range(steps in proptest::collection::vec(proptest::bool::ANY, 0..200)) {
            let mut zoom = ZoomController::default();
            for step in steps {
                if step { zoom.zoom_in() } else { zoom.zoom_out() }
                prop_assert!(zoom.level() >= 0.25 && zoom.level() <= 3.0);
            }
        }
    }
}
