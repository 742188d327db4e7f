//! Camera framing check: keep the whole hand inside the zone for a while
//!
//! Tick-driven. The latest landmarks are kept; each tick measures the hand
//! bounding box against the zone, then accumulates or decays the hold.

use tracing::{debug, info};

use crate::core::HoldMeter;
use crate::types::{FramingConfig, FramingHint, LessonEvent, LANDMARK_COUNT};

/// Normalised hand bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandBounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl HandBounds {
    /// Bounding box of flattened (x, y, z) landmarks; `None` without a full hand
    pub fn from_landmarks(landmarks: &[f64]) -> Option<Self> {
        if landmarks.len() < LANDMARK_COUNT * 3 {
            return None;
        }
        let mut bounds = Self {
            min_x: 1.0,
            max_x: 0.0,
            min_y: 1.0,
            max_y: 0.0,
        };
        let mut seen = 0;
        for point in landmarks.chunks_exact(3).take(LANDMARK_COUNT) {
            let (x, y) = (point[0], point[1]);
            if !x.is_finite() || !y.is_finite() {
                continue;
            }
            seen += 1;
            bounds.min_x = bounds.min_x.min(x);
            bounds.max_x = bounds.max_x.max(x);
            bounds.min_y = bounds.min_y.min(y);
            bounds.max_y = bounds.max_y.max(y);
        }
        (seen > 0).then_some(bounds)
    }
}

#[derive(Debug, Clone)]
pub struct FramingCheck {
    config: FramingConfig,
    meter: HoldMeter,
    landmarks: Option<Vec<f64>>,
    hint: Option<FramingHint>,
    passed: bool,
}

impl FramingCheck {
    pub fn new(config: FramingConfig) -> Self {
        let meter = HoldMeter::new(config.required_hold_ms, config.decay_factor, config.min_delta_ms);
        Self {
            config,
            meter,
            landmarks: None,
            hint: None,
            passed: false,
        }
    }

    /// Store the latest landmarks (`None` when no hand is visible)
    pub fn observe(&mut self, landmarks: Option<Vec<f64>>) {
        self.landmarks = landmarks;
    }

    /// Evaluate the latest landmarks at `now_ms`
    pub fn tick(&mut self, now_ms: u64) -> Vec<LessonEvent> {
        if self.passed {
            return Vec::new();
        }
        let hint = self.hint_for(self.landmarks.as_deref());
        let inside = hint == FramingHint::HoldSteady;
        let full = self.meter.step(now_ms, inside);

        let mut out = Vec::new();
        let hint = if full { FramingHint::Passed } else { hint };
        if self.hint != Some(hint) {
            debug!(hint = ?hint, progress = self.meter.progress(), "framing hint");
            self.hint = Some(hint);
            out.push(LessonEvent::FramingHintChanged { hint });
        }
        if full {
            self.passed = true;
            info!(at_ms = now_ms, "framing check passed");
            out.push(LessonEvent::FramingPassed);
        }
        out
    }

    /// Directional guidance for a hand position
    pub fn hint_for(&self, landmarks: Option<&[f64]>) -> FramingHint {
        let Some(bounds) = landmarks.and_then(HandBounds::from_landmarks) else {
            return FramingHint::NoHand;
        };
        let zone = &self.config.zone;
        let tol = self.config.tolerance;
        if bounds.min_x < zone.min_x - tol {
            FramingHint::MoveRight
        } else if bounds.max_x > zone.max_x + tol {
            FramingHint::MoveLeft
        } else if bounds.min_y < zone.min_y - tol {
            FramingHint::MoveDown
        } else if bounds.max_y > zone.max_y + tol {
            FramingHint::MoveUp
        } else {
            FramingHint::HoldSteady
        }
    }

    pub fn progress(&self) -> f64 {
        if self.passed {
            1.0
        } else {
            self.meter.progress()
        }
    }

    pub fn hint(&self) -> Option<FramingHint> {
        self.hint
    }

    pub fn is_passed(&self) -> bool {
        self.passed
    }
}
