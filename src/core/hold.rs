//! Hold confirmation: a correct, confident gesture must be sustained
//!
//! Accumulation and decay:
//! - matching event above threshold: accumulated += delta
//! - anything else: accumulated -= delta × decay_factor (floored at 0)
//! - delta = time since last step, clamped to ≥ min_delta
//! - no event for longer than stale_after: decays as if confidence were 0
//!
//! `Confirmed` fires once per target; the tracker stays latched until reset.

use tracing::debug;

use crate::types::{HoldConfig, ReasonCode, RecognitionEvent};

/// Accumulate/decay meter shared by hold-style checks
#[derive(Debug, Clone)]
pub struct HoldMeter {
    required_ms: u64,
    decay_factor: f64,
    min_delta_ms: u64,
    accumulated_ms: f64,
    last_step_ms: Option<u64>,
}

impl HoldMeter {
    pub fn new(required_ms: u64, decay_factor: f64, min_delta_ms: u64) -> Self {
        Self {
            required_ms,
            decay_factor,
            min_delta_ms,
            accumulated_ms: 0.0,
            last_step_ms: None,
        }
    }

    /// Advance the meter to `now_ms`; returns true once the requirement is met
    pub fn step(&mut self, now_ms: u64, matched: bool) -> bool {
        let delta = match self.last_step_ms {
            Some(last) => now_ms.saturating_sub(last).max(self.min_delta_ms),
            None => self.min_delta_ms,
        } as f64;
        self.last_step_ms = Some(now_ms.max(self.last_step_ms.unwrap_or(0)));

        if matched {
            self.accumulated_ms = (self.accumulated_ms + delta).min(self.required_ms as f64);
        } else {
            self.accumulated_ms = (self.accumulated_ms - delta * self.decay_factor).max(0.0);
        }
        matched && self.is_full()
    }

    pub fn is_full(&self) -> bool {
        self.accumulated_ms >= self.required_ms as f64
    }

    pub fn accumulated_ms(&self) -> f64 {
        self.accumulated_ms
    }

    /// Fill level (0.0-1.0)
    pub fn progress(&self) -> f64 {
        if self.required_ms == 0 {
            return if self.last_step_ms.is_some() { 1.0 } else { 0.0 };
        }
        (self.accumulated_ms / self.required_ms as f64).clamp(0.0, 1.0)
    }

    pub fn reset(&mut self) {
        self.accumulated_ms = 0.0;
        self.last_step_ms = None;
    }
}

/// Outcome of feeding one event or tick to a [`HoldTracker`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldStep {
    /// Matching signal, hold growing
    Accumulating,
    /// Wrong or weak signal, hold shrinking
    Decaying,
    /// Stream went quiet, hold shrinking
    Stale,
    /// Requirement met on this step
    Confirmed,
    /// Already confirmed, input ignored
    Latched,
}

impl HoldStep {
    pub fn reason(&self) -> ReasonCode {
        match self {
            Self::Accumulating => ReasonCode::R101_HOLD_ACCUMULATING,
            Self::Decaying => ReasonCode::R102_HOLD_DECAYING,
            Self::Stale => ReasonCode::R103_HOLD_STALE,
            Self::Confirmed | Self::Latched => ReasonCode::R104_HOLD_CONFIRMED,
        }
    }
}

/// Hold-to-confirm tracker for one target at a time
#[derive(Debug, Clone)]
pub struct HoldTracker {
    config: HoldConfig,
    target: String,
    threshold: f64,
    meter: HoldMeter,
    last_event_ms: Option<u64>,
    confirmed: bool,
}

impl HoldTracker {
    pub fn new(config: HoldConfig, target: impl Into<String>) -> Self {
        let target = target.into();
        let threshold = config.threshold_for(&target);
        let meter = HoldMeter::new(
            config.required_hold_ms,
            config.decay_factor,
            config.min_delta_ms,
        );
        Self {
            config,
            target,
            threshold,
            meter,
            last_event_ms: None,
            confirmed: false,
        }
    }

    /// Feed one recognition event
    pub fn on_event(&mut self, event: &RecognitionEvent) -> HoldStep {
        if self.confirmed {
            return HoldStep::Latched;
        }
        let now = event.timestamp_ms;

        // A quiet gap counts as lost signal before this event is credited
        if let Some(last) = self.last_event_ms {
            if now.saturating_sub(last) > self.config.stale_after_ms {
                self.meter.step(now, false);
            }
        }
        self.last_event_ms = Some(now);

        let matched = self.matches(event);
        if self.meter.step(now, matched) {
            self.confirmed = true;
            debug!(target = %self.target, at_ms = now, "hold confirmed");
            return HoldStep::Confirmed;
        }
        if matched {
            HoldStep::Accumulating
        } else {
            HoldStep::Decaying
        }
    }

    /// Periodic tick: decays the hold once the stream has gone quiet
    pub fn tick(&mut self, now_ms: u64) -> Option<HoldStep> {
        if self.confirmed {
            return None;
        }
        let last = self.last_event_ms?;
        if now_ms.saturating_sub(last) > self.config.stale_after_ms {
            self.meter.step(now_ms, false);
            return Some(HoldStep::Stale);
        }
        None
    }

    /// Does this event count towards the hold?
    pub fn matches(&self, event: &RecognitionEvent) -> bool {
        event.is_label(&self.target) && event.confidence > self.threshold
    }

    /// Switch to a new target and clear all progress
    pub fn reset(&mut self, target: impl Into<String>) {
        self.target = target.into();
        self.threshold = self.config.threshold_for(&self.target);
        self.meter.reset();
        self.last_event_ms = None;
        self.confirmed = false;
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn accumulated_ms(&self) -> f64 {
        self.meter.accumulated_ms()
    }

    /// Hold progress (0.0-1.0)
    pub fn progress(&self) -> f64 {
        if self.confirmed {
            1.0
        } else {
            self.meter.progress()
        }
    }

    pub fn is_confirmed(&self) -> bool {
        self.confirmed
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker(hold_ms: u64) -> HoldTracker {
        HoldTracker::new(HoldConfig::default().with_hold_ms(hold_ms), "T")
    }

    fn ev(label: &str, confidence: f64, t: u64) -> RecognitionEvent {
        RecognitionEvent::new(label, confidence, t)
    }

    #[test]
    fn test_first_event_credits_min_delta() {
        let mut hold = tracker(150);
        assert_eq!(hold.on_event(&ev("T", 0.9, 1000)), HoldStep::Accumulating);
        assert_eq!(hold.accumulated_ms(), 16.0);
    }

    #[test]
    fn test_confirms_once_hold_reached() {
        let mut hold = tracker(150);
        let steps: Vec<HoldStep> = (0..6).map(|i| hold.on_event(&ev("T", 0.9, i * 50))).collect();
        // 16 + 50 + 50 + 50 = 166 at t=150
        assert_eq!(steps[3], HoldStep::Confirmed);
        assert_eq!(steps[4], HoldStep::Latched);
        assert_eq!(steps[5], HoldStep::Latched);
        assert!(hold.is_confirmed());
        assert_eq!(hold.progress(), 1.0);
    }

    #[test]
    fn test_accumulation_capped_at_required() {
        let mut meter = HoldMeter::new(100, 2.0, 16);
        meter.step(0, true);
        meter.step(500, true);
        assert_eq!(meter.accumulated_ms(), 100.0);
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let mut hold = tracker(150);
        assert_eq!(hold.on_event(&ev("T", 0.75, 0)), HoldStep::Decaying);
        assert_eq!(hold.accumulated_ms(), 0.0);
    }

    #[test]
    fn test_wrong_label_decays_faster() {
        let mut hold = tracker(1000);
        hold.on_event(&ev("T", 0.9, 0));
        hold.on_event(&ev("T", 0.9, 100));
        hold.on_event(&ev("T", 0.9, 200)); // 216
        hold.on_event(&ev("A", 0.9, 250)); // 216 - 100
        assert_eq!(hold.accumulated_ms(), 116.0);
        hold.on_event(&ev("A", 0.9, 350)); // floored
        assert_eq!(hold.accumulated_ms(), 0.0);
    }

    #[test]
    fn test_stale_tick_decays() {
        let mut hold = HoldTracker::new(
            HoldConfig::default().with_hold_ms(1000).with_stale_after(300),
            "T",
        );
        hold.on_event(&ev("T", 0.9, 0));
        hold.on_event(&ev("T", 0.9, 200)); // 216
        assert_eq!(hold.tick(400), None);
        assert_eq!(hold.tick(600), Some(HoldStep::Stale));
        assert_eq!(hold.accumulated_ms(), 0.0);
    }

    #[test]
    fn test_event_after_quiet_gap_starts_over() {
        let mut hold = tracker(150);
        hold.on_event(&ev("T", 0.9, 0));
        hold.on_event(&ev("T", 0.9, 100)); // 116
        // 5 s without events, no ticks in between
        assert_eq!(hold.on_event(&ev("T", 0.9, 5100)), HoldStep::Accumulating);
        assert_eq!(hold.accumulated_ms(), 16.0);
    }

    #[test]
    fn test_label_threshold_override() {
        let config = HoldConfig::default().with_label_threshold("O", 0.3);
        let mut hold = HoldTracker::new(config, "O");
        assert_eq!(hold.threshold(), 0.3);
        assert_eq!(hold.on_event(&ev("O", 0.35, 0)), HoldStep::Accumulating);
    }

    #[test]
    fn test_reset_clears_latch() {
        let mut hold = tracker(0);
        assert_eq!(hold.on_event(&ev("T", 0.9, 0)), HoldStep::Confirmed);
        hold.reset("E");
        assert!(!hold.is_confirmed());
        assert_eq!(hold.target(), "E");
        assert_eq!(hold.on_event(&ev("T", 0.9, 10)), HoldStep::Decaying);
    }
}
