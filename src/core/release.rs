//! Release gate for repeated letters
//!
//! When two consecutive targets are identical ("LL"), the learner must relax
//! (low confidence or a different label) before the second one can count.

use crate::types::RecognitionEvent;

#[derive(Debug, Clone)]
pub struct ReleaseGate {
    neutral_confidence: f64,
    require_neutral: bool,
}

impl ReleaseGate {
    pub fn new(neutral_confidence: f64) -> Self {
        Self {
            neutral_confidence,
            require_neutral: false,
        }
    }

    /// Arm the gate when `next` repeats `previous`; returns whether it armed
    pub fn arm(&mut self, previous: Option<&str>, next: &str) -> bool {
        self.require_neutral = previous == Some(next);
        self.require_neutral
    }

    /// Observe an event; returns true when this event released the gate
    pub fn observe(&mut self, event: &RecognitionEvent, target: &str) -> bool {
        if !self.require_neutral {
            return false;
        }
        if event.confidence < self.neutral_confidence || !event.is_label(target) {
            self.require_neutral = false;
            return true;
        }
        false
    }

    pub fn is_blocking(&self) -> bool {
        self.require_neutral
    }

    pub fn clear(&mut self) {
        self.require_neutral = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_arms_on_repeat() {
        let mut gate = ReleaseGate::new(0.4);
        assert!(!gate.arm(Some("E"), "L"));
        assert!(!gate.arm(None, "L"));
        assert!(gate.arm(Some("L"), "L"));
        assert!(gate.is_blocking());
    }

    #[test]
    fn test_sustained_same_label_keeps_blocking() {
        let mut gate = ReleaseGate::new(0.4);
        gate.arm(Some("L"), "L");
        for t in 0..10 {
            assert!(!gate.observe(&RecognitionEvent::new("L", 0.9, t * 50), "L"));
        }
        assert!(gate.is_blocking());
    }

    #[test]
    fn test_low_confidence_releases() {
        let mut gate = ReleaseGate::new(0.4);
        gate.arm(Some("L"), "L");
        assert!(gate.observe(&RecognitionEvent::new("L", 0.2, 0), "L"));
        assert!(!gate.is_blocking());
    }

    #[test]
    fn test_other_label_releases() {
        let mut gate = ReleaseGate::new(0.4);
        gate.arm(Some("L"), "L");
        assert!(gate.observe(&RecognitionEvent::new("B", 0.9, 0), "L"));
    }
}
