//! Mistake detection: a confident wrong letter held long enough counts once
//!
//! Observational only. Progress is never blocked by a mistake.

use tracing::debug;

use crate::types::{MistakeConfig, RecognitionEvent};

#[derive(Debug, Clone)]
pub struct MistakeDetector {
    config: MistakeConfig,
    /// Label being tracked and when it started
    mismatch: Option<(String, u64)>,
    last_mistake_ms: Option<u64>,
    count: u32,
}

impl MistakeDetector {
    pub fn new(config: MistakeConfig) -> Self {
        Self {
            config,
            mismatch: None,
            last_mistake_ms: None,
            count: 0,
        }
    }

    /// Observe an event against `target`; returns the new total when a mistake is counted
    pub fn observe(&mut self, event: &RecognitionEvent, target: &str) -> Option<u32> {
        let now = event.timestamp_ms;
        if event.is_label(target) || event.confidence <= self.config.confidence_threshold {
            self.mismatch = None;
            return None;
        }

        let since = match &self.mismatch {
            Some((label, since)) if *label == event.label => *since,
            _ => {
                self.mismatch = Some((event.label.clone(), now));
                return None;
            }
        };

        let sustained = now.saturating_sub(since) >= self.config.sustain_ms;
        let spaced = self
            .last_mistake_ms
            .map_or(true, |last| now.saturating_sub(last) >= self.config.rate_limit_ms);
        if sustained && spaced {
            self.count += 1;
            self.last_mistake_ms = Some(now);
            self.mismatch = Some((event.label.clone(), now));
            debug!(target, detected = %event.label, total = self.count, "mistake counted");
            return Some(self.count);
        }
        None
    }

    /// Forget the tracked mismatch (new target); the tally survives
    pub fn reset(&mut self) {
        self.mismatch = None;
    }

    /// Forget everything, including the tally
    pub fn clear(&mut self) {
        self.mismatch = None;
        self.last_mistake_ms = None;
        self.count = 0;
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Label currently being timed as a possible mistake
    pub fn tracking(&self) -> Option<&str> {
        self.mismatch.as_ref().map(|(label, _)| label.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> MistakeDetector {
        MistakeDetector::new(MistakeConfig::default())
    }

    #[test]
    fn test_sustained_wrong_label_counts_once() {
        let mut det = detector();
        let counted: Vec<u32> = (0..24)
            .filter_map(|i| det.observe(&RecognitionEvent::new("A", 0.95, i * 50), "T"))
            .collect();
        // 0..1150ms: counted at 1000, timer restarted, 150ms short of another
        assert_eq!(counted, vec![1]);
        assert_eq!(det.count(), 1);
    }

    #[test]
    fn test_below_threshold_never_counts() {
        let mut det = detector();
        for i in 0..60 {
            assert_eq!(det.observe(&RecognitionEvent::new("A", 0.85, i * 50), "T"), None);
        }
        assert_eq!(det.tracking(), None);
    }

    #[test]
    fn test_label_change_restarts_timer() {
        let mut det = detector();
        det.observe(&RecognitionEvent::new("A", 0.95, 0), "T");
        det.observe(&RecognitionEvent::new("A", 0.95, 900), "T");
        det.observe(&RecognitionEvent::new("B", 0.95, 950), "T");
        assert_eq!(det.observe(&RecognitionEvent::new("B", 0.95, 1100), "T"), None);
        assert_eq!(det.tracking(), Some("B"));
        assert_eq!(det.observe(&RecognitionEvent::new("B", 0.95, 1950), "T"), Some(1));
    }

    #[test]
    fn test_match_resets_timer() {
        let mut det = detector();
        det.observe(&RecognitionEvent::new("A", 0.95, 0), "T");
        det.observe(&RecognitionEvent::new("T", 0.9, 500), "T");
        assert_eq!(det.observe(&RecognitionEvent::new("A", 0.95, 1000), "T"), None);
    }

    #[test]
    fn test_rate_limit_spaces_mistakes() {
        let config = MistakeConfig {
            sustain_ms: 200,
            rate_limit_ms: 1000,
            ..MistakeConfig::default()
        };
        let mut det = MistakeDetector::new(config);
        let counted: Vec<u64> = (0..40)
            .filter(|i| {
                det.observe(&RecognitionEvent::new("A", 0.95, i * 50), "T")
                    .is_some()
            })
            .map(|i| i * 50)
            .collect();
        assert_eq!(counted, vec![200, 1200]);
    }

    #[test]
    fn test_reset_keeps_tally() {
        let mut det = detector();
        for i in 0..=20 {
            det.observe(&RecognitionEvent::new("A", 0.95, i * 50), "T");
        }
        det.reset();
        assert_eq!(det.count(), 1);
        assert_eq!(det.tracking(), None);
        det.clear();
        assert_eq!(det.count(), 0);
    }
}
