//! Repetition mastery over a rotating label set

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::core::TargetSelector;
use crate::types::{LessonEvent, MasteryConfig};

#[derive(Debug, Clone)]
pub struct MasteryTracker {
    config: MasteryConfig,
    labels: Vec<String>,
    counters: BTreeMap<String, u32>,
    selector: TargetSelector,
    current: Option<String>,
    all_mastered: bool,
}

impl MasteryTracker {
    pub fn new(labels: Vec<String>, config: MasteryConfig, seed: Option<u64>) -> Self {
        let counters = labels.iter().map(|l| (l.clone(), 0)).collect();
        Self {
            selector: TargetSelector::new(labels.clone(), config.policy, seed),
            config,
            labels,
            counters,
            current: None,
            all_mastered: false,
        }
    }

    /// Select the first target
    pub fn start(&mut self) -> Vec<LessonEvent> {
        self.reselect()
    }

    /// Observe a prediction; only `label == current && score ≥ min_score` counts
    pub fn observe(&mut self, label: &str, score: f64) -> Vec<LessonEvent> {
        if self.all_mastered {
            return Vec::new();
        }
        let Some(current) = self.current.clone() else {
            return Vec::new();
        };
        if label != current || score < self.config.min_score {
            return Vec::new();
        }

        let required = self.config.required_reps;
        let count = self.counters.entry(current.clone()).or_insert(0);
        let was_mastered = *count >= required;
        *count = (*count + 1).min(required);
        let count = *count;

        let mut out = vec![LessonEvent::RepCounted {
            label: current.clone(),
            count,
            required,
        }];
        if !was_mastered && count >= required {
            debug!(label = %current, "label mastered");
            out.push(LessonEvent::LabelMastered {
                label: current.clone(),
            });
        }

        if self.labels.iter().all(|l| self.is_mastered(l)) {
            self.all_mastered = true;
            info!(labels = self.labels.len(), "all labels mastered");
            out.push(LessonEvent::AllMastered);
            return out;
        }
        out.extend(self.reselect());
        out
    }

    fn reselect(&mut self) -> Vec<LessonEvent> {
        let eligible: Vec<String> = self
            .labels
            .iter()
            .filter(|l| !self.is_mastered(l))
            .cloned()
            .collect();
        self.current = self.selector.select(&eligible);
        match &self.current {
            Some(label) => vec![LessonEvent::TargetSelected {
                label: label.clone(),
            }],
            None => Vec::new(),
        }
    }

    pub fn count(&self, label: &str) -> u32 {
        self.counters.get(label).copied().unwrap_or(0)
    }

    pub fn is_mastered(&self, label: &str) -> bool {
        self.count(label) >= self.config.required_reps
    }

    pub fn all_mastered(&self) -> bool {
        self.all_mastered
    }

    pub fn current_target(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn counters(&self) -> &BTreeMap<String, u32> {
        &self.counters
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Fraction of required repetitions collected (0.0-1.0)
    pub fn progress(&self) -> f64 {
        let required = u64::from(self.config.required_reps) * self.labels.len() as u64;
        if required == 0 {
            return 1.0;
        }
        let collected: u64 = self.counters.values().map(|c| u64::from(*c)).sum();
        collected as f64 / required as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SelectionPolicy;

    fn words() -> Vec<String> {
        vec!["book".into(), "drink".into(), "go".into()]
    }

    fn tracker(policy: SelectionPolicy) -> MasteryTracker {
        let config = MasteryConfig {
            required_reps: 3,
            min_score: 0.55,
            policy,
        };
        MasteryTracker::new(words(), config, Some(11))
    }

    #[test]
    fn test_only_current_target_counts() {
        let mut mastery = tracker(SelectionPolicy::Sequential);
        mastery.start();
        assert_eq!(mastery.current_target(), Some("book"));
        assert!(mastery.observe("drink", 0.9).is_empty());
        assert!(mastery.observe("book", 0.5).is_empty());
        assert_eq!(mastery.count("drink"), 0);
        assert_eq!(mastery.count("book"), 0);
    }

    #[test]
    fn test_single_label_stream_never_masters_all() {
        let mut mastery = tracker(SelectionPolicy::Sequential);
        mastery.start();
        let events: Vec<LessonEvent> = (0..50).flat_map(|_| mastery.observe("book", 0.9)).collect();
        assert_eq!(mastery.count("book"), 3);
        assert_eq!(mastery.count("drink"), 0);
        assert_eq!(mastery.count("go"), 0);
        assert!(!mastery.all_mastered());
        assert!(!events.contains(&LessonEvent::AllMastered));
    }

    #[test]
    fn test_all_mastered_fires_once() {
        let mut mastery = tracker(SelectionPolicy::RandomNoRepeat);
        mastery.start();
        let mut events = Vec::new();
        for _ in 0..100 {
            let Some(target) = mastery.current_target().map(str::to_string) else {
                break;
            };
            events.extend(mastery.observe(&target, 0.9));
        }
        let fired = events.iter().filter(|e| **e == LessonEvent::AllMastered).count();
        assert_eq!(fired, 1);
        assert!(mastery.all_mastered());
        assert_eq!(mastery.progress(), 1.0);
        assert!(mastery.observe("book", 0.9).is_empty());
    }

    #[test]
    fn test_random_rotation_changes_target() {
        let mut mastery = tracker(SelectionPolicy::RandomNoRepeat);
        mastery.start();
        let first = mastery.current_target().map(str::to_string);
        let target = first.clone().unwrap_or_default();
        mastery.observe(&target, 0.9);
        assert_ne!(mastery.current_target().map(str::to_string), first);
    }
}
