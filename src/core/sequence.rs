//! Sequence controller: drives a learner through an ordered list of targets
//!
//! State transitions:
//! - IDLE → ACTIVE(0): start
//! - ACTIVE(i) → BLOCKED(i+1): hold confirmed, cooldown running
//! - BLOCKED(i+1) → ACTIVE(i+1): cooldown elapsed (next event or tick)
//! - ACTIVE(last) → COMPLETED: last target resolved
//! - any → CANCELLED: exit
//!
//! Completion is reported once per run.

use tracing::{debug, info};

use crate::core::{HoldStep, HoldTracker, MistakeDetector, ReleaseGate};
use crate::types::{
    AttemptResult, LessonEvent, LessonResult, RecognitionEvent, SequenceConfig, SequencePhase,
};

#[derive(Debug, Clone)]
pub struct SequenceController {
    config: SequenceConfig,
    targets: Vec<String>,
    phase: SequencePhase,
    hold: HoldTracker,
    gate: ReleaseGate,
    mistakes: MistakeDetector,
    started_ms: u64,
    target_started_ms: u64,
    last_correct_ms: u64,
    hint_sent: bool,
    completion_reported: bool,
    results: LessonResult,
    /// Identity of the current target attempt; bumps on every (re-)entry
    attempt_serial: u64,
}

impl SequenceController {
    pub fn new(targets: Vec<String>, config: SequenceConfig) -> Self {
        let first = targets.first().cloned().unwrap_or_default();
        Self {
            hold: HoldTracker::new(config.hold.clone(), first),
            gate: ReleaseGate::new(config.neutral_confidence),
            mistakes: MistakeDetector::new(config.mistake.clone()),
            config,
            targets,
            phase: SequencePhase::Idle,
            started_ms: 0,
            target_started_ms: 0,
            last_correct_ms: 0,
            hint_sent: false,
            completion_reported: false,
            results: LessonResult::new(),
            attempt_serial: 0,
        }
    }

    /// Letters of a word as targets (`"TEN"` → `T`, `E`, `N`)
    pub fn for_word(word: &str, config: SequenceConfig) -> Self {
        let targets = word
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| c.to_ascii_uppercase().to_string())
            .collect();
        Self::new(targets, config)
    }

    /// Begin the run at the first target
    pub fn start(&mut self, now_ms: u64) -> Vec<LessonEvent> {
        self.results = LessonResult::new();
        self.mistakes.clear();
        self.completion_reported = false;
        self.started_ms = now_ms;
        if self.targets.is_empty() {
            return self.complete(now_ms);
        }
        self.enter_target(0, now_ms)
    }

    /// Feed one recognition event
    pub fn on_event(&mut self, event: &RecognitionEvent) -> Vec<LessonEvent> {
        let now = event.timestamp_ms;
        let mut out = Vec::new();

        let index = match self.phase {
            SequencePhase::Active { index } => index,
            SequencePhase::Blocked { next, until_ms } if now >= until_ms => {
                out.extend(self.enter_target(next, now));
                next
            }
            _ => return out,
        };
        let target = self.targets[index].clone();

        if let Some(total) = self.mistakes.observe(event, &target) {
            out.push(LessonEvent::MistakeCounted {
                target: target.clone(),
                detected: event.label.clone(),
                total,
                at_ms: now,
            });
        }

        if self.gate.is_blocking() {
            if !self.gate.observe(event, &target) {
                return out;
            }
            debug!(target = %target, at_ms = now, "release gate cleared");
            out.push(LessonEvent::ReleaseCleared {
                target: target.clone(),
            });
        }

        if self.hold.matches(event) {
            self.last_correct_ms = now;
        } else {
            out.extend(self.check_hint(now));
        }

        if self.hold.on_event(event) == HoldStep::Confirmed {
            out.extend(self.confirm(index, now));
        }
        out
    }

    /// Periodic tick: cooldown expiry, stale decay and hints
    pub fn tick(&mut self, now_ms: u64) -> Vec<LessonEvent> {
        match self.phase {
            SequencePhase::Blocked { next, until_ms } if now_ms >= until_ms => {
                self.enter_target(next, now_ms)
            }
            SequencePhase::Active { .. } => {
                if let Some(step) = self.hold.tick(now_ms) {
                    debug!(target = %self.hold.target(), reason = %step.reason(), "hold tick");
                }
                self.check_hint(now_ms)
            }
            _ => Vec::new(),
        }
    }

    /// Abort the run; optionally start over from the first target
    pub fn exit(&mut self, now_ms: u64, restart: bool) -> Vec<LessonEvent> {
        if restart {
            return self.restart(now_ms);
        }
        if self.phase.is_terminal() {
            return Vec::new();
        }
        debug!(phase = %self.phase, "sequence exited");
        self.phase = SequencePhase::Cancelled;
        vec![LessonEvent::Exited]
    }

    /// Start a fresh run from the first target
    pub fn restart(&mut self, now_ms: u64) -> Vec<LessonEvent> {
        let mut out = vec![LessonEvent::SequenceRestarted { at_ms: now_ms }];
        out.extend(self.start(now_ms));
        out
    }

    /// Record the current target as failed and move on
    pub fn skip_current(&mut self, now_ms: u64) -> Vec<LessonEvent> {
        let index = match self.phase {
            SequencePhase::Active { index } => index,
            SequencePhase::Blocked { next, .. } => next,
            _ => return Vec::new(),
        };
        self.results.record(AttemptResult::fail(
            self.targets[index].clone(),
            now_ms.saturating_sub(self.target_started_ms),
        ));
        self.advance_from(index, now_ms, false)
    }

    /// Try the current target again from scratch
    pub fn retry_current(&mut self, now_ms: u64) -> Vec<LessonEvent> {
        match self.phase {
            SequencePhase::Active { index } | SequencePhase::Blocked { next: index, .. } => {
                self.enter_target(index, now_ms)
            }
            _ => Vec::new(),
        }
    }

    /// Jump to an arbitrary target (learner navigation)
    pub fn jump_to(&mut self, index: usize, now_ms: u64) -> Vec<LessonEvent> {
        if index >= self.targets.len() || self.phase.is_terminal() {
            return Vec::new();
        }
        self.enter_target(index, now_ms)
    }

    /// Stop evaluating without reporting anything
    pub fn cancel(&mut self) {
        self.phase = SequencePhase::Cancelled;
    }

    fn confirm(&mut self, index: usize, now: u64) -> Vec<LessonEvent> {
        let target = self.targets[index].clone();
        self.results.record(AttemptResult::pass(
            target.clone(),
            now.saturating_sub(self.target_started_ms),
        ));
        let mut out = vec![LessonEvent::HoldConfirmed {
            index,
            target,
            at_ms: now,
        }];
        out.extend(self.advance_from(index, now, true));
        out
    }

    fn advance_from(&mut self, index: usize, now: u64, cooldown: bool) -> Vec<LessonEvent> {
        let next = index + 1;
        if next >= self.targets.len() {
            return self.complete(now);
        }
        if cooldown && self.config.cooldown_ms > 0 {
            self.phase = SequencePhase::Blocked {
                next,
                until_ms: now.saturating_add(self.config.cooldown_ms),
            };
            return Vec::new();
        }
        self.enter_target(next, now)
    }

    fn enter_target(&mut self, index: usize, now: u64) -> Vec<LessonEvent> {
        let target = self.targets[index].clone();
        let previous = index.checked_sub(1).map(|p| self.targets[p].as_str());
        let gated = self.gate.arm(previous, &target);

        self.hold.reset(target.clone());
        self.mistakes.reset();
        self.target_started_ms = now;
        self.last_correct_ms = now;
        self.hint_sent = false;
        self.attempt_serial += 1;
        self.phase = SequencePhase::Active { index };
        debug!(index, target = %target, serial = self.attempt_serial, "target started");

        let mut out = vec![LessonEvent::TargetStarted {
            index,
            target: target.clone(),
            at_ms: now,
        }];
        if gated {
            out.push(LessonEvent::ReleaseRequired { target });
        }
        out
    }

    fn complete(&mut self, now: u64) -> Vec<LessonEvent> {
        self.phase = SequencePhase::Completed;
        if self.completion_reported {
            return Vec::new();
        }
        self.completion_reported = true;
        let elapsed_ms = now.saturating_sub(self.started_ms);
        let mistake_count = self.mistakes.count();
        self.results.mistake_count = mistake_count;
        info!(elapsed_ms, mistake_count, "sequence completed");
        vec![LessonEvent::SequenceCompleted {
            elapsed_ms,
            mistake_count,
        }]
    }

    fn check_hint(&mut self, now: u64) -> Vec<LessonEvent> {
        let Some(after) = self.config.hint_after_ms else {
            return Vec::new();
        };
        if self.hint_sent || now.saturating_sub(self.last_correct_ms) < after {
            return Vec::new();
        }
        let SequencePhase::Active { index } = self.phase else {
            return Vec::new();
        };
        self.hint_sent = true;
        vec![LessonEvent::HintSuggested {
            target: self.targets[index].clone(),
        }]
    }

    pub fn phase(&self) -> SequencePhase {
        self.phase
    }

    pub fn targets(&self) -> &[String] {
        &self.targets
    }

    /// Index of the target being evaluated (or about to be, while blocked)
    pub fn current_index(&self) -> Option<usize> {
        match self.phase {
            SequencePhase::Active { index } => Some(index),
            SequencePhase::Blocked { next, .. } => Some(next),
            _ => None,
        }
    }

    pub fn current_target(&self) -> Option<&str> {
        self.current_index().map(|i| self.targets[i].as_str())
    }

    /// Hold progress on the current target (0.0-1.0)
    pub fn progress(&self) -> f64 {
        match self.phase {
            SequencePhase::Active { .. } => self.hold.progress(),
            SequencePhase::Blocked { .. } | SequencePhase::Completed => 1.0,
            _ => 0.0,
        }
    }

    pub fn mistake_count(&self) -> u32 {
        self.mistakes.count()
    }

    pub fn results(&self) -> &LessonResult {
        &self.results
    }

    pub fn attempt_serial(&self) -> u64 {
        self.attempt_serial
    }

    pub fn is_completed(&self) -> bool {
        self.phase == SequencePhase::Completed
    }

    pub fn config(&self) -> &SequenceConfig {
        &self.config
    }
}

// =============================================================================
// TESTS
// =============================================================================
