//! Timed attempts: a deadline wrapped around target evaluation
//!
//! State transitions:
//! - IDLE → RUNNING(deadline): arm
//! - RUNNING → SUCCESS: confirmed before the deadline
//! - RUNNING → TIMED_OUT: deadline reached first (fires once per arm)
//! - TIMED_OUT → PENALTY(until) → RUNNING: retry/restart policies
//!
//! Deadlines are checked before each input is processed, so an event at or
//! after the deadline never counts towards the timed-out target.

use tracing::{debug, info, warn};

use crate::core::SequenceController;
use crate::TIMER_CATCH_UP_LIMIT;
use crate::types::{
    LessonEvent, RecognitionEvent, SequenceConfig, TimeoutPolicy, TimerConfig, TimerScope,
    TimerState,
};

/// Deadline primitive; re-arming replaces any earlier deadline
#[derive(Debug, Clone)]
pub struct TimedAttempt {
    duration_ms: u64,
    state: TimerState,
}

impl TimedAttempt {
    pub fn new(duration_ms: u64) -> Self {
        Self {
            duration_ms,
            state: TimerState::Idle,
        }
    }

    /// Start a fresh countdown from `now_ms`
    pub fn arm(&mut self, now_ms: u64) {
        self.state = TimerState::Running {
            deadline_ms: now_ms.saturating_add(self.duration_ms),
        };
    }

    /// Confirmed in time; returns false if the timer was not running
    pub fn succeed(&mut self) -> bool {
        if matches!(self.state, TimerState::Running { .. }) {
            self.state = TimerState::Success;
            return true;
        }
        false
    }

    /// Returns the deadline the first time it is found to have passed
    pub fn check(&mut self, now_ms: u64) -> Option<u64> {
        match self.state {
            TimerState::Running { deadline_ms } if now_ms >= deadline_ms => {
                self.state = TimerState::TimedOut;
                Some(deadline_ms)
            }
            _ => None,
        }
    }

    pub fn start_penalty(&mut self, until_ms: u64) {
        self.state = TimerState::Penalty { until_ms };
    }

    pub fn cancel(&mut self) {
        self.state = TimerState::Idle;
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    /// Time left before the deadline
    pub fn remaining_ms(&self, now_ms: u64) -> Option<u64> {
        match self.state {
            TimerState::Running { deadline_ms } => Some(deadline_ms.saturating_sub(now_ms)),
            _ => None,
        }
    }
}

/// Sequence controller under a deadline policy
#[derive(Debug, Clone)]
pub struct TimedSequence {
    sequence: SequenceController,
    timer: TimedAttempt,
    config: TimerConfig,
    timeouts: u32,
}

impl TimedSequence {
    pub fn new(targets: Vec<String>, sequence: SequenceConfig, config: TimerConfig) -> Self {
        Self {
            sequence: SequenceController::new(targets, sequence),
            timer: TimedAttempt::new(config.duration_ms),
            config,
            timeouts: 0,
        }
    }

    pub fn for_word(word: &str, sequence: SequenceConfig, config: TimerConfig) -> Self {
        Self {
            sequence: SequenceController::for_word(word, sequence),
            timer: TimedAttempt::new(config.duration_ms),
            config,
            timeouts: 0,
        }
    }

    pub fn start(&mut self, now_ms: u64) -> Vec<LessonEvent> {
        let events = self.sequence.start(now_ms);
        self.track(&events);
        if self.config.scope == TimerScope::WholeSequence && !self.sequence.is_completed() {
            self.timer.arm(now_ms);
        }
        events
    }

    pub fn on_event(&mut self, event: &RecognitionEvent) -> Vec<LessonEvent> {
        let now = event.timestamp_ms;
        let mut out = self.poll(now);
        if self.is_paused(now) {
            return out;
        }
        let events = self.sequence.on_event(event);
        self.track(&events);
        let mistake = events
            .iter()
            .any(|e| matches!(e, LessonEvent::MistakeCounted { .. }));
        out.extend(events);
        if mistake && self.config.restart_on_mistake && !self.sequence.phase().is_terminal() {
            debug!(at_ms = now, "mistake ends the attempt");
            self.timer.cancel();
            out.extend(self.apply_policy(now));
        }
        out
    }

    pub fn tick(&mut self, now_ms: u64) -> Vec<LessonEvent> {
        let mut out = self.poll(now_ms);
        if self.is_paused(now_ms) {
            return out;
        }
        let events = self.sequence.tick(now_ms);
        self.track(&events);
        out.extend(events);
        out
    }

    pub fn exit(&mut self, now_ms: u64, restart: bool) -> Vec<LessonEvent> {
        self.timer.cancel();
        let events = self.sequence.exit(now_ms, restart);
        if restart {
            self.track(&events);
            if self.config.scope == TimerScope::WholeSequence {
                self.timer.arm(now_ms);
            }
        }
        events
    }

    /// Resolve every penalty and deadline that falls at or before `now`
    ///
    /// Each expiry is handled at its own time, so a late input skips past
    /// all the targets whose deadlines it has outlived.
    fn poll(&mut self, now: u64) -> Vec<LessonEvent> {
        let mut out = Vec::new();
        for _ in 0..TIMER_CATCH_UP_LIMIT {
            if let TimerState::Penalty { until_ms } = self.timer.state() {
                if now >= until_ms {
                    out.extend(self.resume(until_ms));
                    continue;
                }
            }
            match self.timer.check(now) {
                Some(deadline_ms) => out.extend(self.time_out(deadline_ms)),
                None => return out,
            }
        }
        warn!(now_ms = now, "timer catch-up limit reached");
        out
    }

    fn time_out(&mut self, deadline_ms: u64) -> Vec<LessonEvent> {
        let index = self.sequence.current_index().unwrap_or(0);
        let target = self.sequence.current_target().unwrap_or_default().to_string();
        self.timeouts += 1;
        info!(index, target = %target, deadline_ms, "attempt timed out");

        let mut out = vec![LessonEvent::AttemptTimedOut {
            index,
            target,
            deadline_ms,
        }];
        out.extend(self.apply_policy(deadline_ms));
        out
    }

    fn apply_policy(&mut self, at_ms: u64) -> Vec<LessonEvent> {
        match (self.config.on_timeout, self.config.scope) {
            (TimeoutPolicy::Advance, TimerScope::PerTarget) => {
                let events = self.sequence.skip_current(at_ms);
                self.track(&events);
                events
            }
            (TimeoutPolicy::Advance, TimerScope::WholeSequence) => {
                self.sequence.cancel();
                Vec::new()
            }
            (TimeoutPolicy::Retry { penalty_ms }, _) | (TimeoutPolicy::Restart { penalty_ms }, _) => {
                let until_ms = at_ms.saturating_add(penalty_ms);
                self.timer.start_penalty(until_ms);
                vec![LessonEvent::PenaltyStarted { until_ms }]
            }
        }
    }

    fn resume(&mut self, at_ms: u64) -> Vec<LessonEvent> {
        let events = match self.config.on_timeout {
            TimeoutPolicy::Retry { .. } if self.config.scope == TimerScope::PerTarget => {
                self.sequence.retry_current(at_ms)
            }
            _ => self.sequence.restart(at_ms),
        };
        self.timer.cancel();
        self.track(&events);
        if self.config.scope == TimerScope::WholeSequence {
            self.timer.arm(at_ms);
        }
        events
    }

    /// Keep the deadline in step with what the sequence reported
    fn track(&mut self, events: &[LessonEvent]) {
        for event in events {
            match event {
                LessonEvent::TargetStarted { at_ms, .. }
                    if self.config.scope == TimerScope::PerTarget =>
                {
                    self.timer.arm(*at_ms);
                }
                LessonEvent::HoldConfirmed { .. } if self.config.scope == TimerScope::PerTarget => {
                    self.timer.succeed();
                }
                LessonEvent::SequenceCompleted { .. } => {
                    self.timer.succeed();
                }
                _ => {}
            }
        }
    }

    fn is_paused(&self, now: u64) -> bool {
        matches!(self.timer.state(), TimerState::Penalty { until_ms } if now < until_ms)
    }

    /// Deadline passed and the run was dropped (whole-sequence advance)
    pub fn is_failed(&self) -> bool {
        self.timer.state() == TimerState::TimedOut && self.sequence.phase().is_terminal()
            && !self.sequence.is_completed()
    }

    pub fn sequence(&self) -> &SequenceController {
        &self.sequence
    }

    pub fn timer_state(&self) -> TimerState {
        self.timer.state()
    }

    pub fn remaining_ms(&self, now_ms: u64) -> Option<u64> {
        self.timer.remaining_ms(now_ms)
    }

    pub fn timeouts(&self) -> u32 {
        self.timeouts
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::HoldConfig;

    fn stream(timed: &mut TimedSequence, label: &str, from: u64, to: u64) -> Vec<LessonEvent> {
        (from..to)
            .step_by(50)
            .flat_map(|t| timed.on_event(&RecognitionEvent::new(label, 0.9, t)))
            .collect()
    }

    fn seq_config(hold_ms: u64) -> SequenceConfig {
        SequenceConfig {
            hold: HoldConfig::default().with_hold_ms(hold_ms),
            hint_after_ms: None,
            ..SequenceConfig::default()
        }
    }

    #[test]
    fn test_attempt_lifecycle() {
        let mut timer = TimedAttempt::new(1000);
        timer.arm(0);
        assert_eq!(timer.check(999), None);
        assert_eq!(timer.check(1000), Some(1000));
        assert_eq!(timer.check(1100), None);
        assert_eq!(timer.state(), TimerState::TimedOut);
    }

    #[test]
    fn test_rearm_replaces_old_deadline() {
        let mut timer = TimedAttempt::new(1000);
        timer.arm(0);
        timer.arm(500);
        assert_eq!(timer.check(1200), None);
        assert_eq!(timer.state(), TimerState::Running { deadline_ms: 1500 });
    }

    #[test]
    fn test_huge_deadline_saturates() {
        let mut timer = TimedAttempt::new(u64::MAX);
        timer.arm(10);
        assert_eq!(timer.state(), TimerState::Running { deadline_ms: u64::MAX });
        assert_eq!(timer.remaining_ms(u64::MAX), Some(0));
    }

    #[test]
    fn test_success_stops_countdown() {
        let mut timer = TimedAttempt::new(1000);
        timer.arm(0);
        assert!(timer.succeed());
        assert_eq!(timer.check(5000), None);
        assert!(!timer.succeed());
    }

    #[test]
    fn test_deadline_beats_late_hold() {
        let config = TimerConfig {
            duration_ms: 10_000,
            ..TimerConfig::default()
        };
        let mut timed = TimedSequence::new(vec!["A".into(), "B".into()], seq_config(750), config);
        timed.start(0);
        let events = stream(&mut timed, "A", 9900, 10_700);
        assert!(matches!(
            events[0],
            LessonEvent::AttemptTimedOut {
                index: 0,
                deadline_ms: 10_000,
                ..
            }
        ));
        assert!(!events
            .iter()
            .any(|e| matches!(e, LessonEvent::HoldConfirmed { index: 0, .. })));
        assert_eq!(timed.sequence().results().failed_targets(), vec!["A"]);
        assert_eq!(timed.sequence().current_target(), Some("B"));
    }

    #[test]
    fn test_retry_policy_repeats_target_after_penalty() {
        let config = TimerConfig {
            duration_ms: 2000,
            on_timeout: TimeoutPolicy::Retry { penalty_ms: 300 },
            ..TimerConfig::default()
        };
        let mut timed = TimedSequence::new(vec!["A".into()], seq_config(0), config);
        timed.start(0);
        let events = timed.tick(2000);
        assert_eq!(events[1], LessonEvent::PenaltyStarted { until_ms: 2300 });
        // Ignored during the penalty
        assert!(timed.on_event(&RecognitionEvent::new("A", 0.9, 2100)).is_empty());
        let resumed = timed.tick(2300);
        assert!(matches!(resumed[0], LessonEvent::TargetStarted { index: 0, at_ms: 2300, .. }));
        assert_eq!(timed.timer_state(), TimerState::Running { deadline_ms: 4300 });
        let done = timed.on_event(&RecognitionEvent::new("A", 0.9, 2400));
        assert!(done
            .iter()
            .any(|e| matches!(e, LessonEvent::SequenceCompleted { .. })));
        assert_eq!(timed.timer_state(), TimerState::Success);
    }

    #[test]
    fn test_whole_sequence_deadline_fails_run() {
        let config = TimerConfig {
            duration_ms: 20_000,
            scope: TimerScope::WholeSequence,
            ..TimerConfig::default()
        };
        let mut timed = TimedSequence::for_word("AB", seq_config(150), config);
        timed.start(0);
        let events = timed.tick(20_000);
        assert!(matches!(events[0], LessonEvent::AttemptTimedOut { deadline_ms: 20_000, .. }));
        assert!(timed.is_failed());
        assert!(stream(&mut timed, "A", 20_000, 21_000).is_empty());
    }

    #[test]
    fn test_mistake_restarts_word() {
        let config = TimerConfig {
            duration_ms: 2000,
            on_timeout: TimeoutPolicy::Restart { penalty_ms: 400 },
            restart_on_mistake: true,
            ..TimerConfig::default()
        };
        let mut seq = seq_config(200);
        seq.mistake.sustain_ms = 800;
        seq.mistake.rate_limit_ms = 800;
        let mut timed = TimedSequence::for_word("AB", seq, config);
        timed.start(0);
        let events: Vec<LessonEvent> = (0..20)
            .flat_map(|i| timed.on_event(&RecognitionEvent::new("Z", 0.95, i * 50)))
            .collect();
        let penalty = events
            .iter()
            .position(|e| matches!(e, LessonEvent::PenaltyStarted { until_ms: 1200 }));
        assert!(penalty.is_some());
        let resumed = timed.tick(1200);
        assert!(matches!(resumed[0], LessonEvent::SequenceRestarted { at_ms: 1200 }));
        assert_eq!(timed.sequence().current_index(), Some(0));
    }

    #[test]
    fn test_per_target_timer_rearms_after_cooldown() {
        let config = TimerConfig {
            duration_ms: 1000,
            ..TimerConfig::default()
        };
        let mut timed = TimedSequence::for_word("AB", seq_config(150), config);
        timed.start(0);
        stream(&mut timed, "A", 0, 200);
        assert_eq!(timed.timer_state(), TimerState::Success);
        timed.tick(650);
        assert_eq!(timed.timer_state(), TimerState::Running { deadline_ms: 1650 });
        assert_eq!(timed.remaining_ms(1150), Some(500));
    }
}
