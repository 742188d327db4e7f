//! Lesson drills: one runner per lesson format
//!
//! Each drill consumes [`LessonInput`]s, emits [`LessonEvent`]s and reports
//! when it has finished. Pass/fail and progress reporting belong to the
//! orchestrator.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info};

use crate::core::selection::{draw, rng_from_seed, shuffled};
use crate::core::{
    ClipController, ClipVerdict, FramingCheck, HoldStep, HoldTracker, MasteryTracker,
    MistakeDetector, ReleaseGate, SequenceController, TargetSelector, TimedSequence,
};
use crate::types::{
    AttemptResult, AttemptStatus, ClassifierError, ClipError, ClipPrediction, ClipRequest,
    LessonConfig, LessonError, LessonEvent, LessonInput, LessonKind, LessonPlan, LessonResult,
    RecognitionEvent, SequenceConfig, SequencePhase, TimerConfig,
};

/// Runner for one lesson
#[derive(Debug, Clone)]
pub enum Drill {
    /// Completes on acknowledge
    Reading { acknowledged: bool },
    Framing(FramingCheck),
    Interactive(InteractiveDrill),
    Gym(GymDrill),
    Timed(TimedDrill),
    Spelling(SpellingDrill),
    Clip(ClipDrill),
}

impl Drill {
    /// Build the runner for a plan (shuffles and draws use the plan seed)
    pub fn from_plan(plan: &LessonPlan) -> Self {
        let config = &plan.config;
        let mut rng = rng_from_seed(config.seed);
        let targets = if config.shuffle {
            shuffled(&plan.targets, &mut rng)
        } else {
            plan.targets.clone()
        };
        let timer = config.timer.clone().unwrap_or_default();

        match plan.kind {
            LessonKind::Intro => Self::Reading {
                acknowledged: false,
            },
            LessonKind::Calibration => Self::Framing(FramingCheck::new(config.framing.clone())),
            LessonKind::Interactive => {
                Self::Interactive(InteractiveDrill::new(targets, config.sequence.clone()))
            }
            LessonKind::Gym => Self::Gym(GymDrill::new(targets, config)),
            LessonKind::FinalTest | LessonKind::InstantExam => Self::Timed(TimedDrill::new(
                TimedSequence::new(targets, config.sequence.clone(), timer),
            )),
            LessonKind::InstantDrill => {
                let word = targets.first().cloned().unwrap_or_default();
                Self::Timed(TimedDrill::new(TimedSequence::for_word(
                    &word,
                    config.sequence.clone(),
                    timer,
                )))
            }
            LessonKind::FingerspellPractice => Self::Spelling(SpellingDrill::new(
                targets,
                config.sequence.clone(),
                config.timer.clone(),
            )),
            LessonKind::FingerspellTest => {
                let count = config.draw_count.unwrap_or(targets.len());
                Self::Spelling(SpellingDrill::new(
                    draw(&targets, count, &mut rng),
                    config.sequence.clone(),
                    config.timer.clone(),
                ))
            }
            LessonKind::DynamicGuided | LessonKind::DynamicMixed | LessonKind::DynamicFinal => {
                Self::Clip(ClipDrill::new(targets, config))
            }
        }
    }

    pub fn start(&mut self, now_ms: u64) -> Vec<LessonEvent> {
        match self {
            Self::Reading { .. } => Vec::new(),
            Self::Framing(check) => check.tick(now_ms),
            Self::Interactive(drill) => drill.start(now_ms),
            Self::Gym(drill) => drill.start(now_ms),
            Self::Timed(drill) => drill.timed.start(now_ms),
            Self::Spelling(drill) => drill.start(now_ms),
            Self::Clip(drill) => drill.mastery.start(),
        }
    }

    /// Route one input (exit is handled by the orchestrator)
    pub fn handle(&mut self, input: &LessonInput) -> Result<Vec<LessonEvent>, LessonError> {
        let unsupported = || LessonError::Unsupported {
            input: input.name(),
        };
        match (self, input) {
            (Self::Reading { acknowledged }, LessonInput::Acknowledge { .. }) => {
                *acknowledged = true;
                Ok(Vec::new())
            }
            (Self::Framing(check), LessonInput::Landmarks { now_ms, landmarks }) => {
                check.observe(landmarks.clone());
                Ok(check.tick(*now_ms))
            }
            (Self::Framing(check), LessonInput::Recognition(event)) => {
                if event.landmarks.is_some() {
                    check.observe(event.landmarks.clone());
                }
                Ok(check.tick(event.timestamp_ms))
            }
            (Self::Framing(check), LessonInput::Tick { now_ms }) => Ok(check.tick(*now_ms)),
            (Self::Interactive(drill), input) => drill.handle(input).ok_or_else(unsupported)?,
            (Self::Gym(drill), input) => drill.handle(input).ok_or_else(unsupported)?,
            (Self::Timed(drill), LessonInput::Recognition(event)) => Ok(drill.timed.on_event(event)),
            (Self::Timed(drill), LessonInput::Tick { now_ms }) => Ok(drill.timed.tick(*now_ms)),
            (Self::Spelling(drill), LessonInput::Recognition(event)) => Ok(drill.on_event(event)),
            (Self::Spelling(drill), LessonInput::Tick { now_ms }) => Ok(drill.tick(*now_ms)),
            (Self::Clip(drill), input) => drill.handle(input).ok_or_else(unsupported)?,
            // Passive streams are accepted by every lesson
            (_, LessonInput::Recognition(_) | LessonInput::Tick { .. } | LessonInput::Landmarks { .. }) => {
                Ok(Vec::new())
            }
            _ => Err(unsupported()),
        }
    }

    /// Stop all timers and pending work
    pub fn cancel(&mut self, now_ms: u64) -> Vec<LessonEvent> {
        match self {
            Self::Interactive(drill) => drill.sequence.exit(now_ms, false),
            Self::Timed(drill) => drill.timed.exit(now_ms, false),
            Self::Spelling(drill) => drill.attempt.exit(now_ms),
            Self::Clip(drill) => drill.clip.cancel(),
            _ => Vec::new(),
        }
    }

    pub fn is_finished(&self) -> bool {
        match self {
            Self::Reading { acknowledged } => *acknowledged,
            Self::Framing(check) => check.is_passed(),
            Self::Interactive(drill) => drill.finished,
            Self::Gym(drill) => drill.is_finished(),
            Self::Timed(drill) => drill.is_finished(),
            Self::Spelling(drill) => drill.finished,
            Self::Clip(drill) => drill.mastery.all_mastered(),
        }
    }

    /// Attempt outcomes so far
    pub fn result(&self) -> LessonResult {
        match self {
            Self::Reading { .. } | Self::Framing(_) => LessonResult::new(),
            Self::Interactive(drill) => drill.result.clone(),
            Self::Gym(drill) => drill.result.clone(),
            Self::Timed(drill) => drill.result(),
            Self::Spelling(drill) => drill.result.clone(),
            Self::Clip(drill) => drill.result(),
        }
    }

    pub fn phase(&self) -> SequencePhase {
        if self.is_finished() {
            return SequencePhase::Completed;
        }
        match self {
            Self::Interactive(drill) => drill.sequence.phase(),
            Self::Gym(drill) => drill.phase(),
            Self::Timed(drill) => drill.timed.sequence().phase(),
            Self::Spelling(drill) => drill.attempt.sequence().phase(),
            _ => SequencePhase::Active { index: 0 },
        }
    }

    pub fn current_target(&self) -> Option<String> {
        match self {
            Self::Interactive(drill) => drill.sequence.current_target().map(str::to_string),
            Self::Gym(drill) => Some(drill.hold.target().to_string()),
            Self::Timed(drill) => drill.timed.sequence().current_target().map(str::to_string),
            Self::Spelling(drill) => drill.words.get(drill.index).cloned(),
            Self::Clip(drill) => drill.mastery.current_target().map(str::to_string),
            _ => None,
        }
    }

    /// Progress on the current target or check (0.0-1.0)
    pub fn progress(&self) -> f64 {
        match self {
            Self::Reading { acknowledged } => f64::from(u8::from(*acknowledged)),
            Self::Framing(check) => check.progress(),
            Self::Interactive(drill) => drill.sequence.progress(),
            Self::Gym(drill) => drill.hold.progress(),
            Self::Timed(drill) => drill.timed.sequence().progress(),
            Self::Spelling(drill) => drill.attempt.sequence().progress(),
            Self::Clip(drill) => drill.mastery.progress(),
        }
    }

    pub fn mistakes(&self) -> u32 {
        match self {
            Self::Interactive(drill) => drill.result.mistake_count,
            Self::Gym(drill) => drill.mistakes.count(),
            Self::Timed(drill) => drill.timed.sequence().mistake_count(),
            Self::Spelling(drill) if drill.finished => drill.result.mistake_count,
            Self::Spelling(drill) => {
                drill.result.mistake_count + drill.attempt.sequence().mistake_count()
            }
            _ => 0,
        }
    }

    /// Classification request waiting to be sent, if any
    pub fn pending_clip_request(&self) -> Option<ClipRequest> {
        match self {
            Self::Clip(drill) => drill.pending_request(),
            _ => None,
        }
    }
}

// =============================================================================
// INTERACTIVE
// =============================================================================

/// Guided holds with free navigation; done once every letter was confirmed
#[derive(Debug, Clone)]
pub struct InteractiveDrill {
    sequence: SequenceController,
    confirmed: BTreeSet<usize>,
    target_started_ms: u64,
    result: LessonResult,
    finished: bool,
}

impl InteractiveDrill {
    pub fn new(targets: Vec<String>, config: SequenceConfig) -> Self {
        Self {
            sequence: SequenceController::new(targets, config),
            confirmed: BTreeSet::new(),
            target_started_ms: 0,
            result: LessonResult::new(),
            finished: false,
        }
    }

    fn start(&mut self, now: u64) -> Vec<LessonEvent> {
        let events = self.sequence.start(now);
        self.track(events, now)
    }

    fn handle(&mut self, input: &LessonInput) -> Option<Result<Vec<LessonEvent>, LessonError>> {
        if self.finished {
            return Some(Ok(Vec::new()));
        }
        let (events, now) = match input {
            LessonInput::Recognition(event) => (self.sequence.on_event(event), event.timestamp_ms),
            LessonInput::Tick { now_ms } => (self.sequence.tick(*now_ms), *now_ms),
            LessonInput::Landmarks { .. } => (Vec::new(), 0),
            LessonInput::Select { now_ms, target } => {
                let Some(index) = self.sequence.targets().iter().position(|t| t == target) else {
                    return Some(Err(LessonError::UnknownTarget {
                        target: target.clone(),
                    }));
                };
                (self.sequence.jump_to(index, *now_ms), *now_ms)
            }
            _ => return None,
        };
        Some(Ok(self.track(events, now)))
    }

    fn track(&mut self, events: Vec<LessonEvent>, now: u64) -> Vec<LessonEvent> {
        let mut out = Vec::with_capacity(events.len());
        let mut sequence_done = false;
        for event in events {
            match &event {
                LessonEvent::TargetStarted { at_ms, .. } => self.target_started_ms = *at_ms,
                LessonEvent::HoldConfirmed { index, target, at_ms } => {
                    if self.confirmed.insert(*index) {
                        self.result.record(AttemptResult::pass(
                            target.clone(),
                            at_ms.saturating_sub(self.target_started_ms),
                        ));
                    }
                }
                LessonEvent::MistakeCounted { .. } => self.result.mistake_count += 1,
                LessonEvent::SequenceCompleted { .. } => sequence_done = true,
                _ => {}
            }
            out.push(event);
        }

        let missing = (0..self.sequence.targets().len()).find(|i| !self.confirmed.contains(i));
        match missing {
            None => {
                self.finished = true;
                self.sequence.cancel();
                info!(letters = self.confirmed.len(), "every letter confirmed");
            }
            Some(index) if sequence_done => {
                // Navigation skipped letters: go back to the first one
                debug!(index, "unconfirmed letters remain");
                out.extend(self.sequence.restart(now));
                out.extend(self.sequence.jump_to(index, now));
            }
            Some(_) => {}
        }
        out
    }
}

// =============================================================================
// GYM
// =============================================================================

/// Free practice over a rotation until a success goal
#[derive(Debug, Clone)]
pub struct GymDrill {
    hold: HoldTracker,
    gate: ReleaseGate,
    mistakes: MistakeDetector,
    selector: TargetSelector,
    cooldown_ms: u64,
    blocked_until: Option<u64>,
    goal: u32,
    successes: u32,
    target_started_ms: u64,
    result: LessonResult,
}

impl GymDrill {
    pub fn new(targets: Vec<String>, config: &LessonConfig) -> Self {
        let sequence = &config.sequence;
        Self {
            hold: HoldTracker::new(sequence.hold.clone(), ""),
            gate: ReleaseGate::new(sequence.neutral_confidence),
            mistakes: MistakeDetector::new(sequence.mistake.clone()),
            selector: TargetSelector::new(targets, config.rotation, config.seed),
            cooldown_ms: sequence.cooldown_ms,
            blocked_until: None,
            goal: config.success_goal,
            successes: 0,
            target_started_ms: 0,
            result: LessonResult::new(),
        }
    }

    fn start(&mut self, now: u64) -> Vec<LessonEvent> {
        match self.selector.select(&[]) {
            Some(label) => self.switch_to(None, label, now),
            None => Vec::new(),
        }
    }

    fn handle(&mut self, input: &LessonInput) -> Option<Result<Vec<LessonEvent>, LessonError>> {
        let events = match input {
            LessonInput::Recognition(event) => self.on_event(event),
            LessonInput::Tick { now_ms } => {
                if let Some(step) = self.hold.tick(*now_ms) {
                    debug!(reason = %step.reason(), "gym hold tick");
                }
                Vec::new()
            }
            LessonInput::Landmarks { .. } => Vec::new(),
            LessonInput::Select { now_ms, target } => {
                if !self.selector.labels().contains(target) {
                    return Some(Err(LessonError::UnknownTarget {
                        target: target.clone(),
                    }));
                }
                self.blocked_until = None;
                self.switch_to(None, target.clone(), *now_ms)
            }
            _ => return None,
        };
        Some(Ok(events))
    }

    fn on_event(&mut self, event: &RecognitionEvent) -> Vec<LessonEvent> {
        let now = event.timestamp_ms;
        if self.is_finished() {
            return Vec::new();
        }
        if let Some(until) = self.blocked_until {
            if now < until {
                return Vec::new();
            }
            self.blocked_until = None;
        }

        let target = self.hold.target().to_string();
        let mut out = Vec::new();
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
            out.push(LessonEvent::ReleaseCleared {
                target: target.clone(),
            });
        }
        if self.hold.on_event(event) != HoldStep::Confirmed {
            return out;
        }

        self.successes += 1;
        self.result.record(AttemptResult::pass(
            target.clone(),
            now.saturating_sub(self.target_started_ms),
        ));
        out.push(LessonEvent::HoldConfirmed {
            index: (self.successes - 1) as usize,
            target: target.clone(),
            at_ms: now,
        });
        out.push(LessonEvent::RepCounted {
            label: target.clone(),
            count: self.successes,
            required: self.goal,
        });
        if self.is_finished() {
            self.result.mistake_count = self.mistakes.count();
            info!(successes = self.successes, "gym goal reached");
            return out;
        }

        if let Some(next) = self.selector.select(&[]) {
            out.extend(self.switch_to(Some(&target), next, now));
        }
        if self.cooldown_ms > 0 {
            self.blocked_until = Some(now.saturating_add(self.cooldown_ms));
        }
        out
    }

    fn switch_to(&mut self, previous: Option<&str>, next: String, now: u64) -> Vec<LessonEvent> {
        let gated = self.gate.arm(previous, &next);
        self.hold.reset(next.clone());
        self.mistakes.reset();
        self.target_started_ms = now;
        let mut out = vec![LessonEvent::TargetSelected {
            label: next.clone(),
        }];
        if gated {
            out.push(LessonEvent::ReleaseRequired { target: next });
        }
        out
    }

    fn phase(&self) -> SequencePhase {
        let index = self.successes as usize;
        match self.blocked_until {
            Some(until_ms) => SequencePhase::Blocked {
                next: index,
                until_ms,
            },
            None => SequencePhase::Active { index },
        }
    }

    pub fn is_finished(&self) -> bool {
        self.successes >= self.goal
    }

    pub fn successes(&self) -> u32 {
        self.successes
    }
}

// =============================================================================
// TIMED
// =============================================================================

/// Final test, instant exam and instant drill
#[derive(Debug, Clone)]
pub struct TimedDrill {
    timed: TimedSequence,
}

impl TimedDrill {
    pub fn new(timed: TimedSequence) -> Self {
        Self { timed }
    }

    pub fn timed(&self) -> &TimedSequence {
        &self.timed
    }

    fn is_finished(&self) -> bool {
        self.timed.sequence().is_completed() || self.timed.is_failed()
    }

    /// Sequence results; a dropped run fails every unresolved target
    fn result(&self) -> LessonResult {
        let sequence = self.timed.sequence();
        let mut result = sequence.results().clone();
        if self.timed.is_failed() {
            for target in sequence.targets().iter().skip(result.attempts.len()) {
                result.record(AttemptResult::fail(target.clone(), 0));
            }
        }
        result
    }
}

// =============================================================================
// SPELLING
// =============================================================================

/// One word, with or without a deadline
#[derive(Debug, Clone)]
enum WordAttempt {
    Untimed(SequenceController),
    Timed(TimedSequence),
}

impl WordAttempt {
    fn new(word: &str, sequence: SequenceConfig, timer: Option<TimerConfig>) -> Self {
        match timer {
            Some(timer) => Self::Timed(TimedSequence::for_word(word, sequence, timer)),
            None => Self::Untimed(SequenceController::for_word(word, sequence)),
        }
    }

    fn start(&mut self, now: u64) -> Vec<LessonEvent> {
        match self {
            Self::Untimed(seq) => seq.start(now),
            Self::Timed(timed) => timed.start(now),
        }
    }

    fn on_event(&mut self, event: &RecognitionEvent) -> Vec<LessonEvent> {
        match self {
            Self::Untimed(seq) => seq.on_event(event),
            Self::Timed(timed) => timed.on_event(event),
        }
    }

    fn tick(&mut self, now: u64) -> Vec<LessonEvent> {
        match self {
            Self::Untimed(seq) => seq.tick(now),
            Self::Timed(timed) => timed.tick(now),
        }
    }

    fn exit(&mut self, now: u64) -> Vec<LessonEvent> {
        match self {
            Self::Untimed(seq) => seq.exit(now, false),
            Self::Timed(timed) => timed.exit(now, false),
        }
    }

    fn sequence(&self) -> &SequenceController {
        match self {
            Self::Untimed(seq) => seq,
            Self::Timed(timed) => timed.sequence(),
        }
    }

    fn is_failed(&self) -> bool {
        match self {
            Self::Untimed(_) => false,
            Self::Timed(timed) => timed.is_failed(),
        }
    }
}

/// Spell each word of a list in turn
#[derive(Debug, Clone)]
pub struct SpellingDrill {
    words: Vec<String>,
    index: usize,
    sequence: SequenceConfig,
    timer: Option<TimerConfig>,
    attempt: WordAttempt,
    word_started_ms: u64,
    result: LessonResult,
    finished: bool,
}

impl SpellingDrill {
    pub fn new(words: Vec<String>, sequence: SequenceConfig, timer: Option<TimerConfig>) -> Self {
        let first = words.first().cloned().unwrap_or_default();
        Self {
            attempt: WordAttempt::new(&first, sequence.clone(), timer.clone()),
            words,
            index: 0,
            sequence,
            timer,
            word_started_ms: 0,
            result: LessonResult::new(),
            finished: false,
        }
    }

    fn start(&mut self, now: u64) -> Vec<LessonEvent> {
        self.word_started_ms = now;
        if self.words.is_empty() {
            self.finished = true;
            return Vec::new();
        }
        self.attempt.start(now)
    }

    fn on_event(&mut self, event: &RecognitionEvent) -> Vec<LessonEvent> {
        if self.finished {
            return Vec::new();
        }
        let events = self.attempt.on_event(event);
        self.resolve(events, event.timestamp_ms)
    }

    fn tick(&mut self, now: u64) -> Vec<LessonEvent> {
        if self.finished {
            return Vec::new();
        }
        let events = self.attempt.tick(now);
        self.resolve(events, now)
    }

    fn resolve(&mut self, mut out: Vec<LessonEvent>, now: u64) -> Vec<LessonEvent> {
        let status = if self.attempt.sequence().is_completed() {
            AttemptStatus::Pass
        } else if self.attempt.is_failed() {
            AttemptStatus::Fail
        } else {
            return out;
        };

        let word = self.words[self.index].clone();
        debug!(word = %word, status = ?status, "word resolved");
        self.result.record(AttemptResult {
            target: word,
            status,
            duration_ms: now.saturating_sub(self.word_started_ms),
            attempts: 1,
        });
        self.result.mistake_count += self.attempt.sequence().mistake_count();

        self.index += 1;
        if self.index >= self.words.len() {
            self.finished = true;
            return out;
        }
        self.attempt = WordAttempt::new(&self.words[self.index], self.sequence.clone(), self.timer.clone());
        self.word_started_ms = now;
        out.extend(self.attempt.start(now));
        out
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }
}

// =============================================================================
// CLIPS
// =============================================================================

/// Dynamic signs: recorded clips feed a mastery rotation
#[derive(Debug, Clone)]
pub struct ClipDrill {
    clip: ClipController,
    mastery: MasteryTracker,
    attempts: BTreeMap<String, u32>,
}

impl ClipDrill {
    pub fn new(labels: Vec<String>, config: &LessonConfig) -> Self {
        Self {
            clip: ClipController::new(config.clip.clone()),
            mastery: MasteryTracker::new(labels, config.mastery.clone(), config.seed),
            attempts: BTreeMap::new(),
        }
    }

    fn handle(&mut self, input: &LessonInput) -> Option<Result<Vec<LessonEvent>, LessonError>> {
        let result = match input {
            LessonInput::ClipStart { now_ms } => self.clip.start(*now_ms),
            LessonInput::ClipFrame { now_ms, frame } => self.clip.push_frame(*now_ms, frame.clone()),
            LessonInput::ClipStop { .. } => self.clip.stop(),
            LessonInput::ClipResult {
                ticket,
                prediction,
                error,
            } => {
                let answer = match (prediction, error) {
                    (Some(prediction), _) => Ok(prediction.clone()),
                    (None, Some(message)) => Err(ClassifierError::Remote {
                        message: message.clone(),
                    }),
                    (None, None) => Err(ClassifierError::EmptyResponse),
                };
                Ok(self.resolve(*ticket, answer))
            }
            LessonInput::Recognition(_) | LessonInput::Tick { .. } | LessonInput::Landmarks { .. } => {
                Ok(Vec::new())
            }
            _ => return None,
        };
        Some(result.map_err(LessonError::from))
    }

    /// Apply a classifier answer; stale answers are dropped
    pub fn resolve(
        &mut self,
        ticket: u64,
        answer: Result<ClipPrediction, ClassifierError>,
    ) -> Vec<LessonEvent> {
        let target = self.mastery.current_target().unwrap_or_default().to_string();
        let verdict = match self.clip.resolve(ticket, answer, &target) {
            Ok(verdict) => verdict,
            Err(ClipError::StaleTicket { .. }) => return Vec::new(),
            Err(err) => {
                debug!(error = %err, "clip result ignored");
                return Vec::new();
            }
        };

        let mut out = vec![verdict.to_event(&target)];
        match verdict {
            ClipVerdict::Accepted { label, score } => {
                *self.attempts.entry(target.clone()).or_insert(0) += 1;
                out.extend(self.mastery.observe(&label, score));
            }
            ClipVerdict::Mismatch { .. } => {
                *self.attempts.entry(target).or_insert(0) += 1;
            }
            ClipVerdict::Failed { .. } => {}
        }
        out
    }

    pub fn pending_request(&self) -> Option<ClipRequest> {
        self.clip.pending_request(Some(self.mastery.labels().to_vec()))
    }

    fn result(&self) -> LessonResult {
        let mut result = LessonResult::new();
        for label in self.mastery.labels() {
            let status = if self.mastery.is_mastered(label) {
                AttemptStatus::Pass
            } else {
                AttemptStatus::Fail
            };
            result.record(AttemptResult {
                target: label.clone(),
                status,
                duration_ms: 0,
                attempts: self.attempts.get(label).copied().unwrap_or(0),
            });
        }
        result
    }

    pub fn attempts(&self, label: &str) -> u32 {
        self.attempts.get(label).copied().unwrap_or(0)
    }
}

// =============================================================================
// TESTS
// =============================================================================
