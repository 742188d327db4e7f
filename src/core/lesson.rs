//! Lesson orchestration and progress reporting
//!
//! A [`LessonOrchestrator`] owns one [`Drill`], routes learner inputs into it,
//! decides pass/fail once the drill finishes and reports the completion to a
//! [`ProgressStore`] exactly once.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::core::Drill;
use crate::types::{
    ClipRequest, LessonConfig, LessonError, LessonEvent, LessonInput, LessonPlan, LessonResult,
    LessonScore, PlanError, ReasonCode, SequencePhase, StatusOutput,
};

// =============================================================================
// PROGRESS STORE
// =============================================================================

/// Cross-lesson learner progress
pub trait ProgressStore: Send + Sync {
    fn record_completion(&self, lesson_id: &str, xp: u32);
    fn is_completed(&self, lesson_id: &str) -> bool;
    fn total_xp(&self) -> u32;
}

/// In-memory store; a later write for the same lesson replaces the earlier one
#[derive(Debug, Default)]
pub struct MemoryProgressStore {
    completed: RwLock<HashMap<String, u32>>,
}

impl MemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Completed lesson ids with their XP
    pub fn completions(&self) -> HashMap<String, u32> {
        self.completed
            .read()
            .map(|completed| completed.clone())
            .unwrap_or_default()
    }
}

impl ProgressStore for MemoryProgressStore {
    fn record_completion(&self, lesson_id: &str, xp: u32) {
        match self.completed.write() {
            Ok(mut completed) => {
                completed.insert(lesson_id.to_string(), xp);
            }
            Err(_) => warn!(lesson_id, "progress store poisoned, completion dropped"),
        }
    }

    fn is_completed(&self, lesson_id: &str) -> bool {
        self.completed
            .read()
            .map(|completed| completed.contains_key(lesson_id))
            .unwrap_or(false)
    }

    fn total_xp(&self) -> u32 {
        self.completed
            .read()
            .map(|completed| completed.values().sum())
            .unwrap_or(0)
    }
}

// =============================================================================
// ORCHESTRATOR
// =============================================================================

/// Final verdict of a lesson run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LessonOutcome {
    pub passed: bool,
    pub score: LessonScore,
    pub xp: u32,
    pub result: LessonResult,
}

/// Does `result` meet the plan's pass rule?
///
/// An absolute `pass_count` wins over `pass_ratio`. A lesson without graded
/// attempts (reading, calibration) always passes.
pub fn passes(config: &LessonConfig, result: &LessonResult) -> bool {
    if result.attempts.is_empty() {
        return true;
    }
    match config.pass_count {
        Some(required) => result.passed_count() >= required,
        None => result.score().ratio() >= config.pass_ratio,
    }
}

pub struct LessonOrchestrator {
    plan: LessonPlan,
    drill: Drill,
    store: Arc<dyn ProgressStore>,
    started: bool,
    cancelled: bool,
    outcome: Option<LessonOutcome>,
    last_reason: Option<ReasonCode>,
}

impl std::fmt::Debug for LessonOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LessonOrchestrator")
            .field("lesson_id", &self.plan.id)
            .field("kind", &self.plan.kind)
            .field("started", &self.started)
            .field("cancelled", &self.cancelled)
            .field("outcome", &self.outcome)
            .finish()
    }
}

impl LessonOrchestrator {
    pub fn new(plan: LessonPlan, store: Arc<dyn ProgressStore>) -> Result<Self, PlanError> {
        plan.validate()?;
        let drill = Drill::from_plan(&plan);
        Ok(Self {
            plan,
            drill,
            store,
            started: false,
            cancelled: false,
            outcome: None,
            last_reason: None,
        })
    }

    pub fn start(&mut self, now_ms: u64) -> Vec<LessonEvent> {
        if self.started {
            return Vec::new();
        }
        self.started = true;
        info!(lesson_id = %self.plan.id, kind = %self.plan.kind, targets = self.plan.targets.len(), "lesson started");
        let events = self.drill.start(now_ms);
        self.settle(events)
    }

    /// Feed one learner input
    ///
    /// Inputs after completion or exit are ignored.
    pub fn handle(&mut self, input: LessonInput) -> Result<Vec<LessonEvent>, LessonError> {
        if !self.started {
            return Err(LessonError::NotStarted);
        }
        if self.outcome.is_some() || self.cancelled {
            debug!(input = input.name(), "lesson over, input ignored");
            return Ok(Vec::new());
        }

        let events = match input {
            LessonInput::Exit { now_ms, restart: true } => {
                info!(lesson_id = %self.plan.id, "lesson restarted");
                self.drill.cancel(now_ms);
                self.drill = Drill::from_plan(&self.plan);
                let mut out = vec![LessonEvent::SequenceRestarted { at_ms: now_ms }];
                out.extend(self.drill.start(now_ms));
                out
            }
            LessonInput::Exit { now_ms, restart: false } => {
                info!(lesson_id = %self.plan.id, "lesson exited");
                self.cancelled = true;
                let mut out = self.drill.cancel(now_ms);
                if !out.contains(&LessonEvent::Exited) {
                    out.push(LessonEvent::Exited);
                }
                out
            }
            input => self.drill.handle(&input)?,
        };
        Ok(self.settle(events))
    }

    /// Latch the outcome once the drill has finished
    fn settle(&mut self, mut events: Vec<LessonEvent>) -> Vec<LessonEvent> {
        if !self.cancelled && self.outcome.is_none() && self.drill.is_finished() {
            let result = self.drill.result();
            let passed = passes(&self.plan.config, &result);
            let xp = if passed { self.plan.config.xp } else { 0 };
            let score = result.score();
            if passed {
                self.store.record_completion(&self.plan.id, xp);
            }
            info!(lesson_id = %self.plan.id, passed, score = %score, xp, "lesson completed");
            events.push(LessonEvent::LessonCompleted {
                lesson_id: self.plan.id.clone(),
                passed,
                score,
                xp,
            });
            self.outcome = Some(LessonOutcome {
                passed,
                score,
                xp,
                result,
            });
        }
        if let Some(last) = events.last() {
            self.last_reason = Some(last.reason());
        }
        events
    }

    pub fn status(&self) -> StatusOutput {
        let phase = if self.cancelled {
            SequencePhase::Cancelled
        } else if !self.started {
            SequencePhase::Idle
        } else {
            self.drill.phase()
        };
        StatusOutput {
            timestamp: Utc::now(),
            lesson_id: self.plan.id.clone(),
            phase,
            target: self.drill.current_target(),
            progress: self.drill.progress(),
            mistakes: self.drill.mistakes(),
            score: self.drill.result().score(),
            completed: self.outcome.is_some(),
            reason: self.last_reason,
        }
    }

    /// Clip waiting to be sent to the classifier
    pub fn pending_clip_request(&self) -> Option<ClipRequest> {
        if self.cancelled {
            return None;
        }
        self.drill.pending_clip_request()
    }

    pub fn plan(&self) -> &LessonPlan {
        &self.plan
    }

    pub fn drill(&self) -> &Drill {
        &self.drill
    }

    pub fn outcome(&self) -> Option<&LessonOutcome> {
        self.outcome.as_ref()
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.is_some() || self.cancelled
    }
}

// =============================================================================
// TESTS
// =============================================================================
