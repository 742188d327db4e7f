//! Emitted lesson events and status output

use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::{Deserialize, Serialize};

use crate::types::{LessonScore, ReasonCode, SequencePhase};

/// Local rejection of a clip that never reached the classifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipRejection {
    pub captured: usize,
    pub required: usize,
}

impl ClipRejection {
    pub fn message(&self) -> String {
        format!(
            "Clip too short. Need at least {} frames; captured {}.",
            self.required, self.captured
        )
    }
}

/// Guidance while calibrating the camera framing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FramingHint {
    NoHand,
    MoveRight,
    MoveLeft,
    MoveDown,
    MoveUp,
    HoldSteady,
    Passed,
}

impl FramingHint {
    pub fn message(&self) -> &'static str {
        match self {
            Self::NoHand => "Show one hand in frame to begin the check.",
            Self::MoveRight => "Move your hand slightly to the right.",
            Self::MoveLeft => "Move your hand slightly to the left.",
            Self::MoveDown => "Move your hand slightly down.",
            Self::MoveUp => "Move your hand slightly up.",
            Self::HoldSteady => "Great framing. Hold steady inside the zone.",
            Self::Passed => "Great. Camera calibration passed.",
        }
    }
}

/// Everything a controller can report back to the lesson
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LessonEvent {
    TargetStarted { index: usize, target: String, at_ms: u64 },
    HoldConfirmed { index: usize, target: String, at_ms: u64 },
    ReleaseRequired { target: String },
    ReleaseCleared { target: String },
    MistakeCounted { target: String, detected: String, total: u32, at_ms: u64 },
    HintSuggested { target: String },
    SequenceCompleted { elapsed_ms: u64, mistake_count: u32 },
    SequenceRestarted { at_ms: u64 },
    AttemptTimedOut { index: usize, target: String, deadline_ms: u64 },
    PenaltyStarted { until_ms: u64 },
    RepCounted { label: String, count: u32, required: u32 },
    LabelMastered { label: String },
    AllMastered,
    TargetSelected { label: String },
    ClipStarted { ticket: u64 },
    ClipStopped { ticket: u64, frames: usize, auto_stopped: bool },
    ClipRejected { rejection: ClipRejection },
    ClipAccepted { label: String, score: f64 },
    ClipMismatch { target: String, detected: String, score: f64 },
    ClipFailed { message: String },
    ClipDiscarded { ticket: u64 },
    FramingHintChanged { hint: FramingHint },
    FramingPassed,
    LessonCompleted { lesson_id: String, passed: bool, score: LessonScore, xp: u32 },
    Exited,
}

impl LessonEvent {
    /// Reason code for logging and display
    pub fn reason(&self) -> ReasonCode {
        match self {
            Self::TargetStarted { .. } => ReasonCode::R401_TARGET_STARTED,
            Self::HoldConfirmed { .. } => ReasonCode::R104_HOLD_CONFIRMED,
            Self::ReleaseRequired { .. } => ReasonCode::R201_RELEASE_REQUIRED,
            Self::ReleaseCleared { .. } => ReasonCode::R202_RELEASE_CLEARED,
            Self::MistakeCounted { .. } => ReasonCode::R301_MISTAKE_COUNTED,
            Self::HintSuggested { .. } => ReasonCode::R302_HINT_SUGGESTED,
            Self::SequenceCompleted { .. } => ReasonCode::R402_SEQUENCE_COMPLETED,
            Self::SequenceRestarted { .. } => ReasonCode::R403_SEQUENCE_RESTARTED,
            Self::AttemptTimedOut { .. } => ReasonCode::R501_TIMED_OUT,
            Self::PenaltyStarted { .. } => ReasonCode::R502_PENALTY_STARTED,
            Self::RepCounted { .. } => ReasonCode::R601_REP_COUNTED,
            Self::LabelMastered { .. } => ReasonCode::R602_LABEL_MASTERED,
            Self::AllMastered => ReasonCode::R603_ALL_MASTERED,
            Self::TargetSelected { .. } => ReasonCode::R604_TARGET_SELECTED,
            Self::ClipStarted { .. } => ReasonCode::R701_CLIP_RECORDING,
            Self::ClipStopped { .. } => ReasonCode::R702_CLIP_STOPPED,
            Self::ClipRejected { .. } => ReasonCode::R703_CLIP_REJECTED,
            Self::ClipAccepted { .. } => ReasonCode::R704_CLIP_ACCEPTED,
            Self::ClipMismatch { .. } => ReasonCode::R705_CLIP_MISMATCH,
            Self::ClipFailed { .. } => ReasonCode::R706_CLIP_FAILED,
            Self::ClipDiscarded { .. } => ReasonCode::R707_CLIP_DISCARDED,
            Self::FramingHintChanged { .. } => ReasonCode::R801_FRAMING_HINT,
            Self::FramingPassed => ReasonCode::R802_FRAMING_PASSED,
            Self::LessonCompleted { passed: true, .. } => ReasonCode::R901_LESSON_PASSED,
            Self::LessonCompleted { passed: false, .. } => ReasonCode::R902_LESSON_FAILED,
            Self::Exited => ReasonCode::R404_EXITED,
        }
    }

    /// Short feedback line for the learner
    pub fn feedback(&self) -> String {
        match self {
            Self::TargetStarted { target, .. } => format!("Sign {}", target),
            Self::HoldConfirmed { target, .. } => format!("{} confirmed", target),
            Self::MistakeCounted { detected, .. } => format!("That looks like {}", detected),
            Self::SequenceCompleted { elapsed_ms, mistake_count } => format!(
                "Done in {:.1}s with {} mistake(s)",
                *elapsed_ms as f64 / 1000.0,
                mistake_count
            ),
            Self::RepCounted { label, count, required } => {
                format!("Good! {} {}/{}", label, count, required)
            }
            Self::ClipRejected { rejection } => rejection.message(),
            Self::ClipMismatch { target, detected, score } => format!(
                "Detected {} ({:.1}%). Try {} again.",
                detected.to_uppercase(),
                score * 100.0,
                target
            ),
            Self::ClipFailed { message } => format!("Prediction failed: {}", message),
            Self::FramingHintChanged { hint } => hint.message().to_string(),
            Self::LessonCompleted { score, xp, passed: true, .. } => {
                format!("Lesson complete! {} +{} XP", score, xp)
            }
            Self::LessonCompleted { score, passed: false, .. } => {
                format!("Lesson finished: {}", score)
            }
            other => other.reason().description().to_string(),
        }
    }

    /// Fire-once lesson outcome?
    pub fn is_completion(&self) -> bool {
        matches!(self, Self::LessonCompleted { .. })
    }
}

/// Snapshot of a running lesson for display
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusOutput {
    pub timestamp: DateTime<Utc>,
    pub lesson_id: String,
    pub phase: SequencePhase,
    /// Current target, if any
    pub target: Option<String>,
    /// Hold progress (0.0-1.0)
    pub progress: f64,
    pub mistakes: u32,
    pub score: LessonScore,
    pub completed: bool,
    /// Reason of the most recent event
    pub reason: Option<ReasonCode>,
}

impl StatusOutput {
    /// Format for terminal display (with colors)
    pub fn to_terminal_string(&self) -> String {
        let line = format!(
            "{} target={} | hold={:>3.0}% | mistakes={} | score={} | {}",
            self.phase.emoji(),
            self.target.as_deref().unwrap_or("-"),
            self.progress * 100.0,
            self.mistakes,
            self.score,
            self.reason.map(|r| r.code()).unwrap_or("-"),
        );
        match self.phase {
            SequencePhase::Completed => line.green().to_string(),
            SequencePhase::Cancelled => line.red().to_string(),
            SequencePhase::Blocked { .. } => line.cyan().to_string(),
            SequencePhase::Active { .. } => line.yellow().to_string(),
            SequencePhase::Idle => line.bright_black().to_string(),
        }
    }

    /// Format for parseable output (no colors)
    pub fn to_parseable_string(&self) -> String {
        format!(
            "phase={} | target={} | hold={:.2} | mistakes={} | score={} | reason={}",
            self.phase,
            self.target.as_deref().unwrap_or("-"),
            self.progress,
            self.mistakes,
            self.score,
            self.reason.map(|r| r.code()).unwrap_or("-"),
        )
    }
}
