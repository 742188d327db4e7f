//! Controller phase definitions

use serde::{Deserialize, Serialize};

/// Phases of a target sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SequencePhase {
    /// Not started yet
    Idle,
    /// Evaluating predictions for `targets[index]`
    Active { index: usize },
    /// Brief freeze after a confirmation, `next` becomes active at `until_ms`
    Blocked { next: usize, until_ms: u64 },
    /// Every target confirmed or resolved
    Completed,
    /// Aborted by the learner
    Cancelled,
}

impl SequencePhase {
    /// No further input changes anything
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Get ANSI color code for terminal display
    pub fn color_code(&self) -> &'static str {
        match self {
            Self::Idle => "\x1b[90m",            // Gray
            Self::Active { .. } => "\x1b[33m",   // Yellow
            Self::Blocked { .. } => "\x1b[36m",  // Cyan
            Self::Completed => "\x1b[32m",       // Green
            Self::Cancelled => "\x1b[31m",       // Red
        }
    }

    /// Reset ANSI color
    pub fn color_reset() -> &'static str {
        "\x1b[0m"
    }

    /// Get emoji for phase
    pub fn emoji(&self) -> &'static str {
        match self {
            Self::Idle => "⏳",
            Self::Active { .. } => "✋",
            Self::Blocked { .. } => "⏸",
            Self::Completed => "✅",
            Self::Cancelled => "🚪",
        }
    }
}

impl std::fmt::Display for SequencePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "IDLE"),
            Self::Active { index } => write!(f, "ACTIVE({})", index),
            Self::Blocked { next, .. } => write!(f, "BLOCKED(->{})", next),
            Self::Completed => write!(f, "COMPLETED"),
            Self::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// Deadline state for one timed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "timer", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimerState {
    /// Nothing armed
    Idle,
    /// Counting down to `deadline_ms`
    Running { deadline_ms: u64 },
    /// Confirmed before the deadline
    Success,
    /// Deadline reached first
    TimedOut,
    /// Penalty pause, resumes at `until_ms`
    Penalty { until_ms: u64 },
}

impl std::fmt::Display for TimerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "IDLE"),
            Self::Running { deadline_ms } => write!(f, "RUNNING(<{}ms)", deadline_ms),
            Self::Success => write!(f, "SUCCESS"),
            Self::TimedOut => write!(f, "TIMED_OUT"),
            Self::Penalty { until_ms } => write!(f, "PENALTY(<{}ms)", until_ms),
        }
    }
}

/// Clip recording phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "clip", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClipPhase {
    Idle,
    Recording,
    /// Waiting on the classifier for `ticket`
    Submitting { ticket: u64 },
}

impl std::fmt::Display for ClipPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "IDLE"),
            Self::Recording => write!(f, "RECORDING"),
            Self::Submitting { ticket } => write!(f, "SUBMITTING(#{})", ticket),
        }
    }
}
