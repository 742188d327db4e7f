//! Reason codes for lesson transitions and feedback

use serde::{Deserialize, Serialize};

/// Reason codes for every emitted lesson event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(non_camel_case_types)]
pub enum ReasonCode {
    // =========================================================================
    // R1xx: Hold
    // =========================================================================
    /// Matching prediction, hold accumulating
    R101_HOLD_ACCUMULATING,
    /// Signal lost or wrong, hold decaying
    R102_HOLD_DECAYING,
    /// Prediction stream went quiet, treated as no hand
    R103_HOLD_STALE,
    /// Required hold reached
    R104_HOLD_CONFIRMED,

    // =========================================================================
    // R2xx: Release
    // =========================================================================
    /// Next letter repeats the current one, neutral pose required
    R201_RELEASE_REQUIRED,
    /// Neutral pose seen, evaluation resumes
    R202_RELEASE_CLEARED,

    // =========================================================================
    // R3xx: Mistakes and hints
    // =========================================================================
    /// Sustained confident wrong letter
    R301_MISTAKE_COUNTED,
    /// Long time without a correct prediction
    R302_HINT_SUGGESTED,

    // =========================================================================
    // R4xx: Sequence
    // =========================================================================
    /// New target is live
    R401_TARGET_STARTED,
    /// All targets consumed
    R402_SEQUENCE_COMPLETED,
    /// Sequence restarted from the first target
    R403_SEQUENCE_RESTARTED,
    /// Learner left the lesson
    R404_EXITED,

    // =========================================================================
    // R5xx: Timers
    // =========================================================================
    /// Deadline passed before confirmation
    R501_TIMED_OUT,
    /// Penalty pause before the attempt resumes
    R502_PENALTY_STARTED,

    // =========================================================================
    // R6xx: Mastery
    // =========================================================================
    /// Qualifying repetition counted
    R601_REP_COUNTED,
    /// One label reached its repetition goal
    R602_LABEL_MASTERED,
    /// Every label reached its repetition goal
    R603_ALL_MASTERED,
    /// Rotation moved to a new target
    R604_TARGET_SELECTED,

    // =========================================================================
    // R7xx: Clips
    // =========================================================================
    /// Recording started
    R701_CLIP_RECORDING,
    /// Recording stopped, clip ready
    R702_CLIP_STOPPED,
    /// Clip rejected locally or did not match
    R703_CLIP_REJECTED,
    /// Clip matched the target
    R704_CLIP_ACCEPTED,
    /// Clip classified as another label
    R705_CLIP_MISMATCH,
    /// Classifier failed, retry allowed
    R706_CLIP_FAILED,
    /// Response arrived for a superseded recording
    R707_CLIP_DISCARDED,

    // =========================================================================
    // R8xx: Framing
    // =========================================================================
    /// Framing guidance changed
    R801_FRAMING_HINT,
    /// Hand held inside the framing zone long enough
    R802_FRAMING_PASSED,

    // =========================================================================
    // R9xx: Lesson
    // =========================================================================
    /// Lesson finished with a passing outcome
    R901_LESSON_PASSED,
    /// Lesson finished without passing
    R902_LESSON_FAILED,
}

impl ReasonCode {
    /// Get the code string (for logging)
    pub fn code(&self) -> &'static str {
        match self {
            Self::R101_HOLD_ACCUMULATING => "R101_HOLD_ACCUMULATING",
            Self::R102_HOLD_DECAYING => "R102_HOLD_DECAYING",
            Self::R103_HOLD_STALE => "R103_HOLD_STALE",
            Self::R104_HOLD_CONFIRMED => "R104_HOLD_CONFIRMED",
            Self::R201_RELEASE_REQUIRED => "R201_RELEASE_REQUIRED",
            Self::R202_RELEASE_CLEARED => "R202_RELEASE_CLEARED",
            Self::R301_MISTAKE_COUNTED => "R301_MISTAKE_COUNTED",
            Self::R302_HINT_SUGGESTED => "R302_HINT_SUGGESTED",
            Self::R401_TARGET_STARTED => "R401_TARGET_STARTED",
            Self::R402_SEQUENCE_COMPLETED => "R402_SEQUENCE_COMPLETED",
            Self::R403_SEQUENCE_RESTARTED => "R403_SEQUENCE_RESTARTED",
            Self::R404_EXITED => "R404_EXITED",
            Self::R501_TIMED_OUT => "R501_TIMED_OUT",
            Self::R502_PENALTY_STARTED => "R502_PENALTY_STARTED",
            Self::R601_REP_COUNTED => "R601_REP_COUNTED",
            Self::R602_LABEL_MASTERED => "R602_LABEL_MASTERED",
            Self::R603_ALL_MASTERED => "R603_ALL_MASTERED",
            Self::R604_TARGET_SELECTED => "R604_TARGET_SELECTED",
            Self::R701_CLIP_RECORDING => "R701_CLIP_RECORDING",
            Self::R702_CLIP_STOPPED => "R702_CLIP_STOPPED",
            Self::R703_CLIP_REJECTED => "R703_CLIP_REJECTED",
            Self::R704_CLIP_ACCEPTED => "R704_CLIP_ACCEPTED",
            Self::R705_CLIP_MISMATCH => "R705_CLIP_MISMATCH",
            Self::R706_CLIP_FAILED => "R706_CLIP_FAILED",
            Self::R707_CLIP_DISCARDED => "R707_CLIP_DISCARDED",
            Self::R801_FRAMING_HINT => "R801_FRAMING_HINT",
            Self::R802_FRAMING_PASSED => "R802_FRAMING_PASSED",
            Self::R901_LESSON_PASSED => "R901_LESSON_PASSED",
            Self::R902_LESSON_FAILED => "R902_LESSON_FAILED",
        }
    }

    /// Get human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::R101_HOLD_ACCUMULATING => "Holding the correct shape",
            Self::R102_HOLD_DECAYING => "Hold slipping",
            Self::R103_HOLD_STALE => "No hand detected",
            Self::R104_HOLD_CONFIRMED => "Letter confirmed",
            Self::R201_RELEASE_REQUIRED => "Release between letters",
            Self::R202_RELEASE_CLEARED => "Released",
            Self::R301_MISTAKE_COUNTED => "Wrong letter held",
            Self::R302_HINT_SUGGESTED => "Showing a hint",
            Self::R401_TARGET_STARTED => "Next target",
            Self::R402_SEQUENCE_COMPLETED => "Sequence complete",
            Self::R403_SEQUENCE_RESTARTED => "Restarting from the first letter",
            Self::R404_EXITED => "Lesson exited",
            Self::R501_TIMED_OUT => "Too slow",
            Self::R502_PENALTY_STARTED => "Short pause before retry",
            Self::R601_REP_COUNTED => "Repetition counted",
            Self::R602_LABEL_MASTERED => "Sign mastered",
            Self::R603_ALL_MASTERED => "All signs mastered",
            Self::R604_TARGET_SELECTED => "New target selected",
            Self::R701_CLIP_RECORDING => "Recording",
            Self::R702_CLIP_STOPPED => "Processing clip",
            Self::R703_CLIP_REJECTED => "Clip rejected",
            Self::R704_CLIP_ACCEPTED => "Clip matched",
            Self::R705_CLIP_MISMATCH => "Different sign detected",
            Self::R706_CLIP_FAILED => "Prediction failed, try again",
            Self::R707_CLIP_DISCARDED => "Outdated prediction ignored",
            Self::R801_FRAMING_HINT => "Adjust hand position",
            Self::R802_FRAMING_PASSED => "Camera calibration passed",
            Self::R901_LESSON_PASSED => "Lesson passed",
            Self::R902_LESSON_FAILED => "Lesson not passed",
        }
    }
}

impl std::fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code(), self.description())
    }
}
