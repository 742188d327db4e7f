//! Error types

/// Misuse of the clip recording controller
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClipError {
    #[error("a classification request is still in flight (ticket {ticket})")]
    Busy { ticket: u64 },

    #[error("not recording")]
    NotRecording,

    #[error("ticket {ticket} does not belong to the current recording")]
    StaleTicket { ticket: u64 },
}

/// Failure reported by the external clip classifier
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClassifierError {
    #[error("classifier request failed: {message}")]
    Remote { message: String },

    #[error("no prediction returned")]
    EmptyResponse,
}

/// Invalid or unreadable lesson plan
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("lesson {lesson_id} has no targets")]
    NoTargets { lesson_id: String },

    #[error("lesson {lesson_id} has an empty target label")]
    EmptyLabel { lesson_id: String },

    #[error("lesson {lesson_id} accepts clips at {clip} but counts reps at {mastery}")]
    ScoreMismatch {
        lesson_id: String,
        clip: f64,
        mastery: f64,
    },

    #[error("failed to read plan {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid plan JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Unparseable event-script token
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScriptError {
    #[error("unrecognised token {token:?} at position {position}")]
    BadToken { token: String, position: usize },

    #[error("confidence {value} out of range in {token:?}")]
    BadConfidence { token: String, value: f64 },
}

/// Input a running lesson cannot accept
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LessonError {
    #[error(transparent)]
    Clip(#[from] ClipError),

    #[error("{input} is not supported by this lesson")]
    Unsupported { input: &'static str },

    #[error("unknown target {target:?}")]
    UnknownTarget { target: String },

    #[error("lesson has not started")]
    NotStarted,
}
