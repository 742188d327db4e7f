//! Core types for Signcoach

mod config;
mod error;
mod event;
mod lesson;
mod output;
mod reason;
mod result;
mod state;

pub use config::{
    ClipConfig, FramingConfig, FramingZone, HoldConfig, LessonConfig, MasteryConfig,
    MistakeConfig, SelectionPolicy, SequenceConfig, TimeoutPolicy, TimerConfig, TimerScope,
};
pub use error::{ClassifierError, ClipError, LessonError, PlanError, ScriptError};
pub use event::{Candidate, ClipPrediction, ClipRequest, RecognitionEvent, LANDMARK_COUNT};
pub use lesson::{LessonInput, LessonKind, LessonPlan};
pub use output::{ClipRejection, FramingHint, LessonEvent, StatusOutput};
pub use reason::ReasonCode;
pub use result::{AttemptResult, AttemptStatus, LessonResult, LessonScore};
pub use state::{ClipPhase, SequencePhase, TimerState};
