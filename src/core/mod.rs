//! Core modules for Signcoach

pub mod hold;
pub mod release;
pub mod mistake;
pub mod sequence;
pub mod timed;
pub mod selection;
pub mod mastery;
pub mod clip;
pub mod framing;
pub mod drills;
pub mod lesson;
pub mod curriculum;
pub mod script;
pub mod api;

pub use hold::{HoldMeter, HoldStep, HoldTracker};
pub use release::ReleaseGate;
pub use mistake::MistakeDetector;
pub use sequence::SequenceController;
pub use timed::{TimedAttempt, TimedSequence};
pub use selection::{draw, rng_from_seed, shuffled, TargetSelector};
pub use mastery::MasteryTracker;
pub use clip::{classify_pending, ClipClassifier, ClipController, ClipVerdict, ScriptedClassifier};
pub use framing::{FramingCheck, HandBounds};
pub use drills::{ClipDrill, Drill, GymDrill, InteractiveDrill, SpellingDrill, TimedDrill};
pub use lesson::{passes, LessonOrchestrator, LessonOutcome, MemoryProgressStore, ProgressStore};
pub use script::{Script, ScriptItem};
pub use api::{create_router, run_server, AppState};
