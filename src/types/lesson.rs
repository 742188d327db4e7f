//! Lesson plans and learner inputs

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::types::{ClipPrediction, LessonConfig, PlanError, RecognitionEvent};

/// Supported lesson formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LessonKind {
    /// Reading-only introduction
    Intro,
    /// Camera framing check
    Calibration,
    /// Guided letter-by-letter holds
    Interactive,
    /// Free practice until a success goal
    Gym,
    /// Timed per-letter exam
    FinalTest,
    /// Shuffled letters, first confident prediction counts
    InstantExam,
    /// Spell each word in a list
    FingerspellPractice,
    /// Timed word exam
    FingerspellTest,
    /// One word, restart on any slip
    InstantDrill,
    /// Clip signs, stay on a word until mastered
    DynamicGuided,
    /// Clip signs, random rotation
    DynamicMixed,
    /// Clip signs, one pass per word
    DynamicFinal,
}

impl LessonKind {
    /// Lessons that cannot run without targets
    pub fn needs_targets(&self) -> bool {
        !matches!(self, Self::Intro | Self::Calibration)
    }

    /// Lessons driven by recorded clips instead of per-frame predictions
    pub fn is_clip_based(&self) -> bool {
        matches!(
            self,
            Self::DynamicGuided | Self::DynamicMixed | Self::DynamicFinal
        )
    }
}

impl std::fmt::Display for LessonKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Intro => "intro",
            Self::Calibration => "calibration",
            Self::Interactive => "interactive",
            Self::Gym => "gym",
            Self::FinalTest => "final_test",
            Self::InstantExam => "instant_exam",
            Self::FingerspellPractice => "fingerspell_practice",
            Self::FingerspellTest => "fingerspell_test",
            Self::InstantDrill => "instant_drill",
            Self::DynamicGuided => "dynamic_guided",
            Self::DynamicMixed => "dynamic_mixed",
            Self::DynamicFinal => "dynamic_final",
        };
        write!(f, "{}", name)
    }
}

/// A lesson definition: what to practise and with which policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonPlan {
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub kind: LessonKind,
    /// Letters, words or dynamic-sign labels depending on `kind`
    #[serde(default)]
    pub targets: Vec<String>,
    #[serde(default)]
    pub config: LessonConfig,
}

impl LessonPlan {
    pub fn new(id: impl Into<String>, kind: LessonKind, targets: &[&str]) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            kind,
            targets: targets.iter().map(|t| t.to_string()).collect(),
            config: LessonConfig::default(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_config(mut self, config: LessonConfig) -> Self {
        self.config = config;
        self
    }

    /// Check the plan can drive its lesson kind
    pub fn validate(&self) -> Result<(), PlanError> {
        if self.kind.needs_targets() && self.targets.is_empty() {
            return Err(PlanError::NoTargets {
                lesson_id: self.id.clone(),
            });
        }
        if self.targets.iter().any(|t| t.trim().is_empty()) {
            return Err(PlanError::EmptyLabel {
                lesson_id: self.id.clone(),
            });
        }
        let (clip, mastery) = (self.config.clip.min_score, self.config.mastery.min_score);
        if self.kind.is_clip_based() && clip != mastery {
            return Err(PlanError::ScoreMismatch {
                lesson_id: self.id.clone(),
                clip,
                mastery,
            });
        }
        Ok(())
    }

    /// Parse and validate a plan from JSON text
    pub fn from_json_str(json: &str) -> Result<Self, PlanError> {
        let plan: Self = serde_json::from_str(json)?;
        plan.validate()?;
        Ok(plan)
    }

    /// Load and validate a plan from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, PlanError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| PlanError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&json)
    }
}

/// Everything the learner side can feed into a running lesson
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "input", rename_all = "snake_case")]
pub enum LessonInput {
    /// Per-frame classifier output
    Recognition(RecognitionEvent),
    /// Periodic timer tick
    Tick { now_ms: u64 },
    /// Raw landmarks for the framing check (`None` = no hand)
    Landmarks { now_ms: u64, landmarks: Option<Vec<f64>> },
    /// Learner jumped to a target
    Select { now_ms: u64, target: String },
    /// Learner finished reading
    Acknowledge { now_ms: u64 },
    /// Learner left; optionally start over
    Exit {
        now_ms: u64,
        #[serde(default)]
        restart: bool,
    },
    ClipStart { now_ms: u64 },
    ClipFrame { now_ms: u64, frame: String },
    ClipStop { now_ms: u64 },
    /// Classifier answer for a submitted clip
    ClipResult {
        ticket: u64,
        #[serde(default)]
        prediction: Option<ClipPrediction>,
        #[serde(default)]
        error: Option<String>,
    },
}

impl LessonInput {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Recognition(_) => "recognition",
            Self::Tick { .. } => "tick",
            Self::Landmarks { .. } => "landmarks",
            Self::Select { .. } => "select",
            Self::Acknowledge { .. } => "acknowledge",
            Self::Exit { .. } => "exit",
            Self::ClipStart { .. } => "clip_start",
            Self::ClipFrame { .. } => "clip_frame",
            Self::ClipStop { .. } => "clip_stop",
            Self::ClipResult { .. } => "clip_result",
        }
    }

    /// Lesson-clock time carried by the input, if any
    pub fn now_ms(&self) -> Option<u64> {
        match self {
            Self::Recognition(event) => Some(event.timestamp_ms),
            Self::Tick { now_ms }
            | Self::Landmarks { now_ms, .. }
            | Self::Select { now_ms, .. }
            | Self::Acknowledge { now_ms }
            | Self::Exit { now_ms, .. }
            | Self::ClipStart { now_ms }
            | Self::ClipFrame { now_ms, .. }
            | Self::ClipStop { now_ms } => Some(*now_ms),
            Self::ClipResult { .. } => None,
        }
    }
}
