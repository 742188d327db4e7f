//! Controller configuration
//!
//! Every struct deserializes from partial JSON: missing fields fall back to
//! the crate-root defaults.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    CLIP_CAPTURE_FPS, CLIP_MAX_FRAMES, CLIP_MIN_FRAMES, CLIP_MIN_SCORE, CONFIRM_COOLDOWN_MS,
    DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_DECAY_FACTOR, DEFAULT_HOLD_MS, HINT_AFTER_MS,
    LESSON_XP, MIN_DELTA_MS, MISTAKE_CONFIDENCE_THRESHOLD, MISTAKE_RATE_LIMIT_MS,
    MISTAKE_SUSTAIN_MS, NEUTRAL_CONFIDENCE, STALE_AFTER_MS,
};

/// Hold-to-confirm parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HoldConfig {
    /// Continuous hold needed to confirm (milliseconds)
    pub required_hold_ms: u64,
    /// Confidence a matching prediction must exceed
    pub confidence_threshold: f64,
    /// Per-label overrides of `confidence_threshold`
    pub label_thresholds: BTreeMap<String, f64>,
    /// Decay multiplier applied while the signal is lost
    pub decay_factor: f64,
    /// Smallest credited/debited step (milliseconds)
    pub min_delta_ms: u64,
    /// Quiet period after which the stream counts as "no hand" (milliseconds)
    pub stale_after_ms: u64,
}

impl Default for HoldConfig {
    fn default() -> Self {
        Self {
            required_hold_ms: DEFAULT_HOLD_MS,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            label_thresholds: BTreeMap::new(),
            decay_factor: DEFAULT_DECAY_FACTOR,
            min_delta_ms: MIN_DELTA_MS,
            stale_after_ms: STALE_AFTER_MS,
        }
    }
}

impl HoldConfig {
    /// Effective confidence threshold for a target label
    pub fn threshold_for(&self, label: &str) -> f64 {
        self.label_thresholds
            .get(label)
            .copied()
            .unwrap_or(self.confidence_threshold)
    }

    pub fn with_hold_ms(mut self, required_hold_ms: u64) -> Self {
        self.required_hold_ms = required_hold_ms;
        self
    }

    pub fn with_threshold(mut self, confidence_threshold: f64) -> Self {
        self.confidence_threshold = confidence_threshold;
        self
    }

    pub fn with_label_threshold(mut self, label: &str, threshold: f64) -> Self {
        self.label_thresholds.insert(label.to_string(), threshold);
        self
    }

    pub fn with_decay(mut self, decay_factor: f64) -> Self {
        self.decay_factor = decay_factor;
        self
    }

    pub fn with_stale_after(mut self, stale_after_ms: u64) -> Self {
        self.stale_after_ms = stale_after_ms;
        self
    }
}

/// Sustained-wrong-letter detection parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MistakeConfig {
    /// Wrong label must exceed this confidence
    pub confidence_threshold: f64,
    /// Same wrong label held this long counts once (milliseconds)
    pub sustain_ms: u64,
    /// Minimum spacing between counted mistakes (milliseconds)
    pub rate_limit_ms: u64,
}

impl Default for MistakeConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: MISTAKE_CONFIDENCE_THRESHOLD,
            sustain_ms: MISTAKE_SUSTAIN_MS,
            rate_limit_ms: MISTAKE_RATE_LIMIT_MS,
        }
    }
}

/// Sequence-level parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceConfig {
    pub hold: HoldConfig,
    pub mistake: MistakeConfig,
    /// Release gate clears below this confidence
    pub neutral_confidence: f64,
    /// Input freeze after each confirmation (milliseconds)
    pub cooldown_ms: u64,
    /// Suggest a hint after this long without a correct prediction
    pub hint_after_ms: Option<u64>,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            hold: HoldConfig::default(),
            mistake: MistakeConfig::default(),
            neutral_confidence: NEUTRAL_CONFIDENCE,
            cooldown_ms: CONFIRM_COOLDOWN_MS,
            hint_after_ms: Some(HINT_AFTER_MS),
        }
    }
}

/// What a deadline covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerScope {
    /// Re-armed for every target
    PerTarget,
    /// One deadline for the whole sequence
    WholeSequence,
}

/// What happens when a deadline passes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum TimeoutPolicy {
    /// Record a fail and move on to the next target
    Advance,
    /// Same target again after a pause
    Retry { penalty_ms: u64 },
    /// Whole sequence again after a pause
    Restart { penalty_ms: u64 },
}

/// Deadline parameters for timed attempts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerConfig {
    pub duration_ms: u64,
    pub scope: TimerScope,
    pub on_timeout: TimeoutPolicy,
    /// A counted mistake is handled like a timeout
    pub restart_on_mistake: bool,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            duration_ms: crate::FINAL_TEST_LETTER_MS,
            scope: TimerScope::PerTarget,
            on_timeout: TimeoutPolicy::Advance,
            restart_on_mistake: false,
        }
    }
}

/// How the next target is picked in a rotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// Stay on a label until mastered, then the first unmastered one
    Sequential,
    /// Cycle through labels in order, skipping mastered ones
    RoundRobin,
    /// Uniform among unmastered labels, never the same twice in a row
    RandomNoRepeat,
}

/// Repetition-mastery parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MasteryConfig {
    pub required_reps: u32,
    pub min_score: f64,
    pub policy: SelectionPolicy,
}

impl Default for MasteryConfig {
    fn default() -> Self {
        Self {
            required_reps: 3,
            min_score: CLIP_MIN_SCORE,
            policy: SelectionPolicy::Sequential,
        }
    }
}

/// Clip recording parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClipConfig {
    pub capture_fps: u32,
    pub min_frames: usize,
    pub max_frames: usize,
    pub min_score: f64,
}

impl Default for ClipConfig {
    fn default() -> Self {
        Self {
            capture_fps: CLIP_CAPTURE_FPS,
            min_frames: CLIP_MIN_FRAMES,
            max_frames: CLIP_MAX_FRAMES,
            min_score: CLIP_MIN_SCORE,
        }
    }
}

impl ClipConfig {
    /// Minimum spacing between captured frames (milliseconds)
    pub fn capture_interval_ms(&self) -> u64 {
        1000 / u64::from(self.capture_fps.max(1))
    }
}

/// Normalised camera-space rectangle the hand must stay inside
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FramingZone {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Default for FramingZone {
    fn default() -> Self {
        Self {
            min_x: 0.2,
            max_x: 0.8,
            min_y: 0.16,
            max_y: 0.84,
        }
    }
}

/// Camera calibration parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FramingConfig {
    pub zone: FramingZone,
    pub tolerance: f64,
    pub required_hold_ms: u64,
    pub decay_factor: f64,
    pub min_delta_ms: u64,
}

impl Default for FramingConfig {
    fn default() -> Self {
        Self {
            zone: FramingZone::default(),
            tolerance: 0.012,
            required_hold_ms: 2000,
            decay_factor: 1.5,
            min_delta_ms: MIN_DELTA_MS,
        }
    }
}

/// Everything a lesson needs, bundled
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LessonConfig {
    pub sequence: SequenceConfig,
    pub timer: Option<TimerConfig>,
    pub mastery: MasteryConfig,
    pub clip: ClipConfig,
    pub framing: FramingConfig,
    /// Total confirmations that complete a free-practice lesson
    pub success_goal: u32,
    /// Share of targets that must pass (final test)
    pub pass_ratio: f64,
    /// Absolute number of targets that must pass (spelling test)
    pub pass_count: Option<usize>,
    /// Number of words drawn for a spelling test
    pub draw_count: Option<usize>,
    /// Shuffle target order at lesson start
    pub shuffle: bool,
    /// Rotation between targets in free practice
    pub rotation: SelectionPolicy,
    /// Seed for shuffles and random rotations
    pub seed: Option<u64>,
    pub xp: u32,
}

impl Default for LessonConfig {
    fn default() -> Self {
        Self {
            sequence: SequenceConfig::default(),
            timer: None,
            mastery: MasteryConfig::default(),
            clip: ClipConfig::default(),
            framing: FramingConfig::default(),
            success_goal: 10,
            pass_ratio: 1.0,
            pass_count: None,
            draw_count: None,
            shuffle: false,
            rotation: SelectionPolicy::RoundRobin,
            seed: None,
            xp: LESSON_XP,
        }
    }
}
