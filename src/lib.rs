//! Signcoach: gesture-recognition lesson engine
//!
//! Turns a stream of classifier predictions (letter or word label + confidence)
//! into lesson progress: hold-to-confirm letters, fingerspelled words with
//! release detection, mistake tallies, timed exams, mastery rotations and
//! clip-based dynamic signs.

pub mod core;
pub mod types;

// =============================================================================
// HOLD CONFIRMATION [C]
// =============================================================================

/// Continuous hold needed before a letter counts (fingerspelling)
pub const DEFAULT_HOLD_MS: u64 = 150;

/// Confidence a matching prediction must exceed to accumulate hold
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.75;

/// Losing the signal costs twice what holding it earns
pub const DEFAULT_DECAY_FACTOR: f64 = 2.0;

/// Smallest time step credited or debited per event/tick (milliseconds)
pub const MIN_DELTA_MS: u64 = 16;

/// No prediction for this long is treated as "no hand" (milliseconds)
pub const STALE_AFTER_MS: u64 = 1000;

// =============================================================================
// RELEASE / MISTAKES [C]
// =============================================================================

/// Confidence below which a repeated letter counts as released
pub const NEUTRAL_CONFIDENCE: f64 = 0.4;

/// Wrong label must exceed this confidence to be tracked as a mistake
pub const MISTAKE_CONFIDENCE_THRESHOLD: f64 = 0.85;

/// Wrong label must be sustained this long to count (milliseconds)
pub const MISTAKE_SUSTAIN_MS: u64 = 1000;

/// Minimum spacing between two counted mistakes (milliseconds)
pub const MISTAKE_RATE_LIMIT_MS: u64 = 1000;

/// No correct prediction for this long suggests a ghost hint (milliseconds)
pub const HINT_AFTER_MS: u64 = 5000;

// =============================================================================
// SEQUENCE / TIMERS [C]
// =============================================================================

/// Input freeze after a confirmed letter (milliseconds)
pub const CONFIRM_COOLDOWN_MS: u64 = 500;

/// Per-letter deadline in the timed final test (milliseconds)
pub const FINAL_TEST_LETTER_MS: u64 = 10_000;

/// Hold needed in the timed final test (milliseconds)
pub const FINAL_TEST_HOLD_MS: u64 = 750;

/// Share of letters that must pass the final test
pub const FINAL_TEST_PASS_RATIO: f64 = 0.9;

/// Per-word deadline in the fingerspelling test (milliseconds)
pub const SPELLING_TEST_WORD_MS: u64 = 20_000;

/// Words drawn for the fingerspelling test
pub const SPELLING_TEST_WORDS: usize = 5;

/// Words that must pass the fingerspelling test
pub const SPELLING_TEST_PASS_COUNT: usize = 4;

/// Per-letter deadline in instant drills (milliseconds)
pub const INSTANT_LETTER_MS: u64 = 2000;

/// Most expiries a single input may resolve while catching up on a gap
pub const TIMER_CATCH_UP_LIMIT: usize = 256;

// =============================================================================
// MASTERY / CLIPS [C]
// =============================================================================

/// Minimum top-1 score for a clip to count
pub const CLIP_MIN_SCORE: f64 = 0.55;

/// Clip capture rate (frames per second)
pub const CLIP_CAPTURE_FPS: u32 = 12;

/// Shortest clip that is worth classifying
pub const CLIP_MIN_FRAMES: usize = 12;

/// Recording stops on its own at this many frames
pub const CLIP_MAX_FRAMES: usize = 96;

/// Bounded retries when drawing a target different from the previous one
pub const SELECTION_RETRIES: u32 = 10;

/// XP credited to the learner on lesson completion
pub const LESSON_XP: u32 = 50;

// =============================================================================
// VERSION
// =============================================================================

pub const VERSION: &str = "1.0.0";
