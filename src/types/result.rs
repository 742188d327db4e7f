//! Attempt and lesson outcomes

use serde::{Deserialize, Serialize};

/// Outcome of one target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    Pass,
    Fail,
}

/// Per-target outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptResult {
    pub target: String,
    pub status: AttemptStatus,
    /// Time from target start to resolution (milliseconds)
    pub duration_ms: u64,
    /// Tries spent on the target (clip exams count every submitted clip)
    pub attempts: u32,
}

impl AttemptResult {
    pub fn pass(target: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            target: target.into(),
            status: AttemptStatus::Pass,
            duration_ms,
            attempts: 1,
        }
    }

    pub fn fail(target: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            target: target.into(),
            status: AttemptStatus::Fail,
            duration_ms,
            attempts: 1,
        }
    }

    pub fn passed(&self) -> bool {
        self.status == AttemptStatus::Pass
    }
}

/// Aggregate pass count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonScore {
    pub passed_count: usize,
    pub total: usize,
}

impl LessonScore {
    pub fn new(passed_count: usize, total: usize) -> Self {
        Self { passed_count, total }
    }

    /// Passed share (0.0 for an empty lesson)
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.passed_count as f64 / self.total as f64
        }
    }
}

impl std::fmt::Display for LessonScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.passed_count, self.total)
    }
}

/// Ordered attempt outcomes of one lesson run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LessonResult {
    pub attempts: Vec<AttemptResult>,
    pub mistake_count: u32,
}

impl LessonResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, attempt: AttemptResult) {
        self.attempts.push(attempt);
    }

    pub fn passed_count(&self) -> usize {
        self.attempts.iter().filter(|a| a.passed()).count()
    }

    pub fn score(&self) -> LessonScore {
        LessonScore::new(self.passed_count(), self.attempts.len())
    }

    /// Targets that did not pass, in attempt order
    pub fn failed_targets(&self) -> Vec<&str> {
        self.attempts
            .iter()
            .filter(|a| !a.passed())
            .map(|a| a.target.as_str())
            .collect()
    }

    pub fn total_duration_ms(&self) -> u64 {
        self.attempts.iter().map(|a| a.duration_ms).sum()
    }
}
