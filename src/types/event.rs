//! Inbound recognition payloads

use serde::{Deserialize, Serialize};

/// Number of hand landmarks in one skeleton (x, y, z each)
pub const LANDMARK_COUNT: usize = 21;

/// One classifier output for static single-label recognition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognitionEvent {
    /// Predicted letter or word token
    pub label: String,
    /// Classifier confidence (0.0-1.0)
    pub confidence: f64,
    /// Arrival time on the lesson clock (milliseconds)
    pub timestamp_ms: u64,
    /// Flattened landmark positions, when the source provides them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub landmarks: Option<Vec<f64>>,
}

impl RecognitionEvent {
    /// Create an event without landmarks
    pub fn new(label: impl Into<String>, confidence: f64, timestamp_ms: u64) -> Self {
        Self {
            label: label.into(),
            confidence: confidence.clamp(0.0, 1.0),
            timestamp_ms,
            landmarks: None,
        }
    }

    /// Attach landmark positions
    pub fn with_landmarks(mut self, landmarks: Vec<f64>) -> Self {
        self.landmarks = Some(landmarks);
        self
    }

    /// Does this event name the given target?
    pub fn is_label(&self, target: &str) -> bool {
        self.label == target
    }
}

/// One ranked candidate from clip classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub label: String,
    pub score: f64,
}

impl Candidate {
    pub fn new(label: impl Into<String>, score: f64) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

/// Request handed to the external clip classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipRequest {
    /// Identity of the recording this request belongs to
    pub ticket: u64,
    /// Captured frame payloads, in capture order
    pub frames: Vec<String>,
    /// Restrict ranking to these labels, if set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidate_labels: Option<Vec<String>>,
}

/// Ranked response from the external clip classifier
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClipPrediction {
    pub ranked: Vec<Candidate>,
    pub frames_captured: usize,
    pub frames_used: usize,
}

impl ClipPrediction {
    /// Build a prediction from ranked candidates
    pub fn ranked(ranked: Vec<Candidate>, frames: usize) -> Self {
        Self {
            ranked,
            frames_captured: frames,
            frames_used: frames,
        }
    }

    /// Highest-ranked candidate
    pub fn top1(&self) -> Option<&Candidate> {
        self.ranked.first()
    }
}
