//! Clip recording and classification for motion-based signs
//!
//! State transitions:
//! - IDLE → RECORDING: start (refused while a request is in flight)
//! - RECORDING → IDLE: stop with too few frames (local rejection, no request)
//! - RECORDING → SUBMITTING(ticket): stop, or max frames reached
//! - SUBMITTING(ticket) → IDLE: classifier answered for `ticket`, or cancel
//!
//! Answers carrying any other ticket are stale and discarded.

use std::collections::VecDeque;
use std::sync::Mutex;

use futures_util::future::BoxFuture;
use tracing::{debug, warn};

use crate::types::{
    ClassifierError, ClipConfig, ClipError, ClipPhase, ClipPrediction, ClipRejection, ClipRequest,
    LessonEvent,
};

/// External clip classifier
pub trait ClipClassifier: Send + Sync {
    fn classify(&self, request: ClipRequest) -> BoxFuture<'_, Result<ClipPrediction, ClassifierError>>;
}

/// Classifier that replays queued answers (replay mode and tests)
#[derive(Debug, Default)]
pub struct ScriptedClassifier {
    answers: Mutex<VecDeque<Result<ClipPrediction, ClassifierError>>>,
}

impl ScriptedClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, answer: Result<ClipPrediction, ClassifierError>) {
        if let Ok(mut answers) = self.answers.lock() {
            answers.push_back(answer);
        }
    }
}

impl ClipClassifier for ScriptedClassifier {
    fn classify(&self, request: ClipRequest) -> BoxFuture<'_, Result<ClipPrediction, ClassifierError>> {
        let answer = self
            .answers
            .lock()
            .ok()
            .and_then(|mut answers| answers.pop_front())
            .unwrap_or(Err(ClassifierError::EmptyResponse));
        let frames = request.frames.len();
        Box::pin(async move {
            answer.map(|mut prediction| {
                if prediction.frames_captured == 0 {
                    prediction.frames_captured = frames;
                    prediction.frames_used = frames;
                }
                prediction
            })
        })
    }
}

/// Interpretation of a classifier answer against the target
#[derive(Debug, Clone, PartialEq)]
pub enum ClipVerdict {
    Accepted { label: String, score: f64 },
    Mismatch { detected: String, score: f64 },
    Failed { message: String },
}

impl ClipVerdict {
    pub fn to_event(&self, target: &str) -> LessonEvent {
        match self {
            Self::Accepted { label, score } => LessonEvent::ClipAccepted {
                label: label.clone(),
                score: *score,
            },
            Self::Mismatch { detected, score } => LessonEvent::ClipMismatch {
                target: target.to_string(),
                detected: detected.clone(),
                score: *score,
            },
            Self::Failed { message } => LessonEvent::ClipFailed {
                message: message.clone(),
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClipController {
    config: ClipConfig,
    phase: ClipPhase,
    frames: Vec<String>,
    ticket: u64,
    last_capture_ms: Option<u64>,
}

impl ClipController {
    pub fn new(config: ClipConfig) -> Self {
        Self {
            config,
            phase: ClipPhase::Idle,
            frames: Vec::new(),
            ticket: 0,
            last_capture_ms: None,
        }
    }

    /// Begin a new recording
    pub fn start(&mut self, now_ms: u64) -> Result<Vec<LessonEvent>, ClipError> {
        match self.phase {
            ClipPhase::Submitting { ticket } => Err(ClipError::Busy { ticket }),
            ClipPhase::Recording => Ok(Vec::new()),
            ClipPhase::Idle => {
                self.ticket += 1;
                self.frames.clear();
                self.last_capture_ms = None;
                self.phase = ClipPhase::Recording;
                debug!(ticket = self.ticket, at_ms = now_ms, "clip recording");
                Ok(vec![LessonEvent::ClipStarted {
                    ticket: self.ticket,
                }])
            }
        }
    }

    /// Offer a frame; frames faster than the capture rate are dropped
    pub fn push_frame(&mut self, now_ms: u64, frame: String) -> Result<Vec<LessonEvent>, ClipError> {
        if self.phase != ClipPhase::Recording {
            return Err(ClipError::NotRecording);
        }
        if let Some(last) = self.last_capture_ms {
            if now_ms.saturating_sub(last) < self.config.capture_interval_ms() {
                return Ok(Vec::new());
            }
        }
        self.last_capture_ms = Some(now_ms);
        self.frames.push(frame);
        if self.frames.len() >= self.config.max_frames {
            return Ok(self.finish(true));
        }
        Ok(Vec::new())
    }

    /// End the recording explicitly
    pub fn stop(&mut self) -> Result<Vec<LessonEvent>, ClipError> {
        if self.phase != ClipPhase::Recording {
            return Err(ClipError::NotRecording);
        }
        Ok(self.finish(false))
    }

    fn finish(&mut self, auto_stopped: bool) -> Vec<LessonEvent> {
        let captured = self.frames.len();
        if captured < self.config.min_frames {
            self.frames.clear();
            self.phase = ClipPhase::Idle;
            debug!(captured, required = self.config.min_frames, "clip too short");
            return vec![LessonEvent::ClipRejected {
                rejection: ClipRejection {
                    captured,
                    required: self.config.min_frames,
                },
            }];
        }
        self.phase = ClipPhase::Submitting {
            ticket: self.ticket,
        };
        vec![LessonEvent::ClipStopped {
            ticket: self.ticket,
            frames: captured,
            auto_stopped,
        }]
    }

    /// Request for the clip awaiting classification
    pub fn pending_request(&self, candidate_labels: Option<Vec<String>>) -> Option<ClipRequest> {
        match self.phase {
            ClipPhase::Submitting { ticket } => Some(ClipRequest {
                ticket,
                frames: self.frames.clone(),
                candidate_labels,
            }),
            _ => None,
        }
    }

    /// Apply the classifier answer for `ticket`
    pub fn resolve(
        &mut self,
        ticket: u64,
        result: Result<ClipPrediction, ClassifierError>,
        target: &str,
    ) -> Result<ClipVerdict, ClipError> {
        if self.phase != (ClipPhase::Submitting { ticket }) {
            warn!(ticket, phase = %self.phase, "stale clip result discarded");
            return Err(ClipError::StaleTicket { ticket });
        }
        self.frames.clear();
        self.phase = ClipPhase::Idle;

        let prediction = match result {
            Ok(prediction) => prediction,
            Err(err) => {
                warn!(ticket, error = %err, "clip classification failed");
                return Ok(ClipVerdict::Failed {
                    message: err.to_string(),
                });
            }
        };
        let Some(top) = prediction.top1() else {
            warn!(ticket, "classifier returned no candidates");
            return Ok(ClipVerdict::Failed {
                message: ClassifierError::EmptyResponse.to_string(),
            });
        };
        if top.label.eq_ignore_ascii_case(target) && top.score >= self.config.min_score {
            Ok(ClipVerdict::Accepted {
                label: target.to_string(),
                score: top.score,
            })
        } else {
            Ok(ClipVerdict::Mismatch {
                detected: top.label.clone(),
                score: top.score,
            })
        }
    }

    /// Drop the recording or in-flight request
    pub fn cancel(&mut self) -> Vec<LessonEvent> {
        let ticket = self.ticket;
        let was_active = self.phase != ClipPhase::Idle;
        self.frames.clear();
        self.phase = ClipPhase::Idle;
        if was_active {
            debug!(ticket, "clip discarded");
            vec![LessonEvent::ClipDiscarded { ticket }]
        } else {
            Vec::new()
        }
    }

    pub fn phase(&self) -> ClipPhase {
        self.phase
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn ticket(&self) -> u64 {
        self.ticket
    }
}

/// Run the pending request through `classifier`, returning its ticket and answer
pub async fn classify_pending(
    controller: &ClipController,
    classifier: &dyn ClipClassifier,
    candidate_labels: Option<Vec<String>>,
) -> Option<(u64, Result<ClipPrediction, ClassifierError>)> {
    let request = controller.pending_request(candidate_labels)?;
    let ticket = request.ticket;
    Some((ticket, classifier.classify(request).await))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Candidate;

    fn record(clip: &mut ClipController, frames: usize) -> Vec<LessonEvent> {
        let interval = clip.config.capture_interval_ms();
        let mut out = clip.start(0).expect("start");
        for i in 0..frames {
            out.extend(clip.push_frame(i as u64 * interval, format!("f{}", i)).expect("frame"));
        }
        out
    }

    fn prediction(label: &str, score: f64) -> ClipPrediction {
        ClipPrediction::ranked(vec![Candidate::new(label, score), Candidate::new("go", 0.1)], 24)
    }

    #[test]
    fn test_short_clip_rejected_locally() {
        let mut clip = ClipController::new(ClipConfig::default());
        record(&mut clip, 5);
        let events = clip.stop().expect("stop");
        assert_eq!(
            events,
            vec![LessonEvent::ClipRejected {
                rejection: ClipRejection {
                    captured: 5,
                    required: 12
                }
            }]
        );
        assert_eq!(clip.phase(), ClipPhase::Idle);
        assert!(clip.pending_request(None).is_none());
    }

    #[test]
    fn test_max_frames_auto_stops() {
        let mut clip = ClipController::new(ClipConfig::default());
        let events = record(&mut clip, 96);
        assert!(events.contains(&LessonEvent::ClipStopped {
            ticket: 1,
            frames: 96,
            auto_stopped: true
        }));
        assert_eq!(clip.phase(), ClipPhase::Submitting { ticket: 1 });
        assert_eq!(clip.push_frame(10_000, "late".into()), Err(ClipError::NotRecording));
    }

    #[test]
    fn test_frames_faster_than_rate_dropped() {
        let mut clip = ClipController::new(ClipConfig::default());
        clip.start(0).expect("start");
        clip.push_frame(0, "a".into()).expect("frame");
        clip.push_frame(20, "b".into()).expect("frame");
        clip.push_frame(83, "c".into()).expect("frame");
        assert_eq!(clip.frame_count(), 2);
    }

    #[test]
    fn test_busy_while_submitting() {
        let mut clip = ClipController::new(ClipConfig::default());
        record(&mut clip, 20);
        clip.stop().expect("stop");
        assert_eq!(clip.start(5000), Err(ClipError::Busy { ticket: 1 }));
    }

    #[test]
    fn test_resolve_accepts_matching_top1() {
        let mut clip = ClipController::new(ClipConfig::default());
        record(&mut clip, 20);
        clip.stop().expect("stop");
        let verdict = clip.resolve(1, Ok(prediction("BOOK", 0.8)), "book");
        assert_eq!(
            verdict,
            Ok(ClipVerdict::Accepted {
                label: "book".into(),
                score: 0.8
            })
        );
        assert_eq!(clip.phase(), ClipPhase::Idle);
    }

    #[test]
    fn test_low_score_is_mismatch() {
        let mut clip = ClipController::new(ClipConfig::default());
        record(&mut clip, 20);
        clip.stop().expect("stop");
        let verdict = clip.resolve(1, Ok(prediction("book", 0.4)), "book").expect("verdict");
        assert!(matches!(verdict, ClipVerdict::Mismatch { .. }));
    }

    #[test]
    fn test_failure_returns_to_idle() {
        let mut clip = ClipController::new(ClipConfig::default());
        record(&mut clip, 20);
        clip.stop().expect("stop");
        let err = ClassifierError::Remote {
            message: "503".into(),
        };
        let verdict = clip.resolve(1, Err(err), "book").expect("verdict");
        assert!(matches!(verdict, ClipVerdict::Failed { .. }));
        assert!(clip.start(6000).is_ok());
    }

    #[test]
    fn test_empty_ranking_is_failure() {
        let mut clip = ClipController::new(ClipConfig::default());
        record(&mut clip, 20);
        clip.stop().expect("stop");
        let verdict = clip.resolve(1, Ok(ClipPrediction::default()), "book");
        assert_eq!(
            verdict,
            Ok(ClipVerdict::Failed {
                message: "no prediction returned".into()
            })
        );
    }

    #[test]
    fn test_stale_ticket_after_cancel() {
        let mut clip = ClipController::new(ClipConfig::default());
        record(&mut clip, 20);
        clip.stop().expect("stop");
        assert_eq!(clip.cancel(), vec![LessonEvent::ClipDiscarded { ticket: 1 }]);
        assert_eq!(
            clip.resolve(1, Ok(prediction("book", 0.9)), "book"),
            Err(ClipError::StaleTicket { ticket: 1 })
        );
    }

    #[tokio::test]
    async fn test_scripted_classifier_round_trip() {
        let classifier = ScriptedClassifier::new();
        classifier.push(Ok(ClipPrediction::ranked(vec![Candidate::new("drink", 0.7)], 0)));
        let mut clip = ClipController::new(ClipConfig::default());
        record(&mut clip, 30);
        clip.stop().expect("stop");

        let (ticket, answer) = classify_pending(&clip, &classifier, None)
            .await
            .expect("pending");
        assert_eq!(answer.as_ref().map(|p| p.frames_captured), Ok(30));
        let verdict = clip.resolve(ticket, answer, "drink").expect("verdict");
        assert!(matches!(verdict, ClipVerdict::Accepted { .. }));

        // Nothing queued: empty response
        record(&mut clip, 30);
        clip.stop().expect("stop");
        let (_, answer) = classify_pending(&clip, &classifier, None)
            .await
            .expect("pending");
        assert_eq!(answer, Err(ClassifierError::EmptyResponse));
    }
}
