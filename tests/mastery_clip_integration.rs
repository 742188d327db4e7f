//! Integration tests for clip recording and repetition mastery

use pretty_assertions::assert_eq;

use signcoach::core::{
    classify_pending, ClipClassifier, ClipController, ClipVerdict, MasteryTracker,
    ScriptedClassifier,
};
use signcoach::types::{
    Candidate, ClassifierError, ClipConfig, ClipError, ClipPhase, ClipPrediction, ClipRejection,
    ClipRequest, LessonEvent, MasteryConfig, SelectionPolicy,
};

fn words() -> Vec<String> {
    ["book", "drink", "go"].iter().map(|w| w.to_string()).collect()
}

fn record(clip: &mut ClipController, frames: usize, spacing_ms: u64) -> Vec<LessonEvent> {
    let mut out = clip.start(0).expect("start");
    for i in 0..frames {
        out.extend(
            clip.push_frame(i as u64 * spacing_ms, format!("frame-{}", i))
                .expect("recording"),
        );
    }
    out
}

/// Counters stay within the requirement and completion is reported once
#[test]
fn test_mastery_counts_only_current_target() {
    let config = MasteryConfig {
        required_reps: 2,
        min_score: 0.55,
        policy: SelectionPolicy::Sequential,
    };
    let mut mastery = MasteryTracker::new(words(), config, Some(3));
    assert_eq!(
        mastery.start(),
        vec![LessonEvent::TargetSelected {
            label: "book".into()
        }]
    );

    // Wrong label and weak score are ignored
    assert!(mastery.observe("drink", 0.9).is_empty());
    assert!(mastery.observe("book", 0.5).is_empty());
    assert_eq!(mastery.count("book"), 0);

    let events = mastery.observe("book", 0.9);
    assert_eq!(
        events[0],
        LessonEvent::RepCounted {
            label: "book".into(),
            count: 1,
            required: 2,
        }
    );
    let events = mastery.observe("book", 0.9);
    assert!(events.contains(&LessonEvent::LabelMastered {
        label: "book".into()
    }));
    assert_eq!(mastery.current_target(), Some("drink"));

    let mut all = Vec::new();
    for label in ["drink", "drink", "go", "go"] {
        all.extend(mastery.observe(label, 0.8));
    }
    let completions = all
        .iter()
        .filter(|e| matches!(e, LessonEvent::AllMastered))
        .count();
    assert_eq!(completions, 1);
    assert!(mastery.all_mastered());
    assert!(mastery.observe("go", 0.9).is_empty());
    assert!(mastery.counters().values().all(|count| *count == 2));
    assert_eq!(mastery.progress(), 1.0);
}

/// Only one label ever matching never completes the set
#[test]
fn test_single_label_stream_never_masters() {
    let config = MasteryConfig {
        required_reps: 3,
        min_score: 0.55,
        policy: SelectionPolicy::RandomNoRepeat,
    };
    let mut mastery = MasteryTracker::new(words(), config, Some(5));
    mastery.start();

    let mut events = Vec::new();
    for _ in 0..50 {
        events.extend(mastery.observe("book", 0.9));
    }
    assert!(mastery.count("book") <= 3);
    assert_eq!(mastery.count("drink"), 0);
    assert_eq!(mastery.count("go"), 0);
    assert!(!events.iter().any(|e| matches!(e, LessonEvent::AllMastered)));
    assert!(!mastery.all_mastered());
}

/// Too few frames are rejected locally and never reach the classifier
#[tokio::test]
async fn test_short_clip_never_submitted() {
    let mut clip = ClipController::new(ClipConfig::default());
    record(&mut clip, 5, 84);
    let events = clip.stop().expect("stop");
    assert_eq!(
        events,
        vec![LessonEvent::ClipRejected {
            rejection: ClipRejection {
                captured: 5,
                required: 12,
            }
        }]
    );
    assert_eq!(clip.phase(), ClipPhase::Idle);

    let classifier = ScriptedClassifier::new();
    assert!(classify_pending(&clip, &classifier, None).await.is_none());
}

/// Reaching the frame limit submits on its own
#[tokio::test]
async fn test_full_clip_auto_submits() {
    let mut clip = ClipController::new(ClipConfig::default());
    let events = record(&mut clip, 96, 84);
    assert_eq!(
        events.last(),
        Some(&LessonEvent::ClipStopped {
            ticket: 1,
            frames: 96,
            auto_stopped: true,
        })
    );
    assert_eq!(clip.phase(), ClipPhase::Submitting { ticket: 1 });
    assert_eq!(clip.start(9000), Err(ClipError::Busy { ticket: 1 }));

    let classifier = ScriptedClassifier::new();
    classifier.push(Ok(ClipPrediction::ranked(
        vec![Candidate::new("Book", 0.81), Candidate::new("go", 0.1)],
        0,
    )));
    let (ticket, answer) = classify_pending(&clip, &classifier, Some(words()))
        .await
        .expect("clip pending");
    let prediction = answer.expect("scripted answer");
    assert_eq!(ticket, 1);
    assert_eq!(prediction.frames_captured, 96);

    assert_eq!(
        clip.resolve(ticket, Ok(prediction.clone()), "book"),
        Ok(ClipVerdict::Accepted {
            label: "book".into(),
            score: 0.81,
        })
    );
    // Second answer for the same ticket is stale
    assert_eq!(
        clip.resolve(ticket, Ok(prediction), "book"),
        Err(ClipError::StaleTicket { ticket: 1 })
    );
}

/// Frames closer than the capture interval are dropped
#[test]
fn test_capture_rate_limit() {
    let mut clip = ClipController::new(ClipConfig::default());
    clip.start(0).expect("start");
    for t in (0..1000).step_by(20) {
        clip.push_frame(t, format!("frame-{}", t)).expect("recording");
    }
    assert_eq!(clip.frame_count(), 10);
}

/// Classifier failures and low scores resolve the clip without credit
#[tokio::test]
async fn test_failed_and_mismatched_answers() {
    let classifier = ScriptedClassifier::new();
    let request = ClipRequest {
        ticket: 1,
        frames: vec!["frame-0".into()],
        candidate_labels: None,
    };
    assert_eq!(
        classifier.classify(request).await,
        Err(ClassifierError::EmptyResponse)
    );

    let mut clip = ClipController::new(ClipConfig::default());
    record(&mut clip, 24, 84);
    clip.stop().expect("stop");
    let verdict = clip
        .resolve(
            1,
            Err(ClassifierError::Remote {
                message: "timeout".into(),
            }),
            "drink",
        )
        .expect("current ticket");
    assert!(matches!(verdict, ClipVerdict::Failed { .. }));

    record(&mut clip, 24, 84);
    clip.stop().expect("stop");
    let weak = ClipPrediction::ranked(vec![Candidate::new("drink", 0.3)], 24);
    assert_eq!(
        clip.resolve(2, Ok(weak), "drink"),
        Ok(ClipVerdict::Mismatch {
            detected: "drink".into(),
            score: 0.3,
        })
    );
}
