//! Integration tests for hold confirmation and word sequences
//!
//! Tests the full path: script → RecognitionEvent stream → SequenceController → events

use pretty_assertions::assert_eq;
use signcoach::core::script::{self, ScriptItem};
use signcoach::core::{HoldStep, HoldTracker, SequenceController};
use signcoach::types::{
    HoldConfig, LessonEvent, LessonInput, RecognitionEvent, SequenceConfig, SequencePhase,
};

/// Run a script through a controller, collecting every emitted event
fn replay(seq: &mut SequenceController, text: &str, start_ms: u64) -> Vec<LessonEvent> {
    let script = script::parse_with(text, start_ms, script::SCRIPT_CADENCE_MS).expect("script");
    let mut out = Vec::new();
    for item in script.items {
        match item {
            ScriptItem::Input(LessonInput::Recognition(event)) => out.extend(seq.on_event(&event)),
            ScriptItem::Input(LessonInput::Tick { now_ms }) => out.extend(seq.tick(now_ms)),
            other => panic!("unexpected script item {:?}", other),
        }
    }
    out
}

fn completions(events: &[LessonEvent]) -> Vec<&LessonEvent> {
    events
        .iter()
        .filter(|e| matches!(e, LessonEvent::SequenceCompleted { .. }))
        .collect()
}

/// Matching stream: hold never shrinks and confirms exactly once
#[test]
fn test_hold_monotonic_until_confirmed() {
    let mut tracker = HoldTracker::new(HoldConfig::default().with_hold_ms(600), "A");
    let mut previous = 0.0;
    let mut confirmed = 0;
    for t in (0..3000).step_by(40) {
        let step = tracker.on_event(&RecognitionEvent::new("A", 0.9, t));
        if step == HoldStep::Confirmed {
            confirmed += 1;
        }
        assert!(tracker.accumulated_ms() >= previous);
        previous = tracker.accumulated_ms();
    }
    assert_eq!(confirmed, 1);
    assert!(tracker.is_confirmed());
}

/// Equal good and bad time never confirms when decay outweighs accumulation
#[test]
fn test_decay_asymmetry_never_confirms() {
    let mut tracker = HoldTracker::new(HoldConfig::default().with_hold_ms(150), "A");
    for (i, t) in (0..10_000).step_by(50).enumerate() {
        let label = if i % 2 == 0 { "A" } else { "B" };
        assert_ne!(
            tracker.on_event(&RecognitionEvent::new(label, 0.9, t)),
            HoldStep::Confirmed
        );
    }
    assert!(tracker.accumulated_ms() <= 50.0);
}

/// Repeated letters need a release between them
#[test]
fn test_double_letter_needs_release() {
    let mut seq = SequenceController::for_word("LL", SequenceConfig::default());
    seq.start(0);
    let events = replay(&mut seq, "L@0.9(2000ms)", 0);
    let confirmed: Vec<usize> = events
        .iter()
        .filter_map(|e| match e {
            LessonEvent::HoldConfirmed { index, .. } => Some(*index),
            _ => None,
        })
        .collect();
    assert_eq!(confirmed, vec![0]);
    assert!(events.contains(&LessonEvent::ReleaseRequired { target: "L".into() }));
    assert_eq!(seq.phase(), SequencePhase::Active { index: 1 });

    let events = replay(&mut seq, "~(100ms) L@0.9(400ms)", 2000);
    assert!(events.contains(&LessonEvent::ReleaseCleared { target: "L".into() }));
    assert_eq!(completions(&events).len(), 1);
}

/// TEN with neutral gaps completes once with no mistakes
#[test]
fn test_ten_completes_once() {
    let mut seq = SequenceController::for_word("TEN", SequenceConfig::default());
    let mut events = seq.start(0);
    events.extend(replay(
        &mut seq,
        "T@0.9(600ms) _(300ms) E@0.9(600ms) _(300ms) N@0.9(600ms)",
        0,
    ));
    assert_eq!(
        completions(&events),
        vec![&LessonEvent::SequenceCompleted {
            elapsed_ms: 1950,
            mistake_count: 0
        }]
    );

    // Completion is latched
    let late = replay(&mut seq, "N@0.9(1000ms) _(500ms)", 2400);
    assert!(completions(&late).is_empty());
    assert!(seq.is_completed());
}

/// A sustained wrong letter counts once, then T still confirms
#[test]
fn test_sustained_wrong_letter_counts_once() {
    let mut seq = SequenceController::for_word("TEN", SequenceConfig::default());
    seq.start(0);
    let events = replay(
        &mut seq,
        "A@0.95(1200ms) T@0.9(600ms) _(300ms) E@0.9(600ms) _(300ms) N@0.9(600ms)",
        0,
    );
    let mistakes = events
        .iter()
        .filter(|e| matches!(e, LessonEvent::MistakeCounted { .. }))
        .count();
    assert_eq!(mistakes, 1);
    assert!(events.contains(&LessonEvent::HoldConfirmed {
        index: 0,
        target: "T".into(),
        at_ms: 1300,
    }));
    match completions(&events).as_slice() {
        [LessonEvent::SequenceCompleted { mistake_count, .. }] => assert_eq!(*mistake_count, 1),
        other => panic!("expected one completion, got {:?}", other),
    }
}

/// Low confidence never accumulates
#[test]
fn test_below_threshold_is_no_detection() {
    let mut seq = SequenceController::for_word("T", SequenceConfig::default());
    seq.start(0);
    let events = replay(&mut seq, "T@0.6(3000ms)", 0);
    assert!(completions(&events).is_empty());
    assert_eq!(seq.progress(), 0.0);
}
