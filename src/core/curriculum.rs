//! Built-in curriculum
//!
//! Module 1: static letters (calibration, guided letters, free practice, timed test)
//! Module 2: fingerspelled words
//! Module 3: dynamic signs recorded as clips
//!
//! Lesson ids are `module<N>-<lesson>`.

use crate::types::{
    HoldConfig, LessonConfig, LessonKind, LessonPlan, MasteryConfig, MistakeConfig,
    SelectionPolicy, SequenceConfig, TimeoutPolicy, TimerConfig, TimerScope,
};
use crate::{
    FINAL_TEST_HOLD_MS, FINAL_TEST_LETTER_MS, FINAL_TEST_PASS_RATIO, INSTANT_LETTER_MS,
    SPELLING_TEST_PASS_COUNT, SPELLING_TEST_WORDS, SPELLING_TEST_WORD_MS,
};

pub const MODULE_ONE_LETTERS: [&str; 10] = ["E", "T", "A", "O", "I", "N", "S", "R", "L", "C"];

pub const SHORT_WORDS: [&str; 13] = [
    "TEN", "LATE", "COIN", "RAIN", "TONE", "NOON", "TALL", "TEEN", "COOL", "TREE", "SEEN", "LOON",
    "REEL",
];

pub const LONG_WORDS: [&str; 8] = [
    "ALONE", "CLEAN", "TRACE", "NOISE", "STONE", "TRAIN", "SCARE", "SASS",
];

pub const DYNAMIC_WORDS: [&str; 3] = ["book", "drink", "go"];

// =============================================================================
// MODULE 1
// =============================================================================

pub fn calibration() -> LessonPlan {
    LessonPlan::new("module1-intro", LessonKind::Calibration, &[])
        .with_title("Welcome & Calibration")
}

/// Guided letters with a long hold
pub fn interactive(id: &str, title: &str, letters: &[&str]) -> LessonPlan {
    let config = LessonConfig {
        sequence: SequenceConfig {
            hold: HoldConfig::default().with_hold_ms(2000),
            ..SequenceConfig::default()
        },
        ..LessonConfig::default()
    };
    LessonPlan::new(id, LessonKind::Interactive, letters)
        .with_title(title)
        .with_config(config)
}

pub fn gym() -> LessonPlan {
    let config = LessonConfig {
        sequence: SequenceConfig {
            hold: HoldConfig::default().with_hold_ms(1000).with_stale_after(350),
            hint_after_ms: None,
            ..SequenceConfig::default()
        },
        rotation: SelectionPolicy::RandomNoRepeat,
        success_goal: 10,
        ..LessonConfig::default()
    };
    LessonPlan::new("module1-gym", LessonKind::Gym, &MODULE_ONE_LETTERS)
        .with_title("Lesson 3: Free Practice")
        .with_config(config)
}

/// Time attack over every module letter
pub fn final_test() -> LessonPlan {
    let hold = HoldConfig::default()
        .with_hold_ms(FINAL_TEST_HOLD_MS)
        .with_threshold(0.5)
        .with_label_threshold("I", 0.4)
        .with_label_threshold("N", 0.35)
        .with_label_threshold("S", 0.4)
        .with_label_threshold("O", 0.3);
    let config = LessonConfig {
        sequence: SequenceConfig {
            hold,
            cooldown_ms: 120,
            hint_after_ms: None,
            ..SequenceConfig::default()
        },
        timer: Some(TimerConfig {
            duration_ms: FINAL_TEST_LETTER_MS,
            scope: TimerScope::PerTarget,
            on_timeout: TimeoutPolicy::Advance,
            restart_on_mistake: false,
        }),
        pass_ratio: FINAL_TEST_PASS_RATIO,
        ..LessonConfig::default()
    };
    LessonPlan::new("module1-final-test", LessonKind::FinalTest, &MODULE_ONE_LETTERS)
        .with_title("Lesson 4: Final Test")
        .with_config(config)
}

/// Shuffled letters; the first qualifying prediction counts
pub fn instant_exam() -> LessonPlan {
    let config = LessonConfig {
        sequence: SequenceConfig {
            hold: HoldConfig::default().with_hold_ms(0),
            hint_after_ms: None,
            ..SequenceConfig::default()
        },
        timer: Some(TimerConfig {
            duration_ms: INSTANT_LETTER_MS,
            scope: TimerScope::PerTarget,
            on_timeout: TimeoutPolicy::Retry { penalty_ms: 300 },
            restart_on_mistake: false,
        }),
        shuffle: true,
        ..LessonConfig::default()
    };
    LessonPlan::new("module1-instant-exam", LessonKind::InstantExam, &MODULE_ONE_LETTERS)
        .with_title("Instant Exam")
        .with_config(config)
}

pub fn module_one() -> Vec<LessonPlan> {
    vec![
        calibration(),
        interactive(
            "module1-high-frequency",
            "Lesson 1: High Frequency Letters",
            &MODULE_ONE_LETTERS[..5],
        ),
        interactive(
            "module1-consonants",
            "Lesson 2: Core Consonants",
            &MODULE_ONE_LETTERS[5..],
        ),
        gym(),
        final_test(),
    ]
}

// =============================================================================
// MODULE 2
// =============================================================================

fn spelling_sequence() -> SequenceConfig {
    SequenceConfig {
        hold: HoldConfig::default()
            .with_threshold(0.4)
            .with_label_threshold("O", 0.3)
            .with_label_threshold("S", 0.4),
        ..SequenceConfig::default()
    }
}

pub fn spelling_practice(id: &str, title: &str, words: &[&str]) -> LessonPlan {
    let config = LessonConfig {
        sequence: spelling_sequence(),
        ..LessonConfig::default()
    };
    LessonPlan::new(id, LessonKind::FingerspellPractice, words)
        .with_title(title)
        .with_config(config)
}

/// Five words drawn from both lists, four must pass
pub fn spelling_test() -> LessonPlan {
    let words: Vec<&str> = SHORT_WORDS.iter().chain(LONG_WORDS.iter()).copied().collect();
    let config = LessonConfig {
        sequence: SequenceConfig {
            hint_after_ms: None,
            ..spelling_sequence()
        },
        timer: Some(TimerConfig {
            duration_ms: SPELLING_TEST_WORD_MS,
            scope: TimerScope::WholeSequence,
            on_timeout: TimeoutPolicy::Advance,
            restart_on_mistake: false,
        }),
        draw_count: Some(SPELLING_TEST_WORDS),
        pass_count: Some(SPELLING_TEST_PASS_COUNT),
        ..LessonConfig::default()
    };
    LessonPlan::new("module2-quiz-words", LessonKind::FingerspellTest, &words)
        .with_title("Lesson 4: Testing (Word recognition)")
        .with_config(config)
}

/// One word, restarted on any slip
pub fn instant_drill(word: &str) -> LessonPlan {
    let config = LessonConfig {
        sequence: SequenceConfig {
            hold: HoldConfig::default().with_hold_ms(200),
            mistake: MistakeConfig {
                sustain_ms: 800,
                rate_limit_ms: 800,
                ..MistakeConfig::default()
            },
            hint_after_ms: None,
            ..SequenceConfig::default()
        },
        timer: Some(TimerConfig {
            duration_ms: INSTANT_LETTER_MS,
            scope: TimerScope::PerTarget,
            on_timeout: TimeoutPolicy::Restart { penalty_ms: 400 },
            restart_on_mistake: true,
        }),
        ..LessonConfig::default()
    };
    LessonPlan::new(
        format!("module2-drill-{}", word.to_ascii_lowercase()),
        LessonKind::InstantDrill,
        &[word],
    )
    .with_title(format!("Instant Drill: {}", word))
    .with_config(config)
}

pub fn module_two() -> Vec<LessonPlan> {
    vec![
        LessonPlan::new("module2-intro", LessonKind::Intro, &[]).with_title("Fingerspelling"),
        spelling_practice(
            "module2-practice-short",
            "Lesson 2: Short words",
            &SHORT_WORDS,
        ),
        spelling_practice("module2-practice-long", "Lesson 3: Long words", &LONG_WORDS),
        spelling_test(),
    ]
}

// =============================================================================
// MODULE 3
// =============================================================================

fn dynamic(id: &str, title: &str, kind: LessonKind, mastery: MasteryConfig, shuffle: bool) -> LessonPlan {
    let config = LessonConfig {
        mastery,
        shuffle,
        ..LessonConfig::default()
    };
    LessonPlan::new(id, kind, &DYNAMIC_WORDS)
        .with_title(title)
        .with_config(config)
}

pub fn module_three() -> Vec<LessonPlan> {
    vec![
        LessonPlan::new("module3-intro", LessonKind::Intro, &[])
            .with_title("Welcome to Dynamic Vocabulary"),
        LessonPlan::new("module3-learn", LessonKind::Intro, &[]).with_title("Learn: Book, Drink, Go"),
        dynamic(
            "module3-guided-practice",
            "Practice: One word at a time",
            LessonKind::DynamicGuided,
            MasteryConfig {
                required_reps: 3,
                policy: SelectionPolicy::Sequential,
                ..MasteryConfig::default()
            },
            false,
        ),
        dynamic(
            "module3-mixed-practice",
            "Practice: Mixed recall",
            LessonKind::DynamicMixed,
            MasteryConfig {
                required_reps: 2,
                policy: SelectionPolicy::RandomNoRepeat,
                ..MasteryConfig::default()
            },
            false,
        ),
        dynamic(
            "module3-final-test",
            "Test: 3-word mastery check",
            LessonKind::DynamicFinal,
            MasteryConfig {
                required_reps: 1,
                policy: SelectionPolicy::Sequential,
                ..MasteryConfig::default()
            },
            true,
        ),
    ]
}

/// Every built-in lesson, in module order
pub fn all_lessons() -> Vec<LessonPlan> {
    let mut lessons = module_one();
    lessons.extend(module_two());
    lessons.extend(module_three());
    lessons.push(instant_exam());
    lessons
}

/// Look up a built-in lesson by id
pub fn find(id: &str) -> Option<LessonPlan> {
    all_lessons().into_iter().find(|plan| plan.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_every_plan_validates() {
        for plan in all_lessons() {
            assert!(plan.validate().is_ok(), "{} invalid", plan.id);
        }
        assert!(instant_drill("TEN").validate().is_ok());
    }

    #[test]
    fn test_ids_unique() {
        let lessons = all_lessons();
        let ids: HashSet<&str> = lessons.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids.len(), lessons.len());
    }

    #[test]
    fn test_final_test_thresholds() {
        let plan = final_test();
        let hold = &plan.config.sequence.hold;
        assert_eq!(hold.threshold_for("N"), 0.35);
        assert_eq!(hold.threshold_for("O"), 0.3);
        assert_eq!(hold.threshold_for("E"), 0.5);
        assert_eq!(plan.targets.len(), 10);
    }

    #[test]
    fn test_find_by_id() {
        let plan = find("module2-quiz-words").expect("built in");
        assert_eq!(plan.kind, LessonKind::FingerspellTest);
        assert_eq!(plan.config.draw_count, Some(5));
        assert!(find("module9-missing").is_none());
    }
}
