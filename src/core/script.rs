//! Event scripts: compact text expanded into a timed lesson input stream
//!
//! Tokens (whitespace or comma separated):
//! - `T@0.9(600ms)`: label `T` at confidence 0.9 for 600 ms (confidence defaults to 0.9)
//! - `_(300ms)` / `gap(300ms)`: no predictions, ticks only
//! - `~(300ms)` / `neutral(300ms)`: low-confidence noise
//! - `#book@0.8(24f)`: record a 24-frame clip, classifier answers `book` at 0.8
//! - `>B`: learner jumps to target `B`
//! - `ack`, `exit`, `restart`

use lazy_static::lazy_static;
use regex::Regex;

use crate::types::{
    Candidate, ClipConfig, ClipPrediction, LessonInput, RecognitionEvent, ScriptError,
};

/// Default spacing between generated events (milliseconds)
pub const SCRIPT_CADENCE_MS: u64 = 50;

/// Confidence used when a token does not name one
pub const SCRIPT_DEFAULT_CONFIDENCE: f64 = 0.9;

/// Confidence of neutral noise
const NEUTRAL_NOISE_CONFIDENCE: f64 = 0.1;

lazy_static! {
    static ref RE_GAP: Regex = Regex::new(r"^(?i:_|gap)\((\d+)ms\)$").expect("gap regex");
    static ref RE_NEUTRAL: Regex = Regex::new(r"^(?i:~|neutral)\((\d+)ms\)$").expect("neutral regex");
    static ref RE_HOLD: Regex =
        Regex::new(r"^([A-Za-z]+)(?:@(\d*\.?\d+))?\((\d+)ms\)$").expect("hold regex");
    static ref RE_CLIP: Regex =
        Regex::new(r"^#([A-Za-z]+)(?:@(\d*\.?\d+))?\((\d+)f\)$").expect("clip regex");
    static ref RE_SELECT: Regex = Regex::new(r"^>([A-Za-z]+)$").expect("select regex");
}

/// One step of an expanded script
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptItem {
    /// Fed to the lesson as-is
    Input(LessonInput),
    /// Classifier answer for the clip recorded just before
    ClipAnswer(ClipPrediction),
}

/// Expanded script
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Script {
    pub items: Vec<ScriptItem>,
    /// Lesson-clock time after the last token
    pub end_ms: u64,
}

impl Script {
    /// Recognition events only, in order
    pub fn recognition_events(&self) -> Vec<&RecognitionEvent> {
        self.items
            .iter()
            .filter_map(|item| match item {
                ScriptItem::Input(LessonInput::Recognition(event)) => Some(event),
                _ => None,
            })
            .collect()
    }
}

/// Parse a script starting at t = 0 with the default cadence
pub fn parse(text: &str) -> Result<Script, ScriptError> {
    parse_with(text, 0, SCRIPT_CADENCE_MS)
}

/// Parse a script starting at `start_ms`, one event every `cadence_ms`
pub fn parse_with(text: &str, start_ms: u64, cadence_ms: u64) -> Result<Script, ScriptError> {
    let cadence = cadence_ms.max(1);
    let frame_spacing = ClipConfig::default().capture_interval_ms();
    let mut script = Script {
        items: Vec::new(),
        end_ms: start_ms,
    };
    let mut t = start_ms;

    let tokens = text
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| !token.is_empty());
    for (position, token) in tokens.enumerate() {
        let bad = || ScriptError::BadToken {
            token: token.to_string(),
            position,
        };

        if let Some(caps) = RE_GAP.captures(token) {
            let end = t + parse_number(&caps[1]).ok_or_else(bad)?;
            while t < end {
                script.items.push(ScriptItem::Input(LessonInput::Tick { now_ms: t }));
                t += cadence;
            }
            t = end;
        } else if let Some(caps) = RE_NEUTRAL.captures(token) {
            let end = t + parse_number(&caps[1]).ok_or_else(bad)?;
            while t < end {
                let event = RecognitionEvent::new("_", NEUTRAL_NOISE_CONFIDENCE, t);
                script.items.push(ScriptItem::Input(LessonInput::Recognition(event)));
                t += cadence;
            }
            t = end;
        } else if let Some(caps) = RE_HOLD.captures(token) {
            let confidence = confidence(token, position, caps.get(2).map(|m| m.as_str()))?;
            let end = t + parse_number(&caps[3]).ok_or_else(bad)?;
            let label = caps[1].to_string();
            while t < end {
                let event = RecognitionEvent::new(label.clone(), confidence, t);
                script.items.push(ScriptItem::Input(LessonInput::Recognition(event)));
                t += cadence;
            }
            t = end;
        } else if let Some(caps) = RE_CLIP.captures(token) {
            let score = confidence(token, position, caps.get(2).map(|m| m.as_str()))?;
            let frames = parse_number(&caps[3]).ok_or_else(bad)? as usize;
            script.items.push(ScriptItem::Input(LessonInput::ClipStart { now_ms: t }));
            for i in 0..frames {
                script.items.push(ScriptItem::Input(LessonInput::ClipFrame {
                    now_ms: t,
                    frame: format!("frame-{}", i),
                }));
                t += frame_spacing;
            }
            script.items.push(ScriptItem::Input(LessonInput::ClipStop { now_ms: t }));
            script.items.push(ScriptItem::ClipAnswer(ClipPrediction::ranked(
                vec![Candidate::new(caps[1].to_lowercase(), score)],
                frames,
            )));
        } else if let Some(caps) = RE_SELECT.captures(token) {
            script.items.push(ScriptItem::Input(LessonInput::Select {
                now_ms: t,
                target: caps[1].to_string(),
            }));
        } else {
            let input = match token.to_ascii_lowercase().as_str() {
                "ack" => LessonInput::Acknowledge { now_ms: t },
                "exit" => LessonInput::Exit {
                    now_ms: t,
                    restart: false,
                },
                "restart" => LessonInput::Exit {
                    now_ms: t,
                    restart: true,
                },
                _ => return Err(bad()),
            };
            script.items.push(ScriptItem::Input(input));
        }
    }

    script.end_ms = t;
    Ok(script)
}

fn parse_number(digits: &str) -> Option<u64> {
    digits.parse().ok()
}

fn confidence(token: &str, position: usize, raw: Option<&str>) -> Result<f64, ScriptError> {
    let Some(raw) = raw else {
        return Ok(SCRIPT_DEFAULT_CONFIDENCE);
    };
    let value: f64 = raw.parse().map_err(|_| ScriptError::BadToken {
        token: token.to_string(),
        position,
    })?;
    if !(0.0..=1.0).contains(&value) {
        return Err(ScriptError::BadConfidence {
            token: token.to_string(),
            value,
        });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hold_token_expands_at_cadence() {
        let script = parse("T@0.9(600ms)").expect("parse");
        let events = script.recognition_events();
        assert_eq!(events.len(), 12);
        assert_eq!(events[0].timestamp_ms, 0);
        assert_eq!(events[11].timestamp_ms, 550);
        assert!(events.iter().all(|e| e.label == "T" && e.confidence == 0.9));
        assert_eq!(script.end_ms, 600);
    }

    #[test]
    fn test_gap_emits_ticks_only() {
        let script = parse("A(100ms) _(200ms) gap(100ms)").expect("parse");
        let ticks = script
            .items
            .iter()
            .filter(|item| matches!(item, ScriptItem::Input(LessonInput::Tick { .. })))
            .count();
        assert_eq!(ticks, 6);
        assert_eq!(script.recognition_events().len(), 2);
        assert_eq!(script.end_ms, 400);
    }

    #[test]
    fn test_neutral_is_low_confidence() {
        let script = parse("~(100ms)").expect("parse");
        let events = script.recognition_events();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.confidence < crate::NEUTRAL_CONFIDENCE));
    }

    #[test]
    fn test_clip_token() {
        let script = parse("#BOOK@0.8(24f)").expect("parse");
        let frames = script
            .items
            .iter()
            .filter(|item| matches!(item, ScriptItem::Input(LessonInput::ClipFrame { .. })))
            .count();
        assert_eq!(frames, 24);
        assert_eq!(
            script.items.last(),
            Some(&ScriptItem::ClipAnswer(ClipPrediction::ranked(
                vec![Candidate::new("book", 0.8)],
                24
            )))
        );
    }

    #[test]
    fn test_commands() {
        let script = parse("ack, >B exit").expect("parse");
        assert_eq!(script.items.len(), 3);
        assert_eq!(
            script.items[1],
            ScriptItem::Input(LessonInput::Select {
                now_ms: 0,
                target: "B".into()
            })
        );
    }

    #[test]
    fn test_bad_token_reports_position() {
        assert_eq!(
            parse("T(100ms) ??"),
            Err(ScriptError::BadToken {
                token: "??".into(),
                position: 1
            })
        );
        assert_eq!(
            parse("T@1.5(100ms)"),
            Err(ScriptError::BadConfidence {
                token: "T@1.5(100ms)".into(),
                value: 1.5
            })
        );
    }
}
