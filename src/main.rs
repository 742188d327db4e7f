//! Signcoach CLI
//!
//! Usage:
//!   signcoach --word TEN --script "T@0.9(600ms) _(300ms) E@0.9(600ms)"   # Replay a spelled word
//!   signcoach --lesson module1-final-test --script "..."                  # Replay a built-in lesson
//!   signcoach --plan lesson.json --script "..."                           # Replay a lesson plan file
//!   signcoach --list                                                       # List built-in lessons
//!   signcoach --serve                                                      # HTTP API server
//!
//! Without `--script` the script is read from stdin.

use clap::Parser;
use colored::Colorize;
use std::io::{self, Read};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use signcoach::core::script::{self, ScriptItem};
use signcoach::core::{
    curriculum, run_server, ClipClassifier, LessonOrchestrator, MemoryProgressStore, ProgressStore,
    ScriptedClassifier,
};
use signcoach::types::{LessonEvent, LessonInput, LessonPlan};
use signcoach::VERSION;

#[derive(Parser, Debug)]
#[command(
    name = "signcoach",
    version = VERSION,
    about = "Signcoach - sign-language lesson engine",
    long_about = "Signcoach turns a stream of handshape predictions into lesson progress.\n\n\
                  Modes:\n  \
                  --word     Replay a script through one fingerspelled word\n  \
                  --lesson   Replay a script through a built-in lesson\n  \
                  --plan     Replay a script through a lesson plan file\n  \
                  --serve    HTTP API server mode\n\n\
                  Script tokens:\n  \
                  T@0.9(600ms)   label T at confidence 0.9 for 600 ms\n  \
                  _(300ms)       no predictions\n  \
                  ~(300ms)       low-confidence noise\n  \
                  #book@0.8(24f) 24-frame clip classified as book\n  \
                  >B ack exit restart"
)]
struct Args {
    /// Word to spell (fingerspelling practice)
    #[arg(short, long)]
    word: Option<String>,

    /// Built-in lesson id
    #[arg(short, long)]
    lesson: Option<String>,

    /// Lesson plan JSON file
    #[arg(short, long)]
    plan: Option<String>,

    /// Event script (read from stdin when omitted)
    #[arg(long)]
    script: Option<String>,

    /// Spacing between scripted events (milliseconds)
    #[arg(long, default_value_t = script::SCRIPT_CADENCE_MS)]
    cadence: u64,

    /// List built-in lessons
    #[arg(long)]
    list: bool,

    /// Run as HTTP API server
    #[arg(short, long)]
    serve: bool,

    /// Server address (default: 127.0.0.1:3000)
    #[arg(long, default_value = "127.0.0.1:3000")]
    addr: String,

    /// Output as JSON lines
    #[arg(long)]
    json: bool,

    /// Disable colors in output
    #[arg(long)]
    no_color: bool,

    /// Debug logging
    #[arg(long)]
    verbose: bool,

    /// Log as JSON
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(&args);
    if args.no_color {
        colored::control::set_override(false);
    }

    let result = if args.serve {
        run_serve(&args).await
    } else if args.list {
        run_list(&args);
        Ok(())
    } else {
        run_replay(&args).await
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Install the tracing subscriber (`SIGNCOACH_LOG` overrides the level)
fn init_logging(args: &Args) {
    let default = if args.verbose {
        "signcoach=debug"
    } else {
        "signcoach=info"
    };
    let filter = EnvFilter::try_from_env("SIGNCOACH_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);
    if args.log_json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Resolve the plan named on the command line
fn resolve_plan(args: &Args) -> Result<LessonPlan, Box<dyn std::error::Error>> {
    if let Some(ref path) = args.plan {
        return Ok(LessonPlan::from_json_file(path)?);
    }
    if let Some(ref id) = args.lesson {
        return curriculum::find(id).ok_or_else(|| format!("unknown lesson {:?}", id).into());
    }
    let word = args.word.clone().unwrap_or_else(|| "TEN".to_string());
    let word = word.to_ascii_uppercase();
    Ok(curriculum::spelling_practice(
        &format!("word-{}", word.to_ascii_lowercase()),
        &format!("Spell {}", word),
        &[word.as_str()],
    ))
}

/// Replay a script through one lesson
async fn run_replay(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let plan = resolve_plan(args)?;
    let text = match args.script {
        Some(ref text) => text.clone(),
        None => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text)?;
            text
        }
    };
    let script = script::parse_with(&text, 0, args.cadence)?;

    let store = Arc::new(MemoryProgressStore::new());
    let classifier = ScriptedClassifier::new();
    let mut lesson = LessonOrchestrator::new(plan, store.clone())?;
    info!(lesson_id = %lesson.plan().id, items = script.items.len(), "replaying script");

    if !args.json {
        print_header(&lesson);
    }
    let events = lesson.start(0);
    report(&lesson, &events, args);

    for item in script.items {
        let input = match item {
            ScriptItem::Input(input) => input,
            ScriptItem::ClipAnswer(prediction) => {
                classifier.push(Ok(prediction));
                let Some(request) = lesson.pending_clip_request() else {
                    warn!("clip answer without a submitted clip");
                    continue;
                };
                let ticket = request.ticket;
                let (prediction, error) = match classifier.classify(request).await {
                    Ok(prediction) => (Some(prediction), None),
                    Err(err) => (None, Some(err.to_string())),
                };
                LessonInput::ClipResult {
                    ticket,
                    prediction,
                    error,
                }
            }
        };
        match lesson.handle(input) {
            Ok(events) => report(&lesson, &events, args),
            Err(err) => warn!(error = %err, "input refused"),
        }
        if lesson.is_finished() {
            break;
        }
    }

    if !lesson.is_finished() {
        let events = lesson.handle(LessonInput::Tick {
            now_ms: script.end_ms,
        })?;
        report(&lesson, &events, args);
    }
    print_summary(&lesson, store.as_ref(), args);
    Ok(())
}

/// Print events and the resulting status
fn report(lesson: &LessonOrchestrator, events: &[LessonEvent], args: &Args) {
    if events.is_empty() {
        return;
    }
    if args.json {
        for event in events {
            println!("{}", serde_json::to_string(event).unwrap_or_default());
        }
        return;
    }
    for event in events {
        let line = format!("  {} {}", event.reason().code(), event.feedback());
        match event {
            LessonEvent::HoldConfirmed { .. } | LessonEvent::LabelMastered { .. } => {
                println!("{}", line.green())
            }
            LessonEvent::MistakeCounted { .. }
            | LessonEvent::AttemptTimedOut { .. }
            | LessonEvent::ClipMismatch { .. }
            | LessonEvent::ClipFailed { .. } => println!("{}", line.red()),
            LessonEvent::LessonCompleted { passed: true, .. } => println!("{}", line.green().bold()),
            LessonEvent::LessonCompleted { passed: false, .. } => println!("{}", line.red().bold()),
            _ => println!("{}", line.dimmed()),
        }
    }
    let status = lesson.status();
    if args.no_color {
        println!("{}", status.to_parseable_string());
    } else {
        println!("{}", status.to_terminal_string());
    }
}

fn print_header(lesson: &LessonOrchestrator) {
    let plan = lesson.plan();
    println!();
    println!("{}", format!("✋ Signcoach {} | {}", VERSION, plan.id).bold());
    if !plan.title.is_empty() {
        println!("   {}", plan.title);
    }
    println!("   kind={} targets={}", plan.kind, plan.targets.join(" "));
    println!();
}

fn print_summary(lesson: &LessonOrchestrator, store: &MemoryProgressStore, args: &Args) {
    if args.json {
        #[derive(serde::Serialize)]
        struct Summary<'a> {
            lesson_id: &'a str,
            outcome: Option<&'a signcoach::core::LessonOutcome>,
            total_xp: u32,
        }
        let summary = Summary {
            lesson_id: &lesson.plan().id,
            outcome: lesson.outcome(),
            total_xp: store.total_xp(),
        };
        println!("{}", serde_json::to_string(&summary).unwrap_or_default());
        return;
    }

    println!();
    match lesson.outcome() {
        Some(outcome) => {
            let verdict = if outcome.passed { "PASSED".green() } else { "FAILED".red() };
            println!("{} score={} xp={}", verdict, outcome.score, outcome.xp);
            let failed = outcome.result.failed_targets();
            if !failed.is_empty() {
                println!("  missed: {}", failed.join(" "));
            }
            println!("  mistakes: {}", outcome.result.mistake_count);
        }
        None => println!("{}", "Lesson not finished".yellow()),
    }
}

/// List built-in lessons
fn run_list(args: &Args) {
    for plan in curriculum::all_lessons() {
        if args.json {
            println!("{}", serde_json::to_string(&plan).unwrap_or_default());
        } else {
            println!("{:<28} {:<22} {}", plan.id, plan.kind.to_string(), plan.title);
        }
    }
}

/// Run HTTP API server
async fn run_serve(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    println!();
    println!("╔════════════════════════════════════════════════╗");
    println!("║  ✋ Signcoach API Server                        ║");
    println!("║  Version: {:<37}║", VERSION);
    println!("╚════════════════════════════════════════════════╝");
    println!();

    let classifier: Option<Arc<dyn ClipClassifier>> = None;
    run_server(&args.addr, classifier).await
}
