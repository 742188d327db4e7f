//! HTTP + WebSocket API for Signcoach
//!
//! Endpoints:
//! - POST /lesson/new - Start a lesson (built-in id or inline plan)
//! - GET /lesson/{id} - Lesson status
//! - POST /lesson/{id}/event - Feed a recognition event
//! - POST /lesson/{id}/tick - Periodic tick
//! - POST /lesson/{id}/input - Any learner input (select, acknowledge, exit, landmarks)
//! - POST /lesson/{id}/clip/{start,frame,stop,result} - Clip recording
//! - WS /ws/{id} - Live lesson events
//! - GET /health - Health check
//!
//! Lesson time is the caller's clock: every request carries `now_ms`.

use axum::{
    extract::{Path, State, WebSocketUpgrade, ws::{Message, WebSocket}},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};

use crate::core::{curriculum, ClipClassifier, LessonOrchestrator, LessonOutcome, MemoryProgressStore, ProgressStore};
use crate::types::{
    ClipError, ClipPrediction, ClipRequest, LessonError, LessonEvent, LessonInput, LessonPlan,
    RecognitionEvent, StatusOutput,
};

/// One running lesson
#[derive(Debug)]
pub struct LessonSession {
    pub id: String,
    pub lesson: LessonOrchestrator,
    pub update_tx: broadcast::Sender<LessonUpdate>,
}

impl LessonSession {
    /// Broadcast new events and build the response
    fn publish(&self, events: Vec<LessonEvent>) -> InputResponse {
        let status = self.lesson.status();
        if !events.is_empty() {
            let update = LessonUpdate {
                session_id: self.id.clone(),
                events: events.clone(),
                status: status.clone(),
            };
            // No subscribers is fine
            let _ = self.update_tx.send(update);
        }
        InputResponse {
            events,
            status,
            pending_clip: self.lesson.pending_clip_request(),
        }
    }
}

/// Live update message
#[derive(Debug, Clone, Serialize)]
pub struct LessonUpdate {
    pub session_id: String,
    pub events: Vec<LessonEvent>,
    pub status: StatusOutput,
}

/// App state
pub struct AppState {
    pub lessons: RwLock<HashMap<String, LessonSession>>,
    pub store: Arc<MemoryProgressStore>,
    pub classifier: Option<Arc<dyn ClipClassifier>>,
}

impl AppState {
    pub fn new(classifier: Option<Arc<dyn ClipClassifier>>) -> Self {
        Self {
            lessons: RwLock::new(HashMap::new()),
            store: Arc::new(MemoryProgressStore::new()),
            classifier,
        }
    }
}

/// Start lesson request: a built-in `lesson_id` or an inline `plan`
#[derive(Debug, Deserialize)]
pub struct NewLessonRequest {
    pub lesson_id: Option<String>,
    pub plan: Option<LessonPlan>,
    #[serde(default)]
    pub now_ms: u64,
}

/// Start lesson response
#[derive(Debug, Serialize)]
pub struct NewLessonResponse {
    pub session_id: String,
    pub lesson_id: String,
    pub websocket_url: String,
    pub events: Vec<LessonEvent>,
}

/// Lesson status response
#[derive(Debug, Serialize)]
pub struct LessonStatusResponse {
    pub session_id: String,
    pub status: StatusOutput,
    pub outcome: Option<LessonOutcome>,
    pub pending_clip: Option<u64>,
}

/// Request carrying only the lesson clock
#[derive(Debug, Deserialize)]
pub struct TimeRequest {
    pub now_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct ClipFrameRequest {
    pub now_ms: u64,
    pub frame: String,
}

/// Classifier answer posted by an external client
#[derive(Debug, Deserialize)]
pub struct ClipResultRequest {
    pub ticket: u64,
    pub prediction: Option<ClipPrediction>,
    pub error: Option<String>,
}

/// Response to any lesson input
#[derive(Debug, Serialize)]
pub struct InputResponse {
    pub events: Vec<LessonEvent>,
    pub status: StatusOutput,
    /// Clip waiting for an external classifier
    pub pending_clip: Option<ClipRequest>,
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub lessons_active: usize,
    pub total_xp: u32,
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/lesson/new", post(create_lesson))
        .route("/lesson/:id", get(get_lesson))
        .route("/lesson/:id/event", post(add_event))
        .route("/lesson/:id/tick", post(tick))
        .route("/lesson/:id/input", post(add_input))
        .route("/lesson/:id/clip/start", post(clip_start))
        .route("/lesson/:id/clip/frame", post(clip_frame))
        .route("/lesson/:id/clip/stop", post(clip_stop))
        .route("/lesson/:id/clip/result", post(clip_result))
        .route("/ws/:id", get(websocket_handler))
        .with_state(state)
}

/// Health check endpoint
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let lessons = state.lessons.read().await;
    Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::VERSION.to_string(),
        lessons_active: lessons.values().filter(|s| !s.lesson.is_finished()).count(),
        total_xp: state.store.total_xp(),
    })
}

/// Start a new lesson
async fn create_lesson(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewLessonRequest>,
) -> Result<Json<NewLessonResponse>, StatusCode> {
    let plan = match (req.plan, req.lesson_id) {
        (Some(plan), _) => plan,
        (None, Some(id)) => curriculum::find(&id).ok_or(StatusCode::NOT_FOUND)?,
        (None, None) => return Err(StatusCode::BAD_REQUEST),
    };
    let store: Arc<dyn ProgressStore> = state.store.clone();
    let mut lesson = LessonOrchestrator::new(plan, store).map_err(|err| {
        warn!(error = %err, "rejected lesson plan");
        StatusCode::UNPROCESSABLE_ENTITY
    })?;
    let events = lesson.start(req.now_ms);
    let lesson_id = lesson.plan().id.clone();

    let session_id = generate_session_id();
    let (tx, _) = broadcast::channel(100);
    let session = LessonSession {
        id: session_id.clone(),
        lesson,
        update_tx: tx,
    };
    info!(session_id = %session_id, lesson_id = %lesson_id, "lesson session created");

    let mut lessons = state.lessons.write().await;
    lessons.insert(session_id.clone(), session);

    Ok(Json(NewLessonResponse {
        websocket_url: format!("/ws/{}", session_id),
        session_id,
        lesson_id,
        events,
    }))
}

/// Get lesson status
async fn get_lesson(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<LessonStatusResponse>, StatusCode> {
    let lessons = state.lessons.read().await;
    let session = lessons.get(&id).ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(LessonStatusResponse {
        session_id: id,
        status: session.lesson.status(),
        outcome: session.lesson.outcome().cloned(),
        pending_clip: session.lesson.pending_clip_request().map(|r| r.ticket),
    }))
}

async fn add_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(event): Json<RecognitionEvent>,
) -> Result<Json<InputResponse>, StatusCode> {
    apply(&state, &id, LessonInput::Recognition(event)).await.map(Json)
}

async fn tick(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<TimeRequest>,
) -> Result<Json<InputResponse>, StatusCode> {
    apply(&state, &id, LessonInput::Tick { now_ms: req.now_ms }).await.map(Json)
}

async fn add_input(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(input): Json<LessonInput>,
) -> Result<Json<InputResponse>, StatusCode> {
    apply(&state, &id, input).await.map(Json)
}

async fn clip_start(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<TimeRequest>,
) -> Result<Json<InputResponse>, StatusCode> {
    apply(&state, &id, LessonInput::ClipStart { now_ms: req.now_ms }).await.map(Json)
}

/// A frame may fill the clip and submit it
async fn clip_frame(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<ClipFrameRequest>,
) -> Result<Json<InputResponse>, StatusCode> {
    let input = LessonInput::ClipFrame {
        now_ms: req.now_ms,
        frame: req.frame,
    };
    let response = apply(&state, &id, input).await?;
    classify_if_pending(&state, &id, response).await.map(Json)
}

async fn clip_stop(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<TimeRequest>,
) -> Result<Json<InputResponse>, StatusCode> {
    let response = apply(&state, &id, LessonInput::ClipStop { now_ms: req.now_ms }).await?;
    classify_if_pending(&state, &id, response).await.map(Json)
}

async fn clip_result(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<ClipResultRequest>,
) -> Result<Json<InputResponse>, StatusCode> {
    let input = LessonInput::ClipResult {
        ticket: req.ticket,
        prediction: req.prediction,
        error: req.error,
    };
    apply(&state, &id, input).await.map(Json)
}

/// Route one input into a lesson
async fn apply(state: &AppState, id: &str, input: LessonInput) -> Result<InputResponse, StatusCode> {
    let mut lessons = state.lessons.write().await;
    let session = lessons.get_mut(id).ok_or(StatusCode::NOT_FOUND)?;
    let name = input.name();
    let events = session.lesson.handle(input).map_err(|err| {
        debug!(session_id = %id, input = name, error = %err, "input refused");
        error_status(&err)
    })?;
    Ok(session.publish(events))
}

/// Send a submitted clip to the configured classifier
///
/// The lesson lock is released while the classifier runs; an answer for a
/// clip discarded in the meantime is dropped by the ticket check.
async fn classify_if_pending(
    state: &AppState,
    id: &str,
    mut response: InputResponse,
) -> Result<InputResponse, StatusCode> {
    let (Some(classifier), Some(request)) = (state.classifier.clone(), response.pending_clip.clone())
    else {
        return Ok(response);
    };
    let ticket = request.ticket;
    let (prediction, error) = match classifier.classify(request).await {
        Ok(prediction) => (Some(prediction), None),
        Err(err) => {
            warn!(session_id = %id, ticket, error = %err, "clip classifier failed");
            (None, Some(err.to_string()))
        }
    };
    let resolved = apply(
        state,
        id,
        LessonInput::ClipResult {
            ticket,
            prediction,
            error,
        },
    )
    .await?;
    response.events.extend(resolved.events);
    response.status = resolved.status;
    response.pending_clip = resolved.pending_clip;
    Ok(response)
}

fn error_status(err: &LessonError) -> StatusCode {
    match err {
        LessonError::NotStarted
        | LessonError::Clip(ClipError::Busy { .. })
        | LessonError::Clip(ClipError::NotRecording)
        | LessonError::Clip(ClipError::StaleTicket { .. }) => StatusCode::CONFLICT,
        LessonError::Unsupported { .. } | LessonError::UnknownTarget { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
    }
}

/// WebSocket handler for live updates
async fn websocket_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, StatusCode> {
    let lessons = state.lessons.read().await;
    let session = lessons.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    let rx = session.update_tx.subscribe();
    drop(lessons);

    Ok(ws.on_upgrade(move |socket| async move {
        handle_websocket(socket, rx).await;
    }))
}

/// Handle WebSocket connection
async fn handle_websocket(mut socket: WebSocket, mut rx: broadcast::Receiver<LessonUpdate>) {
    while let Ok(update) = rx.recv().await {
        let json = serde_json::to_string(&update).unwrap_or_default();
        if socket.send(Message::Text(json)).await.is_err() {
            break;
        }
    }
}

/// Generate session ID
fn generate_session_id() -> String {
    format!("lesson_{:016x}", rand::random::<u64>())
}

/// Run the API server
pub async fn run_server(
    addr: &str,
    classifier: Option<Arc<dyn ClipClassifier>>,
) -> Result<(), Box<dyn std::error::Error>> {
    let router = create_router(Arc::new(AppState::new(classifier)));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr, "signcoach API listening");
    println!("✋ Signcoach API running on {}", addr);
    println!("  POST /lesson/new             - Start lesson");
    println!("  GET  /lesson/:id             - Get status");
    println!("  POST /lesson/:id/event       - Recognition event");
    println!("  POST /lesson/:id/tick        - Tick");
    println!("  POST /lesson/:id/input       - Learner input");
    println!("  POST /lesson/:id/clip/start  - Start clip");
    println!("  POST /lesson/:id/clip/frame  - Clip frame");
    println!("  POST /lesson/:id/clip/stop   - Stop clip");
    println!("  POST /lesson/:id/clip/result - Classifier answer");
    println!("  WS   /ws/:id                 - Live updates");
    println!("  GET  /health                 - Health check");
    axum::serve(listener, router).await?;
    Ok(())
}
