use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::AppResult,
    middleware::request_id::RequestId,
    models::{Context, Feedback, QuickAdjust},
    routes::AppState,
    services::engine::{AnswerOutcome, MomentAck, RecommendationSet, StartedSession},
};

fn default_domain() -> String {
    "movies".to_string()
}

fn default_flow() -> String {
    "standard".to_string()
}

#[derive(Debug, Deserialize)]
pub struct StartSessionRequest {
    #[serde(default = "default_domain")]
    pub domain: String,
    #[serde(default = "default_flow")]
    pub flow: String,
    #[serde(default)]
    pub context: Context,
}

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub question_id: String,
    pub option_id: String,
    #[serde(default)]
    pub context: Context,
}

#[derive(Debug, Deserialize)]
pub struct RefineRequest {
    #[serde(default)]
    pub feedback: Vec<Feedback>,
    #[serde(default)]
    pub action: Option<QuickAdjust>,
    #[serde(default)]
    pub context: Context,
}

#[derive(Debug, Deserialize)]
pub struct AdjustRequest {
    pub adjustment: QuickAdjust,
    #[serde(default)]
    pub context: Context,
}

#[derive(Debug, Deserialize)]
pub struct MomentFeedbackRequest {
    pub score: u8,
}

/// Handler for session creation
pub async fn start(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<StartSessionRequest>,
) -> AppResult<(StatusCode, Json<StartedSession>)> {
    tracing::info!(
        request_id = %request_id,
        domain = %request.domain,
        flow = %request.flow,
        "Starting session"
    );
    let started = state
        .engine
        .start_session(request.domain, request.flow, request.context)
        .await?;
    Ok((StatusCode::CREATED, Json(started)))
}

/// Handler for answer submission
pub async fn answer(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<AnswerRequest>,
) -> AppResult<Json<AnswerOutcome>> {
    let outcome = state
        .engine
        .submit_answer(
            session_id,
            &request.question_id,
            &request.option_id,
            request.context,
        )
        .await?;
    Ok(Json(outcome))
}

/// Handler for feedback-driven refinement
pub async fn refine(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<RefineRequest>,
) -> AppResult<Json<RecommendationSet>> {
    tracing::info!(
        request_id = %request_id,
        session_id = %session_id,
        feedback_count = request.feedback.len(),
        "Processing refinement"
    );
    let set = state
        .engine
        .refine(session_id, request.feedback, request.action, request.context)
        .await?;
    Ok(Json(set))
}

/// Handler for named quick adjustments
pub async fn adjust(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<AdjustRequest>,
) -> AppResult<Json<RecommendationSet>> {
    let set = state
        .engine
        .quick_adjust(session_id, request.adjustment, request.context)
        .await?;
    Ok(Json(set))
}

/// Handler for the satisfaction signal
pub async fn moment_feedback(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<MomentFeedbackRequest>,
) -> AppResult<Json<MomentAck>> {
    let ack = state
        .engine
        .record_moment_feedback(session_id, request.score)
        .await?;
    Ok(Json(ack))
}

/// Handler for explicit session reset
pub async fn reset(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.engine.reset(session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
