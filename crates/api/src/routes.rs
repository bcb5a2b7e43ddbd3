use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{delete, get, post, put},
    Router,
};
use chrono::{DateTime, Utc};
use criclive_models::{
    BallEvent, BallEventInput, BallPreview, Innings, InningsId, LiveSnapshot, Match, MatchId,
    Player, PlayerId, Scorecard, Team, TeamId,
};
use criclive_services::{MatchSetup, NewPlayer, ScoringService};
use criclive_stream::EventBus;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use crate::error::ApiError;
use crate::websocket::live_feed;

/// Shared handler state: the scoring service and the bus WebSocket clients subscribe to.
#[derive(Clone)]
pub struct AppState {
    pub scoring: Arc<ScoringService>,
    pub events: EventBus,
    pub metrics_enabled: bool,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(scoring: Arc<ScoringService>, events: EventBus) -> Self {
        Self {
            scoring,
            events,
            metrics_enabled: true,
            started_at: Utc::now(),
        }
    }

    pub fn with_metrics(mut self, enabled: bool) -> Self {
        self.metrics_enabled = enabled;
        self
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self { success: true, data: Some(data), message: None }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub version: String,
    pub uptime_seconds: i64,
}

#[derive(Debug, Deserialize)]
pub struct RegisterTeamRequest {
    pub name: String,
    pub players: Vec<NewPlayer>,
}

#[derive(Debug, Serialize)]
pub struct TeamResponse {
    pub team: Team,
    pub players: Vec<Player>,
}

#[derive(Debug, Deserialize)]
pub struct StartMatchRequest {
    pub batting_team_id: TeamId,
}

#[derive(Debug, Default, Deserialize)]
pub struct EndMatchRequest {
    #[serde(default)]
    pub winner_id: Option<TeamId>,
}

#[derive(Debug, Deserialize)]
pub struct CreaseRequest {
    pub striker_id: PlayerId,
    #[serde(default)]
    pub non_striker_id: Option<PlayerId>,
}

#[derive(Debug, Serialize)]
pub struct BallRecordedResponse {
    pub innings: Innings,
    pub event: BallEvent,
}

/// Versioned REST routes plus health, metrics and the live feed.
pub fn create_routes() -> Router<AppState> {
    Router::new()
        // Health and monitoring
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))

        // Teams and matches
        .route("/api/v1/teams", post(register_team))
        .route("/api/v1/matches", post(create_match))
        .route("/api/v1/matches/:id", get(get_match))
        .route("/api/v1/matches/:id/start", post(start_match))
        .route("/api/v1/matches/:id/second-innings", post(start_second_innings))
        .route("/api/v1/matches/:id/end", post(end_match))
        .route("/api/v1/matches/:id/scorecard", get(get_scorecard))

        // Scoring
        .route("/api/v1/innings/:id/crease", put(set_crease))
        .route("/api/v1/innings/:id/swap-strike", post(swap_strike))
        .route("/api/v1/innings/:id/balls", post(apply_ball))
        .route("/api/v1/innings/:id/balls/last", delete(undo_last_ball))
        .route("/api/v1/innings/:id/live", get(live_snapshot))
        .route("/api/v1/innings/:id/preview", get(preview_next_ball))

        // Viewers
        .route("/ws", get(live_feed))
}

/// Routes with state, request tracing and CORS applied.
pub fn app(state: AppState) -> Router {
    create_routes()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let now = Utc::now();
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: now.to_rfc3339(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: (now - state.started_at).num_seconds(),
    })
}

async fn metrics(State(state): State<AppState>) -> Response {
    if !state.metrics_enabled {
        return StatusCode::NOT_FOUND.into_response();
    }
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.scoring.metrics().render(),
    )
        .into_response()
}

async fn register_team(
    State(state): State<AppState>,
    Json(request): Json<RegisterTeamRequest>,
) -> Result<(StatusCode, Json<ApiResponse<TeamResponse>>), ApiError> {
    let (team, players) = state.scoring.register_team(&request.name, &request.players).await?;
    let message = format!("Registered {} with {} players", team.name, players.len());
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(TeamResponse { team, players }).with_message(message))))
}

async fn create_match(
    State(state): State<AppState>,
    Json(setup): Json<MatchSetup>,
) -> Result<(StatusCode, Json<ApiResponse<Match>>), ApiError> {
    let fixture = state.scoring.create_match(setup).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(fixture))))
}

async fn get_match(State(state): State<AppState>, Path(match_id): Path<MatchId>) -> ApiResult<Match> {
    let fixture = state.scoring.get_match(match_id).await?;
    Ok(Json(ApiResponse::ok(fixture)))
}

async fn start_match(
    State(state): State<AppState>,
    Path(match_id): Path<MatchId>,
    Json(request): Json<StartMatchRequest>,
) -> ApiResult<Innings> {
    let innings = state.scoring.start_match(match_id, request.batting_team_id).await?;
    Ok(Json(ApiResponse::ok(innings).with_message("First innings started")))
}

async fn start_second_innings(State(state): State<AppState>, Path(match_id): Path<MatchId>) -> ApiResult<Innings> {
    let innings = state.scoring.start_second_innings(match_id).await?;
    let message = match innings.target {
        Some(target) => format!("Second innings started, target {}", target),
        None => "Second innings started".to_string(),
    };
    Ok(Json(ApiResponse::ok(innings).with_message(message)))
}

async fn end_match(
    State(state): State<AppState>,
    Path(match_id): Path<MatchId>,
    request: Option<Json<EndMatchRequest>>,
) -> ApiResult<Match> {
    let winner_id = request.and_then(|Json(r)| r.winner_id);
    let fixture = state.scoring.end_match(match_id, winner_id).await?;
    Ok(Json(ApiResponse::ok(fixture).with_message("Match completed")))
}

async fn get_scorecard(State(state): State<AppState>, Path(match_id): Path<MatchId>) -> ApiResult<Scorecard> {
    let card = state.scoring.get_scorecard(match_id).await?;
    Ok(Json(ApiResponse::ok(card)))
}

async fn set_crease(
    State(state): State<AppState>,
    Path(innings_id): Path<InningsId>,
    Json(request): Json<CreaseRequest>,
) -> ApiResult<Innings> {
    let innings = state
        .scoring
        .set_crease(innings_id, request.striker_id, request.non_striker_id)
        .await?;
    Ok(Json(ApiResponse::ok(innings)))
}

async fn swap_strike(State(state): State<AppState>, Path(innings_id): Path<InningsId>) -> ApiResult<Innings> {
    let innings = state.scoring.swap_strike(innings_id).await?;
    Ok(Json(ApiResponse::ok(innings)))
}

async fn apply_ball(
    State(state): State<AppState>,
    Path(innings_id): Path<InningsId>,
    Json(input): Json<BallEventInput>,
) -> Result<(StatusCode, Json<ApiResponse<BallRecordedResponse>>), ApiError> {
    let (innings, event) = state.scoring.apply_ball(innings_id, &input).await?;
    let label = event.label();
    let response = ApiResponse::ok(BallRecordedResponse { innings, event }).with_message(label);
    Ok((StatusCode::CREATED, Json(response)))
}

async fn undo_last_ball(State(state): State<AppState>, Path(innings_id): Path<InningsId>) -> ApiResult<BallEvent> {
    let event = state.scoring.undo_last(innings_id).await?;
    let message = format!("Removed ball {}.{}", event.over_number, event.ball_number);
    Ok(Json(ApiResponse::ok(event).with_message(message)))
}

async fn live_snapshot(State(state): State<AppState>, Path(innings_id): Path<InningsId>) -> ApiResult<LiveSnapshot> {
    let snapshot = state.scoring.live_snapshot(innings_id).await?;
    Ok(Json(ApiResponse::ok(snapshot)))
}

async fn preview_next_ball(State(state): State<AppState>, Path(innings_id): Path<InningsId>) -> ApiResult<BallPreview> {
    let preview = state.scoring.preview_next_ball(innings_id).await?;
    Ok(Json(ApiResponse::ok(preview)))
}
