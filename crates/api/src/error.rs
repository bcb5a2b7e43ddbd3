use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use criclive_models::ScoringError;
use serde::Serialize;
use tracing::error;
use crate::routes::ApiResponse;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
}

/// Scoring failure on its way out as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub ScoringError);

impl From<ScoringError> for ApiError {
    fn from(err: ScoringError) -> Self {
        Self(err)
    }
}

/// HTTP status for each scoring error kind.
pub fn status_for(err: &ScoringError) -> StatusCode {
    match err {
        ScoringError::InvalidInnings { .. }
        | ScoringError::NoEventsToUndo { .. }
        | ScoringError::InvalidState(_) => StatusCode::CONFLICT,
        ScoringError::MissingParticipant { .. }
        | ScoringError::InvalidBall(_)
        | ScoringError::InvalidRules(_)
        | ScoringError::CreaseIncomplete { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        ScoringError::MatchNotFound { .. } | ScoringError::TeamNotFound { .. } => StatusCode::NOT_FOUND,
        ScoringError::Database(_) | ScoringError::Serialization(_) | ScoringError::Config(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        let message = match &self.0 {
            ScoringError::NoEventsToUndo { .. } => "Nothing to undo".to_string(),
            err if status.is_server_error() => {
                error!("❌ Request failed: {}", err);
                "Internal server error".to_string()
            }
            err => err.to_string(),
        };

        let body = ApiResponse {
            success: false,
            data: Some(ErrorBody { code: self.0.kind() }),
            message: Some(message),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(&ScoringError::invalid_innings("i", "done")), StatusCode::CONFLICT);
        assert_eq!(status_for(&ScoringError::missing_participant("p", "bowler")), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            status_for(&ScoringError::CreaseIncomplete { innings_id: "i".to_string() }),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_for(&ScoringError::NoEventsToUndo { innings_id: "i".to_string() }),
            StatusCode::CONFLICT
        );
        assert_eq!(status_for(&ScoringError::MatchNotFound { match_id: "m".to_string() }), StatusCode::NOT_FOUND);
        assert_eq!(status_for(&ScoringError::Config("bad".to_string())), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
