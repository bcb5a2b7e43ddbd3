use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScoringError {
    #[error("Invalid innings {innings_id}: {reason}")]
    InvalidInnings { innings_id: String, reason: String },

    #[error("Player {player_id} is not registered as {role}")]
    MissingParticipant { player_id: String, role: String },

    #[error("No ball events to undo in innings {innings_id}")]
    NoEventsToUndo { innings_id: String },

    #[error("Crease incomplete for innings {innings_id}: select the batters before the next ball")]
    CreaseIncomplete { innings_id: String },

    #[error("Invalid ball event: {0}")]
    InvalidBall(String),

    #[error("Invalid rules: {0}")]
    InvalidRules(String),

    #[error("Match not found: {match_id}")]
    MatchNotFound { match_id: String },

    #[error("Team not found: {team_id}")]
    TeamNotFound { team_id: String },

    #[error("Invalid match state: {0}")]
    InvalidState(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ScoringError {
    pub fn invalid_innings(innings_id: impl ToString, reason: impl Into<String>) -> Self {
        Self::InvalidInnings {
            innings_id: innings_id.to_string(),
            reason: reason.into(),
        }
    }

    pub fn missing_participant(player_id: impl ToString, role: impl Into<String>) -> Self {
        Self::MissingParticipant {
            player_id: player_id.to_string(),
            role: role.into(),
        }
    }

    /// Short stable label, used for metrics and API error codes.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInnings { .. } => "invalid_innings",
            Self::MissingParticipant { .. } => "missing_participant",
            Self::NoEventsToUndo { .. } => "no_events_to_undo",
            Self::CreaseIncomplete { .. } => "crease_incomplete",
            Self::InvalidBall(_) => "invalid_ball",
            Self::InvalidRules(_) => "invalid_rules",
            Self::MatchNotFound { .. } => "match_not_found",
            Self::TeamNotFound { .. } => "team_not_found",
            Self::InvalidState(_) => "invalid_state",
            Self::Database(_) => "database",
            Self::Serialization(_) => "serialization",
            Self::Config(_) => "config",
        }
    }
}

pub type Result<T> = std::result::Result<T, ScoringError>;
