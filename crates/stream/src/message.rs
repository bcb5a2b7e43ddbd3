// Live update envelopes sent to viewers

use chrono::{DateTime, Utc};
use criclive_models::{BallEvent, Crease, Innings, InningsId, LiveSnapshot, MatchId, MatchResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScoreUpdate {
    InningsStarted { innings: Innings },
    BallRecorded { event: BallEvent, snapshot: LiveSnapshot },
    BallUndone { event: BallEvent, snapshot: LiveSnapshot },
    CreaseChanged { crease: Crease },
    InningsCompleted { innings: Innings },
    MatchEnded { result: MatchResult },
}

impl ScoreUpdate {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InningsStarted { .. } => "innings_started",
            Self::BallRecorded { .. } => "ball_recorded",
            Self::BallUndone { .. } => "ball_undone",
            Self::CreaseChanged { .. } => "crease_changed",
            Self::InningsCompleted { .. } => "innings_completed",
            Self::MatchEnded { .. } => "match_ended",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamMessage {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub match_id: MatchId,
    pub innings_id: Option<InningsId>,
    pub update: ScoreUpdate,
}

impl StreamMessage {
    pub fn new(match_id: MatchId, innings_id: Option<InningsId>, update: ScoreUpdate) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            match_id,
            innings_id,
            update,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
