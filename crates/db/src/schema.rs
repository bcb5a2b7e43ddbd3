use std::str::FromStr;
use chrono::{DateTime, Utc};
use criclive_models::{
    BallEvent, Crease, Extras, Innings, Match, MatchResult, Player, PlayerId, PlayerMatchStat,
    Result, RulesConfig, ScoringError, Team, TossDecision,
};
use rust_decimal::Decimal;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// Serialized name of a unit enum variant, e.g. `IN_PROGRESS`.
pub fn encode_label<T: Serialize>(value: &T) -> Result<String> {
    match serde_json::to_value(value)? {
        serde_json::Value::String(label) => Ok(label),
        other => Ok(other.to_string()),
    }
}

pub fn decode_label<T: DeserializeOwned>(label: &str) -> Result<T> {
    Ok(serde_json::from_value(serde_json::Value::String(label.to_string()))?)
}

pub(crate) fn to_db_int(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

pub(crate) fn from_db_int(value: i32) -> u32 {
    u32::try_from(value).unwrap_or(0)
}

fn decode_decimal(text: &str) -> Result<Decimal> {
    Decimal::from_str(text).map_err(|e| ScoringError::Database(sqlx::Error::Decode(Box::new(e))))
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TeamRecord {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl From<TeamRecord> for Team {
    fn from(record: TeamRecord) -> Self {
        Self { id: record.id.into(), name: record.name, created_at: record.created_at }
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub id: Uuid,
    pub team_id: Uuid,
    pub name: String,
    pub role: String,
    pub roster_position: i32,
}

impl TryFrom<PlayerRecord> for Player {
    type Error = ScoringError;

    fn try_from(record: PlayerRecord) -> Result<Self> {
        Ok(Self {
            id: record.id.into(),
            name: record.name,
            team_id: record.team_id.into(),
            role: decode_label(&record.role)?,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct MatchRecord {
    pub id: Uuid,
    pub team1_id: Uuid,
    pub team2_id: Uuid,
    pub rules: Json<RulesConfig>,
    pub venue: Option<String>,
    pub toss_winner_id: Option<Uuid>,
    pub toss_decision: Option<String>,
    pub status: String,
    pub result: Option<Json<MatchResult>>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<MatchRecord> for Match {
    type Error = ScoringError;

    fn try_from(record: MatchRecord) -> Result<Self> {
        Ok(Self {
            id: record.id.into(),
            team1_id: record.team1_id.into(),
            team2_id: record.team2_id.into(),
            rules: record.rules.0,
            venue: record.venue,
            toss_winner_id: record.toss_winner_id.map(Into::into),
            toss_decision: record.toss_decision.as_deref().map(decode_label::<TossDecision>).transpose()?,
            status: decode_label(&record.status)?,
            result: record.result.map(|r| r.0),
            created_at: record.created_at,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct InningsRecord {
    pub id: Uuid,
    pub match_id: Uuid,
    pub innings_number: i32,
    pub batting_team_id: Uuid,
    pub bowling_team_id: Uuid,
    pub total_runs: i32,
    pub total_wickets: i32,
    pub legal_balls: i32,
    pub total_overs: String,
    pub extras: Json<Extras>,
    pub status: String,
    pub target: Option<i32>,
    pub crease: Json<Crease>,
    pub batting_order: Json<Vec<PlayerId>>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<InningsRecord> for Innings {
    type Error = ScoringError;

    fn try_from(record: InningsRecord) -> Result<Self> {
        Ok(Self {
            id: record.id.into(),
            match_id: record.match_id.into(),
            innings_number: from_db_int(record.innings_number),
            batting_team_id: record.batting_team_id.into(),
            bowling_team_id: record.bowling_team_id.into(),
            total_runs: from_db_int(record.total_runs),
            total_wickets: from_db_int(record.total_wickets),
            legal_balls: from_db_int(record.legal_balls),
            total_overs: decode_decimal(&record.total_overs)?,
            extras: record.extras.0,
            status: decode_label(&record.status)?,
            target: record.target.map(from_db_int),
            crease: record.crease.0,
            batting_order: record.batting_order.0,
            created_at: record.created_at,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct BallEventRecord {
    pub innings_id: Uuid,
    pub seq: i64,
    pub payload: Json<BallEvent>,
}

impl From<BallEventRecord> for BallEvent {
    fn from(record: BallEventRecord) -> Self {
        record.payload.0
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct PlayerStatRecord {
    pub innings_id: Uuid,
    pub player_id: Uuid,
    pub payload: Json<PlayerMatchStat>,
}

impl From<PlayerStatRecord> for PlayerMatchStat {
    fn from(record: PlayerStatRecord) -> Self {
        record.payload.0
    }
}
