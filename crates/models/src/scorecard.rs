use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use crate::events::Multiplier;
use crate::fixtures::Match;
use crate::ids::{InningsId, MatchId, PlayerId, TeamId};
use crate::innings::Innings;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InningsSummary {
    #[serde(flatten)]
    pub innings: Innings,
    pub batting_team_name: String,
    pub bowling_team_name: String,
    pub run_rate: Decimal,
    pub powerplay_runs: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BattingLine {
    pub innings_id: InningsId,
    pub player_id: PlayerId,
    pub player_name: String,
    pub position: u32,
    pub runs: u32,
    pub balls: u32,
    pub fours: u32,
    pub sixes: u32,
    pub strike_rate: Decimal,
    /// Dismissal text, or `not out`.
    pub status: String,
    pub is_out: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BowlingLine {
    pub innings_id: InningsId,
    pub player_id: PlayerId,
    pub player_name: String,
    pub overs: Decimal,
    pub maidens: u32,
    pub runs: u32,
    pub wickets: u32,
    pub economy: Decimal,
    pub wides: u32,
    pub no_balls: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallOfWicket {
    pub innings_id: InningsId,
    pub wicket_number: u32,
    pub score: u32,
    pub overs: Decimal,
    pub player_id: PlayerId,
    pub player_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scorecard {
    #[serde(rename = "match")]
    pub fixture: Match,
    pub innings: Vec<InningsSummary>,
    pub batting_stats: Vec<BattingLine>,
    pub bowling_stats: Vec<BowlingLine>,
    pub fall_of_wickets: Vec<FallOfWicket>,
}

/// What the next delivery will be, before it is bowled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallPreview {
    pub over_number: u32,
    pub ball_number: u32,
    pub is_free_hit: bool,
    pub is_powerplay: bool,
    pub multiplier: Option<Multiplier>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatterFigures {
    pub player_id: PlayerId,
    pub name: String,
    pub runs: u32,
    pub balls: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BowlerFigures {
    pub player_id: PlayerId,
    pub name: String,
    pub overs: Decimal,
    pub maidens: u32,
    pub runs: u32,
    pub wickets: u32,
}

/// Viewer-facing state of one innings after its latest committed ball.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveSnapshot {
    pub match_id: MatchId,
    pub innings_id: InningsId,
    pub innings_number: u32,
    pub batting_team_id: TeamId,
    pub score: String,
    pub total_runs: u32,
    pub total_wickets: u32,
    pub overs: Decimal,
    pub run_rate: Decimal,
    pub target: Option<u32>,
    pub runs_needed: Option<u32>,
    pub balls_remaining: u32,
    pub required_run_rate: Option<Decimal>,
    pub striker: Option<BatterFigures>,
    pub non_striker: Option<BatterFigures>,
    pub bowler: Option<BowlerFigures>,
    pub this_over: Vec<String>,
    pub next_ball: BallPreview,
    pub is_completed: bool,
}

fn ratio(numerator: u64, denominator: u64, scale: u64) -> Decimal {
    if denominator == 0 {
        return Decimal::ZERO;
    }
    (Decimal::from(numerator) * Decimal::from(scale) / Decimal::from(denominator)).round_dp(2)
}

/// Runs per over.
pub fn run_rate(runs: u32, legal_balls: u32, balls_per_over: u32) -> Decimal {
    ratio(u64::from(runs), u64::from(legal_balls), u64::from(balls_per_over))
}

/// Runs per hundred balls.
pub fn strike_rate(runs: u32, balls: u32) -> Decimal {
    ratio(u64::from(runs), u64::from(balls), 100)
}

pub fn economy(runs_conceded: u32, balls_bowled: u32, balls_per_over: u32) -> Decimal {
    run_rate(runs_conceded, balls_bowled, balls_per_over)
}
