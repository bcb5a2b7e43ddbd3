use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use crate::events::ExtraType;
use crate::ids::{InningsId, MatchId, PlayerId, TeamId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InningsStatus {
    NotStarted,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extras {
    pub wides: u32,
    pub no_balls: u32,
    pub byes: u32,
    pub leg_byes: u32,
}

impl Extras {
    pub fn total(&self) -> u32 {
        self.wides + self.no_balls + self.byes + self.leg_byes
    }

    pub fn bucket_mut(&mut self, extra: ExtraType) -> &mut u32 {
        match extra {
            ExtraType::Wide => &mut self.wides,
            ExtraType::NoBall => &mut self.no_balls,
            ExtraType::Bye => &mut self.byes,
            ExtraType::LegBye => &mut self.leg_byes,
        }
    }
}

/// Who is batting right now. Either slot may be empty: awaiting the next
/// batter after a wicket, or the lone batter under last-man-stands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Crease {
    pub striker: Option<PlayerId>,
    pub non_striker: Option<PlayerId>,
}

impl Crease {
    pub fn new(striker: PlayerId, non_striker: PlayerId) -> Self {
        Self { striker: Some(striker), non_striker: Some(non_striker) }
    }

    pub fn swapped(self) -> Self {
        Self { striker: self.non_striker, non_striker: self.striker }
    }

    pub fn contains(&self, player_id: PlayerId) -> bool {
        self.striker == Some(player_id) || self.non_striker == Some(player_id)
    }

    pub fn occupants(&self) -> usize {
        usize::from(self.striker.is_some()) + usize::from(self.non_striker.is_some())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Innings {
    pub id: InningsId,
    pub match_id: MatchId,
    pub innings_number: u32,
    pub batting_team_id: TeamId,
    pub bowling_team_id: TeamId,
    pub total_runs: u32,
    pub total_wickets: u32,
    pub legal_balls: u32,
    /// Display form: `2.3` is two overs and three balls.
    pub total_overs: Decimal,
    pub extras: Extras,
    pub status: InningsStatus,
    /// Runs required to win, second innings only.
    pub target: Option<u32>,
    pub crease: Crease,
    pub batting_order: Vec<PlayerId>,
    pub created_at: DateTime<Utc>,
}

impl Innings {
    pub fn new(
        match_id: MatchId,
        innings_number: u32,
        batting_team_id: TeamId,
        bowling_team_id: TeamId,
    ) -> Self {
        Self {
            id: InningsId::new(),
            match_id,
            innings_number,
            batting_team_id,
            bowling_team_id,
            total_runs: 0,
            total_wickets: 0,
            legal_balls: 0,
            total_overs: Decimal::ZERO,
            extras: Extras::default(),
            status: InningsStatus::NotStarted,
            target: None,
            crease: Crease::default(),
            batting_order: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_target(mut self, target: u32) -> Self {
        self.target = Some(target);
        self
    }

    pub fn is_completed(&self) -> bool {
        self.status == InningsStatus::Completed
    }

    pub fn is_in_progress(&self) -> bool {
        self.status == InningsStatus::InProgress
    }

    /// `"45/3"` style score.
    pub fn score_line(&self) -> String {
        format!("{}/{}", self.total_runs, self.total_wickets)
    }
}

/// Overs in the cricket display convention: whole overs, then the balls of
/// the current over as the fractional digits. Never a true division.
pub fn overs_display(legal_balls: u32, balls_per_over: u32) -> Decimal {
    let per_over = balls_per_over.max(1);
    let overs = i64::from(legal_balls / per_over);
    let balls = i64::from(legal_balls % per_over);
    let digits = (per_over - 1).max(1).ilog10() + 1;
    Decimal::new(overs * 10_i64.pow(digits) + balls, digits)
}
