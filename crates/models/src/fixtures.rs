use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::ids::{MatchId, PlayerId, TeamId};
use crate::rules::RulesConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlayerRole {
    Batsman,
    Bowler,
    AllRounder,
    WicketKeeper,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub team_id: TeamId,
    pub role: PlayerRole,
}

impl Player {
    pub fn new(name: impl Into<String>, team_id: TeamId, role: PlayerRole) -> Self {
        Self { id: PlayerId::new(), name: name.into(), team_id, role }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Team {
    pub fn new(name: impl Into<String>) -> Self {
        Self { id: TeamId::new(), name: name.into(), created_at: Utc::now() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchStatus {
    Upcoming,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TossDecision {
    Bat,
    Bowl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by", content = "value", rename_all = "lowercase")]
pub enum Margin {
    Runs(u32),
    Wickets(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum MatchResult {
    Won { winner_id: TeamId, margin: Option<Margin> },
    Tie,
    NoResult,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub team1_id: TeamId,
    pub team2_id: TeamId,
    pub rules: RulesConfig,
    pub venue: Option<String>,
    pub toss_winner_id: Option<TeamId>,
    pub toss_decision: Option<TossDecision>,
    pub status: MatchStatus,
    pub result: Option<MatchResult>,
    pub created_at: DateTime<Utc>,
}

impl Match {
    pub fn new(team1_id: TeamId, team2_id: TeamId, rules: RulesConfig) -> Self {
        Self {
            id: MatchId::new(),
            team1_id,
            team2_id,
            rules,
            venue: None,
            toss_winner_id: None,
            toss_decision: None,
            status: MatchStatus::Upcoming,
            result: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_venue(mut self, venue: impl Into<String>) -> Self {
        self.venue = Some(venue.into());
        self
    }

    pub fn with_toss(mut self, winner: TeamId, decision: TossDecision) -> Self {
        self.toss_winner_id = Some(winner);
        self.toss_decision = Some(decision);
        self
    }

    pub fn involves(&self, team_id: TeamId) -> bool {
        self.team1_id == team_id || self.team2_id == team_id
    }

    pub fn opponent_of(&self, team_id: TeamId) -> Option<TeamId> {
        if team_id == self.team1_id {
            Some(self.team2_id)
        } else if team_id == self.team2_id {
            Some(self.team1_id)
        } else {
            None
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self.status, MatchStatus::InProgress)
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.status, MatchStatus::Completed)
    }

    pub fn winner_id(&self) -> Option<TeamId> {
        match self.result {
            Some(MatchResult::Won { winner_id, .. }) => Some(winner_id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_creation() {
        let home = Team::new("Riverside CC");
        let away = Team::new("Hilltop XI");
        let m = Match::new(home.id, away.id, RulesConfig::default()).with_venue("Oval Park");

        assert_eq!(m.status, MatchStatus::Upcoming);
        assert_eq!(m.venue.as_deref(), Some("Oval Park"));
        assert!(!m.is_live());
        assert!(!m.is_finished());
        assert_eq!(m.opponent_of(home.id), Some(away.id));
        assert_eq!(m.opponent_of(TeamId::new()), None);
    }

    #[test]
    fn test_result_serialization() {
        let winner = TeamId::new();
        let result = MatchResult::Won { winner_id: winner, margin: Some(Margin::Runs(12)) };
        let json = serde_json::to_value(result).unwrap();
        assert_eq!(json["outcome"], "won");
        assert_eq!(json["margin"]["by"], "runs");
        assert_eq!(json["margin"]["value"], 12);
    }
}
