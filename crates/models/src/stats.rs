use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use crate::events::WicketType;
use crate::ids::{InningsId, MatchId, PlayerId, TeamId};
use crate::innings::overs_display;

/// How a batter got out, as shown on the scorecard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dismissal {
    pub kind: WicketType,
    pub bowler_id: PlayerId,
    pub fielder_id: Option<PlayerId>,
    /// e.g. `c Patel b Khan`, `run out (Silva)`.
    pub text: String,
}

/// One player's figures for one innings. Created zeroed when the innings
/// starts; adjusted by every ball that involves the player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerMatchStat {
    pub player_id: PlayerId,
    pub player_name: String,
    pub team_id: TeamId,
    pub match_id: MatchId,
    pub innings_id: InningsId,
    pub runs_scored: u32,
    pub balls_faced: u32,
    pub fours: u32,
    pub sixes: u32,
    pub balls_bowled: u32,
    pub overs_bowled: Decimal,
    pub runs_conceded: u32,
    pub wickets_taken: u32,
    pub maidens: u32,
    pub wides_bowled: u32,
    pub no_balls_bowled: u32,
    pub catches: u32,
    pub run_outs: u32,
    pub stumpings: u32,
    pub dismissal: Option<Dismissal>,
}

impl PlayerMatchStat {
    pub fn zeroed(
        player_id: PlayerId,
        player_name: impl Into<String>,
        team_id: TeamId,
        match_id: MatchId,
        innings_id: InningsId,
    ) -> Self {
        Self {
            player_id,
            player_name: player_name.into(),
            team_id,
            match_id,
            innings_id,
            runs_scored: 0,
            balls_faced: 0,
            fours: 0,
            sixes: 0,
            balls_bowled: 0,
            overs_bowled: Decimal::ZERO,
            runs_conceded: 0,
            wickets_taken: 0,
            maidens: 0,
            wides_bowled: 0,
            no_balls_bowled: 0,
            catches: 0,
            run_outs: 0,
            stumpings: 0,
            dismissal: None,
        }
    }

    pub fn refresh_overs(&mut self, balls_per_over: u32) {
        self.overs_bowled = overs_display(self.balls_bowled, balls_per_over);
    }

    pub fn has_bowled(&self) -> bool {
        self.balls_bowled > 0 || self.runs_conceded > 0 || self.wides_bowled > 0 || self.no_balls_bowled > 0
    }

    pub fn is_out(&self) -> bool {
        self.dismissal.is_some()
    }

    /// Fielding counter matching a dismissal kind, if that kind credits a fielder.
    pub fn fielding_counter_mut(&mut self, kind: WicketType) -> Option<&mut u32> {
        match kind {
            WicketType::Caught => Some(&mut self.catches),
            WicketType::RunOut => Some(&mut self.run_outs),
            WicketType::Stumped => Some(&mut self.stumpings),
            _ => None,
        }
    }
}
