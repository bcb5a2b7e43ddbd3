use std::collections::HashMap;
use criclive_models::{
    economy, overs_display, run_rate, strike_rate, BallEvent, BattingLine, BowlingLine, FallOfWicket,
    Innings, InningsSummary, Match, PlayerId, PlayerMatchStat, Scorecard, TeamId,
};

/// Everything persisted for one innings.
#[derive(Debug, Clone)]
pub struct PlayedInnings {
    pub innings: Innings,
    pub events: Vec<BallEvent>,
    pub stats: Vec<PlayerMatchStat>,
}

pub struct ScorecardBuilder<'a> {
    fixture: &'a Match,
    team_names: &'a HashMap<TeamId, String>,
}

impl<'a> ScorecardBuilder<'a> {
    pub fn new(fixture: &'a Match, team_names: &'a HashMap<TeamId, String>) -> Self {
        Self { fixture, team_names }
    }

    fn team_name(&self, team_id: TeamId) -> String {
        self.team_names.get(&team_id).cloned().unwrap_or_else(|| team_id.to_string())
    }

    pub fn build(&self, records: &[PlayedInnings]) -> Scorecard {
        let mut innings = Vec::with_capacity(records.len());
        let mut batting_stats = Vec::new();
        let mut bowling_stats = Vec::new();
        let mut fall_of_wickets = Vec::new();

        for record in records {
            innings.push(self.summary(record));
            batting_stats.extend(batting_lines(record));
            bowling_stats.extend(self.bowling_lines(record));
            fall_of_wickets.extend(self.fall_of_wickets(record));
        }

        Scorecard {
            fixture: self.fixture.clone(),
            innings,
            batting_stats,
            bowling_stats,
            fall_of_wickets,
        }
    }

    fn summary(&self, record: &PlayedInnings) -> InningsSummary {
        let innings = &record.innings;
        let powerplay_runs = record
            .events
            .iter()
            .filter(|e| e.is_powerplay)
            .map(|e| i64::from(e.total_runs))
            .sum();

        InningsSummary {
            innings: innings.clone(),
            batting_team_name: self.team_name(innings.batting_team_id),
            bowling_team_name: self.team_name(innings.bowling_team_id),
            run_rate: run_rate(innings.total_runs, innings.legal_balls, self.fixture.rules.balls_per_over),
            powerplay_runs,
        }
    }

    /// Bowlers in the order they first bowled.
    fn bowling_lines(&self, record: &PlayedInnings) -> Vec<BowlingLine> {
        let bpo = self.fixture.rules.balls_per_over;
        let mut order: Vec<PlayerId> = Vec::new();
        for event in &record.events {
            if !order.contains(&event.bowler_id) {
                order.push(event.bowler_id);
            }
        }

        order
            .iter()
            .filter_map(|id| record.stats.iter().find(|s| s.player_id == *id))
            .filter(|s| s.has_bowled())
            .map(|s| BowlingLine {
                innings_id: record.innings.id,
                player_id: s.player_id,
                player_name: s.player_name.clone(),
                overs: s.overs_bowled,
                maidens: s.maidens,
                runs: s.runs_conceded,
                wickets: s.wickets_taken,
                economy: economy(s.runs_conceded, s.balls_bowled, bpo),
                wides: s.wides_bowled,
                no_balls: s.no_balls_bowled,
            })
            .collect()
    }

    fn fall_of_wickets(&self, record: &PlayedInnings) -> Vec<FallOfWicket> {
        let bpo = self.fixture.rules.balls_per_over;
        let mut score: i64 = 0;
        let mut legal = 0_u32;
        let mut wickets = 0_u32;
        let mut fow = Vec::new();

        for event in &record.events {
            score += i64::from(event.total_runs);
            legal += u32::from(event.is_legal);
            let Some(wicket) = event.wicket else {
                continue;
            };
            wickets += 1;
            let player_name = record
                .stats
                .iter()
                .find(|s| s.player_id == wicket.dismissed_player_id)
                .map_or_else(|| wicket.dismissed_player_id.to_string(), |s| s.player_name.clone());
            fow.push(FallOfWicket {
                innings_id: record.innings.id,
                wicket_number: wickets,
                score: u32::try_from(score.max(0)).unwrap_or(u32::MAX),
                overs: overs_display(legal, bpo),
                player_id: wicket.dismissed_player_id,
                player_name,
            });
        }
        fow
    }
}

/// Batters in the order they came to the crease.
fn batting_lines(record: &PlayedInnings) -> Vec<BattingLine> {
    record
        .innings
        .batting_order
        .iter()
        .enumerate()
        .filter_map(|(idx, id)| {
            let s = record.stats.iter().find(|s| s.player_id == *id)?;
            Some(BattingLine {
                innings_id: record.innings.id,
                player_id: s.player_id,
                player_name: s.player_name.clone(),
                position: u32::try_from(idx + 1).unwrap_or(u32::MAX),
                runs: s.runs_scored,
                balls: s.balls_faced,
                fours: s.fours,
                sixes: s.sixes,
                strike_rate: strike_rate(s.runs_scored, s.balls_faced),
                status: s.dismissal.as_ref().map_or_else(|| "not out".to_string(), |d| d.text.clone()),
                is_out: s.is_out(),
            })
        })
        .collect()
}
