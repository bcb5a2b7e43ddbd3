use std::collections::HashMap;
use async_trait::async_trait;
use criclive_models::{
    BallEvent, Innings, InningsId, Match, MatchId, Player, PlayerId, PlayerMatchStat, Result,
    ScoringError, Team, TeamId,
};
use parking_lot::RwLock;
use crate::repository::{PlayerDirectory, ScoreRepository};

#[derive(Default)]
struct Tables {
    matches: HashMap<MatchId, Match>,
    innings: HashMap<InningsId, Innings>,
    balls: HashMap<InningsId, Vec<BallEvent>>,
    stats: HashMap<InningsId, Vec<PlayerMatchStat>>,
    teams: HashMap<TeamId, Team>,
    rosters: HashMap<TeamId, Vec<PlayerId>>,
    players: HashMap<PlayerId, Player>,
}

impl Tables {
    fn upsert_stats(&mut self, innings_id: InningsId, rows: &[PlayerMatchStat]) {
        let table = self.stats.entry(innings_id).or_default();
        for row in rows {
            match table.iter_mut().find(|s| s.player_id == row.player_id) {
                Some(existing) => *existing = row.clone(),
                None => table.push(row.clone()),
            }
        }
    }

    fn ensure_innings(&self, innings_id: InningsId) -> Result<()> {
        if self.innings.contains_key(&innings_id) {
            Ok(())
        } else {
            Err(ScoringError::invalid_innings(innings_id, "innings not found"))
        }
    }
}

/// Process-local store. Every write takes the one lock, so each commit is
/// atomic with respect to readers.
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ScoreRepository for InMemoryStore {
    async fn create_match(&self, fixture: &Match) -> Result<()> {
        self.tables.write().matches.insert(fixture.id, fixture.clone());
        Ok(())
    }

    async fn get_match(&self, match_id: MatchId) -> Result<Option<Match>> {
        Ok(self.tables.read().matches.get(&match_id).cloned())
    }

    async fn update_match(&self, fixture: &Match) -> Result<()> {
        let mut tables = self.tables.write();
        match tables.matches.get_mut(&fixture.id) {
            Some(existing) => {
                *existing = fixture.clone();
                Ok(())
            }
            None => Err(ScoringError::MatchNotFound { match_id: fixture.id.to_string() }),
        }
    }

    async fn create_innings(&self, innings: &Innings, stats: &[PlayerMatchStat]) -> Result<()> {
        let mut tables = self.tables.write();
        if !tables.matches.contains_key(&innings.match_id) {
            return Err(ScoringError::MatchNotFound { match_id: innings.match_id.to_string() });
        }
        tables.innings.insert(innings.id, innings.clone());
        tables.balls.insert(innings.id, Vec::new());
        tables.stats.insert(innings.id, stats.to_vec());
        Ok(())
    }

    async fn get_innings(&self, innings_id: InningsId) -> Result<Option<Innings>> {
        Ok(self.tables.read().innings.get(&innings_id).cloned())
    }

    async fn list_innings(&self, match_id: MatchId) -> Result<Vec<Innings>> {
        let tables = self.tables.read();
        let mut innings: Vec<Innings> = tables
            .innings
            .values()
            .filter(|i| i.match_id == match_id)
            .cloned()
            .collect();
        innings.sort_by_key(|i| i.innings_number);
        Ok(innings)
    }

    async fn save_innings(&self, innings: &Innings) -> Result<()> {
        let mut tables = self.tables.write();
        tables.ensure_innings(innings.id)?;
        tables.innings.insert(innings.id, innings.clone());
        Ok(())
    }

    async fn commit_ball(&self, innings: &Innings, event: &BallEvent, stats: &[PlayerMatchStat]) -> Result<()> {
        let mut tables = self.tables.write();
        tables.ensure_innings(innings.id)?;
        let log = tables.balls.entry(innings.id).or_default();
        if log.last().map_or(false, |last| last.seq >= event.seq) {
            return Err(ScoringError::InvalidState(format!(
                "ball {} is not after the last stored ball",
                event.seq
            )));
        }
        log.push(event.clone());
        tables.upsert_stats(innings.id, stats);
        tables.innings.insert(innings.id, innings.clone());
        Ok(())
    }

    async fn revert_ball(&self, innings: &Innings, seq: u64, stats: &[PlayerMatchStat]) -> Result<()> {
        let mut tables = self.tables.write();
        tables.ensure_innings(innings.id)?;
        let log = tables.balls.entry(innings.id).or_default();
        if log.last().map(|last| last.seq) != Some(seq) {
            return Err(ScoringError::InvalidState(format!("ball {seq} is not the last stored ball")));
        }
        log.pop();
        tables.upsert_stats(innings.id, stats);
        tables.innings.insert(innings.id, innings.clone());
        Ok(())
    }

    async fn list_balls(&self, innings_id: InningsId) -> Result<Vec<BallEvent>> {
        Ok(self.tables.read().balls.get(&innings_id).cloned().unwrap_or_default())
    }

    async fn list_stats(&self, innings_id: InningsId) -> Result<Vec<PlayerMatchStat>> {
        Ok(self.tables.read().stats.get(&innings_id).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl PlayerDirectory for InMemoryStore {
    async fn create_team(&self, team: &Team, players: &[Player]) -> Result<()> {
        let mut tables = self.tables.write();
        tables.teams.insert(team.id, team.clone());
        tables
            .rosters
            .insert(team.id, players.iter().map(|p| p.id).collect());
        for player in players {
            tables.players.insert(player.id, player.clone());
        }
        Ok(())
    }

    async fn get_team(&self, team_id: TeamId) -> Result<Option<Team>> {
        Ok(self.tables.read().teams.get(&team_id).cloned())
    }

    async fn team_players(&self, team_id: TeamId) -> Result<Vec<Player>> {
        let tables = self.tables.read();
        let roster = tables.rosters.get(&team_id).map(Vec::as_slice).unwrap_or_default();
        Ok(roster.iter().filter_map(|id| tables.players.get(id).cloned()).collect())
    }

    async fn get_player(&self, player_id: PlayerId) -> Result<Option<Player>> {
        Ok(self.tables.read().players.get(&player_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use criclive_models::{PlayerRole, RulesConfig};

    fn event(innings_id: InningsId, seq: u64) -> BallEvent {
        BallEvent {
            seq,
            innings_id,
            over_number: 1,
            ball_number: u32::try_from(seq).unwrap(),
            is_legal: true,
            striker_id: PlayerId::new(),
            bowler_id: PlayerId::new(),
            runs_off_bat: 1,
            runs_completed: 1,
            extra_type: None,
            extra_runs: 0,
            penalty_runs: 0,
            total_runs: 1,
            is_boundary: false,
            multiplier: None,
            wicket: None,
            is_free_hit: false,
            is_bouncer: false,
            is_powerplay: false,
            completed_maiden: false,
            recorded_at: Utc::now(),
        }
    }

    async fn seeded() -> (InMemoryStore, Innings, PlayerMatchStat) {
        let store = InMemoryStore::new();
        let home = Team::new("Riverside CC");
        let away = Team::new("Hilltop XI");
        let fixture = Match::new(home.id, away.id, RulesConfig::default());
        store.create_match(&fixture).await.unwrap();

        let innings = Innings::new(fixture.id, 1, home.id, away.id);
        let stat = PlayerMatchStat::zeroed(PlayerId::new(), "Asha", home.id, fixture.id, innings.id);
        store.create_innings(&innings, std::slice::from_ref(&stat)).await.unwrap();
        (store, innings, stat)
    }

    #[tokio::test]
    async fn test_commit_and_revert_ball() {
        let (store, mut innings, mut stat) = seeded().await;

        innings.total_runs = 1;
        stat.runs_scored = 1;
        store.commit_ball(&innings, &event(innings.id, 1), std::slice::from_ref(&stat)).await.unwrap();

        assert_eq!(store.list_balls(innings.id).await.unwrap().len(), 1);
        assert_eq!(store.get_innings(innings.id).await.unwrap().unwrap().total_runs, 1);
        assert_eq!(store.list_stats(innings.id).await.unwrap()[0].runs_scored, 1);

        innings.total_runs = 0;
        stat.runs_scored = 0;
        store.revert_ball(&innings, 1, std::slice::from_ref(&stat)).await.unwrap();
        assert!(store.list_balls(innings.id).await.unwrap().is_empty());
        assert_eq!(store.list_stats(innings.id).await.unwrap()[0].runs_scored, 0);
    }

    #[tokio::test]
    async fn test_out_of_order_commit_rejected() {
        let (store, innings, _) = seeded().await;
        store.commit_ball(&innings, &event(innings.id, 2), &[]).await.unwrap();
        let result = store.commit_ball(&innings, &event(innings.id, 1), &[]).await;
        assert!(matches!(result, Err(ScoringError::InvalidState(_))));
        assert!(store.revert_ball(&innings, 1, &[]).await.is_err());
    }

    #[tokio::test]
    async fn test_unknown_innings_rejected() {
        let store = InMemoryStore::new();
        let innings = Innings::new(MatchId::new(), 1, TeamId::new(), TeamId::new());
        let result = store.commit_ball(&innings, &event(innings.id, 1), &[]).await;
        assert!(matches!(result, Err(ScoringError::InvalidInnings { .. })));
        assert!(matches!(
            store.create_innings(&innings, &[]).await,
            Err(ScoringError::MatchNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_team_roster_keeps_registration_order() {
        let store = InMemoryStore::new();
        let team = Team::new("Riverside CC");
        let players: Vec<Player> = ["Asha", "Ben", "Cal"]
            .iter()
            .map(|n| Player::new(*n, team.id, PlayerRole::Batsman))
            .collect();
        store.create_team(&team, &players).await.unwrap();

        let roster = store.team_players(team.id).await.unwrap();
        assert_eq!(roster, players);
        assert_eq!(store.get_player(players[1].id).await.unwrap().unwrap().name, "Ben");
        assert!(store.team_players(TeamId::new()).await.unwrap().is_empty());
    }
}
