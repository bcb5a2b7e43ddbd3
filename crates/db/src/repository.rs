use async_trait::async_trait;
use criclive_models::{
    BallEvent, Innings, InningsId, Match, MatchId, Player, PlayerId, PlayerMatchStat, Result, Team,
    TeamId,
};

/// Storage for matches, innings, ball logs and per-innings player figures.
/// `commit_ball` and `revert_ball` each persist as one atomic unit.
#[async_trait]
pub trait ScoreRepository: Send + Sync {
    async fn create_match(&self, fixture: &Match) -> Result<()>;
    async fn get_match(&self, match_id: MatchId) -> Result<Option<Match>>;
    async fn update_match(&self, fixture: &Match) -> Result<()>;

    async fn create_innings(&self, innings: &Innings, stats: &[PlayerMatchStat]) -> Result<()>;
    async fn get_innings(&self, innings_id: InningsId) -> Result<Option<Innings>>;
    /// Innings of a match, ordered by innings number.
    async fn list_innings(&self, match_id: MatchId) -> Result<Vec<Innings>>;
    async fn save_innings(&self, innings: &Innings) -> Result<()>;

    async fn commit_ball(&self, innings: &Innings, event: &BallEvent, stats: &[PlayerMatchStat]) -> Result<()>;
    async fn revert_ball(&self, innings: &Innings, seq: u64, stats: &[PlayerMatchStat]) -> Result<()>;
    /// Ball log of an innings in sequence order.
    async fn list_balls(&self, innings_id: InningsId) -> Result<Vec<BallEvent>>;
    async fn list_stats(&self, innings_id: InningsId) -> Result<Vec<PlayerMatchStat>>;
}

/// Registered teams and their players.
#[async_trait]
pub trait PlayerDirectory: Send + Sync {
    async fn create_team(&self, team: &Team, players: &[Player]) -> Result<()>;
    async fn get_team(&self, team_id: TeamId) -> Result<Option<Team>>;
    /// Players in registration order.
    async fn team_players(&self, team_id: TeamId) -> Result<Vec<Player>>;
    async fn get_player(&self, player_id: PlayerId) -> Result<Option<Player>>;
}
