use async_trait::async_trait;
use criclive_models::{
    BallEvent, Innings, InningsId, Match, MatchId, Player, PlayerId, PlayerMatchStat, Result,
    ScoringError, Team, TeamId,
};
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};
use tracing::debug;
use crate::repository::{PlayerDirectory, ScoreRepository};
use crate::schema::{
    encode_label, to_db_int, BallEventRecord, InningsRecord, MatchRecord, PlayerRecord,
    PlayerStatRecord, TeamRecord,
};

const INNINGS_COLUMNS: &str = "id, match_id, innings_number, batting_team_id, bowling_team_id, \
     total_runs, total_wickets, legal_balls, total_overs, extras, status, target, crease, \
     batting_order, created_at";

const MATCH_COLUMNS: &str =
    "id, team1_id, team2_id, rules, venue, toss_winner_id, toss_decision, status, result, created_at";

fn seq_to_db(seq: u64) -> i64 {
    i64::try_from(seq).unwrap_or(i64::MAX)
}

/// PostgreSQL-backed store. Each ball commit or revert runs in one transaction.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn write_innings(conn: &mut PgConnection, innings: &Innings) -> Result<()> {
        let result = sqlx::query(
            "UPDATE innings SET total_runs = $2, total_wickets = $3, legal_balls = $4, total_overs = $5, \
             extras = $6, status = $7, target = $8, crease = $9, batting_order = $10, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(innings.id.as_uuid())
        .bind(to_db_int(innings.total_runs))
        .bind(to_db_int(innings.total_wickets))
        .bind(to_db_int(innings.legal_balls))
        .bind(innings.total_overs.to_string())
        .bind(Json(&innings.extras))
        .bind(encode_label(&innings.status)?)
        .bind(innings.target.map(to_db_int))
        .bind(Json(&innings.crease))
        .bind(Json(&innings.batting_order))
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ScoringError::invalid_innings(innings.id, "innings not found"));
        }
        Ok(())
    }

    async fn upsert_stats(conn: &mut PgConnection, stats: &[PlayerMatchStat]) -> Result<()> {
        for (position, row) in stats.iter().enumerate() {
            sqlx::query(
                "INSERT INTO player_match_stats (innings_id, player_id, match_id, team_id, roster_position, payload) \
                 VALUES ($1, $2, $3, $4, $5, $6) \
                 ON CONFLICT (innings_id, player_id) DO UPDATE SET payload = EXCLUDED.payload, updated_at = NOW()",
            )
            .bind(row.innings_id.as_uuid())
            .bind(row.player_id.as_uuid())
            .bind(row.match_id.as_uuid())
            .bind(row.team_id.as_uuid())
            .bind(i32::try_from(position).unwrap_or(i32::MAX))
            .bind(Json(row))
            .execute(&mut *conn)
            .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl ScoreRepository for PgStore {
    async fn create_match(&self, fixture: &Match) -> Result<()> {
        sqlx::query(
            "INSERT INTO matches (id, team1_id, team2_id, rules, venue, toss_winner_id, toss_decision, status, result, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(fixture.id.as_uuid())
        .bind(fixture.team1_id.as_uuid())
        .bind(fixture.team2_id.as_uuid())
        .bind(Json(&fixture.rules))
        .bind(fixture.venue.as_deref())
        .bind(fixture.toss_winner_id.map(|id| id.as_uuid()))
        .bind(fixture.toss_decision.as_ref().map(encode_label).transpose()?)
        .bind(encode_label(&fixture.status)?)
        .bind(fixture.result.as_ref().map(Json))
        .bind(fixture.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_match(&self, match_id: MatchId) -> Result<Option<Match>> {
        let query = format!("SELECT {MATCH_COLUMNS} FROM matches WHERE id = $1");
        let record = sqlx::query_as::<_, MatchRecord>(&query)
            .bind(match_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        record.map(Match::try_from).transpose()
    }

    async fn update_match(&self, fixture: &Match) -> Result<()> {
        let result = sqlx::query(
            "UPDATE matches SET venue = $2, toss_winner_id = $3, toss_decision = $4, status = $5, result = $6, \
             updated_at = NOW() WHERE id = $1",
        )
        .bind(fixture.id.as_uuid())
        .bind(fixture.venue.as_deref())
        .bind(fixture.toss_winner_id.map(|id| id.as_uuid()))
        .bind(fixture.toss_decision.as_ref().map(encode_label).transpose()?)
        .bind(encode_label(&fixture.status)?)
        .bind(fixture.result.as_ref().map(Json))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ScoringError::MatchNotFound { match_id: fixture.id.to_string() });
        }
        Ok(())
    }

    async fn create_innings(&self, innings: &Innings, stats: &[PlayerMatchStat]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO innings (id, match_id, innings_number, batting_team_id, bowling_team_id, total_runs, \
             total_wickets, legal_balls, total_overs, extras, status, target, crease, batting_order, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)",
        )
        .bind(innings.id.as_uuid())
        .bind(innings.match_id.as_uuid())
        .bind(to_db_int(innings.innings_number))
        .bind(innings.batting_team_id.as_uuid())
        .bind(innings.bowling_team_id.as_uuid())
        .bind(to_db_int(innings.total_runs))
        .bind(to_db_int(innings.total_wickets))
        .bind(to_db_int(innings.legal_balls))
        .bind(innings.total_overs.to_string())
        .bind(Json(&innings.extras))
        .bind(encode_label(&innings.status)?)
        .bind(innings.target.map(to_db_int))
        .bind(Json(&innings.crease))
        .bind(Json(&innings.batting_order))
        .bind(innings.created_at)
        .execute(&mut *tx)
        .await?;

        Self::upsert_stats(&mut tx, stats).await?;
        tx.commit().await?;
        debug!(innings_id = %innings.id, rows = stats.len(), "innings created");
        Ok(())
    }

    async fn get_innings(&self, innings_id: InningsId) -> Result<Option<Innings>> {
        let query = format!("SELECT {INNINGS_COLUMNS} FROM innings WHERE id = $1");
        let record = sqlx::query_as::<_, InningsRecord>(&query)
            .bind(innings_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        record.map(Innings::try_from).transpose()
    }

    async fn list_innings(&self, match_id: MatchId) -> Result<Vec<Innings>> {
        let query = format!("SELECT {INNINGS_COLUMNS} FROM innings WHERE match_id = $1 ORDER BY innings_number");
        let records = sqlx::query_as::<_, InningsRecord>(&query)
            .bind(match_id.as_uuid())
            .fetch_all(&self.pool)
            .await?;
        records.into_iter().map(Innings::try_from).collect()
    }

    async fn save_innings(&self, innings: &Innings) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        Self::write_innings(&mut conn, innings).await
    }

    async fn commit_ball(&self, innings: &Innings, event: &BallEvent, stats: &[PlayerMatchStat]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO ball_events (innings_id, seq, over_number, ball_number, total_runs, is_wicket, payload, recorded_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(event.innings_id.as_uuid())
        .bind(seq_to_db(event.seq))
        .bind(to_db_int(event.over_number))
        .bind(to_db_int(event.ball_number))
        .bind(event.total_runs)
        .bind(event.is_wicket())
        .bind(Json(event))
        .bind(event.recorded_at)
        .execute(&mut *tx)
        .await?;

        Self::upsert_stats(&mut tx, stats).await?;
        Self::write_innings(&mut tx, innings).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn revert_ball(&self, innings: &Innings, seq: u64, stats: &[PlayerMatchStat]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        let deleted = sqlx::query(
            "DELETE FROM ball_events WHERE innings_id = $1 AND seq = $2 \
             AND seq = (SELECT MAX(seq) FROM ball_events WHERE innings_id = $1)",
        )
        .bind(innings.id.as_uuid())
        .bind(seq_to_db(seq))
        .execute(&mut *tx)
        .await?;

        if deleted.rows_affected() != 1 {
            return Err(ScoringError::InvalidState(format!("ball {seq} is not the last stored ball")));
        }

        Self::upsert_stats(&mut tx, stats).await?;
        Self::write_innings(&mut tx, innings).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn list_balls(&self, innings_id: InningsId) -> Result<Vec<BallEvent>> {
        let records = sqlx::query_as::<_, BallEventRecord>(
            "SELECT innings_id, seq, payload FROM ball_events WHERE innings_id = $1 ORDER BY seq",
        )
        .bind(innings_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        Ok(records.into_iter().map(BallEvent::from).collect())
    }

    async fn list_stats(&self, innings_id: InningsId) -> Result<Vec<PlayerMatchStat>> {
        let records = sqlx::query_as::<_, PlayerStatRecord>(
            "SELECT innings_id, player_id, payload FROM player_match_stats WHERE innings_id = $1 ORDER BY roster_position",
        )
        .bind(innings_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        Ok(records.into_iter().map(PlayerMatchStat::from).collect())
    }
}

#[async_trait]
impl PlayerDirectory for PgStore {
    async fn create_team(&self, team: &Team, players: &[Player]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("INSERT INTO teams (id, name, created_at) VALUES ($1, $2, $3)")
            .bind(team.id.as_uuid())
            .bind(&team.name)
            .bind(team.created_at)
            .execute(&mut *tx)
            .await?;

        for (position, player) in players.iter().enumerate() {
            sqlx::query("INSERT INTO players (id, team_id, name, role, roster_position) VALUES ($1, $2, $3, $4, $5)")
                .bind(player.id.as_uuid())
                .bind(team.id.as_uuid())
                .bind(&player.name)
                .bind(encode_label(&player.role)?)
                .bind(i32::try_from(position).unwrap_or(i32::MAX))
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn get_team(&self, team_id: TeamId) -> Result<Option<Team>> {
        let record = sqlx::query_as::<_, TeamRecord>("SELECT id, name, created_at FROM teams WHERE id = $1")
            .bind(team_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        Ok(record.map(Team::from))
    }

    async fn team_players(&self, team_id: TeamId) -> Result<Vec<Player>> {
        let records = sqlx::query_as::<_, PlayerRecord>(
            "SELECT id, team_id, name, role, roster_position FROM players WHERE team_id = $1 ORDER BY roster_position",
        )
        .bind(team_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        records.into_iter().map(Player::try_from).collect()
    }

    async fn get_player(&self, player_id: PlayerId) -> Result<Option<Player>> {
        let record = sqlx::query_as::<_, PlayerRecord>(
            "SELECT id, team_id, name, role, roster_position FROM players WHERE id = $1",
        )
        .bind(player_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        record.map(Player::try_from).transpose()
    }
}
