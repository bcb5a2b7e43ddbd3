// Match orchestration around the innings aggregator: persistence, live
// state, announcements and metrics.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use chrono::Utc;
use criclive_db::{PlayerDirectory, ScoreRepository};
use criclive_models::{
    BallEvent, BallEventInput, BallPreview, Innings, InningsId, LiveSnapshot, Margin, Match,
    MatchId, MatchResult, MatchStatus, Player, PlayerId, PlayerRole, Result, RulesConfig,
    Scorecard, ScoringError, Team, TeamId, TossDecision,
};
use criclive_stream::{ScoreNotifier, ScoreUpdate, StreamMessage};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use crate::aggregator::InningsState;
use crate::metrics::{LatencyTracker, ScoringMetrics};
use crate::scorecard::{PlayedInnings, ScorecardBuilder};

type LiveInnings = Arc<Mutex<InningsState>>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPlayer {
    pub name: String,
    pub role: PlayerRole,
}

impl NewPlayer {
    pub fn new(name: impl Into<String>, role: PlayerRole) -> Self {
        Self { name: name.into(), role }
    }
}

/// Everything needed to schedule a match. Rules fall back to the service
/// defaults when absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchSetup {
    pub team1_id: TeamId,
    pub team2_id: TeamId,
    #[serde(default)]
    pub rules: Option<RulesConfig>,
    #[serde(default)]
    pub venue: Option<String>,
    #[serde(default)]
    pub toss_winner_id: Option<TeamId>,
    #[serde(default)]
    pub toss_decision: Option<TossDecision>,
}

impl MatchSetup {
    pub fn new(team1_id: TeamId, team2_id: TeamId) -> Self {
        Self {
            team1_id,
            team2_id,
            rules: None,
            venue: None,
            toss_winner_id: None,
            toss_decision: None,
        }
    }

    pub fn with_rules(mut self, rules: RulesConfig) -> Self {
        self.rules = Some(rules);
        self
    }
}

/// Scoring entry point shared by every scorer and viewer connection.
///
/// Each innings is owned by one async mutex held across evaluation, commit
/// and announcement, so balls of an innings are numbered, stored and
/// announced in a single order. Lifecycle changes of a match are serialized
/// by a separate per-match mutex.
pub struct ScoringService {
    repository: Arc<dyn ScoreRepository>,
    directory: Arc<dyn PlayerDirectory>,
    notifier: Arc<dyn ScoreNotifier>,
    metrics: ScoringMetrics,
    default_rules: RulesConfig,
    live: DashMap<InningsId, LiveInnings>,
    match_locks: DashMap<MatchId, Arc<Mutex<()>>>,
}

impl ScoringService {
    pub fn new(
        repository: Arc<dyn ScoreRepository>,
        directory: Arc<dyn PlayerDirectory>,
        notifier: Arc<dyn ScoreNotifier>,
        metrics: ScoringMetrics,
    ) -> Self {
        Self {
            repository,
            directory,
            notifier,
            metrics,
            default_rules: RulesConfig::default(),
            live: DashMap::new(),
            match_locks: DashMap::new(),
        }
    }

    pub fn with_default_rules(mut self, rules: RulesConfig) -> Self {
        self.default_rules = rules;
        self
    }

    pub fn metrics(&self) -> &ScoringMetrics {
        &self.metrics
    }

    pub fn default_rules(&self) -> &RulesConfig {
        &self.default_rules
    }

    // Teams and fixtures

    pub async fn register_team(&self, name: &str, players: &[NewPlayer]) -> Result<(Team, Vec<Player>)> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ScoringError::InvalidState("team name must not be empty".to_string()));
        }
        if players.is_empty() {
            return Err(ScoringError::InvalidState("a team needs at least one player".to_string()));
        }
        if players.iter().any(|p| p.name.trim().is_empty()) {
            return Err(ScoringError::InvalidState("player names must not be empty".to_string()));
        }

        let team = Team::new(name);
        let roster: Vec<Player> = players
            .iter()
            .map(|p| Player::new(p.name.trim(), team.id, p.role))
            .collect();
        self.directory.create_team(&team, &roster).await?;

        info!("👥 Registered team {} with {} players", team.name, roster.len());
        Ok((team, roster))
    }

    pub async fn get_team(&self, team_id: TeamId) -> Result<Team> {
        self.directory
            .get_team(team_id)
            .await?
            .ok_or_else(|| ScoringError::TeamNotFound { team_id: team_id.to_string() })
    }

    pub async fn create_match(&self, setup: MatchSetup) -> Result<Match> {
        if setup.team1_id == setup.team2_id {
            return Err(ScoringError::InvalidState("a team cannot play itself".to_string()));
        }
        self.get_team(setup.team1_id).await?;
        self.get_team(setup.team2_id).await?;

        let rules = setup.rules.unwrap_or_else(|| self.default_rules.clone());
        rules.validate()?;

        let mut fixture = Match::new(setup.team1_id, setup.team2_id, rules);
        fixture.venue = setup.venue;
        match (setup.toss_winner_id, setup.toss_decision) {
            (Some(winner), Some(decision)) => {
                if !fixture.involves(winner) {
                    return Err(ScoringError::InvalidState("toss winner is not playing this match".to_string()));
                }
                fixture = fixture.with_toss(winner, decision);
            }
            (None, None) => {}
            _ => {
                return Err(ScoringError::InvalidState(
                    "toss winner and toss decision must be given together".to_string(),
                ));
            }
        }

        self.repository.create_match(&fixture).await?;
        info!(
            "📅 Created match {} ({} overs, {} balls per over)",
            fixture.id, fixture.rules.overs_limit, fixture.rules.balls_per_over
        );
        Ok(fixture)
    }

    pub async fn get_match(&self, match_id: MatchId) -> Result<Match> {
        self.repository
            .get_match(match_id)
            .await?
            .ok_or_else(|| ScoringError::MatchNotFound { match_id: match_id.to_string() })
    }

    fn match_lock(&self, match_id: MatchId) -> Arc<Mutex<()>> {
        self.match_locks.entry(match_id).or_default().value().clone()
    }

    // Innings lifecycle

    pub async fn start_innings(
        &self,
        match_id: MatchId,
        batting_team_id: TeamId,
        bowling_team_id: TeamId,
        innings_number: u32,
    ) -> Result<Innings> {
        let lock = self.match_lock(match_id);
        let _guard = lock.lock().await;
        self.open_innings(match_id, batting_team_id, bowling_team_id, innings_number).await
    }

    /// First innings, batted by `batting_team_id`.
    pub async fn start_match(&self, match_id: MatchId, batting_team_id: TeamId) -> Result<Innings> {
        let fixture = self.get_match(match_id).await?;
        let bowling_team_id = fixture.opponent_of(batting_team_id).ok_or_else(|| {
            ScoringError::InvalidState(format!("team {} is not playing match {}", batting_team_id, match_id))
        })?;
        self.start_innings(match_id, batting_team_id, bowling_team_id, 1).await
    }

    /// Second innings with the sides swapped, chasing first total + 1.
    pub async fn start_second_innings(&self, match_id: MatchId) -> Result<Innings> {
        let lock = self.match_lock(match_id);
        let _guard = lock.lock().await;

        let played = self.repository.list_innings(match_id).await?;
        let first = played
            .iter()
            .find(|i| i.innings_number == 1)
            .ok_or_else(|| ScoringError::InvalidState("the first innings has not been played".to_string()))?;
        self.open_innings(match_id, first.bowling_team_id, first.batting_team_id, 2).await
    }

    async fn open_innings(
        &self,
        match_id: MatchId,
        batting_team_id: TeamId,
        bowling_team_id: TeamId,
        innings_number: u32,
    ) -> Result<Innings> {
        let mut fixture = self.get_match(match_id).await?;
        if fixture.is_finished() {
            return Err(ScoringError::InvalidState(format!("match {} is already completed", match_id)));
        }
        if batting_team_id == bowling_team_id
            || !fixture.involves(batting_team_id)
            || !fixture.involves(bowling_team_id)
        {
            return Err(ScoringError::InvalidState(format!(
                "batting and bowling sides must be the two teams of match {}",
                match_id
            )));
        }

        let existing = self.repository.list_innings(match_id).await?;
        if existing.iter().any(|i| i.innings_number == innings_number) {
            return Err(ScoringError::InvalidState(format!("innings {} has already been started", innings_number)));
        }
        if let Some(open) = existing.iter().find(|i| !i.is_completed()) {
            return Err(ScoringError::InvalidState(format!(
                "innings {} is still in progress",
                open.innings_number
            )));
        }

        let mut innings = Innings::new(match_id, innings_number, batting_team_id, bowling_team_id);
        match innings_number {
            1 => {}
            2 => {
                let first = existing.iter().find(|i| i.innings_number == 1).ok_or_else(|| {
                    ScoringError::InvalidState("the first innings has not been played".to_string())
                })?;
                if first.batting_team_id != bowling_team_id {
                    return Err(ScoringError::InvalidState(
                        "the sides must swap for the second innings".to_string(),
                    ));
                }
                innings = innings.with_target(first.total_runs + 1);
            }
            n => {
                return Err(ScoringError::InvalidState(format!("innings number {} is not supported", n)));
            }
        }

        let batting = self.directory.team_players(batting_team_id).await?;
        let bowling = self.directory.team_players(bowling_team_id).await?;
        let state = InningsState::start(innings, fixture.rules.clone(), &batting, &bowling)?;
        self.repository.create_innings(state.innings(), &state.stats()).await?;

        if fixture.status == MatchStatus::Upcoming {
            fixture.status = MatchStatus::InProgress;
            self.repository.update_match(&fixture).await?;
        }

        let innings = state.innings().clone();
        self.live.insert(innings.id, Arc::new(Mutex::new(state)));
        match innings.target {
            Some(target) => info!("🏏 Innings {} of match {} started, target {}", innings_number, match_id, target),
            None => info!("🏏 Innings {} of match {} started", innings_number, match_id),
        }

        self.announce(match_id, Some(innings.id), ScoreUpdate::InningsStarted { innings: innings.clone() })
            .await;
        Ok(innings)
    }

    /// Completes any open innings and records the result. Without an explicit
    /// winner the result is derived from the two innings totals.
    pub async fn end_match(&self, match_id: MatchId, winner_id: Option<TeamId>) -> Result<Match> {
        let lock = self.match_lock(match_id);
        let _guard = lock.lock().await;

        let mut fixture = self.get_match(match_id).await?;
        if fixture.is_finished() {
            return Err(ScoringError::InvalidState(format!("match {} is already completed", match_id)));
        }
        if let Some(winner) = winner_id {
            if !fixture.involves(winner) {
                return Err(ScoringError::InvalidState(format!("team {} is not playing match {}", winner, match_id)));
            }
        }

        let mut played = self.repository.list_innings(match_id).await?;
        for innings in played.iter_mut().filter(|i| !i.is_completed()) {
            let cell = self.live_innings(innings.id).await?;
            let mut state = cell.lock().await;
            state.close();
            self.repository.save_innings(state.innings()).await?;
            *innings = state.innings().clone();

            self.metrics.record_innings_completed();
            info!("🏁 Innings {} closed at {}", innings.innings_number, innings.score_line());
            self.announce(match_id, Some(innings.id), ScoreUpdate::InningsCompleted { innings: innings.clone() })
                .await;
        }

        let derived = self.derive_result(&fixture, &played).await?;
        let result = match (winner_id, derived) {
            (None, derived) => derived,
            (Some(winner), MatchResult::Won { winner_id: derived_winner, margin }) if derived_winner == winner => {
                MatchResult::Won { winner_id: winner, margin }
            }
            (Some(winner), _) => MatchResult::Won { winner_id: winner, margin: None },
        };

        fixture.status = MatchStatus::Completed;
        fixture.result = Some(result);
        self.repository.update_match(&fixture).await?;

        info!("🏆 Match {} ended: {:?}", match_id, result);
        self.announce(match_id, None, ScoreUpdate::MatchEnded { result }).await;
        Ok(fixture)
    }

    async fn derive_result(&self, fixture: &Match, played: &[Innings]) -> Result<MatchResult> {
        let completed = |n: u32| played.iter().find(|i| i.innings_number == n && i.is_completed());
        let (Some(first), Some(second)) = (completed(1), completed(2)) else {
            return Ok(MatchResult::NoResult);
        };

        let result = match second.total_runs.cmp(&first.total_runs) {
            Ordering::Greater => {
                let roster = self.directory.team_players(second.batting_team_id).await?.len();
                let remaining = fixture.rules.wicket_limit(roster).saturating_sub(second.total_wickets);
                MatchResult::Won {
                    winner_id: second.batting_team_id,
                    margin: Some(Margin::Wickets(remaining)),
                }
            }
            Ordering::Less => MatchResult::Won {
                winner_id: first.batting_team_id,
                margin: Some(Margin::Runs(first.total_runs - second.total_runs)),
            },
            Ordering::Equal => MatchResult::Tie,
        };
        Ok(result)
    }

    // Ball-by-ball scoring

    /// Live state of an innings, rebuilt from storage on first use.
    async fn live_innings(&self, innings_id: InningsId) -> Result<LiveInnings> {
        let cached = self.live.get(&innings_id).map(|entry| entry.value().clone());
        if let Some(cell) = cached {
            return Ok(cell);
        }

        let innings = self
            .repository
            .get_innings(innings_id)
            .await?
            .ok_or_else(|| ScoringError::invalid_innings(innings_id, "innings not found"))?;
        let fixture = self.get_match(innings.match_id).await?;
        let events = self.repository.list_balls(innings_id).await?;
        let stats = self.repository.list_stats(innings_id).await?;
        debug!(innings_id = %innings_id, balls = events.len(), "innings state restored from storage");

        let state = InningsState::restore(innings, fixture.rules, events, stats);
        let cell = self
            .live
            .entry(innings_id)
            .or_insert_with(|| Arc::new(Mutex::new(state)))
            .value()
            .clone();
        Ok(cell)
    }

    fn reject(&self, operation: &str, innings_id: InningsId, err: &ScoringError) {
        self.metrics.record_rejection(err.kind());
        warn!("⚠️ {} rejected for innings {}: {}", operation, innings_id, err);
    }

    pub async fn apply_ball(&self, innings_id: InningsId, input: &BallEventInput) -> Result<(Innings, BallEvent)> {
        let timer = LatencyTracker::start();
        match self.record_ball(innings_id, input).await {
            Ok((innings, event)) => {
                self.metrics.record_ball(event.is_boundary, timer.elapsed());
                Ok((innings, event))
            }
            Err(e) => {
                self.reject("apply_ball", innings_id, &e);
                Err(e)
            }
        }
    }

    async fn record_ball(&self, innings_id: InningsId, input: &BallEventInput) -> Result<(Innings, BallEvent)> {
        let cell = self.live_innings(innings_id).await?;
        let mut state = cell.lock().await;

        let crease_before = state.innings().crease;
        let order_before = state.innings().batting_order.clone();
        let applied = state.apply_ball(input, Utc::now())?;
        let innings = state.innings().clone();

        if let Err(e) = self.repository.commit_ball(&innings, &applied.event, &applied.stats).await {
            if let Err(undo_err) = state.undo_last() {
                error!("❌ Could not reverse uncommitted ball in innings {}: {}", innings_id, undo_err);
            }
            state.reset_crease(crease_before, order_before);
            return Err(e);
        }

        let event = applied.event;
        self.announce(
            innings.match_id,
            Some(innings_id),
            ScoreUpdate::BallRecorded { event: event.clone(), snapshot: state.snapshot() },
        )
        .await;

        if innings.is_completed() {
            self.metrics.record_innings_completed();
            info!(
                "🏁 Innings {} completed at {} ({} overs)",
                innings.innings_number,
                innings.score_line(),
                innings.total_overs
            );
            self.announce(innings.match_id, Some(innings_id), ScoreUpdate::InningsCompleted { innings: innings.clone() })
                .await;
        }

        Ok((innings, event))
    }

    /// Removes the most recent ball. The crease stays where the removed ball
    /// left it.
    pub async fn undo_last(&self, innings_id: InningsId) -> Result<BallEvent> {
        match self.reverse_ball(innings_id).await {
            Ok(event) => {
                self.metrics.record_undo();
                Ok(event)
            }
            Err(e) => {
                self.reject("undo_last", innings_id, &e);
                Err(e)
            }
        }
    }

    async fn reverse_ball(&self, innings_id: InningsId) -> Result<BallEvent> {
        let cell = self.live_innings(innings_id).await?;
        let match_id = cell.lock().await.innings().match_id;

        // Match before innings, the order end_match takes them in
        let lock = self.match_lock(match_id);
        let _match_guard = lock.lock().await;
        let mut state = cell.lock().await;
        self.ensure_undo_available(state.innings()).await?;

        let previous = (*state).clone();
        let reverted = state.undo_last()?;
        let innings = state.innings().clone();

        if let Err(e) = self.repository.revert_ball(&innings, reverted.event.seq, &reverted.stats).await {
            *state = previous;
            return Err(e);
        }

        let event = reverted.event;
        info!(
            "↩️ Undid ball {}.{} of innings {}, now {}",
            event.over_number,
            event.ball_number,
            innings.innings_number,
            innings.score_line()
        );
        self.announce(
            innings.match_id,
            Some(innings_id),
            ScoreUpdate::BallUndone { event: event.clone(), snapshot: state.snapshot() },
        )
        .await;
        Ok(event)
    }

    async fn ensure_undo_available(&self, innings: &Innings) -> Result<()> {
        let fixture = self.get_match(innings.match_id).await?;
        if fixture.is_finished() {
            return Err(ScoringError::invalid_innings(innings.id, "the match is already completed"));
        }
        let later_started = self
            .repository
            .list_innings(innings.match_id)
            .await?
            .iter()
            .any(|i| i.innings_number > innings.innings_number);
        if later_started {
            return Err(ScoringError::invalid_innings(innings.id, "a later innings has already started"));
        }
        Ok(())
    }

    // Crease

    pub async fn set_crease(
        &self,
        innings_id: InningsId,
        striker_id: PlayerId,
        non_striker_id: Option<PlayerId>,
    ) -> Result<Innings> {
        let result = self
            .change_crease(innings_id, |state| state.set_crease(striker_id, non_striker_id))
            .await;
        if let Err(e) = &result {
            self.reject("set_crease", innings_id, e);
        }
        result
    }

    pub async fn swap_strike(&self, innings_id: InningsId) -> Result<Innings> {
        let result = self.change_crease(innings_id, InningsState::swap_strike).await;
        if let Err(e) = &result {
            self.reject("swap_strike", innings_id, e);
        }
        result
    }

    async fn change_crease<F>(&self, innings_id: InningsId, change: F) -> Result<Innings>
    where
        F: FnOnce(&mut InningsState) -> Result<()> + Send,
    {
        let cell = self.live_innings(innings_id).await?;
        let mut state = cell.lock().await;

        let crease_before = state.innings().crease;
        let order_before = state.innings().batting_order.clone();
        change(&mut *state)?;
        let innings = state.innings().clone();

        if let Err(e) = self.repository.save_innings(&innings).await {
            state.reset_crease(crease_before, order_before);
            return Err(e);
        }

        self.announce(innings.match_id, Some(innings_id), ScoreUpdate::CreaseChanged { crease: innings.crease })
            .await;
        Ok(innings)
    }

    // Reads

    pub async fn live_snapshot(&self, innings_id: InningsId) -> Result<LiveSnapshot> {
        let cell = self.live_innings(innings_id).await?;
        let state = cell.lock().await;
        Ok(state.snapshot())
    }

    pub async fn preview_next_ball(&self, innings_id: InningsId) -> Result<BallPreview> {
        let cell = self.live_innings(innings_id).await?;
        let state = cell.lock().await;
        Ok(state.preview())
    }

    pub async fn get_scorecard(&self, match_id: MatchId) -> Result<Scorecard> {
        let fixture = self.get_match(match_id).await?;

        let mut team_names = HashMap::new();
        for team_id in [fixture.team1_id, fixture.team2_id] {
            let team = self.get_team(team_id).await?;
            team_names.insert(team.id, team.name);
        }

        let mut played = Vec::new();
        for innings in self.repository.list_innings(match_id).await? {
            let events = self.repository.list_balls(innings.id).await?;
            let stats = self.repository.list_stats(innings.id).await?;
            played.push(PlayedInnings { innings, events, stats });
        }

        Ok(ScorecardBuilder::new(&fixture, &team_names).build(&played))
    }

    async fn announce(&self, match_id: MatchId, innings_id: Option<InningsId>, update: ScoreUpdate) {
        let message = StreamMessage::new(match_id, innings_id, update);
        if let Err(e) = self.notifier.publish(&message).await {
            warn!("⚠️ Failed to announce {} for match {}: {}", message.update.kind(), match_id, e);
        }
    }
}
