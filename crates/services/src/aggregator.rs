use std::collections::HashMap;
use chrono::{DateTime, Utc};
use criclive_models::{
    overs_display, run_rate, BallEvent, BallEventInput, BallPreview, BatterFigures, BowlerFigures,
    Crease, Dismissal, ExtraType, Innings, InningsStatus, LiveSnapshot, Player, PlayerId,
    PlayerMatchStat, Result, RulesConfig, ScoringError, Wicket, WicketType,
};
use tracing::debug;
use crate::over_counter::{free_hit_pending, OverCounter};
use crate::rotation::{rotate, RotationInput};
use crate::rules_eval::ScoringRuleEvaluator;

/// Result of a committed ball: the stored event and every stat row it changed.
#[derive(Debug, Clone)]
pub struct AppliedBall {
    pub event: BallEvent,
    pub stats: Vec<PlayerMatchStat>,
}

/// Result of an undo: the removed event and every stat row it restored.
#[derive(Debug, Clone)]
pub struct RevertedBall {
    pub event: BallEvent,
    pub stats: Vec<PlayerMatchStat>,
}

/// Authoritative state of one innings: totals, crease, ball log and the stat
/// rows of both sides. `apply_ball` and `undo_last` are the only ways the
/// totals change.
#[derive(Debug, Clone)]
pub struct InningsState {
    innings: Innings,
    rules: RulesConfig,
    batting_side: Vec<PlayerId>,
    bowling_side: Vec<PlayerId>,
    events: Vec<BallEvent>,
    stats: HashMap<PlayerId, PlayerMatchStat>,
}

impl InningsState {
    /// Moves a fresh innings to in-progress with zeroed rows for both sides.
    pub fn start(
        mut innings: Innings,
        rules: RulesConfig,
        batting: &[Player],
        bowling: &[Player],
    ) -> Result<Self> {
        rules.validate()?;
        if innings.status != InningsStatus::NotStarted {
            return Err(ScoringError::invalid_innings(innings.id, "innings has already started"));
        }
        if batting.is_empty() || bowling.is_empty() {
            return Err(ScoringError::InvalidState(
                "both sides need registered players before an innings starts".to_string(),
            ));
        }

        let stats = batting
            .iter()
            .chain(bowling)
            .map(|p| {
                let row = PlayerMatchStat::zeroed(p.id, p.name.clone(), p.team_id, innings.match_id, innings.id);
                (p.id, row)
            })
            .collect();

        innings.status = InningsStatus::InProgress;
        innings.total_overs = overs_display(0, rules.balls_per_over);

        Ok(Self {
            innings,
            rules,
            batting_side: batting.iter().map(|p| p.id).collect(),
            bowling_side: bowling.iter().map(|p| p.id).collect(),
            events: Vec::new(),
            stats,
        })
    }

    /// Rebuilds state from persisted records.
    pub fn restore(
        innings: Innings,
        rules: RulesConfig,
        events: Vec<BallEvent>,
        stats: Vec<PlayerMatchStat>,
    ) -> Self {
        let batting_side = stats
            .iter()
            .filter(|s| s.team_id == innings.batting_team_id)
            .map(|s| s.player_id)
            .collect();
        let bowling_side = stats
            .iter()
            .filter(|s| s.team_id == innings.bowling_team_id)
            .map(|s| s.player_id)
            .collect();
        let stats = stats.into_iter().map(|s| (s.player_id, s)).collect();

        Self { innings, rules, batting_side, bowling_side, events, stats }
    }

    pub fn innings(&self) -> &Innings {
        &self.innings
    }

    pub fn rules(&self) -> &RulesConfig {
        &self.rules
    }

    pub fn events(&self) -> &[BallEvent] {
        &self.events
    }

    pub fn stat(&self, player_id: PlayerId) -> Option<&PlayerMatchStat> {
        self.stats.get(&player_id)
    }

    /// Stat rows of both sides, batting side first.
    pub fn stats(&self) -> Vec<PlayerMatchStat> {
        self.batting_side
            .iter()
            .chain(&self.bowling_side)
            .filter_map(|id| self.stats.get(id).cloned())
            .collect()
    }

    fn counter(&self) -> OverCounter {
        OverCounter::new(self.rules.balls_per_over)
    }

    fn wicket_limit(&self) -> u32 {
        self.rules.wicket_limit(self.batting_side.len())
    }

    /// Last-man-stands with exactly one undismissed batter left.
    fn lone_batter_after(&self, wickets: u32) -> bool {
        if !self.rules.last_man_stands {
            return false;
        }
        let side = self.wicket_limit();
        side > 0 && wickets == side - 1
    }

    /// Batters the side may send in: the format's side size, capped by the roster.
    fn side_size(&self) -> usize {
        let per_side = usize::try_from(self.rules.players_per_side).unwrap_or(usize::MAX);
        self.batting_side.len().min(per_side)
    }

    /// Whether `newcomers` can join the batting order without exceeding the side.
    fn has_room_for(&self, newcomers: &[PlayerId]) -> bool {
        let fresh = newcomers
            .iter()
            .filter(|id| !self.innings.batting_order.contains(id))
            .count();
        self.innings.batting_order.len() + fresh <= self.side_size()
    }

    fn is_dismissed(&self, player_id: PlayerId) -> bool {
        self.stats.get(&player_id).map_or(false, PlayerMatchStat::is_out)
    }

    fn player_name(&self, player_id: PlayerId) -> String {
        self.stats
            .get(&player_id)
            .map_or_else(|| player_id.to_string(), |s| s.player_name.clone())
    }

    fn ensure_in_progress(&self) -> Result<()> {
        match self.innings.status {
            InningsStatus::InProgress => Ok(()),
            InningsStatus::Completed => {
                Err(ScoringError::invalid_innings(self.innings.id, "innings is already completed"))
            }
            InningsStatus::NotStarted => {
                Err(ScoringError::invalid_innings(self.innings.id, "innings has not started"))
            }
        }
    }

    fn ensure_available_batter(&self, player_id: PlayerId) -> Result<()> {
        if !self.batting_side.contains(&player_id) {
            return Err(ScoringError::missing_participant(player_id, "batter"));
        }
        if self.is_dismissed(player_id) {
            return Err(ScoringError::InvalidState(format!(
                "{} is already out",
                self.player_name(player_id)
            )));
        }
        Ok(())
    }

    fn note_batting_order(&mut self, player_id: PlayerId) {
        if !self.innings.batting_order.contains(&player_id) {
            self.innings.batting_order.push(player_id);
        }
    }

    /// Puts batters at the crease: openers, a replacement after a wicket, or a
    /// correction after undo. `non_striker` may be empty only for a lone batter.
    pub fn set_crease(&mut self, striker: PlayerId, non_striker: Option<PlayerId>) -> Result<()> {
        self.ensure_in_progress()?;
        self.ensure_available_batter(striker)?;

        match non_striker {
            Some(id) if id == striker => {
                return Err(ScoringError::InvalidState(
                    "striker and non-striker must be different players".to_string(),
                ));
            }
            Some(id) => self.ensure_available_batter(id)?,
            None if !self.lone_batter_after(self.innings.total_wickets) => {
                return Err(ScoringError::CreaseIncomplete { innings_id: self.innings.id.to_string() });
            }
            None => {}
        }

        let newcomers: Vec<PlayerId> = std::iter::once(striker).chain(non_striker).collect();
        if !self.has_room_for(&newcomers) {
            return Err(ScoringError::InvalidState(format!(
                "only {} batters may bat for this side",
                self.side_size()
            )));
        }

        self.innings.crease = Crease { striker: Some(striker), non_striker };
        self.note_batting_order(striker);
        if let Some(id) = non_striker {
            self.note_batting_order(id);
        }
        debug!(innings_id = %self.innings.id, "crease set");
        Ok(())
    }

    /// Puts back crease and batting order captured before a ball whose
    /// commit could not be persisted.
    pub fn reset_crease(&mut self, crease: Crease, batting_order: Vec<PlayerId>) {
        self.innings.crease = crease;
        self.innings.batting_order = batting_order;
    }

    /// Ends the innings early, as when the match is called off.
    pub fn close(&mut self) {
        self.innings.status = InningsStatus::Completed;
    }

    pub fn swap_strike(&mut self) -> Result<()> {
        self.ensure_in_progress()?;
        if self.innings.crease.occupants() < 2 {
            return Err(ScoringError::InvalidState("need two batters at the crease to swap strike".to_string()));
        }
        self.innings.crease = self.innings.crease.swapped();
        Ok(())
    }

    pub fn preview(&self) -> BallPreview {
        let position = self.counter().next_position(&self.events);
        BallPreview {
            over_number: position.over_number,
            ball_number: position.ball_number,
            is_free_hit: free_hit_pending(&self.events, self.rules.no_ball_free_hit),
            is_powerplay: self.rules.is_powerplay_over(position.over_number),
            multiplier: ScoringRuleEvaluator::new(&self.rules).active_multiplier(position),
        }
    }

    /// Validates and commits one delivery. On error nothing has changed.
    pub fn apply_ball(&mut self, input: &BallEventInput, recorded_at: DateTime<Utc>) -> Result<AppliedBall> {
        self.ensure_in_progress()?;
        input.validate()?;

        let innings_id = self.innings.id;
        let crease = self.innings.crease;
        let lone_now = self.lone_batter_after(self.innings.total_wickets);
        let striker_id = crease
            .striker
            .ok_or_else(|| ScoringError::CreaseIncomplete { innings_id: innings_id.to_string() })?;
        if crease.non_striker.is_none() && !lone_now {
            return Err(ScoringError::CreaseIncomplete { innings_id: innings_id.to_string() });
        }

        if !self.bowling_side.contains(&input.bowler_id) {
            return Err(ScoringError::missing_participant(input.bowler_id, "bowler"));
        }

        let wicket = match input.wicket {
            Some(w) => {
                if let Some(fielder) = w.fielder_id {
                    if !self.bowling_side.contains(&fielder) {
                        return Err(ScoringError::missing_participant(fielder, "fielder"));
                    }
                }
                let dismissed = w.dismissed_player_id.unwrap_or(striker_id);
                if !crease.contains(dismissed) {
                    return Err(ScoringError::InvalidBall("dismissed player is not at the crease".to_string()));
                }
                if dismissed != striker_id && !w.kind.can_dismiss_non_striker() {
                    return Err(ScoringError::InvalidBall(format!(
                        "{:?} cannot dismiss the non-striker",
                        w.kind
                    )));
                }
                Some(Wicket { kind: w.kind, dismissed_player_id: dismissed, fielder_id: w.fielder_id })
            }
            None => None,
        };

        if let Some(incoming) = input.incoming_batter_id {
            self.ensure_available_batter(incoming)?;
            if crease.contains(incoming) {
                return Err(ScoringError::InvalidBall("incoming batter is already at the crease".to_string()));
            }
            if self.lone_batter_after(self.innings.total_wickets + 1) {
                return Err(ScoringError::InvalidBall(
                    "the last batter bats alone, nobody comes in".to_string(),
                ));
            }
            if !self.has_room_for(&[incoming]) {
                return Err(ScoringError::InvalidBall(format!(
                    "only {} batters may bat for this side",
                    self.side_size()
                )));
            }
        }

        let is_free_hit = free_hit_pending(&self.events, self.rules.no_ball_free_hit);
        if let Some(w) = wicket {
            if is_free_hit && !w.kind.allowed_on_free_hit() {
                return Err(ScoringError::InvalidBall(format!("{:?} is not possible on a free hit", w.kind)));
            }
        }

        let counter = self.counter();
        let position = counter.next_position(&self.events);
        let bouncer_over_limit = input.is_bouncer
            && self.rules.bouncer_limit > 0
            && counter.bouncers_in_over(&self.events, position.over_number) >= self.rules.bouncer_limit;

        let attribution = ScoringRuleEvaluator::new(&self.rules).evaluate(
            input.delivery,
            wicket.is_some(),
            position,
            bouncer_over_limit,
        );
        if let Some(w) = wicket {
            if !w.kind.allowed_on(attribution.extra_type()) {
                return Err(ScoringError::InvalidBall(format!(
                    "bouncer over the limit is a no-ball; {:?} is not possible on it",
                    w.kind
                )));
            }
        }

        // Validation is over; everything below commits.
        let before_penalty = i64::from(self.innings.total_runs)
            + i64::from(attribution.runs_off_bat)
            + i64::from(attribution.extra_runs);
        let penalty_runs = if attribution.penalty_runs < 0 {
            let floor = i32::try_from(before_penalty).unwrap_or(i32::MAX);
            attribution.penalty_runs.max(-floor)
        } else {
            attribution.penalty_runs
        };
        let total_runs = i32::try_from(
            i64::from(attribution.runs_off_bat) + i64::from(attribution.extra_runs) + i64::from(penalty_runs),
        )
        .unwrap_or(i32::MAX);

        let is_legal = attribution.is_legal();
        let legal_after = self.innings.legal_balls + u32::from(is_legal);
        let over_completed = is_legal && counter.completes_over(legal_after);

        let mut event = BallEvent {
            seq: self.events.last().map_or(1, |e| e.seq + 1),
            innings_id,
            over_number: position.over_number,
            ball_number: position.ball_number,
            is_legal,
            striker_id,
            bowler_id: input.bowler_id,
            runs_off_bat: attribution.runs_off_bat,
            runs_completed: attribution.delivery.runs_completed(),
            extra_type: attribution.extra_type(),
            extra_runs: attribution.extra_runs,
            penalty_runs,
            total_runs,
            is_boundary: attribution.is_boundary,
            multiplier: attribution.multiplier,
            wicket,
            is_free_hit,
            is_bouncer: input.is_bouncer,
            is_powerplay: self.rules.is_powerplay_over(position.over_number),
            completed_maiden: false,
            recorded_at,
        };
        event.completed_maiden = over_completed && self.is_maiden(&event);

        // Innings totals
        let new_total = i64::from(self.innings.total_runs) + i64::from(total_runs);
        self.innings.total_runs = u32::try_from(new_total.max(0)).unwrap_or(u32::MAX);
        if let Some(extra) = event.extra_type {
            *self.innings.extras.bucket_mut(extra) += event.extra_runs;
        }
        if event.is_wicket() {
            self.innings.total_wickets += 1;
        }
        self.innings.legal_balls = legal_after;
        self.innings.total_overs = overs_display(legal_after, self.rules.balls_per_over);

        let mut touched = vec![striker_id, event.bowler_id];
        self.credit_players(&event, &mut touched);

        // Strike rotation
        let lone_after = self.lone_batter_after(self.innings.total_wickets);
        self.innings.crease = rotate(
            crease,
            RotationInput {
                runs_completed: event.runs_completed,
                dismissed: wicket.map(|w| w.dismissed_player_id),
                incoming: input.incoming_batter_id,
                over_completed,
            },
            lone_after,
        );
        if let Some(incoming) = input.incoming_batter_id {
            self.note_batting_order(incoming);
        }

        if self.completion_reached() {
            self.innings.status = InningsStatus::Completed;
        }

        debug!(
            innings_id = %innings_id,
            seq = event.seq,
            over = event.over_number,
            ball = event.ball_number,
            total = event.total_runs,
            score = %self.innings.score_line(),
            "ball applied"
        );

        self.events.push(event.clone());
        Ok(AppliedBall { event, stats: self.collect_rows(&touched) })
    }

    /// Every delivery of the over came from this bowler and none was charged to them.
    fn is_maiden(&self, last: &BallEvent) -> bool {
        let over = self.events.iter().filter(|e| e.over_number == last.over_number);
        over.chain(std::iter::once(last))
            .all(|e| e.bowler_id == last.bowler_id && e.bowler_runs_conceded() == 0)
    }

    fn credit_players(&mut self, event: &BallEvent, touched: &mut Vec<PlayerId>) {
        let bpo = self.rules.balls_per_over;
        let tapped = event.tapped_bat_runs();

        if let Some(striker) = self.stats.get_mut(&event.striker_id) {
            if event.counts_as_ball_faced() {
                striker.balls_faced += 1;
            }
            striker.runs_scored += event.runs_off_bat;
            if event.is_boundary {
                match tapped {
                    4 => striker.fours += 1,
                    6 => striker.sixes += 1,
                    _ => {}
                }
            }
        }

        if let Some(bowler) = self.stats.get_mut(&event.bowler_id) {
            if event.is_legal {
                bowler.balls_bowled += 1;
            }
            bowler.runs_conceded += event.bowler_runs_conceded();
            match event.extra_type {
                Some(ExtraType::Wide) => bowler.wides_bowled += 1,
                Some(ExtraType::NoBall) => bowler.no_balls_bowled += 1,
                _ => {}
            }
            if event.wicket_credited_to_bowler() {
                bowler.wickets_taken += 1;
            }
            if event.completed_maiden {
                bowler.maidens += 1;
            }
            bowler.refresh_overs(bpo);
        }

        let Some(wicket) = event.wicket else {
            return;
        };
        if let Some(fielder_id) = wicket.fielder_id {
            if let Some(counter) = self
                .stats
                .get_mut(&fielder_id)
                .and_then(|f| f.fielding_counter_mut(wicket.kind))
            {
                *counter += 1;
                touched.push(fielder_id);
            }
        }

        let text = dismissal_text(
            wicket.kind,
            &self.player_name(event.bowler_id),
            wicket.fielder_id.map(|id| self.player_name(id)).as_deref(),
            wicket.fielder_id == Some(event.bowler_id),
        );
        if let Some(out) = self.stats.get_mut(&wicket.dismissed_player_id) {
            out.dismissal = Some(Dismissal {
                kind: wicket.kind,
                bowler_id: event.bowler_id,
                fielder_id: wicket.fielder_id,
                text,
            });
            touched.push(wicket.dismissed_player_id);
        }
    }

    fn completion_reached(&self) -> bool {
        self.innings.total_wickets >= self.wicket_limit()
            || self.innings.legal_balls >= self.rules.max_legal_balls()
            || self.innings.target.map_or(false, |t| self.innings.total_runs >= t)
    }

    fn collect_rows(&self, ids: &[PlayerId]) -> Vec<PlayerMatchStat> {
        let mut rows: Vec<PlayerMatchStat> = Vec::with_capacity(ids.len());
        for id in ids {
            if rows.iter().any(|r| r.player_id == *id) {
                continue;
            }
            if let Some(row) = self.stats.get(id) {
                rows.push(row.clone());
            }
        }
        rows
    }

    /// Reverses the most recent ball from its stored values. The crease is left
    /// as it is; the scorer re-enters it with `set_crease` if needed.
    pub fn undo_last(&mut self) -> Result<RevertedBall> {
        let Some(event) = self.events.pop() else {
            return Err(ScoringError::NoEventsToUndo { innings_id: self.innings.id.to_string() });
        };
        let bpo = self.rules.balls_per_over;

        let restored = i64::from(self.innings.total_runs) - i64::from(event.total_runs);
        self.innings.total_runs = u32::try_from(restored.max(0)).unwrap_or(0);
        if let Some(extra) = event.extra_type {
            let bucket = self.innings.extras.bucket_mut(extra);
            *bucket = bucket.saturating_sub(event.extra_runs);
        }
        if event.is_wicket() {
            self.innings.total_wickets = self.innings.total_wickets.saturating_sub(1);
        }
        if event.is_legal {
            self.innings.legal_balls = self.innings.legal_balls.saturating_sub(1);
        }
        self.innings.total_overs = overs_display(self.innings.legal_balls, bpo);

        let mut touched = vec![event.striker_id, event.bowler_id];
        let tapped = event.tapped_bat_runs();

        if let Some(striker) = self.stats.get_mut(&event.striker_id) {
            if event.counts_as_ball_faced() {
                striker.balls_faced = striker.balls_faced.saturating_sub(1);
            }
            striker.runs_scored = striker.runs_scored.saturating_sub(event.runs_off_bat);
            if event.is_boundary {
                match tapped {
                    4 => striker.fours = striker.fours.saturating_sub(1),
                    6 => striker.sixes = striker.sixes.saturating_sub(1),
                    _ => {}
                }
            }
        }

        if let Some(bowler) = self.stats.get_mut(&event.bowler_id) {
            if event.is_legal {
                bowler.balls_bowled = bowler.balls_bowled.saturating_sub(1);
            }
            bowler.runs_conceded = bowler.runs_conceded.saturating_sub(event.bowler_runs_conceded());
            match event.extra_type {
                Some(ExtraType::Wide) => bowler.wides_bowled = bowler.wides_bowled.saturating_sub(1),
                Some(ExtraType::NoBall) => bowler.no_balls_bowled = bowler.no_balls_bowled.saturating_sub(1),
                _ => {}
            }
            if event.wicket_credited_to_bowler() {
                bowler.wickets_taken = bowler.wickets_taken.saturating_sub(1);
            }
            if event.completed_maiden {
                bowler.maidens = bowler.maidens.saturating_sub(1);
            }
            bowler.refresh_overs(bpo);
        }

        if let Some(wicket) = event.wicket {
            if let Some(fielder_id) = wicket.fielder_id {
                if let Some(counter) = self
                    .stats
                    .get_mut(&fielder_id)
                    .and_then(|f| f.fielding_counter_mut(wicket.kind))
                {
                    *counter = counter.saturating_sub(1);
                    touched.push(fielder_id);
                }
            }
            if let Some(out) = self.stats.get_mut(&wicket.dismissed_player_id) {
                out.dismissal = None;
                touched.push(wicket.dismissed_player_id);
            }
        }

        self.innings.status = InningsStatus::InProgress;

        debug!(
            innings_id = %self.innings.id,
            seq = event.seq,
            score = %self.innings.score_line(),
            "ball undone"
        );

        let stats = self.collect_rows(&touched);
        Ok(RevertedBall { event, stats })
    }

    fn batter_figures(&self, player_id: Option<PlayerId>) -> Option<BatterFigures> {
        let row = self.stats.get(&player_id?)?;
        Some(BatterFigures {
            player_id: row.player_id,
            name: row.player_name.clone(),
            runs: row.runs_scored,
            balls: row.balls_faced,
        })
    }

    pub fn snapshot(&self) -> LiveSnapshot {
        let innings = &self.innings;
        let bpo = self.rules.balls_per_over;
        let balls_remaining = self.rules.max_legal_balls().saturating_sub(innings.legal_balls);
        let runs_needed = innings.target.map(|t| t.saturating_sub(innings.total_runs));

        let bowler = self.events.last().and_then(|e| self.stats.get(&e.bowler_id)).map(|row| BowlerFigures {
            player_id: row.player_id,
            name: row.player_name.clone(),
            overs: row.overs_bowled,
            maidens: row.maidens,
            runs: row.runs_conceded,
            wickets: row.wickets_taken,
        });

        LiveSnapshot {
            match_id: innings.match_id,
            innings_id: innings.id,
            innings_number: innings.innings_number,
            batting_team_id: innings.batting_team_id,
            score: innings.score_line(),
            total_runs: innings.total_runs,
            total_wickets: innings.total_wickets,
            overs: innings.total_overs,
            run_rate: run_rate(innings.total_runs, innings.legal_balls, bpo),
            target: innings.target,
            runs_needed,
            balls_remaining,
            required_run_rate: runs_needed.map(|needed| run_rate(needed, balls_remaining, bpo)),
            striker: self.batter_figures(innings.crease.striker),
            non_striker: self.batter_figures(innings.crease.non_striker),
            bowler,
            this_over: self.counter().current_over(&self.events).iter().map(BallEvent::label).collect(),
            next_ball: self.preview(),
            is_completed: innings.is_completed(),
        }
    }
}

/// Scorecard wording for a dismissal.
pub fn dismissal_text(kind: WicketType, bowler: &str, fielder: Option<&str>, caught_and_bowled: bool) -> String {
    match (kind, fielder) {
        (WicketType::Bowled, _) => format!("b {bowler}"),
        (WicketType::Lbw, _) => format!("lbw b {bowler}"),
        (WicketType::HitWicket, _) => format!("hit wicket b {bowler}"),
        (WicketType::Caught, _) if caught_and_bowled => format!("c & b {bowler}"),
        (WicketType::Caught, Some(f)) => format!("c {f} b {bowler}"),
        (WicketType::Caught, None) => format!("c ? b {bowler}"),
        (WicketType::Stumped, Some(f)) => format!("st {f} b {bowler}"),
        (WicketType::Stumped, None) => format!("st ? b {bowler}"),
        (WicketType::RunOut, Some(f)) => format!("run out ({f})"),
        (WicketType::RunOut, None) => "run out".to_string(),
        (WicketType::Retired, _) => "retired".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use criclive_models::{Delivery, MatchId, MultiplierTrigger, PlayerRole, TeamId, WicketInput};
    use rust_decimal_macros::dec;

    struct Fixture {
        state: InningsState,
        batters: Vec<PlayerId>,
        bowlers: Vec<PlayerId>,
    }

    fn side(team_id: TeamId, prefix: &str, count: usize) -> Vec<Player> {
        (0..count)
            .map(|i| Player::new(format!("{prefix}{}", i + 1), team_id, PlayerRole::AllRounder))
            .collect()
    }

    fn fixture_with(rules: RulesConfig, target: Option<u32>) -> Fixture {
        let roster = rules.players_per_side as usize;
        fixture_sized(rules, roster, target)
    }

    fn fixture_sized(rules: RulesConfig, roster: usize, target: Option<u32>) -> Fixture {
        let bat_team = TeamId::new();
        let bowl_team = TeamId::new();
        let batting = side(bat_team, "Bat", roster);
        let bowling = side(bowl_team, "Bowl", roster);
        let mut innings = Innings::new(MatchId::new(), if target.is_some() { 2 } else { 1 }, bat_team, bowl_team);
        innings.target = target;

        let mut state = InningsState::start(innings, rules, &batting, &bowling).unwrap();
        state.set_crease(batting[0].id, Some(batting[1].id)).unwrap();
        Fixture {
            state,
            batters: batting.iter().map(|p| p.id).collect(),
            bowlers: bowling.iter().map(|p| p.id).collect(),
        }
    }

    fn fixture(rules: RulesConfig) -> Fixture {
        fixture_with(rules, None)
    }

    impl Fixture {
        fn bowl(&mut self, input: BallEventInput) -> Result<AppliedBall> {
            self.state.apply_ball(&input, Utc::now())
        }

        fn fair(&mut self, runs: u32) -> AppliedBall {
            let bowler = self.bowlers[0];
            self.bowl(BallEventInput::fair(bowler, runs)).unwrap()
        }

        fn striker(&self) -> Option<PlayerId> {
            self.state.innings().crease.striker
        }
    }

    #[test]
    fn test_start_zeroes_both_sides() {
        let f = fixture(RulesConfig::default());
        assert_eq!(f.state.innings().status, InningsStatus::InProgress);
        assert_eq!(f.state.stats().len(), 12);
        assert!(f.state.stats().iter().all(|s| s.runs_scored == 0 && s.balls_bowled == 0));
        assert_eq!(f.state.innings().batting_order, vec![f.batters[0], f.batters[1]]);
    }

    #[test]
    fn test_cannot_start_twice() {
        let f = fixture(RulesConfig::default());
        let innings = f.state.innings().clone();
        let players = side(innings.batting_team_id, "X", 2);
        let result = InningsState::start(innings, RulesConfig::default(), &players, &players);
        assert!(matches!(result, Err(ScoringError::InvalidInnings { .. })));
    }

    #[test]
    fn test_twelve_singles_complete_two_overs() {
        let mut f = fixture(RulesConfig::default().with_overs(2));
        for _ in 0..12 {
            f.fair(1);
        }
        let innings = f.state.innings();
        assert_eq!(innings.total_runs, 12);
        assert_eq!(innings.total_wickets, 0);
        assert_eq!(innings.total_overs, dec!(2.0));
        assert!(innings.is_completed());

        let err = f.bowl(BallEventInput::fair(f.bowlers[0], 1)).unwrap_err();
        assert!(matches!(err, ScoringError::InvalidInnings { .. }));
    }

    #[test]
    fn test_single_then_over_end_double_swap() {
        let mut f = fixture(RulesConfig::default());
        let opener = f.batters[0];
        for _ in 0..5 {
            f.fair(0);
        }
        assert_eq!(f.striker(), Some(opener));
        f.fair(1);
        assert_eq!(f.striker(), Some(opener));
        assert_eq!(f.state.preview().over_number, 2);
        assert_eq!(f.state.preview().ball_number, 1);
    }

    #[test]
    fn test_wides_do_not_advance_the_over() {
        let mut f = fixture(RulesConfig::default());
        let bowler = f.bowlers[0];
        for _ in 0..3 {
            f.fair(0);
        }
        let wide = f.bowl(BallEventInput::wide(bowler, 0)).unwrap().event;
        assert_eq!((wide.over_number, wide.ball_number), (1, 4));
        assert!(!wide.is_legal);
        let no_ball = f.bowl(BallEventInput::no_ball(bowler, 0)).unwrap().event;
        assert_eq!((no_ball.over_number, no_ball.ball_number), (1, 4));
        for _ in 0..3 {
            f.fair(0);
        }
        let next = f.state.preview();
        assert_eq!((next.over_number, next.ball_number), (2, 1));
        assert_eq!(f.state.innings().extras.wides, 1);
        assert_eq!(f.state.innings().extras.no_balls, 1);
        assert_eq!(f.state.innings().total_runs, 2);
    }

    #[test]
    fn test_wide_is_not_a_ball_faced() {
        let mut f = fixture(RulesConfig::default());
        let bowler = f.bowlers[0];
        let opener = f.batters[0];
        f.bowl(BallEventInput::wide(bowler, 0)).unwrap();
        f.bowl(BallEventInput::no_ball(bowler, 2)).unwrap();
        let row = f.state.stat(opener).unwrap();
        assert_eq!(row.balls_faced, 1);
        assert_eq!(row.runs_scored, 2);

        let bowling = f.state.stat(bowler).unwrap();
        assert_eq!(bowling.runs_conceded, 4);
        assert_eq!(bowling.wides_bowled, 1);
        assert_eq!(bowling.no_balls_bowled, 1);
        assert_eq!(bowling.balls_bowled, 0);
    }

    #[test]
    fn test_byes_not_charged_to_bowler() {
        let mut f = fixture(RulesConfig::default());
        let bowler = f.bowlers[0];
        let opener = f.batters[0];
        f.bowl(BallEventInput::leg_bye(bowler, 2)).unwrap();
        assert_eq!(f.state.stat(bowler).unwrap().runs_conceded, 0);
        assert_eq!(f.state.stat(bowler).unwrap().balls_bowled, 1);
        assert_eq!(f.state.stat(opener).unwrap().balls_faced, 1);
        assert_eq!(f.state.stat(opener).unwrap().runs_scored, 0);
        assert_eq!(f.state.innings().extras.leg_byes, 2);
        assert_eq!(f.state.innings().total_runs, 2);
    }

    #[test]
    fn test_zero_run_bye_uses_a_ball() {
        let mut f = fixture(RulesConfig::default());
        let bowler = f.bowlers[0];
        let opener = f.batters[0];
        let applied = f.bowl(BallEventInput::bye(bowler, 0)).unwrap();

        assert!(applied.event.is_legal);
        assert_eq!(applied.event.total_runs, 0);
        assert_eq!(f.state.innings().legal_balls, 1);
        assert_eq!(f.state.innings().extras.byes, 0);
        assert_eq!(f.state.stat(opener).unwrap().balls_faced, 1);
        assert_eq!(f.striker(), Some(opener));
    }

    #[test]
    fn test_powerball_four_scores_eight() {
        let mut f = fixture(RulesConfig::default().with_powerball(1, 3, 2));
        let opener = f.batters[0];
        f.fair(0);
        f.fair(0);
        assert_eq!(
            f.state.preview().multiplier.map(|m| m.trigger),
            Some(MultiplierTrigger::Powerball)
        );
        let applied = f.fair(4);
        assert_eq!(applied.event.runs_off_bat, 8);
        assert!(applied.event.is_boundary);
        let row = f.state.stat(opener).unwrap();
        assert_eq!(row.runs_scored, 8);
        assert_eq!(row.fours, 1);
        assert_eq!(f.state.innings().total_runs, 8);
    }

    #[test]
    fn test_powerball_wicket_penalty_floors_at_zero() {
        let mut f = fixture(RulesConfig::default().with_powerball(1, 3, 2));
        let bowler = f.bowlers[0];
        let next = f.batters[2];
        f.fair(2);
        f.fair(0);
        let out = f
            .bowl(BallEventInput::fair(bowler, 0).with_wicket(WicketInput::new(WicketType::Bowled)).with_incoming(next))
            .unwrap();
        assert_eq!(out.event.penalty_runs, -2);
        assert_eq!(out.event.total_runs, -2);
        assert_eq!(out.event.runs_off_bat, 0);
        assert_eq!(f.state.innings().total_runs, 0);
        assert_eq!(f.state.innings().total_wickets, 1);

        f.state.undo_last().unwrap();
        assert_eq!(f.state.innings().total_runs, 2);
        assert_eq!(f.state.innings().total_wickets, 0);
    }

    #[test]
    fn test_powerball_wicket_full_penalty() {
        let mut f = fixture(RulesConfig::default().with_powerball(1, 1, 3));
        let bowler = f.bowlers[0];
        f.state.innings.total_runs = 20;
        let out = f
            .bowl(BallEventInput::fair(bowler, 0).with_wicket(WicketInput::new(WicketType::Lbw)))
            .unwrap();
        assert_eq!(out.event.penalty_runs, -5);
        assert_eq!(f.state.innings().total_runs, 15);
    }

    #[test]
    fn test_chase_completes_mid_over() {
        let mut f = fixture_with(RulesConfig::default(), Some(4));
        f.fair(0);
        f.fair(4);
        let innings = f.state.innings();
        assert!(innings.is_completed());
        assert_eq!(innings.legal_balls, 2);
        assert_eq!(innings.total_overs, dec!(0.2));
    }

    #[test]
    fn test_wicket_limit_completes_innings() {
        let rules = RulesConfig { players_per_side: 3, ..RulesConfig::default() };
        let mut f = fixture(rules);
        let bowler = f.bowlers[0];
        let third = f.batters[2];
        f.bowl(BallEventInput::fair(bowler, 0).with_wicket(WicketInput::new(WicketType::Bowled)).with_incoming(third))
            .unwrap();
        assert!(!f.state.innings().is_completed());
        f.bowl(BallEventInput::fair(bowler, 0).with_wicket(WicketInput::new(WicketType::Bowled))).unwrap();
        assert!(f.state.innings().is_completed());
        assert_eq!(f.state.innings().total_wickets, 2);
    }

    #[test]
    fn test_last_man_stands_bats_alone() {
        let rules = RulesConfig { players_per_side: 3, last_man_stands: true, ..RulesConfig::default() };
        let mut f = fixture(rules);
        let bowler = f.bowlers[0];
        let (a, b, c) = (f.batters[0], f.batters[1], f.batters[2]);

        f.bowl(BallEventInput::fair(bowler, 0).with_wicket(WicketInput::new(WicketType::Bowled)).with_incoming(c))
            .unwrap();
        assert_eq!(f.state.innings().crease, Crease::new(c, b));

        f.bowl(BallEventInput::fair(bowler, 0).with_wicket(WicketInput::new(WicketType::Bowled))).unwrap();
        assert_eq!(f.state.innings().crease, Crease { striker: Some(b), non_striker: None });
        assert!(!f.state.innings().is_completed());

        f.fair(1);
        assert_eq!(f.striker(), Some(b));
        for _ in 0..3 {
            f.fair(0);
        }
        assert_eq!(f.striker(), Some(b));
        assert!(f.state.stat(a).unwrap().is_out());

        f.bowl(BallEventInput::fair(bowler, 0).with_wicket(WicketInput::new(WicketType::Bowled))).unwrap();
        assert!(f.state.innings().is_completed());
        assert_eq!(f.state.innings().total_wickets, 3);
    }

    #[test]
    fn test_survivor_keeps_crease_when_a_large_roster_reaches_last_man() {
        let rules = RulesConfig { players_per_side: 3, last_man_stands: true, ..RulesConfig::default() };
        let mut f = fixture_sized(rules, 6, None);
        let bowler = f.bowlers[0];
        let (survivor, third, fourth) = (f.batters[1], f.batters[2], f.batters[3]);

        f.bowl(BallEventInput::fair(bowler, 0).with_wicket(WicketInput::new(WicketType::Bowled)).with_incoming(third))
            .unwrap();
        let err = f
            .bowl(BallEventInput::fair(bowler, 0).with_wicket(WicketInput::new(WicketType::Bowled)).with_incoming(fourth))
            .unwrap_err();
        assert!(matches!(err, ScoringError::InvalidBall(_)));
        assert_eq!(f.state.innings().crease, Crease::new(third, survivor));
        assert_eq!(f.state.innings().total_wickets, 1);

        f.bowl(BallEventInput::fair(bowler, 0).with_wicket(WicketInput::new(WicketType::Bowled))).unwrap();
        assert_eq!(f.state.innings().crease, Crease { striker: Some(survivor), non_striker: None });
        assert_eq!(f.state.innings().batting_order.len(), 3);

        let err = f.state.set_crease(survivor, Some(fourth)).unwrap_err();
        assert!(matches!(err, ScoringError::InvalidState(_)));
        assert_eq!(f.state.innings().batting_order.len(), 3);
    }

    #[test]
    fn test_roster_beyond_side_size_cannot_bat() {
        let rules = RulesConfig { players_per_side: 3, ..RulesConfig::default() };
        let mut f = fixture_sized(rules, 5, None);
        let bowler = f.bowlers[0];
        let (third, fourth) = (f.batters[2], f.batters[3]);

        f.bowl(BallEventInput::fair(bowler, 0).with_wicket(WicketInput::new(WicketType::Bowled)).with_incoming(third))
            .unwrap();
        let err = f
            .bowl(BallEventInput::fair(bowler, 0).with_wicket(WicketInput::new(WicketType::Bowled)).with_incoming(fourth))
            .unwrap_err();
        assert!(matches!(err, ScoringError::InvalidBall(_)));

        let done = f.bowl(BallEventInput::fair(bowler, 0).with_wicket(WicketInput::new(WicketType::Bowled))).unwrap();
        assert_eq!(done.event.seq, 2);
        assert!(f.state.innings().is_completed());
        assert_eq!(f.state.innings().batting_order.len(), 3);
    }

    #[test]
    fn test_missing_incoming_requires_crease() {
        let mut f = fixture(RulesConfig::default());
        let bowler = f.bowlers[0];
        f.bowl(BallEventInput::fair(bowler, 0).with_wicket(WicketInput::new(WicketType::Bowled))).unwrap();
        let err = f.bowl(BallEventInput::fair(bowler, 1)).unwrap_err();
        assert!(matches!(err, ScoringError::CreaseIncomplete { .. }));

        let (next, survivor) = (f.batters[2], f.batters[1]);
        f.state.set_crease(next, Some(survivor)).unwrap();
        f.fair(1);
        assert_eq!(f.striker(), Some(survivor));
        assert_eq!(f.state.innings().batting_order.len(), 3);
    }

    #[test]
    fn test_rejections_leave_state_untouched() {
        let mut f = fixture(RulesConfig::default());
        let before = (f.state.innings().clone(), f.state.stats(), f.state.events().len());

        let stranger = PlayerId::new();
        let err = f.bowl(BallEventInput::fair(stranger, 1)).unwrap_err();
        assert!(matches!(err, ScoringError::MissingParticipant { .. }));

        let batter_bowling = f.batters[3];
        assert!(f.bowl(BallEventInput::fair(batter_bowling, 1)).is_err());

        let catch_by_stranger = BallEventInput::fair(f.bowlers[0], 0)
            .with_wicket(WicketInput::new(WicketType::Caught).by_fielder(stranger));
        assert!(matches!(f.bowl(catch_by_stranger).unwrap_err(), ScoringError::MissingParticipant { .. }));

        let bowled_non_striker = BallEventInput::fair(f.bowlers[0], 0)
            .with_wicket(WicketInput::new(WicketType::Bowled).dismissing(f.batters[1]));
        assert!(matches!(f.bowl(bowled_non_striker).unwrap_err(), ScoringError::InvalidBall(_)));

        assert!(f.bowl(BallEventInput::fair(f.bowlers[0], 9)).is_err());

        assert_eq!(before, (f.state.innings().clone(), f.state.stats(), f.state.events().len()));
    }

    #[test]
    fn test_caught_and_run_out_credit_fielders() {
        let mut f = fixture(RulesConfig::default());
        let (bowler, keeper) = (f.bowlers[0], f.bowlers[1]);
        let (a, b, c, d) = (f.batters[0], f.batters[1], f.batters[2], f.batters[3]);

        f.bowl(
            BallEventInput::fair(bowler, 0)
                .with_wicket(WicketInput::new(WicketType::Caught).by_fielder(keeper))
                .with_incoming(c),
        )
        .unwrap();
        assert_eq!(f.state.stat(keeper).unwrap().catches, 1);
        assert_eq!(f.state.stat(bowler).unwrap().wickets_taken, 1);
        assert_eq!(f.state.stat(a).unwrap().dismissal.as_ref().unwrap().text, "c Bowl2 b Bowl1");

        let run_out = f
            .bowl(
                BallEventInput::fair(bowler, 1)
                    .with_wicket(WicketInput::new(WicketType::RunOut).dismissing(b).by_fielder(keeper))
                    .with_incoming(d),
            )
            .unwrap();
        assert_eq!(run_out.stats.len(), 4);
        assert_eq!(f.state.stat(keeper).unwrap().run_outs, 1);
        assert_eq!(f.state.stat(bowler).unwrap().wickets_taken, 1);
        assert_eq!(f.state.stat(b).unwrap().dismissal.as_ref().unwrap().text, "run out (Bowl2)");
        assert_eq!(f.state.innings().crease, Crease::new(d, c));
        assert_eq!(f.state.innings().total_runs, 1);
    }

    #[test]
    fn test_maiden_recorded_and_undone() {
        let mut f = fixture(RulesConfig::default());
        let bowler = f.bowlers[0];
        for _ in 0..5 {
            f.fair(0);
        }
        f.bowl(BallEventInput::leg_bye(bowler, 1)).unwrap();
        assert!(f.state.events().last().unwrap().completed_maiden);
        assert_eq!(f.state.stat(bowler).unwrap().maidens, 1);
        assert_eq!(f.state.stat(bowler).unwrap().overs_bowled, dec!(1.0));

        f.state.undo_last().unwrap();
        assert_eq!(f.state.stat(bowler).unwrap().maidens, 0);
        assert_eq!(f.state.stat(bowler).unwrap().overs_bowled, dec!(0.5));
    }

    #[test]
    fn test_wide_spoils_maiden() {
        let mut f = fixture(RulesConfig::default());
        let bowler = f.bowlers[0];
        f.bowl(BallEventInput::wide(bowler, 0)).unwrap();
        for _ in 0..6 {
            f.fair(0);
        }
        assert_eq!(f.state.stat(bowler).unwrap().maidens, 0);
    }

    #[test]
    fn test_free_hit_restricts_dismissals() {
        let rules = RulesConfig { no_ball_free_hit: true, ..RulesConfig::default() };
        let mut f = fixture(rules);
        let bowler = f.bowlers[0];
        f.bowl(BallEventInput::no_ball(bowler, 0)).unwrap();
        assert!(f.state.preview().is_free_hit);

        let bowled = BallEventInput::fair(bowler, 0).with_wicket(WicketInput::new(WicketType::Bowled));
        assert!(matches!(f.bowl(bowled).unwrap_err(), ScoringError::InvalidBall(_)));

        f.bowl(BallEventInput::wide(bowler, 0)).unwrap();
        assert!(f.state.preview().is_free_hit);
        let legal = f.fair(0);
        assert!(legal.event.is_free_hit);
        assert!(!f.state.preview().is_free_hit);
    }

    #[test]
    fn test_bouncer_over_limit_called_no_ball() {
        let rules = RulesConfig { bouncer_limit: 1, ..RulesConfig::default() };
        let mut f = fixture(rules);
        let bowler = f.bowlers[0];
        let first = f.bowl(BallEventInput::fair(bowler, 0).bouncer()).unwrap().event;
        assert!(first.is_legal);
        let second = f.bowl(BallEventInput::fair(bowler, 2).bouncer()).unwrap().event;
        assert_eq!(second.extra_type, Some(ExtraType::NoBall));
        assert!(!second.is_legal);
        assert_eq!(second.total_runs, 3);
        assert_eq!(f.state.innings().legal_balls, 1);
    }

    #[test]
    fn test_undo_round_trip() {
        let mut f = fixture(RulesConfig::default().with_power_over(1, 2));
        let bowler = f.bowlers[0];
        let keeper = f.bowlers[1];
        f.fair(1);
        let before = (f.state.innings().clone(), f.state.stats());

        let applied = f
            .bowl(
                BallEventInput::fair(bowler, 0)
                    .with_wicket(WicketInput::new(WicketType::Stumped).by_fielder(keeper))
                    .with_incoming(f.batters[2]),
            )
            .unwrap();
        let reverted = f.state.undo_last().unwrap();
        assert_eq!(reverted.event, applied.event);

        let (innings_before, stats_before) = before;
        let innings_after = f.state.innings();
        assert_eq!(innings_after.total_runs, innings_before.total_runs);
        assert_eq!(innings_after.total_wickets, innings_before.total_wickets);
        assert_eq!(innings_after.legal_balls, innings_before.legal_balls);
        assert_eq!(innings_after.total_overs, innings_before.total_overs);
        assert_eq!(innings_after.extras, innings_before.extras);
        assert_eq!(innings_after.status, innings_before.status);
        assert_eq!(f.state.stats(), stats_before);
    }

    #[test]
    fn test_undo_reopens_completed_innings() {
        let mut f = fixture_with(RulesConfig::default(), Some(1));
        f.fair(1);
        assert!(f.state.innings().is_completed());
        f.state.undo_last().unwrap();
        assert!(f.state.innings().is_in_progress());
        assert_eq!(f.state.innings().total_runs, 0);
    }

    #[test]
    fn test_undo_on_empty_innings() {
        let mut f = fixture(RulesConfig::default());
        assert!(matches!(f.state.undo_last(), Err(ScoringError::NoEventsToUndo { .. })));
    }

    #[test]
    fn test_set_crease_validation() {
        let mut f = fixture(RulesConfig::default());
        let (a, b) = (f.batters[0], f.batters[1]);
        assert!(f.state.set_crease(a, Some(a)).is_err());
        assert!(matches!(f.state.set_crease(f.bowlers[0], Some(b)), Err(ScoringError::MissingParticipant { .. })));
        assert!(matches!(f.state.set_crease(a, None), Err(ScoringError::CreaseIncomplete { .. })));
        f.state.swap_strike().unwrap();
        assert_eq!(f.striker(), Some(b));
    }

    #[test]
    fn test_snapshot_for_chase() {
        let mut f = fixture_with(RulesConfig::default().with_overs(2), Some(20));
        let bowler = f.bowlers[0];
        f.fair(4);
        f.bowl(BallEventInput::wide(bowler, 0)).unwrap();
        f.fair(1);
        let snap = f.state.snapshot();
        assert_eq!(snap.score, "6/0");
        assert_eq!(snap.runs_needed, Some(14));
        assert_eq!(snap.balls_remaining, 10);
        assert_eq!(snap.this_over, vec!["4", "Wd1", "1"]);
        assert_eq!(snap.required_run_rate, Some(dec!(8.40)));
        assert_eq!(snap.bowler.as_ref().unwrap().runs, 6);
        assert_eq!(snap.striker.as_ref().unwrap().player_id, f.batters[1]);
        assert_eq!(snap.next_ball.ball_number, 3);
    }

    #[test]
    fn test_restore_matches_live_state() {
        let mut f = fixture(RulesConfig::default());
        f.fair(2);
        f.fair(1);
        let restored = InningsState::restore(
            f.state.innings().clone(),
            f.state.rules().clone(),
            f.state.events().to_vec(),
            f.state.stats(),
        );
        assert_eq!(restored.stats(), f.state.stats());
        assert_eq!(restored.preview(), f.state.preview());
        assert_eq!(restored.wicket_limit(), f.state.wicket_limit());
    }

    #[test]
    fn test_dismissal_wording() {
        assert_eq!(dismissal_text(WicketType::Bowled, "Khan", None, false), "b Khan");
        assert_eq!(dismissal_text(WicketType::Lbw, "Khan", None, false), "lbw b Khan");
        assert_eq!(dismissal_text(WicketType::Caught, "Khan", Some("Khan"), true), "c & b Khan");
        assert_eq!(dismissal_text(WicketType::Stumped, "Khan", Some("Das"), false), "st Das b Khan");
        assert_eq!(dismissal_text(WicketType::Retired, "Khan", None, false), "retired");
    }

    #[test]
    fn test_stored_delivery_values() {
        let mut f = fixture(RulesConfig::default());
        let bowler = f.bowlers[0];
        let event = f
            .bowl(BallEventInput::new(bowler, Delivery::NoBall { runs_off_bat: 0, byes: 2 }))
            .unwrap()
            .event;
        assert_eq!(event.extra_runs, 3);
        assert_eq!(event.runs_completed, 2);
        assert_eq!(event.label(), "Nb3");
        assert_eq!(f.striker(), Some(f.batters[0]));
    }
}
