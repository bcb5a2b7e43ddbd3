// Shared setup for the workspace integration tests
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use criclive_db::{InMemoryStore, ScoreRepository};
use criclive_models::{
    BallEvent, BallEventInput, Innings, InningsId, Match, Player, PlayerId, PlayerMatchStat,
    PlayerRole, RulesConfig,
};
use criclive_services::{MatchSetup, NewPlayer, ScoringMetrics, ScoringService};
use criclive_stream::EventBus;

pub struct TestMatch {
    pub service: Arc<ScoringService>,
    pub store: Arc<InMemoryStore>,
    pub events: EventBus,
    pub fixture: Match,
    /// Bats first.
    pub home: Vec<Player>,
    pub away: Vec<Player>,
}

pub fn squad(prefix: &str, count: usize) -> Vec<NewPlayer> {
    (1..=count)
        .map(|n| NewPlayer::new(format!("{} {}", prefix, n), PlayerRole::AllRounder))
        .collect()
}

pub fn scoring_service(store: Arc<InMemoryStore>, events: EventBus) -> ScoringService {
    ScoringService::new(
        store.clone(),
        store,
        Arc::new(events),
        ScoringMetrics::new().expect("metrics registry"),
    )
}

/// Two registered teams of `players` each and a match under `rules`.
pub async fn new_match(rules: RulesConfig, players: usize) -> TestMatch {
    let store = Arc::new(InMemoryStore::new());
    let events = EventBus::new();
    let service = Arc::new(scoring_service(store.clone(), events.clone()));

    let (home_team, home) = service.register_team("Riverside CC", &squad("Riverside", players)).await.unwrap();
    let (away_team, away) = service.register_team("Hilltop XI", &squad("Hilltop", players)).await.unwrap();
    let fixture = service
        .create_match(MatchSetup::new(home_team.id, away_team.id).with_rules(rules))
        .await
        .unwrap();

    TestMatch { service, store, events, fixture, home, away }
}

impl TestMatch {
    /// Home side bats with its first two players at the crease.
    pub async fn first_innings(&self) -> Innings {
        let innings = self.service.start_match(self.fixture.id, self.home[0].team_id).await.unwrap();
        self.service
            .set_crease(innings.id, self.home[0].id, Some(self.home[1].id))
            .await
            .unwrap()
    }

    /// Away side chases with its first two players at the crease.
    pub async fn second_innings(&self) -> Innings {
        let innings = self.service.start_second_innings(self.fixture.id).await.unwrap();
        self.service
            .set_crease(innings.id, self.away[0].id, Some(self.away[1].id))
            .await
            .unwrap()
    }

    pub fn away_bowler(&self) -> PlayerId {
        self.away[0].id
    }

    pub fn home_bowler(&self) -> PlayerId {
        self.home[0].id
    }

    pub async fn ball(&self, innings_id: InningsId, input: BallEventInput) -> (Innings, BallEvent) {
        self.service.apply_ball(innings_id, &input).await.unwrap()
    }

    pub async fn fair_balls(&self, innings_id: InningsId, bowler: PlayerId, runs: &[u32]) -> Innings {
        let mut latest = None;
        for r in runs {
            let (innings, _) = self.ball(innings_id, BallEventInput::fair(bowler, *r)).await;
            latest = Some(innings);
        }
        latest.expect("at least one ball")
    }

    pub async fn stats_by_player(&self, innings_id: InningsId) -> HashMap<PlayerId, PlayerMatchStat> {
        self.store
            .list_stats(innings_id)
            .await
            .unwrap()
            .into_iter()
            .map(|s| (s.player_id, s))
            .collect()
    }

    pub async fn stored_innings(&self, innings_id: InningsId) -> Innings {
        self.store.get_innings(innings_id).await.unwrap().unwrap()
    }
}
