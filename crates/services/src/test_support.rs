use chrono::Utc;
use criclive_models::{BallEvent, ExtraType, InningsId, PlayerId};

/// Bare event at a given slot, zero runs, for counter and history tests.
pub fn event_at(over_number: u32, ball_number: u32, extra_type: Option<ExtraType>) -> BallEvent {
    BallEvent {
        seq: 0,
        innings_id: InningsId::new(),
        over_number,
        ball_number,
        is_legal: extra_type.map_or(true, ExtraType::is_legal),
        striker_id: PlayerId::new(),
        bowler_id: PlayerId::new(),
        runs_off_bat: 0,
        runs_completed: 0,
        extra_type,
        extra_runs: 0,
        penalty_runs: 0,
        total_runs: 0,
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
