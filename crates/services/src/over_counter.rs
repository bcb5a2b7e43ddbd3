use criclive_models::{BallEvent, ExtraType};

/// Position of a delivery: 1-based over, 1-based slot within the over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BallPosition {
    pub over_number: u32,
    pub ball_number: u32,
}

/// Derives over/ball numbering from an innings' ordered event history.
#[derive(Debug, Clone, Copy)]
pub struct OverCounter {
    balls_per_over: u32,
}

impl OverCounter {
    pub fn new(balls_per_over: u32) -> Self {
        Self { balls_per_over: balls_per_over.max(1) }
    }

    pub fn legal_deliveries(events: &[BallEvent]) -> u32 {
        let count = events.iter().filter(|e| e.is_legal).count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    /// Slot of the next delivery given `legal_so_far` legal balls. Wides and
    /// no-balls are reported against this same slot without advancing it.
    pub fn position(&self, legal_so_far: u32) -> BallPosition {
        BallPosition {
            over_number: legal_so_far / self.balls_per_over + 1,
            ball_number: legal_so_far % self.balls_per_over + 1,
        }
    }

    pub fn next_position(&self, events: &[BallEvent]) -> BallPosition {
        self.position(Self::legal_deliveries(events))
    }

    pub fn completes_over(&self, legal_after: u32) -> bool {
        legal_after > 0 && legal_after % self.balls_per_over == 0
    }

    /// Bouncers already bowled in the over that `position` belongs to.
    pub fn bouncers_in_over(&self, events: &[BallEvent], over_number: u32) -> u32 {
        let count = events
            .iter()
            .rev()
            .take_while(|e| e.over_number == over_number)
            .filter(|e| e.is_bouncer)
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    /// Events of the over that is in progress, or of the over just finished
    /// when the last legal ball closed it.
    pub fn current_over<'a>(&self, events: &'a [BallEvent]) -> &'a [BallEvent] {
        let Some(last) = events.last() else {
            return &[];
        };
        let start = events
            .iter()
            .rposition(|e| e.over_number != last.over_number)
            .map_or(0, |i| i + 1);
        &events[start..]
    }
}

/// A free hit follows a no-ball and carries over wides/no-balls until a legal
/// delivery is bowled.
pub fn free_hit_pending(events: &[BallEvent], enabled: bool) -> bool {
    if !enabled {
        return false;
    }
    match events.last() {
        Some(last) if last.extra_type == Some(ExtraType::NoBall) => true,
        Some(last) => last.is_free_hit && !last.is_legal,
        None => false,
    }
}
