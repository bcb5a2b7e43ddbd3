use serde::{Deserialize, Serialize};
use crate::error::{Result, ScoringError};

/// Format parameters for one match. Fixed once the match is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    pub overs_limit: u32,
    pub balls_per_over: u32,
    pub players_per_side: u32,
    pub powerplay_overs: u32,
    pub wide_runs: u32,
    pub no_ball_free_hit: bool,
    /// Bouncers allowed per over, 0 = unlimited.
    pub bouncer_limit: u32,
    pub last_man_stands: bool,
    pub powerball_enabled: bool,
    pub powerball_over: u32,
    pub powerball_ball: u32,
    pub powerball_multiplier: u32,
    pub power_over_enabled: bool,
    pub power_over_number: u32,
    pub power_over_multiplier: u32,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            overs_limit: 10,
            balls_per_over: 6,
            players_per_side: 6,
            powerplay_overs: 0,
            wide_runs: 1,
            no_ball_free_hit: false,
            bouncer_limit: 0,
            last_man_stands: false,
            powerball_enabled: false,
            powerball_over: 1,
            powerball_ball: 1,
            powerball_multiplier: 2,
            power_over_enabled: false,
            power_over_number: 1,
            power_over_multiplier: 2,
        }
    }
}

/// Flat run deduction for losing a wicket on a powerball or power-over delivery.
pub const MULTIPLIER_WICKET_PENALTY: i32 = 5;

impl RulesConfig {
    pub fn with_overs(mut self, overs_limit: u32) -> Self {
        self.overs_limit = overs_limit;
        self
    }

    pub fn with_powerball(mut self, over: u32, ball: u32, multiplier: u32) -> Self {
        self.powerball_enabled = true;
        self.powerball_over = over;
        self.powerball_ball = ball;
        self.powerball_multiplier = multiplier;
        self
    }

    pub fn with_power_over(mut self, over: u32, multiplier: u32) -> Self {
        self.power_over_enabled = true;
        self.power_over_number = over;
        self.power_over_multiplier = multiplier;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.overs_limit == 0 {
            return Err(ScoringError::InvalidRules("overs_limit must be positive".to_string()));
        }
        if self.balls_per_over == 0 {
            return Err(ScoringError::InvalidRules("balls_per_over must be positive".to_string()));
        }
        if self.players_per_side < 2 {
            return Err(ScoringError::InvalidRules(format!(
                "players_per_side must be at least 2, got {}",
                self.players_per_side
            )));
        }
        if self.powerplay_overs > self.overs_limit {
            return Err(ScoringError::InvalidRules(format!(
                "powerplay_overs {} exceeds overs_limit {}",
                self.powerplay_overs, self.overs_limit
            )));
        }
        if self.powerball_enabled {
            if !matches!(self.powerball_multiplier, 2 | 3) {
                return Err(ScoringError::InvalidRules(format!(
                    "powerball_multiplier must be 2 or 3, got {}",
                    self.powerball_multiplier
                )));
            }
            if self.powerball_over == 0 || self.powerball_over > self.overs_limit {
                return Err(ScoringError::InvalidRules(format!(
                    "powerball_over {} outside 1..={}",
                    self.powerball_over, self.overs_limit
                )));
            }
            if self.powerball_ball == 0 || self.powerball_ball > self.balls_per_over {
                return Err(ScoringError::InvalidRules(format!(
                    "powerball_ball {} outside 1..={}",
                    self.powerball_ball, self.balls_per_over
                )));
            }
        }
        if self.power_over_enabled {
            if !matches!(self.power_over_multiplier, 2 | 3) {
                return Err(ScoringError::InvalidRules(format!(
                    "power_over_multiplier must be 2 or 3, got {}",
                    self.power_over_multiplier
                )));
            }
            if self.power_over_number == 0 || self.power_over_number > self.overs_limit {
                return Err(ScoringError::InvalidRules(format!(
                    "power_over_number {} outside 1..={}",
                    self.power_over_number, self.overs_limit
                )));
            }
        }
        Ok(())
    }

    /// Legal deliveries available to one innings.
    pub fn max_legal_balls(&self) -> u32 {
        self.overs_limit * self.balls_per_over
    }

    /// Wickets that end an innings for a batting side of `roster_size` players.
    pub fn wicket_limit(&self, roster_size: usize) -> u32 {
        let side = u32::try_from(roster_size)
            .unwrap_or(u32::MAX)
            .min(self.players_per_side);
        if self.last_man_stands {
            side
        } else {
            side.saturating_sub(1)
        }
    }

    pub fn is_powerplay_over(&self, over_number: u32) -> bool {
        over_number >= 1 && over_number <= self.powerplay_overs
    }
}
