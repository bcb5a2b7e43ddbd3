use criclive_models::{
    Delivery, ExtraType, Multiplier, MultiplierTrigger, RulesConfig, MULTIPLIER_WICKET_PENALTY,
};
use crate::over_counter::BallPosition;

/// Runs attributable to one delivery after every scoring rule has been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunAttribution {
    /// The delivery as finally called (a bouncer over the limit becomes a no-ball).
    pub delivery: Delivery,
    pub runs_off_bat: u32,
    pub extra_runs: u32,
    /// Raw penalty before the innings total floor is applied.
    pub penalty_runs: i32,
    pub total_runs: i32,
    /// Decided on the tapped value, before any multiplier.
    pub is_boundary: bool,
    /// Set whenever the ball was a powerball / power-over ball, wicket or not.
    pub multiplier: Option<Multiplier>,
    pub called_no_ball: bool,
}

impl RunAttribution {
    pub fn extra_type(&self) -> Option<ExtraType> {
        self.delivery.extra_type()
    }

    pub fn is_legal(&self) -> bool {
        self.delivery.is_legal()
    }
}

pub struct ScoringRuleEvaluator<'a> {
    rules: &'a RulesConfig,
}

impl<'a> ScoringRuleEvaluator<'a> {
    pub fn new(rules: &'a RulesConfig) -> Self {
        Self { rules }
    }

    /// Multiplier rule covering the legal delivery at `position`. Powerball
    /// wins over power-over when both name the same ball.
    pub fn active_multiplier(&self, position: BallPosition) -> Option<Multiplier> {
        let rules = self.rules;
        if rules.powerball_enabled
            && position.over_number == rules.powerball_over
            && position.ball_number == rules.powerball_ball
        {
            return Some(Multiplier {
                trigger: MultiplierTrigger::Powerball,
                factor: rules.powerball_multiplier,
            });
        }
        if rules.power_over_enabled && position.over_number == rules.power_over_number {
            return Some(Multiplier {
                trigger: MultiplierTrigger::PowerOver,
                factor: rules.power_over_multiplier,
            });
        }
        None
    }

    pub fn evaluate(
        &self,
        delivery: Delivery,
        is_wicket: bool,
        position: BallPosition,
        bouncer_over_limit: bool,
    ) -> RunAttribution {
        let called_no_ball = bouncer_over_limit && delivery.is_legal();
        let delivery = if called_no_ball { delivery.called_no_ball() } else { delivery };

        let extra_runs = match delivery {
            Delivery::Fair { .. } => 0,
            Delivery::Wide { runs_run } => self.rules.wide_runs + runs_run,
            Delivery::NoBall { byes, .. } => 1 + byes,
            Delivery::Bye { runs } | Delivery::LegBye { runs } => runs,
        };

        let tapped = delivery.tapped_bat_runs();
        let multiplier = if delivery.is_legal() { self.active_multiplier(position) } else { None };

        let (runs_off_bat, penalty_runs) = match multiplier {
            Some(_) if is_wicket => (tapped, -MULTIPLIER_WICKET_PENALTY),
            Some(m) => (tapped * m.factor, 0),
            None => (tapped, 0),
        };

        let is_boundary = matches!(delivery, Delivery::Fair { .. } | Delivery::NoBall { .. })
            && matches!(tapped, 4 | 6);

        let total_runs = i64::from(runs_off_bat) + i64::from(extra_runs) + i64::from(penalty_runs);

        RunAttribution {
            delivery,
            runs_off_bat,
            extra_runs,
            penalty_runs,
            total_runs: i32::try_from(total_runs).unwrap_or(i32::MAX),
            is_boundary,
            multiplier,
            called_no_ball,
        }
    }
}
