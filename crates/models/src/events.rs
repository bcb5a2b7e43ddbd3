use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::error::{Result, ScoringError};
use crate::ids::{InningsId, PlayerId};

/// Highest run value accepted for any single component of a delivery.
pub const MAX_RUNS_PER_COMPONENT: u32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtraType {
    Wide,
    NoBall,
    Bye,
    LegBye,
}

impl ExtraType {
    /// Wides and no-balls do not consume a ball of the over.
    pub fn is_legal(self) -> bool {
        matches!(self, ExtraType::Bye | ExtraType::LegBye)
    }

    /// Bye and leg-bye runs are never charged to the bowler.
    pub fn charged_to_bowler(self) -> bool {
        matches!(self, ExtraType::Wide | ExtraType::NoBall)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WicketType {
    Bowled,
    Caught,
    Lbw,
    RunOut,
    Stumped,
    HitWicket,
    Retired,
}

impl WicketType {
    pub fn has_fielder(self) -> bool {
        matches!(self, WicketType::Caught | WicketType::RunOut | WicketType::Stumped)
    }

    pub fn credited_to_bowler(self) -> bool {
        !matches!(self, WicketType::RunOut | WicketType::Retired)
    }

    /// Dismissals that can remove the batter at the non-striker's end.
    pub fn can_dismiss_non_striker(self) -> bool {
        matches!(self, WicketType::RunOut | WicketType::Retired)
    }

    /// Dismissals still possible on a free hit.
    pub fn allowed_on_free_hit(self) -> bool {
        matches!(self, WicketType::RunOut | WicketType::Retired)
    }

    pub fn allowed_on(self, extra: Option<ExtraType>) -> bool {
        match extra {
            None => true,
            Some(ExtraType::Wide) => matches!(
                self,
                WicketType::Stumped | WicketType::HitWicket | WicketType::RunOut | WicketType::Retired
            ),
            Some(ExtraType::NoBall | ExtraType::Bye | ExtraType::LegBye) => {
                matches!(self, WicketType::RunOut | WicketType::Retired)
            }
        }
    }
}

/// What the ball was, as tapped by the scorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Delivery {
    Fair { runs: u32 },
    Wide {
        #[serde(default)]
        runs_run: u32,
    },
    NoBall {
        #[serde(default)]
        runs_off_bat: u32,
        #[serde(default)]
        byes: u32,
    },
    Bye { runs: u32 },
    LegBye { runs: u32 },
}

impl Delivery {
    pub fn extra_type(&self) -> Option<ExtraType> {
        match self {
            Delivery::Fair { .. } => None,
            Delivery::Wide { .. } => Some(ExtraType::Wide),
            Delivery::NoBall { .. } => Some(ExtraType::NoBall),
            Delivery::Bye { .. } => Some(ExtraType::Bye),
            Delivery::LegBye { .. } => Some(ExtraType::LegBye),
        }
    }

    pub fn is_legal(&self) -> bool {
        self.extra_type().map_or(true, ExtraType::is_legal)
    }

    /// The run value tapped for the batter's stroke, before any multiplier.
    pub fn tapped_bat_runs(&self) -> u32 {
        match *self {
            Delivery::Fair { runs } => runs,
            Delivery::NoBall { runs_off_bat, .. } => runs_off_bat,
            _ => 0,
        }
    }

    /// Extra runs the batters ran (wide byes, no-ball byes, byes, leg-byes).
    pub fn sub_runs(&self) -> u32 {
        match *self {
            Delivery::Fair { .. } => 0,
            Delivery::Wide { runs_run } => runs_run,
            Delivery::NoBall { byes, .. } => byes,
            Delivery::Bye { runs } | Delivery::LegBye { runs } => runs,
        }
    }

    /// Runs physically completed between the wickets; drives strike rotation.
    pub fn runs_completed(&self) -> u32 {
        self.tapped_bat_runs() + self.sub_runs()
    }

    /// The same delivery re-called as a no-ball (bouncer over the limit).
    pub fn called_no_ball(self) -> Delivery {
        match self {
            Delivery::Fair { runs } => Delivery::NoBall { runs_off_bat: runs, byes: 0 },
            Delivery::Bye { runs } | Delivery::LegBye { runs } => Delivery::NoBall { runs_off_bat: 0, byes: runs },
            other => other,
        }
    }

    fn validate(&self) -> Result<()> {
        let check = |label: &str, value: u32| {
            if value > MAX_RUNS_PER_COMPONENT {
                Err(ScoringError::InvalidBall(format!(
                    "{} must be between 0 and {}, got {}",
                    label, MAX_RUNS_PER_COMPONENT, value
                )))
            } else {
                Ok(())
            }
        };
        match *self {
            Delivery::Fair { runs } => check("runs", runs),
            Delivery::Wide { runs_run } => check("runs_run", runs_run),
            Delivery::NoBall { runs_off_bat, byes } => {
                check("runs_off_bat", runs_off_bat)?;
                check("byes", byes)?;
                if runs_off_bat > 0 && byes > 0 {
                    return Err(ScoringError::InvalidBall(
                        "a no-ball cannot have both runs off the bat and byes".to_string(),
                    ));
                }
                Ok(())
            }
            Delivery::Bye { runs } | Delivery::LegBye { runs } => check("runs", runs),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WicketInput {
    pub kind: WicketType,
    /// Defaults to the striker.
    #[serde(default)]
    pub dismissed_player_id: Option<PlayerId>,
    #[serde(default)]
    pub fielder_id: Option<PlayerId>,
}

impl WicketInput {
    pub fn new(kind: WicketType) -> Self {
        Self { kind, dismissed_player_id: None, fielder_id: None }
    }

    pub fn dismissing(mut self, player_id: PlayerId) -> Self {
        self.dismissed_player_id = Some(player_id);
        self
    }

    pub fn by_fielder(mut self, fielder_id: PlayerId) -> Self {
        self.fielder_id = Some(fielder_id);
        self
    }
}

/// A candidate ball as submitted by the scoring client. The striker is not part
/// of the input: it comes from the innings' crease state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BallEventInput {
    pub bowler_id: PlayerId,
    pub delivery: Delivery,
    #[serde(default)]
    pub wicket: Option<WicketInput>,
    /// Replacement batter when this ball takes a wicket.
    #[serde(default)]
    pub incoming_batter_id: Option<PlayerId>,
    #[serde(default)]
    pub is_bouncer: bool,
}

impl BallEventInput {
    pub fn new(bowler_id: PlayerId, delivery: Delivery) -> Self {
        Self {
            bowler_id,
            delivery,
            wicket: None,
            incoming_batter_id: None,
            is_bouncer: false,
        }
    }

    pub fn fair(bowler_id: PlayerId, runs: u32) -> Self {
        Self::new(bowler_id, Delivery::Fair { runs })
    }

    pub fn wide(bowler_id: PlayerId, runs_run: u32) -> Self {
        Self::new(bowler_id, Delivery::Wide { runs_run })
    }

    pub fn no_ball(bowler_id: PlayerId, runs_off_bat: u32) -> Self {
        Self::new(bowler_id, Delivery::NoBall { runs_off_bat, byes: 0 })
    }

    pub fn bye(bowler_id: PlayerId, runs: u32) -> Self {
        Self::new(bowler_id, Delivery::Bye { runs })
    }

    pub fn leg_bye(bowler_id: PlayerId, runs: u32) -> Self {
        Self::new(bowler_id, Delivery::LegBye { runs })
    }

    pub fn with_wicket(mut self, wicket: WicketInput) -> Self {
        self.wicket = Some(wicket);
        self
    }

    pub fn with_incoming(mut self, batter_id: PlayerId) -> Self {
        self.incoming_batter_id = Some(batter_id);
        self
    }

    pub fn bouncer(mut self) -> Self {
        self.is_bouncer = true;
        self
    }

    pub fn is_wicket(&self) -> bool {
        self.wicket.is_some()
    }

    /// Shape checks that need no innings context.
    pub fn validate(&self) -> Result<()> {
        self.delivery.validate()?;

        if let Some(wicket) = &self.wicket {
            if !wicket.kind.allowed_on(self.delivery.extra_type()) {
                return Err(ScoringError::InvalidBall(format!(
                    "{:?} dismissal is not possible on a {:?} delivery",
                    wicket.kind,
                    self.delivery.extra_type()
                )));
            }
            if wicket.fielder_id.is_some() && !wicket.kind.has_fielder() {
                return Err(ScoringError::InvalidBall(format!(
                    "{:?} dismissal does not take a fielder",
                    wicket.kind
                )));
            }
        } else if self.incoming_batter_id.is_some() {
            return Err(ScoringError::InvalidBall(
                "incoming batter given without a wicket".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MultiplierTrigger {
    Powerball,
    PowerOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Multiplier {
    pub trigger: MultiplierTrigger,
    pub factor: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wicket {
    pub kind: WicketType,
    pub dismissed_player_id: PlayerId,
    pub fielder_id: Option<PlayerId>,
}

/// One committed delivery. Every amount is the post-rule value actually applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallEvent {
    pub seq: u64,
    pub innings_id: InningsId,
    pub over_number: u32,
    pub ball_number: u32,
    pub is_legal: bool,
    pub striker_id: PlayerId,
    pub bowler_id: PlayerId,
    pub runs_off_bat: u32,
    pub runs_completed: u32,
    pub extra_type: Option<ExtraType>,
    pub extra_runs: u32,
    pub penalty_runs: i32,
    pub total_runs: i32,
    pub is_boundary: bool,
    pub multiplier: Option<Multiplier>,
    pub wicket: Option<Wicket>,
    pub is_free_hit: bool,
    pub is_bouncer: bool,
    pub is_powerplay: bool,
    pub completed_maiden: bool,
    pub recorded_at: DateTime<Utc>,
}

impl BallEvent {
    pub fn is_extra(&self) -> bool {
        self.extra_type.is_some()
    }

    pub fn is_wicket(&self) -> bool {
        self.wicket.is_some()
    }

    pub fn is_wide(&self) -> bool {
        self.extra_type == Some(ExtraType::Wide)
    }

    pub fn counts_as_ball_faced(&self) -> bool {
        !self.is_wide()
    }

    pub fn bowler_runs_conceded(&self) -> u32 {
        let extras = match self.extra_type {
            Some(extra) if extra.charged_to_bowler() => self.extra_runs,
            _ => 0,
        };
        self.runs_off_bat + extras
    }

    /// The stroke value before any multiplier was applied.
    pub fn tapped_bat_runs(&self) -> u32 {
        match self.multiplier {
            Some(m) if !self.is_wicket() && m.factor > 0 => self.runs_off_bat / m.factor,
            _ => self.runs_off_bat,
        }
    }

    pub fn wicket_credited_to_bowler(&self) -> bool {
        self.wicket.map_or(false, |w| w.kind.credited_to_bowler())
    }

    /// Short ball-by-ball label, e.g. `4`, `W`, `Wd1`, `Nb1+4`, `Lb2`.
    pub fn label(&self) -> String {
        if self.is_wicket() {
            return "W".to_string();
        }
        match self.extra_type {
            Some(ExtraType::Wide) => format!("Wd{}", self.extra_runs),
            Some(ExtraType::NoBall) if self.runs_off_bat > 0 => {
                format!("Nb{}+{}", self.extra_runs, self.runs_off_bat)
            }
            Some(ExtraType::NoBall) => format!("Nb{}", self.extra_runs),
            Some(ExtraType::Bye) => format!("B{}", self.extra_runs),
            Some(ExtraType::LegBye) => format!("Lb{}", self.extra_runs),
            None => self.runs_off_bat.to_string(),
        }
    }
}
