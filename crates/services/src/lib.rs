//! Scoring engine. [`InningsState`] folds deliveries into an innings and
//! [`ScoringService`] drives matches against a repository and the event bus.

pub mod aggregator;
pub mod metrics;
pub mod over_counter;
pub mod rotation;
pub mod rules_eval;
pub mod scorecard;
pub mod scorer;

#[cfg(test)]
pub(crate) mod test_support;

pub use aggregator::*;
pub use metrics::*;
pub use over_counter::*;
pub use rotation::*;
pub use rules_eval::*;
pub use scorecard::*;
pub use scorer::*;
