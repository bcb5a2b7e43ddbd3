//! Domain types for ball-by-ball cricket scoring: identifiers, match rules,
//! deliveries, innings state, player statistics and scorecards.

pub mod ids;
pub mod rules;
pub mod events;
pub mod innings;
pub mod stats;
pub mod fixtures;
pub mod scorecard;
pub mod error;

pub use ids::*;
pub use rules::*;
pub use events::*;
pub use innings::*;
pub use stats::*;
pub use fixtures::*;
pub use scorecard::*;
pub use error::*;
