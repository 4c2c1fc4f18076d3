//! Settlement planning and event summaries.
//!
//! - `planner` - Greedy debt minimization over signed balances
//! - `summary` - Per-participant settlement instructions and event totals

pub mod planner;
pub mod summary;

#[cfg(test)]
mod planner_props;

pub use planner::{SettlementPlanner, Transfer};
pub use summary::{
    EventSummary, ParticipantSummary, PlannedTransfer, SettlementAction, SummaryBuilder,
    SummaryParticipant, average_per_person,
};
