//! vduplan-placement — socket-level placement planning.
//!
//! Given a feasibility-checked workload and its socket slot table, the
//! planner assigns every pod instance to a (server, socket) pair under
//! co-location, anti-affinity, socket-affinity, pairing and capacity
//! constraints. Decisions are deterministic: a fixed strategy, fixed
//! tie-breaks, no cross-pod backtracking.

pub mod planner;
pub mod strategy;

pub use planner::{plan, PlanOutcome};
pub use strategy::PlacementStrategy;
