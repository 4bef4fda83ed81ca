//! vduplan-core — shared domain types for the vduplan engine.
//!
//! Everything here is plain data: the closed operator / pod-kind sets,
//! resource quantities, deployment inputs, resolved workloads, socket
//! slots, placement plans, and validation verdicts. The evaluation logic
//! lives in `vduplan-rules` and `vduplan-placement`; this crate has no
//! behavior beyond small derived accessors.

pub mod metrics;
pub mod plan;
pub mod types;
pub mod vcores;
pub mod violation;
pub mod workload;

pub use metrics::{DeploymentMetrics, SocketUtilization};
pub use plan::{PlacementPlan, PodAssignment, SlotUsage};
pub use types::{
    DeploymentInput, FeatureFlags, Operator, PodKind, PodRequirement, ServerConfiguration,
};
pub use vcores::Vcores;
pub use violation::{RuleCategory, RuleCode, ValidationResult, Violation};
pub use workload::{PodInstance, PodOrigin, ResolvedPod, ResolvedWorkload, SocketSlot};
