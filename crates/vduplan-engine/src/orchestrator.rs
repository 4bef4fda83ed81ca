//! The validation orchestrator.
//!
//! Stages run in a fixed order; violations are collected within a stage
//! and any violation stops advancement past it, so a caller sees every
//! capacity problem at once but never a placement verdict computed on an
//! over-committed cluster. Planning runs only from a clean final stage.

use std::sync::Arc;

use tracing::{debug, info, warn};

use vduplan_catalog::{DimensioningLookup, RuleCatalog};
use vduplan_core::{
    DeploymentInput, ResolvedWorkload, SocketSlot, ValidationResult, Violation,
};
use vduplan_placement::{plan as plan_placement, PlacementStrategy};
use vduplan_rules::{capacity, operator, placement, resolver, validation};

use crate::metrics;
use crate::report;

/// Per-request options.
#[derive(Debug, Clone, Copy)]
pub struct ValidateOptions {
    /// Generate a placement plan when validation passes.
    pub generate_plan: bool,
    pub strategy: PlacementStrategy,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self {
            generate_plan: true,
            strategy: PlacementStrategy::default(),
        }
    }
}

/// Pipeline position, for tracing and ordering documentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Received,
    InputValidated,
    WorkloadResolved,
    CapacityChecked,
    PlacementChecked,
    OperatorChecked,
    Finalized,
}

impl Stage {
    fn as_str(&self) -> &'static str {
        match self {
            Stage::Received => "received",
            Stage::InputValidated => "input_validated",
            Stage::WorkloadResolved => "workload_resolved",
            Stage::CapacityChecked => "capacity_checked",
            Stage::PlacementChecked => "placement_checked",
            Stage::OperatorChecked => "operator_checked",
            Stage::Finalized => "finalized",
        }
    }
}

/// The deployment validation engine.
///
/// Holds the frozen rule catalog and evaluates requests as a pure
/// function of the input; nothing is retained between calls.
pub struct Engine {
    catalog: Arc<RuleCatalog>,
    dimensioning: Option<Arc<dyn DimensioningLookup>>,
}

impl Engine {
    pub fn new(catalog: Arc<RuleCatalog>) -> Self {
        Self {
            catalog,
            dimensioning: None,
        }
    }

    /// Attach a dimensioning lookup used to price injected pods.
    pub fn with_dimensioning(mut self, lookup: Arc<dyn DimensioningLookup>) -> Self {
        self.dimensioning = Some(lookup);
        self
    }

    pub fn catalog(&self) -> &RuleCatalog {
        &self.catalog
    }

    /// Validate a deployment and, when requested and feasible, plan it.
    ///
    /// Rule failures come back inside the [`ValidationResult`]; this
    /// method does not error.
    pub fn validate(&self, input: &DeploymentInput, options: &ValidateOptions) -> ValidationResult {
        let mut stage = Stage::Received;
        debug!(stage = stage.as_str(), operator = %input.operator, "validation started");

        // V3 pre-pass gates everything else.
        let input_violations = validation::v3_input(input, &self.catalog);
        if !input_violations.is_empty() {
            warn!(
                stage = stage.as_str(),
                violations = input_violations.len(),
                "input validation failed"
            );
            return ValidationResult {
                success: false,
                message: validation::v1_summary(&input_violations),
                violations: input_violations,
                plan: None,
                metrics: metrics::from_input(input),
            };
        }
        stage = Stage::InputValidated;
        debug!(stage = stage.as_str(), "input validated");

        let lookup = self.dimensioning.as_deref();
        let workload = resolver::resolve(input, &self.catalog, lookup);
        stage = Stage::WorkloadResolved;
        debug!(
            stage = stage.as_str(),
            pods = workload.pods.len(),
            "workload resolved"
        );

        let capacity::CapacityOutcome { slots, violations } =
            capacity::evaluate(&workload, &self.catalog);
        if !violations.is_empty() {
            return self.finalize(stage, &workload, &slots, violations, None);
        }
        stage = Stage::CapacityChecked;

        let placement_violations = placement::evaluate(&workload, &self.catalog, &slots);
        if !placement_violations.is_empty() {
            return self.finalize(stage, &workload, &slots, placement_violations, None);
        }
        stage = Stage::PlacementChecked;

        let operator_violations = operator::evaluate(&workload, &self.catalog, &slots);
        if !operator_violations.is_empty() {
            return self.finalize(stage, &workload, &slots, operator_violations, None);
        }
        stage = Stage::OperatorChecked;

        let server_violations = validation::v2_servers(&workload);
        if !server_violations.is_empty() {
            return self.finalize(stage, &workload, &slots, server_violations, None);
        }
        stage = Stage::Finalized;
        debug!(stage = stage.as_str(), "all rule stages passed");

        // Planning runs only from a clean final stage.
        if options.generate_plan {
            let outcome = plan_placement(&workload, &slots, options.strategy);
            self.finalize(stage, &workload, &slots, outcome.violations, outcome.plan)
        } else {
            self.finalize(stage, &workload, &slots, Vec::new(), None)
        }
    }

    /// Render the stable text report for a validation result.
    pub fn report(&self, input: &DeploymentInput, result: &ValidationResult) -> String {
        report::render(input, result, &self.catalog)
    }

    fn finalize(
        &self,
        stage: Stage,
        workload: &ResolvedWorkload,
        slots: &[SocketSlot],
        violations: Vec<Violation>,
        plan: Option<vduplan_core::PlacementPlan>,
    ) -> ValidationResult {
        let success = violations.is_empty();
        let message = validation::v1_summary(&violations);
        let metrics = metrics::compute(workload, slots, plan.as_ref());

        if success {
            info!(stage = stage.as_str(), "deployment validation passed");
        } else {
            warn!(
                stage = stage.as_str(),
                violations = violations.len(),
                "deployment validation failed"
            );
        }

        ValidationResult {
            success,
            message,
            violations,
            plan,
            metrics,
        }
    }
}
