//! Rule violations and the overall validation verdict.

use serde::{Deserialize, Serialize};

use crate::metrics::DeploymentMetrics;
use crate::plan::PlacementPlan;

/// Identifier of a deterministic rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuleCode {
    C1,
    C2,
    C3,
    C4,
    M1,
    M2,
    M3,
    M4,
    O1,
    O2,
    O3,
    O4,
    V1,
    V2,
    V3,
    /// All rules passed but the planner could not assign every pod.
    PlacementInfeasible,
}

impl RuleCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleCode::C1 => "C1",
            RuleCode::C2 => "C2",
            RuleCode::C3 => "C3",
            RuleCode::C4 => "C4",
            RuleCode::M1 => "M1",
            RuleCode::M2 => "M2",
            RuleCode::M3 => "M3",
            RuleCode::M4 => "M4",
            RuleCode::O1 => "O1",
            RuleCode::O2 => "O2",
            RuleCode::O3 => "O3",
            RuleCode::O4 => "O4",
            RuleCode::V1 => "V1",
            RuleCode::V2 => "V2",
            RuleCode::V3 => "V3",
            RuleCode::PlacementInfeasible => "PLACEMENT_INFEASIBLE",
        }
    }

    pub fn category(&self) -> RuleCategory {
        match self {
            RuleCode::C1 | RuleCode::C2 | RuleCode::C3 | RuleCode::C4 => RuleCategory::Capacity,
            RuleCode::M1
            | RuleCode::M2
            | RuleCode::M3
            | RuleCode::M4
            | RuleCode::PlacementInfeasible => RuleCategory::Placement,
            RuleCode::O1 | RuleCode::O2 | RuleCode::O3 | RuleCode::O4 => RuleCategory::Operator,
            RuleCode::V1 | RuleCode::V2 | RuleCode::V3 => RuleCategory::Validation,
        }
    }
}

impl std::fmt::Display for RuleCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Report grouping for violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuleCategory {
    Capacity,
    Placement,
    Operator,
    Validation,
}

impl RuleCategory {
    pub const ALL: [RuleCategory; 4] = [
        RuleCategory::Capacity,
        RuleCategory::Placement,
        RuleCategory::Operator,
        RuleCategory::Validation,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            RuleCategory::Capacity => "Capacity",
            RuleCategory::Placement => "Placement",
            RuleCategory::Operator => "Operator",
            RuleCategory::Validation => "Validation",
        }
    }
}

/// A single rule violation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub rule: RuleCode,
    pub category: RuleCategory,
    pub detail: String,
}

impl Violation {
    pub fn new(rule: RuleCode, detail: impl Into<String>) -> Self {
        Self {
            rule,
            category: rule.category(),
            detail: detail.into(),
        }
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.rule, self.detail)
    }
}

/// Outcome of a validation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub success: bool,
    pub message: String,
    pub violations: Vec<Violation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<PlacementPlan>,
    pub metrics: DeploymentMetrics,
}

impl ValidationResult {
    /// Violations in one report category, preserving order.
    pub fn violations_in(&self, category: RuleCategory) -> impl Iterator<Item = &Violation> {
        self.violations
            .iter()
            .filter(move |v| v.category == category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_map_to_categories() {
        assert_eq!(RuleCode::C3.category(), RuleCategory::Capacity);
        assert_eq!(RuleCode::M4.category(), RuleCategory::Placement);
        assert_eq!(RuleCode::O2.category(), RuleCategory::Operator);
        assert_eq!(RuleCode::V3.category(), RuleCategory::Validation);
        assert_eq!(
            RuleCode::PlacementInfeasible.category(),
            RuleCategory::Placement
        );
    }

    #[test]
    fn violation_display_carries_rule_id() {
        let v = Violation::new(RuleCode::M2, "DPP anti-affinity requires 2 sockets, have 1");
        assert_eq!(
            v.to_string(),
            "M2: DPP anti-affinity requires 2 sockets, have 1"
        );
        assert_eq!(v.category, RuleCategory::Placement);
    }

    #[test]
    fn placement_infeasible_renders_dedicated_id() {
        assert_eq!(
            RuleCode::PlacementInfeasible.to_string(),
            "PLACEMENT_INFEASIBLE"
        );
    }
}
