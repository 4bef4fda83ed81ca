//! Operator rules O1–O4.
//!
//! Operator- and flag-specific requirements: the operator's own mandatory
//! pods (O1), vCU sizing (O2), flavor-implicit inclusions (O3), and the
//! DirectX2 co-location group (O4). Like the M rules these are
//! pre-placement checks; the planner realizes the co-location itself.

use tracing::debug;

use vduplan_catalog::RuleCatalog;
use vduplan_core::{PodKind, ResolvedWorkload, RuleCode, SocketSlot, Vcores, Violation};

/// Evaluate O1–O4 over a resolved workload and its slot table.
pub fn evaluate(
    workload: &ResolvedWorkload,
    catalog: &RuleCatalog,
    slots: &[SocketSlot],
) -> Vec<Violation> {
    let mut violations = Vec::new();

    check_operator_mandatory(workload, catalog, &mut violations);
    check_vcu(workload, catalog, &mut violations);
    check_flavor_implicit(workload, catalog, &mut violations);
    check_co_location_groups(workload, catalog, slots, &mut violations);

    debug!(violations = violations.len(), "operator stage evaluated");
    violations
}

/// O1: each operator-mandatory kind is present with exactly one instance
/// per vDU.
fn check_operator_mandatory(
    workload: &ResolvedWorkload,
    catalog: &RuleCatalog,
    violations: &mut Vec<Violation>,
) {
    for &kind in catalog.operator_mandatory_pods(workload.operator) {
        let count = workload.instance_count(kind);
        if count == 0 {
            violations.push(Violation::new(
                RuleCode::O1,
                format!(
                    "operator {} requires a {kind} pod, found none",
                    workload.operator
                ),
            ));
        } else if count != 1 {
            violations.push(Violation::new(
                RuleCode::O1,
                format!(
                    "operator {} requires exactly 1 {kind} instance per vDU, found {count}",
                    workload.operator
                ),
            ));
        }
    }
}

/// O2: when vCU deployment is required, the vCU pod must carry the
/// flavor's catalog vcores.
fn check_vcu(workload: &ResolvedWorkload, catalog: &RuleCatalog, violations: &mut Vec<Violation>) {
    if !workload.feature_flags.vcu_deployment_required {
        return;
    }

    if !workload.contains(PodKind::Vcu) {
        violations.push(Violation::new(
            RuleCode::O2,
            "vCU deployment required but no vCU pod is present",
        ));
        return;
    }

    let expected = catalog.vcu_vcores(&workload.vdu_flavor_name);
    for pod in workload.pods_of(PodKind::Vcu) {
        let got = pod.requirement.vcores;
        if got != expected {
            violations.push(Violation::new(
                RuleCode::O2,
                format!(
                    "vCU vcores {got} do not match flavor {} requirement of {expected}",
                    workload.vdu_flavor_name
                ),
            ));
        }
    }
}

/// O3: flavor-implicit kinds (IIP on the special flavors) are present.
fn check_flavor_implicit(
    workload: &ResolvedWorkload,
    catalog: &RuleCatalog,
    violations: &mut Vec<Violation>,
) {
    for &kind in catalog.implicit_pods_for_flavor(&workload.vdu_flavor_name) {
        if !workload.contains(kind) {
            violations.push(Violation::new(
                RuleCode::O3,
                format!(
                    "flavor {} implies a {kind} pod, found none",
                    workload.vdu_flavor_name
                ),
            ));
        }
    }
}

/// O4: every active co-location group is complete and fits one socket.
fn check_co_location_groups(
    workload: &ResolvedWorkload,
    catalog: &RuleCatalog,
    slots: &[SocketSlot],
    violations: &mut Vec<Violation>,
) {
    for group in catalog.co_location_groups(&workload.feature_flags) {
        let missing: Vec<&str> = group
            .pods
            .iter()
            .filter(|kind| !workload.contains(**kind))
            .map(|kind| kind.as_str())
            .collect();
        if !missing.is_empty() {
            violations.push(Violation::new(
                RuleCode::O4,
                format!(
                    "co-location group '{}' is missing mandatory pods: {}",
                    group.name,
                    missing.join(", ")
                ),
            ));
            continue;
        }

        let combined: Vcores = workload
            .pods
            .iter()
            .filter(|p| group.pods.contains(&p.kind()))
            .map(|p| p.requirement.total_vcores())
            .sum();
        let largest = slots
            .iter()
            .map(|s| s.vcores_available)
            .max()
            .unwrap_or(Vcores::ZERO);

        if combined > largest {
            violations.push(Violation::new(
                RuleCode::O4,
                format!(
                    "co-location group '{}' needs {combined} vcores on one socket, \
                     largest socket has {largest}",
                    group.name
                ),
            ));
        }
    }
}
