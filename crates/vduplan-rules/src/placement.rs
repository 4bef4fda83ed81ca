//! Placement rules M1–M4.
//!
//! These run before the planner as structural checks: mandatory-pod
//! presence, anti-affinity cardinality against the socket count, and
//! RMP↔DPP pairing feasibility. The planner enforces the actual
//! socket-level constraints when it builds the plan.

use tracing::debug;

use vduplan_catalog::RuleCatalog;
use vduplan_core::{PodKind, ResolvedWorkload, RuleCode, SocketSlot, Vcores, Violation};

/// Evaluate M1–M4 over a resolved workload and its slot table.
pub fn evaluate(
    workload: &ResolvedWorkload,
    catalog: &RuleCatalog,
    slots: &[SocketSlot],
) -> Vec<Violation> {
    let mut violations = Vec::new();

    check_mandatory_pods(workload, catalog, &mut violations);
    check_dpp_anti_affinity(workload, &mut violations);
    check_rmp_pairing(workload, slots, &mut violations);
    check_cmp_anti_affinity(workload, &mut violations);

    debug!(violations = violations.len(), "placement stage evaluated");
    violations
}

/// M1: every catalog-mandatory kind appears in the workload.
fn check_mandatory_pods(
    workload: &ResolvedWorkload,
    catalog: &RuleCatalog,
    violations: &mut Vec<Violation>,
) {
    let missing: Vec<&str> = catalog
        .mandatory_pods(workload.operator)
        .into_iter()
        .filter(|kind| !workload.contains(*kind))
        .map(|kind| kind.as_str())
        .collect();

    if !missing.is_empty() {
        violations.push(Violation::new(
            RuleCode::M1,
            format!("missing mandatory pods: {}", missing.join(", ")),
        ));
    }
}

/// M2: under in-service upgrade, DPP instances are pairwise anti-affine.
fn check_dpp_anti_affinity(workload: &ResolvedWorkload, violations: &mut Vec<Violation>) {
    if !workload.feature_flags.in_service_upgrade {
        return;
    }

    let dpp_count = workload.instance_count(PodKind::Dpp);
    let sockets = workload.total_sockets();

    if sockets < 2 {
        violations.push(Violation::new(
            RuleCode::M2,
            format!(
                "in-service upgrade requires DPP anti-affinity across at least 2 sockets, \
                 have {sockets}"
            ),
        ));
    }
    if dpp_count > sockets {
        violations.push(Violation::new(
            RuleCode::M2,
            format!(
                "{dpp_count} DPP instances need {dpp_count} distinct sockets \
                 for anti-affinity, have {sockets}"
            ),
        ));
    }
}

/// M3: under the vDU-RU switch connection, each RMP is pinned to the
/// socket of its paired DPP: counts must match and some socket must fit
/// a pair together.
fn check_rmp_pairing(
    workload: &ResolvedWorkload,
    slots: &[SocketSlot],
    violations: &mut Vec<Violation>,
) {
    if !workload.feature_flags.vdu_ru_switch_connection {
        return;
    }

    let dpp_count = workload.instance_count(PodKind::Dpp);
    let rmp_count = workload.instance_count(PodKind::Rmp);

    if dpp_count == 0 {
        violations.push(Violation::new(
            RuleCode::M3,
            "RMP socket pairing requires DPP pods, found none",
        ));
        return;
    }
    if rmp_count != dpp_count {
        violations.push(Violation::new(
            RuleCode::M3,
            format!(
                "RMP instances must match DPP instances one-to-one under the \
                 vDU-RU switch connection: {rmp_count} RMP vs {dpp_count} DPP"
            ),
        ));
    }

    // Feasibility: the largest DPP+RMP pair must fit one socket.
    let max_dpp = max_instance_vcores(workload, PodKind::Dpp);
    let max_rmp = max_instance_vcores(workload, PodKind::Rmp);
    let pair = max_dpp + max_rmp;
    let largest = slots
        .iter()
        .map(|s| s.vcores_available)
        .max()
        .unwrap_or(Vcores::ZERO);

    if pair > largest {
        violations.push(Violation::new(
            RuleCode::M3,
            format!(
                "no socket can host an RMP+DPP pair together: \
                 pair needs {pair} vcores, largest socket has {largest}"
            ),
        ));
    }
}

/// M4: under HA, exactly two CMP replicas on distinct sockets.
fn check_cmp_anti_affinity(workload: &ResolvedWorkload, violations: &mut Vec<Violation>) {
    if !workload.feature_flags.ha_enabled {
        return;
    }

    let cmp_count = workload.instance_count(PodKind::Cmp);
    let sockets = workload.total_sockets();

    if cmp_count != 2 {
        violations.push(Violation::new(
            RuleCode::M4,
            format!("HA requires exactly 2 CMP replicas, found {cmp_count}"),
        ));
    }
    if sockets < 2 {
        violations.push(Violation::new(
            RuleCode::M4,
            format!("CMP anti-affinity under HA requires at least 2 sockets, have {sockets}"),
        ));
    }
}

fn max_instance_vcores(workload: &ResolvedWorkload, kind: PodKind) -> Vcores {
    workload
        .pods_of(kind)
        .map(|p| p.requirement.vcores)
        .max()
        .unwrap_or(Vcores::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vduplan_core::{
        FeatureFlags, Operator, PodOrigin, PodRequirement, ResolvedPod, ServerConfiguration,
    };

    fn pod(kind: PodKind, vcores: f64, quantity: u32) -> ResolvedPod {
        let mut requirement = PodRequirement::new(kind, Vcores::from_f64(vcores));
        requirement.quantity = quantity;
        ResolvedPod {
            requirement,
            origin: PodOrigin::Explicit,
            anti_affinity_group: None,
            co_location_group: None,
            paired_with_kind: None,
        }
    }

    fn full_pod_set() -> Vec<ResolvedPod> {
        vec![
            pod(PodKind::Dpp, 14.0, 1),
            pod(PodKind::Dip, 2.0, 1),
            pod(PodKind::Rmp, 0.5, 1),
            pod(PodKind::Cmp, 0.2, 1),
            pod(PodKind::Dmp, 0.2, 1),
            pod(PodKind::Pmp, 0.1, 1),
            pod(PodKind::Ipp, 4.0, 1),
        ]
    }

    fn workload(
        servers: Vec<ServerConfiguration>,
        pods: Vec<ResolvedPod>,
        flags: FeatureFlags,
    ) -> ResolvedWorkload {
        ResolvedWorkload {
            operator: Operator::Vos,
            vdu_flavor_name: "medium-regular-spr-t23".to_string(),
            feature_flags: flags,
            servers,
            pods,
        }
    }

    fn slots_for(workload: &ResolvedWorkload) -> Vec<SocketSlot> {
        crate::capacity::build_slots(
            &workload.servers,
            workload.operator,
            &RuleCatalog::builtin(),
        )
    }

    #[test]
    fn complete_pod_set_passes_m1() {
        let catalog = RuleCatalog::builtin();
        let w = workload(
            vec![ServerConfiguration::new(24, 48, 1)],
            full_pod_set(),
            FeatureFlags::default(),
        );
        let slots = slots_for(&w);
        assert!(evaluate(&w, &catalog, &slots).is_empty());
    }

    #[test]
    fn m1_names_every_missing_kind() {
        let catalog = RuleCatalog::builtin();
        let w = workload(
            vec![ServerConfiguration::new(24, 48, 1)],
            vec![pod(PodKind::Dip, 2.0, 1), pod(PodKind::Dmp, 0.2, 1)],
            FeatureFlags::default(),
        );
        let slots = slots_for(&w);
        let violations = evaluate(&w, &catalog, &slots);

        let m1 = violations.iter().find(|v| v.rule == RuleCode::M1).unwrap();
        for name in ["DPP", "RMP", "CMP", "PMP", "IPP"] {
            assert!(m1.detail.contains(name), "{name} missing from {m1:?}");
        }
        assert!(!m1.detail.contains("DIP"));
    }

    #[test]
    fn m2_requires_two_sockets_for_upgrade() {
        let catalog = RuleCatalog::builtin();
        let flags = FeatureFlags {
            in_service_upgrade: true,
            ..Default::default()
        };
        let mut pods = full_pod_set();
        pods.push(pod(PodKind::Dpp, 14.0, 1)); // second DPP replica
        let w = workload(vec![ServerConfiguration::new(24, 48, 1)], pods, flags);
        let slots = slots_for(&w);

        let violations = evaluate(&w, &catalog, &slots);
        assert!(violations
            .iter()
            .any(|v| v.rule == RuleCode::M2 && v.detail.contains("at least 2 sockets")));
    }

    #[test]
    fn m2_rejects_more_dpp_than_sockets() {
        let catalog = RuleCatalog::builtin();
        let flags = FeatureFlags {
            in_service_upgrade: true,
            ..Default::default()
        };
        let mut pods = full_pod_set();
        pods[0] = pod(PodKind::Dpp, 4.0, 3);
        let mut server = ServerConfiguration::new(48, 96, 2);
        server.pcores_per_socket = Some(24);
        let w = workload(vec![server], pods, flags);
        let slots = slots_for(&w);

        let violations = evaluate(&w, &catalog, &slots);
        assert!(violations
            .iter()
            .any(|v| v.rule == RuleCode::M2 && v.detail.contains("3 DPP instances")));
    }

    #[test]
    fn m3_demands_matching_rmp_count() {
        let catalog = RuleCatalog::builtin();
        let flags = FeatureFlags {
            vdu_ru_switch_connection: true,
            ..Default::default()
        };
        let mut pods = full_pod_set();
        pods[0] = pod(PodKind::Dpp, 7.0, 2); // 2 DPP, still 1 RMP
        let mut server = ServerConfiguration::new(48, 96, 2);
        server.pcores_per_socket = Some(24);
        let w = workload(vec![server], pods, flags);
        let slots = slots_for(&w);

        let violations = evaluate(&w, &catalog, &slots);
        assert!(violations
            .iter()
            .any(|v| v.rule == RuleCode::M3 && v.detail.contains("1 RMP vs 2 DPP")));
    }

    #[test]
    fn m3_checks_pair_fits_a_socket() {
        let catalog = RuleCatalog::builtin();
        let flags = FeatureFlags {
            vdu_ru_switch_connection: true,
            ..Default::default()
        };
        let mut pods = full_pod_set();
        pods[0] = pod(PodKind::Dpp, 34.0, 1);
        pods[2] = pod(PodKind::Rmp, 4.0, 1); // pair needs 38 > 36 available
        let w = workload(vec![ServerConfiguration::new(24, 48, 1)], pods, flags);
        let slots = slots_for(&w);

        let violations = evaluate(&w, &catalog, &slots);
        assert!(violations
            .iter()
            .any(|v| v.rule == RuleCode::M3 && v.detail.contains("RMP+DPP pair")));
    }

    #[test]
    fn m4_single_socket_ha_fails() {
        let catalog = RuleCatalog::builtin();
        let flags = FeatureFlags {
            ha_enabled: true,
            ..Default::default()
        };
        let mut pods = full_pod_set();
        pods[3] = pod(PodKind::Cmp, 0.2, 2);
        let w = workload(vec![ServerConfiguration::new(24, 48, 1)], pods, flags);
        let slots = slots_for(&w);

        let violations = evaluate(&w, &catalog, &slots);
        assert!(violations
            .iter()
            .any(|v| v.rule == RuleCode::M4 && v.detail.contains("at least 2 sockets")));
    }

    #[test]
    fn m4_demands_exactly_two_cmp() {
        let catalog = RuleCatalog::builtin();
        let flags = FeatureFlags {
            ha_enabled: true,
            ..Default::default()
        };
        let mut pods = full_pod_set();
        pods[3] = pod(PodKind::Cmp, 0.2, 3);
        let mut server = ServerConfiguration::new(48, 96, 2);
        server.pcores_per_socket = Some(24);
        let w = workload(vec![server], pods, flags);
        let slots = slots_for(&w);

        let violations = evaluate(&w, &catalog, &slots);
        assert!(violations
            .iter()
            .any(|v| v.rule == RuleCode::M4 && v.detail.contains("exactly 2 CMP")));
    }

    #[test]
    fn m4_dual_socket_pair_passes() {
        let catalog = RuleCatalog::builtin();
        let flags = FeatureFlags {
            ha_enabled: true,
            ..Default::default()
        };
        let mut pods = full_pod_set();
        pods[3] = pod(PodKind::Cmp, 0.2, 2);
        let mut server = ServerConfiguration::new(48, 96, 2);
        server.pcores_per_socket = Some(24);
        let w = workload(vec![server], pods, flags);
        let slots = slots_for(&w);

        assert!(evaluate(&w, &catalog, &slots).is_empty());
    }
}
