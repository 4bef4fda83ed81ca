//! Deployment metrics computation.

use vduplan_core::{
    DeploymentInput, DeploymentMetrics, PlacementPlan, ResolvedWorkload, SocketSlot,
    SocketUtilization, Vcores,
};

/// Metrics for a run that passed resolution: per-socket rows from the
/// slot table, usage from the plan when one was generated.
pub fn compute(
    workload: &ResolvedWorkload,
    slots: &[SocketSlot],
    plan: Option<&PlacementPlan>,
) -> DeploymentMetrics {
    let socket_utilization: Vec<SocketUtilization> = slots
        .iter()
        .map(|slot| {
            let (used, pod_count) = match plan {
                Some(plan) => {
                    let assignments: Vec<_> = plan
                        .assignments_on(slot.server_index, slot.socket_index)
                        .collect();
                    (
                        assignments.iter().map(|a| a.vcores).sum(),
                        assignments.len(),
                    )
                }
                None => (Vcores::ZERO, 0),
            };
            SocketUtilization {
                server_index: slot.server_index,
                socket_index: slot.socket_index,
                vcores_total: slot.vcores_total,
                vcores_caas: slot.vcores_caas,
                vcores_shared: slot.vcores_shared,
                vcores_available: slot.vcores_available,
                vcores_used: used,
                utilization_percent: percent(used, slot.vcores_total),
                pod_count,
            }
        })
        .collect();

    let requested = workload.total_demand();
    // Aggregate availability is raw socket capacity; the CaaS/shared
    // deductions show up only in the per-socket rows.
    let available: Vcores = slots.iter().map(|s| s.vcores_total).sum();

    DeploymentMetrics {
        total_servers: workload.servers.len(),
        total_sockets: workload.total_sockets(),
        total_pods: workload.pods.iter().map(|p| p.requirement.quantity).sum(),
        total_vcores_requested: requested,
        total_vcores_available: available,
        overall_utilization_percent: percent(requested, available),
        socket_utilization,
    }
}

/// Minimal metrics for a request rejected before resolution.
pub fn from_input(input: &DeploymentInput) -> DeploymentMetrics {
    let requested: Vcores = input.pod_requirements.iter().map(|p| p.total_vcores()).sum();
    let available = Vcores::from_whole(i64::from(input.total_server_vcores()));
    DeploymentMetrics {
        total_servers: input.server_configs.len(),
        total_sockets: input.total_sockets(),
        total_pods: input.pod_requirements.iter().map(|p| p.quantity).sum(),
        total_vcores_requested: requested,
        total_vcores_available: available,
        overall_utilization_percent: percent(requested, available),
        socket_utilization: Vec::new(),
    }
}

fn percent(part: Vcores, whole: Vcores) -> f64 {
    if whole.is_zero() {
        0.0
    } else {
        part.as_f64() / whole.as_f64() * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vduplan_core::{
        FeatureFlags, Operator, PodAssignment, PodKind, PodOrigin, PodRequirement, ResolvedPod,
        ServerConfiguration,
    };

    fn workload() -> ResolvedWorkload {
        let mut cmp = PodRequirement::new(PodKind::Cmp, Vcores::from_f64(0.2));
        cmp.quantity = 2;
        ResolvedWorkload {
            operator: Operator::Vos,
            vdu_flavor_name: "medium-regular-spr-t23".to_string(),
            feature_flags: FeatureFlags::default(),
            servers: vec![ServerConfiguration::new(24, 48, 1)],
            pods: vec![ResolvedPod {
                requirement: cmp,
                origin: PodOrigin::Explicit,
                anti_affinity_group: None,
                co_location_group: None,
                paired_with_kind: None,
            }],
        }
    }

    fn slot() -> SocketSlot {
        SocketSlot {
            server_index: 0,
            socket_index: 0,
            vcores_total: Vcores::from_whole(48),
            vcores_caas: Vcores::from_whole(8),
            vcores_shared: Vcores::from_whole(4),
            vcores_available: Vcores::from_whole(36),
        }
    }

    #[test]
    fn totals_without_a_plan() {
        let metrics = compute(&workload(), &[slot()], None);
        assert_eq!(metrics.total_pods, 2);
        assert_eq!(metrics.total_vcores_requested, Vcores::from_f64(0.4));
        // Raw socket capacity, not the deducted figure.
        assert_eq!(metrics.total_vcores_available, Vcores::from_whole(48));
        assert!((metrics.overall_utilization_percent - 0.4 / 48.0 * 100.0).abs() < 1e-9);
        assert_eq!(metrics.socket_utilization[0].vcores_used, Vcores::ZERO);
    }

    #[test]
    fn plan_drives_socket_usage() {
        let plan = PlacementPlan {
            assignments: vec![
                PodAssignment {
                    instance_id: "CMP-0".to_string(),
                    kind: PodKind::Cmp,
                    vcores: Vcores::from_f64(0.2),
                    server_index: 0,
                    socket_index: 0,
                },
                PodAssignment {
                    instance_id: "CMP-1".to_string(),
                    kind: PodKind::Cmp,
                    vcores: Vcores::from_f64(0.2),
                    server_index: 0,
                    socket_index: 0,
                },
            ],
            slots: vec![],
        };
        let metrics = compute(&workload(), &[slot()], Some(&plan));
        let row = &metrics.socket_utilization[0];
        assert_eq!(row.vcores_used, Vcores::from_f64(0.4));
        assert_eq!(row.pod_count, 2);
        assert!(row.utilization_percent > 0.8 && row.utilization_percent < 0.9);
    }
}
