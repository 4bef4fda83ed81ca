//! Resolved workloads and socket slots.
//!
//! A `ResolvedWorkload` is the deployment input after catalog-driven pod
//! injection and group tagging. Evaluators and the planner operate on it
//! exclusively; the raw input is never consulted past resolution.

use serde::{Deserialize, Serialize};

use crate::types::{FeatureFlags, Operator, PodKind, PodRequirement, ServerConfiguration};
use crate::vcores::Vcores;

/// Where a resolved pod record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PodOrigin {
    /// Supplied in the request's pod_requirements.
    Explicit,
    /// Injected because the operator mandates the kind.
    OperatorMandatory,
    /// Injected because the vDU flavor implies the kind.
    FlavorImplicit,
    /// Injected (or replicated) because a feature flag demands it.
    FlagConditional,
}

/// A pod record after resolution: the requirement plus provenance and the
/// placement groups the catalog attached to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedPod {
    pub requirement: PodRequirement,
    pub origin: PodOrigin,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anti_affinity_group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub co_location_group: Option<String>,
    /// Each instance of this pod must land on the socket of the matching
    /// instance of the named kind (RMP → DPP under the vDU-RU switch).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paired_with_kind: Option<PodKind>,
}

impl ResolvedPod {
    pub fn kind(&self) -> PodKind {
        self.requirement.kind
    }
}

/// The deployment input with all injections applied, in resolution order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedWorkload {
    pub operator: Operator,
    pub vdu_flavor_name: String,
    pub feature_flags: FeatureFlags,
    pub servers: Vec<ServerConfiguration>,
    pub pods: Vec<ResolvedPod>,
}

impl ResolvedWorkload {
    /// Total vcore demand over all pod instances.
    pub fn total_demand(&self) -> Vcores {
        self.pods.iter().map(|p| p.requirement.total_vcores()).sum()
    }

    /// Number of instances of one kind across all records.
    pub fn instance_count(&self, kind: PodKind) -> u32 {
        self.pods
            .iter()
            .filter(|p| p.kind() == kind)
            .map(|p| p.requirement.quantity)
            .sum()
    }

    /// All records of one kind, in resolution order.
    pub fn pods_of(&self, kind: PodKind) -> impl Iterator<Item = &ResolvedPod> {
        self.pods.iter().filter(move |p| p.kind() == kind)
    }

    pub fn contains(&self, kind: PodKind) -> bool {
        self.pods.iter().any(|p| p.kind() == kind)
    }

    /// Sockets across all servers.
    pub fn total_sockets(&self) -> u32 {
        self.servers.iter().map(|s| s.sockets).sum()
    }

    /// Expand records into per-instance placement units, in resolution
    /// order. Instance identities are `KIND-i`, numbered per kind.
    pub fn instances(&self) -> Vec<PodInstance> {
        let mut per_kind: std::collections::HashMap<PodKind, u32> =
            std::collections::HashMap::new();
        let mut out = Vec::new();
        for pod in &self.pods {
            for _ in 0..pod.requirement.quantity {
                let ordinal = per_kind.entry(pod.kind()).or_insert(0);
                out.push(PodInstance {
                    id: format!("{}-{}", pod.kind(), *ordinal),
                    kind: pod.kind(),
                    ordinal: *ordinal,
                    vcores: pod.requirement.vcores,
                    origin: pod.origin,
                    socket_affinity: pod.requirement.socket_affinity,
                    anti_affinity_group: pod.anti_affinity_group.clone(),
                    co_location_group: pod.co_location_group.clone(),
                    paired_with_kind: pod.paired_with_kind,
                });
                *ordinal += 1;
            }
        }
        out
    }
}

/// A single placeable pod instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PodInstance {
    /// Stable identity, e.g. `DPP-0`.
    pub id: String,
    pub kind: PodKind,
    /// Per-kind instance number, 0-based.
    pub ordinal: u32,
    pub vcores: Vcores,
    pub origin: PodOrigin,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub socket_affinity: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anti_affinity_group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub co_location_group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paired_with_kind: Option<PodKind>,
}

/// Capacity of one CPU socket after the per-operator deductions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SocketSlot {
    pub server_index: usize,
    pub socket_index: usize,
    pub vcores_total: Vcores,
    pub vcores_caas: Vcores,
    pub vcores_shared: Vcores,
    /// total − caas − shared, clamped at zero.
    pub vcores_available: Vcores,
}

impl SocketSlot {
    pub fn label(&self) -> String {
        format!("server {} socket {}", self.server_index, self.socket_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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

    fn workload(pods: Vec<ResolvedPod>) -> ResolvedWorkload {
        ResolvedWorkload {
            operator: Operator::Vos,
            vdu_flavor_name: "medium-regular-spr-t23".to_string(),
            feature_flags: FeatureFlags::default(),
            servers: vec![ServerConfiguration::new(24, 48, 1)],
            pods,
        }
    }

    #[test]
    fn demand_sums_across_records_and_quantities() {
        let w = workload(vec![pod(PodKind::Dpp, 14.0, 1), pod(PodKind::Cmp, 0.2, 2)]);
        assert_eq!(w.total_demand(), Vcores::from_f64(14.4));
        assert_eq!(w.instance_count(PodKind::Cmp), 2);
    }

    #[test]
    fn instances_are_numbered_per_kind() {
        let w = workload(vec![
            pod(PodKind::Cmp, 0.2, 2),
            pod(PodKind::Dpp, 14.0, 1),
            pod(PodKind::Cmp, 0.3, 1),
        ]);
        let ids: Vec<String> = w.instances().into_iter().map(|i| i.id).collect();
        assert_eq!(ids, vec!["CMP-0", "CMP-1", "DPP-0", "CMP-2"]);
    }

    #[test]
    fn slot_label_names_server_and_socket() {
        let slot = SocketSlot {
            server_index: 1,
            socket_index: 0,
            vcores_total: Vcores::from_whole(48),
            vcores_caas: Vcores::from_whole(8),
            vcores_shared: Vcores::from_whole(4),
            vcores_available: Vcores::from_whole(36),
        };
        assert_eq!(slot.label(), "server 1 socket 0");
    }
}
