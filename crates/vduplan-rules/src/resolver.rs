//! Workload resolution — catalog-driven pod injection and group tagging.
//!
//! Resolution order is fixed and observable:
//! 1. explicit pod requirements,
//! 2. operator-mandatory kinds absent from the explicit set,
//! 3. flavor-implicit kinds,
//! 4. vCU when `vcu_deployment_required`,
//! 5. replica floors for the HA / in-service-upgrade pairs,
//! 6. missing members of active co-location groups,
//! 7. anti-affinity / co-location group tags and RMP→DPP pairing.
//!
//! Explicit records dominate: a kind that appears in the request is never
//! re-injected, and its vcores and quantity stand as given.

use tracing::debug;

use vduplan_catalog::{DimensioningLookup, RuleCatalog};
use vduplan_core::{
    DeploymentInput, PodKind, PodOrigin, PodRequirement, ResolvedPod, ResolvedWorkload, Vcores,
};

/// Resolve a deployment input against the catalog.
///
/// When a dimensioning lookup is supplied, injected pods are priced from
/// the flavor's dimensioned pod set; otherwise the catalog's default
/// injection costs apply.
pub fn resolve(
    input: &DeploymentInput,
    catalog: &RuleCatalog,
    dimensioning: Option<&dyn DimensioningLookup>,
) -> ResolvedWorkload {
    let dimensioned = dimensioning.and_then(|d| d.pods_for(input.operator, &input.vdu_flavor_name));

    let mut pods: Vec<ResolvedPod> = input
        .pod_requirements
        .iter()
        .cloned()
        .map(|requirement| ResolvedPod {
            anti_affinity_group: requirement.anti_affinity_group.clone(),
            co_location_group: requirement.co_location_group.clone(),
            requirement,
            origin: PodOrigin::Explicit,
            paired_with_kind: None,
        })
        .collect();

    let contains = |pods: &[ResolvedPod], kind: PodKind| pods.iter().any(|p| p.kind() == kind);

    // Step 2: operator-mandatory kinds.
    for kind in catalog.mandatory_pods(input.operator) {
        if !contains(&pods, kind) {
            let vcores = injected_vcores(kind, catalog, dimensioned.as_deref());
            debug!(pod = %kind, %vcores, "injecting operator-mandatory pod");
            pods.push(injected(kind, vcores, PodOrigin::OperatorMandatory));
        }
    }

    // Step 3: flavor-implicit kinds.
    for &kind in catalog.implicit_pods_for_flavor(&input.vdu_flavor_name) {
        if !contains(&pods, kind) {
            let vcores = injected_vcores(kind, catalog, dimensioned.as_deref());
            debug!(pod = %kind, flavor = %input.vdu_flavor_name, "injecting flavor-implicit pod");
            pods.push(injected(kind, vcores, PodOrigin::FlavorImplicit));
        }
    }

    // Step 4: vCU on demand, priced per flavor.
    if input.feature_flags.vcu_deployment_required && !contains(&pods, PodKind::Vcu) {
        let vcores = catalog.vcu_vcores(&input.vdu_flavor_name);
        debug!(%vcores, flavor = %input.vdu_flavor_name, "injecting vCU pod");
        pods.push(injected(PodKind::Vcu, vcores, PodOrigin::FlagConditional));
    }

    // Step 5: replica floors. HA needs the CMP pair, in-service upgrade
    // needs the DPP pair; explicit quantities at or above the floor stand.
    if input.feature_flags.ha_enabled {
        raise_replica_floor(&mut pods, PodKind::Cmp, 2);
    }
    if input.feature_flags.in_service_upgrade {
        raise_replica_floor(&mut pods, PodKind::Dpp, 2);
    }

    // Step 6: missing members of active co-location groups.
    for group in catalog.co_location_groups(&input.feature_flags) {
        for &kind in &group.pods {
            if !contains(&pods, kind) {
                let vcores = injected_vcores(kind, catalog, dimensioned.as_deref());
                debug!(pod = %kind, group = %group.name, "injecting co-location group member");
                pods.push(injected(kind, vcores, PodOrigin::FlagConditional));
            }
        }
    }

    // Step 7: group tags and pairing. Caller-supplied tags win.
    for group in catalog.anti_affinity_groups(&input.feature_flags) {
        for pod in pods.iter_mut().filter(|p| group.pods.contains(&p.kind())) {
            if pod.anti_affinity_group.is_none() {
                pod.anti_affinity_group = Some(group.name.clone());
            }
        }
    }
    for group in catalog.co_location_groups(&input.feature_flags) {
        for pod in pods.iter_mut().filter(|p| group.pods.contains(&p.kind())) {
            if pod.co_location_group.is_none() {
                pod.co_location_group = Some(group.name.clone());
            }
        }
    }
    if input.feature_flags.vdu_ru_switch_connection {
        for pod in pods.iter_mut().filter(|p| p.kind() == PodKind::Rmp) {
            pod.paired_with_kind = Some(PodKind::Dpp);
        }
    }

    ResolvedWorkload {
        operator: input.operator,
        vdu_flavor_name: input.vdu_flavor_name.clone(),
        feature_flags: input.feature_flags,
        servers: input.server_configs.clone(),
        pods,
    }
}

/// Price for an injected kind: the flavor's dimensioned entry when the
/// lookup has one, else the catalog default.
fn injected_vcores(
    kind: PodKind,
    catalog: &RuleCatalog,
    dimensioned: Option<&[(PodKind, Vcores)]>,
) -> Vcores {
    dimensioned
        .and_then(|pods| pods.iter().find(|(k, _)| *k == kind))
        .map(|(_, vcores)| *vcores)
        .unwrap_or_else(|| catalog.default_pod_vcores(kind))
}

fn injected(kind: PodKind, vcores: Vcores, origin: PodOrigin) -> ResolvedPod {
    ResolvedPod {
        requirement: PodRequirement::new(kind, vcores),
        origin,
        anti_affinity_group: None,
        co_location_group: None,
        paired_with_kind: None,
    }
}

/// Ensure at least `floor` instances of a kind exist, adding replica
/// records priced like the first record of that kind.
fn raise_replica_floor(pods: &mut Vec<ResolvedPod>, kind: PodKind, floor: u32) {
    let current: u32 = pods
        .iter()
        .filter(|p| p.kind() == kind)
        .map(|p| p.requirement.quantity)
        .sum();
    if current == 0 || current >= floor {
        return;
    }
    let vcores = pods
        .iter()
        .find(|p| p.kind() == kind)
        .map(|p| p.requirement.vcores)
        .unwrap_or(Vcores::ZERO);
    let mut replica = PodRequirement::new(kind, vcores);
    replica.quantity = floor - current;
    debug!(pod = %kind, replicas = replica.quantity, "raising replica floor");
    pods.push(ResolvedPod {
        requirement: replica,
        origin: PodOrigin::FlagConditional,
        anti_affinity_group: None,
        co_location_group: None,
        paired_with_kind: None,
    });
}
