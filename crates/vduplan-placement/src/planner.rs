//! The placement planner.
//!
//! Runs only after every rule stage has passed. Co-location groups are
//! placed first, atomically, on the first socket that fits the whole
//! group; remaining instances follow in resolved order under the
//! configured strategy. Tie-breaks are fixed: lower server index, then
//! lower socket index, then insertion order. A pod that cannot be placed
//! is retried once against the alternate strategies and then reported as
//! `PLACEMENT_INFEASIBLE`; already-placed pods are never revisited.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use vduplan_core::{
    PlacementPlan, PodAssignment, PodInstance, PodKind, ResolvedWorkload, RuleCode, SlotUsage,
    SocketSlot, Vcores, Violation,
};

use crate::strategy::PlacementStrategy;

/// Result of a planning run: either a complete plan or the violations
/// that prevented one.
#[derive(Debug)]
pub struct PlanOutcome {
    pub plan: Option<PlacementPlan>,
    pub violations: Vec<Violation>,
}

/// Mutable per-slot accounting during planning.
struct SlotState {
    slot: SocketSlot,
    used: Vcores,
    pod_count: usize,
    /// Anti-affinity groups already represented on this socket.
    anti_groups: BTreeSet<String>,
}

impl SlotState {
    fn remaining(&self) -> Vcores {
        self.slot.vcores_available.saturating_sub(self.used)
    }

    fn fits(&self, vcores: Vcores) -> bool {
        self.remaining() >= vcores
    }

    fn admits(&self, instance: &PodInstance) -> bool {
        if !self.fits(instance.vcores) {
            return false;
        }
        match &instance.anti_affinity_group {
            Some(group) => !self.anti_groups.contains(group),
            None => true,
        }
    }
}

/// Plan placements for every instance of the workload.
pub fn plan(
    workload: &ResolvedWorkload,
    slots: &[SocketSlot],
    strategy: PlacementStrategy,
) -> PlanOutcome {
    let instances = workload.instances();
    let mut states: Vec<SlotState> = slots
        .iter()
        .map(|&slot| SlotState {
            slot,
            used: Vcores::ZERO,
            pod_count: 0,
            anti_groups: BTreeSet::new(),
        })
        .collect();

    let mut placed: Vec<Option<usize>> = vec![None; instances.len()];
    let mut assignments: Vec<PodAssignment> = Vec::new();
    let mut violations: Vec<Violation> = Vec::new();

    place_co_location_groups(
        &instances,
        &mut states,
        &mut placed,
        &mut assignments,
        &mut violations,
    );

    // Main pass in resolved order. Paired instances whose target is not
    // yet placed get one deferred pass.
    let mut deferred: Vec<usize> = Vec::new();
    for index in 0..instances.len() {
        if placed[index].is_some() {
            continue;
        }
        if let Some(kind) = instances[index].paired_with_kind {
            let target = pair_target(&instances, &instances[index], kind);
            if target.map_or(true, |t| placed[t].is_none()) {
                deferred.push(index);
                continue;
            }
        }
        place_one(
            &instances,
            index,
            &mut states,
            &mut placed,
            &mut assignments,
            &mut violations,
            strategy,
        );
    }
    for index in deferred {
        place_one(
            &instances,
            index,
            &mut states,
            &mut placed,
            &mut assignments,
            &mut violations,
            strategy,
        );
    }

    if !violations.is_empty() {
        warn!(
            unplaced = violations.len(),
            "placement planning left pods unassigned"
        );
        return PlanOutcome {
            plan: None,
            violations,
        };
    }

    let slot_usage: Vec<SlotUsage> = states
        .iter()
        .map(|state| SlotUsage {
            server_index: state.slot.server_index,
            socket_index: state.slot.socket_index,
            vcores_available: state.slot.vcores_available,
            vcores_used: state.used,
            vcores_remaining: state.remaining(),
            pod_count: state.pod_count,
        })
        .collect();

    debug!(
        pods = assignments.len(),
        strategy = %strategy,
        "placement plan complete"
    );
    PlanOutcome {
        plan: Some(PlacementPlan {
            assignments,
            slots: slot_usage,
        }),
        violations,
    }
}

/// Pre-pass: each co-location group lands atomically on the first socket
/// that fits the whole group; a group that fits nowhere fails as a unit.
fn place_co_location_groups(
    instances: &[PodInstance],
    states: &mut [SlotState],
    placed: &mut [Option<usize>],
    assignments: &mut Vec<PodAssignment>,
    violations: &mut Vec<Violation>,
) {
    // Groups in first-appearance order.
    let mut groups: Vec<(String, Vec<usize>)> = Vec::new();
    for (index, instance) in instances.iter().enumerate() {
        if let Some(name) = &instance.co_location_group {
            match groups.iter_mut().find(|(g, _)| g == name) {
                Some((_, members)) => members.push(index),
                None => groups.push((name.clone(), vec![index])),
            }
        }
    }

    for (name, members) in groups {
        let combined: Vcores = members.iter().map(|&i| instances[i].vcores).sum();

        // A pinned member forces the whole group onto its socket.
        let pinned = members.iter().find_map(|&i| instances[i].socket_affinity);
        let candidate = match pinned {
            Some(slot_index) => states
                .get(slot_index)
                .filter(|s| s.fits(combined))
                .map(|_| slot_index),
            None => states.iter().position(|s| s.fits(combined)),
        };

        match candidate {
            Some(slot_index) => {
                for &member in &members {
                    commit(
                        instances, member, slot_index, states, placed, assignments,
                    );
                }
                debug!(
                    group = %name,
                    slot = %states[slot_index].slot.label(),
                    %combined,
                    "co-location group placed"
                );
            }
            None => {
                let pods: Vec<&str> = members.iter().map(|&i| instances[i].id.as_str()).collect();
                violations.push(Violation::new(
                    RuleCode::PlacementInfeasible,
                    format!(
                        "co-location group '{name}' ({}) needs {combined} vcores \
                         on one socket and fits nowhere",
                        pods.join(", ")
                    ),
                ));
            }
        }
    }
}

/// Place a single instance under the configured strategy, retrying the
/// fixed strategy ladder before giving up on it.
#[allow(clippy::too_many_arguments)]
fn place_one(
    instances: &[PodInstance],
    index: usize,
    states: &mut [SlotState],
    placed: &mut [Option<usize>],
    assignments: &mut Vec<PodAssignment>,
    violations: &mut Vec<Violation>,
    strategy: PlacementStrategy,
) {
    let instance = &instances[index];

    // A pairing or socket-affinity constraint fixes the slot outright.
    let required: Option<Result<usize, String>> = if let Some(kind) = instance.paired_with_kind {
        match pair_target(instances, instance, kind).and_then(|t| placed[t]) {
            Some(slot_index) => Some(Ok(slot_index)),
            None => Some(Err(format!(
                "pairing with {}-{} could not be decided",
                kind, instance.ordinal
            ))),
        }
    } else {
        instance.socket_affinity.map(Ok)
    };

    let eligible: Vec<usize> = match &required {
        Some(Ok(slot_index)) => {
            if states[*slot_index].admits(instance) {
                vec![*slot_index]
            } else {
                Vec::new()
            }
        }
        Some(Err(_)) => Vec::new(),
        None => states
            .iter()
            .enumerate()
            .filter(|(_, s)| s.admits(instance))
            .map(|(i, _)| i)
            .collect(),
    };

    let chosen = std::iter::once(strategy)
        .chain(PlacementStrategy::RETRY_LADDER)
        .find_map(|s| choose_slot(states, &eligible, instance.vcores, s));

    match chosen {
        Some(slot_index) => {
            commit(instances, index, slot_index, states, placed, assignments);
        }
        None => {
            let reason = blocking_constraint(instance, states, required.as_ref());
            violations.push(Violation::new(
                RuleCode::PlacementInfeasible,
                format!("could not place {}: {reason}", instance.id),
            ));
        }
    }
}

/// Pick a slot from the eligible set. Eligible indexes are in slot order,
/// so first-match resolves ties toward lower server, then lower socket.
fn choose_slot(
    states: &[SlotState],
    eligible: &[usize],
    vcores: Vcores,
    strategy: PlacementStrategy,
) -> Option<usize> {
    if eligible.is_empty() {
        return None;
    }

    let post = |i: usize| states[i].remaining() - vcores;

    match strategy {
        PlacementStrategy::FirstFit => eligible.first().copied(),
        PlacementStrategy::BestFit => {
            eligible.iter().copied().reduce(|best, next| {
                if post(next) < post(best) {
                    next
                } else {
                    best
                }
            })
        }
        PlacementStrategy::WorstFit => {
            eligible.iter().copied().reduce(|best, next| {
                if post(next) > post(best) {
                    next
                } else {
                    best
                }
            })
        }
        PlacementStrategy::Balanced => {
            let mean = eligible.iter().map(|&i| post(i).tenths()).sum::<i64>() as f64
                / eligible.len() as f64;
            eligible.iter().copied().reduce(|best, next| {
                let best_gap = (post(best).tenths() as f64 - mean).abs();
                let next_gap = (post(next).tenths() as f64 - mean).abs();
                if next_gap < best_gap {
                    next
                } else {
                    best
                }
            })
        }
    }
}

fn commit(
    instances: &[PodInstance],
    index: usize,
    slot_index: usize,
    states: &mut [SlotState],
    placed: &mut [Option<usize>],
    assignments: &mut Vec<PodAssignment>,
) {
    let instance = &instances[index];
    let state = &mut states[slot_index];

    state.used += instance.vcores;
    state.pod_count += 1;
    if let Some(group) = &instance.anti_affinity_group {
        state.anti_groups.insert(group.clone());
    }
    placed[index] = Some(slot_index);
    assignments.push(PodAssignment {
        instance_id: instance.id.clone(),
        kind: instance.kind,
        vcores: instance.vcores,
        server_index: state.slot.server_index,
        socket_index: state.slot.socket_index,
    });
    debug!(pod = %instance.id, slot = %state.slot.label(), "pod placed");
}

/// The instance this one is paired with: the same-ordinal instance of the
/// target kind.
fn pair_target(instances: &[PodInstance], instance: &PodInstance, kind: PodKind) -> Option<usize> {
    instances
        .iter()
        .position(|other| other.kind == kind && other.ordinal == instance.ordinal)
}

/// Name the constraint that blocked a pod, for the violation detail.
fn blocking_constraint(
    instance: &PodInstance,
    states: &[SlotState],
    required: Option<&Result<usize, String>>,
) -> String {
    match required {
        Some(Err(reason)) => reason.clone(),
        Some(Ok(slot_index)) => {
            let label = states[*slot_index].slot.label();
            if instance.paired_with_kind.is_some() {
                format!("paired socket {label} lacks capacity ({} vcores needed)", instance.vcores)
            } else {
                format!("socket-affinity to {label} lacks capacity ({} vcores needed)", instance.vcores)
            }
        }
        None => {
            let capacity_exists = states.iter().any(|s| s.fits(instance.vcores));
            match (&instance.anti_affinity_group, capacity_exists) {
                (Some(group), true) => {
                    format!("anti-affinity group '{group}' excludes every socket with capacity")
                }
                _ => format!("no socket has {} vcores available", instance.vcores),
            }
        }
    }
}
