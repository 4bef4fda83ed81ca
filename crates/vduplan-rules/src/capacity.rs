//! Capacity rules C1–C4.
//!
//! C2 checks the pcore→vcore conversion per server, C3/C4 apply the
//! per-operator CaaS and shared-core deductions, and C1 compares the
//! total workload demand against the deducted supply. The evaluator also
//! materializes the `SocketSlot` table consumed by every later stage.

use tracing::{debug, warn};

use vduplan_catalog::RuleCatalog;
use vduplan_core::{
    Operator, ResolvedWorkload, RuleCode, ServerConfiguration, SocketSlot, Vcores, Violation,
};

/// Result of the capacity stage: the slot table plus any violations.
#[derive(Debug)]
pub struct CapacityOutcome {
    pub slots: Vec<SocketSlot>,
    pub violations: Vec<Violation>,
}

/// Evaluate C1–C4 over a resolved workload.
pub fn evaluate(workload: &ResolvedWorkload, catalog: &RuleCatalog) -> CapacityOutcome {
    let mut violations = Vec::new();

    check_core_conversion(&workload.servers, &mut violations);
    check_caas_allocation(workload.operator, catalog, &mut violations);
    check_shared_allocation(workload.operator, catalog, &mut violations);

    let slots = build_slots(&workload.servers, workload.operator, catalog);
    check_total_capacity(workload, &slots, &mut violations);
    check_socket_fit(workload, &slots, &mut violations);

    debug!(
        sockets = slots.len(),
        violations = violations.len(),
        "capacity stage evaluated"
    );
    CapacityOutcome { slots, violations }
}

/// Build the per-socket capacity table: even vcore split per socket,
/// minus the operator's CaaS and shared deductions (pcores, doubled into
/// vcores).
pub fn build_slots(
    servers: &[ServerConfiguration],
    operator: Operator,
    catalog: &RuleCatalog,
) -> Vec<SocketSlot> {
    let caas = Vcores::from_whole(i64::from(catalog.caas_cores_per_socket(operator)) * 2);
    let shared = Vcores::from_whole(i64::from(catalog.shared_cores_per_socket(operator)) * 2);

    let mut slots = Vec::new();
    for (server_index, server) in servers.iter().enumerate() {
        let total = Vcores::from_whole(i64::from(server.vcores_per_socket()));
        for socket_index in 0..server.sockets as usize {
            let available = total.saturating_sub(caas + shared);
            if total < caas + shared {
                warn!(
                    server_index,
                    socket_index,
                    %total,
                    "per-socket deductions exceed socket capacity"
                );
            }
            slots.push(SocketSlot {
                server_index,
                socket_index,
                vcores_total: total,
                vcores_caas: caas,
                vcores_shared: shared,
                vcores_available: available,
            });
        }
    }
    slots
}

/// C2: vcores must equal 2·pcores on every server, and multi-socket
/// servers must split pcores evenly.
fn check_core_conversion(servers: &[ServerConfiguration], violations: &mut Vec<Violation>) {
    for (index, server) in servers.iter().enumerate() {
        if server.vcores != server.pcores * 2 {
            violations.push(Violation::new(
                RuleCode::C2,
                format!(
                    "server {index} core conversion error: {} vcores != {} pcores x 2",
                    server.vcores, server.pcores
                ),
            ));
        }
        if server.sockets > 1 {
            match server.pcores_per_socket {
                None => violations.push(Violation::new(
                    RuleCode::C2,
                    format!("server {index} missing pcores_per_socket for multi-socket config"),
                )),
                Some(per_socket) if per_socket * server.sockets != server.pcores => {
                    violations.push(Violation::new(
                        RuleCode::C2,
                        format!(
                            "server {index} socket core distribution error: \
                             {per_socket} pcores per socket x {} sockets != {} pcores",
                            server.sockets, server.pcores
                        ),
                    ));
                }
                Some(_) => {}
            }
        }
    }
}

/// C3: the operator's CaaS allocation must be defined.
fn check_caas_allocation(operator: Operator, catalog: &RuleCatalog, violations: &mut Vec<Violation>) {
    if catalog.is_incomplete_operator(operator) {
        violations.push(Violation::new(
            RuleCode::C3,
            format!("CaaS core allocation rules for operator {operator} are incomplete"),
        ));
    }
}

/// C4: the shared allocation must meet the global minimum.
fn check_shared_allocation(
    operator: Operator,
    catalog: &RuleCatalog,
    violations: &mut Vec<Violation>,
) {
    let shared = catalog.shared_cores_per_socket(operator);
    let minimum = catalog.shared_global_minimum();
    if shared < minimum {
        violations.push(Violation::new(
            RuleCode::C4,
            format!(
                "shared core allocation {shared} for operator {operator} \
                 is below the global minimum of {minimum}"
            ),
        ));
    }
}

/// C1: total demand against total deducted supply.
fn check_total_capacity(
    workload: &ResolvedWorkload,
    slots: &[SocketSlot],
    violations: &mut Vec<Violation>,
) {
    let demand = workload.total_demand();
    let supply: Vcores = slots.iter().map(|s| s.vcores_available).sum();

    if demand > supply {
        let deficit = demand - supply;
        let total: Vcores = slots.iter().map(|s| s.vcores_total).sum();
        let caas: Vcores = slots.iter().map(|s| s.vcores_caas).sum();
        let shared: Vcores = slots.iter().map(|s| s.vcores_shared).sum();
        violations.push(Violation::new(
            RuleCode::C1,
            format!(
                "CAPACITY_EXCEEDED: demand {demand} vcores > supply {supply} vcores \
                 (deficit {deficit}; total {total} - CaaS {caas} - shared {shared})"
            ),
        ));
    }
}

/// A pod instance that exceeds every socket's available vcores can never
/// be placed, whatever the aggregate numbers say.
fn check_socket_fit(
    workload: &ResolvedWorkload,
    slots: &[SocketSlot],
    violations: &mut Vec<Violation>,
) {
    let largest = slots
        .iter()
        .map(|s| s.vcores_available)
        .max()
        .unwrap_or(Vcores::ZERO);

    for pod in &workload.pods {
        if pod.requirement.vcores > largest {
            violations.push(Violation::new(
                RuleCode::C1,
                format!(
                    "{} pod ({} vcores) exceeds the largest socket capacity \
                     ({largest} vcores) and cannot fit on any socket",
                    pod.kind(),
                    pod.requirement.vcores
                ),
            ));
        }
    }
}
