//! Validation rules V1–V3.
//!
//! V3 is the pre-pass over the raw input (well-formedness and
//! catalog-known values) and gates every other stage. V2 runs last over
//! per-server constraints, and V1 condenses the run into the summary
//! message.

use tracing::debug;

use vduplan_catalog::RuleCatalog;
use vduplan_core::{
    DeploymentInput, ResolvedWorkload, RuleCategory, RuleCode, Vcores, Violation,
};

/// V3: input well-formedness. Runs before resolution; a violation here
/// stops the pipeline.
pub fn v3_input(input: &DeploymentInput, catalog: &RuleCatalog) -> Vec<Violation> {
    let mut violations = Vec::new();

    if input.server_configs.is_empty() {
        violations.push(Violation::new(
            RuleCode::V3,
            "at least one server configuration is required",
        ));
    } else if input.total_server_vcores() == 0 {
        violations.push(Violation::new(
            RuleCode::V3,
            "total server vcores must be greater than zero",
        ));
    }

    for (index, server) in input.server_configs.iter().enumerate() {
        if server.pcores == 0 {
            violations.push(Violation::new(
                RuleCode::V3,
                format!("server {index} has invalid pcores: 0"),
            ));
        }
        if server.vcores == 0 {
            violations.push(Violation::new(
                RuleCode::V3,
                format!("server {index} has invalid vcores: 0"),
            ));
        }
        if !catalog.allowed_socket_counts().contains(&server.sockets) {
            violations.push(Violation::new(
                RuleCode::V3,
                format!(
                    "server {index} has invalid socket count: {} (allowed: {:?})",
                    server.sockets,
                    catalog.allowed_socket_counts()
                ),
            ));
        }
    }

    let total_sockets = input.total_sockets() as usize;
    for (index, pod) in input.pod_requirements.iter().enumerate() {
        if pod.vcores <= Vcores::ZERO {
            violations.push(Violation::new(
                RuleCode::V3,
                format!(
                    "pod {index} ({}) has invalid vcores: {}",
                    pod.kind, pod.vcores
                ),
            ));
        }
        if pod.quantity == 0 {
            violations.push(Violation::new(
                RuleCode::V3,
                format!("pod {index} ({}) has invalid quantity: 0", pod.kind),
            ));
        }
        if let Some(socket) = pod.socket_affinity {
            if pod.quantity != 1 {
                violations.push(Violation::new(
                    RuleCode::V3,
                    format!(
                        "pod {index} ({}) sets socket_affinity with quantity {} (must be 1)",
                        pod.kind, pod.quantity
                    ),
                ));
            }
            if socket >= total_sockets {
                violations.push(Violation::new(
                    RuleCode::V3,
                    format!(
                        "pod {index} ({}) socket_affinity {socket} is out of range \
                         ({total_sockets} sockets)",
                        pod.kind
                    ),
                ));
            }
        }
    }

    if input.vdu_flavor_name.trim().is_empty() {
        violations.push(Violation::new(RuleCode::V3, "vDU flavor name is empty"));
    } else if !catalog.is_known_flavor(&input.vdu_flavor_name) {
        violations.push(Violation::new(
            RuleCode::V3,
            format!("unknown vDU flavor: {}", input.vdu_flavor_name),
        ));
    }

    debug!(violations = violations.len(), "input validation evaluated");
    violations
}

/// V2: per-server structural constraints, evaluated in the final stage.
pub fn v2_servers(workload: &ResolvedWorkload) -> Vec<Violation> {
    let mut violations = Vec::new();

    for (index, server) in workload.servers.iter().enumerate() {
        if server.sockets > 0 && server.pcores % server.sockets != 0 {
            violations.push(Violation::new(
                RuleCode::V2,
                format!(
                    "server {index}: {} pcores do not divide evenly across {} sockets",
                    server.pcores, server.sockets
                ),
            ));
        }
        if let Some(per_socket) = server.pcores_per_socket {
            if server.sockets > 0 && per_socket != server.pcores / server.sockets {
                violations.push(Violation::new(
                    RuleCode::V2,
                    format!(
                        "server {index}: pcores_per_socket {per_socket} != {} pcores / {} sockets",
                        server.pcores, server.sockets
                    ),
                ));
            }
        }
    }

    violations
}

/// V1: the run summary. SUCCESS when nothing fired, otherwise a
/// per-category violation count.
pub fn v1_summary(violations: &[Violation]) -> String {
    if violations.is_empty() {
        return "SUCCESS: all deployment rules satisfied".to_string();
    }

    let counts: Vec<String> = RuleCategory::ALL
        .iter()
        .filter_map(|category| {
            let count = violations.iter().filter(|v| v.category == *category).count();
            (count > 0).then(|| format!("{} {}", count, category.label().to_lowercase()))
        })
        .collect();

    format!(
        "FAILURE: {} rule violation(s) ({})",
        violations.len(),
        counts.join(", ")
    )
}
