//! Stable text reports for validation results.
//!
//! The layout is part of the engine's contract: downstream consumers
//! (tests, CLIs, chat frontends) parse these sections. Iteration order is
//! always insertion or (server, socket) order, never hash order.

use vduplan_catalog::RuleCatalog;
use vduplan_core::{
    DeploymentInput, FeatureFlags, RuleCategory, RuleCode, ValidationResult,
};

/// Render the full report: verdict, deployment summary, violations by
/// category, socket utilization, plan, and optimization hints.
pub fn render(input: &DeploymentInput, result: &ValidationResult, catalog: &RuleCatalog) -> String {
    let mut out = String::new();

    let verdict = if result.success { "SUCCESS" } else { "FAILURE" };
    out.push_str(&format!("vDU deployment validation: {verdict}\n"));
    out.push_str(&format!("{}\n", result.message));

    out.push_str("\nDeployment\n");
    out.push_str(&format!("  operator:      {}\n", input.operator));
    out.push_str(&format!("  vDU flavor:    {}\n", input.vdu_flavor_name));
    out.push_str(&format!(
        "  servers:       {} ({} sockets)\n",
        input.server_configs.len(),
        input.total_sockets()
    ));
    out.push_str(&format!(
        "  feature flags: {}\n",
        flag_list(&input.feature_flags)
    ));

    if !result.violations.is_empty() {
        out.push_str("\nViolations\n");
        for category in RuleCategory::ALL {
            let in_category: Vec<_> = result.violations_in(category).collect();
            if in_category.is_empty() {
                continue;
            }
            out.push_str(&format!("  {}\n", category.label()));
            for violation in in_category {
                out.push_str(&format!("    - {violation}\n"));
            }
        }
    }

    if !result.metrics.socket_utilization.is_empty() {
        out.push_str("\nSocket utilization\n");
        for row in &result.metrics.socket_utilization {
            out.push_str(&format!(
                "  server {} socket {}: {}/{} vcores used ({:.1}%), {} pods\n",
                row.server_index,
                row.socket_index,
                row.vcores_used,
                row.vcores_available,
                row.utilization_percent,
                row.pod_count
            ));
        }
    }

    if let Some(plan) = &result.plan {
        out.push_str("\nPlacement plan\n");
        for usage in &plan.slots {
            let pods: Vec<String> = plan
                .assignments_on(usage.server_index, usage.socket_index)
                .map(|a| format!("{} ({})", a.instance_id, a.vcores))
                .collect();
            let listing = if pods.is_empty() {
                "(empty)".to_string()
            } else {
                pods.join(", ")
            };
            out.push_str(&format!(
                "  server {} socket {}: {listing}\n",
                usage.server_index, usage.socket_index
            ));
        }
    }

    let hints = optimization_hints(input, result, catalog);
    if !hints.is_empty() {
        out.push_str("\nHints\n");
        for hint in hints {
            out.push_str(&format!("  - {hint}\n"));
        }
    }

    out
}

fn flag_list(flags: &FeatureFlags) -> String {
    let mut names = Vec::new();
    if flags.ha_enabled {
        names.push("ha_enabled");
    }
    if flags.in_service_upgrade {
        names.push("in_service_upgrade");
    }
    if flags.vdu_ru_switch_connection {
        names.push("vdu_ru_switch_connection");
    }
    if flags.directx2_required {
        names.push("directx2_required");
    }
    if flags.vcu_deployment_required {
        names.push("vcu_deployment_required");
    }
    if names.is_empty() {
        "none".to_string()
    } else {
        names.join(", ")
    }
}

fn push_hint(hints: &mut Vec<String>, hint: String) {
    if !hints.contains(&hint) {
        hints.push(hint);
    }
}

/// Actionable follow-ups derived from the violation set, deduped in
/// first-trigger order. Every failing run gets at least one hint; the
/// generic review fallback covers violations with no specific advice.
fn optimization_hints(
    input: &DeploymentInput,
    result: &ValidationResult,
    catalog: &RuleCatalog,
) -> Vec<String> {
    let mut hints: Vec<String> = Vec::new();

    for violation in &result.violations {
        match violation.rule {
            RuleCode::M2 | RuleCode::M4 if violation.detail.contains("sockets") => {
                push_hint(
                    &mut hints,
                    "add a dual-socket server (or a second server) to satisfy the \
                     anti-affinity spread"
                        .to_string(),
                );
            }
            RuleCode::C1 => {
                let largest = catalog
                    .supported_server_configurations(input.operator)
                    .iter()
                    .max_by_key(|s| s.vcores);
                match largest {
                    Some(server) => push_hint(
                        &mut hints,
                        format!(
                            "reduce pod vcore demand or move to a larger supported \
                             configuration for {} (up to {} pcores / {} sockets)",
                            input.operator, server.pcores, server.sockets
                        ),
                    ),
                    None => push_hint(
                        &mut hints,
                        "reduce pod vcore demand or add server capacity".to_string(),
                    ),
                }
            }
            RuleCode::O4 => {
                push_hint(
                    &mut hints,
                    "free capacity on a single socket for the co-located pods".to_string(),
                );
            }
            RuleCode::PlacementInfeasible if violation.detail.contains("co-location") => {
                push_hint(
                    &mut hints,
                    "free capacity on a single socket for the co-located pods".to_string(),
                );
            }
            RuleCode::V3 if violation.detail.contains("unknown vDU flavor") => {
                push_hint(
                    &mut hints,
                    "check the vDU flavor name against the dimensioning catalog".to_string(),
                );
            }
            _ => {}
        }
    }

    if !result.success && hints.is_empty() {
        push_hint(
            &mut hints,
            "review all deployment parameters and constraints".to_string(),
        );
        push_hint(
            &mut hints,
            "consult the DR rules documentation for the violated rules".to_string(),
        );
    }

    hints
}
