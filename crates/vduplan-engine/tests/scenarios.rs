//! End-to-end validation scenarios against the builtin rule catalog.

use std::sync::Arc;

use vduplan_catalog::RuleCatalog;
use vduplan_core::{
    DeploymentInput, FeatureFlags, Operator, PodKind, PodRequirement, RuleCode,
    ServerConfiguration, Vcores,
};
use vduplan_engine::{Engine, ValidateOptions};

fn engine() -> Engine {
    Engine::new(Arc::new(RuleCatalog::builtin()))
}

fn pod(kind: PodKind, vcores: f64) -> PodRequirement {
    PodRequirement::new(kind, Vcores::from_f64(vcores))
}

/// The realistic VOS pod set: six baseline-mandatory kinds; IPP is left
/// to the resolver.
fn baseline_pods() -> Vec<PodRequirement> {
    vec![
        pod(PodKind::Dpp, 14.0),
        pod(PodKind::Dip, 2.0),
        pod(PodKind::Rmp, 0.5),
        pod(PodKind::Cmp, 0.2),
        pod(PodKind::Dmp, 0.2),
        pod(PodKind::Pmp, 0.1),
    ]
}

fn single_socket_server() -> ServerConfiguration {
    ServerConfiguration::new(24, 48, 1)
}

fn dual_socket_server() -> ServerConfiguration {
    let mut server = ServerConfiguration::new(48, 96, 2);
    server.pcores_per_socket = Some(24);
    server
}

fn vos_input(
    servers: Vec<ServerConfiguration>,
    pods: Vec<PodRequirement>,
    flags: FeatureFlags,
) -> DeploymentInput {
    DeploymentInput {
        operator: Operator::Vos,
        vdu_flavor_name: "medium-regular-spr-t23".to_string(),
        pod_requirements: pods,
        server_configs: servers,
        feature_flags: flags,
    }
}

#[test]
fn s1_vos_baseline_passes_on_one_socket() {
    let input = vos_input(
        vec![single_socket_server()],
        baseline_pods(),
        FeatureFlags::default(),
    );

    let result = engine().validate(&input, &ValidateOptions::default());

    assert!(result.success, "violations: {:?}", result.violations);
    let plan = result.plan.expect("plan");

    // IPP was injected and all seven pods landed on (server 0, socket 0).
    assert_eq!(plan.assignments.len(), 7);
    assert!(plan
        .assignments
        .iter()
        .any(|a| a.kind == PodKind::Ipp));
    assert!(plan
        .assignments
        .iter()
        .all(|a| a.server_index == 0 && a.socket_index == 0));
}

#[test]
fn s2_ha_on_single_socket_fails_m4() {
    let input = vos_input(
        vec![single_socket_server()],
        baseline_pods(),
        FeatureFlags {
            ha_enabled: true,
            ..Default::default()
        },
    );

    let result = engine().validate(&input, &ValidateOptions::default());

    assert!(!result.success);
    let m4 = result
        .violations
        .iter()
        .find(|v| v.rule == RuleCode::M4)
        .expect("M4 violation");
    assert!(m4.detail.contains("CMP"));
    assert!(m4.detail.contains("at least 2 sockets"));
    assert!(result.plan.is_none());
}

#[test]
fn s3_ha_satisfied_by_dual_socket() {
    let input = vos_input(
        vec![dual_socket_server()],
        baseline_pods(),
        FeatureFlags {
            ha_enabled: true,
            ..Default::default()
        },
    );

    let result = engine().validate(&input, &ValidateOptions::default());

    assert!(result.success, "violations: {:?}", result.violations);
    let plan = result.plan.expect("plan");

    // The resolver raised CMP to the HA pair; replicas sit apart.
    let cmp0 = plan.socket_of("CMP-0").expect("CMP-0 placed");
    let cmp1 = plan.socket_of("CMP-1").expect("CMP-1 placed");
    assert_ne!(cmp0, cmp1);
}

#[test]
fn s4_capacity_overflow_reports_c1() {
    // 200 vcores of demand against one dual-socket 96-vcore server
    // (2 x 36 available after VOS deductions).
    let pods = vec![
        pod(PodKind::Dpp, 36.0),
        pod(PodKind::Dip, 36.0),
        pod(PodKind::Rmp, 36.0),
        pod(PodKind::Cmp, 36.0),
        pod(PodKind::Dmp, 28.0),
        pod(PodKind::Pmp, 24.0),
        pod(PodKind::Ipp, 4.0),
    ];
    let input = vos_input(vec![dual_socket_server()], pods, FeatureFlags::default());

    let result = engine().validate(&input, &ValidateOptions::default());

    assert!(!result.success);
    let c1 = result
        .violations
        .iter()
        .find(|v| v.rule == RuleCode::C1)
        .expect("C1 violation");
    assert!(c1.detail.contains("CAPACITY_EXCEEDED"));
    assert!(c1.detail.contains("demand 200"));
    assert!(c1.detail.contains("supply 72"));
    assert!(c1.detail.contains("deficit 128"));
}

#[test]
fn s5_directx2_group_shares_a_socket() {
    let input = vos_input(
        vec![dual_socket_server()],
        baseline_pods(),
        FeatureFlags {
            directx2_required: true,
            ..Default::default()
        },
    );

    let result = engine().validate(&input, &ValidateOptions::default());

    assert!(result.success, "violations: {:?}", result.violations);
    let plan = result.plan.expect("plan");

    let ipp = plan.socket_of("IPP-0").expect("IPP placed");
    assert_eq!(plan.socket_of("CSP-0").expect("CSP placed"), ipp);
    assert_eq!(plan.socket_of("UPP-0").expect("UPP placed"), ipp);
}

#[test]
fn s6_unknown_flavor_fails_v3_without_planning() {
    let mut input = vos_input(
        vec![single_socket_server()],
        baseline_pods(),
        FeatureFlags::default(),
    );
    input.vdu_flavor_name = "does-not-exist".to_string();

    let result = engine().validate(&input, &ValidateOptions::default());

    assert!(!result.success);
    assert!(result.violations.iter().all(|v| v.rule == RuleCode::V3));
    assert!(result
        .violations
        .iter()
        .any(|v| v.detail.contains("unknown vDU flavor: does-not-exist")));
    assert!(result.plan.is_none());
}

#[test]
fn vcu_flag_injects_and_validates_sizing() {
    let input = vos_input(
        vec![dual_socket_server()],
        baseline_pods(),
        FeatureFlags {
            vcu_deployment_required: true,
            ..Default::default()
        },
    );

    let result = engine().validate(&input, &ValidateOptions::default());
    assert!(result.success, "violations: {:?}", result.violations);

    let plan = result.plan.expect("plan");
    let vcu = plan
        .assignments
        .iter()
        .find(|a| a.kind == PodKind::Vcu)
        .expect("vCU placed");
    // medium-regular-spr-t23 maps to the 15-vcore vCU.
    assert_eq!(vcu.vcores, Vcores::from_whole(15));
}

#[test]
fn explicit_vcu_with_wrong_sizing_fails_o2() {
    let mut pods = baseline_pods();
    pods.push(pod(PodKind::Vcu, 18.0));
    let input = vos_input(
        vec![dual_socket_server()],
        pods,
        FeatureFlags {
            vcu_deployment_required: true,
            ..Default::default()
        },
    );

    let result = engine().validate(&input, &ValidateOptions::default());

    assert!(!result.success);
    assert!(result.violations.iter().any(|v| v.rule == RuleCode::O2));
}

#[test]
fn upgrade_and_switch_flags_compose() {
    // In-service upgrade spreads the DPP pair; the switch connection
    // pins each RMP to its paired DPP's socket.
    let mut pods = baseline_pods();
    pods[2].quantity = 2; // RMP pair to match the DPP pair
    let input = vos_input(
        vec![dual_socket_server()],
        pods,
        FeatureFlags {
            in_service_upgrade: true,
            vdu_ru_switch_connection: true,
            ..Default::default()
        },
    );

    let result = engine().validate(&input, &ValidateOptions::default());
    assert!(result.success, "violations: {:?}", result.violations);

    let plan = result.plan.expect("plan");
    let dpp0 = plan.socket_of("DPP-0").unwrap();
    let dpp1 = plan.socket_of("DPP-1").unwrap();
    assert_ne!(dpp0, dpp1);
    assert_eq!(plan.socket_of("RMP-0").unwrap(), dpp0);
    assert_eq!(plan.socket_of("RMP-1").unwrap(), dpp1);
}

#[test]
fn boost_operator_reports_incomplete_caas_rules() {
    let mut input = vos_input(
        vec![single_socket_server()],
        baseline_pods(),
        FeatureFlags::default(),
    );
    input.operator = Operator::Boost;

    let result = engine().validate(&input, &ValidateOptions::default());

    assert!(!result.success);
    assert!(result
        .violations
        .iter()
        .any(|v| v.rule == RuleCode::C3 && v.detail.contains("incomplete")));
}

#[test]
fn verizon_baseline_passes_without_ipp() {
    let mut input = vos_input(
        vec![single_socket_server()],
        baseline_pods(),
        FeatureFlags::default(),
    );
    input.operator = Operator::Verizon;

    let result = engine().validate(&input, &ValidateOptions::default());

    assert!(result.success, "violations: {:?}", result.violations);
    let plan = result.plan.expect("plan");
    assert_eq!(plan.assignments.len(), 6);
    assert!(!plan.assignments.iter().any(|a| a.kind == PodKind::Ipp));
}
