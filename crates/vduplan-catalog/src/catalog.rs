//! The DR rule catalog.
//!
//! Rules are data: the catalog is loaded from a JSON document with five
//! top-level sections (capacity_rules, placement_rules, operator_rules,
//! validation_rules, server_configurations), validated once, and frozen
//! into typed lookup tables. Unknown keys in the document are ignored;
//! missing required sections fail the load. After construction the
//! catalog is read-only and safe to share across engine instances.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, warn};

use vduplan_core::{FeatureFlags, Operator, PodKind, ServerConfiguration, Vcores};

use crate::error::{CatalogError, CatalogResult};

/// The builtin DR ruleset shipped with the crate.
const BUILTIN_RULES: &str = include_str!("../rules/vdu_dr_rules.json");

/// A feature flag referenced by a catalog group rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagName {
    HaEnabled,
    InServiceUpgrade,
    VduRuSwitchConnection,
    Directx2Required,
    VcuDeploymentRequired,
}

impl FlagName {
    fn from_key(key: &str) -> Option<FlagName> {
        match key {
            "ha_enabled" => Some(FlagName::HaEnabled),
            "in_service_upgrade" => Some(FlagName::InServiceUpgrade),
            "vdu_ru_switch_connection" => Some(FlagName::VduRuSwitchConnection),
            "directx2_required" => Some(FlagName::Directx2Required),
            "vcu_deployment_required" => Some(FlagName::VcuDeploymentRequired),
            _ => None,
        }
    }

    /// Whether this flag is set in the given request flags.
    pub fn enabled_in(&self, flags: &FeatureFlags) -> bool {
        match self {
            FlagName::HaEnabled => flags.ha_enabled,
            FlagName::InServiceUpgrade => flags.in_service_upgrade,
            FlagName::VduRuSwitchConnection => flags.vdu_ru_switch_connection,
            FlagName::Directx2Required => flags.directx2_required,
            FlagName::VcuDeploymentRequired => flags.vcu_deployment_required,
        }
    }
}

/// A flag-gated pod group (anti-affinity or co-location).
#[derive(Debug, Clone, PartialEq)]
pub struct GroupRule {
    pub name: String,
    pub flag: FlagName,
    pub pods: Vec<PodKind>,
}

// ── Raw document shape ─────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct CatalogDoc {
    capacity_rules: Option<CapacityRulesDoc>,
    placement_rules: Option<PlacementRulesDoc>,
    operator_rules: Option<OperatorRulesDoc>,
    validation_rules: Option<ValidationRulesDoc>,
    server_configurations: Option<BTreeMap<String, Vec<ServerConfiguration>>>,
}

#[derive(Debug, Deserialize)]
struct CapacityRulesDoc {
    caas_cores_per_socket: BTreeMap<String, u32>,
    shared_cores_per_socket: BTreeMap<String, u32>,
    #[serde(default)]
    incomplete_operators: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct PlacementRulesDoc {
    mandatory_pods: Vec<String>,
    #[serde(default)]
    anti_affinity_groups: BTreeMap<String, GroupDoc>,
}

#[derive(Debug, Deserialize)]
struct GroupDoc {
    flag: String,
    pods: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct OperatorRulesDoc {
    #[serde(default)]
    operator_mandatory_pods: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    flavor_implicit_pods: BTreeMap<String, Vec<String>>,
    vcu: VcuDoc,
    #[serde(default)]
    co_location_groups: BTreeMap<String, GroupDoc>,
    #[serde(default)]
    default_pod_vcores: BTreeMap<String, f64>,
}

#[derive(Debug, Deserialize)]
struct VcuDoc {
    #[serde(default)]
    flavor_mapping: BTreeMap<String, VcuFlavorDoc>,
    all_other_flavors: VcuFlavorDoc,
}

#[derive(Debug, Deserialize)]
struct VcuFlavorDoc {
    #[serde(default)]
    vcu_type: String,
    vcores: f64,
}

#[derive(Debug, Deserialize)]
struct ValidationRulesDoc {
    allowed_socket_counts: Vec<u32>,
    known_flavors: Vec<String>,
}

// ── Frozen catalog ─────────────────────────────────────────────────

/// Immutable, fully-resolved DR ruleset.
#[derive(Debug)]
pub struct RuleCatalog {
    caas_cores: HashMap<Operator, u32>,
    shared_cores: HashMap<Operator, u32>,
    shared_global_minimum: u32,
    incomplete_operators: Vec<Operator>,
    mandatory_pods: Vec<PodKind>,
    operator_mandatory: HashMap<Operator, Vec<PodKind>>,
    flavor_implicit: BTreeMap<String, Vec<PodKind>>,
    anti_affinity: Vec<GroupRule>,
    co_location: Vec<GroupRule>,
    vcu_flavor_map: BTreeMap<String, Vcores>,
    vcu_default: Vcores,
    default_pod_vcores: HashMap<PodKind, Vcores>,
    default_pod_fallback: Vcores,
    allowed_socket_counts: Vec<u32>,
    known_flavors: BTreeSet<String>,
    server_configurations: HashMap<Operator, Vec<ServerConfiguration>>,
}

impl RuleCatalog {
    /// The ruleset compiled into the crate.
    pub fn builtin() -> Self {
        // The embedded document is validated by tests; a parse failure
        // here is a packaging bug.
        Self::from_str(BUILTIN_RULES).expect("builtin rules document is valid")
    }

    /// Load a rules document from a file.
    pub fn from_file(path: &Path) -> CatalogResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let catalog = Self::from_str(&content)?;
        debug!(?path, "rules document loaded");
        Ok(catalog)
    }

    /// Parse and freeze a rules document.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> CatalogResult<Self> {
        let doc: CatalogDoc = serde_json::from_str(content)?;

        let capacity = doc
            .capacity_rules
            .ok_or(CatalogError::MissingSection("capacity_rules"))?;
        let placement = doc
            .placement_rules
            .ok_or(CatalogError::MissingSection("placement_rules"))?;
        let operator = doc
            .operator_rules
            .ok_or(CatalogError::MissingSection("operator_rules"))?;
        let validation = doc
            .validation_rules
            .ok_or(CatalogError::MissingSection("validation_rules"))?;
        let servers = doc
            .server_configurations
            .ok_or(CatalogError::MissingSection("server_configurations"))?;

        let shared_global_minimum = capacity
            .shared_cores_per_socket
            .get("global_minimum")
            .copied()
            .unwrap_or(1);

        let catalog = RuleCatalog {
            caas_cores: operator_map(&capacity.caas_cores_per_socket),
            shared_cores: operator_map(
                &capacity
                    .shared_cores_per_socket
                    .iter()
                    .filter(|(k, _)| k.as_str() != "global_minimum")
                    .map(|(k, v)| (k.clone(), *v))
                    .collect(),
            ),
            shared_global_minimum,
            incomplete_operators: known_operators(&capacity.incomplete_operators),
            mandatory_pods: pod_list(&placement.mandatory_pods)?,
            operator_mandatory: operator_pod_map(&operator.operator_mandatory_pods)?,
            flavor_implicit: operator
                .flavor_implicit_pods
                .iter()
                .map(|(flavor, pods)| Ok((flavor.clone(), pod_list(pods)?)))
                .collect::<CatalogResult<_>>()?,
            anti_affinity: group_rules(&placement.anti_affinity_groups)?,
            co_location: group_rules(&operator.co_location_groups)?,
            vcu_flavor_map: operator
                .vcu
                .flavor_mapping
                .iter()
                .map(|(flavor, spec)| (flavor.clone(), Vcores::from_f64(spec.vcores)))
                .collect(),
            vcu_default: Vcores::from_f64(operator.vcu.all_other_flavors.vcores),
            default_pod_vcores: operator
                .default_pod_vcores
                .iter()
                .filter(|(k, _)| k.as_str() != "default")
                .map(|(k, v)| {
                    PodKind::from_name(k)
                        .map(|kind| (kind, Vcores::from_f64(*v)))
                        .ok_or_else(|| CatalogError::UnknownPodKind(k.clone()))
                })
                .collect::<CatalogResult<_>>()?,
            default_pod_fallback: Vcores::from_f64(
                operator
                    .default_pod_vcores
                    .get("default")
                    .copied()
                    .unwrap_or(2.0),
            ),
            allowed_socket_counts: validation.allowed_socket_counts,
            known_flavors: validation.known_flavors.into_iter().collect(),
            server_configurations: servers
                .iter()
                .filter_map(|(name, configs)| {
                    let op = Operator::from_name(name);
                    if op.is_none() {
                        warn!(operator = %name, "ignoring server configurations for unknown operator");
                    }
                    op.map(|op| (op, configs.clone()))
                })
                .collect(),
        };

        if catalog.allowed_socket_counts.is_empty() {
            return Err(CatalogError::InvalidValue(
                "allowed_socket_counts must not be empty".to_string(),
            ));
        }

        Ok(catalog)
    }

    // ── Capacity accessors (C3/C4) ─────────────────────────────────

    /// CaaS pcores reserved on every socket for this operator.
    pub fn caas_cores_per_socket(&self, operator: Operator) -> u32 {
        self.caas_cores.get(&operator).copied().unwrap_or(0)
    }

    /// Shared-function pcores reserved on every socket for this operator.
    /// Falls back to the global minimum when the operator has no entry.
    pub fn shared_cores_per_socket(&self, operator: Operator) -> u32 {
        self.shared_cores
            .get(&operator)
            .copied()
            .unwrap_or(self.shared_global_minimum)
    }

    pub fn shared_global_minimum(&self) -> u32 {
        self.shared_global_minimum
    }

    /// Operators whose capacity rules are marked incomplete in the
    /// document (C3 reports these).
    pub fn is_incomplete_operator(&self, operator: Operator) -> bool {
        self.incomplete_operators.contains(&operator)
    }

    // ── Pod-set accessors (M1/O1/O3) ───────────────────────────────

    /// Mandatory pod kinds for an operator: the baseline set plus any
    /// operator-specific additions, deduped, in document order.
    pub fn mandatory_pods(&self, operator: Operator) -> Vec<PodKind> {
        let mut pods = self.mandatory_pods.clone();
        if let Some(extra) = self.operator_mandatory.get(&operator) {
            for kind in extra {
                if !pods.contains(kind) {
                    pods.push(*kind);
                }
            }
        }
        pods
    }

    /// Kinds the operator mandates beyond the baseline set.
    pub fn operator_mandatory_pods(&self, operator: Operator) -> &[PodKind] {
        self.operator_mandatory
            .get(&operator)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Pod kinds a flavor implies (e.g. IIP for the special TDD flavors).
    pub fn implicit_pods_for_flavor(&self, flavor: &str) -> &[PodKind] {
        self.flavor_implicit
            .get(flavor)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    // ── Group accessors (M2/M4/O4) ─────────────────────────────────

    /// Anti-affinity groups active under the given flags.
    pub fn anti_affinity_groups(&self, flags: &FeatureFlags) -> Vec<&GroupRule> {
        self.anti_affinity
            .iter()
            .filter(|g| g.flag.enabled_in(flags))
            .collect()
    }

    /// Co-location groups active under the given flags.
    pub fn co_location_groups(&self, flags: &FeatureFlags) -> Vec<&GroupRule> {
        self.co_location
            .iter()
            .filter(|g| g.flag.enabled_in(flags))
            .collect()
    }

    // ── Flavor accessors (O2/V3) ───────────────────────────────────

    /// vCU vcore cost for a flavor, with the all-other-flavors fallback.
    pub fn vcu_vcores(&self, flavor: &str) -> Vcores {
        self.vcu_flavor_map
            .get(flavor)
            .copied()
            .unwrap_or(self.vcu_default)
    }

    /// Injection cost for a pod kind the resolver adds without an
    /// explicit record or dimensioning entry.
    pub fn default_pod_vcores(&self, kind: PodKind) -> Vcores {
        self.default_pod_vcores
            .get(&kind)
            .copied()
            .unwrap_or(self.default_pod_fallback)
    }

    pub fn is_known_flavor(&self, flavor: &str) -> bool {
        self.known_flavors.contains(flavor)
    }

    pub fn allowed_socket_counts(&self) -> &[u32] {
        &self.allowed_socket_counts
    }

    /// Reference server configurations for an operator, used for
    /// optimization hints.
    pub fn supported_server_configurations(&self, operator: Operator) -> &[ServerConfiguration] {
        self.server_configurations
            .get(&operator)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

fn operator_map(raw: &BTreeMap<String, u32>) -> HashMap<Operator, u32> {
    raw.iter()
        .filter_map(|(name, value)| {
            let op = Operator::from_name(name);
            if op.is_none() {
                warn!(operator = %name, "ignoring allocation for unknown operator");
            }
            op.map(|op| (op, *value))
        })
        .collect()
}

fn known_operators(names: &[String]) -> Vec<Operator> {
    names
        .iter()
        .filter_map(|name| Operator::from_name(name))
        .collect()
}

fn pod_list(names: &[String]) -> CatalogResult<Vec<PodKind>> {
    names
        .iter()
        .map(|name| {
            PodKind::from_name(name).ok_or_else(|| CatalogError::UnknownPodKind(name.clone()))
        })
        .collect()
}

fn operator_pod_map(
    raw: &BTreeMap<String, Vec<String>>,
) -> CatalogResult<HashMap<Operator, Vec<PodKind>>> {
    let mut out = HashMap::new();
    for (name, pods) in raw {
        match Operator::from_name(name) {
            Some(op) => {
                out.insert(op, pod_list(pods)?);
            }
            None => warn!(operator = %name, "ignoring mandatory pods for unknown operator"),
        }
    }
    Ok(out)
}

fn group_rules(raw: &BTreeMap<String, GroupDoc>) -> CatalogResult<Vec<GroupRule>> {
    raw.iter()
        .map(|(name, doc)| {
            let flag = FlagName::from_key(&doc.flag)
                .ok_or_else(|| CatalogError::UnknownFlag(doc.flag.clone()))?;
            Ok(GroupRule {
                name: name.clone(),
                flag,
                pods: pod_list(&doc.pods)?,
            })
        })
        .collect()
}
