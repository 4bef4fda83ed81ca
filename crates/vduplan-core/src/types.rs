//! Deployment input types — operators, pod kinds, servers, feature flags.

use serde::{Deserialize, Serialize};

use crate::vcores::Vcores;

/// Network operator the vDU is deployed for.
///
/// A closed set: operator-specific allocations and pod rules are catalog
/// data keyed on these variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "VOS")]
    Vos,
    Verizon,
    Boost,
}

impl Operator {
    pub const ALL: [Operator; 3] = [Operator::Vos, Operator::Verizon, Operator::Boost];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Vos => "VOS",
            Operator::Verizon => "Verizon",
            Operator::Boost => "Boost",
        }
    }

    /// Parse the catalog/wire spelling.
    pub fn from_name(name: &str) -> Option<Operator> {
        Operator::ALL.into_iter().find(|op| op.as_str() == name)
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The kind of a vDU pod.
///
/// DPP through PMP form the baseline mandatory set; the rest are optional
/// and enter a deployment explicitly or via catalog injection rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PodKind {
    #[serde(rename = "DPP")]
    Dpp,
    #[serde(rename = "DIP")]
    Dip,
    #[serde(rename = "RMP")]
    Rmp,
    #[serde(rename = "CMP")]
    Cmp,
    #[serde(rename = "DMP")]
    Dmp,
    #[serde(rename = "PMP")]
    Pmp,
    #[serde(rename = "IPP")]
    Ipp,
    #[serde(rename = "IIP")]
    Iip,
    #[serde(rename = "UPP")]
    Upp,
    #[serde(rename = "CSP")]
    Csp,
    #[serde(rename = "vCU")]
    Vcu,
}

impl PodKind {
    pub const ALL: [PodKind; 11] = [
        PodKind::Dpp,
        PodKind::Dip,
        PodKind::Rmp,
        PodKind::Cmp,
        PodKind::Dmp,
        PodKind::Pmp,
        PodKind::Ipp,
        PodKind::Iip,
        PodKind::Upp,
        PodKind::Csp,
        PodKind::Vcu,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PodKind::Dpp => "DPP",
            PodKind::Dip => "DIP",
            PodKind::Rmp => "RMP",
            PodKind::Cmp => "CMP",
            PodKind::Dmp => "DMP",
            PodKind::Pmp => "PMP",
            PodKind::Ipp => "IPP",
            PodKind::Iip => "IIP",
            PodKind::Upp => "UPP",
            PodKind::Csp => "CSP",
            PodKind::Vcu => "vCU",
        }
    }

    /// Parse the catalog/wire spelling.
    pub fn from_name(name: &str) -> Option<PodKind> {
        PodKind::ALL.into_iter().find(|kind| kind.as_str() == name)
    }
}

impl std::fmt::Display for PodKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A pod resource requirement as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PodRequirement {
    pub kind: PodKind,
    /// Vcores per instance.
    pub vcores: Vcores,
    /// Number of instances of this record. Must be ≥ 1.
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    /// Pin all instances of this record to one socket, identified by its
    /// flat index in (server, socket) order. Requires quantity == 1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub socket_affinity: Option<usize>,
    /// Caller-supplied anti-affinity tag, merged with catalog groups.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anti_affinity_group: Option<String>,
    /// Caller-supplied co-location tag, merged with catalog groups.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub co_location_group: Option<String>,
}

fn default_quantity() -> u32 {
    1
}

impl PodRequirement {
    /// A bare requirement with quantity 1 and no placement tags.
    pub fn new(kind: PodKind, vcores: Vcores) -> Self {
        Self {
            kind,
            vcores,
            quantity: 1,
            socket_affinity: None,
            anti_affinity_group: None,
            co_location_group: None,
        }
    }

    /// Total demand across all instances of this record.
    pub fn total_vcores(&self) -> Vcores {
        self.vcores * self.quantity
    }
}

/// Server hardware configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfiguration {
    pub pcores: u32,
    pub vcores: u32,
    pub sockets: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pcores_per_socket: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ServerConfiguration {
    pub fn new(pcores: u32, vcores: u32, sockets: u32) -> Self {
        Self {
            pcores,
            vcores,
            sockets,
            pcores_per_socket: None,
            description: None,
        }
    }

    /// Vcores on each socket, assuming an even split.
    pub fn vcores_per_socket(&self) -> u32 {
        if self.sockets == 0 {
            0
        } else {
            self.vcores / self.sockets
        }
    }
}

/// Optional features that change placement rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureFlags {
    pub ha_enabled: bool,
    pub in_service_upgrade: bool,
    pub vdu_ru_switch_connection: bool,
    pub directx2_required: bool,
    pub vcu_deployment_required: bool,
}

/// A complete validation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentInput {
    pub operator: Operator,
    pub vdu_flavor_name: String,
    pub pod_requirements: Vec<PodRequirement>,
    pub server_configs: Vec<ServerConfiguration>,
    #[serde(default)]
    pub feature_flags: FeatureFlags,
}

impl DeploymentInput {
    /// Sockets across all servers.
    pub fn total_sockets(&self) -> u32 {
        self.server_configs.iter().map(|s| s.sockets).sum()
    }

    /// Raw vcores across all servers, before any deductions.
    pub fn total_server_vcores(&self) -> u32 {
        self.server_configs.iter().map(|s| s.vcores).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operator_names_roundtrip() {
        for op in Operator::ALL {
            assert_eq!(Operator::from_name(op.as_str()), Some(op));
        }
        assert_eq!(Operator::from_name("ATT"), None);
    }

    #[test]
    fn pod_kind_wire_spelling() {
        assert_eq!(PodKind::Vcu.as_str(), "vCU");
        let json = serde_json::to_string(&PodKind::Vcu).unwrap();
        assert_eq!(json, "\"vCU\"");
        let back: PodKind = serde_json::from_str("\"DPP\"").unwrap();
        assert_eq!(back, PodKind::Dpp);
    }

    #[test]
    fn requirement_total_scales_with_quantity() {
        let mut req = PodRequirement::new(PodKind::Cmp, Vcores::from_f64(0.2));
        req.quantity = 2;
        assert_eq!(req.total_vcores(), Vcores::from_f64(0.4));
    }

    #[test]
    fn requirement_quantity_defaults_to_one() {
        let req: PodRequirement =
            serde_json::from_str(r#"{"kind": "DIP", "vcores": 2.0}"#).unwrap();
        assert_eq!(req.quantity, 1);
        assert!(req.socket_affinity.is_none());
    }

    #[test]
    fn per_socket_split() {
        let server = ServerConfiguration::new(48, 96, 2);
        assert_eq!(server.vcores_per_socket(), 48);
    }

    #[test]
    fn input_totals() {
        let input = DeploymentInput {
            operator: Operator::Vos,
            vdu_flavor_name: "medium-regular-spr-t23".to_string(),
            pod_requirements: vec![],
            server_configs: vec![
                ServerConfiguration::new(24, 48, 1),
                ServerConfiguration::new(48, 96, 2),
            ],
            feature_flags: FeatureFlags::default(),
        };
        assert_eq!(input.total_sockets(), 3);
        assert_eq!(input.total_server_vcores(), 144);
    }
}
