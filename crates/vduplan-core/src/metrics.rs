//! Deployment utilization metrics.

use serde::{Deserialize, Serialize};

use crate::vcores::Vcores;

/// Utilization of one socket after planning (or zeros when no plan was
/// generated).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocketUtilization {
    pub server_index: usize,
    pub socket_index: usize,
    pub vcores_total: Vcores,
    pub vcores_caas: Vcores,
    pub vcores_shared: Vcores,
    pub vcores_available: Vcores,
    pub vcores_used: Vcores,
    pub utilization_percent: f64,
    pub pod_count: usize,
}

/// Summary numbers for a validation run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DeploymentMetrics {
    pub total_servers: usize,
    pub total_sockets: u32,
    pub total_pods: u32,
    pub total_vcores_requested: Vcores,
    /// Raw vcores across all sockets, before CaaS/shared deductions.
    pub total_vcores_available: Vcores,
    /// requested / available, against the raw capacity above.
    pub overall_utilization_percent: f64,
    /// Per-socket rows in (server_index, socket_index) order.
    pub socket_utilization: Vec<SocketUtilization>,
}
