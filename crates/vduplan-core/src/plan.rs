//! Placement plans — the planner's output.

use serde::{Deserialize, Serialize};

use crate::types::PodKind;
use crate::vcores::Vcores;

/// Assignment of one pod instance to a socket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PodAssignment {
    /// Instance identity, e.g. `DPP-0`.
    pub instance_id: String,
    pub kind: PodKind,
    pub vcores: Vcores,
    pub server_index: usize,
    pub socket_index: usize,
}

/// Post-placement accounting for one socket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotUsage {
    pub server_index: usize,
    pub socket_index: usize,
    pub vcores_available: Vcores,
    pub vcores_used: Vcores,
    pub vcores_remaining: Vcores,
    pub pod_count: usize,
}

/// A complete placement decision, one assignment per pod instance.
///
/// Assignments preserve placement order; slot usage rows are in
/// (server_index, socket_index) order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementPlan {
    pub assignments: Vec<PodAssignment>,
    pub slots: Vec<SlotUsage>,
}

impl PlacementPlan {
    /// Assignments on one socket, preserving placement order.
    pub fn assignments_on(
        &self,
        server_index: usize,
        socket_index: usize,
    ) -> impl Iterator<Item = &PodAssignment> {
        self.assignments
            .iter()
            .filter(move |a| a.server_index == server_index && a.socket_index == socket_index)
    }

    /// The socket an instance landed on, if placed.
    pub fn socket_of(&self, instance_id: &str) -> Option<(usize, usize)> {
        self.assignments
            .iter()
            .find(|a| a.instance_id == instance_id)
            .map(|a| (a.server_index, a.socket_index))
    }
}
