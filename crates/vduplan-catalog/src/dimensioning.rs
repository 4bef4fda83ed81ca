//! Dimensioning lookup — the external flavor → pod-set interface.
//!
//! The dimensioning tables themselves are loaded by collaborators (CSV
//! parsing is out of scope here); the resolver only needs this lookup to
//! price the pods it injects. `TableLookup` is a plain in-memory
//! implementation for hosts and tests.

use std::collections::HashMap;

use vduplan_core::{Operator, PodKind, Vcores};

/// Maps a (operator, vDU flavor) pair to the pod set the dimensioning
/// tables prescribe for it.
pub trait DimensioningLookup: Send + Sync {
    /// The dimensioned pods for a flavor, or `None` when the flavor is
    /// not dimensioned for this operator.
    fn pods_for(&self, operator: Operator, vdu_flavor_name: &str) -> Option<Vec<(PodKind, Vcores)>>;
}

/// In-memory dimensioning table.
#[derive(Debug, Default)]
pub struct TableLookup {
    rows: HashMap<(Operator, String), Vec<(PodKind, Vcores)>>,
}

impl TableLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the pod set for a flavor.
    pub fn insert(
        &mut self,
        operator: Operator,
        vdu_flavor_name: impl Into<String>,
        pods: Vec<(PodKind, Vcores)>,
    ) {
        self.rows.insert((operator, vdu_flavor_name.into()), pods);
    }
}

impl DimensioningLookup for TableLookup {
    fn pods_for(&self, operator: Operator, vdu_flavor_name: &str) -> Option<Vec<(PodKind, Vcores)>> {
        self.rows
            .get(&(operator, vdu_flavor_name.to_string()))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_hits_and_misses() {
        let mut table = TableLookup::new();
        table.insert(
            Operator::Vos,
            "medium-regular-spr-t23",
            vec![
                (PodKind::Dpp, Vcores::from_whole(14)),
                (PodKind::Dip, Vcores::from_whole(2)),
            ],
        );

        let pods = table
            .pods_for(Operator::Vos, "medium-regular-spr-t23")
            .unwrap();
        assert_eq!(pods.len(), 2);
        assert_eq!(pods[0], (PodKind::Dpp, Vcores::from_whole(14)));

        assert!(table.pods_for(Operator::Verizon, "medium-regular-spr-t23").is_none());
        assert!(table.pods_for(Operator::Vos, "unknown").is_none());
    }
}
