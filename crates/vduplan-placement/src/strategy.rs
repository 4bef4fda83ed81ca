//! Slot-selection strategies.

use serde::{Deserialize, Serialize};

/// How the planner picks among eligible sockets for a pod instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementStrategy {
    /// First eligible slot in (server, socket) order.
    FirstFit,
    /// Slot with the smallest remaining vcores after placement.
    BestFit,
    /// Slot with the largest remaining vcores after placement.
    WorstFit,
    /// Slot whose post-placement remainder is closest to the mean
    /// remainder across eligible slots. Default.
    Balanced,
}

impl PlacementStrategy {
    /// Retry order when the configured strategy fails for a pod.
    pub const RETRY_LADDER: [PlacementStrategy; 3] = [
        PlacementStrategy::FirstFit,
        PlacementStrategy::BestFit,
        PlacementStrategy::WorstFit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlacementStrategy::FirstFit => "first_fit",
            PlacementStrategy::BestFit => "best_fit",
            PlacementStrategy::WorstFit => "worst_fit",
            PlacementStrategy::Balanced => "balanced",
        }
    }
}

impl Default for PlacementStrategy {
    fn default() -> Self {
        PlacementStrategy::Balanced
    }
}

impl std::fmt::Display for PlacementStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_balanced() {
        assert_eq!(PlacementStrategy::default(), PlacementStrategy::Balanced);
    }

    #[test]
    fn serializes_snake_case() {
        let json = serde_json::to_string(&PlacementStrategy::BestFit).unwrap();
        assert_eq!(json, "\"best_fit\"");
        let back: PlacementStrategy = serde_json::from_str("\"worst_fit\"").unwrap();
        assert_eq!(back, PlacementStrategy::WorstFit);
    }
}
