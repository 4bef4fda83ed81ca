//! vduplan-engine — the validation entry point.
//!
//! The [`Engine`] owns a frozen rule catalog (and optionally a
//! dimensioning lookup) and evaluates deployment requests through the
//! fixed stage pipeline: input validation, workload resolution, capacity
//! rules, placement rules, operator rules, final validation, and — on a
//! clean pass — placement planning. The engine is stateless between
//! requests; any number of engines may share one catalog.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use vduplan_catalog::RuleCatalog;
//! use vduplan_core::{DeploymentInput, FeatureFlags, Operator, ServerConfiguration};
//! use vduplan_engine::{Engine, ValidateOptions};
//!
//! let engine = Engine::new(Arc::new(RuleCatalog::builtin()));
//! let input = DeploymentInput {
//!     operator: Operator::Vos,
//!     vdu_flavor_name: "medium-regular-spr-t23".to_string(),
//!     pod_requirements: vec![],
//!     server_configs: vec![ServerConfiguration::new(24, 48, 1)],
//!     feature_flags: FeatureFlags::default(),
//! };
//! let result = engine.validate(&input, &ValidateOptions::default());
//! assert!(result.success);
//! ```

pub mod metrics;
pub mod orchestrator;
pub mod report;

pub use orchestrator::{Engine, ValidateOptions};
pub use vduplan_placement::PlacementStrategy;
