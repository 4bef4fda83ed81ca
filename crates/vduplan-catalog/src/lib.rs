//! vduplan-catalog — the Deterministic Rule catalog.
//!
//! Loads the DR rules document (JSON) into an immutable [`RuleCatalog`]
//! and exposes the typed accessors the evaluators and resolver consume.
//! Construct once, freeze, then share read-only across engine instances.

pub mod catalog;
pub mod dimensioning;
pub mod error;

pub use catalog::{FlagName, GroupRule, RuleCatalog};
pub use dimensioning::{DimensioningLookup, TableLookup};
pub use error::{CatalogError, CatalogResult};
