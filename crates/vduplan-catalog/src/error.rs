//! Catalog load errors.

use thiserror::Error;

/// Errors raised while loading or validating a rules document.
///
/// These are fatal to the engine instance; rule violations at request
/// time are never surfaced through this type.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read rules document: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON in rules document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("missing required section: {0}")]
    MissingSection(&'static str),

    #[error("unknown pod kind in rules document: {0}")]
    UnknownPodKind(String),

    #[error("unknown feature flag in rules document: {0}")]
    UnknownFlag(String),

    #[error("invalid value in rules document: {0}")]
    InvalidValue(String),
}

pub type CatalogResult<T> = Result<T, CatalogError>;
