//! Domain error model.

use thiserror::Error;

use crate::id::PricelistId;

/// Result type used across the catalog crates.
pub type DomainResult<T> = Result<T, DomainError>;

/// Catalog-level error.
///
/// Every failure here is deterministic: retrying the same call with the same
/// records yields the same error. "No applicable pricing rule" is not an error
/// and never shows up in this enum.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A record failed validation at write time (e.g. unit category mismatch).
    #[error("validation failed: {0}")]
    Validation(String),

    /// Records are configured in a way that cannot be evaluated
    /// (e.g. converting between units of different categories).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A price list chain loops back on itself or is deeper than allowed.
    #[error("configuration error: cyclic price list chain at {pricelist} (depth {depth})")]
    CyclicPricelist { pricelist: PricelistId, depth: usize },

    /// A degenerate conversion factor (zero, negative, not finite).
    #[error("arithmetic error: {0}")]
    Arithmetic(String),

    /// A catalog invariant was violated.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A referenced record does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The record already exists.
    #[error("conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn cyclic_pricelist(pricelist: PricelistId, depth: usize) -> Self {
        Self::CyclicPricelist { pricelist, depth }
    }

    pub fn arithmetic(msg: impl Into<String>) -> Self {
        Self::Arithmetic(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_found(what: impl core::fmt::Display) -> Self {
        Self::NotFound(what.to_string())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// True for the errors that abort a price resolution because of how the
    /// catalog is set up (as opposed to bad input or missing records).
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::CyclicPricelist { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cyclic_pricelist_counts_as_configuration_error() {
        let err = DomainError::cyclic_pricelist(PricelistId::new(), 11);
        assert!(err.is_configuration());
        assert!(err.to_string().starts_with("configuration error"));
    }

    #[test]
    fn validation_is_not_configuration() {
        assert!(!DomainError::validation("bad uom").is_configuration());
        assert!(DomainError::configuration("kg -> unit").is_configuration());
    }
}
