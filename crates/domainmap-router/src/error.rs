//! Validation errors raised by administrative mutations
//!
//! Resolution never produces these; only `add`/`update`/`remove` style
//! operations do, synchronously, and they are never retried.

use crate::pattern::PatternError;
use std::fmt;
use thiserror::Error;

/// Which table a record lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Domain,
    Alias,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Domain => write!(f, "domain"),
            RecordKind::Alias => write!(f, "alias"),
        }
    }
}

/// Domain map errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MapError {
    #[error("{0} '{1}' already exists")]
    DuplicateId(RecordKind, String),

    #[error("{0} '{1}' not found")]
    NotFound(RecordKind, String),

    #[error("domain '{id}' cannot be default: '{existing}' is already the default domain")]
    InvalidDefault { id: String, existing: String },

    #[error("alias '{alias_id}' references unknown domain '{domain_id}'")]
    UnknownDomain { alias_id: String, domain_id: String },

    #[error("domain '{domain_id}' is referenced by aliases: {}", aliases.join(", "))]
    DomainInUse {
        domain_id: String,
        aliases: Vec<String>,
    },

    #[error("hostname '{hostname}' is already used by domain '{existing}'")]
    DuplicateHostname { hostname: String, existing: String },

    #[error("pattern '{pattern}' is already used by alias '{existing}'")]
    DuplicatePattern { pattern: String, existing: String },

    #[error("invalid hostname '{0}'")]
    InvalidHostname(String),

    #[error("invalid alias pattern: {0}")]
    InvalidPattern(#[from] PatternError),
}

impl MapError {
    /// Stable machine-readable code for API consumers
    pub fn code(&self) -> &'static str {
        match self {
            MapError::DuplicateId(..) => "DUPLICATE_ID",
            MapError::NotFound(..) => "NOT_FOUND",
            MapError::InvalidDefault { .. } => "INVALID_DEFAULT",
            MapError::UnknownDomain { .. } => "UNKNOWN_DOMAIN",
            MapError::DomainInUse { .. } => "DOMAIN_IN_USE",
            MapError::DuplicateHostname { .. } => "DUPLICATE_HOSTNAME",
            MapError::DuplicatePattern { .. } => "DUPLICATE_PATTERN",
            MapError::InvalidHostname(_) => "INVALID_HOSTNAME",
            MapError::InvalidPattern(_) => "INVALID_PATTERN",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = MapError::NotFound(RecordKind::Alias, "a1".to_string());
        assert_eq!(err.to_string(), "alias 'a1' not found");

        let err = MapError::DomainInUse {
            domain_id: "main".to_string(),
            aliases: vec!["a1".to_string(), "a2".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "domain 'main' is referenced by aliases: a1, a2"
        );
    }

    #[test]
    fn test_pattern_error_conversion() {
        let err: MapError = PatternError::EmptyPattern.into();
        assert_eq!(err.code(), "INVALID_PATTERN");
        assert_eq!(err.to_string(), "invalid alias pattern: Empty pattern");
    }
}
