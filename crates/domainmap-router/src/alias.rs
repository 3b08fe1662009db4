//! Alias table
//!
//! Aliases map a hostname pattern to a domain record, optionally asking the
//! client to be redirected to that domain's canonical hostname. Aliases are
//! kept in insertion order because resolution picks the first match.

use crate::error::{MapError, RecordKind};
use crate::pattern::{AliasPattern, PatternError};
use crate::registry::DomainRegistry;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// An alias pattern pointing at a domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AliasRecord {
    /// Unique identifier
    pub id: String,
    /// Id of the domain this alias resolves to
    pub domain_id: String,
    /// Hostname pattern (e.g., "*.example.com")
    #[cfg_attr(feature = "openapi", schema(value_type = String))]
    pub pattern: AliasPattern,
    /// Redirect to the domain's canonical hostname instead of serving directly
    #[serde(default)]
    pub redirect: bool,
}

impl AliasRecord {
    /// Create a non-redirecting alias, validating the pattern
    pub fn new(
        id: impl Into<String>,
        domain_id: impl Into<String>,
        pattern: &str,
    ) -> Result<Self, PatternError> {
        Ok(Self {
            id: id.into(),
            domain_id: domain_id.into(),
            pattern: AliasPattern::parse(pattern)?,
            redirect: false,
        })
    }

    /// Set the redirect flag
    pub fn with_redirect(mut self, redirect: bool) -> Self {
        self.redirect = redirect;
        self
    }

    /// Check if a normalized hostname matches this alias
    pub fn matches(&self, hostname: &str) -> bool {
        self.pattern.matches(hostname)
    }
}

/// Insertion-ordered table of aliases
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    aliases: Vec<AliasRecord>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an alias
    ///
    /// The owning domain must exist in `registry` at insertion time.
    pub fn add(&mut self, alias: AliasRecord, registry: &DomainRegistry) -> Result<(), MapError> {
        if self.position(&alias.id).is_some() {
            warn!(alias_id = %alias.id, "Rejected duplicate alias id");
            return Err(MapError::DuplicateId(RecordKind::Alias, alias.id));
        }

        self.check_references(&alias, registry)?;

        info!(
            alias_id = %alias.id,
            domain_id = %alias.domain_id,
            pattern = %alias.pattern,
            redirect = alias.redirect,
            "Added alias"
        );

        self.aliases.push(alias);
        Ok(())
    }

    /// Replace the alias with the same id, keeping its scan position
    pub fn update(&mut self, alias: AliasRecord, registry: &DomainRegistry) -> Result<(), MapError> {
        let index = self
            .position(&alias.id)
            .ok_or_else(|| MapError::NotFound(RecordKind::Alias, alias.id.clone()))?;

        self.check_references(&alias, registry)?;

        info!(
            alias_id = %alias.id,
            domain_id = %alias.domain_id,
            pattern = %alias.pattern,
            redirect = alias.redirect,
            "Updated alias"
        );

        self.aliases[index] = alias;
        Ok(())
    }

    /// Remove an alias
    pub fn remove(&mut self, id: &str) -> Result<AliasRecord, MapError> {
        let index = self
            .position(id)
            .ok_or_else(|| MapError::NotFound(RecordKind::Alias, id.to_string()))?;

        let alias = self.aliases.remove(index);
        info!(alias_id = %id, domain_id = %alias.domain_id, "Removed alias");
        Ok(alias)
    }

    /// All aliases in insertion order
    ///
    /// The iterator is `Clone`, so a scan can be restarted from the beginning.
    pub fn all_patterns(&self) -> std::slice::Iter<'_, AliasRecord> {
        self.aliases.iter()
    }

    /// Aliases pointing at `domain_id`, in insertion order
    pub fn for_domain<'a>(&'a self, domain_id: &'a str) -> impl Iterator<Item = &'a AliasRecord> {
        self.aliases
            .iter()
            .filter(move |alias| alias.domain_id == domain_id)
    }

    /// Get an alias by id
    pub fn get(&self, id: &str) -> Option<&AliasRecord> {
        self.aliases.iter().find(|alias| alias.id == id)
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.aliases.iter().position(|alias| alias.id == id)
    }

    fn check_references(&self, alias: &AliasRecord, registry: &DomainRegistry) -> Result<(), MapError> {
        if !registry.contains(&alias.domain_id) {
            warn!(
                alias_id = %alias.id,
                domain_id = %alias.domain_id,
                "Rejected alias for unknown domain"
            );
            return Err(MapError::UnknownDomain {
                alias_id: alias.id.clone(),
                domain_id: alias.domain_id.clone(),
            });
        }

        if let Some(existing) = self
            .aliases
            .iter()
            .find(|other| other.id != alias.id && other.pattern == alias.pattern)
        {
            warn!(
                alias_id = %alias.id,
                pattern = %alias.pattern,
                existing = %existing.id,
                "Rejected duplicate alias pattern"
            );
            return Err(MapError::DuplicatePattern {
                pattern: alias.pattern.to_string(),
                existing: existing.id.clone(),
            });
        }

        Ok(())
    }
}
