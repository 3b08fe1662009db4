//! Hostname resolution
//!
//! Priority order:
//! 1. Exact hostname match against an enabled domain
//! 2. First alias (insertion order) whose pattern matches and whose domain is enabled
//! 3. The default domain, if enabled
//! 4. No match
//!
//! Resolution never fails; "no match" is a regular result.

use crate::alias::AliasTable;
use crate::registry::{normalize_hostname, DomainRecord, DomainRegistry};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// How a request hostname was matched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    /// The hostname is a domain's canonical hostname
    Exact,
    /// The hostname matched an alias pattern
    Alias,
    /// Nothing matched; the default domain applies
    Default,
    /// Nothing matched and there is no usable default
    None,
}

/// Outcome of resolving a hostname
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ResolutionResult {
    /// Normalized hostname that was resolved
    pub hostname: String,
    /// Domain governing the request
    pub matched_domain: Option<DomainRecord>,
    pub match_kind: MatchKind,
    /// Alias that matched, for alias matches
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias_id: Option<String>,
    /// Canonical hostname the client should be redirected to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_target: Option<String>,
}

impl ResolutionResult {
    fn unmatched(hostname: String) -> Self {
        Self {
            hostname,
            matched_domain: None,
            match_kind: MatchKind::None,
            alias_id: None,
            redirect_target: None,
        }
    }

    /// Whether a domain governs the request
    pub fn is_match(&self) -> bool {
        self.matched_domain.is_some()
    }
}

/// Resolves hostnames against a registry and alias table
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    registry: &'a DomainRegistry,
    aliases: &'a AliasTable,
}

impl<'a> Resolver<'a> {
    pub fn new(registry: &'a DomainRegistry, aliases: &'a AliasTable) -> Self {
        Self { registry, aliases }
    }

    /// Resolve a request hostname
    pub fn resolve(&self, hostname: &str) -> ResolutionResult {
        let hostname = normalize_hostname(hostname);

        if hostname.is_empty() {
            trace!("Empty hostname, trying default domain");
            return self.resolve_default(hostname);
        }

        if let Some(domain) = self.registry.find_by_hostname(&hostname) {
            if domain.enabled {
                trace!(hostname = %hostname, domain_id = %domain.id, "Exact domain match");
                return ResolutionResult {
                    matched_domain: Some(domain.clone()),
                    match_kind: MatchKind::Exact,
                    ..ResolutionResult::unmatched(hostname)
                };
            }
            trace!(hostname = %hostname, domain_id = %domain.id, "Exact match is disabled");
        }

        for alias in self.aliases.all_patterns() {
            if !alias.matches(&hostname) {
                continue;
            }

            let Some(domain) = self.registry.get(&alias.domain_id) else {
                continue;
            };
            if !domain.enabled {
                trace!(
                    hostname = %hostname,
                    alias_id = %alias.id,
                    domain_id = %domain.id,
                    "Alias target is disabled"
                );
                continue;
            }

            trace!(
                hostname = %hostname,
                alias_id = %alias.id,
                domain_id = %domain.id,
                redirect = alias.redirect,
                "Alias match"
            );
            return ResolutionResult {
                matched_domain: Some(domain.clone()),
                match_kind: MatchKind::Alias,
                alias_id: Some(alias.id.clone()),
                redirect_target: alias.redirect.then(|| domain.hostname.clone()),
                hostname,
            };
        }

        self.resolve_default(hostname)
    }

    fn resolve_default(&self, hostname: String) -> ResolutionResult {
        match self.registry.get_default() {
            Some(domain) => {
                trace!(hostname = %hostname, domain_id = %domain.id, "Using default domain");
                ResolutionResult {
                    matched_domain: Some(domain.clone()),
                    match_kind: MatchKind::Default,
                    ..ResolutionResult::unmatched(hostname)
                }
            }
            _ => {
                trace!(hostname = %hostname, "No domain matched");
                ResolutionResult::unmatched(hostname)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alias::AliasRecord;

    fn fixture() -> (DomainRegistry, AliasTable) {
        let mut registry = DomainRegistry::new();
        registry
            .add(DomainRecord::new("main", "example.com").as_default())
            .unwrap();
        registry.add(DomainRecord::new("shop", "shop.example.org")).unwrap();

        let mut aliases = AliasTable::new();
        aliases
            .add(
                AliasRecord::new("shop-alias", "shop", "*.example.com")
                    .unwrap()
                    .with_redirect(true),
                &registry,
            )
            .unwrap();
        aliases
            .add(
                AliasRecord::new("main-alias", "main", "www.*.example.net").unwrap(),
                &registry,
            )
            .unwrap();

        (registry, aliases)
    }

    #[test]
    fn test_exact_match() {
        let (registry, aliases) = fixture();
        let result = Resolver::new(&registry, &aliases).resolve("Example.com ");

        assert_eq!(result.match_kind, MatchKind::Exact);
        assert_eq!(result.hostname, "example.com");
        assert_eq!(result.matched_domain.unwrap().id, "main");
        assert!(result.redirect_target.is_none());
        assert!(result.alias_id.is_none());
    }

    #[test]
    fn test_alias_redirect() {
        let (registry, aliases) = fixture();
        let result = Resolver::new(&registry, &aliases).resolve("shop.example.com");

        assert_eq!(result.match_kind, MatchKind::Alias);
        assert_eq!(result.alias_id.as_deref(), Some("shop-alias"));
        assert_eq!(result.redirect_target.as_deref(), Some("shop.example.org"));
        assert_eq!(result.matched_domain.unwrap().id, "shop");
    }

    #[test]
    fn test_alias_without_redirect() {
        let (registry, aliases) = fixture();
        let result = Resolver::new(&registry, &aliases).resolve("www.eu.example.net");

        assert_eq!(result.match_kind, MatchKind::Alias);
        assert_eq!(result.matched_domain.unwrap().id, "main");
        assert!(result.redirect_target.is_none());
    }

    #[test]
    fn test_default_fallback() {
        let (registry, aliases) = fixture();
        let result = Resolver::new(&registry, &aliases).resolve("unknown.test");

        assert_eq!(result.match_kind, MatchKind::Default);
        assert_eq!(result.matched_domain.unwrap().id, "main");
    }

    #[test]
    fn test_empty_hostname_uses_default() {
        let (registry, aliases) = fixture();
        let result = Resolver::new(&registry, &aliases).resolve("   ");

        assert_eq!(result.match_kind, MatchKind::Default);
    }

    #[test]
    fn test_no_match_without_default() {
        let registry = DomainRegistry::new();
        let aliases = AliasTable::new();
        let result = Resolver::new(&registry, &aliases).resolve("unknown.test");

        assert_eq!(result.match_kind, MatchKind::None);
        assert!(!result.is_match());
    }

    #[test]
    fn test_disabled_exact_falls_through_to_alias() {
        let mut registry = DomainRegistry::new();
        registry
            .add(DomainRecord::new("old", "old.example.com").with_enabled(false))
            .unwrap();
        registry.add(DomainRecord::new("main", "example.com")).unwrap();

        let mut aliases = AliasTable::new();
        aliases
            .add(AliasRecord::new("a1", "main", "*.example.com").unwrap(), &registry)
            .unwrap();

        let result = Resolver::new(&registry, &aliases).resolve("old.example.com");
        assert_eq!(result.match_kind, MatchKind::Alias);
        assert_eq!(result.matched_domain.unwrap().id, "main");
    }

    #[test]
    fn test_disabled_alias_target_skipped() {
        let mut registry = DomainRegistry::new();
        registry
            .add(DomainRecord::new("off", "off.example.org").with_enabled(false))
            .unwrap();
        registry.add(DomainRecord::new("on", "on.example.org")).unwrap();

        let mut aliases = AliasTable::new();
        aliases
            .add(AliasRecord::new("first", "off", "*.example.com").unwrap(), &registry)
            .unwrap();
        aliases
            .add(AliasRecord::new("second", "on", "shop.*.com").unwrap(), &registry)
            .unwrap();

        let result = Resolver::new(&registry, &aliases).resolve("shop.example.com");
        assert_eq!(result.alias_id.as_deref(), Some("second"));
    }

    #[test]
    fn test_disabled_default_yields_none() {
        let mut registry = DomainRegistry::new();
        registry
            .add(
                DomainRecord::new("main", "example.com")
                    .as_default()
                    .with_enabled(false),
            )
            .unwrap();
        let aliases = AliasTable::new();

        let result = Resolver::new(&registry, &aliases).resolve("unknown.test");
        assert_eq!(result.match_kind, MatchKind::None);
    }

    #[test]
    fn test_first_alias_wins() {
        let mut registry = DomainRegistry::new();
        registry.add(DomainRecord::new("a", "a.test")).unwrap();
        registry.add(DomainRecord::new("b", "b.test")).unwrap();

        let mut aliases = AliasTable::new();
        aliases
            .add(AliasRecord::new("broad", "a", "*.*.com").unwrap(), &registry)
            .unwrap();
        aliases
            .add(AliasRecord::new("narrow", "b", "shop.example.com").unwrap(), &registry)
            .unwrap();

        let result = Resolver::new(&registry, &aliases).resolve("shop.example.com");
        assert_eq!(result.alias_id.as_deref(), Some("broad"));
        assert_eq!(result.matched_domain.unwrap().id, "a");
    }

    #[test]
    fn test_result_serialization() {
        let (registry, aliases) = fixture();
        let result = Resolver::new(&registry, &aliases).resolve("unknown.test");
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["match_kind"], "default");
        assert_eq!(json["matched_domain"]["id"], "main");
        assert!(json.get("redirect_target").is_none());
    }
}
