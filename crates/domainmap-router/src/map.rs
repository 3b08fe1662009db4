//! Shared domain map
//!
//! The registry and the alias table live behind a single read-mostly lock so
//! that no reader ever observes an alias pointing at a missing domain.
//! Resolution only takes the read lock; administrative edits take the write
//! lock for the whole check-and-apply step.

use crate::alias::{AliasRecord, AliasTable};
use crate::error::{MapError, RecordKind};
use crate::registry::{DomainRecord, DomainRegistry};
use crate::resolver::{ResolutionResult, Resolver};
use serde::{Deserialize, Serialize};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{info, warn};

/// Whole-state snapshot used for persistence
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Snapshot {
    /// Domain records
    #[serde(default)]
    pub domains: Vec<DomainRecord>,
    /// Alias records in resolution order
    #[serde(default)]
    pub aliases: Vec<AliasRecord>,
}

#[derive(Debug, Default)]
struct MapState {
    registry: DomainRegistry,
    aliases: AliasTable,
}

impl MapState {
    /// Rebuild both tables, replaying every insertion so all invariants are checked
    fn from_snapshot(snapshot: Snapshot) -> Result<Self, MapError> {
        let mut state = MapState::default();

        // Add the enabled default first so a second one is reported as the offender
        let (defaults, others): (Vec<_>, Vec<_>) = snapshot
            .domains
            .into_iter()
            .partition(|d| d.is_default && d.enabled);
        for domain in defaults.into_iter().chain(others) {
            state.registry.add(domain)?;
        }

        for alias in snapshot.aliases {
            state.aliases.add(alias, &state.registry)?;
        }

        Ok(state)
    }
}

/// Thread-safe registry + alias table
#[derive(Debug, Default)]
pub struct DomainMap {
    state: RwLock<MapState>,
}

impl DomainMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a map from a snapshot, validating every record
    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self, MapError> {
        let state = MapState::from_snapshot(snapshot)?;
        info!(
            domains = state.registry.len(),
            aliases = state.aliases.len(),
            "Loaded domain map"
        );
        Ok(Self {
            state: RwLock::new(state),
        })
    }

    /// Atomically replace the whole state
    ///
    /// On error the current state is left untouched.
    pub fn replace(&self, snapshot: Snapshot) -> Result<(), MapError> {
        let state = MapState::from_snapshot(snapshot)?;
        info!(
            domains = state.registry.len(),
            aliases = state.aliases.len(),
            "Replaced domain map"
        );
        *self.write() = state;
        Ok(())
    }

    /// Copy the current state
    pub fn snapshot(&self) -> Snapshot {
        let state = self.read();
        Snapshot {
            domains: state.registry.list().cloned().collect(),
            aliases: state.aliases.all_patterns().cloned().collect(),
        }
    }

    /// Resolve a request hostname
    pub fn resolve(&self, hostname: &str) -> ResolutionResult {
        let state = self.read();
        Resolver::new(&state.registry, &state.aliases).resolve(hostname)
    }

    pub fn add_domain(&self, record: DomainRecord) -> Result<(), MapError> {
        self.write().registry.add(record)
    }

    pub fn update_domain(&self, record: DomainRecord) -> Result<(), MapError> {
        self.write().registry.update(record)
    }

    /// Remove a domain
    ///
    /// Fails with `DomainInUse` while any alias still points at it; aliases
    /// must be removed first.
    pub fn remove_domain(&self, id: &str) -> Result<DomainRecord, MapError> {
        let mut state = self.write();

        let referencing: Vec<String> = state
            .aliases
            .for_domain(id)
            .map(|alias| alias.id.clone())
            .collect();
        if !referencing.is_empty() {
            warn!(domain_id = %id, aliases = ?referencing, "Refused to remove referenced domain");
            return Err(MapError::DomainInUse {
                domain_id: id.to_string(),
                aliases: referencing,
            });
        }

        state.registry.remove(id)
    }

    pub fn set_default(&self, id: &str) -> Result<(), MapError> {
        self.write().registry.set_default(id)
    }

    pub fn add_alias(&self, alias: AliasRecord) -> Result<(), MapError> {
        let mut state = self.write();
        let MapState { registry, aliases } = &mut *state;
        aliases.add(alias, registry)
    }

    pub fn update_alias(&self, alias: AliasRecord) -> Result<(), MapError> {
        let mut state = self.write();
        let MapState { registry, aliases } = &mut *state;
        aliases.update(alias, registry)
    }

    pub fn remove_alias(&self, id: &str) -> Result<AliasRecord, MapError> {
        self.write().aliases.remove(id)
    }

    /// Get a domain by id
    pub fn domain(&self, id: &str) -> Result<DomainRecord, MapError> {
        self.read()
            .registry
            .get(id)
            .cloned()
            .ok_or_else(|| MapError::NotFound(RecordKind::Domain, id.to_string()))
    }

    /// All domains ordered by id
    pub fn domains(&self) -> Vec<DomainRecord> {
        self.read().registry.list().cloned().collect()
    }

    /// The default domain, if any
    pub fn default_domain(&self) -> Option<DomainRecord> {
        self.read().registry.get_default().cloned()
    }

    /// Get an alias by id
    pub fn alias(&self, id: &str) -> Result<AliasRecord, MapError> {
        self.read()
            .aliases
            .get(id)
            .cloned()
            .ok_or_else(|| MapError::NotFound(RecordKind::Alias, id.to_string()))
    }

    /// All aliases in resolution order
    pub fn aliases(&self) -> Vec<AliasRecord> {
        self.read().aliases.all_patterns().cloned().collect()
    }

    /// Aliases for one domain in resolution order
    pub fn aliases_for(&self, domain_id: &str) -> Vec<AliasRecord> {
        self.read().aliases.for_domain(domain_id).cloned().collect()
    }

    // A panic while holding the lock can only happen between complete
    // mutations, so the state is still consistent and the guard is recovered.
    fn read(&self) -> RwLockReadGuard<'_, MapState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, MapState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::MatchKind;
    use std::sync::Arc;
    use std::thread;

    fn populated() -> DomainMap {
        let map = DomainMap::new();
        map.add_domain(DomainRecord::new("main", "example.com").as_default())
            .unwrap();
        map.add_domain(DomainRecord::new("shop", "shop.example.org"))
            .unwrap();
        map.add_alias(
            AliasRecord::new("a1", "shop", "*.example.com")
                .unwrap()
                .with_redirect(true),
        )
        .unwrap();
        map
    }

    #[test]
    fn test_remove_referenced_domain_fails() {
        let map = populated();

        let result = map.remove_domain("shop");
        assert_eq!(
            result,
            Err(MapError::DomainInUse {
                domain_id: "shop".to_string(),
                aliases: vec!["a1".to_string()],
            })
        );
        assert!(map.domain("shop").is_ok());

        map.remove_alias("a1").unwrap();
        map.remove_domain("shop").unwrap();
        assert!(matches!(
            map.remove_domain("shop"),
            Err(MapError::NotFound(RecordKind::Domain, _))
        ));
    }

    #[test]
    fn test_add_alias_unknown_domain() {
        let map = populated();
        let result = map.add_alias(AliasRecord::new("a2", "ghost", "*.ghost.test").unwrap());
        assert!(matches!(result, Err(MapError::UnknownDomain { .. })));
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let map = populated();
        let snapshot = map.snapshot();
        assert_eq!(snapshot.domains.len(), 2);
        assert_eq!(snapshot.aliases.len(), 1);

        let copy = DomainMap::from_snapshot(snapshot.clone()).unwrap();
        assert_eq!(copy.snapshot(), snapshot);
        assert_eq!(
            copy.resolve("shop.example.com").redirect_target.as_deref(),
            Some("shop.example.org")
        );
    }

    #[test]
    fn test_from_snapshot_validates() {
        let snapshot = Snapshot {
            domains: vec![DomainRecord::new("main", "example.com")],
            aliases: vec![AliasRecord::new("a1", "ghost", "*.example.com").unwrap()],
        };
        assert!(matches!(
            DomainMap::from_snapshot(snapshot),
            Err(MapError::UnknownDomain { .. })
        ));

        let snapshot = Snapshot {
            domains: vec![
                DomainRecord::new("b", "b.example.com").as_default(),
                DomainRecord::new("a", "a.example.com").as_default(),
            ],
            aliases: vec![],
        };
        assert!(matches!(
            DomainMap::from_snapshot(snapshot),
            Err(MapError::InvalidDefault { .. })
        ));
    }

    #[test]
    fn test_replace_is_all_or_nothing() {
        let map = populated();
        let before = map.snapshot();

        let broken = Snapshot {
            domains: vec![DomainRecord::new("x", "x.test")],
            aliases: vec![AliasRecord::new("a1", "missing", "*.x.test").unwrap()],
        };
        assert!(map.replace(broken).is_err());
        assert_eq!(map.snapshot(), before);

        map.replace(Snapshot::default()).unwrap();
        assert!(map.domains().is_empty());
        assert_eq!(map.resolve("example.com").match_kind, MatchKind::None);
    }

    #[test]
    fn test_concurrent_resolve_and_edit() {
        let map = Arc::new(populated());

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let map = Arc::clone(&map);
                thread::spawn(move || {
                    for _ in 0..500 {
                        let result = map.resolve("api.example.com");
                        // Either the alias or the default, never a dangling reference
                        assert!(result.is_match());
                    }
                })
            })
            .collect();

        for i in 0..100 {
            let id = format!("tmp-{i}");
            map.add_domain(DomainRecord::new(id.clone(), format!("{id}.test")))
                .unwrap();
            map.remove_domain(&id).unwrap();
        }

        for reader in readers {
            reader.join().unwrap();
        }
    }
}
