//! CLI command implementations
//!
//! Every mutating command loads the snapshot, applies the change through a
//! `DomainMap` (so all validation rules apply), and saves the whole snapshot.

use anyhow::{Context, Result};
use domainmap_api::models::{AliasSummary, UpdateDomainRequest};
use domainmap_api::report::{alias_table, domain_table, DomainReport};
use domainmap_router::{AliasRecord, DomainMap, DomainRecord, ResolutionResult};
use domainmap_store::SnapshotStore;
use tracing::info;

/// Apply a change to the stored map and save it
fn mutate<T>(store: &SnapshotStore, change: impl FnOnce(&DomainMap) -> Result<T>) -> Result<T> {
    let map = store.load_map()?;
    let value = change(&map)?;
    store.save_map(&map)?;
    Ok(value)
}

pub fn add_domain(store: &SnapshotStore, record: DomainRecord) -> Result<DomainRecord> {
    let id = record.id.clone();
    let record = mutate(store, |map| {
        map.add_domain(record)?;
        Ok(map.domain(&id)?)
    })
    .context(format!("Failed to add domain '{}'", id))?;

    info!("Added domain {} ({})", record.id, record.hostname);
    Ok(record)
}

pub fn edit_domain(
    store: &SnapshotStore,
    id: &str,
    edit: UpdateDomainRequest,
) -> Result<DomainRecord> {
    mutate(store, |map| {
        let current = map.domain(id)?;
        map.update_domain(edit.apply(current))?;
        Ok(map.domain(id)?)
    })
    .context(format!("Failed to edit domain '{}'", id))
}

pub fn remove_domain(store: &SnapshotStore, id: &str) -> Result<DomainRecord> {
    mutate(store, |map| Ok(map.remove_domain(id)?))
        .context(format!("Failed to remove domain '{}'", id))
}

pub fn set_default(store: &SnapshotStore, id: &str) -> Result<()> {
    mutate(store, |map| Ok(map.set_default(id)?))
        .context(format!("Failed to set default domain '{}'", id))
}

pub fn add_alias(
    store: &SnapshotStore,
    id: &str,
    domain_id: &str,
    pattern: &str,
    redirect: bool,
) -> Result<AliasRecord> {
    mutate(store, |map| {
        let alias = AliasRecord::new(id, domain_id, pattern)?.with_redirect(redirect);
        map.add_alias(alias)?;
        Ok(map.alias(id)?)
    })
    .context(format!("Failed to add alias '{}'", id))
}

pub fn remove_alias(store: &SnapshotStore, id: &str) -> Result<AliasRecord> {
    mutate(store, |map| Ok(map.remove_alias(id)?))
        .context(format!("Failed to remove alias '{}'", id))
}

/// Domains as a text table
pub fn list_domains(store: &SnapshotStore) -> Result<String> {
    let map = store.load_map()?;
    Ok(domain_table(&map.domains()))
}

/// Aliases as a text table, optionally for one domain
pub fn list_aliases(store: &SnapshotStore, domain_id: Option<&str>) -> Result<String> {
    let map = store.load_map()?;
    let aliases = match domain_id {
        Some(domain_id) => map.aliases_for(domain_id),
        None => map.aliases(),
    };

    let summaries: Vec<AliasSummary> = aliases
        .iter()
        .map(|alias| {
            let target = map.domain(&alias.domain_id).ok();
            AliasSummary::new(alias, target.as_ref())
        })
        .collect();
    Ok(alias_table(&summaries))
}

pub fn resolve(store: &SnapshotStore, host: &str) -> Result<ResolutionResult> {
    Ok(store.load_map()?.resolve(host))
}

pub fn report(store: &SnapshotStore, host: &str) -> Result<DomainReport> {
    let result = resolve(store, host)?;
    Ok(DomainReport::build(host, &result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use domainmap_router::{MapError, MatchKind};
    use tempfile::TempDir;

    fn store() -> (TempDir, SnapshotStore) {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path().join("state.json"));
        (dir, store)
    }

    #[test]
    fn test_domain_lifecycle() {
        let (_dir, store) = store();
        assert_eq!(list_domains(&store).unwrap(), "There is no Domain record yet.\n");

        add_domain(&store, DomainRecord::new("main", "example.com").as_default()).unwrap();
        assert!(list_domains(&store).unwrap().contains("example.com"));

        let edited = edit_domain(
            &store,
            "main",
            UpdateDomainRequest {
                name: Some("Foo".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(edited.name, "Foo");
        assert!(edited.is_default);

        remove_domain(&store, "main").unwrap();
        assert_eq!(list_domains(&store).unwrap(), "There is no Domain record yet.\n");
    }

    #[test]
    fn test_failed_change_is_not_saved() {
        let (_dir, store) = store();
        add_domain(&store, DomainRecord::new("main", "example.com")).unwrap();
        add_alias(&store, "a1", "main", "*.example.com", false).unwrap();

        let err = remove_domain(&store, "main").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MapError>(),
            Some(MapError::DomainInUse { .. })
        ));
        assert_eq!(store.load().unwrap().domains.len(), 1);
    }

    #[test]
    fn test_alias_listing() {
        let (_dir, store) = store();
        add_domain(&store, DomainRecord::new("main", "example.com")).unwrap();
        assert_eq!(
            list_aliases(&store, Some("main")).unwrap(),
            "No aliases have been created for this domain.\n"
        );

        add_alias(&store, "a1", "main", "*.example.com", true).unwrap();
        let table = list_aliases(&store, None).unwrap();
        assert!(table.contains("*.example.com"));
        assert!(table.contains("Redirect"));
    }

    #[test]
    fn test_invalid_pattern() {
        let (_dir, store) = store();
        add_domain(&store, DomainRecord::new("main", "example.com")).unwrap();
        assert!(add_alias(&store, "a1", "main", "", false).is_err());
        assert!(store.load().unwrap().aliases.is_empty());
    }

    #[test]
    fn test_resolve_and_report() {
        let (_dir, store) = store();
        add_domain(&store, DomainRecord::new("main", "example.com")).unwrap();
        add_domain(&store, DomainRecord::new("store", "store.example.net")).unwrap();
        add_alias(&store, "shop", "store", "*.example.com", true).unwrap();
        set_default(&store, "main").unwrap();

        let result = resolve(&store, "shop.example.com").unwrap();
        assert_eq!(result.match_kind, MatchKind::Alias);
        assert_eq!(result.redirect_target.as_deref(), Some("store.example.net"));

        let report = report(&store, "unknown.test").unwrap();
        assert_eq!(report.value("Domain match"), Some("FALSE: Using default domain."));
    }
}
