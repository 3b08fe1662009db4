//! Domain registry
//!
//! Holds the configured domain records keyed by id, with a hostname index for
//! exact lookups. Hostnames are stored normalized (trimmed, lowercase), so
//! lookups are case-insensitive. At most one enabled record carries the
//! default flag; disabled records may keep a stale flag.

use crate::error::{MapError, RecordKind};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

/// A configured domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DomainRecord {
    /// Unique identifier
    pub id: String,
    /// Canonical hostname (e.g., "example.com" or "example.com:8080")
    pub hostname: String,
    /// Human-readable label; defaults to the hostname
    #[serde(default)]
    pub name: String,
    /// Served when no exact or alias match applies
    #[serde(default)]
    pub is_default: bool,
    /// Disabled domains are never returned by resolution
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl DomainRecord {
    /// Create an enabled, non-default record named after its hostname
    pub fn new(id: impl Into<String>, hostname: impl Into<String>) -> Self {
        let hostname = hostname.into();
        Self {
            id: id.into(),
            name: hostname.clone(),
            hostname,
            is_default: false,
            enabled: true,
        }
    }

    /// Set the display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Mark as the default domain
    pub fn as_default(mut self) -> Self {
        self.is_default = true;
        self
    }

    /// Set the enabled flag
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// Trim and lowercase a hostname
pub fn normalize_hostname(hostname: &str) -> String {
    hostname.trim().to_ascii_lowercase()
}

/// Check a normalized hostname is usable as a canonical domain hostname
fn validate_hostname(hostname: &str) -> Result<(), MapError> {
    let valid = !hostname.is_empty()
        && !hostname.contains("://")
        && !hostname.contains('*')
        && !hostname.contains('/')
        && !hostname.chars().any(char::is_whitespace)
        && hostname.split('.').all(|label| !label.is_empty());

    if valid {
        Ok(())
    } else {
        Err(MapError::InvalidHostname(hostname.to_string()))
    }
}

/// Registry of configured domain records
#[derive(Debug, Clone, Default)]
pub struct DomainRegistry {
    /// Records by id
    domains: BTreeMap<String, DomainRecord>,
    /// Normalized hostname -> id
    hostnames: HashMap<String, String>,
}

impl DomainRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a domain record
    ///
    /// The hostname is normalized before it is stored. An empty name is
    /// replaced by the hostname.
    pub fn add(&mut self, mut record: DomainRecord) -> Result<(), MapError> {
        record.hostname = normalize_hostname(&record.hostname);
        validate_hostname(&record.hostname)?;

        if self.domains.contains_key(&record.id) {
            warn!(domain_id = %record.id, "Rejected duplicate domain id");
            return Err(MapError::DuplicateId(RecordKind::Domain, record.id));
        }

        self.check_hostname_free(&record)?;
        self.check_default_free(&record)?;

        if record.name.trim().is_empty() {
            record.name = record.hostname.clone();
        }

        info!(
            domain_id = %record.id,
            hostname = %record.hostname,
            is_default = record.is_default,
            enabled = record.enabled,
            "Added domain"
        );

        self.hostnames
            .insert(record.hostname.clone(), record.id.clone());
        self.domains.insert(record.id.clone(), record);
        Ok(())
    }

    /// Replace the record with the same id
    pub fn update(&mut self, mut record: DomainRecord) -> Result<(), MapError> {
        record.hostname = normalize_hostname(&record.hostname);
        validate_hostname(&record.hostname)?;

        let previous_hostname = match self.domains.get(&record.id) {
            Some(existing) => existing.hostname.clone(),
            None => return Err(MapError::NotFound(RecordKind::Domain, record.id)),
        };

        self.check_hostname_free(&record)?;
        self.check_default_free(&record)?;

        if record.name.trim().is_empty() {
            record.name = record.hostname.clone();
        }

        info!(
            domain_id = %record.id,
            hostname = %record.hostname,
            is_default = record.is_default,
            enabled = record.enabled,
            "Updated domain"
        );

        self.hostnames.remove(&previous_hostname);
        self.hostnames
            .insert(record.hostname.clone(), record.id.clone());
        self.domains.insert(record.id.clone(), record);
        Ok(())
    }

    /// Remove a domain record
    ///
    /// Removing the default domain leaves the registry without a default.
    pub fn remove(&mut self, id: &str) -> Result<DomainRecord, MapError> {
        let record = self
            .domains
            .remove(id)
            .ok_or_else(|| MapError::NotFound(RecordKind::Domain, id.to_string()))?;

        self.hostnames.remove(&record.hostname);

        if record.is_default {
            warn!(domain_id = %id, "Removed the default domain; no default remains");
        } else {
            info!(domain_id = %id, "Removed domain");
        }

        Ok(record)
    }

    /// Make `id` the only default domain
    pub fn set_default(&mut self, id: &str) -> Result<(), MapError> {
        if !self.domains.contains_key(id) {
            return Err(MapError::NotFound(RecordKind::Domain, id.to_string()));
        }

        for record in self.domains.values_mut() {
            record.is_default = record.id == id;
        }

        info!(domain_id = %id, "Set default domain");
        Ok(())
    }

    /// Case-insensitive exact hostname lookup
    pub fn find_by_hostname(&self, hostname: &str) -> Option<&DomainRecord> {
        let normalized = normalize_hostname(hostname);
        let id = self.hostnames.get(&normalized)?;
        debug!(hostname = %normalized, domain_id = %id, "Hostname index hit");
        self.domains.get(id)
    }

    /// The enabled default domain, if any
    pub fn get_default(&self) -> Option<&DomainRecord> {
        self.domains
            .values()
            .find(|record| record.is_default && record.enabled)
    }

    /// Get a record by id
    pub fn get(&self, id: &str) -> Option<&DomainRecord> {
        self.domains.get(id)
    }

    /// Check whether a record exists
    pub fn contains(&self, id: &str) -> bool {
        self.domains.contains_key(id)
    }

    /// All records ordered by id
    pub fn list(&self) -> impl Iterator<Item = &DomainRecord> + '_ {
        self.domains.values()
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    fn check_hostname_free(&self, record: &DomainRecord) -> Result<(), MapError> {
        match self.hostnames.get(&record.hostname) {
            Some(existing) if *existing != record.id => {
                warn!(
                    domain_id = %record.id,
                    hostname = %record.hostname,
                    existing = %existing,
                    "Rejected duplicate hostname"
                );
                Err(MapError::DuplicateHostname {
                    hostname: record.hostname.clone(),
                    existing: existing.clone(),
                })
            }
            _ => Ok(()),
        }
    }

    fn check_default_free(&self, record: &DomainRecord) -> Result<(), MapError> {
        if !(record.is_default && record.enabled) {
            return Ok(());
        }

        match self.get_default() {
            Some(existing) if existing.id != record.id => {
                warn!(
                    domain_id = %record.id,
                    existing = %existing.id,
                    "Rejected second default domain"
                );
                Err(MapError::InvalidDefault {
                    id: record.id.clone(),
                    existing: existing.id.clone(),
                })
            }
            _ => Ok(()),
        }
    }
}
