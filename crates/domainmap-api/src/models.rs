use domainmap_router::{AliasRecord, DomainRecord};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request to create a domain
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateDomainRequest {
    /// Unique identifier (e.g., "example_com")
    pub id: String,
    /// Canonical hostname
    pub hostname: String,
    /// Display name (defaults to the hostname)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Make this the default domain
    #[serde(default)]
    pub is_default: bool,
    /// Defaults to enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

impl CreateDomainRequest {
    pub fn into_record(self) -> DomainRecord {
        let mut record = DomainRecord::new(self.id, self.hostname)
            .with_enabled(self.enabled.unwrap_or(true));
        if let Some(name) = self.name {
            record = record.with_name(name);
        }
        if self.is_default {
            record = record.as_default();
        }
        record
    }
}

/// Request to edit a domain; absent fields keep their value
///
/// The default flag is changed through the set-default endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateDomainRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

impl UpdateDomainRequest {
    pub fn apply(self, mut record: DomainRecord) -> DomainRecord {
        if let Some(hostname) = self.hostname {
            // A name that was just the old hostname follows the new one
            if record.name.trim().eq_ignore_ascii_case(&record.hostname) {
                record.name.clear();
            }
            record.hostname = hostname;
        }
        if let Some(name) = self.name {
            record.name = name;
        }
        if let Some(enabled) = self.enabled {
            record.enabled = enabled;
        }
        record
    }
}

/// List of domains
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DomainList {
    /// Domains ordered by id
    pub domains: Vec<DomainRecord>,
    /// Total count
    pub total: usize,
}

/// Request to create an alias
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateAliasRequest {
    /// Unique identifier
    pub id: String,
    /// Target domain id
    pub domain_id: String,
    /// Hostname pattern (e.g., "*.example.com")
    pub pattern: String,
    /// Redirect to the domain's canonical hostname
    #[serde(default)]
    pub redirect: bool,
}

/// Request to edit an alias; absent fields keep their value
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateAliasRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<bool>,
}

/// Alias as shown in the alias overview
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AliasSummary {
    pub id: String,
    pub domain_id: String,
    pub pattern: String,
    pub redirect: bool,
    /// "None", or the hostname clients are redirected to
    pub redirect_label: String,
}

impl AliasSummary {
    pub fn new(alias: &AliasRecord, target: Option<&DomainRecord>) -> Self {
        let redirect_label = match target {
            Some(domain) if alias.redirect => domain.hostname.clone(),
            _ => "None".to_string(),
        };
        Self {
            id: alias.id.clone(),
            domain_id: alias.domain_id.clone(),
            pattern: alias.pattern.to_string(),
            redirect: alias.redirect,
            redirect_label,
        }
    }
}

/// List of aliases
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AliasList {
    /// Aliases in resolution order
    pub aliases: Vec<AliasSummary>,
    /// Total count
    pub total: usize,
}

/// Alias list filter
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct AliasQuery {
    /// Only aliases for this domain
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_id: Option<String>,
}

/// Hostname to resolve
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ResolveQuery {
    pub host: String,
}

/// Optional hostname for the diagnostic report
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ReportQuery {
    /// Defaults to the request's own Host header
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Configured domains count
    pub domains: usize,
    /// Configured aliases count
    pub aliases: usize,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}
