//! Diagnostic report and plain-text listings
//!
//! The report explains which domain governs a request and why. Listings
//! render domains and aliases as aligned text tables for the CLI.

use crate::models::AliasSummary;
use domainmap_router::{DomainRecord, MatchKind, ResolutionResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use utoipa::ToSchema;

pub const EMPTY_DOMAINS: &str = "There is no Domain record yet.";
pub const EMPTY_ALIASES: &str = "No aliases have been created for this domain.";

/// One property/value line of the report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ReportRow {
    pub property: String,
    pub value: String,
}

/// Domain match diagnostics for one request host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DomainReport {
    pub rows: Vec<ReportRow>,
}

impl DomainReport {
    /// Build the report for `raw_host` as received and its resolution
    pub fn build(raw_host: &str, result: &ResolutionResult) -> Self {
        let mut rows = vec![
            row("HTTP_HOST request", raw_host),
            row("Domain match", &match_label(result)),
        ];

        if let Some(target) = &result.redirect_target {
            rows.push(row("Redirect target", target));
        }

        if let Some(domain) = &result.matched_domain {
            rows.extend(
                domain_properties(domain)
                    .into_iter()
                    .map(|(key, value)| row(key, &value)),
            );
        }

        Self { rows }
    }

    /// Look up a value by property name
    pub fn value(&self, property: &str) -> Option<&str> {
        self.rows
            .iter()
            .find(|r| r.property == property)
            .map(|r| r.value.as_str())
    }
}

impl fmt::Display for DomainReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|r| vec![r.property.clone(), r.value.clone()])
            .collect();
        write!(f, "{}", render_table(&["Property", "Value"], &rows))
    }
}

fn row(property: &str, value: &str) -> ReportRow {
    ReportRow {
        property: property.to_string(),
        value: value.to_string(),
    }
}

fn flag(value: bool) -> &'static str {
    if value {
        "TRUE"
    } else {
        "FALSE"
    }
}

fn match_label(result: &ResolutionResult) -> String {
    match result.match_kind {
        MatchKind::Exact => "TRUE".to_string(),
        MatchKind::Alias => format!(
            "ALIAS: Using alias {}",
            result.alias_id.as_deref().unwrap_or("unknown")
        ),
        MatchKind::Default => "FALSE: Using default domain.".to_string(),
        MatchKind::None => "FALSE: No domain matched.".to_string(),
    }
}

/// Domain fields keyed and sorted by property name
fn domain_properties(domain: &DomainRecord) -> BTreeMap<&'static str, String> {
    BTreeMap::from([
        ("hostname", domain.hostname.clone()),
        ("id", domain.id.clone()),
        ("is_default", flag(domain.is_default).to_string()),
        ("name", domain.name.clone()),
        ("status", flag(domain.enabled).to_string()),
    ])
}

/// Render domains as a text table
pub fn domain_table(domains: &[DomainRecord]) -> String {
    if domains.is_empty() {
        return format!("{}\n", EMPTY_DOMAINS);
    }

    let rows: Vec<Vec<String>> = domains
        .iter()
        .map(|d| {
            vec![
                d.id.clone(),
                d.hostname.clone(),
                d.name.clone(),
                flag(d.is_default).to_string(),
                if d.enabled { "Enabled" } else { "Disabled" }.to_string(),
            ]
        })
        .collect();
    render_table(&["ID", "Hostname", "Name", "Default", "Status"], &rows)
}

/// Render aliases as a text table
pub fn alias_table(aliases: &[AliasSummary]) -> String {
    if aliases.is_empty() {
        return format!("{}\n", EMPTY_ALIASES);
    }

    let rows: Vec<Vec<String>> = aliases
        .iter()
        .map(|a| {
            vec![
                a.id.clone(),
                a.pattern.clone(),
                a.redirect_label.clone(),
                a.domain_id.clone(),
            ]
        })
        .collect();
    render_table(&["ID", "Pattern", "Redirect", "Domain"], &rows)
}

fn render_table(header: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = header.iter().map(|h| h.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(i) {
                *width = (*width).max(cell.len());
            }
        }
    }

    let format_line = |cells: &[&str]| -> String {
        let line = cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect::<Vec<_>>()
            .join("  ");
        format!("{}\n", line.trim_end())
    };

    let separator: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let separator: Vec<&str> = separator.iter().map(String::as_str).collect();

    let mut out = format_line(header);
    out.push_str(&format_line(&separator));
    for row in rows {
        let cells: Vec<&str> = row.iter().map(String::as_str).collect();
        out.push_str(&format_line(&cells));
    }
    out
}
