//! Alias pattern matching
//!
//! Patterns are dot-delimited hostnames in which any whole segment may be the
//! wildcard `*`. A wildcard matches exactly one non-empty segment, so the
//! pattern and the hostname must have the same number of segments.
//!
//! # Supported patterns
//! - `*.example.com` - matches `shop.example.com`, `www.example.com`
//! - `www.*.example.com` - matches `www.eu.example.com`
//! - `example.*` - matches `example.org`, `example.net`
//! - `*` - matches any single-segment host such as `localhost`
//!
//! # Rejected patterns
//! - `shop*.example.com` - partial wildcards inside a segment
//! - `a..example.com` - empty segments
//! - `` - empty pattern
//!
//! Matching is purely structural: no regex engine is involved and the cost is
//! linear in the number of segments.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// The wildcard segment
pub const WILDCARD: &str = "*";

/// Errors that can occur while parsing an alias pattern
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PatternError {
    #[error("Empty pattern")]
    EmptyPattern,

    #[error("Pattern segments cannot be empty: {0}")]
    EmptySegment(String),

    #[error("Partial wildcards (shop*.domain) are not supported: {0}")]
    PartialWildcard(String),

    #[error("Pattern contains whitespace: {0}")]
    Whitespace(String),
}

/// A single dot-delimited pattern segment
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Matches the same label, ignoring ASCII case
    Literal(String),
    /// Matches any one non-empty label
    Wildcard,
}

impl Segment {
    fn matches(&self, label: &str) -> bool {
        match self {
            Segment::Wildcard => !label.is_empty(),
            Segment::Literal(literal) => literal.eq_ignore_ascii_case(label),
        }
    }
}

/// A validated alias pattern
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AliasPattern {
    /// Normalized pattern string (e.g., "*.example.com")
    pattern: String,
    segments: Vec<Segment>,
}

impl AliasPattern {
    /// Parse and validate a pattern string
    ///
    /// The pattern is trimmed and lowercased before validation.
    ///
    /// # Examples
    /// ```
    /// use domainmap_router::pattern::AliasPattern;
    ///
    /// let pattern = AliasPattern::parse("*.Example.com").unwrap();
    /// assert_eq!(pattern.as_str(), "*.example.com");
    /// assert!(pattern.matches("shop.example.com"));
    /// assert!(!pattern.matches("example.com"));
    /// ```
    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        let normalized = pattern.trim().to_ascii_lowercase();

        if normalized.is_empty() {
            return Err(PatternError::EmptyPattern);
        }

        if normalized.chars().any(char::is_whitespace) {
            return Err(PatternError::Whitespace(normalized));
        }

        let mut segments = Vec::new();
        for part in normalized.split('.') {
            if part.is_empty() {
                return Err(PatternError::EmptySegment(normalized));
            }
            if part == WILDCARD {
                segments.push(Segment::Wildcard);
            } else if part.contains('*') {
                return Err(PatternError::PartialWildcard(normalized));
            } else {
                segments.push(Segment::Literal(part.to_string()));
            }
        }

        Ok(Self {
            pattern: normalized,
            segments,
        })
    }

    /// Check if a hostname matches this pattern
    ///
    /// Segment counts must be equal; `*.example.com` matches `api.example.com`
    /// but neither `example.com` nor `a.b.example.com`.
    pub fn matches(&self, hostname: &str) -> bool {
        if hostname.is_empty() {
            return false;
        }

        let mut labels = hostname.split('.');
        for segment in &self.segments {
            match labels.next() {
                Some(label) if segment.matches(label) => {}
                _ => return false,
            }
        }

        labels.next().is_none()
    }

    /// Get the normalized pattern string
    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// Parsed segments, leftmost first
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Whether any segment is a wildcard
    pub fn has_wildcard(&self) -> bool {
        self.segments.iter().any(|s| *s == Segment::Wildcard)
    }
}

impl TryFrom<String> for AliasPattern {
    type Error = PatternError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<AliasPattern> for String {
    fn from(pattern: AliasPattern) -> Self {
        pattern.pattern
    }
}

impl fmt::Display for AliasPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.pattern)
    }
}

/// Match a raw pattern string against a hostname without validating it first
///
/// Total over all inputs: an empty hostname or a pattern with zero segments
/// never matches, and malformed segments simply fail to match.
///
/// # Examples
/// ```
/// use domainmap_router::pattern::matches_pattern;
///
/// assert!(matches_pattern("*.example.com", "shop.example.com"));
/// assert!(!matches_pattern("*.example.com", "a.b.example.com"));
/// assert!(!matches_pattern("", "example.com"));
/// ```
pub fn matches_pattern(pattern: &str, hostname: &str) -> bool {
    if pattern.is_empty() || hostname.is_empty() {
        return false;
    }

    let mut labels = hostname.split('.');
    for part in pattern.split('.') {
        let Some(label) = labels.next() else {
            return false;
        };
        let matched = if part == WILDCARD {
            !label.is_empty()
        } else {
            !part.is_empty() && part.eq_ignore_ascii_case(label)
        };
        if !matched {
            return false;
        }
    }

    labels.next().is_none()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_patterns() {
        assert!(AliasPattern::parse("*.example.com").is_ok());
        assert!(AliasPattern::parse("www.*.example.com").is_ok());
        assert!(AliasPattern::parse("example.*").is_ok());
        assert!(AliasPattern::parse("*").is_ok());
        assert!(AliasPattern::parse("alias.example.com").is_ok());
        assert!(AliasPattern::parse("example.com:8080").is_ok());
    }

    #[test]
    fn test_invalid_patterns() {
        assert_eq!(AliasPattern::parse(""), Err(PatternError::EmptyPattern));
        assert_eq!(AliasPattern::parse("   "), Err(PatternError::EmptyPattern));

        assert_eq!(
            AliasPattern::parse("a..example.com"),
            Err(PatternError::EmptySegment("a..example.com".to_string()))
        );
        assert!(matches!(
            AliasPattern::parse(".example.com"),
            Err(PatternError::EmptySegment(_))
        ));
        assert!(matches!(
            AliasPattern::parse("example.com."),
            Err(PatternError::EmptySegment(_))
        ));

        assert_eq!(
            AliasPattern::parse("shop*.example.com"),
            Err(PatternError::PartialWildcard("shop*.example.com".to_string()))
        );
        assert!(matches!(
            AliasPattern::parse("**.example.com"),
            Err(PatternError::PartialWildcard(_))
        ));

        assert!(matches!(
            AliasPattern::parse("a b.example.com"),
            Err(PatternError::Whitespace(_))
        ));
    }

    #[test]
    fn test_wildcard_matching() {
        let pattern = AliasPattern::parse("*.example.com").unwrap();

        assert!(pattern.matches("shop.example.com"));
        assert!(pattern.matches("www.example.com"));
        assert!(pattern.matches("test-123.example.com"));
        assert!(pattern.matches("SHOP.Example.COM"));

        // Segment count mismatch
        assert!(!pattern.matches("example.com"));
        assert!(!pattern.matches("a.b.example.com"));

        // Wildcard needs a non-empty label
        assert!(!pattern.matches(".example.com"));

        assert!(!pattern.matches("shop.example.org"));
        assert!(!pattern.matches(""));
    }

    #[test]
    fn test_inner_and_trailing_wildcards() {
        let inner = AliasPattern::parse("www.*.example.com").unwrap();
        assert!(inner.matches("www.eu.example.com"));
        assert!(!inner.matches("api.eu.example.com"));
        assert!(!inner.matches("www.example.com"));

        let trailing = AliasPattern::parse("example.*").unwrap();
        assert!(trailing.matches("example.org"));
        assert!(!trailing.matches("example.co.uk"));
    }

    #[test]
    fn test_literal_pattern() {
        let pattern = AliasPattern::parse("Alias.Example.com").unwrap();
        assert_eq!(pattern.as_str(), "alias.example.com");
        assert!(!pattern.has_wildcard());
        assert!(pattern.matches("alias.example.com"));
        assert!(pattern.matches("ALIAS.example.com"));
        assert!(!pattern.matches("other.example.com"));
    }

    #[test]
    fn test_bare_wildcard() {
        let pattern = AliasPattern::parse("*").unwrap();
        assert!(pattern.matches("localhost"));
        assert!(!pattern.matches("example.com"));
    }

    #[test]
    fn test_segments() {
        let pattern = AliasPattern::parse("*.example.com").unwrap();
        assert_eq!(
            pattern.segments(),
            &[
                Segment::Wildcard,
                Segment::Literal("example".to_string()),
                Segment::Literal("com".to_string()),
            ]
        );
        assert!(pattern.has_wildcard());
    }

    #[test]
    fn test_matches_pattern_is_total() {
        assert!(matches_pattern("*.example.com", "shop.example.com"));
        assert!(matches_pattern("*.EXAMPLE.com", "shop.example.COM"));

        assert!(!matches_pattern("", "example.com"));
        assert!(!matches_pattern("*.example.com", ""));
        assert!(!matches_pattern("", ""));
        assert!(!matches_pattern("a..com", "a..com"));
        assert!(!matches_pattern("*.example.com", "example.com"));
        assert!(!matches_pattern("*.example.com", "a.b.example.com"));
    }

    #[test]
    fn test_serde_roundtrip_validates() {
        let pattern: AliasPattern = serde_json::from_str("\"*.Example.com\"").unwrap();
        assert_eq!(pattern.as_str(), "*.example.com");
        assert_eq!(serde_json::to_string(&pattern).unwrap(), "\"*.example.com\"");

        let invalid: Result<AliasPattern, _> = serde_json::from_str("\"shop*.example.com\"");
        assert!(invalid.is_err());
    }

    #[test]
    fn test_pattern_display() {
        let pattern = AliasPattern::parse("*.example.com").unwrap();
        assert_eq!(pattern.to_string(), "*.example.com");
    }
}
