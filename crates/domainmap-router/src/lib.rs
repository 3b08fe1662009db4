//! Hostname-to-domain resolution
//!
//! Maps an incoming request hostname to a configured domain record: exact
//! hostname match first, then alias patterns (e.g., `*.example.com`) in
//! insertion order, then the default domain.

pub mod alias;
pub mod error;
pub mod map;
pub mod pattern;
pub mod registry;
pub mod resolver;

pub use alias::{AliasRecord, AliasTable};
pub use error::{MapError, RecordKind};
pub use map::{DomainMap, Snapshot};
pub use pattern::{matches_pattern, AliasPattern, PatternError, Segment};
pub use registry::{normalize_hostname, DomainRecord, DomainRegistry};
pub use resolver::{MatchKind, ResolutionResult, Resolver};
