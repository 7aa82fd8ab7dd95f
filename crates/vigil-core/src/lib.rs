pub mod artifact;
pub mod config;
pub mod error;
pub mod extract;
pub mod findings;
pub mod inspect;
pub mod logging;
pub mod report;
pub mod reputation;
pub mod scan;
pub mod util;
pub mod verdict;

pub use artifact::{ArtifactKind, ScanInput};
pub use config::{RuleSet, ThreatConfig};
pub use error::ScanFailed;
pub use findings::{Finding, FindingKind, Severity};
pub use scan::{CancelToken, Scanner};
pub use verdict::{RiskLevel, RiskVerdict};

pub const TOOL_NAME: &str = "vigil";

/// JSON schema version of vigil reports.
/// Bump only when the report shape changes semantically.
pub const SCHEMA_VERSION: &str = "0.1.0";
