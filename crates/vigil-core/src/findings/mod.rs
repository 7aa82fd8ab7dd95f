pub mod model;

pub use model::{Finding, FindingKind, Severity};
