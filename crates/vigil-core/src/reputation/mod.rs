//! External reputation seam.
//!
//! The core never performs network lookups itself. A caller may plug in a
//! `ReputationSource`; every call goes through `BoundedReputation`, which
//! turns slow or failing sources into a `LookupError` instead of blocking
//! the scan.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use tracing::warn;

use crate::error::LookupError;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReputationQuery {
    /// Lowercase SHA-256 hex.
    Hash(String),
    Domain(String),
    Email(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReputationReport {
    /// The subject is listed (malicious hash or domain, breached email).
    pub found: bool,
    pub detail: Option<String>,
    /// Registration age of a domain, when the source knows it.
    pub domain_age_days: Option<u32>,
}

impl ReputationReport {
    pub fn clean() -> Self {
        Self::default()
    }

    pub fn listed(detail: impl Into<String>) -> Self {
        Self {
            found: true,
            detail: Some(detail.into()),
            domain_age_days: None,
        }
    }
}

pub trait ReputationSource: Send + Sync {
    fn lookup(&self, query: &ReputationQuery) -> Result<ReputationReport, LookupError>;
}

/// Lookups allowed at once unless configured otherwise.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 16;

/// Runs lookups on a helper thread and gives up after `timeout`.
///
/// A timed-out lookup keeps running detached; its result is discarded.
/// Each lookup holds one of `max_in_flight` slots until its thread exits,
/// so at most that many helper threads exist per instance (clones share the
/// slots). When every slot is taken, `lookup` fails fast with
/// `LookupError::Unavailable` instead of spawning.
#[derive(Clone)]
pub struct BoundedReputation {
    source: Arc<dyn ReputationSource>,
    timeout: Duration,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: usize,
}

impl BoundedReputation {
    pub fn new(source: Arc<dyn ReputationSource>, timeout: Duration) -> Self {
        Self {
            source,
            timeout,
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        }
    }

    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight;
        self
    }

    pub fn lookup(&self, query: &ReputationQuery) -> Result<ReputationReport, LookupError> {
        let slot = Slot::acquire(&self.in_flight, self.max_in_flight).ok_or_else(|| {
            warn!(?query, max = self.max_in_flight, "reputation lookups saturated");
            LookupError::Unavailable(format!(
                "{} reputation lookups already in flight",
                self.max_in_flight
            ))
        })?;

        let (tx, rx) = mpsc::channel();
        let source = Arc::clone(&self.source);
        let owned = query.clone();

        thread::Builder::new()
            .name("vigil-reputation".into())
            .spawn(move || {
                let _slot = slot;
                // Receiver may be gone after a timeout.
                let _ = tx.send(source.lookup(&owned));
            })
            .map_err(|e| LookupError::Unavailable(e.to_string()))?;

        match rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                warn!(?query, timeout_ms = self.timeout.as_millis() as u64, "reputation lookup timed out");
                Err(LookupError::Timeout {
                    millis: self.timeout.as_millis() as u64,
                })
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(LookupError::Unavailable(
                "reputation source terminated without answering".into(),
            )),
        }
    }
}

impl std::fmt::Debug for BoundedReputation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedReputation")
            .field("timeout", &self.timeout)
            .field("max_in_flight", &self.max_in_flight)
            .finish_non_exhaustive()
    }
}

/// One in-flight lookup. Released on drop, including when the helper
/// thread unwinds or is never spawned.
struct Slot(Arc<AtomicUsize>);

impl Slot {
    fn acquire(counter: &Arc<AtomicUsize>, max: usize) -> Option<Self> {
        counter
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < max).then_some(n + 1)
            })
            .ok()?;
        Some(Self(Arc::clone(counter)))
    }
}

impl Drop for Slot {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

/// In-memory source with fixed answers. Unknown subjects are clean.
#[derive(Debug, Clone, Default)]
pub struct StaticReputation {
    entries: HashMap<ReputationQuery, ReputationReport>,
}

impl StaticReputation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, query: ReputationQuery, report: ReputationReport) -> Self {
        self.entries.insert(query, report);
        self
    }
}

impl ReputationSource for StaticReputation {
    fn lookup(&self, query: &ReputationQuery) -> Result<ReputationReport, LookupError> {
        Ok(self.entries.get(query).cloned().unwrap_or_default())
    }
}
