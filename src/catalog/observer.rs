use super::normalizer::NormalizedKey;
use tracing::{debug, warn};

/// Which matching tier produced a claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchTier {
    Exact,
    Partial,
    Containment,
}

impl MatchTier {
    pub fn label(self) -> &'static str {
        match self {
            MatchTier::Exact => "exact",
            MatchTier::Partial => "partial",
            MatchTier::Containment => "containment",
        }
    }
}

/// Diagnostic events emitted while building pools and matching names.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchEvent<'a> {
    Normalized {
        raw: &'a str,
        key: &'a NormalizedKey,
    },
    DuplicateFilename {
        filename: &'a str,
    },
    Scored {
        query: &'a NormalizedKey,
        filename: &'a str,
        score: f64,
    },
    Claimed {
        query: &'a NormalizedKey,
        filename: &'a str,
        tier: MatchTier,
        score: f64,
    },
    NoMatch {
        query: &'a NormalizedKey,
    },
}

/// Sink for matching diagnostics, injected instead of a process-wide logger.
pub trait MatchObserver: Send + Sync {
    fn observe(&self, event: &MatchEvent<'_>);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl MatchObserver for NoopObserver {
    fn observe(&self, _event: &MatchEvent<'_>) {}
}

/// Forwards events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl MatchObserver for TracingObserver {
    fn observe(&self, event: &MatchEvent<'_>) {
        match event {
            MatchEvent::Normalized { raw, key } => {
                debug!(raw = %raw, key = %key, "normalized display name");
            }
            MatchEvent::DuplicateFilename { filename } => {
                warn!(filename = %filename, "duplicate photo filename ignored");
            }
            MatchEvent::Scored {
                query,
                filename,
                score,
            } => {
                debug!(query = %query, filename = %filename, score, "scored candidate");
            }
            MatchEvent::Claimed {
                query,
                filename,
                tier,
                score,
            } => {
                debug!(
                    query = %query,
                    filename = %filename,
                    tier = tier.label(),
                    score,
                    "claimed photo"
                );
            }
            MatchEvent::NoMatch { query } => {
                debug!(query = %query, "no photo matched");
            }
        }
    }
}
