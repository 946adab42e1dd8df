use super::normalizer::{KeyPolicy, NameNormalizer, NormalizedKey};
use super::observer::{MatchEvent, MatchObserver, MatchTier, NoopObserver};
use super::pool::{CandidateFile, PhotoPool};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

pub const DEFAULT_THRESHOLD: f64 = 0.8;

/// Matching policy knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Minimum character-overlap score accepted by the partial tier.
    pub threshold: f64,
    pub partial_scoring: bool,
    pub containment_fallback: bool,
    pub key_policy: KeyPolicy,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            partial_scoring: true,
            containment_fallback: true,
            key_policy: KeyPolicy::Compact,
        }
    }
}

impl MatchConfig {
    pub fn validate(&self) -> Result<(), MatchConfigError> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(MatchConfigError::ThresholdOutOfRange(self.threshold));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MatchConfigError {
    #[error("match threshold must be within 0.0..=1.0, got {0}")]
    ThresholdOutOfRange(f64),
}

/// Outcome for one roster record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "filename", rename_all = "snake_case")]
pub enum MatchResult {
    Matched(String),
    NoMatch,
}

impl MatchResult {
    pub fn filename(&self) -> Option<&str> {
        match self {
            MatchResult::Matched(filename) => Some(filename),
            MatchResult::NoMatch => None,
        }
    }

    pub fn is_match(&self) -> bool {
        matches!(self, MatchResult::Matched(_))
    }
}

/// Assigns photos to names, claiming each winner from the pool.
#[derive(Clone)]
pub struct PhotoMatcher {
    config: MatchConfig,
    normalizer: NameNormalizer,
    observer: Arc<dyn MatchObserver>,
}

impl fmt::Debug for PhotoMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhotoMatcher")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for PhotoMatcher {
    fn default() -> Self {
        Self::from_valid(MatchConfig::default())
    }
}

impl PhotoMatcher {
    pub fn new(config: MatchConfig) -> Result<Self, MatchConfigError> {
        config.validate()?;
        Ok(Self::from_valid(config))
    }

    fn from_valid(config: MatchConfig) -> Self {
        let normalizer = NameNormalizer::new(config.key_policy);
        Self {
            config,
            normalizer,
            observer: Arc::new(NoopObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn MatchObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn normalizer(&self) -> &NameNormalizer {
        &self.normalizer
    }

    pub fn normalize(&self, raw: &str) -> NormalizedKey {
        let key = self.normalizer.normalize(raw);
        self.observer
            .observe(&MatchEvent::Normalized { raw, key: &key });
        key
    }

    /// Builds a pool with this matcher's key policy, in the given order.
    pub fn build_pool<I, S>(&self, filenames: I) -> PhotoPool
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        PhotoPool::from_filenames(filenames, &self.normalizer, self.observer.as_ref())
    }

    /// Finds the best available photo for `query` and removes it from `pool`.
    pub fn claim(&self, query: &NormalizedKey, pool: &mut PhotoPool) -> MatchResult {
        match self.select(query, pool) {
            Some((index, tier, score)) => {
                let winner = pool.claim(index);
                self.observer.observe(&MatchEvent::Claimed {
                    query,
                    filename: winner.filename(),
                    tier,
                    score,
                });
                MatchResult::Matched(winner.into_filename())
            }
            None => {
                self.observer.observe(&MatchEvent::NoMatch { query });
                MatchResult::NoMatch
            }
        }
    }

    /// Matches names in order against the shrinking pool.
    pub fn assign<'a, I>(&self, names: I, pool: &mut PhotoPool) -> Vec<MatchResult>
    where
        I: IntoIterator<Item = &'a str>,
    {
        names
            .into_iter()
            .map(|name| {
                let key = self.normalize(name);
                self.claim(&key, pool)
            })
            .collect()
    }

    fn select(&self, query: &NormalizedKey, pool: &PhotoPool) -> Option<(usize, MatchTier, f64)> {
        if query.is_empty() {
            return None;
        }

        if let Some(index) = pool.iter().position(|candidate| candidate.key() == query) {
            return Some((index, MatchTier::Exact, 1.0));
        }

        if self.config.partial_scoring {
            if let Some((index, score)) = self.best_partial(query, pool) {
                return Some((index, MatchTier::Partial, score));
            }
        }

        if self.config.containment_fallback {
            if let Some(index) = pool
                .iter()
                .position(|candidate| contains_either_way(query, candidate.key()))
            {
                return Some((index, MatchTier::Containment, 0.0));
            }
        }

        None
    }

    fn best_partial(&self, query: &NormalizedKey, pool: &PhotoPool) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;

        for (index, candidate) in pool.iter().enumerate() {
            let Some(score) = partial_score(query, candidate) else {
                continue;
            };
            self.observer.observe(&MatchEvent::Scored {
                query,
                filename: candidate.filename(),
                score,
            });

            if score < self.config.threshold {
                continue;
            }
            // strict comparison keeps the earliest candidate on ties
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((index, score));
            }
        }

        best
    }
}

/// `None` when the candidate has an empty key or is not comparable with the query.
fn partial_score(query: &NormalizedKey, candidate: &CandidateFile) -> Option<f64> {
    let key = candidate.key();
    if key.is_empty() || key.has_cjk() != query.has_cjk() {
        return None;
    }

    if query.has_cjk() {
        return (key.ideographs() == query.ideographs()).then_some(1.0);
    }

    Some(character_overlap(query.as_str(), key.as_str()))
}

fn contains_either_way(query: &NormalizedKey, key: &NormalizedKey) -> bool {
    if key.is_empty() || key.has_cjk() != query.has_cjk() {
        return false;
    }
    if query.has_cjk() && key.ideographs() != query.ideographs() {
        return false;
    }

    let (query, key) = (query.as_str(), key.as_str());
    query.contains(key) || key.contains(query)
}

/// Distinct shared characters divided by the longer string's length.
///
/// Ignores character multiplicity and position, so anagrams score 1.0.
pub fn character_overlap(left: &str, right: &str) -> f64 {
    let longest = left.chars().count().max(right.chars().count());
    if longest == 0 {
        return 0.0;
    }

    let left_chars: HashSet<char> = left.chars().collect();
    let right_chars: HashSet<char> = right.chars().collect();
    let shared = left_chars.intersection(&right_chars).count();

    shared as f64 / longest as f64
}
