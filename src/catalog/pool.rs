use super::normalizer::{NameNormalizer, NormalizedKey};
use super::observer::{MatchEvent, MatchObserver};
use std::collections::HashSet;

/// One photo on disk together with the key derived from its file stem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    key: NormalizedKey,
    filename: String,
}

impl CandidateFile {
    pub fn new(key: NormalizedKey, filename: impl Into<String>) -> Self {
        Self {
            key,
            filename: filename.into(),
        }
    }

    pub fn key(&self) -> &NormalizedKey {
        &self.key
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn into_filename(self) -> String {
        self.filename
    }
}

/// Unclaimed photos for a single matching run.
///
/// Iteration order is the order candidates were supplied and never changes;
/// the only mutation is [`PhotoPool::claim`].
#[derive(Debug, Clone, Default)]
pub struct PhotoPool {
    candidates: Vec<CandidateFile>,
}

impl PhotoPool {
    /// Builds a pool from bare filenames, keyed by their normalized stems.
    pub fn from_filenames<I, S>(
        filenames: I,
        normalizer: &NameNormalizer,
        observer: &dyn MatchObserver,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let candidates = filenames.into_iter().map(|filename| {
            let filename = filename.into();
            let key = normalizer.normalize(file_stem(&filename));
            CandidateFile::new(key, filename)
        });
        Self::from_candidates(candidates, observer)
    }

    /// Keeps the first candidate for each filename and reports the rest.
    pub fn from_candidates<I>(candidates: I, observer: &dyn MatchObserver) -> Self
    where
        I: IntoIterator<Item = CandidateFile>,
    {
        let mut seen = HashSet::new();
        let mut kept = Vec::new();

        for candidate in candidates {
            if !seen.insert(candidate.filename.clone()) {
                observer.observe(&MatchEvent::DuplicateFilename {
                    filename: &candidate.filename,
                });
                continue;
            }
            kept.push(candidate);
        }

        Self { candidates: kept }
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CandidateFile> {
        self.candidates.iter()
    }

    pub fn contains_filename(&self, filename: &str) -> bool {
        self.candidates
            .iter()
            .any(|candidate| candidate.filename == filename)
    }

    /// Removes the candidate at `index`, preserving the order of the rest.
    pub(crate) fn claim(&mut self, index: usize) -> CandidateFile {
        self.candidates.remove(index)
    }
}

/// Filename without its final extension; dotfiles keep their full name.
pub fn file_stem(filename: &str) -> &str {
    match filename.rfind('.') {
        Some(0) | None => filename,
        Some(index) => &filename[..index],
    }
}
