//! Name-to-photo matching.
//!
//! Display names are reduced to [`NormalizedKey`]s and matched against a
//! [`PhotoPool`] built from one directory snapshot. Each successful match
//! claims its photo, so no two names in a run share a file.

pub mod matcher;
pub mod normalizer;
pub mod observer;
pub mod pool;
pub mod scan;

pub use matcher::{
    character_overlap, MatchConfig, MatchConfigError, MatchResult, PhotoMatcher,
    DEFAULT_THRESHOLD,
};
pub use normalizer::{KeyPolicy, NameKeys, NameNormalizer, NormalizedKey};
pub use observer::{MatchEvent, MatchObserver, MatchTier, NoopObserver, TracingObserver};
pub use pool::{file_stem, CandidateFile, PhotoPool};
pub use scan::scan_photo_dir;
