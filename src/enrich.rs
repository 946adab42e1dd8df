use crate::catalog::{
    scan_photo_dir, MatchConfigError, MatchResult, PhotoMatcher, PhotoPool, TracingObserver,
};
use crate::config::CatalogConfig;
use crate::roster::{load_roster, KolRecord, RosterError};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

pub const PHOTO_COLUMN: &str = "Photo";

/// A roster record with its resolved photo reference.
///
/// A roster column named `Photo` is replaced by the resolved reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnrichedKol {
    #[serde(flatten)]
    pub record: KolRecord,
    #[serde(rename = "Photo")]
    pub photo: String,
}

/// How match results turn into servable URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoLinks {
    pub route_prefix: String,
    pub placeholder_url: String,
}

impl PhotoLinks {
    pub fn url_for(&self, result: &MatchResult) -> String {
        match result.filename() {
            Some(filename) => format!(
                "{}/{}",
                self.route_prefix.trim_end_matches('/'),
                urlencoding::encode(filename)
            ),
            None => self.placeholder_url.clone(),
        }
    }
}

/// Reads the roster and photo directory and joins them for one request.
#[derive(Debug, Clone)]
pub struct KolCatalog {
    config: CatalogConfig,
    matcher: PhotoMatcher,
    links: PhotoLinks,
}

impl KolCatalog {
    pub fn new(config: CatalogConfig) -> Result<Self, MatchConfigError> {
        let matcher =
            PhotoMatcher::new(config.matching.clone())?.with_observer(Arc::new(TracingObserver));
        let links = PhotoLinks {
            route_prefix: config.photo_route(),
            placeholder_url: config.placeholder_url.clone(),
        };
        Ok(Self {
            config,
            matcher,
            links,
        })
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    pub fn matcher(&self) -> &PhotoMatcher {
        &self.matcher
    }

    /// Loads the roster, refusing rosters above the configured size.
    pub fn read_roster(&self) -> Result<Vec<KolRecord>, RosterError> {
        let records = load_roster(&self.config.roster_path)?;
        if records.len() > self.config.max_roster {
            return Err(RosterError::TooLarge {
                count: records.len(),
                limit: self.config.max_roster,
            });
        }
        Ok(records)
    }

    /// Fresh pool from the current photo directory contents.
    pub fn snapshot_pool(&self) -> PhotoPool {
        self.matcher
            .build_pool(scan_photo_dir(&self.config.photo_dir()))
    }

    pub fn load(&self) -> Result<Vec<EnrichedKol>, RosterError> {
        let records = self.read_roster()?;
        let mut pool = self.snapshot_pool();
        Ok(enrich_records(records, &self.matcher, &mut pool, &self.links))
    }
}

/// Attaches photos to records in roster order, claiming from `pool`.
pub fn enrich_records(
    records: Vec<KolRecord>,
    matcher: &PhotoMatcher,
    pool: &mut PhotoPool,
    links: &PhotoLinks,
) -> Vec<EnrichedKol> {
    let available = pool.len();
    let results = matcher.assign(records.iter().map(|record| record.nickname.as_str()), pool);
    let matched = results.iter().filter(|result| result.is_match()).count();

    info!(
        records = records.len(),
        photos = available,
        matched,
        "roster enriched with photos"
    );

    records
        .into_iter()
        .zip(results.iter())
        .map(|(mut record, result)| {
            record.columns.remove(PHOTO_COLUMN);
            EnrichedKol {
                record,
                photo: links.url_for(result),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::roster_from_csv;
    use std::io::Cursor;

    fn links() -> PhotoLinks {
        PhotoLinks {
            route_prefix: "/static/KOL_Picture/".into(),
            placeholder_url: "placeholder.png".into(),
        }
    }

    #[test]
    fn url_for_encodes_filenames() {
        let url = links().url_for(&MatchResult::Matched("李雷 (SH).png".into()));
        assert_eq!(
            url,
            "/static/KOL_Picture/%E6%9D%8E%E9%9B%B7%20%28SH%29.png"
        );
        assert_eq!(links().url_for(&MatchResult::NoMatch), "placeholder.png");
    }

    #[test]
    fn enrich_records_keeps_roster_order_and_claims_once() {
        let records = roster_from_csv(Cursor::new(
            "KOL Nickname,Followers,Engagement Rate\nJane Doe,1k,2%\nJANE DOE,2k,3%\nNobody,0,\n",
        ))
        .expect("roster parses");
        let matcher = PhotoMatcher::default();
        let mut pool = matcher.build_pool(["Jane Doe.png"]);

        let enriched = enrich_records(records, &matcher, &mut pool, &links());

        let photos: Vec<_> = enriched.iter().map(|kol| kol.photo.as_str()).collect();
        assert_eq!(
            photos,
            vec![
                "/static/KOL_Picture/Jane%20Doe.png",
                "placeholder.png",
                "placeholder.png"
            ]
        );
        assert!(pool.is_empty());

        let value = serde_json::to_value(&enriched[0]).expect("serialize");
        assert_eq!(value["KOL Nickname"], "Jane Doe");
        assert_eq!(value["Photo"], "/static/KOL_Picture/Jane%20Doe.png");
    }

    #[test]
    fn roster_photo_column_is_replaced_by_resolved_url() {
        let records = roster_from_csv(Cursor::new(
            "KOL Nickname,Followers,Engagement Rate,Photo\nJane Doe,1k,2%,old.jpg\nNobody,0,,old.jpg\n",
        ))
        .expect("roster parses");
        let matcher = PhotoMatcher::default();
        let mut pool = matcher.build_pool(["Jane Doe.png"]);

        let enriched = enrich_records(records, &matcher, &mut pool, &links());

        let json = serde_json::to_string(&enriched[0]).expect("serialize");
        assert_eq!(json.matches("\"Photo\"").count(), 1, "{json}");
        let value: serde_json::Value = serde_json::from_str(&json).expect("json");
        assert_eq!(value["Photo"], "/static/KOL_Picture/Jane%20Doe.png");

        let value = serde_json::to_value(&enriched[1]).expect("serialize");
        assert_eq!(value["Photo"], "placeholder.png");
        assert!(!enriched[1].record.columns.contains_key(PHOTO_COLUMN));
    }
}
