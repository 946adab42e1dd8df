//! KOL catalog service: roster ingestion, name-to-photo matching and the JSON
//! API serving the enriched roster.

pub mod catalog;
pub mod config;
pub mod convert;
pub mod enrich;
pub mod error;
pub mod roster;
pub mod routes;
pub mod telemetry;
