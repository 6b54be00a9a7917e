//! # legis-sync
//!
//! ETL and maintenance commands for the legislative monitor:
//! - REST clients for the Chamber of Deputies and IBGE open data
//! - Synchronization commands (upsert by natural key)
//! - Legacy proposal type backfill
//! - Seeding, AI enrichment, profile and report generation

pub mod clients;
pub mod commands;
pub mod report;
