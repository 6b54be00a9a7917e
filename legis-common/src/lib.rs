//! # Legis Common Library
//!
//! Shared code for the legislative monitor binaries:
//! - SQLite schema and repositories for every domain table
//! - Configuration loading
//! - AI client and analysis prompts
//! - Text utilities (slugs, word-set similarity)

pub mod ai;
pub mod config;
pub mod db;
pub mod error;
pub mod text;

pub use error::{Error, Result};
