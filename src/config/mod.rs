pub mod settings;

use crate::core::{ShredMethod, DEFAULT_CHUNK_SIZE};
use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const MIN_CHUNK_SIZE: usize = 4 * 1024;
pub const MAX_CHUNK_SIZE: usize = 64 * 1024 * 1024;

/// Persisted user preferences.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ShredConfig {
    pub method: ShredMethod,
    pub verify: bool,
    pub chunk_size: usize,
    pub recursive: bool,
    pub ocr_enabled: bool,
    pub last_directory: Option<PathBuf>,
}

impl ShredConfig {
    pub fn load() -> Result<Self> {
        settings::load_config(None)
    }

    /// The configured chunk size, clamped to a sane range.
    pub fn effective_chunk_size(&self) -> usize {
        self.chunk_size.clamp(MIN_CHUNK_SIZE, MAX_CHUNK_SIZE)
    }
}

impl Default for ShredConfig {
    fn default() -> Self {
        Self {
            method: ShredMethod::default(),
            verify: true,
            chunk_size: DEFAULT_CHUNK_SIZE,
            recursive: false,
            ocr_enabled: false,
            last_directory: None,
        }
    }
}

/// Parses a `YYYY-MM-DD` date into local midnight, as a UTC timestamp.
pub fn parse_date(date_str: &str) -> Result<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d")
        .with_context(|| format!("Date must be in YYYY-MM-DD format: '{}'", date_str.trim()))?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .context("Invalid time of day")?;
    let local = Local
        .from_local_datetime(&midnight)
        .earliest()
        .with_context(|| format!("Local midnight does not exist on {}", date))?;
    Ok(local.with_timezone(&Utc))
}
