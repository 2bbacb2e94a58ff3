//! Centralized configuration for MalhDB relations.
//!
//! Goals:
//! - Single place to collect tunables instead of scattering env lookups.
//! - RelnConfig::from_env() reads MALH_* variables; builder-style setters override.
//!
//! page_size and split_every are fixed when a relation is created and then
//! persisted in NAME.info; later opens ignore the configured values for them.

use anyhow::Result;
use std::fmt;

use crate::consts::DEFAULT_PAGE_SIZE;
use crate::meta::validate_page_size;

/// Tunables for creating and opening relations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelnConfig {
    /// Page size in bytes for new relations.
    /// Env: MALH_PAGE_SIZE (default 1024)
    pub page_size: u32,

    /// Split trigger: a split runs before an insert whenever
    /// `ntuples > 0 && ntuples % split_every == 0`.
    /// Env: MALH_SPLIT_EVERY (default None = derived from page size and arity)
    pub split_every: Option<u32>,

    /// Whether to fsync data after every page write.
    /// Env: MALH_DATA_FSYNC (default false; "1|true|on|yes" => true)
    pub data_fsync: bool,
}

impl Default for RelnConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            split_every: None,
            data_fsync: false,
        }
    }
}

impl RelnConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("MALH_PAGE_SIZE") {
            if let Ok(n) = v.trim().parse::<u32>() {
                cfg.page_size = n;
            }
        }

        if let Ok(v) = std::env::var("MALH_SPLIT_EVERY") {
            if let Ok(n) = v.trim().parse::<u32>() {
                cfg.split_every = Some(n);
            }
        }

        if let Ok(v) = std::env::var("MALH_DATA_FSYNC") {
            let s = v.trim().to_ascii_lowercase();
            cfg.data_fsync = s == "1" || s == "true" || s == "on" || s == "yes";
        }

        cfg
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_split_every(mut self, every: Option<u32>) -> Self {
        self.split_every = every;
        self
    }

    pub fn with_data_fsync(mut self, on: bool) -> Self {
        self.data_fsync = on;
        self
    }

    /// Check the values that get persisted at create time.
    pub fn validate(&self) -> Result<()> {
        validate_page_size(self.page_size)?;
        if self.split_every == Some(0) {
            return Err(crate::error::RelnError::BadGeometry("split_every must be >= 1".into()).into());
        }
        Ok(())
    }

    /// Effective split trigger for a relation with `nattrs` attributes.
    pub fn split_every_for(&self, nattrs: u32) -> u32 {
        self.split_every
            .unwrap_or_else(|| default_split_every(self.page_size, nattrs))
    }
}

/// Roughly one split per page worth of ten-byte fields.
pub fn default_split_every(page_size: u32, nattrs: u32) -> u32 {
    (page_size / (10 * nattrs.max(1))).max(1)
}

impl fmt::Display for RelnConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RelnConfig {{ page_size: {}, split_every: {}, data_fsync: {} }}",
            self.page_size,
            self.split_every
                .map(|v| v.to_string())
                .unwrap_or_else(|| "default(ps/(10*nattrs))".to_string()),
            self.data_fsync,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_overrides() {
        let c = RelnConfig::default();
        assert_eq!(c.page_size, 1024);
        assert_eq!(c.split_every_for(3), 34);
        assert_eq!(c.split_every_for(200), 1);

        let c = c.with_page_size(4096).with_split_every(Some(7)).with_data_fsync(true);
        assert_eq!(c.split_every_for(3), 7);
        assert!(c.validate().is_ok());
        assert!(c.to_string().contains("split_every: 7"));

        assert!(RelnConfig::default().with_page_size(100).validate().is_err());
        assert!(RelnConfig::default().with_split_every(Some(0)).validate().is_err());
    }
}
