//! Tracker configuration
//!
//! Resolved in three layers: built-in defaults, an optional TOML file, then
//! `ROADMAP_*` environment variables.

use crate::error::{TrackerError, TrackerResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Prefix of environment overrides
pub const ENV_PREFIX: &str = "ROADMAP_";

/// Tracker configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Root for the local cache, record store and blobs
    pub data_dir: PathBuf,
    /// Catalog document; the built-in catalog when unset
    pub catalog_path: Option<PathBuf>,
    /// Quiet period before a notes edit is written
    pub notes_debounce_ms: u64,
    /// Validity of download links in seconds
    pub link_validity_secs: u64,
    /// Secret used to sign download links
    pub blob_secret: String,
    /// Base of download links
    pub link_base_url: String,
}

impl TrackerConfig {
    /// Default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With data directory
    #[inline]
    #[must_use]
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    /// With catalog document
    #[inline]
    #[must_use]
    pub fn with_catalog_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.catalog_path = Some(path.into());
        self
    }

    /// With notes quiet period
    #[inline]
    #[must_use]
    pub fn with_notes_debounce(mut self, period: Duration) -> Self {
        self.notes_debounce_ms = u64::try_from(period.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// With download link validity
    #[inline]
    #[must_use]
    pub fn with_link_validity(mut self, validity: Duration) -> Self {
        self.link_validity_secs = validity.as_secs();
        self
    }

    /// With link signing secret
    #[inline]
    #[must_use]
    pub fn with_blob_secret(mut self, secret: impl Into<String>) -> Self {
        self.blob_secret = secret.into();
        self
    }

    /// Notes quiet period
    #[inline]
    #[must_use]
    pub fn notes_debounce(&self) -> Duration {
        Duration::from_millis(self.notes_debounce_ms)
    }

    /// Download link validity
    #[inline]
    #[must_use]
    pub fn link_validity(&self) -> Duration {
        Duration::from_secs(self.link_validity_secs)
    }

    /// Directory of the local cache
    #[must_use]
    pub fn cache_dir(&self) -> PathBuf {
        self.data_dir.join("cache")
    }

    /// Directory of the record store
    #[must_use]
    pub fn records_dir(&self) -> PathBuf {
        self.data_dir.join("records")
    }

    /// Directory of uploaded documents
    #[must_use]
    pub fn blobs_dir(&self) -> PathBuf {
        self.data_dir.join("blobs")
    }

    /// Parse a TOML document; missing keys keep their defaults
    ///
    /// # Errors
    /// Returns [`TrackerError::Config`] on malformed TOML.
    pub fn from_toml_str(source: &str) -> TrackerResult<Self> {
        toml::from_str(source).map_err(|e| TrackerError::Config(e.to_string()))
    }

    /// Defaults, then `file` if it exists, then the process environment
    ///
    /// # Errors
    /// Fails when the file can't be read or parsed, or an override is invalid.
    pub fn load(file: Option<&Path>) -> TrackerResult<Self> {
        let mut config = match file {
            Some(path) if path.exists() => {
                let source = std::fs::read_to_string(path)
                    .map_err(|e| TrackerError::Config(format!("{}: {e}", path.display())))?;
                Self::from_toml_str(&source)?
            }
            _ => Self::default(),
        };
        config.apply_env(std::env::vars())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `ROADMAP_*` overrides from `vars`; other variables are ignored
    ///
    /// # Errors
    /// Returns [`TrackerError::Config`] when a numeric override doesn't parse.
    pub fn apply_env<I, K, V>(&mut self, vars: I) -> TrackerResult<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        for (key, value) in vars {
            let Some(name) = key.as_ref().strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let value = value.into();
            match name {
                "DATA_DIR" => self.data_dir = PathBuf::from(value),
                "CATALOG" | "CATALOG_PATH" => self.catalog_path = Some(PathBuf::from(value)),
                "NOTES_DEBOUNCE_MS" => self.notes_debounce_ms = parse_number(name, &value)?,
                "LINK_VALIDITY_SECS" => self.link_validity_secs = parse_number(name, &value)?,
                "BLOB_SECRET" => self.blob_secret = value,
                "LINK_BASE_URL" => self.link_base_url = value,
                _ => tracing::debug!(variable = %key.as_ref(), "ignoring unknown override"),
            }
        }
        Ok(())
    }

    /// Reject settings that can't work
    ///
    /// # Errors
    /// Returns [`TrackerError::Config`] describing the first problem.
    pub fn validate(&self) -> TrackerResult<()> {
        if self.link_validity_secs == 0 {
            return Err(TrackerError::Config(
                "link_validity_secs must be positive".into(),
            ));
        }
        if self.blob_secret.is_empty() {
            return Err(TrackerError::Config("blob_secret must not be empty".into()));
        }
        Ok(())
    }
}

fn parse_number(name: &str, value: &str) -> TrackerResult<u64> {
    value
        .trim()
        .parse()
        .map_err(|e| TrackerError::Config(format!("{ENV_PREFIX}{name}={value:?}: {e}")))
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".roadmap"),
            catalog_path: None,
            notes_debounce_ms: 1000,
            link_validity_secs: 3600,
            blob_secret: "change-me".to_string(),
            link_base_url: "file://blobs".to_string(),
        }
    }
}
