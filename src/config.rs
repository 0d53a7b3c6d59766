//! Runtime configuration loader.

use std::path::Path;
use std::time::Duration;
use std::{fmt, fs};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::engine::DEFAULT_CONFIRMATIONS;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base URL of the blockchain explorer API.
    pub explorer_url: String,
    /// Delay between watch poll iterations, in seconds.
    pub poll_interval_secs: u64,
    /// Confirmation threshold used for fresh sessions.
    pub default_confirmations: u32,
    /// Path of the JSON session store.
    pub storage_path: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            explorer_url: "https://blockchain.info".to_string(),
            poll_interval_secs: 20,
            default_confirmations: DEFAULT_CONFIRMATIONS,
            storage_path: "storage/sessions.json".to_string(),
        }
    }
}

impl Settings {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("reading settings file {:?}", path.as_ref()))?;
        let settings: Settings = serde_json::from_str(&raw)
            .with_context(|| format!("parsing settings file {:?}", path.as_ref()))?;
        Ok(settings)
    }

    /// Load settings, falling back to defaults when the file is absent.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load_from_file(path)
        } else {
            log::info!(
                "[CONFIG] no settings file at {:?}, using defaults",
                path.as_ref()
            );
            Ok(Self::default())
        }
    }

    pub fn tick(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }
}

impl fmt::Display for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "explorer={} tick={}s confirmations={} storage={}",
            self.explorer_url, self.poll_interval_secs, self.default_confirmations, self.storage_path
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let settings: Settings =
            serde_json::from_str(r#"{ "poll_interval_secs": 5 }"#).unwrap();
        assert_eq!(settings.poll_interval_secs, 5);
        assert_eq!(settings.explorer_url, "https://blockchain.info");
        assert_eq!(settings.default_confirmations, 2);
    }

    #[test]
    fn tick_never_below_one_second() {
        let settings = Settings {
            poll_interval_secs: 0,
            ..Settings::default()
        };
        assert_eq!(settings.tick(), Duration::from_secs(1));
    }
}
