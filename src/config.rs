// Licensed under the MIT and Apache-2.0 licenses.

use figment::providers::{Env, Serialized};
use figment::Figment;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::{CubeError, Result};

/// Capacity of the per-bucket staging buffers. The staging buffers are
/// stack arrays of this many elements; `Settings::staging_size` may lower
/// the chunk length actually used but can never exceed this.
pub const STAGING_SIZE: usize = 128;

/// Process-wide settings, read once from the environment on first use.
/// Environment variables are prefixed `NDCUBE_`, e.g. `NDCUBE_NUM_THREADS=8`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Inner-loop chunk length, 1..=STAGING_SIZE.
    pub staging_size: usize,
    /// Minimum operation size (in elements) before the worker pool is
    /// used. 0 forces multithreading whenever the pool exists.
    pub threading_threshold: usize,
    /// Worker pool size. 0 or 1 disables parallelism entirely.
    pub num_threads: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            staging_size: STAGING_SIZE,
            threading_threshold: 131072,
            num_threads: 4,
        }
    }
}

impl Settings {
    fn load() -> Result<Self> {
        let settings: Settings = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Env::prefixed("NDCUBE_"))
            .extract()
            .map_err(|e| CubeError::BadConfig(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.staging_size < 1 || self.staging_size > STAGING_SIZE {
            return Err(CubeError::BadConfig(format!(
                "staging_size must be in 1..={STAGING_SIZE}, got {}",
                self.staging_size
            )));
        }
        Ok(())
    }
}

static SETTINGS: Lazy<std::result::Result<Settings, String>> = Lazy::new(|| {
    let loaded = Settings::load().map_err(|e| e.to_string());
    match &loaded {
        Ok(s) => tracing::debug!(
            staging_size = s.staging_size,
            threading_threshold = s.threading_threshold,
            num_threads = s.num_threads,
            "settings loaded"
        ),
        Err(e) => tracing::error!(error = %e, "settings rejected"),
    }
    loaded
});

/// The process-wide settings. Fails with `BadConfig` if the environment
/// held invalid values at first access.
pub fn settings() -> Result<&'static Settings> {
    SETTINGS
        .as_ref()
        .map_err(|msg| CubeError::BadConfig(msg.clone()))
}
