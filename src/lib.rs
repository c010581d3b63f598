pub mod advice;
pub mod calendar;
pub mod config;
pub mod harvest;
pub mod models;
pub mod overview;
pub mod profiles;
pub mod refresh;
pub mod scheduler;
pub mod stage;

#[cfg(test)]
mod test_utils;

pub use config::{ConfigError, EngineConfig};
pub use harvest::{HarvestEstimate, HarvestWindow};
pub use models::{Activity, ActivityCategory, AdviceTip, CropRecord, Priority};
pub use overview::{CropEngine, CropOverview};
pub use refresh::{spawn_refresher, RefreshHandle, RefreshTrigger};
pub use stage::GrowthStage;

use tracing_subscriber::EnvFilter;

/// Install a fmt subscriber filtered by RUST_LOG (default `info`).
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Load `.env`, set up logging and build an engine from the environment
pub fn bootstrap() -> Result<CropEngine, ConfigError> {
  // Load environment variables from .env file
  dotenvy::dotenv().ok();
  init_tracing();

  let config = EngineConfig::from_env()?;
  tracing::info!(
    utc_offset = %config.utc_offset,
    refresh_secs = config.refresh_interval.as_secs(),
    overrides = config.profiles_path.is_some(),
    "Crop calendar engine configured"
  );

  CropEngine::new(config)
}

#[cfg(test)]
mod tests {
  use super::*;
  use serial_test::serial;

  #[test]
  #[serial]
  fn test_bootstrap_with_default_env() {
    temp_env::with_vars_unset(
      [
        config::UTC_OFFSET_VAR,
        config::REFRESH_SECS_VAR,
        config::PROFILES_PATH_VAR,
      ],
      || {
        let engine = bootstrap().unwrap();
        assert_eq!(engine.config(), &EngineConfig::default());
        // Idempotent
        init_tracing();
      },
    );
  }

  #[test]
  #[serial]
  fn test_bootstrap_surfaces_config_errors() {
    temp_env::with_var(config::REFRESH_SECS_VAR, Some("soon"), || {
      assert!(matches!(
        bootstrap(),
        Err(ConfigError::InvalidRefreshInterval(_))
      ));
    });
  }
}
