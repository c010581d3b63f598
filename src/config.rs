//! Engine configuration from the environment
//!
//! Hour-of-day windows (irrigation, monitoring) and "today" are evaluated on
//! the farm's wall clock. That clock is an explicit fixed UTC offset here
//! rather than whatever zone the host happens to run in.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{FixedOffset, Offset, Utc};
use thiserror::Error;

use crate::profiles::ProfileError;

/// ---------------------------------------------------------------------------
/// Configuration Constants
/// ---------------------------------------------------------------------------

pub const UTC_OFFSET_VAR: &str = "CROP_CALENDAR_UTC_OFFSET";
pub const REFRESH_SECS_VAR: &str = "CROP_CALENDAR_REFRESH_SECS";
pub const PROFILES_PATH_VAR: &str = "CROP_CALENDAR_PROFILES";

const DEFAULT_REFRESH_SECS: u64 = 3600;

/// ---------------------------------------------------------------------------
/// Error Handling
/// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("Invalid UTC offset '{0}' (expected +HH:MM, -HH:MM or Z)")]
  InvalidOffset(String),

  #[error("Invalid refresh interval '{0}' (expected whole seconds > 0)")]
  InvalidRefreshInterval(String),

  #[error("Failed to load crop profiles from {path}: {message}")]
  ProfileFile { path: String, message: String },

  #[error("Invalid crop profile: {0}")]
  Profile(#[from] ProfileError),
}

/// ---------------------------------------------------------------------------
/// Engine Config
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
  pub utc_offset: FixedOffset,
  pub refresh_interval: Duration,
  /// JSON array of extra crop profiles merged over the built-ins
  pub profiles_path: Option<PathBuf>,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      utc_offset: utc(),
      refresh_interval: Duration::from_secs(DEFAULT_REFRESH_SECS),
      profiles_path: None,
    }
  }
}

impl EngineConfig {
  /// Read configuration from environment variables; unset variables keep defaults
  pub fn from_env() -> Result<Self, ConfigError> {
    let mut config = Self::default();

    if let Some(raw) = non_empty_var(UTC_OFFSET_VAR) {
      config.utc_offset = parse_utc_offset(&raw)?;
    }

    if let Some(raw) = non_empty_var(REFRESH_SECS_VAR) {
      let secs: u64 = raw
        .trim()
        .parse()
        .ok()
        .filter(|s| *s > 0)
        .ok_or_else(|| ConfigError::InvalidRefreshInterval(raw.clone()))?;
      config.refresh_interval = Duration::from_secs(secs);
    }

    config.profiles_path = non_empty_var(PROFILES_PATH_VAR).map(PathBuf::from);

    Ok(config)
  }

  pub fn with_utc_offset(mut self, offset: FixedOffset) -> Self {
    self.utc_offset = offset;
    self
  }

  pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
    self.refresh_interval = interval;
    self
  }
}

fn non_empty_var(name: &str) -> Option<String> {
  env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn utc() -> FixedOffset {
  Utc.fix()
}

/// Parse `Z`, `UTC`, `+05:30`, `-0300` or `+7` into a fixed offset
pub fn parse_utc_offset(raw: &str) -> Result<FixedOffset, ConfigError> {
  let invalid = || ConfigError::InvalidOffset(raw.to_string());
  let s = raw.trim();

  if s.eq_ignore_ascii_case("z") || s.eq_ignore_ascii_case("utc") {
    return Ok(utc());
  }

  let (sign, rest) = match s.as_bytes().first() {
    Some(b'+') => (1, &s[1..]),
    Some(b'-') => (-1, &s[1..]),
    _ => return Err(invalid()),
  };

  let (hours, minutes) = match rest.split_once(':') {
    Some((h, m)) => (h, m),
    None if rest.len() == 4 && rest.is_ascii() => rest.split_at(2),
    None => (rest, "0"),
  };

  let hours: i32 = hours.parse().map_err(|_| invalid())?;
  let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
  if !(0..=14).contains(&hours) || !(0..60).contains(&minutes) {
    return Err(invalid());
  }

  FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
  use super::*;
  use serial_test::serial;

  #[test]
  fn test_parse_utc_offset_forms() {
    assert_eq!(parse_utc_offset("Z").unwrap().local_minus_utc(), 0);
    assert_eq!(parse_utc_offset("utc").unwrap().local_minus_utc(), 0);
    assert_eq!(parse_utc_offset("+05:30").unwrap().local_minus_utc(), 19_800);
    assert_eq!(parse_utc_offset("-0300").unwrap().local_minus_utc(), -10_800);
    assert_eq!(parse_utc_offset("+7").unwrap().local_minus_utc(), 25_200);
  }

  #[test]
  fn test_parse_utc_offset_rejects_garbage() {
    for raw in ["", "05:30", "+25:00", "+05:75", "IST", "+ab:cd"] {
      assert!(
        matches!(parse_utc_offset(raw), Err(ConfigError::InvalidOffset(_))),
        "accepted {:?}",
        raw
      );
    }
  }

  #[test]
  #[serial]
  fn test_from_env_defaults() {
    temp_env::with_vars_unset([UTC_OFFSET_VAR, REFRESH_SECS_VAR, PROFILES_PATH_VAR], || {
      let config = EngineConfig::from_env().unwrap();
      assert_eq!(config, EngineConfig::default());
      assert_eq!(config.refresh_interval, Duration::from_secs(3600));
      assert_eq!(config.utc_offset.local_minus_utc(), 0);
    });
  }

  #[test]
  #[serial]
  fn test_from_env_reads_values() {
    temp_env::with_vars(
      [
        (UTC_OFFSET_VAR, Some("+05:30")),
        (REFRESH_SECS_VAR, Some("600")),
        (PROFILES_PATH_VAR, Some("/tmp/profiles.json")),
      ],
      || {
        let config = EngineConfig::from_env().unwrap();
        assert_eq!(config.utc_offset.local_minus_utc(), 19_800);
        assert_eq!(config.refresh_interval, Duration::from_secs(600));
        assert_eq!(config.profiles_path, Some(PathBuf::from("/tmp/profiles.json")));
      },
    );
  }

  #[test]
  #[serial]
  fn test_from_env_rejects_bad_interval() {
    temp_env::with_vars(
      [(UTC_OFFSET_VAR, None), (REFRESH_SECS_VAR, Some("0"))],
      || {
        let err = EngineConfig::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRefreshInterval(_)));
        assert!(err.to_string().contains("'0'"));
      },
    );
  }

  #[test]
  #[serial]
  fn test_from_env_rejects_bad_offset() {
    temp_env::with_var(UTC_OFFSET_VAR, Some("India"), || {
      assert!(matches!(
        EngineConfig::from_env(),
        Err(ConfigError::InvalidOffset(_))
      ));
    });
  }
}
