//! Test utilities and helpers for unit testing
//!
//! This module provides common test infrastructure including:
//! - Mock crop record factories
//! - Date and time helpers

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use crate::models::{CropRecord, CropStatus};

/// ---------------------------------------------------------------------------
/// Mock Data Factories
/// ---------------------------------------------------------------------------

/// Create a growing crop record with id "c1"
pub fn mock_crop_record(crop_type: &str, planted: &str, harvest: Option<&str>) -> CropRecord {
  CropRecord {
    id: "c1".to_string(),
    crop_type: crop_type.to_string(),
    planted_date: planted.to_string(),
    harvest_date: harvest.map(str::to_string),
    area_label: "North plot".to_string(),
    status: CropStatus::Growing,
  }
}

/// ---------------------------------------------------------------------------
/// Time Helpers
/// ---------------------------------------------------------------------------

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
  NaiveDate::from_ymd_opt(year, month, day).expect("valid test date")
}

/// Whole-hour UTC instant
pub fn utc(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Utc> {
  Utc
    .with_ymd_and_hms(year, month, day, hour, 0, 0)
    .single()
    .expect("valid test instant")
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::Timelike;

  #[test]
  fn test_mock_factories_create_valid_data() {
    let record = mock_crop_record("Rice", "2024-01-01", Some("2024-05-01"));
    assert_eq!(record.id, "c1");
    assert_eq!(record.planted_on(), Some(date(2024, 1, 1)));
    assert_eq!(record.harvest_on(), Some(date(2024, 5, 1)));

    let record = mock_crop_record("Rice", "2024-01-01", None);
    assert!(record.harvest_on().is_none());
  }

  #[test]
  fn test_time_helpers() {
    let instant = utc(2024, 2, 29, 23);
    assert_eq!(instant.date_naive(), date(2024, 2, 29));
    assert_eq!(instant.hour(), 23);
  }
}
