use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Lifecycle status as stored by the record provider. The engine never reads
/// it for scheduling decisions; it is carried through for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CropStatus {
  #[default]
  Growing,
  Harvested,
  #[serde(other)]
  Unknown,
}

/// A crop registered by the farmer.
///
/// Owned by the record provider. Dates are kept exactly as stored (browser
/// storage may hold either `YYYY-MM-DD` or a full ISO timestamp) and parsed
/// lazily, so a malformed date only disables the rules that depend on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CropRecord {
  pub id: String,
  pub crop_type: String,
  pub planted_date: String,
  #[serde(default)]
  pub harvest_date: Option<String>,
  #[serde(default)]
  pub area_label: String,
  #[serde(default)]
  pub status: CropStatus,
}

impl CropRecord {
  /// Planting date, or None if the stored value is not a date
  pub fn planted_on(&self) -> Option<NaiveDate> {
    parse_record_date(&self.id, "plantedDate", &self.planted_date)
  }

  /// Recorded harvest date, or None if absent or malformed
  pub fn harvest_on(&self) -> Option<NaiveDate> {
    self.harvest_date
      .as_deref()
      .and_then(|raw| parse_record_date(&self.id, "harvestDate", raw))
  }
}

/// Parse a stored date: plain `YYYY-MM-DD` first, then RFC 3339.
/// An RFC 3339 timestamp keeps the calendar date of its own offset.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
  let raw = raw.trim();
  if raw.is_empty() {
    return None;
  }

  NaiveDate::parse_from_str(raw, "%Y-%m-%d")
    .ok()
    .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

fn parse_record_date(record_id: &str, field: &str, raw: &str) -> Option<NaiveDate> {
  let parsed = parse_date(raw);
  if parsed.is_none() && !raw.trim().is_empty() {
    warn!(record_id, field, value = raw, "Ignoring unparseable crop record date");
  }
  parsed
}
