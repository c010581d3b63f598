//! Growth stage resolution and day-offset arithmetic
//!
//! Stages are derived from whole days elapsed since planting, compared
//! against a crop profile's stage boundaries. Day counts are measured from
//! local midnight of the planting date in the farm's configured UTC offset.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::profiles::CropProfile;

pub const MS_PER_DAY: i64 = 86_400_000;

// ---------------------------------------------------------------------------
/// Growth Stage
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthStage {
    Germination,
    Vegetative,
    Flowering,
    Maturation,
}

impl GrowthStage {
    pub const ALL: [GrowthStage; 4] = [
        GrowthStage::Germination,
        GrowthStage::Vegetative,
        GrowthStage::Flowering,
        GrowthStage::Maturation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Germination => "germination",
            Self::Vegetative => "vegetative",
            Self::Flowering => "flowering",
            Self::Maturation => "maturation",
        }
    }

    /// Capitalized name for activity text
    pub fn title(&self) -> &'static str {
        match self {
            Self::Germination => "Germination",
            Self::Vegetative => "Vegetative",
            Self::Flowering => "Flowering",
            Self::Maturation => "Maturation",
        }
    }
}

impl std::fmt::Display for GrowthStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for GrowthStage {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "germination" => Ok(Self::Germination),
            "vegetative" => Ok(Self::Vegetative),
            "flowering" => Ok(Self::Flowering),
            "maturation" => Ok(Self::Maturation),
            _ => Err(format!("Unknown growth stage: {}", s)),
        }
    }
}

// ---------------------------------------------------------------------------
/// Stage Resolution
// ---------------------------------------------------------------------------

/// Resolve the stage a crop is in after `days_since_planted` days.
///
/// Transitions are applied left to right; each one fires only when the day
/// count is strictly past its threshold. Boundaries are strictly increasing,
/// so the result is monotonic in the day count and anything past the last
/// threshold stays in maturation. Negative counts (planting date in the
/// future) never pass a threshold and resolve to germination.
pub fn resolve_stage(profile: &CropProfile, days_since_planted: i64) -> GrowthStage {
    profile
        .stage_boundaries
        .transitions()
        .into_iter()
        .fold(GrowthStage::Germination, |stage, (threshold, next)| {
            if days_since_planted > i64::from(threshold) {
                next
            } else {
                stage
            }
        })
}

// ---------------------------------------------------------------------------
/// Day Arithmetic
// ---------------------------------------------------------------------------

/// Whole days elapsed since local midnight of `planted`, floored.
/// Negative when the planting date is still ahead.
pub fn days_since_planted(planted: NaiveDate, now: DateTime<Utc>, offset: FixedOffset) -> i64 {
    let local_midnight = planted.and_time(NaiveTime::MIN).and_utc()
        - Duration::seconds(i64::from(offset.local_minus_utc()));
    (now - local_midnight).num_milliseconds().div_euclid(MS_PER_DAY)
}

/// Calendar date of `now` on the farm's wall clock
pub fn local_today(now: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    now.with_timezone(&offset).date_naive()
}

/// Calendar days from today until `harvest`; negative once it has passed
pub fn days_until(harvest: NaiveDate, now: DateTime<Utc>, offset: FixedOffset) -> i64 {
    (harvest - local_today(now, offset)).num_days()
}

// ---------------------------------------------------------------------------
/// Tests
// ---------------------------------------------------------------------------
