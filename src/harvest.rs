//! Harvest window estimation
//!
//! Uses its own min/max duration table, independent of the stage
//! boundaries in the profile registry. Unlike the profile lookup, this one
//! fails closed: a crop without a duration entry yields `Unsupported`.

use std::collections::HashMap;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::profiles::CropKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HarvestDuration {
    pub min_days: u32,
    pub max_days: u32,
}

impl HarvestDuration {
    /// None unless `min_days <= max_days`
    pub fn new(min_days: u32, max_days: u32) -> Option<Self> {
        (min_days <= max_days).then_some(Self { min_days, max_days })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HarvestWindow {
    pub earliest: NaiveDate,
    pub latest: NaiveDate,
}

impl HarvestWindow {
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.earliest && date <= self.latest
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HarvestEstimate {
    Window(HarvestWindow),
    /// No duration entry for this crop; the UI shows no window at all
    Unsupported,
}

impl HarvestEstimate {
    pub fn window(&self) -> Option<HarvestWindow> {
        match self {
            HarvestEstimate::Window(w) => Some(*w),
            HarvestEstimate::Unsupported => None,
        }
    }
}

/// Crop duration table
#[derive(Debug, Clone)]
pub struct HarvestDurations {
    entries: HashMap<CropKey, HarvestDuration>,
}

impl HarvestDurations {
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = (&'a str, HarvestDuration)>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(name, d)| (CropKey::normalize(name), d))
                .collect(),
        }
    }

    pub fn builtin() -> Self {
        let table = [
            ("rice", 120, 150),
            ("wheat", 110, 130),
            ("maize", 90, 120),
            ("cotton", 150, 180),
            ("sugarcane", 300, 365),
            ("tomato", 60, 85),
            ("potato", 70, 120),
            ("soybean", 90, 110),
            ("onion", 100, 140),
            ("groundnut", 100, 130),
        ];
        Self::from_entries(
            table
                .into_iter()
                .filter_map(|(name, min, max)| HarvestDuration::new(min, max).map(|d| (name, d))),
        )
    }

    pub fn lookup(&self, crop_type: &str) -> Option<HarvestDuration> {
        self.entries.get(&CropKey::normalize(crop_type)).copied()
    }

    /// Expected harvest window: plain calendar-day additions to the planting date
    pub fn compute_window(&self, crop_type: &str, planted: NaiveDate) -> HarvestEstimate {
        let Some(duration) = self.lookup(crop_type) else {
            return HarvestEstimate::Unsupported;
        };

        let earliest = planted.checked_add_days(Days::new(u64::from(duration.min_days)));
        let latest = planted.checked_add_days(Days::new(u64::from(duration.max_days)));
        match (earliest, latest) {
            (Some(earliest), Some(latest)) => HarvestEstimate::Window(HarvestWindow { earliest, latest }),
            _ => HarvestEstimate::Unsupported,
        }
    }
}

impl Default for HarvestDurations {
    fn default() -> Self {
        Self::builtin()
    }
}
