//! Week-by-week crop calendar from planting to harvest
//!
//! A coarse, crop-agnostic forward plan. Stages here come from each week's
//! position within the whole lifecycle (quartiles), not from the absolute
//! day boundaries the scheduler uses, and activity categories follow fixed
//! week positions rather than the per-crop offset tables.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::{ActivityCategory, CropRecord};
use crate::stage::GrowthStage;

/// Zero-based week indices that get a fertilizer application
const FERTILIZER_WEEKS: [u32; 3] = [2, 5, 9];

/// Zero-based week indices that get a pest inspection
const PEST_INSPECTION_WEEKS: [u32; 3] = [3, 7, 11];

/// Trailing weeks that always get harvest preparation
const HARVEST_PREP_WEEKS: u32 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Week {
    pub index: u32,
    pub start_date: NaiveDate,
    pub stage: GrowthStage,
    pub activities: Vec<ActivityCategory>,
}

/// Project the weeks between planting and the recorded harvest date.
///
/// Empty when either date is missing or unreadable, or when harvest does not
/// fall after planting.
pub fn project_weeks(record: &CropRecord) -> Vec<Week> {
    let (Some(planted), Some(harvest)) = (record.planted_on(), record.harvest_on()) else {
        return Vec::new();
    };

    let total_days = (harvest - planted).num_days();
    if total_days <= 0 {
        return Vec::new();
    }

    let week_count = ((total_days + 6) / 7) as u32;
    (0..week_count)
        .filter_map(|index| {
            let start_date = planted.checked_add_days(Days::new(u64::from(index) * 7))?;
            Some(Week {
                index,
                start_date,
                stage: stage_by_progress(index, week_count),
                activities: week_activities(index, week_count),
            })
        })
        .collect()
}

fn stage_by_progress(index: u32, week_count: u32) -> GrowthStage {
    let progress = f64::from(index) / f64::from(week_count);
    match progress {
        p if p < 0.25 => GrowthStage::Germination,
        p if p < 0.50 => GrowthStage::Vegetative,
        p if p < 0.75 => GrowthStage::Flowering,
        _ => GrowthStage::Maturation,
    }
}

fn week_activities(index: u32, week_count: u32) -> Vec<ActivityCategory> {
    let mut activities = Vec::new();
    if index % 2 == 1 {
        activities.push(ActivityCategory::Irrigation);
    }
    if FERTILIZER_WEEKS.contains(&index) {
        activities.push(ActivityCategory::Fertilizer);
    }
    if PEST_INSPECTION_WEEKS.contains(&index) {
        activities.push(ActivityCategory::Pest);
    }
    if index + HARVEST_PREP_WEEKS >= week_count {
        activities.push(ActivityCategory::HarvestPrep);
    }
    activities
}
