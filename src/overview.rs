//! Per-crop snapshot for the display layer
//!
//! `CropEngine` holds the immutable reference tables and the farm clock
//! configuration; every method is a pure projection of (record, now).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::advice::AdviceBook;
use crate::calendar::{project_weeks, Week};
use crate::config::{ConfigError, EngineConfig};
use crate::harvest::{HarvestDurations, HarvestEstimate};
use crate::models::{Activity, AdviceTip, CropRecord};
use crate::profiles::CropProfileRegistry;
use crate::scheduler::ActivityScheduler;
use crate::stage::{days_since_planted, days_until, resolve_stage, GrowthStage};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CropOverview {
    pub crop_id: String,
    pub crop_type: String,
    /// False when the crop fell back to the default profile
    pub known_crop: bool,
    pub days_since_planted: Option<i64>,
    pub stage: Option<GrowthStage>,
    pub days_to_harvest: Option<i64>,
    /// Absent when the planting date is unreadable
    pub harvest_estimate: Option<HarvestEstimate>,
    pub activities: Vec<Activity>,
    pub tips: Vec<AdviceTip>,
    pub weeks: Vec<Week>,
}

impl CropOverview {
    pub fn current_week(&self) -> Option<&Week> {
        let days = self.days_since_planted?;
        let index = u32::try_from(days / 7).ok()?;
        self.weeks.iter().find(|w| w.index == index)
    }
}

#[derive(Debug, Clone)]
pub struct CropEngine {
    profiles: CropProfileRegistry,
    durations: HarvestDurations,
    advice: AdviceBook,
    config: EngineConfig,
}

impl CropEngine {
    /// Built-in tables, plus any profile overrides named by the config
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        let mut profiles = CropProfileRegistry::builtin();
        if let Some(path) = &config.profiles_path {
            let overrides = CropProfileRegistry::load_overrides(path).map_err(|message| {
                ConfigError::ProfileFile {
                    path: path.display().to_string(),
                    message,
                }
            })?;
            profiles = profiles.with_overrides(overrides)?;
        }

        Ok(Self::with_tables(
            profiles,
            HarvestDurations::builtin(),
            AdviceBook::builtin(),
            config,
        ))
    }

    pub fn with_tables(
        profiles: CropProfileRegistry,
        durations: HarvestDurations,
        advice: AdviceBook,
        config: EngineConfig,
    ) -> Self {
        Self {
            profiles,
            durations,
            advice,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn profiles(&self) -> &CropProfileRegistry {
        &self.profiles
    }

    pub fn scheduler(&self) -> ActivityScheduler<'_> {
        ActivityScheduler::new(&self.profiles, self.config.utc_offset)
    }

    /// Current stage, or None if the planting date is unreadable
    pub fn stage(&self, record: &CropRecord, now: DateTime<Utc>) -> Option<GrowthStage> {
        let planted = record.planted_on()?;
        let days = days_since_planted(planted, now, self.config.utc_offset);
        Some(resolve_stage(self.profiles.profile_for(&record.crop_type), days))
    }

    pub fn due_activities(&self, record: &CropRecord, now: DateTime<Utc>) -> Vec<Activity> {
        self.scheduler().due_activities(record, now)
    }

    pub fn stage_tips(&self, crop_type: &str, stage: GrowthStage) -> Vec<AdviceTip> {
        self.advice.stage_tips(crop_type, stage)
    }

    /// Called once when a crop is registered, to suggest its harvest date
    pub fn harvest_window(&self, record: &CropRecord) -> Option<HarvestEstimate> {
        let planted = record.planted_on()?;
        Some(self.durations.compute_window(&record.crop_type, planted))
    }

    pub fn project_weeks(&self, record: &CropRecord) -> Vec<Week> {
        project_weeks(record)
    }

    pub fn overview(&self, record: &CropRecord, now: DateTime<Utc>) -> CropOverview {
        let offset = self.config.utc_offset;
        let profile = self.profiles.profile_for(&record.crop_type);

        let days = record
            .planted_on()
            .map(|planted| days_since_planted(planted, now, offset));
        let stage = days.map(|d| resolve_stage(profile, d));
        let tips = stage
            .map(|s| self.stage_tips(&record.crop_type, s))
            .unwrap_or_default();

        let overview = CropOverview {
            crop_id: record.id.clone(),
            crop_type: record.crop_type.clone(),
            known_crop: self.profiles.is_known(&record.crop_type),
            days_since_planted: days,
            stage,
            days_to_harvest: record.harvest_on().map(|h| days_until(h, now, offset)),
            harvest_estimate: self.harvest_window(record),
            activities: self.due_activities(record, now),
            tips,
            weeks: self.project_weeks(record),
        };

        debug!(
            crop_id = %overview.crop_id,
            stage = ?overview.stage,
            activities = overview.activities.len(),
            weeks = overview.weeks.len(),
            "Built crop overview"
        );

        overview
    }
}

impl Default for CropEngine {
    fn default() -> Self {
        Self::with_tables(
            CropProfileRegistry::builtin(),
            HarvestDurations::builtin(),
            AdviceBook::builtin(),
            EngineConfig::default(),
        )
    }
}
