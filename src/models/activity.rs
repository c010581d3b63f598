use serde::{Deserialize, Serialize};

use crate::stage::GrowthStage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActivityCategory {
  Irrigation,
  Fertilizer,
  Pest,
  Weeding,
  Monitoring,
  HarvestPrep,
  OverdueHarvest,
}

impl ActivityCategory {
  pub fn as_str(&self) -> &'static str {
    match self {
      ActivityCategory::Irrigation => "irrigation",
      ActivityCategory::Fertilizer => "fertilizer",
      ActivityCategory::Pest => "pest",
      ActivityCategory::Weeding => "weeding",
      ActivityCategory::Monitoring => "monitoring",
      ActivityCategory::HarvestPrep => "harvestPrep",
      ActivityCategory::OverdueHarvest => "overdueHarvest",
    }
  }
}

/// Ordering follows urgency: `Urgent > High > Moderate > Low`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
  Low,
  Moderate,
  High,
  Urgent,
}

/// Growth stage an activity was emitted under.
///
/// `Overdue` is only used by the overdue-harvest alert; `Unknown` when the
/// planting date could not be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageLabel {
  Germination,
  Vegetative,
  Flowering,
  Maturation,
  Overdue,
  Unknown,
}

impl From<GrowthStage> for StageLabel {
  fn from(stage: GrowthStage) -> Self {
    match stage {
      GrowthStage::Germination => StageLabel::Germination,
      GrowthStage::Vegetative => StageLabel::Vegetative,
      GrowthStage::Flowering => StageLabel::Flowering,
      GrowthStage::Maturation => StageLabel::Maturation,
    }
  }
}

impl From<Option<GrowthStage>> for StageLabel {
  fn from(stage: Option<GrowthStage>) -> Self {
    stage.map(StageLabel::from).unwrap_or(StageLabel::Unknown)
  }
}

/// A field task judged due right now. Recomputed on every call, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
  /// Stable for a given (record, day, rule) so the UI can key list items
  pub id: String,
  pub title: String,
  pub description: String,
  pub category: ActivityCategory,
  pub priority: Priority,
  pub time_window: String,
  pub stage: StageLabel,
}
