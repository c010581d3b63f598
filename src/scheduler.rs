//! Due-activity scheduling
//!
//! Given a crop record and the current instant, evaluates a fixed list of
//! independent rules. Each rule emits at most one activity:
//!
//! 1. morning irrigation window
//! 2. evening irrigation window (only with a second irrigation slot)
//! 3. fertilizer day
//! 4. pest control day
//! 5. weeding day
//! 6. afternoon field monitoring
//! 7. harvest preparation (harvest within a week)
//! 8. overdue harvest
//!
//! Matches are collected in rule order, stably ranked by priority and capped
//! at [`MAX_DUE_ACTIVITIES`]. Nothing is cached: the result is a pure
//! function of (record, now, offset).

use chrono::{DateTime, FixedOffset, Timelike, Utc};
use tracing::debug;

use crate::models::{Activity, ActivityCategory, CropRecord, Priority, StageLabel};
use crate::profiles::{pest_focus, CropProfile, CropProfileRegistry};
use crate::stage::{days_since_planted, days_until, resolve_stage, GrowthStage};

pub const MAX_DUE_ACTIVITIES: usize = 5;

/// Width of an irrigation window after its slot hour, inclusive
const IRRIGATION_WINDOW_HOURS: u32 = 2;

/// Afternoon monitoring window, inclusive
const MONITORING_START_HOUR: u32 = 14;
const MONITORING_END_HOUR: u32 = 16;

const HARVEST_PREP_DAYS: i64 = 7;

const NUTRIENT_STAGES: [&str; 3] = ["Nitrogen", "Phosphorus", "Potassium"];

// ---------------------------------------------------------------------------
/// Rule Input
// ---------------------------------------------------------------------------

/// Everything a rule may look at, derived once per evaluation
struct RuleInput<'a> {
    record: &'a CropRecord,
    profile: &'a CropProfile,
    /// None when the planting date is unreadable
    day: Option<(i64, GrowthStage)>,
    hour: u32,
    /// None when the harvest date is missing or unreadable
    days_to_harvest: Option<i64>,
}

type Rule = fn(&RuleInput) -> Option<Activity>;

const RULES: [Rule; 8] = [
    morning_irrigation,
    evening_irrigation,
    fertilizer,
    pest_control,
    weeding,
    daily_monitoring,
    harvest_preparation,
    overdue_harvest,
];

// ---------------------------------------------------------------------------
/// Scheduler
// ---------------------------------------------------------------------------

pub struct ActivityScheduler<'a> {
    profiles: &'a CropProfileRegistry,
    offset: FixedOffset,
}

impl<'a> ActivityScheduler<'a> {
    /// `offset` is the farm's wall clock, used for hour windows and "today"
    pub fn new(profiles: &'a CropProfileRegistry, offset: FixedOffset) -> Self {
        Self { profiles, offset }
    }

    pub fn due_activities(&self, record: &CropRecord, now: DateTime<Utc>) -> Vec<Activity> {
        let profile = self.profiles.profile_for(&record.crop_type);

        let day = record.planted_on().map(|planted| {
            let days = days_since_planted(planted, now, self.offset);
            (days, resolve_stage(profile, days))
        });

        let input = RuleInput {
            record,
            profile,
            day,
            hour: now.with_timezone(&self.offset).hour(),
            days_to_harvest: record
                .harvest_on()
                .map(|harvest| days_until(harvest, now, self.offset)),
        };

        let mut activities: Vec<Activity> = RULES.iter().filter_map(|rule| rule(&input)).collect();
        let matched = activities.len();

        // sort_by is stable, so equal priorities keep rule order
        activities.sort_by(|a, b| b.priority.cmp(&a.priority));
        activities.truncate(MAX_DUE_ACTIVITIES);

        debug!(
            record_id = %record.id,
            crop = %record.crop_type,
            days = ?day.map(|(d, _)| d),
            hour = input.hour,
            matched,
            returned = activities.len(),
            "Evaluated due activities"
        );

        activities
    }
}

/// `hour` lies in `[start, start + width]`, wrapping past midnight
fn within_window(hour: u32, start: u32, width: u32) -> bool {
    (hour + 24 - start % 24) % 24 <= width
}

fn window_label(start: u32, width: u32) -> String {
    format!("{:02}:00-{:02}:00", start % 24, (start + width) % 24)
}

#[allow(clippy::too_many_arguments)]
fn activity(
    input: &RuleInput,
    slug: &str,
    category: ActivityCategory,
    priority: Priority,
    title: String,
    description: String,
    time_window: String,
    stage: StageLabel,
) -> Activity {
    let day = input
        .day
        .map(|(d, _)| d.to_string())
        .unwrap_or_else(|| "x".to_string());
    Activity {
        id: format!("{}-{}-d{}", input.record.id, slug, day),
        title,
        description,
        category,
        priority,
        time_window,
        stage,
    }
}

/// Day count for offset rules; only non-negative days can match an offset
fn offset_index(offsets: &[u32], days: i64) -> Option<usize> {
    let days = u32::try_from(days).ok()?;
    offsets.iter().position(|&o| o == days)
}

// ---------------------------------------------------------------------------
/// Rules
// ---------------------------------------------------------------------------

fn irrigation(
    input: &RuleInput,
    slot: Option<u32>,
    slug: &str,
    label: &str,
    priority: Priority,
) -> Option<Activity> {
    let (days, stage) = input.day?;
    let start = slot?;
    if !within_window(input.hour, start, IRRIGATION_WINDOW_HOURS) {
        return None;
    }

    let plan = &input.profile.irrigation;
    Some(activity(
        input,
        slug,
        ActivityCategory::Irrigation,
        priority,
        format!("{} irrigation", label),
        format!(
            "{} stage, day {}: {}. Apply {}.",
            stage.title(),
            days,
            plan.frequency,
            plan.amount
        ),
        window_label(start, IRRIGATION_WINDOW_HOURS),
        stage.into(),
    ))
}

fn morning_irrigation(input: &RuleInput) -> Option<Activity> {
    let slot = input.profile.irrigation.primary_hour();
    irrigation(input, slot, "irrigation-morning", "Morning", Priority::High)
}

fn evening_irrigation(input: &RuleInput) -> Option<Activity> {
    let slot = input.profile.irrigation.secondary_hour();
    irrigation(input, slot, "irrigation-evening", "Evening", Priority::Moderate)
}

fn fertilizer(input: &RuleInput) -> Option<Activity> {
    let (days, stage) = input.day?;
    let index = offset_index(&input.profile.fertilizer_offsets, days)?;

    // Ordinal of the application, not the day value, picks the nutrient
    let nutrient = NUTRIENT_STAGES.get(index).copied().unwrap_or("Micronutrients");
    Some(activity(
        input,
        "fertilizer",
        ActivityCategory::Fertilizer,
        Priority::High,
        format!("Fertilizer: {}", nutrient),
        format!(
            "Day {}: apply the {} dose ({} of {}) for {} stage.",
            days,
            nutrient.to_lowercase(),
            index + 1,
            input.profile.fertilizer_offsets.len(),
            stage.as_str()
        ),
        "Today".to_string(),
        stage.into(),
    ))
}

fn pest_control(input: &RuleInput) -> Option<Activity> {
    let (days, stage) = input.day?;
    offset_index(&input.profile.pest_control_offsets, days)?;

    Some(activity(
        input,
        "pest",
        ActivityCategory::Pest,
        Priority::High,
        "Pest control".to_string(),
        format!(
            "Day {}: scout the field and treat for {}.",
            days,
            pest_focus(&input.record.crop_type)
        ),
        "Today".to_string(),
        stage.into(),
    ))
}

fn weeding(input: &RuleInput) -> Option<Activity> {
    let (days, stage) = input.day?;
    offset_index(&input.profile.weeding_offsets, days)?;

    Some(activity(
        input,
        "weeding",
        ActivityCategory::Weeding,
        Priority::Moderate,
        "Weeding".to_string(),
        format!(
            "Day {}: remove weeds between rows before they compete for nutrients.",
            days
        ),
        "Today".to_string(),
        stage.into(),
    ))
}

fn daily_monitoring(input: &RuleInput) -> Option<Activity> {
    let (days, stage) = input.day?;
    let width = MONITORING_END_HOUR - MONITORING_START_HOUR;
    if !within_window(input.hour, MONITORING_START_HOUR, width) {
        return None;
    }

    let guidance = match stage {
        GrowthStage::Germination => "Check seedling emergence and fill gaps; look for damping-off.",
        GrowthStage::Vegetative => "Check leaf colour and tillering; yellowing leaves point to nitrogen shortage.",
        GrowthStage::Flowering => "Check flowering and pollination; keep soil moisture steady.",
        GrowthStage::Maturation => "Check grain or fruit fill and colour to judge harvest readiness.",
    };

    Some(activity(
        input,
        "monitoring",
        ActivityCategory::Monitoring,
        Priority::Moderate,
        "Field monitoring".to_string(),
        format!("{} stage, day {}: {}", stage.title(), days, guidance),
        window_label(MONITORING_START_HOUR, width),
        stage.into(),
    ))
}

fn harvest_preparation(input: &RuleInput) -> Option<Activity> {
    let remaining = input.days_to_harvest?;
    if remaining <= 0 || remaining > HARVEST_PREP_DAYS {
        return None;
    }

    Some(activity(
        input,
        "harvest-prep",
        ActivityCategory::HarvestPrep,
        Priority::High,
        "Prepare for harvest".to_string(),
        format!(
            "Harvest is due in {} {}. Arrange labour, bags and transport, and stop irrigation a few days before.",
            remaining,
            if remaining == 1 { "day" } else { "days" }
        ),
        format!("Next {} days", HARVEST_PREP_DAYS),
        input.day.map(|(_, stage)| stage).into(),
    ))
}

fn overdue_harvest(input: &RuleInput) -> Option<Activity> {
    let remaining = input.days_to_harvest?;
    if remaining >= 0 {
        return None;
    }

    let overdue = remaining.abs();
    Some(activity(
        input,
        "harvest-overdue",
        ActivityCategory::OverdueHarvest,
        Priority::Urgent,
        "Harvest overdue".to_string(),
        format!(
            "Harvest is {} {} overdue. Harvest immediately to avoid shattering and quality loss.",
            overdue,
            if overdue == 1 { "day" } else { "days" }
        ),
        "Immediately".to_string(),
        StageLabel::Overdue,
    ))
}

// ---------------------------------------------------------------------------
/// Tests
// ---------------------------------------------------------------------------
