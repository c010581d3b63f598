//! Crop profile registry
//!
//! Static reference data describing, per crop type:
//! - growth stage boundaries (days after planting)
//! - irrigation timing (one or two hour-of-day slots)
//! - day offsets for fertilizer, pest control and weeding
//!
//! Lookups are case-insensitive and never fail: crops without a profile
//! resolve to the designated default profile.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

// ---------------------------------------------------------------------------
/// Crop Keys
// ---------------------------------------------------------------------------

/// Canonical lookup key for a free-text crop name.
///
/// Trimmed, lowercased, inner whitespace collapsed, and common regional
/// names folded onto their table key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CropKey(String);

impl CropKey {
    pub fn normalize(name: &str) -> Self {
        let collapsed = name
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();

        let canonical = match collapsed.as_str() {
            "paddy" => "rice",
            "corn" => "maize",
            "sugar cane" => "sugarcane",
            "chilli" | "chillies" | "chilies" => "chili",
            other => other,
        };

        Self(canonical.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CropKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
/// Error Handling
// ---------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProfileError {
    #[error("{crop}: stage boundaries must be strictly increasing ({germination}, {vegetative}, {flowering})")]
    BoundariesNotIncreasing {
        crop: String,
        germination: u32,
        vegetative: u32,
        flowering: u32,
    },

    #[error("{crop}: {field} offsets must be a non-empty ascending list")]
    InvalidOffsets { crop: String, field: &'static str },

    #[error("{crop}: irrigation needs one or two time slots, got {count}")]
    IrrigationSlotCount { crop: String, count: usize },

    #[error("{crop}: irrigation hour {hour} is not an hour of the day")]
    IrrigationHour { crop: String, hour: u32 },

    #[error("Crop profile name must not be empty")]
    EmptyName,

    #[error("Duplicate crop profile: {0}")]
    Duplicate(String),
}

// ---------------------------------------------------------------------------
/// Profile Data
// ---------------------------------------------------------------------------

/// Last day (inclusive) of each stage; maturation has no end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageBoundaries {
    pub germination_end: u32,
    pub vegetative_end: u32,
    pub flowering_end: u32,
}

impl StageBoundaries {
    pub fn new(germination_end: u32, vegetative_end: u32, flowering_end: u32) -> Self {
        Self {
            germination_end,
            vegetative_end,
            flowering_end,
        }
    }

    /// Ordered (threshold, stage entered once past it) pairs
    pub fn transitions(&self) -> [(u32, crate::stage::GrowthStage); 3] {
        use crate::stage::GrowthStage;
        [
            (self.germination_end, GrowthStage::Vegetative),
            (self.vegetative_end, GrowthStage::Flowering),
            (self.flowering_end, GrowthStage::Maturation),
        ]
    }

    pub fn is_strictly_increasing(&self) -> bool {
        self.germination_end < self.vegetative_end && self.vegetative_end < self.flowering_end
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IrrigationPlan {
    pub frequency: String,
    /// Hours of day (0-23); first is the morning slot, optional second the evening slot
    pub slots: Vec<u32>,
    pub amount: String,
}

impl IrrigationPlan {
    pub fn primary_hour(&self) -> Option<u32> {
        self.slots.first().copied()
    }

    pub fn secondary_hour(&self) -> Option<u32> {
        self.slots.get(1).copied()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CropProfile {
    pub name: String,
    pub stage_boundaries: StageBoundaries,
    pub irrigation: IrrigationPlan,
    pub fertilizer_offsets: Vec<u32>,
    pub pest_control_offsets: Vec<u32>,
    pub weeding_offsets: Vec<u32>,
}

impl CropProfile {
    pub fn key(&self) -> CropKey {
        CropKey::normalize(&self.name)
    }

    /// Check the invariants every profile must hold
    pub fn validate(&self) -> Result<(), ProfileError> {
        if self.name.trim().is_empty() {
            return Err(ProfileError::EmptyName);
        }

        let b = &self.stage_boundaries;
        if !b.is_strictly_increasing() {
            return Err(ProfileError::BoundariesNotIncreasing {
                crop: self.name.clone(),
                germination: b.germination_end,
                vegetative: b.vegetative_end,
                flowering: b.flowering_end,
            });
        }

        for (field, offsets) in [
            ("fertilizer", &self.fertilizer_offsets),
            ("pest control", &self.pest_control_offsets),
            ("weeding", &self.weeding_offsets),
        ] {
            let ascending = offsets.windows(2).all(|w| w[0] < w[1]);
            if offsets.is_empty() || !ascending {
                return Err(ProfileError::InvalidOffsets {
                    crop: self.name.clone(),
                    field,
                });
            }
        }

        let slots = &self.irrigation.slots;
        if slots.is_empty() || slots.len() > 2 {
            return Err(ProfileError::IrrigationSlotCount {
                crop: self.name.clone(),
                count: slots.len(),
            });
        }
        if let Some(&hour) = slots.iter().find(|&&h| h > 23) {
            return Err(ProfileError::IrrigationHour {
                crop: self.name.clone(),
                hour,
            });
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
/// Registry
// ---------------------------------------------------------------------------

/// Immutable crop profile table, built once and passed by reference
#[derive(Debug, Clone)]
pub struct CropProfileRegistry {
    profiles: HashMap<CropKey, CropProfile>,
    default: CropProfile,
}

impl CropProfileRegistry {
    /// Build a registry from explicit profiles; every profile is validated
    pub fn new(profiles: Vec<CropProfile>, default: CropProfile) -> Result<Self, ProfileError> {
        default.validate()?;
        let mut registry = Self {
            profiles: HashMap::new(),
            default,
        };
        for profile in profiles {
            let key = profile.key();
            profile.validate()?;
            if registry.profiles.insert(key.clone(), profile).is_some() {
                return Err(ProfileError::Duplicate(key.to_string()));
            }
        }
        Ok(registry)
    }

    /// The built-in reference table
    pub fn builtin() -> Self {
        let profiles = builtin_profiles()
            .into_iter()
            .map(|p| (p.key(), p))
            .collect();
        Self {
            profiles,
            default: default_profile(),
        }
    }

    /// Return a copy with `overrides` merged over the existing entries
    pub fn with_overrides(&self, overrides: Vec<CropProfile>) -> Result<Self, ProfileError> {
        let mut merged = self.clone();
        for profile in overrides {
            profile.validate()?;
            merged.profiles.insert(profile.key(), profile);
        }
        Ok(merged)
    }

    /// Parse a JSON array of profiles (the same shape the registry serializes)
    pub fn load_overrides(path: &Path) -> Result<Vec<CropProfile>, String> {
        let raw = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
        serde_json::from_str(&raw).map_err(|e| e.to_string())
    }

    /// Exact lookup; None when the crop has no profile of its own
    pub fn lookup(&self, crop_type: &str) -> Option<&CropProfile> {
        self.profiles.get(&CropKey::normalize(crop_type))
    }

    pub fn is_known(&self, crop_type: &str) -> bool {
        self.lookup(crop_type).is_some()
    }

    /// Profile for the crop, falling back to the default profile
    pub fn profile_for(&self, crop_type: &str) -> &CropProfile {
        match self.lookup(crop_type) {
            Some(profile) => profile,
            None => {
                warn!(crop_type, "No crop profile, using default");
                &self.default
            }
        }
    }

    pub fn default_profile(&self) -> &CropProfile {
        &self.default
    }

    pub fn profiles(&self) -> impl Iterator<Item = &CropProfile> {
        self.profiles.values()
    }
}

impl Default for CropProfileRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Pest pressure to watch for, keyed by crop
pub fn pest_focus(crop_type: &str) -> &'static str {
    match CropKey::normalize(crop_type).as_str() {
        "rice" => "stem borers, leaf folders and brown planthoppers",
        "wheat" => "aphids, termites and rust",
        "maize" => "fall armyworm and stem borers",
        "cotton" => "bollworms, whiteflies and jassids",
        "sugarcane" => "early shoot borers and termites",
        "tomato" => "fruit borers, whiteflies and leaf miners",
        "potato" => "aphids, cutworms and late blight",
        "chili" => "thrips, mites and fruit rot",
        _ => "common pests",
    }
}

// ---------------------------------------------------------------------------
/// Built-in Tables
// ---------------------------------------------------------------------------

#[allow(clippy::too_many_arguments)]
fn profile(
    name: &str,
    boundaries: (u32, u32, u32),
    frequency: &str,
    slots: &[u32],
    amount: &str,
    fertilizer: &[u32],
    pest: &[u32],
    weeding: &[u32],
) -> CropProfile {
    CropProfile {
        name: name.to_string(),
        stage_boundaries: StageBoundaries::new(boundaries.0, boundaries.1, boundaries.2),
        irrigation: IrrigationPlan {
            frequency: frequency.to_string(),
            slots: slots.to_vec(),
            amount: amount.to_string(),
        },
        fertilizer_offsets: fertilizer.to_vec(),
        pest_control_offsets: pest.to_vec(),
        weeding_offsets: weeding.to_vec(),
    }
}

fn builtin_profiles() -> Vec<CropProfile> {
    vec![
        profile(
            "Rice",
            (14, 45, 75),
            "Keep fields flooded, top up daily",
            &[6, 17],
            "2-5 cm standing water",
            &[15, 30, 45, 65],
            &[20, 40, 60],
            &[20, 40],
        ),
        profile(
            "Wheat",
            (10, 40, 80),
            "Every 20-25 days at critical stages",
            &[7],
            "5-6 cm per irrigation",
            &[21, 42, 63],
            &[30, 60],
            &[25, 45],
        ),
        profile(
            "Maize",
            (10, 35, 65),
            "Every 7-10 days",
            &[6, 18],
            "4-5 cm per irrigation",
            &[20, 40, 60],
            &[15, 35, 55],
            &[20, 40],
        ),
        profile(
            "Cotton",
            (12, 50, 100),
            "Every 10-15 days",
            &[6, 17],
            "5-7 cm per irrigation",
            &[30, 60, 90],
            &[25, 50, 75, 100],
            &[20, 40, 60],
        ),
        profile(
            "Sugarcane",
            (30, 120, 270),
            "Every 7-10 days in summer, 15 days in winter",
            &[6],
            "7-8 cm per irrigation",
            &[30, 90, 150],
            &[60, 120, 180],
            &[30, 60, 90],
        ),
        profile(
            "Tomato",
            (7, 30, 60),
            "Every 3-4 days",
            &[7, 17],
            "Drip, 2-3 litres per plant",
            &[10, 25, 40, 55],
            &[15, 30, 45, 60],
            &[15, 30],
        ),
        profile(
            "Potato",
            (12, 35, 70),
            "Every 7-10 days, light and frequent",
            &[7],
            "3-4 cm per irrigation",
            &[25, 45],
            &[30, 50, 70],
            &[20, 35],
        ),
        profile(
            "Chili",
            (10, 40, 80),
            "Every 5-7 days",
            &[6, 17],
            "Drip, 1-2 litres per plant",
            &[20, 45, 70],
            &[25, 50, 75],
            &[20, 40],
        ),
    ]
}

fn default_profile() -> CropProfile {
    profile(
        "Default",
        (14, 45, 75),
        "Every 5-7 days",
        &[6, 17],
        "As needed to keep soil moist",
        &[15, 30, 45],
        &[20, 40, 60],
        &[20, 40],
    )
}

// ---------------------------------------------------------------------------
/// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_profiles_are_valid() {
        let registry = CropProfileRegistry::builtin();
        for profile in registry.profiles() {
            assert_eq!(profile.validate(), Ok(()), "{} failed validation", profile.name);
        }
        assert_eq!(registry.default_profile().validate(), Ok(()));
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let registry = CropProfileRegistry::builtin();
        assert_eq!(registry.profile_for("RICE").name, "Rice");
        assert_eq!(registry.profile_for("  rice ").name, "Rice");
        assert_eq!(registry.profile_for("Paddy").name, "Rice");
        assert_eq!(registry.profile_for("corn").name, "Maize");
        assert_eq!(registry.profile_for("Sugar   Cane").name, "Sugarcane");
    }

    #[test]
    fn test_unknown_crop_uses_default_profile() {
        let registry = CropProfileRegistry::builtin();
        assert!(!registry.is_known("Unobtainium"));
        assert_eq!(registry.profile_for("Unobtainium").name, "Default");
        assert_eq!(registry.profile_for("").name, "Default");
    }

    #[test]
    fn test_rice_reference_values() {
        let registry = CropProfileRegistry::builtin();
        let rice = registry.profile_for("rice");
        assert_eq!(rice.stage_boundaries.germination_end, 14);
        assert_eq!(rice.fertilizer_offsets, vec![15, 30, 45, 65]);
        assert_eq!(rice.irrigation.primary_hour(), Some(6));
        assert_eq!(rice.irrigation.secondary_hour(), Some(17));

        let wheat = registry.profile_for("wheat");
        assert_eq!(wheat.irrigation.secondary_hour(), None);
    }

    #[test]
    fn test_validate_rejects_bad_boundaries() {
        let mut p = default_profile();
        p.stage_boundaries = StageBoundaries::new(20, 20, 60);
        assert!(matches!(
            p.validate(),
            Err(ProfileError::BoundariesNotIncreasing { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_empty_or_unsorted_offsets() {
        let mut p = default_profile();
        p.weeding_offsets.clear();
        assert_eq!(
            p.validate(),
            Err(ProfileError::InvalidOffsets {
                crop: "Default".to_string(),
                field: "weeding"
            })
        );

        let mut p = default_profile();
        p.fertilizer_offsets = vec![30, 15];
        assert!(matches!(p.validate(), Err(ProfileError::InvalidOffsets { .. })));
    }

    #[test]
    fn test_validate_rejects_bad_irrigation() {
        let mut p = default_profile();
        p.irrigation.slots = vec![6, 12, 18];
        assert!(matches!(
            p.validate(),
            Err(ProfileError::IrrigationSlotCount { count: 3, .. })
        ));

        let mut p = default_profile();
        p.irrigation.slots = vec![24];
        assert!(matches!(
            p.validate(),
            Err(ProfileError::IrrigationHour { hour: 24, .. })
        ));
    }

    #[test]
    fn test_new_rejects_duplicates() {
        let result = CropProfileRegistry::new(
            vec![default_profile(), default_profile()],
            default_profile(),
        );
        assert_eq!(result.unwrap_err(), ProfileError::Duplicate("default".to_string()));
    }

    #[test]
    fn test_overrides_add_and_replace() {
        let registry = CropProfileRegistry::builtin();
        let mut millet = default_profile();
        millet.name = "Millet".to_string();
        let mut rice = registry.profile_for("rice").clone();
        rice.fertilizer_offsets = vec![10, 20];

        let merged = registry.with_overrides(vec![millet, rice]).unwrap();
        assert!(merged.is_known("millet"));
        assert_eq!(merged.profile_for("Rice").fertilizer_offsets, vec![10, 20]);
        // Base registry untouched
        assert_eq!(registry.profile_for("Rice").fertilizer_offsets, vec![15, 30, 45, 65]);
    }

    #[test]
    fn test_profile_json_shape() {
        let registry = CropProfileRegistry::builtin();
        let json = serde_json::to_value(registry.profile_for("wheat")).unwrap();
        assert_eq!(json["stageBoundaries"]["germinationEnd"], 10);
        assert_eq!(json["irrigation"]["slots"], serde_json::json!([7]));
        assert_eq!(json["pestControlOffsets"], serde_json::json!([30, 60]));
    }

    #[test]
    fn test_pest_focus_fallback() {
        assert_eq!(pest_focus("Cotton"), "bollworms, whiteflies and jassids");
        assert_eq!(pest_focus("Paddy"), "stem borers, leaf folders and brown planthoppers");
        assert_eq!(pest_focus("Quinoa"), "common pests");
    }
}
