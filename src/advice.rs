//! Stage-specific cultivation tips
//!
//! Two table shapes coexist:
//! - staged: tips per growth stage (most crops)
//! - flat: one list regardless of stage (crops with shallow data)
//!
//! Resolution falls back twice, and the two fallbacks stay distinct:
//! an unknown crop gets the default crop's tips; a known staged crop with
//! no entry for the current stage gets its own vegetative tips.

use std::collections::HashMap;

use tracing::warn;

use crate::models::AdviceTip;
use crate::profiles::CropKey;
use crate::stage::GrowthStage;

/// Stage used when a staged table has no entry for the current stage
const FALLBACK_STAGE: GrowthStage = GrowthStage::Vegetative;

const DEFAULT_CROP: &str = "general";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TipTable {
    Staged(HashMap<GrowthStage, Vec<AdviceTip>>),
    Flat(Vec<AdviceTip>),
}

impl TipTable {
    fn tips_for(&self, stage: GrowthStage) -> Vec<AdviceTip> {
        match self {
            TipTable::Flat(tips) => tips.clone(),
            TipTable::Staged(stages) => stages
                .get(&stage)
                .or_else(|| stages.get(&FALLBACK_STAGE))
                .cloned()
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AdviceBook {
    tables: HashMap<CropKey, TipTable>,
    default_crop: CropKey,
}

impl AdviceBook {
    pub fn new(tables: HashMap<CropKey, TipTable>, default_crop: &str) -> Self {
        Self {
            tables,
            default_crop: CropKey::normalize(default_crop),
        }
    }

    pub fn builtin() -> Self {
        Self::new(builtin_tables(), DEFAULT_CROP)
    }

    /// Tips for a crop at a stage; empty only when every fallback is exhausted
    pub fn stage_tips(&self, crop_type: &str, stage: GrowthStage) -> Vec<AdviceTip> {
        match self.tables.get(&CropKey::normalize(crop_type)) {
            Some(table) => table.tips_for(stage),
            None => {
                warn!(crop_type, "No advice table, using default crop tips");
                self.tables
                    .get(&self.default_crop)
                    .map(|table| table.tips_for(stage))
                    .unwrap_or_default()
            }
        }
    }

    pub fn has_table(&self, crop_type: &str) -> bool {
        self.tables.contains_key(&CropKey::normalize(crop_type))
    }
}

impl Default for AdviceBook {
    fn default() -> Self {
        Self::builtin()
    }
}

// ---------------------------------------------------------------------------
/// Built-in Tables
// ---------------------------------------------------------------------------

fn tips(entries: &[(&str, &str)]) -> Vec<AdviceTip> {
    entries
        .iter()
        .map(|(title, body)| AdviceTip::new(*title, *body))
        .collect()
}

fn staged(entries: Vec<(GrowthStage, Vec<AdviceTip>)>) -> TipTable {
    TipTable::Staged(entries.into_iter().collect())
}

fn builtin_tables() -> HashMap<CropKey, TipTable> {
    use GrowthStage::*;

    let rice = staged(vec![
        (
            Germination,
            tips(&[
                ("Seed treatment", "Soak seed for 24 hours and treat with a fungicide before sowing."),
                ("Nursery water", "Keep the nursery bed saturated but not flooded until seedlings are 2 cm tall."),
            ]),
        ),
        (
            Vegetative,
            tips(&[
                ("Water level", "Maintain 2-5 cm of standing water during tillering."),
                ("Nitrogen top dressing", "Split nitrogen into doses at tillering and panicle initiation."),
                ("Gap filling", "Replace missing hills within two weeks of transplanting."),
            ]),
        ),
        (
            Flowering,
            tips(&[
                ("Critical water stage", "Never let the field dry out during flowering; yield loss is highest now."),
                ("No spraying at anthesis", "Avoid pesticide sprays between 09:00 and 12:00 while flowers are open."),
            ]),
        ),
        (
            Maturation,
            tips(&[
                ("Drain the field", "Drain water 10-15 days before harvest to hasten uniform ripening."),
                ("Harvest timing", "Harvest when 80-85% of grains have turned straw coloured."),
            ]),
        ),
    ]);

    let wheat = staged(vec![
        (
            Germination,
            tips(&[
                ("Sowing depth", "Sow at 4-5 cm depth; deeper sowing delays emergence."),
                ("Pre-sowing irrigation", "Sow into moist soil after a pre-sowing irrigation."),
            ]),
        ),
        (
            Vegetative,
            tips(&[
                ("Crown root irrigation", "The first irrigation at crown root initiation (20-25 days) is the most important."),
                ("Weed control", "Control broadleaf weeds and wild oats before the first node appears."),
            ]),
        ),
        (
            Flowering,
            tips(&[
                ("Irrigate at heading", "Irrigate at heading and flowering; moisture stress reduces grain number."),
                ("Rust watch", "Look for yellow or brown rust pustules on leaves and spray at first sign."),
            ]),
        ),
        (
            Maturation,
            tips(&[
                ("Stop irrigation", "Stop irrigating once grains reach the hard dough stage."),
                ("Harvest moisture", "Harvest when grain moisture falls to around 20%."),
            ]),
        ),
    ]);

    // No flowering entry: resolves to vegetative tips
    let maize = staged(vec![
        (
            Germination,
            tips(&[("Plant population", "Thin to one healthy seedling per hill at 10-12 days.")]),
        ),
        (
            Vegetative,
            tips(&[
                ("Earthing up", "Earth up at knee height to support roots and control weeds."),
                ("Armyworm check", "Inspect leaf whorls for fall armyworm frass every week."),
            ]),
        ),
        (
            Maturation,
            tips(&[("Black layer", "Harvest once kernels show a black layer at the base.")]),
        ),
    ]);

    let tomato = staged(vec![
        (
            Vegetative,
            tips(&[
                ("Staking", "Stake or trellis plants before they start to sprawl."),
                ("Pruning", "Remove suckers below the first flower cluster."),
            ]),
        ),
        (
            Flowering,
            tips(&[
                ("Even watering", "Water evenly to prevent blossom-end rot."),
                ("Calcium", "Apply calcium if earlier fruit showed blossom-end rot."),
            ]),
        ),
    ]);

    let cotton = TipTable::Flat(tips(&[
        ("Bollworm traps", "Install pheromone traps at 5 per hectare to track bollworm activity."),
        ("Avoid waterlogging", "Cotton roots suffer quickly in waterlogged soil; keep drainage channels open."),
        ("Square shedding", "Heavy square shedding points to moisture stress or excess nitrogen."),
    ]));

    let sugarcane = TipTable::Flat(tips(&[
        ("Trash mulching", "Spread dry leaves between rows to save moisture and suppress weeds."),
        ("Propping", "Tie cane clumps together before the monsoon to prevent lodging."),
    ]));

    let potato = TipTable::Flat(tips(&[
        ("Hilling", "Hill up soil around stems to keep tubers covered from light."),
        ("Blight alert", "Spray a protective fungicide when cool, humid weather persists."),
    ]));

    let general = TipTable::Flat(tips(&[
        ("Soil test", "Test soil every season to match fertilizer doses to real needs."),
        ("Scout weekly", "Walk the field once a week and look under leaves for pests and disease."),
        ("Water early", "Irrigate early morning to cut evaporation losses."),
    ]));

    [
        ("rice", rice),
        ("wheat", wheat),
        ("maize", maize),
        ("tomato", tomato),
        ("cotton", cotton),
        ("sugarcane", sugarcane),
        ("potato", potato),
        (DEFAULT_CROP, general),
    ]
    .into_iter()
    .map(|(name, table)| (CropKey::normalize(name), table))
    .collect()
}
