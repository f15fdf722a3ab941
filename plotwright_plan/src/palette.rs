// Weighted block palettes for roads and foundations.
//
// A `WeightedPalette` maps block names to relative weights; `choose` draws
// one name with probability proportional to its weight. `TierPalettes`
// assigns a palette to each road tier. Both are plain serde types so
// palettes can be shipped alongside the planner config.

use crate::road::RoadTier;
use plotwright_prng::PlanRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightedPalette {
    weights: BTreeMap<String, f64>,
}

impl WeightedPalette {
    pub fn new() -> Self {
        Self::default()
    }

    /// A palette that always yields `block`.
    pub fn single(block: &str) -> Self {
        Self::new().with(block, 1.0)
    }

    pub fn with(mut self, block: &str, weight: f64) -> Self {
        self.weights.insert(block.to_string(), weight);
        self
    }

    /// The default foundation mix.
    pub fn foundation() -> Self {
        Self::new()
            .with("stone_bricks", 75.0)
            .with("diorite", 15.0)
            .with("cobblestone", 10.0)
    }

    pub fn is_empty(&self) -> bool {
        self.weights.values().all(|&w| w <= 0.0)
    }

    /// Draw a block name. `None` when no entry has a positive weight.
    pub fn choose(&self, rng: &mut PlanRng) -> Option<&str> {
        let weights: Vec<f64> = self.weights.values().copied().collect();
        let i = rng.choose_weighted(&weights)?;
        self.weights.keys().nth(i).map(String::as_str)
    }
}

/// One palette per road tier. Tiers without a palette are left unbuilt.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TierPalettes {
    tiers: BTreeMap<RoadTier, WeightedPalette>,
}

impl TierPalettes {
    pub fn new() -> Self {
        Self::default()
    }

    /// The same palette for every tier.
    pub fn uniform(palette: WeightedPalette) -> Self {
        let mut out = Self::new();
        for tier in RoadTier::ALL {
            out.tiers.insert(tier, palette.clone());
        }
        out
    }

    pub fn with(mut self, tier: RoadTier, palette: WeightedPalette) -> Self {
        self.tiers.insert(tier, palette);
        self
    }

    pub fn get(&self, tier: RoadTier) -> Option<&WeightedPalette> {
        self.tiers.get(&tier)
    }
}
