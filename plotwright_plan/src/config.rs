// Data-driven planner configuration.
//
// All tunable planning parameters live in `PlannerConfig`, grouped into
// nested parameter structs: `SteepnessParams`, `NavParams`, `SiteParams` and
// `RoadParams`. Per-site-type rules (padding override, terrain feature
// affinities, neighbor relations) live in the `preferences` map keyed by
// `SitePreference`. The planner reads every weight and threshold from here
// instead of hard-coding it.
//
// Every struct carries `#[serde(default)]`, so a JSON file only needs the
// fields it wants to change.
//
// See also: `region.rs` which owns the config, `site.rs` for
// `SitePreference` and how rules are resolved per search, `nav.rs` for
// `edge_weight`.
//
// **Critical constraint: determinism.** Config values feed directly into
// scoring and routing. The same config, terrain and seed always produce the
// same plan. Maps are `BTreeMap` so serialized configs are stable.

use crate::error::PlanError;
use crate::site::SitePreference;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Parameter groups
// ---------------------------------------------------------------------------

/// Flatness analysis over the no-vegetation heightmap.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SteepnessParams {
    /// Half-width of the square window summed around each cell. Must be >= 1.
    pub span: u32,
    /// Fraction of the flattest cells promoted to priority candidates.
    pub priority_fraction: f64,
    /// Surface blocks matching any of these get `excluded_sentinel`.
    pub excluded_patterns: Vec<String>,
    pub excluded_sentinel: u64,
}

impl Default for SteepnessParams {
    fn default() -> Self {
        Self {
            span: 2,
            priority_fraction: 0.1,
            excluded_patterns: vec!["water".to_string()],
            excluded_sentinel: 100_000_000,
        }
    }
}

/// Edge weighting for the navigation graph.
///
/// `weight = base_weight + malus' * malus_factor`, where malus is the
/// steepness at the destination and `malus' = min(malus * escalation_factor,
/// escalation_cap)` once malus exceeds `escalation_threshold`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavParams {
    pub base_weight: u64,
    pub malus_factor: u64,
    pub escalation_threshold: u64,
    pub escalation_factor: u64,
    pub escalation_cap: u64,
    /// Weight of an edge that a road already runs along.
    pub reinforced_weight: u64,
}

impl Default for NavParams {
    fn default() -> Self {
        Self {
            base_weight: 100,
            malus_factor: 10,
            escalation_threshold: 20,
            escalation_factor: 100,
            escalation_cap: 100_000,
            reinforced_weight: 10,
        }
    }
}

/// Candidate sampling and footprint scoring.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteParams {
    /// Fraction of the occupiable surface sampled at random per search.
    pub sample_fraction: f64,
    /// Score per block of planar distance from the region center.
    pub distance_factor: f64,
    /// Score per block of foundation (footprint origin above the cell).
    pub raise_factor: f64,
    /// Score per block of digging (footprint origin at or below the cell).
    pub dig_factor: f64,
    /// Occupation padding around a placed footprint.
    pub default_padding: u32,
    /// Placed footprints closer than this count for neighbor relations.
    pub relation_radius: f64,
}

impl Default for SiteParams {
    fn default() -> Self {
        Self {
            sample_fraction: 0.1,
            distance_factor: 0.1,
            raise_factor: 0.8,
            dig_factor: 3.0,
            default_padding: 5,
            relation_radius: 50.0,
        }
    }
}

/// Road smoothing and construction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoadParams {
    /// Chebyshev radius of the road neighborhood averaged by equalization.
    pub equalize_radius: u32,
    /// Blocks cleared above each road surface.
    pub clearance: u32,
    /// Fractional height above which a slab is laid one block higher.
    pub slab_threshold: f64,
}

impl Default for RoadParams {
    fn default() -> Self {
        Self {
            equalize_radius: 5,
            clearance: 4,
            slab_threshold: 0.5,
        }
    }
}

// ---------------------------------------------------------------------------
// Site preferences
// ---------------------------------------------------------------------------

/// Bonus for sites near terrain features, such as water for a dock.
///
/// The score drops by `weight` for every no-leaves surface cell within
/// Chebyshev `radius` of the footprint origin matching one of `patterns`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeatureAffinity {
    pub patterns: Vec<String>,
    pub radius: u32,
    pub weight: f64,
}

/// Per-site-type scoring and occupation rules.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreferenceRule {
    /// Overrides `SiteParams::default_padding` when set.
    pub padding: Option<u32>,
    pub features: Vec<FeatureAffinity>,
    /// Score added when a placed footprint of the keyed kind is nearby. The
    /// largest applicable value wins and the result is floored at zero, so a
    /// negative value has no effect.
    pub relations: BTreeMap<SitePreference, f64>,
}

// ---------------------------------------------------------------------------
// PlannerConfig
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub steepness: SteepnessParams,
    pub nav: NavParams,
    pub site: SiteParams,
    pub roads: RoadParams,
    pub preferences: BTreeMap<SitePreference, PreferenceRule>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        let mut preferences = BTreeMap::new();
        preferences.insert(
            SitePreference::Farm,
            PreferenceRule {
                padding: Some(8),
                ..Default::default()
            },
        );
        preferences.insert(
            SitePreference::Dock,
            PreferenceRule {
                padding: None,
                features: vec![FeatureAffinity {
                    patterns: vec!["water".to_string()],
                    radius: 6,
                    weight: 0.5,
                }],
                relations: BTreeMap::new(),
            },
        );
        preferences.insert(
            SitePreference::Lumber,
            PreferenceRule {
                padding: None,
                features: vec![FeatureAffinity {
                    patterns: vec!["log".to_string(), "leaves".to_string()],
                    radius: 8,
                    weight: 0.2,
                }],
                relations: BTreeMap::from([(SitePreference::Farm, 10.0)]),
            },
        );
        preferences.insert(
            SitePreference::Quarry,
            PreferenceRule {
                padding: Some(6),
                features: vec![FeatureAffinity {
                    patterns: vec!["stone".to_string(), "andesite".to_string()],
                    radius: 6,
                    weight: 0.2,
                }],
                relations: BTreeMap::from([
                    (SitePreference::General, 15.0),
                    (SitePreference::Farm, 15.0),
                ]),
            },
        );
        Self {
            steepness: SteepnessParams::default(),
            nav: NavParams::default(),
            site: SiteParams::default(),
            roads: RoadParams::default(),
            preferences,
        }
    }
}

impl PlannerConfig {
    /// Parse a config from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, PlanError> {
        Ok(serde_json::from_str(json)?)
    }

    /// The rule for a site type, if one is configured.
    pub fn rule(&self, preference: SitePreference) -> Option<&PreferenceRule> {
        self.preferences.get(&preference)
    }

    /// Occupation padding for a site type. The rule's padding beats the
    /// requested one, which beats the default.
    pub fn padding_for(&self, preference: SitePreference, requested: Option<u32>) -> u32 {
        self.rule(preference)
            .and_then(|r| r.padding)
            .or(requested)
            .unwrap_or(self.site.default_padding)
    }
}
