// Site placement search: scoring candidate footprints.
//
// A candidate is a surface sample used as the footprint's origin (its
// minimum x/z corner, at the sample's height). The score is lower for better
// sites and adds up:
//
// 1. `distance_factor` times the planar distance from the region center.
// 2. Per footprint cell, the cost of leveling it to the origin height:
//    `raise_factor * d` when the origin sits `d` blocks above the cell
//    (foundation), `dig_factor * |d|` otherwise (digging). Any cell missing
//    from the occupiable surface, or occupied, rejects the candidate with
//    `REJECTED_SCORE`. Scoring stops as soon as the running score reaches
//    `max_score`.
// 3. A preference adjustment for the requested `SitePreference`: a bonus
//    for nearby terrain features and a penalty (or attraction) from nearby
//    placed footprints. The preference is resolved once per search into a
//    `ResolvedPreference`, whose feature counts come from summed-area tables.
//
// The search keeps the strict minimum over candidates, so the first-seen
// candidate wins ties.
//
// See also: `steepness.rs` for the priority candidates, `region.rs` for the
// `find_site` operation that gathers candidates and occupies the result,
// `config.rs` for `SiteParams` and `PreferenceRule`.

use crate::config::{PlannerConfig, SiteParams};
use crate::surface::{SurfaceList, SurfaceSample};
use crate::types::{Column, Coord, Size};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Score of a candidate that cannot be built at all.
pub const REJECTED_SCORE: f64 = 100_000_000.0;

/// The kind of structure a site is being searched for.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum SitePreference {
    #[default]
    General,
    Farm,
    Dock,
    Lumber,
    Quarry,
}

// ---------------------------------------------------------------------------
// Footprint and request
// ---------------------------------------------------------------------------

/// A chosen rectangular placement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Footprint {
    /// Minimum x/z corner, at the height the structure is built from.
    pub origin: Coord,
    pub size: Size,
    pub preference: SitePreference,
    pub score: f64,
}

impl Footprint {
    /// Every column of the footprint grown by `padding` on each side,
    /// x-major.
    pub fn columns(&self, padding: u32) -> impl Iterator<Item = Column> + use<> {
        let p = padding as i32;
        let origin = self.origin.column();
        let size = self.size;
        (-p..size.x + p).flat_map(move |dx| (-p..size.z + p).map(move |dz| origin.shift(dx, dz)))
    }

    pub fn contains(&self, column: Column) -> bool {
        let dx = column.x - self.origin.x;
        let dz = column.z - self.origin.z;
        (0..self.size.x).contains(&dx) && (0..self.size.z).contains(&dz)
    }

    /// Central column, rounded toward the origin.
    pub fn center(&self) -> Column {
        self.origin
            .column()
            .shift(self.size.x / 2, self.size.z / 2)
    }
}

/// Parameters of one `find_site` call.
#[derive(Clone, Debug, PartialEq)]
pub struct SiteRequest {
    pub size: Size,
    /// Occupation padding; `None` uses the preference rule or the default.
    pub padding: Option<u32>,
    /// Scores at or above this fail; `None` means `size.x * size.z`.
    pub max_score: Option<f64>,
    pub preference: SitePreference,
    /// Whether the chosen footprint is occupied and fenced off from roads.
    pub occupy: bool,
}

impl SiteRequest {
    pub fn new(size: Size) -> Self {
        Self {
            size,
            padding: None,
            max_score: None,
            preference: SitePreference::General,
            occupy: true,
        }
    }

    pub fn with_padding(mut self, padding: u32) -> Self {
        self.padding = Some(padding);
        self
    }

    pub fn with_max_score(mut self, max_score: f64) -> Self {
        self.max_score = Some(max_score);
        self
    }

    pub fn with_preference(mut self, preference: SitePreference) -> Self {
        self.preference = preference;
        self
    }

    pub fn without_occupying(mut self) -> Self {
        self.occupy = false;
        self
    }

    pub fn effective_max_score(&self) -> f64 {
        self.max_score.unwrap_or(self.size.area() as f64)
    }
}

// ---------------------------------------------------------------------------
// Preference resolution
// ---------------------------------------------------------------------------

/// Summed-area table counting surface cells that match a pattern set.
#[derive(Clone, Debug)]
struct MatchCounts {
    start: Column,
    size_x: i32,
    size_z: i32,
    /// (size_x + 1) x (size_z + 1), x-major; entry (x, z) counts matches in
    /// local [0, x) x [0, z).
    table: Vec<u32>,
}

impl MatchCounts {
    fn build(surface: &SurfaceList, start: Column, size: Size, patterns: &[String]) -> Self {
        let (sx, sz) = (size.x.max(0), size.z.max(0));
        let stride = sz as usize + 1;
        let mut table = vec![0u32; (sx as usize + 1) * stride];
        for x in 0..sx {
            for z in 0..sz {
                let hit = surface
                    .find(start.shift(x, z))
                    .is_some_and(|s| s.is_one_of(patterns)) as u32;
                let (i, j) = (x as usize + 1, z as usize + 1);
                table[i * stride + j] = hit + table[(i - 1) * stride + j]
                    + table[i * stride + j - 1]
                    - table[(i - 1) * stride + j - 1];
            }
        }
        Self {
            start,
            size_x: sx,
            size_z: sz,
            table,
        }
    }

    /// Matches within Chebyshev `radius` of `center`, clipped to the region.
    fn count_within(&self, center: Column, radius: i32) -> u32 {
        let x0 = (center.x - radius - self.start.x).clamp(0, self.size_x) as usize;
        let x1 = (center.x + radius + 1 - self.start.x).clamp(0, self.size_x) as usize;
        let z0 = (center.z - radius - self.start.z).clamp(0, self.size_z) as usize;
        let z1 = (center.z + radius + 1 - self.start.z).clamp(0, self.size_z) as usize;
        if x0 >= x1 || z0 >= z1 {
            return 0;
        }
        let stride = self.size_z as usize + 1;
        let at = |x: usize, z: usize| self.table[x * stride + z];
        at(x1, z1) + at(x0, z0) - at(x0, z1) - at(x1, z0)
    }
}

#[derive(Clone, Debug)]
struct ResolvedFeature {
    counts: MatchCounts,
    radius: i32,
    weight: f64,
}

/// A site preference with its config rule applied to the current region.
#[derive(Clone, Debug, Default)]
pub struct ResolvedPreference {
    features: Vec<ResolvedFeature>,
    /// (origin of a placed footprint, relation value toward it).
    neighbors: Vec<(Column, f64)>,
    relation_radius: f64,
}

impl ResolvedPreference {
    /// Resolve `preference` against the region's no-leaves surface and the
    /// footprints placed so far.
    pub fn resolve(
        preference: SitePreference,
        config: &PlannerConfig,
        no_leaves: &SurfaceList,
        start: Column,
        size: Size,
        placed: &[Footprint],
    ) -> Self {
        let Some(rule) = config.rule(preference) else {
            return Self::default();
        };
        let features = rule
            .features
            .iter()
            .map(|f| ResolvedFeature {
                counts: MatchCounts::build(no_leaves, start, size, &f.patterns),
                radius: f.radius as i32,
                weight: f.weight,
            })
            .collect();
        let neighbors = placed
            .iter()
            .filter_map(|p| {
                rule.relations
                    .get(&p.preference)
                    .map(|&value| (p.origin.column(), value))
            })
            .collect();
        Self {
            features,
            neighbors,
            relation_radius: config.site.relation_radius,
        }
    }

    /// Score change for a footprint at `origin`; negative is better.
    pub fn adjustment(&self, origin: Column) -> f64 {
        let bonus: f64 = self
            .features
            .iter()
            .map(|f| f.weight * f.counts.count_within(origin, f.radius) as f64)
            .sum();
        let relation = self
            .neighbors
            .iter()
            .filter(|(c, _)| c.distance(origin) < self.relation_radius)
            .map(|&(_, v)| v)
            .fold(0.0, f64::max);
        relation - bonus
    }
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// Everything a candidate score depends on besides the candidate itself.
pub struct SiteScorer<'a> {
    /// No-vegetation surface without water or occupied columns.
    pub surface: &'a SurfaceList,
    pub occupied: &'a BTreeSet<Column>,
    pub center: Column,
    pub params: &'a SiteParams,
    pub preference: &'a ResolvedPreference,
}

impl SiteScorer<'_> {
    /// Cost of leveling one cell to the origin height.
    pub fn elevation_cost(&self, origin_y: i32, cell_y: i32) -> f64 {
        let d = origin_y - cell_y;
        if d > 0 {
            self.params.raise_factor * d as f64
        } else {
            self.params.dig_factor * d.unsigned_abs() as f64
        }
    }

    pub fn score(&self, origin: Coord, size: Size, max_score: f64) -> f64 {
        let mut score = self.params.distance_factor * self.center.distance(origin.column());
        for dx in 0..size.x {
            for dz in 0..size.z {
                let column = origin.column().shift(dx, dz);
                let Some(cell) = self.surface.find(column) else {
                    return REJECTED_SCORE;
                };
                if self.occupied.contains(&column) {
                    return REJECTED_SCORE;
                }
                score += self.elevation_cost(origin.y, cell.coord.y);
                if score >= max_score {
                    return score;
                }
            }
        }
        score + self.preference.adjustment(origin.column())
    }

    /// The candidate with the strictly lowest score below `max_score`.
    pub fn best<'c>(
        &self,
        candidates: &'c [SurfaceSample],
        size: Size,
        max_score: f64,
    ) -> Option<(&'c SurfaceSample, f64)> {
        let mut best: Option<(&SurfaceSample, f64)> = None;
        let mut min_score = max_score;
        for candidate in candidates {
            let score = self.score(candidate.coord, size, max_score);
            if score < min_score {
                min_score = score;
                best = Some((candidate, score));
            }
        }
        best
    }
}

/// Priority candidates followed by random ones, keeping the first occurrence
/// of each column.
pub fn merge_candidates(
    priority: Vec<SurfaceSample>,
    random: Vec<SurfaceSample>,
) -> Vec<SurfaceSample> {
    let mut seen = BTreeSet::new();
    priority
        .into_iter()
        .chain(random)
        .filter(|s| seen.insert(s.column()))
        .collect()
}
