// Road network: three-tier footprint accumulated from planned paths.
//
// Each planned path stamps a footprint around every path cell: `Inner` on
// the cell itself, `Middle` on its 4 neighbors and `Outer` on its 4
// diagonals and the 4 cells two steps out. A column belongs to at most one
// tier. A higher tier is never downgraded; a lower tier is promoted (its use
// count restarts at 1). Within one path, a column already counted for its
// tier is not counted again, so `uses` is the number of paths that needed
// the column at that tier.
//
// `equalize` smooths road heights by averaging the surface over nearby road
// columns, so finished roads do not follow every bump of the terrain.
//
// See also: `region.rs` which plans paths, occupies claimed columns and
// turns the equalized heights into blocks; `palette.rs` for per-tier block
// palettes.

use crate::surface::SurfaceList;
use crate::types::{CARDINAL_OFFSETS, Column};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Road footprint tiers, highest priority first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RoadTier {
    Inner,
    Middle,
    Outer,
}

impl RoadTier {
    pub const ALL: [RoadTier; 3] = [RoadTier::Inner, RoadTier::Middle, RoadTier::Outer];

    /// Whether this tier takes precedence over `other`.
    pub fn outranks(self, other: RoadTier) -> bool {
        self < other
    }

    /// Offsets from a path cell covered by this tier.
    pub fn offsets(self) -> &'static [(i32, i32)] {
        match self {
            RoadTier::Inner => &[(0, 0)],
            RoadTier::Middle => &CARDINAL_OFFSETS,
            RoadTier::Outer => &OUTER_OFFSETS,
        }
    }
}

/// Diagonals, then the cells two steps out along each axis.
const OUTER_OFFSETS: [(i32, i32); 8] = [
    (1, 1),
    (1, -1),
    (-1, 1),
    (-1, -1),
    (2, 0),
    (-2, 0),
    (0, 2),
    (0, -2),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoadCell {
    pub tier: RoadTier,
    pub uses: u32,
}

#[derive(Clone, Debug, Default)]
pub struct RoadNetwork {
    cells: BTreeMap<Column, RoadCell>,
    /// Every recorded path, in planning order.
    paths: Vec<Vec<Column>>,
}

impl RoadNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cell(&self, column: Column) -> Option<RoadCell> {
        self.cells.get(&column).copied()
    }

    pub fn tier_of(&self, column: Column) -> Option<RoadTier> {
        self.cells.get(&column).map(|c| c.tier)
    }

    pub fn contains(&self, column: Column) -> bool {
        self.cells.contains_key(&column)
    }

    /// All road columns with their cells, in column order.
    pub fn iter(&self) -> impl Iterator<Item = (Column, RoadCell)> + '_ {
        self.cells.iter().map(|(&c, &cell)| (c, cell))
    }

    pub fn columns_in(&self, tier: RoadTier) -> impl Iterator<Item = Column> + '_ {
        self.cells
            .iter()
            .filter(move |(_, cell)| cell.tier == tier)
            .map(|(&c, _)| c)
    }

    pub fn paths(&self) -> &[Vec<Column>] {
        &self.paths
    }

    /// Apply the claim rule for one column. `counted` holds the columns
    /// already counted during the current path. Returns whether the column
    /// now holds `tier`.
    fn claim(&mut self, column: Column, tier: RoadTier, counted: &mut BTreeSet<Column>) -> bool {
        match self.cells.get_mut(&column) {
            None => {
                self.cells.insert(column, RoadCell { tier, uses: 1 });
                counted.insert(column);
                true
            }
            Some(cell) if cell.tier.outranks(tier) => false,
            Some(cell) if tier.outranks(cell.tier) => {
                *cell = RoadCell { tier, uses: 1 };
                counted.insert(column);
                true
            }
            Some(cell) => {
                if counted.insert(column) {
                    cell.uses += 1;
                }
                true
            }
        }
    }

    /// Stamp the tier footprint of a path onto the network.
    ///
    /// Columns for which `in_bounds` is false are skipped. Returns every
    /// in-bounds column the footprint touched, in claim order without
    /// duplicates; all of them are road columns afterwards.
    pub fn record_path(
        &mut self,
        path: &[Column],
        mut in_bounds: impl FnMut(Column) -> bool,
    ) -> Vec<Column> {
        let mut counted = BTreeSet::new();
        let mut touched = Vec::new();
        let mut seen = BTreeSet::new();
        for &cell in path {
            for tier in RoadTier::ALL {
                for &(dx, dz) in tier.offsets() {
                    let column = cell.shift(dx, dz);
                    if !in_bounds(column) {
                        continue;
                    }
                    self.claim(column, tier, &mut counted);
                    if seen.insert(column) {
                        touched.push(column);
                    }
                }
            }
        }
        self.paths.push(path.to_vec());
        touched
    }

    /// Smoothed road heights: each road column gets the mean surface y of
    /// the road columns within Chebyshev `radius`, itself included. Columns
    /// with no surface sample anywhere in that window are left out.
    pub fn equalize(&self, surface: &SurfaceList, radius: u32) -> BTreeMap<Column, f64> {
        let radius = radius as i32;
        let mut heights = BTreeMap::new();
        for &road in self.cells.keys() {
            let (sum, count) = road
                .around(radius)
                .filter(|c| self.cells.contains_key(c))
                .filter_map(|c| surface.find(c))
                .fold((0i64, 0u32), |(sum, n), s| (sum + s.coord.y as i64, n + 1));
            if count > 0 {
                heights.insert(road, sum as f64 / count as f64);
            }
        }
        heights
    }
}
