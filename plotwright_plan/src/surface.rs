// Surface sampling: turning heightmaps into per-column surface samples.
//
// A `SurfaceSample` is the topmost block of one column under some elevation
// criterion. A `SurfaceList` is the full set of samples for a region, in
// x-major order, with a column index for O(1) `find`. The filtering helpers
// (`without`, `only`, `not_inside`) return new lists and preserve order.
//
// `SurfaceCache` holds the region-local heightmap and sample list for each
// criterion that has been asked for. Source-provided criteria are sliced out
// of the terrain source's heightmaps; `MotionBlockingNoTrees` is derived here
// by walking down through vegetation (`derive_no_trees_heightmap`). The cache
// is cleared wholesale when the terrain is refreshed.
//
// See also: `terrain.rs` for `TerrainSource` and `HeightMap`, `region.rs`
// which owns the cache, `steepness.rs` and `nav.rs` which consume the
// no-vegetation surface.

use crate::error::PlanError;
use crate::terrain::{HeightMap, TerrainSource};
use crate::types::{BlockId, Column, Coord, Criterion, NON_GROUND_PATTERNS, Size, TREE_PATTERNS};
use plotwright_prng::PlanRng;
use rustc_hash::FxHashMap;
use std::collections::{BTreeMap, BTreeSet};

/// The topmost block of a column under some criterion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SurfaceSample {
    pub coord: Coord,
    pub block: BlockId,
}

impl SurfaceSample {
    pub fn column(&self) -> Column {
        self.coord.column()
    }

    pub fn is_one_of<S: AsRef<str>>(&self, patterns: &[S]) -> bool {
        self.block.is_one_of(patterns)
    }
}

/// Ordered surface samples with at most one sample per column.
#[derive(Clone, Debug, Default)]
pub struct SurfaceList {
    samples: Vec<SurfaceSample>,
    index: FxHashMap<Column, usize>,
}

impl SurfaceList {
    /// Build from samples. A later sample for an already-seen column is
    /// dropped.
    pub fn from_samples(samples: impl IntoIterator<Item = SurfaceSample>) -> Self {
        let mut list = Self::default();
        for sample in samples {
            let column = sample.column();
            if list.index.contains_key(&column) {
                continue;
            }
            list.index.insert(column, list.samples.len());
            list.samples.push(sample);
        }
        list
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SurfaceSample> {
        self.samples.iter()
    }

    pub fn as_slice(&self) -> &[SurfaceSample] {
        &self.samples
    }

    pub fn find(&self, column: Column) -> Option<&SurfaceSample> {
        self.index.get(&column).map(|&i| &self.samples[i])
    }

    pub fn contains(&self, column: Column) -> bool {
        self.index.contains_key(&column)
    }

    /// Keep samples for which `keep` holds.
    pub fn filtered(&self, mut keep: impl FnMut(&SurfaceSample) -> bool) -> SurfaceList {
        SurfaceList::from_samples(self.samples.iter().filter(|s| keep(s)).cloned())
    }

    /// Drop samples whose block matches any pattern.
    pub fn without<S: AsRef<str>>(&self, patterns: &[S]) -> SurfaceList {
        self.filtered(|s| !s.is_one_of(patterns))
    }

    /// Keep only samples whose block matches some pattern.
    pub fn only<S: AsRef<str>>(&self, patterns: &[S]) -> SurfaceList {
        self.filtered(|s| s.is_one_of(patterns))
    }

    /// Drop samples on occupied columns.
    pub fn not_inside(&self, occupied: &BTreeSet<Column>) -> SurfaceList {
        self.filtered(|s| !occupied.contains(&s.column()))
    }

    /// Up to `k` distinct samples chosen uniformly at random.
    pub fn random_elements(&self, rng: &mut PlanRng, k: usize) -> Vec<SurfaceSample> {
        rng.sample_indices(self.samples.len(), k)
            .into_iter()
            .map(|i| self.samples[i].clone())
            .collect()
    }
}

impl<'a> IntoIterator for &'a SurfaceList {
    type Item = &'a SurfaceSample;
    type IntoIter = std::slice::Iter<'a, SurfaceSample>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}

// ---------------------------------------------------------------------------
// Heightmap slicing and derivation
// ---------------------------------------------------------------------------

/// Slice a source heightmap down to the region starting at `start`.
pub fn region_heightmap<T: TerrainSource>(
    source: &T,
    criterion: Criterion,
    start: Coord,
    size: Size,
) -> Result<HeightMap, PlanError> {
    if criterion.is_derived() {
        let no_leaves = region_heightmap(source, Criterion::MotionBlockingNoLeaves, start, size)?;
        return Ok(derive_no_trees_heightmap(source, start, &no_leaves));
    }
    let full = source
        .heightmap(criterion)
        .ok_or_else(|| PlanError::InvalidCriterion(criterion.name().to_string()))?;
    let origin = source.origin();
    full.window(
        start.x - origin.x,
        start.z - origin.z,
        size.x.max(0) as usize,
        size.z.max(0) as usize,
    )
    .ok_or(PlanError::RegionOutOfBounds { start, size })
}

/// Lower each column of a no-leaves heightmap through trunks and vines.
///
/// From the topmost block, descend while the block is non-ground
/// (`air | leaves | log | vine`). The new height is the y of the lowest
/// non-ground block, so the sample lands on real ground. Columns whose top
/// block is already ground are unchanged; a descent that leaves the loaded
/// data keeps the original height.
pub fn derive_no_trees_heightmap<T: TerrainSource>(
    source: &T,
    start: Coord,
    no_leaves: &HeightMap,
) -> HeightMap {
    let mut out = no_leaves.clone();
    for (x, z, h) in no_leaves.iter() {
        let column = Column::new(start.x + x as i32, start.z + z as i32);
        if let Some(ground) = ground_height_below(source, column.at(h - 1)) {
            out.set(x as i32, z as i32, ground);
        }
    }
    out
}

/// The y just above the first ground block at or below `top`, or `None` if
/// the descent runs out of loaded terrain first.
fn ground_height_below<T: TerrainSource>(source: &T, top: Coord) -> Option<i32> {
    let mut y = top.y;
    loop {
        let block = source.block_at(top.with_y(y));
        if block.is_void() {
            return None;
        }
        if !block.is_one_of(&NON_GROUND_PATTERNS) {
            return Some(y + 1);
        }
        y -= 1;
    }
}

/// Samples for every column of a region-local heightmap, x-major.
pub fn surface_from_heightmap<T: TerrainSource>(
    source: &T,
    start: Coord,
    heights: &HeightMap,
) -> SurfaceList {
    SurfaceList::from_samples(heights.iter().map(|(x, z, h)| {
        let coord = Coord::new(start.x + x as i32, h - 1, start.z + z as i32);
        SurfaceSample {
            coord,
            block: source.block_at(coord),
        }
    }))
}

/// Coordinates to clear so that vegetation on the given samples is gone.
///
/// Only samples whose block matches `log | bush | mushroom` are cleared. From
/// each such sample, every block is collected while descending through
/// `air | leaves | log | vine`.
pub fn tree_clearing<'a, T: TerrainSource>(
    source: &T,
    samples: impl IntoIterator<Item = &'a SurfaceSample>,
) -> BTreeSet<Coord> {
    let mut cleared = BTreeSet::new();
    for sample in samples {
        if !sample.is_one_of(&TREE_PATTERNS) {
            continue;
        }
        let mut coord = sample.coord;
        while source.block_at(coord).is_one_of(&NON_GROUND_PATTERNS) {
            cleared.insert(coord);
            coord = coord.shift(0, -1, 0);
        }
    }
    cleared
}

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

/// Per-criterion region heightmaps and surfaces, built on first use.
#[derive(Clone, Debug, Default)]
pub struct SurfaceCache {
    heightmaps: BTreeMap<Criterion, HeightMap>,
    surfaces: BTreeMap<Criterion, SurfaceList>,
}

impl SurfaceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn heightmap<T: TerrainSource>(
        &mut self,
        source: &T,
        criterion: Criterion,
        start: Coord,
        size: Size,
    ) -> Result<&HeightMap, PlanError> {
        if !self.heightmaps.contains_key(&criterion) {
            let map = region_heightmap(source, criterion, start, size)?;
            self.heightmaps.insert(criterion, map);
        }
        self.heightmaps
            .get(&criterion)
            .ok_or_else(|| PlanError::InvalidCriterion(criterion.name().to_string()))
    }

    pub fn surface<T: TerrainSource>(
        &mut self,
        source: &T,
        criterion: Criterion,
        start: Coord,
        size: Size,
    ) -> Result<&SurfaceList, PlanError> {
        if !self.surfaces.contains_key(&criterion) {
            let heights = self.heightmap(source, criterion, start, size)?;
            let list = surface_from_heightmap(source, start, heights);
            self.surfaces.insert(criterion, list);
        }
        self.surfaces
            .get(&criterion)
            .ok_or_else(|| PlanError::InvalidCriterion(criterion.name().to_string()))
    }

    pub fn is_cached(&self, criterion: Criterion) -> bool {
        self.surfaces.contains_key(&criterion)
    }

    pub fn clear(&mut self) {
        self.heightmaps.clear();
        self.surfaces.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::GridTerrain;

    /// 6x6 flat grass at height 64 with an oak at local (2, 2): trunk from
    /// y=64 to y=67, leaves at y=68.
    fn forest() -> GridTerrain {
        let heights = HeightMap::new(6, 6, 64);
        let mut t = GridTerrain::from_heights(Coord::new(0, 0, 0), 96, &heights, "grass_block");
        for y in 64..68 {
            t.set(Coord::new(2, y, 2), "oak_log");
        }
        t.set(Coord::new(2, 68, 2), "oak_leaves");
        t.set(Coord::new(3, 68, 2), "oak_leaves");
        t.set(Coord::new(4, 63, 4), "water");
        t
    }

    #[test]
    fn region_slice_is_offset() {
        let t = forest();
        let start = Coord::new(1, 0, 1);
        let map = region_heightmap(&t, Criterion::WorldSurface, start, Size::new(3, 3)).unwrap();
        assert_eq!(map.get(1, 1), Some(69));
        assert_eq!(map.get(2, 1), Some(69));
        assert_eq!(map.get(0, 0), Some(64));
    }

    #[test]
    fn region_outside_source_is_rejected() {
        let t = forest();
        let err =
            region_heightmap(&t, Criterion::MotionBlocking, Coord::new(4, 0, 4), Size::new(4, 4))
                .unwrap_err();
        assert!(matches!(err, PlanError::RegionOutOfBounds { .. }));
    }

    #[test]
    fn no_trees_descends_to_ground() {
        let t = forest();
        let start = Coord::new(0, 0, 0);
        let size = Size::new(6, 6);
        let no_leaves =
            region_heightmap(&t, Criterion::MotionBlockingNoLeaves, start, size).unwrap();
        assert_eq!(no_leaves.get(2, 2), Some(68));

        let no_trees = region_heightmap(&t, Criterion::MotionBlockingNoTrees, start, size).unwrap();
        assert_eq!(no_trees.get(2, 2), Some(64));
        assert_eq!(no_trees.get(0, 0), Some(64));
        // Leaves alone never raise the no-leaves height.
        assert_eq!(no_trees.get(3, 2), Some(64));
    }

    #[test]
    fn no_trees_keeps_height_when_descent_leaves_data() {
        // A column of logs down to the very bottom of the grid.
        let mut t = GridTerrain::new(Coord::new(0, 0, 0), Size::new(1, 1), 8);
        t.fill_column(0, 0, 3, "spruce_log");
        let no_leaves = t.heightmap(Criterion::MotionBlockingNoLeaves).unwrap().clone();
        let derived = derive_no_trees_heightmap(&t, Coord::new(0, 0, 0), &no_leaves);
        assert_eq!(derived.get(0, 0), Some(4));
    }

    #[test]
    fn surface_samples_sit_on_top_block() {
        let t = forest();
        let mut cache = SurfaceCache::new();
        let surface = cache
            .surface(&t, Criterion::MotionBlockingNoTrees, Coord::new(0, 0, 0), Size::new(6, 6))
            .unwrap();
        assert_eq!(surface.len(), 36);
        let s = surface.find(Column::new(2, 2)).unwrap();
        assert_eq!(s.coord, Coord::new(2, 63, 2));
        assert_eq!(s.block.name(), Some("grass_block"));
        assert!(surface.find(Column::new(6, 0)).is_none());
        // x-major order.
        assert_eq!(surface.as_slice()[1].column(), Column::new(0, 1));
    }

    #[test]
    fn filters_preserve_order() {
        let t = forest();
        let mut cache = SurfaceCache::new();
        let surface = cache
            .surface(&t, Criterion::MotionBlockingNoLeaves, Coord::new(0, 0, 0), Size::new(6, 6))
            .unwrap()
            .clone();
        let dry = surface.without(&["water"]);
        assert_eq!(dry.len(), 35);
        assert!(!dry.contains(Column::new(4, 4)));
        assert_eq!(surface.only(&["water"]).len(), 1);
        assert_eq!(surface.only(&["log"]).len(), 1);

        let occupied: BTreeSet<_> = [Column::new(0, 0), Column::new(5, 5)].into();
        let free = dry.not_inside(&occupied);
        assert_eq!(free.len(), 33);
        assert_eq!(free.as_slice()[0].column(), Column::new(0, 1));
    }

    #[test]
    fn random_elements_are_distinct_members() {
        let t = forest();
        let surface = surface_from_heightmap(
            &t,
            Coord::new(0, 0, 0),
            t.heightmap(Criterion::MotionBlocking).unwrap(),
        );
        let mut rng = PlanRng::new(7);
        let picked = surface.random_elements(&mut rng, 10);
        assert_eq!(picked.len(), 10);
        let columns: BTreeSet<_> = picked.iter().map(|s| s.column()).collect();
        assert_eq!(columns.len(), 10);
        assert!(columns.iter().all(|c| surface.contains(*c)));
        assert_eq!(surface.random_elements(&mut rng, 100).len(), 36);
    }

    #[test]
    fn tree_clearing_walks_down_the_trunk() {
        let t = forest();
        let mut cache = SurfaceCache::new();
        let surface = cache
            .surface(&t, Criterion::MotionBlockingNoLeaves, Coord::new(0, 0, 0), Size::new(6, 6))
            .unwrap();
        let cleared = tree_clearing(&t, surface);
        let expected: BTreeSet<_> = (64..68).map(|y| Coord::new(2, y, 2)).collect();
        assert_eq!(cleared, expected);
    }

    #[test]
    fn cache_clear_forgets_surfaces() {
        let t = forest();
        let mut cache = SurfaceCache::new();
        cache
            .surface(&t, Criterion::MotionBlocking, Coord::new(0, 0, 0), Size::new(6, 6))
            .unwrap();
        assert!(cache.is_cached(Criterion::MotionBlocking));
        cache.clear();
        assert!(!cache.is_cached(Criterion::MotionBlocking));
    }
}
