// The planning region: owner of all planner state and the only mutation path.
//
// A `Region` is a rectangle of loaded terrain that structures and roads are
// planned on. It owns the terrain source, the config, the occupied column
// set, the per-criterion surface cache, the steepness field, the nav graph,
// the road network and the list of placed footprints. Callers hold
// `&mut Region` and go through named operations:
//
// - `find_site`: pick the best footprint for a structure, optionally
//   occupying it and fencing it off from future roads.
// - `plan_road`: route between two columns, stamp the road tiers, occupy
//   them and reinforce the path for reuse.
// - `mark_occupied` / `block_graph_edges`: manual exclusions.
// - `equalize_roads` / `build_roads` / `remove_trees` / `build_foundation`:
//   turn the plan into block writes through a `WorldWriter`.
//
// Derived data is cached explicitly. The surface cache fills per criterion
// on demand and is dropped by `refresh_terrain`. The steepness field and
// nav graph are built by `ensure_steepness` / `ensure_graph` and dropped by
// `invalidate_steepness` / `rebuild_graph`. Placing a footprint changes
// occupancy, not elevation, so it does not invalidate steepness. After a
// terrain refresh the caller must rebuild both before further queries.
//
// Blocked columns and planned paths are remembered, so `rebuild_graph`
// re-applies them to the fresh graph.
//
// See also: `site.rs` for scoring, `road.rs` for tier claims,
// `nav.rs`/`pathfinding.rs` for routing, `surface.rs` for the cache.
//
// **Critical constraint: determinism.** Every random choice draws from the
// caller's `PlanRng`; all collections iterate in a fixed order.

use crate::config::PlannerConfig;
use crate::error::PlanError;
use crate::nav::{NavGraph, build_nav_graph};
use crate::palette::{TierPalettes, WeightedPalette};
use crate::pathfinding::astar;
use crate::road::RoadNetwork;
use crate::site::{Footprint, ResolvedPreference, SiteRequest, SiteScorer, merge_candidates};
use crate::steepness::SteepnessField;
use crate::surface::{SurfaceCache, SurfaceList, SurfaceSample, tree_clearing};
use crate::terrain::{HeightMap, TerrainSource, WorldWriter};
use crate::types::{Column, Coord, Criterion, Size, WATER_PATTERNS};
use log::{debug, info};
use plotwright_prng::PlanRng;
use std::collections::{BTreeMap, BTreeSet};

/// The surface roads, steepness and placement all work on.
const GROUND: Criterion = Criterion::MotionBlockingNoTrees;

pub struct Region<T: TerrainSource> {
    terrain: T,
    start: Coord,
    size: Size,
    config: PlannerConfig,
    occupied: BTreeSet<Column>,
    surfaces: SurfaceCache,
    steepness: Option<SteepnessField>,
    graph: Option<NavGraph>,
    /// Columns whose edges were blocked, re-applied on rebuild.
    blocked: BTreeSet<Column>,
    roads: RoadNetwork,
    placed: Vec<Footprint>,
}

fn region_contains(start: Coord, size: Size, column: Column) -> bool {
    (start.x..start.x + size.x).contains(&column.x)
        && (start.z..start.z + size.z).contains(&column.z)
}

impl<T: TerrainSource> Region<T> {
    /// A region of `size` columns starting at `start`. The whole rectangle
    /// must lie inside the terrain source.
    pub fn new(
        terrain: T,
        start: Coord,
        size: Size,
        config: PlannerConfig,
    ) -> Result<Self, PlanError> {
        let far = start.column().shift(size.x - 1, size.z - 1);
        if size.x <= 0
            || size.z <= 0
            || !terrain.contains_column(start.column())
            || !terrain.contains_column(far)
        {
            return Err(PlanError::RegionOutOfBounds { start, size });
        }
        Ok(Self {
            terrain,
            start,
            size,
            config,
            occupied: BTreeSet::new(),
            surfaces: SurfaceCache::new(),
            steepness: None,
            graph: None,
            blocked: BTreeSet::new(),
            roads: RoadNetwork::new(),
            placed: Vec::new(),
        })
    }

    /// A region covering everything the terrain source has loaded.
    pub fn covering(terrain: T, config: PlannerConfig) -> Result<Self, PlanError> {
        let (start, size) = (terrain.origin(), terrain.size());
        Self::new(terrain, start, size, config)
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn start(&self) -> Coord {
        self.start
    }

    pub fn size(&self) -> Size {
        self.size
    }

    /// Central column, rounded toward the start.
    pub fn center(&self) -> Column {
        self.start.column().shift(self.size.x / 2, self.size.z / 2)
    }

    pub fn contains(&self, column: Column) -> bool {
        region_contains(self.start, self.size, column)
    }

    pub fn terrain(&self) -> &T {
        &self.terrain
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn occupied(&self) -> &BTreeSet<Column> {
        &self.occupied
    }

    pub fn is_occupied(&self, column: Column) -> bool {
        self.occupied.contains(&column)
    }

    pub fn roads(&self) -> &RoadNetwork {
        &self.roads
    }

    pub fn placed(&self) -> &[Footprint] {
        &self.placed
    }

    /// The nav graph, if it has been built.
    pub fn graph(&self) -> Option<&NavGraph> {
        self.graph.as_ref()
    }

    /// The steepness field, if it has been computed.
    pub fn steepness(&self) -> Option<&SteepnessField> {
        self.steepness.as_ref()
    }

    // -----------------------------------------------------------------------
    // Terrain and caches
    // -----------------------------------------------------------------------

    pub fn heightmap(&mut self, criterion: Criterion) -> Result<&HeightMap, PlanError> {
        self.surfaces
            .heightmap(&self.terrain, criterion, self.start, self.size)
    }

    pub fn surface(&mut self, criterion: Criterion) -> Result<&SurfaceList, PlanError> {
        self.surfaces
            .surface(&self.terrain, criterion, self.start, self.size)
    }

    /// Swap in fresh terrain and drop every cached surface. Returns the old
    /// terrain. The steepness field and graph are left as they are.
    pub fn refresh_terrain(&mut self, terrain: T) -> T {
        self.surfaces.clear();
        std::mem::replace(&mut self.terrain, terrain)
    }

    fn take_or_compute_steepness(&mut self) -> Result<SteepnessField, PlanError> {
        if let Some(field) = self.steepness.take() {
            return Ok(field);
        }
        let heights = self.heightmap(GROUND)?.clone();
        let surface = self
            .surfaces
            .surface(&self.terrain, GROUND, self.start, self.size)?;
        Ok(SteepnessField::compute(
            &heights,
            surface,
            self.start.column(),
            &self.config.steepness,
        ))
    }

    pub fn ensure_steepness(&mut self) -> Result<&SteepnessField, PlanError> {
        let field = self.take_or_compute_steepness()?;
        let field: &SteepnessField = self.steepness.insert(field);
        Ok(field)
    }

    pub fn invalidate_steepness(&mut self) {
        self.steepness = None;
    }

    /// Build a graph from the current surface and re-apply recorded blocks
    /// and road reinforcements.
    fn build_graph(&mut self) -> Result<NavGraph, PlanError> {
        let field = self.take_or_compute_steepness()?;
        let built = self
            .surfaces
            .surface(&self.terrain, GROUND, self.start, self.size)
            .map(|surface| build_nav_graph(surface, &field, &self.config.nav));
        self.steepness = Some(field);
        let mut graph = built?;

        for &column in &self.blocked {
            graph.block_column(column);
        }
        let weight = self.config.nav.reinforced_weight;
        for path in self.roads.paths() {
            for step in path.windows(2) {
                graph.reinforce(step[0], step[1], weight);
            }
        }
        Ok(graph)
    }

    fn graph_mut(&mut self) -> Result<&mut NavGraph, PlanError> {
        let graph = match self.graph.take() {
            Some(graph) => graph,
            None => self.build_graph()?,
        };
        Ok(self.graph.insert(graph))
    }

    pub fn ensure_graph(&mut self) -> Result<&NavGraph, PlanError> {
        let graph: &NavGraph = self.graph_mut()?;
        Ok(graph)
    }

    /// Drop the graph and build it again from the current terrain.
    pub fn rebuild_graph(&mut self) -> Result<&NavGraph, PlanError> {
        self.graph = None;
        self.ensure_graph()
    }

    // -----------------------------------------------------------------------
    // Occupancy and routing
    // -----------------------------------------------------------------------

    pub fn mark_occupied(&mut self, columns: impl IntoIterator<Item = Column>) {
        self.occupied.extend(columns);
    }

    /// Block every graph edge touching the given columns. Returns the number
    /// of directed edges newly blocked.
    pub fn block_graph_edges(
        &mut self,
        columns: impl IntoIterator<Item = Column>,
    ) -> Result<usize, PlanError> {
        let columns: Vec<Column> = columns.into_iter().collect();
        let graph = self.graph_mut()?;
        let blocked = columns.iter().map(|&c| graph.block_column(c)).sum();
        self.blocked.extend(columns);
        Ok(blocked)
    }

    /// Cheapest surface path between two columns, without recording it.
    pub fn shortest_path(&mut self, start: Column, end: Column) -> Result<Vec<Coord>, PlanError> {
        let graph: &NavGraph = self.graph_mut()?;
        let found = graph
            .node_at(start)
            .zip(graph.node_at(end))
            .and_then(|(a, b)| astar(graph, a, b));
        match found {
            Some(path) => Ok(path
                .nodes
                .iter()
                .map(|&n| graph.node(n).position)
                .collect()),
            None => {
                debug!("no path between {start} and {end}");
                Err(PlanError::NoPath { start, end })
            }
        }
    }

    /// Route a road between the columns of `start` and `end` and record it.
    ///
    /// The path's tier footprint is claimed and occupied, and every step of
    /// the path is reinforced so later roads merge into it.
    pub fn plan_road(&mut self, start: Coord, end: Coord) -> Result<Vec<Coord>, PlanError> {
        let path = self.shortest_path(start.column(), end.column())?;
        let columns: Vec<Column> = path.iter().map(|c| c.column()).collect();

        let weight = self.config.nav.reinforced_weight;
        let graph = self.graph_mut()?;
        for step in columns.windows(2) {
            graph.reinforce(step[0], step[1], weight);
        }

        let (region_start, region_size) = (self.start, self.size);
        let claimed = self
            .roads
            .record_path(&columns, |c| region_contains(region_start, region_size, c));
        self.occupied.extend(claimed.iter().copied());

        info!(
            "planned road {} -> {}: {} cells, {} columns claimed",
            start.column(),
            end.column(),
            path.len(),
            claimed.len()
        );
        Ok(path)
    }

    // -----------------------------------------------------------------------
    // Site search
    // -----------------------------------------------------------------------

    /// Find the best footprint for `request`.
    ///
    /// Candidates are the steepness priority candidates followed by a random
    /// sample of the occupiable surface. Fails with `NoFit` when nothing
    /// scores below the request's max score.
    pub fn find_site(
        &mut self,
        request: &SiteRequest,
        rng: &mut PlanRng,
    ) -> Result<Footprint, PlanError> {
        let max_score = request.effective_max_score();
        self.ensure_graph()?;

        let preference = {
            let no_leaves = self.surfaces.surface(
                &self.terrain,
                Criterion::MotionBlockingNoLeaves,
                self.start,
                self.size,
            )?;
            ResolvedPreference::resolve(
                request.preference,
                &self.config,
                no_leaves,
                self.start.column(),
                self.size,
                &self.placed,
            )
        };

        let occupiable = self
            .surfaces
            .surface(&self.terrain, GROUND, self.start, self.size)?
            .without(&WATER_PATTERNS)
            .not_inside(&self.occupied);
        let sample_count = (occupiable.len() as f64 * self.config.site.sample_fraction) as usize;
        let random = occupiable.random_elements(rng, sample_count);

        self.ensure_steepness()?;
        let priority = self
            .steepness
            .as_ref()
            .map(|field| {
                field.priority_candidates(
                    &occupiable,
                    &self.occupied,
                    self.config.steepness.priority_fraction,
                )
            })
            .unwrap_or_default();
        let priority_count = priority.len();
        let candidates = merge_candidates(priority, random);

        let scorer = SiteScorer {
            surface: &occupiable,
            occupied: &self.occupied,
            center: self.center(),
            params: &self.config.site,
            preference: &preference,
        };
        let best = scorer
            .best(&candidates, request.size, max_score)
            .map(|(sample, score)| (sample.coord, score));

        debug!(
            "checked {} candidates ({} priority) for {}, best score {:?}",
            candidates.len(),
            priority_count,
            request.size,
            best.map(|(_, s)| s)
        );

        let Some((origin, score)) = best else {
            return Err(PlanError::NoFit {
                size: request.size,
                max_score,
            });
        };
        let footprint = Footprint {
            origin,
            size: request.size,
            preference: request.preference,
            score,
        };

        if request.occupy {
            let padding = self.config.padding_for(request.preference, request.padding);
            let columns: Vec<Column> = footprint.columns(padding).collect();
            self.mark_occupied(columns.iter().copied());
            let ground = self
                .surfaces
                .surface(&self.terrain, GROUND, self.start, self.size)?;
            let fenced: Vec<Column> = columns
                .into_iter()
                .filter(|&c| ground.contains(c))
                .filter(|&c| !self.roads.contains(c))
                .collect();
            self.block_graph_edges(fenced)?;
            self.placed.push(footprint.clone());
            info!(
                "placed {:?} footprint {} at {} (score {:.2}, padding {})",
                footprint.preference, footprint.size, footprint.origin, footprint.score, padding
            );
        }

        Ok(footprint)
    }

    // -----------------------------------------------------------------------
    // Building
    // -----------------------------------------------------------------------

    /// Smoothed target height for every road column.
    pub fn equalize_roads(&mut self) -> Result<BTreeMap<Column, f64>, PlanError> {
        let radius = self.config.roads.equalize_radius;
        let surface = self
            .surfaces
            .surface(&self.terrain, GROUND, self.start, self.size)?;
        Ok(self.roads.equalize(surface, radius))
    }

    /// Write the planned roads into the world.
    ///
    /// Each road column is cleared for `clearance` blocks above its
    /// equalized height, its vegetation removed, and then paved from its
    /// tier's floor palette at the equalized height. With a slab palette, a
    /// column whose height has a fractional part above the slab threshold
    /// gets a slab one block higher instead. Returns the number of road
    /// blocks placed.
    pub fn build_roads<W: WorldWriter>(
        &mut self,
        writer: &mut W,
        rng: &mut PlanRng,
        floor: &TierPalettes,
        slab: Option<&TierPalettes>,
    ) -> Result<usize, PlanError> {
        let heights = self.equalize_roads()?;
        let clearance = self.config.roads.clearance as i32;
        let (min_y, max_y) = self.terrain.height_range();

        let mut cleared = 0;
        for (&column, &y) in &heights {
            let base = y.floor() as i32;
            for dy in 1..=clearance {
                let coord = column.at(base + dy);
                if self.contains(column) && (min_y..max_y).contains(&coord.y) {
                    writer.place_block(coord, "air");
                    cleared += 1;
                }
            }
        }

        let road_surface: Vec<SurfaceSample> = {
            let no_leaves = self.surfaces.surface(
                &self.terrain,
                Criterion::MotionBlockingNoLeaves,
                self.start,
                self.size,
            )?;
            heights
                .keys()
                .filter_map(|&c| no_leaves.find(c).cloned())
                .collect()
        };
        let vegetation = self.remove_trees(writer, Some(road_surface.as_slice()))?;

        let threshold = self.config.roads.slab_threshold;
        let mut placed = 0;
        for (&column, &y) in &heights {
            let Some(tier) = self.roads.tier_of(column) else {
                continue;
            };
            let base = y.floor() as i32;
            let slab_palette = slab
                .and_then(|s| s.get(tier))
                .filter(|_| y - y.floor() > threshold);
            let (coord, palette) = match slab_palette {
                Some(palette) => (column.at(base + 1), palette),
                None => match floor.get(tier) {
                    Some(palette) => (column.at(base), palette),
                    None => continue,
                },
            };
            if let Some(block) = palette.choose(rng) {
                writer.place_block(coord, block);
                placed += 1;
            }
        }
        writer.flush();

        info!(
            "built {placed} road blocks ({cleared} cleared above, {vegetation} vegetation removed)"
        );
        Ok(placed)
    }

    /// Clear trees, bushes and mushrooms down to the ground.
    ///
    /// Defaults to the region's whole no-leaves surface. Returns the number
    /// of blocks set to air.
    pub fn remove_trees<W: WorldWriter>(
        &mut self,
        writer: &mut W,
        samples: Option<&[SurfaceSample]>,
    ) -> Result<usize, PlanError> {
        let cleared = match samples {
            Some(samples) => tree_clearing(&self.terrain, samples),
            None => {
                let surface = self.surfaces.surface(
                    &self.terrain,
                    Criterion::MotionBlockingNoLeaves,
                    self.start,
                    self.size,
                )?;
                tree_clearing(&self.terrain, surface)
            }
        };
        for &coord in &cleared {
            writer.place_block(coord, "air");
        }
        writer.flush();
        debug!("removed {} vegetation blocks", cleared.len());
        Ok(cleared.len())
    }

    /// Fill under a footprint from the ground up to its origin height with
    /// blocks drawn from `palette`. Returns the number of blocks placed.
    pub fn build_foundation<W: WorldWriter>(
        &mut self,
        footprint: &Footprint,
        writer: &mut W,
        rng: &mut PlanRng,
        palette: &WeightedPalette,
    ) -> Result<usize, PlanError> {
        let ground = self.surface(GROUND)?;
        let mut placed = 0;
        for column in footprint.columns(0) {
            let Some(sample) = ground.find(column) else {
                continue;
            };
            for y in sample.coord.y..footprint.origin.y {
                if let Some(block) = palette.choose(rng) {
                    writer.place_block(column.at(y), block);
                    placed += 1;
                }
            }
        }
        writer.flush();
        debug!("foundation under {}: {placed} blocks", footprint.origin);
        Ok(placed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::road::RoadTier;
    use crate::site::SitePreference;
    use crate::terrain::RecordingWriter;
    use crate::world::GridTerrain;

    fn flat(size: i32, height: i32) -> GridTerrain {
        let heights = HeightMap::new(size as usize, size as usize, height);
        GridTerrain::from_heights(Coord::new(0, 0, 0), 128, &heights, "grass_block")
    }

    fn region(terrain: GridTerrain) -> Region<GridTerrain> {
        Region::covering(terrain, PlannerConfig::default()).unwrap()
    }

    #[test]
    fn region_must_fit_terrain() {
        let region_at = |start: Coord, size: Size| {
            Region::new(flat(10, 64), start, size, PlannerConfig::default())
        };
        let err = region_at(Coord::new(5, 0, 5), Size::new(6, 2));
        assert!(matches!(err, Err(PlanError::RegionOutOfBounds { .. })));
        assert!(region_at(Coord::new(0, 0, 0), Size::new(0, 2)).is_err());
        assert!(region_at(Coord::new(2, 0, 2), Size::new(8, 8)).is_ok());
    }

    #[test]
    fn caches_are_explicit() {
        let mut r = region(flat(12, 64));
        assert!(r.steepness().is_none());
        assert!(r.graph().is_none());
        r.ensure_graph().unwrap();
        assert!(r.steepness().is_some());
        assert_eq!(r.graph().unwrap().node_count(), 144);
        r.invalidate_steepness();
        assert!(r.steepness().is_none());
        assert!(r.graph().is_some());
        r.ensure_steepness().unwrap();
        assert!(r.steepness().is_some());
    }

    #[test]
    fn refresh_clears_surfaces() {
        let mut r = region(flat(8, 64));
        assert_eq!(r.surface(GROUND).unwrap().find(Column::new(1, 1)).unwrap().coord.y, 63);
        let old = r.refresh_terrain(flat(8, 70));
        assert_eq!(old.size(), Size::new(8, 8));
        assert_eq!(r.surface(GROUND).unwrap().find(Column::new(1, 1)).unwrap().coord.y, 69);
    }

    #[test]
    fn plan_road_claims_and_occupies() {
        let mut r = region(flat(16, 64));
        let path = r.plan_road(Coord::new(2, 63, 8), Coord::new(13, 63, 8)).unwrap();
        assert_eq!(path.first().map(|c| c.column()), Some(Column::new(2, 8)));
        assert_eq!(path.last().map(|c| c.column()), Some(Column::new(13, 8)));
        for c in &path {
            assert_eq!(r.roads().tier_of(c.column()), Some(RoadTier::Inner));
            assert!(r.is_occupied(c.column()));
        }
        for (column, _) in r.roads().iter() {
            assert!(r.contains(column));
            assert!(r.is_occupied(column));
        }
        // The path is now cheap.
        let graph = r.graph().unwrap();
        let e = graph.edge_between(path[0].column(), path[1].column()).unwrap();
        assert_eq!(graph.edge(e).weight, 10);
    }

    #[test]
    fn blocked_columns_survive_rebuild() {
        let mut r = region(flat(10, 64));
        let n = r.block_graph_edges([Column::new(5, 5)]).unwrap();
        assert_eq!(n, 8);
        r.rebuild_graph().unwrap();
        assert_eq!(r.block_graph_edges([Column::new(5, 5)]).unwrap(), 0);
    }

    #[test]
    fn find_site_on_flat_ground_occupies_with_padding() {
        let mut r = region(flat(20, 64));
        let mut rng = PlanRng::new(11);
        let request = SiteRequest::new(Size::new(3, 3)).with_padding(1);
        let f = r.find_site(&request, &mut rng).unwrap();
        assert_eq!(f.origin.y, 63);
        let expected = 0.1 * r.center().distance(f.origin.column());
        assert!((f.score - expected).abs() < 1e-9);
        assert_eq!(r.occupied().len(), 25);
        assert_eq!(r.placed().len(), 1);
        // Edges inside the padded area are blocked.
        let graph = r.graph().unwrap();
        let inside = f.origin.column().shift(1, 1);
        let e = graph.edge_between(inside, inside.shift(1, 0)).unwrap();
        assert!(graph.edge(e).is_blocked());
    }

    #[test]
    fn farm_padding_overrides_request() {
        let mut r = region(flat(40, 64));
        let mut rng = PlanRng::new(5);
        let request = SiteRequest::new(Size::new(4, 4))
            .with_padding(1)
            .with_preference(SitePreference::Farm);
        r.find_site(&request, &mut rng).unwrap();
        assert_eq!(r.occupied().len(), 20 * 20);
    }

    #[test]
    fn unoccupied_search_changes_nothing() {
        let mut r = region(flat(12, 64));
        let mut rng = PlanRng::new(3);
        r.find_site(&SiteRequest::new(Size::new(2, 2)).without_occupying(), &mut rng)
            .unwrap();
        assert!(r.occupied().is_empty());
        assert!(r.placed().is_empty());
    }

    #[test]
    fn remove_trees_clears_trunks() {
        let mut terrain = flat(8, 64);
        for y in 64..69 {
            terrain.set(Coord::new(3, y, 3), "birch_log");
        }
        terrain.set(Coord::new(3, 69, 3), "birch_leaves");
        let mut r = region(terrain);
        let mut w = RecordingWriter::new();
        assert_eq!(r.remove_trees(&mut w, None).unwrap(), 5);
        assert_eq!(w.last_at(Coord::new(3, 64, 3)), Some("air"));
        assert_eq!(w.last_at(Coord::new(3, 63, 3)), None);
        assert_eq!(w.flushes, 1);
    }

    #[test]
    fn foundation_fills_up_to_origin() {
        let heights = HeightMap::from_fn(8, 8, |x, _| 62 + (x as i32 % 3));
        let terrain = GridTerrain::from_heights(Coord::new(0, 0, 0), 128, &heights, "dirt");
        let mut r = region(terrain);
        let footprint = Footprint {
            origin: Coord::new(0, 64, 0),
            size: Size::new(3, 1),
            preference: SitePreference::General,
            score: 0.0,
        };
        let mut w = RecordingWriter::new();
        let mut rng = PlanRng::new(1);
        let palette = WeightedPalette::single("stone_bricks");
        let n = r
            .build_foundation(&footprint, &mut w, &mut rng, &palette)
            .unwrap();
        // Surface y per x: 61, 62, 63.
        assert_eq!(n, 3 + 2 + 1);
        assert_eq!(w.count_matching("stone_bricks"), 6);
        assert_eq!(w.last_at(Coord::new(0, 61, 0)), Some("stone_bricks"));
        assert_eq!(w.last_at(Coord::new(2, 64, 0)), None);
    }

    #[test]
    fn slabs_only_above_the_fraction_threshold() {
        // A one-wide strip with surface y 63, 64, 64. With radius 1 the
        // equalized heights are 63.5, 63.667 and 64.
        let heights = HeightMap::from_fn(1, 3, |_, z| [64, 65, 65][z]);
        let terrain = GridTerrain::from_heights(Coord::new(0, 0, 0), 128, &heights, "dirt");
        let mut config = PlannerConfig::default();
        config.roads.equalize_radius = 1;
        let mut r = Region::covering(terrain, config).unwrap();
        r.plan_road(Coord::new(0, 63, 0), Coord::new(0, 64, 2)).unwrap();

        let equalized = r.equalize_roads().unwrap();
        assert_eq!(equalized[&Column::new(0, 0)], 63.5);
        assert!((equalized[&Column::new(0, 1)] - 191.0 / 3.0).abs() < 1e-12);
        assert_eq!(equalized[&Column::new(0, 2)], 64.0);

        let mut w = RecordingWriter::new();
        let mut rng = PlanRng::new(4);
        let floor = TierPalettes::uniform(WeightedPalette::single("dirt_path"));
        let slab = TierPalettes::uniform(WeightedPalette::single("stone_slab"));
        let placed = r.build_roads(&mut w, &mut rng, &floor, Some(&slab)).unwrap();
        assert_eq!(placed, 3);

        // Exactly one half stays a full block at floor(y).
        assert_eq!(w.last_at(Coord::new(0, 63, 0)), Some("dirt_path"));
        // Above one half: a slab one block up, nothing at floor(y).
        assert_eq!(w.last_at(Coord::new(0, 64, 1)), Some("stone_slab"));
        assert_eq!(w.last_at(Coord::new(0, 63, 1)), None);
        assert_eq!(w.last_at(Coord::new(0, 64, 2)), Some("dirt_path"));
        assert_eq!(w.count_matching("stone_slab"), 1);
        assert_eq!(w.count_matching("dirt_path"), 2);
    }

    #[test]
    fn build_roads_paves_each_road_column() {
        let mut r = region(flat(16, 64));
        r.plan_road(Coord::new(3, 63, 8), Coord::new(12, 63, 8)).unwrap();
        let road_count = r.roads().len();
        let mut w = RecordingWriter::new();
        let mut rng = PlanRng::new(2);
        let floor = TierPalettes::uniform(WeightedPalette::single("dirt_path"));
        let placed = r.build_roads(&mut w, &mut rng, &floor, None).unwrap();
        assert_eq!(placed, road_count);
        assert_eq!(w.last_at(Coord::new(6, 63, 8)), Some("dirt_path"));
        assert_eq!(w.last_at(Coord::new(6, 64, 8)), Some("air"));
        assert_eq!(w.last_at(Coord::new(6, 67, 8)), Some("air"));
        assert_eq!(w.last_at(Coord::new(6, 68, 8)), None);
    }
}
