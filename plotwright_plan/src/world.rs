// Dense in-memory block grid implementing both terrain collaborator traits.
//
// `GridTerrain` stores a box of blocks as a flat `Vec<u16>` of palette
// indices, indexed by `x + z * size_x + y * size_x * size_z` in local
// coordinates, giving O(1) read/write access. Palette index 0 is always
// `air`. Out-of-bounds reads return `BlockId::Void`; out-of-bounds writes are
// no-ops.
//
// The four source-provided heightmaps are maintained eagerly: every write
// rescans the touched column, so `heightmap()` can hand out references.
//
// It stands in for a real game connection in tests and benches, and is handy
// for offline planning over exported terrain.
//
// See also: `terrain.rs` for the traits, `surface.rs` for the planner-side
// derived heightmap that is deliberately *not* computed here.

use crate::terrain::{HeightMap, TerrainSource, WorldWriter};
use crate::types::{BlockId, Coord, Criterion, Size};
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;

/// Plants and fixtures you can walk through.
const PASSABLE_PATTERNS: [&str; 7] = [
    "vine", "sapling", "flower", "fern", "torch", "dandelion", "poppy",
];

fn is_air(name: &str) -> bool {
    matches!(
        name.strip_prefix("minecraft:").unwrap_or(name),
        "air" | "cave_air" | "void_air"
    )
}

fn is_fluid(name: &str) -> bool {
    name.contains("water") || name.contains("lava")
}

fn blocks_motion(name: &str) -> bool {
    !is_air(name)
        && !is_fluid(name)
        && !name.ends_with("grass")
        && !PASSABLE_PATTERNS.iter().any(|p| name.contains(p))
}

/// Whether a block terminates the downward scan for a heightmap criterion.
fn counts_as_surface(criterion: Criterion, name: &str) -> bool {
    if is_air(name) {
        return false;
    }
    match criterion {
        Criterion::WorldSurface => true,
        Criterion::OceanFloor => blocks_motion(name),
        Criterion::MotionBlocking => blocks_motion(name) || is_fluid(name),
        Criterion::MotionBlockingNoLeaves => {
            (blocks_motion(name) || is_fluid(name)) && !name.contains("leaves")
        }
        Criterion::MotionBlockingNoTrees => false,
    }
}

/// Dense block grid anchored at a world-space origin.
#[derive(Clone, Debug)]
pub struct GridTerrain {
    origin: Coord,
    size_x: u32,
    size_y: u32,
    size_z: u32,
    /// Flat storage of palette indices: x + z * size_x + y * size_x * size_z.
    blocks: Vec<u16>,
    palette: Vec<String>,
    palette_index: FxHashMap<String, u16>,
    heightmaps: BTreeMap<Criterion, HeightMap>,
}

impl GridTerrain {
    /// A grid of `air` whose lowest corner is `origin`.
    pub fn new(origin: Coord, size: Size, size_y: u32) -> Self {
        let size_x = size.x.max(0) as u32;
        let size_z = size.z.max(0) as u32;
        let total = size_x as usize * size_y as usize * size_z as usize;
        let mut palette_index = FxHashMap::default();
        palette_index.insert("air".to_string(), 0);
        let heightmaps = Criterion::SOURCE_PROVIDED
            .into_iter()
            .map(|c| (c, HeightMap::new(size_x as usize, size_z as usize, origin.y)))
            .collect();
        Self {
            origin,
            size_x,
            size_y,
            size_z,
            blocks: vec![0; total],
            palette: vec!["air".to_string()],
            palette_index,
            heightmaps,
        }
    }

    /// Build terrain from a heightmap: each column is filled with `ground`
    /// from the bottom up to `height - 1`.
    pub fn from_heights(origin: Coord, size_y: u32, heights: &HeightMap, ground: &str) -> Self {
        let size = Size::new(heights.size_x() as i32, heights.size_z() as i32);
        let mut terrain = Self::new(origin, size, size_y);
        let ground_id = terrain.intern(ground);
        for (x, z, h) in heights.iter() {
            let top = (h - origin.y).clamp(0, size_y as i32);
            for y in 0..top {
                let i = terrain.flat_index(x as u32, y as u32, z as u32);
                terrain.blocks[i] = ground_id;
            }
            terrain.rescan_column(x as u32, z as u32);
        }
        terrain
    }

    fn intern(&mut self, name: &str) -> u16 {
        if let Some(&id) = self.palette_index.get(name) {
            return id;
        }
        let id = self.palette.len() as u16;
        self.palette.push(name.to_string());
        self.palette_index.insert(name.to_string(), id);
        id
    }

    fn flat_index(&self, x: u32, y: u32, z: u32) -> usize {
        let sx = self.size_x as usize;
        let sz = self.size_z as usize;
        x as usize + z as usize * sx + y as usize * sx * sz
    }

    /// Local (x, y, z) for a world coordinate, or `None` out of bounds.
    fn local(&self, coord: Coord) -> Option<(u32, u32, u32)> {
        let x = coord.x - self.origin.x;
        let y = coord.y - self.origin.y;
        let z = coord.z - self.origin.z;
        if x < 0 || y < 0 || z < 0 {
            return None;
        }
        let (x, y, z) = (x as u32, y as u32, z as u32);
        (x < self.size_x && y < self.size_y && z < self.size_z).then_some((x, y, z))
    }

    pub fn in_bounds(&self, coord: Coord) -> bool {
        self.local(coord).is_some()
    }

    /// Write a block. No-op for out-of-bounds coordinates.
    pub fn set(&mut self, coord: Coord, block: &str) {
        let Some((x, y, z)) = self.local(coord) else {
            return;
        };
        let id = self.intern(block);
        let i = self.flat_index(x, y, z);
        if self.blocks[i] != id {
            self.blocks[i] = id;
            self.rescan_column(x, z);
        }
    }

    /// Fill a column with `block` from the bottom of the grid up to and
    /// including `top_y`.
    pub fn fill_column(&mut self, x: i32, z: i32, top_y: i32, block: &str) {
        for y in self.origin.y..=top_y {
            self.set(Coord::new(x, y, z), block);
        }
    }

    /// Recompute every source heightmap for one local column.
    fn rescan_column(&mut self, x: u32, z: u32) {
        for criterion in Criterion::SOURCE_PROVIDED {
            let mut height = self.origin.y;
            for y in (0..self.size_y).rev() {
                let name = &self.palette[self.blocks[self.flat_index(x, y, z)] as usize];
                if counts_as_surface(criterion, name) {
                    height = self.origin.y + y as i32 + 1;
                    break;
                }
            }
            if let Some(map) = self.heightmaps.get_mut(&criterion) {
                map.set(x as i32, z as i32, height);
            }
        }
    }
}

impl TerrainSource for GridTerrain {
    fn origin(&self) -> Coord {
        self.origin
    }

    fn size(&self) -> Size {
        Size::new(self.size_x as i32, self.size_z as i32)
    }

    fn height_range(&self) -> (i32, i32) {
        (self.origin.y, self.origin.y + self.size_y as i32)
    }

    fn heightmap(&self, criterion: Criterion) -> Option<&HeightMap> {
        self.heightmaps.get(&criterion)
    }

    fn block_at(&self, coord: Coord) -> BlockId {
        match self.local(coord) {
            Some((x, y, z)) => {
                let index = self.blocks[self.flat_index(x, y, z)] as usize;
                BlockId::named(self.palette[index].as_str())
            }
            None => BlockId::Void,
        }
    }
}

impl WorldWriter for GridTerrain {
    fn place_block(&mut self, coord: Coord, block: &str) {
        self.set(coord, block);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_terrain() -> GridTerrain {
        let heights = HeightMap::new(4, 4, 64);
        GridTerrain::from_heights(Coord::new(100, 0, 200), 128, &heights, "grass_block")
    }

    #[test]
    fn from_heights_sets_surface() {
        let t = small_terrain();
        assert_eq!(t.block_at(Coord::new(100, 63, 200)).name(), Some("grass_block"));
        assert_eq!(t.block_at(Coord::new(100, 64, 200)).name(), Some("air"));
        for c in Criterion::SOURCE_PROVIDED {
            assert_eq!(t.heightmap(c).unwrap().get(3, 3), Some(64));
        }
        assert!(t.heightmap(Criterion::MotionBlockingNoTrees).is_none());
    }

    #[test]
    fn out_of_bounds_read_is_void() {
        let t = small_terrain();
        assert!(t.block_at(Coord::new(99, 63, 200)).is_void());
        assert!(t.block_at(Coord::new(100, -1, 200)).is_void());
        assert!(t.block_at(Coord::new(100, 128, 200)).is_void());
        assert!(t.block_at(Coord::new(104, 10, 203)).is_void());
    }

    #[test]
    fn out_of_bounds_write_is_noop() {
        let mut t = small_terrain();
        t.set(Coord::new(0, 0, 0), "stone");
        t.set(Coord::new(100, 500, 200), "stone");
        assert_eq!(t.heightmap(Criterion::WorldSurface).unwrap().get(0, 0), Some(64));
    }

    #[test]
    fn leaves_and_water_split_heightmaps() {
        let mut t = small_terrain();
        // A leaf canopy over (101, 201) and a water block on (102, 202).
        t.set(Coord::new(101, 70, 201), "oak_leaves");
        t.set(Coord::new(102, 64, 202), "water");

        let ws = t.heightmap(Criterion::WorldSurface).unwrap();
        let mb = t.heightmap(Criterion::MotionBlocking).unwrap();
        let nl = t.heightmap(Criterion::MotionBlockingNoLeaves).unwrap();
        let of = t.heightmap(Criterion::OceanFloor).unwrap();

        assert_eq!(ws.get(1, 1), Some(71));
        assert_eq!(mb.get(1, 1), Some(71));
        assert_eq!(nl.get(1, 1), Some(64));

        assert_eq!(mb.get(2, 2), Some(65));
        assert_eq!(of.get(2, 2), Some(64));
    }

    #[test]
    fn grass_tufts_do_not_block_motion() {
        let mut t = small_terrain();
        t.set(Coord::new(100, 64, 200), "short_grass");
        assert_eq!(t.heightmap(Criterion::WorldSurface).unwrap().get(0, 0), Some(65));
        assert_eq!(t.heightmap(Criterion::MotionBlocking).unwrap().get(0, 0), Some(64));
    }

    #[test]
    fn stairs_and_cave_air_are_told_apart() {
        let mut t = small_terrain();
        t.set(Coord::new(100, 64, 200), "oak_stairs");
        t.set(Coord::new(101, 64, 200), "minecraft:stone_stairs");
        t.set(Coord::new(102, 63, 200), "cave_air");
        for c in Criterion::SOURCE_PROVIDED {
            let hm = t.heightmap(c).unwrap();
            assert_eq!(hm.get(0, 0), Some(65), "{c}");
            assert_eq!(hm.get(1, 0), Some(65), "{c}");
            assert_eq!(hm.get(2, 0), Some(63), "{c}");
        }
    }

    #[test]
    fn writer_updates_heights() {
        let mut t = small_terrain();
        t.place_block(Coord::new(103, 63, 203), "air");
        t.place_block(Coord::new(103, 62, 203), "air");
        assert_eq!(
            t.heightmap(Criterion::MotionBlockingNoLeaves).unwrap().get(3, 3),
            Some(62)
        );
        t.fill_column(103, 203, 66, "stone");
        assert_eq!(
            t.heightmap(Criterion::MotionBlockingNoLeaves).unwrap().get(3, 3),
            Some(67)
        );
    }

    #[test]
    fn empty_column_height_is_floor() {
        let t = GridTerrain::new(Coord::new(0, -64, 0), Size::new(2, 2), 32);
        assert_eq!(t.heightmap(Criterion::WorldSurface).unwrap().get(1, 1), Some(-64));
        assert_eq!(t.height_range(), (-64, -32));
    }
}
