// Terrain collaborator interfaces and the heightmap container.
//
// The planner never talks to a game or a save file directly. It reads
// elevation and block identities through `TerrainSource` and writes blocks
// through `WorldWriter`. Whatever fetches the data (network, save file,
// generator) sits behind those two traits, including any retrying it needs.
//
// `HeightMap` stores one height per column in x-major order
// (`x * size_z + z`). A height is the y of the first free block above the
// surface, so the surface block itself sits at `height - 1`.
//
// See also: `world.rs` for `GridTerrain`, the in-memory implementation of
// both traits; `surface.rs` for turning heightmaps into surface samples.

use crate::types::{BlockId, Column, Coord, Criterion, Size};

// ---------------------------------------------------------------------------
// HeightMap
// ---------------------------------------------------------------------------

/// Dense 2D grid of column heights, indexed by local (x, z).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeightMap {
    size_x: usize,
    size_z: usize,
    /// Flat storage: index = x * size_z + z.
    heights: Vec<i32>,
}

impl HeightMap {
    pub fn new(size_x: usize, size_z: usize, fill: i32) -> Self {
        Self {
            size_x,
            size_z,
            heights: vec![fill; size_x * size_z],
        }
    }

    pub fn from_fn(size_x: usize, size_z: usize, mut f: impl FnMut(usize, usize) -> i32) -> Self {
        let mut heights = Vec::with_capacity(size_x * size_z);
        for x in 0..size_x {
            for z in 0..size_z {
                heights.push(f(x, z));
            }
        }
        Self {
            size_x,
            size_z,
            heights,
        }
    }

    pub fn size_x(&self) -> usize {
        self.size_x
    }

    pub fn size_z(&self) -> usize {
        self.size_z
    }

    fn index(&self, x: i32, z: i32) -> Option<usize> {
        if x < 0 || z < 0 {
            return None;
        }
        let (x, z) = (x as usize, z as usize);
        (x < self.size_x && z < self.size_z).then_some(x * self.size_z + z)
    }

    /// Height at local (x, z), or `None` outside the grid.
    pub fn get(&self, x: i32, z: i32) -> Option<i32> {
        self.index(x, z).map(|i| self.heights[i])
    }

    /// Write a height. No-op outside the grid.
    pub fn set(&mut self, x: i32, z: i32, height: i32) {
        if let Some(i) = self.index(x, z) {
            self.heights[i] = height;
        }
    }

    /// Copy out the sub-grid starting at local (x, z). Returns `None` unless
    /// the whole window lies inside this map.
    pub fn window(&self, x: i32, z: i32, size_x: usize, size_z: usize) -> Option<HeightMap> {
        if x < 0
            || z < 0
            || x as usize + size_x > self.size_x
            || z as usize + size_z > self.size_z
        {
            return None;
        }
        let (x0, z0) = (x as usize, z as usize);
        Some(HeightMap::from_fn(size_x, size_z, |dx, dz| {
            self.heights[(x0 + dx) * self.size_z + z0 + dz]
        }))
    }

    /// All heights with their local (x, z), in storage order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, i32)> + '_ {
        let size_z = self.size_z;
        self.heights
            .iter()
            .enumerate()
            .map(move |(i, &h)| (i / size_z, i % size_z, h))
    }
}

// ---------------------------------------------------------------------------
// Collaborator traits
// ---------------------------------------------------------------------------

/// Read access to loaded terrain.
///
/// Heightmaps cover the whole loaded area and are indexed relative to
/// `origin()`. Sources only provide `Criterion::SOURCE_PROVIDED`; asking for a
/// derived criterion returns `None`.
pub trait TerrainSource {
    /// Minimum corner of the loaded data; `origin().y` is the lowest loaded y.
    fn origin(&self) -> Coord;

    /// Horizontal extent of the loaded data.
    fn size(&self) -> Size;

    /// Loaded heights as a half-open range `[min_y, max_y)`.
    fn height_range(&self) -> (i32, i32);

    fn heightmap(&self, criterion: Criterion) -> Option<&HeightMap>;

    /// The block at a world position, `BlockId::Void` outside the loaded data.
    fn block_at(&self, coord: Coord) -> BlockId;

    fn contains_column(&self, column: Column) -> bool {
        let origin = self.origin();
        let size = self.size();
        column.x >= origin.x
            && column.z >= origin.z
            && column.x < origin.x + size.x
            && column.z < origin.z + size.z
    }
}

/// Write access to the world, by plain coordinate and block name.
pub trait WorldWriter {
    fn place_block(&mut self, coord: Coord, block: &str);

    /// Push buffered writes out. Writers that apply immediately ignore it.
    fn flush(&mut self) {}
}

/// A `WorldWriter` that keeps every placement in order.
#[derive(Clone, Debug, Default)]
pub struct RecordingWriter {
    pub placed: Vec<(Coord, String)>,
    pub flushes: usize,
}

impl RecordingWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recent block written at `coord`.
    pub fn last_at(&self, coord: Coord) -> Option<&str> {
        self.placed
            .iter()
            .rev()
            .find(|(c, _)| *c == coord)
            .map(|(_, name)| name.as_str())
    }

    /// Number of writes whose block name contains `pattern`.
    pub fn count_matching(&self, pattern: &str) -> usize {
        self.placed
            .iter()
            .filter(|(_, name)| name.contains(pattern))
            .count()
    }
}

impl WorldWriter for RecordingWriter {
    fn place_block(&mut self, coord: Coord, block: &str) {
        self.placed.push((coord, block.to_string()));
    }

    fn flush(&mut self) {
        self.flushes += 1;
    }
}
