// Core value types shared across the planner.
//
// Defines world coordinates (`Coord`), their 2D projection (`Column`),
// footprint sizes (`Size`), the elevation criteria a heightmap can be sampled
// with (`Criterion`), block identities (`BlockId`) and the compact nav graph
// identifiers. Everything here is a plain value type: equality, ordering and
// hashing are by value.
//
// Block names are matched by substring (`BlockId::is_one_of`), so a pattern
// like `"log"` covers `oak_log`, `spruce_log` and friends. The pattern sets
// the planner itself relies on live at the bottom of the spatial section.
//
// See also: `world.rs` for the in-memory terrain grid, `surface.rs` for how
// samples are built from heightmaps, `nav.rs` for the node/edge IDs.

use crate::error::PlanError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Spatial types
// ---------------------------------------------------------------------------

/// A block position in world space.
///
/// - X: east (positive) / west (negative)
/// - Y: up (positive) / down (negative)
/// - Z: south (positive) / north (negative)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Coord {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Drop the vertical component.
    pub const fn column(self) -> Column {
        Column::new(self.x, self.z)
    }

    pub const fn shift(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    pub const fn with_y(self, y: i32) -> Self {
        Self::new(self.x, y, self.z)
    }

    /// Euclidean distance in 3D.
    pub fn distance(self, other: Self) -> f64 {
        let dx = (self.x - other.x) as f64;
        let dy = (self.y - other.y) as f64;
        let dz = (self.z - other.z) as f64;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Chebyshev (king-move) distance in 3D.
    pub fn chebyshev_distance(self, other: Self) -> u32 {
        (self.x - other.x)
            .unsigned_abs()
            .max((self.y - other.y).unsigned_abs())
            .max((self.z - other.z).unsigned_abs())
    }

    pub fn manhattan_distance(self, other: Self) -> u32 {
        (self.x - other.x).unsigned_abs()
            + (self.y - other.y).unsigned_abs()
            + (self.z - other.z).unsigned_abs()
    }

    /// The 4 horizontal neighbors at the same height.
    pub fn neighbors4(self) -> [Coord; 4] {
        CARDINAL_OFFSETS.map(|(dx, dz)| self.shift(dx, 0, dz))
    }

    /// The 8 horizontal neighbors at the same height.
    pub fn neighbors8(self) -> [Coord; 8] {
        RING_OFFSETS.map(|(dx, dz)| self.shift(dx, 0, dz))
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// A vertical column of the world, identified by its (x, z) position.
///
/// Occupancy, road tiers and graph nodes are all keyed by column: a region
/// has at most one surface sample per column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Column {
    pub x: i32,
    pub z: i32,
}

impl Column {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    pub const fn shift(self, dx: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.z + dz)
    }

    /// Lift back into 3D at the given height.
    pub const fn at(self, y: i32) -> Coord {
        Coord::new(self.x, y, self.z)
    }

    /// Planar Euclidean distance.
    pub fn distance(self, other: Self) -> f64 {
        let dx = (self.x - other.x) as f64;
        let dz = (self.z - other.z) as f64;
        (dx * dx + dz * dz).sqrt()
    }

    pub fn chebyshev_distance(self, other: Self) -> u32 {
        (self.x - other.x)
            .unsigned_abs()
            .max((self.z - other.z).unsigned_abs())
    }

    pub fn manhattan_distance(self, other: Self) -> u32 {
        (self.x - other.x).unsigned_abs() + (self.z - other.z).unsigned_abs()
    }

    pub fn neighbors4(self) -> [Column; 4] {
        CARDINAL_OFFSETS.map(|(dx, dz)| self.shift(dx, dz))
    }

    pub fn neighbors8(self) -> [Column; 8] {
        RING_OFFSETS.map(|(dx, dz)| self.shift(dx, dz))
    }

    /// Every column in the inclusive square window of the given radius,
    /// x-major, including `self`.
    pub fn around(self, radius: i32) -> impl Iterator<Item = Column> {
        let r = radius.max(0);
        (-r..=r).flat_map(move |dx| (-r..=r).map(move |dz| self.shift(dx, dz)))
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

/// Horizontal extent of a footprint or region, in blocks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub x: i32,
    pub z: i32,
}

impl Size {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Size of the half-open box spanned by two corners.
    pub fn between(start: Coord, end: Coord) -> Self {
        Self::new((end.x - start.x).abs(), (end.z - start.z).abs())
    }

    pub fn area(self) -> i64 {
        self.x.max(0) as i64 * self.z.max(0) as i64
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.x, self.z)
    }
}

/// N(+Z), E(+X), S(-Z), W(-X).
pub const CARDINAL_OFFSETS: [(i32, i32); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];

/// N, NE, E, SE, S, SW, W, NW.
pub const RING_OFFSETS: [(i32, i32); 8] = [
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
];

/// Blocks that sit above the ground without being ground themselves.
pub const NON_GROUND_PATTERNS: [&str; 4] = ["air", "leaves", "log", "vine"];

/// Plants that tree clearing removes down to the ground.
pub const TREE_PATTERNS: [&str; 3] = ["log", "bush", "mushroom"];

pub const WATER_PATTERNS: [&str; 1] = ["water"];

// ---------------------------------------------------------------------------
// Elevation criteria
// ---------------------------------------------------------------------------

/// Which blocks count as "the surface" when sampling a heightmap.
///
/// The first four are provided by a terrain source. `MotionBlockingNoTrees`
/// is derived by the planner from `MotionBlockingNoLeaves` (see
/// `surface::derive_no_trees_heightmap`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Criterion {
    WorldSurface,
    OceanFloor,
    MotionBlocking,
    MotionBlockingNoLeaves,
    MotionBlockingNoTrees,
}

impl Criterion {
    pub const SOURCE_PROVIDED: [Criterion; 4] = [
        Criterion::WorldSurface,
        Criterion::OceanFloor,
        Criterion::MotionBlocking,
        Criterion::MotionBlockingNoLeaves,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Criterion::WorldSurface => "WORLD_SURFACE",
            Criterion::OceanFloor => "OCEAN_FLOOR",
            Criterion::MotionBlocking => "MOTION_BLOCKING",
            Criterion::MotionBlockingNoLeaves => "MOTION_BLOCKING_NO_LEAVES",
            Criterion::MotionBlockingNoTrees => "MOTION_BLOCKING_NO_TREES",
        }
    }

    /// Whether the planner computes this criterion itself.
    pub fn is_derived(self) -> bool {
        matches!(self, Criterion::MotionBlockingNoTrees)
    }
}

impl FromStr for Criterion {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Criterion::SOURCE_PROVIDED
            .into_iter()
            .chain([Criterion::MotionBlockingNoTrees])
            .find(|c| c.name() == s)
            .ok_or_else(|| PlanError::InvalidCriterion(s.to_string()))
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Block identity
// ---------------------------------------------------------------------------

/// The identity of a sampled block.
///
/// `Void` stands for anything outside the loaded terrain. It never matches a
/// pattern, so elevation and clearing loops stop at the edge of the data
/// instead of failing.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockId {
    Void,
    Named(String),
}

impl BlockId {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    pub fn is_void(&self) -> bool {
        matches!(self, BlockId::Void)
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            BlockId::Void => None,
            BlockId::Named(name) => Some(name.as_str()),
        }
    }

    /// True if the name contains any of the patterns.
    pub fn is_one_of<S: AsRef<str>>(&self, patterns: &[S]) -> bool {
        match self {
            BlockId::Void => false,
            BlockId::Named(name) => patterns.iter().any(|p| name.contains(p.as_ref())),
        }
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockId::Void => f.write_str("void"),
            BlockId::Named(name) => f.write_str(name),
        }
    }
}

// ---------------------------------------------------------------------------
// Nav graph IDs
// ---------------------------------------------------------------------------

/// Compact identifier for a navigation graph node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NavNodeId(pub u32);

/// Compact identifier for a directed navigation graph edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NavEdgeId(pub u32);
