// plotwright_plan: terrain-aware settlement planning.
//
// This crate decides where structures and the roads between them go on a
// bounded piece of terrain, given only sampled elevation and block names.
// It never talks to a game directly: terrain comes in through the
// `TerrainSource` trait and block writes go out through `WorldWriter`.
//
// Module overview:
// - `region.rs`:      `Region`, the owner of all planner state and the public operations.
// - `site.rs`:        Footprint scoring, site preferences, candidate selection.
// - `road.rs`:        Three-tier road network and height equalization.
// - `nav.rs`:         Surface navigation graph with steepness-weighted edges.
// - `pathfinding.rs`: A* over the nav graph.
// - `steepness.rs`:   Flatness field and priority candidates.
// - `surface.rs`:     Surface samples, the per-criterion cache, vegetation-free heights.
// - `terrain.rs`:     `HeightMap`, `TerrainSource`, `WorldWriter`, `RecordingWriter`.
// - `world.rs`:       `GridTerrain`, a dense in-memory block grid implementing both traits.
// - `palette.rs`:     Weighted block palettes for roads and foundations.
// - `config.rs`:      `PlannerConfig`, all tunable weights and thresholds, loaded from JSON.
// - `error.rs`:       `PlanError`.
// - `types.rs`:       Coord, Column, Size, Criterion, BlockId, nav IDs.
// - `prng`:           Re-exported from `plotwright_prng`, xoshiro256++ with SplitMix64 seeding.
//
// Library code logs through the `log` facade and never installs a logger.
//
// **Critical constraint: determinism.** Given the same terrain, config and
// seed, planning produces the same sites, roads and block writes. All
// randomness comes from a caller-supplied `PlanRng`; ordered collections are
// `BTreeMap`/`BTreeSet`, and hash maps are only used as lookup indexes.

pub mod config;
pub mod error;
pub mod nav;
pub mod palette;
pub mod pathfinding;
pub use plotwright_prng as prng;
pub mod region;
pub mod road;
pub mod site;
pub mod steepness;
pub mod surface;
pub mod terrain;
pub mod types;
pub mod world;

pub use config::PlannerConfig;
pub use error::PlanError;
pub use region::Region;
pub use site::{Footprint, SitePreference, SiteRequest};
