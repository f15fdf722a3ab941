// Navigation graph over a region's no-vegetation surface.
//
// One `NavNode` per surface column, connected to its 4-neighbors by
// `NavEdge`s. Every undirected link is stored as a forward/reverse pair of
// directed edges, added together by `add_edge`. Each direction is weighted
// by the steepness at its destination, so climbing onto rough ground costs
// more than stepping off it.
//
// Two mutations exist after construction. `block_column` sets every edge
// touching a column to `BLOCKED_WEIGHT`, which the search treats as absent.
// `reinforce` drops both directions of one link to the cheap road weight so
// later roads prefer to reuse it. A blocked edge stays blocked.
//
// All storage uses `Vec` indexed by `NavNodeId`/`NavEdgeId`, plus a column
// index for O(1) lookup by position.
//
// See also: `pathfinding.rs` for A* over this graph, `steepness.rs` for the
// malus field, `region.rs` which owns the graph and re-applies blocks and
// reinforcements on rebuild.
//
// **Critical constraint: determinism.** Node IDs follow surface order and
// edges are added in node order, so the same surface always yields the same
// graph.

use crate::config::NavParams;
use crate::steepness::SteepnessField;
use crate::surface::SurfaceList;
use crate::types::{Column, Coord, NavEdgeId, NavNodeId};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// Weight of an edge that may not be traversed.
pub const BLOCKED_WEIGHT: u64 = u64::MAX;

/// A surface column a road can pass through.
#[derive(Clone, Debug)]
pub struct NavNode {
    pub id: NavNodeId,
    pub position: Coord,
    /// Indices into `NavGraph.edges` for edges that originate from this node.
    pub edge_indices: SmallVec<[usize; 4]>,
}

/// A directed edge in the navigation graph.
#[derive(Clone, Debug)]
pub struct NavEdge {
    pub id: NavEdgeId,
    pub from: NavNodeId,
    pub to: NavNodeId,
    pub weight: u64,
}

impl NavEdge {
    pub fn is_blocked(&self) -> bool {
        self.weight == BLOCKED_WEIGHT
    }
}

#[derive(Clone, Debug, Default)]
pub struct NavGraph {
    pub nodes: Vec<NavNode>,
    pub edges: Vec<NavEdge>,
    column_index: FxHashMap<Column, NavNodeId>,
}

impl NavGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node at the given position. A column already in the graph keeps
    /// its existing node.
    pub fn add_node(&mut self, position: Coord) -> NavNodeId {
        if let Some(&id) = self.column_index.get(&position.column()) {
            return id;
        }
        let id = NavNodeId(self.nodes.len() as u32);
        self.nodes.push(NavNode {
            id,
            position,
            edge_indices: SmallVec::new(),
        });
        self.column_index.insert(position.column(), id);
        id
    }

    /// Add a forward (`from -> to`) and reverse edge. Returns the forward ID.
    pub fn add_edge(
        &mut self,
        from: NavNodeId,
        to: NavNodeId,
        forward_weight: u64,
        reverse_weight: u64,
    ) -> NavEdgeId {
        let forward_idx = self.edges.len();
        let forward_id = NavEdgeId(forward_idx as u32);
        self.edges.push(NavEdge {
            id: forward_id,
            from,
            to,
            weight: forward_weight,
        });

        let reverse_idx = self.edges.len();
        self.edges.push(NavEdge {
            id: NavEdgeId(reverse_idx as u32),
            from: to,
            to: from,
            weight: reverse_weight,
        });

        self.nodes[from.0 as usize].edge_indices.push(forward_idx);
        self.nodes[to.0 as usize].edge_indices.push(reverse_idx);

        forward_id
    }

    /// Indices of all edges originating from a node.
    pub fn neighbors(&self, node: NavNodeId) -> &[usize] {
        &self.nodes[node.0 as usize].edge_indices
    }

    pub fn node(&self, id: NavNodeId) -> &NavNode {
        &self.nodes[id.0 as usize]
    }

    pub fn edge(&self, idx: usize) -> &NavEdge {
        &self.edges[idx]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn node_at(&self, column: Column) -> Option<NavNodeId> {
        self.column_index.get(&column).copied()
    }

    /// Index of the directed edge `a -> b`, if the columns are linked.
    pub fn edge_between(&self, a: Column, b: Column) -> Option<usize> {
        let from = self.node_at(a)?;
        let to = self.node_at(b)?;
        self.neighbors(from)
            .iter()
            .copied()
            .find(|&i| self.edges[i].to == to)
    }

    /// Block every edge touching a column, in both directions. Returns the
    /// number of directed edges that were not blocked before.
    pub fn block_column(&mut self, column: Column) -> usize {
        let Some(node) = self.node_at(column) else {
            return 0;
        };
        let mut newly_blocked = 0;
        let outgoing: SmallVec<[usize; 4]> = self.nodes[node.0 as usize].edge_indices.clone();
        for idx in outgoing {
            let neighbor = self.edges[idx].to;
            // Pairs are pushed together, so the partner is the other half.
            let partner = idx ^ 1;
            debug_assert_eq!(self.edges[partner].to, node);
            debug_assert_eq!(self.edges[partner].from, neighbor);
            for i in [idx, partner] {
                if !self.edges[i].is_blocked() {
                    self.edges[i].weight = BLOCKED_WEIGHT;
                    newly_blocked += 1;
                }
            }
        }
        newly_blocked
    }

    /// Set both directions of the `a`-`b` link to `weight`, unless blocked.
    /// Returns whether the link exists.
    pub fn reinforce(&mut self, a: Column, b: Column, weight: u64) -> bool {
        let Some(idx) = self.edge_between(a, b) else {
            return false;
        };
        for i in [idx, idx ^ 1] {
            if !self.edges[i].is_blocked() {
                self.edges[i].weight = weight;
            }
        }
        true
    }

    /// Cheapest traversable edge weight, or `None` if every edge is blocked.
    pub fn min_edge_weight(&self) -> Option<u64> {
        self.edges
            .iter()
            .filter(|e| !e.is_blocked())
            .map(|e| e.weight)
            .min()
    }
}

/// Weight of an edge whose destination has the given steepness.
pub fn edge_weight(malus: u64, params: &NavParams) -> u64 {
    let malus = if malus > params.escalation_threshold {
        malus
            .saturating_mul(params.escalation_factor)
            .min(params.escalation_cap)
    } else {
        malus
    };
    params
        .base_weight
        .saturating_add(malus.saturating_mul(params.malus_factor))
}

/// Build a navigation graph from surface samples.
///
/// Node order follows `surface`. Each column is linked to each 4-neighbor
/// that is also on the surface; the direction into a column is weighted by
/// that column's steepness.
pub fn build_nav_graph(
    surface: &SurfaceList,
    steepness: &SteepnessField,
    params: &NavParams,
) -> NavGraph {
    let mut graph = NavGraph::new();
    for sample in surface {
        graph.add_node(sample.coord);
    }

    for i in 0..graph.node_count() {
        let from = NavNodeId(i as u32);
        let column = graph.node(from).position.column();
        let from_weight = edge_weight(steepness.value_at(column), params);
        for neighbor in column.neighbors4() {
            let Some(to) = graph.node_at(neighbor) else {
                continue;
            };
            // Each link once, from its lower-numbered end.
            if to.0 <= from.0 {
                continue;
            }
            let to_weight = edge_weight(steepness.value_at(neighbor), params);
            graph.add_edge(from, to, to_weight, from_weight);
        }
    }

    log::trace!(
        "nav graph built: {} nodes, {} directed edges",
        graph.node_count(),
        graph.edge_count()
    );
    graph
}
