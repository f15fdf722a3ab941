// A* search over the navigation graph.
//
// Standard A* using a `BinaryHeap` with reversed ordering as a min-heap.
// Scores and came-from data are stored in `Vec`s indexed by `NavNodeId`.
// Costs are integer sums with saturating arithmetic; blocked edges are
// skipped outright.
//
// The heuristic is the Manhattan distance between columns times the cheapest
// traversable edge weight in the graph. Every step crosses at least one
// column and costs at least that much, so the heuristic never overestimates
// and the result matches Dijkstra's optimum.
//
// See also: `nav.rs` for the `NavGraph` being searched, `region.rs` which
// calls this when planning roads.
//
// **Critical constraint: determinism.** Heap ties break on node ID, so equal
// cost paths resolve the same way every run.

use crate::nav::NavGraph;
use crate::types::NavNodeId;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// The result of a successful A* search.
#[derive(Clone, Debug)]
pub struct PathResult {
    /// Sequence of node IDs from start to goal (inclusive).
    pub nodes: Vec<NavNodeId>,
    /// Indices into `NavGraph.edges` for each step (len = nodes.len() - 1).
    pub edge_indices: Vec<usize>,
    pub total_cost: u64,
}

/// Entry in the A* open set (min-heap via reversed ordering).
#[derive(PartialEq, Eq)]
struct OpenEntry {
    node: NavNodeId,
    f_score: u64,
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for min-heap: smallest f_score is "greatest".
        other
            .f_score
            .cmp(&self.f_score)
            .then_with(|| other.node.0.cmp(&self.node.0))
    }
}

/// Find the cheapest path from `start` to `goal`.
///
/// Returns `None` if either node is out of range or the goal is unreachable
/// through non-blocked edges.
pub fn astar(graph: &NavGraph, start: NavNodeId, goal: NavNodeId) -> Option<PathResult> {
    let n = graph.node_count();
    if start.0 as usize >= n || goal.0 as usize >= n {
        return None;
    }
    if start == goal {
        return Some(PathResult {
            nodes: vec![start],
            edge_indices: Vec::new(),
            total_cost: 0,
        });
    }
    let min_weight = graph.min_edge_weight()?;

    // g_score[node] = cost of cheapest known path from start to node.
    let mut g_score = vec![u64::MAX; n];
    // came_from[node] = (previous node, edge index used to get there).
    let mut came_from: Vec<Option<(NavNodeId, usize)>> = vec![None; n];
    let mut closed = vec![false; n];

    g_score[start.0 as usize] = 0;

    let mut open = BinaryHeap::new();
    open.push(OpenEntry {
        node: start,
        f_score: heuristic(graph, start, goal, min_weight),
    });

    while let Some(current) = open.pop() {
        let current_id = current.node;
        let ci = current_id.0 as usize;

        if current_id == goal {
            return Some(reconstruct_path(&came_from, start, goal, g_score[ci]));
        }

        if closed[ci] {
            continue;
        }
        closed[ci] = true;

        let current_g = g_score[ci];

        for &edge_idx in graph.neighbors(current_id) {
            let edge = graph.edge(edge_idx);
            if edge.is_blocked() {
                continue;
            }
            let neighbor = edge.to;
            let ni = neighbor.0 as usize;

            if closed[ni] {
                continue;
            }

            let tentative_g = current_g.saturating_add(edge.weight);

            if tentative_g < g_score[ni] {
                g_score[ni] = tentative_g;
                came_from[ni] = Some((current_id, edge_idx));
                open.push(OpenEntry {
                    node: neighbor,
                    f_score: tentative_g
                        .saturating_add(heuristic(graph, neighbor, goal, min_weight)),
                });
            }
        }
    }

    None
}

fn heuristic(graph: &NavGraph, from: NavNodeId, goal: NavNodeId, min_weight: u64) -> u64 {
    let a = graph.node(from).position.column();
    let b = graph.node(goal).position.column();
    (a.manhattan_distance(b) as u64).saturating_mul(min_weight)
}

fn reconstruct_path(
    came_from: &[Option<(NavNodeId, usize)>],
    start: NavNodeId,
    goal: NavNodeId,
    total_cost: u64,
) -> PathResult {
    let mut nodes = vec![goal];
    let mut edge_indices = Vec::new();
    let mut current = goal;

    while current != start {
        let Some((prev, edge_idx)) = came_from[current.0 as usize] else {
            break;
        };
        nodes.push(prev);
        edge_indices.push(edge_idx);
        current = prev;
    }

    nodes.reverse();
    edge_indices.reverse();

    PathResult {
        nodes,
        edge_indices,
        total_cost,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nav::BLOCKED_WEIGHT;
    use crate::types::{Column, Coord};

    /// A w x d grid of nodes at y=64 with uniform weight 100.
    fn grid(w: i32, d: i32) -> NavGraph {
        let mut g = NavGraph::new();
        for x in 0..w {
            for z in 0..d {
                g.add_node(Coord::new(x, 64, z));
            }
        }
        for x in 0..w {
            for z in 0..d {
                let a = g.node_at(Column::new(x, z)).unwrap();
                if let Some(b) = g.node_at(Column::new(x + 1, z)) {
                    g.add_edge(a, b, 100, 100);
                }
                if let Some(b) = g.node_at(Column::new(x, z + 1)) {
                    g.add_edge(a, b, 100, 100);
                }
            }
        }
        g
    }

    fn id(g: &NavGraph, x: i32, z: i32) -> NavNodeId {
        g.node_at(Column::new(x, z)).unwrap()
    }

    /// Plain Dijkstra for cross-checking A*.
    fn dijkstra_cost(g: &NavGraph, start: NavNodeId, goal: NavNodeId) -> Option<u64> {
        let mut dist = vec![u64::MAX; g.node_count()];
        let mut done = vec![false; g.node_count()];
        dist[start.0 as usize] = 0;
        loop {
            let next = (0..g.node_count())
                .filter(|&i| !done[i] && dist[i] != u64::MAX)
                .min_by_key(|&i| dist[i])?;
            if next == goal.0 as usize {
                return Some(dist[next]);
            }
            done[next] = true;
            for &e in g.neighbors(NavNodeId(next as u32)) {
                let edge = g.edge(e);
                if edge.weight == BLOCKED_WEIGHT {
                    continue;
                }
                let t = edge.to.0 as usize;
                dist[t] = dist[t].min(dist[next] + edge.weight);
            }
        }
    }

    #[test]
    fn straight_line_on_uniform_grid() {
        let g = grid(5, 5);
        let path = astar(&g, id(&g, 0, 0), id(&g, 4, 0)).unwrap();
        assert_eq!(path.nodes.len(), 5);
        assert_eq!(path.edge_indices.len(), 4);
        assert_eq!(path.total_cost, 400);
    }

    #[test]
    fn start_equals_goal() {
        let g = grid(2, 2);
        let path = astar(&g, id(&g, 1, 1), id(&g, 1, 1)).unwrap();
        assert_eq!(path.nodes, vec![id(&g, 1, 1)]);
        assert_eq!(path.total_cost, 0);
    }

    #[test]
    fn blocked_wall_is_detoured() {
        let mut g = grid(5, 5);
        // Wall at x=2 except z=4.
        for z in 0..4 {
            g.block_column(Column::new(2, z));
        }
        let path = astar(&g, id(&g, 0, 0), id(&g, 4, 0)).unwrap();
        for &n in &path.nodes {
            let c = g.node(n).position.column();
            assert!(!(c.x == 2 && c.z < 4), "path crosses blocked column {c}");
        }
        assert_eq!(path.total_cost, 1200);
    }

    #[test]
    fn fully_blocked_is_unreachable() {
        let mut g = grid(5, 5);
        for z in 0..5 {
            g.block_column(Column::new(2, z));
        }
        assert!(astar(&g, id(&g, 0, 0), id(&g, 4, 4)).is_none());
    }

    #[test]
    fn reinforced_edges_are_reused() {
        let mut g = grid(6, 6);
        // Cheap lane along z=5.
        for x in 0..5 {
            g.reinforce(Column::new(x, 5), Column::new(x + 1, 5), 10);
        }
        let path = astar(&g, id(&g, 0, 4), id(&g, 5, 4)).unwrap();
        // Up onto the lane, along it, and back down beats the direct line.
        assert_eq!(path.total_cost, 100 + 50 + 100);
        assert!(
            path.nodes
                .iter()
                .any(|&n| g.node(n).position.column() == Column::new(3, 5))
        );
    }

    #[test]
    fn matches_dijkstra_on_irregular_weights() {
        let mut g = NavGraph::new();
        for x in 0..6 {
            for z in 0..6 {
                g.add_node(Coord::new(x, 64, z));
            }
        }
        for x in 0..6 {
            for z in 0..6 {
                let a = id(&g, x, z);
                let w = 100 + ((x * 7 + z * 13) % 11) as u64 * 37;
                if x < 5 {
                    let b = id(&g, x + 1, z);
                    g.add_edge(a, b, w, 100 + (w % 90));
                }
                if z < 5 {
                    let b = id(&g, x, z + 1);
                    g.add_edge(a, b, 100 + (w % 130), w);
                }
            }
        }
        for (sx, sz, gx, gz) in [(0, 0, 5, 5), (5, 0, 0, 5), (2, 3, 4, 1)] {
            let (s, t) = (id(&g, sx, sz), id(&g, gx, gz));
            let found = astar(&g, s, t).unwrap();
            assert_eq!(Some(found.total_cost), dijkstra_cost(&g, s, t));
            let summed: u64 = found.edge_indices.iter().map(|&e| g.edge(e).weight).sum();
            assert_eq!(summed, found.total_cost);
        }
    }

    #[test]
    fn out_of_range_nodes() {
        let g = grid(2, 2);
        assert!(astar(&g, NavNodeId(0), NavNodeId(99)).is_none());
    }
}
