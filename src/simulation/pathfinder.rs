//! Tile-level A* path search
//!
//! Works on the tile grid rather than the lane graph: one graph node per
//! tile, unit step cost, 4- or 8-directional adjacency. The graph is built
//! once; per-search state is reset before every query so the same finder
//! can be reused as obstacles change.

use std::cmp::Reverse;

use log::debug;
use ordered_float::OrderedFloat;
use petgraph::graph::{NodeIndex, UnGraph};
use sorted_vec::SortedVec;

use super::types::TileCoord;

/// Neighborhood used when expanding a tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Adjacency {
    /// N, E, S, W; Manhattan heuristic
    #[default]
    Four,
    /// Adds diagonals; Euclidean heuristic
    Eight,
}

/// Per-node search bookkeeping
#[derive(Debug, Clone, Copy)]
struct SearchNode {
    visited: bool,
    g: f32,
    score: f32,
    parent: Option<usize>,
}

impl Default for SearchNode {
    fn default() -> Self {
        Self {
            visited: false,
            g: f32::INFINITY,
            score: f32::INFINITY,
            parent: None,
        }
    }
}

/// Reusable A* search over a width x depth tile grid
#[derive(Debug, Clone)]
pub struct GridPathfinder {
    width: usize,
    depth: usize,
    adjacency: Adjacency,
    /// Node `i` is the tile with flat index `i`
    graph: UnGraph<TileCoord, f32>,
    obstacles: Vec<bool>,
    state: Vec<SearchNode>,
}

impl GridPathfinder {
    pub fn new(width: usize, depth: usize, adjacency: Adjacency) -> Self {
        let mut graph = UnGraph::with_capacity(width * depth, width * depth * 4);
        for z in 0..depth {
            for x in 0..width {
                graph.add_node(TileCoord::new(x, z));
            }
        }

        let index = |x: usize, z: usize| NodeIndex::new(z * width + x);
        for z in 0..depth {
            for x in 0..width {
                if x + 1 < width {
                    graph.add_edge(index(x, z), index(x + 1, z), 1.0);
                }
                if z + 1 < depth {
                    graph.add_edge(index(x, z), index(x, z + 1), 1.0);
                }
                if adjacency == Adjacency::Eight && z + 1 < depth {
                    if x + 1 < width {
                        graph.add_edge(index(x, z), index(x + 1, z + 1), 1.0);
                    }
                    if x > 0 {
                        graph.add_edge(index(x, z), index(x - 1, z + 1), 1.0);
                    }
                }
            }
        }

        Self {
            width,
            depth,
            adjacency,
            graph,
            obstacles: vec![false; width * depth],
            state: vec![SearchNode::default(); width * depth],
        }
    }

    pub fn adjacency(&self) -> Adjacency {
        self.adjacency
    }

    pub fn len(&self) -> usize {
        self.width * self.depth
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn set_obstacle(&mut self, index: usize, obstacle: bool) {
        if let Some(entry) = self.obstacles.get_mut(index) {
            *entry = obstacle;
        }
    }

    pub fn is_obstacle(&self, index: usize) -> bool {
        self.obstacles.get(index).copied().unwrap_or(true)
    }

    pub fn clear_obstacles(&mut self) {
        self.obstacles.fill(false);
    }

    fn coord(&self, index: usize) -> TileCoord {
        TileCoord::new(index % self.width, index / self.width)
    }

    fn heuristic(&self, from: usize, to: usize) -> f32 {
        let a = self.coord(from);
        let b = self.coord(to);
        match self.adjacency {
            Adjacency::Four => a.manhattan(&b) as f32,
            Adjacency::Eight => {
                let dx = a.x.abs_diff(b.x) as f32;
                let dz = a.z.abs_diff(b.z) as f32;
                (dx * dx + dz * dz).sqrt()
            }
        }
    }

    fn reset(&mut self) {
        self.state.fill(SearchNode::default());
    }

    /// Finds a path of tile coordinates from `start` to `goal`, both inclusive.
    ///
    /// Returns an empty path if either index is out of range or the goal
    /// cannot be reached. The start tile is never treated as an obstacle.
    pub fn find_path(&mut self, start: usize, goal: usize) -> Vec<TileCoord> {
        if start >= self.len() || goal >= self.len() {
            return Vec::new();
        }
        if start == goal {
            return vec![self.coord(start)];
        }

        self.reset();
        self.state[start].g = 0.0;
        self.state[start].score = self.heuristic(start, goal);

        // Lowest score pops first; stale entries are skipped once visited
        let mut open: SortedVec<Reverse<(OrderedFloat<f32>, usize)>> = SortedVec::new();
        open.insert(Reverse((OrderedFloat(self.state[start].score), start)));

        while let Some(Reverse((_, current))) = open.pop() {
            if self.state[current].visited {
                continue;
            }
            self.state[current].visited = true;
            if current == goal {
                break;
            }

            let neighbors: Vec<usize> = self
                .graph
                .neighbors(NodeIndex::new(current))
                .map(|node| node.index())
                .collect();

            for neighbor in neighbors {
                if self.obstacles[neighbor] || self.state[neighbor].visited {
                    continue;
                }
                let tentative = self.state[current].g + 1.0;
                if tentative < self.state[neighbor].g {
                    let score = tentative + self.heuristic(neighbor, goal);
                    let entry = &mut self.state[neighbor];
                    entry.g = tentative;
                    entry.score = score;
                    entry.parent = Some(current);
                    open.insert(Reverse((OrderedFloat(score), neighbor)));
                }
            }
        }

        if !self.state[goal].visited {
            debug!(
                "No tile path from {:?} to {:?}",
                self.coord(start),
                self.coord(goal)
            );
            return Vec::new();
        }

        let mut path = vec![self.coord(goal)];
        let mut cursor = goal;
        while let Some(parent) = self.state[cursor].parent {
            path.push(self.coord(parent));
            cursor = parent;
        }
        path.reverse();
        path
    }
}
