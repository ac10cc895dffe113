//! Junction stop phases
//!
//! A stop pattern is a block mask over a tile's 49 local slots. Junction
//! tiles cycle through an ordered list of them: each approach in turn gets
//! an "allow" phase (every other approach stopped) followed by an all-stop
//! clearance phase.

use std::fmt;

use log::debug;

use super::lane_graph::LaneGraph;
use super::road_shape::RoadShape;
use super::tile_grid::TileGrid;
use super::track_wiring::inbound_stop_slot;
use super::types::{slot, Direction, TileCoord, LOCAL_GRID_SIZE, LOCAL_SLOT_COUNT};

/// Order in which junction approaches receive right of way
const APPROACH_ORDER: [Direction; 4] = [
    Direction::West,
    Direction::North,
    Direction::East,
    Direction::South,
];

/// One traffic-control phase: `true` blocks the node in that slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopPattern {
    pub mask: [bool; LOCAL_SLOT_COUNT],
}

impl Default for StopPattern {
    fn default() -> Self {
        Self::open()
    }
}

impl StopPattern {
    /// A pattern that blocks nothing
    pub fn open() -> Self {
        Self {
            mask: [false; LOCAL_SLOT_COUNT],
        }
    }

    /// A pattern blocking the inbound stop line of each listed side
    pub fn stopping(sides: impl IntoIterator<Item = Direction>) -> Self {
        let mut pattern = Self::open();
        for side in sides {
            pattern.mask[inbound_stop_slot(side)] = true;
        }
        pattern
    }

    pub fn blocks(&self, slot: usize) -> bool {
        self.mask.get(slot).copied().unwrap_or(false)
    }

    pub fn blocked_count(&self) -> usize {
        self.mask.iter().filter(|blocked| **blocked).count()
    }
}

impl fmt::Display for StopPattern {
    /// Renders the mask north-up, `X` for blocked slots
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in (0..LOCAL_GRID_SIZE).rev() {
            let line: String = (0..LOCAL_GRID_SIZE)
                .map(|col| if self.mask[slot(row, col)] { 'X' } else { '.' })
                .collect();
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

/// Builds the ordered phase list for a shape; empty unless it is a junction
pub fn build_phases(shape: RoadShape) -> Vec<StopPattern> {
    if !shape.is_junction() {
        return Vec::new();
    }

    let sides = shape.sides();
    let approaches: Vec<Direction> = APPROACH_ORDER
        .into_iter()
        .filter(|direction| sides.contains(direction))
        .collect();

    approaches
        .iter()
        .flat_map(|allowed| {
            let allow = StopPattern::stopping(
                approaches.iter().copied().filter(|side| side != allowed),
            );
            let stop_all = StopPattern::stopping(approaches.iter().copied());
            [allow, stop_all]
        })
        .collect()
}

/// Copies a pattern into the `blocked` flag of every lane node on a tile
fn write_pattern(grid: &TileGrid, graph: &mut LaneGraph, coord: TileCoord, pattern: &StopPattern) {
    let Some(tile) = grid.tile(coord) else {
        return;
    };
    for (index, node) in tile.slots.iter().enumerate() {
        if let Some(node) = node {
            graph.set_blocked(*node, pattern.blocks(index));
        }
    }
}

/// Applies phase `index` of a tile.
///
/// Tiles without phases (non-junction roads, non-road tiles) have all of
/// their nodes unblocked instead. Returns the phase index now active, or
/// `None` if the tile has no phases.
pub fn apply_phase(
    grid: &mut TileGrid,
    graph: &mut LaneGraph,
    coord: TileCoord,
    index: usize,
) -> Option<usize> {
    let pattern = grid
        .tile(coord)
        .and_then(|tile| tile.kind.as_road())
        .and_then(|road| road.phases.get(index % road.phases.len().max(1)).copied());

    let Some(pattern) = pattern else {
        write_pattern(grid, graph, coord, &StopPattern::open());
        return None;
    };

    write_pattern(grid, graph, coord, &pattern);

    let road = grid.tile_mut(coord)?.kind.as_road_mut()?;
    road.active_phase = index % road.phases.len();
    road.phase_timer = 0.0;

    debug!(
        "Tile ({}, {}) now in phase {}/{}",
        coord.x,
        coord.z,
        road.active_phase,
        road.phases.len()
    );

    Some(road.active_phase)
}

/// Moves a junction tile to its next phase
pub fn advance_phase(grid: &mut TileGrid, graph: &mut LaneGraph, coord: TileCoord) -> Option<usize> {
    let next = grid
        .tile(coord)
        .and_then(|tile| tile.kind.as_road())
        .filter(|road| road.is_junction())
        .map(|road| road.active_phase + 1)?;
    apply_phase(grid, graph, coord, next)
}

/// Advances the timer of every junction, switching phase each `phase_duration`.
/// Returns how many junctions changed phase.
pub fn tick_phases(
    grid: &mut TileGrid,
    graph: &mut LaneGraph,
    delta_secs: f32,
    phase_duration: f32,
) -> usize {
    let mut due = Vec::new();
    let coords: Vec<TileCoord> = grid.coords().collect();
    for coord in coords {
        let Some(road) = grid
            .tile_mut(coord)
            .and_then(|tile| tile.kind.as_road_mut())
            .filter(|road| road.is_junction())
        else {
            continue;
        };
        road.phase_timer += delta_secs;
        if road.phase_timer >= phase_duration {
            due.push(coord);
        }
    }

    for coord in &due {
        advance_phase(grid, graph, *coord);
    }
    due.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_junctions_get_phases() {
        for shape in RoadShape::ALL {
            let phases = build_phases(shape);
            assert_eq!(phases.is_empty(), !shape.is_junction(), "{:?}", shape);
        }
        assert_eq!(build_phases(RoadShape::Cross).len(), 8);
        assert_eq!(build_phases(RoadShape::TeeNorthEastSouth).len(), 6);
    }

    #[test]
    fn allow_phase_opens_exactly_one_approach() {
        let phases = build_phases(RoadShape::Cross);
        let allow_west = phases[0];
        assert!(!allow_west.blocks(inbound_stop_slot(Direction::West)));
        assert!(allow_west.blocks(inbound_stop_slot(Direction::North)));
        assert!(allow_west.blocks(inbound_stop_slot(Direction::East)));
        assert!(allow_west.blocks(inbound_stop_slot(Direction::South)));
        assert_eq!(allow_west.blocked_count(), 3);
        assert_eq!(phases[1].blocked_count(), 4);
    }

    #[test]
    fn phases_are_reproducible() {
        assert_eq!(
            build_phases(RoadShape::TeeWestSouthEast),
            build_phases(RoadShape::TeeWestSouthEast)
        );
    }

    #[test]
    fn tee_never_blocks_its_missing_side() {
        for phase in build_phases(RoadShape::TeeWestEastNorth) {
            assert!(!phase.blocks(inbound_stop_slot(Direction::South)));
        }
    }

    #[test]
    fn diagram_is_north_up() {
        let pattern = StopPattern::stopping([Direction::North]);
        let diagram = pattern.to_string();
        let lines: Vec<&str> = diagram.lines().collect();
        assert_eq!(lines.len(), 7);
        assert_eq!(lines[1], "..X....");
    }
}
