//! Navigation graph construction
//!
//! Every tile gets a 7x7 local grid of lane nodes. Neighboring tiles then
//! share their border rows/columns so a vehicle leaving one tile arrives on
//! the very same node the next tile's tracks start from.

use log::debug;

use super::lane_graph::LaneGraph;
use super::tile_grid::TileGrid;
use super::types::{
    is_pruned_slot, slot, slot_row_col, Direction, TileCoord, CORNER_SLOTS, EAST_COL,
    LOCAL_GRID_SIZE, LOCAL_SLOT_COUNT, NON_LANE_SLOTS, NORTH_ROW, SOUTH_ROW, WEST_COL,
};

/// Allocates lane nodes for every non-pruned slot of a tile's local grid.
/// Any previous slot contents are overwritten.
pub fn build_local_grid(grid: &mut TileGrid, graph: &mut LaneGraph, coord: TileCoord) {
    let mut slots = [None; LOCAL_SLOT_COUNT];
    for (index, entry) in slots.iter_mut().enumerate() {
        if is_pruned_slot(index) {
            continue;
        }
        let (row, col) = slot_row_col(index);
        let position = grid.slot_position(coord, row, col);
        *entry = Some(graph.add_node(coord, position));
    }

    if let Some(tile) = grid.tile_mut(coord) {
        tile.slots = slots;
    }
}

/// Makes a tile share border nodes with its north and east neighbors.
///
/// The tile's north row is replaced by the north neighbor's south row and
/// its east column by the east neighbor's west column. A missing neighbor
/// leaves that side untouched.
pub fn link_borders(grid: &mut TileGrid, coord: TileCoord) {
    let north_slots = grid
        .neighbor(coord, Direction::North)
        .and_then(|north| grid.tile(north))
        .map(|tile| tile.slots);
    let east_slots = grid
        .neighbor(coord, Direction::East)
        .and_then(|east| grid.tile(east))
        .map(|tile| tile.slots);

    let Some(tile) = grid.tile_mut(coord) else {
        return;
    };

    if let Some(north_slots) = north_slots {
        for col in 0..LOCAL_GRID_SIZE {
            tile.slots[slot(NORTH_ROW, col)] = north_slots[slot(SOUTH_ROW, col)];
        }
    }

    if let Some(east_slots) = east_slots {
        for row in 0..LOCAL_GRID_SIZE {
            tile.slots[slot(row, EAST_COL)] = east_slots[slot(row, WEST_COL)];
        }
    }

    prune_slots(grid, coord);
}

/// Clears the corner and non-lane interior slots of a tile
pub fn prune_slots(grid: &mut TileGrid, coord: TileCoord) {
    if let Some(tile) = grid.tile_mut(coord) {
        for index in CORNER_SLOTS.iter().chain(NON_LANE_SLOTS.iter()) {
            tile.slots[*index] = None;
        }
    }
}

/// Re-links a single tile with all four neighbors.
///
/// The south and west neighbors link *into* this tile, so they are re-run
/// as well. Linking is idempotent once every local grid exists.
pub fn relink_tile(grid: &mut TileGrid, coord: TileCoord) {
    link_borders(grid, coord);
    for direction in [Direction::South, Direction::West] {
        if let Some(neighbor) = grid.neighbor(coord, direction) {
            link_borders(grid, neighbor);
        }
    }
}

/// Builds and links the local grids of every tile
pub fn build_navigation_graph(grid: &mut TileGrid, graph: &mut LaneGraph) {
    let coords: Vec<TileCoord> = grid.coords().collect();

    for coord in &coords {
        build_local_grid(grid, graph, *coord);
    }
    for coord in &coords {
        link_borders(grid, *coord);
    }
    // Linking can copy a neighbor's slot into a pruned position; clear again
    for coord in &coords {
        prune_slots(grid, *coord);
    }

    debug!(
        "Built navigation graph for {} tiles ({} node slots allocated)",
        coords.len(),
        graph.node_capacity()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::types::LaneNodeId;

    fn built(width: usize, depth: usize) -> (TileGrid, LaneGraph) {
        let mut grid = TileGrid::new(width, depth, 1.0);
        let mut graph = LaneGraph::new();
        build_navigation_graph(&mut grid, &mut graph);
        (grid, graph)
    }

    #[test]
    fn local_grid_has_37_lane_nodes() {
        let (grid, _) = built(1, 1);
        let tile = grid.tile(TileCoord::new(0, 0)).unwrap();
        assert_eq!(tile.lane_nodes().count(), 37);
        for index in 0..LOCAL_SLOT_COUNT {
            assert_eq!(tile.node_at(index).is_none(), is_pruned_slot(index));
        }
    }

    #[test]
    fn north_border_is_shared_with_neighbor() {
        let (grid, graph) = built(1, 2);
        let south = grid.tile(TileCoord::new(0, 0)).unwrap();
        let north = grid.tile(TileCoord::new(0, 1)).unwrap();

        for col in 1..LOCAL_GRID_SIZE - 1 {
            let shared = south.node_at(slot(NORTH_ROW, col));
            assert!(shared.is_some());
            assert_eq!(shared, north.node_at(slot(SOUTH_ROW, col)));
        }

        let id: LaneNodeId = south.node_at(slot(NORTH_ROW, 2)).unwrap();
        let node = graph.node(id).unwrap();
        assert_eq!(node.origin_tile, TileCoord::new(0, 1));
        assert!((node.position.z - 1.0).abs() < 1e-6);
    }

    #[test]
    fn east_border_is_shared_with_neighbor() {
        let (grid, _) = built(2, 1);
        let west = grid.tile(TileCoord::new(0, 0)).unwrap();
        let east = grid.tile(TileCoord::new(1, 0)).unwrap();

        for row in 1..LOCAL_GRID_SIZE - 1 {
            assert_eq!(
                west.node_at(slot(row, EAST_COL)),
                east.node_at(slot(row, WEST_COL))
            );
        }
    }

    #[test]
    fn relinking_is_idempotent() {
        let (mut grid, _) = built(3, 3);
        let center = TileCoord::new(1, 1);
        let before = grid.tile(center).unwrap().slots;
        relink_tile(&mut grid, center);
        assert_eq!(grid.tile(center).unwrap().slots, before);
    }
}
