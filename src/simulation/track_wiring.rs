//! Automatic track wiring
//!
//! Each road shape has a fixed set of (from, to) slot pairs in the tile's
//! local grid. Lanes run at rows/cols 2 and 4; traffic keeps right, so a
//! vehicle entering from the north drives down column 2, one entering from
//! the south drives up column 4, and so on. Junctions add stop-line nodes
//! (rows/cols 1 and 5) and a ring through the center lattice.

use log::debug;

use super::lane_graph::LaneGraph;
use super::road_shape::RoadShape;
use super::tile_grid::{Tile, TileGrid};
use super::types::{slot, AutomataId, Direction, TileCoord, TrackId};

/// One entry of a wiring table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackSpec {
    pub from: usize,
    pub to: usize,
    pub safe_spawn: bool,
}

const fn spec(from: usize, to: usize) -> TrackSpec {
    TrackSpec {
        from,
        to,
        safe_spawn: false,
    }
}

const fn spawn(from: usize, to: usize) -> TrackSpec {
    TrackSpec {
        from,
        to,
        safe_spawn: true,
    }
}

const STRAIGHT_VERTICAL: [TrackSpec; 2] = [
    spec(slot(6, 2), slot(0, 2)),
    spawn(slot(0, 4), slot(6, 4)),
];

const STRAIGHT_HORIZONTAL: [TrackSpec; 2] = [
    spawn(slot(2, 0), slot(2, 6)),
    spec(slot(4, 6), slot(4, 0)),
];

const CURVE_NORTH_EAST: [TrackSpec; 4] = [
    spawn(slot(6, 2), slot(2, 2)),
    spec(slot(2, 2), slot(2, 6)),
    spec(slot(4, 6), slot(4, 4)),
    spec(slot(4, 4), slot(6, 4)),
];

const CURVE_SOUTH_EAST: [TrackSpec; 4] = [
    spawn(slot(0, 4), slot(2, 4)),
    spec(slot(2, 4), slot(2, 6)),
    spec(slot(4, 6), slot(4, 2)),
    spec(slot(4, 2), slot(0, 2)),
];

const CURVE_WEST_NORTH: [TrackSpec; 4] = [
    spawn(slot(2, 0), slot(2, 4)),
    spec(slot(2, 4), slot(6, 4)),
    spec(slot(6, 2), slot(4, 2)),
    spec(slot(4, 2), slot(4, 0)),
];

const CURVE_WEST_SOUTH: [TrackSpec; 4] = [
    spawn(slot(2, 0), slot(2, 2)),
    spec(slot(2, 2), slot(0, 2)),
    spec(slot(0, 4), slot(4, 4)),
    spec(slot(4, 4), slot(4, 0)),
];

/// Center ring shared by every junction; each corner touches two sides
const JUNCTION_RING: [TrackSpec; 4] = [
    spec(slot(2, 2), slot(2, 4)),
    spec(slot(2, 4), slot(4, 4)),
    spec(slot(4, 4), slot(4, 2)),
    spec(slot(4, 2), slot(2, 2)),
];

/// Stop-line node of the lane that enters the tile from `side`
pub fn inbound_stop_slot(side: Direction) -> usize {
    match side {
        Direction::North => slot(5, 2),
        Direction::South => slot(1, 4),
        Direction::East => slot(4, 5),
        Direction::West => slot(2, 1),
    }
}

/// Stop-line node of the lane that leaves the tile through `side`
pub fn outbound_stop_slot(side: Direction) -> usize {
    match side {
        Direction::North => slot(5, 4),
        Direction::South => slot(1, 2),
        Direction::East => slot(2, 5),
        Direction::West => slot(4, 1),
    }
}

/// Border node of the lane that enters the tile from `side`
fn inbound_edge_slot(side: Direction) -> usize {
    match side {
        Direction::North => slot(6, 2),
        Direction::South => slot(0, 4),
        Direction::East => slot(4, 6),
        Direction::West => slot(2, 0),
    }
}

/// Border node of the lane that leaves the tile through `side`
fn outbound_edge_slot(side: Direction) -> usize {
    match side {
        Direction::North => slot(6, 4),
        Direction::South => slot(0, 2),
        Direction::East => slot(2, 6),
        Direction::West => slot(4, 0),
    }
}

/// Ring corner each stop line feeds into
fn ring_slot(stop: usize) -> usize {
    match stop {
        s if s == slot(5, 2) || s == slot(4, 1) => slot(4, 2),
        s if s == slot(5, 4) || s == slot(4, 5) => slot(4, 4),
        s if s == slot(1, 4) || s == slot(2, 5) => slot(2, 4),
        _ => slot(2, 2),
    }
}

/// Inbound and outbound stubs for one junction side
fn junction_side(side: Direction, spawn_here: bool) -> [TrackSpec; 4] {
    let inbound_stop = inbound_stop_slot(side);
    let outbound_stop = outbound_stop_slot(side);
    [
        TrackSpec {
            from: inbound_edge_slot(side),
            to: inbound_stop,
            safe_spawn: spawn_here,
        },
        spec(inbound_stop, ring_slot(inbound_stop)),
        spec(ring_slot(outbound_stop), outbound_stop),
        spec(outbound_stop, outbound_edge_slot(side)),
    ]
}

/// The two sides whose inbound lanes are the junction's through lanes
fn through_sides(shape: RoadShape) -> [Direction; 2] {
    match shape {
        RoadShape::TeeWestEastNorth | RoadShape::TeeWestSouthEast => {
            [Direction::West, Direction::East]
        }
        _ => [Direction::North, Direction::South],
    }
}

/// The full wiring table for a shape
pub fn wiring_table(shape: RoadShape) -> Vec<TrackSpec> {
    match shape {
        RoadShape::StraightVertical => STRAIGHT_VERTICAL.to_vec(),
        RoadShape::StraightHorizontal => STRAIGHT_HORIZONTAL.to_vec(),
        RoadShape::CurveNorthEast => CURVE_NORTH_EAST.to_vec(),
        RoadShape::CurveSouthEast => CURVE_SOUTH_EAST.to_vec(),
        RoadShape::CurveWestNorth => CURVE_WEST_NORTH.to_vec(),
        RoadShape::CurveWestSouth => CURVE_WEST_SOUTH.to_vec(),
        _ => {
            let through = through_sides(shape);
            let mut table: Vec<TrackSpec> = shape
                .sides()
                .iter()
                .flat_map(|side| junction_side(*side, through.contains(side)))
                .collect();
            table.extend_from_slice(&JUNCTION_RING);
            table
        }
    }
}

/// Drops every track of a tile. Returns the vehicles that were riding them.
pub fn clear_tracks(grid: &mut TileGrid, graph: &mut LaneGraph, coord: TileCoord) -> Vec<AutomataId> {
    match grid.tile_mut(coord) {
        Some(tile) => graph.clear_tile_tracks(tile),
        None => Vec::new(),
    }
}

/// Rebuilds a tile's tracks for a shape.
///
/// Existing tracks are removed first. Pairs touching an empty slot are
/// skipped. Returns the vehicles displaced by the removal.
pub fn rewire(
    grid: &mut TileGrid,
    graph: &mut LaneGraph,
    coord: TileCoord,
    shape: RoadShape,
) -> Vec<AutomataId> {
    let Some(tile) = grid.tile_mut(coord) else {
        return Vec::new();
    };
    let displaced = graph.clear_tile_tracks(tile);

    for entry in wiring_table(shape) {
        let (Some(from), Some(to)) = (tile.node_at(entry.from), tile.node_at(entry.to)) else {
            debug!(
                "Skipping track {} -> {} on tile ({}, {}): empty slot",
                entry.from, entry.to, coord.x, coord.z
            );
            continue;
        };
        if let Some(track) = graph.add_track(coord, from, to, entry.safe_spawn) {
            tile.tracks.push(track);
        }
    }

    debug!(
        "Wired tile ({}, {}) as {}: {} tracks",
        coord.x,
        coord.z,
        shape,
        tile.tracks.len()
    );

    displaced
}

/// First safe-spawn track of a tile, if any
pub fn safe_spawn_track(tile: &Tile, graph: &LaneGraph) -> Option<TrackId> {
    tile.tracks
        .iter()
        .copied()
        .find(|id| graph.track(*id).is_some_and(|track| track.is_safe_spawn))
}
