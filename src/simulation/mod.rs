//! Standalone traffic simulation module
//!
//! Turns a grid of tiles into a lane graph, classifies and wires road
//! tiles, runs junction stop phases and moves vehicle agents. It can be
//! driven from the console without any rendering.

mod automata;
mod config;
mod lane_graph;
mod nav_builder;
mod pathfinder;
mod road_shape;
mod stop_pattern;
mod tile_grid;
mod track_wiring;
mod types;
mod world;

pub use automata::{Automata, StepResult};
pub use config::{
    SimConfig, DEFAULT_MAX_BRANCH_ATTEMPTS, DEFAULT_PHASE_DURATION, DEFAULT_SPAWN_CLEARANCE,
    DEFAULT_TILE_SIZE, DEFAULT_VEHICLE_SPEED,
};
pub use lane_graph::{LaneGraph, LaneNode, Track};
pub use nav_builder::{build_local_grid, build_navigation_graph, link_borders, prune_slots, relink_tile};
pub use pathfinder::{Adjacency, GridPathfinder};
pub use road_shape::{classify, neighbor_mask, RoadShape};
pub use stop_pattern::{advance_phase, apply_phase, build_phases, tick_phases, StopPattern};
pub use tile_grid::{RoadTile, Tile, TileGrid, TileKind, ZoneType};
pub use track_wiring::{
    clear_tracks, inbound_stop_slot, outbound_stop_slot, rewire, safe_spawn_track, wiring_table,
    TrackSpec,
};
pub use types::{
    is_pruned_slot, slot, slot_row_col, AutomataId, Direction, LaneNodeId, Position, SimId,
    TileCoord, TileType, TrackId, CORNER_SLOTS, EAST_COL, LOCAL_GRID_OFFSETS, LOCAL_GRID_SIZE,
    LOCAL_SLOT_COUNT, NON_LANE_SLOTS, NORTH_ROW, SOUTH_ROW, WEST_COL,
};
pub use world::{SimStats, SimWorld};
