//! Main simulation world that ties everything together
//!
//! Owns the tile grid, lane graph, vehicles and path finder, and drives
//! them from a single `tick`: pending tile rebuilds first, then vehicle
//! steps, then junction phase timers.

use std::collections::{BTreeMap, BTreeSet};

use anyhow::Result;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;

use super::automata::{Automata, StepResult};
use super::config::SimConfig;
use super::lane_graph::LaneGraph;
use super::nav_builder::{build_navigation_graph, relink_tile};
use super::pathfinder::{Adjacency, GridPathfinder};
use super::road_shape::{classify, RoadShape};
use super::stop_pattern::{advance_phase, apply_phase, build_phases, tick_phases};
use super::tile_grid::{TileGrid, TileKind};
use super::track_wiring::{clear_tracks, rewire, safe_spawn_track};
use super::types::{AutomataId, SimId, TileCoord, TileType};

/// Running totals for the headless summary
#[derive(Debug, Clone, Default)]
pub struct SimStats {
    pub vehicles_spawned: usize,
    /// Vehicles removed at dead ends
    pub dead_ends: usize,
    /// Vehicles removed because their track was rewired away
    pub displaced: usize,
    /// Explicit despawns
    pub despawned: usize,
}

impl SimStats {
    pub fn vehicles_removed(&self) -> usize {
        self.dead_ends + self.displaced + self.despawned
    }
}

/// The main simulation world
pub struct SimWorld {
    config: SimConfig,

    /// City tiles
    pub grid: TileGrid,

    /// Lane nodes and tracks
    pub lanes: LaneGraph,

    /// Live vehicles, stepped in id order
    pub vehicles: BTreeMap<AutomataId, Automata>,

    /// Tile-level path search
    pathfinder: GridPathfinder,

    /// Tiles edited since the last tick, plus their neighbors
    pending: BTreeSet<TileCoord>,

    /// The subset of `pending` that was re-typed directly
    edited: BTreeSet<TileCoord>,

    /// Next ID to assign
    next_id: usize,

    /// Simulation time
    pub time: f32,

    rng: StdRng,

    pub stats: SimStats,
}

impl SimWorld {
    pub fn new(width: usize, depth: usize, config: SimConfig) -> Self {
        let mut grid = TileGrid::new(width, depth, config.tile_size);
        let mut lanes = LaneGraph::new();
        build_navigation_graph(&mut grid, &mut lanes);

        let adjacency = if config.diagonal_paths {
            Adjacency::Eight
        } else {
            Adjacency::Four
        };
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Self {
            pathfinder: GridPathfinder::new(width, depth, adjacency),
            config,
            grid,
            lanes,
            vehicles: BTreeMap::new(),
            pending: BTreeSet::new(),
            edited: BTreeSet::new(),
            next_id: 0,
            time: 0.0,
            rng,
            stats: SimStats::default(),
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    fn next_sim_id(&mut self) -> SimId {
        let id = SimId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Re-type a tile. The tile and its neighbors are rebuilt on the next tick.
    pub fn set_tile_type(&mut self, x: usize, z: usize, tile_type: TileType) -> Result<()> {
        let coord = TileCoord::new(x, z);
        let previous = self.grid.set_tile_type(coord, tile_type)?;
        if previous == tile_type {
            return Ok(());
        }

        debug!("Tile ({}, {}) {:?} -> {:?}", x, z, previous, tile_type);
        self.pending.insert(coord);
        self.edited.insert(coord);
        let neighbors: Vec<TileCoord> = self.grid.neighbors(coord).map(|(_, n)| n).collect();
        self.pending.extend(neighbors);
        Ok(())
    }

    pub fn tile_type(&self, x: usize, z: usize) -> Option<TileType> {
        self.grid.tile_type(TileCoord::new(x, z))
    }

    /// Road shape of a tile, `None` for non-road tiles
    pub fn road_shape(&self, x: usize, z: usize) -> Option<RoadShape> {
        self.grid
            .tile(TileCoord::new(x, z))
            .and_then(|tile| tile.kind.as_road())
            .map(|road| road.shape)
    }

    pub fn has_pending_rebuilds(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Rebuild every tile queued by `set_tile_type`. Returns how many were processed.
    pub fn flush_pending(&mut self) -> usize {
        let pending = std::mem::take(&mut self.pending);
        let edited = std::mem::take(&mut self.edited);
        let processed = pending.len();
        for coord in pending {
            // A re-typed tile may hold tracks from its previous life; neighbors
            // whose shape is unchanged keep theirs
            self.refresh_tile(coord, edited.contains(&coord));
        }
        processed
    }

    /// Re-link, re-classify, re-wire and re-phase a tile and its four neighbors.
    ///
    /// Local grids are allocated once in `new`, so the relink only restores
    /// border sharing and leaves an intact grid unchanged.
    pub fn rebuild_tile_graph(&mut self, tile_index: usize) -> Result<()> {
        let coord = self.grid.checked_coord(tile_index)?;
        relink_tile(&mut self.grid, coord);

        let neighbors: Vec<TileCoord> = self.grid.neighbors(coord).map(|(_, n)| n).collect();
        self.refresh_tile(coord, true);
        for neighbor in neighbors {
            self.refresh_tile(neighbor, false);
        }
        self.pending.remove(&coord);
        self.edited.remove(&coord);
        Ok(())
    }

    /// Bring one tile's tracks and phases in line with its type and neighbors
    fn refresh_tile(&mut self, coord: TileCoord, force: bool) {
        let Some((current_shape, has_tracks)) = self.grid.tile(coord).map(|tile| {
            let shape = match &tile.kind {
                TileKind::Road(road) => Some(road.shape),
                _ => None,
            };
            (shape, !tile.tracks.is_empty())
        }) else {
            return;
        };

        let displaced = match current_shape {
            Some(current_shape) => {
                let shape = classify(&self.grid, coord);
                if !force && shape == current_shape && has_tracks {
                    return;
                }

                let displaced = rewire(&mut self.grid, &mut self.lanes, coord, shape);
                if let Some(road) = self
                    .grid
                    .tile_mut(coord)
                    .and_then(|tile| tile.kind.as_road_mut())
                {
                    road.shape = shape;
                    road.phases = build_phases(shape);
                }
                apply_phase(&mut self.grid, &mut self.lanes, coord, 0);
                displaced
            }
            None => {
                if !has_tracks && !force {
                    return;
                }
                let displaced = clear_tracks(&mut self.grid, &mut self.lanes, coord);
                apply_phase(&mut self.grid, &mut self.lanes, coord, 0);
                displaced
            }
        };

        for id in displaced {
            if self.vehicles.remove(&id).is_some() {
                self.stats.displaced += 1;
                debug!("Vehicle {:?} removed by rewire of ({}, {})", id, coord.x, coord.z);
            }
        }
    }

    /// Spawn a vehicle on a road tile's safe-spawn track.
    ///
    /// Fails (returns false) for non-road tiles, tiles without a spawn
    /// track, a blocked spawn node, or a spawn track whose start is
    /// still occupied.
    pub fn try_spawn_vehicle(&mut self, x: usize, z: usize) -> bool {
        let coord = TileCoord::new(x, z);
        let Some(tile) = self.grid.tile(coord).filter(|tile| tile.is_road()) else {
            return false;
        };
        let Some(track_id) = safe_spawn_track(tile, &self.lanes) else {
            return false;
        };
        let Some(track) = self.lanes.track(track_id) else {
            return false;
        };
        if self.lanes.is_blocked(track.start_node) {
            return false;
        }

        let clearance = self.config.spawn_clearance;
        let start_node = track.start_node;
        let crowded = self
            .lanes
            .vehicles_on_track(track_id)
            .iter()
            .filter_map(|id| self.vehicles.get(id))
            .any(|vehicle| {
                let from_start = if vehicle.root_node == start_node {
                    vehicle.distance_along_track
                } else {
                    track.length - vehicle.distance_along_track
                };
                from_start < clearance
            });
        if crowded {
            return false;
        }

        let id = AutomataId(self.next_sim_id());
        let Some(vehicle) = Automata::spawn(id, track_id, &mut self.lanes) else {
            return false;
        };
        debug!("Spawned vehicle {:?} on tile ({}, {})", id, x, z);
        self.vehicles.insert(id, vehicle);
        self.stats.vehicles_spawned += 1;
        true
    }

    /// Try to spawn up to `count` vehicles on randomly chosen road tiles
    pub fn spawn_random_vehicles(&mut self, count: usize) -> usize {
        let roads: Vec<TileCoord> = self
            .grid
            .tiles()
            .filter(|tile| tile.is_road())
            .map(|tile| tile.coord)
            .collect();

        let mut spawned = 0;
        for _ in 0..count {
            let Some(coord) = roads.choose(&mut self.rng).copied() else {
                break;
            };
            if self.try_spawn_vehicle(coord.x, coord.z) {
                spawned += 1;
            }
        }
        if count > 0 {
            info!("Spawned {} of {} requested vehicles", spawned, count);
        }
        spawned
    }

    /// Remove a vehicle and its track bookkeeping
    pub fn despawn_vehicle(&mut self, id: AutomataId) -> bool {
        let Some(vehicle) = self.vehicles.remove(&id) else {
            return false;
        };
        self.lanes.detach_vehicle(vehicle.current_track, id);
        self.stats.despawned += 1;
        true
    }

    /// Step every vehicle once; dead-ended vehicles are removed
    pub fn tick_vehicles(&mut self, delta_secs: f32) -> Vec<(AutomataId, StepResult)> {
        let speed = self.config.vehicle_speed;
        let attempts = self.config.max_branch_attempts;
        let mut results = Vec::with_capacity(self.vehicles.len());

        for (id, vehicle) in self.vehicles.iter_mut() {
            let result = vehicle.step(delta_secs, speed, attempts, &mut self.lanes, &mut self.rng);
            results.push((*id, result));
        }

        let removed: Vec<AutomataId> = self
            .vehicles
            .values()
            .filter(|vehicle| vehicle.marked_for_removal)
            .map(|vehicle| vehicle.id)
            .collect();
        for id in removed {
            if let Some(vehicle) = self.vehicles.remove(&id) {
                self.lanes.detach_vehicle(vehicle.current_track, id);
                self.stats.dead_ends += 1;
                debug!("Vehicle {:?} reached a dead end", id);
            }
        }

        results
    }

    /// Move a junction to its next stop phase
    pub fn advance_phase(&mut self, x: usize, z: usize) -> Option<usize> {
        advance_phase(&mut self.grid, &mut self.lanes, TileCoord::new(x, z))
    }

    /// Tile path between two flat tile indices over road tiles.
    /// The endpoints themselves may be any tile type.
    pub fn find_tile_path(&mut self, start_index: usize, end_index: usize) -> Result<Vec<TileCoord>> {
        self.grid.checked_coord(start_index)?;
        self.grid.checked_coord(end_index)?;

        for (index, tile) in self.grid.tiles().enumerate() {
            let passable = tile.is_road() || index == start_index || index == end_index;
            self.pathfinder.set_obstacle(index, !passable);
        }
        Ok(self.pathfinder.find_path(start_index, end_index))
    }

    /// Main simulation tick
    pub fn tick(&mut self, delta_secs: f32) {
        self.time += delta_secs;

        // Tiles must be rewired before any vehicle steps against them
        if self.has_pending_rebuilds() {
            self.flush_pending();
        }

        self.tick_vehicles(delta_secs);

        tick_phases(
            &mut self.grid,
            &mut self.lanes,
            delta_secs,
            self.config.phase_duration,
        );
    }

    /// Lay out a road every third row and column, then build it
    pub fn create_test_world(width: usize, depth: usize, config: SimConfig) -> Result<Self> {
        let mut world = Self::new(width, depth, config);
        for z in 0..depth {
            for x in 0..width {
                let tile_type = if x % 3 == 0 || z % 3 == 0 {
                    TileType::Road
                } else {
                    match (x + z) % 3 {
                        0 => TileType::Residential,
                        1 => TileType::Commercial,
                        _ => TileType::Industrial,
                    }
                };
                world.set_tile_type(x, z, tile_type)?;
            }
        }
        world.flush_pending();
        info!(
            "Created {}x{} world with {} road tiles and {} tracks",
            width,
            depth,
            world.road_tile_count(),
            world.lanes.track_count()
        );
        Ok(world)
    }

    pub fn road_tile_count(&self) -> usize {
        self.grid.tiles().filter(|tile| tile.is_road()).count()
    }

    pub fn junction_count(&self) -> usize {
        self.grid
            .tiles()
            .filter_map(|tile| tile.kind.as_road())
            .filter(|road| road.is_junction())
            .count()
    }

    /// Print a summary of the world state
    pub fn print_summary(&self) {
        println!("=== Traffic Simulation Summary ===");
        println!("Time: {:.2}s", self.time);
        println!(
            "Tiles: {}x{}, Roads: {}, Junctions: {}",
            self.grid.width(),
            self.grid.depth(),
            self.road_tile_count(),
            self.junction_count()
        );
        println!("Tracks: {}", self.lanes.track_count());
        println!("Vehicles: {}", self.vehicles.len());

        if !self.vehicles.is_empty() {
            println!("--- Active Vehicles ---");
            for vehicle in self.vehicles.values() {
                println!(
                    "  Vehicle {:?}: position=({:.2}, {:.2}), track={:?}, along={:.2}",
                    vehicle.id.0 .0,
                    vehicle.position.x,
                    vehicle.position.z,
                    vehicle.current_track.0 .0,
                    vehicle.distance_along_track
                );
            }
        }
    }

    /// Draw the tile grid in the terminal, north at the top
    pub fn draw_map(&self) {
        let tile_size = self.grid.tile_size();
        let occupied: BTreeSet<TileCoord> = self
            .vehicles
            .values()
            .map(|vehicle| {
                TileCoord::new(
                    (vehicle.position.x / tile_size).max(0.0) as usize,
                    (vehicle.position.z / tile_size).max(0.0) as usize,
                )
            })
            .collect();

        println!("\n=== World Map ===");
        println!("Legend: road shapes as box glyphs, C=Vehicle, .=Non-road");
        println!();
        for z in (0..self.grid.depth()).rev() {
            let line: String = (0..self.grid.width())
                .map(|x| {
                    let coord = TileCoord::new(x, z);
                    if occupied.contains(&coord) {
                        return 'C';
                    }
                    self.grid
                        .tile(coord)
                        .and_then(|tile| tile.kind.as_road())
                        .map(|road| road.shape.glyph())
                        .unwrap_or('.')
                })
                .collect();
            println!("{}", line);
        }
        println!();
    }
}
