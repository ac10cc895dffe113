//! Lane graph arena
//!
//! Lane nodes and tracks live in flat stores addressed by `LaneNodeId` and
//! `TrackId`. Tiles and vehicles hold ids only, so rewiring a tile is a
//! matter of dropping ids and allocating fresh ones.

use std::collections::HashMap;

use log::debug;

use super::tile_grid::Tile;
use super::types::{AutomataId, LaneNodeId, Position, SimId, TileCoord, TrackId};

/// A point in a tile's local grid that tracks can attach to
#[derive(Debug, Clone)]
pub struct LaneNode {
    pub id: LaneNodeId,
    /// Tile whose local grid created this node
    pub origin_tile: TileCoord,
    pub position: Position,
    /// Current right-of-way state; vehicles may not pass a blocked node
    pub blocked: bool,
    /// Tracks that start or end here
    pub tracks: Vec<TrackId>,
}

/// A drivable segment between two lane nodes of one tile.
/// Vehicles may traverse it in either direction.
#[derive(Debug, Clone)]
pub struct Track {
    pub id: TrackId,
    pub tile: TileCoord,
    pub start_node: LaneNodeId,
    pub end_node: LaneNodeId,
    pub length: f32,
    pub is_safe_spawn: bool,
}

impl Track {
    /// The endpoint opposite `node`, or `None` if `node` is not an endpoint
    pub fn other_end(&self, node: LaneNodeId) -> Option<LaneNodeId> {
        if node == self.start_node {
            Some(self.end_node)
        } else if node == self.end_node {
            Some(self.start_node)
        } else {
            None
        }
    }

    pub fn touches(&self, node: LaneNodeId) -> bool {
        self.start_node == node || self.end_node == node
    }
}

/// Storage for every lane node and track in the simulation
#[derive(Debug, Default)]
pub struct LaneGraph {
    nodes: Vec<LaneNode>,
    tracks: HashMap<TrackId, Track>,
    next_track_id: usize,
    /// Vehicles currently traversing each track
    vehicles_on_tracks: HashMap<TrackId, Vec<AutomataId>>,
}

impl LaneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a new lane node
    pub fn add_node(&mut self, origin_tile: TileCoord, position: Position) -> LaneNodeId {
        let id = LaneNodeId(self.nodes.len());
        self.nodes.push(LaneNode {
            id,
            origin_tile,
            position,
            blocked: false,
            tracks: Vec::new(),
        });
        id
    }

    pub fn node(&self, id: LaneNodeId) -> Option<&LaneNode> {
        self.nodes.get(id.0)
    }

    pub fn node_mut(&mut self, id: LaneNodeId) -> Option<&mut LaneNode> {
        self.nodes.get_mut(id.0)
    }

    pub fn is_blocked(&self, id: LaneNodeId) -> bool {
        self.node(id).is_some_and(|node| node.blocked)
    }

    pub fn set_blocked(&mut self, id: LaneNodeId, blocked: bool) {
        if let Some(node) = self.node_mut(id) {
            node.blocked = blocked;
        }
    }

    /// Number of allocated node slots (including nodes orphaned by border linking)
    pub fn node_capacity(&self) -> usize {
        self.nodes.len()
    }

    pub fn track(&self, id: TrackId) -> Option<&Track> {
        self.tracks.get(&id)
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn tracks(&self) -> impl Iterator<Item = &Track> {
        self.tracks.values()
    }

    /// Tracks incident to a node
    pub fn tracks_at(&self, id: LaneNodeId) -> &[TrackId] {
        self.node(id).map(|node| node.tracks.as_slice()).unwrap_or(&[])
    }

    /// Creates a track between two nodes and registers it on both of them.
    /// Returns `None` if either node does not exist.
    pub fn add_track(
        &mut self,
        tile: TileCoord,
        start_node: LaneNodeId,
        end_node: LaneNodeId,
        is_safe_spawn: bool,
    ) -> Option<TrackId> {
        let start_pos = self.node(start_node)?.position;
        let end_pos = self.node(end_node)?.position;

        let id = TrackId(SimId(self.next_track_id));
        self.next_track_id += 1;

        self.tracks.insert(
            id,
            Track {
                id,
                tile,
                start_node,
                end_node,
                length: start_pos.distance(&end_pos),
                is_safe_spawn,
            },
        );

        self.nodes[start_node.0].tracks.push(id);
        if end_node != start_node {
            self.nodes[end_node.0].tracks.push(id);
        }

        Some(id)
    }

    /// Removes a track and unregisters it from its endpoints.
    /// Returns the vehicles that were on it.
    pub fn remove_track(&mut self, id: TrackId) -> Vec<AutomataId> {
        if let Some(track) = self.tracks.remove(&id) {
            for node_id in [track.start_node, track.end_node] {
                if let Some(node) = self.nodes.get_mut(node_id.0) {
                    node.tracks.retain(|track_id| *track_id != id);
                }
            }
        }
        self.vehicles_on_tracks.remove(&id).unwrap_or_default()
    }

    /// Drops every track wired through a tile.
    /// Returns the vehicles that were on those tracks.
    pub fn clear_tile_tracks(&mut self, tile: &mut Tile) -> Vec<AutomataId> {
        let mut displaced = Vec::new();
        for track_id in tile.tracks.drain(..) {
            displaced.extend(self.remove_track(track_id));
        }
        debug!(
            "Cleared tracks on tile ({}, {}), {} vehicles displaced",
            tile.coord.x,
            tile.coord.z,
            displaced.len()
        );
        displaced
    }

    /// Record that a vehicle is now traversing a track
    pub fn attach_vehicle(&mut self, track: TrackId, vehicle: AutomataId) {
        let vehicles = self.vehicles_on_tracks.entry(track).or_default();
        if !vehicles.contains(&vehicle) {
            vehicles.push(vehicle);
        }
    }

    /// Record that a vehicle has left a track
    pub fn detach_vehicle(&mut self, track: TrackId, vehicle: AutomataId) {
        if let Some(vehicles) = self.vehicles_on_tracks.get_mut(&track) {
            vehicles.retain(|id| *id != vehicle);
            if vehicles.is_empty() {
                self.vehicles_on_tracks.remove(&track);
            }
        }
    }

    pub fn vehicles_on_track(&self, track: TrackId) -> &[AutomataId] {
        self.vehicles_on_tracks
            .get(&track)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
