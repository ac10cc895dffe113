//! The city tile grid
//!
//! A flat, row-major array of tiles addressed by (x, z). Neighbor links are
//! derived from coordinates, so re-typing a tile never disturbs them.

use anyhow::{bail, Context, Result};

use super::road_shape::RoadShape;
use super::stop_pattern::StopPattern;
use super::types::{
    Direction, LaneNodeId, Position, TileCoord, TileType, TrackId, LOCAL_GRID_OFFSETS,
    LOCAL_SLOT_COUNT,
};

/// Zoned (non-road) tile flavors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneType {
    Residential,
    Commercial,
    Industrial,
}

/// Road-only tile state: geometry and traffic control
#[derive(Debug, Clone, Default)]
pub struct RoadTile {
    pub shape: RoadShape,
    /// Ordered stop phases; empty for straights and curves
    pub phases: Vec<StopPattern>,
    /// Index into `phases` of the phase currently applied
    pub active_phase: usize,
    /// Seconds the active phase has been held
    pub phase_timer: f32,
}

impl RoadTile {
    pub fn is_junction(&self) -> bool {
        !self.phases.is_empty()
    }
}

/// What occupies a tile
#[derive(Debug, Clone, Default)]
pub enum TileKind {
    #[default]
    Empty,
    Zone(ZoneType),
    Road(RoadTile),
}

impl TileKind {
    pub fn from_type(tile_type: TileType) -> Self {
        match tile_type {
            TileType::None => TileKind::Empty,
            TileType::Residential => TileKind::Zone(ZoneType::Residential),
            TileType::Commercial => TileKind::Zone(ZoneType::Commercial),
            TileType::Industrial => TileKind::Zone(ZoneType::Industrial),
            TileType::Road => TileKind::Road(RoadTile::default()),
        }
    }

    pub fn tile_type(&self) -> TileType {
        match self {
            TileKind::Empty => TileType::None,
            TileKind::Zone(ZoneType::Residential) => TileType::Residential,
            TileKind::Zone(ZoneType::Commercial) => TileType::Commercial,
            TileKind::Zone(ZoneType::Industrial) => TileType::Industrial,
            TileKind::Road(_) => TileType::Road,
        }
    }

    pub fn as_road(&self) -> Option<&RoadTile> {
        match self {
            TileKind::Road(road) => Some(road),
            _ => None,
        }
    }

    pub fn as_road_mut(&mut self) -> Option<&mut RoadTile> {
        match self {
            TileKind::Road(road) => Some(road),
            _ => None,
        }
    }
}

/// One cell of the city grid
#[derive(Debug, Clone)]
pub struct Tile {
    pub coord: TileCoord,
    pub kind: TileKind,
    /// Local 7x7 lane grid; pruned slots stay `None`
    pub slots: [Option<LaneNodeId>; LOCAL_SLOT_COUNT],
    /// Tracks wired through this tile
    pub tracks: Vec<TrackId>,
}

impl Tile {
    pub fn new(coord: TileCoord) -> Self {
        Self {
            coord,
            kind: TileKind::Empty,
            slots: [None; LOCAL_SLOT_COUNT],
            tracks: Vec::new(),
        }
    }

    pub fn is_road(&self) -> bool {
        matches!(self.kind, TileKind::Road(_))
    }

    /// Lane node at a local slot, if one is present
    pub fn node_at(&self, slot: usize) -> Option<LaneNodeId> {
        self.slots.get(slot).copied().flatten()
    }

    /// All populated lane nodes in slot order
    pub fn lane_nodes(&self) -> impl Iterator<Item = LaneNodeId> + '_ {
        self.slots.iter().flatten().copied()
    }
}

/// Row-major grid of tiles
#[derive(Debug, Clone)]
pub struct TileGrid {
    width: usize,
    depth: usize,
    tile_size: f32,
    tiles: Vec<Tile>,
}

impl TileGrid {
    pub fn new(width: usize, depth: usize, tile_size: f32) -> Self {
        let tiles = (0..depth)
            .flat_map(|z| (0..width).map(move |x| Tile::new(TileCoord::new(x, z))))
            .collect();
        Self {
            width,
            depth,
            tile_size,
            tiles,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn tile_size(&self) -> f32 {
        self.tile_size
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn contains(&self, coord: TileCoord) -> bool {
        coord.x < self.width && coord.z < self.depth
    }

    /// Flat index of a coordinate
    pub fn index_of(&self, coord: TileCoord) -> Option<usize> {
        self.contains(coord).then(|| coord.z * self.width + coord.x)
    }

    /// Coordinate of a flat index
    pub fn coord_of(&self, index: usize) -> Option<TileCoord> {
        (index < self.tiles.len()).then(|| TileCoord::new(index % self.width, index / self.width))
    }

    /// Like `coord_of`, but out-of-range indices are an error
    pub fn checked_coord(&self, index: usize) -> Result<TileCoord> {
        self.coord_of(index).with_context(|| {
            format!(
                "Tile index {} outside {}x{} grid",
                index, self.width, self.depth
            )
        })
    }

    /// Like `index_of`, but out-of-range coordinates are an error
    pub fn checked_index(&self, coord: TileCoord) -> Result<usize> {
        match self.index_of(coord) {
            Some(index) => Ok(index),
            None => bail!(
                "Tile ({}, {}) outside {}x{} grid",
                coord.x,
                coord.z,
                self.width,
                self.depth
            ),
        }
    }

    pub fn tile(&self, coord: TileCoord) -> Option<&Tile> {
        self.index_of(coord).map(|index| &self.tiles[index])
    }

    pub fn tile_mut(&mut self, coord: TileCoord) -> Option<&mut Tile> {
        self.index_of(coord).map(move |index| &mut self.tiles[index])
    }

    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }

    pub fn coords(&self) -> impl Iterator<Item = TileCoord> + '_ {
        self.tiles.iter().map(|tile| tile.coord)
    }

    /// Neighboring coordinate in a direction, absent at the grid border
    pub fn neighbor(&self, coord: TileCoord, direction: Direction) -> Option<TileCoord> {
        let neighbor = match direction {
            Direction::North => TileCoord::new(coord.x, coord.z.checked_add(1)?),
            Direction::East => TileCoord::new(coord.x.checked_add(1)?, coord.z),
            Direction::South => TileCoord::new(coord.x, coord.z.checked_sub(1)?),
            Direction::West => TileCoord::new(coord.x.checked_sub(1)?, coord.z),
        };
        self.contains(neighbor).then_some(neighbor)
    }

    /// All existing neighbors in N, E, S, W order
    pub fn neighbors(&self, coord: TileCoord) -> impl Iterator<Item = (Direction, TileCoord)> + '_ {
        Direction::ALL
            .into_iter()
            .filter_map(move |direction| self.neighbor(coord, direction).map(|n| (direction, n)))
    }

    pub fn tile_type(&self, coord: TileCoord) -> Option<TileType> {
        self.tile(coord).map(|tile| tile.kind.tile_type())
    }

    pub fn is_road(&self, coord: TileCoord) -> bool {
        self.tile(coord).is_some_and(Tile::is_road)
    }

    /// Replace a tile's kind, returning the previous type.
    /// Lane nodes and tracks are left for the caller to rebuild.
    pub fn set_tile_type(&mut self, coord: TileCoord, tile_type: TileType) -> Result<TileType> {
        let tile = self
            .tile_mut(coord)
            .with_context(|| format!("Tile ({}, {}) not found", coord.x, coord.z))?;
        let previous = tile.kind.tile_type();
        if previous != tile_type {
            tile.kind = TileKind::from_type(tile_type);
        }
        Ok(previous)
    }

    /// World position of a tile's south-west corner
    pub fn tile_origin(&self, coord: TileCoord) -> Position {
        Position::new(
            coord.x as f32 * self.tile_size,
            0.0,
            coord.z as f32 * self.tile_size,
        )
    }

    /// World position of a tile's center
    pub fn tile_center(&self, coord: TileCoord) -> Position {
        let origin = self.tile_origin(coord);
        let half = self.tile_size * 0.5;
        Position::new(origin.x + half, 0.0, origin.z + half)
    }

    /// World position of a (row, col) slot in a tile's local grid
    pub fn slot_position(&self, coord: TileCoord, row: usize, col: usize) -> Position {
        let origin = self.tile_origin(coord);
        Position::new(
            origin.x + LOCAL_GRID_OFFSETS[col] * self.tile_size,
            0.0,
            origin.z + LOCAL_GRID_OFFSETS[row] * self.tile_size,
        )
    }
}
