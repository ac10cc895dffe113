//! Core types for the traffic simulation
//!
//! Identifiers, positions, tile addressing and the fixed local-grid layout
//! shared by every other module.

/// A unique identifier for simulation entities
/// This is a simple wrapper around a usize for type safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SimId(pub usize);

/// Index of a lane node in the lane graph arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LaneNodeId(pub usize);

/// A wrapper type for track IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrackId(pub SimId);

/// A wrapper type for vehicle agent IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AutomataId(pub SimId);

/// Integer address of a tile in the city grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileCoord {
    pub x: usize,
    pub z: usize,
}

impl TileCoord {
    pub fn new(x: usize, z: usize) -> Self {
        Self { x, z }
    }

    pub fn manhattan(&self, other: &TileCoord) -> usize {
        self.x.abs_diff(other.x) + self.z.abs_diff(other.z)
    }
}

/// What a tile has been painted as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TileType {
    #[default]
    None,
    Residential,
    Commercial,
    Industrial,
    Road,
}

/// One of the four sides of a tile. North is +z, east is +x.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Bit used when building a neighbor mask (N=1, E=2, S=4, W=8)
    pub fn bit(self) -> u8 {
        match self {
            Direction::North => 1,
            Direction::East => 2,
            Direction::South => 4,
            Direction::West => 8,
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::East => Direction::West,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
        }
    }
}

/// A 3D position in the simulation
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Position {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn distance(&self, other: &Position) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    pub fn lerp(&self, other: &Position, t: f32) -> Position {
        Position {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
            z: self.z + (other.z - self.z) * t,
        }
    }

    /// Calculate the angle from this position to another (Y-axis rotation)
    pub fn angle_to(&self, other: &Position) -> f32 {
        let dx = other.x - self.x;
        let dz = other.z - self.z;
        let direction_len = (dx * dx + dz * dz).sqrt();
        if direction_len > 0.0 {
            (dx / direction_len).atan2(dz / direction_len)
        } else {
            0.0
        }
    }
}

/// Side length of a tile's local lane grid
pub const LOCAL_GRID_SIZE: usize = 7;

/// Number of slots in a tile's local lane grid
pub const LOCAL_SLOT_COUNT: usize = LOCAL_GRID_SIZE * LOCAL_GRID_SIZE;

/// Fractional offsets of the local grid rows/columns across a tile.
/// Rows 2 and 4 (and columns 2 and 4) are lane centerlines, 1 and 5 are
/// stop lines, 3 is the tile's center line.
pub const LOCAL_GRID_OFFSETS: [f32; LOCAL_GRID_SIZE] = [
    0.0,
    1.0 / 12.0,
    1.0 / 3.0,
    0.5,
    2.0 / 3.0,
    11.0 / 12.0,
    1.0,
];

/// Row index of the north edge of the local grid
pub const NORTH_ROW: usize = LOCAL_GRID_SIZE - 1;

/// Row index of the south edge of the local grid
pub const SOUTH_ROW: usize = 0;

/// Column index of the east edge of the local grid
pub const EAST_COL: usize = LOCAL_GRID_SIZE - 1;

/// Column index of the west edge of the local grid
pub const WEST_COL: usize = 0;

/// Flatten a (row, col) local grid address into a slot index
pub const fn slot(row: usize, col: usize) -> usize {
    row * LOCAL_GRID_SIZE + col
}

/// Split a slot index back into (row, col)
pub const fn slot_row_col(slot: usize) -> (usize, usize) {
    (slot / LOCAL_GRID_SIZE, slot % LOCAL_GRID_SIZE)
}

/// Corner slots; never carry a lane node
pub const CORNER_SLOTS: [usize; 4] = [
    slot(SOUTH_ROW, WEST_COL),
    slot(SOUTH_ROW, EAST_COL),
    slot(NORTH_ROW, WEST_COL),
    slot(NORTH_ROW, EAST_COL),
];

/// Interior slots that sit between lanes and never carry a lane node
pub const NON_LANE_SLOTS: [usize; 8] = [
    slot(1, 1),
    slot(1, 3),
    slot(1, 5),
    slot(3, 1),
    slot(3, 5),
    slot(5, 1),
    slot(5, 3),
    slot(5, 5),
];

/// Returns true if the slot is pruned from every tile's local grid
pub fn is_pruned_slot(slot: usize) -> bool {
    CORNER_SLOTS.contains(&slot) || NON_LANE_SLOTS.contains(&slot)
}
