//! Tunable parameters for the traffic simulation

/// Default world units per tile
pub const DEFAULT_TILE_SIZE: f32 = 1.0;

/// Default vehicle speed in world units per second
pub const DEFAULT_VEHICLE_SPEED: f32 = 0.5;

/// Default number of random branch picks before a vehicle gives up and waits
pub const DEFAULT_MAX_BRANCH_ATTEMPTS: u32 = 16;

/// Default time a junction holds each stop phase, in seconds
pub const DEFAULT_PHASE_DURATION: f32 = 4.0;

/// Default minimum gap between a newly spawned vehicle and one already on the spawn track
pub const DEFAULT_SPAWN_CLEARANCE: f32 = 0.2;

/// Simulation settings
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// World units per tile
    pub tile_size: f32,
    /// Vehicle speed in world units per second
    pub vehicle_speed: f32,
    /// Random branch picks before falling back to waiting
    pub max_branch_attempts: u32,
    /// Seconds each junction stop phase is held
    pub phase_duration: f32,
    /// Use 8-directional tile path search instead of 4-directional
    pub diagonal_paths: bool,
    /// Minimum gap to the nearest vehicle on a spawn track
    pub spawn_clearance: f32,
    /// Seed for reproducible runs; entropy-seeded when absent
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tile_size: DEFAULT_TILE_SIZE,
            vehicle_speed: DEFAULT_VEHICLE_SPEED,
            max_branch_attempts: DEFAULT_MAX_BRANCH_ATTEMPTS,
            phase_duration: DEFAULT_PHASE_DURATION,
            diagonal_paths: false,
            spawn_clearance: DEFAULT_SPAWN_CLEARANCE,
            seed: None,
        }
    }
}

impl SimConfig {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }
}
