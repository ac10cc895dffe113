//! Tile Traffic Library
//!
//! Traffic-simulation core for a grid-based city: lane graph construction,
//! road shape classification, junction stop phases, vehicle agents and
//! tile-level path search.

pub mod simulation;
