//! Road shape classification
//!
//! A road tile's geometry is picked from which of its four neighbors are
//! also roads.

use std::fmt;

use super::tile_grid::TileGrid;
use super::types::{Direction, TileCoord};

/// The 11 canonical road tile geometries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RoadShape {
    #[default]
    StraightVertical,
    StraightHorizontal,
    CurveNorthEast,
    CurveSouthEast,
    CurveWestNorth,
    CurveWestSouth,
    TeeNorthEastSouth,
    TeeWestEastNorth,
    TeeWestSouthNorth,
    TeeWestSouthEast,
    Cross,
}

impl RoadShape {
    pub const ALL: [RoadShape; 11] = [
        RoadShape::StraightVertical,
        RoadShape::StraightHorizontal,
        RoadShape::CurveNorthEast,
        RoadShape::CurveSouthEast,
        RoadShape::CurveWestNorth,
        RoadShape::CurveWestSouth,
        RoadShape::TeeNorthEastSouth,
        RoadShape::TeeWestEastNorth,
        RoadShape::TeeWestSouthNorth,
        RoadShape::TeeWestSouthEast,
        RoadShape::Cross,
    ];

    /// Maps a neighbor mask (N=1, E=2, S=4, W=8) to a shape
    pub fn from_mask(mask: u8) -> RoadShape {
        match mask {
            0 | 1 | 4 | 5 => RoadShape::StraightVertical,
            2 | 8 | 10 => RoadShape::StraightHorizontal,
            3 => RoadShape::CurveNorthEast,
            6 => RoadShape::CurveSouthEast,
            7 => RoadShape::TeeNorthEastSouth,
            9 => RoadShape::CurveWestNorth,
            11 => RoadShape::TeeWestEastNorth,
            12 => RoadShape::CurveWestSouth,
            13 => RoadShape::TeeWestSouthNorth,
            14 => RoadShape::TeeWestSouthEast,
            15 => RoadShape::Cross,
            _ => RoadShape::StraightVertical,
        }
    }

    /// Sides of the tile this shape connects
    pub fn sides(self) -> &'static [Direction] {
        use Direction::*;
        match self {
            RoadShape::StraightVertical => &[North, South],
            RoadShape::StraightHorizontal => &[East, West],
            RoadShape::CurveNorthEast => &[North, East],
            RoadShape::CurveSouthEast => &[South, East],
            RoadShape::CurveWestNorth => &[West, North],
            RoadShape::CurveWestSouth => &[West, South],
            RoadShape::TeeNorthEastSouth => &[North, East, South],
            RoadShape::TeeWestEastNorth => &[West, East, North],
            RoadShape::TeeWestSouthNorth => &[West, South, North],
            RoadShape::TeeWestSouthEast => &[West, South, East],
            RoadShape::Cross => &[North, East, South, West],
        }
    }

    pub fn is_junction(self) -> bool {
        self.sides().len() >= 3
    }

    /// Single-character glyph for terminal maps
    pub fn glyph(self) -> char {
        match self {
            RoadShape::StraightVertical => '│',
            RoadShape::StraightHorizontal => '─',
            RoadShape::CurveNorthEast => '└',
            RoadShape::CurveSouthEast => '┌',
            RoadShape::CurveWestNorth => '┘',
            RoadShape::CurveWestSouth => '┐',
            RoadShape::TeeNorthEastSouth => '├',
            RoadShape::TeeWestEastNorth => '┴',
            RoadShape::TeeWestSouthNorth => '┤',
            RoadShape::TeeWestSouthEast => '┬',
            RoadShape::Cross => '┼',
        }
    }
}

impl fmt::Display for RoadShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Builds the 4-bit mask of neighbors that are road tiles
pub fn neighbor_mask(grid: &TileGrid, coord: TileCoord) -> u8 {
    grid.neighbors(coord)
        .filter(|(_, neighbor)| grid.is_road(*neighbor))
        .map(|(direction, _)| direction.bit())
        .fold(0, |mask, bit| mask | bit)
}

/// Classifies a tile's road shape from its neighbors
pub fn classify(grid: &TileGrid, coord: TileCoord) -> RoadShape {
    RoadShape::from_mask(neighbor_mask(grid, coord))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::types::TileType;

    #[test]
    fn every_mask_maps_to_its_table_entry() {
        let expected = [
            RoadShape::StraightVertical,
            RoadShape::StraightVertical,
            RoadShape::StraightHorizontal,
            RoadShape::CurveNorthEast,
            RoadShape::StraightVertical,
            RoadShape::StraightVertical,
            RoadShape::CurveSouthEast,
            RoadShape::TeeNorthEastSouth,
            RoadShape::StraightHorizontal,
            RoadShape::CurveWestNorth,
            RoadShape::StraightHorizontal,
            RoadShape::TeeWestEastNorth,
            RoadShape::CurveWestSouth,
            RoadShape::TeeWestSouthNorth,
            RoadShape::TeeWestSouthEast,
            RoadShape::Cross,
        ];
        for (mask, shape) in expected.iter().enumerate() {
            assert_eq!(RoadShape::from_mask(mask as u8), *shape, "mask {}", mask);
        }
        assert_eq!(RoadShape::from_mask(200), RoadShape::StraightVertical);
    }

    #[test]
    fn curve_sides_match_their_mask() {
        for shape in RoadShape::ALL {
            let mask: u8 = shape.sides().iter().map(|d| d.bit()).sum();
            if shape.sides().len() == 2 && mask != 5 && mask != 10 {
                assert_eq!(RoadShape::from_mask(mask), shape);
            }
        }
    }

    #[test]
    fn mask_reads_road_neighbors_only() {
        let mut grid = TileGrid::new(3, 3, 1.0);
        let center = TileCoord::new(1, 1);
        grid.set_tile_type(TileCoord::new(1, 2), TileType::Road).unwrap();
        grid.set_tile_type(TileCoord::new(2, 1), TileType::Road).unwrap();
        grid.set_tile_type(TileCoord::new(0, 1), TileType::Residential)
            .unwrap();

        assert_eq!(neighbor_mask(&grid, center), 3);
        assert_eq!(classify(&grid, center), RoadShape::CurveNorthEast);
    }

    #[test]
    fn corner_tile_ignores_missing_neighbors() {
        let mut grid = TileGrid::new(2, 2, 1.0);
        for coord in [TileCoord::new(0, 1), TileCoord::new(1, 0)] {
            grid.set_tile_type(coord, TileType::Road).unwrap();
        }
        assert_eq!(classify(&grid, TileCoord::new(0, 0)), RoadShape::CurveNorthEast);
        assert_eq!(classify(&grid, TileCoord::new(1, 1)), RoadShape::CurveWestSouth);
    }
}
