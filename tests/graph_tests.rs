//! Lane graph construction, classification, wiring and stop phases

use std::collections::HashSet;

use tile_traffic::simulation::{
    build_phases, inbound_stop_slot, slot, Direction, LaneNodeId, RoadShape, SimConfig, SimWorld,
    TileCoord, TileType, EAST_COL, LOCAL_GRID_SIZE, NORTH_ROW, SOUTH_ROW, WEST_COL,
};

fn all_road(width: usize, depth: usize) -> SimWorld {
    let mut world = SimWorld::new(width, depth, SimConfig::with_seed(11));
    for z in 0..depth {
        for x in 0..width {
            world.set_tile_type(x, z, TileType::Road).unwrap();
        }
    }
    world.flush_pending();
    world
}

#[test]
fn adjacent_tiles_share_border_nodes() {
    let world = all_road(4, 4);
    for tile in world.grid.tiles() {
        if let Some(north) = world
            .grid
            .neighbor(tile.coord, Direction::North)
            .and_then(|coord| world.grid.tile(coord))
        {
            for col in 1..LOCAL_GRID_SIZE - 1 {
                let ours = tile.node_at(slot(NORTH_ROW, col));
                assert!(ours.is_some());
                assert_eq!(ours, north.node_at(slot(SOUTH_ROW, col)));
            }
        }
        if let Some(east) = world
            .grid
            .neighbor(tile.coord, Direction::East)
            .and_then(|coord| world.grid.tile(coord))
        {
            for row in 1..LOCAL_GRID_SIZE - 1 {
                let ours = tile.node_at(slot(row, EAST_COL));
                assert!(ours.is_some());
                assert_eq!(ours, east.node_at(slot(row, WEST_COL)));
            }
        }
    }
}

#[test]
fn blocking_a_shared_node_is_seen_from_both_tiles() {
    let mut world = all_road(2, 1);
    let west_view = world
        .grid
        .tile(TileCoord::new(0, 0))
        .and_then(|tile| tile.node_at(slot(2, EAST_COL)))
        .unwrap();
    world.lanes.set_blocked(west_view, true);

    let east_view = world
        .grid
        .tile(TileCoord::new(1, 0))
        .and_then(|tile| tile.node_at(slot(2, WEST_COL)))
        .unwrap();
    assert!(world.lanes.is_blocked(east_view));
}

#[test]
fn center_shape_follows_every_neighbor_mask() {
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

    for (mask, shape) in expected.into_iter().enumerate() {
        let mut world = SimWorld::new(3, 3, SimConfig::with_seed(1));
        world.set_tile_type(1, 1, TileType::Road).unwrap();
        let neighbors = [(1, 2), (2, 1), (1, 0), (0, 1)];
        for (bit, (x, z)) in neighbors.into_iter().enumerate() {
            if mask & (1 << bit) != 0 {
                world.set_tile_type(x, z, TileType::Road).unwrap();
            }
        }
        world.flush_pending();
        assert_eq!(world.road_shape(1, 1), Some(shape), "mask {}", mask);
    }
}

#[test]
fn tracks_stay_inside_their_tile() {
    let world = all_road(3, 3);
    for tile in world.grid.tiles() {
        let own: HashSet<LaneNodeId> = tile.lane_nodes().collect();
        assert!(!tile.tracks.is_empty());
        for id in &tile.tracks {
            let track = world.lanes.track(*id).unwrap();
            assert_eq!(track.tile, tile.coord);
            assert!(own.contains(&track.start_node));
            assert!(own.contains(&track.end_node));
            assert!(track.length > 0.0);
        }
    }
}

#[test]
fn node_incidence_matches_track_endpoints() {
    let mut world = all_road(3, 3);
    world.set_tile_type(1, 1, TileType::Residential).unwrap();
    world.flush_pending();
    world.set_tile_type(1, 1, TileType::Road).unwrap();
    world.flush_pending();

    let nodes: HashSet<LaneNodeId> = world.grid.tiles().flat_map(|t| t.lane_nodes()).collect();
    for node in nodes {
        let incident: HashSet<_> = world.lanes.tracks_at(node).iter().copied().collect();
        let touching: HashSet<_> = world
            .lanes
            .tracks()
            .filter(|track| track.touches(node))
            .map(|track| track.id)
            .collect();
        assert_eq!(incident, touching);
    }
}

#[test]
fn rebuilding_twice_keeps_track_count() {
    let mut world = all_road(3, 3);
    let center_index = 4;
    let slots_before = world.grid.tile(TileCoord::new(1, 1)).unwrap().slots;
    world.rebuild_tile_graph(center_index).unwrap();
    assert_eq!(world.grid.tile(TileCoord::new(1, 1)).unwrap().slots, slots_before);
    let once = world.lanes.track_count();
    world.rebuild_tile_graph(center_index).unwrap();
    assert_eq!(world.lanes.track_count(), once);
    assert_eq!(world.road_shape(1, 1), Some(RoadShape::Cross));
    assert!(world.rebuild_tile_graph(99).is_err());
}

#[test]
fn junction_phase_masks_are_reproducible() {
    let mut world = all_road(3, 3);
    let center = world.grid.tile(TileCoord::new(1, 1)).unwrap();
    let phase_count = center.kind.as_road().unwrap().phases.len();
    assert_eq!(phase_count, build_phases(RoadShape::Cross).len());
    assert!(phase_count > 0);

    let blocked_after = |world: &mut SimWorld, phase: usize| -> Vec<bool> {
        for _ in 0..phase_count {
            if world
                .grid
                .tile(TileCoord::new(1, 1))
                .and_then(|t| t.kind.as_road())
                .map(|r| r.active_phase)
                == Some(phase)
            {
                break;
            }
            world.advance_phase(1, 1);
        }
        let tile = world.grid.tile(TileCoord::new(1, 1)).unwrap();
        tile.lane_nodes().map(|n| world.lanes.is_blocked(n)).collect()
    };

    for phase in 0..phase_count {
        let first = blocked_after(&mut world, phase);
        world.advance_phase(1, 1);
        let second = blocked_after(&mut world, phase);
        assert_eq!(first, second, "phase {}", phase);
        assert!(first.iter().any(|b| *b));
    }
}

#[test]
fn straights_and_curves_have_no_phases() {
    let world = all_road(3, 3);
    let corner = world.grid.tile(TileCoord::new(0, 0)).unwrap();
    let road = corner.kind.as_road().unwrap();
    assert_eq!(road.shape, RoadShape::CurveNorthEast);
    assert!(road.phases.is_empty());
    assert!(corner.lane_nodes().all(|n| !world.lanes.is_blocked(n)));
}

#[test]
fn removing_a_junction_releases_its_stop_lines() {
    let mut world = all_road(3, 3);
    let center = world.grid.tile(TileCoord::new(1, 1)).unwrap();
    let nodes: Vec<LaneNodeId> = center.lane_nodes().collect();
    assert!(nodes.iter().any(|n| world.lanes.is_blocked(*n)));

    world.set_tile_type(1, 1, TileType::Commercial).unwrap();
    world.flush_pending();

    assert!(nodes.iter().all(|n| !world.lanes.is_blocked(*n)));
    assert_eq!(world.road_shape(1, 0), Some(RoadShape::StraightHorizontal));
    assert_eq!(world.junction_count(), 0);
}

fn plus_world(config: SimConfig) -> SimWorld {
    let mut world = SimWorld::new(3, 3, config);
    for (x, z) in [(1, 0), (0, 1), (1, 1), (2, 1), (1, 2)] {
        world.set_tile_type(x, z, TileType::Road).unwrap();
    }
    world.flush_pending();
    world
}

#[test]
fn retyping_within_one_tick_drops_stale_junction_tracks() {
    let mut world = plus_world(SimConfig::with_seed(8));
    let center = TileCoord::new(1, 1);
    let north_stop = world
        .grid
        .tile(center)
        .and_then(|tile| tile.node_at(inbound_stop_slot(Direction::North)))
        .unwrap();
    assert_eq!(world.road_shape(1, 1), Some(RoadShape::Cross));
    assert!(world.lanes.is_blocked(north_stop));

    world.set_tile_type(1, 1, TileType::Residential).unwrap();
    for (x, z) in [(1, 0), (0, 1), (2, 1), (1, 2)] {
        world.set_tile_type(x, z, TileType::Residential).unwrap();
    }
    world.set_tile_type(1, 1, TileType::Road).unwrap();
    world.tick(0.0);

    let tile = world.grid.tile(center).unwrap();
    let road = tile.kind.as_road().unwrap();
    assert_eq!(road.shape, RoadShape::StraightVertical);
    assert!(road.phases.is_empty());
    assert_eq!(tile.tracks.len(), 2);
    assert!(!world.lanes.is_blocked(north_stop));
    assert!(tile.lane_nodes().all(|n| !world.lanes.is_blocked(n)));
    assert_eq!(world.lanes.track_count(), 2);
}

#[test]
fn junction_phase_advances_on_the_timer() {
    let config = SimConfig {
        phase_duration: 1.0,
        ..SimConfig::with_seed(8)
    };
    let mut world = plus_world(config);
    let junction = |world: &SimWorld| {
        let road = world
            .grid
            .tile(TileCoord::new(1, 1))
            .and_then(|tile| tile.kind.as_road())
            .unwrap();
        (road.active_phase, road.phase_timer)
    };
    let west_stop = world
        .grid
        .tile(TileCoord::new(1, 1))
        .and_then(|tile| tile.node_at(inbound_stop_slot(Direction::West)))
        .unwrap();
    assert_eq!(junction(&world), (0, 0.0));
    assert!(!world.lanes.is_blocked(west_stop));

    for _ in 0..3 {
        world.tick(0.25);
    }
    assert_eq!(junction(&world), (0, 0.75));

    world.tick(0.25);
    assert_eq!(junction(&world), (1, 0.0));
    // Phase 1 stops every approach
    assert!(world.lanes.is_blocked(west_stop));

    for _ in 0..4 {
        world.tick(0.25);
    }
    assert_eq!(junction(&world).0, 2);

    // A full cycle of eight phases wraps back to the first
    for _ in 0..6 {
        world.tick(1.0);
    }
    assert_eq!(junction(&world).0, 0);
    assert!(!world.lanes.is_blocked(west_stop));
}

#[test]
fn manual_advance_resets_the_phase_timer() {
    let mut world = plus_world(SimConfig::with_seed(8));
    world.tick(1.5);
    world.advance_phase(1, 1);
    let road = world
        .grid
        .tile(TileCoord::new(1, 1))
        .and_then(|tile| tile.kind.as_road())
        .unwrap();
    assert_eq!(road.active_phase, 1);
    assert_eq!(road.phase_timer, 0.0);
}
