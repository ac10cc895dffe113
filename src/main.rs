use anyhow::Result;
use clap::Parser;
use log::info;

use tile_traffic::simulation::{SimConfig, SimWorld, DEFAULT_PHASE_DURATION};

#[derive(Parser)]
#[command(name = "tile_traffic")]
#[command(about = "Headless tile-grid traffic simulation")]
struct Cli {
    /// Grid width in tiles
    #[arg(long, default_value = "10")]
    width: usize,

    /// Grid depth in tiles
    #[arg(long, default_value = "10")]
    depth: usize,

    /// Number of simulation ticks to run
    #[arg(long, default_value = "1000")]
    ticks: u32,

    /// Time delta per tick in seconds
    #[arg(long, default_value = "0.1")]
    delta: f32,

    /// Number of vehicles to keep on the roads
    #[arg(long, default_value = "12")]
    vehicles: usize,

    /// Seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Use 8-directional tile path search
    #[arg(long)]
    diagonal: bool,

    /// Seconds each junction stop phase is held
    #[arg(long, default_value_t = DEFAULT_PHASE_DURATION)]
    phase_duration: f32,

    /// Print the map after every simulated second
    #[arg(long)]
    map: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    run_headless(&cli)
}

/// Run the simulation in headless mode (no graphics)
fn run_headless(cli: &Cli) -> Result<()> {
    let config = SimConfig {
        phase_duration: cli.phase_duration,
        diagonal_paths: cli.diagonal,
        seed: cli.seed,
        ..SimConfig::default()
    };

    info!(
        "Running {}x{} world for {} ticks of {}s",
        cli.width, cli.depth, cli.ticks, cli.delta
    );

    let mut world = SimWorld::create_test_world(cli.width, cli.depth, config)?;
    world.spawn_random_vehicles(cli.vehicles);

    println!("Initial state:");
    world.print_summary();
    world.draw_map();

    // Calculate how many ticks equal 1 second of simulation time
    let ticks_per_second = (1.0 / cli.delta).ceil().max(1.0) as u32;

    for tick in 1..=cli.ticks {
        world.tick(cli.delta);

        // Top the roads back up as vehicles dead-end
        let missing = cli.vehicles.saturating_sub(world.vehicles.len());
        if missing > 0 {
            world.spawn_random_vehicles(missing);
        }

        if cli.map && tick % ticks_per_second == 0 {
            println!("--- After tick {} ({:.1}s simulated time) ---", tick, world.time);
            world.draw_map();
        }
    }

    let corner = world.grid.len().saturating_sub(1);
    let route = world.find_tile_path(0, corner)?;
    info!("Tile route from corner to corner: {} tiles", route.len());

    println!("=== Final State ===");
    world.print_summary();
    world.draw_map();

    let stats = &world.stats;
    info!("=== SIMULATION COMPLETE ===");
    info!("Elapsed time: {:.2}s", world.time);
    info!("Vehicles spawned: {}", stats.vehicles_spawned);
    info!("Vehicles removed: {}", stats.vehicles_removed());
    info!("Dead ends: {}", stats.dead_ends);
    info!("Active vehicles: {}", world.vehicles.len());
    info!("Road tiles: {}", world.road_tile_count());
    info!("Junction tiles: {}", world.junction_count());
    info!("Tracks: {}", world.lanes.track_count());

    Ok(())
}
