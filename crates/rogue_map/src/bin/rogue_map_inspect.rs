//! Print what the engine sees in a map: tilesets, layers, doors and lights
//!
//! Run with: cargo run --bin rogue_map_inspect -- crates/rogue_map/assets billy_map

use anyhow::Context;
use clap::Parser;
use rogue_map::prelude::*;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Directory tileset and map paths are relative to
    asset_root: PathBuf,

    /// Map to load, e.g. `billy_map`
    map_id: String,

    /// Engine configuration (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Also describe one cell, as `ROW,COL`
    #[arg(long, value_parser = parse_cell)]
    cell: Option<(u32, u32)>,
}

fn parse_cell(input: &str) -> Result<(u32, u32), String> {
    let (row, col) = input
        .split_once(',')
        .ok_or_else(|| format!("expected ROW,COL, got '{input}'"))?;
    let row = row.trim().parse().map_err(|_| format!("bad row '{row}'"))?;
    let col = col.trim().parse().map_err(|_| format!("bad column '{col}'"))?;
    Ok((row, col))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().compact())
        .init();

    let cli = Args::parse();

    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };

    let source = DirectorySource::new(&cli.asset_root);
    let mut loader = AssetLoader::with_config(source, config.assets.clone());
    let map = loader
        .load_map(&cli.map_id)
        .with_context(|| format!("loading map '{}'", cli.map_id))?;
    tracing::info!(
        map = %map.id,
        root = %cli.asset_root.display(),
        tilesets = loader.registry().len(),
        "map loaded"
    );

    println!(
        "map {} - {}x{} cells of {}x{} px",
        map.id,
        map.width(),
        map.height(),
        map.tile_width(),
        map.tile_height()
    );

    println!("tilesets:");
    for tileset in map.tilesets() {
        let range = tileset.gid_range();
        println!(
            "  {:>5}..{:<5} {} ({} tiles, {} collision, {} light)",
            range.start,
            range.end,
            tileset.source,
            tileset.tileset.tile_count,
            tileset.tileset.collision_tile_count(),
            tileset.tileset.light_tile_count()
        );
    }

    println!("layers:");
    for layer in map.layers() {
        println!(
            "  {:<20} {:>5} tiles{}",
            layer.name,
            layer.tile_count(),
            if layer.visible { "" } else { " (hidden)" }
        );
    }

    let doors = DoorResolver::new(&map).doors();
    println!("doors: {}", doors.len());
    for door in &doors {
        let (row, col) = door.destination();
        println!(
            "  ({}, {}) -> {} ({}, {})",
            door.row, door.col, door.map_id, row, col
        );
    }

    let compositor = LightingCompositor::new(config.lighting);
    let emitters = LightingCompositor::emitters(&map);
    let lit = (0..map.height())
        .flat_map(|row| (0..map.width()).map(move |col| (row, col)))
        .filter(|&(row, col)| compositor.sample_cell(&map, row, col).unwrap_or(0.0) > 0.0)
        .count();
    println!("lights: {} emitters, {} lit cells", emitters.len(), lit);

    if let Some((row, col)) = cli.cell {
        anyhow::ensure!(
            map.in_bounds(row as i64, col as i64),
            "cell ({row}, {col}) is outside the map"
        );
        println!("cell ({row}, {col}):");
        for tile in map.stack_at(row, col) {
            println!(
                "  layer {} gid {} ({} #{})",
                tile.layer, tile.tile.gid, tile.resolved.tileset.source, tile.resolved.local_id
            );
        }
        let shapes = CollisionResolver::new(&map).cell_shapes(row, col).count();
        let light = compositor.sample_cell(&map, row, col).unwrap_or(0.0);
        println!("  collision shapes: {shapes}, light: {light:.3}");
        if let Some(door) = DoorResolver::new(&map).resolve(row, col) {
            println!("  door to {}", door.map_id);
        }
    }

    Ok(())
}
