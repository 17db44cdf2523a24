//! Walk from billy_map through the tavern door
//!
//! Run with: cargo run --example walk_tavern

use rogue_map::prelude::*;
use rogue_map_runtime::AssetsConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rogue_map_runtime=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer().compact())
        .init();

    let assets = AssetsConfig {
        map_dir: "maps".to_string(),
        ..Default::default()
    };
    let source = DirectorySource::new(concat!(env!("CARGO_MANIFEST_DIR"), "/assets"));
    let mut loader = AssetLoader::with_config(source, assets);

    let mut session = MapSession::new(loader.load_map("billy_map")?);
    let mut light = LightField::new(LightingCompositor::default(), session.active());

    // up column 4 from the bottom row to the door in the wall
    for row in (3..8).rev() {
        let col = 4;
        let centre = session.map().cell_center(row, col);
        let blocked = CollisionResolver::new(session.map()).blocks_point(centre);
        let brightness = light.sample_cell(row, col).unwrap_or(0.0);
        println!("({row}, {col}) blocked={blocked} light={brightness:.3}");

        if let TransitionState::TransitionRequested(door) = session.enter_cell(row, col) {
            println!("door to {} at ({row}, {col})", door.map_id);
            break;
        }
    }

    let arrival = session.complete_transition(&mut loader)?;
    println!(
        "arrived in {} at ({}, {}), position {:?}",
        arrival.map_id, arrival.row, arrival.col, arrival.position
    );

    let mut light = LightField::new(LightingCompositor::default(), session.active());
    for row in 1..session.map().height() - 1 {
        let line: Vec<String> = (1..session.map().width() - 1)
            .map(|col| format!("{:.2}", light.sample_cell(row, col).unwrap_or(0.0)))
            .collect();
        println!("{}", line.join(" "));
    }

    Ok(())
}
