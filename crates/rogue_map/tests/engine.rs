//! End-to-end behaviour against the bundled assets

use rogue_map::prelude::*;
use rogue_map_runtime::{AssetsConfig, LightingConfig};
use std::sync::Arc;

const ASSETS: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/assets");
const SHEET: &str = include_str!("../assets/tiles/roguelikeSheet_transparent.tsx");
const SHEET_PATH: &str = "tiles/roguelikeSheet_transparent.tsx";

fn disk_loader() -> AssetLoader<DirectorySource> {
    let assets = AssetsConfig {
        map_dir: "maps".to_string(),
        ..Default::default()
    };
    AssetLoader::with_config(DirectorySource::new(ASSETS), assets)
}

/// A 4x4 single-layer map over the bundled tileset
fn csv_map(csv: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<map version="1.2" orientation="orthogonal" width="4" height="4" tilewidth="16" tileheight="16" infinite="0">
 <tileset firstgid="1" source="../tiles/roguelikeSheet_transparent.tsx"/>
 <layer id="1" name="Tile Layer 1" width="4" height="4">
  <data encoding="csv">
{csv}
</data>
 </layer>
</map>"#
    )
}

fn memory_loader(maps: &[(&str, String)]) -> AssetLoader<MemorySource> {
    let mut source = MemorySource::new().with(SHEET_PATH, SHEET);
    for (id, text) in maps {
        source.insert(&format!("maps/{id}.tmx"), text.clone());
    }
    let assets = AssetsConfig {
        map_dir: "maps".to_string(),
        ..Default::default()
    };
    AssetLoader::with_config(source, assets)
}

#[test]
fn test_bundled_tileset_properties() {
    let mut registry = TilesetRegistry::new();
    let sheet = registry
        .load_from(&DirectorySource::new(ASSETS), SHEET_PATH)
        .unwrap();

    assert_eq!(sheet.name, "roguelikeSheet_transparent");
    assert_eq!(sheet.tile_count, 1767);
    assert_eq!(sheet.collision_tile_count(), 118);
    assert_eq!(sheet.light_tile_count(), 15);

    let door = sheet.tile(330).and_then(|t| t.door()).unwrap();
    assert_eq!(door, &DoorRef::new("tavern_1a", 0, 0));
    assert_eq!(sheet.tile(416).and_then(|t| t.light()), Some(1.0));
    assert_eq!(sheet.tile(475).and_then(|t| t.light()), Some(0.8));
}

#[test]
fn test_partial_collision_box() {
    // tile 137 at column 2, row 3
    let csv = "0,0,0,0,\n0,0,0,0,\n0,0,0,0,\n0,0,138,0";
    let mut loader = memory_loader(&[("pillar", csv_map(csv))]);
    let map = loader.load_map("pillar").unwrap();
    let collision = CollisionResolver::new(&map);

    let shapes = collision.cell_shapes(3, 2).collect::<Vec<_>>();
    assert_eq!(shapes.len(), 1);
    let rect = shapes[0].rect;
    assert!((rect.min.x - 41.6).abs() < 1e-4);
    assert!((rect.max.x - 48.0).abs() < 1e-4);
    assert!((rect.min.y - 48.0).abs() < 1e-4);
    assert!((rect.max.y - 62.4).abs() < 1e-4);

    assert!(collision.blocks_point(Point::new(45.0, 50.0)));
    assert!(!collision.blocks_point(Point::new(35.0, 50.0)));
    assert!(!collision.blocks_point(Point::new(45.0, 63.0)));
}

#[test]
fn test_unknown_gid_rejected() {
    let csv = "0,0,0,0,\n0,5000,0,0,\n0,0,0,0,\n0,0,0,0";
    let mut loader = memory_loader(&[("broken", csv_map(csv))]);
    let err = loader.load_map("broken").unwrap_err();
    assert_eq!(err.kind(), LoadErrorKind::UnknownTileset);
    assert!(matches!(err, LoadError::UnknownTileset { gid: 5000, .. }));
}

#[test]
fn test_billy_map_from_disk() {
    let mut loader = disk_loader();
    let map = loader.load_map("billy_map").unwrap();
    assert_eq!((map.width(), map.height()), (10, 8));
    assert_eq!(map.layers().len(), 2);

    let collision = CollisionResolver::new(&map);
    // wall row with a door gap
    assert!(collision.blocks_point(map.cell_center(3, 2)));
    assert!(!collision.blocks_point(map.cell_center(3, 4)));
    assert!(!collision.blocks_point(map.cell_center(4, 4)));

    let doors = DoorResolver::new(&map).doors();
    assert_eq!(doors.len(), 1);
    assert_eq!((doors[0].row, doors[0].col), (3, 4));
    assert_eq!(doors[0].map_id, "tavern_1a");
    assert_eq!((doors[0].dx, doors[0].dy), (0, 0));
    assert_eq!(DoorResolver::new(&map).resolve(3, 3), None);
}

#[test]
fn test_tileset_shared_between_maps() {
    let mut loader = disk_loader();
    let billy = loader.load_map("billy_map").unwrap();
    let tavern = loader.load_map("tavern_1a").unwrap();
    assert_eq!(loader.registry().len(), 1);

    let a = billy.tilesets().next().unwrap();
    let b = tavern.tilesets().next().unwrap();
    assert!(Arc::ptr_eq(&a.tileset, &b.tileset));
}

#[test]
fn test_walk_through_tavern_door() {
    let mut loader = disk_loader();
    let mut session = MapSession::new(loader.load_map("billy_map").unwrap());
    let billy = session.active();

    assert_eq!(session.enter_cell(4, 4), &TransitionState::Exploring);
    assert!(matches!(
        session.enter_cell(3, 4),
        TransitionState::TransitionRequested(door) if door.map_id == "tavern_1a"
    ));

    let arrival = session.complete_transition(&mut loader).unwrap();
    assert_eq!(arrival.map_id, "tavern_1a");
    assert_eq!((arrival.row, arrival.col), (3, 4));
    assert_eq!(arrival.position, Point::new(72.0, 56.0));
    assert_eq!(session.map().id, "tavern_1a");
    assert!(session.is_exploring());

    // the old snapshot is untouched
    assert_eq!(billy.id, "billy_map");
    assert!(DoorResolver::new(&billy).resolve(3, 4).is_some());
}

#[test]
fn test_failed_transition_keeps_active_map() {
    let billy = std::fs::read_to_string(format!("{ASSETS}/maps/billy_map.tmx")).unwrap();
    let mut loader = memory_loader(&[("billy_map", billy)]);
    let mut session = MapSession::new(loader.load_map("billy_map").unwrap());
    let before = session.active();

    session.enter_cell(3, 4);
    let err = session.complete_transition(&mut loader).unwrap_err();
    assert!(matches!(
        err,
        TransitionError::Load { ref source, .. } if source.kind() == LoadErrorKind::MapNotFound
    ));
    assert!(Arc::ptr_eq(&before, &session.active()));
    assert!(session.is_exploring());
}

#[test]
fn test_light_falls_off_from_lamp() {
    let mut loader = disk_loader();
    let map = loader.load_map("billy_map").unwrap();
    let lighting = LightingCompositor::default();

    let row: Vec<f32> = (1..10)
        .map(|col| lighting.sample_cell(&map, 1, col).unwrap())
        .collect();
    assert!((row[0] - 1.0).abs() < 1e-6);
    for pair in row.windows(2) {
        assert!(pair[0] >= pair[1]);
        assert!(pair[1] >= 0.0);
    }
    assert_eq!(lighting.sample_cell(&map, 7, 9), Some(0.0));
    assert_eq!(lighting.sample_cell(&map, 8, 0), None);
}

#[test]
fn test_coincident_lights_do_not_dim() {
    let sheet = Arc::new(
        Tileset::new("candles", 16, 16, 4)
            .with_property(0, "light", 0.5)
            .unwrap(),
    );
    let mut builder = TileMapBuilder::new("cellar", 3, 1, 16, 16);
    builder.add_tileset(1, "candles.tsx", sheet).unwrap();
    builder.add_layer("one", true, &[1, 0, 0]).unwrap();
    let single = builder.build();

    let mut builder = TileMapBuilder::new("cellar", 3, 1, 16, 16);
    builder
        .add_tileset(1, "candles.tsx", single.tilesets().next().unwrap().tileset.clone())
        .unwrap();
    builder.add_layer("one", true, &[1, 0, 0]).unwrap();
    builder.add_layer("two", true, &[1, 0, 0]).unwrap();
    let double = builder.build();

    let lighting = LightingCompositor::default();
    for col in 0..3 {
        let one = lighting.sample_cell(&single, 0, col).unwrap();
        let two = lighting.sample_cell(&double, 0, col).unwrap();
        assert!(two >= one, "col {col}: {two} < {one}");
        assert!(two <= lighting.config().max_intensity);
    }
    assert!((lighting.sample_cell(&double, 0, 0).unwrap() - 1.0).abs() < 1e-6);
}

#[test]
fn test_light_field_tracks_cell_changes() {
    let mut loader = disk_loader();
    let map = Arc::new(loader.load_map("billy_map").unwrap());
    let mut field = LightField::new(LightingCompositor::default(), Arc::clone(&map));
    assert_eq!(field.emitter_cells(), 1);

    for row in 0..map.height() {
        for col in 0..map.width() {
            field.sample_cell(row, col);
        }
    }
    assert_eq!(field.cached_samples(), 80);

    // put out the lamp at (1, 1)
    let dark = Arc::new(map.with_cell(1, 1, 1, 0).unwrap());
    let evicted = field.apply_cell_change(Arc::clone(&dark), 1, 1);
    assert!(evicted > 0);
    assert!(!field.is_cached(1, 1));
    assert!(field.is_cached(7, 9));
    assert_eq!(field.emitter_cells(), 0);

    assert_eq!(field.sample_cell(1, 1), Some(0.0));
    assert_eq!(field.sample_cell(1, 2), Some(0.0));
    // the original snapshot still sees its lamp
    assert!(LightingCompositor::default().sample_cell(&map, 1, 1).unwrap() > 0.9);
}

#[test]
fn test_config_file_drives_loading() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    std::fs::create_dir_all(root.join("tiles")).unwrap();
    std::fs::create_dir_all(root.join("levels")).unwrap();
    std::fs::write(root.join(SHEET_PATH), SHEET).unwrap();
    let csv = "0,0,0,0,\n0,417,0,0,\n0,0,0,0,\n0,0,0,0";
    std::fs::write(root.join("levels/cellar.tmx"), csv_map(csv)).unwrap();
    std::fs::write(
        root.join("engine.toml"),
        "[lighting]\nradius = 2.0\n\n[assets]\nmap_dir = \"levels\"\nmap_extensions = [\"tmx\"]\n",
    )
    .unwrap();

    let config = EngineConfig::load(root.join("engine.toml")).unwrap();
    assert_eq!(config.lighting.radius, 2.0);
    assert_eq!(config.lighting, LightingConfig { radius: 2.0, ..Default::default() });

    let mut loader = AssetLoader::with_config(DirectorySource::new(root), config.assets.clone());
    let map = loader.load_map("cellar").unwrap();
    let lighting = LightingCompositor::new(config.lighting);
    assert!(lighting.sample_cell(&map, 1, 1).unwrap() > 0.0);
    assert!(lighting.sample_cell(&map, 1, 2).unwrap() > 0.0);
    // two tiles away is at the radius
    assert_eq!(lighting.sample_cell(&map, 1, 3), Some(0.0));

    assert!(matches!(
        loader.load_map("billy_map"),
        Err(LoadError::MapNotFound(id)) if id == "billy_map"
    ));
}
