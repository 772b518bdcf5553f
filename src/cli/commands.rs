use std::path::Path;

use glam::DVec2;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use tracing::{info, warn};

use crate::config::GameConfig;
use crate::game::{DropOutcome, Session};
use crate::persistence;
use crate::world::{MapStatistics, TileKind, TileStore};

/// Headless auto-play: each turn drags the first deck tile onto a random
/// option tile through the same gesture path a touch screen would use.
pub fn play(
    config: &GameConfig,
    layout: Option<&Path>,
    turns: u32,
    save_dir: Option<&Path>,
) -> Result<(), String> {
    let mut session = Session::new(config);
    session.start_game();

    if let Some(path) = layout {
        let records = persistence::load_layout(path)
            .map_err(|e| format!("Failed to load layout {}: {}", path.display(), e))?;
        let tiles = persistence::records_to_tiles(&records, session.game().store())
            .map_err(|e| format!("Failed to import layout {}: {}", path.display(), e))?;
        let ids = session.import_tiles(tiles);
        eprintln!("Imported {} tiles from {}", ids.len(), path.display());
    }
    session.settle_camera();

    let seed = if config.seed == 0 {
        rand::thread_rng().r#gen()
    } else {
        config.seed
    };
    let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(1));

    let mut placed = 0_u32;
    for turn in 1..=turns {
        let Some(dragged) = session.deck_tiles().first().map(|t| t.id) else {
            warn!(turn, "Deck empty, stopping");
            break;
        };
        let options: Vec<DVec2> = session
            .game()
            .store()
            .tiles_of_kind(TileKind::Option)
            .iter()
            .map(|t| t.position)
            .collect();
        let Some(&target) = options.choose(&mut rng) else {
            warn!(turn, "No option tiles left, stopping");
            break;
        };

        session.on_drag_start(dragged);
        let finger =
            session.viewport().world_to_screen(target) - DVec2::splat(config.drag_probe_offset);
        session.on_drag_sample(finger);

        match session.on_drag_end() {
            DropOutcome::Placed { .. } => {
                placed += 1;
                info!(turn, tile = %dragged, x = target.x, y = target.y, "Turn played");
            }
            DropOutcome::SnapBack => {
                warn!(turn, tile = %dragged, "Drop snapped back");
            }
        }
        session.settle_camera();
        session.flush_refill();
    }
    session.end_game();

    println!("Placed {} tile(s) in {} turn(s)", placed, turns);
    println!();
    print_statistics(&MapStatistics::compute(session.game().store()));

    if let Some(dir) = save_dir {
        let path = persistence::save_layout(session.game().store(), dir)
            .map_err(|e| format!("Failed to save layout: {}", e))?;
        println!("\nLayout saved to {}", path.display());
    }

    Ok(())
}

/// Load a layout and print its statistics, or a single tile.
pub fn inspect(config: &GameConfig, layout: &Path, tile: Option<&str>) -> Result<(), String> {
    let records = persistence::load_layout(layout)
        .map_err(|e| format!("Failed to load layout {}: {}", layout.display(), e))?;

    let mut store = TileStore::new(config.tile_pitch, config.tile_size);
    let tiles = persistence::records_to_tiles(&records, &store)
        .map_err(|e| format!("Failed to import layout {}: {}", layout.display(), e))?;
    store.add_tiles(tiles);

    match tile {
        Some(coords) => inspect_tile(&store, coords),
        None => {
            println!("=== Layout: {} ===", layout.display());
            print_statistics(&MapStatistics::compute(&store));
            Ok(())
        }
    }
}

fn parse_coords(coords: &str) -> Result<DVec2, String> {
    let (x, y) = coords
        .split_once(',')
        .ok_or_else(|| format!("Expected X,Y coordinates, got \"{}\"", coords))?;
    let x: f64 = x
        .trim()
        .parse()
        .map_err(|_| format!("Invalid x coordinate \"{}\"", x))?;
    let y: f64 = y
        .trim()
        .parse()
        .map_err(|_| format!("Invalid y coordinate \"{}\"", y))?;
    Ok(DVec2::new(x, y))
}

fn inspect_tile(store: &TileStore, coords: &str) -> Result<(), String> {
    let position = parse_coords(coords)?;
    let tile = store
        .tile(position)
        .ok_or_else(|| format!("No tile at {} (layout has {} tiles)", coords, store.len()))?;

    println!("=== Tile {} ===", tile.id);
    println!("Position: ({:.0}, {:.0})", tile.position.x, tile.position.y);
    println!("Kind: {:?}", tile.kind);
    println!("Colour: {}", tile.colour);
    println!("Size: {:.0}", tile.size);
    if tile.adjacent.is_empty() {
        println!("Neighbors: (none)");
    } else {
        println!("Neighbors:");
        for id in &tile.adjacent {
            if let Some(n) = store.tile_by_id(id) {
                println!("  {} ({})", n.id, n.colour);
            }
        }
    }
    Ok(())
}

pub fn list_layouts(dir: &Path) -> Result<(), String> {
    let layouts = persistence::list_layouts(dir)
        .map_err(|e| format!("Error listing layouts: {}", e))?;

    if layouts.is_empty() {
        println!("No layouts found in {}", dir.display());
        return Ok(());
    }

    println!("{:<40} {:>8} {:>10}", "File", "Tiles", "Size");
    println!("{}", "-".repeat(60));
    for l in &layouts {
        let name = l.path.file_name().and_then(|n| n.to_str()).unwrap_or("?");
        println!("{:<40} {:>8} {:>8} B", name, l.tile_count, l.file_size);
    }
    println!("\n{} layout(s) in {}", layouts.len(), dir.display());
    Ok(())
}

fn print_statistics(stats: &MapStatistics) {
    println!("Tiles: {} ({} placed, {} options)", stats.total, stats.normal, stats.options);
    if let Some(extent) = &stats.extent {
        println!(
            "Extent: ({:.0}, {:.0}) to ({:.0}, {:.0}), {:.0} x {:.0}",
            extent.min_x,
            extent.min_y,
            extent.max_x,
            extent.max_y,
            extent.width(),
            extent.height()
        );
    }
    if let Some(selected) = &stats.selected {
        println!("Selected: {}", selected);
    }
    println!("Colour diversity: {:.3}", stats.colour_diversity);

    if stats.normal == 0 {
        return;
    }
    println!();
    println!("--- Colour Distribution ---");
    let mut sorted: Vec<_> = stats.colour_distribution.iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));
    for (colour, count) in sorted {
        let pct = (*count as f64 / stats.normal as f64) * 100.0;
        println!("  {}: {} ({:.1}%)", colour, count, pct);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config() -> GameConfig {
        GameConfig {
            seed: 3,
            ..GameConfig::default()
        }
    }

    #[test]
    fn parse_coords_accepts_signed_pairs() {
        assert_eq!(parse_coords("-100,200").unwrap(), DVec2::new(-100.0, 200.0));
        assert_eq!(parse_coords(" 0 , 100 ").unwrap(), DVec2::new(0.0, 100.0));
        assert!(parse_coords("100").is_err());
        assert!(parse_coords("a,1").is_err());
    }

    #[test]
    fn play_saves_layout_with_placed_tiles() {
        let dir = TempDir::new().unwrap();
        play(&config(), None, 7, Some(dir.path())).unwrap();

        let layouts = persistence::list_layouts(dir.path()).unwrap();
        assert_eq!(layouts.len(), 1);
        // Origin plus one tile per turn.
        assert_eq!(layouts[0].tile_count, 8);

        let records = persistence::load_layout(&layouts[0].path).unwrap();
        assert!(records.iter().any(|r| r.position == [0.0, 0.0] && r.colour == "#FFF"));
    }

    #[test]
    fn inspect_reports_missing_tile() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("layout.json");
        std::fs::write(&path, r##"[{"position": [0, 0], "colour": "#FFF"}]"##).unwrap();

        assert!(inspect(&config(), &path, None).is_ok());
        assert!(inspect(&config(), &path, Some("0,0")).is_ok());
        let err = inspect(&config(), &path, Some("100,0")).unwrap_err();
        assert!(err.contains("No tile"));
    }

    #[test]
    fn inspect_rejects_off_grid_layout() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("layout.json");
        std::fs::write(&path, r##"[{"position": [33, 0], "colour": "#FFF"}]"##).unwrap();
        let err = inspect(&config(), &path, None).unwrap_err();
        assert!(err.contains("record 0"), "got {}", err);
    }
}
