//! Subcommand implementations

use crate::settings::Settings;
use anyhow::{bail, Context, Result};
use bevy_tsx_core::{MissingTilePolicy, TileLayout, Tileset, TilesetError};
use log::{debug, info, warn};
use std::fmt::Write as _;
use std::path::Path;

/// Parse a `--policy` value: `error`, `skip` or `placeholder:<id>`
pub fn parse_policy(value: &str) -> Result<MissingTilePolicy, String> {
    match value {
        "error" => Ok(MissingTilePolicy::Error),
        "skip" => Ok(MissingTilePolicy::Skip),
        other => match other.strip_prefix("placeholder:") {
            Some(id) => id
                .parse()
                .map(MissingTilePolicy::Placeholder)
                .map_err(|_| format!("invalid placeholder id '{}'", id)),
            None => Err(format!(
                "unknown policy '{}', expected error, skip or placeholder:<id>",
                other
            )),
        },
    }
}

fn load(path: &Path) -> Result<Tileset> {
    let tileset =
        Tileset::load(path).with_context(|| format!("failed to load {}", path.display()))?;
    debug!("Loaded {} tiles from {}", tileset.len(), path.display());
    Ok(tileset)
}

/// Human-readable summary of a tileset
pub fn describe(tileset: &Tileset) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "name:        {}", tileset.name);
    let _ = writeln!(
        out,
        "version:     {} (tiled {})",
        tileset.version,
        tileset.tiled_version.as_deref().unwrap_or("unknown")
    );
    let _ = writeln!(
        out,
        "tile size:   {}x{}",
        tileset.tile_width, tileset.tile_height
    );
    let _ = writeln!(
        out,
        "tiles:       {} (declared {})",
        tileset.len(),
        tileset.tile_count
    );
    let kind = if tileset.is_image_collection() {
        "image collection".to_string()
    } else {
        format!("atlas, {} columns", tileset.columns)
    };
    let _ = writeln!(out, "layout:      {}", kind);
    if let Some(grid) = tileset.grid {
        let _ = writeln!(
            out,
            "grid:        {} {}x{}",
            grid.orientation.as_str(),
            grid.width,
            grid.height
        );
    }
    for tile in tileset.tiles() {
        match &tile.image {
            Some(image) => {
                let _ = writeln!(
                    out,
                    "  {:>4}  {}x{}  {}",
                    tile.id, image.width, image.height, image.source
                );
            }
            None => {
                let _ = writeln!(out, "  {:>4}  (no image)", tile.id);
            }
        }
    }
    out
}

pub fn info(path: &Path, json: bool) -> Result<()> {
    let tileset = load(path)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&tileset)?);
    } else {
        print!("{}", describe(&tileset));
    }
    Ok(())
}

/// Every structural and asset problem for a tileset file
pub fn collect_problems(tileset: &Tileset, settings: &Settings) -> Vec<TilesetError> {
    let mut problems = tileset.validation_report();
    if let Some(check) = settings.asset_check() {
        let asset_problems = match &settings.asset_root {
            Some(root) => tileset.asset_report_in(root, check),
            None => tileset.asset_report(check),
        };
        problems.extend(asset_problems);
    }
    problems
}

pub fn validate(path: &Path, settings: &Settings) -> Result<()> {
    let tileset = Tileset::load_unchecked(path)
        .with_context(|| format!("failed to load {}", path.display()))?;

    let problems = collect_problems(&tileset, settings);
    if problems.is_empty() {
        println!("{}: ok ({} tiles)", path.display(), tileset.len());
        return Ok(());
    }

    for problem in &problems {
        println!("{}: {}", path.display(), problem);
    }
    bail!("{} problem(s) found in {}", problems.len(), path.display())
}

/// One output line for a looked-up id
pub fn lookup_line(tileset: &Tileset, id: u32) -> Option<String> {
    let tile = tileset.lookup(id)?;
    let path = tileset.resolve_source(tile.source);
    let mut line = format!(
        "{}: {} {}x{}",
        id,
        path.display(),
        tile.width,
        tile.height
    );
    if tile.origin != (0, 0) {
        let _ = write!(line, " at ({}, {})", tile.origin.0, tile.origin.1);
    }
    Some(line)
}

pub fn lookup(path: &Path, ids: &[u32]) -> Result<()> {
    let tileset = load(path)?;
    let mut missing = 0;
    for &id in ids {
        match lookup_line(&tileset, id) {
            Some(line) => println!("{}", line),
            None => {
                println!("{}: not found", id);
                missing += 1;
            }
        }
    }
    if missing > 0 {
        bail!("{} of {} id(s) not found", missing, ids.len());
    }
    Ok(())
}

pub fn layout(
    path: &Path,
    csv: &Path,
    cell_size: u32,
    policy: MissingTilePolicy,
) -> Result<()> {
    let tileset = load(path)?;
    let layout =
        TileLayout::load(csv).with_context(|| format!("failed to load {}", csv.display()))?;

    info!(
        "Layout {} is {}x{} cells",
        csv.display(),
        layout.width,
        layout.height
    );
    let missing = layout.missing_ids(&tileset);
    if !missing.is_empty() {
        warn!(
            "Layout references {} id(s) not in '{}': {:?}",
            missing.len(),
            tileset.name,
            missing
        );
    }

    let placed = layout.placements(&tileset, cell_size, policy)?;
    for tile in &placed {
        println!("{},{},{}", tile.x, tile.y, tile.id);
    }
    info!("Placed {} tiles", placed.len());
    Ok(())
}

pub fn normalize(path: &Path, output: Option<&Path>) -> Result<()> {
    let mut tileset = load(path)?;
    let target = output.unwrap_or(path);
    tileset
        .save(target)
        .with_context(|| format!("failed to write {}", target.display()))?;
    info!("Wrote {}", target.display());
    Ok(())
}

pub fn config(settings: &Settings, init: bool) -> Result<()> {
    if init {
        let path = Settings::default().save()?;
        println!("{}", path.display());
        return Ok(());
    }
    if let Some(path) = Settings::settings_path() {
        println!("# {}", path.display());
    }
    println!("{}", serde_json::to_string_pretty(settings)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_tsx_core::{TileDefinition, TilesetBuilder};

    fn tileset() -> Tileset {
        let mut tileset = TilesetBuilder::new("mytrees")
            .tile_size(500, 244)
            .tiled_version("1.11.0")
            .tile(TileDefinition::with_image(13, "../../graphics/door/door.PNG", 127, 142))
            .tile(TileDefinition::with_image(28, "../../graphics/cave/cave.png", 500, 210))
            .build()
            .unwrap();
        tileset.set_source_path("game/level/level0/mytrees.tsx");
        tileset
    }

    #[test]
    fn test_parse_policy() {
        assert_eq!(parse_policy("error"), Ok(MissingTilePolicy::Error));
        assert_eq!(parse_policy("skip"), Ok(MissingTilePolicy::Skip));
        assert_eq!(
            parse_policy("placeholder:28"),
            Ok(MissingTilePolicy::Placeholder(28))
        );
        assert!(parse_policy("placeholder:x").is_err());
        assert!(parse_policy("ignore").is_err());
    }

    #[test]
    fn test_lookup_line() {
        let tileset = tileset();
        assert_eq!(
            lookup_line(&tileset, 13).as_deref(),
            Some("13: game/graphics/door/door.PNG 127x142")
        );
        assert_eq!(lookup_line(&tileset, 6), None);
    }

    #[test]
    fn test_describe_lists_tiles() {
        let text = describe(&tileset());
        assert!(text.contains("name:        mytrees"));
        assert!(text.contains("tiled 1.11.0"));
        assert!(text.contains("image collection"));
        assert!(text.contains("127x142  ../../graphics/door/door.PNG"));
    }

    #[test]
    fn test_collect_problems_respects_settings() {
        let tileset = tileset();
        let mut settings = Settings::default();
        assert!(collect_problems(&tileset, &settings).is_empty());

        settings.verify_assets = true;
        let problems = collect_problems(&tileset, &settings);
        assert_eq!(problems.len(), 2);
        assert!(problems
            .iter()
            .all(|p| matches!(p, TilesetError::MissingAsset { .. })));
    }
}
