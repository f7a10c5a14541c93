//! `tsx` - inspect, validate and query Tiled tilesets
//!
//! Run with: tsx validate level/level0/mytrees.tsx --assets

mod commands;
mod settings;

use anyhow::{Context, Result};
use bevy_tsx_core::MissingTilePolicy;
use clap::{arg, value_parser, Command};
use settings::Settings;
use simplelog::{
    ColorChoice, CombinedLogger, Config, SharedLogger, TermLogger, TerminalMode, WriteLogger,
};
use std::path::PathBuf;

fn cli() -> Command {
    let file = || arg!(<FILE> "Tileset (.tsx) file").value_parser(value_parser!(PathBuf));

    Command::new("tsx")
        .about("Inspect, validate and query Tiled tilesets")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            arg!(-c --config <CONFIG> "Settings file, defaults to the user config directory")
                .value_parser(value_parser!(PathBuf))
                .global(true),
        )
        .arg(arg!(-v --verbose "Log debug output").global(true))
        .subcommand(
            Command::new("info")
                .about("Print tileset attributes and tiles")
                .arg(file())
                .arg(arg!(--json "Print as JSON")),
        )
        .subcommand(
            Command::new("validate")
                .about("Check structure and, optionally, the referenced images")
                .arg(file())
                .arg(arg!(--assets "Check that every referenced image exists"))
                .arg(arg!(--"no-dimensions" "Do not decode images to compare sizes"))
                .arg(
                    arg!(--"asset-root" <DIR> "Resolve image sources against this directory")
                        .value_parser(value_parser!(PathBuf)),
                ),
        )
        .subcommand(
            Command::new("lookup")
                .about("Print the image for each tile id")
                .arg(file())
                .arg(arg!(<ID>... "Tile ids").value_parser(value_parser!(u32))),
        )
        .subcommand(
            Command::new("layout")
                .about("Resolve a CSV tile layout against the tileset")
                .arg(file())
                .arg(arg!(<CSV> "Layout CSV file").value_parser(value_parser!(PathBuf)))
                .arg(
                    arg!(--"cell-size" <PIXELS> "Pixel size of one layout cell")
                        .value_parser(value_parser!(u32).range(1..)),
                )
                .arg(
                    arg!(--policy <POLICY> "Unknown ids: error, skip or placeholder:<id>")
                        .value_parser(commands::parse_policy),
                ),
        )
        .subcommand(
            Command::new("normalize")
                .about("Re-write a tileset in canonical form")
                .arg(file())
                .arg(
                    arg!(-o --output <OUTPUT> "Output file, defaults to overwriting FILE")
                        .value_parser(value_parser!(PathBuf)),
                ),
        )
        .subcommand(
            Command::new("config")
                .about("Print the effective settings")
                .arg(arg!(--init "Write default settings to the config directory")),
        )
}

fn init_logging(settings: &Settings, verbose: bool) -> Result<()> {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        settings.level_filter()
    };

    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )];
    if let Some(path) = &settings.log_file {
        let file = std::fs::File::create(path)
            .with_context(|| format!("failed to create log file {}", path.display()))?;
        loggers.push(WriteLogger::new(level, Config::default(), file));
    }

    CombinedLogger::init(loggers)?;
    Ok(())
}

fn main() -> Result<()> {
    let matches = cli().get_matches();

    let (mut settings, settings_error) =
        Settings::load(matches.get_one::<PathBuf>("config").map(PathBuf::as_path));
    init_logging(&settings, matches.get_flag("verbose"))?;
    if let Some(e) = settings_error {
        log::warn!("Could not load settings: {}. Using defaults.", e);
    }

    match matches.subcommand() {
        Some(("info", sub)) => {
            let file = sub.get_one::<PathBuf>("FILE").unwrap();
            commands::info(file, sub.get_flag("json"))
        }
        Some(("validate", sub)) => {
            let file = sub.get_one::<PathBuf>("FILE").unwrap();
            if sub.get_flag("assets") {
                settings.verify_assets = true;
            }
            if sub.get_flag("no-dimensions") {
                settings.check_dimensions = false;
            }
            if let Some(root) = sub.get_one::<PathBuf>("asset-root") {
                settings.asset_root = Some(root.clone());
            }
            commands::validate(file, &settings)
        }
        Some(("lookup", sub)) => {
            let file = sub.get_one::<PathBuf>("FILE").unwrap();
            let ids: Vec<u32> = sub.get_many::<u32>("ID").unwrap().copied().collect();
            commands::lookup(file, &ids)
        }
        Some(("layout", sub)) => {
            let file = sub.get_one::<PathBuf>("FILE").unwrap();
            let csv = sub.get_one::<PathBuf>("CSV").unwrap();
            let cell_size = sub
                .get_one::<u32>("cell-size")
                .copied()
                .unwrap_or(settings.cell_size);
            let policy = sub
                .get_one::<MissingTilePolicy>("policy")
                .copied()
                .unwrap_or(settings.missing_tile_policy);
            commands::layout(file, csv, cell_size, policy)
        }
        Some(("normalize", sub)) => {
            let file = sub.get_one::<PathBuf>("FILE").unwrap();
            let output = sub.get_one::<PathBuf>("output").map(PathBuf::as_path);
            commands::normalize(file, output)
        }
        Some(("config", sub)) => commands::config(&settings, sub.get_flag("init")),
        _ => unreachable!("subcommand_required is set"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        cli().debug_assert();
    }

    #[test]
    fn test_lookup_parses_ids() {
        let matches = cli()
            .try_get_matches_from(["tsx", "lookup", "mytrees.tsx", "13", "6"])
            .unwrap();
        let (_, sub) = matches.subcommand().unwrap();
        let ids: Vec<u32> = sub.get_many::<u32>("ID").unwrap().copied().collect();
        assert_eq!(ids, vec![13, 6]);
    }

    #[test]
    fn test_layout_policy_flag() {
        let matches = cli()
            .try_get_matches_from([
                "tsx",
                "layout",
                "mytrees.tsx",
                "trees.csv",
                "--policy",
                "placeholder:28",
            ])
            .unwrap();
        let (_, sub) = matches.subcommand().unwrap();
        assert_eq!(
            sub.get_one::<MissingTilePolicy>("policy"),
            Some(&MissingTilePolicy::Placeholder(28))
        );
        assert!(cli()
            .try_get_matches_from(["tsx", "layout", "a.tsx", "b.csv", "--policy", "maybe"])
            .is_err());
    }

    #[test]
    fn test_layout_cell_size_must_be_positive() {
        assert!(cli()
            .try_get_matches_from(["tsx", "layout", "a.tsx", "b.csv", "--cell-size", "0"])
            .is_err());
        let matches = cli()
            .try_get_matches_from(["tsx", "layout", "a.tsx", "b.csv", "--cell-size", "32"])
            .unwrap();
        let (_, sub) = matches.subcommand().unwrap();
        assert_eq!(sub.get_one::<u32>("cell-size"), Some(&32));
    }
}
