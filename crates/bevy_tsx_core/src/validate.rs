//! Structural validation of a parsed tileset

use crate::path::check_relative_path;
use crate::{TileImage, Tileset, TilesetError};
use std::collections::HashSet;

fn check_image(id: Option<u32>, image: &TileImage, problems: &mut Vec<TilesetError>) {
    if image.width == 0 || image.height == 0 {
        problems.push(TilesetError::InvalidDimensions {
            id,
            width: image.width,
            height: image.height,
        });
    }
    if let Err(reason) = check_relative_path(&image.source) {
        problems.push(TilesetError::InvalidImagePath {
            id,
            path: image.source.clone(),
            reason,
        });
    }
}

impl Tileset {
    /// Check the tileset and return the first problem found
    pub fn validate(&self) -> Result<(), TilesetError> {
        match self.validation_report().into_iter().next() {
            Some(problem) => Err(problem),
            None => Ok(()),
        }
    }

    /// Check the tileset and return every problem found, in a stable order:
    /// tileset size, duplicate ids, per-tile problems, then tile count.
    pub fn validation_report(&self) -> Vec<TilesetError> {
        let mut problems = Vec::new();

        if self.tile_width == 0 || self.tile_height == 0 {
            problems.push(TilesetError::InvalidDimensions {
                id: None,
                width: self.tile_width,
                height: self.tile_height,
            });
        }

        let mut seen = HashSet::new();
        let mut reported = HashSet::new();
        for tile in &self.tiles {
            if !seen.insert(tile.id) && reported.insert(tile.id) {
                problems.push(TilesetError::DuplicateTileId(tile.id));
            }
        }

        for tile in &self.tiles {
            match &tile.image {
                Some(image) => check_image(Some(tile.id), image, &mut problems),
                None if self.is_image_collection() => {
                    problems.push(TilesetError::MissingTileImage(tile.id));
                }
                None => {}
            }
        }

        if self.is_image_collection() {
            let found = self.tiles.len() as u32;
            if found != self.tile_count {
                problems.push(TilesetError::TileCountMismatch {
                    declared: self.tile_count,
                    found,
                });
            }
        } else {
            match &self.image {
                Some(image) => {
                    check_image(None, image, &mut problems);
                    match self.atlas_capacity() {
                        Some(capacity) if capacity != self.tile_count => {
                            problems.push(TilesetError::TileCountMismatch {
                                declared: self.tile_count,
                                found: capacity,
                            });
                        }
                        Some(_) => {}
                        // zero tile height is already reported above
                        None if self.tile_height == 0 => {}
                        None => problems.push(TilesetError::GeometryOverflow(format!(
                            "margin {} and spacing {} with tile height {} do not fit atlas height {}",
                            self.margin, self.spacing, self.tile_height, image.height
                        ))),
                    }
                }
                None => problems.push(TilesetError::ParseError(format!(
                    "tileset '{}' declares {} columns but has no image",
                    self.name, self.columns
                ))),
            }
        }

        log::debug!(
            "Validated tileset '{}': {} tiles, {} problem(s)",
            self.name,
            self.tiles.len(),
            problems.len()
        );
        problems
    }
}

#[cfg(test)]
mod tests {
    use crate::{TileDefinition, TileImage, Tileset};
    use crate::TilesetError;

    fn collection(tiles: Vec<TileDefinition>, tile_count: u32) -> Tileset {
        let mut tileset = Tileset::new("test".to_string(), 64, 64);
        tileset.tile_count = tile_count;
        tileset.tiles = tiles;
        tileset.rebuild_index();
        tileset
    }

    #[test]
    fn test_valid_collection() {
        let tileset = collection(
            vec![
                TileDefinition::with_image(0, "trees/0.png", 183, 178),
                TileDefinition::with_image(5, "keys/5.png", 64, 72),
            ],
            2,
        );
        assert!(tileset.validate().is_ok());
        assert!(tileset.validation_report().is_empty());
    }

    #[test]
    fn test_count_mismatch() {
        let tileset = collection(vec![TileDefinition::with_image(0, "a.png", 1, 1)], 15);
        assert_eq!(
            tileset.validate(),
            Err(TilesetError::TileCountMismatch {
                declared: 15,
                found: 1
            })
        );
    }

    #[test]
    fn test_report_collects_everything() {
        let tileset = collection(
            vec![
                TileDefinition::with_image(1, "a.png", 0, 10),
                TileDefinition::with_image(1, "/abs/b.png", 10, 10),
                TileDefinition::bare(2),
            ],
            3,
        );
        let report = tileset.validation_report();

        assert_eq!(report.len(), 4);
        assert_eq!(report[0], TilesetError::DuplicateTileId(1));
        assert_eq!(
            report[1],
            TilesetError::InvalidDimensions {
                id: Some(1),
                width: 0,
                height: 10
            }
        );
        assert!(matches!(
            report[2],
            TilesetError::InvalidImagePath { id: Some(1), .. }
        ));
        assert_eq!(report[3], TilesetError::MissingTileImage(2));
    }

    #[test]
    fn test_duplicate_reported_once() {
        let tileset = collection(
            vec![
                TileDefinition::with_image(3, "a.png", 1, 1),
                TileDefinition::with_image(3, "b.png", 1, 1),
                TileDefinition::with_image(3, "c.png", 1, 1),
            ],
            3,
        );
        assert_eq!(
            tileset.validation_report(),
            vec![TilesetError::DuplicateTileId(3)]
        );
        // First record wins in the index
        assert_eq!(tileset.lookup(3).unwrap().source, "a.png");
    }

    #[test]
    fn test_atlas_count_checked_against_image() {
        let mut tileset = Tileset::new("atlas".to_string(), 32, 32);
        tileset.columns = 2;
        tileset.image = Some(TileImage::new("atlas.png", 64, 64));
        tileset.tile_count = 4;
        assert!(tileset.validate().is_ok());

        tileset.tile_count = 6;
        assert_eq!(
            tileset.validate(),
            Err(TilesetError::TileCountMismatch {
                declared: 6,
                found: 4
            })
        );
    }

    #[test]
    fn test_atlas_geometry_overflow_reported() {
        let mut tileset = Tileset::new("atlas".to_string(), 32, 32);
        tileset.columns = 2;
        tileset.image = Some(TileImage::new("atlas.png", 64, 64));
        tileset.tile_count = 4;

        tileset.margin = 3_000_000_000;
        assert!(matches!(
            tileset.validate(),
            Err(TilesetError::GeometryOverflow(_))
        ));

        tileset.margin = 0;
        tileset.tile_height = u32::MAX;
        tileset.spacing = 1;
        assert!(matches!(
            tileset.validate(),
            Err(TilesetError::GeometryOverflow(_))
        ));
    }
}
