//! Checks of the image files a tileset references

use crate::{TileImage, Tileset, TilesetError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// How thoroughly referenced images are checked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetCheck {
    /// The file must exist
    Exists,
    /// The file must exist and decode to the declared size
    #[default]
    Dimensions,
}

/// Look for `path` under a different letter case in its directory
fn find_case_insensitive(path: &Path) -> Option<PathBuf> {
    let parent = path.parent()?;
    let wanted = path.file_name()?.to_string_lossy().to_lowercase();
    let dir = if parent.as_os_str().is_empty() {
        Path::new(".")
    } else {
        parent
    };
    std::fs::read_dir(dir)
        .ok()?
        .filter_map(|entry| entry.ok())
        .find(|entry| entry.file_name().to_string_lossy().to_lowercase() == wanted)
        .map(|entry| parent.join(entry.file_name()))
}

fn check_one(
    id: Option<u32>,
    image: &TileImage,
    path: PathBuf,
    check: AssetCheck,
) -> Option<TilesetError> {
    if !path.is_file() {
        return Some(match find_case_insensitive(&path) {
            Some(found) => TilesetError::AssetCaseMismatch { id, path, found },
            None => TilesetError::MissingAsset { id, path },
        });
    }

    if check == AssetCheck::Exists {
        return None;
    }

    match image::image_dimensions(&path) {
        Ok(actual) if actual == (image.width, image.height) => None,
        Ok(actual) => Some(TilesetError::AssetDimensionMismatch {
            id,
            path,
            expected: (image.width, image.height),
            actual,
        }),
        Err(e) => Some(TilesetError::ImageDecodeError {
            path,
            message: e.to_string(),
        }),
    }
}

impl Tileset {
    /// Check every referenced image relative to the tileset file and return
    /// the first problem
    pub fn verify_assets(&self, check: AssetCheck) -> Result<(), TilesetError> {
        match self.asset_report(check).into_iter().next() {
            Some(problem) => Err(problem),
            None => Ok(()),
        }
    }

    /// Check every referenced image relative to the tileset file
    pub fn asset_report(&self, check: AssetCheck) -> Vec<TilesetError> {
        self.asset_report_in(self.base_dir(), check)
    }

    /// Check every referenced image, resolving sources against `base`
    /// instead of the tileset file's directory
    pub fn asset_report_in(&self, base: &Path, check: AssetCheck) -> Vec<TilesetError> {
        let problems: Vec<TilesetError> = self
            .images()
            .into_iter()
            .filter_map(|(id, image)| {
                let path = crate::path::resolve_relative(base, &image.source);
                check_one(id, image, path, check)
            })
            .collect();

        for problem in &problems {
            log::warn!("Tileset '{}': {}", self.name, problem);
        }
        problems
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{TileDefinition, TilesetBuilder};
    use tempfile::TempDir;

    fn asset_dir() -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("graphics")).unwrap();
        dir
    }

    fn write_png(dir: &TempDir, relative: &str, width: u32, height: u32) {
        image::RgbaImage::new(width, height)
            .save(dir.path().join(relative))
            .unwrap();
    }

    fn tileset_in(dir: &TempDir, tiles: Vec<TileDefinition>) -> Tileset {
        let mut tileset = TilesetBuilder::new("assets")
            .tile_size(64, 64)
            .tiles(tiles)
            .build()
            .unwrap();
        tileset.set_source_path(dir.path().join("level").join("set.tsx"));
        tileset
    }

    #[test]
    fn test_matching_assets_pass() {
        let dir = asset_dir();
        write_png(&dir, "graphics/tree.png", 12, 20);
        let tileset = tileset_in(
            &dir,
            vec![TileDefinition::with_image(0, "../graphics/tree.png", 12, 20)],
        );

        assert!(tileset.verify_assets(AssetCheck::Dimensions).is_ok());
    }

    #[test]
    fn test_missing_asset() {
        let dir = asset_dir();
        let tileset = tileset_in(
            &dir,
            vec![TileDefinition::with_image(4, "../graphics/gone.png", 8, 8)],
        );

        assert_eq!(
            tileset.verify_assets(AssetCheck::Exists),
            Err(TilesetError::MissingAsset {
                id: Some(4),
                path: dir.path().join("graphics/gone.png"),
            })
        );
    }

    #[test]
    fn test_dimension_mismatch() {
        let dir = asset_dir();
        write_png(&dir, "graphics/npc.png", 78, 130);
        let tileset = tileset_in(
            &dir,
            vec![TileDefinition::with_image(8, "../graphics/npc.png", 78, 135)],
        );

        // Existence alone passes
        assert!(tileset.verify_assets(AssetCheck::Exists).is_ok());
        assert_eq!(
            tileset.verify_assets(AssetCheck::Dimensions),
            Err(TilesetError::AssetDimensionMismatch {
                id: Some(8),
                path: dir.path().join("graphics/npc.png"),
                expected: (78, 135),
                actual: (78, 130),
            })
        );
    }

    #[test]
    fn test_case_mismatch_detected() {
        let dir = asset_dir();
        write_png(&dir, "graphics/door.png", 4, 4);
        if dir.path().join("graphics/door.PNG").exists() {
            // Case-insensitive filesystem; nothing to detect
            return;
        }
        let tileset = tileset_in(
            &dir,
            vec![TileDefinition::with_image(13, "../graphics/door.PNG", 4, 4)],
        );

        assert_eq!(
            tileset.verify_assets(AssetCheck::Exists),
            Err(TilesetError::AssetCaseMismatch {
                id: Some(13),
                path: dir.path().join("graphics/door.PNG"),
                found: dir.path().join("graphics/door.png"),
            })
        );
    }

    #[test]
    fn test_report_in_other_base() {
        let dir = asset_dir();
        write_png(&dir, "graphics/key.png", 2, 2);
        let tileset = tileset_in(
            &dir,
            vec![TileDefinition::with_image(5, "graphics/key.png", 2, 2)],
        );

        assert_eq!(tileset.asset_report(AssetCheck::Exists).len(), 1);
        assert!(tileset
            .asset_report_in(&dir.path(), AssetCheck::Dimensions)
            .is_empty());
    }
}
