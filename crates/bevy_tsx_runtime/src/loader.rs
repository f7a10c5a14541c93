//! Asset loader for `.tsx` tileset files

use bevy::asset::io::Reader;
use bevy::asset::{AssetLoader, LoadContext};
use bevy::prelude::*;
use bevy_tsx_core::{Tileset, TilesetError};

/// Loads Tiled `.tsx` files as [`Tileset`] assets.
///
/// The loaded tileset remembers its asset path so image sources can be
/// resolved relative to it.
#[derive(Default, bevy::reflect::TypePath)]
pub struct TsxLoader;

#[derive(Debug)]
pub enum TsxLoadError {
    Io(std::io::Error),
    Tileset(TilesetError),
}

impl std::fmt::Display for TsxLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TsxLoadError::Io(e) => write!(f, "IO error: {}", e),
            TsxLoadError::Tileset(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for TsxLoadError {}

impl From<std::io::Error> for TsxLoadError {
    fn from(e: std::io::Error) -> Self {
        TsxLoadError::Io(e)
    }
}

impl From<TilesetError> for TsxLoadError {
    fn from(e: TilesetError) -> Self {
        TsxLoadError::Tileset(e)
    }
}

impl AssetLoader for TsxLoader {
    type Asset = Tileset;
    type Settings = ();
    type Error = TsxLoadError;

    async fn load(
        &self,
        reader: &mut dyn Reader,
        _settings: &(),
        load_context: &mut LoadContext<'_>,
    ) -> Result<Self::Asset, Self::Error> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).await?;
        let text = std::str::from_utf8(&bytes)
            .map_err(|e| TilesetError::ParseError(format!("not UTF-8: {}", e)))?;

        let mut tileset = Tileset::from_tsx_str(text)?;
        tileset.set_source_path(load_context.path());
        debug!(
            "Loaded tileset '{}' from {:?} ({} tiles)",
            tileset.name,
            load_context.path(),
            tileset.len()
        );
        Ok(tileset)
    }

    fn extensions(&self) -> &[&str] {
        &["tsx"]
    }
}
