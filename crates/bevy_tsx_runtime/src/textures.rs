//! Image handles for every tile of a loaded tileset

use bevy::asset::LoadState;
use bevy::prelude::*;
use bevy_tsx_core::path::to_asset_path;
use bevy_tsx_core::{MissingTilePolicy, Tileset, TilesetError};
use std::collections::HashMap;

/// Asset path for an image source, resolved against the tileset's own path
pub fn image_asset_path(tileset: &Tileset, source: &str) -> String {
    let resolved = tileset.resolve_source(source);
    let path = to_asset_path(&resolved);
    if path.starts_with("../") {
        warn!(
            "Image '{}' of tileset '{}' resolves outside the assets directory: {}",
            source, tileset.name, path
        );
    }
    path
}

/// Texture handles for a tileset, keyed by tile id.
///
/// Inserted on the [`crate::TilesetHandle`] entity once every image has
/// finished loading.
#[derive(Component, Default, Debug, Clone)]
pub struct TilesetTextures {
    /// Per-tile images (image collections)
    images: HashMap<u32, Handle<Image>>,
    /// Shared image (atlas tilesets)
    atlas: Option<Handle<Image>>,
}

impl TilesetTextures {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue every image the tileset references on the asset server
    pub fn load_from_tileset(&mut self, tileset: &Tileset, asset_server: &AssetServer) {
        for (id, image) in tileset.images() {
            let handle = asset_server.load(image_asset_path(tileset, &image.source));
            match id {
                Some(id) => {
                    self.images.insert(id, handle);
                }
                None => self.atlas = Some(handle),
            }
        }
    }

    /// Texture for a tile. Atlas tilesets return the shared atlas image for
    /// any id, so check [`Tileset::contains`] first.
    pub fn get(&self, id: u32) -> Option<&Handle<Image>> {
        self.images.get(&id).or(self.atlas.as_ref())
    }

    /// Texture for a tile, applying `policy` when there is none
    pub fn get_or(
        &self,
        id: u32,
        policy: MissingTilePolicy,
    ) -> Result<Option<&Handle<Image>>, TilesetError> {
        if let Some(handle) = self.get(id) {
            return Ok(Some(handle));
        }
        match policy {
            MissingTilePolicy::Error => Err(TilesetError::UnknownTile(id)),
            MissingTilePolicy::Skip => Ok(None),
            MissingTilePolicy::Placeholder(substitute) => self
                .get(substitute)
                .map(Some)
                .ok_or(TilesetError::UnknownTile(substitute)),
        }
    }

    /// Insert a texture handle manually
    pub fn insert(&mut self, id: u32, handle: Handle<Image>) {
        self.images.insert(id, handle);
    }

    /// Number of queued images
    pub fn len(&self) -> usize {
        self.images.len() + usize::from(self.atlas.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn handles(&self) -> impl Iterator<Item = (Option<u32>, &Handle<Image>)> {
        self.atlas
            .iter()
            .map(|h| (None, h))
            .chain(self.images.iter().map(|(id, h)| (Some(*id), h)))
    }

    /// Check if every image has either loaded or failed
    pub fn all_loaded(&self, asset_server: &AssetServer) -> bool {
        self.handles().all(|(_, handle)| {
            matches!(
                asset_server.get_load_state(handle.id()),
                Some(LoadState::Loaded) | Some(LoadState::Failed(_))
            )
        })
    }

    /// Tiles whose image failed to load (`None` for the atlas image)
    pub fn failed(&self, asset_server: &AssetServer) -> Vec<Option<u32>> {
        let mut failed: Vec<Option<u32>> = self
            .handles()
            .filter(|(_, handle)| {
                matches!(
                    asset_server.get_load_state(handle.id()),
                    Some(LoadState::Failed(_))
                )
            })
            .map(|(id, _)| id)
            .collect();
        failed.sort();
        failed
    }

    /// Log the current loading state of all textures (for debugging)
    pub fn log_loading_state(&self, asset_server: &AssetServer) {
        for (id, handle) in self.handles() {
            match asset_server.get_load_state(handle.id()) {
                Some(LoadState::Loaded) => {}
                Some(LoadState::Failed(ref err)) => {
                    warn!("Tile {:?}: FAILED - {}", id, err);
                }
                state => {
                    info!("Tile {:?}: state {:?}", id, state);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_tsx_core::{TileDefinition, TilesetBuilder};

    fn tileset() -> Tileset {
        let mut tileset = TilesetBuilder::new("mytrees")
            .tile(TileDefinition::with_image(13, "../../graphics/door/door.PNG", 127, 142))
            .build()
            .unwrap();
        tileset.set_source_path("level/level0/mytrees.tsx");
        tileset
    }

    #[test]
    fn test_image_asset_path() {
        let tileset = tileset();
        assert_eq!(
            image_asset_path(&tileset, "../../graphics/door/door.PNG"),
            "graphics/door/door.PNG"
        );
        assert_eq!(
            image_asset_path(&tileset, "../../../outside.png"),
            "../outside.png"
        );
    }

    #[test]
    fn test_get_or_policies() {
        let mut textures = TilesetTextures::new();
        textures.insert(13, Handle::default());

        assert!(textures.get(13).is_some());
        assert_eq!(textures.len(), 1);
        assert_eq!(
            textures.get_or(6, MissingTilePolicy::Error),
            Err(TilesetError::UnknownTile(6))
        );
        assert_eq!(textures.get_or(6, MissingTilePolicy::Skip), Ok(None));
        assert!(textures
            .get_or(6, MissingTilePolicy::Placeholder(13))
            .unwrap()
            .is_some());
        assert_eq!(
            textures.get_or(6, MissingTilePolicy::Placeholder(7)),
            Err(TilesetError::UnknownTile(7))
        );
    }
}
