//! Tileset data model and id lookup
//!
//! A [`Tileset`] is either an *image collection* (`columns == 0`, every tile
//! references its own image) or an *atlas* (one image cut into a grid of
//! `columns` tiles). Both are read-only after loading.

use crate::path::resolve_relative;
use crate::{Properties, TilesetError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Grid orientation declared by the `<grid>` element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Orientation {
    #[default]
    Orthogonal,
    Isometric,
}

impl Orientation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::Orthogonal => "orthogonal",
            Orientation::Isometric => "isometric",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "orthogonal" => Some(Orientation::Orthogonal),
            "isometric" => Some(Orientation::Isometric),
            _ => None,
        }
    }
}

/// Grid used when tiles are placed in a tile layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    pub orientation: Orientation,
    pub width: u32,
    pub height: u32,
}

impl Default for Grid {
    fn default() -> Self {
        Self {
            orientation: Orientation::Orthogonal,
            width: 1,
            height: 1,
        }
    }
}

/// Drawing offset applied to every tile, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TileOffset {
    pub x: i32,
    pub y: i32,
}

/// Reference to an image file and its pixel size
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileImage {
    /// Path relative to the tileset file, as written
    pub source: String,
    pub width: u32,
    pub height: u32,
    /// Transparent color (hex without `#`), if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trans: Option<String>,
}

impl TileImage {
    pub fn new(source: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            source: source.into(),
            width,
            height,
            trans: None,
        }
    }
}

/// A single tile record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileDefinition {
    pub id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<TileImage>,
    /// Tiled's `type` (formerly `class`) attribute
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(default, skip_serializing_if = "Properties::is_empty")]
    pub properties: Properties,
}

impl TileDefinition {
    /// Create a tile backed by its own image
    pub fn with_image(id: u32, source: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            id,
            image: Some(TileImage::new(source, width, height)),
            class: None,
            properties: Properties::new(),
        }
    }

    /// Create a tile without an image (atlas tiles that only carry metadata)
    pub fn bare(id: u32) -> Self {
        Self {
            id,
            image: None,
            class: None,
            properties: Properties::new(),
        }
    }
}

/// Result of looking up a tile id: which image to draw and which part of it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileLookup<'a> {
    pub id: u32,
    pub source: &'a str,
    pub width: u32,
    pub height: u32,
    /// Top-left corner of the tile inside `source`
    pub origin: (u32, u32),
}

/// A tileset loaded from a `.tsx` file
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "bevy", derive(bevy::asset::Asset, bevy::reflect::TypePath))]
pub struct Tileset {
    pub name: String,
    /// Format version
    pub version: String,
    /// Version of the editor that wrote the file
    pub tiled_version: Option<String>,
    pub tile_width: u32,
    pub tile_height: u32,
    /// Declared number of tiles
    pub tile_count: u32,
    /// `0` for image collections
    pub columns: u32,
    pub spacing: u32,
    pub margin: u32,
    pub tile_offset: Option<TileOffset>,
    pub grid: Option<Grid>,
    /// Atlas image (atlas tilesets only)
    pub image: Option<TileImage>,
    pub properties: Properties,
    pub(crate) tiles: Vec<TileDefinition>,
    #[serde(skip)]
    pub(crate) index: HashMap<u32, usize>,
    #[serde(skip)]
    pub(crate) source_path: Option<PathBuf>,
}

impl Tileset {
    /// Create an empty image-collection tileset
    pub fn new(name: String, tile_width: u32, tile_height: u32) -> Self {
        Self {
            name,
            version: crate::tsx::FORMAT_VERSION.to_string(),
            tiled_version: None,
            tile_width,
            tile_height,
            tile_count: 0,
            columns: 0,
            spacing: 0,
            margin: 0,
            tile_offset: None,
            grid: Some(Grid::default()),
            image: None,
            properties: Properties::new(),
            tiles: Vec::new(),
            index: HashMap::new(),
            source_path: None,
        }
    }

    /// Rebuild the id index from the tile list.
    ///
    /// The first record wins when ids repeat; duplicates are reported by
    /// validation.
    pub(crate) fn rebuild_index(&mut self) {
        self.index.clear();
        for (pos, tile) in self.tiles.iter().enumerate() {
            self.index.entry(tile.id).or_insert(pos);
        }
    }

    /// True when every tile references its own image
    pub fn is_image_collection(&self) -> bool {
        self.columns == 0
    }

    /// Number of tile records in the file
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Tile records in file order
    pub fn tiles(&self) -> &[TileDefinition] {
        &self.tiles
    }

    /// Tile ids in file order
    pub fn ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.tiles.iter().map(|t| t.id)
    }

    /// Get a tile record by id
    pub fn get(&self, id: u32) -> Option<&TileDefinition> {
        self.index.get(&id).and_then(|&pos| self.tiles.get(pos))
    }

    /// Check whether `id` names a drawable tile
    pub fn contains(&self, id: u32) -> bool {
        self.lookup(id).is_some()
    }

    /// Look up which image region draws tile `id`.
    ///
    /// Returns `None` when the id is absent (image collections) or outside
    /// the atlas grid.
    pub fn lookup(&self, id: u32) -> Option<TileLookup<'_>> {
        if self.is_image_collection() {
            let image = self.get(id)?.image.as_ref()?;
            return Some(TileLookup {
                id,
                source: &image.source,
                width: image.width,
                height: image.height,
                origin: (0, 0),
            });
        }

        let image = self.image.as_ref()?;
        if id >= self.tile_count {
            return None;
        }
        Some(TileLookup {
            id,
            source: &image.source,
            width: self.tile_width,
            height: self.tile_height,
            origin: self.atlas_origin(id)?,
        })
    }

    /// Pixel origin of an atlas tile, or `None` if it does not fit in `u32`
    fn atlas_origin(&self, id: u32) -> Option<(u32, u32)> {
        let column = id.checked_rem(self.columns)?;
        let row = id.checked_div(self.columns)?;
        let x = self
            .tile_width
            .checked_add(self.spacing)?
            .checked_mul(column)?
            .checked_add(self.margin)?;
        let y = self
            .tile_height
            .checked_add(self.spacing)?
            .checked_mul(row)?
            .checked_add(self.margin)?;
        Some((x, y))
    }

    /// Like [`Tileset::lookup`], but a miss is an error
    pub fn require(&self, id: u32) -> Result<TileLookup<'_>, TilesetError> {
        self.lookup(id).ok_or(TilesetError::UnknownTile(id))
    }

    /// Path of the file this tileset was loaded from
    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    /// Set the file location used to resolve relative image paths
    pub fn set_source_path(&mut self, path: impl Into<PathBuf>) {
        self.source_path = Some(path.into());
    }

    /// Directory relative image sources are resolved against
    pub fn base_dir(&self) -> &Path {
        self.source_path
            .as_deref()
            .and_then(Path::parent)
            .unwrap_or_else(|| Path::new(""))
    }

    /// Resolve an image source relative to the tileset file
    pub fn resolve_source(&self, source: &str) -> PathBuf {
        resolve_relative(self.base_dir(), source)
    }

    /// Every image this tileset references, with the owning tile id
    /// (`None` for the atlas image)
    pub fn images(&self) -> Vec<(Option<u32>, &TileImage)> {
        let mut images: Vec<(Option<u32>, &TileImage)> = Vec::new();
        if let Some(image) = &self.image {
            images.push((None, image));
        }
        for tile in &self.tiles {
            if let Some(image) = &tile.image {
                images.push((Some(tile.id), image));
            }
        }
        images
    }

    /// Number of atlas tiles implied by the atlas image, margin and spacing.
    ///
    /// `None` for image collections, a zero tile height, margins larger
    /// than the image, or values that overflow `u32`.
    pub fn atlas_capacity(&self) -> Option<u32> {
        let image = self.image.as_ref()?;
        if self.columns == 0 || self.tile_height == 0 {
            return None;
        }
        let usable = image.height.checked_sub(self.margin.checked_mul(2)?)?;
        let pitch = self.tile_height.checked_add(self.spacing)?;
        let rows = usable.checked_add(self.spacing)? / pitch;
        rows.checked_mul(self.columns)
    }

    /// Largest tile image, useful for sizing sprite bounds
    pub fn max_tile_size(&self) -> (u32, u32) {
        if !self.is_image_collection() {
            return (self.tile_width, self.tile_height);
        }
        self.tiles
            .iter()
            .filter_map(|t| t.image.as_ref())
            .fold((0, 0), |(w, h), image| {
                (w.max(image.width), h.max(image.height))
            })
    }
}

/// Builder for assembling a tileset in code
#[derive(Debug, Default)]
pub struct TilesetBuilder {
    name: String,
    tile_size: Option<(u32, u32)>,
    tiled_version: Option<String>,
    tiles: Vec<TileDefinition>,
    properties: Properties,
}

impl TilesetBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn tile_size(mut self, width: u32, height: u32) -> Self {
        self.tile_size = Some((width, height));
        self
    }

    pub fn tiled_version(mut self, version: impl Into<String>) -> Self {
        self.tiled_version = Some(version.into());
        self
    }

    pub fn tile(mut self, tile: TileDefinition) -> Self {
        self.tiles.push(tile);
        self
    }

    pub fn tiles(mut self, tiles: impl IntoIterator<Item = TileDefinition>) -> Self {
        self.tiles.extend(tiles);
        self
    }

    pub fn property(mut self, property: crate::Property) -> Self {
        self.properties.set(property);
        self
    }

    /// Build an image-collection tileset.
    ///
    /// Without an explicit tile size the largest tile image is used, which is
    /// what the editor does for collections.
    pub fn build(self) -> Result<Tileset, TilesetError> {
        let mut tileset = Tileset::new(self.name, 0, 0);
        tileset.tiled_version = self.tiled_version;
        tileset.properties = self.properties;
        tileset.tile_count = self.tiles.len() as u32;
        tileset.tiles = self.tiles;
        tileset.rebuild_index();

        let (width, height) = match self.tile_size {
            Some(size) => size,
            None => tileset.max_tile_size(),
        };
        tileset.tile_width = width;
        tileset.tile_height = height;

        tileset.validate()?;
        Ok(tileset)
    }
}
