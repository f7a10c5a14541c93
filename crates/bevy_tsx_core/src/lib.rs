//! Core data structures for Tiled tilesets
//!
//! This crate reads, validates and writes `.tsx` tileset files and answers
//! "which image draws tile N":
//! - `Tileset` - Tileset attributes plus tiles indexed by id
//! - `TileDefinition` - One tile record (id, image, class, properties)
//! - `TileLookup` - Image source, size and origin for a tile id
//! - `TileLayout` - CSV tile grid referencing a tileset
//! - `TilesetError` - Every way loading or checking can fail
//!
//! # Example
//!
//! ```rust,ignore
//! use bevy_tsx_core::Tileset;
//! use std::path::Path;
//!
//! let tileset = Tileset::load(Path::new("level/level0/mytrees.tsx"))?;
//! if let Some(tile) = tileset.lookup(13) {
//!     let path = tileset.resolve_source(tile.source);
//!     println!("{} ({}x{})", path.display(), tile.width, tile.height);
//! }
//! ```

mod assets;
mod error;
mod layout;
pub mod path;
mod property;
mod tileset;
mod tsx;
mod validate;

pub use assets::AssetCheck;
pub use error::TilesetError;
pub use layout::{MissingTilePolicy, PlacedTile, TileLayout, DEFAULT_CELL_SIZE, EMPTY_CELL};
pub use property::{Properties, Property, PropertyType};
pub use tileset::{
    Grid, Orientation, TileDefinition, TileImage, TileLookup, TileOffset, Tileset,
    TilesetBuilder,
};
pub use tsx::FORMAT_VERSION;
