//! Error type shared by parsing, validation and asset checks

use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub enum TilesetError {
    IoError(String),
    /// Malformed XML or a document that does not fit the tileset schema
    ParseError(String),
    /// Root element is not `<tileset>`
    UnexpectedRoot(String),
    SerializeError(String),
    NoPath,
    DuplicateTileId(u32),
    TileCountMismatch {
        declared: u32,
        found: u32,
    },
    /// A zero width or height. `id` is `None` for tileset-level values.
    InvalidDimensions {
        id: Option<u32>,
        width: u32,
        height: u32,
    },
    InvalidImagePath {
        id: Option<u32>,
        path: String,
        reason: &'static str,
    },
    MissingTileImage(u32),
    MissingAsset {
        id: Option<u32>,
        path: PathBuf,
    },
    /// The file only exists under a different letter case
    AssetCaseMismatch {
        id: Option<u32>,
        path: PathBuf,
        found: PathBuf,
    },
    AssetDimensionMismatch {
        id: Option<u32>,
        path: PathBuf,
        expected: (u32, u32),
        actual: (u32, u32),
    },
    ImageDecodeError {
        path: PathBuf,
        message: String,
    },
    UnknownTile(u32),
    /// Pixel geometry that does not fit in 32 bits or in the atlas image
    GeometryOverflow(String),
    InvalidLayout {
        row: usize,
        column: usize,
        value: String,
    },
}

fn tile_label(id: &Option<u32>) -> String {
    match id {
        Some(id) => format!("tile {}", id),
        None => "tileset image".to_string(),
    }
}

impl std::fmt::Display for TilesetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TilesetError::IoError(e) => write!(f, "IO error: {}", e),
            TilesetError::ParseError(e) => write!(f, "Parse error: {}", e),
            TilesetError::UnexpectedRoot(name) => {
                write!(f, "Expected <tileset> root element, found <{}>", name)
            }
            TilesetError::SerializeError(e) => write!(f, "Serialize error: {}", e),
            TilesetError::NoPath => write!(f, "No file path set"),
            TilesetError::DuplicateTileId(id) => write!(f, "Duplicate tile id {}", id),
            TilesetError::TileCountMismatch { declared, found } => write!(
                f,
                "Tile count mismatch: tilecount is {} but {} tiles were found",
                declared, found
            ),
            TilesetError::InvalidDimensions { id, width, height } => write!(
                f,
                "Invalid dimensions for {}: {}x{}",
                tile_label(id),
                width,
                height
            ),
            TilesetError::InvalidImagePath { id, path, reason } => write!(
                f,
                "Invalid image path '{}' for {}: {}",
                path,
                tile_label(id),
                reason
            ),
            TilesetError::MissingTileImage(id) => write!(f, "Tile {} has no image", id),
            TilesetError::MissingAsset { id, path } => write!(
                f,
                "Missing asset for {}: {}",
                tile_label(id),
                path.display()
            ),
            TilesetError::AssetCaseMismatch { id, path, found } => write!(
                f,
                "Asset for {} not found at {}, but {} exists (letter case differs)",
                tile_label(id),
                path.display(),
                found.display()
            ),
            TilesetError::AssetDimensionMismatch {
                id,
                path,
                expected,
                actual,
            } => write!(
                f,
                "Image {} for {} is {}x{}, tileset declares {}x{}",
                path.display(),
                tile_label(id),
                actual.0,
                actual.1,
                expected.0,
                expected.1
            ),
            TilesetError::ImageDecodeError { path, message } => {
                write!(f, "Could not read image {}: {}", path.display(), message)
            }
            TilesetError::UnknownTile(id) => write!(f, "Unknown tile id {}", id),
            TilesetError::GeometryOverflow(what) => write!(f, "Geometry overflow: {}", what),
            TilesetError::InvalidLayout { row, column, value } => write!(
                f,
                "Invalid layout cell '{}' at row {}, column {}",
                value, row, column
            ),
        }
    }
}

impl std::error::Error for TilesetError {}

impl From<std::io::Error> for TilesetError {
    fn from(e: std::io::Error) -> Self {
        TilesetError::IoError(e.to_string())
    }
}
