//! Reading and writing Tiled `.tsx` tileset files
//!
//! The XML is mapped onto private `Raw*` structs with `quick-xml`'s serde
//! support and then converted into the public [`Tileset`] model. Elements
//! the model does not cover (wang sets, animations, collision shapes) are
//! skipped on read and therefore not written back.

use crate::{
    Grid, Orientation, Properties, Property, PropertyType, TileDefinition, TileImage, TileOffset,
    Tileset, TilesetError,
};
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Format version written into new files
pub const FORMAT_VERSION: &str = "1.10";

const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";

fn is_zero(value: &u32) -> bool {
    *value == 0
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename = "tileset")]
struct RawTileset {
    #[serde(rename = "@version", default)]
    version: String,
    #[serde(rename = "@tiledversion", default, skip_serializing_if = "Option::is_none")]
    tiled_version: Option<String>,
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "@tilewidth")]
    tile_width: u32,
    #[serde(rename = "@tileheight")]
    tile_height: u32,
    #[serde(rename = "@spacing", default, skip_serializing_if = "is_zero")]
    spacing: u32,
    #[serde(rename = "@margin", default, skip_serializing_if = "is_zero")]
    margin: u32,
    #[serde(rename = "@tilecount")]
    tile_count: u32,
    #[serde(rename = "@columns")]
    columns: u32,
    #[serde(rename = "tileoffset", default, skip_serializing_if = "Option::is_none")]
    tile_offset: Option<RawTileOffset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    grid: Option<RawGrid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    properties: Option<RawProperties>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image: Option<RawImage>,
    #[serde(rename = "tile", default)]
    tiles: Vec<RawTile>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RawTileOffset {
    #[serde(rename = "@x", default)]
    x: i32,
    #[serde(rename = "@y", default)]
    y: i32,
}

#[derive(Debug, Serialize, Deserialize)]
struct RawGrid {
    #[serde(rename = "@orientation")]
    orientation: String,
    #[serde(rename = "@width")]
    width: u32,
    #[serde(rename = "@height")]
    height: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct RawImage {
    #[serde(rename = "@source")]
    source: String,
    #[serde(rename = "@trans", default, skip_serializing_if = "Option::is_none")]
    trans: Option<String>,
    #[serde(rename = "@width")]
    width: u32,
    #[serde(rename = "@height")]
    height: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct RawTile {
    #[serde(rename = "@id")]
    id: u32,
    #[serde(
        rename = "@type",
        alias = "@class",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    properties: Option<RawProperties>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image: Option<RawImage>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct RawProperties {
    #[serde(rename = "property", default)]
    property: Vec<RawProperty>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RawProperty {
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "@type", default, skip_serializing_if = "Option::is_none")]
    property_type: Option<String>,
    #[serde(rename = "@value", default, skip_serializing_if = "Option::is_none")]
    value: Option<String>,
    /// Multi-line string values are stored as element text
    #[serde(rename = "$text", default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

fn image_from_raw(raw: RawImage) -> TileImage {
    TileImage {
        source: raw.source,
        width: raw.width,
        height: raw.height,
        trans: raw.trans,
    }
}

impl From<&TileImage> for RawImage {
    fn from(image: &TileImage) -> Self {
        RawImage {
            source: image.source.clone(),
            trans: image.trans.clone(),
            width: image.width,
            height: image.height,
        }
    }
}

fn properties_from_raw(raw: Option<RawProperties>) -> Properties {
    let list = raw.map(|r| r.property).unwrap_or_default();
    Properties(
        list.into_iter()
            .map(|p| Property {
                name: p.name,
                property_type: p
                    .property_type
                    .as_deref()
                    .map(PropertyType::parse)
                    .unwrap_or_default(),
                value: p.value.or(p.text).unwrap_or_default(),
            })
            .collect(),
    )
}

fn raw_properties(properties: &Properties) -> Option<RawProperties> {
    if properties.is_empty() {
        return None;
    }
    Some(RawProperties {
        property: properties
            .iter()
            .map(|p| {
                let property_type = match p.property_type {
                    PropertyType::String => None,
                    other => Some(other.as_str().to_string()),
                };
                let (value, text) = if p.value.contains('\n') {
                    (None, Some(p.value.clone()))
                } else {
                    (Some(p.value.clone()), None)
                };
                RawProperty {
                    name: p.name.clone(),
                    property_type,
                    value,
                    text,
                }
            })
            .collect(),
    })
}

fn tileset_from_raw(raw: RawTileset) -> Result<Tileset, TilesetError> {
    let grid = match raw.grid {
        Some(grid) => {
            let orientation = Orientation::parse(&grid.orientation).ok_or_else(|| {
                TilesetError::ParseError(format!(
                    "unknown grid orientation '{}'",
                    grid.orientation
                ))
            })?;
            Some(Grid {
                orientation,
                width: grid.width,
                height: grid.height,
            })
        }
        None => None,
    };

    let tiles = raw
        .tiles
        .into_iter()
        .map(|tile| TileDefinition {
            id: tile.id,
            image: tile.image.map(image_from_raw),
            class: tile.class,
            properties: properties_from_raw(tile.properties),
        })
        .collect();

    let mut tileset = Tileset {
        name: raw.name,
        version: raw.version,
        tiled_version: raw.tiled_version,
        tile_width: raw.tile_width,
        tile_height: raw.tile_height,
        tile_count: raw.tile_count,
        columns: raw.columns,
        spacing: raw.spacing,
        margin: raw.margin,
        tile_offset: raw.tile_offset.map(|o| TileOffset { x: o.x, y: o.y }),
        grid,
        image: raw.image.map(image_from_raw),
        properties: properties_from_raw(raw.properties),
        tiles,
        index: HashMap::new(),
        source_path: None,
    };
    tileset.rebuild_index();
    Ok(tileset)
}

impl From<&Tileset> for RawTileset {
    fn from(tileset: &Tileset) -> Self {
        RawTileset {
            version: tileset.version.clone(),
            tiled_version: tileset.tiled_version.clone(),
            name: tileset.name.clone(),
            tile_width: tileset.tile_width,
            tile_height: tileset.tile_height,
            spacing: tileset.spacing,
            margin: tileset.margin,
            tile_count: tileset.tile_count,
            columns: tileset.columns,
            tile_offset: tileset
                .tile_offset
                .map(|o| RawTileOffset { x: o.x, y: o.y }),
            grid: tileset.grid.map(|g| RawGrid {
                orientation: g.orientation.as_str().to_string(),
                width: g.width,
                height: g.height,
            }),
            properties: raw_properties(&tileset.properties),
            image: tileset.image.as_ref().map(RawImage::from),
            tiles: tileset
                .tiles
                .iter()
                .map(|tile| RawTile {
                    id: tile.id,
                    class: tile.class.clone(),
                    properties: raw_properties(&tile.properties),
                    image: tile.image.as_ref().map(RawImage::from),
                })
                .collect(),
        }
    }
}

/// Name of the first element in an XML document
fn root_element(xml: &str) -> Result<String, TilesetError> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                return Ok(String::from_utf8_lossy(e.name().as_ref()).into_owned());
            }
            Ok(Event::Eof) => {
                return Err(TilesetError::ParseError("document has no root element".into()))
            }
            Ok(_) => {}
            Err(e) => return Err(TilesetError::ParseError(e.to_string())),
        }
    }
}

impl Tileset {
    /// Parse a `.tsx` document without structural validation.
    ///
    /// Schema errors (missing attributes, non-integer numbers) still fail.
    /// Use [`Tileset::validation_report`] to inspect the result.
    pub fn from_tsx_str_unchecked(xml: &str) -> Result<Self, TilesetError> {
        let root = root_element(xml)?;
        if root != "tileset" {
            return Err(TilesetError::UnexpectedRoot(root));
        }

        let raw: RawTileset =
            quick_xml::de::from_str(xml).map_err(|e| TilesetError::ParseError(e.to_string()))?;
        let tileset = tileset_from_raw(raw)?;

        log::debug!(
            "Parsed tileset '{}' ({} tiles, columns={})",
            tileset.name,
            tileset.tiles.len(),
            tileset.columns
        );
        Ok(tileset)
    }

    /// Parse and validate a `.tsx` document
    pub fn from_tsx_str(xml: &str) -> Result<Self, TilesetError> {
        let tileset = Self::from_tsx_str_unchecked(xml)?;
        tileset.validate()?;
        Ok(tileset)
    }

    /// Load and validate a `.tsx` file, remembering its location for
    /// resolving image paths
    pub fn load(path: &Path) -> Result<Self, TilesetError> {
        let tileset = Self::load_unchecked(path)?;
        tileset.validate()?;
        Ok(tileset)
    }

    /// Load a `.tsx` file without structural validation
    pub fn load_unchecked(path: &Path) -> Result<Self, TilesetError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TilesetError::IoError(format!("{}: {}", path.display(), e)))?;
        let mut tileset = Self::from_tsx_str_unchecked(&content)?;
        tileset.source_path = Some(path.to_path_buf());
        Ok(tileset)
    }

    /// Serialize to `.tsx` XML with a declaration and one-space indentation
    pub fn to_tsx_string(&self) -> Result<String, TilesetError> {
        let raw = RawTileset::from(self);
        let mut body = String::new();
        let mut serializer = quick_xml::se::Serializer::new(&mut body);
        serializer.indent(' ', 1);
        raw.serialize(serializer)
            .map_err(|e| TilesetError::SerializeError(e.to_string()))?;

        let mut out = String::with_capacity(XML_DECLARATION.len() + body.len() + 1);
        out.push_str(XML_DECLARATION);
        out.push_str(&body);
        out.push('\n');
        Ok(out)
    }

    /// Write to `path`
    pub fn save(&mut self, path: &Path) -> Result<(), TilesetError> {
        let content = self.to_tsx_string()?;
        std::fs::write(path, content)
            .map_err(|e| TilesetError::IoError(format!("{}: {}", path.display(), e)))?;
        self.source_path = Some(path.to_path_buf());
        Ok(())
    }

    /// Write back to the file this tileset was loaded from
    pub fn save_current(&mut self) -> Result<(), TilesetError> {
        if let Some(path) = self.source_path.clone() {
            self.save(&path)
        } else {
            Err(TilesetError::NoPath)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<tileset version="1.10" tiledversion="1.11.0" name="mytrees" tilewidth="500" tileheight="244" tilecount="2" columns="0">
 <grid orientation="orthogonal" width="1" height="1"/>
 <tile id="8">
  <image source="../../graphics/npc.png" width="78" height="135"/>
 </tile>
 <tile id="13">
  <image source="../../graphics/door/door.PNG" width="127" height="142"/>
 </tile>
</tileset>
"#;

    #[test]
    fn test_parse_small_collection() {
        let tileset = Tileset::from_tsx_str(SMALL).unwrap();

        assert_eq!(tileset.name, "mytrees");
        assert_eq!(tileset.version, "1.10");
        assert_eq!(tileset.tiled_version.as_deref(), Some("1.11.0"));
        assert_eq!((tileset.tile_width, tileset.tile_height), (500, 244));
        assert_eq!(tileset.tile_count, 2);
        assert!(tileset.is_image_collection());
        assert_eq!(
            tileset.grid,
            Some(Grid {
                orientation: Orientation::Orthogonal,
                width: 1,
                height: 1
            })
        );

        let npc = tileset.lookup(8).unwrap();
        assert_eq!(npc.source, "../../graphics/npc.png");
        assert_eq!((npc.width, npc.height), (78, 135));
    }

    #[test]
    fn test_rejects_other_root() {
        let xml = r#"<map version="1.10" width="10" height="10"/>"#;
        assert_eq!(
            Tileset::from_tsx_str(xml).unwrap_err(),
            TilesetError::UnexpectedRoot("map".to_string())
        );
    }

    #[test]
    fn test_non_integer_id_is_parse_error() {
        let xml = SMALL.replace(r#"<tile id="8">"#, r#"<tile id="eight">"#);
        assert!(matches!(
            Tileset::from_tsx_str(&xml),
            Err(TilesetError::ParseError(_))
        ));
    }

    #[test]
    fn test_missing_image_width_is_parse_error() {
        let xml = SMALL.replace(r#" width="78""#, "");
        assert!(matches!(
            Tileset::from_tsx_str(&xml),
            Err(TilesetError::ParseError(_))
        ));
    }

    #[test]
    fn test_negative_dimension_is_parse_error() {
        let xml = SMALL.replace(r#"height="135""#, r#"height="-135""#);
        assert!(matches!(
            Tileset::from_tsx_str(&xml),
            Err(TilesetError::ParseError(_))
        ));
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let xml = SMALL.replace(r#"<tile id="13">"#, r#"<tile id="8">"#);
        assert_eq!(
            Tileset::from_tsx_str(&xml).unwrap_err(),
            TilesetError::DuplicateTileId(8)
        );
        // The unchecked parse still succeeds
        assert!(Tileset::from_tsx_str_unchecked(&xml).is_ok());
    }

    #[test]
    fn test_garbage_is_parse_error() {
        assert!(matches!(
            Tileset::from_tsx_str("not xml at all"),
            Err(TilesetError::ParseError(_))
        ));
    }

    #[test]
    fn test_properties_and_class_round_trip() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<tileset version="1.10" tiledversion="1.11.0" name="props" tilewidth="64" tileheight="64" tilecount="1" columns="0">
 <tileoffset x="0" y="-64"/>
 <grid orientation="orthogonal" width="1" height="1"/>
 <properties>
  <property name="layer" value="trees"/>
 </properties>
 <tile id="3" type="tree">
  <properties>
   <property name="hitbox_offset" type="int" value="-100"/>
   <property name="solid" type="bool" value="true"/>
  </properties>
  <image source="../../graphics/trees/3.png" width="191" height="244"/>
 </tile>
</tileset>
"#;
        let tileset = Tileset::from_tsx_str(xml).unwrap();
        assert_eq!(tileset.tile_offset, Some(TileOffset { x: 0, y: -64 }));
        assert_eq!(
            tileset.properties.get("layer").map(|p| p.value.as_str()),
            Some("trees")
        );

        let tree = tileset.get(3).unwrap();
        assert_eq!(tree.class.as_deref(), Some("tree"));
        assert_eq!(
            tree.properties.get("hitbox_offset").and_then(|p| p.as_int()),
            Some(-100)
        );

        let written = tileset.to_tsx_string().unwrap();
        let reparsed = Tileset::from_tsx_str(&written).unwrap();
        assert_eq!(reparsed.tiles(), tileset.tiles());
        assert_eq!(reparsed.properties, tileset.properties);
        assert_eq!(reparsed.tile_offset, tileset.tile_offset);
    }

    #[test]
    fn test_legacy_class_attribute() {
        let xml = SMALL.replace(r#"<tile id="8">"#, r#"<tile id="8" class="npc">"#);
        let tileset = Tileset::from_tsx_str(&xml).unwrap();
        assert_eq!(tileset.get(8).unwrap().class.as_deref(), Some("npc"));
    }

    #[test]
    fn test_written_document_shape() {
        let tileset = Tileset::from_tsx_str(SMALL).unwrap();
        let written = tileset.to_tsx_string().unwrap();

        assert!(written.starts_with(XML_DECLARATION));
        assert!(written.contains(r#"<tile id="13">"#));
        assert!(written.contains(r#"source="../../graphics/door/door.PNG""#));
        assert!(!written.contains("spacing"));
    }

    #[test]
    fn test_atlas_parse() {
        let xml = r#"<tileset version="1.10" name="terrain" tilewidth="16" tileheight="16" tilecount="8" columns="4">
 <image source="terrain.png" width="64" height="32"/>
 <tile id="5" type="water"/>
</tileset>"#;
        let tileset = Tileset::from_tsx_str(xml).unwrap();
        assert!(!tileset.is_image_collection());
        assert_eq!(tileset.lookup(5).unwrap().origin, (16, 16));
        assert_eq!(tileset.get(5).unwrap().class.as_deref(), Some("water"));
        // Ids without a record are still drawable in an atlas
        assert!(tileset.get(6).is_none());
        assert!(tileset.lookup(6).is_some());
    }

    #[test]
    fn test_huge_atlas_geometry_is_error() {
        let atlas = r#"<tileset version="1.10" name="terrain" tilewidth="16" tileheight="16" tilecount="8" columns="4">
 <image source="terrain.png" width="64" height="32"/>
</tileset>"#;

        let margin = atlas.replace(r#"columns="4""#, r#"columns="4" margin="3000000000""#);
        assert!(matches!(
            Tileset::from_tsx_str(&margin),
            Err(TilesetError::GeometryOverflow(_))
        ));

        let spacing = atlas.replace(
            r#"tileheight="16""#,
            r#"tileheight="4294967295" spacing="1""#,
        );
        assert!(matches!(
            Tileset::from_tsx_str(&spacing),
            Err(TilesetError::GeometryOverflow(_))
        ));
    }

    #[test]
    fn test_save_current_without_path() {
        let mut tileset = Tileset::from_tsx_str(SMALL).unwrap();
        assert_eq!(tileset.save_current(), Err(TilesetError::NoPath));
    }
}
