//! Tiled JSON (`.tsj` / `.tmj`) reader

use super::{LayerDocument, MapDocument, MapTilesetEntry, TilesetSource};
use crate::error::{LoadError, ParseError};
use crate::tileset::{RawTile, RawTileset, TilesetImage};
use crate::value::PropertyValue;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct JsonProperty {
    name: String,
    #[serde(rename = "type")]
    type_name: Option<String>,
    #[serde(default)]
    value: serde_json::Value,
}

impl JsonProperty {
    fn into_pair(self) -> (String, PropertyValue) {
        let value = PropertyValue::from_json(self.type_name.as_deref(), &self.value)
            // Mistyped values are kept as text; the classifier reports them if they matter
            .unwrap_or_else(|| PropertyValue::String(self.value.to_string()));
        (self.name, value)
    }
}

#[derive(Debug, Deserialize)]
struct JsonTile {
    id: u32,
    #[serde(default)]
    properties: Vec<JsonProperty>,
}

#[derive(Debug, Deserialize)]
struct JsonTileset {
    #[serde(default)]
    name: String,
    tilewidth: u32,
    tileheight: u32,
    #[serde(default)]
    spacing: u32,
    #[serde(default)]
    margin: u32,
    tilecount: u32,
    #[serde(default)]
    columns: u32,
    image: Option<String>,
    #[serde(default)]
    imagewidth: u32,
    #[serde(default)]
    imageheight: u32,
    #[serde(default)]
    tiles: Vec<JsonTile>,
}

impl From<JsonTileset> for RawTileset {
    fn from(json: JsonTileset) -> Self {
        RawTileset {
            name: json.name,
            tile_width: json.tilewidth,
            tile_height: json.tileheight,
            spacing: json.spacing,
            margin: json.margin,
            tile_count: json.tilecount,
            columns: json.columns,
            image: json.image.map(|source| TilesetImage {
                source,
                width: json.imagewidth,
                height: json.imageheight,
            }),
            tiles: json
                .tiles
                .into_iter()
                .map(|tile| RawTile {
                    id: tile.id,
                    properties: tile.properties.into_iter().map(JsonProperty::into_pair).collect(),
                })
                .collect(),
        }
    }
}

pub(super) fn parse_tileset(text: &str) -> Result<RawTileset, ParseError> {
    let json: JsonTileset = serde_json::from_str(text)?;
    Ok(json.into())
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JsonMapTileset {
    External {
        firstgid: u32,
        source: String,
    },
    Inline {
        firstgid: u32,
        #[serde(flatten)]
        tileset: JsonTileset,
    },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JsonLayerData {
    Gids(Vec<u32>),
    Encoded(String),
}

#[derive(Debug, Deserialize)]
struct JsonLayer {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    name: String,
    #[serde(default = "default_visible")]
    visible: bool,
    data: Option<JsonLayerData>,
    encoding: Option<String>,
    #[serde(default)]
    layers: Vec<JsonLayer>,
}

fn default_visible() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct JsonMap {
    width: u32,
    height: u32,
    tilewidth: u32,
    tileheight: u32,
    #[serde(default)]
    infinite: bool,
    orientation: Option<String>,
    #[serde(default)]
    tilesets: Vec<JsonMapTileset>,
    #[serde(default)]
    layers: Vec<JsonLayer>,
}

/// Flatten groups into tile layers, bottom to top
fn collect_layers(layers: Vec<JsonLayer>, parent_visible: bool, out: &mut Vec<LayerDocument>) -> Result<(), LoadError> {
    for layer in layers {
        let visible = parent_visible && layer.visible;
        match layer.kind.as_str() {
            "tilelayer" => {
                let gids = match layer.data {
                    Some(JsonLayerData::Gids(gids)) => gids,
                    Some(JsonLayerData::Encoded(_)) => {
                        return Err(LoadError::Malformed(format!(
                            "layer '{}': encoding '{}' is not supported",
                            layer.name,
                            layer.encoding.as_deref().unwrap_or("base64")
                        )))
                    }
                    None => Vec::new(),
                };
                out.push(LayerDocument {
                    name: layer.name,
                    visible,
                    gids,
                });
            }
            "group" => collect_layers(layer.layers, visible, out)?,
            other => tracing::debug!(layer = %layer.name, kind = other, "skipping non-tile layer"),
        }
    }
    Ok(())
}

pub(super) fn parse_map(text: &str) -> Result<MapDocument, LoadError> {
    let json: JsonMap = serde_json::from_str(text)?;
    if json.infinite {
        return Err(LoadError::Malformed(
            "infinite maps are not supported".to_string(),
        ));
    }
    if let Some(orientation) = json.orientation.as_deref() {
        if orientation != "orthogonal" {
            tracing::warn!(%orientation, "treating map as an orthogonal grid");
        }
    }

    let tilesets = json
        .tilesets
        .into_iter()
        .map(|entry| match entry {
            JsonMapTileset::External { firstgid, source } => MapTilesetEntry {
                first_gid: firstgid,
                source: TilesetSource::External(source),
            },
            JsonMapTileset::Inline { firstgid, tileset } => MapTilesetEntry {
                first_gid: firstgid,
                source: TilesetSource::Inline(tileset.into()),
            },
        })
        .collect();

    let mut layers = Vec::new();
    collect_layers(json.layers, true, &mut layers)?;

    Ok(MapDocument {
        width: json.width,
        height: json.height,
        tile_width: json.tilewidth,
        tile_height: json.tileheight,
        tilesets,
        layers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json_tileset() {
        let raw = parse_tileset(
            r#"{
                "name": "roguelikeSheet_transparent",
                "tilewidth": 16, "tileheight": 16, "spacing": 1,
                "tilecount": 1767, "columns": 57,
                "image": "roguelikeSheet_transparent.png", "imagewidth": 968, "imageheight": 526,
                "tiles": [
                    {"id": 137, "properties": [{"name": "collision", "type": "string", "value": "0.6,0,1,0.9"}]},
                    {"id": 416, "properties": [{"name": "light", "type": "float", "value": 1}]},
                    {"id": 417, "properties": [{"name": "light", "type": "float", "value": "bright"}]}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(raw.tile_count, 1767);
        assert_eq!(raw.image.as_ref().unwrap().height, 526);
        assert_eq!(raw.tiles[0].properties[0].1, PropertyValue::from("0.6,0,1,0.9"));
        assert_eq!(raw.tiles[1].properties[0].1, PropertyValue::Float(1.0));
        // mistyped value survives as text
        assert_eq!(raw.tiles[2].properties[0].1.as_str(), Some("bright"));
    }

    #[test]
    fn test_parse_json_map_flattens_groups() {
        let doc = parse_map(
            r#"{
                "width": 2, "height": 1, "tilewidth": 16, "tileheight": 16,
                "orientation": "orthogonal", "infinite": false,
                "tilesets": [
                    {"firstgid": 1, "source": "roguelikeSheet_transparent.tsx"},
                    {"firstgid": 1768, "name": "props", "tilewidth": 16, "tileheight": 16, "tilecount": 4}
                ],
                "layers": [
                    {"type": "tilelayer", "name": "Ground", "data": [1, 2]},
                    {"type": "objectgroup", "name": "Objects", "objects": []},
                    {"type": "group", "name": "Upper", "visible": false, "layers": [
                        {"type": "tilelayer", "name": "Roof", "data": [0, 1769]}
                    ]}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(doc.tilesets.len(), 2);
        assert!(matches!(doc.tilesets[0].source, TilesetSource::External(_)));
        assert!(matches!(doc.tilesets[1].source, TilesetSource::Inline(_)));
        let names: Vec<_> = doc.layers.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, ["Ground", "Roof"]);
        assert!(doc.layers[0].visible);
        assert!(!doc.layers[1].visible);
        assert_eq!(doc.layers[1].gids, vec![0, 1769]);
    }

    #[test]
    fn test_base64_layer_rejected() {
        let err = parse_map(
            r#"{"width": 1, "height": 1, "tilewidth": 16, "tileheight": 16,
                "layers": [{"type": "tilelayer", "name": "a", "encoding": "base64", "data": "AQAAAA=="}]}"#,
        )
        .unwrap_err();
        assert_eq!(err.kind(), crate::error::LoadErrorKind::Malformed);
    }
}
