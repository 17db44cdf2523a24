//! Tiled XML (`.tsx` / `.tmx`) reader

use super::{csv, LayerDocument, MapDocument, MapTilesetEntry, TilesetSource};
use crate::error::{LoadError, ParseError};
use crate::tileset::{RawTile, RawTileset, TilesetImage};
use crate::value::PropertyValue;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::str::FromStr;

type Attrs = HashMap<String, String>;

fn attributes(e: &BytesStart<'_>) -> Result<Attrs, ParseError> {
    let mut attrs = HashMap::new();
    for attr in e.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        attrs.insert(key, value);
    }
    Ok(attrs)
}

fn required<T: FromStr>(attrs: &Attrs, element: &str, key: &str) -> Result<T, ParseError> {
    let raw = attrs
        .get(key)
        .ok_or_else(|| ParseError::Syntax(format!("<{element}> is missing '{key}'")))?;
    raw.trim()
        .parse()
        .map_err(|_| ParseError::Syntax(format!("<{element} {key}=\"{raw}\"> is not valid")))
}

fn optional<T: FromStr>(attrs: &Attrs, element: &str, key: &str, default: T) -> Result<T, ParseError> {
    if attrs.contains_key(key) {
        required(attrs, element, key)
    } else {
        Ok(default)
    }
}

fn flag(attrs: &Attrs, key: &str, default: bool) -> bool {
    attrs.get(key).map_or(default, |v| v.trim() != "0")
}

/// A `<property>` whose end tag has not been seen yet
struct OpenProperty {
    name: String,
    value: PropertyValue,
    /// Whether the property belongs to a tile (directly or as a class member)
    accepted: bool,
    class_member: bool,
}

/// Streaming state for the body of one `<tileset>` element
struct TilesetReader {
    tileset: RawTileset,
    /// Element names between `<tileset>` and the current event
    path: Vec<Vec<u8>>,
    tile: Option<RawTile>,
    open: Vec<OpenProperty>,
}

impl TilesetReader {
    fn new(attrs: &Attrs) -> Result<Self, ParseError> {
        Ok(Self {
            tileset: RawTileset {
                name: attrs.get("name").cloned().unwrap_or_default(),
                tile_width: required(attrs, "tileset", "tilewidth")?,
                tile_height: required(attrs, "tileset", "tileheight")?,
                spacing: optional(attrs, "tileset", "spacing", 0)?,
                margin: optional(attrs, "tileset", "margin", 0)?,
                tile_count: required(attrs, "tileset", "tilecount")?,
                columns: optional(attrs, "tileset", "columns", 0)?,
                image: None,
                tiles: Vec::new(),
            },
            path: Vec::new(),
            tile: None,
            open: Vec::new(),
        })
    }

    fn parent_is(&self, names: &[&[u8]]) -> bool {
        self.path.len() >= names.len()
            && self.path[self.path.len() - names.len()..]
                .iter()
                .zip(names)
                .all(|(a, b)| a.as_slice() == *b)
    }

    fn open(&mut self, e: &BytesStart<'_>) -> Result<(), ParseError> {
        match e.name().as_ref() {
            b"image" if self.path.is_empty() => {
                let attrs = attributes(e)?;
                self.tileset.image = Some(TilesetImage {
                    source: attrs.get("source").cloned().unwrap_or_default(),
                    width: optional(&attrs, "image", "width", 0)?,
                    height: optional(&attrs, "image", "height", 0)?,
                });
            }
            b"tile" if self.path.is_empty() => {
                let attrs = attributes(e)?;
                self.tile = Some(RawTile {
                    id: required(&attrs, "tile", "id")?,
                    properties: Vec::new(),
                });
            }
            b"property" => {
                let tile_level = self.path.len() == 2 && self.parent_is(&[b"tile", b"properties"]);
                let class_member = self.parent_is(&[b"property", b"properties"])
                    && self.open.last().is_some_and(|p| p.accepted);
                let attrs = attributes(e)?;
                let raw = attrs.get("value").cloned().unwrap_or_default();
                let type_name = attrs.get("type").map(String::as_str);
                // Keep unparsable text so the classifier can report it against the tile
                let value = PropertyValue::from_typed(type_name, &raw)
                    .unwrap_or(PropertyValue::String(raw));
                self.open.push(OpenProperty {
                    name: attrs.get("name").cloned().unwrap_or_default(),
                    value,
                    accepted: tile_level || class_member,
                    class_member,
                });
            }
            _ => {}
        }
        Ok(())
    }

    fn close(&mut self, name: &[u8]) {
        match name {
            b"tile" if self.path.is_empty() => {
                if let Some(tile) = self.tile.take() {
                    self.tileset.tiles.push(tile);
                }
            }
            b"property" => {
                let Some(prop) = self.open.pop() else {
                    return;
                };
                if !prop.accepted {
                    return;
                }
                if prop.class_member {
                    if let Some(PropertyValue::Class(members)) =
                        self.open.last_mut().map(|p| &mut p.value)
                    {
                        members.insert(prop.name, prop.value);
                    }
                } else if let Some(tile) = self.tile.as_mut() {
                    tile.properties.push((prop.name, prop.value));
                }
            }
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        if self.path.last().is_some_and(|n| n.as_slice() == b"property") {
            if let Some(prop) = self.open.last_mut() {
                if matches!(&prop.value, PropertyValue::String(s) if s.is_empty()) {
                    prop.value = PropertyValue::String(text.to_string());
                }
            }
        }
    }
}

/// Read the body of a `<tileset>` element whose start tag was just consumed
fn read_tileset(reader: &mut Reader<&[u8]>, attrs: &Attrs, empty: bool) -> Result<RawTileset, ParseError> {
    let mut state = TilesetReader::new(attrs)?;
    if empty {
        return Ok(state.tileset);
    }

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                state.open(&e)?;
                state.path.push(e.name().as_ref().to_vec());
            }
            Event::Empty(e) => {
                state.open(&e)?;
                state.close(e.name().as_ref());
            }
            Event::End(e) => {
                if state.path.pop().is_none() {
                    // </tileset>
                    return Ok(state.tileset);
                }
                state.close(e.name().as_ref());
            }
            Event::Text(t) => state.text(&t.unescape()?),
            Event::CData(c) => state.text(&String::from_utf8_lossy(&c)),
            Event::Eof => {
                return Err(ParseError::Syntax("unterminated <tileset> element".to_string()))
            }
            _ => {}
        }
    }
}

pub(super) fn parse_tileset(text: &str) -> Result<RawTileset, ParseError> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    loop {
        match reader.read_event()? {
            Event::Start(e) if e.name().as_ref() == b"tileset" => {
                let attrs = attributes(&e)?;
                return read_tileset(&mut reader, &attrs, false);
            }
            Event::Empty(e) if e.name().as_ref() == b"tileset" => {
                let attrs = attributes(&e)?;
                return read_tileset(&mut reader, &attrs, true);
            }
            Event::Eof => return Err(ParseError::Syntax("no <tileset> element".to_string())),
            _ => {}
        }
    }
}

fn malformed(err: ParseError) -> LoadError {
    match err {
        ParseError::Syntax(message) => LoadError::Malformed(message),
        other => LoadError::Malformed(other.to_string()),
    }
}

/// How the current `<data>` element stores its gids
#[derive(Debug, Clone, Copy, PartialEq)]
enum DataEncoding {
    Csv,
    /// One `<tile gid="..."/>` child per cell
    Elements,
}

struct PendingLayer {
    name: String,
    visible: bool,
    gids: Vec<u32>,
}

pub(super) fn parse_map(text: &str) -> Result<MapDocument, LoadError> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut doc = MapDocument::default();
    let mut seen_map = false;
    let mut layer: Option<PendingLayer> = None;
    let mut data: Option<DataEncoding> = None;
    // Visibility of enclosing <group> elements
    let mut groups: Vec<bool> = Vec::new();

    loop {
        let event = reader.read_event()?;
        let is_empty = matches!(event, Event::Empty(_));
        match event {
            Event::Start(ref e) | Event::Empty(ref e) => match e.name().as_ref() {
                b"map" => {
                    let attrs = attributes(e).map_err(malformed)?;
                    if flag(&attrs, "infinite", false) {
                        return Err(LoadError::Malformed(
                            "infinite maps are not supported".to_string(),
                        ));
                    }
                    if let Some(orientation) = attrs.get("orientation") {
                        if orientation != "orthogonal" {
                            tracing::warn!(%orientation, "treating map as an orthogonal grid");
                        }
                    }
                    doc.width = required(&attrs, "map", "width").map_err(malformed)?;
                    doc.height = required(&attrs, "map", "height").map_err(malformed)?;
                    doc.tile_width = required(&attrs, "map", "tilewidth").map_err(malformed)?;
                    doc.tile_height = required(&attrs, "map", "tileheight").map_err(malformed)?;
                    seen_map = true;
                }
                b"tileset" => {
                    let attrs = attributes(e).map_err(malformed)?;
                    let first_gid = required(&attrs, "tileset", "firstgid").map_err(malformed)?;
                    let source = match attrs.get("source") {
                        Some(path) => {
                            if !is_empty {
                                reader.read_to_end(e.name())?;
                            }
                            TilesetSource::External(path.clone())
                        }
                        None => {
                            let name = attrs.get("name").cloned().unwrap_or_default();
                            let raw = read_tileset(&mut reader, &attrs, is_empty)
                                .map_err(|source| LoadError::Tileset { name, source })?;
                            TilesetSource::Inline(raw)
                        }
                    };
                    doc.tilesets.push(MapTilesetEntry { first_gid, source });
                }
                b"group" if !is_empty => {
                    let attrs = attributes(e).map_err(malformed)?;
                    groups.push(flag(&attrs, "visible", true));
                }
                b"layer" => {
                    let attrs = attributes(e).map_err(malformed)?;
                    let pending = PendingLayer {
                        name: attrs.get("name").cloned().unwrap_or_default(),
                        visible: flag(&attrs, "visible", true) && groups.iter().all(|v| *v),
                        gids: Vec::new(),
                    };
                    if is_empty {
                        doc.layers.push(finish_layer(pending));
                    } else {
                        layer = Some(pending);
                    }
                }
                b"data" if layer.is_some() => {
                    let attrs = attributes(e).map_err(malformed)?;
                    let encoding = match attrs.get("encoding").map(String::as_str) {
                        Some("csv") => DataEncoding::Csv,
                        None => DataEncoding::Elements,
                        Some(other) => {
                            return Err(LoadError::Malformed(format!(
                                "layer data encoding '{other}' is not supported"
                            )))
                        }
                    };
                    if !is_empty {
                        data = Some(encoding);
                    }
                }
                b"tile" if data == Some(DataEncoding::Elements) => {
                    let attrs = attributes(e).map_err(malformed)?;
                    let gid = optional(&attrs, "tile", "gid", 0).map_err(malformed)?;
                    if let Some(layer) = layer.as_mut() {
                        layer.gids.push(gid);
                    }
                }
                b"chunk" => {
                    return Err(LoadError::Malformed(
                        "chunked (infinite) layer data is not supported".to_string(),
                    ));
                }
                b"objectgroup" | b"imagelayer" if !is_empty => {
                    tracing::debug!("skipping non-tile layer");
                    reader.read_to_end(e.name())?;
                }
                _ => {}
            },
            Event::Text(ref t) if data == Some(DataEncoding::Csv) => {
                let gids = csv::parse_gids(&t.unescape()?).map_err(LoadError::Malformed)?;
                if let Some(layer) = layer.as_mut() {
                    layer.gids.extend(gids);
                }
            }
            Event::End(ref e) => match e.name().as_ref() {
                b"data" => data = None,
                b"layer" => {
                    if let Some(pending) = layer.take() {
                        doc.layers.push(finish_layer(pending));
                    }
                }
                b"group" => {
                    groups.pop();
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    if !seen_map {
        return Err(LoadError::Malformed("no <map> element".to_string()));
    }
    Ok(doc)
}

fn finish_layer(pending: PendingLayer) -> LayerDocument {
    LayerDocument {
        name: pending.name,
        visible: pending.visible,
        gids: pending.gids,
    }
}
