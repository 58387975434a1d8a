//! Structured metadata of a map file and its conversion into terrain features
//! and entity specifications.

use crate::{
    Color, EntityKindSpec, EntitySpec, FeatureKind, ItemPickup, Player, Position, RockslikeError,
    RockslikeResult, Signpost, TerrainFeature, Tile,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// The JSON block after the art. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MapMetadata {
    pub mapdetails: MapDetails,
    /// Overrides keyed by `"x,y"`
    pub mapfeatures: BTreeMap<String, FeatureDescriptor>,
    pub entities: Vec<EntityDescriptor>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MapDetails {
    pub name: Option<String>,
    pub version: Option<Value>,
    pub player_spawn_x: Option<i32>,
    pub player_spawn_y: Option<i32>,
}

impl MapDetails {
    /// The spawn, when both coordinates are given.
    pub fn player_spawn(&self) -> Option<Position> {
        match (self.player_spawn_x, self.player_spawn_y) {
            (Some(x), Some(y)) => Some(Position::new(x, y)),
            _ => None,
        }
    }
}

/// Appearance fields shared by terrain and entity descriptors.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TileOverride {
    pub tilechar: Option<String>,
    pub fgcolor: Option<String>,
    pub bgcolor: Option<String>,
    pub bold: Option<bool>,
}

impl TileOverride {
    pub fn is_empty(&self) -> bool {
        self.tilechar.is_none()
            && self.fgcolor.is_none()
            && self.bgcolor.is_none()
            && self.bold.is_none()
    }

    fn character(&self) -> RockslikeResult<Option<char>> {
        let Some(text) = &self.tilechar else {
            return Ok(None);
        };
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(Some(c)),
            _ => Err(RockslikeError::malformed(format!(
                "tilechar must be a single character, got '{}'",
                text
            ))),
        }
    }

    /// Applies every present field on top of `base`.
    pub fn apply(&self, base: Tile) -> RockslikeResult<Tile> {
        let mut tile = base;
        if let Some(c) = self.character()? {
            tile.character = c;
        }
        if let Some(fg) = &self.fgcolor {
            tile.foreground = fg.parse::<Color>()?;
        }
        if let Some(bg) = &self.bgcolor {
            tile.background = bg.parse::<Color>()?;
        }
        if let Some(bold) = self.bold {
            tile.bold = bold;
        }
        Ok(tile)
    }
}

/// Override for the terrain of one cell.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FeatureDescriptor {
    pub classname: Option<String>,
    #[serde(flatten)]
    pub tile: TileOverride,
    pub args: Vec<Value>,
    pub kwargs: Map<String, Value>,
}

impl FeatureDescriptor {
    /// Builds the feature for a cell whose art glyph is `glyph`.
    ///
    /// The class comes from `classname`, else from the glyph, else Void. An
    /// absent `tilechar` keeps the glyph drawn in the art.
    pub fn resolve(&self, glyph: char) -> RockslikeResult<TerrainFeature> {
        let class = match &self.classname {
            Some(name) => name.as_str(),
            None => FeatureKind::from_glyph(glyph)
                .unwrap_or(FeatureKind::Void)
                .class_name(),
        };
        let destination = self.destination()?;
        let kind = FeatureKind::from_class_name(class, destination)
            .ok_or_else(|| RockslikeError::malformed(format!("unknown terrain class '{}'", class)))?;

        let is_stairs = matches!(
            kind,
            FeatureKind::StairsDown { .. } | FeatureKind::StairsUp { .. }
        );
        if !is_stairs && (!self.args.is_empty() || !self.kwargs.is_empty()) {
            return Err(RockslikeError::malformed(format!(
                "{} takes no arguments",
                class
            )));
        }

        let mut base = kind.default_tile();
        base.character = glyph;
        Ok(TerrainFeature::with_tile(kind, self.tile.apply(base)?))
    }

    /// Stair destination from `args: [x, y]` or `kwargs: {destination_x, destination_y}`.
    fn destination(&self) -> RockslikeResult<Option<Position>> {
        if let [x, y] = self.args.as_slice() {
            return Ok(Some(Position::new(coordinate(x)?, coordinate(y)?)));
        }
        if !self.args.is_empty() {
            return Err(RockslikeError::malformed(
                "stair args must be [destination_x, destination_y]",
            ));
        }
        match (self.kwargs.get("destination_x"), self.kwargs.get("destination_y")) {
            (Some(x), Some(y)) => Ok(Some(Position::new(coordinate(x)?, coordinate(y)?))),
            (None, None) => Ok(None),
            _ => Err(RockslikeError::malformed(
                "stairs need both destination_x and destination_y",
            )),
        }
    }
}

/// One entry of the `entities` list.
#[derive(Debug, Clone, Deserialize)]
pub struct EntityDescriptor {
    pub classname: String,
    pub x_coord: i32,
    pub y_coord: i32,
    #[serde(flatten)]
    pub tile: TileOverride,
    #[serde(default)]
    pub args: Vec<Value>,
    #[serde(default)]
    pub kwargs: Map<String, Value>,
}

impl EntityDescriptor {
    pub fn position(&self) -> Position {
        Position::new(self.x_coord, self.y_coord)
    }

    /// Converts the descriptor into a deferred entity.
    pub fn to_spec(&self) -> RockslikeResult<EntitySpec> {
        let (kind, default_tile) = match self.classname.as_str() {
            "Player" => {
                self.expect_no_arguments()?;
                (EntityKindSpec::Player, Player::DEFAULT_TILE)
            }
            "ItemPickup" => (
                EntityKindSpec::ItemPickup {
                    items: self.items()?,
                },
                ItemPickup::DEFAULT_TILE,
            ),
            "Signpost" => {
                let (message, let_player_pass) = self.signpost()?;
                (
                    EntityKindSpec::Signpost {
                        message,
                        let_player_pass,
                    },
                    Signpost::DEFAULT_TILE,
                )
            }
            other => {
                return Err(RockslikeError::malformed(format!(
                    "unknown entity class '{}'",
                    other
                )))
            }
        };

        let tile = if self.tile.is_empty() {
            None
        } else if self.tile.tilechar.is_some() {
            // A custom glyph starts from plain white on black.
            Some(self.tile.apply(Tile::new(' ', Color::White, Color::Black))?)
        } else {
            Some(self.tile.apply(default_tile)?)
        };

        Ok(EntitySpec {
            kind,
            position: self.position(),
            tile,
        })
    }

    fn expect_no_arguments(&self) -> RockslikeResult<()> {
        if self.args.is_empty() && self.kwargs.is_empty() {
            Ok(())
        } else {
            Err(RockslikeError::malformed(format!(
                "{} takes no arguments",
                self.classname
            )))
        }
    }

    /// `args: [[items...]]` or `kwargs: {"items": [...]}`; no items is allowed.
    fn items(&self) -> RockslikeResult<Vec<String>> {
        let list = match (self.args.as_slice(), self.kwargs.get("items")) {
            ([list], None) | ([], Some(list)) => list,
            ([], None) => return Ok(Vec::new()),
            _ => {
                return Err(RockslikeError::malformed(
                    "ItemPickup expects a single list of items",
                ))
            }
        };
        let items = list
            .as_array()
            .ok_or_else(|| RockslikeError::malformed("ItemPickup items must be a list"))?;
        items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| RockslikeError::malformed("items must be strings"))
            })
            .collect()
    }

    /// `args: [message, let_player_pass?]` or `kwargs: {message, let_player_pass}`.
    fn signpost(&self) -> RockslikeResult<(String, bool)> {
        let (message, pass) = match self.args.as_slice() {
            [] => (self.kwargs.get("message"), self.kwargs.get("let_player_pass")),
            [message] => (Some(message), self.kwargs.get("let_player_pass")),
            [message, pass] => (Some(message), Some(pass)),
            _ => {
                return Err(RockslikeError::malformed(
                    "Signpost takes at most [message, let_player_pass]",
                ))
            }
        };
        let message = message
            .and_then(Value::as_str)
            .ok_or_else(|| RockslikeError::malformed("Signpost needs a message string"))?;
        let pass = match pass {
            None => false,
            Some(value) => value
                .as_bool()
                .ok_or_else(|| RockslikeError::malformed("let_player_pass must be a boolean"))?,
        };
        Ok((message.to_string(), pass))
    }
}

fn coordinate(value: &Value) -> RockslikeResult<i32> {
    value
        .as_i64()
        .and_then(|n| i32::try_from(n).ok())
        .ok_or_else(|| RockslikeError::malformed(format!("'{}' is not a coordinate", value)))
}

/// Parses an `"x,y"` coordinate key.
pub fn parse_coordinate_key(key: &str) -> RockslikeResult<Position> {
    let bad = || RockslikeError::malformed(format!("bad coordinate key '{}'", key));
    let (x, y) = key.split_once(',').ok_or_else(bad)?;
    let x = x.trim().parse().map_err(|_| bad())?;
    let y = y.trim().parse().map_err(|_| bad())?;
    Ok(Position::new(x, y))
}
