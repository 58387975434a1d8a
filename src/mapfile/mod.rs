//! # Map Files
//!
//! Hand-drawn levels: an ASCII-art block, a blank line, and an optional JSON
//! metadata block.
//!
//! ```text
//! #####
//! #...#
//! #.>.#
//! #####
//!
//! {"mapdetails": {"player_spawn_x": 1, "player_spawn_y": 1},
//!  "mapfeatures": {"2,2": {"kwargs": {"destination_x": 3, "destination_y": 3}}},
//!  "entities": [{"classname": "ItemPickup", "x_coord": 3, "y_coord": 1,
//!                "args": [["torch"]]}]}
//! ```
//!
//! Glyphs: `.` floor, `#` wall, ` ` void, `>` stairs down, `<` stairs up;
//! anything else is void. Art lines may differ in length; short lines are
//! padded with void.

pub mod descriptors;

pub use descriptors::*;

use crate::{
    EntityKindSpec, EntitySpec, FeatureKind, Grid, Position, RockslikeError, RockslikeResult,
    TerrainFeature, TerrainGrid,
};
use std::collections::HashMap;
use std::path::Path;

/// Result of parsing a map file: terrain plus entities still to be built.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedMap {
    pub name: Option<String>,
    pub terrain: TerrainGrid,
    pub entities: Vec<EntitySpec>,
    pub player_spawn: Position,
}

/// Reads and parses a map file from disk.
pub fn load_map_file(path: impl AsRef<Path>) -> RockslikeResult<ParsedMap> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    let parsed = parse_map(&text)?;
    log::info!(
        "Parsed map file {} ({}x{})",
        path.display(),
        parsed.terrain.width(),
        parsed.terrain.height()
    );
    Ok(parsed)
}

/// Parses map file text.
///
/// Only blank lines are trimmed from the ends of the text, so leading spaces
/// (void cells) on the first art line survive.
///
/// # Examples
///
/// ```
/// use rockslike::{parse_map, FeatureKind};
///
/// let parsed = parse_map("##\n#.\n##").unwrap();
/// assert_eq!((parsed.terrain.width(), parsed.terrain.height()), (2, 3));
/// assert_eq!(parsed.terrain.get(1, 1).unwrap().kind(), FeatureKind::Floor);
/// assert!(parsed.entities.is_empty());
/// ```
pub fn parse_map(text: &str) -> RockslikeResult<ParsedMap> {
    let lines: Vec<&str> = text.lines().map(|line| line.trim_end_matches('\r')).collect();
    let first = lines
        .iter()
        .position(|line| !line.trim().is_empty())
        .unwrap_or(lines.len());
    let last = lines
        .iter()
        .rposition(|line| !line.trim().is_empty())
        .map_or(first, |index| index + 1);
    let body = &lines[first..last];

    let art_end = body
        .iter()
        .position(|line| line.is_empty())
        .unwrap_or(body.len());
    let art = &body[..art_end];
    let metadata_text = body.get(art_end + 1..).unwrap_or(&[]).join("\n");
    // 1-based file line of the first metadata line
    let metadata_line = first + art_end + 2;

    let metadata: MapMetadata = if metadata_text.trim().is_empty() {
        MapMetadata::default()
    } else {
        serde_json::from_str(&metadata_text).map_err(|err| RockslikeError::MalformedMap {
            line: Some(metadata_line + err.line().saturating_sub(1)),
            reason: err.to_string(),
        })?
    };

    let terrain = parse_terrain(art, &metadata, first + 1)?;
    let entities = metadata
        .entities
        .iter()
        .map(|descriptor| {
            let spec = descriptor.to_spec()?;
            check_in_art(&terrain, spec.position, &descriptor.classname)?;
            Ok(spec)
        })
        .collect::<RockslikeResult<Vec<_>>>()?;

    let player_spawn = resolve_spawn(&terrain, &metadata, &entities)?;
    Ok(ParsedMap {
        name: metadata.mapdetails.name.clone(),
        terrain,
        entities,
        player_spawn,
    })
}

/// Builds the terrain grid; `first_line` is the file line of the first art row.
fn parse_terrain(
    art: &[&str],
    metadata: &MapMetadata,
    first_line: usize,
) -> RockslikeResult<TerrainGrid> {
    let mut overrides = HashMap::with_capacity(metadata.mapfeatures.len());
    for (key, descriptor) in &metadata.mapfeatures {
        overrides.insert(parse_coordinate_key(key)?, (key, descriptor));
    }

    let width = art.iter().map(|line| line.chars().count()).max().unwrap_or(0);
    let mut rows = Vec::with_capacity(art.len());
    for (y, line) in art.iter().enumerate() {
        let mut glyphs: Vec<char> = line.chars().collect();
        glyphs.resize(width, ' ');
        let row = glyphs
            .into_iter()
            .enumerate()
            .map(|(x, glyph)| {
                let position = Position::new(x as i32, y as i32);
                match overrides.remove(&position) {
                    Some((key, descriptor)) => {
                        descriptor.resolve(glyph).map_err(|err| match err {
                            RockslikeError::MalformedMap { reason, .. } => {
                                RockslikeError::MalformedMap {
                                    line: Some(first_line + y),
                                    reason: format!("mapfeatures \"{}\": {}", key, reason),
                                }
                            }
                            other => other,
                        })
                    }
                    None => Ok(TerrainFeature::new(
                        FeatureKind::from_glyph(glyph).unwrap_or(FeatureKind::Void),
                    )),
                }
            })
            .collect::<RockslikeResult<Vec<_>>>()?;
        rows.push(row);
    }

    // Anything left over points outside the art.
    if let Some((key, _)) = overrides.values().next() {
        return Err(RockslikeError::malformed(format!(
            "mapfeatures \"{}\" lies outside the {}x{} map",
            key,
            width,
            art.len()
        )));
    }

    Grid::from_rows(rows)
}

fn check_in_art(terrain: &TerrainGrid, position: Position, what: &str) -> RockslikeResult<()> {
    if terrain.contains_position(position) {
        Ok(())
    } else {
        Err(RockslikeError::malformed(format!(
            "{} at ({}) lies outside the {}x{} map",
            what,
            position,
            terrain.width(),
            terrain.height()
        )))
    }
}

/// A `Player` entity wins over `mapdetails`; the default is `(0, 0)`.
fn resolve_spawn(
    terrain: &TerrainGrid,
    metadata: &MapMetadata,
    entities: &[EntitySpec],
) -> RockslikeResult<Position> {
    let mut players = entities
        .iter()
        .filter(|spec| spec.kind == EntityKindSpec::Player);
    let from_entity = players.next().map(|spec| spec.position);
    if players.next().is_some() {
        return Err(RockslikeError::malformed("more than one Player entity"));
    }

    let spawn = from_entity
        .or_else(|| metadata.mapdetails.player_spawn())
        .unwrap_or_default();
    if !terrain.is_empty() {
        check_in_art(terrain, spawn, "Player spawn")?;
    }
    Ok(spawn)
}
