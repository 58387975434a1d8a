//! # Terrain Features
//!
//! The static occupant of every grid cell and the collision contract shared
//! with entities.

use crate::{Color, Entity, EventBus, GameEvent, Player, Position, StairDirection, Tile};
use serde::{Deserialize, Serialize};

/// Anything a player can bump into: terrain features and entities.
pub trait PlayerCollision {
    /// Called when `player` attempts to move onto this occupant's cell.
    ///
    /// Returns whether the move is allowed. Implementations may publish events
    /// on `bus` (messages, deaths) and may modify the player (inventory).
    fn player_collision(&mut self, player: &mut Player, bus: &EventBus) -> bool;
}

/// Classification of a terrain feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureKind {
    /// Walkable ground
    Floor,
    /// Blocks movement
    Wall,
    /// Outside the map; also returned for every out-of-bounds query
    Void,
    /// Leads one level deeper
    StairsDown { destination: Option<Position> },
    /// Leads one level up
    StairsUp { destination: Option<Position> },
}

impl FeatureKind {
    /// Class name used by map files.
    pub fn class_name(&self) -> &'static str {
        match self {
            FeatureKind::Floor => "Floor",
            FeatureKind::Wall => "Wall",
            FeatureKind::Void => "Void",
            FeatureKind::StairsDown { .. } => "StairsDown",
            FeatureKind::StairsUp { .. } => "StairsUp",
        }
    }

    /// Resolves a map-file class name; `destination` only applies to stairs.
    pub fn from_class_name(name: &str, destination: Option<Position>) -> Option<FeatureKind> {
        match name {
            "Floor" => Some(FeatureKind::Floor),
            "Wall" => Some(FeatureKind::Wall),
            "Void" => Some(FeatureKind::Void),
            "StairsDown" => Some(FeatureKind::StairsDown { destination }),
            "StairsUp" => Some(FeatureKind::StairsUp { destination }),
            _ => None,
        }
    }

    /// Resolves an ASCII-art glyph.
    pub fn from_glyph(glyph: char) -> Option<FeatureKind> {
        match glyph {
            '.' => Some(FeatureKind::Floor),
            '#' => Some(FeatureKind::Wall),
            ' ' => Some(FeatureKind::Void),
            '>' => Some(FeatureKind::StairsDown { destination: None }),
            '<' => Some(FeatureKind::StairsUp { destination: None }),
            _ => None,
        }
    }

    /// Appearance used when nothing overrides it.
    pub const fn default_tile(&self) -> Tile {
        match self {
            FeatureKind::Floor => Tile::new('.', Color::White, Color::Black),
            FeatureKind::Wall => Tile::new('#', Color::White, Color::Black),
            FeatureKind::Void => Tile::new(' ', Color::Black, Color::Black),
            FeatureKind::StairsDown { .. } => Tile::new('>', Color::Yellow, Color::Black),
            FeatureKind::StairsUp { .. } => Tile::new('<', Color::Yellow, Color::Black),
        }
    }
}

/// An immutable terrain feature: what it is and how it looks.
///
/// Changing a cell means storing a new feature in the grid, never mutating
/// the one that is there.
///
/// # Examples
///
/// ```
/// use rockslike::{FeatureKind, TerrainFeature};
///
/// let wall = TerrainFeature::wall();
/// assert!(!wall.is_passable());
/// assert_eq!(wall.tile().character, '#');
/// assert_eq!(TerrainFeature::VOID.kind(), FeatureKind::Void);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TerrainFeature {
    kind: FeatureKind,
    tile: Tile,
}

impl TerrainFeature {
    /// The sentinel answered for any query outside a map.
    pub const VOID: TerrainFeature = TerrainFeature::new(FeatureKind::Void);

    pub const fn new(kind: FeatureKind) -> Self {
        Self {
            kind,
            tile: kind.default_tile(),
        }
    }

    pub const fn with_tile(kind: FeatureKind, tile: Tile) -> Self {
        Self { kind, tile }
    }

    pub const fn floor() -> Self {
        Self::new(FeatureKind::Floor)
    }

    pub const fn wall() -> Self {
        Self::new(FeatureKind::Wall)
    }

    pub const fn stairs_down(destination: Option<Position>) -> Self {
        Self::new(FeatureKind::StairsDown { destination })
    }

    pub const fn stairs_up(destination: Option<Position>) -> Self {
        Self::new(FeatureKind::StairsUp { destination })
    }

    pub fn kind(&self) -> FeatureKind {
        self.kind
    }

    pub fn tile(&self) -> Tile {
        self.tile
    }

    pub fn is_passable(&self) -> bool {
        !matches!(self.kind, FeatureKind::Wall | FeatureKind::Void)
    }

    /// Which way this feature leads, if it is a staircase.
    pub fn stair_direction(&self) -> Option<StairDirection> {
        match self.kind {
            FeatureKind::StairsDown { .. } => Some(StairDirection::Down),
            FeatureKind::StairsUp { .. } => Some(StairDirection::Up),
            _ => None,
        }
    }

    /// Uses this feature as a portal for an actor standing on it.
    ///
    /// Stairs publish [`GameEvent::LevelChange`] and, when a destination was
    /// configured, move the actor there. Returns false (and does nothing) for
    /// features that are not portals.
    pub fn activate_portal(&self, actor: &mut Player, bus: &EventBus) -> bool {
        let (direction, destination) = match self.kind {
            FeatureKind::StairsDown { destination } => (StairDirection::Down, destination),
            FeatureKind::StairsUp { destination } => (StairDirection::Up, destination),
            _ => return false,
        };

        if let Some(destination) = destination {
            actor.set_position(destination);
        }
        bus.publish(GameEvent::LevelChange {
            direction,
            destination,
        });
        true
    }
}

impl PlayerCollision for TerrainFeature {
    fn player_collision(&mut self, _player: &mut Player, _bus: &EventBus) -> bool {
        self.is_passable()
    }
}
