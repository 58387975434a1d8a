//! # Game Module
//!
//! The map and world model of Rockslike.
//!
//! This module contains the fundamental building blocks of the game:
//! - Grid storage and the terrain-grid union used to compose maps
//! - Tiles and the colour-pair registry
//! - Terrain features and the player collision contract
//! - Entities (player, item pickups, signposts) and their deferred specifications
//! - The event bus and the world aggregate that ties them together

pub mod entities;
pub mod events;
pub mod features;
pub mod grid;
pub mod level;
pub mod tile;
pub mod world;

pub use entities::*;
pub use events::*;
pub use features::*;
pub use grid::*;
pub use level::*;
pub use tile::*;
pub use world::*;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents a 2D coordinate in the game world.
///
/// Coordinates are signed so that out-of-bounds queries (negative or past the
/// edge) can be expressed and answered with the void sentinel.
///
/// # Examples
///
/// ```
/// use rockslike::Position;
///
/// let pos = Position::new(10, 5);
/// assert_eq!(pos.x, 10);
/// assert_eq!(pos.offset(-1, 1), Position::new(9, 6));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    /// Creates a new position with the given coordinates.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns the origin position (0, 0).
    pub const fn origin() -> Self {
        Self::new(0, 0)
    }

    /// Returns this position shifted by the given deltas.
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Calculates the Manhattan distance to another position.
    pub fn manhattan_distance(self, other: Position) -> u32 {
        ((self.x - other.x).abs() + (self.y - other.y).abs()) as u32
    }

    /// Returns the 4 cardinal neighbours (no diagonals).
    pub fn cardinal_adjacent_positions(self) -> [Position; 4] {
        [
            self.offset(0, -1),
            self.offset(-1, 0),
            self.offset(1, 0),
            self.offset(0, 1),
        ]
    }

    /// Returns all 8 neighbours.
    pub fn adjacent_positions(self) -> impl Iterator<Item = Position> {
        Direction::all().into_iter().map(move |d| self + d.to_delta())
    }
}

impl std::ops::Add for Position {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl std::ops::Sub for Position {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

/// The eight directions a player can step in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    Northeast,
    East,
    Southeast,
    South,
    Southwest,
    West,
    Northwest,
}

impl Direction {
    /// Converts a direction to a position delta.
    ///
    /// # Examples
    ///
    /// ```
    /// use rockslike::{Direction, Position};
    ///
    /// assert_eq!(Direction::North.to_delta(), Position::new(0, -1));
    /// assert_eq!(Direction::Southwest.to_delta(), Position::new(-1, 1));
    /// ```
    pub fn to_delta(self) -> Position {
        match self {
            Direction::North => Position::new(0, -1),
            Direction::Northeast => Position::new(1, -1),
            Direction::East => Position::new(1, 0),
            Direction::Southeast => Position::new(1, 1),
            Direction::South => Position::new(0, 1),
            Direction::Southwest => Position::new(-1, 1),
            Direction::West => Position::new(-1, 0),
            Direction::Northwest => Position::new(-1, -1),
        }
    }

    /// Converts a position delta to a direction.
    ///
    /// Returns None for `(0, 0)` and for deltas longer than one step.
    pub fn from_delta(delta: Position) -> Option<Direction> {
        Direction::all()
            .into_iter()
            .find(|direction| direction.to_delta() == delta)
    }

    /// Compass abbreviation used in event names (`n`, `ne`, ...).
    pub fn abbreviation(self) -> &'static str {
        match self {
            Direction::North => "n",
            Direction::Northeast => "ne",
            Direction::East => "e",
            Direction::Southeast => "se",
            Direction::South => "s",
            Direction::Southwest => "sw",
            Direction::West => "w",
            Direction::Northwest => "nw",
        }
    }

    /// Parses a compass abbreviation.
    pub fn from_abbreviation(abbreviation: &str) -> Option<Direction> {
        Direction::all()
            .into_iter()
            .find(|direction| direction.abbreviation() == abbreviation)
    }

    /// Returns all 8 directions, clockwise from north.
    pub fn all() -> [Direction; 8] {
        [
            Direction::North,
            Direction::Northeast,
            Direction::East,
            Direction::Southeast,
            Direction::South,
            Direction::Southwest,
            Direction::West,
            Direction::Northwest,
        ]
    }
}

/// Unique identifier for game entities.
pub type EntityId = Uuid;

/// Creates a new unique entity ID.
pub fn new_entity_id() -> EntityId {
    Uuid::new_v4()
}
