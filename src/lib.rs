//! # Rockslike
//!
//! A turn-based roguelike played on a character grid.
//!
//! ## Architecture Overview
//!
//! The crate is split around the map and world model:
//!
//! - **Game**: tiles, terrain features, entities, the event bus and the [`World`]
//!   aggregate that owns every level and advances one player action at a time
//! - **Generation**: binary space partition dungeons assembled from map components
//! - **Map files**: ASCII art plus a JSON metadata block, parsed into terrain and
//!   deferred entity specifications
//! - **Input / Rendering**: thin macroquad collaborators that translate keys into
//!   bus events and draw [`World::get_view`]
//!
//! Components talk to each other through the [`EventBus`] rather than holding
//! references to one another. Entities publish events such as
//! [`GameEvent::EntityDeath`]; the world reacts to them once the publishing call
//! has returned.

pub mod game;
pub mod generation;
pub mod input;
pub mod mapfile;
pub mod rendering;

pub use game::*;
pub use generation::*;
pub use input::*;
pub use mapfile::*;
pub use rendering::*;

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Core error type for the Rockslike engine.
#[derive(thiserror::Error, Debug)]
pub enum RockslikeError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings file could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// A map file could not be turned into a level
    #[error("Malformed map{}: {reason}", line_suffix(.line))]
    MalformedMap {
        /// 1-based line in the map file, when known
        line: Option<usize>,
        /// Human readable description of the problem
        reason: String,
    },

    /// World state is invalid
    #[error("Invalid world state: {0}")]
    InvalidState(String),

    /// Action cannot be performed
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    /// Generation failed
    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    /// An event name did not match any known event
    #[error("Unknown event: {0}")]
    UnknownEvent(String),
}

fn line_suffix(line: &Option<usize>) -> String {
    line.map(|l| format!(" (line {})", l)).unwrap_or_default()
}

impl RockslikeError {
    /// Shorthand for a [`RockslikeError::MalformedMap`] without line information.
    pub fn malformed(reason: impl Into<String>) -> Self {
        RockslikeError::MalformedMap {
            line: None,
            reason: reason.into(),
        }
    }
}

/// Result type used throughout the Rockslike codebase.
pub type RockslikeResult<T> = Result<T, RockslikeError>;

/// Version information for the game.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Game configuration constants.
pub mod config {
    /// Default width of a generated level in tiles
    pub const DEFAULT_LEVEL_WIDTH: u32 = 75;

    /// Default height of a generated level in tiles
    pub const DEFAULT_LEVEL_HEIGHT: u32 = 50;

    /// Recursion depth at which BSP partitioning always stops
    pub const DEFAULT_BSP_MAX_DEPTH: u32 = 10;

    /// Smallest room edge, walls included
    pub const DEFAULT_MIN_ROOM_DIMENSION: u32 = 4;

    /// Default viewport size in cells
    pub const DEFAULT_VIEW_WIDTH: u32 = 60;
    pub const DEFAULT_VIEW_HEIGHT: u32 = 30;

    /// Size of the box used when no map file is given
    pub const EMPTY_BOX_WIDTH: u32 = 40;
    pub const EMPTY_BOX_HEIGHT: u32 = 20;
}

/// Everything that can be tuned from a settings file.
///
/// # Examples
///
/// ```
/// use rockslike::GameSettings;
///
/// let settings: GameSettings = serde_json::from_str("{}").unwrap();
/// assert_eq!(settings.generation.min_room_dimension, 4);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    /// World behaviour switches
    pub world: WorldConfig,
    /// Dungeon generator tunables
    pub generation: GenerationConfig,
}

impl GameSettings {
    /// Reads settings from a JSON file.
    pub fn load_from_path(path: impl AsRef<Path>) -> RockslikeResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Serializes the settings as pretty JSON.
    pub fn to_json(&self) -> RockslikeResult<String> {
        serde_json::to_string_pretty(self).map_err(RockslikeError::from)
    }
}
