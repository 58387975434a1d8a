//! # Generation Module
//!
//! Procedural level generation: binary space partition dungeons built from
//! rooms and corridors, plus the plain walled box used when no map file is
//! given.
//!
//! Generators work on [`MapComponent`]s, partial maps with a world-space
//! origin, and compose them into a complete [`GameMap`] with the terrain grid
//! union ([`crate::Grid::union`]).

pub mod components;
pub mod dungeon;

pub use components::*;
pub use dungeon::*;

use crate::{config, GameMap, RockslikeError, RockslikeResult};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Configuration for procedural generation.
///
/// Every field has a default, so a settings file only needs the values it
/// changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Random seed for reproducible generation
    pub seed: u64,
    /// Width of generated levels
    pub level_width: u32,
    /// Height of generated levels
    pub level_height: u32,
    /// Recursion depth at which partitioning always stops
    pub max_depth: u32,
    /// Smallest room edge, walls included
    pub min_room_dimension: u32,
}

impl GenerationConfig {
    /// Creates a default generation configuration with the given seed.
    ///
    /// # Examples
    ///
    /// ```
    /// use rockslike::GenerationConfig;
    ///
    /// let config = GenerationConfig::new(12345);
    /// assert_eq!(config.seed, 12345);
    /// assert_eq!(config.margin(), config.min_room_dimension + 2);
    /// ```
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            level_width: config::DEFAULT_LEVEL_WIDTH,
            level_height: config::DEFAULT_LEVEL_HEIGHT,
            max_depth: config::DEFAULT_BSP_MAX_DEPTH,
            min_room_dimension: config::DEFAULT_MIN_ROOM_DIMENSION,
        }
    }

    /// Creates a configuration for testing with smaller levels.
    pub fn for_testing(seed: u64) -> Self {
        Self {
            level_width: 40,
            level_height: 30,
            ..Self::new(seed)
        }
    }

    /// Smallest partition edge that still leaves room for a room plus slack.
    pub fn margin(&self) -> u32 {
        self.min_room_dimension + 2
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::new(42)
    }
}

/// Trait for procedural generators.
///
/// The world keeps one boxed generator and calls it whenever the player
/// descends past the deepest level generated so far.
pub trait Generator<T> {
    /// Generates content using the provided configuration and random number generator.
    fn generate(&self, config: &GenerationConfig, rng: &mut StdRng) -> RockslikeResult<T>;

    /// Validates that the generated content meets requirements.
    fn validate(&self, content: &T, config: &GenerationConfig) -> RockslikeResult<()>;

    /// Gets the generator type name for logging and debugging.
    fn generator_type(&self) -> &'static str;
}

/// Utility functions for generation algorithms.
pub mod utils {
    use super::*;
    use crate::{CellQuery, Position};
    use pathfinding::prelude::bfs_reach;
    use std::collections::HashSet;

    /// Creates a seeded random number generator from the config.
    pub fn create_rng(config: &GenerationConfig) -> StdRng {
        StdRng::seed_from_u64(config.seed)
    }

    /// Validates that a level meets basic requirements.
    pub fn validate_level(level: &GameMap) -> RockslikeResult<()> {
        if level.passable_positions().is_empty() {
            return Err(RockslikeError::GenerationFailed(
                "Level has no floor tiles".to_string(),
            ));
        }
        if !level.terrain_at(level.player_spawn).is_passable() {
            return Err(RockslikeError::GenerationFailed(format!(
                "Player spawn ({}) is not walkable",
                level.player_spawn
            )));
        }
        Ok(())
    }

    /// Checks that every walkable cell can be reached from the spawn.
    pub fn validate_connectivity(level: &GameMap) -> RockslikeResult<()> {
        let reachable: HashSet<Position> = bfs_reach(level.player_spawn, |pos| {
            pos.cardinal_adjacent_positions()
                .into_iter()
                .filter(|next| level.terrain_at(*next).is_passable())
                .collect::<Vec<_>>()
        })
        .collect();

        let stranded = level
            .passable_positions()
            .into_iter()
            .filter(|pos| !reachable.contains(pos))
            .count();
        if stranded > 0 {
            return Err(RockslikeError::GenerationFailed(format!(
                "{} walkable cells are unreachable from the spawn",
                stranded
            )));
        }
        Ok(())
    }
}
