//! # Levels
//!
//! A [`GameMap`] is one full terrain grid plus its entity roster and spawn
//! point. Entities are not stored in the grid; the contents of a cell are
//! derived at query time from the entities whose position matches.

use crate::{
    ConcreteEntity, Entity, EntityId, Grid, Player, Position, RockslikeError, RockslikeResult,
    TerrainFeature,
};

/// Terrain storage of a level.
pub type TerrainGrid = Grid<TerrainFeature>;

/// Read access to cells, shared by levels and the world.
///
/// Both lookups are total: positions outside the map yield the void sentinel
/// and `false` respectively.
pub trait CellQuery {
    fn terrain_at(&self, position: Position) -> &TerrainFeature;
    fn contains(&self, position: Position) -> bool;
}

/// Everything located at one cell.
#[derive(Debug, Clone, PartialEq)]
pub struct CellContents<'a> {
    pub terrain: TerrainFeature,
    pub entities: Vec<&'a ConcreteEntity>,
}

impl CellContents<'_> {
    /// Whether the terrain alone lets a player in.
    pub fn is_passable(&self) -> bool {
        self.terrain.is_passable()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameMap {
    /// Index of this level in the world's stack
    pub depth: usize,
    pub name: Option<String>,
    terrain: TerrainGrid,
    pub entities: Vec<ConcreteEntity>,
    pub player_spawn: Position,
}

impl GameMap {
    pub fn new(terrain: TerrainGrid) -> Self {
        Self {
            depth: 0,
            name: None,
            terrain,
            entities: Vec::new(),
            player_spawn: Position::origin(),
        }
    }

    pub fn with_spawn(mut self, spawn: Position) -> Self {
        self.player_spawn = spawn;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn width(&self) -> usize {
        self.terrain.width()
    }

    pub fn height(&self) -> usize {
        self.terrain.height()
    }

    pub fn terrain(&self) -> &TerrainGrid {
        &self.terrain
    }

    /// Stores a new feature at `position`, replacing the previous one.
    pub fn set_terrain(&mut self, position: Position, feature: TerrainFeature) -> RockslikeResult<()> {
        self.terrain.set(position.x, position.y, feature)
    }

    /// Entities standing on `position`, in list order.
    pub fn entities_at(&self, position: Position) -> impl Iterator<Item = &ConcreteEntity> {
        self.entities
            .iter()
            .filter(move |entity| entity.position() == position)
    }

    /// Indices into [`GameMap::entities`] of everything at `position`.
    pub fn entity_indices_at(&self, position: Position) -> Vec<usize> {
        self.entities
            .iter()
            .enumerate()
            .filter(|(_, entity)| entity.position() == position)
            .map(|(index, _)| index)
            .collect()
    }

    pub fn entity(&self, id: EntityId) -> Option<&ConcreteEntity> {
        self.entities.iter().find(|entity| entity.id() == id)
    }

    pub fn player_index(&self) -> Option<usize> {
        self.entities
            .iter()
            .position(|entity| entity.as_player().is_some())
    }

    pub fn player(&self) -> Option<&Player> {
        self.entities.iter().find_map(ConcreteEntity::as_player)
    }

    pub fn player_mut(&mut self) -> Option<&mut Player> {
        self.entities.iter_mut().find_map(ConcreteEntity::as_player_mut)
    }

    /// Removes the player from the roster, if present.
    pub fn take_player(&mut self) -> Option<Player> {
        let index = self.player_index()?;
        match self.entities.remove(index) {
            ConcreteEntity::Player(player) => Some(player),
            _ => None,
        }
    }

    /// Removes the entity with `id`, returning it.
    pub fn remove_entity(&mut self, id: EntityId) -> Option<ConcreteEntity> {
        let index = self.entities.iter().position(|entity| entity.id() == id)?;
        Some(self.entities.remove(index))
    }

    /// All cells a player could stand on.
    pub fn passable_positions(&self) -> Vec<Position> {
        self.terrain
            .iter_positions()
            .filter(|(_, feature)| feature.is_passable())
            .map(|(position, _)| position)
            .collect()
    }

    /// Fails unless `position` is inside the map.
    pub fn check_bounds(&self, position: Position, what: &str) -> RockslikeResult<()> {
        if self.contains(position) {
            Ok(())
        } else {
            Err(RockslikeError::InvalidState(format!(
                "{} ({}) is outside the {}x{} map",
                what,
                position,
                self.width(),
                self.height()
            )))
        }
    }
}

impl CellQuery for GameMap {
    fn terrain_at(&self, position: Position) -> &TerrainFeature {
        self.terrain
            .get(position.x, position.y)
            .unwrap_or(&TerrainFeature::VOID)
    }

    fn contains(&self, position: Position) -> bool {
        self.terrain.contains_position(position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FeatureKind, ItemPickup, Signpost};
    use proptest::prelude::*;

    fn small_map() -> GameMap {
        let mut terrain = TerrainGrid::filled(5, 4, TerrainFeature::floor());
        terrain.set(0, 0, TerrainFeature::wall()).unwrap();
        GameMap::new(terrain).with_spawn(Position::new(1, 1))
    }

    #[test]
    fn test_terrain_lookup() {
        let map = small_map();
        assert_eq!(map.terrain_at(Position::new(0, 0)).kind(), FeatureKind::Wall);
        assert_eq!(map.terrain_at(Position::new(4, 3)).kind(), FeatureKind::Floor);
        assert_eq!(map.terrain_at(Position::new(5, 0)), &TerrainFeature::VOID);
        assert_eq!(map.terrain_at(Position::new(-1, 2)), &TerrainFeature::VOID);
    }

    #[test]
    fn test_entity_queries() {
        let mut map = small_map();
        let here = Position::new(2, 2);
        map.entities.push(ItemPickup::new(here, vec!["torch".into()]).into());
        map.entities.push(Signpost::new(here, "hello", true).into());
        map.entities.push(Player::new(Position::new(1, 1)).into());

        assert_eq!(map.entities_at(here).count(), 2);
        assert_eq!(map.entity_indices_at(here), vec![0, 1]);
        assert_eq!(map.player_index(), Some(2));

        let player = map.take_player().unwrap();
        assert_eq!(player.position(), Position::new(1, 1));
        assert!(map.player().is_none());

        let pickup_id = map.entities[0].id();
        assert!(map.remove_entity(pickup_id).is_some());
        assert!(map.entity(pickup_id).is_none());
        assert_eq!(map.entities.len(), 1);
    }

    #[test]
    fn test_set_terrain_replaces_feature() {
        let mut map = small_map();
        map.set_terrain(Position::new(3, 3), TerrainFeature::stairs_down(None))
            .unwrap();
        assert!(map.terrain_at(Position::new(3, 3)).stair_direction().is_some());
        assert!(map
            .set_terrain(Position::new(9, 9), TerrainFeature::wall())
            .is_err());
    }

    #[test]
    fn test_passable_positions() {
        let map = small_map();
        assert_eq!(map.passable_positions().len(), 5 * 4 - 1);
    }

    proptest! {
        #[test]
        fn prop_terrain_lookup_is_total(x in any::<i32>(), y in any::<i32>()) {
            let map = small_map();
            let feature = map.terrain_at(Position::new(x, y));
            if !map.contains(Position::new(x, y)) {
                prop_assert_eq!(feature, &TerrainFeature::VOID);
            }
        }
    }
}
