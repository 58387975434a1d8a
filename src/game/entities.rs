//! # Entities
//!
//! Mobile and reactive game objects: the player, item pickups and signposts.
//!
//! Entities never touch the world's containers. They react to collisions by
//! changing themselves or the colliding player and by publishing events; the
//! world applies removals after the collision has been resolved.

use crate::{
    new_entity_id, CellQuery, Color, EntityId, EventBus, GameEvent, PlayerCollision, Position,
    RockslikeError, RockslikeResult, Tile,
};
use serde::{Deserialize, Serialize};

/// Common behaviour of every entity.
pub trait Entity {
    fn id(&self) -> EntityId;
    fn position(&self) -> Position;
    fn set_position(&mut self, position: Position);
    fn tile(&self) -> Tile;
}

/// How the verdicts of several occupants are folded into one move decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CollisionPolicy {
    /// The move proceeds only if every occupant allows it
    #[default]
    AllMustAllow,
    /// Each verdict overwrites the previous one; the last occupant decides
    LastWriterWins,
}

impl CollisionPolicy {
    pub fn combine(self, current: bool, verdict: bool) -> bool {
        match self {
            CollisionPolicy::AllMustAllow => current && verdict,
            CollisionPolicy::LastWriterWins => verdict,
        }
    }
}

/// The player character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    id: EntityId,
    tile: Tile,
    position: Position,
    /// Item identifiers, in pickup order
    pub inventory: Vec<String>,
    /// Whether the move being resolved may still go ahead
    should_move: bool,
}

impl Player {
    pub const DEFAULT_TILE: Tile = Tile::new('@', Color::White, Color::Cyan);

    /// Creates a new player at `position`.
    ///
    /// # Examples
    ///
    /// ```
    /// use rockslike::{Entity, Player, Position};
    ///
    /// let player = Player::new(Position::new(2, 3));
    /// assert_eq!(player.position(), Position::new(2, 3));
    /// assert!(player.inventory.is_empty());
    /// ```
    pub fn new(position: Position) -> Self {
        Self::with_tile(position, Self::DEFAULT_TILE)
    }

    pub fn with_tile(position: Position, tile: Tile) -> Self {
        Self {
            id: new_entity_id(),
            tile,
            position,
            inventory: Vec::new(),
            should_move: true,
        }
    }

    pub fn should_move(&self) -> bool {
        self.should_move
    }

    /// Starts resolving a move: nothing has objected yet.
    pub fn begin_move(&mut self) {
        self.should_move = true;
    }

    /// Folds one occupant's verdict into the pending move.
    pub fn record_verdict(&mut self, policy: CollisionPolicy, verdict: bool) {
        self.should_move = policy.combine(self.should_move, verdict);
    }

    /// Stops the move in progress (reaction to `player_should_stop`).
    pub fn cancel_move(&mut self) {
        self.should_move = false;
    }

    /// Moves to `target` if the pending move is still sanctioned.
    ///
    /// Returns whether the position changed.
    pub fn finish_move(&mut self, target: Position) -> bool {
        if self.should_move {
            self.position = target;
        }
        self.should_move
    }

    /// Human readable inventory summary.
    pub fn describe_inventory(&self) -> String {
        if self.inventory.is_empty() {
            "You are carrying nothing.".to_string()
        } else {
            format!("You are carrying: {}.", self.inventory.join(", "))
        }
    }
}

impl Entity for Player {
    fn id(&self) -> EntityId {
        self.id
    }

    fn position(&self) -> Position {
        self.position
    }

    fn set_position(&mut self, position: Position) {
        self.position = position;
    }

    fn tile(&self) -> Tile {
        self.tile
    }
}

/// Items lying on the floor, picked up by walking over them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemPickup {
    id: EntityId,
    tile: Tile,
    position: Position,
    items: Vec<String>,
}

impl ItemPickup {
    pub const DEFAULT_TILE: Tile = Tile::new('*', Color::Yellow, Color::Black);

    pub fn new(position: Position, items: Vec<String>) -> Self {
        Self::with_tile(position, items, Self::DEFAULT_TILE)
    }

    pub fn with_tile(position: Position, items: Vec<String>, tile: Tile) -> Self {
        Self {
            id: new_entity_id(),
            tile,
            position,
            items,
        }
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    /// Asks the world to remove this pickup.
    pub fn die(&self, bus: &EventBus) {
        bus.publish(GameEvent::EntityDeath { entity: self.id });
    }
}

impl Entity for ItemPickup {
    fn id(&self) -> EntityId {
        self.id
    }

    fn position(&self) -> Position {
        self.position
    }

    fn set_position(&mut self, position: Position) {
        self.position = position;
    }

    fn tile(&self) -> Tile {
        self.tile
    }
}

impl PlayerCollision for ItemPickup {
    fn player_collision(&mut self, player: &mut Player, bus: &EventBus) -> bool {
        if !self.items.is_empty() {
            bus.publish(GameEvent::message(format!(
                "You pick up: {}.",
                self.items.join(", ")
            )));
            player.inventory.append(&mut self.items);
        }
        self.die(bus);
        true
    }
}

/// A sign with a message, shown when the player bumps into it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signpost {
    id: EntityId,
    tile: Tile,
    position: Position,
    message: String,
    let_player_pass: bool,
}

impl Signpost {
    pub const DEFAULT_TILE: Tile = Tile::new('?', Color::White, Color::Black);

    pub fn new(position: Position, message: impl Into<String>, let_player_pass: bool) -> Self {
        Self::with_tile(position, message, let_player_pass, Self::DEFAULT_TILE)
    }

    pub fn with_tile(
        position: Position,
        message: impl Into<String>,
        let_player_pass: bool,
        tile: Tile,
    ) -> Self {
        Self {
            id: new_entity_id(),
            tile,
            position,
            message: message.into(),
            let_player_pass,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn lets_player_pass(&self) -> bool {
        self.let_player_pass
    }
}

impl Entity for Signpost {
    fn id(&self) -> EntityId {
        self.id
    }

    fn position(&self) -> Position {
        self.position
    }

    fn set_position(&mut self, position: Position) {
        self.position = position;
    }

    fn tile(&self) -> Tile {
        self.tile
    }
}

impl PlayerCollision for Signpost {
    fn player_collision(&mut self, _player: &mut Player, bus: &EventBus) -> bool {
        bus.publish(GameEvent::message(self.message.clone()));
        self.let_player_pass
    }
}

/// Concrete entity type stored in a level's entity list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConcreteEntity {
    Player(Player),
    ItemPickup(ItemPickup),
    Signpost(Signpost),
}

impl ConcreteEntity {
    pub fn class_name(&self) -> &'static str {
        match self {
            ConcreteEntity::Player(_) => "Player",
            ConcreteEntity::ItemPickup(_) => "ItemPickup",
            ConcreteEntity::Signpost(_) => "Signpost",
        }
    }

    pub fn as_player(&self) -> Option<&Player> {
        match self {
            ConcreteEntity::Player(player) => Some(player),
            _ => None,
        }
    }

    pub fn as_player_mut(&mut self) -> Option<&mut Player> {
        match self {
            ConcreteEntity::Player(player) => Some(player),
            _ => None,
        }
    }

    fn inner(&self) -> &dyn Entity {
        match self {
            ConcreteEntity::Player(player) => player,
            ConcreteEntity::ItemPickup(pickup) => pickup,
            ConcreteEntity::Signpost(signpost) => signpost,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Entity {
        match self {
            ConcreteEntity::Player(player) => player,
            ConcreteEntity::ItemPickup(pickup) => pickup,
            ConcreteEntity::Signpost(signpost) => signpost,
        }
    }
}

impl Entity for ConcreteEntity {
    fn id(&self) -> EntityId {
        self.inner().id()
    }

    fn position(&self) -> Position {
        self.inner().position()
    }

    fn set_position(&mut self, position: Position) {
        self.inner_mut().set_position(position)
    }

    fn tile(&self) -> Tile {
        self.inner().tile()
    }
}

impl PlayerCollision for ConcreteEntity {
    fn player_collision(&mut self, player: &mut Player, bus: &EventBus) -> bool {
        match self {
            ConcreteEntity::Player(_) => true,
            ConcreteEntity::ItemPickup(pickup) => pickup.player_collision(player, bus),
            ConcreteEntity::Signpost(signpost) => signpost.player_collision(player, bus),
        }
    }
}

impl From<Player> for ConcreteEntity {
    fn from(player: Player) -> Self {
        ConcreteEntity::Player(player)
    }
}

impl From<ItemPickup> for ConcreteEntity {
    fn from(pickup: ItemPickup) -> Self {
        ConcreteEntity::ItemPickup(pickup)
    }
}

impl From<Signpost> for ConcreteEntity {
    fn from(signpost: Signpost) -> Self {
        ConcreteEntity::Signpost(signpost)
    }
}

/// Variant-specific construction parameters of an [`EntitySpec`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityKindSpec {
    Player,
    ItemPickup { items: Vec<String> },
    Signpost { message: String, let_player_pass: bool },
}

/// A deferred entity: everything needed to build it once a world exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySpec {
    pub kind: EntityKindSpec,
    pub position: Position,
    /// Overrides the variant's default appearance
    pub tile: Option<Tile>,
}

impl EntitySpec {
    pub fn new(kind: EntityKindSpec, position: Position) -> Self {
        Self {
            kind,
            position,
            tile: None,
        }
    }

    pub fn class_name(&self) -> &'static str {
        match self.kind {
            EntityKindSpec::Player => "Player",
            EntityKindSpec::ItemPickup { .. } => "ItemPickup",
            EntityKindSpec::Signpost { .. } => "Signpost",
        }
    }
}

/// Builds the concrete entity described by `spec` inside `world`.
///
/// Fails if the spec's position is outside the world's current map.
pub fn materialize(spec: &EntitySpec, world: &dyn CellQuery) -> RockslikeResult<ConcreteEntity> {
    if !world.contains(spec.position) {
        return Err(RockslikeError::malformed(format!(
            "{} at ({}) lies outside the map",
            spec.class_name(),
            spec.position
        )));
    }

    let position = spec.position;
    let entity = match &spec.kind {
        EntityKindSpec::Player => {
            Player::with_tile(position, spec.tile.unwrap_or(Player::DEFAULT_TILE)).into()
        }
        EntityKindSpec::ItemPickup { items } => ItemPickup::with_tile(
            position,
            items.clone(),
            spec.tile.unwrap_or(ItemPickup::DEFAULT_TILE),
        )
        .into(),
        EntityKindSpec::Signpost {
            message,
            let_player_pass,
        } => Signpost::with_tile(
            position,
            message.clone(),
            *let_player_pass,
            spec.tile.unwrap_or(Signpost::DEFAULT_TILE),
        )
        .into(),
    };
    Ok(entity)
}
