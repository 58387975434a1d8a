//! # World
//!
//! The aggregate that owns every level, the player and the event bus, and
//! advances the game one player action at a time.
//!
//! The world never hands references to itself out to entities. Instead it
//! subscribes small inbox handlers on the bus; whatever an entity publishes
//! (deaths, stop requests, level changes) is recorded there and applied by the
//! world once the call that triggered it has returned.

use crate::generation::{utils, BspGenerator, GenerationConfig, Generator};
use crate::{
    config, materialize, CellContents, CellQuery, CollisionPolicy, ConcreteEntity, Direction,
    Entity, EntityId, EntityKindSpec, EntitySpec, EventBus, EventKind, GameEvent, GameMap,
    ParsedMap, Player, PlayerCollision, Position, RockslikeError, RockslikeResult,
    StairDirection, SubscriptionId, TerrainFeature, Tile,
};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

/// Which level the up staircase leads to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AscendPolicy {
    /// One level up (`depth - 1`)
    #[default]
    Corrected,
    /// One level down (`depth + 1`), as early builds of the game did
    Legacy,
}

impl AscendPolicy {
    /// Target depth of an ascent from `current`, or None at the top.
    pub fn target(self, current: usize) -> Option<usize> {
        if current == 0 {
            return None;
        }
        match self {
            AscendPolicy::Corrected => Some(current - 1),
            AscendPolicy::Legacy => Some(current + 1),
        }
    }
}

/// Behaviour switches of the world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub collision_policy: CollisionPolicy,
    pub ascend_policy: AscendPolicy,
    /// Viewport size used by the display
    pub view_width: u32,
    pub view_height: u32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            collision_policy: CollisionPolicy::default(),
            ascend_policy: AscendPolicy::default(),
            view_width: config::DEFAULT_VIEW_WIDTH,
            view_height: config::DEFAULT_VIEW_HEIGHT,
        }
    }
}

/// One player action; the unit a turn is made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerAction {
    Move(Direction),
    DisplayInventory,
    UsePortal,
}

impl PlayerAction {
    /// The action requested by an input event, if it is one.
    pub fn from_event(event: &GameEvent) -> Option<PlayerAction> {
        match event {
            GameEvent::PlayerMove(direction) => Some(PlayerAction::Move(*direction)),
            GameEvent::PlayerDisplayInventory => Some(PlayerAction::DisplayInventory),
            GameEvent::PlayerUsePortal => Some(PlayerAction::UsePortal),
            _ => None,
        }
    }
}

/// Effects published on the bus that the world still has to apply.
#[derive(Debug, Default)]
struct WorldInbox {
    pending: VecDeque<PlayerAction>,
    deaths: Vec<EntityId>,
    stop_requested: bool,
    level_change: Option<(StairDirection, Option<Position>)>,
}

/// The game world: a stack of levels, one of which is current.
pub struct World {
    maps: Vec<GameMap>,
    current_depth: usize,
    bus: Rc<EventBus>,
    inbox: Rc<RefCell<WorldInbox>>,
    subscriptions: Vec<SubscriptionId>,
    config: WorldConfig,
    generation: GenerationConfig,
    generator: Box<dyn Generator<GameMap>>,
    rng: StdRng,
    /// Number of player actions resolved so far
    pub turn_number: u64,
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("levels", &self.maps.len())
            .field("current_depth", &self.current_depth)
            .field("config", &self.config)
            .field("generator", &self.generator.generator_type())
            .field("turn_number", &self.turn_number)
            .finish()
    }
}

impl World {
    /// Creates a world whose level 0 is `first_level`, with a private bus.
    ///
    /// A player is created at the level's spawn unless the level's roster
    /// already holds one.
    ///
    /// # Examples
    ///
    /// ```
    /// use rockslike::{GameMap, GameSettings, Position, TerrainFeature, TerrainGrid, World};
    ///
    /// let level = GameMap::new(TerrainGrid::filled(8, 6, TerrainFeature::floor()))
    ///     .with_spawn(Position::new(2, 2));
    /// let world = World::new(level, &GameSettings::default()).unwrap();
    /// assert_eq!(world.current_depth(), 0);
    /// assert_eq!(world.player_position(), Some(Position::new(2, 2)));
    /// ```
    pub fn new(first_level: GameMap, settings: &crate::GameSettings) -> RockslikeResult<Self> {
        Self::with_bus(first_level, settings, Rc::new(EventBus::new()))
    }

    /// Creates a world that publishes on, and listens to, `bus`.
    pub fn with_bus(
        mut first_level: GameMap,
        settings: &crate::GameSettings,
        bus: Rc<EventBus>,
    ) -> RockslikeResult<Self> {
        first_level.check_bounds(first_level.player_spawn, "Player spawn")?;
        let player = match first_level.take_player() {
            Some(player) => player,
            None => Player::new(first_level.player_spawn),
        };
        first_level.depth = 0;

        let inbox = Rc::new(RefCell::new(WorldInbox::default()));
        let subscriptions = Self::subscribe_inbox(&bus, &inbox);
        let mut world = Self {
            maps: vec![first_level],
            current_depth: 0,
            bus,
            inbox,
            subscriptions,
            config: settings.world.clone(),
            generation: settings.generation.clone(),
            generator: Box::new(BspGenerator::new()),
            rng: utils::create_rng(&settings.generation),
            turn_number: 0,
        };
        let spawn = world.maps[0].player_spawn;
        world.load(0, player, Some(spawn));
        Ok(world)
    }

    /// Builds a world from a parsed map file.
    ///
    /// Every entity specification is materialized before the world exists, so
    /// a bad specification leaves nothing half-built.
    pub fn from_parsed(
        parsed: ParsedMap,
        settings: &crate::GameSettings,
        bus: Rc<EventBus>,
    ) -> RockslikeResult<Self> {
        let mut level = GameMap::new(parsed.terrain).with_spawn(parsed.player_spawn);
        level.name = parsed.name;

        let mut entities = Vec::with_capacity(parsed.entities.len());
        for spec in &parsed.entities {
            entities.push(materialize(spec, &level)?);
        }
        level.entities = entities;

        log::info!(
            "Loaded {}x{} map with {} entities",
            level.width(),
            level.height(),
            level.entities.len()
        );
        Self::with_bus(level, settings, bus)
    }

    /// Replaces the generator used for levels below the deepest one.
    pub fn with_generator(mut self, generator: Box<dyn Generator<GameMap>>) -> Self {
        self.generator = generator;
        self
    }

    fn subscribe_inbox(bus: &EventBus, inbox: &Rc<RefCell<WorldInbox>>) -> Vec<SubscriptionId> {
        let mut ids = Vec::new();

        let input_kinds = Direction::all()
            .into_iter()
            .map(EventKind::PlayerMove)
            .chain([EventKind::PlayerDisplayInventory, EventKind::PlayerUsePortal]);
        for kind in input_kinds {
            let inbox = Rc::clone(inbox);
            ids.push(bus.subscribe(kind, move |event, _| {
                if let Some(action) = PlayerAction::from_event(event) {
                    inbox.borrow_mut().pending.push_back(action);
                }
            }));
        }

        let sink = Rc::clone(inbox);
        ids.push(bus.subscribe(EventKind::EntityDeath, move |event, _| {
            if let GameEvent::EntityDeath { entity } = event {
                sink.borrow_mut().deaths.push(*entity);
            }
        }));

        let sink = Rc::clone(inbox);
        ids.push(bus.subscribe(EventKind::PlayerShouldStop, move |_, _| {
            sink.borrow_mut().stop_requested = true;
        }));

        let sink = Rc::clone(inbox);
        ids.push(bus.subscribe(EventKind::LevelChange, move |event, _| {
            if let GameEvent::LevelChange {
                direction,
                destination,
            } = event
            {
                sink.borrow_mut().level_change = Some((*direction, *destination));
            }
        }));

        ids
    }

    pub fn bus(&self) -> &Rc<EventBus> {
        &self.bus
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut WorldConfig {
        &mut self.config
    }

    pub fn current_depth(&self) -> usize {
        self.current_depth
    }

    /// Number of levels generated or loaded so far.
    pub fn level_count(&self) -> usize {
        self.maps.len()
    }

    pub fn level(&self, depth: usize) -> Option<&GameMap> {
        self.maps.get(depth)
    }

    pub fn current_map(&self) -> &GameMap {
        &self.maps[self.current_depth]
    }

    fn current_map_mut(&mut self) -> &mut GameMap {
        &mut self.maps[self.current_depth]
    }

    pub fn player(&self) -> Option<&Player> {
        self.current_map().player()
    }

    pub fn player_position(&self) -> Option<Position> {
        self.player().map(Player::position)
    }

    /// Everything at `(x, y)` on the current level.
    ///
    /// Never fails: outside the map the terrain is the void sentinel and there
    /// are no entities.
    pub fn get(&self, x: i32, y: i32) -> CellContents<'_> {
        let position = Position::new(x, y);
        let map = self.current_map();
        CellContents {
            terrain: *map.terrain_at(position),
            entities: map.entities_at(position).collect(),
        }
    }

    /// Resolves `action` immediately as one turn.
    pub fn take_turn(&mut self, action: PlayerAction) -> RockslikeResult<()> {
        match action {
            PlayerAction::Move(direction) => {
                self.move_player(direction)?;
            }
            PlayerAction::DisplayInventory => self.display_inventory()?,
            PlayerAction::UsePortal => {
                self.use_portal()?;
            }
        }
        self.turn_number += 1;
        Ok(())
    }

    /// Resolves every action requested on the bus since the last update.
    ///
    /// Returns how many actions were resolved.
    pub fn update(&mut self) -> RockslikeResult<usize> {
        let mut resolved = 0;
        loop {
            let next = self.inbox.borrow_mut().pending.pop_front();
            match next {
                Some(action) => {
                    self.take_turn(action)?;
                    resolved += 1;
                }
                None => return Ok(resolved),
            }
        }
    }

    /// Attempts to step the player one cell in `direction`.
    ///
    /// Every occupant of the target cell is asked through
    /// [`PlayerCollision::player_collision`], terrain first, and the verdicts
    /// are folded according to the configured [`CollisionPolicy`]. Afterwards
    /// `player_enter_space` is published; a `player_should_stop` raised while
    /// it is dispatched vetoes the move. Returns whether the player moved.
    pub fn move_player(&mut self, direction: Direction) -> RockslikeResult<bool> {
        let bus = Rc::clone(&self.bus);
        let inbox = Rc::clone(&self.inbox);
        let policy = self.config.collision_policy;
        inbox.borrow_mut().stop_requested = false;

        let map = self.current_map_mut();
        let player_index = map.player_index().ok_or_else(missing_player)?;
        let target = map.entities[player_index].position() + direction.to_delta();
        let mut terrain = *map.terrain_at(target);
        let occupants: Vec<usize> = map
            .entity_indices_at(target)
            .into_iter()
            .filter(|&index| index != player_index)
            .collect();

        {
            let player = player_in(&mut map.entities, player_index)?;
            player.begin_move();
            let verdict = terrain.player_collision(player, &bus);
            player.record_verdict(policy, verdict);
        }
        for index in occupants {
            let (slot, occupant) = pair_mut(&mut map.entities, player_index, index);
            let ConcreteEntity::Player(player) = slot else {
                return Err(missing_player());
            };
            let verdict = occupant.player_collision(player, &bus);
            player.record_verdict(policy, verdict);
        }

        let actor = map.entities[player_index].id();
        bus.publish(GameEvent::PlayerEnterSpace { actor, target });

        let player = player_in(&mut map.entities, player_index)?;
        if inbox.borrow_mut().stop_requested {
            player.cancel_move();
        }
        let moved = player.finish_move(target);
        if !moved {
            log::debug!("Move {:?} onto ({}) was refused", direction, target);
        }

        self.settle()?;
        Ok(moved)
    }

    /// Uses the feature under the player as a portal.
    ///
    /// Returns whether the current level changed.
    pub fn use_portal(&mut self) -> RockslikeResult<bool> {
        let bus = Rc::clone(&self.bus);
        let map = self.current_map_mut();
        let player = map.player_mut().ok_or_else(missing_player)?;
        let origin = player.position();
        let feature = *map.terrain_at(origin);

        let player = map.player_mut().ok_or_else(missing_player)?;
        if !feature.activate_portal(player, &bus) {
            bus.publish(GameEvent::message("There are no stairs here."));
            return Ok(false);
        }

        let result = self.settle();
        if !matches!(result, Ok(true)) {
            // No level change happened; undo the relocation.
            if let Some(player) = self.current_map_mut().player_mut() {
                player.set_position(origin);
            }
        }
        result
    }

    /// Publishes the player's inventory as a message.
    pub fn display_inventory(&mut self) -> RockslikeResult<()> {
        let text = self
            .player()
            .ok_or_else(missing_player)?
            .describe_inventory();
        self.bus.publish(GameEvent::message(text));
        Ok(())
    }

    /// Applies what entities requested during the last action.
    ///
    /// Returns whether a level change took place.
    fn settle(&mut self) -> RockslikeResult<bool> {
        let (deaths, level_change) = {
            let mut inbox = self.inbox.borrow_mut();
            (std::mem::take(&mut inbox.deaths), inbox.level_change.take())
        };

        let map = self.current_map_mut();
        for id in deaths {
            let is_player = map.entity(id).and_then(ConcreteEntity::as_player).is_some();
            if is_player {
                log::warn!("Ignoring death request for the player");
                continue;
            }
            if map.remove_entity(id).is_some() {
                log::debug!("Removed entity {}", id);
            }
        }

        match level_change {
            Some((StairDirection::Down, destination)) => {
                self.change_map(self.current_depth + 1, destination)?;
                Ok(true)
            }
            Some((StairDirection::Up, destination)) => self.ascend(destination),
            None => Ok(false),
        }
    }

    /// Moves the player one level deeper, generating it if needed.
    pub fn change_map_down(&mut self) -> RockslikeResult<()> {
        self.change_map(self.current_depth + 1, None)
    }

    /// Moves the player up, as the configured [`AscendPolicy`] dictates.
    ///
    /// Returns false, changing nothing, on the top level.
    pub fn change_map_up(&mut self) -> RockslikeResult<bool> {
        self.ascend(None)
    }

    fn ascend(&mut self, destination: Option<Position>) -> RockslikeResult<bool> {
        match self.config.ascend_policy.target(self.current_depth) {
            Some(target) => {
                self.change_map(target, destination)?;
                Ok(true)
            }
            None => {
                log::debug!("Already on the top level");
                Ok(false)
            }
        }
    }

    /// Makes `target_depth` the current level.
    ///
    /// Missing levels down to `target_depth` are generated first, so a
    /// generation failure leaves the world untouched. The player is placed at
    /// `destination` when it lies inside the target level, else at its spawn.
    pub fn change_map(
        &mut self,
        target_depth: usize,
        destination: Option<Position>,
    ) -> RockslikeResult<()> {
        let mut generated = Vec::new();
        for depth in self.maps.len()..=target_depth {
            let mut level = self.generator.generate(&self.generation, &mut self.rng)?;
            self.generator.validate(&level, &self.generation)?;
            level.depth = depth;
            log::debug!(
                "Generated level {} ({}x{}) with {}",
                depth,
                level.width(),
                level.height(),
                self.generator.generator_type()
            );
            generated.push(level);
        }
        self.maps.extend(generated);

        let outgoing = self.current_depth;
        let player = self
            .current_map_mut()
            .take_player()
            .ok_or_else(missing_player)?;
        self.bus.publish(GameEvent::MapUnloaded { depth: outgoing });

        log::info!("Changing level {} -> {}", outgoing, target_depth);
        self.load(target_depth, player, destination);
        Ok(())
    }

    /// Binds level `depth` as the current one and places `player` on it.
    fn load(&mut self, depth: usize, mut player: Player, destination: Option<Position>) {
        self.current_depth = depth;
        let map = self.current_map_mut();
        let position = match destination {
            Some(destination) if map.contains(destination) => destination,
            Some(destination) => {
                log::warn!("Destination ({}) is off the map; using spawn", destination);
                map.player_spawn
            }
            None => map.player_spawn,
        };
        player.set_position(position);
        map.entities.push(player.into());
        self.bus.publish(GameEvent::MapLoaded { depth });
    }

    /// Adds `entity` to the current level.
    pub fn spawn(&mut self, entity: ConcreteEntity) -> RockslikeResult<EntityId> {
        if entity.as_player().is_some() {
            return Err(RockslikeError::InvalidAction(
                "the world already has a player".to_string(),
            ));
        }
        let map = self.current_map_mut();
        map.check_bounds(entity.position(), entity.class_name())?;
        let id = entity.id();
        map.entities.push(entity);
        Ok(id)
    }

    /// Materializes `spec` against this world and spawns the result.
    pub fn spawn_spec(&mut self, spec: &EntitySpec) -> RockslikeResult<EntityId> {
        if spec.kind == EntityKindSpec::Player {
            return Err(RockslikeError::InvalidAction(
                "the world already has a player".to_string(),
            ));
        }
        let entity = materialize(spec, self)?;
        self.spawn(entity)
    }

    /// A `width` x `height` window of top-most tiles.
    ///
    /// The window shrinks to the map when the map is smaller, is shifted so it
    /// never leaves the map, and when `center_on_player` is set is centred on
    /// the player as closely as the bounds allow. The player is drawn above
    /// other entities, which are drawn above terrain; among entities the last
    /// one in the roster wins.
    pub fn get_view(
        &self,
        width: usize,
        height: usize,
        origin: Position,
        center_on_player: bool,
    ) -> Vec<Vec<Tile>> {
        let map = self.current_map();
        let width = width.min(map.width());
        let height = height.min(map.height());

        let mut left = origin.x;
        let mut top = origin.y;
        if center_on_player {
            if let Some(player) = self.player_position() {
                left = player.x - width as i32 / 2;
                top = player.y - height as i32 / 2;
            }
        }
        let left = left.clamp(0, (map.width() - width) as i32);
        let top = top.clamp(0, (map.height() - height) as i32);

        let mut overlay: HashMap<Position, Tile> = HashMap::new();
        for entity in &map.entities {
            if entity.as_player().is_none() {
                overlay.insert(entity.position(), entity.tile());
            }
        }
        if let Some(player) = map.player() {
            overlay.insert(player.position(), player.tile());
        }

        (top..top + height as i32)
            .map(|y| {
                (left..left + width as i32)
                    .map(|x| {
                        let position = Position::new(x, y);
                        overlay
                            .get(&position)
                            .copied()
                            .unwrap_or_else(|| map.terrain_at(position).tile())
                    })
                    .collect()
            })
            .collect()
    }
}

impl CellQuery for World {
    fn terrain_at(&self, position: Position) -> &TerrainFeature {
        self.current_map().terrain_at(position)
    }

    fn contains(&self, position: Position) -> bool {
        self.current_map().contains(position)
    }
}

impl Drop for World {
    fn drop(&mut self) {
        for id in self.subscriptions.drain(..) {
            self.bus.unsubscribe(id);
        }
    }
}

fn missing_player() -> RockslikeError {
    RockslikeError::InvalidState("no player on the current level".to_string())
}

fn player_in(entities: &mut [ConcreteEntity], index: usize) -> RockslikeResult<&mut Player> {
    entities
        .get_mut(index)
        .and_then(ConcreteEntity::as_player_mut)
        .ok_or_else(missing_player)
}

/// Mutable access to two distinct slots at once.
fn pair_mut<T>(items: &mut [T], a: usize, b: usize) -> (&mut T, &mut T) {
    debug_assert_ne!(a, b);
    if a < b {
        let (left, right) = items.split_at_mut(b);
        (&mut left[a], &mut right[0])
    } else {
        let (left, right) = items.split_at_mut(a);
        (&mut right[0], &mut left[b])
    }
}
