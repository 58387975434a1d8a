//! # Event Bus
//!
//! Synchronous publish/subscribe between entities, terrain, the world and UI
//! collaborators.
//!
//! Handlers run to completion, in subscription order, before
//! [`EventBus::publish`] returns. A handler may publish further events; those
//! are dispatched immediately (depth-first) on the same call stack.

use crate::{Direction, EntityId, Position, RockslikeError, RockslikeResult};
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

/// Direction of a level transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StairDirection {
    Up,
    Down,
}

/// Events carried by the bus, each with a typed payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// Input: step the player one cell
    PlayerMove(Direction),
    /// Input: show what the player carries
    PlayerDisplayInventory,
    /// Input: use the stairs under the player
    PlayerUsePortal,
    /// The player is about to enter `target`
    PlayerEnterSpace { actor: EntityId, target: Position },
    /// Veto the move currently being resolved
    PlayerShouldStop,
    /// An entity asks to be removed from the world
    EntityDeath { entity: EntityId },
    /// Text for the message window
    DisplayMessage { text: String },
    /// A portal asks the world to change level
    LevelChange {
        direction: StairDirection,
        destination: Option<Position>,
    },
    /// A level became the active one
    MapLoaded { depth: usize },
    /// A level stopped being the active one
    MapUnloaded { depth: usize },
}

impl GameEvent {
    /// The key handlers subscribe under.
    pub fn kind(&self) -> EventKind {
        match self {
            GameEvent::PlayerMove(direction) => EventKind::PlayerMove(*direction),
            GameEvent::PlayerDisplayInventory => EventKind::PlayerDisplayInventory,
            GameEvent::PlayerUsePortal => EventKind::PlayerUsePortal,
            GameEvent::PlayerEnterSpace { .. } => EventKind::PlayerEnterSpace,
            GameEvent::PlayerShouldStop => EventKind::PlayerShouldStop,
            GameEvent::EntityDeath { .. } => EventKind::EntityDeath,
            GameEvent::DisplayMessage { .. } => EventKind::DisplayMessage,
            GameEvent::LevelChange { .. } => EventKind::LevelChange,
            GameEvent::MapLoaded { .. } => EventKind::MapLoaded,
            GameEvent::MapUnloaded { .. } => EventKind::MapUnloaded,
        }
    }

    /// Shorthand for a [`GameEvent::DisplayMessage`].
    pub fn message(text: impl Into<String>) -> Self {
        GameEvent::DisplayMessage { text: text.into() }
    }
}

/// Tag identifying a family of events; every kind has a stable name.
///
/// # Examples
///
/// ```
/// use rockslike::{Direction, EventKind};
///
/// assert_eq!(EventKind::PlayerMove(Direction::Northeast).name(), "player_move_ne");
/// assert_eq!("on_entity_death".parse::<EventKind>().unwrap(), EventKind::EntityDeath);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    PlayerMove(Direction),
    PlayerDisplayInventory,
    PlayerUsePortal,
    PlayerEnterSpace,
    PlayerShouldStop,
    EntityDeath,
    DisplayMessage,
    LevelChange,
    MapLoaded,
    MapUnloaded,
}

impl EventKind {
    pub fn name(&self) -> String {
        match self {
            EventKind::PlayerMove(direction) => format!("player_move_{}", direction.abbreviation()),
            EventKind::PlayerDisplayInventory => "player_display_inventory".to_string(),
            EventKind::PlayerUsePortal => "player_use_portal".to_string(),
            EventKind::PlayerEnterSpace => "player_enter_space".to_string(),
            EventKind::PlayerShouldStop => "player_should_stop".to_string(),
            EventKind::EntityDeath => "on_entity_death".to_string(),
            EventKind::DisplayMessage => "print_message".to_string(),
            EventKind::LevelChange => "change_map".to_string(),
            EventKind::MapLoaded => "on_map_load".to_string(),
            EventKind::MapUnloaded => "on_map_unload".to_string(),
        }
    }

    /// Every kind, movement kinds included.
    pub fn all() -> Vec<EventKind> {
        let mut kinds: Vec<EventKind> = Direction::all()
            .into_iter()
            .map(EventKind::PlayerMove)
            .collect();
        kinds.extend([
            EventKind::PlayerDisplayInventory,
            EventKind::PlayerUsePortal,
            EventKind::PlayerEnterSpace,
            EventKind::PlayerShouldStop,
            EventKind::EntityDeath,
            EventKind::DisplayMessage,
            EventKind::LevelChange,
            EventKind::MapLoaded,
            EventKind::MapUnloaded,
        ]);
        kinds
    }
}

impl std::str::FromStr for EventKind {
    type Err = RockslikeError;

    fn from_str(name: &str) -> RockslikeResult<Self> {
        if let Some(suffix) = name.strip_prefix("player_move_") {
            return Direction::from_abbreviation(suffix)
                .map(EventKind::PlayerMove)
                .ok_or_else(|| RockslikeError::UnknownEvent(name.to_string()));
        }
        EventKind::all()
            .into_iter()
            .find(|kind| kind.name() == name)
            .ok_or_else(|| RockslikeError::UnknownEvent(name.to_string()))
    }
}

/// Handle returned by [`EventBus::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler = Rc<dyn Fn(&GameEvent, &EventBus)>;

/// Registry of event kind to ordered list of handlers.
///
/// The bus is single-threaded and shared through `Rc`; handlers receive the
/// bus itself so they can publish follow-up events.
#[derive(Default)]
pub struct EventBus {
    handlers: RefCell<HashMap<EventKind, Vec<(SubscriptionId, Handler)>>>,
    next_id: Cell<u64>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let handlers = self.handlers.borrow();
        let mut counts: Vec<(String, usize)> = handlers
            .iter()
            .map(|(kind, list)| (kind.name(), list.len()))
            .collect();
        counts.sort();
        f.debug_struct("EventBus").field("handlers", &counts).finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for every event of `kind`.
    pub fn subscribe<F>(&self, kind: EventKind, handler: F) -> SubscriptionId
    where
        F: Fn(&GameEvent, &EventBus) + 'static,
    {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.handlers
            .borrow_mut()
            .entry(kind)
            .or_default()
            .push((id, Rc::new(handler)));
        id
    }

    /// Like [`EventBus::subscribe`], keyed by the event's name.
    pub fn subscribe_named<F>(&self, name: &str, handler: F) -> RockslikeResult<SubscriptionId>
    where
        F: Fn(&GameEvent, &EventBus) + 'static,
    {
        let kind: EventKind = name.parse()?;
        Ok(self.subscribe(kind, handler))
    }

    /// Removes a subscription. Returns false if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut handlers = self.handlers.borrow_mut();
        for list in handlers.values_mut() {
            if let Some(index) = list.iter().position(|(sub, _)| *sub == id) {
                list.remove(index);
                return true;
            }
        }
        false
    }

    /// Dispatches `event` to every handler of its kind, in subscription order.
    ///
    /// Handlers registered while the event is being dispatched do not see it.
    /// Publishing with no subscribers is a no-op.
    pub fn publish(&self, event: GameEvent) {
        let kind = event.kind();
        // Snapshot so handlers can subscribe or publish without a live borrow.
        let handlers: Vec<Handler> = self
            .handlers
            .borrow()
            .get(&kind)
            .map(|list| list.iter().map(|(_, handler)| Rc::clone(handler)).collect())
            .unwrap_or_default();

        log::trace!("Publishing {} to {} handler(s)", kind.name(), handlers.len());
        for handler in handlers {
            handler(&event, self);
        }
    }

    /// Number of handlers currently subscribed to `kind`.
    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.handlers
            .borrow()
            .get(&kind)
            .map(Vec::len)
            .unwrap_or(0)
    }
}
