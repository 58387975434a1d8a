//! # Input Module
//!
//! Keyboard handling for the player. Keys are mapped to semantic
//! [`PlayerInput`]s, which are published on the [`EventBus`] as input events
//! (`player_move_*`, `player_display_inventory`, `player_use_portal`). The
//! world listens to those events; nothing here touches the world directly.

use crate::{Direction, EventBus, GameEvent};
use macroquad::prelude::*;

/// Input handler for processing player commands.
///
/// Translates keys polled by the game loop; the loop keeps the raw key so
/// that any key can turn a message page.
pub struct InputHandler {
    /// Whether to enable Vi-style movement keys (hjklyubn)
    pub vi_keys_enabled: bool,
}

impl Default for InputHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl InputHandler {
    /// Creates a new input handler with vi keys enabled.
    ///
    /// # Examples
    ///
    /// ```
    /// use rockslike::InputHandler;
    ///
    /// let input_handler = InputHandler::new();
    /// assert!(input_handler.vi_keys_enabled);
    /// ```
    pub fn new() -> Self {
        Self {
            vi_keys_enabled: true,
        }
    }

    /// Translates one key into an input.
    ///
    /// # Examples
    ///
    /// ```
    /// use macroquad::prelude::KeyCode;
    /// use rockslike::{Direction, InputHandler, PlayerInput};
    ///
    /// let input_handler = InputHandler::new();
    /// assert_eq!(
    ///     input_handler.input_for_key(KeyCode::U),
    ///     Some(PlayerInput::Move(Direction::Northeast))
    /// );
    /// assert_eq!(input_handler.input_for_key(KeyCode::F5), None);
    /// ```
    pub fn input_for_key(&self, key: KeyCode) -> Option<PlayerInput> {
        if let Some(direction) = direction_for_key(key, self.vi_keys_enabled) {
            return Some(PlayerInput::Move(direction));
        }

        match key {
            KeyCode::Escape | KeyCode::Q => Some(PlayerInput::Quit),
            KeyCode::I => Some(PlayerInput::ShowInventory),
            KeyCode::Period | KeyCode::Enter | KeyCode::KpEnter => Some(PlayerInput::UseStairs),
            _ => None,
        }
    }

    /// Publishes `input` as a bus event.
    ///
    /// Returns false for inputs that are handled by the game loop itself
    /// rather than by the world (quitting).
    pub fn dispatch(&self, input: PlayerInput, bus: &EventBus) -> bool {
        match input.to_event() {
            Some(event) => {
                log::trace!("Input {:?} becomes {}", input, event.kind().name());
                bus.publish(event);
                true
            }
            None => false,
        }
    }
}

/// Movement keys: arrows, the number row and keypad laid out as a numpad,
/// and optionally the vi keys.
fn direction_for_key(key: KeyCode, vi_keys: bool) -> Option<Direction> {
    let direction = match key {
        KeyCode::Up | KeyCode::Key8 | KeyCode::Kp8 => Direction::North,
        KeyCode::Key9 | KeyCode::Kp9 => Direction::Northeast,
        KeyCode::Right | KeyCode::Key6 | KeyCode::Kp6 => Direction::East,
        KeyCode::Key3 | KeyCode::Kp3 => Direction::Southeast,
        KeyCode::Down | KeyCode::Key2 | KeyCode::Kp2 => Direction::South,
        KeyCode::Key1 | KeyCode::Kp1 => Direction::Southwest,
        KeyCode::Left | KeyCode::Key4 | KeyCode::Kp4 => Direction::West,
        KeyCode::Key7 | KeyCode::Kp7 => Direction::Northwest,
        _ if vi_keys => match key {
            KeyCode::K => Direction::North,
            KeyCode::U => Direction::Northeast,
            KeyCode::L => Direction::East,
            KeyCode::N => Direction::Southeast,
            KeyCode::J => Direction::South,
            KeyCode::B => Direction::Southwest,
            KeyCode::H => Direction::West,
            KeyCode::Y => Direction::Northwest,
            _ => return None,
        },
        _ => return None,
    };
    Some(direction)
}

/// Player input types that can be processed by the input handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerInput {
    /// Step one cell in a direction
    Move(Direction),
    /// Show inventory
    ShowInventory,
    /// Use the stairs under the player
    UseStairs,
    /// Quit the game
    Quit,
}

impl PlayerInput {
    /// The bus event this input stands for, if the world handles it.
    pub fn to_event(self) -> Option<GameEvent> {
        match self {
            PlayerInput::Move(direction) => Some(GameEvent::PlayerMove(direction)),
            PlayerInput::ShowInventory => Some(GameEvent::PlayerDisplayInventory),
            PlayerInput::UseStairs => Some(GameEvent::PlayerUsePortal),
            PlayerInput::Quit => None,
        }
    }
}
