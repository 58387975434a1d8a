//! # Tiles
//!
//! The visual representation of every terrain feature and entity, plus the
//! registry that hands out one colour-pair id per distinct `(fg, bg)` pair.

use crate::{RockslikeError, RockslikeResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

/// The eight classic terminal colours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Color {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
}

impl Color {
    /// All colours, in terminal palette order.
    pub const ALL: [Color; 8] = [
        Color::Black,
        Color::Red,
        Color::Green,
        Color::Yellow,
        Color::Blue,
        Color::Magenta,
        Color::Cyan,
        Color::White,
    ];

    /// Upper-case name as written in map files.
    pub fn name(self) -> &'static str {
        match self {
            Color::Black => "BLACK",
            Color::Red => "RED",
            Color::Green => "GREEN",
            Color::Yellow => "YELLOW",
            Color::Blue => "BLUE",
            Color::Magenta => "MAGENTA",
            Color::Cyan => "CYAN",
            Color::White => "WHITE",
        }
    }
}

impl FromStr for Color {
    type Err = RockslikeError;

    fn from_str(s: &str) -> RockslikeResult<Self> {
        Color::ALL
            .into_iter()
            .find(|color| color.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| RockslikeError::malformed(format!("unknown colour '{}'", s)))
    }
}

/// Character and colour information for a game object's appearance.
///
/// # Examples
///
/// ```
/// use rockslike::{Color, Tile};
///
/// let tile = Tile::new('@', Color::White, Color::Cyan);
/// assert_eq!(tile.character, '@');
/// assert!(!tile.bold);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tile {
    pub character: char,
    pub foreground: Color,
    pub background: Color,
    pub bold: bool,
}

impl Tile {
    pub const fn new(character: char, foreground: Color, background: Color) -> Self {
        Self {
            character,
            foreground,
            background,
            bold: false,
        }
    }

    /// Returns a copy of this tile drawn in bold.
    pub const fn bolded(mut self, bold: bool) -> Self {
        self.bold = bold;
        self
    }

    /// Resolves this tile's colour pair, registering it on first use.
    pub fn color_pair(&self, registry: &mut ColorRegistry) -> ColorPairId {
        registry.get_color(self.foreground, self.background)
    }
}

/// Identifier of a registered `(foreground, background)` colour pair.
///
/// Ids start at 1; 0 is reserved for the display's default colours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ColorPairId(pub u16);

/// Deduplicating registry of colour pairs for one display session.
///
/// Requesting the same `(fg, bg)` pair twice always yields the same id, and
/// a pair is registered at most once until [`ColorRegistry::reset`].
#[derive(Debug, Clone, Default)]
pub struct ColorRegistry {
    ids: HashMap<(Color, Color), ColorPairId>,
    pairs: Vec<(Color, Color)>,
}

impl ColorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the id for `(foreground, background)`, registering it if needed.
    pub fn get_color(&mut self, foreground: Color, background: Color) -> ColorPairId {
        if let Some(id) = self.ids.get(&(foreground, background)) {
            return *id;
        }
        self.pairs.push((foreground, background));
        let id = ColorPairId(self.pairs.len() as u16);
        log::trace!("Registered colour pair {:?} as {:?}", (foreground, background), id);
        self.ids.insert((foreground, background), id);
        id
    }

    /// Looks up the colours behind a previously issued id.
    pub fn pair(&self, id: ColorPairId) -> Option<(Color, Color)> {
        (id.0 as usize)
            .checked_sub(1)
            .and_then(|index| self.pairs.get(index))
            .copied()
    }

    /// Number of distinct pairs registered so far.
    pub fn registered_count(&self) -> usize {
        self.pairs.len()
    }

    /// Forgets every registration, as at the start of a new display session.
    pub fn reset(&mut self) {
        self.ids.clear();
        self.pairs.clear();
    }
}
