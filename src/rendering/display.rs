//! # Display Management
//!
//! Character-grid rendering with macroquad. Every cell of the world's view is
//! drawn as a background rectangle plus one glyph; colours are resolved
//! through the display's own [`ColorRegistry`].

use crate::rendering::MessagePage;
use crate::{Color as GlyphColor, ColorRegistry, Tile, World};
use macroquad::prelude::*;

/// Rows reserved below the map for the status line and messages.
const STATUS_ROWS: usize = 1;

/// RGB of a terminal colour; `bright` selects the bold variant.
///
/// # Examples
///
/// ```
/// use rockslike::{palette, Color};
///
/// let dim = palette(Color::Red, false);
/// let bright = palette(Color::Red, true);
/// assert!(bright.r > dim.r);
/// ```
pub fn palette(color: GlyphColor, bright: bool) -> Color {
    let (high, low) = if bright { (1.0, 0.33) } else { (0.67, 0.0) };
    match color {
        GlyphColor::Black if bright => Color::new(0.33, 0.33, 0.33, 1.0),
        GlyphColor::Black => Color::new(0.0, 0.0, 0.0, 1.0),
        GlyphColor::Red => Color::new(high, low, low, 1.0),
        GlyphColor::Green => Color::new(low, high, low, 1.0),
        GlyphColor::Yellow => Color::new(high, high, low, 1.0),
        GlyphColor::Blue => Color::new(low, low, high, 1.0),
        GlyphColor::Magenta => Color::new(high, low, high, 1.0),
        GlyphColor::Cyan => Color::new(low, high, high, 1.0),
        GlyphColor::White => Color::new(high, high, high, 1.0),
    }
}

/// Macroquad display manager for the game.
#[derive(Debug)]
pub struct MacroquadDisplay {
    /// Map viewport width in cells
    pub view_width: usize,
    /// Map viewport height in cells
    pub view_height: usize,
    /// Cell size in pixels
    pub cell_width: f32,
    pub cell_height: f32,
    /// Font size used for glyphs and text
    pub font_size: f32,
    /// Rows of the message box, marker row included
    pub message_rows: usize,
    colors: ColorRegistry,
}

impl MacroquadDisplay {
    /// Creates a display for a `view_width` x `view_height` map viewport.
    pub fn new(view_width: usize, view_height: usize) -> Self {
        Self {
            view_width,
            view_height,
            cell_width: 12.0,
            cell_height: 20.0,
            font_size: 20.0,
            message_rows: 4,
            colors: ColorRegistry::new(),
        }
    }

    /// Window size in pixels needed to show the whole layout.
    pub fn window_size(&self) -> (f32, f32) {
        let rows = self.view_height + STATUS_ROWS + self.message_rows;
        (
            self.view_width as f32 * self.cell_width,
            rows as f32 * self.cell_height,
        )
    }

    /// Message box width in text columns.
    pub fn message_columns(&self) -> usize {
        self.view_width.saturating_sub(2)
    }

    pub fn colors(&self) -> &ColorRegistry {
        &self.colors
    }

    /// Renders the complete game screen: map, status line and message page.
    pub fn render_game(&mut self, world: &World, page: Option<&MessagePage>) {
        clear_background(BLACK);

        let view = world.get_view(
            self.view_width,
            self.view_height,
            crate::Position::origin(),
            true,
        );
        for (y, row) in view.iter().enumerate() {
            for (x, tile) in row.iter().enumerate() {
                self.draw_tile(x, y, tile);
            }
        }

        self.render_status(world);
        if let Some(page) = page {
            self.render_messages(page);
        }
    }

    fn draw_tile(&mut self, x: usize, y: usize, tile: &Tile) {
        let pair = tile.color_pair(&mut self.colors);
        let (foreground, background) = self
            .colors
            .pair(pair)
            .unwrap_or((tile.foreground, tile.background));

        let px = x as f32 * self.cell_width;
        let py = y as f32 * self.cell_height;
        draw_rectangle(
            px,
            py,
            self.cell_width,
            self.cell_height,
            palette(background, false),
        );
        if tile.character != ' ' {
            let mut glyph = [0u8; 4];
            draw_text(
                tile.character.encode_utf8(&mut glyph),
                px,
                py + self.cell_height * 0.8,
                self.font_size,
                palette(foreground, tile.bold),
            );
        }
    }

    fn render_status(&self, world: &World) {
        let map = world.current_map();
        let name = map.name.as_deref().unwrap_or("The dungeon");
        let status = format!(
            "{}  depth {}  turn {}",
            name,
            world.current_depth(),
            world.turn_number
        );
        let y = (self.view_height + 1) as f32 * self.cell_height;
        draw_text(&status, 0.0, y - self.cell_height * 0.2, self.font_size, GRAY);
    }

    /// Draws a bordered message box below the status line.
    fn render_messages(&self, page: &MessagePage) {
        let top = (self.view_height + STATUS_ROWS) as f32 * self.cell_height;
        let (width, _) = self.window_size();
        let height = self.message_rows as f32 * self.cell_height;

        draw_rectangle(0.0, top, width, height, Color::new(0.0, 0.0, 0.0, 0.9));
        draw_rectangle_lines(0.0, top, width, height, 2.0, WHITE);

        for (row, line) in page.lines(self.message_columns()).iter().enumerate() {
            let y = top + (row + 1) as f32 * self.cell_height - self.cell_height * 0.2;
            draw_text(line, self.cell_width, y, self.font_size, WHITE);
        }
    }
}
