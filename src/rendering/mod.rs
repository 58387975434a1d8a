//! # Rendering Module
//!
//! Macroquad rendering of the world's character view and of in-game messages.

pub mod display;
pub mod messages;

pub use display::*;
pub use messages::*;
