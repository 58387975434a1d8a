//! # Rockslike Main Entry Point
//!
//! Parses the command line, builds the world and only then opens the
//! macroquad window and runs the main game loop.

use clap::Parser;
use macroquad::prelude::*;
use rockslike::generation::utils;
use rockslike::{
    load_map_file, EmptyBoxGenerator, EventBus, GameSettings, Generator, InputHandler,
    MacroquadDisplay, MessagePage, MessageWindow, PlayerInput, RockslikeResult, World,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;

/// Command line arguments for Rockslike.
#[derive(Parser, Debug)]
#[command(name = "rockslike")]
#[command(about = "A turn-based roguelike with BSP dungeons and hand-drawn map files")]
#[command(version)]
struct Args {
    /// Map file to start on; an empty walled box is used when omitted
    map_file: Option<PathBuf>,

    /// Enable debugging output
    #[arg(short, long)]
    debug: bool,

    /// Random seed for dungeon generation
    #[arg(short, long)]
    seed: Option<u64>,

    /// JSON settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> ExitCode {
    let args = Args::parse();
    initialize_logging(&args);

    log::info!("Starting Rockslike v{}", rockslike::VERSION);

    let world = match build_world(&args) {
        Ok(world) => world,
        Err(err) => {
            match &args.map_file {
                Some(path) => eprintln!("rockslike: {}: {}", path.display(), err),
                None => eprintln!("rockslike: {}", err),
            }
            return ExitCode::FAILURE;
        }
    };

    let display = MacroquadDisplay::new(
        world.config().view_width as usize,
        world.config().view_height as usize,
    );
    let (width, height) = display.window_size();
    let conf = macroquad::window::Conf {
        window_title: "Rockslike".to_string(),
        window_width: width as i32,
        window_height: height as i32,
        ..Default::default()
    };

    macroquad::Window::from_config(conf, run_game_loop(world, display));
    ExitCode::SUCCESS
}

/// Initializes `env_logger`; `RUST_LOG` overrides the command line.
fn initialize_logging(args: &Args) {
    let level = if args.debug { "debug" } else { args.log_level.as_str() };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

/// Builds the world from a map file, or from an empty box when none is given.
fn build_world(args: &Args) -> RockslikeResult<World> {
    let mut settings = match &args.config {
        Some(path) => GameSettings::load_from_path(path)?,
        None => GameSettings::default(),
    };
    if let Some(seed) = args.seed {
        settings.generation.seed = seed;
    }
    log::debug!("Generation seed {}", settings.generation.seed);

    let bus = Rc::new(EventBus::new());
    match &args.map_file {
        Some(path) => {
            let parsed = load_map_file(path)?;
            World::from_parsed(parsed, &settings, bus)
        }
        None => {
            let generator = EmptyBoxGenerator::default();
            let mut rng = utils::create_rng(&settings.generation);
            let level = generator.generate(&settings.generation, &mut rng)?;
            generator.validate(&level, &settings.generation)?;
            World::with_bus(level, &settings, bus)
        }
    }
}

/// Main game loop implementation.
///
/// While a message page is showing, any key turns the page instead of
/// acting.
async fn run_game_loop(mut world: World, mut display: MacroquadDisplay) {
    let input_handler = InputHandler::new();
    let mut messages = MessageWindow::new(
        Rc::clone(world.bus()),
        display.message_columns(),
        display.message_rows,
    );
    messages.add_message("Welcome to Rockslike! Move with hjklyubn, the numpad or arrows. Press i for your inventory and . to take the stairs.");
    let mut page: Option<MessagePage> = messages.next_page();

    loop {
        if let Some(key) = get_last_key_pressed() {
            if page.is_some() {
                page = messages.next_page();
            } else {
                match input_handler.input_for_key(key) {
                    Some(PlayerInput::Quit) => {
                        log::info!("Player quit the game");
                        break;
                    }
                    Some(input) => {
                        input_handler.dispatch(input, world.bus());
                        if let Err(err) = world.update() {
                            log::error!("Turn {} failed: {}", world.turn_number, err);
                            messages.add_message(err.to_string());
                        }
                        page = messages.next_page();
                    }
                    None => {}
                }
            }
        }

        display.render_game(&world, page.as_ref());
        next_frame().await;
    }

    log::info!("Game loop ended after {} turns", world.turn_number);
}
