//! Integration tests for stairs, lazy level generation and ascend policies.

use rand::rngs::StdRng;
use rockslike::{
    AscendPolicy, EventBus, EventKind, FeatureKind, GameEvent, GameMap, GameSettings,
    GenerationConfig, Generator, Position, RockslikeError, RockslikeResult, TerrainFeature,
    TerrainGrid, World,
};
use std::cell::RefCell;
use std::rc::Rc;

fn settings(policy: AscendPolicy) -> GameSettings {
    let mut settings = GameSettings {
        generation: GenerationConfig::for_testing(2024),
        ..GameSettings::default()
    };
    settings.world.ascend_policy = policy;
    settings
}

/// A 10x6 floor with `stairs` under the spawn at (2, 2).
fn first_level(stairs: TerrainFeature) -> GameMap {
    let mut terrain = TerrainGrid::filled(10, 6, TerrainFeature::floor());
    terrain.set(2, 2, stairs).unwrap();
    GameMap::new(terrain).with_spawn(Position::new(2, 2))
}

fn record_loads(world: &World) -> Rc<RefCell<Vec<String>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    for kind in [EventKind::MapLoaded, EventKind::MapUnloaded] {
        let sink = Rc::clone(&log);
        world.bus().subscribe(kind, move |event, _| match event {
            GameEvent::MapLoaded { depth } => sink.borrow_mut().push(format!("load {}", depth)),
            GameEvent::MapUnloaded { depth } => {
                sink.borrow_mut().push(format!("unload {}", depth))
            }
            _ => {}
        });
    }
    log
}

#[test]
fn test_descending_generates_lazily() -> RockslikeResult<()> {
    let mut world = World::new(
        first_level(TerrainFeature::stairs_down(None)),
        &settings(AscendPolicy::Corrected),
    )?;
    let loads = record_loads(&world);
    assert_eq!(world.level_count(), 1);

    assert!(world.use_portal()?);
    assert_eq!(world.current_depth(), 1);
    assert_eq!(world.level_count(), 2);
    assert_eq!(*loads.borrow(), vec!["unload 0", "load 1"]);

    // The player arrives on the up staircase at the new level's spawn.
    let level = world.current_map();
    assert_eq!(level.depth, 1);
    assert_eq!(world.player_position(), Some(level.player_spawn));
    assert!(matches!(
        world.get(level.player_spawn.x, level.player_spawn.y).terrain.kind(),
        FeatureKind::StairsUp { .. }
    ));
    // The old level no longer holds the player.
    assert!(world.level(0).and_then(GameMap::player).is_none());
    Ok(())
}

#[test]
fn test_corrected_ascent_returns_to_the_same_level() -> RockslikeResult<()> {
    let mut world = World::new(
        first_level(TerrainFeature::stairs_down(None)),
        &settings(AscendPolicy::Corrected),
    )?;
    world.change_map_down()?;
    world.change_map_down()?;
    assert_eq!(world.current_depth(), 2);
    let second = world.level(1).map(|level| level.terrain().clone());

    assert!(world.use_portal()?);
    assert_eq!(world.current_depth(), 1);
    assert_eq!(world.level_count(), 3);
    assert_eq!(world.level(1).map(|level| level.terrain().clone()), second);

    assert!(world.change_map_up()?);
    assert_eq!(world.current_depth(), 0);
    assert_eq!(world.player_position(), Some(Position::new(2, 2)));
    Ok(())
}

#[test]
fn test_legacy_ascent_goes_deeper() -> RockslikeResult<()> {
    let mut world = World::new(
        first_level(TerrainFeature::stairs_down(None)),
        &settings(AscendPolicy::Legacy),
    )?;
    assert!(world.use_portal()?);
    assert_eq!(world.current_depth(), 1);

    // Level 1 spawns the player on an up staircase, which leads to level 2.
    assert!(world.use_portal()?);
    assert_eq!(world.current_depth(), 2);
    assert_eq!(world.level_count(), 3);
    Ok(())
}

#[test]
fn test_ascending_from_the_top_changes_nothing() -> RockslikeResult<()> {
    for policy in [AscendPolicy::Corrected, AscendPolicy::Legacy] {
        let mut world = World::new(
            first_level(TerrainFeature::stairs_up(Some(Position::new(7, 4)))),
            &settings(policy),
        )?;
        let loads = record_loads(&world);

        assert!(!world.use_portal()?);
        assert!(!world.change_map_up()?);
        assert_eq!(world.current_depth(), 0);
        assert_eq!(world.level_count(), 1);
        assert_eq!(world.player_position(), Some(Position::new(2, 2)));
        assert!(loads.borrow().is_empty());
    }
    Ok(())
}

#[test]
fn test_stair_destination_places_the_player() -> RockslikeResult<()> {
    let destination = Position::new(3, 3);
    let mut world = World::new(
        first_level(TerrainFeature::stairs_down(Some(destination))),
        &settings(AscendPolicy::Corrected),
    )?;
    assert!(world.use_portal()?);
    assert_eq!(world.current_depth(), 1);
    assert_eq!(world.player_position(), Some(destination));
    Ok(())
}

#[test]
fn test_off_map_destination_falls_back_to_spawn() -> RockslikeResult<()> {
    let mut world = World::new(
        first_level(TerrainFeature::stairs_down(Some(Position::new(500, 500)))),
        &settings(AscendPolicy::Corrected),
    )?;
    assert!(world.use_portal()?);
    let spawn = world.current_map().player_spawn;
    assert_eq!(world.player_position(), Some(spawn));
    Ok(())
}

#[test]
fn test_stairs_through_the_bus() -> RockslikeResult<()> {
    let bus = Rc::new(EventBus::new());
    let mut world = World::with_bus(
        first_level(TerrainFeature::stairs_down(None)),
        &settings(AscendPolicy::Corrected),
        Rc::clone(&bus),
    )?;
    let messages = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&messages);
    bus.subscribe(EventKind::DisplayMessage, move |event, _| {
        if let GameEvent::DisplayMessage { text } = event {
            sink.borrow_mut().push(text.clone());
        }
    });

    bus.publish(GameEvent::PlayerMove(rockslike::Direction::East));
    bus.publish(GameEvent::PlayerUsePortal);
    assert_eq!(world.update()?, 2);
    assert_eq!(world.current_depth(), 0);
    assert_eq!(*messages.borrow(), vec!["There are no stairs here.".to_string()]);

    bus.publish(GameEvent::PlayerMove(rockslike::Direction::West));
    bus.publish(GameEvent::PlayerUsePortal);
    world.update()?;
    assert_eq!(world.current_depth(), 1);
    assert_eq!(world.turn_number, 4);
    Ok(())
}

#[test]
fn test_levels_are_reproducible_from_the_seed() -> RockslikeResult<()> {
    let build = || -> RockslikeResult<TerrainGrid> {
        let mut world = World::new(
            first_level(TerrainFeature::stairs_down(None)),
            &settings(AscendPolicy::Corrected),
        )?;
        world.change_map_down()?;
        Ok(world.current_map().terrain().clone())
    };
    assert_eq!(build()?, build()?);
    Ok(())
}

struct Barren;

impl Generator<GameMap> for Barren {
    fn generate(&self, _config: &GenerationConfig, _rng: &mut StdRng) -> RockslikeResult<GameMap> {
        Err(RockslikeError::GenerationFailed("nothing to dig".to_string()))
    }

    fn validate(&self, _content: &GameMap, _config: &GenerationConfig) -> RockslikeResult<()> {
        Ok(())
    }

    fn generator_type(&self) -> &'static str {
        "Barren"
    }
}

#[test]
fn test_failed_descent_leaves_the_player_in_place() -> RockslikeResult<()> {
    let mut terrain = TerrainGrid::filled(8, 8, TerrainFeature::floor());
    terrain.set(2, 2, TerrainFeature::stairs_down(Some(Position::new(6, 6))))?;
    let level = GameMap::new(terrain).with_spawn(Position::new(2, 2));
    let mut world =
        World::new(level, &settings(AscendPolicy::Corrected))?.with_generator(Box::new(Barren));
    let loads = record_loads(&world);

    let result = world.use_portal();
    assert!(matches!(result, Err(RockslikeError::GenerationFailed(_))));
    assert_eq!(world.current_depth(), 0);
    assert_eq!(world.level_count(), 1);
    assert_eq!(world.player_position(), Some(Position::new(2, 2)));
    assert!(loads.borrow().is_empty());
    Ok(())
}
