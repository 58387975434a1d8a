//! Integration tests for player movement and collisions, driven through the
//! event bus the way the input handler drives the game.

use rockslike::{
    parse_map, CollisionPolicy, Direction, EventBus, EventKind, GameEvent, GameSettings,
    Position, RockslikeResult, World,
};
use std::cell::RefCell;
use std::rc::Rc;

const ROOM: &str = "#######\n#.....#\n#.....#\n#.....#\n#######";

fn world_from(text: &str, policy: CollisionPolicy) -> RockslikeResult<World> {
    let mut settings = GameSettings::default();
    settings.world.collision_policy = policy;
    World::from_parsed(parse_map(text)?, &settings, Rc::new(EventBus::new()))
}

fn with_metadata(metadata: &str) -> String {
    format!("{}\n\n{}", ROOM, metadata)
}

fn record_messages(world: &World) -> Rc<RefCell<Vec<String>>> {
    let messages = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&messages);
    world.bus().subscribe(EventKind::DisplayMessage, move |event, _| {
        if let GameEvent::DisplayMessage { text } = event {
            sink.borrow_mut().push(text.clone());
        }
    });
    messages
}

fn step(world: &mut World, direction: Direction) -> RockslikeResult<()> {
    world.bus().publish(GameEvent::PlayerMove(direction));
    assert_eq!(world.update()?, 1);
    Ok(())
}

#[test]
fn test_pickup_scenario() -> RockslikeResult<()> {
    let text = with_metadata(
        r#"{"mapdetails": {"player_spawn_x": 2, "player_spawn_y": 2},
            "entities": [{"classname": "ItemPickup", "x_coord": 2, "y_coord": 3,
                          "args": [["torch"]]}]}"#,
    );
    let mut world = world_from(&text, CollisionPolicy::AllMustAllow)?;
    let messages = record_messages(&world);
    let deaths = Rc::new(RefCell::new(0));
    let counter = Rc::clone(&deaths);
    world
        .bus()
        .subscribe(EventKind::EntityDeath, move |_, _| *counter.borrow_mut() += 1);

    assert_eq!(world.get(2, 3).entities.len(), 1);
    step(&mut world, Direction::South)?;

    let player = world.player().expect("player");
    assert_eq!(player.inventory, vec!["torch".to_string()]);
    assert_eq!(world.player_position(), Some(Position::new(2, 3)));
    assert_eq!(*deaths.borrow(), 1);
    assert_eq!(*messages.borrow(), vec!["You pick up: torch.".to_string()]);

    // Only the player is left on the cell.
    let cell = world.get(2, 3);
    assert_eq!(cell.entities.len(), 1);
    assert!(cell.entities[0].as_player().is_some());
    assert_eq!(world.current_map().entities.len(), 1);
    assert_eq!(world.turn_number, 1);
    Ok(())
}

#[test]
fn test_inventory_listing_after_pickups() -> RockslikeResult<()> {
    let text = with_metadata(
        r#"{"mapdetails": {"player_spawn_x": 1, "player_spawn_y": 1},
            "entities": [
              {"classname": "ItemPickup", "x_coord": 2, "y_coord": 1, "args": [["torch", "rope"]]},
              {"classname": "ItemPickup", "x_coord": 3, "y_coord": 1, "kwargs": {"items": ["apple"]}}]}"#,
    );
    let mut world = world_from(&text, CollisionPolicy::AllMustAllow)?;
    let messages = record_messages(&world);

    world.bus().publish(GameEvent::PlayerDisplayInventory);
    world.update()?;
    step(&mut world, Direction::East)?;
    step(&mut world, Direction::East)?;
    world.bus().publish(GameEvent::PlayerDisplayInventory);
    world.update()?;

    let messages = messages.borrow();
    assert_eq!(messages.first().map(String::as_str), Some("You are carrying nothing."));
    assert_eq!(
        messages.last().map(String::as_str),
        Some("You are carrying: torch, rope, apple.")
    );
    assert_eq!(world.turn_number, 4);
    Ok(())
}

#[test]
fn test_walls_and_signposts_block() -> RockslikeResult<()> {
    let text = with_metadata(
        r#"{"mapdetails": {"player_spawn_x": 1, "player_spawn_y": 1},
            "entities": [{"classname": "Signpost", "x_coord": 2, "y_coord": 1,
                          "args": ["Keep out!"]}]}"#,
    );
    let mut world = world_from(&text, CollisionPolicy::AllMustAllow)?;
    let messages = record_messages(&world);

    assert!(!world.move_player(Direction::North)?);
    assert!(!world.move_player(Direction::East)?);
    assert_eq!(world.player_position(), Some(Position::new(1, 1)));
    assert_eq!(*messages.borrow(), vec!["Keep out!".to_string()]);

    assert!(world.move_player(Direction::Southeast)?);
    assert_eq!(world.player_position(), Some(Position::new(2, 2)));
    Ok(())
}

#[test]
fn test_collision_policies_disagree_on_mixed_verdicts() -> RockslikeResult<()> {
    // A closed signpost followed by a pickup on the same cell.
    let text = with_metadata(
        r#"{"mapdetails": {"player_spawn_x": 2, "player_spawn_y": 2},
            "entities": [
              {"classname": "Signpost", "x_coord": 3, "y_coord": 2, "args": ["Closed", false]},
              {"classname": "ItemPickup", "x_coord": 3, "y_coord": 2, "args": [["coin"]]}]}"#,
    );

    let mut strict = world_from(&text, CollisionPolicy::AllMustAllow)?;
    assert!(!strict.move_player(Direction::East)?);
    assert_eq!(strict.player_position(), Some(Position::new(2, 2)));
    // The pickup still reacted to the bump.
    assert_eq!(strict.player().map(|p| p.inventory.len()), Some(1));

    let mut legacy = world_from(&text, CollisionPolicy::LastWriterWins)?;
    assert!(legacy.move_player(Direction::East)?);
    assert_eq!(legacy.player_position(), Some(Position::new(3, 2)));
    Ok(())
}

#[test]
fn test_blocking_verdict_last_blocks_under_both_policies() -> RockslikeResult<()> {
    let text = with_metadata(
        r#"{"mapdetails": {"player_spawn_x": 2, "player_spawn_y": 2},
            "entities": [
              {"classname": "ItemPickup", "x_coord": 3, "y_coord": 2, "args": [["coin"]]},
              {"classname": "Signpost", "x_coord": 3, "y_coord": 2, "args": ["Closed", false]}]}"#,
    );
    for policy in [CollisionPolicy::AllMustAllow, CollisionPolicy::LastWriterWins] {
        let mut world = world_from(&text, policy)?;
        assert!(!world.move_player(Direction::East)?, "{:?}", policy);
        assert_eq!(world.player_position(), Some(Position::new(2, 2)));
    }
    Ok(())
}

#[test]
fn test_enter_space_listener_can_veto() -> RockslikeResult<()> {
    let text = with_metadata(r#"{"mapdetails": {"player_spawn_x": 1, "player_spawn_y": 1}}"#);
    let mut world = world_from(&text, CollisionPolicy::AllMustAllow)?;
    let start = world.player_position();

    let targets = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&targets);
    world
        .bus()
        .subscribe(EventKind::PlayerEnterSpace, move |event, bus| {
            if let GameEvent::PlayerEnterSpace { target, .. } = event {
                sink.borrow_mut().push(*target);
                if target.x == 2 {
                    bus.publish(GameEvent::PlayerShouldStop);
                }
            }
        });

    assert!(!world.move_player(Direction::East)?);
    assert_eq!(world.player_position(), start);

    // The veto only applies to the move it was raised for.
    assert!(world.move_player(Direction::South)?);
    assert_eq!(*targets.borrow(), vec![Position::new(2, 1), Position::new(1, 2)]);
    Ok(())
}

#[test]
fn test_edge_of_an_open_map_is_void() -> RockslikeResult<()> {
    let mut world = world_from("...\n...", CollisionPolicy::AllMustAllow)?;
    for direction in [Direction::North, Direction::West, Direction::Northwest] {
        assert!(!world.move_player(direction)?);
    }
    assert_eq!(world.player_position(), Some(Position::origin()));
    assert!(!world.get(-1, 0).is_passable());
    assert!(world.get(-1, 0).entities.is_empty());
    assert!(world.get(100, 100).entities.is_empty());
    Ok(())
}
