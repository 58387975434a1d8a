//! Integration tests for loading map files from disk into a world.

use rockslike::{
    load_map_file, Color, ConcreteEntity, EntityKindSpec, EventBus, FeatureKind, GameSettings,
    Position, RockslikeError, RockslikeResult, World,
};
use std::io::Write;
use std::path::PathBuf;
use std::rc::Rc;

fn sample_map() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("maps/testmap.map")
}

fn write_map(text: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(text.as_bytes()).expect("write map");
    file
}

#[test]
fn test_sample_map_loads() -> RockslikeResult<()> {
    let parsed = load_map_file(sample_map())?;
    assert_eq!(parsed.name.as_deref(), Some("The quarry gate"));
    assert_eq!((parsed.terrain.width(), parsed.terrain.height()), (20, 6));
    assert_eq!(parsed.player_spawn, Position::new(2, 1));
    assert_eq!(parsed.entities.len(), 3);

    let water = parsed.terrain.get(3, 2).expect("in bounds");
    assert_eq!(water.kind(), FeatureKind::Floor);
    assert_eq!(water.tile().character, '~');
    assert_eq!(water.tile().foreground, Color::Blue);

    let door = parsed.terrain.get(9, 3).expect("in bounds");
    assert!(door.is_passable());
    assert!(door.tile().bold);

    let stairs = parsed.terrain.get(16, 4).expect("in bounds");
    assert_eq!(stairs.kind(), FeatureKind::StairsDown { destination: None });
    assert_eq!(stairs.tile().foreground, Color::Red);

    let world = World::from_parsed(parsed, &GameSettings::default(), Rc::new(EventBus::new()))?;
    assert_eq!(world.player_position(), Some(Position::new(2, 1)));
    assert_eq!(world.current_map().entities.len(), 4);
    Ok(())
}

#[test]
fn test_sample_map_entities() -> RockslikeResult<()> {
    let parsed = load_map_file(sample_map())?;
    let signpost = parsed
        .entities
        .iter()
        .find(|spec| spec.class_name() == "Signpost")
        .expect("signpost");
    match &signpost.kind {
        EntityKindSpec::Signpost {
            message,
            let_player_pass,
        } => {
            assert!(message.starts_with("The quarry lies east"));
            assert!(*let_player_pass);
        }
        other => panic!("unexpected {:?}", other),
    }

    let green = parsed
        .entities
        .iter()
        .find(|spec| spec.position == Position::new(11, 3))
        .expect("pickaxe");
    let tile = green.tile.expect("custom tile");
    assert_eq!((tile.character, tile.foreground), ('*', Color::Green));
    Ok(())
}

#[test]
fn test_world_from_temp_file() -> RockslikeResult<()> {
    let file = write_map(
        "#####\n#...#\n#####\n\n{\"entities\": [\n  {\"classname\": \"Player\", \"x_coord\": 3, \"y_coord\": 1},\n  {\"classname\": \"ItemPickup\", \"x_coord\": 1, \"y_coord\": 1, \"args\": [[\"key\"]]}\n]}\n",
    );
    let parsed = load_map_file(file.path())?;
    assert_eq!(parsed.player_spawn, Position::new(3, 1));

    let world = World::from_parsed(parsed, &GameSettings::default(), Rc::new(EventBus::new()))?;
    let map = world.current_map();
    assert_eq!(map.entities.len(), 2);
    assert_eq!(
        map.entities
            .iter()
            .filter(|entity| matches!(entity, ConcreteEntity::Player(_)))
            .count(),
        1
    );
    assert_eq!(world.player_position(), Some(Position::new(3, 1)));
    Ok(())
}

#[test]
fn test_missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let result = load_map_file(dir.path().join("nowhere.map"));
    assert!(matches!(result, Err(RockslikeError::Io(_))));
}

#[test]
fn test_malformed_metadata_reports_its_line() {
    let file = write_map("...\n...\n\n{\n  \"entities\": [\n    {\"classname\": \"ItemPickup\",}\n  ]\n}\n");
    match load_map_file(file.path()) {
        Err(RockslikeError::MalformedMap { line, .. }) => assert_eq!(line, Some(6)),
        other => panic!("expected a malformed map error, got {:?}", other),
    }
}

#[test]
fn test_bad_colour_names_are_rejected() {
    let file = write_map("...\n\n{\"mapfeatures\": {\"0,0\": {\"fgcolor\": \"CHARTREUSE\"}}}");
    let err = load_map_file(file.path()).unwrap_err();
    assert!(err.to_string().contains("CHARTREUSE"), "{}", err);
}
