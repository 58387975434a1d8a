//! # Dungeon Generation
//!
//! Binary space partition dungeons.
//!
//! The level is split recursively into rectangular regions; each leaf region
//! receives one randomly sized room, and every split joins a room of one half
//! to a room of the other with a corridor, so the whole dungeon is connected.
//! The resulting components are unioned into a single level-sized grid.

use crate::generation::{utils, ComponentGrid, GenerationConfig, Generator, MapComponent};
use crate::{
    config, materialize, GameMap, Grid, Position, RockslikeError, RockslikeResult,
    TerrainFeature,
};
use rand::rngs::StdRng;
use rand::Rng;

/// An axis-aligned rectangle in world space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub origin: Position,
    pub width: u32,
    pub height: u32,
}

/// How a region is cut in two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitAxis {
    /// A vertical cut: left and right halves
    Vertical,
    /// A horizontal cut: top and bottom halves
    Horizontal,
}

impl SplitAxis {
    /// Even depths cut vertically, odd depths horizontally.
    pub fn for_depth(depth: u32) -> Self {
        if depth % 2 == 0 {
            SplitAxis::Vertical
        } else {
            SplitAxis::Horizontal
        }
    }
}

impl Region {
    pub fn new(origin: Position, width: u32, height: u32) -> Self {
        Self {
            origin,
            width,
            height,
        }
    }

    /// Cuts the region `at` cells from its origin along `axis`.
    ///
    /// The halves share no cell and together cover the region exactly.
    pub fn split(&self, axis: SplitAxis, at: u32) -> (Region, Region) {
        match axis {
            SplitAxis::Vertical => (
                Region::new(self.origin, at, self.height),
                Region::new(self.origin.offset(at as i32, 0), self.width - at, self.height),
            ),
            SplitAxis::Horizontal => (
                Region::new(self.origin, self.width, at),
                Region::new(self.origin.offset(0, at as i32), self.width, self.height - at),
            ),
        }
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.x >= self.origin.x
            && pos.y >= self.origin.y
            && pos.x < self.origin.x + self.width as i32
            && pos.y < self.origin.y + self.height as i32
    }

    /// Whether `component`'s whole bounding box lies inside this region.
    pub fn encloses(&self, component: &MapComponent) -> bool {
        let far = component
            .origin
            .offset(component.width() as i32 - 1, component.height() as i32 - 1);
        self.contains(component.origin) && self.contains(far)
    }
}

/// The partition tree produced by [`bsp`].
#[derive(Debug, Clone)]
pub enum BspNode {
    /// A region that was not split further, holding its room
    Leaf { region: Region, room: MapComponent },
    /// A region cut in two, with the corridor joining the halves
    Split {
        region: Region,
        axis: SplitAxis,
        at: u32,
        children: Box<(BspNode, BspNode)>,
        corridor: MapComponent,
    },
}

impl BspNode {
    pub fn region(&self) -> Region {
        match self {
            BspNode::Leaf { region, .. } | BspNode::Split { region, .. } => *region,
        }
    }

    /// Every room in the subtree, left to right.
    pub fn rooms(&self) -> Vec<&MapComponent> {
        match self {
            BspNode::Leaf { room, .. } => vec![room],
            BspNode::Split { children, .. } => {
                let mut rooms = children.0.rooms();
                rooms.extend(children.1.rooms());
                rooms
            }
        }
    }

    /// Every corridor in the subtree, parents before children.
    pub fn corridors(&self) -> Vec<&MapComponent> {
        match self {
            BspNode::Leaf { .. } => Vec::new(),
            BspNode::Split {
                children, corridor, ..
            } => {
                let mut corridors = vec![corridor];
                corridors.extend(children.0.corridors());
                corridors.extend(children.1.corridors());
                corridors
            }
        }
    }

    /// Rooms followed by corridors, so corridors are drawn over room walls.
    pub fn flatten(&self) -> Vec<&MapComponent> {
        let mut components = self.rooms();
        components.extend(self.corridors());
        components
    }
}

/// Recursively partitions `region`, starting at recursion `depth`.
///
/// A region stops splitting when either side is at most twice the margin, or
/// with probability `depth / max_depth`. A leaf gets one room placed at a
/// random offset with a random size, always fitting inside the region. A
/// split alternates axis with depth and cuts at a uniform offset in
/// `[margin, dimension - margin]`.
///
/// Fails only if `region` cannot hold the smallest room at all.
pub fn bsp(
    region: Region,
    depth: u32,
    config: &GenerationConfig,
    rng: &mut StdRng,
) -> RockslikeResult<BspNode> {
    let min_room = config.min_room_dimension;
    let margin = config.margin();
    if region.width <= min_room || region.height <= min_room {
        return Err(RockslikeError::GenerationFailed(format!(
            "{}x{} region cannot hold a {}x{} room",
            region.width, region.height, min_room, min_room
        )));
    }

    let too_small = region.width <= margin * 2 || region.height <= margin * 2;
    let stop_chance = depth as f64 / config.max_depth.max(1) as f64;
    if too_small || rng.gen::<f64>() < stop_chance {
        let room_x = rng.gen_range(0..region.width - min_room);
        let room_y = rng.gen_range(0..region.height - min_room);
        let room = MapComponent::room(
            rng,
            region.origin.offset(room_x as i32, room_y as i32),
            min_room..region.width - room_x,
            min_room..region.height - room_y,
        );
        debug_assert!(region.encloses(&room));
        return Ok(BspNode::Leaf { region, room });
    }

    let axis = SplitAxis::for_depth(depth);
    let extent = match axis {
        SplitAxis::Vertical => region.width,
        SplitAxis::Horizontal => region.height,
    };
    let at = rng.gen_range(margin..=extent - margin);
    let (first, second) = region.split(axis, at);

    let first = bsp(first, depth + 1, config, rng)?;
    let second = bsp(second, depth + 1, config, rng)?;

    let corridor = {
        let first_rooms = first.rooms();
        let second_rooms = second.rooms();
        let from = first_rooms[rng.gen_range(0..first_rooms.len())].center();
        let to = second_rooms[rng.gen_range(0..second_rooms.len())].center();
        MapComponent::corridor(from, to)
    };

    Ok(BspNode::Split {
        region,
        axis,
        at,
        children: Box::new((first, second)),
        corridor,
    })
}

/// Unions `components` into a `width` x `height` grid anchored at the origin.
pub fn compose(components: &[&MapComponent], width: usize, height: usize) -> ComponentGrid {
    components.iter().fold(Grid::filled(width, height, None), |canvas, component| {
        Grid::union(&canvas, component.grid(), component.origin.x, component.origin.y)
    })
}

/// Turns every undefined cell next to a walkable one into wall.
pub fn grow_walls(grid: &mut ComponentGrid) {
    let walkable = |cell: Option<&Option<TerrainFeature>>| {
        matches!(cell, Some(Some(feature)) if feature.is_passable())
    };
    let enclose: Vec<Position> = grid
        .iter_positions()
        .filter(|(_, cell)| cell.is_none())
        .map(|(pos, _)| pos)
        .filter(|pos| pos.adjacent_positions().any(|n| walkable(grid.get(n.x, n.y))))
        .collect();
    for pos in enclose {
        if let Some(cell) = grid.get_mut(pos.x, pos.y) {
            *cell = Some(TerrainFeature::wall());
        }
    }
}

/// Generator producing BSP room-and-corridor levels.
#[derive(Debug, Clone, Default)]
pub struct BspGenerator;

impl BspGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl Generator<GameMap> for BspGenerator {
    fn generate(&self, config: &GenerationConfig, rng: &mut StdRng) -> RockslikeResult<GameMap> {
        let region = Region::new(Position::origin(), config.level_width, config.level_height);
        let tree = bsp(region, 0, config, rng)?;

        let rooms = tree.rooms();
        let (first, last) = match (rooms.first(), rooms.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => {
                return Err(RockslikeError::GenerationFailed(
                    "partition produced no rooms".to_string(),
                ))
            }
        };
        let spawn = first.center();
        let down = if last.center() != spawn {
            last.center()
        } else {
            last.floor_positions()
                .into_iter()
                .find(|pos| *pos != spawn)
                .unwrap_or(spawn)
        };

        let components = tree.flatten();
        let mut grid = compose(&components, region.width as usize, region.height as usize);
        grow_walls(&mut grid);
        grid.set(spawn.x, spawn.y, Some(TerrainFeature::stairs_up(None)))?;
        grid.set(down.x, down.y, Some(TerrainFeature::stairs_down(None)))?;

        let terrain = grid.map(|cell| cell.unwrap_or(TerrainFeature::VOID));
        let mut level = GameMap::new(terrain).with_spawn(spawn);
        for component in &components {
            for spec in &component.entities {
                let mut spec = spec.clone();
                spec.position = spec.position + component.origin;
                let entity = materialize(&spec, &level)?;
                level.entities.push(entity);
            }
        }

        log::debug!(
            "BSP level: {} rooms, {} corridors, spawn at ({})",
            rooms.len(),
            components.len() - rooms.len(),
            spawn
        );
        Ok(level)
    }

    fn validate(&self, level: &GameMap, _config: &GenerationConfig) -> RockslikeResult<()> {
        utils::validate_level(level)?;
        utils::validate_connectivity(level)
    }

    fn generator_type(&self) -> &'static str {
        "BspGenerator"
    }
}

/// Generator producing one walled, empty room with a staircase down.
#[derive(Debug, Clone)]
pub struct EmptyBoxGenerator {
    pub width: u32,
    pub height: u32,
}

impl EmptyBoxGenerator {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for EmptyBoxGenerator {
    fn default() -> Self {
        Self::new(config::EMPTY_BOX_WIDTH, config::EMPTY_BOX_HEIGHT)
    }
}

impl Generator<GameMap> for EmptyBoxGenerator {
    fn generate(&self, _config: &GenerationConfig, _rng: &mut StdRng) -> RockslikeResult<GameMap> {
        if self.width < 4 || self.height < 3 {
            return Err(RockslikeError::GenerationFailed(format!(
                "{}x{} box is too small",
                self.width, self.height
            )));
        }
        let room = MapComponent::room_with_size(Position::origin(), self.width, self.height);
        let mut terrain = room.grid().map(|cell| cell.unwrap_or(TerrainFeature::VOID));
        let spawn = room.center();
        let down = Position::new(self.width as i32 - 2, self.height as i32 - 2);
        terrain.set(down.x, down.y, TerrainFeature::stairs_down(None))?;
        Ok(GameMap::new(terrain)
            .with_spawn(spawn)
            .with_name("The empty box"))
    }

    fn validate(&self, level: &GameMap, _config: &GenerationConfig) -> RockslikeResult<()> {
        utils::validate_level(level)
    }

    fn generator_type(&self) -> &'static str {
        "EmptyBoxGenerator"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CellQuery, FeatureKind};

    #[test]
    fn test_region_split() {
        let region = Region::new(Position::new(2, 3), 20, 10);
        let (left, right) = region.split(SplitAxis::Vertical, 8);
        assert_eq!(left, Region::new(Position::new(2, 3), 8, 10));
        assert_eq!(right, Region::new(Position::new(10, 3), 12, 10));

        let (top, bottom) = region.split(SplitAxis::Horizontal, 4);
        assert_eq!(top.height + bottom.height, 10);
        assert_eq!(bottom.origin, Position::new(2, 7));
    }

    #[test]
    fn test_split_axis_alternates() {
        assert_eq!(SplitAxis::for_depth(0), SplitAxis::Vertical);
        assert_eq!(SplitAxis::for_depth(1), SplitAxis::Horizontal);
        assert_eq!(SplitAxis::for_depth(4), SplitAxis::Vertical);
    }

    #[test]
    fn test_small_region_is_a_leaf() {
        let config = GenerationConfig::new(3);
        let mut rng = utils::create_rng(&config);
        let region = Region::new(Position::new(5, 5), 12, 30);
        let node = bsp(region, 0, &config, &mut rng).unwrap();
        match node {
            BspNode::Leaf { room, .. } => assert!(region.encloses(&room)),
            BspNode::Split { .. } => panic!("12 wide region must not split"),
        }
    }

    #[test]
    fn test_region_too_small_for_a_room() {
        let config = GenerationConfig::new(3);
        let mut rng = utils::create_rng(&config);
        let result = bsp(Region::new(Position::origin(), 4, 20), 0, &config, &mut rng);
        assert!(matches!(result, Err(RockslikeError::GenerationFailed(_))));
    }

    #[test]
    fn test_grow_walls_encloses_floor() {
        let mut grid: ComponentGrid = Grid::filled(3, 3, None);
        grid.set(1, 1, Some(TerrainFeature::floor())).unwrap();
        grow_walls(&mut grid);
        let walls = grid
            .iter_positions()
            .filter(|(_, cell)| matches!(cell, Some(f) if f.kind() == FeatureKind::Wall))
            .count();
        assert_eq!(walls, 8);
    }

    #[test]
    fn test_bsp_level_has_stairs_and_is_connected() {
        let config = GenerationConfig::for_testing(99);
        let mut rng = utils::create_rng(&config);
        let generator = BspGenerator::new();
        let level = generator.generate(&config, &mut rng).unwrap();

        assert_eq!(level.width(), 40);
        assert_eq!(level.height(), 30);
        assert_eq!(
            level.terrain_at(level.player_spawn).kind(),
            FeatureKind::StairsUp { destination: None }
        );
        let downs = level
            .terrain()
            .iter_positions()
            .filter(|(_, f)| matches!(f.kind(), FeatureKind::StairsDown { .. }))
            .count();
        assert_eq!(downs, 1);
        assert!(generator.validate(&level, &config).is_ok());
    }

    #[test]
    fn test_empty_box() {
        let config = GenerationConfig::default();
        let mut rng = utils::create_rng(&config);
        let generator = EmptyBoxGenerator::new(10, 6);
        let level = generator.generate(&config, &mut rng).unwrap();
        assert_eq!((level.width(), level.height()), (10, 6));
        assert_eq!(level.player_spawn, Position::new(5, 3));
        assert_eq!(level.terrain_at(Position::new(0, 0)).kind(), FeatureKind::Wall);
        assert!(level.terrain_at(Position::new(8, 4)).stair_direction().is_some());
        assert!(generator.validate(&level, &config).is_ok());

        assert!(EmptyBoxGenerator::new(2, 2).generate(&config, &mut rng).is_err());
    }
}
