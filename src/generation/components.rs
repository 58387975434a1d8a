//! # Map Components
//!
//! Partial maps used while generating a level: rooms, corridors, and any
//! composition of them. A component's grid uses local coordinates; `origin`
//! places its `(0, 0)` cell in world space. Undefined cells (`None`) belong
//! to no component and let whatever lies underneath show through.

use crate::{EntitySpec, Grid, Position, TerrainFeature};
use rand::rngs::StdRng;
use rand::Rng;
use std::ops::Range;

/// Terrain grid of a component; `None` marks undefined cells.
pub type ComponentGrid = Grid<Option<TerrainFeature>>;

#[derive(Debug, Clone, PartialEq)]
pub struct MapComponent {
    /// World-space position of the local `(0, 0)` cell
    pub origin: Position,
    grid: ComponentGrid,
    /// Entities, in component-local coordinates
    pub entities: Vec<EntitySpec>,
}

impl MapComponent {
    pub fn new(origin: Position, grid: ComponentGrid) -> Self {
        Self {
            origin,
            grid,
            entities: Vec::new(),
        }
    }

    /// A rectangular room of exactly `width` x `height` cells, walls included.
    pub fn room_with_size(origin: Position, width: u32, height: u32) -> Self {
        let (width, height) = (width as usize, height as usize);
        let grid = Grid::from_generator(width, height, |x, y| {
            if x == 0 || y == 0 || x + 1 == width || y + 1 == height {
                Some(TerrainFeature::wall())
            } else {
                Some(TerrainFeature::floor())
            }
        });
        Self::new(origin, grid)
    }

    /// A room with random dimensions drawn from the half-open ranges.
    pub fn room(
        rng: &mut StdRng,
        origin: Position,
        width_range: Range<u32>,
        height_range: Range<u32>,
    ) -> Self {
        let width = rng.gen_range(width_range);
        let height = rng.gen_range(height_range);
        Self::room_with_size(origin, width, height)
    }

    /// A one-cell-wide floor path from `start` to `end`.
    ///
    /// The path is straight when the points share a row or column, otherwise
    /// it runs horizontally first and bends once at `(end.x, start.y)`. Cells
    /// off the path are undefined.
    pub fn corridor(start: Position, end: Position) -> Self {
        let origin = Position::new(start.x.min(end.x), start.y.min(end.y));
        let width = (start.x - end.x).unsigned_abs() as usize + 1;
        let height = (start.y - end.y).unsigned_abs() as usize + 1;
        let mut grid = Grid::filled(width, height, None);

        let (x_lo, x_hi) = (start.x.min(end.x), start.x.max(end.x));
        let (y_lo, y_hi) = (start.y.min(end.y), start.y.max(end.y));
        let path = (x_lo..=x_hi)
            .map(|x| Position::new(x, start.y))
            .chain((y_lo..=y_hi).map(|y| Position::new(end.x, y)));
        for cell in path {
            let local = cell - origin;
            if let Some(slot) = grid.get_mut(local.x, local.y) {
                *slot = Some(TerrainFeature::floor());
            }
        }
        Self::new(origin, grid)
    }

    pub fn width(&self) -> usize {
        self.grid.width()
    }

    pub fn height(&self) -> usize {
        self.grid.height()
    }

    pub fn grid(&self) -> &ComponentGrid {
        &self.grid
    }

    /// World-space centre cell.
    pub fn center(&self) -> Position {
        self.origin
            .offset(self.width() as i32 / 2, self.height() as i32 / 2)
    }

    /// Feature at a world-space position, if this component defines one.
    pub fn feature_at(&self, world: Position) -> Option<&TerrainFeature> {
        let local = world - self.origin;
        self.grid.get(local.x, local.y).and_then(Option::as_ref)
    }

    /// World-space positions of every walkable cell.
    pub fn floor_positions(&self) -> Vec<Position> {
        self.grid
            .iter_positions()
            .filter(|(_, cell)| cell.map_or(false, |feature| feature.is_passable()))
            .map(|(local, _)| local + self.origin)
            .collect()
    }

    /// Whether the bounding boxes of the two components intersect.
    pub fn bounds_overlap(&self, other: &MapComponent) -> bool {
        let horizontal = self.origin.x < other.origin.x + other.width() as i32
            && other.origin.x < self.origin.x + self.width() as i32;
        let vertical = self.origin.y < other.origin.y + other.height() as i32
            && other.origin.y < self.origin.y + self.height() as i32;
        horizontal && vertical
    }

    /// Whether both components define a cell at some shared world position.
    pub fn tiles_overlap(&self, other: &MapComponent) -> bool {
        if !self.bounds_overlap(other) {
            return false;
        }
        let left = self.origin.x.max(other.origin.x);
        let top = self.origin.y.max(other.origin.y);
        let right = (self.origin.x + self.width() as i32).min(other.origin.x + other.width() as i32);
        let bottom =
            (self.origin.y + self.height() as i32).min(other.origin.y + other.height() as i32);

        (top..bottom).any(|y| {
            (left..right).any(|x| {
                let world = Position::new(x, y);
                self.feature_at(world).is_some() && other.feature_at(world).is_some()
            })
        })
    }

    /// A component spanning both, with `other` drawn over `self`.
    ///
    /// Entity positions are translated into the merged component's local
    /// space; `self`'s entities come first.
    pub fn merge(&self, other: &MapComponent) -> MapComponent {
        let offset = other.origin - self.origin;
        let grid = Grid::union(&self.grid, &other.grid, offset.x, offset.y);
        let origin = self.origin + ComponentGrid::union_origin(offset.x, offset.y);

        let mut entities = Vec::with_capacity(self.entities.len() + other.entities.len());
        for component in [self, other] {
            let delta = component.origin - origin;
            for spec in &component.entities {
                let mut spec = spec.clone();
                spec.position = spec.position + delta;
                entities.push(spec);
            }
        }

        MapComponent {
            origin,
            grid,
            entities,
        }
    }
}
