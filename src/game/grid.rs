//! # Grid Storage
//!
//! A rectangular, row-major 2D container and the union primitive used to
//! compose partial maps (rooms, corridors) into complete levels.

use crate::{Position, RockslikeError, RockslikeResult};
use serde::{Deserialize, Serialize};

/// A generic 2D grid stored in a flat vector using row-major order.
///
/// Coordinates are signed; any lookup outside `[0, width) x [0, height)` simply
/// yields `None` instead of panicking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid<T> {
    width: usize,
    height: usize,
    cells: Vec<T>,
}

impl<T> Grid<T> {
    /// Creates a grid with every cell set to `value`.
    pub fn filled(width: usize, height: usize, value: T) -> Self
    where
        T: Clone,
    {
        Self {
            width,
            height,
            cells: vec![value; width * height],
        }
    }

    /// Creates a grid whose cells are produced by `f(x, y)`.
    pub fn from_generator<F>(width: usize, height: usize, mut f: F) -> Self
    where
        F: FnMut(usize, usize) -> T,
    {
        let mut cells = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                cells.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            cells,
        }
    }

    /// Builds a grid from nested rows.
    ///
    /// Fails if the rows are not all the same length.
    pub fn from_rows(rows: Vec<Vec<T>>) -> RockslikeResult<Self> {
        let height = rows.len();
        let width = rows.first().map(Vec::len).unwrap_or(0);
        if let Some(bad) = rows.iter().position(|row| row.len() != width) {
            return Err(RockslikeError::InvalidState(format!(
                "row {} has length {}, expected {}",
                bad,
                rows[bad].len(),
                width
            )));
        }
        Ok(Self {
            width,
            height,
            cells: rows.into_iter().flatten().collect(),
        })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns true if the grid has no cells at all.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Returns true if `(x, y)` lies inside the grid.
    #[inline]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    /// Returns true if `pos` lies inside the grid.
    pub fn contains_position(&self, pos: Position) -> bool {
        self.contains(pos.x, pos.y)
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if self.contains(x, y) {
            Some(y as usize * self.width + x as usize)
        } else {
            None
        }
    }

    /// Gets a reference to the cell at `(x, y)`.
    pub fn get(&self, x: i32, y: i32) -> Option<&T> {
        self.index(x, y).map(|i| &self.cells[i])
    }

    /// Gets a mutable reference to the cell at `(x, y)`.
    pub fn get_mut(&mut self, x: i32, y: i32) -> Option<&mut T> {
        self.index(x, y).map(move |i| &mut self.cells[i])
    }

    /// Replaces the cell at `(x, y)`.
    pub fn set(&mut self, x: i32, y: i32, value: T) -> RockslikeResult<()> {
        let (width, height) = (self.width, self.height);
        let cell = self.get_mut(x, y).ok_or_else(|| {
            RockslikeError::InvalidState(format!(
                "({}, {}) is outside a {}x{} grid",
                x, y, width, height
            ))
        })?;
        *cell = value;
        Ok(())
    }

    /// Iterates over the rows of the grid.
    pub fn rows(&self) -> impl Iterator<Item = &[T]> {
        // chunks() rejects a zero chunk size
        self.cells.chunks(self.width.max(1)).take(self.height)
    }

    /// Iterates over every cell along with its coordinates.
    pub fn iter_positions(&self) -> impl Iterator<Item = (Position, &T)> {
        let width = self.width.max(1);
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, cell)| (Position::new((i % width) as i32, (i / width) as i32), cell))
    }

    /// Applies `f` to every cell, keeping the shape.
    pub fn map<U, F>(&self, f: F) -> Grid<U>
    where
        F: FnMut(&T) -> U,
    {
        Grid {
            width: self.width,
            height: self.height,
            cells: self.cells.iter().map(f).collect(),
        }
    }
}

impl<T: Clone> Grid<Option<T>> {
    /// Overlays `b` onto `a`, with `b`'s top-left corner at `(x_offset, y_offset)`
    /// in `a`'s coordinate space.
    ///
    /// The result spans the bounding box of both extents. Offsets may be
    /// negative, in which case the result grows to the left or upwards and its
    /// `(0, 0)` cell corresponds to [`Grid::union_origin`] in `a`'s coordinates.
    /// Inside `b`'s translated extent every defined cell of `b` wins; undefined
    /// (`None`) cells of `b` are transparent and let `a` show through. Cells
    /// covered by neither grid are `None`.
    ///
    /// # Examples
    ///
    /// ```
    /// use rockslike::Grid;
    ///
    /// let a = Grid::filled(2, 1, Some('a'));
    /// let b = Grid::filled(1, 1, Some('b'));
    /// let merged = Grid::union(&a, &b, 3, 0);
    /// assert_eq!(merged.width(), 4);
    /// assert_eq!(merged.get(2, 0), Some(&None));
    /// assert_eq!(merged.get(3, 0), Some(&Some('b')));
    /// ```
    pub fn union(a: &Grid<Option<T>>, b: &Grid<Option<T>>, x_offset: i32, y_offset: i32) -> Self {
        let origin = Self::union_origin(x_offset, y_offset);
        let max_x = (a.width as i32).max(x_offset + b.width as i32);
        let max_y = (a.height as i32).max(y_offset + b.height as i32);
        let width = (max_x - origin.x).max(0) as usize;
        let height = (max_y - origin.y).max(0) as usize;

        Grid::from_generator(width, height, |rx, ry| {
            let ax = rx as i32 + origin.x;
            let ay = ry as i32 + origin.y;
            b.get(ax - x_offset, ay - y_offset)
                .and_then(|cell| cell.clone())
                .or_else(|| a.get(ax, ay).and_then(|cell| cell.clone()))
        })
    }

    /// Where the result of [`Grid::union`] starts, in the first grid's coordinates.
    pub fn union_origin(x_offset: i32, y_offset: i32) -> Position {
        Position::new(x_offset.min(0), y_offset.min(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn lettered(width: usize, height: usize, letter: char) -> Grid<Option<(char, usize, usize)>> {
        Grid::from_generator(width, height, |x, y| Some((letter, x, y)))
    }

    #[test]
    fn test_grid_bounds() {
        let grid = Grid::filled(3, 2, 0u8);
        assert!(grid.contains(2, 1));
        assert!(!grid.contains(3, 1));
        assert!(!grid.contains(-1, 0));
        assert_eq!(grid.get(0, 2), None);
        assert_eq!(grid.rows().count(), 2);
    }

    #[test]
    fn test_grid_set_and_get() {
        let mut grid = Grid::filled(3, 3, '.');
        grid.set(1, 2, '#').unwrap();
        assert_eq!(grid.get(1, 2), Some(&'#'));
        assert!(grid.set(5, 5, '#').is_err());
    }

    #[test]
    fn test_from_rows_rejects_ragged() {
        assert!(Grid::from_rows(vec![vec![1, 2], vec![3]]).is_err());
        let grid = Grid::from_rows(vec![vec![1, 2], vec![3, 4]]).unwrap();
        assert_eq!(grid.get(1, 1), Some(&4));
    }

    #[test]
    fn test_union_non_overlapping() {
        let a = lettered(2, 2, 'a');
        let b = lettered(2, 2, 'b');
        let merged = Grid::union(&a, &b, 3, 3);
        assert_eq!((merged.width(), merged.height()), (5, 5));
        assert_eq!(merged.get(0, 0), Some(&Some(('a', 0, 0))));
        assert_eq!(merged.get(2, 2), Some(&None));
        assert_eq!(merged.get(4, 4), Some(&Some(('b', 1, 1))));
    }

    #[test]
    fn test_union_fully_overlapping() {
        let a = lettered(4, 4, 'a');
        let b = lettered(2, 2, 'b');
        let merged = Grid::union(&a, &b, 1, 1);
        assert_eq!((merged.width(), merged.height()), (4, 4));
        assert_eq!(merged.get(1, 1), Some(&Some(('b', 0, 0))));
        assert_eq!(merged.get(3, 3), Some(&Some(('a', 3, 3))));
    }

    #[test]
    fn test_union_negative_offset() {
        let a = lettered(2, 2, 'a');
        let b = lettered(2, 2, 'b');
        let merged = Grid::union(&a, &b, -1, -3);
        assert_eq!(Grid::<Option<u8>>::union_origin(-1, -3), Position::new(-1, -3));
        assert_eq!((merged.width(), merged.height()), (3, 5));
        // b's (0, 0) lands on the result's (0, 0)
        assert_eq!(merged.get(0, 0), Some(&Some(('b', 0, 0))));
        // a's (1, 1) is at result (2, 4)
        assert_eq!(merged.get(2, 4), Some(&Some(('a', 1, 1))));
    }

    #[test]
    fn test_union_undefined_b_cells_are_transparent() {
        let a = lettered(3, 1, 'a');
        let mut b = lettered(3, 1, 'b');
        b.set(1, 0, None).unwrap();
        let merged = Grid::union(&a, &b, 0, 0);
        assert_eq!(merged.get(0, 0), Some(&Some(('b', 0, 0))));
        assert_eq!(merged.get(1, 0), Some(&Some(('a', 1, 0))));
    }

    #[test]
    fn test_union_from_empty_anchors_at_origin() {
        let empty: Grid<Option<u8>> = Grid::filled(0, 0, None);
        let b = Grid::filled(2, 2, Some(1u8));
        let merged = Grid::union(&empty, &b, 3, 1);
        assert_eq!((merged.width(), merged.height()), (5, 3));
        assert_eq!(merged.get(0, 0), Some(&None));
        assert_eq!(merged.get(3, 1), Some(&Some(1)));
    }

    proptest! {
        #[test]
        fn prop_union_matches_bounding_box_and_sources(
            aw in 0usize..8, ah in 0usize..8,
            bw in 0usize..8, bh in 0usize..8,
            ox in -10i32..10, oy in -10i32..10,
            holes in any::<u64>(),
        ) {
            let a = lettered(aw, ah, 'a');
            // Bit `x + 8 * y` of `holes` leaves that cell of b undefined.
            let b = Grid::from_generator(bw, bh, |x, y| {
                (holes >> (x + 8 * y) & 1 == 0).then_some(('b', x, y))
            });
            let merged = Grid::union(&a, &b, ox, oy);
            let origin = Grid::<Option<(char, usize, usize)>>::union_origin(ox, oy);

            let min_x = 0.min(ox);
            let min_y = 0.min(oy);
            let max_x = (aw as i32).max(ox + bw as i32);
            let max_y = (ah as i32).max(oy + bh as i32);
            prop_assert_eq!(merged.width() as i32, max_x - min_x);
            prop_assert_eq!(merged.height() as i32, max_y - min_y);
            prop_assert_eq!(merged.rows().filter(|r| r.len() != merged.width()).count(), 0);

            for (pos, cell) in merged.iter_positions() {
                let ax = pos.x + origin.x;
                let ay = pos.y + origin.y;
                let from_b = b.get(ax - ox, ay - oy).and_then(|cell| cell.as_ref());
                let from_a = a.get(ax, ay).and_then(|cell| cell.as_ref());
                match (from_b, from_a) {
                    (Some(expected), _) => prop_assert_eq!(cell.as_ref(), Some(expected)),
                    (None, Some(expected)) => {
                        // Either outside b or one of its holes: a shows through.
                        prop_assert_eq!(cell.as_ref(), Some(expected));
                    }
                    (None, None) => prop_assert_eq!(cell, &None),
                }
            }
        }
    }
}
