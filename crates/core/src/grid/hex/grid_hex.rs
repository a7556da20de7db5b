//! A per-cell value wrapper over [HexagonalGrid], for callers that want
//! an object identity for one cube coordinate.

use crate::geom::ElevatedPoint;
use crate::grid::hex::{HexCube, HexagonalGrid};
use crate::grid::{Grid, GridCoordinates, GridOffset3D};
use std::cell::OnceCell;
use std::fmt;

/// One cell of a hexagonal grid. Purely a convenience value object: the
/// anchor points are computed lazily by delegating to the grid, and
/// equality is by offset tuple.
#[derive(Clone)]
pub struct GridHex<'g> {
    grid: &'g HexagonalGrid,
    offset: GridOffset3D,
    center: OnceCell<ElevatedPoint>,
    top_left: OnceCell<ElevatedPoint>,
}

impl<'g> GridHex<'g> {
    pub fn new(grid: &'g HexagonalGrid, coords: GridCoordinates) -> Self {
        Self {
            grid,
            offset: grid.offset(coords),
            center: OnceCell::new(),
            top_left: OnceCell::new(),
        }
    }

    pub fn offset(&self) -> GridOffset3D {
        self.offset
    }

    pub fn cube(&self) -> HexCube {
        self.grid.cube_of_offset(self.offset.planar())
    }

    pub fn center(&self) -> ElevatedPoint {
        *self
            .center
            .get_or_init(|| self.grid.center_point(self.offset.into()))
    }

    pub fn top_left(&self) -> ElevatedPoint {
        *self
            .top_left
            .get_or_init(|| self.grid.top_left_point(self.offset.into()))
    }

    /// The six in-plane neighboring cells.
    pub fn neighbors(&self) -> Vec<GridHex<'g>> {
        self.grid
            .adjacent_cubes(self.offset.into())
            .into_iter()
            .map(|cube| {
                let planar = self.grid.offset_of_cube(cube);
                GridHex::new(
                    self.grid,
                    GridOffset3D::new(planar.i, planar.j, self.offset.k)
                        .into(),
                )
            })
            .collect()
    }
}

impl fmt::Debug for GridHex<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GridHex")
            .field("offset", &self.offset)
            .field("cube", &self.cube())
            .finish()
    }
}

impl PartialEq for GridHex<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.offset == other.offset
    }
}

impl Eq for GridHex<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GridConfiguration;
    use crate::geom::Point;

    fn grid() -> HexagonalGrid {
        HexagonalGrid::new(GridConfiguration::new(100.0, 5.0).unwrap())
    }

    #[test]
    fn test_equality_by_offset() {
        let grid = grid();
        let by_offset =
            GridHex::new(&grid, GridOffset3D::new(0, 0, 0).into());
        let by_point = GridHex::new(&grid, Point::new(10.0, 10.0).into());
        assert_eq!(by_offset, by_point);
        assert_ne!(
            by_offset,
            GridHex::new(&grid, GridOffset3D::new(0, 1, 0).into())
        );
    }

    #[test]
    fn test_lazy_anchors_match_grid() {
        let grid = grid();
        let hex = GridHex::new(&grid, GridOffset3D::new(2, 1, 0).into());
        assert_eq!(
            hex.center(),
            grid.center_point(GridOffset3D::new(2, 1, 0).into())
        );
        assert_eq!(
            hex.top_left(),
            grid.top_left_point(GridOffset3D::new(2, 1, 0).into())
        );
        // Second read hits the cached value
        assert_eq!(hex.center(), hex.center());
    }

    #[test]
    fn test_neighbors() {
        let grid = grid();
        let hex = GridHex::new(&grid, GridOffset3D::new(0, 0, 0).into());
        let neighbors = hex.neighbors();
        assert_eq!(neighbors.len(), 6);
        for neighbor in &neighbors {
            assert_eq!(hex.cube().distance(neighbor.cube()), 1);
            assert_eq!(neighbor.offset().k, 0);
        }
    }
}
