//! Battlegrid is the coordinate-geometry core for tabletop battle maps:
//! converting between continuous pixel coordinates and discrete grid
//! cells, measuring distances and costs along multi-waypoint paths,
//! computing adjacency and direct cell paths, and snapping points to
//! canonical grid-aligned positions. Three topologies (gridless, square,
//! hexagonal) sit behind the one [Grid] contract. Rendering, persistence
//! and game rules are implemented elsewhere, on top of this crate.
//!
//! ```
//! use battlegrid::{
//!     DiagonalRule, Grid, GridConfiguration, GridType, Point, SceneGrid,
//! };
//!
//! let config = GridConfiguration::new(100.0, 5.0)
//!     .unwrap()
//!     .with_diagonals(DiagonalRule::Equidistant);
//! let grid = SceneGrid::new(GridType::Square, config);
//! let path = grid.measure_path(&[
//!     Point::new(0.0, 0.0).into(),
//!     Point::new(300.0, 400.0).into(),
//! ]);
//! assert_eq!(path.spaces(), 4);
//! assert_eq!(path.distance(), 20.0);
//! ```
//!
//! See [GridConfiguration] for the knobs (cell size, distance per cell,
//! diagonal rule, hex orientation and parity) and [Grid] for the full
//! per-topology contract.

mod config;
pub mod geom;
pub mod grid;

pub use crate::{
    config::{DiagonalRule, GridConfiguration, GridType},
    geom::{ElevatedPoint, Point, Rectangle},
    grid::{
        Grid, GridCoordinates, GridDimensions, GridOffset2D, GridOffset3D,
        GridlessGrid, HexagonalGrid, MoveDirection, OffsetRange,
        PathMeasurement, PathWaypoint, SceneGrid, SegmentCost, SnapMode,
        SnappingBehavior, SquareGrid,
    },
};
