//! The grid contract and its three topologies (gridless, square,
//! hexagonal), behind one uniform interface.
//!
//! Callers construct one concrete grid from scene configuration (usually
//! via [SceneGrid]) and talk to it through the [Grid] trait. The parts of
//! path measurement and cone generation that are identical across
//! topologies live in provided trait methods; everything coordinate-math
//! flavored is delegated to the concrete type.

mod gridless;
pub mod hex;
mod measure;
mod snap;
mod square;

pub use self::{
    gridless::GridlessGrid,
    hex::{GridHex, HexagonalGrid},
    measure::{
        MeasureState, Measurement, MeasuredWaypoint, PathMeasurement,
        PathWaypoint, SegmentCost, SegmentMeasurement,
    },
    snap::{SnapMode, SnappingBehavior},
    square::SquareGrid,
};

use crate::config::{GridConfiguration, GridType};
use crate::geom::{
    line_segment_intersection, ElevatedPoint, Point, Rectangle,
};
use bitflags::bitflags;
use derive_more::{Add, Display, Sub};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Integer address of one grid cell: row `i`, column `j`.
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    Display,
    Add,
    Sub,
    Serialize,
    Deserialize,
)]
#[display(fmt = "({}, {})", i, j)]
pub struct GridOffset2D {
    pub i: i32,
    pub j: i32,
}

impl GridOffset2D {
    pub const fn new(i: i32, j: i32) -> Self {
        Self { i, j }
    }
}

/// Integer address of one grid cell with a vertical layer: row `i`,
/// column `j`, elevation layer `k`. Two offsets address the same cell iff
/// all components are equal.
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    Display,
    Add,
    Sub,
    Serialize,
    Deserialize,
)]
#[display(fmt = "({}, {}, {})", i, j, k)]
pub struct GridOffset3D {
    pub i: i32,
    pub j: i32,
    pub k: i32,
}

impl GridOffset3D {
    pub const fn new(i: i32, j: i32, k: i32) -> Self {
        Self { i, j, k }
    }

    /// Drop the vertical layer.
    pub fn planar(self) -> GridOffset2D {
        GridOffset2D::new(self.i, self.j)
    }
}

impl From<GridOffset2D> for GridOffset3D {
    fn from(offset: GridOffset2D) -> Self {
        Self::new(offset.i, offset.j, 0)
    }
}

/// Argument type for the methods that accept either a continuous point or
/// an already-discrete offset. `Grid::offset` is the identity on the
/// offset variant.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum GridCoordinates {
    Offset(GridOffset3D),
    Point(ElevatedPoint),
}

impl From<GridOffset2D> for GridCoordinates {
    fn from(offset: GridOffset2D) -> Self {
        Self::Offset(offset.into())
    }
}

impl From<GridOffset3D> for GridCoordinates {
    fn from(offset: GridOffset3D) -> Self {
        Self::Offset(offset)
    }
}

impl From<Point> for GridCoordinates {
    fn from(point: Point) -> Self {
        Self::Point(point.into())
    }
}

impl From<ElevatedPoint> for GridCoordinates {
    fn from(point: ElevatedPoint) -> Self {
        Self::Point(point)
    }
}

bitflags! {
    /// A compass + vertical movement direction. Diagonal directions are
    /// unions of two horizontal flags (e.g. `NORTH | EAST`).
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct MoveDirection: u8 {
        const NORTH = 0x01;
        const SOUTH = 0x02;
        const EAST = 0x04;
        const WEST = 0x08;
        const ASCEND = 0x10;
        const DESCEND = 0x20;
    }
}

impl MoveDirection {
    /// Signed `(di, dj, dk)` deltas of one step in this direction.
    /// Opposing flags cancel.
    pub fn deltas(self) -> (i32, i32, i32) {
        let di = i32::from(self.contains(Self::SOUTH))
            - i32::from(self.contains(Self::NORTH));
        let dj = i32::from(self.contains(Self::EAST))
            - i32::from(self.contains(Self::WEST));
        let dk = i32::from(self.contains(Self::ASCEND))
            - i32::from(self.contains(Self::DESCEND));
        (di, dj, dk)
    }

    /// Whether the horizontal component of this direction is diagonal
    /// (moves both axes).
    pub fn is_diagonal(self) -> bool {
        let (di, dj, _) = self.deltas();
        di != 0 && dj != 0
    }
}

impl Serialize for MoveDirection {
    fn serialize<S: Serializer>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.bits())
    }
}

impl<'de> Deserialize<'de> for MoveDirection {
    fn deserialize<D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Self, D::Error> {
        let bits = u8::deserialize(deserializer)?;
        MoveDirection::from_bits(bits).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "invalid movement direction bits: {bits:#x}"
            ))
        })
    }
}

/// Canvas dimensions computed from a scene size plus proportional padding.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GridDimensions {
    /// Total canvas width in pixels, including padding on both sides.
    pub width: f64,
    /// Total canvas height in pixels, including padding on both sides.
    pub height: f64,
    /// X position of the scene rectangle within the canvas.
    pub x: f64,
    /// Y position of the scene rectangle within the canvas.
    pub y: f64,
    /// Number of cell rows covering the canvas.
    pub rows: i32,
    /// Number of cell columns covering the canvas.
    pub columns: i32,
}

/// Half-open range of offsets `[i0, i1) x [j0, j1)` covering a pixel
/// rectangle. Empty rectangles produce `i0 == i1` and `j0 == j1`.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub struct OffsetRange {
    pub i0: i32,
    pub j0: i32,
    pub i1: i32,
    pub j1: i32,
}

impl OffsetRange {
    pub const fn new(i0: i32, j0: i32, i1: i32, j1: i32) -> Self {
        Self { i0, j0, i1, j1 }
    }

    pub fn is_empty(&self) -> bool {
        self.i0 >= self.i1 || self.j0 >= self.j1
    }
}

/// The uniform contract every grid topology satisfies.
///
/// The provided methods ([Grid::measure_path], [Grid::cone]) are the
/// template logic shared by all topologies; the required methods are the
/// per-topology coordinate math.
pub trait Grid {
    /// The immutable configuration this grid was constructed with.
    fn configuration(&self) -> &GridConfiguration;

    /// Which topology this is.
    fn grid_type(&self) -> GridType;

    /// Total canvas size after applying proportional `padding` (a fraction
    /// of the scene size, rounded up to whole cells), with the row/column
    /// counts consistent with this topology's cell packing.
    fn dimensions(
        &self,
        scene_width: f64,
        scene_height: f64,
        padding: f64,
    ) -> GridDimensions;

    /// The cell containing the given coordinates. Idempotent on offsets.
    fn offset(&self, coords: GridCoordinates) -> GridOffset3D;

    /// The smallest offset range covering every cell that intersects the
    /// pixel rectangle.
    fn offset_range(&self, rectangle: Rectangle) -> OffsetRange;

    /// All neighbors of the given cell under the current diagonal rule.
    /// Empty for gridless grids.
    fn adjacent_offsets(&self, coords: GridCoordinates) -> Vec<GridOffset3D>;

    /// Whether the two cells are neighbors under the current diagonal
    /// rule. Always false for gridless grids.
    fn is_adjacent(&self, a: GridCoordinates, b: GridCoordinates) -> bool;

    /// The cell one step in `direction` from the given cell. If the
    /// diagonal rule forbids diagonals and the direction is diagonal, the
    /// horizontal movement is suppressed (vertical movement still
    /// applies).
    fn shifted_offset(
        &self,
        coords: GridCoordinates,
        direction: MoveDirection,
    ) -> GridOffset3D;

    /// The point moved by exactly one cell in `direction`, with the same
    /// diagonal suppression as [Grid::shifted_offset].
    fn shifted_point(
        &self,
        point: ElevatedPoint,
        direction: MoveDirection,
    ) -> ElevatedPoint;

    /// The top-left anchor point of the cell (identity for gridless).
    fn top_left_point(&self, coords: GridCoordinates) -> ElevatedPoint;

    /// The center point of the cell (identity for gridless).
    fn center_point(&self, coords: GridCoordinates) -> ElevatedPoint;

    /// The polygon outline of one cell relative to its center. Empty for
    /// gridless grids.
    fn shape(&self) -> Vec<Point>;

    /// The absolute polygon outline of the given cell. Empty for gridless
    /// grids.
    fn vertices(&self, coords: GridCoordinates) -> Vec<Point>;

    /// The nearest point satisfying the snapping behavior. An empty mode
    /// returns the input unchanged, except that elevation is still
    /// snapped to the nearest layer.
    fn snapped_point(
        &self,
        point: ElevatedPoint,
        behavior: SnappingBehavior,
    ) -> ElevatedPoint;

    /// Fill in the numeric measurements of one path segment. This is the
    /// per-topology half of [Grid::measure_path]; callers normally want
    /// that instead.
    fn measure_segment(
        &self,
        from: ElevatedPoint,
        to: ElevatedPoint,
        state: &mut MeasureState,
    ) -> SegmentMeasurement;

    /// The canonical minimal sequence of cells visited walking straight
    /// through the waypoints. Consecutive duplicates are collapsed.
    fn direct_path(&self, waypoints: &[GridCoordinates]) -> Vec<GridOffset3D>;

    /// Translate a point by `distance` game units at `direction` degrees
    /// (0° = +x, clockwise in screen coordinates), accounting for the
    /// diagonal rule's effect on per-axis cost.
    fn translated_point(
        &self,
        point: ElevatedPoint,
        direction: f64,
        distance: f64,
    ) -> ElevatedPoint;

    /// Polygon approximating a circle of `radius` game units under this
    /// grid's distance metric, centered on `center`. Vertices are emitted
    /// in increasing angle order around the center. Empty for zero or
    /// negative radius.
    fn circle(&self, center: Point, radius: f64) -> Vec<Point>;

    /// Measure a multi-waypoint path. See [PathWaypoint] for the
    /// per-waypoint flags and cost overrides.
    fn measure_path(&self, waypoints: &[PathWaypoint]) -> PathMeasurement {
        measure::measure_path_impl(self, waypoints)
    }

    /// Polygon of a cone: the circle of `radius` clipped to an angular
    /// sector of `angle` degrees centered on `direction` degrees. A full
    /// 360° angle returns the circle unchanged; zero radius or angle
    /// returns an empty polygon.
    fn cone(
        &self,
        origin: Point,
        radius: f64,
        direction: f64,
        angle: f64,
    ) -> Vec<Point> {
        if radius <= 0.0 || angle <= 0.0 {
            return Vec::new();
        }
        let circle = self.circle(origin, radius);
        if angle >= 360.0 {
            return circle;
        }

        let start = (direction - angle / 2.0).to_radians();
        let sweep = angle.to_radians();

        // The boundary rays must reach past the polygon from its center
        let reach = circle
            .iter()
            .map(|vertex| vertex.distance_to(origin))
            .fold(0.0, f64::max)
            * 2.0;
        let boundary_hit = |angle_radians: f64| -> Option<Point> {
            let far = Point::new(
                origin.x + reach * angle_radians.cos(),
                origin.y + reach * angle_radians.sin(),
            );
            (0..circle.len()).find_map(|idx| {
                let a = circle[idx];
                let b = circle[(idx + 1) % circle.len()];
                line_segment_intersection(origin, far, a, b)
            })
        };

        // Angular position of a vertex within the sector, in [0, 2π)
        let relative = |vertex: Point| -> f64 {
            let angle_radians =
                (vertex.y - origin.y).atan2(vertex.x - origin.x);
            (angle_radians - start).rem_euclid(std::f64::consts::TAU)
        };

        let mut points = vec![origin];
        points.extend(boundary_hit(start));
        // Circle vertices are ordered by angle, so sorting by sector
        // position preserves the outline order
        let mut within: Vec<(f64, Point)> = circle
            .iter()
            .filter_map(|&vertex| {
                let position = relative(vertex);
                (position <= sweep).then_some((position, vertex))
            })
            .collect();
        within.sort_by(|a, b| a.0.total_cmp(&b.0));
        points.extend(within.into_iter().map(|(_, vertex)| vertex));
        points.extend(boundary_hit(start + sweep));

        // Drop consecutive near-duplicates (a boundary ray can pass
        // exactly through a polygon vertex)
        points.dedup_by(|a, b| a.distance_squared(*b) < 1e-12);
        points
    }
}

/// One grid of any topology, selected once from scene configuration and
/// stored as an owned tagged value.
#[derive(Clone, Debug)]
pub enum SceneGrid {
    Gridless(GridlessGrid),
    Square(SquareGrid),
    Hexagonal(HexagonalGrid),
}

impl SceneGrid {
    /// Build the grid matching the persisted scene configuration.
    pub fn new(grid_type: GridType, config: GridConfiguration) -> Self {
        match grid_type {
            GridType::Gridless => Self::Gridless(GridlessGrid::new(config)),
            GridType::Square => Self::Square(SquareGrid::new(config)),
            GridType::Hexagonal => {
                Self::Hexagonal(HexagonalGrid::new(config))
            }
        }
    }
}

macro_rules! delegate {
    ($self:ident, $grid:ident => $body:expr) => {
        match $self {
            SceneGrid::Gridless($grid) => $body,
            SceneGrid::Square($grid) => $body,
            SceneGrid::Hexagonal($grid) => $body,
        }
    };
}

impl Grid for SceneGrid {
    fn configuration(&self) -> &GridConfiguration {
        delegate!(self, grid => grid.configuration())
    }

    fn grid_type(&self) -> GridType {
        delegate!(self, grid => grid.grid_type())
    }

    fn dimensions(
        &self,
        scene_width: f64,
        scene_height: f64,
        padding: f64,
    ) -> GridDimensions {
        delegate!(self, grid => grid.dimensions(scene_width, scene_height, padding))
    }

    fn offset(&self, coords: GridCoordinates) -> GridOffset3D {
        delegate!(self, grid => grid.offset(coords))
    }

    fn offset_range(&self, rectangle: Rectangle) -> OffsetRange {
        delegate!(self, grid => grid.offset_range(rectangle))
    }

    fn adjacent_offsets(&self, coords: GridCoordinates) -> Vec<GridOffset3D> {
        delegate!(self, grid => grid.adjacent_offsets(coords))
    }

    fn is_adjacent(&self, a: GridCoordinates, b: GridCoordinates) -> bool {
        delegate!(self, grid => grid.is_adjacent(a, b))
    }

    fn shifted_offset(
        &self,
        coords: GridCoordinates,
        direction: MoveDirection,
    ) -> GridOffset3D {
        delegate!(self, grid => grid.shifted_offset(coords, direction))
    }

    fn shifted_point(
        &self,
        point: ElevatedPoint,
        direction: MoveDirection,
    ) -> ElevatedPoint {
        delegate!(self, grid => grid.shifted_point(point, direction))
    }

    fn top_left_point(&self, coords: GridCoordinates) -> ElevatedPoint {
        delegate!(self, grid => grid.top_left_point(coords))
    }

    fn center_point(&self, coords: GridCoordinates) -> ElevatedPoint {
        delegate!(self, grid => grid.center_point(coords))
    }

    fn shape(&self) -> Vec<Point> {
        delegate!(self, grid => grid.shape())
    }

    fn vertices(&self, coords: GridCoordinates) -> Vec<Point> {
        delegate!(self, grid => grid.vertices(coords))
    }

    fn snapped_point(
        &self,
        point: ElevatedPoint,
        behavior: SnappingBehavior,
    ) -> ElevatedPoint {
        delegate!(self, grid => grid.snapped_point(point, behavior))
    }

    fn measure_segment(
        &self,
        from: ElevatedPoint,
        to: ElevatedPoint,
        state: &mut MeasureState,
    ) -> SegmentMeasurement {
        delegate!(self, grid => grid.measure_segment(from, to, state))
    }

    fn direct_path(&self, waypoints: &[GridCoordinates]) -> Vec<GridOffset3D> {
        delegate!(self, grid => grid.direct_path(waypoints))
    }

    fn translated_point(
        &self,
        point: ElevatedPoint,
        direction: f64,
        distance: f64,
    ) -> ElevatedPoint {
        delegate!(self, grid => grid.translated_point(point, direction, distance))
    }

    fn circle(&self, center: Point, radius: f64) -> Vec<Point> {
        delegate!(self, grid => grid.circle(center, radius))
    }
}

/// The elevation layer containing the given elevation (game units),
/// rounding half up.
pub(crate) fn elevation_layer(
    config: &GridConfiguration,
    elevation: f64,
) -> i32 {
    (elevation / config.distance() + 0.5).floor() as i32
}

/// The canonical elevation of a layer.
pub(crate) fn layer_elevation(config: &GridConfiguration, k: i32) -> f64 {
    f64::from(k) * config.distance()
}

/// Shared [Grid::dimensions] implementation for the grids whose cells
/// pack in a plain rectangular lattice (gridless and square). Padding is
/// a fraction of the scene size, rounded up to whole cells.
pub(crate) fn rectangular_dimensions(
    config: &GridConfiguration,
    scene_width: f64,
    scene_height: f64,
    padding: f64,
) -> GridDimensions {
    let size = config.size();
    let pad_x = ((padding * scene_width) / size).ceil() * size;
    let pad_y = ((padding * scene_height) / size).ceil() * size;
    let width = scene_width + 2.0 * pad_x;
    let height = scene_height + 2.0 * pad_y;
    GridDimensions {
        width,
        height,
        x: pad_x,
        y: pad_y,
        rows: (height / size).ceil() as i32,
        columns: (width / size).ceil() as i32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_direction_deltas() {
        assert_eq!(MoveDirection::NORTH.deltas(), (-1, 0, 0));
        assert_eq!(
            (MoveDirection::SOUTH | MoveDirection::EAST).deltas(),
            (1, 1, 0)
        );
        assert_eq!(
            (MoveDirection::NORTH | MoveDirection::SOUTH).deltas(),
            (0, 0, 0)
        );
        assert_eq!(
            (MoveDirection::ASCEND | MoveDirection::WEST).deltas(),
            (0, -1, 1)
        );
        assert!((MoveDirection::NORTH | MoveDirection::EAST).is_diagonal());
        assert!(!MoveDirection::NORTH.is_diagonal());
    }

    #[test]
    fn test_offset_range_empty() {
        assert!(OffsetRange::new(2, 3, 2, 5).is_empty());
        assert!(!OffsetRange::new(2, 3, 4, 5).is_empty());
    }

    #[test]
    fn test_offset_equality_is_componentwise() {
        assert_eq!(GridOffset3D::new(1, 2, 3), GridOffset3D::new(1, 2, 3));
        assert_ne!(GridOffset3D::new(1, 2, 3), GridOffset3D::new(1, 2, 0));
    }
}
