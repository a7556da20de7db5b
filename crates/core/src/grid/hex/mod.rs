//! The hexagonal topology, in both orientations (pointy-top rows and
//! flat-top columns) and both stagger parities.
//!
//! Three coordinate systems are in play: continuous pixel points, integer
//! offsets (row/column, what the rest of the crate speaks), and cube
//! coordinates (see [cube]) in which neighbor and distance math is
//! trivial. All conversions are exact closed forms parametrized by the
//! configuration's `columns` and `even` flags.

mod cube;
mod grid_hex;
mod shape;
mod snap;

pub use self::{
    cube::{FractionalHexCube, HexCube},
    grid_hex::GridHex,
    shape::{HexFootprint, HexShapeKind},
};

use crate::config::{DiagonalRule, GridConfiguration, GridType};
use crate::geom::{ElevatedPoint, Point, Rectangle};
use crate::grid::{
    elevation_layer, layer_elevation, Grid, GridCoordinates, GridDimensions,
    GridOffset2D, GridOffset3D, MeasureState, MoveDirection, OffsetRange,
    SegmentMeasurement, SnappingBehavior,
};
use std::sync::Arc;

/// `3.0_f64.sqrt()` is not const-stable, so the lattice constant is
/// spelled out.
const SQRT_3: f64 = 1.732_050_807_568_877_2;

/// A grid of regular hexagons. `size` is the distance across parallel
/// sides; the circumradius (center to vertex) is `size / √3`.
#[derive(Clone, Debug)]
pub struct HexagonalGrid {
    config: GridConfiguration,
}

impl HexagonalGrid {
    pub fn new(config: GridConfiguration) -> Self {
        Self { config }
    }

    /// Center-to-vertex distance in pixels.
    fn circumradius(&self) -> f64 {
        self.config.size() / SQRT_3
    }

    /// Center-to-center spacing along the staggered axis (rows for
    /// pointy-top, columns for flat-top).
    fn main_spacing(&self) -> f64 {
        1.5 * self.circumradius()
    }

    /// Whether row (pointy-top) or column (flat-top) `n` is the one
    /// shifted by half a cell.
    fn is_staggered(&self, n: i32) -> bool {
        (n.rem_euclid(2) == 0) == self.config.even()
    }

    /// Half of `(n ± parity)`, the column correction between offset and
    /// cube coordinates. Exact for negative `n` as well.
    fn stagger_correction(&self, n: i32) -> i32 {
        let parity = n.rem_euclid(2);
        if self.config.even() {
            (n + parity) / 2
        } else {
            (n - parity) / 2
        }
    }

    pub fn cube_of_offset(&self, offset: GridOffset2D) -> HexCube {
        if self.config.columns() {
            HexCube::new(
                offset.j,
                offset.i - self.stagger_correction(offset.j),
            )
        } else {
            HexCube::new(
                offset.j - self.stagger_correction(offset.i),
                offset.i,
            )
        }
    }

    pub fn offset_of_cube(&self, cube: HexCube) -> GridOffset2D {
        if self.config.columns() {
            GridOffset2D::new(
                cube.r + self.stagger_correction(cube.q),
                cube.q,
            )
        } else {
            GridOffset2D::new(
                cube.r,
                cube.q + self.stagger_correction(cube.r),
            )
        }
    }

    /// Pixel center of an integer cube.
    pub fn cube_to_point(&self, cube: HexCube) -> Point {
        let size = self.config.size();
        let radius = self.circumradius();
        let stagger_origin =
            if self.config.even() { size / 2.0 } else { 0.0 };
        let (q, r) = (f64::from(cube.q), f64::from(cube.r));
        if self.config.columns() {
            Point::new(
                1.5 * radius * q + radius,
                size * (r + q / 2.0) + size / 2.0 + stagger_origin,
            )
        } else {
            Point::new(
                size * (q + r / 2.0) + size / 2.0 + stagger_origin,
                1.5 * radius * r + radius,
            )
        }
    }

    /// Fractional cube containing a pixel point, before rounding.
    pub fn point_to_cube(&self, point: Point) -> FractionalHexCube {
        let size = self.config.size();
        let radius = self.circumradius();
        let stagger_origin =
            if self.config.even() { size / 2.0 } else { 0.0 };
        if self.config.columns() {
            let q = (point.x - radius) / (1.5 * radius);
            let r = (point.y - size / 2.0 - stagger_origin) / size - q / 2.0;
            FractionalHexCube::new(q, r)
        } else {
            let r = (point.y - radius) / (1.5 * radius);
            let q = (point.x - size / 2.0 - stagger_origin) / size - r / 2.0;
            FractionalHexCube::new(q, r)
        }
    }

    /// The six in-plane neighbor cubes, always exactly 6 at cube
    /// distance 1.
    pub fn adjacent_cubes(&self, coords: GridCoordinates) -> [HexCube; 6] {
        self.cube_of_offset(self.offset(coords).planar()).neighbors()
    }

    /// The multi-cell token footprint of the given dimensions, memoized
    /// globally by its structural key. `anchor_row_staggered` selects
    /// which stagger parity the anchor cell sits on.
    pub fn footprint(
        &self,
        width: u32,
        height: u32,
        kind: HexShapeKind,
        anchor_staggered: bool,
    ) -> anyhow::Result<Arc<HexFootprint>> {
        shape::footprint(self, width, height, kind, anchor_staggered)
    }

    /// 2D offset of a pixel point by staggered row/column binning. The
    /// bins tile exactly, so the origin corner of cell `(0, 0)` maps to
    /// `(0, 0)` and every cell center maps back to its own cell.
    fn offset_2d(&self, point: Point) -> GridOffset2D {
        let size = self.config.size();
        let spacing = self.main_spacing();
        if self.config.columns() {
            let j = (point.x / spacing).floor() as i32;
            let shift =
                if self.is_staggered(j) { size / 2.0 } else { 0.0 };
            let i = ((point.y - shift) / size).floor() as i32;
            GridOffset2D::new(i, j)
        } else {
            let i = (point.y / spacing).floor() as i32;
            let shift =
                if self.is_staggered(i) { size / 2.0 } else { 0.0 };
            let j = ((point.x - shift) / size).floor() as i32;
            GridOffset2D::new(i, j)
        }
    }

    fn top_left_2d(&self, offset: GridOffset2D) -> Point {
        let size = self.config.size();
        let spacing = self.main_spacing();
        if self.config.columns() {
            let shift = if self.is_staggered(offset.j) {
                size / 2.0
            } else {
                0.0
            };
            Point::new(
                spacing * f64::from(offset.j),
                size * f64::from(offset.i) + shift,
            )
        } else {
            let shift = if self.is_staggered(offset.i) {
                size / 2.0
            } else {
                0.0
            };
            Point::new(
                size * f64::from(offset.j) + shift,
                spacing * f64::from(offset.i),
            )
        }
    }

    fn center_2d(&self, offset: GridOffset2D) -> Point {
        let top_left = self.top_left_2d(offset);
        let (half_w, half_h) = if self.config.columns() {
            (self.circumradius(), self.config.size() / 2.0)
        } else {
            (self.config.size() / 2.0, self.circumradius())
        };
        Point::new(top_left.x + half_w, top_left.y + half_h)
    }

    /// Vertex angles of one cell in degrees, increasing.
    fn vertex_angles(&self) -> [f64; 6] {
        if self.config.columns() {
            [0.0, 60.0, 120.0, 180.0, 240.0, 300.0]
        } else {
            [30.0, 90.0, 150.0, 210.0, 270.0, 330.0]
        }
    }

    /// Planar cell sequence between two cubes, excluding the start:
    /// interpolate along cube coordinates in `distance` equal steps and
    /// round each sample.
    fn cube_line(&self, from: HexCube, to: HexCube) -> Vec<HexCube> {
        let steps = from.distance(to);
        let a = FractionalHexCube::from(from).nudged();
        let b = FractionalHexCube::from(to).nudged();
        (1..=steps)
            .map(|step| {
                let t = f64::from(step) / f64::from(steps);
                FractionalHexCube::lerp(a, b, t).round()
            })
            .collect()
    }

    /// One 3D leg of a direct path, excluding the start cell. Horizontal
    /// hex steps and vertical layer steps are interleaved evenly.
    fn walk_3d(
        &self,
        from: GridOffset3D,
        to: GridOffset3D,
        emit: &mut impl FnMut(GridOffset3D),
    ) {
        let cube_from = self.cube_of_offset(from.planar());
        let cube_to = self.cube_of_offset(to.planar());
        let planar = self.cube_line(cube_from, cube_to);
        let planar_steps = planar.len() as i64;
        let vertical_steps = i64::from(to.k.abs_diff(from.k));
        let vertical_sign = (to.k - from.k).signum();

        let cell_at = |planar_index: i64, vertical_index: i64| {
            let planar_offset = if planar_index == 0 {
                from.planar()
            } else {
                self.offset_of_cube(planar[(planar_index - 1) as usize])
            };
            GridOffset3D::new(
                planar_offset.i,
                planar_offset.j,
                from.k + vertical_sign * vertical_index as i32,
            )
        };

        if self.config.diagonals().allows_diagonals() {
            // Scaled rounding: both indices progress linearly over the
            // dominant step count, so neither ever jumps by more than one
            let total = planar_steps.max(vertical_steps);
            for step in 1..=total {
                let planar_index =
                    (2 * step * planar_steps + total) / (2 * total);
                let vertical_index =
                    (2 * step * vertical_steps + total) / (2 * total);
                emit(cell_at(planar_index, vertical_index));
            }
        } else {
            // One axis per step, least elapsed fractional progress first
            let (mut taken_planar, mut taken_vertical) = (0_i64, 0_i64);
            for _ in 0..planar_steps + vertical_steps {
                let advance_planar = taken_vertical == vertical_steps
                    || (taken_planar < planar_steps
                        && (2 * taken_planar + 1) * vertical_steps
                            <= (2 * taken_vertical + 1) * planar_steps);
                if advance_planar {
                    taken_planar += 1;
                } else {
                    taken_vertical += 1;
                }
                emit(cell_at(taken_planar, taken_vertical));
            }
        }
    }
}

impl Grid for HexagonalGrid {
    fn configuration(&self) -> &GridConfiguration {
        &self.config
    }

    fn grid_type(&self) -> GridType {
        GridType::Hexagonal
    }

    fn dimensions(
        &self,
        scene_width: f64,
        scene_height: f64,
        padding: f64,
    ) -> GridDimensions {
        let size = self.config.size();
        let spacing = self.main_spacing();
        let (unit_x, unit_y) = if self.config.columns() {
            (spacing, size)
        } else {
            (size, spacing)
        };
        let pad_x = ((padding * scene_width) / unit_x).ceil() * unit_x;
        let pad_y = ((padding * scene_height) / unit_y).ceil() * unit_y;
        let width = scene_width + 2.0 * pad_x;
        let height = scene_height + 2.0 * pad_y;
        GridDimensions {
            width,
            height,
            x: pad_x,
            y: pad_y,
            rows: (height / unit_y).ceil() as i32,
            columns: (width / unit_x).ceil() as i32,
        }
    }

    fn offset(&self, coords: GridCoordinates) -> GridOffset3D {
        match coords {
            GridCoordinates::Offset(offset) => offset,
            GridCoordinates::Point(point) => {
                let planar = self.offset_2d(point.planar());
                GridOffset3D::new(
                    planar.i,
                    planar.j,
                    elevation_layer(&self.config, point.elevation),
                )
            }
        }
    }

    fn offset_range(&self, rectangle: Rectangle) -> OffsetRange {
        let size = self.config.size();
        let spacing = self.main_spacing();
        let overhang = 2.0 * self.circumradius();
        let (main0, main_len, cross0, cross_len) = if self.config.columns() {
            (rectangle.x, rectangle.width, rectangle.y, rectangle.height)
        } else {
            (rectangle.y, rectangle.height, rectangle.x, rectangle.width)
        };
        // Along the staggered axis the cells overhang their spacing bins
        let m0 = ((main0 - overhang) / spacing).floor() as i32 + 1;
        let m1 = ((main0 + main_len) / spacing).ceil() as i32;
        if rectangle.is_empty() || m1 <= m0 {
            let shift =
                if self.is_staggered(m0) { size / 2.0 } else { 0.0 };
            let c0 = ((cross0 - shift) / size).floor() as i32;
            let (i0, j0) = if self.config.columns() {
                (c0, m0)
            } else {
                (m0, c0)
            };
            return OffsetRange::new(i0, j0, i0, j0);
        }
        // Across it each covered line is shifted by its own stagger
        // parity; two consecutive lines exhaust both parities
        let mut c0 = i32::MAX;
        let mut c1 = i32::MIN;
        for line in m0..m1.min(m0 + 2) {
            let shift =
                if self.is_staggered(line) { size / 2.0 } else { 0.0 };
            c0 = c0.min(((cross0 - shift) / size).floor() as i32);
            c1 = c1.max(((cross0 + cross_len - shift) / size).ceil() as i32);
        }
        let (i0, j0, i1, j1) = if self.config.columns() {
            (c0, m0, c1, m1)
        } else {
            (m0, c0, m1, c1)
        };
        OffsetRange::new(i0, j0, i1, j1)
    }

    fn adjacent_offsets(&self, coords: GridCoordinates) -> Vec<GridOffset3D> {
        let origin = self.offset(coords);
        let planar = self.cube_of_offset(origin.planar());
        let diagonals = self.config.diagonals().allows_diagonals();

        let mut neighbors = Vec::with_capacity(if diagonals { 20 } else { 8 });
        for neighbor in planar.neighbors() {
            let offset = self.offset_of_cube(neighbor);
            neighbors
                .push(GridOffset3D::new(offset.i, offset.j, origin.k));
            if diagonals {
                for dk in [-1, 1] {
                    neighbors.push(GridOffset3D::new(
                        offset.i,
                        offset.j,
                        origin.k + dk,
                    ));
                }
            }
        }
        for dk in [-1, 1] {
            neighbors.push(GridOffset3D::new(
                origin.i,
                origin.j,
                origin.k + dk,
            ));
        }
        neighbors
    }

    fn is_adjacent(&self, a: GridCoordinates, b: GridCoordinates) -> bool {
        let a = self.offset(a);
        let b = self.offset(b);
        let planar = self
            .cube_of_offset(a.planar())
            .distance(self.cube_of_offset(b.planar()));
        let vertical = a.k.abs_diff(b.k);
        match (planar, vertical) {
            (1, 0) | (0, 1) => true,
            (1, 1) => self.config.diagonals().allows_diagonals(),
            _ => false,
        }
    }

    fn shifted_offset(
        &self,
        coords: GridCoordinates,
        direction: MoveDirection,
    ) -> GridOffset3D {
        let origin = self.offset(coords);
        let (mut di, mut dj, dk) = direction.deltas();
        if !self.config.diagonals().allows_diagonals()
            && direction.is_diagonal()
        {
            di = 0;
            dj = 0;
        }
        GridOffset3D::new(origin.i + di, origin.j + dj, origin.k + dk)
    }

    fn shifted_point(
        &self,
        point: ElevatedPoint,
        direction: MoveDirection,
    ) -> ElevatedPoint {
        let origin = self.offset(point.into());
        let target = self.shifted_offset(point.into(), direction);
        // Preserve the point's position relative to its cell center
        let from = self.center_2d(origin.planar());
        let to = self.center_2d(target.planar());
        ElevatedPoint::new(
            point.x + (to.x - from.x),
            point.y + (to.y - from.y),
            point.elevation
                + f64::from(target.k - origin.k) * self.config.distance(),
        )
    }

    fn top_left_point(&self, coords: GridCoordinates) -> ElevatedPoint {
        let offset = self.offset(coords);
        let planar = self.top_left_2d(offset.planar());
        ElevatedPoint::new(
            planar.x,
            planar.y,
            layer_elevation(&self.config, offset.k),
        )
    }

    fn center_point(&self, coords: GridCoordinates) -> ElevatedPoint {
        let offset = self.offset(coords);
        let planar = self.center_2d(offset.planar());
        ElevatedPoint::new(
            planar.x,
            planar.y,
            layer_elevation(&self.config, offset.k),
        )
    }

    fn shape(&self) -> Vec<Point> {
        let radius = self.circumradius();
        self.vertex_angles()
            .iter()
            .map(|angle| {
                let radians = angle.to_radians();
                Point::new(radius * radians.cos(), radius * radians.sin())
            })
            .collect()
    }

    fn vertices(&self, coords: GridCoordinates) -> Vec<Point> {
        let center = self.center_2d(self.offset(coords).planar());
        self.shape()
            .into_iter()
            .map(|vertex| Point::new(center.x + vertex.x, center.y + vertex.y))
            .collect()
    }

    fn snapped_point(
        &self,
        point: ElevatedPoint,
        behavior: SnappingBehavior,
    ) -> ElevatedPoint {
        snap::snapped_point(self, point, behavior)
    }

    fn measure_segment(
        &self,
        from: ElevatedPoint,
        to: ElevatedPoint,
        state: &mut MeasureState,
    ) -> SegmentMeasurement {
        let origin = self.offset(from.into());
        let destination = self.offset(to.into());
        let planar = u64::from(
            self.cube_of_offset(origin.planar())
                .distance(self.cube_of_offset(destination.planar())),
        );
        let vertical = u64::from(destination.k.abs_diff(origin.k));
        // A step moving both horizontally and vertically is the hex
        // analogue of a square diagonal
        let longer = planar.max(vertical);
        let shorter = planar.min(vertical);
        let straight = (longer - shorter) as f64;

        let rule = self.config.diagonals();
        let (cells, spaces, diagonals) = match rule {
            DiagonalRule::Illegal => {
                ((planar + vertical) as f64, planar + vertical, 0)
            }
            DiagonalRule::Alternating1 => {
                (straight + state.alternating_cost(1, shorter), longer, shorter)
            }
            DiagonalRule::Alternating2 => {
                (straight + state.alternating_cost(2, shorter), longer, shorter)
            }
            _ => (
                straight + shorter as f64 * rule.double_diagonal_weight(),
                longer,
                shorter,
            ),
        };

        let dx = to.x - from.x;
        let dy = to.y - from.y;
        let dz = (to.elevation - from.elevation) * self.config.pixels_per_unit();
        SegmentMeasurement {
            distance: cells * self.config.distance(),
            spaces: spaces as u32,
            diagonals: diagonals as u32,
            euclidean: (dx * dx + dy * dy + dz * dz).sqrt()
                * self.config.units_per_pixel(),
        }
    }

    fn direct_path(&self, waypoints: &[GridCoordinates]) -> Vec<GridOffset3D> {
        let mut path: Vec<GridOffset3D> = Vec::new();
        for &coords in waypoints {
            let target = self.offset(coords);
            let Some(&current) = path.last() else {
                path.push(target);
                continue;
            };
            if current == target {
                continue;
            }
            self.walk_3d(current, target, &mut |cell| path.push(cell));
        }
        path
    }

    fn translated_point(
        &self,
        point: ElevatedPoint,
        direction: f64,
        distance: f64,
    ) -> ElevatedPoint {
        // The hex lattice is isotropic (all six neighbor spacings equal
        // the cell size), so translation is plain Euclidean
        let radians = direction.to_radians();
        let length = distance * self.config.pixels_per_unit();
        ElevatedPoint::new(
            point.x + length * radians.cos(),
            point.y + length * radians.sin(),
            point.elevation,
        )
    }

    fn circle(&self, center: Point, radius: f64) -> Vec<Point> {
        let radius_px = radius * self.config.pixels_per_unit();
        if radius_px <= 0.0 {
            return Vec::new();
        }
        // A metric ball on a hex grid is a hexagon with vertices in the
        // six neighbor-center directions
        let angles: [f64; 6] = if self.config.columns() {
            [30.0, 90.0, 150.0, 210.0, 270.0, 330.0]
        } else {
            [0.0, 60.0, 120.0, 180.0, 240.0, 300.0]
        };
        angles
            .iter()
            .map(|angle| {
                let radians = angle.to_radians();
                Point::new(
                    center.x + radius_px * radians.cos(),
                    center.y + radius_px * radians.sin(),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn grid(columns: bool, even: bool) -> HexagonalGrid {
        HexagonalGrid::new(
            GridConfiguration::new(100.0, 5.0)
                .unwrap()
                .with_hex_layout(columns, even),
        )
    }

    fn layouts() -> [HexagonalGrid; 4] {
        [
            grid(false, false),
            grid(false, true),
            grid(true, false),
            grid(true, true),
        ]
    }

    #[test]
    fn test_origin_scenario() {
        // size 100, rows, odd: the origin corner and the center of cell
        // (0, 0) both address cell (0, 0)
        let grid = grid(false, false);
        let origin = grid.offset(Point::ORIGIN.into());
        assert_eq!(origin, GridOffset3D::new(0, 0, 0));
        let center = grid.center_point(GridOffset3D::new(0, 0, 0).into());
        assert_eq!(grid.offset(center.into()), GridOffset3D::new(0, 0, 0));
    }

    #[test]
    fn test_offset_cube_round_trip() {
        for grid in layouts() {
            for i in -3..=3 {
                for j in -3..=3 {
                    let offset = GridOffset2D::new(i, j);
                    let cube = grid.cube_of_offset(offset);
                    assert_eq!(
                        grid.offset_of_cube(cube),
                        offset,
                        "offset {offset} via cube {cube}"
                    );
                }
            }
            for q in -3..=3 {
                for r in -3..=3 {
                    let cube = HexCube::new(q, r);
                    assert_eq!(
                        grid.cube_of_offset(grid.offset_of_cube(cube)),
                        cube
                    );
                }
            }
        }
    }

    #[test]
    fn test_center_containment() {
        for grid in layouts() {
            for i in -2..=2 {
                for j in -2..=2 {
                    let offset = GridOffset3D::new(i, j, 0);
                    let center = grid.center_point(offset.into());
                    assert_eq!(
                        grid.offset(center.into()),
                        offset,
                        "center {center} of {offset}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_cube_point_round_trip() {
        for grid in layouts() {
            for q in -3..=3 {
                for r in -3..=3 {
                    let cube = HexCube::new(q, r);
                    let point = grid.cube_to_point(cube);
                    assert_eq!(grid.point_to_cube(point).round(), cube);
                }
            }
        }
    }

    #[test]
    fn test_cube_center_matches_offset_center() {
        for grid in layouts() {
            for i in -2..=2 {
                for j in -2..=2 {
                    let offset = GridOffset2D::new(i, j);
                    let via_cube =
                        grid.cube_to_point(grid.cube_of_offset(offset));
                    let direct = grid.center_2d(offset);
                    assert_approx_eq!(via_cube.x, direct.x, 1e-9);
                    assert_approx_eq!(via_cube.y, direct.y, 1e-9);
                }
            }
        }
    }

    #[test]
    fn test_adjacent_cubes_arity() {
        for grid in layouts() {
            let origin = GridOffset3D::new(0, 0, 0);
            let cubes = grid.adjacent_cubes(origin.into());
            assert_eq!(cubes.len(), 6);
            let source = grid.cube_of_offset(origin.planar());
            for cube in cubes {
                assert_eq!(source.distance(cube), 1);
            }
        }
    }

    #[test]
    fn test_adjacency_3d() {
        let origin = GridOffset3D::new(0, 0, 0);
        let legal = grid(false, false);
        assert_eq!(legal.adjacent_offsets(origin.into()).len(), 20);
        for neighbor in legal.adjacent_offsets(origin.into()) {
            assert!(legal.is_adjacent(origin.into(), neighbor.into()));
        }

        let illegal = HexagonalGrid::new(
            GridConfiguration::new(100.0, 5.0)
                .unwrap()
                .with_diagonals(DiagonalRule::Illegal),
        );
        assert_eq!(illegal.adjacent_offsets(origin.into()).len(), 8);
        // Planar neighbor on a different layer is not adjacent when
        // diagonals are illegal
        let diagonal = GridOffset3D::new(0, 1, 1);
        assert!(!illegal.is_adjacent(origin.into(), diagonal.into()));
        assert!(legal.is_adjacent(origin.into(), diagonal.into()));
    }

    #[test]
    fn test_measure_straight_line() {
        let grid = grid(false, false);
        let from = grid.center_point(GridOffset3D::new(0, 0, 0).into());
        let to = grid.center_point(GridOffset3D::new(0, 4, 0).into());
        let result = grid.measure_path(&[from.into(), to.into()]);
        assert_eq!(result.spaces(), 4);
        assert_approx_eq!(result.distance(), 20.0);
        assert_eq!(result.totals().diagonals, 0);
    }

    #[test]
    fn test_measure_with_elevation() {
        // 4 planar steps and 2 layers: 2 combined "diagonal" steps and 2
        // straight ones under EXACT pricing
        let grid = HexagonalGrid::new(
            GridConfiguration::new(100.0, 5.0)
                .unwrap()
                .with_diagonals(DiagonalRule::Exact),
        );
        let from = grid.center_point(GridOffset3D::new(0, 0, 0).into());
        let to = grid.center_point(GridOffset3D::new(0, 4, 2).into());
        let result = grid.measure_path(&[
            ElevatedPoint::new(from.x, from.y, 0.0).into(),
            ElevatedPoint::new(to.x, to.y, 10.0).into(),
        ]);
        assert_eq!(result.spaces(), 4);
        assert_eq!(result.totals().diagonals, 2);
        assert_approx_eq!(
            result.distance(),
            (2.0 + 2.0 * std::f64::consts::SQRT_2) * 5.0
        );
    }

    #[test]
    fn test_direct_path_is_contiguous() {
        for grid in layouts() {
            let from = GridOffset3D::new(0, 0, 0);
            let to = GridOffset3D::new(4, 3, 0);
            let path = grid.direct_path(&[from.into(), to.into()]);
            assert_eq!(path.first(), Some(&from));
            assert_eq!(path.last(), Some(&to));
            for pair in path.windows(2) {
                assert_eq!(
                    grid.cube_of_offset(pair[0].planar())
                        .distance(grid.cube_of_offset(pair[1].planar())),
                    1,
                    "non-contiguous step {pair:?}"
                );
            }
            let expected = grid
                .cube_of_offset(from.planar())
                .distance(grid.cube_of_offset(to.planar()))
                as usize;
            assert_eq!(path.len(), expected + 1);
        }
    }

    #[test]
    fn test_direct_path_3d_interleaves() {
        let grid = grid(false, false);
        let from = GridOffset3D::new(0, 0, 0);
        let to = GridOffset3D::new(0, 4, 2);
        let path = grid.direct_path(&[from.into(), to.into()]);
        // Diagonals legal: the walk takes max(4, 2) = 4 steps
        assert_eq!(path.len(), 5);
        assert_eq!(path.last(), Some(&to));
        for pair in path.windows(2) {
            assert!(pair[1].k >= pair[0].k);
            assert!(pair[1].k - pair[0].k <= 1);
        }
    }

    #[test]
    fn test_shifted_point_preserves_cell_relative_position() {
        let grid = grid(false, false);
        let point = ElevatedPoint::new(62.0, 41.0, 0.0);
        let shifted = grid.shifted_point(point, MoveDirection::EAST);
        assert_approx_eq!(shifted.x, 162.0);
        assert_approx_eq!(shifted.y, 41.0);
        let ascended = grid.shifted_point(point, MoveDirection::ASCEND);
        assert_approx_eq!(ascended.elevation, 5.0);
    }

    #[test]
    fn test_circle_is_hexagon() {
        let grid = grid(false, false);
        let circle = grid.circle(Point::ORIGIN, 10.0);
        assert_eq!(circle.len(), 6);
        for vertex in &circle {
            assert_approx_eq!(vertex.distance_to(Point::ORIGIN), 200.0, 1e-9);
        }
        // Pointy-top: first vertex due east
        assert_approx_eq!(circle[0].x, 200.0);
        assert_approx_eq!(circle[0].y, 0.0);
        assert!(grid.circle(Point::ORIGIN, 0.0).is_empty());
    }

    #[test]
    fn test_vertices_are_cell_outline() {
        for grid in layouts() {
            let offset = GridOffset3D::new(1, 2, 0);
            let center = grid.center_point(offset.into());
            let vertices = grid.vertices(offset.into());
            assert_eq!(vertices.len(), 6);
            let radius = grid.circumradius();
            for vertex in vertices {
                assert_approx_eq!(
                    vertex.distance_to(center.planar()),
                    radius,
                    1e-9
                );
            }
        }
    }

    #[test]
    fn test_offset_range_is_tight() {
        let grid = grid(false, false);
        // Entirely inside row 0, column 0: no staggered row intersects,
        // so the staggered half-cell shift must not widen the range
        let range = grid.offset_range(Rectangle::new(10.0, 30.0, 30.0, 10.0));
        assert_eq!(range, OffsetRange::new(0, 0, 1, 1));

        // Tall enough to reach staggered row 1, whose column -1 now
        // overlaps the rectangle's left edge
        let range = grid.offset_range(Rectangle::new(10.0, 30.0, 30.0, 80.0));
        assert_eq!(range, OffsetRange::new(0, -1, 2, 1));

        let empty = grid.offset_range(Rectangle::new(10.0, 30.0, 0.0, 0.0));
        assert!(empty.is_empty());
        assert_eq!(empty.i0, empty.i1);
        assert_eq!(empty.j0, empty.j1);
    }

    #[test]
    fn test_dimensions_row_packing() {
        let grid = grid(false, false);
        let dimensions = grid.dimensions(1000.0, 1000.0, 0.0);
        assert_eq!(dimensions.columns, 10);
        // Row spacing is 1.5 * 100/√3 ≈ 86.6 px
        assert_eq!(dimensions.rows, 12);
        assert_approx_eq!(dimensions.x, 0.0);
    }
}
