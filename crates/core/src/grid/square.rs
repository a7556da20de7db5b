//! The square-cell topology. Everything distance-related is governed by
//! the configured [DiagonalRule]; see `measure_segment` for the exact
//! weights.

use crate::config::{DiagonalRule, GridConfiguration, GridType};
use crate::geom::{ElevatedPoint, Point, Rectangle};
use crate::grid::{
    elevation_layer, layer_elevation, rectangular_dimensions, Grid,
    GridCoordinates, GridDimensions, GridOffset2D, GridOffset3D,
    MeasureState, MoveDirection, OffsetRange, SegmentMeasurement, SnapMode,
    SnappingBehavior,
};

/// A grid of square cells with side length `size` pixels.
#[derive(Clone, Debug)]
pub struct SquareGrid {
    config: GridConfiguration,
}

impl SquareGrid {
    pub fn new(config: GridConfiguration) -> Self {
        Self { config }
    }

    fn offset_2d(&self, point: Point) -> GridOffset2D {
        let size = self.config.size();
        GridOffset2D::new(
            (point.y / size).floor() as i32,
            (point.x / size).floor() as i32,
        )
    }

    /// Sorted absolute per-axis deltas between two cells, largest first.
    fn sorted_deltas(from: GridOffset3D, to: GridOffset3D) -> [u64; 3] {
        let mut deltas = [
            u64::from(to.i.abs_diff(from.i)),
            u64::from(to.j.abs_diff(from.j)),
            u64::from(to.k.abs_diff(from.k)),
        ];
        deltas.sort_unstable_by(|a, b| b.cmp(a));
        deltas
    }

    /// 2D line walk between two cells, excluding the start cell. With
    /// diagonals, this is Bresenham with a single error accumulator (a
    /// step may advance both axes at once). Without, every step advances
    /// exactly one axis, picking whichever has made the least fractional
    /// progress.
    fn walk_2d(
        from: GridOffset2D,
        to: GridOffset2D,
        allow_diagonals: bool,
        mut emit: impl FnMut(GridOffset2D),
    ) {
        let dj = i64::from(to.j) - i64::from(from.j);
        let di = i64::from(to.i) - i64::from(from.i);
        let (sj, si) = (dj.signum() as i32, di.signum() as i32);
        let (dj, di) = (dj.abs(), di.abs());
        let (mut i, mut j) = (from.i, from.j);

        if allow_diagonals {
            let mut error = dj - di;
            while i != to.i || j != to.j {
                let doubled = 2 * error;
                if doubled > -di {
                    error -= di;
                    j += sj;
                }
                if doubled < dj {
                    error += dj;
                    i += si;
                }
                emit(GridOffset2D::new(i, j));
            }
        } else {
            // Doubled accumulators: compare the midpoints of the next step
            // on each axis
            let (mut tj, mut ti) = (0_i64, 0_i64);
            while tj < dj || ti < di {
                let advance_j = ti == di
                    || (tj < dj && (2 * tj + 1) * di <= (2 * ti + 1) * dj);
                if advance_j {
                    tj += 1;
                    j += sj;
                } else {
                    ti += 1;
                    i += si;
                }
                emit(GridOffset2D::new(i, j));
            }
        }
    }

    /// 3D line walk with diagonal stepping: Bresenham driven by the
    /// dominant axis, with one error term per secondary axis.
    fn walk_3d_diagonal(
        from: GridOffset3D,
        to: GridOffset3D,
        mut emit: impl FnMut(GridOffset3D),
    ) {
        let delta = [
            i64::from(to.j) - i64::from(from.j),
            i64::from(to.i) - i64::from(from.i),
            i64::from(to.k) - i64::from(from.k),
        ];
        let signs = [
            delta[0].signum() as i32,
            delta[1].signum() as i32,
            delta[2].signum() as i32,
        ];
        let absolute = [delta[0].abs(), delta[1].abs(), delta[2].abs()];

        // Dominant axis: the largest delta, ties broken j then i then k
        let dominant = (0..3)
            .max_by_key(|&axis| (absolute[axis], std::cmp::Reverse(axis)))
            .unwrap_or(0);
        let secondary = [(dominant + 1) % 3, (dominant + 2) % 3];
        let steps = absolute[dominant];

        let mut position = [from.j, from.i, from.k];
        let mut errors = [
            2 * absolute[secondary[0]] - steps,
            2 * absolute[secondary[1]] - steps,
        ];
        for _ in 0..steps {
            position[dominant] += signs[dominant];
            for (slot, &axis) in secondary.iter().enumerate() {
                if errors[slot] > 0 {
                    position[axis] += signs[axis];
                    errors[slot] -= 2 * steps;
                }
                errors[slot] += 2 * absolute[axis];
            }
            emit(GridOffset3D::new(position[1], position[0], position[2]));
        }
    }

    /// 3D line walk without diagonals: exactly one axis advances per
    /// step, picking the axis with the least elapsed fractional progress.
    fn walk_3d_rectilinear(
        from: GridOffset3D,
        to: GridOffset3D,
        mut emit: impl FnMut(GridOffset3D),
    ) {
        let delta = [
            i64::from(to.j) - i64::from(from.j),
            i64::from(to.i) - i64::from(from.i),
            i64::from(to.k) - i64::from(from.k),
        ];
        let signs = [
            delta[0].signum() as i32,
            delta[1].signum() as i32,
            delta[2].signum() as i32,
        ];
        let absolute = [delta[0].abs(), delta[1].abs(), delta[2].abs()];

        let mut taken = [0_i64; 3];
        let mut position = [from.j, from.i, from.k];
        let total: i64 = absolute.iter().sum();
        for _ in 0..total {
            let next = (0..3)
                .filter(|&axis| taken[axis] < absolute[axis])
                .min_by(|&a, &b| {
                    let fa = (taken[a] as f64 + 0.5) / absolute[a] as f64;
                    let fb = (taken[b] as f64 + 0.5) / absolute[b] as f64;
                    fa.total_cmp(&fb).then(a.cmp(&b))
                })
                .expect("axis with remaining steps");
            taken[next] += 1;
            position[next] += signs[next];
            emit(GridOffset3D::new(position[1], position[0], position[2]));
        }
    }

    /// Candidate snap points of one category, nearest to `point`, on the
    /// sub-lattice with spacing `s`.
    fn snap_candidates(
        point: Point,
        s: f64,
        mode: SnapMode,
        candidates: &mut Vec<Point>,
    ) {
        let lattice = |v: f64| (v / s).round() * s;
        let half_lattice = |v: f64| ((v / s - 0.5).round() + 0.5) * s;
        let cell = |v: f64| (v / s).floor();

        if mode.contains(SnapMode::CENTER) {
            candidates
                .push(Point::new(half_lattice(point.x), half_lattice(point.y)));
        }
        if mode.contains(SnapMode::EDGE_MIDPOINT) {
            // Midpoints of vertical edges, then horizontal edges
            candidates
                .push(Point::new(lattice(point.x), half_lattice(point.y)));
            candidates
                .push(Point::new(half_lattice(point.x), lattice(point.y)));
        }

        // On a square cell the corners are the vertices, so the two bit
        // groups fold onto the same targets
        let (fx, fy) = (cell(point.x), cell(point.y));
        let folded = mode.bits() | (mode.bits() >> 4);
        let folded = SnapMode::from_bits_truncate(folded);
        if folded.intersects(SnapMode::VERTEX) {
            if folded.contains(SnapMode::VERTEX) {
                // Any vertex: the nearest lattice point
                candidates
                    .push(Point::new(lattice(point.x), lattice(point.y)));
            } else {
                for (flag, ox, oy) in [
                    (SnapMode::TOP_LEFT_VERTEX, 0.0, 0.0),
                    (SnapMode::TOP_RIGHT_VERTEX, 1.0, 0.0),
                    (SnapMode::BOTTOM_LEFT_VERTEX, 0.0, 1.0),
                    (SnapMode::BOTTOM_RIGHT_VERTEX, 1.0, 1.0),
                ] {
                    if folded.contains(flag) {
                        candidates
                            .push(Point::new((fx + ox) * s, (fy + oy) * s));
                    }
                }
            }
        }

        for (flag, ox, oy) in [
            (SnapMode::TOP_SIDE_MIDPOINT, 0.5, 0.0),
            (SnapMode::BOTTOM_SIDE_MIDPOINT, 0.5, 1.0),
            (SnapMode::LEFT_SIDE_MIDPOINT, 0.0, 0.5),
            (SnapMode::RIGHT_SIDE_MIDPOINT, 1.0, 0.5),
        ] {
            if mode.contains(flag) {
                candidates.push(Point::new((fx + ox) * s, (fy + oy) * s));
            }
        }
    }
}

impl Grid for SquareGrid {
    fn configuration(&self) -> &GridConfiguration {
        &self.config
    }

    fn grid_type(&self) -> GridType {
        GridType::Square
    }

    fn dimensions(
        &self,
        scene_width: f64,
        scene_height: f64,
        padding: f64,
    ) -> GridDimensions {
        rectangular_dimensions(&self.config, scene_width, scene_height, padding)
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
        let i0 = (rectangle.y / size).floor() as i32;
        let j0 = (rectangle.x / size).floor() as i32;
        if rectangle.is_empty() {
            return OffsetRange::new(i0, j0, i0, j0);
        }
        let i1 = ((rectangle.y + rectangle.height) / size).ceil() as i32;
        let j1 = ((rectangle.x + rectangle.width) / size).ceil() as i32;
        OffsetRange::new(i0, j0, i1.max(i0), j1.max(j0))
    }

    fn adjacent_offsets(&self, coords: GridCoordinates) -> Vec<GridOffset3D> {
        let origin = self.offset(coords);
        let diagonals = self.config.diagonals().allows_diagonals();
        let mut neighbors = Vec::with_capacity(if diagonals { 26 } else { 6 });
        for di in -1..=1 {
            for dj in -1..=1 {
                for dk in -1..=1 {
                    if di == 0 && dj == 0 && dk == 0 {
                        continue;
                    }
                    let axes_moved = [di, dj, dk]
                        .iter()
                        .filter(|&&delta| delta != 0)
                        .count();
                    if !diagonals && axes_moved > 1 {
                        continue;
                    }
                    neighbors.push(GridOffset3D::new(
                        origin.i + di,
                        origin.j + dj,
                        origin.k + dk,
                    ));
                }
            }
        }
        neighbors
    }

    fn is_adjacent(&self, a: GridCoordinates, b: GridCoordinates) -> bool {
        let a = self.offset(a);
        let b = self.offset(b);
        let di = a.i.abs_diff(b.i);
        let dj = a.j.abs_diff(b.j);
        let dk = a.k.abs_diff(b.k);
        if self.config.diagonals().allows_diagonals() {
            di.max(dj).max(dk) == 1
        } else {
            di + dj + dk == 1
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
        let (mut di, mut dj, dk) = direction.deltas();
        if !self.config.diagonals().allows_diagonals()
            && direction.is_diagonal()
        {
            di = 0;
            dj = 0;
        }
        ElevatedPoint::new(
            point.x + f64::from(dj) * self.config.size(),
            point.y + f64::from(di) * self.config.size(),
            point.elevation + f64::from(dk) * self.config.distance(),
        )
    }

    fn top_left_point(&self, coords: GridCoordinates) -> ElevatedPoint {
        let offset = self.offset(coords);
        let size = self.config.size();
        ElevatedPoint::new(
            f64::from(offset.j) * size,
            f64::from(offset.i) * size,
            layer_elevation(&self.config, offset.k),
        )
    }

    fn center_point(&self, coords: GridCoordinates) -> ElevatedPoint {
        let top_left = self.top_left_point(coords);
        let half = self.config.size() / 2.0;
        ElevatedPoint::new(
            top_left.x + half,
            top_left.y + half,
            top_left.elevation,
        )
    }

    fn shape(&self) -> Vec<Point> {
        let half = self.config.size() / 2.0;
        vec![
            Point::new(-half, -half),
            Point::new(half, -half),
            Point::new(half, half),
            Point::new(-half, half),
        ]
    }

    fn vertices(&self, coords: GridCoordinates) -> Vec<Point> {
        let top_left = self.top_left_point(coords).planar();
        let size = self.config.size();
        vec![
            top_left,
            Point::new(top_left.x + size, top_left.y),
            Point::new(top_left.x + size, top_left.y + size),
            Point::new(top_left.x, top_left.y + size),
        ]
    }

    fn snapped_point(
        &self,
        point: ElevatedPoint,
        behavior: SnappingBehavior,
    ) -> ElevatedPoint {
        let elevation = layer_elevation(
            &self.config,
            elevation_layer(&self.config, point.elevation),
        );
        let mode = behavior.mode();
        if mode.is_empty() {
            return ElevatedPoint::new(point.x, point.y, elevation);
        }

        let s = self.config.size() / f64::from(behavior.resolution());
        let planar = point.planar();
        let mut candidates = Vec::new();
        Self::snap_candidates(planar, s, mode, &mut candidates);

        let nearest = candidates
            .into_iter()
            .min_by(|a, b| {
                planar
                    .distance_squared(*a)
                    .total_cmp(&planar.distance_squared(*b))
            })
            .unwrap_or(planar);
        ElevatedPoint::new(nearest.x, nearest.y, elevation)
    }

    fn measure_segment(
        &self,
        from: ElevatedPoint,
        to: ElevatedPoint,
        state: &mut MeasureState,
    ) -> SegmentMeasurement {
        let origin = self.offset(from.into());
        let destination = self.offset(to.into());
        let [a, b, c] = Self::sorted_deltas(origin, destination);
        let straight = (a - b) as f64;
        let doubles = (b - c) as f64;
        let triples = c as f64;

        let rule = self.config.diagonals();
        let (cells, spaces, diagonals) = match rule {
            DiagonalRule::Illegal => ((a + b + c) as f64, a + b + c, 0),
            DiagonalRule::Alternating1 => {
                (straight + state.alternating_cost(1, b), a, b)
            }
            DiagonalRule::Alternating2 => {
                (straight + state.alternating_cost(2, b), a, b)
            }
            _ => (
                straight
                    + doubles * rule.double_diagonal_weight()
                    + triples * rule.triple_diagonal_weight(),
                a,
                b,
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
        let diagonals = self.config.diagonals().allows_diagonals();
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
            if current.k == target.k {
                let layer = current.k;
                Self::walk_2d(
                    current.planar(),
                    target.planar(),
                    diagonals,
                    |cell| {
                        path.push(GridOffset3D::new(cell.i, cell.j, layer));
                    },
                );
            } else if diagonals {
                Self::walk_3d_diagonal(current, target, |cell| {
                    path.push(cell);
                });
            } else {
                Self::walk_3d_rectilinear(current, target, |cell| {
                    path.push(cell);
                });
            }
        }
        path
    }

    fn translated_point(
        &self,
        point: ElevatedPoint,
        direction: f64,
        distance: f64,
    ) -> ElevatedPoint {
        let radians = direction.to_radians();
        let (dx, dy) = (radians.cos(), radians.sin());
        // Cost of one pixel of travel in this direction under the grid's
        // metric, relative to orthogonal travel
        let weight = self.config.diagonals().double_diagonal_weight();
        let metric = dx.abs().max(dy.abs())
            + (weight - 1.0) * dx.abs().min(dy.abs());
        let length = distance * self.config.pixels_per_unit() / metric;
        ElevatedPoint::new(
            point.x + length * dx,
            point.y + length * dy,
            point.elevation,
        )
    }

    fn circle(&self, center: Point, radius: f64) -> Vec<Point> {
        let r = radius * self.config.pixels_per_unit();
        if r <= 0.0 {
            return Vec::new();
        }
        let weight = self.config.diagonals().double_diagonal_weight();
        let offsets: Vec<Point> = if weight <= 1.0 {
            // Chebyshev ball: a square through the diagonals
            vec![
                Point::new(r, r),
                Point::new(-r, r),
                Point::new(-r, -r),
                Point::new(r, -r),
            ]
        } else if weight >= 2.0 {
            // Manhattan ball: a diamond
            vec![
                Point::new(r, 0.0),
                Point::new(0.0, r),
                Point::new(-r, 0.0),
                Point::new(0.0, -r),
            ]
        } else {
            // In between: an octagon with diagonal reach r / weight
            let d = r / weight;
            vec![
                Point::new(r, 0.0),
                Point::new(d, d),
                Point::new(0.0, r),
                Point::new(-d, d),
                Point::new(-r, 0.0),
                Point::new(-d, -d),
                Point::new(0.0, -r),
                Point::new(d, -d),
            ]
        };
        offsets
            .into_iter()
            .map(|vertex| Point::new(center.x + vertex.x, center.y + vertex.y))
            .collect()
    }
}
