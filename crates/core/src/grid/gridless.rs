//! The gridless (continuous) topology. No discretization: offsets are
//! floored pixel coordinates, adjacency never holds, and measurement is
//! true Euclidean distance.

use crate::config::{GridConfiguration, GridType};
use crate::geom::{ElevatedPoint, Point, Rectangle};
use crate::grid::{
    elevation_layer, layer_elevation, rectangular_dimensions, Grid,
    GridCoordinates, GridDimensions, GridOffset3D, MeasureState,
    MoveDirection, OffsetRange, SegmentMeasurement, SnappingBehavior,
};

/// A grid without cells. Points are snapped (at most) to whole pixels and
/// distance is measured continuously.
#[derive(Clone, Debug)]
pub struct GridlessGrid {
    config: GridConfiguration,
}

impl GridlessGrid {
    pub fn new(config: GridConfiguration) -> Self {
        Self { config }
    }

    /// The continuous point addressed by the given coordinates. Offsets
    /// map back to the pixel they were floored from.
    fn point_of(&self, coords: GridCoordinates) -> ElevatedPoint {
        match coords {
            GridCoordinates::Point(point) => point,
            GridCoordinates::Offset(offset) => ElevatedPoint::new(
                f64::from(offset.j),
                f64::from(offset.i),
                layer_elevation(&self.config, offset.k),
            ),
        }
    }
}

impl Grid for GridlessGrid {
    fn configuration(&self) -> &GridConfiguration {
        &self.config
    }

    fn grid_type(&self) -> GridType {
        GridType::Gridless
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
            GridCoordinates::Point(point) => GridOffset3D::new(
                point.y.floor() as i32,
                point.x.floor() as i32,
                elevation_layer(&self.config, point.elevation),
            ),
        }
    }

    fn offset_range(&self, rectangle: Rectangle) -> OffsetRange {
        let i0 = rectangle.y.floor() as i32;
        let j0 = rectangle.x.floor() as i32;
        if rectangle.is_empty() {
            return OffsetRange::new(i0, j0, i0, j0);
        }
        OffsetRange::new(
            i0,
            j0,
            (rectangle.y + rectangle.height).ceil() as i32,
            (rectangle.x + rectangle.width).ceil() as i32,
        )
    }

    fn adjacent_offsets(&self, _coords: GridCoordinates) -> Vec<GridOffset3D> {
        Vec::new()
    }

    fn is_adjacent(&self, _a: GridCoordinates, _b: GridCoordinates) -> bool {
        false
    }

    fn shifted_offset(
        &self,
        coords: GridCoordinates,
        direction: MoveDirection,
    ) -> GridOffset3D {
        let point = self.point_of(coords);
        self.offset(self.shifted_point(point, direction).into())
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
        // One "cell" of gridless movement is one grid size in pixels
        ElevatedPoint::new(
            point.x + f64::from(dj) * self.config.size(),
            point.y + f64::from(di) * self.config.size(),
            point.elevation + f64::from(dk) * self.config.distance(),
        )
    }

    fn top_left_point(&self, coords: GridCoordinates) -> ElevatedPoint {
        self.point_of(coords)
    }

    fn center_point(&self, coords: GridCoordinates) -> ElevatedPoint {
        self.point_of(coords)
    }

    fn shape(&self) -> Vec<Point> {
        Vec::new()
    }

    fn vertices(&self, _coords: GridCoordinates) -> Vec<Point> {
        Vec::new()
    }

    fn snapped_point(
        &self,
        point: ElevatedPoint,
        _behavior: SnappingBehavior,
    ) -> ElevatedPoint {
        // There is nothing to snap to in the plane; elevation still snaps
        // to the nearest layer
        let k = elevation_layer(&self.config, point.elevation);
        ElevatedPoint::new(point.x, point.y, layer_elevation(&self.config, k))
    }

    fn measure_segment(
        &self,
        from: ElevatedPoint,
        to: ElevatedPoint,
        _state: &mut MeasureState,
    ) -> SegmentMeasurement {
        let dx = to.x - from.x;
        let dy = to.y - from.y;
        let dz = (to.elevation - from.elevation) * self.config.pixels_per_unit();
        let euclidean = (dx * dx + dy * dy + dz * dz).sqrt()
            * self.config.units_per_pixel();
        SegmentMeasurement {
            distance: euclidean,
            spaces: 0,
            diagonals: 0,
            euclidean,
        }
    }

    fn direct_path(&self, waypoints: &[GridCoordinates]) -> Vec<GridOffset3D> {
        let mut path: Vec<GridOffset3D> = waypoints
            .iter()
            .map(|&coords| self.offset(coords))
            .collect();
        path.dedup();
        path
    }

    fn translated_point(
        &self,
        point: ElevatedPoint,
        direction: f64,
        distance: f64,
    ) -> ElevatedPoint {
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
        // Pick the vertex count so the polygon deviates from the true
        // circle by less than 0.25 px
        let ratio = (radius_px - 0.25).max(0.0) / radius_px;
        let count = ((std::f64::consts::PI / ratio.acos()).ceil() as usize)
            .max(4);
        (0..count)
            .map(|idx| {
                let angle =
                    std::f64::consts::TAU * (idx as f64) / (count as f64);
                Point::new(
                    center.x + radius_px * angle.cos(),
                    center.y + radius_px * angle.sin(),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn grid() -> GridlessGrid {
        GridlessGrid::new(GridConfiguration::new(100.0, 1.0).unwrap())
    }

    #[test]
    fn test_offset_floors_pixels() {
        let grid = grid();
        let offset =
            grid.offset(ElevatedPoint::new(150.7, 33.2, 0.0).into());
        assert_eq!(offset, GridOffset3D::new(33, 150, 0));
        // Idempotent on offsets
        assert_eq!(grid.offset(offset.into()), offset);
    }

    #[test]
    fn test_offset_range_is_pixel_resolution() {
        let grid = grid();
        let range = grid.offset_range(Rectangle::new(2.5, -1.5, 3.0, 1.0));
        assert_eq!(range, OffsetRange::new(-2, 2, 0, 6));

        let empty = grid.offset_range(Rectangle::new(2.5, -1.5, 0.0, 1.0));
        assert!(empty.is_empty());
        assert_eq!(empty.i0, empty.i1);
        assert_eq!(empty.j0, empty.j1);
    }

    #[test]
    fn test_dimensions_pad_in_cell_increments() {
        // 10% of 500 = 50 px and 10% of 300 = 30 px, each rounded up to
        // one full 100 px cell per side
        let dimensions = grid().dimensions(500.0, 300.0, 0.1);
        assert_approx_eq!(dimensions.x, 100.0);
        assert_approx_eq!(dimensions.y, 100.0);
        assert_approx_eq!(dimensions.width, 700.0);
        assert_approx_eq!(dimensions.height, 500.0);
        assert_eq!(dimensions.rows, 5);
        assert_eq!(dimensions.columns, 7);
    }

    #[test]
    fn test_no_adjacency() {
        let grid = grid();
        let origin = GridOffset3D::new(0, 0, 0);
        assert!(grid.adjacent_offsets(origin.into()).is_empty());
        assert!(!grid
            .is_adjacent(origin.into(), GridOffset3D::new(0, 1, 0).into()));
    }

    #[test]
    fn test_measure_is_euclidean() {
        let grid = grid();
        let result = grid.measure_path(&[
            ElevatedPoint::new(0.0, 0.0, 0.0).into(),
            ElevatedPoint::new(300.0, 400.0, 0.0).into(),
        ]);
        // 500 px at 1 unit per 100 px
        assert_approx_eq!(result.distance(), 5.0);
        assert_eq!(result.spaces(), 0);
    }

    #[test]
    fn test_circle_deviation_bound() {
        let grid = grid();
        let circle = grid.circle(Point::ORIGIN, 1.0);
        assert!(circle.len() >= 4);
        for vertex in &circle {
            assert_approx_eq!(vertex.distance_to(Point::ORIGIN), 100.0, 1e-6);
        }
        // Edge midpoints (the worst case) stay within 0.25 px of the circle
        for idx in 0..circle.len() {
            let a = circle[idx];
            let b = circle[(idx + 1) % circle.len()];
            let midpoint = Point::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0);
            let deviation = 100.0 - midpoint.distance_to(Point::ORIGIN);
            assert!(deviation < 0.25, "deviation {deviation} too large");
        }
    }

    #[test]
    fn test_direct_path_collapses_duplicates() {
        let grid = grid();
        let path = grid.direct_path(&[
            ElevatedPoint::new(10.2, 10.8, 0.0).into(),
            ElevatedPoint::new(10.9, 10.1, 0.0).into(),
            ElevatedPoint::new(50.0, 50.0, 0.0).into(),
        ]);
        assert_eq!(
            path,
            vec![GridOffset3D::new(10, 10, 0), GridOffset3D::new(50, 50, 0)]
        );
    }
}
