//! Point snapping for hexagonal grids.
//!
//! A hex cell has no distinct "corners" versus "vertices", and its sides
//! are not axis-aligned, so the specific bits of [SnapMode] are first
//! folded by the orientation's symmetry (e.g. for pointy-top rows,
//! `TOP_LEFT_VERTEX` means the upper-left sloped vertex at 210°) into a
//! set of polar targets per cell. Candidates are generated for the
//! containing cell and its six neighbors and the nearest one wins.
//! Sub-cell resolutions probe a subdivided grid of the same layout.

use crate::geom::{ElevatedPoint, Point};
use crate::grid::hex::HexagonalGrid;
use crate::grid::{
    elevation_layer, layer_elevation, Grid, SnapMode, SnappingBehavior,
};

/// A snap target within one cell: distance from the center and angle in
/// degrees.
#[derive(Copy, Clone, Debug)]
struct PolarTarget {
    radius: f64,
    angle: f64,
}

pub(super) fn snapped_point(
    grid: &HexagonalGrid,
    point: ElevatedPoint,
    behavior: SnappingBehavior,
) -> ElevatedPoint {
    let config = grid.configuration();
    let elevation = layer_elevation(
        config,
        elevation_layer(config, point.elevation),
    );
    let mode = behavior.mode();
    if mode.is_empty() {
        return ElevatedPoint::new(point.x, point.y, elevation);
    }

    if behavior.resolution() > 1 {
        let fine = HexagonalGrid::new(
            config.subdivided(behavior.resolution()),
        );
        let snapped =
            snapped_point(&fine, point, SnappingBehavior::new(mode));
        return ElevatedPoint::new(snapped.x, snapped.y, elevation);
    }

    let planar = point.planar();
    let mut targets = Vec::new();
    collect_targets(grid, mode, &mut targets);

    let rounded = grid.point_to_cube(planar).round();
    let mut best: Option<Point> = None;
    let mut best_distance = f64::INFINITY;
    let cells =
        std::iter::once(rounded).chain(rounded.neighbors());
    for cell in cells {
        let center = grid.cube_to_point(cell);
        let center_wanted = mode.contains(SnapMode::CENTER);
        let candidates = targets
            .iter()
            .map(|target| {
                let radians = target.angle.to_radians();
                Point::new(
                    center.x + target.radius * radians.cos(),
                    center.y + target.radius * radians.sin(),
                )
            })
            .chain(center_wanted.then_some(center));
        for candidate in candidates {
            let distance = planar.distance_squared(candidate);
            if distance < best_distance {
                best_distance = distance;
                best = Some(candidate);
            }
        }
    }

    let nearest = best.unwrap_or(planar);
    ElevatedPoint::new(nearest.x, nearest.y, elevation)
}

/// Fold the mode bits into concrete polar targets for this orientation.
fn collect_targets(
    grid: &HexagonalGrid,
    mode: SnapMode,
    targets: &mut Vec<PolarTarget>,
) {
    let config = grid.configuration();
    let columns = config.columns();
    let vertex_radius = config.size() / 3.0_f64.sqrt();
    let edge_radius = config.size() / 2.0;

    let vertex = |angle: f64| PolarTarget {
        radius: vertex_radius,
        angle,
    };
    let edge = |angle: f64| PolarTarget {
        radius: edge_radius,
        angle,
    };

    // Corners fold onto vertices: a hex cell has only one kind of corner
    let folded = SnapMode::from_bits_truncate(mode.bits() | (mode.bits() >> 4))
        & SnapMode::VERTEX;
    if folded == SnapMode::VERTEX {
        let all = if columns {
            [0.0, 60.0, 120.0, 180.0, 240.0, 300.0]
        } else {
            [30.0, 90.0, 150.0, 210.0, 270.0, 330.0]
        };
        targets.extend(all.map(vertex));
    } else if !folded.is_empty() {
        // Specific vertex bits select the sloped vertices on that side;
        // requesting both bits of a side also unlocks the apex between
        // them
        let sides: [(SnapMode, f64); 4] = if columns {
            [
                (SnapMode::TOP_LEFT_VERTEX, 240.0),
                (SnapMode::TOP_RIGHT_VERTEX, 300.0),
                (SnapMode::BOTTOM_LEFT_VERTEX, 120.0),
                (SnapMode::BOTTOM_RIGHT_VERTEX, 60.0),
            ]
        } else {
            [
                (SnapMode::TOP_LEFT_VERTEX, 210.0),
                (SnapMode::TOP_RIGHT_VERTEX, 330.0),
                (SnapMode::BOTTOM_LEFT_VERTEX, 150.0),
                (SnapMode::BOTTOM_RIGHT_VERTEX, 30.0),
            ]
        };
        for (flag, angle) in sides {
            if folded.contains(flag) {
                targets.push(vertex(angle));
            }
        }
        let apexes: [(SnapMode, f64); 2] = if columns {
            [
                (SnapMode::TOP_LEFT_VERTEX | SnapMode::BOTTOM_LEFT_VERTEX, 180.0),
                (SnapMode::TOP_RIGHT_VERTEX | SnapMode::BOTTOM_RIGHT_VERTEX, 0.0),
            ]
        } else {
            [
                (SnapMode::TOP_LEFT_VERTEX | SnapMode::TOP_RIGHT_VERTEX, 270.0),
                (SnapMode::BOTTOM_LEFT_VERTEX | SnapMode::BOTTOM_RIGHT_VERTEX, 90.0),
            ]
        };
        for (flags, angle) in apexes {
            if folded.contains(flags) {
                targets.push(vertex(angle));
            }
        }
    }

    let all_edges: [f64; 6] = if columns {
        [30.0, 90.0, 150.0, 210.0, 270.0, 330.0]
    } else {
        [0.0, 60.0, 120.0, 180.0, 240.0, 300.0]
    };
    let sides = mode & SnapMode::SIDE_MIDPOINT;
    if mode.contains(SnapMode::EDGE_MIDPOINT) || sides == SnapMode::SIDE_MIDPOINT
    {
        targets.extend(all_edges.map(edge));
    } else if !sides.is_empty() {
        // A "side" of the bounding box covers one or two actual hex edges
        // depending on orientation
        let groups: [(SnapMode, &[f64]); 4] = if columns {
            [
                (SnapMode::TOP_SIDE_MIDPOINT, &[270.0]),
                (SnapMode::BOTTOM_SIDE_MIDPOINT, &[90.0]),
                (SnapMode::LEFT_SIDE_MIDPOINT, &[150.0, 210.0]),
                (SnapMode::RIGHT_SIDE_MIDPOINT, &[330.0, 30.0]),
            ]
        } else {
            [
                (SnapMode::TOP_SIDE_MIDPOINT, &[240.0, 300.0]),
                (SnapMode::BOTTOM_SIDE_MIDPOINT, &[60.0, 120.0]),
                (SnapMode::LEFT_SIDE_MIDPOINT, &[180.0]),
                (SnapMode::RIGHT_SIDE_MIDPOINT, &[0.0]),
            ]
        };
        for (flag, angles) in groups {
            if sides.contains(flag) {
                targets.extend(angles.iter().copied().map(edge));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GridConfiguration;
    use crate::grid::GridOffset3D;
    use assert_approx_eq::assert_approx_eq;

    fn grid(columns: bool) -> HexagonalGrid {
        HexagonalGrid::new(
            GridConfiguration::new(100.0, 5.0)
                .unwrap()
                .with_hex_layout(columns, false),
        )
    }

    #[test]
    fn test_center_snapping() {
        let grid = grid(false);
        let center = grid.center_point(GridOffset3D::new(1, 1, 0).into());
        let near = ElevatedPoint::new(center.x + 9.0, center.y - 7.0, 0.0);
        let snapped =
            grid.snapped_point(near, SnappingBehavior::new(SnapMode::CENTER));
        assert_approx_eq!(snapped.x, center.x);
        assert_approx_eq!(snapped.y, center.y);
    }

    #[test]
    fn test_vertex_snapping_picks_nearest_vertex() {
        let grid = grid(false);
        let center = grid.center_point(GridOffset3D::new(0, 0, 0).into());
        let radius = 100.0 / 3.0_f64.sqrt();
        // Just inside the 330° vertex
        let vertex = Point::new(
            center.x + radius * (330.0_f64).to_radians().cos(),
            center.y + radius * (330.0_f64).to_radians().sin(),
        );
        let near = ElevatedPoint::new(vertex.x - 3.0, vertex.y + 2.0, 0.0);
        let snapped =
            grid.snapped_point(near, SnappingBehavior::new(SnapMode::VERTEX));
        assert_approx_eq!(snapped.x, vertex.x, 1e-9);
        assert_approx_eq!(snapped.y, vertex.y, 1e-9);

        // Corner bits fold onto the same targets
        let corner = grid
            .snapped_point(near, SnappingBehavior::new(SnapMode::CORNER));
        assert_approx_eq!(corner.x, snapped.x, 1e-9);
        assert_approx_eq!(corner.y, snapped.y, 1e-9);
    }

    #[test]
    fn test_specific_vertex_folding() {
        // Pointy-top: TOP_LEFT_VERTEX targets only the 210° vertex of
        // each cell. A shared vertex is the 330° vertex of one cell and
        // the 210° vertex of its eastern neighbor, so it is still a
        // valid target via that neighbor.
        let grid = grid(false);
        let radius = 100.0 / 3.0_f64.sqrt();
        let neighbor = grid.center_point(GridOffset3D::new(0, 2, 0).into());
        let shared = Point::new(
            neighbor.x + radius * (210.0_f64).to_radians().cos(),
            neighbor.y + radius * (210.0_f64).to_radians().sin(),
        );
        let snapped = grid.snapped_point(
            ElevatedPoint::new(shared.x - 3.0, shared.y + 2.0, 0.0),
            SnappingBehavior::new(SnapMode::TOP_LEFT_VERTEX),
        );
        assert_approx_eq!(snapped.x, shared.x, 1e-9);
        assert_approx_eq!(snapped.y, shared.y, 1e-9);

        // Requesting both top bits unlocks the 270° apex as well
        let center = grid.center_point(GridOffset3D::new(0, 1, 0).into());
        let apex = grid.snapped_point(
            ElevatedPoint::new(center.x, center.y - radius, 0.0),
            SnappingBehavior::new(
                SnapMode::TOP_LEFT_VERTEX | SnapMode::TOP_RIGHT_VERTEX,
            ),
        );
        assert_approx_eq!(apex.x, center.x, 1e-9);
        assert_approx_eq!(apex.y, center.y - radius, 1e-9);
    }

    #[test]
    fn test_edge_midpoint_snapping() {
        let grid = grid(false);
        let center = grid.center_point(GridOffset3D::new(0, 0, 0).into());
        // Just off the eastern edge midpoint (angle 0°, distance size/2)
        let near = ElevatedPoint::new(center.x + 47.0, center.y + 2.0, 0.0);
        let snapped = grid.snapped_point(
            near,
            SnappingBehavior::new(SnapMode::EDGE_MIDPOINT),
        );
        assert_approx_eq!(snapped.x, center.x + 50.0, 1e-9);
        assert_approx_eq!(snapped.y, center.y, 1e-9);

        // RIGHT_SIDE_MIDPOINT on pointy-top is exactly that edge
        let side = grid.snapped_point(
            near,
            SnappingBehavior::new(SnapMode::RIGHT_SIDE_MIDPOINT),
        );
        assert_approx_eq!(side.x, snapped.x, 1e-9);
        assert_approx_eq!(side.y, snapped.y, 1e-9);
    }

    #[test]
    fn test_flat_top_folding_differs() {
        // Flat-top: the left side covers the two sloped edges at 150°
        // and 210°; there is no single left edge
        let grid = grid(true);
        let center = grid.center_point(GridOffset3D::new(0, 0, 0).into());
        let near = ElevatedPoint::new(center.x - 40.0, center.y - 25.0, 0.0);
        let snapped = grid.snapped_point(
            near,
            SnappingBehavior::new(SnapMode::LEFT_SIDE_MIDPOINT),
        );
        let dx = snapped.x - center.x;
        let dy = snapped.y - center.y;
        let angle = dy.atan2(dx).to_degrees().rem_euclid(360.0);
        assert!(
            (angle - 150.0).abs() < 1e-6 || (angle - 210.0).abs() < 1e-6,
            "unexpected target angle {angle}"
        );
    }

    #[test]
    fn test_resolution_probes_finer_grid() {
        let grid = grid(false);
        let behavior =
            SnappingBehavior::with_resolution(SnapMode::CENTER, 2).unwrap();
        let point = ElevatedPoint::new(40.0, 40.0, 0.0);
        let snapped = grid.snapped_point(point, behavior);
        // The result is a cell center of the half-size grid, so snapping
        // it back to a fine center is the identity
        let fine = HexagonalGrid::new(grid.configuration().subdivided(2));
        let recentered = fine.center_point(snapped.into());
        assert_approx_eq!(snapped.x, recentered.x, 1e-9);
        assert_approx_eq!(snapped.y, recentered.y, 1e-9);
    }

    #[test]
    fn test_empty_mode_snaps_elevation_only() {
        let grid = grid(false);
        let behavior = SnappingBehavior::new(SnapMode::empty());
        let snapped = grid
            .snapped_point(ElevatedPoint::new(13.0, 71.0, 6.4), behavior);
        assert_approx_eq!(snapped.x, 13.0);
        assert_approx_eq!(snapped.y, 71.0);
        assert_approx_eq!(snapped.elevation, 5.0);
    }
}
