//! Continuous-space geometry: the pixel-space point types and the small set
//! of numeric primitives that the grid implementations (and external polygon
//! logic) are built on. Everything in here is a pure function of its inputs.
//!
//! Pixel space uses screen conventions: `x` grows right, `y` grows down.

use derive_more::{Add, AddAssign, Display, Div, Mul, Sub, SubAssign};
use serde::{Deserialize, Serialize};

/// Tolerance used by the intersection primitives to absorb floating point
/// noise at segment endpoints and tangencies.
pub const EPSILON: f64 = 1e-8;

/// A continuous point in pixel space.
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    PartialEq,
    Display,
    Add,
    AddAssign,
    Sub,
    SubAssign,
    Mul,
    Div,
    Serialize,
    Deserialize,
)]
#[display(fmt = "({}, {})", x, y)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Dot product, treating both points as vectors from the origin.
    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Z component of the cross product, treating both points as vectors.
    pub fn cross(self, other: Self) -> f64 {
        self.x * other.y - self.y * other.x
    }

    /// Euclidean distance to another point.
    pub fn distance_to(self, other: Self) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Squared Euclidean distance. Cheaper than [Self::distance_to] when
    /// only comparing magnitudes.
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        dx * dx + dy * dy
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// A continuous point in pixel space with an elevation, measured in game
/// units (not pixels). Elevation zero is the battle map surface.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Display, Serialize, Deserialize,
)]
#[display(fmt = "({}, {}, {})", x, y, elevation)]
pub struct ElevatedPoint {
    pub x: f64,
    pub y: f64,
    pub elevation: f64,
}

impl ElevatedPoint {
    pub const fn new(x: f64, y: f64, elevation: f64) -> Self {
        Self { x, y, elevation }
    }

    /// Drop the elevation component.
    pub fn planar(self) -> Point {
        Point::new(self.x, self.y)
    }
}

impl From<Point> for ElevatedPoint {
    fn from(point: Point) -> Self {
        Self::new(point.x, point.y, 0.0)
    }
}

impl From<ElevatedPoint> for Point {
    fn from(point: ElevatedPoint) -> Self {
        point.planar()
    }
}

/// An axis-aligned pixel rectangle. `width`/`height` may be zero, in which
/// case the rectangle is degenerate but still has a position.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rectangle {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rectangle {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Twice the signed area of the triangle `(a, b, c)`. Positive when the
/// three points wind clockwise in screen coordinates (y down), negative
/// counterclockwise, zero when collinear.
///
/// This is the fast, non-robust formulation: for nearly collinear inputs
/// the sign can be wrong due to floating point cancellation. Callers that
/// only use it as a cheap pre-test (e.g. segment intersection) are fine
/// with that; don't use it where exact orientation of degenerate triangles
/// matters.
pub fn orient2d_fast(a: Point, b: Point, c: Point) -> f64 {
    (a.y - c.y) * (b.x - c.x) - (a.x - c.x) * (b.y - c.y)
}

/// The intersection of two infinite lines, each given by two points on it.
/// Returns `None` for parallel lines and for zero-length inputs (which
/// don't define a line).
pub fn line_line_intersection(
    a: Point,
    b: Point,
    c: Point,
    d: Point,
) -> Option<Point> {
    let ab = b - a;
    let cd = d - c;
    let denominator = ab.cross(cd);
    if denominator.abs() < EPSILON {
        return None;
    }
    let t = (c - a).cross(cd) / denominator;
    Some(Point::new(a.x + t * ab.x, a.y + t * ab.y))
}

/// The intersection of two line *segments*. Like [line_line_intersection],
/// but the solution is only accepted when it falls within both segments
/// (with a small epsilon of slack at the endpoints).
pub fn line_segment_intersection(
    a: Point,
    b: Point,
    c: Point,
    d: Point,
) -> Option<Point> {
    // Cheap orientation pre-test: the segments can only cross if the
    // endpoints of each straddle the other's supporting line
    if orient2d_fast(a, b, c) * orient2d_fast(a, b, d) > 0.0
        || orient2d_fast(c, d, a) * orient2d_fast(c, d, b) > 0.0
    {
        return None;
    }

    let ab = b - a;
    let cd = d - c;
    let denominator = ab.cross(cd);
    if denominator.abs() < EPSILON {
        return None;
    }
    let t0 = (c - a).cross(cd) / denominator;
    let t1 = (c - a).cross(ab) / denominator;
    if !(-EPSILON..=1.0 + EPSILON).contains(&t0)
        || !(-EPSILON..=1.0 + EPSILON).contains(&t1)
    {
        return None;
    }
    let t = t0.clamp(0.0, 1.0);
    Some(Point::new(a.x + t * ab.x, a.y + t * ab.y))
}

/// One intersection of a segment with a circle, as the parameter `t` along
/// the segment plus the point itself.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CircleIntersection {
    pub t: f64,
    pub point: Point,
}

/// Intersections of the segment `a -> b` with a circle, in increasing
/// parameter order. A near-zero discriminant is collapsed to a single exact
/// tangency. Zero-length segments and zero-radius circles produce no
/// intersections.
pub fn line_circle_intersection(
    a: Point,
    b: Point,
    center: Point,
    radius: f64,
) -> Vec<CircleIntersection> {
    if radius <= 0.0 {
        return Vec::new();
    }
    let r2 = radius * radius;
    let a_inside = a.distance_squared(center) < r2;
    let b_inside = b.distance_squared(center) < r2;
    if a_inside && b_inside {
        // Fully contained, can't touch the boundary
        return Vec::new();
    }
    quadratic_intersection(a, b, center, radius)
}

/// Solve the quadratic for segment/circle intersection parameters. This is
/// the numeric core of [line_circle_intersection]; prefer calling that,
/// which adds the containment fast path.
pub fn quadratic_intersection(
    a: Point,
    b: Point,
    center: Point,
    radius: f64,
) -> Vec<CircleIntersection> {
    let d = b - a;
    let f = a - center;
    let qa = d.dot(d);
    if qa < EPSILON {
        // Zero-length segment
        return Vec::new();
    }
    let qb = 2.0 * f.dot(d);
    let qc = f.dot(f) - radius * radius;

    let discriminant = qb * qb - 4.0 * qa * qc;
    let at = |t: f64| CircleIntersection {
        t,
        point: Point::new(a.x + t * d.x, a.y + t * d.y),
    };

    if discriminant.abs() < EPSILON {
        // Tangent: one touch point
        let t = -qb / (2.0 * qa);
        if (-EPSILON..=1.0 + EPSILON).contains(&t) {
            return vec![at(t.clamp(0.0, 1.0))];
        }
        return Vec::new();
    }
    if discriminant < 0.0 {
        return Vec::new();
    }

    let root = discriminant.sqrt();
    let mut intersections = Vec::with_capacity(2);
    for t in [(-qb - root) / (2.0 * qa), (-qb + root) / (2.0 * qa)] {
        if (-EPSILON..=1.0 + EPSILON).contains(&t) {
            intersections.push(at(t.clamp(0.0, 1.0)));
        }
    }
    intersections
}

/// Area-weighted centroid of a simple polygon (shoelace formula). The
/// polygon may be given open or closed; winding doesn't matter. Degenerate
/// polygons (fewer than 3 vertices, or zero area) fall back to the plain
/// vertex average.
pub fn polygon_centroid(points: &[Point]) -> Point {
    if points.len() < 3 {
        return vertex_average(points);
    }
    let mut area = 0.0;
    let mut cx = 0.0;
    let mut cy = 0.0;
    for (idx, p0) in points.iter().enumerate() {
        let p1 = points[(idx + 1) % points.len()];
        let cross = p0.cross(p1);
        area += cross;
        cx += (p0.x + p1.x) * cross;
        cy += (p0.y + p1.y) * cross;
    }
    if area.abs() < EPSILON {
        return vertex_average(points);
    }
    area *= 0.5;
    Point::new(cx / (6.0 * area), cy / (6.0 * area))
}

/// [polygon_centroid] for a flat `[x0, y0, x1, y1, ...]` coordinate array.
pub fn polygon_centroid_flat(coordinates: &[f64]) -> Point {
    let points: Vec<Point> = coordinates
        .chunks_exact(2)
        .map(|pair| Point::new(pair[0], pair[1]))
        .collect();
    polygon_centroid(&points)
}

fn vertex_average(points: &[Point]) -> Point {
    if points.is_empty() {
        return Point::ORIGIN;
    }
    let n = points.len() as f64;
    let sum = points
        .iter()
        .fold(Point::ORIGIN, |accumulator, p| accumulator + *p);
    Point::new(sum.x / n, sum.y / n)
}

/// The point on the segment `a -> b` closest to `p`.
pub fn closest_point_on_segment(p: Point, a: Point, b: Point) -> Point {
    let ab = b - a;
    let length_squared = ab.dot(ab);
    if length_squared < EPSILON {
        // Degenerate segment
        return a;
    }
    let t = ((p - a).dot(ab) / length_squared).clamp(0.0, 1.0);
    Point::new(a.x + t * ab.x, a.y + t * ab.y)
}

/// Distance from `p` to the segment `a -> b`.
pub fn point_segment_distance(p: Point, a: Point, b: Point) -> f64 {
    p.distance_to(closest_point_on_segment(p, a, b))
}

/// Whether any edge of the polyline passes within `radius` of `center`.
/// With `closed`, the final-to-first edge is tested too. A polyline with a
/// single point degenerates to a point-in-circle test; an empty one never
/// intersects.
pub fn path_circle_intersects(
    points: &[Point],
    closed: bool,
    center: Point,
    radius: f64,
) -> bool {
    match points {
        [] => false,
        [only] => only.distance_to(center) <= radius,
        _ => {
            let edge_count = if closed {
                points.len()
            } else {
                points.len() - 1
            };
            (0..edge_count).any(|idx| {
                let a = points[idx];
                let b = points[(idx + 1) % points.len()];
                point_segment_distance(center, a, b) <= radius
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_orientation_signs() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 0.0);
        // y grows down, so a point below the a->b line winds clockwise
        assert!(orient2d_fast(a, b, Point::new(5.0, 5.0)) > 0.0);
        assert!(orient2d_fast(a, b, Point::new(5.0, -5.0)) < 0.0);
        assert_eq!(orient2d_fast(a, b, Point::new(20.0, 0.0)), 0.0);
    }

    #[test]
    fn test_line_line_intersection() {
        let p = line_line_intersection(
            Point::new(0.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
            Point::new(10.0, 0.0),
        )
        .unwrap();
        assert_approx_eq!(p.x, 5.0);
        assert_approx_eq!(p.y, 5.0);

        // Parallel
        assert_eq!(
            line_line_intersection(
                Point::new(0.0, 0.0),
                Point::new(10.0, 0.0),
                Point::new(0.0, 1.0),
                Point::new(10.0, 1.0),
            ),
            None
        );
        // Zero-length input doesn't define a line
        assert_eq!(
            line_line_intersection(
                Point::new(3.0, 3.0),
                Point::new(3.0, 3.0),
                Point::new(0.0, 1.0),
                Point::new(10.0, 1.0),
            ),
            None
        );
    }

    #[test]
    fn test_segment_intersection_bounds() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 0.0);
        // Crosses within both segments
        assert!(line_segment_intersection(
            a,
            b,
            Point::new(5.0, -5.0),
            Point::new(5.0, 5.0)
        )
        .is_some());
        // The infinite lines cross, but outside one segment
        assert!(line_segment_intersection(
            a,
            b,
            Point::new(15.0, -5.0),
            Point::new(15.0, 5.0)
        )
        .is_none());
        // Touching exactly at an endpoint is accepted
        assert!(line_segment_intersection(
            a,
            b,
            Point::new(10.0, -5.0),
            Point::new(10.0, 5.0)
        )
        .is_some());
    }

    #[test]
    fn test_line_circle_intersection() {
        let center = Point::new(0.0, 0.0);

        // Secant: two intersections
        let hits = line_circle_intersection(
            Point::new(-10.0, 0.0),
            Point::new(10.0, 0.0),
            center,
            5.0,
        );
        assert_eq!(hits.len(), 2);
        assert_approx_eq!(hits[0].point.x, -5.0);
        assert_approx_eq!(hits[1].point.x, 5.0);
        assert!(hits[0].t < hits[1].t);

        // Tangent: collapsed to a single touch point
        let hits = line_circle_intersection(
            Point::new(-10.0, 5.0),
            Point::new(10.0, 5.0),
            center,
            5.0,
        );
        assert_eq!(hits.len(), 1);
        assert_approx_eq!(hits[0].point.x, 0.0);
        assert_approx_eq!(hits[0].point.y, 5.0);

        // Miss
        assert!(line_circle_intersection(
            Point::new(-10.0, 9.0),
            Point::new(10.0, 9.0),
            center,
            5.0,
        )
        .is_empty());

        // One endpoint inside: single crossing
        let hits = line_circle_intersection(
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            center,
            5.0,
        );
        assert_eq!(hits.len(), 1);
        assert_approx_eq!(hits[0].point.x, 5.0);

        // Degenerate inputs are no-ops
        assert!(line_circle_intersection(
            Point::new(1.0, 1.0),
            Point::new(1.0, 1.0),
            center,
            5.0
        )
        .is_empty());
        assert!(line_circle_intersection(
            Point::new(-10.0, 0.0),
            Point::new(10.0, 0.0),
            center,
            0.0
        )
        .is_empty());
    }

    #[test]
    fn test_polygon_centroid() {
        // Unit square, both vertex orders
        let square = [
            Point::new(0.0, 0.0),
            Point::new(2.0, 0.0),
            Point::new(2.0, 2.0),
            Point::new(0.0, 2.0),
        ];
        let centroid = polygon_centroid(&square);
        assert_approx_eq!(centroid.x, 1.0);
        assert_approx_eq!(centroid.y, 1.0);

        let reversed: Vec<Point> = square.iter().rev().copied().collect();
        let centroid = polygon_centroid(&reversed);
        assert_approx_eq!(centroid.x, 1.0);
        assert_approx_eq!(centroid.y, 1.0);

        // Flat-array form agrees
        let flat = polygon_centroid_flat(&[
            0.0, 0.0, 2.0, 0.0, 2.0, 2.0, 0.0, 2.0,
        ]);
        assert_approx_eq!(flat.x, 1.0);
        assert_approx_eq!(flat.y, 1.0);

        // The centroid is area-weighted, not the vertex average: an L-shape
        // pulls towards the thick part
        let ell = [
            Point::new(0.0, 0.0),
            Point::new(4.0, 0.0),
            Point::new(4.0, 1.0),
            Point::new(1.0, 1.0),
            Point::new(1.0, 4.0),
            Point::new(0.0, 4.0),
        ];
        let centroid = polygon_centroid(&ell);
        assert!(centroid.x < 2.0);
        assert!(centroid.y < 2.0);
    }

    #[test]
    fn test_point_segment_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 0.0);
        // Projection within the segment
        assert_approx_eq!(
            point_segment_distance(Point::new(5.0, 3.0), a, b),
            3.0
        );
        // Projection clamps to the nearer endpoint
        assert_approx_eq!(
            point_segment_distance(Point::new(-3.0, 4.0), a, b),
            5.0
        );
        // Degenerate segment
        assert_approx_eq!(
            point_segment_distance(Point::new(3.0, 4.0), a, a),
            5.0
        );
    }

    #[test]
    fn test_path_circle_intersects() {
        let path = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
        ];
        assert!(path_circle_intersects(
            &path,
            false,
            Point::new(5.0, 1.0),
            2.0
        ));
        assert!(!path_circle_intersects(
            &path,
            false,
            Point::new(0.0, 10.0),
            2.0
        ));
        // The closing edge only counts when the path is closed
        assert!(path_circle_intersects(
            &path,
            true,
            Point::new(4.0, 4.0),
            1.0
        ));
        assert!(!path_circle_intersects(
            &path,
            false,
            Point::new(4.0, 4.0),
            1.0
        ));
        assert!(!path_circle_intersects(&[], false, Point::ORIGIN, 100.0));
    }
}
