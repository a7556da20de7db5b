//! Multi-cell token footprints on hexagonal grids.
//!
//! A footprint is the set of cells a `width` x `height` token occupies,
//! plus the pixel outline of that cell set. Deriving one is relatively
//! expensive (outline chaining over boundary edges), and the same handful
//! of sizes recurs constantly, so results are memoized globally by their
//! structural key.

use crate::geom::Point;
use crate::grid::hex::HexagonalGrid;
use crate::grid::{Grid, GridOffset2D};
use anyhow::ensure;
use fnv::{FnvHashMap, FnvHashSet};
use log::debug;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, LazyLock, RwLock};
use strum::{Display, EnumIter};

/// The footprint variants. The `1`/`2` pairs differ in rounding
/// direction: where a row must be placed off-center by half a cell, the
/// `1` variant leans right and the `2` variant leans left (and the
/// ellipse variants additionally pick the upper or lower middle row as
/// the widest one).
#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum HexShapeKind {
    Ellipse1,
    Ellipse2,
    Trapezoid1,
    Trapezoid2,
    Rectangle1,
    Rectangle2,
}

impl HexShapeKind {
    fn leans_right(self) -> bool {
        matches!(self, Self::Ellipse1 | Self::Trapezoid1 | Self::Rectangle1)
    }
}

/// One derived footprint. Offsets are relative to the anchor cell;
/// outline and center are in pixels relative to the anchor cell's
/// top-left corner.
#[derive(Clone, Debug, PartialEq)]
pub struct HexFootprint {
    pub offsets: Vec<GridOffset2D>,
    pub outline: Vec<Point>,
    pub center: Point,
}

#[derive(Copy, Clone, PartialEq, Eq, Hash)]
struct FootprintKey {
    width: u32,
    height: u32,
    kind: HexShapeKind,
    columns: bool,
    anchor_staggered: bool,
    size_bits: u64,
}

static CACHE: LazyLock<RwLock<FnvHashMap<FootprintKey, Arc<HexFootprint>>>> =
    LazyLock::new(|| RwLock::new(FnvHashMap::default()));

pub(super) fn footprint(
    grid: &HexagonalGrid,
    width: u32,
    height: u32,
    kind: HexShapeKind,
    anchor_staggered: bool,
) -> anyhow::Result<Arc<HexFootprint>> {
    ensure!(
        width > 0 && height > 0,
        "footprint dimensions must be positive, but were {width}x{height}"
    );
    // The tapering kinds need every line to keep at least one cell
    let constructible = match kind {
        HexShapeKind::Rectangle1 | HexShapeKind::Rectangle2 => true,
        HexShapeKind::Trapezoid1 | HexShapeKind::Trapezoid2 => {
            height <= width
        }
        HexShapeKind::Ellipse1 | HexShapeKind::Ellipse2 => {
            height / 2 <= width - 1 || height == 1
        }
    };
    ensure!(
        constructible,
        "a {kind} footprint cannot be {width} cells wide and {height} tall"
    );
    let config = grid.configuration();
    let key = FootprintKey {
        width,
        height,
        kind,
        columns: config.columns(),
        anchor_staggered,
        size_bits: config.size().to_bits(),
    };
    if let Some(cached) = CACHE.read().expect("footprint cache").get(&key) {
        return Ok(Arc::clone(cached));
    }

    debug!(
        "deriving {kind} footprint {width}x{height} \
         (columns={}, staggered={anchor_staggered})",
        key.columns
    );
    let derived = Arc::new(derive(grid, width, height, kind, anchor_staggered));
    let mut cache = CACHE.write().expect("footprint cache");
    Ok(Arc::clone(
        cache.entry(key).or_insert(derived),
    ))
}

/// Cells per cross-axis line and their placement, in main-axis line
/// index / cross-axis cell index space.
fn occupied_lines(
    width: u32,
    height: u32,
    kind: HexShapeKind,
    anchor_staggered: bool,
) -> Vec<(i32, i32, u32)> {
    let width = width as i32;
    let height = height as i32;
    let count_at = |line: i32| -> i32 {
        let shrink = match kind {
            HexShapeKind::Rectangle1 | HexShapeKind::Rectangle2 => 0,
            HexShapeKind::Trapezoid1 => line,
            HexShapeKind::Trapezoid2 => height - 1 - line,
            HexShapeKind::Ellipse1 => (line - (height - 1) / 2).abs(),
            HexShapeKind::Ellipse2 => (line - height / 2).abs(),
        };
        width - shrink
    };

    (0..height)
        .map(|line| {
            let staggered = anchor_staggered != (line % 2 == 1);
            let shift = (width - count_at(line)) as f64 / 2.0
                - if staggered { 0.5 } else { 0.0 };
            let start = if kind.leans_right() {
                (shift + 0.5).floor() as i32
            } else {
                (shift - 0.5).ceil() as i32
            };
            (line, start, count_at(line) as u32)
        })
        .collect()
}

fn derive(
    grid: &HexagonalGrid,
    width: u32,
    height: u32,
    kind: HexShapeKind,
    anchor_staggered: bool,
) -> HexFootprint {
    let config = grid.configuration();
    let columns = config.columns();
    let size = config.size();
    let radius = size / 3.0_f64.sqrt();
    let spacing = 1.5 * radius;

    let lines = occupied_lines(width, height, kind, anchor_staggered);
    let mut cells: Vec<(i32, i32)> = Vec::new();
    for &(line, start, count) in &lines {
        for cell in start..start + count as i32 {
            cells.push((line, cell));
        }
    }

    // Pixel center of a cell, relative to the anchor cell's top-left.
    // `line` runs along the staggered axis, `cell` across it.
    let anchor_shift = if anchor_staggered { size / 2.0 } else { 0.0 };
    let center_of = |(line, cell): (i32, i32)| -> Point {
        let staggered = anchor_staggered != (line % 2 == 1);
        let shift = if staggered { size / 2.0 } else { 0.0 };
        let cross =
            size * f64::from(cell) + shift - anchor_shift + size / 2.0;
        let main = spacing * f64::from(line) + radius;
        if columns {
            Point::new(main, cross)
        } else {
            Point::new(cross, main)
        }
    };

    // Boundary edges: every cell edge whose mirrored neighbor is not
    // occupied. Neighbor centers are matched by quantized position.
    let quantize = |point: Point| -> (i64, i64) {
        ((point.x / size * 256.0).round() as i64,
         (point.y / size * 256.0).round() as i64)
    };
    let occupied: FnvHashSet<(i64, i64)> = cells
        .iter()
        .map(|&cell| quantize(center_of(cell)))
        .collect();

    let vertex_angles: [f64; 6] = if columns {
        [0.0, 60.0, 120.0, 180.0, 240.0, 300.0]
    } else {
        [30.0, 90.0, 150.0, 210.0, 270.0, 330.0]
    };
    let mut boundary: FnvHashMap<(i64, i64), (Point, Point)> =
        FnvHashMap::default();
    for &cell in &cells {
        let center = center_of(cell);
        let vertices: Vec<Point> = vertex_angles
            .iter()
            .map(|angle| {
                let radians = angle.to_radians();
                Point::new(
                    center.x + radius * radians.cos(),
                    center.y + radius * radians.sin(),
                )
            })
            .collect();
        for idx in 0..6 {
            let a = vertices[idx];
            let b = vertices[(idx + 1) % 6];
            // The neighbor across this edge is the center mirrored
            // through the edge midpoint
            let neighbor = Point::new(a.x + b.x - center.x, a.y + b.y - center.y);
            if !occupied.contains(&quantize(neighbor)) {
                boundary.insert(quantize(a), (a, b));
            }
        }
    }

    // Chain the boundary edges end-to-start into one closed outline
    let mut outline = Vec::with_capacity(boundary.len());
    if let Some(&first_key) = boundary.keys().next() {
        let mut key = first_key;
        while let Some((a, b)) = boundary.remove(&key) {
            outline.push(a);
            key = quantize(b);
            if key == first_key {
                break;
            }
        }
    }

    let center = if cells.is_empty() {
        Point::ORIGIN
    } else {
        let sum = cells
            .iter()
            .fold(Point::ORIGIN, |sum, &cell| {
                let center = center_of(cell);
                Point::new(sum.x + center.x, sum.y + center.y)
            });
        Point::new(sum.x / cells.len() as f64, sum.y / cells.len() as f64)
    };

    let offsets = cells
        .into_iter()
        .map(|(line, cell)| {
            if columns {
                GridOffset2D::new(cell, line)
            } else {
                GridOffset2D::new(line, cell)
            }
        })
        .collect();

    HexFootprint {
        offsets,
        outline,
        center,
    }
}
