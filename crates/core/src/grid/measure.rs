//! Path measurement along multi-waypoint routes. The accumulation skeleton
//! here is identical for every topology; the per-segment numeric fill is
//! delegated to the concrete grid's `measure_segment`.

use crate::geom::{ElevatedPoint, Point};
use crate::grid::{Grid, GridOffset3D};
use derive_more::{Add, AddAssign};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};

/// Cost override for the segment ending at a waypoint. Without one, a
/// segment's cost equals its measured distance.
pub enum SegmentCost {
    /// A constant cost for the whole segment.
    Fixed(f64),
    /// A callback receiving the two endpoint offsets and the default
    /// (distance-equals-cost) value, returning a non-negative cost. Any
    /// caller-specific context rides in the closure capture. Never invoked
    /// for a zero-displacement move.
    Callback(Box<dyn Fn(GridOffset3D, GridOffset3D, f64) -> f64>),
}

impl Debug for SegmentCost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(cost) => write!(f, "SegmentCost::Fixed({cost})"),
            Self::Callback(_) => write!(f, "SegmentCost::Callback(..)"),
        }
    }
}

/// One waypoint of a path to be measured.
#[derive(Debug)]
pub struct PathWaypoint {
    pub point: ElevatedPoint,
    /// Teleportation: the segment ending here reports its raw distance but
    /// contributes zero cost, spaces and diagonals.
    pub teleport: bool,
    /// When false, the segment ending here contributes nothing at all.
    pub measure: bool,
    /// Optional cost override for the segment ending here.
    pub cost: Option<SegmentCost>,
}

impl PathWaypoint {
    pub fn new(point: impl Into<ElevatedPoint>) -> Self {
        Self {
            point: point.into(),
            teleport: false,
            measure: true,
            cost: None,
        }
    }

    pub fn teleport(mut self) -> Self {
        self.teleport = true;
        self
    }

    pub fn unmeasured(mut self) -> Self {
        self.measure = false;
        self
    }

    pub fn with_cost(mut self, cost: SegmentCost) -> Self {
        self.cost = Some(cost);
        self
    }
}

impl From<ElevatedPoint> for PathWaypoint {
    fn from(point: ElevatedPoint) -> Self {
        Self::new(point)
    }
}

impl From<Point> for PathWaypoint {
    fn from(point: Point) -> Self {
        Self::new(point)
    }
}

/// Measured quantities of one path leg, or (summed) of a path prefix.
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    PartialEq,
    Add,
    AddAssign,
    Serialize,
    Deserialize,
)]
pub struct Measurement {
    /// Distance in game units under the grid's metric and diagonal rule.
    pub distance: f64,
    /// Cost in game units; equals `distance` unless overridden.
    pub cost: f64,
    /// Number of discrete cell-to-cell steps ("spaces").
    pub spaces: u32,
    /// How many of those steps were diagonal.
    pub diagonals: u32,
    /// True Euclidean length in game units, ignoring the diagonal rule.
    pub euclidean: f64,
}

/// A waypoint of a measured path, carrying running totals from the start
/// of the path up to this waypoint.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeasuredWaypoint {
    pub point: ElevatedPoint,
    pub cumulative: Measurement,
}

/// Result of measuring a multi-waypoint path: per-leg segment values plus
/// cumulative values at every waypoint.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PathMeasurement {
    pub waypoints: Vec<MeasuredWaypoint>,
    pub segments: Vec<Measurement>,
}

impl PathMeasurement {
    /// Totals over the whole path (the last waypoint's running totals).
    pub fn totals(&self) -> Measurement {
        self.waypoints
            .last()
            .map(|waypoint| waypoint.cumulative)
            .unwrap_or_default()
    }

    pub fn distance(&self) -> f64 {
        self.totals().distance
    }

    pub fn cost(&self) -> f64 {
        self.totals().cost
    }

    pub fn spaces(&self) -> u32 {
        self.totals().spaces
    }
}

/// Per-path mutable state threaded through successive `measure_segment`
/// calls. The alternating diagonal rules need to know how many diagonals
/// the path has already spent to price the next one.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct MeasureState {
    /// Cumulative diagonal steps taken since the start of the path.
    pub diagonals: u64,
}

impl MeasureState {
    /// Price `count` further diagonal steps under an alternating rule
    /// whose first diagonal of a path costs `first` and which alternates
    /// with `3 - first` (so 1,2,1,2,... or 2,1,2,1,...), then advance the
    /// running counter.
    pub fn alternating_cost(&mut self, first: u64, count: u64) -> f64 {
        let start = self.diagonals;
        let end = start + count;
        self.diagonals = end;
        let cost = if first == 1 {
            // Odd-numbered diagonals cost 1, even-numbered cost 2
            count + end / 2 - start / 2
        } else {
            count + end.div_ceil(2) - start.div_ceil(2)
        };
        cost as f64
    }
}

/// Numeric fill for one segment, produced by the concrete grid. Cost is
/// not part of this: the template applies cost policy afterwards.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct SegmentMeasurement {
    pub distance: f64,
    pub spaces: u32,
    pub diagonals: u32,
    pub euclidean: f64,
}

/// The shared template behind [Grid::measure_path]: walk consecutive
/// waypoint pairs, delegate the numeric work, apply the per-waypoint flags
/// and cost policy, and accumulate running totals.
pub(crate) fn measure_path_impl<G: Grid + ?Sized>(
    grid: &G,
    waypoints: &[PathWaypoint],
) -> PathMeasurement {
    let mut result = PathMeasurement {
        waypoints: Vec::with_capacity(waypoints.len()),
        segments: Vec::with_capacity(waypoints.len().saturating_sub(1)),
    };
    let mut totals = Measurement::default();
    let mut state = MeasureState::default();
    let mut previous: Option<&PathWaypoint> = None;

    for waypoint in waypoints {
        if let Some(from) = previous {
            let segment = measure_leg(grid, from, waypoint, &mut state);
            totals += segment;
            result.segments.push(segment);
        }
        result.waypoints.push(MeasuredWaypoint {
            point: waypoint.point,
            cumulative: totals,
        });
        previous = Some(waypoint);
    }
    result
}

fn measure_leg<G: Grid + ?Sized>(
    grid: &G,
    from: &PathWaypoint,
    to: &PathWaypoint,
    state: &mut MeasureState,
) -> Measurement {
    if !to.measure {
        // Unmeasured legs contribute nothing and leave the alternating
        // counter untouched
        return Measurement::default();
    }

    let saved = *state;
    let raw = grid.measure_segment(from.point, to.point, state);

    if to.teleport {
        // Teleports report raw distance but no discrete movement, and do
        // not advance the alternating counter
        *state = saved;
        return Measurement {
            distance: raw.distance,
            cost: 0.0,
            spaces: 0,
            diagonals: 0,
            euclidean: raw.euclidean,
        };
    }

    let cost = match &to.cost {
        None => raw.distance,
        Some(SegmentCost::Fixed(cost)) => *cost,
        Some(SegmentCost::Callback(callback)) => {
            let origin = grid.offset(from.point.into());
            let destination = grid.offset(to.point.into());
            if origin == destination {
                0.0
            } else {
                let cost = callback(origin, destination, raw.distance);
                // Contract violation, not a recoverable condition
                assert!(
                    cost >= 0.0,
                    "segment cost callback returned negative cost {cost}"
                );
                cost
            }
        }
    };

    Measurement {
        distance: raw.distance,
        cost,
        spaces: raw.spaces,
        diagonals: raw.diagonals,
        euclidean: raw.euclidean,
    }
}
