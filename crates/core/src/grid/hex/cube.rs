//! Cube coordinates for hexagonal grids.
//!
//! A cube coordinate addresses a hex cell with three axes `(q, r, s)`
//! constrained to `q + r + s = 0`. Only `q` and `r` are stored; `s` is
//! derived, so the invariant holds by construction for integer cubes.
//! Fractional cubes appear transiently while converting continuous points
//! and are collapsed back onto the lattice with [FractionalHexCube::round].

use anyhow::ensure;
use derive_more::{Add, Display, Sub};
use serde::{Deserialize, Serialize};

/// Integer cube coordinate of one hex cell.
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
#[display(fmt = "({}, {}, {})", q, r, "self.s()")]
pub struct HexCube {
    pub q: i32,
    pub r: i32,
}

impl HexCube {
    /// The six neighbor directions, in increasing angle order starting
    /// from +q (east for pointy-top, south-east for flat-top).
    pub const DIRECTIONS: [HexCube; 6] = [
        HexCube::new(1, 0),
        HexCube::new(0, 1),
        HexCube::new(-1, 1),
        HexCube::new(-1, 0),
        HexCube::new(0, -1),
        HexCube::new(1, -1),
    ];

    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    /// Build a cube from all three axes, verifying `q + r + s = 0`.
    pub fn from_axes(q: i32, r: i32, s: i32) -> anyhow::Result<Self> {
        ensure!(
            q + r + s == 0,
            "cube axes must sum to zero, but ({q}, {r}, {s}) sums to {}",
            q + r + s
        );
        Ok(Self { q, r })
    }

    /// The derived third axis.
    pub const fn s(self) -> i32 {
        -self.q - self.r
    }

    /// Number of cell steps between two cubes.
    pub fn distance(self, other: Self) -> u32 {
        let dq = self.q.abs_diff(other.q);
        let dr = self.r.abs_diff(other.r);
        let ds = self.s().abs_diff(other.s());
        (dq + dr + ds) / 2
    }

    /// The six neighboring cubes, in [Self::DIRECTIONS] order.
    pub fn neighbors(self) -> [HexCube; 6] {
        Self::DIRECTIONS.map(|direction| self + direction)
    }
}

/// A cube coordinate mid-conversion, before rounding onto the lattice.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FractionalHexCube {
    pub q: f64,
    pub r: f64,
    pub s: f64,
}

impl FractionalHexCube {
    pub fn new(q: f64, r: f64) -> Self {
        Self { q, r, s: -q - r }
    }

    /// Linear interpolation between two cubes at parameter `t`.
    pub fn lerp(a: Self, b: Self, t: f64) -> Self {
        Self {
            q: a.q + (b.q - a.q) * t,
            r: a.r + (b.r - a.r) * t,
            s: a.s + (b.s - a.s) * t,
        }
    }

    /// A copy nudged off exact cell boundaries. Segments collinear with a
    /// hex edge would otherwise round ambiguously between two equally
    /// valid cell sequences; the nudge picks one deterministically.
    pub fn nudged(self) -> Self {
        Self {
            q: self.q + 1e-6,
            r: self.r + 2e-6,
            s: self.s - 3e-6,
        }
    }

    /// Snap to the nearest valid integer cube: round all three axes, then
    /// recompute whichever axis has the largest rounding error from the
    /// other two so the axes still sum to zero.
    pub fn round(self) -> HexCube {
        let q = self.q.round();
        let r = self.r.round();
        let s = self.s.round();
        let dq = (q - self.q).abs();
        let dr = (r - self.r).abs();
        let ds = (s - self.s).abs();
        if dq > dr && dq > ds {
            HexCube::new((-r - s) as i32, r as i32)
        } else if dr > ds {
            HexCube::new(q as i32, (-q - s) as i32)
        } else {
            HexCube::new(q as i32, r as i32)
        }
    }
}

impl From<HexCube> for FractionalHexCube {
    fn from(cube: HexCube) -> Self {
        Self {
            q: f64::from(cube.q),
            r: f64::from(cube.r),
            s: f64::from(cube.s()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_sum_invariant() {
        assert_eq!(HexCube::new(2, -5).s(), 3);
        assert!(HexCube::from_axes(1, 2, -3).is_ok());
        assert!(HexCube::from_axes(1, 2, 3).is_err());
        for direction in HexCube::DIRECTIONS {
            assert_eq!(direction.q + direction.r + direction.s(), 0);
        }
    }

    #[test]
    fn test_distance() {
        let origin = HexCube::new(0, 0);
        for direction in HexCube::DIRECTIONS {
            assert_eq!(origin.distance(direction), 1);
        }
        assert_eq!(origin.distance(HexCube::new(2, -1)), 2);
        assert_eq!(origin.distance(HexCube::new(3, 2)), 5);
        assert_eq!(HexCube::new(-2, 4).distance(HexCube::new(-2, 4)), 0);
    }

    #[test]
    fn test_neighbors_are_distinct_and_adjacent() {
        let cube = HexCube::new(3, -7);
        let neighbors = cube.neighbors();
        for (idx, neighbor) in neighbors.iter().enumerate() {
            assert_eq!(cube.distance(*neighbor), 1);
            for other in &neighbors[idx + 1..] {
                assert_ne!(neighbor, other);
            }
        }
    }

    #[test]
    fn test_round_preserves_invariant() {
        // The worst case: all three axes exactly halfway
        let cases = [
            FractionalHexCube::new(0.5, 0.5),
            FractionalHexCube::new(-0.5, 0.5),
            FractionalHexCube::new(1.4, -0.7),
            FractionalHexCube::new(-2.5, 1.2),
        ];
        for fractional in cases {
            let cube = fractional.round();
            assert_eq!(cube.q + cube.r + cube.s(), 0, "from {fractional:?}");
        }
        // Exact integer cubes round to themselves
        let exact: FractionalHexCube = HexCube::new(4, -9).into();
        assert_eq!(exact.round(), HexCube::new(4, -9));
    }

    #[test]
    fn test_lerp_endpoints() {
        let a: FractionalHexCube = HexCube::new(0, 0).into();
        let b: FractionalHexCube = HexCube::new(4, -2).into();
        assert_eq!(FractionalHexCube::lerp(a, b, 0.0).round(), a.round());
        assert_eq!(FractionalHexCube::lerp(a, b, 1.0).round(), b.round());
        let midpoint = FractionalHexCube::lerp(a, b, 0.5);
        assert_eq!(midpoint.round(), HexCube::new(2, -1));
    }
}
