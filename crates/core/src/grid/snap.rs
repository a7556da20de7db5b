//! Snapping behavior: which canonical points within a cell a pixel
//! coordinate may be rounded to.

use anyhow::{anyhow, ensure};
use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

bitflags! {
    /// Bitmask of eligible snap targets. The bit values are an external
    /// contract: scene documents persist them as integers and the
    /// symmetry-folding logic in the hexagonal grid does exact bit
    /// arithmetic on them, so they must never be renumbered.
    ///
    /// | Bit      | Target |
    /// |----------|--------|
    /// | `0x0001` | cell center |
    /// | `0x0002` | midpoint of the nearest cell edge |
    /// | `0x0010` | top-left vertex |
    /// | `0x0020` | top-right vertex |
    /// | `0x0040` | bottom-left vertex |
    /// | `0x0080` | bottom-right vertex |
    /// | `0x0100` | top-left corner |
    /// | `0x0200` | top-right corner |
    /// | `0x0400` | bottom-left corner |
    /// | `0x0800` | bottom-right corner |
    /// | `0x1000` | top side midpoint |
    /// | `0x2000` | bottom side midpoint |
    /// | `0x4000` | left side midpoint |
    /// | `0x8000` | right side midpoint |
    ///
    /// On square grids the vertex and corner groups coincide (a square
    /// cell's corners are its vertices). On hexagonal grids the specific
    /// bits are folded by the orientation's symmetry before dispatch; see
    /// the hexagonal snapping module.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct SnapMode: u32 {
        const CENTER = 0x0001;
        const EDGE_MIDPOINT = 0x0002;

        const TOP_LEFT_VERTEX = 0x0010;
        const TOP_RIGHT_VERTEX = 0x0020;
        const BOTTOM_LEFT_VERTEX = 0x0040;
        const BOTTOM_RIGHT_VERTEX = 0x0080;
        /// Any vertex.
        const VERTEX = 0x00F0;

        const TOP_LEFT_CORNER = 0x0100;
        const TOP_RIGHT_CORNER = 0x0200;
        const BOTTOM_LEFT_CORNER = 0x0400;
        const BOTTOM_RIGHT_CORNER = 0x0800;
        /// Any corner.
        const CORNER = 0x0F00;

        const TOP_SIDE_MIDPOINT = 0x1000;
        const BOTTOM_SIDE_MIDPOINT = 0x2000;
        const LEFT_SIDE_MIDPOINT = 0x4000;
        const RIGHT_SIDE_MIDPOINT = 0x8000;
        /// Any side midpoint.
        const SIDE_MIDPOINT = 0xF000;
    }
}

// Persisted bit-for-bit as an integer, not as flag names: scene documents
// written before a flag existed must keep deserializing to the same mask.
impl Serialize for SnapMode {
    fn serialize<S: Serializer>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.bits())
    }
}

impl<'de> Deserialize<'de> for SnapMode {
    fn deserialize<D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Self, D::Error> {
        let bits = u32::deserialize(deserializer)?;
        SnapMode::from_bits(bits).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "invalid snapping mode bits: {bits:#x}"
            ))
        })
    }
}

/// How a point should be snapped: which targets are eligible, and at what
/// subdivision of the cell.
///
/// A behavior is only constructible with valid mode bits and a positive
/// resolution, so the snapping implementations never see malformed input.
/// Deserialization re-runs the same validation. An empty mode is valid and
/// means "don't snap" (elevation, when present, is still snapped to the
/// nearest layer).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawSnappingBehavior")]
pub struct SnappingBehavior {
    mode: SnapMode,
    resolution: u32,
}

impl Default for SnappingBehavior {
    fn default() -> Self {
        Self::new(SnapMode::empty())
    }
}

impl SnappingBehavior {
    /// Behavior for the given mode at resolution 1 (whole cells).
    pub fn new(mode: SnapMode) -> Self {
        Self {
            mode,
            resolution: 1,
        }
    }

    /// Behavior for the given mode with the cell subdivided `resolution`
    /// times per axis. Fails for a zero resolution.
    pub fn with_resolution(
        mode: SnapMode,
        resolution: u32,
    ) -> anyhow::Result<Self> {
        ensure!(
            resolution > 0,
            "snapping resolution must be positive, but was {resolution}"
        );
        Ok(Self { mode, resolution })
    }

    /// Build a behavior from raw persisted bits, rejecting bits outside
    /// the documented mask.
    pub fn from_bits(bits: u32, resolution: u32) -> anyhow::Result<Self> {
        let mode = SnapMode::from_bits(bits)
            .ok_or_else(|| anyhow!("invalid snapping mode bits: {bits:#x}"))?;
        Self::with_resolution(mode, resolution)
    }

    pub fn mode(self) -> SnapMode {
        self.mode
    }

    /// Subdivision of the cell; always ≥ 1.
    pub fn resolution(self) -> u32 {
        self.resolution
    }
}

/// Serialized shape of [SnappingBehavior]; deserialization re-runs
/// construction validation.
#[derive(Deserialize)]
struct RawSnappingBehavior {
    mode: SnapMode,
    #[serde(default = "default_resolution")]
    resolution: u32,
}

fn default_resolution() -> u32 {
    1
}

impl TryFrom<RawSnappingBehavior> for SnappingBehavior {
    type Error = anyhow::Error;

    fn try_from(raw: RawSnappingBehavior) -> Result<Self, Self::Error> {
        Self::with_resolution(raw.mode, raw.resolution)
    }
}
