//! Grid configuration types. A [GridConfiguration] is supplied once by the
//! external scene-configuration collaborator when a grid is constructed and
//! is immutable for the lifetime of the grid.

use anyhow::{anyhow, ensure};
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use strum::{Display, EnumIter};

/// Policy for the cost of non-orthogonal moves. On a square grid this
/// governs diagonal steps; on a hexagonal grid it governs the combined
/// horizontal+vertical "diagonal" steps between elevation layers. See the
/// per-grid `measure_segment` implementations for the exact weights.
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum DiagonalRule {
    /// Diagonal moves cost the same as orthogonal moves (1/1/1).
    #[default]
    Equidistant,
    /// Diagonal moves cost their true Euclidean length (√2, √3 in 3D).
    Exact,
    /// Tabletop-friendly approximations of [Self::Exact] (1.5, 1.75 in 3D).
    Approximate,
    /// A diagonal move is counted as its orthogonal decomposition (2, 3 in
    /// 3D).
    Rectilinear,
    /// Diagonal moves alternate 1, 2, 1, 2, ... across the whole measured
    /// path.
    Alternating1,
    /// Diagonal moves alternate 2, 1, 2, 1, ... across the whole measured
    /// path.
    Alternating2,
    /// Diagonal movement and adjacency are forbidden entirely; paths
    /// decompose into axis-aligned steps.
    Illegal,
}

impl DiagonalRule {
    /// Whether this rule permits diagonal movement at all.
    pub fn allows_diagonals(self) -> bool {
        !matches!(self, Self::Illegal)
    }

    /// Cost weight of a step that advances two axes at once, where an
    /// orthogonal step costs 1. Meaningless for the alternating rules
    /// (their weight depends on path state) and [Self::Illegal] (no such
    /// step exists); both fall back to the weight used for translation and
    /// template shapes.
    pub(crate) fn double_diagonal_weight(self) -> f64 {
        match self {
            Self::Equidistant => 1.0,
            Self::Exact => std::f64::consts::SQRT_2,
            Self::Approximate => 1.5,
            Self::Rectilinear | Self::Illegal => 2.0,
            Self::Alternating1 | Self::Alternating2 => 1.5,
        }
    }

    /// Cost weight of a step that advances three axes at once.
    pub(crate) fn triple_diagonal_weight(self) -> f64 {
        match self {
            Self::Equidistant => 1.0,
            Self::Exact => 3.0_f64.sqrt(),
            Self::Approximate => 1.75,
            Self::Rectilinear | Self::Illegal => 3.0,
            Self::Alternating1 | Self::Alternating2 => 1.5,
        }
    }
}

/// The topology of a grid, persisted alongside the configuration in scene
/// documents.
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum GridType {
    /// Continuous space, no discretization.
    Gridless,
    /// Square cells.
    #[default]
    Square,
    /// Hexagonal cells; orientation and parity come from the configuration.
    Hexagonal,
}

/// Immutable grid configuration, set at construction.
///
/// `size` is the cell size in pixels (for hexes: the distance across
/// parallel sides). `distance` is how many game units one cell spans.
/// Both must be strictly positive; [GridConfiguration::new] enforces that
/// and deserialization goes through the same check.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawGridConfiguration", into = "RawGridConfiguration")]
pub struct GridConfiguration {
    size: f64,
    distance: f64,
    units: String,
    diagonals: DiagonalRule,
    columns: bool,
    even: bool,
}

impl GridConfiguration {
    /// Create a configuration with the given cell size (pixels) and
    /// distance-per-cell (game units). Fails if either is not strictly
    /// positive; that's a fatal configuration error, not something a grid
    /// can limp along with.
    pub fn new(size: f64, distance: f64) -> anyhow::Result<Self> {
        ensure!(
            size > 0.0 && size.is_finite(),
            "grid size must be strictly positive, but was {size}"
        );
        ensure!(
            distance > 0.0 && distance.is_finite(),
            "grid distance must be strictly positive, but was {distance}"
        );
        Ok(Self {
            size,
            distance,
            units: String::new(),
            diagonals: DiagonalRule::default(),
            columns: false,
            even: false,
        })
    }

    /// Set the measurement unit label (e.g. `"ft"`). Purely cosmetic; the
    /// grid never interprets it.
    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = units.into();
        self
    }

    /// Set the diagonal rule.
    pub fn with_diagonals(mut self, diagonals: DiagonalRule) -> Self {
        self.diagonals = diagonals;
        self
    }

    /// Set the hexagonal layout: `columns` selects flat-top column
    /// orientation (`false` = pointy-top rows), `even` selects which
    /// parity of rows/columns is shifted. Ignored by non-hex grids.
    pub fn with_hex_layout(mut self, columns: bool, even: bool) -> Self {
        self.columns = columns;
        self.even = even;
        self
    }

    /// Cell size in pixels.
    pub fn size(&self) -> f64 {
        self.size
    }

    /// Game units per cell.
    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// Measurement unit label.
    pub fn units(&self) -> &str {
        &self.units
    }

    /// The diagonal rule.
    pub fn diagonals(&self) -> DiagonalRule {
        self.diagonals
    }

    /// Hex only: flat-top column orientation (`false` = pointy-top rows).
    pub fn columns(&self) -> bool {
        self.columns
    }

    /// Hex only: whether the even rows/columns are the shifted ones.
    pub fn even(&self) -> bool {
        self.even
    }

    /// Conversion factor from pixels to game units.
    pub(crate) fn units_per_pixel(&self) -> f64 {
        self.distance / self.size
    }

    /// Conversion factor from game units to pixels.
    pub(crate) fn pixels_per_unit(&self) -> f64 {
        self.size / self.distance
    }

    /// A copy of this configuration with the cell size divided by
    /// `divisor`. Hexagonal snapping probes such finer grids to implement
    /// sub-cell resolutions.
    pub(crate) fn subdivided(&self, divisor: u32) -> Self {
        Self {
            size: self.size / f64::from(divisor.max(1)),
            ..self.clone()
        }
    }
}

/// Serialized shape of [GridConfiguration]. Round-trips through scene
/// storage; deserialization re-runs construction validation.
#[derive(Serialize, Deserialize)]
struct RawGridConfiguration {
    size: f64,
    distance: f64,
    #[serde(default)]
    units: String,
    #[serde(default)]
    diagonals: DiagonalRule,
    #[serde(default)]
    columns: bool,
    #[serde(default)]
    even: bool,
}

impl TryFrom<RawGridConfiguration> for GridConfiguration {
    type Error = anyhow::Error;

    fn try_from(raw: RawGridConfiguration) -> Result<Self, Self::Error> {
        Ok(GridConfiguration::new(raw.size, raw.distance)
            .map_err(|error| anyhow!("invalid grid configuration: {error}"))?
            .with_units(raw.units)
            .with_diagonals(raw.diagonals)
            .with_hex_layout(raw.columns, raw.even))
    }
}

impl From<GridConfiguration> for RawGridConfiguration {
    fn from(config: GridConfiguration) -> Self {
        Self {
            size: config.size,
            distance: config.distance,
            units: config.units,
            diagonals: config.diagonals,
            columns: config.columns,
            even: config.even,
        }
    }
}
