//! Relief fill: upstream / downstream region growing from a seed cell
//!
//! Starting from a user-picked cell of a DEM, grows the connected region of
//! cells that lie at or below (downstream) or at or above (upstream) the
//! seed's elevation. Two admission policies share one traversal:
//!
//! - **Threshold**: every candidate is compared against the seed elevation.
//! - **Monotonic** (basin fill): additionally, each step from a filled cell to
//!   its neighbor must be non-increasing (downstream) or non-decreasing
//!   (upstream), so a monotone path links the seed to every filled cell.
//!
//! The traversal uses an explicit stack and a filled set, so the resulting
//! mask does not depend on visiting order.

use super::interrupt::{Interrupt, POLL_INTERVAL};
use ndarray::Array2;
use reliefill_core::raster::{Connectivity, Raster, RasterElement};
use reliefill_core::{Algorithm, Error, Result};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Grid cell with signed coordinates so neighbors past the edge are representable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Cell {
    pub row: isize,
    pub col: isize,
}

impl Cell {
    pub fn new(row: isize, col: isize) -> Self {
        Self { row, col }
    }
}

impl TryFrom<(usize, usize)> for Cell {
    type Error = Error;

    /// From (row, col). Fails for indices past `isize::MAX`
    fn try_from((row, col): (usize, usize)) -> Result<Self> {
        let signed = |name: &'static str, v: usize| {
            isize::try_from(v).map_err(|_| Error::InvalidParameter {
                name,
                value: v.to_string(),
                reason: "index does not fit a signed grid coordinate".to_string(),
            })
        };
        Ok(Self::new(signed("row", row)?, signed("col", col)?))
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(row {}, col {})", self.row, self.col)
    }
}

/// Which side of the reference elevation is filled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    /// Cells at or below the reference
    #[default]
    Downstream,
    /// Cells at or above the reference
    Upstream,
}

impl Direction {
    /// Whether `value` lies on this direction's side of `reference`.
    ///
    /// Always false when either side is NaN.
    #[inline]
    pub fn admits<T: PartialOrd>(&self, value: T, reference: T) -> bool {
        match self {
            Direction::Downstream => value <= reference,
            Direction::Upstream => value >= reference,
        }
    }
}

impl FromStr for Direction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "downstream" | "down" => Ok(Direction::Downstream),
            "upstream" | "up" => Ok(Direction::Upstream),
            _ => Err(Error::InvalidParameter {
                name: "direction",
                value: s.to_string(),
                reason: "select either downstream or upstream".to_string(),
            }),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Downstream => write!(f, "downstream"),
            Direction::Upstream => write!(f, "upstream"),
        }
    }
}

/// Admission policy for candidate cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Policy {
    /// Compare each candidate against the seed elevation only
    #[default]
    Threshold,
    /// Also require a non-worsening step from the discovering cell (basin fill)
    Monotonic,
}

impl Policy {
    /// Neighbor filter: may the traversal step from `from` to `to`?
    #[inline]
    fn allows_step<T: PartialOrd>(&self, direction: Direction, from: T, to: T) -> bool {
        match self {
            Policy::Threshold => true,
            Policy::Monotonic => direction.admits(to, from),
        }
    }
}

impl FromStr for Policy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "threshold" | "altitude" => Ok(Policy::Threshold),
            "monotonic" | "basin" => Ok(Policy::Monotonic),
            _ => Err(Error::InvalidParameter {
                name: "policy",
                value: s.to_string(),
                reason: "select either threshold or monotonic".to_string(),
            }),
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Policy::Threshold => write!(f, "threshold"),
            Policy::Monotonic => write!(f, "monotonic"),
        }
    }
}

/// Which cells the traversal may enter at all
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BoundaryRule {
    /// Never fill the last row or the last column, even when they qualify.
    ///
    /// Matches the historical relief fill tool, whose results downstream
    /// users compare against. A seed on the last row or column yields an
    /// empty mask.
    #[default]
    TrimLastRowCol,
    /// Every cell of the grid may be filled
    FullGrid,
}

impl BoundaryRule {
    /// Whether a (possibly out-of-grid) cell may be filled
    #[inline]
    fn accepts(&self, cell: Cell, rows: usize, cols: usize) -> bool {
        let (max_row, max_col) = match self {
            BoundaryRule::TrimLastRowCol => (rows as isize - 1, cols as isize - 1),
            BoundaryRule::FullGrid => (rows as isize, cols as isize),
        };
        cell.row >= 0 && cell.col >= 0 && cell.row < max_row && cell.col < max_col
    }
}

impl FromStr for BoundaryRule {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "trim" | "legacy" => Ok(BoundaryRule::TrimLastRowCol),
            "full" => Ok(BoundaryRule::FullGrid),
            _ => Err(Error::InvalidParameter {
                name: "boundary",
                value: s.to_string(),
                reason: "select either trim or full".to_string(),
            }),
        }
    }
}

/// Parameters for relief fill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReliefFillParams {
    /// Fill below (downstream) or above (upstream) the seed. Default: downstream
    pub direction: Direction,
    /// Neighbors examined from each filled cell. Default: 8
    pub connectivity: Connectivity,
    /// Threshold or monotonic (basin) admission. Default: threshold
    pub policy: Policy,
    /// Default: trim the last row and column
    pub boundary: BoundaryRule,
}

impl ReliefFillParams {
    pub fn new(direction: Direction, connectivity: Connectivity, policy: Policy) -> Self {
        Self {
            direction,
            connectivity,
            policy,
            boundary: BoundaryRule::default(),
        }
    }

    pub fn with_boundary(mut self, boundary: BoundaryRule) -> Self {
        self.boundary = boundary;
        self
    }
}

/// Relief fill algorithm
#[derive(Debug, Clone, Default)]
pub struct ReliefFill;

impl Algorithm for ReliefFill {
    type Input = (Raster<f64>, Cell);
    type Output = Raster<u8>;
    type Params = ReliefFillParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Relief Fill"
    }

    fn description(&self) -> &'static str {
        "Extract the region upstream or downstream of a seed cell"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        let (dem, seed) = input;
        relief_fill(&dem, seed, params)
    }
}

/// Grow the upstream or downstream region of `seed` on a DEM.
///
/// # Algorithm
/// 1. Read the seed elevation as the threshold `thr`
/// 2. Pop a cell from the frontier; drop it if the boundary rule rejects it,
///    if it is already filled, or if its elevation is on the wrong side of `thr`
/// 3. Mark it filled and push its 4 or 8 neighbors that are not yet filled
///    and, for the monotonic policy, that are reached by a non-worsening step
/// 4. Repeat until the frontier is empty
///
/// NaN cells never compare true and are never filled. A seed outside the
/// grid, or rejected by the boundary rule, gives an all-zero mask.
///
/// # Arguments
/// * `dem` - Elevation raster, borrowed read-only
/// * `seed` - Starting cell
/// * `params` - Direction, connectivity, policy and boundary rule
///
/// # Returns
/// Raster<u8> with the DEM's shape and georeferencing, 1 = filled, 0 = not
pub fn relief_fill<T: RasterElement>(
    dem: &Raster<T>,
    seed: Cell,
    params: ReliefFillParams,
) -> Result<Raster<u8>> {
    relief_fill_with(dem, seed, params, &Interrupt::never())
}

/// [`relief_fill`] polling `interrupt` while it runs.
///
/// Returns [`Error::Cancelled`] and no partial mask when the interrupt fires.
pub fn relief_fill_with<T: RasterElement>(
    dem: &Raster<T>,
    seed: Cell,
    params: ReliefFillParams,
    interrupt: &Interrupt,
) -> Result<Raster<u8>> {
    dem.ensure_not_empty()?;

    let (rows, cols) = dem.shape();
    let grid = dem.data();
    let mut output = dem.with_same_meta::<u8>();

    if !dem.contains(seed.row, seed.col) {
        debug!(%seed, rows, cols, "seed outside grid, nothing to fill");
        return Ok(output);
    }
    let thr = grid[(seed.row as usize, seed.col as usize)];

    let direction = params.direction;
    let mut filled = Array2::<bool>::from_elem((rows, cols), false);
    let mut frontier: Vec<Cell> = vec![seed];
    let mut popped = 0usize;
    let mut count = 0usize;

    while let Some(cell) = frontier.pop() {
        if popped % POLL_INTERVAL == 0 {
            interrupt.check(popped)?;
        }
        popped += 1;

        if !params.boundary.accepts(cell, rows, cols) {
            continue;
        }
        let idx = (cell.row as usize, cell.col as usize);
        if filled[idx] {
            continue;
        }

        let value = grid[idx];
        if !direction.admits(value, thr) {
            continue;
        }
        filled[idx] = true;
        count += 1;

        for (nr, nc) in params.connectivity.neighbors(cell.row, cell.col) {
            // Out-of-grid neighbors could never pass the boundary rule
            if !dem.contains(nr, nc) {
                continue;
            }
            let n = (nr as usize, nc as usize);
            if !filled[n] && params.policy.allows_step(direction, value, grid[n]) {
                frontier.push(Cell::new(nr, nc));
            }
        }
    }

    debug!(
        %seed,
        %direction,
        connectivity = %params.connectivity,
        policy = %params.policy,
        filled = count,
        popped,
        "relief fill finished"
    );

    *output.data_mut() = filled.mapv(u8::from);
    Ok(output)
}

/// Threshold fill: every cell connected to the seed on the given side of its
/// elevation, with 4- or 8-neighbor connectivity
pub fn altitude_fill<T: RasterElement>(
    dem: &Raster<T>,
    seed: Cell,
    direction: Direction,
    connectivity: Connectivity,
) -> Result<Raster<u8>> {
    relief_fill(
        dem,
        seed,
        ReliefFillParams::new(direction, connectivity, Policy::Threshold),
    )
}

/// Basin fill: cells reachable from the seed by 8-connected steps that never
/// climb (downstream) or never descend (upstream)
pub fn basin_fill<T: RasterElement>(
    dem: &Raster<T>,
    seed: Cell,
    direction: Direction,
) -> Result<Raster<u8>> {
    relief_fill(
        dem,
        seed,
        ReliefFillParams::new(direction, Connectivity::Eight, Policy::Monotonic),
    )
}
