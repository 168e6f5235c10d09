//! Neighbor connectivity for grid traversals

use crate::error::Error;
use std::fmt;
use std::str::FromStr;

/// Cardinal offsets as (row_offset, col_offset): W, E, N, S
const ROOK_OFFSETS: [(isize, isize); 4] = [(0, -1), (0, 1), (-1, 0), (1, 0)];

/// Cardinal then diagonal offsets: W, E, N, S, NW, SW, NE, SE
const QUEEN_OFFSETS: [(isize, isize); 8] = [
    (0, -1),  // W
    (0, 1),   // E
    (-1, 0),  // N
    (1, 0),   // S
    (-1, -1), // NW
    (1, -1),  // SW
    (-1, 1),  // NE
    (1, 1),   // SE
];

/// Which neighbors of a cell a traversal examines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Connectivity {
    /// Rook case: N, S, E, W
    Four,
    /// Queen case: the four cardinal neighbors plus the diagonals
    #[default]
    Eight,
}

impl Connectivity {
    /// Neighbor offsets as (row_offset, col_offset), excluding the center
    pub fn offsets(&self) -> &'static [(isize, isize)] {
        match self {
            Connectivity::Four => &ROOK_OFFSETS,
            Connectivity::Eight => &QUEEN_OFFSETS,
        }
    }

    /// Iterate the (row, col) neighbors of a cell.
    ///
    /// No bounds are applied: coordinates may be negative or past the grid
    /// edge and it is up to the caller to reject them before indexing.
    pub fn neighbors(&self, row: isize, col: isize) -> impl Iterator<Item = (isize, isize)> {
        self.offsets()
            .iter()
            .map(move |&(dr, dc)| (row + dr, col + dc))
    }
}

impl FromStr for Connectivity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "4" | "four" | "rook" => Ok(Connectivity::Four),
            "8" | "eight" | "queen" => Ok(Connectivity::Eight),
            _ => Err(Error::InvalidParameter {
                name: "connectivity",
                value: s.to_string(),
                reason: "expected 4 or 8".to_string(),
            }),
        }
    }
}

impl fmt::Display for Connectivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Connectivity::Four => write!(f, "4"),
            Connectivity::Eight => write!(f, "8"),
        }
    }
}
