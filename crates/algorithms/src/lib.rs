//! # Reliefill Algorithms
//!
//! Terrain analysis algorithms for reliefill.
//!
//! ## Available Algorithm Categories
//!
//! - **hydrology**: Upstream/downstream relief fill and basin fill from a seed cell

pub mod hydrology;
mod maybe_rayon;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::hydrology::{
        altitude_fill, basin_fill, relief_fill, relief_fill_many, relief_fill_with, BoundaryRule,
        Cell, Direction, Interrupt, Policy, ReliefFill, ReliefFillParams,
    };
    pub use reliefill_core::prelude::*;
}
