//! Hydrological region extraction from Digital Elevation Models
//!
//! - Relief fill: cells upstream or downstream of a seed, by elevation
//!   threshold (4/8-neighbor) or by monotone flow path (basin fill)
//! - Batch fills: many seeds over one DEM, in parallel
//! - Interrupt: cooperative cancellation and deadlines for long fills

mod batch;
mod interrupt;
mod relief_fill;

pub use batch::{relief_fill_many, relief_fill_many_with, union_masks};
pub use interrupt::Interrupt;
pub use relief_fill::{
    altitude_fill, basin_fill, relief_fill, relief_fill_with, BoundaryRule, Cell, Direction,
    Policy, ReliefFill, ReliefFillParams,
};
