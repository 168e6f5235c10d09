//! Relief fills for many seeds over one shared DEM

use super::interrupt::Interrupt;
use super::relief_fill::{relief_fill_with, Cell, ReliefFillParams};
use crate::maybe_rayon::*;
use reliefill_core::raster::{Raster, RasterElement};
use reliefill_core::Result;
use tracing::debug;

/// Run one independent relief fill per seed.
///
/// The DEM is shared read-only; each fill owns its frontier and mask, so
/// with the `parallel` feature the seeds are spread over rayon's pool.
/// Masks come back in seed order. The first error (invalid grid or
/// cancellation) is returned instead of any mask.
pub fn relief_fill_many<T: RasterElement>(
    dem: &Raster<T>,
    seeds: &[Cell],
    params: ReliefFillParams,
) -> Result<Vec<Raster<u8>>> {
    relief_fill_many_with(dem, seeds, params, &Interrupt::never())
}

/// [`relief_fill_many`] with one interrupt shared by every fill
pub fn relief_fill_many_with<T: RasterElement>(
    dem: &Raster<T>,
    seeds: &[Cell],
    params: ReliefFillParams,
    interrupt: &Interrupt,
) -> Result<Vec<Raster<u8>>> {
    dem.ensure_not_empty()?;
    debug!(seeds = seeds.len(), ?params, "batch relief fill");

    seeds
        .par_iter()
        .map(|&seed| relief_fill_with(dem, seed, params, interrupt))
        .collect()
}

/// Union of several masks of the same shape: 1 where any mask is 1
pub fn union_masks(masks: &[Raster<u8>]) -> Option<Raster<u8>> {
    let (first, rest) = masks.split_first()?;
    let mut out = first.clone();
    for mask in rest {
        if mask.shape() != out.shape() {
            return None;
        }
        ndarray::Zip::from(out.data_mut())
            .and(mask.data())
            .for_each(|o, &m| *o |= m);
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hydrology::relief_fill::relief_fill;
    use reliefill_core::Error;

    /// Two pits separated by a ridge in column 3
    fn two_pits() -> Raster<f64> {
        Raster::from_rows(vec![
            vec![9.0, 9.0, 9.0, 9.0, 9.0, 9.0, 9.0, 9.0],
            vec![9.0, 1.0, 1.0, 9.0, 2.0, 2.0, 2.0, 9.0],
            vec![9.0, 1.0, 1.0, 9.0, 2.0, 2.0, 2.0, 9.0],
            vec![9.0, 9.0, 9.0, 9.0, 9.0, 9.0, 9.0, 9.0],
        ])
        .unwrap()
    }

    #[test]
    fn test_matches_single_fills_in_seed_order() {
        let dem = two_pits();
        let seeds = [Cell::new(1, 5), Cell::new(2, 1), Cell::new(3, 3)];
        let params = ReliefFillParams::default();

        let masks = relief_fill_many(&dem, &seeds, params).unwrap();
        assert_eq!(masks.len(), 3);
        for (seed, mask) in seeds.iter().zip(&masks) {
            let single = relief_fill(&dem, *seed, params).unwrap();
            assert_eq!(mask.data(), single.data());
        }
        assert_eq!(masks[0].count_where(|v| v == 1), 6);
        assert_eq!(masks[1].count_where(|v| v == 1), 4);
        assert_eq!(masks[2].count_where(|v| v == 1), 0);
    }

    #[test]
    fn test_union() {
        let dem = two_pits();
        let masks =
            relief_fill_many(&dem, &[Cell::new(1, 1), Cell::new(1, 4)], ReliefFillParams::default())
                .unwrap();
        let all = union_masks(&masks).unwrap();
        assert_eq!(all.count_where(|v| v == 1), 10);
        assert!(union_masks(&[]).is_none());
    }

    #[test]
    fn test_no_seeds() {
        let masks = relief_fill_many(&two_pits(), &[], ReliefFillParams::default()).unwrap();
        assert!(masks.is_empty());
    }

    #[test]
    fn test_cancelled_batch() {
        let interrupt = Interrupt::never().with_timeout(std::time::Duration::ZERO);
        let result = relief_fill_many_with(
            &two_pits(),
            &[Cell::new(1, 1), Cell::new(1, 5)],
            ReliefFillParams::default(),
            &interrupt,
        );
        assert!(matches!(result, Err(Error::Cancelled { .. })));
    }
}
