//! End-to-end relief fill scenarios on synthetic DEMs, including the
//! GeoTIFF round trip a host tool goes through (load DEM, map a projected
//! coordinate to the seed, fill, write the mask).

use reliefill_algorithms::hydrology::{
    altitude_fill, basin_fill, relief_fill, relief_fill_many, BoundaryRule, Cell, Direction,
    Policy, ReliefFillParams,
};
use reliefill_core::io::{read_geotiff_from_buffer, write_geotiff_to_buffer, GeoTiffOptions};
use reliefill_core::{Connectivity, GeoTransform, Raster};

/// V-shaped valley draining south: elevation rises away from the column-6
/// thalweg and falls with increasing row.
fn valley_dem(rows: usize, cols: usize) -> Raster<f64> {
    let mut dem = Raster::new(rows, cols);
    dem.set_transform(GeoTransform::new(1000.0, 2000.0, 10.0, -10.0));
    for row in 0..rows {
        for col in 0..cols {
            let across = (col as f64 - 6.0).abs() * 5.0;
            let along = (rows - row) as f64;
            dem.set(row, col, 100.0 + across + along).unwrap();
        }
    }
    dem
}

fn filled(mask: &Raster<u8>) -> usize {
    mask.count_where(|v| v == 1)
}

#[test]
fn pit_scenario_exact_pattern() {
    let dem = Raster::from_rows(vec![
        vec![5.0, 5.0, 5.0, 5.0],
        vec![5.0, 1.0, 1.0, 5.0],
        vec![5.0, 1.0, 1.0, 5.0],
        vec![5.0, 5.0, 5.0, 5.0],
    ])
    .unwrap();

    let mask =
        altitude_fill(&dem, Cell::new(1, 1), Direction::Downstream, Connectivity::Four).unwrap();

    let expected: [[u8; 4]; 4] = [[0, 0, 0, 0], [0, 1, 1, 0], [0, 1, 1, 0], [0, 0, 0, 0]];
    for (r, row) in expected.iter().enumerate() {
        for (c, &v) in row.iter().enumerate() {
            assert_eq!(mask.get(r, c).unwrap(), v, "cell ({}, {})", r, c);
        }
    }
}

#[test]
fn downstream_from_thalweg_follows_the_valley() {
    let dem = valley_dem(20, 13);
    let seed = Cell::new(5, 6);

    let mask = altitude_fill(&dem, seed, Direction::Downstream, Connectivity::Eight).unwrap();

    // Nothing upslope of the seed row on the thalweg
    for row in 0..5 {
        assert_eq!(mask.get(row, 6).unwrap(), 0);
    }
    // The thalweg below the seed is filled, except the trimmed last row
    for row in 5..19 {
        assert_eq!(mask.get(row, 6).unwrap(), 1, "thalweg row {}", row);
    }
    assert_eq!(mask.get(19, 6).unwrap(), 0);
    // Valley sides rise 5 per column, so they join only once far enough downstream
    assert_eq!(mask.get(5, 5).unwrap(), 0);
    assert_eq!(mask.get(10, 5).unwrap(), 1);
}

#[test]
fn basin_stays_on_its_valley_side() {
    // From the west slope, the east slope at equal elevation is within the
    // threshold but only reachable by climbing out of the thalweg
    let dem = valley_dem(20, 13);
    let seed = Cell::new(8, 4);

    let threshold = altitude_fill(&dem, seed, Direction::Downstream, Connectivity::Eight).unwrap();
    let basin = basin_fill(&dem, seed, Direction::Downstream).unwrap();

    assert_eq!(threshold.get(8, 8).unwrap(), 1);
    assert_eq!(basin.get(8, 8).unwrap(), 0);
    assert!(filled(&basin) < filled(&threshold));

    // The flow path down the west slope and the thalweg is kept
    for cell in [(9, 5), (10, 6), (18, 6)] {
        assert_eq!(basin.get(cell.0, cell.1).unwrap(), 1, "{:?}", cell);
    }
}

#[test]
fn upstream_and_downstream_share_only_equal_cells() {
    let dem = valley_dem(20, 13);
    let seed = Cell::new(10, 6);
    let params = ReliefFillParams::default().with_boundary(BoundaryRule::FullGrid);

    let down = relief_fill(&dem, seed, params).unwrap();
    let up = relief_fill(
        &dem,
        seed,
        ReliefFillParams {
            direction: Direction::Upstream,
            ..params
        },
    )
    .unwrap();

    let thr = dem.get(10, 6).unwrap();
    for ((r, c), &d) in down.data().indexed_iter() {
        if d == 1 && up.get(r, c).unwrap() == 1 {
            assert_eq!(dem.get(r, c).unwrap(), thr);
        }
    }
    assert!(filled(&down) > 0 && filled(&up) > 0);
}

#[test]
fn geotiff_round_trip_from_projected_seed() {
    let dem = valley_dem(20, 13);
    let bytes = write_geotiff_to_buffer(&dem, Some(GeoTiffOptions::default())).unwrap();
    let loaded: Raster<f64> = read_geotiff_from_buffer(&bytes).unwrap();
    assert_eq!(loaded.transform(), dem.transform());

    // Center of row 5, col 6
    let (x, y) = loaded.transform().pixel_to_geo(6, 5);
    let (row, col) = loaded.geo_to_cell(x, y).unwrap();
    assert_eq!((row, col), (5, 6));

    let params =
        ReliefFillParams::new(Direction::Downstream, Connectivity::Eight, Policy::Threshold);
    let mask = relief_fill(&loaded, Cell::try_from((row, col)).unwrap(), params).unwrap();

    let written = write_geotiff_to_buffer(&mask, None).unwrap();
    let reread: Raster<f64> = read_geotiff_from_buffer(&written).unwrap();
    assert_eq!(reread.shape(), dem.shape());
    assert_eq!(reread.transform(), dem.transform());
    assert_eq!(
        reread.count_where(|v| v == 1.0),
        filled(&mask),
    );
}

#[test]
fn batch_over_the_valley() {
    let dem = valley_dem(20, 13);
    let seeds: Vec<Cell> = (0..19).map(|row| Cell::new(row, 6)).collect();
    let masks = relief_fill_many(&dem, &seeds, ReliefFillParams::default()).unwrap();

    // Seeds further downstream fill strictly fewer cells
    let counts: Vec<usize> = masks.iter().map(filled).collect();
    assert!(counts.windows(2).all(|w| w[0] > w[1]), "{:?}", counts);
}
