//! End-to-end gridding of synthetic survey lines.
//!
//! Surveys are flown as parallel east-west lines over a smooth anomaly, the
//! way a magnetometer or GPR survey is collected, then gridded and
//! post-processed.

use surveygrid_algorithms::interpolation::{interpolate, InterpolationSettings};
use surveygrid_algorithms::postprocess::{
    analytic_signal, gaussian_smoothing, hillshade, AnalyticSignalParams, HillshadeParams,
    SmoothingParams,
};
use surveygrid_core::geo::EARTH_RADIUS_M;
use surveygrid_core::{CoordinateProjector, Grid, GriddingParams, InterpolationMethod, SamplePoint};

const ORIGIN_LAT: f64 = 52.0;
const ORIGIN_LON: f64 = 13.0;

fn to_latlon(east_m: f64, north_m: f64) -> (f64, f64) {
    let lat = ORIGIN_LAT + (north_m / EARTH_RADIUS_M).to_degrees();
    let lon = ORIGIN_LON + (east_m / (EARTH_RADIUS_M * ORIGIN_LAT.to_radians().cos())).to_degrees();
    (lat, lon)
}

/// Gaussian bump centred at (100, 100) m
fn anomaly(east_m: f64, north_m: f64) -> f64 {
    let dx = east_m - 100.0;
    let dy = north_m - 100.0;
    50.0 * (-(dx * dx + dy * dy) / (2.0 * 30.0 * 30.0)).exp()
}

/// Lines every `spacing` metres north, a reading every metre east, over 200 x 200 m.
fn survey(spacing: f64) -> Vec<SamplePoint> {
    let mut samples = Vec::new();
    let mut north = 0.0;
    while north <= 200.0 {
        for i in 0..=200 {
            let east = i as f64;
            let (lat, lon) = to_latlon(east, north);
            samples.push(SamplePoint::new(lat, lon, anomaly(east, north)));
        }
        north += spacing;
    }
    samples
}

fn params(cell: f64, blank: f64, method: InterpolationMethod) -> GriddingParams {
    GriddingParams::new(cell, blank, method).unwrap()
}

fn same_grid(a: &Grid, b: &Grid) -> bool {
    a.shape() == b.shape()
        && a.data()
            .iter()
            .zip(b.data().iter())
            .all(|(x, y)| (x.is_nan() && y.is_nan()) || x == y)
}

#[test]
fn test_corner_square_is_single_cell() {
    let samples: Vec<SamplePoint> = [(0.0, 0.0, 1.0), (10.0, 0.0, 2.0), (0.0, 10.0, 3.0), (10.0, 10.0, 4.0)]
        .iter()
        .map(|&(e, n, v)| {
            let (lat, lon) = to_latlon(e, n);
            SamplePoint::new(lat, lon, v)
        })
        .collect();

    for method in [InterpolationMethod::Splines, InterpolationMethod::Idw] {
        let grid = interpolate(&samples, &params(10.0, 10.0, method), &InterpolationSettings::default()).unwrap();
        assert_eq!(grid.shape(), (1, 1), "{}", method);
        let v = grid.get(0, 0).unwrap();
        assert!((1.0..=4.0).contains(&v), "{}: {}", method, v);
    }
}

#[test]
fn test_grid_dimensions_match_projected_span() {
    let samples = survey(20.0);
    let grid = interpolate(&samples, &params(7.0, 30.0, InterpolationMethod::Idw), &InterpolationSettings::default()).unwrap();
    let projector = CoordinateProjector::new(*grid.bounds());
    assert_eq!(grid.shape(), projector.grid_dimensions(7.0));
    // 200 m / 7 m
    assert_eq!(grid.shape(), (29, 29));
}

#[test]
fn test_gridding_is_pure() {
    let samples = survey(25.0);
    for method in [InterpolationMethod::Splines, InterpolationMethod::Idw] {
        let p = params(5.0, 20.0, method);
        let a = interpolate(&samples, &p, &InterpolationSettings::default()).unwrap();
        let b = interpolate(&samples, &p, &InterpolationSettings::default()).unwrap();
        assert!(same_grid(&a, &b), "{} not deterministic", method);
    }
}

#[test]
fn test_both_methods_recover_anomaly() {
    let samples = survey(20.0);
    for method in [InterpolationMethod::Splines, InterpolationMethod::Idw] {
        let grid = interpolate(&samples, &params(10.0, 25.0, method), &InterpolationSettings::default()).unwrap();
        let (w, h) = grid.shape();
        assert_eq!(grid.valid_count(), w * h, "{}: lines 20 m apart, nothing blank", method);

        // peak near the centre, low at the corners
        let centre = grid.get(w / 2, h / 2).unwrap();
        let corner = grid.get(0, 0).unwrap();
        assert!(centre > 40.0, "{}: centre {}", method, centre);
        assert!(corner < 5.0, "{}: corner {}", method, corner);
    }
}

#[test]
fn test_wide_line_spacing_is_blanked() {
    let samples = survey(100.0);
    let grid = interpolate(&samples, &params(10.0, 20.0, InterpolationMethod::Splines), &InterpolationSettings::default()).unwrap();
    let (w, h) = grid.shape();
    // rows on a survey line have data, rows halfway between lines do not
    assert!(grid.get(w / 2, 0).unwrap().is_finite());
    assert!(grid.get(w / 2, h / 4).unwrap().is_nan());
}

#[test]
fn test_post_processing_chain() {
    let samples = survey(10.0);
    let grid = interpolate(&samples, &params(5.0, 20.0, InterpolationMethod::Splines), &InterpolationSettings::default()).unwrap();

    let smoothed = gaussian_smoothing(&grid, &SmoothingParams::default()).unwrap();
    assert_eq!(smoothed.valid_count(), grid.valid_count());

    let shade = hillshade(&grid, &HillshadeParams::default()).unwrap();
    let (w, h) = shade.shape();
    for x in 0..w {
        assert_eq!(shade.get(x, 0).unwrap(), 1.0);
        assert_eq!(shade.get(x, h - 1).unwrap(), 1.0);
    }

    let projector = CoordinateProjector::new(*grid.bounds());
    let (cw, ch) = projector.cell_dimensions(w, h, 5.0);
    let signal = analytic_signal(&grid, cw, ch, &AnalyticSignalParams::default()).unwrap();
    assert_eq!(signal.magnitude.valid_count(), grid.valid_count());
    assert!(signal.range.min < signal.range.max);

    // the signal sits over the anomaly, not over the flat background
    let over = signal.magnitude.get(w / 2, h / 2).unwrap();
    let background = signal.magnitude.get(2, 2).unwrap();
    assert!(over > background, "over {} <= background {}", over, background);
}

#[test]
fn test_algorithm_pipeline() {
    use surveygrid_algorithms::interpolation::Interpolator;
    use surveygrid_algorithms::postprocess::{AnalyticSignalFilter, GaussianSmoothing, HillShade};
    use surveygrid_core::Algorithm;

    let input = (survey(10.0), params(10.0, 30.0, InterpolationMethod::Idw));
    let grid = Interpolator.execute_default(input.clone()).unwrap();
    assert!(same_grid(
        &grid,
        &interpolate(&input.0, &input.1, &InterpolationSettings::default()).unwrap()
    ));

    let smoothed = GaussianSmoothing.execute_default(grid.clone()).unwrap();
    assert_eq!(smoothed.shape(), grid.shape());

    let shaded = HillShade.execute_default(smoothed.clone()).unwrap();
    assert!(shaded.data().iter().all(|v| (0.0..=1.0).contains(v)));

    let (cw, ch) = CoordinateProjector::new(*grid.bounds()).cell_dimensions(
        grid.width(),
        grid.height(),
        10.0,
    );
    let signal = AnalyticSignalFilter.execute_default((smoothed, cw, ch)).unwrap();
    assert!(signal.range.width() > 0.0);
    for name in [Interpolator.name(), GaussianSmoothing.name(), HillShade.name()] {
        assert!(!name.is_empty());
    }
}
