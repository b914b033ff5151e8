use dojo_core::gameplay::calibration::{grid_error_ms, CalibrationEstimator};
use dojo_core::gameplay::resolver::TargetGrid;
use dojo_core::gameplay::stats::median;
use dojo_schema::CALIBRATION_SAMPLES;

fn biased_samples(bias_ms: f64) -> Vec<f64> {
    // Symmetric noise: -9.5, -8.5, ..., 9.5 around the bias.
    (0..CALIBRATION_SAMPLES).map(|i| bias_ms + i as f64 - 9.5).collect()
}

#[test]
fn test_run_reports_median_after_twenty_samples() {
    let mut estimator = CalibrationEstimator::new();
    let samples = biased_samples(40.0);

    for (i, e) in samples.iter().enumerate() {
        let result = estimator.push(*e);
        if i + 1 < CALIBRATION_SAMPLES {
            assert!(result.is_none(), "finished early at sample {}", i + 1);
            assert_eq!(estimator.len(), i + 1);
        } else {
            let median_ms = result.expect("20th sample completes the run");
            assert!((median_ms - 40.0).abs() < 1e-9);
        }
    }
    // Ready for another run without restarting anything.
    assert!(estimator.is_empty());
}

#[test]
fn test_median_of_even_count_averages_middle_pair() {
    assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
    assert_eq!(median(&[5.0, -1.0, 2.0]), Some(2.0));
    assert_eq!(median(&[]), None);
}

#[test]
fn test_single_outlier_moves_median_by_at_most_one_rank() {
    let clean = biased_samples(40.0);
    let mut dirty = clean.clone();
    dirty[0] = 500.0;

    let a = median(&clean).unwrap();
    let b = median(&dirty).unwrap();
    // Adjacent samples are 1ms apart.
    assert!((b - a).abs() <= 1.0 + 1e-9, "{a} -> {b}");
}

#[test]
fn test_grid_error_is_signed_distance_to_nearest_click() {
    let grid = TargetGrid { base: 2.0, interval: 0.6 };
    assert!((grid_error_ms(&grid, 2.64) - 40.0).abs() < 1e-6);
    assert!((grid_error_ms(&grid, 3.17) + 30.0).abs() < 1e-6);
}

#[test]
fn test_refine_removes_residual_from_applied_offset() {
    // First run from no offset: taps 40ms late.
    assert_eq!(CalibrationEstimator::refine(0.0, 40.0), -40.0);
    // Already compensated: a dead-on run keeps the offset.
    assert_eq!(CalibrationEstimator::refine(-40.0, 0.0), -40.0);
    // Residual 5ms early under -40: move back toward zero.
    assert_eq!(CalibrationEstimator::refine(-40.0, -5.0), -35.0);
}
