// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

mod common;

use common::db2_config;
use common::db2_estimator;
use common::db2_loader;
use googletest::assert_that;
use googletest::prelude::contains_substring;
use googletest::prelude::ge;
use googletest::prelude::lt;
use googletest::prelude::near;
use wavedens::error::ErrorKind;
use wavedens::estimator::AgingPolicy;
use wavedens::estimator::EstimatorConfig;
use wavedens::estimator::WaveletDensityEstimator;

fn assert_valid_density(curve: &wavedens::estimator::DensityCurve) {
    for (_, y) in curve {
        assert_that!(*y, ge(0.0));
    }
    if curve.is_converged() {
        let integral = curve.values().sum::<f64>() * curve.step();
        assert_that!((integral - 1.0).abs(), lt(1e-8));
    }
}

#[test]
fn test_snapshot_before_any_update() {
    let config = EstimatorConfig::builder()
        .wavelet("db2")
        .levels(0, 1)
        .density_range(-1.0, 1.0)
        .discretization(0.5)
        .build();
    let estimator = db2_estimator(config);

    let curve = estimator.snapshot();
    assert_eq!(
        curve.points(),
        &[(-1.0, 0.0), (-0.5, 0.0), (0.0, 0.0), (0.5, 0.0), (1.0, 0.0)]
    );
    assert!(!curve.is_converged());
    assert_eq!(curve.iterations(), 0);
    assert_eq!(curve.integral(), 0.0);
}

#[test]
fn test_single_sample_bump() {
    let mut estimator = db2_estimator(db2_config(0, AgingPolicy::None));
    estimator.update(0.0);
    assert_eq!(estimator.n(), 1);

    let curve = estimator.snapshot();
    assert!(curve.is_converged());
    assert_that!(curve.iterations(), lt(1000u32));
    assert_valid_density(&curve);

    let (mode, peak) = curve.mode().unwrap();
    assert_that!(mode.abs(), lt(0.5));
    assert_that!(peak, ge(1.0));
    let tail: f64 = curve
        .points()
        .iter()
        .filter(|(x, _)| x.abs() > 3.0)
        .map(|(_, y)| *y)
        .sum();
    assert_eq!(tail, 0.0);
}

#[test]
fn test_raw_estimate_of_single_sample() {
    let mut estimator = db2_estimator(db2_config(0, AgingPolicy::None));
    estimator.update(0.0);
    // sum over k of phi(-k)^2 with phi(1) = 1.366..., phi(2) = -0.366...
    assert_that!(estimator.estimate_at(0.0), near(2.0, 1e-12));
    assert_eq!(estimator.estimate_at(3.5), 0.0);
}

#[test]
fn test_coefficient_lengths_match_grids() {
    let config = EstimatorConfig::builder()
        .wavelet("db2")
        .levels(-1, 2)
        .density_range(-3.5, 3.5)
        .discretization(0.05)
        .build();
    let mut estimator = db2_estimator(config);

    let check = |estimator: &WaveletDensityEstimator| {
        let grid = estimator.scaling_grid().unwrap();
        assert_eq!(estimator.scaling_coefficients().len(), grid.len());
        for level in -1..=2 {
            let grid = estimator.wavelet_grid(level).unwrap();
            let coefficients = estimator.wavelet_coefficients(level).unwrap();
            assert_eq!(coefficients.len(), grid.len());
        }
        assert!(estimator.wavelet_grid(3).is_none());
    };

    check(&estimator);
    for i in 0..500 {
        estimator.update(((i * 37) % 100) as f64 / 20.0 - 2.5);
    }
    check(&estimator);
    assert_valid_density(&estimator.snapshot());
}

#[test]
fn test_scaling_grid_bounds() {
    let estimator = db2_estimator(db2_config(1, AgingPolicy::None));
    let grid = estimator.scaling_grid().unwrap();
    // floor(2 * -4 - 3) ..= ceil(2 * 4 - 0)
    assert_eq!(grid.start(), -11);
    assert_eq!(grid.stop(), 8);
    assert_eq!(grid.len(), 20);
}

#[test]
fn test_snapshot_is_idempotent() {
    let config = EstimatorConfig::builder()
        .wavelet("db2")
        .levels(0, 1)
        .aging(AgingPolicy::Exponential { theta: 0.9 })
        .build();
    let mut estimator = db2_estimator(config);
    for i in 0..200 {
        estimator.update((i % 7) as f64 * 0.3 - 1.0);
    }
    let first = estimator.snapshot();
    let second = estimator.snapshot();
    assert_eq!(first, second);
    assert_valid_density(&first);
}

#[test]
fn test_windowed_aging_forgets_old_samples() {
    let window = 25;
    let config = db2_config(1, AgingPolicy::Windowed { size: window });
    let mut estimator = db2_estimator(config.clone());
    let mut fresh = db2_estimator(config);

    for _ in 0..window {
        estimator.update(-2.0);
    }
    for i in 0..window {
        let x = 1.0 + (i % 5) as f64 * 0.1;
        estimator.update(x);
        fresh.update(x);
    }

    assert_eq!(estimator.n(), 2 * window as u64);
    for (aged, expected) in estimator
        .scaling_coefficients()
        .iter()
        .zip(fresh.scaling_coefficients())
    {
        assert_that!(*aged, near(*expected, 1e-12));
    }

    let aged = estimator.snapshot();
    let expected = fresh.snapshot();
    for ((_, y), (_, z)) in aged.points().iter().zip(expected.points()) {
        assert_that!(*y, near(*z, 1e-6));
    }
}

#[test]
fn test_windowed_aging_with_detail_levels() {
    let window = 10;
    let config = EstimatorConfig::builder()
        .wavelet("db2")
        .levels(0, 2)
        .aging(AgingPolicy::Windowed { size: window })
        .density_range(-4.0, 4.0)
        .build();
    let mut estimator = db2_estimator(config.clone());
    let mut fresh = db2_estimator(config);

    for i in 0..window {
        estimator.update(i as f64 * 0.2 - 3.0);
    }
    for i in 0..window {
        let x = i as f64 * 0.15;
        estimator.update(x);
        fresh.update(x);
    }

    for level in 0..=2 {
        let aged = estimator.wavelet_coefficients(level).unwrap();
        let expected = fresh.wavelet_coefficients(level).unwrap();
        for (a, e) in aged.iter().zip(expected) {
            assert_that!(*a, near(*e, 1e-12));
        }
    }
}

#[test]
fn test_exponential_aging() {
    let theta = 0.5;
    let mut estimator = db2_estimator(db2_config(0, AgingPolicy::Exponential { theta }));
    let grid = estimator.scaling_grid().unwrap().clone();
    let index = grid.index_of(-1).unwrap();

    estimator.update(0.0);
    let phi_one = 1.3660254037844386;
    assert_that!(estimator.scaling_coefficients()[index], near(0.5 * phi_one, 1e-12));

    // far enough that translate -1 does not cover it
    estimator.update(3.5);
    assert_that!(estimator.scaling_coefficients()[index], near(0.25 * phi_one, 1e-12));
}

#[test]
fn test_recursive_mean() {
    let mut estimator = db2_estimator(db2_config(0, AgingPolicy::None));
    let grid = estimator.scaling_grid().unwrap().clone();
    let index = grid.index_of(-1).unwrap();

    estimator.update(0.0);
    estimator.update(3.5);
    estimator.update(3.5);
    assert_that!(
        estimator.scaling_coefficients()[index],
        near(1.3660254037844386 / 3.0, 1e-12)
    );
}

#[test]
fn test_non_finite_samples_are_ignored() {
    let mut estimator = db2_estimator(db2_config(0, AgingPolicy::None));
    estimator.update(0.25);
    let before = estimator.scaling_coefficients().to_vec();

    estimator.update(f64::NAN);
    estimator.update(f64::INFINITY);
    estimator.update(f64::NEG_INFINITY);
    assert_eq!(estimator.n(), 1);
    assert_eq!(estimator.scaling_coefficients(), before.as_slice());
}

#[test]
fn test_unsupported_wavelet_leaves_estimator_uninitialized() {
    let mut estimator = db2_estimator(db2_config(0, AgingPolicy::None));
    estimator.update(0.0);
    assert!(estimator.is_initialized());

    let config = EstimatorConfig::builder().wavelet("foo3").build();
    let err = estimator.reset(config).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedWavelet);
    assert_eq!(err.context_value("wavelet"), Some("foo3"));
    assert!(!estimator.is_initialized());
    assert_eq!(estimator.n(), 0);
    assert!(estimator.scaling_coefficients().is_empty());
}

#[test]
fn test_missing_tables_fail_reset() {
    let dir = tempfile::tempdir().unwrap();
    let mut estimator = WaveletDensityEstimator::from_dir(dir.path());
    let config = EstimatorConfig::builder().wavelet("db6").build();
    let err = estimator.reset(config).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DataLoad);
    assert!(!estimator.is_initialized());
}

#[test]
fn test_invalid_config_fails_reset() {
    let mut estimator = WaveletDensityEstimator::new(db2_loader());
    let config = EstimatorConfig::builder()
        .wavelet("db2")
        .aging(AgingPolicy::Exponential { theta: 1.5 })
        .build();
    let err = estimator.reset(config).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
    assert_that!(err.message(), contains_substring("theta"));
}

#[test]
fn test_oversized_domain_fails_reset() {
    let mut estimator = db2_estimator(db2_config(0, AgingPolicy::None));
    let config = EstimatorConfig::builder()
        .wavelet("db2")
        .density_range(-1e300, 1e300)
        .discretization(1e299)
        .build();
    let err = estimator.reset(config).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
    assert_that!(err.message(), contains_substring("too wide"));
    assert!(!estimator.is_initialized());

    let config = db2_config(0, AgingPolicy::None)
        .to_builder()
        .discretization(1e-12)
        .build();
    let err = estimator.reset(config).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
    assert_that!(err.message(), contains_substring("too many density points"));
}

#[test]
fn test_reset_stores_canonical_wavelet_id() {
    let config = db2_config(0, AgingPolicy::None)
        .to_builder()
        .wavelet(" db002 ")
        .build();
    let estimator = db2_estimator(config);
    assert_eq!(estimator.config().unwrap().wavelet(), "db2");
}

#[test]
fn test_reset_clears_state() {
    let mut estimator = db2_estimator(db2_config(0, AgingPolicy::Windowed { size: 4 }));
    for i in 0..10 {
        estimator.update(i as f64 * 0.1);
    }
    estimator.reset(db2_config(0, AgingPolicy::None)).unwrap();
    assert_eq!(estimator.n(), 0);
    assert!(estimator.scaling_coefficients().iter().all(|c| *c == 0.0));
}

#[test]
#[should_panic(expected = "estimator is not initialized")]
fn test_update_before_reset() {
    let mut estimator = WaveletDensityEstimator::new(db2_loader());
    estimator.update(0.0);
}

#[test]
#[should_panic(expected = "estimator is not initialized")]
fn test_snapshot_before_reset() {
    let estimator = WaveletDensityEstimator::new(db2_loader());
    let _ = estimator.snapshot();
}
