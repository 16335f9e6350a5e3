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

//! Streaming wavelet density estimation.
//!
//! The estimator keeps one coefficient per basis translate at the scaling level `j0` and,
//! when detail is enabled, at every level in `j0..=j1`. Each sample adjusts only the
//! translates whose support covers it; a snapshot reconstructs the series on a regular
//! grid and projects it onto the set of valid densities.
//!
//! # Usage
//!
//! ```rust
//! # use wavedens::estimator::{AgingPolicy, EstimatorConfig, WaveletDensityEstimator};
//! # use wavedens::wavelet::{MemoryLoader, WaveletBasis, WaveletFamily};
//! let family = WaveletFamily::parse("db1").unwrap();
//! let basis = WaveletBasis::from_tables(
//!     family,
//!     vec![0.0, 0.5, 1.0],
//!     vec![1.0, 1.0, 1.0],
//!     vec![1.0, 0.0, -1.0],
//! )
//! .unwrap();
//! let config = EstimatorConfig::builder()
//!     .wavelet("db1")
//!     .levels(0, 0)
//!     .aging(AgingPolicy::None)
//!     .density_range(-2.0, 2.0)
//!     .discretization(0.25)
//!     .wavelet_detail(false)
//!     .build();
//! let mut estimator =
//!     WaveletDensityEstimator::with_config(MemoryLoader::new().with_basis(basis), config).unwrap();
//! estimator.update(0.5);
//! let curve = estimator.snapshot();
//! assert!(curve.is_converged());
//! assert!(curve.values().all(|y| y >= 0.0));
//! ```

mod config;
mod density;
mod grid;
mod normalize;
mod serialization;
mod shared;
mod store;

pub use self::config::AgingPolicy;
pub use self::config::DEFAULT_DENSITY_RANGE;
pub use self::config::DEFAULT_DISCRETIZATION;
pub use self::config::DEFAULT_LEVEL;
pub use self::config::DEFAULT_MAX_ITERATIONS;
pub use self::config::DEFAULT_THETA;
pub use self::config::DEFAULT_THRESHOLD;
pub use self::config::DEFAULT_WAVELET;
pub use self::config::DEFAULT_WINDOW_SIZE;
pub use self::config::EstimatorConfig;
pub use self::config::EstimatorConfigBuilder;
pub use self::config::NormalizationConfig;
pub use self::density::WaveletDensityEstimator;
pub use self::grid::TranslateGrid;
pub use self::normalize::DensityCurve;
pub use self::shared::SharedEstimator;
