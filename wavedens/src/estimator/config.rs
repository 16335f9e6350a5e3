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

use std::ops::RangeInclusive;

use serde::Deserialize;
use serde::Serialize;

use crate::error::Error;
use crate::estimator::grid::MAX_GRID_LEN;
use crate::estimator::grid::MAX_TRANSLATE_MAGNITUDE;
use crate::estimator::grid::dyadic_scale;

/// Largest number of reconstructed density points a configuration may ask for.
pub(crate) const MAX_POINTS: usize = 1 << 24;

/// Default resolution level for both the scaling and wavelet functions.
pub const DEFAULT_LEVEL: i32 = 1;
/// Default wavelet identifier.
pub const DEFAULT_WAVELET: &str = "db6";
/// Default window size for windowed aging.
pub const DEFAULT_WINDOW_SIZE: usize = 1400;
/// Default forgetting factor for exponential aging.
pub const DEFAULT_THETA: f64 = 0.995;
/// Default density domain.
pub const DEFAULT_DENSITY_RANGE: [f64; 2] = [-3.5, 3.5];
/// Default distance between reconstructed density points.
pub const DEFAULT_DISCRETIZATION: f64 = 0.01;
/// Default tolerance on the integral of a normalized density.
pub const DEFAULT_THRESHOLD: f64 = 1e-8;
/// Default iteration cap of the normalization loop.
pub const DEFAULT_MAX_ITERATIONS: u32 = 1000;

/// How the influence of older samples on the coefficients decays.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AgingPolicy {
    /// Recursive mean over every sample seen.
    None,
    /// Exponential forgetting: each update scales existing coefficients by `theta`.
    Exponential {
        /// Forgetting factor in `(0, 1)`.
        theta: f64,
    },
    /// Estimate over exactly the last `size` samples.
    Windowed {
        /// Number of samples in the sliding window.
        size: usize,
    },
}

impl Default for AgingPolicy {
    fn default() -> Self {
        AgingPolicy::Windowed {
            size: DEFAULT_WINDOW_SIZE,
        }
    }
}

/// Stopping rule of the iterative projection onto valid densities.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NormalizationConfig {
    #[serde(default = "default_threshold")]
    threshold: f64,
    #[serde(default = "default_max_iterations")]
    max_iterations: u32,
}

impl NormalizationConfig {
    /// Creates a stopping rule.
    ///
    /// # Panics
    ///
    /// Panics if `threshold` is not positive or `max_iterations` is zero.
    pub fn new(threshold: f64, max_iterations: u32) -> Self {
        assert!(
            threshold > 0.0,
            "threshold must be positive, got {threshold}"
        );
        assert!(max_iterations > 0, "max_iterations must be positive");
        Self {
            threshold,
            max_iterations,
        }
    }

    /// Returns the accepted distance between the integral and one.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Returns the iteration cap.
    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

fn default_max_iterations() -> u32 {
    DEFAULT_MAX_ITERATIONS
}

fn default_level() -> i32 {
    DEFAULT_LEVEL
}

fn default_wavelet() -> String {
    DEFAULT_WAVELET.to_string()
}

fn default_density_range() -> [f64; 2] {
    DEFAULT_DENSITY_RANGE
}

fn default_discretization() -> f64 {
    DEFAULT_DISCRETIZATION
}

fn default_true() -> bool {
    true
}

/// Configuration consumed by [`WaveletDensityEstimator::reset`].
///
/// Built with [`EstimatorConfig::builder`] or read from TOML:
///
/// ```
/// # use wavedens::estimator::{AgingPolicy, EstimatorConfig};
/// let config = EstimatorConfig::from_toml_str(
///     r#"
///     start_level = 0
///     stop_level = 2
///     wavelet = "db2"
///     density_range = [-1.0, 1.0]
///     discretization = 0.5
///
///     [aging]
///     kind = "exponential"
///     theta = 0.99
///     "#,
/// )
/// .unwrap();
/// assert_eq!(config.wavelet(), "db2");
/// assert_eq!(config.aging(), AgingPolicy::Exponential { theta: 0.99 });
/// assert!(config.wavelet_detail());
/// ```
///
/// [`WaveletDensityEstimator::reset`]: crate::estimator::WaveletDensityEstimator::reset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EstimatorConfig {
    #[serde(default = "default_level")]
    start_level: i32,
    #[serde(default = "default_level")]
    stop_level: i32,
    #[serde(default = "default_wavelet")]
    wavelet: String,
    #[serde(default)]
    aging: AgingPolicy,
    #[serde(default = "default_density_range")]
    density_range: [f64; 2],
    #[serde(default = "default_discretization")]
    discretization: f64,
    #[serde(default = "default_true")]
    wavelet_detail: bool,
    #[serde(default)]
    normalization: NormalizationConfig,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            start_level: DEFAULT_LEVEL,
            stop_level: DEFAULT_LEVEL,
            wavelet: default_wavelet(),
            aging: AgingPolicy::default(),
            density_range: DEFAULT_DENSITY_RANGE,
            discretization: DEFAULT_DISCRETIZATION,
            wavelet_detail: true,
            normalization: NormalizationConfig::default(),
        }
    }
}

impl EstimatorConfig {
    /// Returns a builder seeded with the default configuration.
    pub fn builder() -> EstimatorConfigBuilder {
        EstimatorConfigBuilder::default()
    }

    /// Returns a builder seeded with this configuration.
    pub fn to_builder(&self) -> EstimatorConfigBuilder {
        EstimatorConfigBuilder {
            config: self.clone(),
        }
    }

    /// Parses a configuration from TOML text. Missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, Error> {
        let config: EstimatorConfig = toml::from_str(text).map_err(|err| {
            Error::config_invalid("failed to parse estimator configuration").set_source(err)
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Returns the scaling resolution level `j0`.
    pub fn start_level(&self) -> i32 {
        self.start_level
    }

    /// Returns the finest detail resolution level `j1`.
    pub fn stop_level(&self) -> i32 {
        self.stop_level
    }

    /// Returns the wavelet identifier, e.g. `"db6"`.
    pub fn wavelet(&self) -> &str {
        &self.wavelet
    }

    /// Returns the aging policy.
    pub fn aging(&self) -> AgingPolicy {
        self.aging
    }

    /// Returns the lower bound of the density domain.
    pub fn min(&self) -> f64 {
        self.density_range[0]
    }

    /// Returns the upper bound of the density domain.
    pub fn max(&self) -> f64 {
        self.density_range[1]
    }

    /// Returns the distance between reconstructed density points.
    pub fn discretization(&self) -> f64 {
        self.discretization
    }

    /// Returns true if wavelet detail levels refine the scaling approximation.
    pub fn wavelet_detail(&self) -> bool {
        self.wavelet_detail
    }

    /// Returns the normalization stopping rule.
    pub fn normalization(&self) -> NormalizationConfig {
        self.normalization
    }

    /// Returns the resolution levels that carry wavelet coefficients.
    pub fn detail_levels(&self) -> RangeInclusive<i32> {
        if self.wavelet_detail {
            self.start_level..=self.stop_level
        } else {
            // empty
            1..=0
        }
    }

    /// Returns the number of reconstructed density points covering `[min, max]`.
    pub fn num_points(&self) -> usize {
        let steps = (self.max() - self.min()) / self.discretization;
        // absorb representation error so that e.g. 2.0 / 0.5 keeps its last point
        (steps + 1e-9).floor() as usize + 1
    }

    /// Returns the abscissa of the `index`-th reconstructed density point.
    pub fn point(&self, index: usize) -> f64 {
        self.min() + index as f64 * self.discretization
    }

    /// Checks that the configuration describes a non-degenerate estimator.
    pub fn validate(&self) -> Result<(), Error> {
        let [min, max] = self.density_range;
        if !min.is_finite() || !max.is_finite() || min >= max {
            return Err(Error::config_invalid("density range must be finite with min < max")
                .with_context("min", min)
                .with_context("max", max));
        }
        if !self.discretization.is_finite() || self.discretization <= 0.0 {
            return Err(Error::config_invalid("discretization must be positive")
                .with_context("discretization", self.discretization));
        }
        if self.start_level > self.stop_level {
            return Err(Error::config_invalid("start level must not exceed stop level")
                .with_context("start_level", self.start_level)
                .with_context("stop_level", self.stop_level));
        }
        if self.start_level.abs() > 30 || self.stop_level.abs() > 30 {
            return Err(Error::config_invalid("resolution levels must be in [-30, 30]")
                .with_context("start_level", self.start_level)
                .with_context("stop_level", self.stop_level));
        }
        let finest = if self.wavelet_detail {
            self.stop_level
        } else {
            self.start_level
        };
        let scale = dyadic_scale(finest);
        let (scaled_min, scaled_max) = (scale * min, scale * max);
        if !(scaled_min.abs() <= MAX_TRANSLATE_MAGNITUDE
            && scaled_max.abs() <= MAX_TRANSLATE_MAGNITUDE
            && scaled_max - scaled_min <= MAX_GRID_LEN as f64)
        {
            return Err(Error::config_invalid(
                "density range is too wide for the finest resolution level",
            )
            .with_context("level", finest)
            .with_context("min", min)
            .with_context("max", max));
        }
        let steps = (max - min) / self.discretization;
        if !(steps < MAX_POINTS as f64) {
            return Err(Error::config_invalid("discretization yields too many density points")
                .with_context("discretization", self.discretization)
                .with_context("max_points", MAX_POINTS));
        }
        match self.aging {
            AgingPolicy::None => {}
            AgingPolicy::Exponential { theta } => {
                if !(theta > 0.0 && theta < 1.0) {
                    return Err(Error::config_invalid("theta must be in (0, 1)")
                        .with_context("theta", theta));
                }
            }
            AgingPolicy::Windowed { size } => {
                if size == 0 {
                    return Err(Error::config_invalid("window size must be positive"));
                }
            }
        }
        let normalization = self.normalization;
        if !(normalization.threshold > 0.0) || normalization.max_iterations == 0 {
            return Err(Error::config_invalid(
                "normalization needs a positive threshold and iteration cap",
            )
            .with_context("threshold", normalization.threshold)
            .with_context("max_iterations", normalization.max_iterations));
        }
        Ok(())
    }
}

/// Builder for [`EstimatorConfig`].
#[derive(Debug, Clone, Default)]
pub struct EstimatorConfigBuilder {
    config: EstimatorConfig,
}

impl EstimatorConfigBuilder {
    /// Sets the scaling level `j0` and the finest detail level `j1`.
    ///
    /// # Panics
    ///
    /// Panics if `start > stop`.
    pub fn levels(mut self, start: i32, stop: i32) -> Self {
        assert!(
            start <= stop,
            "start level must not exceed stop level, got [{start}, {stop}]"
        );
        self.config.start_level = start;
        self.config.stop_level = stop;
        self
    }

    /// Sets the wavelet identifier. It is checked when the estimator is reset.
    pub fn wavelet(mut self, id: impl Into<String>) -> Self {
        self.config.wavelet = id.into();
        self
    }

    /// Sets the aging policy.
    pub fn aging(mut self, aging: AgingPolicy) -> Self {
        self.config.aging = aging;
        self
    }

    /// Sets the density domain `[min, max]`.
    ///
    /// # Panics
    ///
    /// Panics if `min >= max`.
    pub fn density_range(mut self, min: f64, max: f64) -> Self {
        assert!(min < max, "density range must satisfy min < max, got [{min}, {max}]");
        self.config.density_range = [min, max];
        self
    }

    /// Sets the distance between reconstructed density points.
    ///
    /// # Panics
    ///
    /// Panics if `step` is not positive.
    pub fn discretization(mut self, step: f64) -> Self {
        assert!(step > 0.0, "discretization must be positive, got {step}");
        self.config.discretization = step;
        self
    }

    /// Enables or disables the wavelet detail levels.
    pub fn wavelet_detail(mut self, enabled: bool) -> Self {
        self.config.wavelet_detail = enabled;
        self
    }

    /// Sets the normalization stopping rule.
    pub fn normalization(mut self, normalization: NormalizationConfig) -> Self {
        self.config.normalization = normalization;
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> EstimatorConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_defaults() {
        let config = EstimatorConfig::default();
        assert_eq!(config.start_level(), 1);
        assert_eq!(config.stop_level(), 1);
        assert_eq!(config.wavelet(), "db6");
        assert_eq!(config.aging(), AgingPolicy::Windowed { size: 1400 });
        assert_eq!((config.min(), config.max()), (-3.5, 3.5));
        assert!(config.wavelet_detail());
        assert_eq!(config.num_points(), 701);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_num_points_includes_max() {
        let config = EstimatorConfig::builder()
            .density_range(-1.0, 1.0)
            .discretization(0.5)
            .build();
        assert_eq!(config.num_points(), 5);
        assert_eq!(config.point(4), 1.0);
    }

    #[test]
    fn test_detail_levels() {
        let config = EstimatorConfig::builder().levels(0, 2).build();
        assert_eq!(config.detail_levels().collect::<Vec<_>>(), vec![0, 1, 2]);
        let config = EstimatorConfig::builder()
            .levels(0, 2)
            .wavelet_detail(false)
            .build();
        assert_eq!(config.detail_levels().count(), 0);
    }

    #[test]
    fn test_validate_rejects_bad_aging() {
        let config = EstimatorConfig::builder()
            .aging(AgingPolicy::Exponential { theta: 1.0 })
            .build();
        assert_eq!(config.validate().unwrap_err().kind(), ErrorKind::ConfigInvalid);
        let config = EstimatorConfig::builder()
            .aging(AgingPolicy::Windowed { size: 0 })
            .build();
        assert_eq!(config.validate().unwrap_err().kind(), ErrorKind::ConfigInvalid);
    }

    #[test]
    fn test_validate_rejects_oversized_domain() {
        let config = EstimatorConfig::builder()
            .density_range(-1e300, 1e300)
            .discretization(1e299)
            .build();
        let err = config.validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
        assert_eq!(err.context_value("level"), Some("1"));

        // the finest level decides
        let config = EstimatorConfig::builder()
            .levels(0, 30)
            .density_range(-1e4, 1e4)
            .discretization(1.0)
            .build();
        assert_eq!(config.validate().unwrap_err().kind(), ErrorKind::ConfigInvalid);
        let config = config.to_builder().wavelet_detail(false).build();
        assert!(config.validate().is_ok());

        let config = EstimatorConfig::builder()
            .density_range(f64::MIN, f64::MAX)
            .build();
        assert_eq!(config.validate().unwrap_err().kind(), ErrorKind::ConfigInvalid);
    }

    #[test]
    fn test_validate_rejects_too_many_points() {
        let config = EstimatorConfig::builder().discretization(1e-12).build();
        let err = config.validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
        assert!(err.message().contains("too many density points"));

        let config = EstimatorConfig::builder()
            .discretization(0.5f64.powi(20))
            .build();
        assert!(config.validate().is_ok());
        assert_eq!(config.num_points(), 7 * (1 << 20) + 1);
    }

    #[test]
    fn test_toml_rejects_unknown_keys() {
        let err = EstimatorConfig::from_toml_str("resolution = 3").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
    }

    #[test]
    fn test_toml_validates_values() {
        let err = EstimatorConfig::from_toml_str("density_range = [1.0, -1.0]").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
    }

    #[test]
    fn test_to_builder_keeps_other_fields() {
        let config = EstimatorConfig::builder()
            .levels(-1, 2)
            .aging(AgingPolicy::None)
            .build();
        let changed = config.to_builder().wavelet("sym5").build();
        assert_eq!(changed.wavelet(), "sym5");
        assert_eq!(changed.start_level(), -1);
        assert_eq!(changed.aging(), AgingPolicy::None);
    }

    #[test]
    #[should_panic(expected = "start level must not exceed stop level")]
    fn test_builder_rejects_inverted_levels() {
        EstimatorConfig::builder().levels(3, 1);
    }
}
