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

use tracing::trace;
use tracing::warn;

use crate::estimator::NormalizationConfig;

/// Outcome of [`project_onto_densities`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Projection {
    pub(crate) iterations: u32,
    pub(crate) converged: bool,
    pub(crate) integral: f64,
}

/// Projects a raw estimate onto the set of bona fide densities (Gajek, 1986).
///
/// Each round clips negative values to zero, integrates with the Riemann sum
/// `sum(y) * step`, and shifts every value by `(integral - 1) / width`. The loop
/// stops once the integral is within `threshold` of one, or gives up after
/// `max_iterations` rounds and keeps the last (clipped) approximation.
///
/// A raw estimate with no positive mass is left as the all-zero curve.
pub(crate) fn project_onto_densities(
    values: &mut [f64],
    step: f64,
    width: f64,
    config: NormalizationConfig,
) -> Projection {
    let threshold = config.threshold();
    let max_iterations = config.max_iterations();

    let mut integral = clip_and_integrate(values, step);
    if integral == 0.0 {
        return Projection {
            iterations: 0,
            converged: false,
            integral,
        };
    }

    for iteration in 1..=max_iterations {
        if (integral - 1.0).abs() < threshold {
            trace!(iterations = iteration, integral, "density normalized");
            return Projection {
                iterations: iteration,
                converged: true,
                integral,
            };
        }
        let shift = (integral - 1.0) / width;
        for value in values.iter_mut() {
            *value -= shift;
        }
        integral = clip_and_integrate(values, step);
    }

    warn!(
        max_iterations,
        residual = integral - 1.0,
        "density normalization did not converge"
    );
    Projection {
        iterations: max_iterations,
        converged: (integral - 1.0).abs() < threshold,
        integral,
    }
}

fn clip_and_integrate(values: &mut [f64], step: f64) -> f64 {
    let mut sum = 0.0;
    for value in values.iter_mut() {
        if *value < 0.0 {
            *value = 0.0;
        }
        sum += *value;
    }
    sum * step
}

/// A normalized density curve sampled on `[min, max]` at a fixed step.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityCurve {
    points: Vec<(f64, f64)>,
    step: f64,
    iterations: u32,
    converged: bool,
    integral: f64,
}

impl DensityCurve {
    pub(crate) fn new(points: Vec<(f64, f64)>, step: f64, projection: Projection) -> Self {
        Self {
            points,
            step,
            iterations: projection.iterations,
            converged: projection.converged,
            integral: projection.integral,
        }
    }

    /// Returns the `(x, density(x))` pairs in ascending `x`.
    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    /// Returns the density values in ascending `x`.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|(_, y)| *y)
    }

    /// Returns the number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns true if the curve has no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Returns the distance between consecutive points.
    pub fn step(&self) -> f64 {
        self.step
    }

    /// Returns the number of projection rounds that were run.
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Returns true if the integral reached one within the configured threshold.
    pub fn is_converged(&self) -> bool {
        self.converged
    }

    /// Returns the Riemann-sum integral of the curve.
    pub fn integral(&self) -> f64 {
        self.integral
    }

    /// Returns `integral - 1`.
    pub fn residual(&self) -> f64 {
        self.integral - 1.0
    }

    /// Returns the point with the largest density, if any.
    pub fn mode(&self) -> Option<(f64, f64)> {
        self.points
            .iter()
            .copied()
            .fold(None, |best, point| match best {
                Some((_, y)) if y >= point.1 => best,
                _ => Some(point),
            })
    }
}

impl<'a> IntoIterator for &'a DensityCurve {
    type Item = &'a (f64, f64);
    type IntoIter = std::slice::Iter<'a, (f64, f64)>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> NormalizationConfig {
        NormalizationConfig::new(1e-8, 1000)
    }

    #[test]
    fn test_zero_mass_is_left_alone() {
        let mut values = vec![0.0, -1.0, 0.0];
        let projection = project_onto_densities(&mut values, 0.5, 1.0, config());
        assert_eq!(values, vec![0.0, 0.0, 0.0]);
        assert_eq!(projection.iterations, 0);
        assert!(!projection.converged);
        assert_eq!(projection.integral, 0.0);
    }

    #[test]
    fn test_already_normalized() {
        // 11 points on [0, 1] with step 0.1: 1.0 * 11 * 0.1 is not exactly one
        let mut values = vec![1.0 / 1.1; 11];
        let projection = project_onto_densities(&mut values, 0.1, 1.0, config());
        assert!(projection.converged);
        assert_eq!(projection.iterations, 1);
    }

    #[test]
    fn test_clips_and_rescales() {
        let mut values = vec![-2.0, 3.0, 5.0, 3.0, -2.0];
        let projection = project_onto_densities(&mut values, 0.25, 1.0, config());
        assert!(projection.converged);
        assert!(values.iter().all(|v| *v >= 0.0));
        let integral: f64 = values.iter().sum::<f64>() * 0.25;
        assert!((integral - 1.0).abs() < 1e-8);
        assert!(values[2] > values[1]);
    }

    #[test]
    fn test_iteration_cap_keeps_non_negative_values() {
        let mut values = vec![0.0, 100.0, 0.0, 0.0];
        let projection =
            project_onto_densities(&mut values, 0.25, 0.75, NormalizationConfig::new(1e-12, 1));
        assert!(!projection.converged);
        assert_eq!(projection.iterations, 1);
        assert!(values.iter().all(|v| *v >= 0.0));
    }

    #[test]
    fn test_curve_mode() {
        let projection = Projection {
            iterations: 1,
            converged: true,
            integral: 1.0,
        };
        let curve = DensityCurve::new(vec![(0.0, 0.5), (0.5, 1.5), (1.0, 0.0)], 0.5, projection);
        assert_eq!(curve.mode(), Some((0.5, 1.5)));
        assert_eq!(curve.residual(), 0.0);
        assert_eq!(curve.values().collect::<Vec<_>>(), vec![0.5, 1.5, 0.0]);
    }
}
