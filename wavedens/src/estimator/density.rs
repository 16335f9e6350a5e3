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

use std::path::PathBuf;

use tracing::debug;

use crate::error::Error;
use crate::estimator::AgingPolicy;
use crate::estimator::DensityCurve;
use crate::estimator::EstimatorConfig;
use crate::estimator::TranslateGrid;
use crate::estimator::grid::level_normalizer;
use crate::estimator::normalize::project_onto_densities;
use crate::estimator::serialization;
use crate::estimator::store::CoefficientStore;
use crate::wavelet::BasisLoader;
use crate::wavelet::BasisTable;
use crate::wavelet::DirectoryLoader;
use crate::wavelet::WaveletBasis;
use crate::wavelet::WaveletFamily;

/// Streaming wavelet density estimator.
///
/// The estimator starts uninitialized. [`reset`](Self::reset) loads the configured
/// wavelet basis, derives the translate grids and zeroes the coefficients; from then on
/// it accepts [`update`](Self::update) calls and answers [`snapshot`](Self::snapshot)
/// until it is reset again.
#[derive(Clone)]
pub struct WaveletDensityEstimator<L: BasisLoader = DirectoryLoader> {
    loader: L,
    state: Option<Streaming>,
}

/// Everything that exists only once the estimator has been reset.
#[derive(Debug, Clone)]
pub(crate) struct Streaming {
    pub(crate) config: EstimatorConfig,
    pub(crate) basis: WaveletBasis,
    pub(crate) scaling_grid: TranslateGrid,
    pub(crate) wavelet_grids: Vec<TranslateGrid>,
    pub(crate) store: CoefficientStore,
}

impl WaveletDensityEstimator<DirectoryLoader> {
    /// Creates an uninitialized estimator reading wavelet tables from `dir`.
    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        Self::new(DirectoryLoader::new(dir))
    }
}

impl<L: BasisLoader> WaveletDensityEstimator<L> {
    /// Creates an uninitialized estimator using the given basis loader.
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            state: None,
        }
    }

    /// Creates an estimator and resets it with `config`.
    pub fn with_config(loader: L, config: EstimatorConfig) -> Result<Self, Error> {
        let mut estimator = Self::new(loader);
        estimator.reset(config)?;
        Ok(estimator)
    }

    /// Restores an estimator from bytes produced by [`serialize`](Self::serialize).
    ///
    /// The basis is reloaded through `loader`.
    pub fn deserialize(bytes: &[u8], loader: L) -> Result<Self, Error> {
        let decoded = serialization::deserialize(bytes)?;
        let mut estimator = Self::new(loader);
        estimator.reset(decoded.config)?;
        let state = estimator.streaming_mut();
        serialization::restore(state, decoded.n, decoded.scaling, decoded.wavelet, decoded.window)?;
        Ok(estimator)
    }

    /// (Re)configures the estimator and zeroes every coefficient.
    ///
    /// The wavelet identifier is kept in its canonical spelling, so `" db02"` is stored
    /// as `"db2"`. On error the estimator is left uninitialized, whatever its previous
    /// state.
    pub fn reset(&mut self, config: EstimatorConfig) -> Result<(), Error> {
        self.state = None;

        config.validate()?;
        let family = WaveletFamily::parse(config.wavelet())?;
        let config = config.to_builder().wavelet(family.to_string()).build();
        let basis = self.loader.load(family)?;
        let support = basis.support();

        let scaling_grid =
            TranslateGrid::build(config.start_level(), support, config.min(), config.max())?;
        let wavelet_grids = config
            .detail_levels()
            .map(|level| TranslateGrid::build(level, support, config.min(), config.max()))
            .collect::<Result<Vec<_>, _>>()?;
        let store = CoefficientStore::zeroed(&scaling_grid, &wavelet_grids, config.aging());

        debug!(
            wavelet = %family,
            support = ?(support.start(), support.end()),
            scaling_translates = scaling_grid.len(),
            detail_levels = wavelet_grids.len(),
            aging = ?config.aging(),
            "estimator reset"
        );

        self.state = Some(Streaming {
            config,
            basis,
            scaling_grid,
            wavelet_grids,
            store,
        });
        Ok(())
    }

    /// Returns true once [`reset`](Self::reset) has succeeded.
    pub fn is_initialized(&self) -> bool {
        self.state.is_some()
    }

    /// Returns the basis loader.
    pub fn loader(&self) -> &L {
        &self.loader
    }

    /// Returns the active configuration.
    pub fn config(&self) -> Option<&EstimatorConfig> {
        self.state.as_ref().map(|s| &s.config)
    }

    /// Returns the loaded wavelet basis.
    pub fn basis(&self) -> Option<&WaveletBasis> {
        self.state.as_ref().map(|s| &s.basis)
    }

    /// Returns the number of samples consumed since the last reset.
    pub fn n(&self) -> u64 {
        self.state.as_ref().map_or(0, |s| s.store.n())
    }

    /// Returns the translate grid of the scaling level.
    pub fn scaling_grid(&self) -> Option<&TranslateGrid> {
        self.state.as_ref().map(|s| &s.scaling_grid)
    }

    /// Returns the translate grid of a detail level.
    pub fn wavelet_grid(&self, level: i32) -> Option<&TranslateGrid> {
        let state = self.state.as_ref()?;
        state.wavelet_grids.iter().find(|g| g.level() == level)
    }

    /// Returns the scaling coefficients, one per scaling translate.
    pub fn scaling_coefficients(&self) -> &[f64] {
        match self.state.as_ref() {
            Some(state) => state.store.scaling(),
            None => &[],
        }
    }

    /// Returns the wavelet coefficients of a detail level.
    pub fn wavelet_coefficients(&self, level: i32) -> Option<&[f64]> {
        let state = self.state.as_ref()?;
        let index = state.wavelet_grids.iter().position(|g| g.level() == level)?;
        Some(&state.store.wavelet()[index])
    }

    /// Updates the coefficients with one sample.
    ///
    /// Non-finite samples are ignored.
    ///
    /// # Panics
    ///
    /// Panics if the estimator has not been reset.
    pub fn update(&mut self, x: f64) {
        let state = self.streaming_mut();
        if !x.is_finite() {
            return;
        }
        state.update(x);
    }

    /// Returns the raw, unnormalized estimate at `x`.
    ///
    /// # Panics
    ///
    /// Panics if the estimator has not been reset.
    pub fn estimate_at(&self, x: f64) -> f64 {
        self.streaming().raw_density(x)
    }

    /// Reconstructs the density on `[min, max]` and projects it onto valid densities.
    ///
    /// Before any sample has been seen the curve is identically zero.
    ///
    /// # Panics
    ///
    /// Panics if the estimator has not been reset.
    pub fn snapshot(&self) -> DensityCurve {
        let state = self.streaming();
        let config = &state.config;

        let num_points = config.num_points();
        let xs: Vec<f64> = (0..num_points).map(|i| config.point(i)).collect();
        let mut ys: Vec<f64> = xs.iter().map(|x| state.raw_density(*x)).collect();
        let projection = project_onto_densities(
            &mut ys,
            config.discretization(),
            config.max() - config.min(),
            config.normalization(),
        );
        let points = xs.into_iter().zip(ys).collect();
        DensityCurve::new(points, config.discretization(), projection)
    }

    /// Serializes the configuration and the full streaming state.
    ///
    /// # Panics
    ///
    /// Panics if the estimator has not been reset.
    pub fn serialize(&self) -> Vec<u8> {
        serialization::serialize(self.streaming())
    }

    fn streaming(&self) -> &Streaming {
        match self.state.as_ref() {
            Some(state) => state,
            None => panic!("estimator is not initialized; call reset first"),
        }
    }

    fn streaming_mut(&mut self) -> &mut Streaming {
        match self.state.as_mut() {
            Some(state) => state,
            None => panic!("estimator is not initialized; call reset first"),
        }
    }
}

impl<L: BasisLoader> std::fmt::Debug for WaveletDensityEstimator<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WaveletDensityEstimator")
            .field("initialized", &self.is_initialized())
            .field("n", &self.n())
            .field("config", &self.config())
            .finish()
    }
}

impl Streaming {
    fn update(&mut self, x_new: f64) {
        let n = self.store.n();
        let aging = self.config.aging();
        let x_old = self.store.outgoing_sample();
        let (scaling, wavelet) = self.store.coefficients_mut();

        update_level(
            &self.basis,
            BasisTable::Phi,
            &self.scaling_grid,
            scaling,
            aging,
            n,
            x_new,
            x_old,
        );
        for (grid, coefficients) in self.wavelet_grids.iter().zip(wavelet.iter_mut()) {
            update_level(
                &self.basis,
                BasisTable::Psi,
                grid,
                coefficients,
                aging,
                n,
                x_new,
                x_old,
            );
        }

        self.store.commit(x_new);
    }

    fn raw_density(&self, x: f64) -> f64 {
        let mut density = level_sum(
            &self.basis,
            BasisTable::Phi,
            &self.scaling_grid,
            self.store.scaling(),
            x,
        );
        for (grid, coefficients) in self.wavelet_grids.iter().zip(self.store.wavelet()) {
            density += level_sum(&self.basis, BasisTable::Psi, grid, coefficients, x);
        }
        density
    }
}

/// Applies the aging transform of one level and adds the contribution of `x_new`.
fn update_level(
    basis: &WaveletBasis,
    table: BasisTable,
    grid: &TranslateGrid,
    coefficients: &mut [f64],
    aging: AgingPolicy,
    n: u64,
    x_new: f64,
    x_old: Option<f64>,
) {
    debug_assert_eq!(coefficients.len(), grid.len());
    let root = level_normalizer(grid.level());

    let eta = match aging {
        AgingPolicy::None => {
            let count = n as f64;
            let decay = count / (count + 1.0);
            coefficients.iter_mut().for_each(|c| *c *= decay);
            root / (count + 1.0)
        }
        AgingPolicy::Exponential { theta } => {
            coefficients.iter_mut().for_each(|c| *c *= theta);
            root * (1.0 - theta)
        }
        AgingPolicy::Windowed { size } => {
            let eta = root / size as f64;
            if let Some(x_old) = x_old {
                accumulate(basis, table, grid, coefficients, x_old, -eta);
            }
            eta
        }
    };

    accumulate(basis, table, grid, coefficients, x_new, eta);
}

/// Adds `weight * f(2^j * x - k)` to the coefficient of every translate `k` whose
/// support covers the sample.
fn accumulate(
    basis: &WaveletBasis,
    table: BasisTable,
    grid: &TranslateGrid,
    coefficients: &mut [f64],
    x: f64,
    weight: f64,
) {
    let scaled = grid.scale() * x;
    for index in grid.indices_near(scaled, basis.support()) {
        let position = scaled - grid.translate(index) as f64;
        if basis.in_support(position) {
            coefficients[index] += weight * basis.value_at(table, position);
        }
    }
}

/// Returns `sum_k c_k * 2^(j/2) * f(2^j * x - k)` for one level.
fn level_sum(
    basis: &WaveletBasis,
    table: BasisTable,
    grid: &TranslateGrid,
    coefficients: &[f64],
    x: f64,
) -> f64 {
    let scaled = grid.scale() * x;
    let mut sum = 0.0;
    for index in grid.indices_near(scaled, basis.support()) {
        let position = scaled - grid.translate(index) as f64;
        if basis.in_support(position) {
            sum += coefficients[index] * basis.value_at(table, position);
        }
    }
    sum * level_normalizer(grid.level())
}
