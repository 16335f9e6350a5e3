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

use crate::estimator::AgingPolicy;
use crate::estimator::TranslateGrid;

/// Fixed-capacity circular buffer of the most recent samples.
///
/// Sample number `n` (zero based) lives in slot `n % capacity`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SampleWindow {
    capacity: usize,
    values: Vec<f64>,
}

impl SampleWindow {
    pub(crate) fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "window capacity must be positive");
        Self {
            capacity,
            values: Vec::new(),
        }
    }

    pub(crate) fn from_parts(capacity: usize, values: Vec<f64>) -> Self {
        assert!(values.len() <= capacity, "window holds more than its capacity");
        Self { capacity, values }
    }

    pub(crate) fn values(&self) -> &[f64] {
        &self.values
    }

    /// The sample that storing sample number `n` would overwrite.
    pub(crate) fn outgoing(&self, n: u64) -> Option<f64> {
        if self.values.len() < self.capacity {
            None
        } else {
            Some(self.values[self.slot(n)])
        }
    }

    /// Stores sample number `n`.
    pub(crate) fn store(&mut self, n: u64, x: f64) {
        if self.values.len() < self.capacity {
            self.values.push(x);
        } else {
            let slot = self.slot(n);
            self.values[slot] = x;
        }
    }

    fn slot(&self, n: u64) -> usize {
        (n % self.capacity as u64) as usize
    }
}

/// Mutable coefficient vectors of one estimator plus the aging bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CoefficientStore {
    scaling: Vec<f64>,
    wavelet: Vec<Vec<f64>>,
    n: u64,
    window: Option<SampleWindow>,
}

impl CoefficientStore {
    /// Zeroed coefficients length-matched to the grids.
    pub(crate) fn zeroed(
        scaling_grid: &TranslateGrid,
        wavelet_grids: &[TranslateGrid],
        aging: AgingPolicy,
    ) -> Self {
        let window = match aging {
            AgingPolicy::Windowed { size } => Some(SampleWindow::new(size)),
            AgingPolicy::None | AgingPolicy::Exponential { .. } => None,
        };
        Self {
            scaling: vec![0.0; scaling_grid.len()],
            wavelet: wavelet_grids.iter().map(|g| vec![0.0; g.len()]).collect(),
            n: 0,
            window,
        }
    }

    pub(crate) fn from_parts(
        scaling: Vec<f64>,
        wavelet: Vec<Vec<f64>>,
        n: u64,
        window: Option<SampleWindow>,
    ) -> Self {
        Self {
            scaling,
            wavelet,
            n,
            window,
        }
    }

    pub(crate) fn n(&self) -> u64 {
        self.n
    }

    pub(crate) fn scaling(&self) -> &[f64] {
        &self.scaling
    }

    pub(crate) fn wavelet(&self) -> &[Vec<f64>] {
        &self.wavelet
    }

    pub(crate) fn window(&self) -> Option<&SampleWindow> {
        self.window.as_ref()
    }

    pub(crate) fn outgoing_sample(&self) -> Option<f64> {
        self.window.as_ref().and_then(|w| w.outgoing(self.n))
    }

    pub(crate) fn coefficients_mut(&mut self) -> (&mut [f64], &mut [Vec<f64>]) {
        (&mut self.scaling, &mut self.wavelet)
    }

    /// Stores the sample in the window, if any, and counts it.
    pub(crate) fn commit(&mut self, x: f64) {
        if let Some(window) = self.window.as_mut() {
            window.store(self.n, x);
        }
        self.n += 1;
    }
}
