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

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use crate::error::Error;
use crate::estimator::DensityCurve;
use crate::estimator::EstimatorConfig;
use crate::estimator::WaveletDensityEstimator;
use crate::wavelet::BasisLoader;
use crate::wavelet::DirectoryLoader;

/// A [`WaveletDensityEstimator`] behind a single mutex.
///
/// Every operation takes the lock for its whole duration, so an `update` and a
/// `snapshot` issued from different threads never interleave. Clones share the same
/// estimator.
pub struct SharedEstimator<L: BasisLoader = DirectoryLoader> {
    inner: Arc<Mutex<WaveletDensityEstimator<L>>>,
}

impl<L: BasisLoader> Clone for SharedEstimator<L> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<L: BasisLoader> SharedEstimator<L> {
    /// Wraps an estimator for use across threads.
    pub fn new(estimator: WaveletDensityEstimator<L>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(estimator)),
        }
    }

    /// See [`WaveletDensityEstimator::reset`].
    pub fn reset(&self, config: EstimatorConfig) -> Result<(), Error> {
        self.lock().reset(config)
    }

    /// See [`WaveletDensityEstimator::update`].
    ///
    /// # Panics
    ///
    /// Panics if the estimator has not been reset.
    pub fn update(&self, x: f64) {
        self.lock().update(x);
    }

    /// See [`WaveletDensityEstimator::snapshot`].
    ///
    /// # Panics
    ///
    /// Panics if the estimator has not been reset.
    pub fn snapshot(&self) -> DensityCurve {
        self.lock().snapshot()
    }

    /// Returns the number of samples consumed since the last reset.
    pub fn n(&self) -> u64 {
        self.lock().n()
    }

    /// Returns true once the estimator has been reset successfully.
    pub fn is_initialized(&self) -> bool {
        self.lock().is_initialized()
    }

    /// Runs `f` with exclusive access to the estimator.
    pub fn with<R>(&self, f: impl FnOnce(&mut WaveletDensityEstimator<L>) -> R) -> R {
        f(&mut *self.lock())
    }

    // A panic inside `update` leaves the coefficients as they were after the last
    // completed sample, so the state behind a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, WaveletDensityEstimator<L>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<L: BasisLoader> std::fmt::Debug for SharedEstimator<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedEstimator")
            .field("estimator", &*self.lock())
            .finish()
    }
}
