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

use std::ops::Range;
use std::ops::RangeInclusive;

use crate::error::Error;
use crate::wavelet::Support;

/// Largest absolute translate a grid may reach.
pub(crate) const MAX_TRANSLATE_MAGNITUDE: f64 = (1u64 << 40) as f64;
/// Largest number of translates, and so coefficients, a single level may hold.
pub(crate) const MAX_GRID_LEN: usize = 1 << 24;

/// Integer translates `k` of a basis function at resolution level `j` whose support
/// overlaps the density domain `[min, max]`.
///
/// The grid covers `floor(2^j * min - s1) ..= ceil(2^j * max - s0)` for a support
/// `[s0, s1]`, and translate `k` owns coefficient index `k - start`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslateGrid {
    level: i32,
    start: i64,
    stop: i64,
}

impl TranslateGrid {
    /// Derives the grid for `level` from the basis support and the density domain.
    ///
    /// Fails with [`ConfigInvalid`](crate::error::ErrorKind::ConfigInvalid) unless the
    /// grid holds between 1 and `2^24` translates, all within `±2^40`.
    pub fn build(level: i32, support: Support, min: f64, max: f64) -> Result<Self, Error> {
        let scale = dyadic_scale(level);
        let lower = (scale * min - support.end() as f64).floor();
        let upper = (scale * max - support.start() as f64).ceil();
        let make_error = |message: &str| {
            Error::config_invalid(format!("translate grid at level {level} {message}"))
                .with_context("level", level)
                .with_context("start", lower)
                .with_context("stop", upper)
        };
        // also rejects NaN
        if !(lower.abs() <= MAX_TRANSLATE_MAGNITUDE && upper.abs() <= MAX_TRANSLATE_MAGNITUDE) {
            return Err(make_error("is out of range"));
        }

        let (start, stop) = (lower as i64, upper as i64);
        match stop.checked_sub(start).and_then(|span| span.checked_add(1)) {
            Some(len) if len <= 0 => Err(make_error("is empty")),
            Some(len) if len as u64 <= MAX_GRID_LEN as u64 => Ok(Self { level, start, stop }),
            _ => Err(make_error("holds too many translates")),
        }
    }

    /// Returns the resolution level of the grid.
    pub fn level(&self) -> i32 {
        self.level
    }

    /// Returns the `2^j` dilation of this level.
    pub fn scale(&self) -> f64 {
        dyadic_scale(self.level)
    }

    /// Returns the first translate.
    pub fn start(&self) -> i64 {
        self.start
    }

    /// Returns the last translate.
    pub fn stop(&self) -> i64 {
        self.stop
    }

    /// Returns the number of translates.
    pub fn len(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            (self.stop - self.start + 1) as usize
        }
    }

    /// Returns true if the grid holds no translate.
    pub fn is_empty(&self) -> bool {
        self.start > self.stop
    }

    /// Returns the translates in ascending order.
    pub fn translates(&self) -> RangeInclusive<i64> {
        self.start..=self.stop
    }

    /// Returns the translate stored at a coefficient index.
    ///
    /// # Panics
    ///
    /// Panics if `index` is outside the grid.
    pub fn translate(&self, index: usize) -> i64 {
        assert!(
            index < self.len(),
            "translate index {index} out of grid of {} at level {}",
            self.len(),
            self.level
        );
        self.start + index as i64
    }

    /// Returns the coefficient index of a translate, if it belongs to the grid.
    pub fn index_of(&self, translate: i64) -> Option<usize> {
        if (self.start..=self.stop).contains(&translate) {
            Some((translate - self.start) as usize)
        } else {
            None
        }
    }

    /// Returns the coefficient indices whose basis function may be non-zero at the
    /// scaled position `scaled_x = 2^j * x`.
    ///
    /// Those are the translates with `s0 <= scaled_x - k <= s1`, clamped to the grid.
    pub fn indices_near(&self, scaled_x: f64, support: Support) -> Range<usize> {
        if !scaled_x.is_finite() {
            return 0..0;
        }
        let lo = (scaled_x - support.end() as f64).ceil() as i64;
        let hi = (scaled_x - support.start() as f64).floor() as i64;
        let lo = lo.max(self.start);
        let hi = hi.min(self.stop);
        if lo > hi {
            return 0..0;
        }
        (lo - self.start) as usize..(hi - self.start + 1) as usize
    }
}

/// Returns `2^level` for a possibly negative level.
pub(crate) fn dyadic_scale(level: i32) -> f64 {
    2f64.powi(level)
}

/// Returns `2^(level / 2)`, the L2 normalizer of a dilated basis function.
pub(crate) fn level_normalizer(level: i32) -> f64 {
    2f64.powf(level as f64 / 2.0)
}
