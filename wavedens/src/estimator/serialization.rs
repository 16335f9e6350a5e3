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

//! Binary image of a streaming estimator.
//!
//! Layout (little-endian):
//!
//! ```text
//! u8  serial version | u8 family id | u8 flags | u8 aging kind
//! i32 start level    | i32 stop level
//! f64 min | f64 max | f64 discretization
//! f64 theta | u64 window size
//! f64 threshold | u32 max iterations
//! u32 wavelet id length | wavelet id bytes
//! u64 n
//! f64[] scaling coefficients
//! u32 detail level count | f64[] per level
//! f64[] window samples
//! ```
//!
//! Every `f64[]` is a `u32` length followed by the values.

use crate::codec::StateBytes;
use crate::codec::StateSlice;
use crate::codec::family::Family;
use crate::error::Error;
use crate::estimator::AgingPolicy;
use crate::estimator::EstimatorConfig;
use crate::estimator::NormalizationConfig;
use crate::estimator::density::Streaming;
use crate::estimator::store::CoefficientStore;
use crate::estimator::store::SampleWindow;

const SERIAL_VERSION: u8 = 1;
const FLAGS_WAVELET_DETAIL: u8 = 1;

const AGING_NONE: u8 = 0;
const AGING_EXPONENTIAL: u8 = 1;
const AGING_WINDOWED: u8 = 2;

pub(super) struct DecodedEstimator {
    pub(super) config: EstimatorConfig,
    pub(super) n: u64,
    pub(super) scaling: Vec<f64>,
    pub(super) wavelet: Vec<Vec<f64>>,
    pub(super) window: Vec<f64>,
}

pub(super) fn serialize(state: &Streaming) -> Vec<u8> {
    let config = &state.config;
    let store = &state.store;
    let wavelet_id = config.wavelet().as_bytes();

    let mut size_bytes = 4 + 8 + 24 + 16 + 12 + 4 + wavelet_id.len() + 8;
    size_bytes += 4 + store.scaling().len() * 8;
    size_bytes += 4 + store.wavelet().iter().map(|c| 4 + c.len() * 8).sum::<usize>();
    size_bytes += 4 + store.window().map_or(0, |w| w.values().len() * 8);

    let mut bytes = StateBytes::with_capacity(size_bytes);
    bytes.write_u8(SERIAL_VERSION);
    bytes.write_u8(Family::WAVELET_DENSITY.id);
    let flags = if config.wavelet_detail() {
        FLAGS_WAVELET_DETAIL
    } else {
        0
    };
    bytes.write_u8(flags);
    let (aging_kind, theta, window_size) = match config.aging() {
        AgingPolicy::None => (AGING_NONE, 0.0, 0),
        AgingPolicy::Exponential { theta } => (AGING_EXPONENTIAL, theta, 0),
        AgingPolicy::Windowed { size } => (AGING_WINDOWED, 0.0, size as u64),
    };
    bytes.write_u8(aging_kind);
    bytes.write_i32_le(config.start_level());
    bytes.write_i32_le(config.stop_level());
    bytes.write_f64_le(config.min());
    bytes.write_f64_le(config.max());
    bytes.write_f64_le(config.discretization());
    bytes.write_f64_le(theta);
    bytes.write_u64_le(window_size);
    bytes.write_f64_le(config.normalization().threshold());
    bytes.write_u32_le(config.normalization().max_iterations());
    bytes.write_u32_le(wavelet_id.len() as u32);
    bytes.write(wavelet_id);

    bytes.write_u64_le(store.n());
    bytes.write_f64_slice_le(store.scaling());
    bytes.write_u32_le(store.wavelet().len() as u32);
    for coefficients in store.wavelet() {
        bytes.write_f64_slice_le(coefficients);
    }
    match store.window() {
        Some(window) => bytes.write_f64_slice_le(window.values()),
        None => bytes.write_f64_slice_le(&[]),
    }
    bytes.into_bytes()
}

pub(super) fn deserialize(bytes: &[u8]) -> Result<DecodedEstimator, Error> {
    fn make_error(tag: &'static str) -> impl FnOnce(std::io::Error) -> Error {
        move |_| Error::insufficient_data(tag)
    }

    let mut cursor = StateSlice::new(bytes);
    let serial_version = cursor.read_u8().map_err(make_error("serial_version"))?;
    let family_id = cursor.read_u8().map_err(make_error("family_id"))?;
    let flags = cursor.read_u8().map_err(make_error("flags"))?;
    let aging_kind = cursor.read_u8().map_err(make_error("aging_kind"))?;

    Family::WAVELET_DENSITY.validate_id(family_id)?;
    if serial_version != SERIAL_VERSION {
        return Err(Error::deserial(format!(
            "unsupported serial version: expected {SERIAL_VERSION}, got {serial_version}"
        )));
    }

    let start_level = cursor.read_i32_le().map_err(make_error("start_level"))?;
    let stop_level = cursor.read_i32_le().map_err(make_error("stop_level"))?;
    let min = cursor.read_f64_le().map_err(make_error("min"))?;
    let max = cursor.read_f64_le().map_err(make_error("max"))?;
    let discretization = cursor.read_f64_le().map_err(make_error("discretization"))?;
    let theta = cursor.read_f64_le().map_err(make_error("theta"))?;
    let window_size = cursor.read_u64_le().map_err(make_error("window_size"))?;
    let threshold = cursor.read_f64_le().map_err(make_error("threshold"))?;
    let max_iterations = cursor.read_u32_le().map_err(make_error("max_iterations"))?;
    let id_len = cursor.read_u32_le().map_err(make_error("wavelet_id_len"))? as usize;
    if id_len > cursor.remaining() {
        return Err(Error::insufficient_data("wavelet_id"));
    }
    let mut id = vec![0u8; id_len];
    cursor.read_exact(&mut id).map_err(make_error("wavelet_id"))?;
    let wavelet = String::from_utf8(id)
        .map_err(|err| Error::deserial("wavelet id is not valid UTF-8").set_source(err))?;

    let aging = match aging_kind {
        AGING_NONE => AgingPolicy::None,
        AGING_EXPONENTIAL => AgingPolicy::Exponential { theta },
        AGING_WINDOWED => AgingPolicy::Windowed {
            size: usize::try_from(window_size)
                .map_err(|_| Error::deserial("window size does not fit in memory"))?,
        },
        other => return Err(Error::deserial(format!("unknown aging kind: {other}"))),
    };
    if !(threshold > 0.0) || max_iterations == 0 {
        return Err(Error::deserial("invalid normalization parameters"));
    }
    if start_level > stop_level || !(min < max) || !(discretization > 0.0) {
        return Err(Error::deserial("invalid estimator configuration"));
    }

    let config = EstimatorConfig::builder()
        .levels(start_level, stop_level)
        .wavelet(wavelet)
        .aging(aging)
        .density_range(min, max)
        .discretization(discretization)
        .wavelet_detail(flags & FLAGS_WAVELET_DETAIL != 0)
        .normalization(NormalizationConfig::new(threshold, max_iterations))
        .build();

    let n = cursor.read_u64_le().map_err(make_error("n"))?;
    let scaling = cursor.read_f64_vec_le().map_err(make_error("scaling"))?;
    let num_levels = cursor.read_u32_le().map_err(make_error("num_levels"))?;
    let mut wavelet = Vec::new();
    for _ in 0..num_levels {
        wavelet.push(cursor.read_f64_vec_le().map_err(make_error("wavelet"))?);
    }
    let window = cursor.read_f64_vec_le().map_err(make_error("window"))?;

    Ok(DecodedEstimator {
        config,
        n,
        scaling,
        wavelet,
        window,
    })
}

/// Installs decoded coefficients into a freshly reset estimator.
pub(super) fn restore(
    state: &mut Streaming,
    n: u64,
    scaling: Vec<f64>,
    wavelet: Vec<Vec<f64>>,
    window: Vec<f64>,
) -> Result<(), Error> {
    if scaling.len() != state.scaling_grid.len() {
        return Err(Error::deserial("scaling coefficients do not match the translate grid")
            .with_context("expected", state.scaling_grid.len())
            .with_context("actual", scaling.len()));
    }
    if wavelet.len() != state.wavelet_grids.len() {
        return Err(Error::deserial("number of detail levels does not match the configuration")
            .with_context("expected", state.wavelet_grids.len())
            .with_context("actual", wavelet.len()));
    }
    for (grid, coefficients) in state.wavelet_grids.iter().zip(wavelet.iter()) {
        if coefficients.len() != grid.len() {
            return Err(Error::deserial("wavelet coefficients do not match the translate grid")
                .with_context("level", grid.level())
                .with_context("expected", grid.len())
                .with_context("actual", coefficients.len()));
        }
    }

    let window = match state.config.aging() {
        AgingPolicy::Windowed { size } => {
            let expected = n.min(size as u64) as usize;
            if window.len() != expected {
                return Err(Error::deserial("sample window does not match the sample count")
                    .with_context("expected", expected)
                    .with_context("actual", window.len()));
            }
            Some(SampleWindow::from_parts(size, window))
        }
        AgingPolicy::None | AgingPolicy::Exponential { .. } => {
            if !window.is_empty() {
                return Err(Error::deserial("sample window present without windowed aging"));
            }
            None
        }
    };

    state.store = CoefficientStore::from_parts(scaling, wavelet, n, window);
    Ok(())
}
